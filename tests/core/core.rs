use rollcall::core::broker::{self, BrokerEvent, DbBroker};
use rollcall::core::config::Config;
use rollcall::core::db;
use rollcall::core::error::RollcallError;
use rollcall::core::store::{NewStudent, StudentRow, StudentStore};
use rollcall::with_store;
use rusqlite::Connection;
use std::fs;
use tempfile::tempdir;

fn row(first: &str, last: &str, class: &str, email: &str) -> StudentRow {
    (
        first.to_string(),
        last.to_string(),
        class.to_string(),
        email.to_string(),
    )
}

fn five_valid_rows() -> Vec<StudentRow> {
    vec![
        row("Ada", "Lovelace", "7B", ""),
        row("Alan", "Turing", "7A", "Alan.Turing@school.edu"),
        row("Grace", "Hopper", "", ""),
        row("Ada", "Byron", "8C", ""),
        row("Edsger", "Dijkstra", "7A", ""),
    ]
}

fn open_store(dir: &std::path::Path) -> StudentStore {
    let config = Config::default();
    StudentStore::open(&db::student_db_path(dir), &config).expect("open store")
}

#[test]
fn insert_then_find_by_id_round_trips_without_email() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let id = store
        .insert_one(&NewStudent::new("Ada", "Lovelace", "7B"))
        .unwrap();

    let s = store.find_by_id(id).unwrap().expect("student present");
    assert_eq!(s.first_name, "Ada");
    assert_eq!(s.last_name, "Lovelace");
    assert_eq!(s.class_name.as_deref(), Some("7B"));
    assert_eq!(s.email, None);
}

#[test]
fn insert_assigns_increasing_ids() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let a = store.insert_one(&NewStudent::new("A", "One", "")).unwrap();
    let b = store.insert_one(&NewStudent::new("B", "Two", "")).unwrap();
    assert!(b > a);
}

#[test]
fn insert_one_without_names_is_rejected_before_storage() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let missing_last = NewStudent {
        first_name: Some("Ada".to_string()),
        last_name: None,
        class_name: None,
    };
    let err = store.insert_one(&missing_last).unwrap_err();
    assert!(matches!(err, RollcallError::ValidationError(_)), "{err}");

    let blank_first = NewStudent::new("", "Lovelace", "");
    assert!(matches!(
        store.insert_one(&blank_first),
        Err(RollcallError::ValidationError(_))
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn blank_class_is_stored_as_null() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let id = store.insert_one(&NewStudent::new("Grace", "Hopper", "")).unwrap();
    assert_eq!(store.find_by_id(id).unwrap().unwrap().class_name, None);
}

#[test]
fn delete_missing_id_is_a_noop() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();
    store.delete_by_id(999).expect("no error for absent id");
    assert_eq!(store.count().unwrap(), 5);
}

#[test]
fn delete_removes_only_that_student() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let keep = store.insert_one(&NewStudent::new("Keep", "Me", "")).unwrap();
    let gone = store.insert_one(&NewStudent::new("Drop", "Me", "")).unwrap();
    store.delete_by_id(gone).unwrap();
    assert!(store.find_by_id(gone).unwrap().is_none());
    assert!(store.find_by_id(keep).unwrap().is_some());
}

#[test]
fn generated_email_follows_first_dot_last() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let id = store
        .insert_one(&NewStudent::new("Ada", "Lovelace", ""))
        .unwrap();
    let email = store.generate_email(id).unwrap();
    assert_eq!(email, "Ada.Lovelace@school.edu");
    assert_eq!(
        store.find_by_id(id).unwrap().unwrap().email.as_deref(),
        Some("Ada.Lovelace@school.edu")
    );
}

#[test]
fn generate_email_for_missing_id_is_not_found() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let err = store.generate_email(42).unwrap_err();
    assert!(matches!(err, RollcallError::NotFound(_)), "{err}");
    // the handle is still usable afterwards
    store.insert_one(&NewStudent::new("Ada", "Lovelace", "")).unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn find_by_name_is_inclusive_or() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();

    let adas = store.find_by_name("Ada", "").unwrap();
    assert_eq!(adas.len(), 2);
    assert!(adas.iter().all(|s| s.first_name == "Ada"));

    // "Ada" OR "Turing": both Adas plus Alan Turing
    let either = store.find_by_name("Ada", "Turing").unwrap();
    let names: Vec<_> = either.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Lovelace", "Turing", "Byron"]);

    let by_last = store.find_by_name("", "Hopper").unwrap();
    assert_eq!(by_last.len(), 1);
    assert_eq!(by_last[0].first_name, "Grace");

    assert!(store.find_by_name("Nobody", "Nowhere").unwrap().is_empty());
}

#[test]
fn find_by_name_with_both_blank_lists_everything() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();
    assert_eq!(store.find_by_name("", "").unwrap().len(), 5);
}

#[test]
fn insert_many_is_all_or_nothing() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let mut rows = five_valid_rows();
    rows.insert(3, row("", "Nameless", "7B", ""));

    let err = store.insert_many(&rows).unwrap_err();
    assert!(matches!(err, RollcallError::ValidationError(_)), "{err}");
    assert!(err.to_string().contains("row 4"), "{err}");
    assert_eq!(store.count().unwrap(), 0);

    assert_eq!(store.insert_many(&five_valid_rows()).unwrap(), 5);
    assert_eq!(store.count().unwrap(), 5);
}

#[test]
fn insert_many_keeps_supplied_email_and_order() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();
    let all = store.list_all().unwrap();
    assert_eq!(all[0].first_name, "Ada");
    assert_eq!(all[1].email.as_deref(), Some("Alan.Turing@school.edu"));
    assert_eq!(all[2].class_name, None);
    assert_eq!(all[4].last_name, "Dijkstra");
}

#[test]
fn wipe_leaves_an_empty_table() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();
    store.initialize_schema().unwrap();
    for id in 0..10 {
        assert!(store.find_by_id(id).unwrap().is_none());
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn update_class_on_missing_id_changes_nothing() {
    let mut store = StudentStore::open_in_memory().unwrap();
    store.insert_many(&five_valid_rows()).unwrap();
    let before = store.list_all().unwrap();
    store.update_class(12345, "9Z").expect("no error for absent id");
    assert_eq!(store.list_all().unwrap(), before);
}

#[test]
fn update_class_sets_and_clears() {
    let mut store = StudentStore::open_in_memory().unwrap();
    let id = store.insert_one(&NewStudent::new("Ada", "Lovelace", "7B")).unwrap();
    store.update_class(id, "8A").unwrap();
    assert_eq!(
        store.find_by_id(id).unwrap().unwrap().class_name.as_deref(),
        Some("8A")
    );
    store.update_class(id, "").unwrap();
    assert_eq!(store.find_by_id(id).unwrap().unwrap().class_name, None);
}

#[test]
fn data_survives_close_and_reopen() {
    let tmp = tempdir().expect("tempdir");
    let mut store = open_store(tmp.path());
    let id = store.insert_one(&NewStudent::new("Ada", "Lovelace", "7B")).unwrap();
    store.close().expect("close");

    let store = open_store(tmp.path());
    let s = store.find_by_id(id).unwrap().expect("persisted");
    assert_eq!(s.last_name, "Lovelace");
}

#[test]
fn on_disk_layout_matches_student_table() {
    let tmp = tempdir().expect("tempdir");
    let store = open_store(tmp.path());
    store.close().unwrap();

    let conn = Connection::open(db::student_db_path(tmp.path())).unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(STUDENT)").unwrap();
    let cols: Vec<(String, bool, bool)> = stmt
        .query_map([], |r| Ok((r.get(1)?, r.get::<_, i64>(3)? == 1, r.get::<_, i64>(5)? == 1)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        cols,
        vec![
            ("ID".to_string(), true, true),
            ("FIRST_NAME".to_string(), true, false),
            ("LAST_NAME".to_string(), true, false),
            ("CLASS".to_string(), false, false),
            ("EMAIL".to_string(), false, false),
        ]
    );
}

#[test]
fn existing_rows_are_readable_after_reopen() {
    let tmp = tempdir().expect("tempdir");
    let path = db::student_db_path(tmp.path());
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE STUDENT(
                ID INTEGER PRIMARY KEY NOT NULL,
                FIRST_NAME TEXT NOT NULL,
                LAST_NAME TEXT NOT NULL,
                CLASS TEXT,
                EMAIL TEXT);
             INSERT INTO STUDENT (FIRST_NAME, LAST_NAME, CLASS, EMAIL)
             VALUES ('Alan', 'Turing', '', NULL);",
        )
        .unwrap();
    }
    let store = open_store(tmp.path());
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].class_name.as_deref(), Some(""));
}

#[test]
fn broker_rolls_back_failed_write_and_audits_both_outcomes() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("scratch.db");
    let mut conn = db::db_connect(&db_path.to_string_lossy()).unwrap();
    conn.execute("CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)", [])
        .unwrap();

    let broker = DbBroker::new(&db_path, "tester", true);
    broker
        .with_write(&mut conn, "t.insert", |c| {
            c.execute("INSERT INTO t(v) VALUES('kept')", [])?;
            Ok(())
        })
        .expect("success path");

    let failed: Result<(), RollcallError> = broker.with_write(&mut conn, "t.fail", |c| {
        c.execute("INSERT INTO t(v) VALUES('discarded')", [])?;
        Err(RollcallError::ValidationError("intentional".to_string()))
    });
    assert!(failed.is_err());

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);

    let audit_path = broker.audit_log_path().expect("audit enabled").to_path_buf();
    assert_eq!(audit_path, tmp.path().join("broker.events.jsonl"));
    let events: Vec<BrokerEvent> = broker::read_events(&audit_path).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op, "t.insert");
    assert_eq!(events[0].status, "success");
    assert_eq!(events[1].status, "error");
    assert_eq!(events[1].error_kind.as_deref(), Some("malformed_input"));
    assert!(events.iter().all(|e| e.actor == "tester" && e.db_id == "scratch.db"));
}

#[test]
fn store_operations_are_audited_unless_disabled() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("students.db");
    let audit_path = tmp.path().join("broker.events.jsonl");

    let config = Config {
        database: db_path.clone(),
        ..Config::default()
    };
    with_store(&config, |store| {
        store.insert_one(&NewStudent::new("Ada", "Lovelace", ""))?;
        store.find_by_name("Ada", "")?;
        Ok(())
    })
    .unwrap();
    let ops: Vec<String> = broker::read_events(&audit_path)
        .unwrap()
        .into_iter()
        .map(|e| e.op)
        .collect();
    assert!(ops.contains(&"student.insert".to_string()), "{ops:?}");
    assert!(ops.contains(&"student.find_by_name".to_string()), "{ops:?}");

    fs::remove_file(&audit_path).unwrap();
    let quiet = Config {
        audit: false,
        ..config
    };
    with_store(&quiet, |store| store.count()).unwrap();
    assert!(!audit_path.exists());
}

#[test]
fn with_store_closes_even_when_body_fails() {
    let tmp = tempdir().expect("tempdir");
    let config = Config {
        database: tmp.path().join("nested").join("students.db"),
        audit: false,
        ..Config::default()
    };
    let err = with_store(&config, |store| store.generate_email(1)).unwrap_err();
    assert!(matches!(err, RollcallError::NotFound(_)));

    let n = with_store(&config, |store| store.count()).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn write_that_cannot_be_audited_stores_nothing() {
    let tmp = tempdir().expect("tempdir");
    let mut store = open_store(tmp.path());
    let audit_path = tmp.path().join("broker.events.jsonl");
    assert!(audit_path.is_file());

    fs::remove_file(&audit_path).unwrap();
    fs::create_dir(&audit_path).unwrap();

    let err = store
        .insert_one(&NewStudent::new("Ada", "Lovelace", ""))
        .unwrap_err();
    assert_eq!(err.kind(), "io");
    let err = store.insert_many(&five_valid_rows()).unwrap_err();
    assert_eq!(err.kind(), "io");

    // Reads still answer with the log gone.
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.find_by_id(1).unwrap(), None);

    fs::remove_dir(&audit_path).unwrap();
    let id = store
        .insert_one(&NewStudent::new("Ada", "Lovelace", ""))
        .unwrap();
    assert_eq!(store.count().unwrap(), 1);
    store.close().unwrap();

    let conn = Connection::open(db::student_db_path(tmp.path())).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM STUDENT WHERE ID = ?1", [id], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn storage_error_leaves_the_handle_usable() {
    let tmp = tempdir().expect("tempdir");
    let config = Config {
        audit: false,
        ..Config::default()
    };
    let db_path = db::student_db_path(tmp.path());
    let mut store = StudentStore::open(&db_path, &config).unwrap();
    store
        .insert_one(&NewStudent::new("Ada", "Lovelace", "7B"))
        .unwrap();

    {
        let other = Connection::open(&db_path).unwrap();
        other.execute("DROP TABLE STUDENT", []).unwrap();
    }

    let err = store
        .insert_one(&NewStudent::new("Alan", "Turing", ""))
        .unwrap_err();
    assert!(matches!(err, RollcallError::RusqliteError(_)), "{err}");
    assert_eq!(err.kind(), "storage");
    assert_eq!(store.find_by_name("Ada", "").unwrap_err().kind(), "storage");

    store.initialize_schema().unwrap();
    store
        .insert_one(&NewStudent::new("Alan", "Turing", ""))
        .unwrap();
    assert_eq!(store.count().unwrap(), 1);
    store.close().unwrap();
}

#[test]
fn register_stays_a_single_file() {
    let tmp = tempdir().expect("tempdir");
    let mut store = open_store(tmp.path());
    store.insert_many(&five_valid_rows()).unwrap();

    assert!(!tmp.path().join("students.db-wal").exists());
    assert!(!tmp.path().join("students.db-shm").exists());
    let conn = Connection::open(db::student_db_path(tmp.path())).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mode, "delete");
    drop(conn);
    store.close().unwrap();
}
