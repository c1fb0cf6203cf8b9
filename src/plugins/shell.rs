//! Interactive text menu over the student register.
//!
//! The shell owns no business rules: it collects input, calls one store
//! operation, and prints the outcome. Store and loader failures are reported
//! and the menu carries on; only losing the terminal ends it early.

use crate::core::config::Config;
use crate::core::error::RollcallError;
use crate::core::output;
use crate::core::store::{NewStudent, Student, StudentStore};
use crate::core::tui::{self, BoxStyle, ItemStatus};
use crate::plugins::loader;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const MAIN_MENU: &str = "
    1 - (s)earch student
    2 - (r)egister student
    3 - (d)elete student
    4 - change student (c)lass
    5 - generate student (e)-mail

    9 - manage student data(b)ase

    0 - (q)uit program
";

const DB_MENU: &str = "
    1 - (f)ill database from file
    9 - (e)mpty database [IRREVERSIBLE]

    0 - (q)uit this menu and return to main menu
";

/// Why the shell stopped before the user chose to quit.
enum Halt {
    Eof,
    Terminal(io::Error),
}

impl From<io::Error> for Halt {
    fn from(e: io::Error) -> Self {
        Halt::Terminal(e)
    }
}

type Step<T> = Result<T, Halt>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a, R: BufRead, W: Write> {
    store: &'a mut StudentStore,
    config: &'a Config,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a mut StudentStore, config: &'a Config, input: R, out: W) -> Self {
        Self {
            store,
            config,
            input,
            out,
        }
    }

    /// Run until the user quits or input ends.
    pub fn run(&mut self) -> Result<(), RollcallError> {
        match self.main_loop() {
            Ok(()) | Err(Halt::Eof) => Ok(()),
            Err(Halt::Terminal(e)) => Err(RollcallError::IoError(e)),
        }
    }

    fn main_loop(&mut self) -> Step<()> {
        tui::render_box(&mut self.out, "ROLLCALL", "student register", BoxStyle::Info)?;
        loop {
            writeln!(self.out, "{}", MAIN_MENU)?;
            let option = self.ask("select option: ")?.to_lowercase();
            let flow = match option.as_str() {
                "1" | "s" => self.search()?,
                "2" | "r" => self.register()?,
                "3" | "d" => self.delete()?,
                "4" | "c" => self.change_class()?,
                "5" | "e" => self.generate_email()?,
                "9" | "b" => self.manage_database()?,
                "0" | "q" => self.quit()?,
                other => {
                    self.status(&format!("unknown option '{}'", other), ItemStatus::Skipped)?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> Step<String> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Halt::Eof);
        }
        Ok(line.trim().to_string())
    }

    fn ask_required(&mut self, prompt: &str, retry: &str) -> Step<String> {
        let mut answer = self.ask(prompt)?;
        while answer.is_empty() {
            answer = self.ask(retry)?;
        }
        Ok(answer)
    }

    fn confirm(&mut self, prompt: &str) -> Step<bool> {
        let answer = self.ask(prompt)?.to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// `None` when the user cancels with `0` or types something that is not an id.
    fn ask_id(&mut self) -> Step<Option<i64>> {
        let raw = self.ask_required(
            "enter student id ('0' to cancel): ",
            "please enter student id ('0' to cancel): ",
        )?;
        if raw == "0" {
            return Ok(None);
        }
        match raw.parse::<i64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                self.status(&format!("'{}' is not a student id", raw), ItemStatus::Failed)?;
                Ok(None)
            }
        }
    }

    fn status(&mut self, message: &str, status: ItemStatus) -> Step<()> {
        tui::print_status_line(&mut self.out, message, status)?;
        Ok(())
    }

    fn report(&mut self, err: &RollcallError) -> Step<()> {
        let message = match err {
            RollcallError::NotFound(what) => format!("not found: {}", what),
            RollcallError::ValidationError(why) => format!("rejected: {}", why),
            other => format!("failed: {}", other),
        };
        self.status(&message, ItemStatus::Failed)
    }

    fn show(&mut self, student: &Student) -> Step<()> {
        writeln!(self.out)?;
        write!(self.out, "{}", output::student_card(student))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn hold(&mut self) -> Step<()> {
        self.ask("press Enter to continue")?;
        Ok(())
    }

    /// Look the id up and print it; `None` (already reported) when absent.
    fn fetch_and_show(&mut self, id: i64) -> Step<Option<Student>> {
        match self.store.find_by_id(id) {
            Ok(Some(student)) => {
                self.show(&student)?;
                Ok(Some(student))
            }
            Ok(None) => {
                self.status(&format!("no student with id {}", id), ItemStatus::Skipped)?;
                Ok(None)
            }
            Err(e) => {
                self.report(&e)?;
                Ok(None)
            }
        }
    }

    fn search(&mut self) -> Step<Flow> {
        let first = self.ask("enter first name (leave blank for any): ")?;
        let last = self.ask("enter last name (leave blank for any): ")?;
        match self.store.find_by_name(&first, &last) {
            Ok(found) if found.is_empty() => {
                self.status("no matching students", ItemStatus::Info)?;
            }
            Ok(found) => {
                for student in &found {
                    self.show(student)?;
                }
                self.status(&format!("{} student(s) found", found.len()), ItemStatus::Info)?;
            }
            Err(e) => self.report(&e)?,
        }
        self.hold()?;
        Ok(Flow::Continue)
    }

    fn register(&mut self) -> Step<Flow> {
        let first = self.ask_required("enter first name: ", "please enter first name: ")?;
        let last = self.ask_required("enter last name: ", "please enter last name: ")?;
        let class = self.ask("enter class name (leave blank for none): ")?;

        let id = match self.store.insert_one(&NewStudent::new(&first, &last, &class)) {
            Ok(id) => id,
            Err(e) => {
                self.report(&e)?;
                return Ok(Flow::Continue);
            }
        };
        self.status(&format!("registered student {}", id), ItemStatus::Created)?;

        if self.confirm("generate student e-mail? (y/n) ")? {
            match self.store.generate_email(id) {
                Ok(email) => self.status(&format!("e-mail set to {}", email), ItemStatus::Updated)?,
                Err(e) => self.report(&e)?,
            }
        } else {
            self.status("no e-mail generated", ItemStatus::Skipped)?;
        }
        Ok(Flow::Continue)
    }

    fn delete(&mut self) -> Step<Flow> {
        let Some(id) = self.ask_id()? else {
            self.status("deletion canceled", ItemStatus::Skipped)?;
            return Ok(Flow::Continue);
        };
        if self.fetch_and_show(id)?.is_none() {
            return Ok(Flow::Continue);
        }
        writeln!(self.out, "[THIS IS IRREVERSIBLE]")?;
        if !self.confirm("delete student? (y/n): ")? {
            self.status("deletion canceled", ItemStatus::Skipped)?;
            return Ok(Flow::Continue);
        }
        match self.store.delete_by_id(id) {
            Ok(()) => self.status(&format!("student {} deleted", id), ItemStatus::Removed)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn change_class(&mut self) -> Step<Flow> {
        let Some(id) = self.ask_id()? else {
            self.status("transfer canceled", ItemStatus::Skipped)?;
            return Ok(Flow::Continue);
        };
        if self.fetch_and_show(id)?.is_none() {
            return Ok(Flow::Continue);
        }
        let class = self.ask("enter new class ('0' to cancel): ")?;
        if class == "0" {
            self.status("transfer canceled", ItemStatus::Skipped)?;
            return Ok(Flow::Continue);
        }
        match self.store.update_class(id, &class) {
            Ok(()) => self.status(
                &format!("student {} moved to class '{}'", id, class),
                ItemStatus::Updated,
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn generate_email(&mut self) -> Step<Flow> {
        let Some(id) = self.ask_id()? else {
            return Ok(Flow::Continue);
        };
        match self.store.generate_email(id) {
            Ok(email) => self.status(
                &format!("student {} e-mail set to {}", id, email),
                ItemStatus::Updated,
            )?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn manage_database(&mut self) -> Step<Flow> {
        loop {
            writeln!(self.out, "{}", DB_MENU)?;
            let option = self.ask("select option: ")?.to_lowercase();
            match option.as_str() {
                "1" | "f" => self.fill_database()?,
                "9" | "e" => self.empty_database()?,
                "0" | "q" => return Ok(Flow::Continue),
                other => {
                    self.status(&format!("unknown option '{}'", other), ItemStatus::Skipped)?
                }
            }
        }
    }

    fn fill_database(&mut self) -> Step<()> {
        let default = self.config.mock_data.clone();
        let name = self.ask(&format!(
            "enter file name (default: {}): ",
            default.display()
        ))?;
        let path = if name.is_empty() {
            default
        } else {
            PathBuf::from(name)
        };
        match loader::load_file(self.store, &path, self.config.delimiter) {
            Ok(n) => self.status(
                &format!("loaded {} students from {}", n, path.display()),
                ItemStatus::Created,
            ),
            Err(e) => self.report(&e),
        }
    }

    fn empty_database(&mut self) -> Step<()> {
        tui::render_box(
            &mut self.out,
            "WARNING: THIS IS IRREVERSIBLE!",
            "",
            BoxStyle::Warning,
        )?;
        if !self.confirm("Are you sure you want to empty the database? (y/n) ")? {
            return self.status("database kept", ItemStatus::Skipped);
        }
        match self.store.initialize_schema() {
            Ok(()) => self.status("database emptied", ItemStatus::Removed),
            Err(e) => self.report(&e),
        }
    }

    fn quit(&mut self) -> Step<Flow> {
        if self.confirm("Are you sure you want to quit? (y/n) ")? {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }
}
