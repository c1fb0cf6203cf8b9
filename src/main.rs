fn main() {
    if let Err(e) = rollcall::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
