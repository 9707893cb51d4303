fn main() {
    if let Err(e) = dcf_cli::run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
