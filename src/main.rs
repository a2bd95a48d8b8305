fn main() {
    if let Err(err) = dataglow::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
