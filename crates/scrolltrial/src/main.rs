#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = scrolltrial::run_from_env() {
        eprintln!("scrolltrial: {error}");
        std::process::exit(error.exit_code());
    }
}
