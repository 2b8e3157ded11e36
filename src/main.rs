//! docrest binary
//!
//! Argument parsing, boot and serving all live in [`docrest::cli`]; this
//! file only turns a failure into a message on stderr and exit status 1.

fn main() {
    if let Err(e) = docrest::cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
