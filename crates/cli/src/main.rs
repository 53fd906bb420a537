use std::process::ExitCode;

fn main() -> ExitCode {
    polyglot_cli::run()
}
