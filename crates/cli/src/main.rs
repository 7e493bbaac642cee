use std::process::ExitCode;

fn main() -> ExitCode {
    nola_cli::run()
}
