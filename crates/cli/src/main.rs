use std::process::ExitCode;

fn main() -> ExitCode {
    cursus_cli::run()
}
