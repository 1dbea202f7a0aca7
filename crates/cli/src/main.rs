use std::process::ExitCode;

fn main() -> ExitCode {
    ordertrack_cli::run()
}
