use std::process::ExitCode;

fn main() -> ExitCode {
    match fopdt_tune::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
