use std::process::ExitCode;

fn main() -> ExitCode {
    match one_datum::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("one-datum: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
