use std::process::ExitCode;

fn main() -> ExitCode {
    match grid_pulse::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
