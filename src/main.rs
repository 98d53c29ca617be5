use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match careboard_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
