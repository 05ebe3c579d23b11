use accessgate::cli::{actions, actions::Action, start, telemetry};
use anyhow::Result;
use std::process::ExitCode;

// Main function
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Start the program
    let action = start()?;

    // Handle the action
    let granted = match action {
        Action::Check(args) => actions::check::execute(args).await,
        Action::Hash(args) => actions::hash::execute(&args).map(|()| true),
    };

    telemetry::shutdown();

    Ok(if granted? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
