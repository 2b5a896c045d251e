use clap::Parser;
use event_calendar::application::commands::default_workspace_root;
use event_calendar::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let workspace_root = match cli.workspace {
        Some(path) => Ok(path),
        None => default_workspace_root(),
    };
    let result = match workspace_root {
        Ok(root) => event_calendar::run(&root, cli.navigation).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(view) => {
            println!("{}", view.render_text());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("event-calendar: {error}");
            ExitCode::FAILURE
        }
    }
}
