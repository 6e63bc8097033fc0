use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use tradedesk::TradeDeskError;
use tradedesk::config::fetch_config;
use tradedesk::console::{Command, HELP, execute, parse_command};
use tradedesk::session::Session;

#[tokio::main]
async fn main() -> Result<(), TradeDeskError> {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let app_config = fetch_config()?;
    info!(api_url = %app_config.backend.api_url, "starting session");
    let mut session = Session::new(&app_config)?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print(&mut stdout, &format!("{HELP}\n")).await?;
    loop {
        print(&mut stdout, "> ").await?;
        let Some(line) = lines.next_line().await.map_err(io_error)? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                print(&mut stdout, &format!("{e}\n")).await?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match execute(&mut session, command).await {
            Ok(output) => print(&mut stdout, &format!("{}\n", output.trim_end())).await?,
            Err(e) => {
                error!(error = %e, "command failed");
                print(&mut stdout, &format!("error: {e}\n")).await?;
            }
        }
    }

    Ok(())
}

async fn print(stdout: &mut tokio::io::Stdout, text: &str) -> Result<(), TradeDeskError> {
    stdout.write_all(text.as_bytes()).await.map_err(io_error)?;
    stdout.flush().await.map_err(io_error)
}

fn io_error(e: std::io::Error) -> TradeDeskError {
    TradeDeskError::Io(e.to_string())
}
