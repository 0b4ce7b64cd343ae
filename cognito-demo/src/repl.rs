use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    command::{Command, HELP},
    session::Session,
};

/// Reads commands line by line until `quit` or end of input.
pub(crate) async fn run<R, W>(session: &mut Session, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    output.write_all(HELP.as_bytes()).await?;

    loop {
        prompt(session, &mut output).await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                output.write_all(format!("{error}\n").as_bytes()).await?;
                continue;
            }
        };

        match command {
            Command::Skip => session.skip_authentication().await,
            Command::Login { provider, access_token } => session.login(provider, access_token).await,
            Command::GetId => {
                if let Err(error) = session.get_identity().await {
                    output.write_all(format!("{error}\n").as_bytes()).await?;
                }
            }
            Command::Clear => session.clear_identity(),
            Command::Logout => session.logout(),
            Command::Status => {
                let providers = session.login_providers();

                let logins = if providers.is_empty() {
                    "none".to_string()
                } else {
                    providers.join(", ")
                };

                let pool = session
                    .configuration()
                    .map(|config| format!("{} ({})", config.pool_id, config.region))
                    .unwrap_or_else(|| "none".to_string());

                output
                    .write_all(format!("State: {}\nPool: {pool}\nLogins: {logins}\n", session.state()).as_bytes())
                    .await?;
            }
            Command::Help => output.write_all(HELP.as_bytes()).await?,
            Command::Quit => break,
        }
    }

    output.flush().await?;

    Ok(())
}

async fn prompt<W>(session: &Session, output: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = format!("Identity: {}\n[{}]> ", session.identity(), session.state());

    output.write_all(line.as_bytes()).await?;
    output.flush().await?;

    Ok(())
}
