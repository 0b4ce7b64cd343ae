use std::str::FromStr;

use anyhow::bail;
use config::LoginProvider;
use indoc::indoc;
use secrecy::SecretString;

pub(crate) const HELP: &str = indoc! {r#"
    Commands:
      skip                       continue with an anonymous identity
      login <provider> [token]   log in with facebook, google, amazon or a custom provider
      get-id                     fetch the identity id again
      clear                      clear the identity and logins
      logout                     clear everything and start over
      status                     show the session state
      help                       show this message
      quit                       exit
"#};

#[derive(Debug)]
pub(crate) enum Command {
    Skip,
    Login {
        provider: LoginProvider,
        access_token: Option<SecretString>,
    },
    GetId,
    Clear,
    Logout,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();

        let Some(name) = words.next() else {
            bail!("empty command");
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "skip" => Command::Skip,
            "login" => {
                let Some(provider) = words.next() else {
                    bail!("usage: login <provider> [token]");
                };

                Command::Login {
                    provider: LoginProvider::from(provider),
                    access_token: words.next().map(SecretString::from),
                }
            }
            "get-id" | "getid" => Command::GetId,
            "clear" => Command::Clear,
            "logout" => Command::Logout,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}', type 'help' for a list"),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument '{extra}'");
        }

        Ok(command)
    }
}
