#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use eyre::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::config::{self, Configuration, load_configuration, lookup_config_path};
use crate::importer::sample_json;
use crate::models::{ChatTurn, FilterChat, TimeRange};
use crate::server;
use crate::service::ChatService;

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A minimal chat app with a best-effort chat history importer

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/chatport/config.toml
    * $HOME/.config/chatport/config.toml
    * $HOME/.chatport.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Action {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, overrides `server.listen`
        #[arg(short, long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Import a chat export, `-` reads stdin
    Import {
        #[arg(value_name = "PATH", default_value = "-")]
        path: String,
    },

    /// Print the sample import payload
    Sample {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<String>,
    },

    /// Create an empty chat
    New {
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List chats, most recently updated first
    List {
        /// Only chats whose title contains this text
        #[arg(short, long)]
        title: Option<String>,

        /// Only chats with a message containing this text
        #[arg(short = 'q', long, value_name = "TEXT")]
        contains: Option<String>,

        /// Only chats updated at or after this RFC 3339 time
        #[arg(short, long, value_name = "TIME")]
        since: Option<DateTime<Utc>>,
    },

    /// Print a chat and its messages
    Show { id: String },

    /// Delete a chat and its messages
    Delete { id: String },

    /// Send a message to a chat and print the reply
    Send { id: String, text: String },
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        if config_path.is_empty() {
            // No config path is specified just use the default config
            return Ok(Configuration::default());
        }
        load_configuration(config_path.as_str()).wrap_err("loading configuration")
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }

    pub fn action(&self) -> Action {
        self.action
            .clone()
            .unwrap_or(Action::Serve { listen: None })
    }
}

impl Action {
    pub async fn run(self, service: ChatService, config: &Configuration) -> Result<()> {
        match self {
            Action::Serve { listen } => {
                let listen = listen.unwrap_or_else(|| config.server.listen.clone());
                let token = CancellationToken::new();
                let token_clone = token.clone();
                tokio::spawn(async move {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        log::error!("Error waiting for ctrl-c: {}", err);
                    }
                    token_clone.cancel();
                });
                server::serve(service, &listen, token).await
            }
            Action::Import { path } => {
                let text = read_input(&path).await?;
                let chat_id = service.import_chat(&text).await?;
                println!("{}", chat_id);
                Ok(())
            }
            Action::Sample { output } => {
                let sample = sample_json();
                match output {
                    Some(path) => tokio::fs::write(&path, sample)
                        .await
                        .wrap_err(format!("writing {}", path)),
                    None => {
                        println!("{}", sample);
                        Ok(())
                    }
                }
            }
            Action::New { title } => {
                let chat = service.create_chat(title.as_deref()).await?;
                println!("{}", chat.id());
                Ok(())
            }
            Action::List {
                title,
                contains,
                since,
            } => {
                let filter = list_filter(title, contains, since);
                for chat in service.list_chats(filter).await? {
                    println!(
                        "{}  {}  {}",
                        chat.id(),
                        chat.updated_at().format("%Y-%m-%d %H:%M"),
                        chat.title()
                    );
                }
                Ok(())
            }
            Action::Show { id } => {
                let chat = match service.get_chat(&id).await? {
                    Some(chat) => chat,
                    None => bail!("Chat not found"),
                };
                println!("# {}", chat.title());
                for message in chat.messages() {
                    println!("\n[{}]\n{}", message.role(), message.content());
                }
                Ok(())
            }
            Action::Delete { id } => {
                if !service.delete_chat(&id).await? {
                    bail!("Chat not found");
                }
                Ok(())
            }
            Action::Send { id, text } => {
                let chat = match service.get_chat(&id).await? {
                    Some(chat) => chat,
                    None => bail!("Chat not found"),
                };
                let mut turns = chat.messages().iter().map(ChatTurn::from).collect::<Vec<_>>();
                turns.push(ChatTurn::user(text));

                let reply = service.send_message(&id, turns).await?;
                if let Some(err) = &reply.error {
                    eprintln!("Error: {}", err);
                }
                println!("{}", reply.message.content);
                Ok(())
            }
        }
    }
}

fn list_filter(
    title: Option<String>,
    contains: Option<String>,
    since: Option<DateTime<Utc>>,
) -> FilterChat {
    let mut filter = FilterChat::default().with_updated(TimeRange::new(since, None));
    if let Some(title) = title {
        filter = filter.with_title(title);
    }
    if let Some(text) = contains {
        filter = filter.with_message_contains(text);
    }
    filter
}

async fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .wrap_err("reading stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .wrap_err(format!("reading {}", path))
}
