//! CLI route: open the store named by the configuration and dispatch commands.

use crate::api::VersionControlApi;
use crate::config::{ConfigLoader, StorageBackend, UprtclConfig};
use crate::content::{Content, Link};
use crate::entry::Entry;
use crate::error::VcError;
use crate::perspective::NewPerspective;
use crate::types::Address;
use std::path::{Path, PathBuf};
use tracing::{info_span, Instrument};

use super::parse::{
    Cli, Commands, CommitCommands, ContentCommands, ContextCommands, DraftCommands, OutputFormat,
    PerspectiveCommands,
};
use super::presentation;

/// Everything a command needs: the API over an opened replica and the output format
pub struct RunContext {
    api: VersionControlApi,
    format: OutputFormat,
}

impl RunContext {
    /// Load configuration the way the CLI flags ask for and open the store
    pub fn new(cli: &Cli) -> Result<Self, VcError> {
        let mut config = load_config(&cli.workspace, cli.config.as_ref())?;
        if let Some(store) = &cli.store {
            config.storage.backend = StorageBackend::Sled;
            config.storage.path = Some(store.clone());
        }
        if let Some(creator) = &cli.creator {
            config.agent.creator_id = creator.clone();
        }
        Self::with_config(&config, cli.format)
    }

    pub fn with_config(config: &UprtclConfig, format: OutputFormat) -> Result<Self, VcError> {
        let api = VersionControlApi::open(config)?;
        Ok(Self { api, format })
    }

    pub fn api(&self) -> &VersionControlApi {
        &self.api
    }

    /// Run one command and flush the store
    pub async fn execute(&self, command: &Commands) -> Result<String, VcError> {
        let span = info_span!("command", name = %super::help::command_name(command));
        let output = self.dispatch(command).instrument(span).await?;
        self.api.flush()?;
        Ok(output)
    }

    async fn dispatch(&self, command: &Commands) -> Result<String, VcError> {
        let format = self.format;
        match command {
            Commands::Init {
                name,
                content,
                message,
            } => {
                let bootstrap = self
                    .api
                    .create_context_perspective_and_commit(name, &Address::from(content.as_str()), message)
                    .await?;
                presentation::format_bootstrap(&bootstrap, format)
            }
            Commands::Context { command } => self.handle_context(command).await,
            Commands::Perspective { command } => self.handle_perspective(command).await,
            Commands::Content { command } => self.handle_content(command).await,
            Commands::Draft { command } => self.handle_draft(command).await,
            Commands::Commit { command } => self.handle_commit(command).await,
            Commands::Merge { from, to } => {
                let outcome = self
                    .api
                    .merge(&Address::from(from.as_str()), &Address::from(to.as_str()))
                    .await?;
                presentation::format_merge(&outcome, format)
            }
            Commands::Log { address } => {
                let address = Address::from(address.as_str());
                let start = match self.api.get_entry(&address).await? {
                    Entry::Perspective(_) => self.api.checkout(&address).await?.id,
                    _ => address,
                };
                let history = self.api.get_commit_history(&start).await?;
                presentation::format_history(&history, format)
            }
            Commands::Show { address } => {
                let entry = self.api.get_entry(&Address::from(address.as_str())).await?;
                presentation::format_entry(&entry, format)
            }
        }
    }

    async fn handle_context(&self, command: &ContextCommands) -> Result<String, VcError> {
        match command {
            ContextCommands::Create { timestamp } => {
                let timestamp = timestamp.unwrap_or_else(|| self.api.now());
                let id = self.api.create_context(timestamp).await?;
                presentation::format_address("context", &id, self.format)
            }
            ContextCommands::List { context } => {
                let listed = self
                    .api
                    .get_context_perspectives(&Address::from(context.as_str()))
                    .await?;
                presentation::format_perspectives(&listed, self.format)
            }
            ContextCommands::Created { creator } => {
                let creator = creator.as_deref().unwrap_or_else(|| self.api.creator_id());
                let contexts = self.api.contexts_created_by(creator).await?;
                presentation::format_contexts(&contexts, self.format)
            }
        }
    }

    async fn handle_perspective(&self, command: &PerspectiveCommands) -> Result<String, VcError> {
        match command {
            PerspectiveCommands::Create {
                name,
                context,
                head,
            } => {
                let mut new = NewPerspective::named(name.as_str());
                if let Some(context) = context {
                    new = new.in_context(Address::from(context.as_str()));
                }
                if let Some(head) = head {
                    new = new.with_head(Address::from(head.as_str()));
                }
                let id = self.api.create_perspective_with(new).await?;
                presentation::format_address("perspective", &id, self.format)
            }
            PerspectiveCommands::Head { perspective } => {
                let head = self
                    .api
                    .get_perspective_head(&Address::from(perspective.as_str()))
                    .await?;
                presentation::format_address("head", &head, self.format)
            }
            PerspectiveCommands::SetHead {
                perspective,
                commit,
                wait,
            } => {
                let perspective = Address::from(perspective.as_str());
                let commit = Address::from(commit.as_str());
                self.api.update_perspective_head(&perspective, &commit).await?;
                let head = if *wait {
                    self.api.await_perspective_head(&perspective, &commit).await?
                } else {
                    commit
                };
                presentation::format_address("head", &head, self.format)
            }
            PerspectiveCommands::Move {
                perspective,
                context,
            } => {
                let context = Address::from(context.as_str());
                self.api
                    .update_perspective_context(&Address::from(perspective.as_str()), &context)
                    .await?;
                presentation::format_address("context", &context, self.format)
            }
        }
    }

    async fn handle_content(&self, command: &ContentCommands) -> Result<String, VcError> {
        match command {
            ContentCommands::Put { text, file, links } => {
                let content = build_content(text.as_deref(), file.as_ref(), links)?;
                let id = self.api.put_content(&content).await?;
                presentation::format_address("content", &id, self.format)
            }
            ContentCommands::Get { address } => {
                let address = Address::from(address.as_str());
                let content = self.api.get_content(&address).await?;
                presentation::format_content(&address, &content, self.format)
            }
        }
    }

    async fn handle_draft(&self, command: &DraftCommands) -> Result<String, VcError> {
        match command {
            DraftCommands::Set {
                entry,
                text,
                file,
                links,
            } => {
                let entry = Address::from(entry.as_str());
                let content = build_content(text.as_deref(), file.as_ref(), links)?;
                self.api.set_draft(&entry, Some(&content)).await?;
                presentation::format_draft(&entry, Some(&content), self.format)
            }
            DraftCommands::Get { entry } => {
                let entry = Address::from(entry.as_str());
                let draft = self.api.get_draft(&entry).await?;
                presentation::format_draft(&entry, draft.as_ref(), self.format)
            }
            DraftCommands::Clear { entry } => {
                let entry = Address::from(entry.as_str());
                self.api.set_draft(&entry, None).await?;
                presentation::format_draft(&entry, None, self.format)
            }
        }
    }

    async fn handle_commit(&self, command: &CommitCommands) -> Result<String, VcError> {
        match command {
            CommitCommands::Create {
                content,
                parents,
                message,
            } => {
                let parents = parents.iter().map(|p| Address::from(p.as_str())).collect();
                let creator = self.api.creator_id().to_string();
                let id = self
                    .api
                    .create_commit(
                        parents,
                        &Address::from(content.as_str()),
                        message,
                        &creator,
                        self.api.now(),
                    )
                    .await?;
                presentation::format_address("commit", &id, self.format)
            }
            CommitCommands::On {
                perspective,
                content,
                message,
            } => {
                let id = self
                    .api
                    .create_commit_in_perspective(
                        &Address::from(perspective.as_str()),
                        &Address::from(content.as_str()),
                        message,
                    )
                    .await?;
                presentation::format_address("commit", &id, self.format)
            }
        }
    }
}

fn load_config(workspace: &Path, config_path: Option<&PathBuf>) -> Result<UprtclConfig, VcError> {
    match config_path {
        Some(path) => ConfigLoader::load_file(path),
        None => ConfigLoader::load(workspace),
    }
}

/// Payload from `--text` or `--file` (empty when neither is given) plus parsed links
fn build_content(
    text: Option<&str>,
    file: Option<&PathBuf>,
    links: &[String],
) -> Result<Content, VcError> {
    let payload = match (text, file) {
        (Some(text), _) => text.as_bytes().to_vec(),
        (None, Some(path)) => std::fs::read(path).map_err(|e| {
            VcError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?,
        (None, None) => Vec::new(),
    };
    let links = links
        .iter()
        .map(|raw| parse_link(raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Content::new(payload, links))
}

/// `name=address`
fn parse_link(raw: &str) -> Result<Link, VcError> {
    match raw.split_once('=') {
        Some((name, address)) if !name.is_empty() && !address.is_empty() => {
            Ok(Link::new(name, address))
        }
        _ => Err(VcError::ConfigError(format!(
            "Invalid link '{}': expected NAME=ADDRESS",
            raw
        ))),
    }
}
