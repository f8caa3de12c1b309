//! Dotted command names for log spans (e.g. "perspective.set-head").

use crate::cli::parse::{
    Commands, CommitCommands, ContentCommands, ContextCommands, DraftCommands,
    PerspectiveCommands,
};

pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Init { .. } => "init".to_string(),
        Commands::Context { command } => format!("context.{}", context_command_name(command)),
        Commands::Perspective { command } => {
            format!("perspective.{}", perspective_command_name(command))
        }
        Commands::Content { command } => format!("content.{}", content_command_name(command)),
        Commands::Draft { command } => format!("draft.{}", draft_command_name(command)),
        Commands::Commit { command } => format!("commit.{}", commit_command_name(command)),
        Commands::Merge { .. } => "merge".to_string(),
        Commands::Log { .. } => "log".to_string(),
        Commands::Show { .. } => "show".to_string(),
    }
}

fn context_command_name(command: &ContextCommands) -> &'static str {
    match command {
        ContextCommands::Create { .. } => "create",
        ContextCommands::List { .. } => "list",
        ContextCommands::Created { .. } => "created",
    }
}

fn perspective_command_name(command: &PerspectiveCommands) -> &'static str {
    match command {
        PerspectiveCommands::Create { .. } => "create",
        PerspectiveCommands::Head { .. } => "head",
        PerspectiveCommands::SetHead { .. } => "set-head",
        PerspectiveCommands::Move { .. } => "move",
    }
}

fn content_command_name(command: &ContentCommands) -> &'static str {
    match command {
        ContentCommands::Put { .. } => "put",
        ContentCommands::Get { .. } => "get",
    }
}

fn draft_command_name(command: &DraftCommands) -> &'static str {
    match command {
        DraftCommands::Set { .. } => "set",
        DraftCommands::Get { .. } => "get",
        DraftCommands::Clear { .. } => "clear",
    }
}

fn commit_command_name(command: &CommitCommands) -> &'static str {
    match command {
        CommitCommands::Create { .. } => "create",
        CommitCommands::On { .. } => "on",
    }
}
