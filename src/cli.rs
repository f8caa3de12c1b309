//! CLI domain: parse, route, help, output, and presentation only.
//! Every command goes through `VersionControlApi`.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{
    Cli, Commands, CommitCommands, ContentCommands, ContextCommands, DraftCommands, OutputFormat,
    PerspectiveCommands,
};
pub use route::RunContext;
