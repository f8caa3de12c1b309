//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::VcError;

/// One line for stderr; conflicts list every path on its own line
pub fn map_error(e: &VcError) -> String {
    match e {
        VcError::MergeConflict { paths } => {
            let mut out = String::from("Merge conflict:");
            for path in paths {
                out.push_str("\n  ");
                out.push_str(path);
            }
            out
        }
        other => other.to_string(),
    }
}
