//! CLI presentation: turn results into text tables or JSON.

use crate::api::{Bootstrap, ListedPerspective};
use crate::commit::Commit;
use crate::content::Content;
use crate::context::Context;
use crate::entry::Entry;
use crate::error::VcError;
use crate::merge::MergeOutcome;
use crate::perspective::{is_root_sentinel, Perspective};
use crate::types::Address;
use chrono::{TimeZone, Utc};
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;

use super::parse::OutputFormat;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, VcError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| VcError::Storage(format!("Failed to serialize output: {}", e)))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn format_time(timestamp: u64) -> String {
    Utc.timestamp_millis_opt(timestamp as i64)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

fn format_head(head: &Address) -> String {
    if is_root_sentinel(head) {
        "(empty)".to_string()
    } else {
        head.short().to_string()
    }
}

/// A bare address, or `{"<key>": "<address>"}`
pub fn format_address(
    key: &str,
    address: &Address,
    format: OutputFormat,
) -> Result<String, VcError> {
    match format {
        OutputFormat::Text => Ok(address.to_string()),
        OutputFormat::Json => to_json(&json!({ key: address })),
    }
}

pub fn format_bootstrap(bootstrap: &Bootstrap, format: OutputFormat) -> Result<String, VcError> {
    match format {
        OutputFormat::Json => to_json(bootstrap),
        OutputFormat::Text => Ok(format!(
            "context      {}\nperspective  {}\ncommit       {}",
            bootstrap.context_id, bootstrap.perspective_id, bootstrap.commit_id
        )),
    }
}

pub fn format_perspectives(
    listed: &[ListedPerspective],
    format: OutputFormat,
) -> Result<String, VcError> {
    if format == OutputFormat::Json {
        return to_json(listed);
    }
    if listed.is_empty() {
        return Ok("No perspectives".to_string());
    }

    let mut table = new_table(vec!["Id", "Name", "Head", "Creator", "Created"]);
    for item in listed {
        let p = &item.payload;
        table.add_row(vec![
            item.id.short().to_string(),
            p.name.clone(),
            format_head(&p.head_commit_id),
            p.creator_id.clone(),
            format_time(p.created_at),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_contexts(contexts: &[Context], format: OutputFormat) -> Result<String, VcError> {
    if format == OutputFormat::Json {
        return to_json(contexts);
    }
    if contexts.is_empty() {
        return Ok("No contexts".to_string());
    }

    let mut table = new_table(vec!["Id", "Creator", "Created", "Nonce"]);
    for context in contexts {
        table.add_row(vec![
            context.id.short().to_string(),
            context.creator_id.clone(),
            format_time(context.timestamp),
            context.nonce.to_string(),
        ]);
    }
    Ok(table.to_string())
}

/// Draft of an entry; text output says so when there is none
pub fn format_draft(
    entry: &Address,
    draft: Option<&Content>,
    format: OutputFormat,
) -> Result<String, VcError> {
    match (draft, format) {
        (Some(content), _) => format_content(entry, content, format),
        (None, OutputFormat::Json) => to_json(&json!({ "id": entry, "draft": null })),
        (None, OutputFormat::Text) => Ok("No draft".to_string()),
    }
}

pub fn format_perspective(perspective: &Perspective, format: OutputFormat) -> Result<String, VcError> {
    if format == OutputFormat::Json {
        return to_json(perspective);
    }
    let mut table = new_table(vec!["Field", "Value"]);
    table.add_row(vec!["id".to_string(), perspective.id.to_string()]);
    table.add_row(vec!["name".to_string(), perspective.name.clone()]);
    table.add_row(vec![
        "context".to_string(),
        perspective
            .context_id
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["head".to_string(), format_head(&perspective.head_commit_id)]);
    table.add_row(vec!["creator".to_string(), perspective.creator_id.clone()]);
    table.add_row(vec!["origin".to_string(), format!("{:?}", perspective.origin)]);
    table.add_row(vec!["created".to_string(), format_time(perspective.created_at)]);
    Ok(table.to_string())
}

pub fn format_content(
    address: &Address,
    content: &Content,
    format: OutputFormat,
) -> Result<String, VcError> {
    if format == OutputFormat::Json {
        return to_json(&json!({
            "id": address,
            "payload": String::from_utf8_lossy(&content.payload),
            "links": content.links,
        }));
    }

    let mut out = String::from_utf8_lossy(&content.payload).into_owned();
    if !content.links.is_empty() {
        let mut table = new_table(vec!["Link", "Address"]);
        for link in &content.links {
            table.add_row(vec![link.name.clone(), link.address.to_string()]);
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&table.to_string());
    }
    Ok(out)
}

pub fn format_history(commits: &[Commit], format: OutputFormat) -> Result<String, VcError> {
    if format == OutputFormat::Json {
        return to_json(commits);
    }
    let mut table = new_table(vec!["Commit", "Parents", "Creator", "Time", "Message"]);
    for commit in commits {
        let parents: Vec<&str> = commit.parent_ids.iter().map(|p| p.short()).collect();
        table.add_row(vec![
            commit.id.short().to_string(),
            parents.join(" "),
            commit.creator_id.clone(),
            format_time(commit.timestamp),
            commit.message.clone(),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_merge(outcome: &MergeOutcome, format: OutputFormat) -> Result<String, VcError> {
    match format {
        OutputFormat::Json => to_json(outcome),
        OutputFormat::Text => Ok(match outcome {
            MergeOutcome::UpToDate(head) => format!("Already up to date at {}", head),
            MergeOutcome::FastForward(head) => format!("Fast-forward to {}", head),
            MergeOutcome::Merged(head) => format!("Merge commit {}", head),
        }),
    }
}

pub fn format_entry(entry: &Entry, format: OutputFormat) -> Result<String, VcError> {
    match (entry, format) {
        (_, OutputFormat::Json) => to_json(entry),
        (Entry::Perspective(p), OutputFormat::Text) => format_perspective(p, format),
        (Entry::Commit(c), OutputFormat::Text) => format_history(std::slice::from_ref(c), format),
        (Entry::Content(c), OutputFormat::Text) => format_content(&c.id, &c.content, format),
        (Entry::Context(c), OutputFormat::Text) => {
            let mut table = new_table(vec!["Field", "Value"]);
            table.add_row(vec!["id".to_string(), c.id.to_string()]);
            table.add_row(vec!["creator".to_string(), c.creator_id.clone()]);
            table.add_row(vec!["created".to_string(), format_time(c.timestamp)]);
            table.add_row(vec!["nonce".to_string(), c.nonce.to_string()]);
            Ok(table.to_string())
        }
    }
}
