use crate::errors::ThreadsCLIError;
use bson::DateTime;
use threads_common::http::responses::{ReplyView, ThreadView};

pub mod fs;

/// Load the session token stored by `threads login`
pub fn session_guard() -> Result<String, ThreadsCLIError> {
    fs::read_session(&fs::get_storage_path()?)
}

fn timestamp(date: &DateTime) -> String {
    date.try_to_rfc3339_string()
        .unwrap_or_else(|_| date.timestamp_millis().to_string())
}

pub fn format_reply(reply: &ReplyView) -> String {
    format!(
        "  ↳ [{}] @{} ({}): {}",
        reply.oid.to_hex(),
        reply.author.username,
        timestamp(&reply.created_at),
        reply.text
    )
}

/// Render a thread with its direct replies, one per line
pub fn format_thread(thread: &ThreadView) -> String {
    let community = match &thread.community {
        Some(community) => format!(" in {}", community.name),
        None => String::new(),
    };
    let mut lines = vec![format!(
        "[{}] @{}{} ({}): {}",
        thread.oid.to_hex(),
        thread.author.username,
        community,
        timestamp(&thread.created_at),
        thread.text
    )];
    lines.extend(thread.children.iter().map(format_reply));
    lines.join("\n")
}

pub fn format_threads(threads: &[ThreadView]) -> String {
    match threads.is_empty() {
        true => String::from("No threads yet"),
        false => threads
            .iter()
            .map(format_thread)
            .collect::<Vec<String>>()
            .join("\n\n"),
    }
}
