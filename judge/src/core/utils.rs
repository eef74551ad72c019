use std::path::{Path, PathBuf};

/// Walk from `start` up through its ancestors and return the first
/// `<ancestor>/<name>` that exists.
pub fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

/// Keep at most `limit` characters, for log and report previews.
pub fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
