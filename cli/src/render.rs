//! Plain-text rendering of a [`DirectoryState`] snapshot.

use std::fmt::Write as _;

use directory_core::{DirectoryState, LoadStatus};

/// Renders the user list, or the page-level error if the list never loaded.
pub fn render(state: &DirectoryState) -> String {
    let mut out = String::new();

    if let LoadStatus::Failed(message) = &state.load {
        let _ = writeln!(out, "Error: {message}");
        if state.users.is_empty() {
            return out;
        }
    }
    for (_, message) in state.notices() {
        let _ = writeln!(out, "! {message}");
    }
    if state.users.is_empty() {
        out.push_str("(no users)\n");
        return out;
    }

    let id_width = state
        .users
        .iter()
        .map(|u| u.id.to_string().len())
        .max()
        .unwrap_or(0)
        .max(2);
    let name_width = state
        .users
        .iter()
        .map(|u| u.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let _ = writeln!(out, "{:<id_width$}  {:<name_width$}  EMAIL", "ID", "NAME");
    for user in &state.users {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {}",
            user.id.to_string(),
            user.name,
            user.email
        );
    }
    out
}
