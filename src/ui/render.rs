use std::fmt::Write;

use crate::controller::{Alert, AlertKind};
use crate::domain::{FormSnapshot, FormState, Phase};

const RULE: &str = "------------------------------------------------------------";

/// Draws the whole page for one snapshot.
pub fn render(snapshot: &FormSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "                   User Biodata Form");
    let _ = writeln!(out, "{}", RULE);

    render_fields(&mut out, &snapshot.form, false);
    render_preview(&mut out, snapshot);
    let _ = writeln!(out, "  [ Create User ]");

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Fetch User by Username or Email");
    let _ = writeln!(out, "  key       : {}", snapshot.lookup.key);
    let _ = writeln!(out, "  [ Fetch User ]");
    if !snapshot.lookup.message.is_empty() {
        let _ = writeln!(out, "  {}", snapshot.lookup.message);
    }

    if snapshot.lookup.record.is_some() {
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "Edit User");
        render_fields(&mut out, &snapshot.form, true);
        render_preview(&mut out, snapshot);
        let _ = writeln!(out, "  [ Update User ]");
    }

    if snapshot.phase != Phase::Idle {
        let _ = writeln!(out, "({:?}...)", snapshot.phase);
    }
    let _ = write!(out, "{}", RULE);
    out
}

fn render_fields(out: &mut String, form: &FormState, editing: bool) {
    let required = if editing { " " } else { "*" };
    let _ = writeln!(out, "  username{} : {}", required, form.username);
    let _ = writeln!(out, "  name      : {}", form.name);
    if editing {
        let _ = writeln!(out, "  email     : {} (read-only)", form.email);
    } else {
        let _ = writeln!(out, "  email*    : {}", form.email);
    }
    let _ = writeln!(out, "  age       : {}", form.age);
}

/// A pending file wins over the stored URL, the same as the picture shown next to the form.
fn render_preview(out: &mut String, snapshot: &FormSnapshot) {
    if let Some(name) = &snapshot.pending_file {
        let _ = writeln!(out, "  image     : {} (not uploaded yet)", name);
    } else if !snapshot.form.profile_url.is_empty() {
        let _ = writeln!(out, "  image     : {}", snapshot.form.profile_url);
    }
}

pub fn render_alert(alert: &Alert) -> String {
    let title = match alert.kind {
        AlertKind::Success => "OK",
        AlertKind::Error => "ERROR",
    };
    let width = alert.message.chars().count().max(title.len()) + 4;
    let border = "=".repeat(width);
    format!("{border}\n| {title}\n| {}\n{border}", alert.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LookupState, UserRecord};

    #[test]
    fn test_edit_panel_only_with_loaded_record() {
        let mut snapshot = FormSnapshot::default();
        assert!(!render(&snapshot).contains("Edit User"));

        let record = UserRecord::new("alice", "Alice A", "a@x.com");
        snapshot.form = FormState::from_record(&record);
        snapshot.lookup = LookupState { key: "alice".to_string(), record: Some(record), message: String::new() };

        let page = render(&snapshot);
        assert!(page.contains("Edit User"));
        assert!(page.contains("a@x.com (read-only)"));
        assert!(page.contains("[ Update User ]"));
    }

    #[test]
    fn test_preview_prefers_pending_file() {
        let mut snapshot = FormSnapshot::default();
        assert!(!render(&snapshot).contains("image"));

        snapshot.form.profile_url = "https://img/a.png".to_string();
        assert!(render(&snapshot).contains("image     : https://img/a.png"));

        snapshot.pending_file = Some("me.png".to_string());
        let page = render(&snapshot);
        assert!(page.contains("me.png (not uploaded yet)"));
        assert!(!page.contains("https://img/a.png"));
    }

    #[test]
    fn test_status_line() {
        let mut snapshot = FormSnapshot::default();
        snapshot.lookup.message = "User not found".to_string();
        assert!(render(&snapshot).contains("  User not found"));
    }

    #[test]
    fn test_render_alert() {
        let text = render_alert(&Alert::error("Insert error: boom"));
        assert!(text.contains("| ERROR"));
        assert!(text.contains("| Insert error: boom"));
    }
}
