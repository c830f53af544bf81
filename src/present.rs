//! Digest rendering.
//!
//! Two views of the same [`DigestSummary`]: plain console text and the
//! Slack `mrkdwn` message posted by [`crate::webhook`]. Both list at most
//! [`SECTION_LIMIT`] items per section while the heading reports the full
//! count.

use std::fmt::Write as _;

use crate::models::{DigestSummary, Item};
use crate::window::ActivityWindow;

/// Items listed per section.
pub const SECTION_LIMIT: usize = 20;

pub const NEW_PAPERS_HEADING: &str = "New papers added";
pub const READ_PAPERS_HEADING: &str = "Papers read (notes/annotations by all group members)";

const DATE_FORMAT: &str = "%b %d, %Y";

/// Console view.
///
/// ```text
///
/// Zotero daily digest — Mar 01, 2024 (last 3 days (weekend extended))
///
/// New papers added (2)
///   • Attention Is All You Need
///     https://www.zotero.org/groups/1/items/ABCD2345
///   • ...
///
/// Papers read (notes/annotations by all group members) (0)
///   • None
///
/// ```
pub fn render_console(summary: &DigestSummary, window: &ActivityWindow) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nZotero daily digest — {} ({})\n",
        window.start.format(DATE_FORMAT),
        window.describe()
    );
    console_section(&mut out, NEW_PAPERS_HEADING, &summary.new_papers);
    console_section(&mut out, READ_PAPERS_HEADING, &summary.read_papers);
    out
}

fn console_section(out: &mut String, heading: &str, items: &[Item]) {
    let _ = writeln!(out, "{} ({})", heading, items.len());
    if items.is_empty() {
        let _ = writeln!(out, "  • None");
    }
    for item in items.iter().take(SECTION_LIMIT) {
        let _ = writeln!(out, "  • {}", item.display_title());
        if let Some(link) = item.link() {
            let _ = writeln!(out, "    {}", link);
        }
    }
    out.push('\n');
}

/// Slack view: bold headings and `<url|title>` links.
pub fn render_slack(summary: &DigestSummary, window: &ActivityWindow) -> String {
    let mut text = format!(
        "*Zotero Daily Digest — {} ({})*\n\n",
        window.start.format(DATE_FORMAT),
        window.describe()
    );
    slack_section(&mut text, "📚", NEW_PAPERS_HEADING, &summary.new_papers);
    text.push('\n');
    slack_section(&mut text, "📖", READ_PAPERS_HEADING, &summary.read_papers);
    text
}

fn slack_section(text: &mut String, icon: &str, heading: &str, items: &[Item]) {
    let _ = writeln!(text, "*{} {} ({})*", icon, heading, items.len());
    if items.is_empty() {
        text.push_str("• None\n");
        return;
    }
    for item in items.iter().take(SECTION_LIMIT) {
        let title = escape_slack(&item.display_title());
        match item.link() {
            Some(link) => {
                let _ = writeln!(text, "• <{}|{}>", link, title);
            }
            None => {
                let _ = writeln!(text, "• {}", title);
            }
        }
    }
}

/// Escape the three characters Slack treats as control characters.
fn escape_slack(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
