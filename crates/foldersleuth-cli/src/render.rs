//! Text and JSON rendering of the folder table.

use crate::state::{FolderRow, FolderTable, RowStatus};
use foldersleuth_core::model::size::{format_count, format_size};
use foldersleuth_core::WorkerEvent;

/// Longest name shown before truncation.
const NAME_WIDTH: usize = 40;

/// Render the table as aligned text: name, size, files, status.
pub fn render_text(table: &FolderTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", table.folder.display()));
    out.push_str(&format!(
        "{:<width$}  {:>10}  {:>10}  {}\n",
        "Name",
        "Size",
        "Files",
        "Status",
        width = NAME_WIDTH
    ));

    for row in &table.rows {
        out.push_str(&format!(
            "{:<width$}  {:>10}  {:>10}  {}\n",
            truncate(&row.name, NAME_WIDTH),
            row.size_bytes.map(format_size).unwrap_or_else(|| "—".into()),
            row.file_count.map(format_count).unwrap_or_else(|| "—".into()),
            status_text(row),
            width = NAME_WIDTH
        ));
    }

    out.push_str(&format!(
        "{} (total {})\n",
        table.status_line,
        format_size(table.total_size())
    ));
    out
}

/// Render the table as pretty-printed JSON.
pub fn render_json(table: &FolderTable) -> serde_json::Result<String> {
    serde_json::to_string_pretty(table)
}

/// One-line progress text for a live event, or `None` if the event is not
/// worth showing.
pub fn render_progress(table: &FolderTable, event: &WorkerEvent) -> Option<String> {
    let WorkerEvent::Progress(progress) = event else {
        return None;
    };
    let name = table.row(&progress.root).map(|r| r.name.as_str())?;
    Some(format!(
        "{}: {} in {} files",
        truncate(name, NAME_WIDTH),
        format_size(progress.size_bytes),
        format_count(progress.file_count)
    ))
}

fn status_text(row: &FolderRow) -> String {
    match row.status {
        RowStatus::Failed => format!(
            "failed: {}",
            row.message.as_deref().unwrap_or("cache write failed")
        ),
        status if row.error_count > 0 => {
            format!("{} (partial: {} unreadable)", status.label(), row.error_count)
        }
        status => status.label().to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
