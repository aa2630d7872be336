use std::sync::{Mutex, MutexGuard};

use super::render::ResultRow;

/// The two display regions a search updates (the `#total` summary and the
/// `#table-body` rows), plus an error line.
pub trait ResultView: Send + Sync {
    fn set_summary(&self, text: &str);
    /// Replaces all rows at once. Rows from an earlier search never survive.
    fn replace_rows(&self, rows: Vec<ResultRow>);
    /// Shown when a search fails; the previous rows stay as they were.
    fn show_error(&self, message: &str);
}

#[derive(Debug, Default)]
struct ViewState {
    summary: String,
    rows: Vec<ResultRow>,
    error: Option<String>,
    renders: usize,
}

/// Keeps the rendered state in memory.
#[derive(Debug, Default)]
pub struct MemoryView {
    state: Mutex<ViewState>,
}

impl MemoryView {
    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn summary(&self) -> String {
        self.lock().summary.clone()
    }

    pub fn rows(&self) -> Vec<ResultRow> {
        self.lock().rows.clone()
    }

    /// The table body as the browser would hold it.
    pub fn rows_html(&self) -> Vec<String> {
        self.lock().rows.iter().map(ResultRow::to_html).collect()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Number of times the rows were replaced.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }
}

impl ResultView for MemoryView {
    fn set_summary(&self, text: &str) {
        let mut state = self.lock();
        state.summary = text.to_string();
        state.error = None;
    }

    fn replace_rows(&self, rows: Vec<ResultRow>) {
        let mut state = self.lock();
        state.rows = rows;
        state.renders += 1;
    }

    fn show_error(&self, message: &str) {
        self.lock().error = Some(message.to_string());
    }
}

/// Prints results to stdout, errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalView;

impl ResultView for TerminalView {
    fn set_summary(&self, text: &str) {
        println!("{}", text);
    }

    fn replace_rows(&self, rows: Vec<ResultRow>) {
        for row in rows {
            println!("{}", row.to_plain());
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("search failed: {}", message);
    }
}
