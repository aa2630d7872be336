use serde::Deserialize;

use super::form::ClientConfig;
use super::view::ResultView;
use crate::data_models::{HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG};
use crate::query_engine::escape_html;

pub const NO_RESULTS: &str = "No results";

/// Response body of `/search` as the client reads it. Absent `meta`,
/// `totalResults` or `data` read as zero/empty instead of failing the render.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub data: Vec<ResponseHit>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHit {
    pub title: String,
    pub line_number: u64,
    pub line: String,
}

/// One table row. `line` is markup from the search service and is never escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub title: String,
    pub line_number: u64,
    pub line: String,
}

impl ResultRow {
    pub fn to_html(&self) -> String {
        format!(
            "<tr><td>[{}] {}.&ensp;{}</td></tr>",
            escape_html(&self.title),
            self.line_number,
            self.line
        )
    }

    /// Terminal form: highlight tags dropped.
    pub fn to_plain(&self) -> String {
        let line = self
            .line
            .replace(HIGHLIGHT_PRE_TAG, "")
            .replace(HIGHLIGHT_POST_TAG, "");
        format!("[{}] {}.\u{2002}{}", self.title, self.line_number, line)
    }
}

impl From<&ResponseHit> for ResultRow {
    fn from(hit: &ResponseHit) -> Self {
        Self {
            title: hit.title.clone(),
            line_number: hit.line_number,
            line: hit.line.clone(),
        }
    }
}

pub fn summary_text(total_results: u64, page_size: u32) -> String {
    match total_results {
        0 => NO_RESULTS.to_string(),
        1 => format!("1 result (showing up to {})", page_size),
        n => format!("{} results (showing up to {})", n, page_size),
    }
}

/// Replaces the summary and every table row of `view` with `response`.
pub fn render_response(response: &SearchResponse, view: &dyn ResultView, config: &ClientConfig) {
    view.set_summary(&summary_text(response.meta.total_results, config.page_size));
    let rows = response.data.iter().map(ResultRow::from).collect();
    view.replace_rows(rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::view::MemoryView;

    fn hit(title: &str, line_number: u64, line: &str) -> ResponseHit {
        ResponseHit {
            title: title.to_string(),
            line_number,
            line: line.to_string(),
        }
    }

    #[test]
    fn test_zero_results_summary() {
        let view = MemoryView::default();
        render_response(&SearchResponse::default(), &view, &ClientConfig::default());
        assert_eq!(view.summary(), "No results");
        assert!(view.rows().is_empty());
    }

    #[test]
    fn test_summary_discloses_page_size() {
        let view = MemoryView::default();
        let response = SearchResponse {
            meta: ResponseMeta { total_results: 42 },
            data: vec![],
        };
        render_response(&response, &view, &ClientConfig { page_size: 1000 });
        let summary = view.summary();
        assert!(summary.contains("42"));
        assert!(summary.contains("1000"));
    }

    #[test]
    fn test_single_hit_row_order() {
        let view = MemoryView::default();
        let response = SearchResponse {
            meta: ResponseMeta { total_results: 1 },
            data: vec![hit("a.txt", 3, "hello")],
        };
        render_response(&response, &view, &ClientConfig::default());

        let rows = view.rows_html();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let (t, n, l) = (
            row.find("a.txt").unwrap(),
            row.find('3').unwrap(),
            row.find("hello").unwrap(),
        );
        assert!(t < n && n < l, "unexpected row layout: {}", row);
        assert_eq!(row, "<tr><td>[a.txt] 3.&ensp;hello</td></tr>");
    }

    #[test]
    fn test_rerender_replaces_rows() {
        let view = MemoryView::default();
        let config = ClientConfig::default();
        let first = SearchResponse {
            meta: ResponseMeta { total_results: 2 },
            data: vec![hit("A", 1, "one"), hit("A", 2, "two")],
        };
        let second = SearchResponse {
            meta: ResponseMeta { total_results: 1 },
            data: vec![hit("B", 9, "nine")],
        };
        render_response(&first, &view, &config);
        render_response(&second, &view, &config);

        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].title, "B");
        assert!(view.summary().starts_with("1 result"));
    }

    #[test]
    fn test_line_markup_kept_title_escaped() {
        let row = ResultRow::from(&hit("<b>", 1, "a <mark>dagger</mark>"));
        assert_eq!(
            row.to_html(),
            "<tr><td>[&lt;b&gt;] 1.&ensp;a <mark>dagger</mark></td></tr>"
        );
        assert_eq!(row.to_plain(), "[<b>] 1.\u{2002}a dagger");
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response, SearchResponse::default());
        let response: SearchResponse = serde_json::from_str(r#"{"meta": {}}"#).unwrap();
        assert_eq!(response.meta.total_results, 0);
    }
}
