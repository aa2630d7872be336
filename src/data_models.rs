use serde::{Deserialize, Serialize};

pub const HIGHLIGHT_PRE_TAG: &str = "<mark>";
pub const HIGHLIGHT_POST_TAG: &str = "</mark>";

/// One of Shakespeare's works (play, poem, sonnet collection, ...).
///
/// `id` may be missing from the corpus file; ids are assigned on load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShakespeareWork {
    #[serde(default)]
    pub id: u32,
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub title: String,
    pub work_id: u32,
}

/// A single non-blank line of a work; the unit the index works on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub line_number: usize,
    pub text: String,
    pub title: String,
    pub work_id: u32,
}

/// A matched line as returned by `/search`. `line` is HTML with matches wrapped in highlight tags.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub line: String,
    pub line_number: usize,
    pub score: f64,
    pub title: String,
    pub work_id: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub post_tag: String,
    pub pre_tag: String,
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            post_tag: HIGHLIGHT_POST_TAG.to_string(),
            pre_tag: HIGHLIGHT_PRE_TAG.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub highlight: Highlight,
    pub page_number: usize,
    pub page_size: usize,
    pub total_results: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub data: Vec<Hit>,
    pub meta: Meta,
}
