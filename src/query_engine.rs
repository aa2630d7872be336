use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::analyzer::TextAnalyzer;
use crate::data_models::{HIGHLIGHT_POST_TAG, HIGHLIGHT_PRE_TAG, Highlight, Hit, Meta, SearchResult};
use crate::store::{DocId, IndexState, Store, StoreError};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_FUZZINESS: u8 = 2;
const DEFAULT_SORT: &str = "Title,LineNumber";

pub fn intersect_two_postings<'a, T>(
    posting_list1: &'a [T],
    posting_list2: &'a [T],
    out: &mut Vec<T>,
) where
    T: Ord + Clone,
{
    let (mut p1i, mut p2i) = (0usize, 0usize);
    while p1i < posting_list1.len() && p2i < posting_list2.len() {
        match posting_list1[p1i].cmp(&posting_list2[p2i]) {
            Ordering::Equal => {
                out.push(posting_list1[p1i].clone());
                p1i += 1;
                p2i += 1;
            }
            Ordering::Less => p1i += 1,
            Ordering::Greater => p2i += 1,
        }
    }
}

#[test]
fn test_intersect_two_postings() {
    {
        let p1 = vec![1, 2, 3, 4, 5];
        let p2 = vec![2, 10, 12, 15];
        let mut out = Vec::new();
        intersect_two_postings(&p1, &p2, &mut out);
        assert_eq!(out, vec![2]);
    }

    {
        let p1 = vec![2, 10, 45, 100, 1000];
        let p2 = vec![2, 20, 45, 1000];
        let mut out = Vec::new();
        intersect_two_postings(&p1, &p2, &mut out);
        assert_eq!(out, vec![2, 45, 1000]);
    }

    {
        let p1 = vec![100, 101, 102, 105];
        let p2 = vec![1, 2, 3, 4, 5];
        let mut out = Vec::new();
        intersect_two_postings(&p1, &p2, &mut out);
        assert!(out.is_empty());
    }
}

/// Merges two sorted, duplicate-free lists into one sorted, duplicate-free list.
pub fn merge_sorted_lists_dedup<T>(list_a: &[T], list_b: &[T]) -> Vec<T>
where
    T: Ord + Copy,
{
    let (mut a_ptr, mut b_ptr) = (0, 0);
    let mut res = Vec::with_capacity(list_a.len() + list_b.len());
    while a_ptr < list_a.len() && b_ptr < list_b.len() {
        match list_a[a_ptr].cmp(&list_b[b_ptr]) {
            Ordering::Less => {
                res.push(list_a[a_ptr]);
                a_ptr += 1;
            }
            Ordering::Greater => {
                res.push(list_b[b_ptr]);
                b_ptr += 1;
            }
            Ordering::Equal => {
                res.push(list_a[a_ptr]);
                a_ptr += 1;
                b_ptr += 1;
            }
        }
    }
    res.extend_from_slice(&list_a[a_ptr..]);
    res.extend_from_slice(&list_b[b_ptr..]);
    res
}

#[test]
fn test_merge_sorted_lists_dedup() {
    assert_eq!(
        merge_sorted_lists_dedup(&[1, 4, 9], &[2, 4, 10, 11]),
        vec![1, 2, 4, 9, 10, 11]
    );
    assert_eq!(merge_sorted_lists_dedup::<u32>(&[], &[3]), vec![3]);
    assert!(merge_sorted_lists_dedup::<u32>(&[], &[]).is_empty());
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[test]
fn test_edit_distance() {
    assert_eq!(edit_distance("romeo", "romeo"), 0);
    assert_eq!(edit_distance("romeo", "romea"), 1);
    assert_eq!(edit_distance("juliet", "juliett"), 1);
    assert_eq!(edit_distance("dagger", "dgager"), 2);
    assert_eq!(edit_distance("", "abc"), 3);
}

/// Query parameters accepted by `/search`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchOptions {
    #[serde(rename = "q")]
    pub query: String,
    pub fuzziness: u8,
    #[serde(rename = "workId")]
    pub work_id: Option<u32>,
    #[serde(rename = "page[number]")]
    pub page_number: usize,
    #[serde(rename = "page[size]")]
    pub page_size: usize,
    /// Sort fields, comma-delimited (`Title,-LineNumber`) and/or repeated
    /// (`sortBy=Title&sortBy=-LineNumber`).
    #[serde(rename = "sortBy")]
    pub sort_by: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            fuzziness: 0,
            work_id: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: Vec::new(),
        }
    }
}

impl SearchOptions {
    /// Number of hits skipped before the requested page.
    /// `None` when the offset does not fit in a `usize`.
    pub fn offset(&self) -> Option<usize> {
        self.page_number.saturating_sub(1).checked_mul(self.page_size)
    }

    pub fn sort_keys(&self) -> Result<Vec<SortKey>, StoreError> {
        let fields: Vec<&str> = self
            .sort_by
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if fields.is_empty() {
            return DEFAULT_SORT.split(',').map(SortKey::parse).collect();
        }
        fields.into_iter().map(SortKey::parse).collect()
    }

    pub fn validate(&self, max_page_size: usize) -> Result<(), StoreError> {
        if self.fuzziness > MAX_FUZZINESS {
            return Err(StoreError::InvalidOptions(format!(
                "fuzziness {} exceeds max ({})",
                self.fuzziness, MAX_FUZZINESS
            )));
        }
        if self.page_number == 0 {
            return Err(StoreError::InvalidOptions(
                "page[number] must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > max_page_size {
            return Err(StoreError::InvalidOptions(format!(
                "page[size] must be between 1 and {}",
                max_page_size
            )));
        }
        if self.offset().is_none() {
            return Err(StoreError::InvalidOptions(
                "page[number] out of range".to_string(),
            ));
        }
        Ok(())
    }

    fn work_filter(&self) -> Option<u32> {
        self.work_id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    LineNumber,
    WorkId,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let field = match name.to_ascii_lowercase().as_str() {
            "title" => SortField::Title,
            "linenumber" => SortField::LineNumber,
            "workid" => SortField::WorkId,
            "_score" => SortField::Score,
            _ => {
                return Err(StoreError::InvalidOptions(format!(
                    "unknown sort field: {}",
                    raw
                )));
            }
        };
        Ok(Self { field, descending })
    }
}

#[test]
fn test_sort_key_parse() {
    assert_eq!(
        SortKey::parse("-_score").unwrap(),
        SortKey {
            field: SortField::Score,
            descending: true
        }
    );
    assert_eq!(SortKey::parse("lineNumber").unwrap().field, SortField::LineNumber);
    assert!(SortKey::parse("Author").is_err());
}

#[test]
fn test_sort_keys_comma_and_repeated() {
    let keys = |sort_by: &[&str]| {
        SearchOptions {
            sort_by: sort_by.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
        .sort_keys()
        .unwrap()
        .into_iter()
        .map(|k| (k.field, k.descending))
        .collect::<Vec<_>>()
    };
    let expected = vec![(SortField::Title, true), (SortField::LineNumber, true)];
    assert_eq!(keys(&["-Title,-LineNumber"]), expected);
    assert_eq!(keys(&["-Title", "-LineNumber"]), expected);
    assert_eq!(
        keys(&[]),
        vec![(SortField::Title, false), (SortField::LineNumber, false)]
    );
    assert_eq!(keys(&[""]), keys(&[]));
}

#[test]
fn test_offset_overflow_rejected() {
    let options = SearchOptions {
        page_number: usize::MAX,
        page_size: 2,
        ..Default::default()
    };
    assert_eq!(options.offset(), None);
    assert_eq!(
        options.validate(1000),
        Err(StoreError::InvalidOptions(
            "page[number] out of range".to_string()
        ))
    );

    let last = SearchOptions {
        page_number: usize::MAX / 2 + 1,
        page_size: 2,
        ..Default::default()
    };
    assert_eq!(last.offset(), Some(usize::MAX - 1));
    assert!(last.validate(1000).is_ok());
}

struct Candidate {
    doc_id: DocId,
    score: f64,
}

pub struct QueryEngine {
    store: Arc<Store>,
    max_page_size: usize,
}

impl QueryEngine {
    pub fn new(store: Arc<Store>, max_page_size: usize) -> Self {
        Self {
            store,
            max_page_size,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn analyzer(&self) -> &TextAnalyzer {
        self.store.analyzer()
    }

    /// Index terms the query term matches: itself, or every term within `fuzziness` edits.
    fn expand_term<'s>(state: &'s IndexState, term: &str, fuzziness: u8) -> Vec<&'s str> {
        if fuzziness == 0 {
            return state
                .dictionary
                .get_key_value(term)
                .map(|(k, _)| vec![k.as_str()])
                .unwrap_or_default();
        }
        let max = fuzziness as usize;
        let len = term.chars().count();
        state
            .dictionary
            .keys()
            .filter(|candidate| candidate.chars().count().abs_diff(len) <= max)
            .filter(|candidate| edit_distance(term, candidate) <= max)
            .map(String::as_str)
            .collect()
    }

    pub async fn search(&self, options: &SearchOptions) -> Result<SearchResult, StoreError> {
        options.validate(self.max_page_size)?;
        let sort_keys = options.sort_keys()?;

        let state = self.store.read().await;
        let doc_count = state.documents.len();

        let mut matched_terms: HashSet<&str> = HashSet::new();
        let mut candidates: Vec<Candidate> = if options.query.trim().is_empty() {
            state
                .all_doc_ids()
                .into_iter()
                .map(|doc_id| Candidate { doc_id, score: 1.0 })
                .collect()
        } else {
            let mut query_terms: Vec<String> = self
                .analyzer()
                .analyze(&options.query)
                .into_iter()
                .map(|t| t.term)
                .collect();
            query_terms.sort();
            query_terms.dedup();

            for term in &query_terms {
                matched_terms.extend(Self::expand_term(&state, term, options.fuzziness));
            }

            // disjunction: a line matches if any expanded term occurs in it
            let mut union: Vec<DocId> = Vec::new();
            for term in &matched_terms {
                union = merge_sorted_lists_dedup(&union, &state.dictionary[*term].postings);
            }

            union
                .into_iter()
                .map(|doc_id| {
                    let score = matched_terms
                        .iter()
                        .map(|term| {
                            let item = &state.dictionary[*term];
                            let idf =
                                (1.0 + doc_count as f64 / item.document_frequency() as f64).ln();
                            item.term_frequency(doc_id) as f64 * idf
                        })
                        .sum();
                    Candidate { doc_id, score }
                })
                .collect()
        };

        if let Some(work_id) = options.work_filter() {
            let work_docs = state
                .work_postings
                .get(&work_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let ids: Vec<DocId> = candidates.iter().map(|c| c.doc_id).collect();
            let mut keep = Vec::new();
            intersect_two_postings(&ids, work_docs, &mut keep);
            let keep: HashSet<DocId> = keep.into_iter().collect();
            candidates.retain(|c| keep.contains(&c.doc_id));
        }

        candidates.sort_by(|a, b| Self::compare(&state, &sort_keys, a, b));

        let total_results = candidates.len();
        let data = candidates
            .into_iter()
            .skip(options.offset().unwrap_or(usize::MAX))
            .take(options.page_size)
            .filter_map(|c| {
                let doc = state.document(c.doc_id)?;
                Some(Hit {
                    line: highlight(self.analyzer(), &doc.text, &matched_terms),
                    line_number: doc.line_number,
                    score: c.score,
                    title: doc.title.clone(),
                    work_id: doc.work_id,
                })
            })
            .collect::<Vec<Hit>>();

        log::debug!(
            "query {:?} fuzziness={} matched {} lines",
            options.query,
            options.fuzziness,
            total_results
        );

        Ok(SearchResult {
            data,
            meta: Meta {
                highlight: Highlight::default(),
                page_number: options.page_number,
                page_size: options.page_size,
                total_results,
            },
        })
    }

    fn compare(state: &IndexState, keys: &[SortKey], a: &Candidate, b: &Candidate) -> Ordering {
        let (Some(da), Some(db)) = (state.document(a.doc_id), state.document(b.doc_id)) else {
            return a.doc_id.cmp(&b.doc_id);
        };
        for key in keys {
            let ord = match key.field {
                SortField::Title => da.title.cmp(&db.title),
                SortField::LineNumber => da.line_number.cmp(&db.line_number),
                SortField::WorkId => da.work_id.cmp(&db.work_id),
                SortField::Score => a.score.total_cmp(&b.score),
            };
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.doc_id.cmp(&b.doc_id)
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes `text` and wraps every word whose analyzed term was matched in highlight tags.
pub fn highlight(analyzer: &TextAnalyzer, text: &str, matched_terms: &HashSet<&str>) -> String {
    if matched_terms.is_empty() {
        return escape_html(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for token in analyzer.analyze(text) {
        if !matched_terms.contains(token.term.as_str()) || token.start < last {
            continue;
        }
        out.push_str(&escape_html(&text[last..token.start]));
        out.push_str(HIGHLIGHT_PRE_TAG);
        out.push_str(&escape_html(&text[token.start..token.end]));
        out.push_str(HIGHLIGHT_POST_TAG);
        last = token.end;
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

#[test]
fn test_highlight_marks_matches_and_escapes() {
    let analyzer = TextAnalyzer::english();
    let matched = HashSet::from(["dagger"]);
    assert_eq!(
        highlight(&analyzer, "Is this a dagger <which> I see?", &matched),
        "Is this a <mark>dagger</mark> &lt;which&gt; I see?"
    );
    assert_eq!(
        highlight(&analyzer, "Daggers, daggers!", &matched),
        "<mark>Daggers</mark>, <mark>daggers</mark>!"
    );
    assert_eq!(highlight(&analyzer, "a & b", &HashSet::new()), "a &amp; b");
}
