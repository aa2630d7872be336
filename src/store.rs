use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::analyzer::TextAnalyzer;
use crate::data_models::{Document, ShakespeareWork, Title};

/// Position of a line in `IndexState::documents`.
pub type DocId = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("work not found: {0}")]
    WorkNotFound(u32),
    #[error("invalid search options: {0}")]
    InvalidOptions(String),
}

/// Postings for one term. Doc ids are appended in increasing order, so
/// `postings` stays sorted and unique without a merge step.
#[derive(Debug, Default)]
pub struct DictItem {
    pub postings: Vec<DocId>,
    pub positions: BTreeMap<DocId, Vec<usize>>,
}

impl DictItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_frequency(&self) -> usize {
        self.postings.len()
    }

    pub fn term_frequency(&self, doc_id: DocId) -> usize {
        self.positions.get(&doc_id).map_or(0, Vec::len)
    }

    fn add(&mut self, doc_id: DocId, pos: usize) {
        match self.positions.entry(doc_id) {
            std::collections::btree_map::Entry::Vacant(e) => {
                // first time seeing this term in this line
                self.postings.push(doc_id);
                e.insert(vec![pos]);
            }
            std::collections::btree_map::Entry::Occupied(mut e) => {
                e.get_mut().push(pos);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct IndexState {
    pub works: BTreeMap<u32, ShakespeareWork>,
    pub documents: Vec<Document>,
    pub dictionary: HashMap<String, DictItem>,
    /// Sorted doc ids per work id, used to restrict a search to one work.
    pub work_postings: HashMap<u32, Vec<DocId>>,
}

impl IndexState {
    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id as usize)
    }

    pub fn all_doc_ids(&self) -> Vec<DocId> {
        (0..self.documents.len() as DocId).collect()
    }

    fn index_work(&mut self, analyzer: &TextAnalyzer, work: &ShakespeareWork) -> usize {
        let mut indexed = 0;
        for (i, line) in work.content.split('\n').enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc_id = self.documents.len() as DocId;
            for token in analyzer.analyze(line) {
                self.dictionary
                    .entry(token.term)
                    .or_insert_with(DictItem::new)
                    .add(doc_id, token.pos);
            }
            self.work_postings.entry(work.id).or_default().push(doc_id);
            self.documents.push(Document {
                line_number: i + 1,
                text: line.to_string(),
                title: work.title.clone(),
                work_id: work.id,
            });
            indexed += 1;
        }
        indexed
    }
}

/// In-memory line index over Shakespeare's works.
///
/// Loading happens one work at a time under the write lock, so a search that
/// runs while the corpus is still loading sees every work indexed so far.
pub struct Store {
    analyzer: Arc<TextAnalyzer>,
    state: RwLock<IndexState>,
}

impl Store {
    pub fn new(analyzer: TextAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().await
    }

    /// Indexes every non-blank line of every work. Returns the number of lines indexed.
    pub async fn batch_index(&self, works: Vec<ShakespeareWork>) -> usize {
        log::info!("Start indexing {} works", works.len());
        let start = Instant::now();
        let mut total_docs = 0;

        for work in works {
            {
                let mut state = self.state.write().await;
                if state.works.contains_key(&work.id) {
                    log::warn!(
                        "Skipping work '{}': id {} is already indexed",
                        work.title,
                        work.id
                    );
                    continue;
                }
                let indexed = state.index_work(&self.analyzer, &work);
                total_docs += indexed;
                log::info!("Indexed: {}, ({} docs)", work.title, total_docs);
                state.works.insert(work.id, work);
            }
            // let queued searches in between works
            tokio::task::yield_now().await;
        }

        log::info!(
            "Finished indexing {} docs. Took {} ms",
            total_docs,
            start.elapsed().as_millis()
        );
        total_docs
    }

    pub async fn get_work(&self, id: u32) -> Result<ShakespeareWork, StoreError> {
        self.state
            .read()
            .await
            .works
            .get(&id)
            .cloned()
            .ok_or(StoreError::WorkNotFound(id))
    }

    pub async fn list_titles(&self) -> Vec<Title> {
        let state = self.state.read().await;
        let mut titles: Vec<Title> = state
            .works
            .values()
            .map(|w| Title {
                title: w.title.clone(),
                work_id: w.id,
            })
            .collect();
        titles.sort_by(|a, b| a.title.cmp(&b.title));
        titles
    }

    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn term_count(&self) -> usize {
        self.state.read().await.dictionary.len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(TextAnalyzer::english())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: u32, title: &str, content: &str) -> ShakespeareWork {
        ShakespeareWork {
            id,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped_but_counted() {
        let store = Store::default();
        let indexed = store
            .batch_index(vec![work(1, "A", "fox\n\n   \ndog\n")])
            .await;
        assert_eq!(indexed, 2);

        let state = store.read().await;
        assert_eq!(state.documents[0].line_number, 1);
        assert_eq!(state.documents[1].line_number, 4);
        assert_eq!(state.documents[1].text, "dog");
    }

    #[tokio::test]
    async fn test_postings_are_sorted_and_unique() {
        let store = Store::default();
        store
            .batch_index(vec![
                work(1, "A", "fox fox\ndog"),
                work(2, "B", "brown fox"),
            ])
            .await;
        assert_eq!(store.term_count().await, 3);

        let state = store.read().await;
        let fox = &state.dictionary["fox"];
        assert_eq!(fox.postings, vec![0, 2]);
        assert_eq!(fox.term_frequency(0), 2);
        assert_eq!(fox.term_frequency(2), 1);
        assert_eq!(fox.document_frequency(), 2);
        assert_eq!(state.work_postings[&2], vec![2]);
    }

    #[tokio::test]
    async fn test_duplicate_work_id_is_skipped() {
        let store = Store::default();
        store
            .batch_index(vec![work(1, "A", "fox"), work(1, "B", "dog")])
            .await;
        assert_eq!(store.document_count().await, 1);
        assert_eq!(store.get_work(1).await.unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_get_work_and_titles() {
        let store = Store::default();
        store
            .batch_index(vec![work(1, "MACBETH", "a"), work(2, "HAMLET", "b")])
            .await;

        assert_eq!(
            store.get_work(3).await.unwrap_err(),
            StoreError::WorkNotFound(3)
        );
        let titles: Vec<String> = store
            .list_titles()
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["HAMLET", "MACBETH"]);
    }
}
