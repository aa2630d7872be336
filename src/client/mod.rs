//! Search front end: turns a submitted form into a `/search` call and renders
//! the response into a [`ResultView`].
//!
//! Each submission is independent. Nothing fences overlapping searches, so
//! when two are in flight the view ends up showing whichever response
//! resolved last.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

pub mod form;
pub mod render;
pub mod view;

pub use form::{
    ClientConfig, DEFAULT_PAGE_SIZE, FormFields, SearchRequest, SubmitEvent, form_fields,
};
pub use render::{ResultRow, SearchResponse, render_response, summary_text};
pub use view::{MemoryView, ResultView, TerminalView};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search service answered {0}")]
    Status(StatusCode),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Issues the request against `base_url` and parses the JSON body.
pub async fn fetch_results(
    http: &reqwest::Client,
    base_url: &str,
    request: &SearchRequest,
) -> Result<SearchResponse, FetchError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), request.endpoint());
    log::debug!("GET {}", url);

    let response = http.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

pub struct Controller<V: ResultView> {
    http: reqwest::Client,
    base_url: String,
    config: ClientConfig,
    view: Arc<V>,
}

impl<V: ResultView> Controller<V> {
    pub fn new(base_url: impl Into<String>, config: ClientConfig, view: Arc<V>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            config,
            view,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Submit handler. The event's default action is suppressed first, whatever happens after.
    pub async fn search<E: SubmitEvent>(&self, event: &mut E) -> Result<(), FetchError> {
        event.prevent_default();
        let request = SearchRequest::from_fields(&event.fields(), &self.config);
        self.submit(&request).await
    }

    /// Fetches and renders one request. On failure the error is shown and the
    /// previous rows are left in place.
    pub async fn submit(&self, request: &SearchRequest) -> Result<(), FetchError> {
        match fetch_results(&self.http, &self.base_url, request).await {
            Ok(response) => {
                render_response(&response, self.view.as_ref(), &self.config);
                Ok(())
            }
            Err(e) => {
                log::warn!("search for {:?} failed: {}", request.query, e);
                self.view.show_error(&e.to_string());
                Err(e)
            }
        }
    }
}
