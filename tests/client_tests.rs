use axum::extract::{Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shakesearch::client::{
    ClientConfig, Controller, FetchError, FormFields, MemoryView, SubmitEvent, form_fields,
};

type SeenQueries = Arc<Mutex<Vec<String>>>;

/// Stands in for the search service. The query text picks the behaviour.
async fn stub_search(
    State(seen): State<SeenQueries>,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    seen.lock().unwrap().push(raw.unwrap_or_default());
    let q = params.get("q").cloned().unwrap_or_default();
    match q.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({
                "meta": {"totalResults": 1},
                "data": [{"title": "SLOW", "lineNumber": 1, "line": "slow line"}]
            }))
            .into_response()
        }
        "broken" => "<html>not json</html>".into_response(),
        "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "bare" => Json(json!({})).into_response(),
        _ => Json(json!({
            "meta": {"totalResults": 2},
            "data": [
                {"title": "MACBETH", "lineNumber": 3, "line": "a <mark>dagger</mark>"},
                {"title": "HAMLET", "lineNumber": 7, "line": "poor <mark>Yorick</mark>"}
            ]
        }))
        .into_response(),
    }
}

async fn spawn_stub() -> (String, SeenQueries) {
    let seen: SeenQueries = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/search", get(stub_search))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

struct FakeSubmit {
    fields: FormFields,
    prevented: bool,
}

impl FakeSubmit {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: form_fields(pairs.iter().copied()),
            prevented: false,
        }
    }
}

impl SubmitEvent for FakeSubmit {
    fn prevent_default(&mut self) {
        self.prevented = true;
    }

    fn fields(&self) -> FormFields {
        self.fields.clone()
    }
}

fn new_controller(base_url: &str) -> Controller<MemoryView> {
    Controller::new(base_url, ClientConfig::default(), Arc::new(MemoryView::default()))
}

#[tokio::test]
async fn test_submit_renders_summary_and_rows() {
    let (url, _) = spawn_stub().await;
    let controller = new_controller(&url);
    let mut event = FakeSubmit::new(&[("query", "dagger")]);

    controller.search(&mut event).await.unwrap();

    assert!(event.prevented);
    let view = controller.view();
    assert_eq!(view.summary(), "2 results (showing up to 1000)");
    assert_eq!(
        view.rows_html(),
        vec![
            "<tr><td>[MACBETH] 3.&ensp;a <mark>dagger</mark></td></tr>",
            "<tr><td>[HAMLET] 7.&ensp;poor <mark>Yorick</mark></td></tr>",
        ]
    );
    assert!(view.error().is_none());
}

#[tokio::test]
async fn test_request_carries_encoded_query_fuzziness_and_page_size() {
    let (url, seen) = spawn_stub().await;
    let controller = new_controller(&url);

    let mut event = FakeSubmit::new(&[("query", "a&b #c+d"), ("fuzzy", "on")]);
    controller.search(&mut event).await.unwrap();
    let mut event = FakeSubmit::new(&[("query", "x"), ("fuzzy", "off")]);
    controller.search(&mut event).await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "q=a%26b%20%23c%2Bd&fuzziness=1&page[size]=1000",
            "q=x&fuzziness=0&page[size]=1000",
        ]
    );
}

#[tokio::test]
async fn test_missing_meta_and_data_render_no_results() {
    let (url, _) = spawn_stub().await;
    let controller = new_controller(&url);
    controller
        .search(&mut FakeSubmit::new(&[("query", "bare")]))
        .await
        .unwrap();
    assert_eq!(controller.view().summary(), "No results");
    assert!(controller.view().rows().is_empty());
}

#[tokio::test]
async fn test_non_json_body_keeps_previous_rows() {
    let (url, _) = spawn_stub().await;
    let controller = new_controller(&url);
    controller
        .search(&mut FakeSubmit::new(&[("query", "dagger")]))
        .await
        .unwrap();

    let mut event = FakeSubmit::new(&[("query", "broken")]);
    let err = controller.search(&mut event).await.unwrap_err();

    assert!(event.prevented);
    assert!(matches!(err, FetchError::Decode(_)));
    let view = controller.view();
    assert_eq!(view.rows().len(), 2);
    assert_eq!(view.summary(), "2 results (showing up to 1000)");
    assert!(view.error().is_some());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, _) = spawn_stub().await;
    let controller = new_controller(&url);
    let err = controller
        .search(&mut FakeSubmit::new(&[("query", "boom")]))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(controller.view().renders(), 0);
}

#[tokio::test]
async fn test_unreachable_service_still_prevents_default() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let controller = new_controller(&format!("http://{}", addr));
    let mut event = FakeSubmit::new(&[("query", "dagger")]);
    let err = controller.search(&mut event).await.unwrap_err();

    assert!(event.prevented);
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(controller.view().error().is_some());
    assert_eq!(controller.view().renders(), 0);
}

#[tokio::test]
async fn test_overlapping_searches_last_response_wins() {
    let (url, _) = spawn_stub().await;

    // submitted first, resolves last
    let controller = new_controller(&url);
    let mut slow = FakeSubmit::new(&[("query", "slow")]);
    let mut fast = FakeSubmit::new(&[("query", "fast")]);
    let (a, b) = futures::join!(controller.search(&mut slow), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.search(&mut fast).await
    });
    a.unwrap();
    b.unwrap();
    assert_eq!(controller.view().renders(), 2);
    assert_eq!(controller.view().summary(), "1 result (showing up to 1000)");
    assert_eq!(controller.view().rows()[0].title, "SLOW");
}
