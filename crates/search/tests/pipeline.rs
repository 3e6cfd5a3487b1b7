use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use common::{FetchError, FetchTarget, Post, PostFetcher};
use search::{Applied, FetchDispatcher, FetchReport, PostList, SearchDebouncer};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn posts(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    match params.get("title_like").map(String::as_str) {
        Some("slow") => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!([{"id": 1, "title": "slow one", "body": "late"}]))
        }
        Some(term) => Json(json!([{"id": 2, "title": term, "body": "matched"}])),
        None => Json(json!([{"id": 1, "title": "Hello", "body": "World"}])),
    }
}

async fn stub() -> anyhow::Result<(String, Arc<AtomicUsize>)> {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/posts", get(posts))
        .with_state(Arc::clone(&hits));
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("stub server error: {}", e);
        }
    });
    Ok((format!("http://{}/posts", addr), hits))
}

fn fetcher(url: &str) -> Arc<PostFetcher> {
    Arc::new(PostFetcher::new(url, Duration::from_secs(2), Duration::from_secs(5)).expect("fetcher"))
}

#[tokio::test]
async fn fetch_all_report_replaces_list() -> anyhow::Result<()> {
    let (url, hits) = stub().await?;
    let (mut dispatcher, mut reports) = FetchDispatcher::new(fetcher(&url));
    let mut list = PostList::new();

    let seq = dispatcher.fetch_all();
    let report = timeout(WAIT, reports.recv()).await?.expect("report");
    assert_eq!(report.seq, seq);
    assert_eq!(report.target, FetchTarget::All);
    assert_eq!(list.apply(report), Applied::Replaced(1));
    assert_eq!(list.posts()[0].title, "Hello");
    assert_eq!(list.posts()[0].body, "World");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn blank_query_dispatches_nothing() -> anyhow::Result<()> {
    let (url, hits) = stub().await?;
    let (mut dispatcher, mut reports) = FetchDispatcher::new(fetcher(&url));

    assert_eq!(dispatcher.fetch_by_query(""), None);
    assert_eq!(dispatcher.fetch_by_query("   "), None);
    assert_eq!(dispatcher.last_seq(), None);
    assert!(timeout(Duration::from_millis(200), reports.recv()).await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn transport_failure_reports_once_and_keeps_list() -> anyhow::Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let (mut dispatcher, mut reports) =
        FetchDispatcher::new(fetcher(&format!("http://{}/posts", addr)));
    let mut list = PostList::new();
    let shown = Post { id: 1, title: "Hello".into(), body: "World".into() };
    list.apply(FetchReport { seq: 0, target: FetchTarget::All, outcome: Ok(vec![shown.clone()]) });

    dispatcher.fetch_all();
    let report = timeout(WAIT, reports.recv()).await?.expect("report");
    match list.apply(report) {
        Applied::Failed(e) => assert!(matches!(e, FetchError::Transport(_)), "got {e:?}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(list.posts(), &[shown]);
    assert!(timeout(Duration::from_millis(200), reports.recv()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn late_response_for_older_query_is_discarded() -> anyhow::Result<()> {
    let (url, _) = stub().await?;
    let (mut dispatcher, mut reports) = FetchDispatcher::new(fetcher(&url));
    let mut list = PostList::new();

    let slow = dispatcher.fetch_by_query("slow").expect("dispatched");
    let fast = dispatcher.fetch_by_query("fast").expect("dispatched");
    assert!(fast > slow);

    let first = timeout(WAIT, reports.recv()).await?.expect("report");
    assert_eq!(first.seq, fast);
    assert_eq!(list.apply(first), Applied::Replaced(1));

    let second = timeout(WAIT, reports.recv()).await?.expect("report");
    assert_eq!(second.seq, slow);
    assert_eq!(list.apply(second), Applied::Stale);
    assert_eq!(list.posts()[0].title, "fast");
    assert_eq!(list.shown_seq(), Some(fast));
    Ok(())
}

#[tokio::test]
async fn typing_burst_issues_one_request() -> anyhow::Result<()> {
    let (url, hits) = stub().await?;
    let (mut dispatcher, mut reports) = FetchDispatcher::new(fetcher(&url));
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<String>();
    let debouncer = SearchDebouncer::new(Duration::from_millis(50), move |q: String| {
        let _ = settled_tx.send(q);
    });

    for text in ["q", "qu", "qui"] {
        debouncer.on_input_changed(text);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let query = timeout(WAIT, settled_rx.recv()).await?.expect("settled");
    assert_eq!(query, "qui");

    dispatcher.fetch_by_query(&query).expect("dispatched");
    let report = timeout(WAIT, reports.recv()).await?.expect("report");
    let posts = report.outcome?;
    assert_eq!(posts[0].title, "qui");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(timeout(Duration::from_millis(200), settled_rx.recv()).await.is_err());
    Ok(())
}
