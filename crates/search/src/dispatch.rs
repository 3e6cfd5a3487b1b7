//! Issues fetches off the UI context and marshals each outcome back as one report.

use std::sync::Arc;

use common::{FetchError, FetchTarget, Post, PostFetcher};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::observability::{FETCH_DURATION, FETCH_FAILURES_TOTAL, FETCH_REQUESTS_TOTAL};

/// Outcome of one dispatched request, tagged with the sequence number it was issued under.
#[derive(Debug)]
pub struct FetchReport {
    pub seq: u64,
    pub target: FetchTarget,
    pub outcome: Result<Vec<Post>, FetchError>,
}

pub struct FetchDispatcher {
    fetcher: Arc<PostFetcher>,
    tx: UnboundedSender<FetchReport>,
    next_seq: u64,
}

impl FetchDispatcher {
    /// Reports for every dispatched request arrive on the returned receiver.
    pub fn new(fetcher: Arc<PostFetcher>) -> (Self, UnboundedReceiver<FetchReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { fetcher, tx, next_seq: 0 }, rx)
    }

    pub fn fetch_all(&mut self) -> u64 {
        self.dispatch(FetchTarget::All)
    }

    /// `None` for a blank term: nothing is requested and no report follows.
    pub fn fetch_by_query(&mut self, term: &str) -> Option<u64> {
        let target = FetchTarget::by_title(term)?;
        Some(self.dispatch(target))
    }

    /// Sequence number of the most recently dispatched request.
    pub fn last_seq(&self) -> Option<u64> {
        (self.next_seq > 0).then_some(self.next_seq)
    }

    fn dispatch(&mut self, target: FetchTarget) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        FETCH_REQUESTS_TOTAL.inc();
        debug!(seq, kind = target.label(), "dispatching posts request");

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let timer = FETCH_DURATION.start_timer();
            let outcome = fetcher.fetch(&target).await;
            timer.observe_duration();

            if let Err(e) = &outcome {
                FETCH_FAILURES_TOTAL.with_label_values(&[e.kind()]).inc();
                warn!(seq, kind = target.label(), error = %e, "posts request failed");
            }
            if tx.send(FetchReport { seq, target, outcome }).is_err() {
                debug!(seq, "report receiver closed; outcome dropped");
            }
        });
        seq
    }
}
