use std::io::{self, Write};

use common::{FetchError, Post};
use tracing::{debug, warn};

use crate::dispatch::FetchReport;
use crate::observability::STALE_RESPONSES_TOTAL;

/// What applying a report did to the displayed list.
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    /// List replaced wholesale with this many posts.
    Replaced(usize),
    /// Response older than the displayed one; discarded.
    Stale,
    /// Request failed; displayed list left as it was.
    Failed(FetchError),
}

/// The currently displayed posts and the sequence number of the response that produced them.
#[derive(Debug, Default)]
pub struct PostList {
    posts: Vec<Post>,
    shown_seq: Option<u64>,
}

impl PostList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn shown_seq(&self) -> Option<u64> {
        self.shown_seq
    }

    pub fn apply(&mut self, report: FetchReport) -> Applied {
        let FetchReport { seq, target, outcome } = report;
        match outcome {
            Err(e) => {
                warn!(seq, kind = target.label(), error = %e, "keeping displayed list after failure");
                Applied::Failed(e)
            }
            Ok(_) if self.shown_seq.is_some_and(|shown| seq < shown) => {
                STALE_RESPONSES_TOTAL.inc();
                debug!(seq, shown = self.shown_seq, "discarding stale response");
                Applied::Stale
            }
            Ok(posts) => {
                let count = posts.len();
                self.posts = posts;
                self.shown_seq = Some(seq);
                debug!(seq, count, "displayed list replaced");
                Applied::Replaced(count)
            }
        }
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.posts.is_empty() {
            writeln!(out, "(no posts)")?;
        }
        for post in &self.posts {
            writeln!(out, "{}", post.title)?;
            for line in post.body.lines() {
                writeln!(out, "    {}", line)?;
            }
        }
        out.flush()
    }
}
