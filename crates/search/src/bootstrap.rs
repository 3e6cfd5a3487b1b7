use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use common::PostFetcher;
use configs::AppConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::debounce::SearchDebouncer;
use crate::dispatch::FetchDispatcher;
use crate::listing::{Applied, PostList};
use crate::observability;

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Full current value of the search field.
    Input(String),
    FetchAll,
    Metrics,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            ":all" => Self::FetchAll,
            ":metrics" => Self::Metrics,
            ":quit" | ":q" => Self::Quit,
            _ => Self::Input(line.to_string()),
        }
    }
}

const HELP: &str = "type to search post titles; :all fetches every post, :metrics prints counters, :quit exits";

/// Run the interactive search loop on stdin/stdout until `:quit`, EOF or Ctrl+C.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let fetcher = Arc::new(PostFetcher::new(
        &config.api.posts_url,
        config.api.connect_timeout(),
        config.api.request_timeout(),
    )?);
    info!(
        url = %fetcher.collection_url(),
        debounce_ms = config.search.debounce_ms,
        "post search ready"
    );

    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };
    let stdin = BufReader::new(tokio::io::stdin());
    run_session(fetcher, config.search.debounce(), stdin, std::io::stdout(), ctrl_c).await
}

/// Drive one search session until `:quit`, end of input or `shutdown` completes.
///
/// Input lines, settled queries and fetch reports are all handled on this one task,
/// so the displayed list is only ever touched here.
pub async fn run_session<R, W, S>(
    fetcher: Arc<PostFetcher>,
    quiet: Duration,
    input: R,
    mut out: W,
    shutdown: S,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let (mut dispatcher, mut reports) = FetchDispatcher::new(fetcher);
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<String>();
    let debouncer = SearchDebouncer::new(quiet, move |query: String| {
        let _ = settled_tx.send(query);
    });
    let mut list = PostList::new();

    // One future for the whole session, so a signal raised while a branch body runs is kept.
    tokio::pin!(shutdown);
    let mut lines = input.lines();
    writeln!(out, "{HELP}")?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("input closed");
                    break;
                };
                match Command::parse(&line) {
                    Command::Input(text) => debouncer.on_input_changed(text),
                    Command::FetchAll => {
                        let seq = dispatcher.fetch_all();
                        info!(seq, "fetching all posts");
                    }
                    Command::Metrics => write!(out, "{}", observability::encode_metrics())?,
                    Command::Quit => break,
                }
            }
            Some(query) = settled_rx.recv() => {
                match dispatcher.fetch_by_query(&query) {
                    Some(seq) => info!(seq, query = %query, "searching posts"),
                    None => debug!("blank query; nothing fetched"),
                }
            }
            Some(report) = reports.recv() => {
                let seq = report.seq;
                match list.apply(report) {
                    Applied::Replaced(count) => {
                        writeln!(out, "-- {count} post(s) [#{seq}] --")?;
                        list.render(&mut out)?;
                    }
                    Applied::Stale => {}
                    Applied::Failed(e) => {
                        writeln!(out, "!! request #{seq} failed: {e} (showing previous results)")?;
                    }
                }
            }
            () = &mut shutdown => break,
        }
    }

    debouncer.cancel();
    if let Some(seq) = dispatcher.last_seq() {
        debug!(last_seq = seq, shown_seq = list.shown_seq(), "search loop finished");
    }
    Ok(())
}
