//! Fetching the posts collection over HTTP.
//!
//! Fetch-all and fetch-by-title share one request/decode path; the only
//! difference is the URL built from the [`FetchTarget`].

use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::Post;

/// Query parameter used by the collection endpoint for "title contains".
pub const TITLE_FILTER_PARAM: &str = "title_like";

/// What a single request asks the collection for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    All,
    Title(String),
}

impl FetchTarget {
    /// Title filter for `term`, or `None` when the term is empty or only whitespace.
    pub fn by_title(term: &str) -> Option<Self> {
        if term.trim().is_empty() {
            None
        } else {
            Some(Self::Title(term.to_string()))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Title(_) => "title",
        }
    }
}

/// Strict decode of a response body into an ordered list of posts.
pub fn decode_posts(body: &[u8]) -> Result<Vec<Post>, FetchError> {
    Ok(serde_json::from_slice::<Vec<Post>>(body)?)
}

#[derive(Debug, Clone)]
pub struct PostFetcher {
    client: Client,
    collection_url: Url,
}

impl PostFetcher {
    pub fn new(
        collection_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let collection_url = Url::parse(collection_url)
            .map_err(|e| FetchError::InvalidEndpoint(format!("{collection_url}: {e}")))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::InvalidEndpoint(e.to_string()))?;
        Ok(Self { client, collection_url })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    pub fn request_url(&self, target: &FetchTarget) -> Url {
        let mut url = self.collection_url.clone();
        if let FetchTarget::Title(term) = target {
            url.query_pairs_mut().append_pair(TITLE_FILTER_PARAM, term);
        }
        url
    }

    /// Perform one GET for `target` and decode the body.
    pub async fn fetch(&self, target: &FetchTarget) -> Result<Vec<Post>, FetchError> {
        let url = self.request_url(target);
        let started = Instant::now();
        debug!(kind = target.label(), %url, "fetching posts");

        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(kind = target.label(), %url, status = status.as_u16(), "posts request rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let posts = decode_posts(&body).inspect_err(|e| {
            warn!(kind = target.label(), %url, error = %e, "posts body did not decode");
        })?;

        debug!(
            kind = target.label(),
            %url,
            count = posts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "posts fetched"
        );
        Ok(posts)
    }

    pub async fn fetch_all(&self) -> Result<Vec<Post>, FetchError> {
        self.fetch(&FetchTarget::All).await
    }

    /// `None` when `term` is blank: no request is made.
    pub async fn fetch_by_query(&self, term: &str) -> Option<Result<Vec<Post>, FetchError>> {
        let target = FetchTarget::by_title(term)?;
        Some(self.fetch(&target).await)
    }
}
