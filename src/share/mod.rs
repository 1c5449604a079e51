//! Share links: turning a tree into a URL (and QR code) and back.
//!
//! Encoding tries an ordered list of [`Strategy`] values and keeps the first
//! link that works. The default order prefers a short link backed by the
//! remote blob store and falls back to a self-contained compressed link that
//! needs no server at all.
//!
//! Decoding looks at the link's query parameters in a fixed precedence
//! (`worryId`, `data`, `z`, `b64`) and either rebuilds every worry or fails
//! as a whole.

pub mod client;
pub mod encoding;
pub mod qr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{BlobStoreClient, ClientError, DEFAULT_BLOB_URL};
pub use qr::{QrError, QrOptions};

use crate::config::AppConfig;
use crate::lifecycle::TreeController;
use crate::models::{PayloadError, SharePayload, Worry};
use crate::store::WorryStore;

/// One way of carrying a worry set inside a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Upload to the blob store; the link carries only the blob id.
    RemoteStore,
    /// lz-string URI-component compression, readable by the web front-end.
    LzString,
    /// Raw deflate plus URL-safe base64.
    Deflate,
    /// Plain URL-safe base64 of the JSON.
    Base64,
}

impl Strategy {
    /// Decode precedence when several parameters are present.
    pub const PRECEDENCE: [Strategy; 4] = [
        Strategy::RemoteStore,
        Strategy::LzString,
        Strategy::Deflate,
        Strategy::Base64,
    ];

    pub fn default_order() -> Vec<Strategy> {
        vec![Strategy::RemoteStore, Strategy::LzString]
    }

    /// Query parameter that carries this strategy's value.
    pub fn param(&self) -> &'static str {
        match self {
            Self::RemoteStore => "worryId",
            Self::LzString => "data",
            Self::Deflate => "z",
            Self::Base64 => "b64",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteStore => "remote_store",
            Self::LzString => "lz_string",
            Self::Deflate => "deflate",
            Self::Base64 => "base64",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "remote_store" | "remote" => Some(Self::RemoteStore),
            "lz_string" | "lz" => Some(Self::LzString),
            "deflate" => Some(Self::Deflate),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("there are no worries to share")]
    NothingToShare,

    #[error("every share strategy failed")]
    AllStrategiesFailed,

    #[error("remote store is not configured")]
    RemoteDisabled,

    #[error("link has no shared worries")]
    NoSharedPayload,

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("shared worries {0} were not found")]
    NotFound(String),

    #[error("blob store unreachable: {0}")]
    Unreachable(String),

    #[error("blob store rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("shared worries are damaged: {0}")]
    Malformed(String),
}

impl From<ClientError> for ShareError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(e) => Self::Unreachable(e.to_string()),
            ClientError::NotFound(id) => Self::NotFound(id),
            ClientError::Rejected { status, .. } => Self::Rejected { status },
            ClientError::MissingLocation => Self::Malformed("blob store gave no location".into()),
            ClientError::InvalidId(id) => Self::Malformed(format!("invalid blob id {}", id)),
        }
    }
}

impl From<PayloadError> for ShareError {
    fn from(e: PayloadError) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<encoding::EncodingError> for ShareError {
    fn from(e: encoding::EncodingError) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// A finished share link and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub url: String,
    pub strategy: Strategy,
}

impl ShareLink {
    /// Whether the link carries the worries itself (longer, needs no server).
    pub fn is_self_contained(&self) -> bool {
        self.strategy != Strategy::RemoteStore
    }

    pub fn qr_png(&self, options: &QrOptions) -> Result<Vec<u8>, QrError> {
        qr::render_png(&self.url, options)
    }

    pub fn write_qr(&self, options: &QrOptions, path: &std::path::Path) -> Result<(), QrError> {
        qr::write_png(&self.url, options, path)
    }
}

/// Encodes trees into share links and rebuilds them from links.
#[derive(Debug, Clone)]
pub struct ShareCodec {
    origin: String,
    blob_store: Option<BlobStoreClient>,
    strategies: Vec<Strategy>,
}

impl ShareCodec {
    /// `origin` is where the front-end is served; share links point there.
    pub fn new(origin: impl Into<String>, blob_store: Option<BlobStoreClient>) -> Self {
        Self {
            origin: origin.into(),
            blob_store,
            strategies: Strategy::default_order(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let blob_store = config
            .blob_store_url
            .as_ref()
            .map(|url| BlobStoreClient::new(url.clone(), config.request_timeout()));
        Self::new(config.share_origin.clone(), blob_store)
            .with_strategies(config.share_strategies.clone())
    }

    /// Replace the encode order. An empty list keeps the current one.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        if !strategies.is_empty() {
            self.strategies = strategies;
        }
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    // ============================================================
    // Encode
    // ============================================================

    /// Share every pending worry in `store`.
    pub async fn share(&self, store: &WorryStore) -> Result<ShareLink, ShareError> {
        let payload = SharePayload::from_worries(store.pending());
        if payload.is_empty() {
            return Err(ShareError::NothingToShare);
        }
        let json = payload.to_json();

        for &strategy in &self.strategies {
            match self.encode_with(strategy, &json).await {
                Ok(url) => {
                    tracing::info!(
                        strategy = strategy.as_str(),
                        worries = payload.len(),
                        "share link created"
                    );
                    return Ok(ShareLink { url, strategy });
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.as_str(),
                        "share strategy failed, falling back: {}",
                        e
                    );
                }
            }
        }

        tracing::error!("no share strategy succeeded");
        Err(ShareError::AllStrategiesFailed)
    }

    async fn encode_with(&self, strategy: Strategy, json: &str) -> Result<String, ShareError> {
        let value = match strategy {
            Strategy::RemoteStore => {
                let client = self.blob_store.as_ref().ok_or(ShareError::RemoteDisabled)?;
                client.create(json.to_string()).await?
            }
            Strategy::LzString => encoding::lz_compress(json),
            Strategy::Deflate => encoding::deflate_encode(json)?,
            Strategy::Base64 => encoding::base64_encode(json),
        };
        self.link_for(strategy, &value)
    }

    fn link_for(&self, strategy: Strategy, value: &str) -> Result<String, ShareError> {
        let mut url = Url::parse(&self.origin)
            .map_err(|e| ShareError::InvalidLink(format!("{}: {}", self.origin, e)))?;
        url.query_pairs_mut()
            .clear()
            .append_pair(strategy.param(), value);
        Ok(url.into())
    }

    // ============================================================
    // Decode
    // ============================================================

    /// Rebuild the worries carried by `link`.
    ///
    /// `link` may be a full URL or just its query (`?data=...`). Nothing is
    /// returned unless every worry decodes.
    pub async fn load(&self, link: &str) -> Result<Vec<Worry>, ShareError> {
        let (strategy, value) = find_shared_param(link)?;
        tracing::debug!(strategy = strategy.as_str(), "loading shared worries");

        let json = match strategy {
            Strategy::RemoteStore => {
                let client = self.blob_store.as_ref().ok_or(ShareError::RemoteDisabled)?;
                client.fetch(&value).await?
            }
            Strategy::LzString => encoding::lz_decompress(&value)?,
            Strategy::Deflate => encoding::deflate_decode(&value)?,
            Strategy::Base64 => encoding::base64_decode(&value)?,
        };

        let worries = SharePayload::from_json(&json)?.into_worries();
        tracing::info!(worries = worries.len(), "shared worries loaded");
        Ok(worries)
    }

    /// Load `link` into a tree in shared view.
    pub async fn open(&self, link: &str) -> Result<TreeController, ShareError> {
        let worries = self.load(link).await?;
        Ok(TreeController::from_shared(worries))
    }
}

/// Pick the highest-precedence non-empty share parameter in `link`.
pub fn find_shared_param(link: &str) -> Result<(Strategy, String), ShareError> {
    let url = parse_link(link)?;
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    Strategy::PRECEDENCE
        .iter()
        .find_map(|strategy| {
            pairs
                .iter()
                .find(|(k, v)| k == strategy.param() && !v.is_empty())
                .map(|(_, v)| (*strategy, v.clone()))
        })
        .ok_or(ShareError::NoSharedPayload)
}

fn parse_link(link: &str) -> Result<Url, ShareError> {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(_) => {
            let base = Url::parse("http://localhost/")
                .map_err(|e| ShareError::InvalidLink(e.to_string()))?;
            let relative = if link.starts_with('?') || link.starts_with('/') {
                link.to_string()
            } else {
                format!("?{}", link)
            };
            base.join(&relative)
                .map_err(|e| ShareError::InvalidLink(format!("{}: {}", link, e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_wins_over_inline_payload() {
        let (strategy, value) =
            find_shared_param("http://x.test/?data=abc&worryId=42").unwrap();
        assert_eq!(strategy, Strategy::RemoteStore);
        assert_eq!(value, "42");
    }

    #[test]
    fn bare_query_is_accepted() {
        let (strategy, value) = find_shared_param("?z=abc").unwrap();
        assert_eq!(strategy, Strategy::Deflate);
        assert_eq!(value, "abc");
    }

    #[test]
    fn empty_params_are_ignored() {
        assert!(matches!(
            find_shared_param("http://x.test/?worryId=&foo=bar"),
            Err(ShareError::NoSharedPayload)
        ));
    }

    #[test]
    fn strategy_names_round_trip() {
        for strategy in Strategy::PRECEDENCE {
            assert_eq!(Strategy::from_str(strategy.as_str()), Some(strategy));
        }
    }
}
