use crate::common::constants::SOURCE_NAME;
use crate::common::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Multi-producer sink the host drains identify results from. Pushes are
/// final and unordered; concurrent lookups share clones of the sender.
pub type ResultSink = UnboundedSender<GameMetadata>;

/// Catalog identifier tagged with its namespace label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: String,
    pub value: String,
}

/// Capabilities a metadata source can declare to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Identify,
}

/// Normalized metadata record delivered to the result sink.
///
/// Title and authors are the only fields required for a record to exist;
/// everything else is best-effort and defaults to absent/empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub identifier: Option<Identifier>,
    pub pub_date: Option<NaiveDate>,
    pub publisher: Option<String>,
    pub series: String,
    pub series_index: u32,
    pub comments: Option<String>,
    pub cover_url: Option<String>,
    pub source: String,
    pub relevance: usize,
}

impl GameMetadata {
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
            identifier: None,
            pub_date: None,
            publisher: None,
            series: String::new(),
            series_index: 0,
            comments: None,
            cover_url: None,
            source: SOURCE_NAME.to_string(),
            relevance: 0,
        }
    }

    pub fn set_identifier(&mut self, namespace: &str, value: impl Into<String>) {
        self.identifier = Some(Identifier {
            namespace: namespace.to_string(),
            value: value.into(),
        });
    }

    /// Host-side cleanup applied before a record is emitted: trims stray
    /// whitespace and drops empty author entries.
    pub fn clean(&mut self) {
        self.title = self.title.trim().to_string();
        let authors = std::mem::take(&mut self.authors);
        self.authors = authors
            .into_iter()
            .map(|author| author.trim().to_string())
            .filter(|author| !author.is_empty())
            .collect();
    }
}

/// Core contract every metadata source must implement for the host.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Display name for this source.
    fn name(&self) -> &'static str;

    /// What this source can do for the host.
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Identify]
    }

    /// Metadata fields this source may populate on a record.
    fn touched_fields(&self) -> &'static [&'static str];

    /// Whether this source exposes host-side configuration.
    fn is_customizable(&self) -> bool {
        false
    }

    /// Resolve a known identifier map to (namespace, id, browse URL), or
    /// None when the map carries no identifier for this source.
    fn get_book_url(
        &self,
        identifiers: &HashMap<String, String>,
    ) -> Option<(&'static str, String, String)>;

    /// Parse a catalog URL back into (namespace, id); None when the URL
    /// does not belong to this source.
    fn id_from_url(&self, url: &str) -> Option<(&'static str, String)>;

    /// Ordering applied by the host when presenting identify results.
    fn compare_results(&self, a: &GameMetadata, b: &GameMetadata) -> Ordering {
        crate::ranking::compare_relevance(a, b)
    }

    /// Resolve a title or identifier map to zero or more records,
    /// delivered through `sink` as each lookup completes. The abort flag
    /// is advisory; `timeout` bounds each remote call and falls back to
    /// the source's default when absent.
    async fn identify(
        &self,
        title: Option<&str>,
        authors: &[String],
        identifiers: &HashMap<String, String>,
        timeout: Option<Duration>,
        abort: Arc<AtomicBool>,
        sink: ResultSink,
    ) -> Result<()>;
}
