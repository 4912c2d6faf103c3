//! The BoardGameGeek metadata source: lookup orchestration over the
//! thing and search endpoints.

use crate::common::constants::{
    API_SEARCH_URL, API_THING_URL, DEFAULT_TIMEOUT_SECS, ID_TYPE, ITEM_KIND, SOURCE_NAME,
};
use crate::common::error::Result;
use crate::common::types::{GameMetadata, MetadataSource, ResultSink};
use crate::extract;
use crate::fetch::{HttpFetch, ReqwestFetch};
use crate::identifiers;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Joiner words dropped from search queries, mirroring the host's title
/// tokenization.
const TITLE_JOINERS: [&str; 3] = ["a", "and", "the"];

/// Metadata fields this source may populate on a record.
static TOUCHED_FIELDS: [&str; 8] = [
    "identifier:bggeek",
    "title",
    "authors",
    "comments",
    "pubdate",
    "publisher",
    "series",
    "series_index",
];

pub struct BggSource {
    fetcher: Arc<dyn HttpFetch>,
}

impl Default for BggSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BggSource {
    pub fn new() -> Self {
        Self {
            fetcher: Arc::new(ReqwestFetch::new()),
        }
    }

    /// Substitute the transport layer: the host's fetch service, or a
    /// scripted double in tests.
    pub fn with_fetcher(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { fetcher }
    }

    /// One detail lookup: fetch the thing record, extract, push at most
    /// one record into the sink.
    #[instrument(skip(fetcher, sink))]
    async fn fetch_thing(
        fetcher: Arc<dyn HttpFetch>,
        bggeek_id: String,
        relevance: usize,
        timeout: Duration,
        sink: ResultSink,
    ) -> Result<()> {
        let url = format!("{API_THING_URL}{bggeek_id}");
        let body = fetcher.get(&url, timeout).await?;
        match record_from_thing(&body, &bggeek_id, relevance) {
            Some(metadata) => {
                debug!(relevance, "extracted record");
                // A closed sink means the host stopped consuming; the
                // record is simply dropped.
                let _ = sink.send(metadata);
            }
            None => debug!("no usable record of expected kind in response"),
        }
        Ok(())
    }

    /// Title search followed by one concurrent detail lookup per
    /// candidate, ranked by search order.
    #[instrument(skip(self, abort, sink))]
    async fn search_title(
        &self,
        title: &str,
        timeout: Duration,
        abort: Arc<AtomicBool>,
        sink: ResultSink,
    ) -> Result<()> {
        let url = format!("{API_SEARCH_URL}{}", search_query(title));
        debug!(%url, "searching");
        let body = self.fetcher.get(&url, timeout).await?;

        let candidates = candidate_ids(&body);
        info!(count = candidates.len(), "search returned candidates");

        let mut lookups = Vec::new();
        for (relevance, bggeek_id) in candidates.into_iter().enumerate() {
            // Cancellation is advisory: stop dispatching further lookups,
            // leave in-flight ones to finish.
            if abort.load(Ordering::Relaxed) {
                debug!("abort signaled, stopping dispatch");
                break;
            }
            let fetcher = self.fetcher.clone();
            let sink = sink.clone();
            lookups.push(tokio::spawn(async move {
                if let Err(e) =
                    Self::fetch_thing(fetcher, bggeek_id.clone(), relevance, timeout, sink).await
                {
                    // One failed candidate never aborts its siblings.
                    warn!(%bggeek_id, error = %e, "detail lookup failed, dropping candidate");
                }
            }));
        }
        for lookup in lookups {
            let _ = lookup.await;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataSource for BggSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn touched_fields(&self) -> &'static [&'static str] {
        &TOUCHED_FIELDS
    }

    fn get_book_url(
        &self,
        identifiers: &HashMap<String, String>,
    ) -> Option<(&'static str, String, String)> {
        identifiers::get_book_url(identifiers)
    }

    fn id_from_url(&self, url: &str) -> Option<(&'static str, String)> {
        identifiers::id_from_url(url)
    }

    async fn identify(
        &self,
        title: Option<&str>,
        _authors: &[String],
        identifiers: &HashMap<String, String>,
        timeout: Option<Duration>,
        abort: Arc<AtomicBool>,
        sink: ResultSink,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        if let Some(bggeek_id) = identifiers.get(ID_TYPE) {
            // Known identifier: a single detail lookup at the best
            // possible rank, no search issued.
            return Self::fetch_thing(self.fetcher.clone(), bggeek_id.clone(), 0, timeout, sink)
                .await;
        }

        match title {
            Some(title) if !title.trim().is_empty() => {
                self.search_title(title, timeout, abort, sink).await
            }
            _ => {
                debug!("neither identifier nor title supplied, nothing to identify");
                Ok(())
            }
        }
    }
}

/// Tokenized search query: punctuation stripped, lowercased, joiner words
/// dropped, tokens URL-encoded and joined with `+`.
fn search_query(title: &str) -> String {
    title_tokens(title)
        .iter()
        .map(|token| urlencoding::encode(token).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

fn title_tokens(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|token| !token.is_empty() && !TITLE_JOINERS.contains(&token.as_str()))
        .collect()
}

/// Candidate ids from a search response, in the relevance order the
/// service returned them.
fn candidate_ids(body: &str) -> Vec<String> {
    let doc = Html::parse_document(body);
    let selector = Selector::parse(&format!(r#"item[type="{ITEM_KIND}"]"#)).unwrap();
    doc.select(&selector)
        .filter_map(|item| item.value().attr("id").map(|id| id.to_string()))
        .collect()
}

/// Extract one normalized record from a thing response. None when the
/// response holds no item of the expected kind or no usable title.
fn record_from_thing(body: &str, bggeek_id: &str, relevance: usize) -> Option<GameMetadata> {
    let doc = Html::parse_document(body);
    extract::item_of_expected_kind(&doc)?;

    let title = extract::title(&doc)?;
    let authors = extract::authors(&doc);
    let (series, series_index) = extract::series(&doc);

    let mut metadata = GameMetadata::new(title, authors);
    metadata.set_identifier(ID_TYPE, bggeek_id);
    metadata.pub_date = extract::pub_date(&doc);
    metadata.publisher = extract::publisher(&doc);
    metadata.series = series;
    metadata.series_index = series_index;
    metadata.comments = extract::comments(&doc);
    metadata.cover_url = extract::cover(&doc);
    metadata.relevance = relevance;
    metadata.clean();

    // A record without a title is never emitted.
    if metadata.title.is_empty() {
        return None;
    }
    Some(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_tokens_lowercase_and_drop_joiners() {
        assert_eq!(
            title_tokens("Through the Desert"),
            vec!["through", "desert"]
        );
        assert_eq!(
            title_tokens("A Feast for Odin: The Norwegians"),
            vec!["feast", "for", "odin", "norwegians"]
        );
    }

    #[test]
    fn search_query_joins_tokens_with_plus() {
        assert_eq!(search_query("Through the Desert"), "through+desert");
    }

    #[test]
    fn search_query_encodes_non_ascii_tokens() {
        assert_eq!(search_query("Café"), "caf%C3%A9");
    }

    #[test]
    fn candidate_ids_preserve_response_order() {
        let body = r#"<items total="3">
<item type="boardgame" id="101"><name primary="true">A</name></item>
<item type="boardgame" id="102"><name primary="true">B</name></item>
<item type="videogame" id="999"><name primary="true">Skip</name></item>
<item type="boardgame" id="103"><name primary="true">C</name></item>
</items>"#;
        assert_eq!(candidate_ids(body), vec!["101", "102", "103"]);
    }

    #[test]
    fn record_from_thing_requires_expected_kind() {
        let body = r#"<items><item type="videogame" id="7">
<name type="primary" value="Not a Board Game"/>
</item></items>"#;
        assert!(record_from_thing(body, "7", 0).is_none());
    }

    #[test]
    fn record_from_thing_requires_title() {
        let body = r#"<items><item type="boardgame" id="8">
<yearpublished value="2001"/>
</item></items>"#;
        assert!(record_from_thing(body, "8", 0).is_none());

        let blank_title = r#"<items><item type="boardgame" id="9">
<name type="primary" value="   "/>
</item></items>"#;
        assert!(record_from_thing(blank_title, "9", 0).is_none());
    }

    #[test]
    fn record_from_thing_populates_fields() {
        let body = r#"<items><item type="boardgame" id="4098">
<name type="primary" value="Through the Desert"/>
<yearpublished value="1998"/>
<link type="boardgamedesigner" value="Reiner Knizia"/>
<link type="boardgamepublisher" value="Kosmos"/>
<link type="boardgameseries" value="Knizia Tile Trilogy"/>
<seriescode value="KOS-042b"/>
<description>Caravans cross the desert.</description>
</item></items>"#;
        let metadata = record_from_thing(body, "4098", 3).unwrap();
        assert_eq!(metadata.title, "Through the Desert");
        assert_eq!(metadata.authors, vec!["Reiner Knizia"]);
        assert_eq!(metadata.identifier.as_ref().unwrap().namespace, "bggeek");
        assert_eq!(metadata.identifier.as_ref().unwrap().value, "4098");
        assert_eq!(metadata.publisher.as_deref(), Some("Kosmos"));
        assert_eq!(metadata.series, "Knizia Tile Trilogy");
        assert_eq!(metadata.series_index, 42);
        assert_eq!(metadata.comments.as_deref(), Some("Caravans cross the desert."));
        assert_eq!(metadata.source, "BoardgameGeek");
        assert_eq!(metadata.relevance, 3);
    }
}
