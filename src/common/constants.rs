/// Namespace, endpoint, and field-label constants to ensure consistency
/// across the plugin.

/// Identifier namespace used to tag catalog ids on outgoing records.
pub const ID_TYPE: &str = "bggeek";

/// Source name reported on every record.
pub const SOURCE_NAME: &str = "BoardgameGeek";

/// Item kind this source extracts; responses holding any other kind are
/// skipped without error.
pub const ITEM_KIND: &str = "boardgame";

// XML API endpoints. The thing endpoint returns one full item record,
// the search endpoint a ranked list of candidate ids.
pub const API_THING_URL: &str = "https://boardgamegeek.com/xmlapi2/thing?id=";
pub const API_SEARCH_URL: &str = "https://boardgamegeek.com/xmlapi/search?search=";

/// Path segment identifying an item page on the browse site.
pub const BROWSE_PATH: &str = "boardgame";

/// Prefix of the human-facing browse URL built from an identifier.
pub const BROWSE_URL: &str = "https://boardgamegeek.com/boardgame/";

/// The Geek sites share one catalog; all three domains resolve the same
/// item pages.
pub const GEEK_DOMAINS: [&str; 3] = ["rpggeek.com", "boardgamegeek.com", "videogamegeek.com"];

// Link `type` attributes carrying the credits extracted from a thing
// response.
pub const LINK_DESIGNER: &str = "boardgamedesigner";
pub const LINK_PUBLISHER: &str = "boardgamepublisher";
pub const LINK_SERIES: &str = "boardgameseries";

/// Identify timeout applied when the caller does not supply one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
