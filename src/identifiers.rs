//! Identifier and URL resolution for the host's linking hooks.

use crate::common::constants::{BROWSE_PATH, BROWSE_URL, GEEK_DOMAINS, ID_TYPE};
use reqwest::Url;
use std::collections::HashMap;

/// Browse-URL triple for a known identifier map, or None when the map
/// carries no bggeek entry.
pub fn get_book_url(
    identifiers: &HashMap<String, String>,
) -> Option<(&'static str, String, String)> {
    let bggeek_id = identifiers.get(ID_TYPE)?;
    Some((
        ID_TYPE,
        bggeek_id.clone(),
        format!("{BROWSE_URL}{bggeek_id}"),
    ))
}

/// Parse a catalog URL back into (namespace, id). The three Geek domains
/// are interchangeable; only /boardgame/<id> paths resolve. Anything else
/// is a negative result, not an error.
pub fn id_from_url(url: &str) -> Option<(&'static str, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !GEEK_DOMAINS.contains(&host) {
        return None;
    }

    let path_parts: Vec<&str> = parsed.path().trim_matches('/').split('/').collect();
    if path_parts.len() < 2 || path_parts[0] != BROWSE_PATH {
        return None;
    }
    Some((ID_TYPE, path_parts[1].to_string()))
}
