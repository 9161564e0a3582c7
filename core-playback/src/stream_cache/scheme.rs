//! URL scheme rewriting for intercepted items.
//!
//! The transport is handed `<marker>+<scheme>://...` so that it cannot fetch
//! the item itself and routes every read to the stream cache instead. The
//! download then strips the marker again before going to the network.
//!
//! `Url::set_scheme` refuses to switch between special (`http`) and
//! non-special schemes, so both directions reparse the serialized URL.

use url::Url;

use crate::error::{PlaybackError, Result};

/// Rewrite `url` into its marker form: `https://a/b` becomes `streaming+https://a/b`.
pub fn to_intercepted(url: &Url, marker: &str) -> Result<Url> {
    if is_intercepted(url, marker) {
        return Ok(url.clone());
    }
    let rest = &url.as_str()[url.scheme().len()..];
    Url::parse(&format!("{}+{}{}", marker, url.scheme(), rest))
        .map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Undo [`to_intercepted`]. A bare marker scheme maps to plain `http`.
///
/// URLs without the marker are returned unchanged.
pub fn to_transport(url: &Url, marker: &str) -> Result<Url> {
    let scheme = url.scheme();
    let original = if scheme == marker {
        "http"
    } else {
        match scheme
            .strip_prefix(marker)
            .and_then(|s| s.strip_prefix('+'))
        {
            Some(original) if !original.is_empty() => original,
            _ => return Ok(url.clone()),
        }
    };

    let rest = &url.as_str()[scheme.len()..];
    Url::parse(&format!("{}{}", original, rest))
        .map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Whether `url` carries the marker scheme.
pub fn is_intercepted(url: &Url, marker: &str) -> bool {
    let scheme = url.scheme();
    scheme == marker
        || scheme
            .strip_prefix(marker)
            .is_some_and(|s| s.starts_with('+'))
}
