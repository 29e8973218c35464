#![forbid(unsafe_code)]

//! URI handling for `ds:Reference`.
//!
//! - `""`: the whole signature document
//! - `#id`: a same-document element
//! - relative URIs: resolved by a [`UriDereferencer`]
//! - absolute URIs (`scheme:...`): never fetched

use sigtuna_core::Error;

/// Resolves reference URIs that point outside the signature document.
pub trait UriDereferencer {
    /// The octets named by `uri`; an unknown name is `Error::Dereference`.
    fn dereference(&self, uri: &str) -> Result<Vec<u8>, Error>;
}

/// What a reference URI points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriKind<'a> {
    /// `URI=""`
    WholeDocument,
    /// `URI="#id"`, holding the id.
    SameDocument(&'a str),
    /// A relative reference, still percent-encoded.
    Relative(&'a str),
    /// A URI with a scheme.
    Absolute(&'a str),
}

pub fn classify(uri: &str) -> UriKind<'_> {
    if uri.is_empty() {
        UriKind::WholeDocument
    } else if let Some(id) = uri.strip_prefix('#') {
        UriKind::SameDocument(id)
    } else if has_scheme(uri) {
        UriKind::Absolute(uri)
    } else {
        UriKind::Relative(uri)
    }
}

/// RFC 3986: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"` before any
/// path, query or fragment delimiter.
fn has_scheme(uri: &str) -> bool {
    let Some(colon) = uri.find(':') else {
        return false;
    };
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Decode `%XX` escapes; the result must be UTF-8.
pub fn percent_decode(uri: &str) -> Result<String, Error> {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::InvalidUri(format!("bad percent escape in {uri:?}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map_err(|_| Error::InvalidUri(format!("{uri:?} does not decode to UTF-8")))
}
