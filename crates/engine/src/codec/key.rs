//! Key codec: hierarchical keys to and from storage identifiers
//!
//! Every path element becomes one token:
//!
//! - numeric id: `<kind>-#<16 hex digits>`, the id with its sign bit flipped,
//!   e.g. `Product-#800000000000002a` for 42
//! - named id: `<kind>-'<name>`, e.g. `Product-'front`
//!
//! `%`, `-` and `/` inside kinds and names are percent-escaped (`%25`, `%2D`,
//! `%2F`), so the first raw `-` always ends the kind and tokens never contain
//! a raw `/`. The structural form is the token list stored under `__path__`;
//! the flat form joins the tokens with `/` and serves as the document `_id`.
//!
//! Both encodings are reversible for every valid key.
//!
//! ## Ordering
//!
//! Byte order of the flat form is key order: ancestors sort before their
//! descendants, numeric ids sort by value and before every name, names sort
//! by their text. Kinds and names holding characters below `0` compare on
//! their escaped form.

use dsbridge_core::{Error, Identifier, Key, PathElement, Result};

/// Field holding the structural key path
pub const PATH_FIELD: &str = "__path__";

/// Field holding the entity's own kind
pub const KIND_FIELD: &str = "__kind__";

const TOKEN_SEPARATOR: char = '/';
const KIND_SEPARATOR: char = '-';
const ID_PREFIX: char = '#';
const NAME_PREFIX: char = '\'';
const SIGN_BIT: u64 = 1 << 63;
const ID_WIDTH: usize = 16;

fn encode_id(id: i64) -> String {
    format!("{}{:016x}", ID_PREFIX, (id as u64) ^ SIGN_BIT)
}

fn decode_id(digits: &str) -> Option<i64> {
    if digits.len() != ID_WIDTH || !digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    u64::from_str_radix(digits, 16)
        .ok()
        .map(|biased| (biased ^ SIGN_BIT) as i64)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '-' => out.push_str("%2D"),
            '/' => out.push_str("%2F"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(escaped: &str) -> Result<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3).unwrap_or("");
        match code {
            "25" => out.push('%'),
            "2D" => out.push('-'),
            "2F" => out.push('/'),
            _ => {
                return Err(Error::malformed_key(format!(
                    "invalid escape in key token '{}'",
                    escaped
                )))
            }
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Encode one path element as a token
pub fn encode_token(element: &PathElement) -> Result<String> {
    let kind = escape(&element.kind);
    match &element.id {
        Identifier::Id(id) => Ok(format!("{}{}{}", kind, KIND_SEPARATOR, encode_id(*id))),
        Identifier::Name(name) => Ok(format!(
            "{}{}{}{}",
            kind,
            KIND_SEPARATOR,
            NAME_PREFIX,
            escape(name)
        )),
        Identifier::Unassigned => Err(Error::malformed_key(format!(
            "element of kind '{}' has neither id nor name",
            element.kind
        ))),
    }
}

/// Decode one token back into a path element
pub fn decode_token(token: &str) -> Result<PathElement> {
    let (kind, id) = token
        .split_once(KIND_SEPARATOR)
        .ok_or_else(|| Error::malformed_key(format!("key token '{}' has no kind", token)))?;
    let kind = unescape(kind)?;
    let id = if let Some(name) = id.strip_prefix(NAME_PREFIX) {
        Identifier::Name(unescape(name)?)
    } else {
        let digits = id.strip_prefix(ID_PREFIX).unwrap_or_default();
        Identifier::Id(decode_id(digits).ok_or_else(|| {
            Error::malformed_key(format!("key token '{}' has an invalid id", token))
        })?)
    };
    Ok(PathElement { kind, id })
}

/// Structural encoding: one token per path element, root first
pub fn encode_path(key: &Key) -> Result<Vec<String>> {
    key.path().iter().map(encode_token).collect()
}

/// Decode the structural encoding
pub fn decode_path<S: AsRef<str>>(tokens: &[S]) -> Result<Key> {
    let path = tokens
        .iter()
        .map(|t| decode_token(t.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let key = Key::from_path(path)?;
    key.validate()?;
    Ok(key)
}

/// Flat encoding used as the storage document identifier
pub fn encode_for_storage(key: &Key) -> Result<String> {
    Ok(encode_path(key)?.join(&TOKEN_SEPARATOR.to_string()))
}

/// Decode the flat encoding
pub fn decode_from_storage(flat: &str) -> Result<Key> {
    if flat.is_empty() {
        return Err(Error::malformed_key("key path is empty"));
    }
    let tokens: Vec<&str> = flat.split(TOKEN_SEPARATOR).collect();
    decode_path(&tokens)
}

/// Collection holding every entity whose root kind is `kind`
pub fn collection_for_kind(kind: &str) -> String {
    kind.to_lowercase()
}

/// Collection holding the entity group of `key`
pub fn collection_of(key: &Key) -> String {
    collection_for_kind(&key.root().kind)
}
