//! Page URL handling: bare URL vs. query, query pairs, and percent escapes
//! compatible with `encodeURIComponent`/`decodeURIComponent`.

use std::collections::HashMap;

pub type ParamMap = HashMap<String, String>;

/// Query key holding a compact configuration token.
pub const TOKEN_KEY: &str = "cfg";

const UNRESERVED_MARKS: &[u8] = b"-_.!~*'()";

/// Splits at the last `?`. Returns the URL without parameters and the query.
pub fn split_url(url: &str) -> (&str, &str) {
    match url.rfind('?') {
        Some(pos) => (&url[..pos], &url[pos + 1..]),
        None => (url, ""),
    }
}

pub fn parse_query(query: &str) -> ParamMap {
    let mut params = ParamMap::new();
    if query.is_empty() {
        return params;
    }
    for pair in query.split('&') {
        // without '=' the whole pair is the value of an empty key
        let (key, value) = pair.split_once('=').unwrap_or(("", pair));
        params.insert(
            decode_component(key).trim().to_string(),
            decode_component(value).trim().to_string(),
        );
    }
    params
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|v| v as u8)
}

/// Percent-decodes `s`. Malformed escapes are left as written; if the decoded
/// bytes are not UTF-8 the input comes back unchanged.
pub fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if b.is_ascii_alphanumeric() || UNRESERVED_MARKS.contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
