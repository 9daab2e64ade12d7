use super::{FormatPolicy, PolicyKind};

/// Percent-encode the UTF-8 bytes of `value` for a query string. ASCII
/// alphanumerics and `_.-~` are kept and a space becomes `+`.
pub fn quote_plus(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Encodes tag values for use in a URL query string
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlQuery;

impl FormatPolicy for UrlQuery {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Url
    }

    fn format_value(&self, _key: &str, value: String) -> String {
        quote_plus(&value)
    }
}
