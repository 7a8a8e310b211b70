//! Utility functions for qualified names and markup escaping
//!
//! Namespaced names use Clark notation: `{uri}local`.

/// The XML namespace, bound to the `xml` prefix by definition
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Leading `{uri}` group of a tag, braces included
pub fn namespace_prefix(tag: &str) -> Option<&str> {
    if !tag.starts_with('{') {
        return None;
    }
    tag.find('}').map(|end| &tag[..=end])
}

/// Split a tag into namespace URI and local part
pub fn split_qname(tag: &str) -> (Option<&str>, &str) {
    match namespace_prefix(tag) {
        Some(prefix) => (Some(&prefix[1..prefix.len() - 1]), &tag[prefix.len()..]),
        None => (None, tag),
    }
}

/// Qualify `name` with the namespace of `context_tag`
///
/// Names that already carry a namespace group are returned unchanged.
pub fn qualify(context_tag: &str, name: &str) -> String {
    if name.starts_with('{') {
        return name.to_string();
    }
    match namespace_prefix(context_tag) {
        Some(prefix) => format!("{}{}", prefix, name),
        None => name.to_string(),
    }
}

/// Build a Clark-notation name
pub fn clark_name(uri: Option<&str>, local: &str) -> String {
    match uri {
        Some(uri) if !uri.is_empty() => format!("{{{}}}{}", uri, local),
        _ => local.to_string(),
    }
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for a double-quoted attribute
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#09;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn is_name_start_char(c: char) -> bool {
    c == '_' || c == ':' || c.is_alphabetic()
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c == '-' || c == '.' || c.is_numeric() || c == '\u{B7}'
}

/// The XML 1.0 `Char` production
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}
