//! Query mini-language parsing
//!
//! Three independent passes over the typed query:
//! - `parse_keyword` - splits a leading registered keyword off the input
//! - `parse_filters` - extracts `name:value` / `name:"quoted value"` tokens
//! - `expand_braces` - expands `{a,b}` groups into alternative queries
//!
//! Patterns are compiled once per process via `OnceLock`.

use std::sync::OnceLock;

use regex::Regex;

/// Result of the keyword pass over a raw query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Lower-cased keyword, empty when `matched` is false
    pub keyword: String,
    /// Everything after the keyword, or the whole query when unmatched
    pub remainder: String,
    pub matched: bool,
}

/// One extracted `name:value` filter token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilter {
    pub name: String,
    pub value: String,
    /// Byte range the token occupied in the original text
    pub span: (usize, usize),
}

fn keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\w+)\s+(.*)$").expect("keyword pattern compiles"))
}

fn filter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Name must start with a letter/underscore so numeric tokens like
    // "521:123" are never mistaken for a filter.
    RE.get_or_init(|| {
        Regex::new(r#"\b([A-Za-z_]\w*):(?:"([^"]+)"|(\S+))"#).expect("filter pattern compiles")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern compiles"))
}

/// Split a leading registered keyword off the query.
///
/// Only a registered keyword activates; an unregistered leading word stays
/// ordinary query text. Lookup is on the lower-cased first token.
pub fn parse_keyword(query: &str, is_registered: impl Fn(&str) -> bool) -> ParsedQuery {
    if let Some(caps) = keyword_re().captures(query) {
        let word = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let keyword = word.to_lowercase();
        if is_registered(&keyword) {
            return ParsedQuery {
                keyword,
                remainder: caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string(),
                matched: true,
            };
        }
    }
    ParsedQuery {
        keyword: String::new(),
        remainder: query.to_string(),
        matched: false,
    }
}

/// Extract every `name:value` / `name:"quoted value"` token from the text.
///
/// Returns the remaining free text (token spans replaced by a space, then
/// whitespace-collapsed and trimmed) and the extracted filters in order.
pub fn parse_filters(text: &str) -> (String, Vec<ParsedFilter>) {
    let mut filters = Vec::new();
    let mut stripped = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in filter_re().captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        filters.push(ParsedFilter {
            name: name.to_string(),
            value: value.to_string(),
            span: (whole.start(), whole.end()),
        });
        stripped.push_str(&text[last_end..whole.start()]);
        stripped.push(' ');
        last_end = whole.end();
    }
    stripped.push_str(&text[last_end..]);

    let free_text = whitespace_re().replace_all(&stripped, " ").trim().to_string();
    (free_text, filters)
}

/// Expand `{a,b}` groups into the full set of alternative queries.
///
/// Groups expand left to right, cartesian across multiple groups
/// (`"{a,b}-{x,y}"` yields four alternatives). A query without braces, or
/// with an unbalanced brace, passes through as a single literal.
pub fn expand_braces(query: &str) -> Vec<String> {
    let Some(open) = query.find('{') else {
        return vec![query.to_string()];
    };
    let Some(close_rel) = query[open..].find('}') else {
        return vec![query.to_string()];
    };
    let close = open + close_rel;

    let prefix = &query[..open];
    let inner = &query[open + 1..close];
    let suffix = &query[close + 1..];

    let mut expanded = Vec::new();
    for option in inner.split(',') {
        let candidate = format!("{}{}{}", prefix, option, suffix);
        // The suffix may contain further groups; recurse on the rebuilt query
        for alternative in expand_braces(&candidate) {
            if !expanded.contains(&alternative) {
                expanded.push(alternative);
            }
        }
    }
    expanded
}
