//! Mention and link detection for free-form profile text.
//!
//! Offsets are byte offsets into the UTF-8 source text, half-open.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref MENTION_REGEX: Regex =
        Regex::new(r"(^|\s|\()(@)([a-zA-Z0-9.-]+)\b").expect("mention regex");
    static ref LINK_REGEX: Regex = Regex::new(
        r"(?i)(^|\s|\()(?P<token>(https?://\S+)|((?P<domain>[a-z][a-z0-9]*(?:\.[a-z0-9]+)+)\S*))"
    )
    .expect("link regex");
    static ref TRAILING_PUNCTUATION: Regex = Regex::new(r"[.,;!?]$").expect("punctuation regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Mention,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSlice {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub value: String,
    pub index: TextSlice,
}

/// Extracts `@handle` mentions and links from `text`, ordered by position.
///
/// Bare domains (`example.com/path`) are reported as `https://` links. One
/// trailing sentence punctuation character is not part of a link.
pub fn extract_entities(text: &str) -> Vec<Entity> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut entities = Vec::new();

    for caps in MENTION_REGEX.captures_iter(text) {
        let (Some(at), Some(handle)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        entities.push(Entity {
            kind: EntityKind::Mention,
            value: handle.as_str().to_string(),
            index: TextSlice {
                start: at.start(),
                end: handle.end(),
            },
        });
    }

    for caps in LINK_REGEX.captures_iter(text) {
        let Some(token) = caps.name("token") else {
            continue;
        };
        let mut value = token.as_str().to_string();
        let mut index = TextSlice {
            start: token.start(),
            end: token.end(),
        };

        if let Some(domain) = caps.name("domain") {
            if !has_plausible_tld(domain.as_str()) {
                continue;
            }
            value = format!("https://{value}");
        }

        if TRAILING_PUNCTUATION.is_match(&value) {
            value.pop();
            index.end -= 1;
        }
        if value.ends_with(')') && !value.contains('(') {
            value.pop();
            index.end -= 1;
        }

        entities.push(Entity {
            kind: EntityKind::Link,
            value,
            index,
        });
    }

    entities.sort_by_key(|entity| entity.index.start);
    entities
}

fn has_plausible_tld(domain: &str) -> bool {
    domain
        .rsplit('.')
        .next()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/entities_tests.rs"]
mod tests;
