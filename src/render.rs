//! Result rendering
//!
//! Pure mapping from ranked matches to display rows. The matcher reports
//! positions into each item's flattened selector text; this module projects
//! them back through the document offset map onto the title / item class /
//! subtitle / detail fragments so only in-range characters highlight.
//!
//! Items without a document (command and link items) fall back to locating
//! the query as a visible substring, then to token-level matches.
//!
//! Nothing here mutates state; selection and activation callbacks are the
//! caller's concern.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::document::DocumentRegion;
use crate::items::{Item, MatchResult};

/// Character indices to highlight within one displayed fragment
pub type HighlightIndices = SmallVec<[u32; 8]>;

/// One displayed text region with its highlighted character positions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub highlights: HighlightIndices,
}

impl Fragment {
    fn plain(text: impl Into<String>) -> Self {
        Fragment {
            text: text.into(),
            highlights: SmallVec::new(),
        }
    }
}

/// Domain state badge shown next to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Muted,
    Bypassed,
    Pinned,
    Collapsed,
}

/// One fully prepared result row
#[derive(Debug, Clone)]
pub struct RenderedRow {
    pub id: String,
    /// Item discriminant ("node" / "link" / "command")
    pub kind: &'static str,
    pub title: Fragment,
    pub item_class: Option<Fragment>,
    pub subtitle: Vec<Fragment>,
    pub detail: Vec<Fragment>,
    pub badges: Vec<Badge>,
    /// Row at the keyboard-active index
    pub active: bool,
    /// Row is in the multi-select set
    pub selected: bool,
    /// Row was force-appended to keep the selection visible
    pub pinned: bool,
}

/// Map ranked matches onto display rows.
///
/// `highlight_query` drives the substring/token fallback for items without
/// an offset map; `selected_keys` flags rows in the multi-select set.
pub fn render_rows(
    matches: &[MatchResult],
    active_index: usize,
    highlight_query: &str,
    selected_keys: &HashSet<String>,
) -> Vec<RenderedRow> {
    matches
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let mut row = render_match(result, highlight_query);
            row.active = index == active_index;
            row.selected = selected_keys.contains(&result.item.selection_key());
            row.pinned = result.pinned;
            row
        })
        .collect()
}

fn render_match(result: &MatchResult, highlight_query: &str) -> RenderedRow {
    match &*result.item {
        Item::Node(node) => {
            let offsets = node.document.offsets();
            let mut title = Fragment::plain(&node.title);
            let mut item_class = Fragment::plain(&node.item_class);
            let mut subtitle: Vec<Fragment> = node
                .subtitle_path
                .iter()
                .map(|segment| Fragment::plain(&segment.name))
                .collect();
            let mut detail: Vec<Fragment> = node
                .document
                .detail_parts
                .iter()
                .map(Fragment::plain)
                .collect();

            for &position in &result.positions {
                let position = position as usize;
                for (region, span) in offsets.regions() {
                    if !span.contains(position) {
                        continue;
                    }
                    let relative = (position - span.start) as u32;
                    match region {
                        DocumentRegion::Title => title.highlights.push(relative),
                        DocumentRegion::ItemClass => item_class.highlights.push(relative),
                        DocumentRegion::Subtitle(i) => {
                            if let Some(fragment) = subtitle.get_mut(i) {
                                fragment.highlights.push(relative);
                            }
                        }
                        DocumentRegion::Detail(i) => {
                            if let Some(fragment) = detail.get_mut(i) {
                                fragment.highlights.push(relative);
                            }
                        }
                    }
                    break;
                }
            }

            let mut badges = Vec::new();
            if node.flags.muted {
                badges.push(Badge::Muted);
            }
            if node.flags.bypassed {
                badges.push(Badge::Bypassed);
            }
            if node.flags.pinned {
                badges.push(Badge::Pinned);
            }
            if node.flags.collapsed {
                badges.push(Badge::Collapsed);
            }

            RenderedRow {
                id: node.id.clone(),
                kind: "node",
                title,
                item_class: if node.item_class.is_empty() {
                    None
                } else {
                    Some(item_class)
                },
                subtitle,
                detail,
                badges,
                active: false,
                selected: false,
                pinned: false,
            }
        }
        Item::Link(link) => RenderedRow {
            id: link.id.clone(),
            kind: "link",
            title: fallback_fragment(&link.title, highlight_query),
            item_class: None,
            subtitle: Vec::new(),
            detail: Vec::new(),
            badges: Vec::new(),
            active: false,
            selected: false,
            pinned: false,
        },
        Item::Command(command) => RenderedRow {
            id: command.id.clone(),
            kind: "command",
            title: fallback_fragment(&command.title, highlight_query),
            item_class: command.item_class.as_ref().map(Fragment::plain),
            subtitle: Vec::new(),
            detail: command.detail.iter().map(Fragment::plain).collect(),
            badges: Vec::new(),
            active: false,
            selected: false,
            pinned: false,
        },
    }
}

/// Highlight an undocumented item's title: whole-query substring first,
/// token-level matches otherwise.
fn fallback_fragment(text: &str, highlight_query: &str) -> Fragment {
    let mut fragment = Fragment::plain(text);
    let query = highlight_query.trim();
    if query.is_empty() {
        return fragment;
    }

    let query_lower = query.to_lowercase();
    if let Some(start) = find_chars_ignore_case(text, &query_lower) {
        let len = query_lower.chars().count();
        fragment
            .highlights
            .extend((start..start + len).map(|i| i as u32));
        return fragment;
    }

    // Token-level fallback: highlight each query word found anywhere
    let mut positions: Vec<u32> = Vec::new();
    for token in query_lower.split_whitespace() {
        if let Some(start) = find_chars_ignore_case(text, token) {
            let len = token.chars().count();
            positions.extend((start..start + len).map(|i| i as u32));
        }
    }
    positions.sort_unstable();
    positions.dedup();
    fragment.highlights.extend(positions);
    fragment
}

/// Find the character index of `needle_lower` in `haystack`, ASCII
/// case-insensitive. `needle_lower` must already be lowercase.
fn find_chars_ignore_case(haystack: &str, needle_lower: &str) -> Option<usize> {
    let haystack: Vec<char> = haystack.chars().collect();
    let needle: Vec<char> = needle_lower.chars().collect();
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    'outer: for start in 0..=(haystack.len() - needle.len()) {
        for (offset, expected) in needle.iter().enumerate() {
            if haystack[start + offset].to_ascii_lowercase() != *expected {
                continue 'outer;
            }
        }
        return Some(start);
    }
    None
}
