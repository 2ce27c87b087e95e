//! Search orchestration
//!
//! One [`run_query`] call is the whole per-keystroke pipeline: resolve the
//! active/newly-typed keyword, assemble candidates (graph walk or keyword
//! handler, plus default handlers), apply `name:value` filters, run the
//! fuzzy matcher once per brace-expansion alternative, union the runs,
//! drop scattered matches, sort, truncate, and re-append pinned selection
//! items.
//!
//! Publishing is guarded by a [`GenerationCounter`]: the session captures
//! a ticket before running and checks it before installing results, so a
//! superseded run is discarded silently - last request wins.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::candidates;
use crate::config::SpotlightConfig;
use crate::error::{ResultExt, SpotlightError};
use crate::graph::{EntityId, GraphData};
use crate::items::{Item, MatchResult};
use crate::matcher::MatchContext;
use crate::query::{expand_braces, parse_filters, parse_keyword, ParsedFilter};
use crate::registry::{HandlerContext, SpotlightRegistry};

/// Monotonic run counter for last-request-wins publishing
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    /// Start a new run and return its ticket
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Whether the ticket still belongs to the newest run
    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.current
    }
}

/// Inputs to one orchestration run
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// The visible input text (keyword already stripped when one is active)
    pub input: &'a str,
    /// Currently active keyword, if any
    pub active_keyword: Option<&'a str>,
    /// True while keyword reactivation is gated after a deactivation
    pub reactivation_gated: bool,
    /// Subgraph stack the editor is currently inside
    pub context_path: &'a [EntityId],
    /// True when multi-select mode is on (selected items get pinned)
    pub multi_select: bool,
    /// Currently selected items, in selection order
    pub selected: &'a [Arc<Item>],
}

/// Output of one orchestration run
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<MatchResult>,
    /// Keyword that newly activated during this run
    pub activated_keyword: Option<String>,
    /// Input text with the newly activated keyword stripped off
    pub stripped_input: Option<String>,
    /// Placeholder text a keyword handler asked to show
    pub placeholder: Option<String>,
    /// Free text left after keyword and filter stripping; drives the
    /// renderer's fallback highlighting
    pub highlight_query: String,
}

/// Run the full query pipeline against one graph snapshot
pub fn run_query(
    registry: &SpotlightRegistry,
    config: &SpotlightConfig,
    graph: &GraphData,
    request: &SearchRequest<'_>,
) -> SearchOutcome {
    let mut active_keyword: Option<String> = request.active_keyword.map(str::to_string);
    let mut input = request.input.to_string();
    let mut activated_keyword = None;
    let mut stripped_input = None;

    // Keyword resolution. A newly matched keyword is a transition, not a
    // terminal result: strip it from the visible input and re-run.
    let remainder = loop {
        let full_query = match &active_keyword {
            Some(keyword) => format!("{} {}", keyword, input),
            None => input.clone(),
        };
        let parsed = parse_keyword(&full_query, |k| registry.is_keyword(k));
        let newly_matched =
            parsed.matched && active_keyword.as_deref() != Some(parsed.keyword.as_str());
        if newly_matched && !request.reactivation_gated {
            debug!(keyword = %parsed.keyword, "Activating keyword");
            input = parsed.remainder.clone();
            stripped_input = Some(parsed.remainder);
            active_keyword = Some(parsed.keyword.clone());
            activated_keyword = Some(parsed.keyword);
            continue;
        }
        if parsed.matched && active_keyword.is_some() {
            break parsed.remainder;
        }
        break full_query;
    };

    let placeholder_cell: Mutex<Option<String>> = Mutex::new(None);
    let ctx = HandlerContext::new(
        graph,
        request.context_path.to_vec(),
        registry,
        &placeholder_cell,
    );

    // Candidate assembly. Handler failures are isolated: a broken plugin
    // contributes nothing and the query continues.
    let candidate_items: Vec<Arc<Item>> = match &active_keyword {
        Some(keyword) => registry
            .keyword_handler(keyword)
            .and_then(|handler| {
                handler(&remainder, &ctx)
                    .map_err(|source| SpotlightError::KeywordHandler {
                        keyword: keyword.clone(),
                        source,
                    })
                    .log_err()
            })
            .map(|contributed| contributed.items.into_iter().map(Arc::new).collect())
            .unwrap_or_default(),
        None => {
            let mut items = candidates::build_candidates(graph, registry);
            for handler in registry.default_handlers() {
                if let Some(contributed) = handler(&ctx)
                    .map_err(SpotlightError::DefaultHandler)
                    .log_err()
                {
                    items.extend(contributed.items.into_iter().map(Arc::new));
                }
            }
            items
        }
    };

    // Filter pass: logical AND across every extracted filter token.
    let (free_text, filters) = parse_filters(&remainder);
    let filtered: Vec<Arc<Item>> = candidate_items
        .into_iter()
        .filter(|item| passes_filters(item, &filters, registry, graph))
        .collect();

    // Match pass: one matcher run per brace alternative, unioned by item
    // identity in first-seen order. An item matching several alternatives
    // keeps the first run's score and positions.
    let mut results = match_candidates(&filtered, &free_text);

    // Scattered single-character matches rank above nothing useful: drop
    // any match with 2+ positions and no adjacent pair.
    results.retain(|result| has_adjacent_positions(&result.positions));

    // Stable sort keeps candidate order among equal scores.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(config.max_matches);

    // Selection survives filtering and requeries: re-append any selected
    // item the query excluded, pinned with score 0.
    if request.multi_select {
        let present: HashSet<String> = results
            .iter()
            .map(|r| r.item.selection_key())
            .collect();
        for selected in request.selected {
            if !present.contains(&selected.selection_key()) {
                results.push(MatchResult::pinned(selected.clone()));
            }
        }
    }

    SearchOutcome {
        results,
        activated_keyword,
        stripped_input,
        placeholder: placeholder_cell.into_inner(),
        highlight_query: free_text,
    }
}

fn match_candidates(filtered: &[Arc<Item>], free_text: &str) -> Vec<MatchResult> {
    let alternatives = expand_braces(free_text.trim());
    let all_blank = alternatives.iter().all(|alt| alt.trim().is_empty());
    if all_blank {
        // Empty query matches every candidate, tie-broken by candidate order
        return filtered
            .iter()
            .map(|item| MatchResult::new(item.clone(), 0, Vec::new()))
            .collect();
    }

    let mut results = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for alternative in &alternatives {
        let alternative = alternative.trim();
        if alternative.is_empty() {
            continue;
        }
        let mut matcher = MatchContext::new(alternative);
        for item in filtered {
            let key = item.selection_key();
            if seen.contains(&key) {
                continue;
            }
            if let Some((score, positions)) = matcher.indices(&item.selector_text()) {
                seen.insert(key);
                results.push(MatchResult::new(item.clone(), score, positions));
            }
        }
    }
    results
}

fn passes_filters(
    item: &Item,
    filters: &[ParsedFilter],
    registry: &SpotlightRegistry,
    graph: &GraphData,
) -> bool {
    for filter in filters {
        let survives = match registry.filter(&filter.name) {
            Some(predicate) => predicate(item, &filter.value)
                .map_err(|source| SpotlightError::FilterPredicate {
                    name: filter.name.clone(),
                    source,
                })
                .log_err()
                .unwrap_or(false),
            None => field_fallback_match(item, filter, graph),
        };
        if !survives {
            return false;
        }
    }
    true
}

/// Unregistered filter names fall back to a case-sensitive substring match
/// against the same-named non-connected field of the underlying node.
fn field_fallback_match(item: &Item, filter: &ParsedFilter, graph: &GraphData) -> bool {
    let Item::Node(node_item) = item else {
        return false;
    };
    let Some(level) = graph.level(&node_item.entity.path) else {
        return false;
    };
    let node_id = match node_item.entity.target {
        crate::graph::EntityTarget::Node(id) => id,
        crate::graph::EntityTarget::Link(_) => return false,
    };
    let Some(node) = level.nodes.iter().find(|n| n.id == node_id) else {
        return false;
    };
    node.fields
        .iter()
        .any(|f| !f.connected && f.name == filter.name && f.value.contains(&filter.value))
}

/// A match with 2+ highlighted positions survives only if at least one
/// pair of positions is adjacent; 0- or 1-position matches always pass.
fn has_adjacent_positions(positions: &[u32]) -> bool {
    positions.len() < 2 || positions.windows(2).any(|w| w[1] - w[0] == 1)
}
