//! Plugin registration surface
//!
//! Holds everything plugins contribute at startup: keyword handlers,
//! default (unconditional) handlers, named filter predicates, per-type
//! node info providers, and selection commands.
//!
//! One registry instance is owned per palette engine and injected
//! explicitly, so independent palette instances (and tests) never share
//! state through a process-wide global.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use regex::Regex;
use tracing::debug;

use crate::candidates::{self, CollectedNode};
use crate::graph::{EntityId, GraphData, Navigation, NodeData};
use crate::items::Item;

/// Items contributed by one handler invocation
#[derive(Debug, Default)]
pub struct HandlerItems {
    pub items: Vec<Item>,
}

impl HandlerItems {
    pub fn new(items: Vec<Item>) -> Self {
        HandlerItems { items }
    }
}

/// Invoked when the query's first token matches this handler's keyword.
/// Receives the remainder text (filters still included) and the context.
pub type KeywordHandler =
    Arc<dyn Fn(&str, &HandlerContext) -> anyhow::Result<HandlerItems> + Send + Sync>;

/// Invoked on every keyword-less query to contribute extra items.
pub type DefaultHandler =
    Arc<dyn Fn(&HandlerContext) -> anyhow::Result<HandlerItems> + Send + Sync>;

/// Decides whether an item survives a `name:value` filter token.
pub type FilterPredicate = Arc<dyn Fn(&Item, &str) -> anyhow::Result<bool> + Send + Sync>;

/// Extra display information a node info provider contributes for a type
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    /// Extra detail strings appended to the item's search document
    pub details: Vec<String>,
    /// Overrides the displayed item class
    pub item_class: Option<String>,
    /// Appended to the item title after the `#id` suffix
    pub title_suffix: Option<String>,
}

/// Per-entity-type hook that enriches node items
pub type NodeInfoProvider = Arc<dyn Fn(&NodeData) -> NodeInfo + Send + Sync>;

/// Mutable context a selection command operates in
pub struct SelectionContext<'a> {
    /// The currently selected items, in selection order
    pub items: &'a [Arc<Item>],
    pub navigation: &'a mut dyn Navigation,
    /// Width of any UI overlay covering part of the canvas
    pub overlay_inset: f32,
    clear_selection: bool,
}

impl<'a> SelectionContext<'a> {
    pub fn new(
        items: &'a [Arc<Item>],
        navigation: &'a mut dyn Navigation,
        overlay_inset: f32,
    ) -> Self {
        SelectionContext {
            items,
            navigation,
            overlay_inset,
            clear_selection: false,
        }
    }

    /// Ask the session to drop the whole selection after this command
    pub fn request_clear_selection(&mut self) {
        self.clear_selection = true;
    }

    pub fn clear_requested(&self) -> bool {
        self.clear_selection
    }
}

pub type SelectionCommandFn =
    Arc<dyn Fn(&mut SelectionContext) -> anyhow::Result<()> + Send + Sync>;

/// An external command operating on the selected item set
#[derive(Clone)]
pub struct SelectionCommand {
    pub id: String,
    pub label: String,
    pub run: SelectionCommandFn,
    /// When present, gates whether the command is offered for a selection
    pub is_applicable: Option<Arc<dyn Fn(&[Arc<Item>]) -> bool + Send + Sync>>,
}

fn filter_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_]\w*$").expect("filter name pattern compiles"))
}

/// Registry of all pluggable pieces, owned by one palette engine
#[derive(Default)]
pub struct SpotlightRegistry {
    keyword_handlers: HashMap<String, KeywordHandler>,
    default_handlers: Vec<DefaultHandler>,
    filters: HashMap<String, FilterPredicate>,
    info_providers: HashMap<String, NodeInfoProvider>,
    selection_commands: Vec<SelectionCommand>,
}

impl SpotlightRegistry {
    pub fn new() -> Self {
        SpotlightRegistry::default()
    }

    /// Register a handler for a query keyword. Stored lower-cased.
    /// An empty/whitespace keyword is ignored (plugin load must not break
    /// the host page over a bad registration).
    pub fn register_keyword_handler(&mut self, keyword: &str, handler: KeywordHandler) {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            debug!("Ignoring keyword handler registration with empty keyword");
            return;
        }
        self.keyword_handlers.insert(keyword, handler);
    }

    /// Register a handler that contributes items to every keyword-less query
    pub fn register_default_handler(&mut self, handler: DefaultHandler) {
        self.default_handlers.push(handler);
    }

    /// Register a named filter predicate.
    ///
    /// Panics if `name` does not match `^[A-Za-z_]\w*$` - a malformed
    /// filter name is a programmer error, caught loudly at plugin load.
    pub fn register_filter(&mut self, name: &str, predicate: FilterPredicate) {
        if !filter_name_re().is_match(name) {
            panic!(
                "{}",
                crate::error::SpotlightError::InvalidFilterName {
                    name: name.to_string(),
                }
            );
        }
        self.filters.insert(name.to_string(), predicate);
    }

    /// Register an info provider for an entity type (e.g. "LoadImage")
    pub fn register_node_info_provider(&mut self, entity_type: &str, provider: NodeInfoProvider) {
        self.info_providers.insert(entity_type.to_string(), provider);
    }

    pub fn register_selection_command(&mut self, command: SelectionCommand) {
        self.selection_commands.push(command);
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.keyword_handlers.contains_key(keyword)
    }

    pub fn keyword_handler(&self, keyword: &str) -> Option<&KeywordHandler> {
        self.keyword_handlers.get(keyword)
    }

    pub fn default_handlers(&self) -> &[DefaultHandler] {
        &self.default_handlers
    }

    pub fn filter(&self, name: &str) -> Option<&FilterPredicate> {
        self.filters.get(name)
    }

    pub fn info_provider(&self, entity_type: &str) -> Option<&NodeInfoProvider> {
        self.info_providers.get(entity_type)
    }

    pub fn selection_commands(&self) -> &[SelectionCommand] {
        &self.selection_commands
    }

    pub fn selection_command(&self, id: &str) -> Option<&SelectionCommand> {
        self.selection_commands.iter().find(|c| c.id == id)
    }
}

/// Read-only context handed to keyword and default handlers
pub struct HandlerContext<'a> {
    graph: &'a GraphData,
    current_path: Vec<EntityId>,
    registry: &'a SpotlightRegistry,
    placeholder: &'a Mutex<Option<String>>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        graph: &'a GraphData,
        current_path: Vec<EntityId>,
        registry: &'a SpotlightRegistry,
        placeholder: &'a Mutex<Option<String>>,
    ) -> Self {
        HandlerContext {
            graph,
            current_path,
            registry,
            placeholder,
        }
    }

    /// The root graph snapshot
    pub fn root_graph(&self) -> &GraphData {
        self.graph
    }

    /// The graph level the editor is currently inside, falling back to the
    /// root when the context path no longer resolves
    pub fn current_graph(&self) -> &GraphData {
        self.graph.level(&self.current_path).unwrap_or(self.graph)
    }

    /// The nodes of the current graph level, without descending
    pub fn entities(&self) -> &[NodeData] {
        &self.current_graph().nodes
    }

    /// Every node in the graph, recursively descending into subgraphs,
    /// with its container path and ancestor chain
    pub fn collect_entities(&self) -> Vec<CollectedNode<'a>> {
        candidates::collect_nodes(self.graph)
    }

    /// All node items, built the same way the default candidate pass
    /// builds them (info providers applied)
    pub fn node_items(&self) -> Vec<Item> {
        self.collect_entities()
            .into_iter()
            .map(|collected| Item::Node(candidates::build_node_item(&collected, self.registry)))
            .collect()
    }

    /// All link items, recursively
    pub fn link_items(&self) -> Vec<Item> {
        candidates::collect_links(self.graph)
            .into_iter()
            .map(Item::Link)
            .collect()
    }

    /// Set the input placeholder shown while this handler's keyword is active
    pub fn set_placeholder(&self, text: &str) {
        *self.placeholder.lock() = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_keyword_handler() -> KeywordHandler {
        Arc::new(|_, _| Ok(HandlerItems::default()))
    }

    #[test]
    fn keyword_registration_lowercases() {
        let mut registry = SpotlightRegistry::new();
        registry.register_keyword_handler("Node", noop_keyword_handler());
        assert!(registry.is_keyword("node"));
        assert!(!registry.is_keyword("Node"));
    }

    #[test]
    fn empty_keyword_registration_is_a_noop() {
        let mut registry = SpotlightRegistry::new();
        registry.register_keyword_handler("", noop_keyword_handler());
        registry.register_keyword_handler("   ", noop_keyword_handler());
        assert!(!registry.is_keyword(""));
        assert!(registry.keyword_handlers.is_empty());
    }

    #[test]
    fn filter_registration_accepts_word_names() {
        let mut registry = SpotlightRegistry::new();
        registry.register_filter("type", Arc::new(|_, _| Ok(true)));
        registry.register_filter("_state2", Arc::new(|_, _| Ok(true)));
        assert!(registry.filter("type").is_some());
        assert!(registry.filter("_state2").is_some());
    }

    #[test]
    #[should_panic(expected = "Invalid filter name '9type'")]
    fn filter_registration_panics_on_leading_digit() {
        let mut registry = SpotlightRegistry::new();
        registry.register_filter("9type", Arc::new(|_, _| Ok(true)));
    }

    #[test]
    #[should_panic(expected = "Invalid filter name 'bad name'")]
    fn filter_registration_panics_on_spaces() {
        let mut registry = SpotlightRegistry::new();
        registry.register_filter("bad name", Arc::new(|_, _| Ok(true)));
    }

    #[test]
    fn placeholder_is_visible_to_the_caller() {
        let registry = SpotlightRegistry::new();
        let graph = GraphData::default();
        let placeholder = Mutex::new(None);
        let ctx = HandlerContext::new(&graph, vec![], &registry, &placeholder);
        ctx.set_placeholder("Search nodes");
        assert_eq!(placeholder.lock().as_deref(), Some("Search nodes"));
    }

    #[test]
    fn selection_command_lookup_by_id() {
        let mut registry = SpotlightRegistry::new();
        registry.register_selection_command(SelectionCommand {
            id: "reveal".to_string(),
            label: "Reveal in canvas".to_string(),
            run: Arc::new(|_| Ok(())),
            is_applicable: None,
        });
        assert!(registry.selection_command("reveal").is_some());
        assert!(registry.selection_command("missing").is_none());
    }
}
