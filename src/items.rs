//! Result item types
//!
//! Everything the palette can surface is one of three item kinds: a graph
//! node, a graph link, or an ad-hoc command contributed by a plugin. The
//! union is closed so every consumer (orchestrator, renderer, selection
//! handling) matches exhaustively.
//!
//! Items are shared as `Arc<Item>` so requery/pin/render paths clone
//! refcounts, not documents.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::document::SearchDocument;
use crate::graph::{EntityId, EntityRef, NodeFlags};

/// One ancestor hop in a nested node's subtitle path (outermost first)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleSegment {
    pub name: String,
    pub node_id: EntityId,
}

/// A graph node result
#[derive(Debug, Clone)]
pub struct NodeItem {
    /// Path-qualified id, e.g. "2:5" for node 5 inside subgraph node 2
    pub id: String,
    /// Display name plus `#id` suffix
    pub title: String,
    /// Entity type, possibly overridden by an info provider
    pub item_class: String,
    /// Ancestor chain for nodes inside subgraphs (outermost first)
    pub subtitle_path: Vec<SubtitleSegment>,
    pub document: SearchDocument,
    pub entity: EntityRef,
    pub flags: NodeFlags,
}

/// A graph link result
#[derive(Debug, Clone)]
pub struct LinkItem {
    pub id: String,
    pub title: String,
    pub entity: EntityRef,
}

/// Callback invoked when a command item is selected
pub type CommandAction = Arc<dyn Fn(&CommandItem) + Send + Sync>;

/// An ad-hoc command contributed by a keyword or default handler
#[derive(Clone, Default)]
pub struct CommandItem {
    pub id: String,
    pub title: String,
    pub item_class: Option<String>,
    /// Extra display lines shown in the detail area
    pub detail: Vec<String>,
    /// Selecting an item with an action runs it instead of navigating
    pub action: Option<CommandAction>,
}

impl fmt::Debug for CommandItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("item_class", &self.item_class)
            .field("detail", &self.detail)
            .field("action", &self.action.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Closed union of everything the palette can list
#[derive(Debug, Clone)]
pub enum Item {
    Node(NodeItem),
    Link(LinkItem),
    Command(CommandItem),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Item::Node(n) => &n.id,
            Item::Link(l) => &l.id,
            Item::Command(c) => &c.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Item::Node(n) => &n.title,
            Item::Link(l) => &l.title,
            Item::Command(c) => &c.title,
        }
    }

    /// Discriminant string, also the prefix of [`Item::selection_key`]
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Node(_) => "node",
            Item::Link(_) => "link",
            Item::Command(_) => "command",
        }
    }

    /// Stable dedup key for multi-select: `kind:id`
    pub fn selection_key(&self) -> String {
        format!("{}:{}", self.kind(), self.id())
    }

    /// The entity behind this item, if it is graph-backed
    pub fn entity(&self) -> Option<&EntityRef> {
        match self {
            Item::Node(n) => Some(&n.entity),
            Item::Link(l) => Some(&l.entity),
            Item::Command(_) => None,
        }
    }

    /// The structured document, present for node items only
    pub fn document(&self) -> Option<&SearchDocument> {
        match self {
            Item::Node(n) => Some(&n.document),
            _ => None,
        }
    }

    /// Text the fuzzy matcher scores for this item: the flattened document
    /// when one exists, otherwise title + id.
    pub fn selector_text(&self) -> Cow<'_, str> {
        match self {
            Item::Node(n) => Cow::Borrowed(n.document.flattened()),
            Item::Link(l) => Cow::Owned(format!("{} {}", l.title, l.id)),
            Item::Command(c) => Cow::Owned(format!("{} {}", c.title, c.id)),
        }
    }
}

/// One ranked result: an item, its score, and the character positions the
/// matcher highlighted in the item's selector text (sorted ascending).
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub item: Arc<Item>,
    pub score: u32,
    pub positions: Vec<u32>,
    /// Set for selection items re-appended after filtering excluded them
    pub pinned: bool,
}

impl MatchResult {
    pub fn new(item: Arc<Item>, score: u32, positions: Vec<u32>) -> Self {
        MatchResult {
            item,
            score,
            positions,
            pinned: false,
        }
    }

    /// A selection item forced into the result set regardless of the query
    pub fn pinned(item: Arc<Item>) -> Self {
        MatchResult {
            item,
            score: 0,
            positions: Vec::new(),
            pinned: true,
        }
    }
}
