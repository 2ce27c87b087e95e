//! Host graph boundary - snapshot data model and injected capabilities
//!
//! The palette never talks to the editor's canvas directly. The host hands it:
//! - a [`GraphSource`] that produces a [`GraphData`] snapshot of the live graph
//! - a [`Navigation`] capability for viewport/graph-context/selection mutation
//!
//! Keeping both behind traits means the interaction state machine can be
//! driven in tests by a recording fake, and the snapshot/restore *ordering*
//! lives in this crate while the effectful operations live in the host.

use serde::{Deserialize, Serialize};

/// Identifier of a node or link inside one graph level.
/// Unique per level only; nested subgraphs may reuse ids, which is why
/// [`EntityRef`] carries the full container path.
pub type EntityId = u64;

// ============================================================================
// Snapshot data model
// ============================================================================

/// One editable field on a node (widget value, not a wire)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldData {
    pub name: String,
    pub value: String,
    /// True when the field is driven by an incoming link rather than a widget
    pub connected: bool,
}

/// Visual/behavioral state flags surfaced as result badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags {
    pub muted: bool,
    pub bypassed: bool,
    pub pinned: bool,
    pub collapsed: bool,
}

/// Snapshot of a single node
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub id: EntityId,
    /// Display name shown in the editor (falls back to the type name)
    pub name: String,
    /// Registered entity type (e.g. "LoadImage")
    pub type_name: String,
    /// Node-level display-class override, used when no info provider is
    /// registered for the type
    pub type_label: Option<String>,
    pub fields: Vec<FieldData>,
    pub flags: NodeFlags,
    /// Present when this node contains a nested graph
    pub subgraph: Option<GraphData>,
}

/// Snapshot of a single link between two nodes
#[derive(Debug, Clone)]
pub struct LinkData {
    pub id: EntityId,
    pub from_node: EntityId,
    pub to_node: EntityId,
    /// Optional wire label (e.g. the slot type)
    pub label: Option<String>,
}

/// Snapshot of one graph level
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
}

impl GraphData {
    /// Look up the graph level addressed by a container path.
    /// An empty path is the level itself.
    pub fn level(&self, path: &[EntityId]) -> Option<&GraphData> {
        let mut current = self;
        for container in path {
            current = current
                .nodes
                .iter()
                .find(|n| n.id == *container)?
                .subgraph
                .as_ref()?;
        }
        Some(current)
    }

    /// Whether the referenced entity still exists in this snapshot.
    /// Used by the post-command prune pass.
    pub fn contains(&self, entity: &EntityRef) -> bool {
        let Some(level) = self.level(&entity.path) else {
            return false;
        };
        match entity.target {
            EntityTarget::Node(id) => level.nodes.iter().any(|n| n.id == id),
            EntityTarget::Link(id) => level.links.iter().any(|l| l.id == id),
        }
    }
}

// ============================================================================
// Entity references
// ============================================================================

/// What an [`EntityRef`] points at within its graph level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTarget {
    Node(EntityId),
    Link(EntityId),
}

/// Stable reference to an entity anywhere in the (possibly nested) graph.
///
/// `path` lists the ids of the container nodes from the root down to the
/// level holding the entity, so two nodes with the same id at different
/// nesting depths never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub path: Vec<EntityId>,
    pub target: EntityTarget,
}

impl EntityRef {
    pub fn node(path: Vec<EntityId>, id: EntityId) -> Self {
        EntityRef {
            path,
            target: EntityTarget::Node(id),
        }
    }

    pub fn link(path: Vec<EntityId>, id: EntityId) -> Self {
        EntityRef {
            path,
            target: EntityTarget::Link(id),
        }
    }

    /// Path-qualified id string, e.g. node 5 inside subgraph node 2 -> "2:5".
    /// This is the `id` carried by result items.
    pub fn qualified_id(&self) -> String {
        let leaf = match self.target {
            EntityTarget::Node(id) => id,
            EntityTarget::Link(id) => id,
        };
        let mut parts: Vec<String> = self.path.iter().map(|p| p.to_string()).collect();
        parts.push(leaf.to_string());
        parts.join(":")
    }
}

// ============================================================================
// Injected capabilities
// ============================================================================

/// Viewport transform of the editor canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// How a reveal should frame its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealMode {
    /// Temporary centering at reduced zoom while Shift is held
    Preview { zoom: f32 },
    /// Committed navigation at full zoom; `overlay_inset` is the width of
    /// any UI panel covering part of the canvas, so centering can shift
    Final { overlay_inset: f32 },
}

/// Produces snapshots of the live graph
pub trait GraphSource {
    fn snapshot(&self) -> GraphData;
}

/// Effectful navigation operations owned by the host editor.
///
/// Restore paths are best-effort: the state machine logs and continues if
/// the host errors mid-rollback.
pub trait Navigation {
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport) -> anyhow::Result<()>;

    /// Current subgraph stack (empty = root graph)
    fn graph_context(&self) -> Vec<EntityId>;
    fn set_graph_context(&mut self, path: &[EntityId]) -> anyhow::Result<()>;

    fn selection(&self) -> Vec<EntityRef>;
    fn set_selection(&mut self, selection: &[EntityRef]) -> anyhow::Result<()>;

    /// Enter the entity's graph level and center the viewport on it
    fn reveal(&mut self, target: &EntityRef, mode: RevealMode) -> anyhow::Result<()>;
}
