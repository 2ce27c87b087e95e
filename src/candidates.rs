//! Candidate assembly from the live graph
//!
//! Walks a [`GraphData`] snapshot recursively (descending into subgraphs),
//! carrying each entity's container path and ancestor chain, and turns
//! entities into searchable [`Item`]s with their [`SearchDocument`]s.
//!
//! Node items pick up extra display information from any info provider
//! registered for their entity type; a node-level `type_label` acts as the
//! instance fallback when no provider exists.

use std::sync::Arc;

use crate::document::DocumentBuilder;
use crate::graph::{EntityId, EntityRef, GraphData, NodeData};
use crate::items::{Item, LinkItem, NodeItem, SubtitleSegment};
use crate::registry::{NodeInfo, SpotlightRegistry};

/// One node found by the recursive walk, with where it lives
#[derive(Debug, Clone)]
pub struct CollectedNode<'a> {
    /// Container node ids from the root down to this node's level
    pub path: Vec<EntityId>,
    /// Display names of the containers, outermost first
    pub ancestors: Vec<SubtitleSegment>,
    pub node: &'a NodeData,
}

/// Collect every node in the graph, depth-first in document order.
/// A container node appears before its subgraph's contents.
pub fn collect_nodes(graph: &GraphData) -> Vec<CollectedNode<'_>> {
    let mut collected = Vec::new();
    walk_level(graph, &mut Vec::new(), &mut Vec::new(), &mut collected);
    collected
}

fn walk_level<'a>(
    level: &'a GraphData,
    path: &mut Vec<EntityId>,
    ancestors: &mut Vec<SubtitleSegment>,
    out: &mut Vec<CollectedNode<'a>>,
) {
    for node in &level.nodes {
        out.push(CollectedNode {
            path: path.clone(),
            ancestors: ancestors.clone(),
            node,
        });
        if let Some(subgraph) = &node.subgraph {
            path.push(node.id);
            ancestors.push(SubtitleSegment {
                name: display_name(node).to_string(),
                node_id: node.id,
            });
            walk_level(subgraph, path, ancestors, out);
            ancestors.pop();
            path.pop();
        }
    }
}

/// Collect every link in the graph, recursively, as ready-made link items
pub fn collect_links(graph: &GraphData) -> Vec<LinkItem> {
    let mut collected = Vec::new();
    walk_links(graph, &mut Vec::new(), &mut collected);
    collected
}

fn walk_links(level: &GraphData, path: &mut Vec<EntityId>, out: &mut Vec<LinkItem>) {
    for link in &level.links {
        let entity = EntityRef::link(path.clone(), link.id);
        let from = node_name_at(level, link.from_node);
        let to = node_name_at(level, link.to_node);
        let title = match &link.label {
            Some(label) => format!("{} → {} ({})", from, to, label),
            None => format!("{} → {}", from, to),
        };
        out.push(LinkItem {
            id: entity.qualified_id(),
            title,
            entity,
        });
    }
    for node in &level.nodes {
        if let Some(subgraph) = &node.subgraph {
            path.push(node.id);
            walk_links(subgraph, path, out);
            path.pop();
        }
    }
}

fn node_name_at(level: &GraphData, id: EntityId) -> String {
    level
        .nodes
        .iter()
        .find(|n| n.id == id)
        .map(|n| display_name(n).to_string())
        .unwrap_or_else(|| format!("#{}", id))
}

fn display_name(node: &NodeData) -> &str {
    if node.name.is_empty() {
        &node.type_name
    } else {
        &node.name
    }
}

/// Build the node item for one collected entity.
///
/// Document field order is fixed: title, item class, subtitle parts,
/// detail parts. Detail parts are the node's non-connected editable
/// fields as `name: value` pairs, then any provider extras.
pub fn build_node_item(collected: &CollectedNode<'_>, registry: &SpotlightRegistry) -> NodeItem {
    let node = collected.node;
    let entity = EntityRef::node(collected.path.clone(), node.id);

    let info = registry
        .info_provider(&node.type_name)
        .map(|provider| provider(node))
        .unwrap_or_else(NodeInfo::default);

    let item_class = info
        .item_class
        .or_else(|| node.type_label.clone())
        .unwrap_or_else(|| node.type_name.clone());

    let mut title = format!("{} #{}", display_name(node), node.id);
    if let Some(suffix) = &info.title_suffix {
        title.push(' ');
        title.push_str(suffix);
    }

    let mut builder = DocumentBuilder::new()
        .title(title.as_str())
        .item_class(item_class.as_str());
    for ancestor in &collected.ancestors {
        builder = builder.subtitle_part(ancestor.name.as_str());
    }
    for field in &node.fields {
        if !field.connected {
            builder = builder.detail_part(format!("{}: {}", field.name, field.value));
        }
    }
    for extra in &info.details {
        builder = builder.detail_part(extra.as_str());
    }

    NodeItem {
        id: entity.qualified_id(),
        title,
        item_class,
        subtitle_path: collected.ancestors.clone(),
        document: builder.build(),
        entity,
        flags: node.flags,
    }
}

/// Assemble the full candidate set for a keyword-less query:
/// every node item, then every link item.
pub fn build_candidates(graph: &GraphData, registry: &SpotlightRegistry) -> Vec<Arc<Item>> {
    let mut candidates: Vec<Arc<Item>> = collect_nodes(graph)
        .iter()
        .map(|collected| Arc::new(Item::Node(build_node_item(collected, registry))))
        .collect();
    candidates.extend(
        collect_links(graph)
            .into_iter()
            .map(|link| Arc::new(Item::Link(link))),
    );
    candidates
}
