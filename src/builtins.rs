//! Built-in plugins
//!
//! A small set of keyword handlers, filters, and selection commands
//! registered through the same public surface external plugins use. Hosts
//! call [`install`] once after constructing their registry; everything
//! here can be overwritten by a later registration.
//!
//! Built-ins:
//! - `node <text>` - search graph nodes only
//! - `link <text>` - search graph links only
//! - `type:<value>` - item-class substring filter (case-insensitive)
//! - `title:<value>` - title substring filter (case-insensitive)
//! - selection commands `reveal` and `clear-selection`

use std::sync::Arc;

use crate::graph::RevealMode;
use crate::items::Item;
use crate::registry::{HandlerItems, SelectionCommand, SpotlightRegistry};

/// Register every built-in handler, filter, and selection command
pub fn install(registry: &mut SpotlightRegistry) {
    registry.register_keyword_handler(
        "node",
        Arc::new(|_text, ctx| {
            ctx.set_placeholder("Search nodes");
            Ok(HandlerItems::new(ctx.node_items()))
        }),
    );

    registry.register_keyword_handler(
        "link",
        Arc::new(|_text, ctx| {
            ctx.set_placeholder("Search links");
            Ok(HandlerItems::new(ctx.link_items()))
        }),
    );

    registry.register_filter(
        "type",
        Arc::new(|item, value| Ok(class_contains(item, value))),
    );

    registry.register_filter(
        "title",
        Arc::new(|item, value| {
            Ok(item.title().to_lowercase().contains(&value.to_lowercase()))
        }),
    );

    registry.register_selection_command(SelectionCommand {
        id: "reveal".to_string(),
        label: "Reveal in canvas".to_string(),
        run: Arc::new(|ctx| {
            let Some(entity) = ctx.items.first().and_then(|item| item.entity()).cloned()
            else {
                return Ok(());
            };
            let inset = ctx.overlay_inset;
            ctx.navigation
                .reveal(&entity, RevealMode::Final {
                    overlay_inset: inset,
                })
        }),
        is_applicable: Some(Arc::new(|items| {
            items.iter().any(|item| item.entity().is_some())
        })),
    });

    registry.register_selection_command(SelectionCommand {
        id: "clear-selection".to_string(),
        label: "Clear selection".to_string(),
        run: Arc::new(|ctx| {
            ctx.request_clear_selection();
            Ok(())
        }),
        is_applicable: Some(Arc::new(|items| !items.is_empty())),
    });
}

fn class_contains(item: &Item, value: &str) -> bool {
    let value = value.to_lowercase();
    match item {
        Item::Node(node) => node.item_class.to_lowercase().contains(&value),
        Item::Command(command) => command
            .item_class
            .as_ref()
            .is_some_and(|class| class.to_lowercase().contains(&value)),
        Item::Link(_) => false,
    }
}
