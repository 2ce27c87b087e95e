//! Tests for the palette session state machine.
//!
//! The host side is faked with a shared recording [`Navigation`]: every
//! mutation appends an op string, so rollback *ordering* can be asserted,
//! and the fake's state doubles as "what the editor would show" for
//! net-state checks.

use super::*;
use crate::graph::{GraphData, GraphSource, LinkData, NodeData};
use crate::items::CommandItem;
use crate::registry::{HandlerItems, SelectionCommand, SpotlightRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct NavState {
    viewport: Viewport,
    context: Vec<EntityId>,
    selection: Vec<EntityRef>,
    ops: Vec<String>,
}

/// Recording navigation fake shared between the session and the test
#[derive(Clone, Default)]
struct SharedNav(Arc<Mutex<NavState>>);

impl SharedNav {
    fn ops(&self) -> Vec<String> {
        self.0.lock().ops.clone()
    }

    fn viewport(&self) -> Viewport {
        self.0.lock().viewport
    }

    fn set_initial(&self, viewport: Viewport, context: Vec<EntityId>, selection: Vec<EntityRef>) {
        let mut state = self.0.lock();
        state.viewport = viewport;
        state.context = context;
        state.selection = selection;
    }
}

impl Navigation for SharedNav {
    fn viewport(&self) -> Viewport {
        self.0.lock().viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> anyhow::Result<()> {
        let mut state = self.0.lock();
        state.viewport = viewport;
        state.ops.push("set_viewport".to_string());
        Ok(())
    }

    fn graph_context(&self) -> Vec<EntityId> {
        self.0.lock().context.clone()
    }

    fn set_graph_context(&mut self, path: &[EntityId]) -> anyhow::Result<()> {
        let mut state = self.0.lock();
        state.context = path.to_vec();
        state.ops.push("set_context".to_string());
        Ok(())
    }

    fn selection(&self) -> Vec<EntityRef> {
        self.0.lock().selection.clone()
    }

    fn set_selection(&mut self, selection: &[EntityRef]) -> anyhow::Result<()> {
        let mut state = self.0.lock();
        state.selection = selection.to_vec();
        state.ops.push("set_selection".to_string());
        Ok(())
    }

    fn reveal(&mut self, target: &EntityRef, mode: RevealMode) -> anyhow::Result<()> {
        let mut state = self.0.lock();
        let (tag, zoom) = match mode {
            RevealMode::Preview { zoom } => ("preview", zoom),
            RevealMode::Final { .. } => ("final", 1.0),
        };
        state
            .ops
            .push(format!("reveal:{}:{}", target.qualified_id(), tag));
        // Emulate the host: revealing pans/zooms and enters the target's level
        state.viewport = Viewport {
            x: 42.0,
            y: 42.0,
            zoom,
        };
        state.context = target.path.clone();
        Ok(())
    }
}

/// Graph source backed by a shared handle so tests can mutate the graph
#[derive(Clone)]
struct SharedGraph(Arc<Mutex<GraphData>>);

impl GraphSource for SharedGraph {
    fn snapshot(&self) -> GraphData {
        self.0.lock().clone()
    }
}

fn node(id: EntityId, name: &str, type_name: &str) -> NodeData {
    NodeData {
        id,
        name: name.to_string(),
        type_name: type_name.to_string(),
        ..Default::default()
    }
}

fn test_graph() -> GraphData {
    GraphData {
        nodes: vec![
            node(1, "Loader", "LoadImage"),
            node(2, "Sampler", "KSampler"),
            node(3, "Saver", "SaveImage"),
        ],
        links: vec![LinkData {
            id: 9,
            from_node: 1,
            to_node: 2,
            label: None,
        }],
    }
}

fn build_session(
    graph: GraphData,
    config: SpotlightConfig,
    registry: SpotlightRegistry,
) -> (SpotlightSession, SharedNav, Arc<Mutex<GraphData>>) {
    let nav = SharedNav::default();
    let graph_handle = Arc::new(Mutex::new(graph));
    let session = SpotlightSession::new(
        config,
        registry,
        Box::new(SharedGraph(graph_handle.clone())),
        Box::new(nav.clone()),
    );
    (session, nav, graph_handle)
}

fn default_session() -> (SpotlightSession, SharedNav, Arc<Mutex<GraphData>>) {
    build_session(
        test_graph(),
        SpotlightConfig::default(),
        SpotlightRegistry::new(),
    )
}

fn node_registry() -> SpotlightRegistry {
    let mut registry = SpotlightRegistry::new();
    registry.register_keyword_handler(
        "node",
        Arc::new(|_, ctx| {
            ctx.set_placeholder("Search nodes");
            Ok(HandlerItems::new(ctx.node_items()))
        }),
    );
    registry
}

// ============================================
// Open / close basics
// ============================================

#[test]
fn open_runs_an_initial_empty_query() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    assert!(session.is_open());
    assert_eq!(session.input(), "");
    // 3 nodes + 1 link
    assert_eq!(session.results().len(), 4);
    assert_eq!(session.active_index(), 0);
}

#[test]
fn open_is_idempotent_while_open() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    session.set_input("loader");
    session.open();
    // Second open while already open must not reset the session
    assert_eq!(session.input(), "loader");
}

#[test]
fn close_restores_the_open_viewport_when_nothing_was_chosen() {
    let (mut session, nav, _graph) = default_session();
    let original = Viewport {
        x: 5.0,
        y: 6.0,
        zoom: 2.0,
    };
    nav.set_initial(original, vec![], vec![]);
    session.open();
    session.close(CloseReason::Escape);
    assert!(!session.is_open());
    assert_eq!(nav.viewport(), original);
    assert!(nav.ops().contains(&"set_viewport".to_string()));
}

#[test]
fn reopen_starts_from_a_clean_slate() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    session.set_input("loader");
    session.arrow(1, true);
    session.close(CloseReason::Escape);
    session.open();
    assert_eq!(session.input(), "");
    assert!(!session.is_previewing());
    assert_eq!(session.active_index(), 0);
}

// ============================================
// Keyword activation and deactivation
// ============================================

#[test]
fn typing_a_registered_keyword_activates_and_strips() {
    let (mut session, _nav, _graph) = build_session(
        test_graph(),
        SpotlightConfig::default(),
        node_registry(),
    );
    session.open();
    session.set_input("node loader");
    assert_eq!(session.active_keyword(), Some("node"));
    assert_eq!(session.input(), "loader");
    assert_eq!(session.placeholder(), Some("Search nodes"));
}

#[test]
fn unregistered_leading_word_never_activates() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    session.set_input("banana loader");
    assert_eq!(session.active_keyword(), None);
    assert_eq!(session.input(), "banana loader");
}

#[test]
fn backspace_to_empty_deactivates_and_restores_the_keyword() {
    let (mut session, _nav, _graph) = build_session(
        test_graph(),
        SpotlightConfig::default(),
        node_registry(),
    );
    session.open();
    session.set_input("node loader");
    assert_eq!(session.active_keyword(), Some("node"));
    session.set_input("");
    assert_eq!(session.active_keyword(), None);
    assert_eq!(session.input(), "node ");
    assert_eq!(session.placeholder(), None);
}

#[test]
fn reactivation_is_gated_until_the_input_has_been_whitespace_free() {
    let (mut session, _nav, _graph) = build_session(
        test_graph(),
        SpotlightConfig::default(),
        node_registry(),
    );
    session.open();
    session.set_input("node x");
    assert_eq!(session.active_keyword(), Some("node"));

    // Backspace to empty: deactivate, restore "node "
    session.set_input("");
    assert_eq!(session.input(), "node ");

    // Typing right away must NOT re-trigger the keyword
    session.set_input("node y");
    assert_eq!(session.active_keyword(), None);

    // Gate stays while any whitespace remains
    session.set_input("node ");
    assert_eq!(session.active_keyword(), None);

    // Once the input has been whitespace-free, the gate lifts...
    session.set_input("nodey");
    assert_eq!(session.active_keyword(), None);

    // ...and a later keyword+space activates again
    session.set_input("node z");
    assert_eq!(session.active_keyword(), Some("node"));
    assert_eq!(session.input(), "z");
}

// ============================================
// Arrow navigation and hover
// ============================================

#[test]
fn arrow_clamps_to_the_result_bounds() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    session.arrow(-1, false);
    assert_eq!(session.active_index(), 0);
    session.arrow(1, false);
    assert_eq!(session.active_index(), 1);
    for _ in 0..10 {
        session.arrow(1, false);
    }
    assert_eq!(session.active_index(), session.results().len() - 1);
}

#[test]
fn hover_is_suppressed_right_after_keyboard_navigation() {
    let (mut session, _nav, _graph) = default_session();
    session.open();
    session.arrow(1, false);
    session.hover(3);
    // Inside the suppression window, hover loses
    assert_eq!(session.active_index(), 1);
}

#[test]
fn hover_moves_the_active_row_outside_the_window() {
    let config = SpotlightConfig {
        hover_suppress_ms: 0,
        ..Default::default()
    };
    let (mut session, _nav, _graph) =
        build_session(test_graph(), config, SpotlightRegistry::new());
    session.open();
    session.arrow(1, false);
    session.hover(3);
    assert_eq!(session.active_index(), 3);
    // Hover past the end clamps
    session.hover(99);
    assert_eq!(session.active_index(), session.results().len() - 1);
}

// ============================================
// Shift preview
// ============================================

#[test]
fn bare_shift_press_never_previews() {
    let (mut session, nav, _graph) = default_session();
    session.open();
    session.shift_down();
    assert!(!session.is_previewing());
    assert!(!nav.ops().iter().any(|op| op.starts_with("reveal")));
}

#[test]
fn arrow_with_shift_previews_the_active_item() {
    let (mut session, nav, _graph) = default_session();
    session.open();
    session.arrow(1, true);
    assert!(session.is_previewing());
    let ops = nav.ops();
    assert!(ops.iter().any(|op| op == "reveal:2:preview"));
}

#[test]
fn shift_after_arrow_navigation_previews() {
    let (mut session, nav, _graph) = default_session();
    session.open();
    session.arrow(1, false);
    session.shift_down();
    assert!(session.is_previewing());
    assert!(nav.ops().iter().any(|op| op.starts_with("reveal")));
}

#[test]
fn preview_snapshots_are_taken_once_per_episode() {
    let (mut session, nav, _graph) = default_session();
    let original = Viewport {
        x: 1.0,
        y: 2.0,
        zoom: 1.5,
    };
    nav.set_initial(original, vec![], vec![]);
    session.open();
    // Two previewed steps; the snapshot must capture the state before the
    // first reveal, not the revealed state
    session.arrow(1, true);
    session.arrow(1, true);
    session.shift_up();
    assert!(!session.is_previewing());
    assert_eq!(nav.viewport(), original);
}

#[test]
fn shift_release_rolls_back_context_then_selection_then_viewport() {
    let (mut session, nav, _graph) = default_session();
    nav.set_initial(
        Viewport::default(),
        vec![7],
        vec![EntityRef::node(vec![], 3)],
    );
    session.open();
    session.arrow(1, true);
    session.shift_up();
    let ops = nav.ops();
    let context_at = ops.iter().position(|op| op == "set_context").unwrap();
    let selection_at = ops.iter().position(|op| op == "set_selection").unwrap();
    let viewport_at = ops.iter().position(|op| op == "set_viewport").unwrap();
    assert!(context_at < selection_at);
    assert!(selection_at < viewport_at);
}

#[test]
fn escape_after_preview_restores_the_pre_open_state() {
    let (mut session, nav, _graph) = default_session();
    let original = Viewport {
        x: 10.0,
        y: 20.0,
        zoom: 0.8,
    };
    let original_context = vec![7];
    let original_selection = vec![EntityRef::node(vec![], 3)];
    nav.set_initial(
        original,
        original_context.clone(),
        original_selection.clone(),
    );
    session.open();
    session.arrow(1, true);
    session.close(CloseReason::Escape);

    let state = nav.0.lock();
    assert_eq!(state.viewport, original);
    assert_eq!(state.context, original_context);
    assert_eq!(state.selection, original_selection);
    drop(state);

    let ops = nav.ops();
    let context_at = ops.iter().position(|op| op == "set_context").unwrap();
    let selection_at = ops.iter().position(|op| op == "set_selection").unwrap();
    let viewport_at = ops.iter().position(|op| op == "set_viewport").unwrap();
    assert!(context_at < selection_at);
    assert!(selection_at < viewport_at);
}

// ============================================
// Selection
// ============================================

#[test]
fn selecting_a_node_reveals_it_at_full_zoom_and_closes() {
    let (mut session, nav, _graph) = default_session();
    session.open();
    session.select_active();
    assert!(!session.is_open());
    let ops = nav.ops();
    assert!(ops.iter().any(|op| op == "reveal:1:final"));
    // Committed navigation: nothing is rolled back or restored
    assert!(!ops.iter().any(|op| op == "set_viewport"));
    assert!(!ops.iter().any(|op| op == "set_context"));
}

#[test]
fn selection_after_preview_discards_the_snapshots() {
    let (mut session, nav, _graph) = default_session();
    session.open();
    session.arrow(1, true);
    session.select_active();
    assert!(!session.is_open());
    let ops = nav.ops();
    // The preview reveal happened, but no restore ops followed the select
    assert!(ops.iter().any(|op| op == "reveal:2:preview"));
    assert!(ops.iter().any(|op| op == "reveal:2:final"));
    assert!(!ops.iter().any(|op| op == "set_viewport"));
    assert!(!ops.iter().any(|op| op == "set_selection"));
}

#[test]
fn selecting_a_command_runs_its_action() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_flag = ran.clone();
    let mut registry = SpotlightRegistry::new();
    registry.register_default_handler(Arc::new(move |_| {
        let ran_flag = ran_flag.clone();
        Ok(HandlerItems::new(vec![Item::Command(CommandItem {
            id: "mark".to_string(),
            title: "Mark It".to_string(),
            action: Some(Arc::new(move |_| {
                ran_flag.store(true, Ordering::SeqCst);
            })),
            ..Default::default()
        })]))
    }));
    let (mut session, nav, _graph) =
        build_session(test_graph(), SpotlightConfig::default(), registry);
    session.open();
    let index = session
        .results()
        .iter()
        .position(|r| r.item.id() == "mark")
        .expect("command item should be in the results");
    session.select_at(index);
    assert!(ran.load(Ordering::SeqCst));
    assert!(!session.is_open());
    // A command selection is final: the open viewport is not restored
    assert!(!nav.ops().iter().any(|op| op == "set_viewport"));
}

// ============================================
// Multi-select
// ============================================

fn multi_select_session() -> (SpotlightSession, SharedNav, Arc<Mutex<GraphData>>) {
    let config = SpotlightConfig {
        multi_select: true,
        ..Default::default()
    };
    build_session(test_graph(), config, SpotlightRegistry::new())
}

#[test]
fn toggle_is_a_noop_when_the_feature_is_off() {
    let (mut session, _nav, _graph) = default_session();
    session.toggle_multi_select();
    assert!(!session.is_multi_select());
}

#[test]
fn selected_items_survive_an_excluding_requery() {
    let (mut session, _nav, _graph) = multi_select_session();
    session.toggle_multi_select();
    session.open();
    session.toggle_selection_at(0); // Loader
    session.toggle_selection_at(1); // Sampler
    assert_eq!(session.selected_items().len(), 2);

    // "saver" excludes both selected items from the fuzzy match
    session.set_input("saver");
    let rows = session.render();
    let selected_rows: Vec<_> = rows.iter().filter(|r| r.selected).collect();
    assert_eq!(selected_rows.len(), 2);
    assert!(rows.iter().any(|r| r.id == "1" && r.pinned));
    assert!(rows.iter().any(|r| r.id == "2" && r.pinned));
}

#[test]
fn toggling_a_selected_row_unselects_it() {
    let (mut session, _nav, _graph) = multi_select_session();
    session.toggle_multi_select();
    session.open();
    session.toggle_selection_at(0);
    assert_eq!(session.selected_items().len(), 1);
    session.toggle_selection_at(0);
    assert!(session.selected_items().is_empty());
}

#[test]
fn selection_command_runs_and_prunes_vanished_entities() {
    let (mut session, _nav, graph) = multi_select_session();
    let graph_for_command = graph.clone();
    session.registry_mut().register_selection_command(SelectionCommand {
        id: "remove".to_string(),
        label: "Remove from graph".to_string(),
        run: Arc::new(move |ctx| {
            // Remove the first selected node from the live graph
            if let Some(entity) = ctx.items.first().and_then(|item| item.entity()) {
                if let crate::graph::EntityTarget::Node(id) = entity.target {
                    graph_for_command.lock().nodes.retain(|n| n.id != id);
                }
            }
            Ok(())
        }),
        is_applicable: None,
    });
    session.toggle_multi_select();
    session.open();
    session.toggle_selection_at(0); // Loader (id 1)
    assert!(session.run_selection_command("remove"));
    // The removed node is pruned from both the selection and the results
    assert!(session.selected_items().is_empty());
    assert!(!session.results().iter().any(|r| r.item.id() == "1"));
}

#[test]
fn selection_command_can_request_a_selection_clear() {
    let (mut session, _nav, _graph) = multi_select_session();
    session.registry_mut().register_selection_command(SelectionCommand {
        id: "clear".to_string(),
        label: "Clear selection".to_string(),
        run: Arc::new(|ctx| {
            ctx.request_clear_selection();
            Ok(())
        }),
        is_applicable: None,
    });
    session.toggle_multi_select();
    session.open();
    session.toggle_selection_at(0);
    session.toggle_selection_at(1);
    assert!(session.run_selection_command("clear"));
    assert!(session.selected_items().is_empty());
}

#[test]
fn inapplicable_selection_command_does_not_run() {
    let (mut session, _nav, _graph) = multi_select_session();
    session.registry_mut().register_selection_command(SelectionCommand {
        id: "pair-only".to_string(),
        label: "Needs exactly two".to_string(),
        run: Arc::new(|_| panic!("must not run")),
        is_applicable: Some(Arc::new(|items| items.len() == 2)),
    });
    session.toggle_multi_select();
    session.open();
    session.toggle_selection_at(0);
    assert!(!session.run_selection_command("pair-only"));
}

#[test]
fn unknown_selection_command_reports_false() {
    let (mut session, _nav, _graph) = multi_select_session();
    assert!(!session.run_selection_command("nope"));
}
