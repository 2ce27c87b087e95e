//! Interactive palette session
//!
//! Owns the modal state machine: open/closed, the active result row,
//! keyword activation and its reactivation gate, Shift-held preview with
//! snapshot/rollback, and multi-select. Every effectful operation goes
//! through the injected [`Navigation`] capability; every query goes
//! through the search pipeline with a generation ticket so superseded
//! runs never publish.
//!
//! Rollback discipline: preview snapshots are taken lazily, at most once
//! per preview episode, and consumed exactly once - either applied on
//! Shift-release/close, or discarded when a selection becomes final.
//! Restores run graph-context first, then selection, then viewport;
//! restoring the viewport before the graph context would animate to a
//! coordinate space the editor is no longer inside.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::SpotlightConfig;
use crate::error::{ResultExt, SpotlightError};
use crate::graph::{EntityId, EntityRef, GraphSource, Navigation, RevealMode, Viewport};
use crate::items::{Item, MatchResult};
use crate::registry::{SelectionContext, SpotlightRegistry};
use crate::render::{self, RenderedRow};
use crate::search::{run_query, GenerationCounter, SearchRequest};

/// What caused a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Escape,
    /// Input lost focus; the host fires this after the configured grace
    /// delay (and may skip it while a selection-commands popup is up)
    Blur,
    Selected,
}

#[derive(Default)]
struct SessionState {
    open: bool,
    input: String,
    results: Vec<MatchResult>,
    active_index: usize,
    active_keyword: Option<String>,
    /// Reactivation gate: set when a keyword deactivates, cleared once the
    /// input has been whitespace-free at least once
    awaiting_clean_input: bool,
    previewing: bool,
    /// Arrow navigation happened; a bare Shift press may start a preview
    shift_nav_armed: bool,
    /// Viewport at open time, restored when nothing was chosen
    open_viewport: Option<Viewport>,
    preview_viewport: Option<Viewport>,
    preview_context: Option<Vec<EntityId>>,
    preview_selection: Option<Vec<EntityRef>>,
    final_selection: bool,
    last_keyboard_nav: Option<Instant>,
    multi_select_active: bool,
    selected: Vec<Arc<Item>>,
    selected_keys: HashSet<String>,
    placeholder: Option<String>,
    highlight_query: String,
}

/// One palette instance bound to a host graph and navigation capability
pub struct SpotlightSession {
    config: SpotlightConfig,
    registry: SpotlightRegistry,
    graph: Box<dyn GraphSource>,
    navigation: Box<dyn Navigation>,
    state: SessionState,
    generations: GenerationCounter,
    overlay_inset: f32,
}

impl SpotlightSession {
    pub fn new(
        config: SpotlightConfig,
        registry: SpotlightRegistry,
        graph: Box<dyn GraphSource>,
        navigation: Box<dyn Navigation>,
    ) -> Self {
        SpotlightSession {
            config,
            registry,
            graph,
            navigation,
            state: SessionState::default(),
            generations: GenerationCounter::default(),
            overlay_inset: 0.0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SpotlightConfig {
        &self.config
    }

    /// Late plugin registration goes through here
    pub fn registry_mut(&mut self) -> &mut SpotlightRegistry {
        &mut self.registry
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    pub fn input(&self) -> &str {
        &self.state.input
    }

    pub fn active_keyword(&self) -> Option<&str> {
        self.state.active_keyword.as_deref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.state.placeholder.as_deref()
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.state.results
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index
    }

    pub fn is_previewing(&self) -> bool {
        self.state.previewing
    }

    pub fn is_multi_select(&self) -> bool {
        self.state.multi_select_active
    }

    pub fn selected_items(&self) -> &[Arc<Item>] {
        &self.state.selected
    }

    /// Width of any UI overlay covering part of the canvas; final
    /// navigation shifts its centering by this much
    pub fn set_overlay_inset(&mut self, inset: f32) {
        self.overlay_inset = inset;
    }

    /// Prepared display rows for the current results
    pub fn render(&self) -> Vec<RenderedRow> {
        render::render_rows(
            &self.state.results,
            self.state.active_index,
            &self.state.highlight_query,
            &self.state.selected_keys,
        )
    }

    // ========================================================================
    // Open / close
    // ========================================================================

    /// Open the palette: reset every carry-over field, snapshot the
    /// viewport, and run the initial empty query.
    pub fn open(&mut self) {
        if self.state.open {
            return;
        }
        debug!("Opening palette");
        // Multi-select mode toggles independently of open/closed; every
        // other carry-over field resets
        self.state = SessionState {
            open: true,
            multi_select_active: self.state.multi_select_active,
            open_viewport: Some(self.navigation.viewport()),
            ..SessionState::default()
        };
        self.refresh();
    }

    /// Close the palette, rolling back preview state when no selection
    /// became final this session.
    pub fn close(&mut self, reason: CloseReason) {
        if !self.state.open {
            return;
        }
        debug!(?reason, "Closing palette");
        if !self.state.final_selection {
            self.rollback_preview();
            if let Some(viewport) = self.state.open_viewport.take() {
                self.navigation
                    .set_viewport(viewport)
                    .map_err(SpotlightError::Navigation)
                    .warn_on_err();
            }
        }
        self.state = SessionState {
            multi_select_active: self.state.multi_select_active,
            ..SessionState::default()
        };
    }

    // ========================================================================
    // Input and refresh
    // ========================================================================

    /// Replace the input text and requery. Handles keyword deactivation:
    /// backspacing to empty while a keyword is active restores the keyword
    /// literally and gates reactivation until the input has been
    /// whitespace-free at least once.
    pub fn set_input(&mut self, text: &str) {
        if !self.state.open {
            return;
        }
        if text.is_empty() && self.state.active_keyword.is_some() {
            let keyword = self.state.active_keyword.take().unwrap_or_default();
            debug!(keyword = %keyword, "Deactivating keyword");
            self.state.input = format!("{} ", keyword);
            self.state.awaiting_clean_input = true;
            self.state.placeholder = None;
        } else {
            self.state.input = text.to_string();
        }
        if self.state.awaiting_clean_input
            && !self.state.input.chars().any(char::is_whitespace)
        {
            self.state.awaiting_clean_input = false;
        }
        self.refresh();
    }

    /// Run the search pipeline for the current input and publish the
    /// results unless a newer run superseded this one.
    pub fn refresh(&mut self) {
        if !self.state.open {
            return;
        }
        let ticket = self.generations.begin();
        let snapshot = self.graph.snapshot();
        let context_path = self.navigation.graph_context();
        let request = SearchRequest {
            input: &self.state.input,
            active_keyword: self.state.active_keyword.as_deref(),
            reactivation_gated: self.state.awaiting_clean_input,
            context_path: &context_path,
            multi_select: self.state.multi_select_active,
            selected: &self.state.selected,
        };
        let outcome = run_query(&self.registry, &self.config, &snapshot, &request);
        if !self.generations.is_current(ticket) {
            debug!(ticket, "Discarding stale search results");
            return;
        }
        if let Some(keyword) = outcome.activated_keyword {
            self.state.active_keyword = Some(keyword);
            if let Some(stripped) = outcome.stripped_input {
                self.state.input = stripped;
            }
        }
        self.state.placeholder = outcome.placeholder;
        self.state.highlight_query = outcome.highlight_query;
        self.state.results = outcome.results;
        self.state.active_index = 0;
    }

    // ========================================================================
    // Navigation within the result list
    // ========================================================================

    /// Move the active row by `delta`, clamped to the result bounds.
    /// With Shift held this also starts/continues the preview.
    pub fn arrow(&mut self, delta: i32, shift_held: bool) {
        if !self.state.open || self.state.results.is_empty() {
            return;
        }
        let last = self.state.results.len() - 1;
        let target = self.state.active_index as i64 + delta as i64;
        self.state.active_index = target.clamp(0, last as i64) as usize;
        self.state.last_keyboard_nav = Some(Instant::now());
        self.state.shift_nav_armed = true;
        if shift_held {
            self.enter_preview();
            self.preview_reveal();
        }
    }

    /// Hover moved onto a row. Ignored inside the suppression window after
    /// keyboard navigation so hover does not fight the arrow keys.
    pub fn hover(&mut self, index: usize) {
        self.hover_at(index, Instant::now());
    }

    fn hover_at(&mut self, index: usize, now: Instant) {
        if !self.state.open || self.state.results.is_empty() {
            return;
        }
        let suppress = Duration::from_millis(self.config.hover_suppress_ms);
        if let Some(last_nav) = self.state.last_keyboard_nav {
            if now.duration_since(last_nav) < suppress {
                return;
            }
        }
        self.state.active_index = index.min(self.state.results.len() - 1);
    }

    // ========================================================================
    // Shift preview
    // ========================================================================

    /// Shift pressed. Only previews when arrow navigation already happened;
    /// a bare modifier press must never jump the viewport.
    pub fn shift_down(&mut self) {
        if !self.state.open || !self.state.shift_nav_armed || self.state.previewing {
            return;
        }
        self.enter_preview();
        self.preview_reveal();
    }

    /// Shift released: roll the preview back and end the episode.
    pub fn shift_up(&mut self) {
        if self.state.previewing {
            self.rollback_preview();
        }
        self.state.shift_nav_armed = false;
    }

    /// Take the preview snapshots, each at most once per episode.
    fn enter_preview(&mut self) {
        let navigation = &mut self.navigation;
        self.state
            .preview_viewport
            .get_or_insert_with(|| navigation.viewport());
        self.state
            .preview_context
            .get_or_insert_with(|| navigation.graph_context());
        self.state
            .preview_selection
            .get_or_insert_with(|| navigation.selection());
        self.state.previewing = true;
    }

    /// Center on the active item at reduced zoom without closing
    fn preview_reveal(&mut self) {
        let Some(result) = self.state.results.get(self.state.active_index) else {
            return;
        };
        let Some(entity) = result.item.entity().cloned() else {
            return;
        };
        self.navigation
            .reveal(
                &entity,
                RevealMode::Preview {
                    zoom: self.config.preview_zoom,
                },
            )
            .map_err(SpotlightError::Navigation)
            .warn_on_err();
    }

    /// Restore graph-context, then selection, then viewport. Each snapshot
    /// is consumed here; failures are best-effort and do not stop the rest.
    fn rollback_preview(&mut self) {
        if let Some(context) = self.state.preview_context.take() {
            self.navigation
                .set_graph_context(&context)
                .map_err(SpotlightError::Navigation)
                .warn_on_err();
        }
        if let Some(selection) = self.state.preview_selection.take() {
            self.navigation
                .set_selection(&selection)
                .map_err(SpotlightError::Navigation)
                .warn_on_err();
        }
        if let Some(viewport) = self.state.preview_viewport.take() {
            self.navigation
                .set_viewport(viewport)
                .map_err(SpotlightError::Navigation)
                .warn_on_err();
        }
        self.state.previewing = false;
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Enter pressed on the active row
    pub fn select_active(&mut self) {
        self.select_at(self.state.active_index);
    }

    /// Row clicked (or Enter on a specific index). A command item's action
    /// runs and counts as final; node/link items get a full-zoom reveal.
    /// Always closes afterwards.
    pub fn select_at(&mut self, index: usize) {
        if !self.state.open {
            return;
        }
        let Some(result) = self.state.results.get(index) else {
            return;
        };
        let item = result.item.clone();
        match &*item {
            Item::Command(command) => {
                if let Some(action) = &command.action {
                    action(command);
                }
                self.state.final_selection = true;
            }
            Item::Node(_) | Item::Link(_) => {
                if let Some(entity) = item.entity() {
                    self.navigation
                        .reveal(
                            entity,
                            RevealMode::Final {
                                overlay_inset: self.overlay_inset,
                            },
                        )
                        .map_err(SpotlightError::Navigation)
                        .log_err();
                }
                self.state.final_selection = true;
            }
        }
        // A final selection discards the preview snapshots instead of
        // applying them
        self.state.preview_viewport = None;
        self.state.preview_context = None;
        self.state.preview_selection = None;
        self.state.previewing = false;
        self.close(CloseReason::Selected);
    }

    // ========================================================================
    // Multi-select
    // ========================================================================

    /// Toggle multi-select mode. No-op unless enabled in config.
    pub fn toggle_multi_select(&mut self) {
        if !self.config.multi_select {
            debug!("Multi-select is disabled in config");
            return;
        }
        self.state.multi_select_active = !self.state.multi_select_active;
        if !self.state.multi_select_active {
            self.state.selected.clear();
            self.state.selected_keys.clear();
        }
    }

    /// Toggle whether the row at `index` is in the selection set
    pub fn toggle_selection_at(&mut self, index: usize) {
        if !self.state.multi_select_active {
            return;
        }
        let Some(result) = self.state.results.get(index) else {
            return;
        };
        let item = result.item.clone();
        let key = item.selection_key();
        if self.state.selected_keys.remove(&key) {
            self.state.selected.retain(|i| i.selection_key() != key);
        } else {
            self.state.selected_keys.insert(key);
            self.state.selected.push(item);
        }
    }

    /// Run a registered selection command over the selected items, then
    /// prune entries whose underlying entity no longer exists.
    /// Returns false when the command is unknown or not applicable.
    pub fn run_selection_command(&mut self, id: &str) -> bool {
        let Some(command) = self.registry.selection_command(id).cloned() else {
            debug!(id, "Unknown selection command");
            return false;
        };
        if let Some(is_applicable) = &command.is_applicable {
            if !is_applicable(&self.state.selected) {
                return false;
            }
        }
        let mut ctx = SelectionContext::new(
            &self.state.selected,
            self.navigation.as_mut(),
            self.overlay_inset,
        );
        (command.run)(&mut ctx).log_err();
        let clear = ctx.clear_requested();
        if clear {
            self.state.selected.clear();
            self.state.selected_keys.clear();
        }
        self.prune_missing_entities();
        true
    }

    /// Drop selected/result entries whose entity vanished from the graph.
    /// Command items carry no entity and always survive.
    fn prune_missing_entities(&mut self) {
        let snapshot = self.graph.snapshot();
        self.state
            .selected
            .retain(|item| item.entity().map_or(true, |e| snapshot.contains(e)));
        let keys: HashSet<String> = self
            .state
            .selected
            .iter()
            .map(|i| i.selection_key())
            .collect();
        self.state.selected_keys = keys;
        self.state
            .results
            .retain(|r| r.item.entity().map_or(true, |e| snapshot.contains(e)));
        if !self.state.results.is_empty() {
            self.state.active_index =
                self.state.active_index.min(self.state.results.len() - 1);
        } else {
            self.state.active_index = 0;
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
