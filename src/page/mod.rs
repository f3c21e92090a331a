//! One perspective of a workbench window: its layout, the parts it owns and
//! which of them has focus.
//!
//! [`Page`] is the entry point for embedding applications. Structural and
//! activation requests never fail loudly: a request for a part the page does
//! not own, or one the layout refuses, is logged and answered with `false`.
//! Only view construction failures reach the caller.

mod controller;
mod factory;
mod history;
mod operation;

pub use controller::{ActivationState, PageActivationController};
pub use factory::{InstanceFactory, Release};
pub use history::ActivationHistory;
pub use operation::{DeferredAction, OperationToken};

use std::rc::Rc;
use std::sync::mpsc::Receiver;

use ratatui::prelude::Rect;

use crate::environment::Environment;
use crate::error::{CertificationError, CreationError, LayoutError, RestoreError};
use crate::events::{EventBus, PageEvent};
use crate::layout::{DropDecision, DropTarget, LayoutPresentation, NodeId, Pane, Side};
use crate::part::{PartId, PartKind, PartRef};
use crate::persist::Memento;
use crate::window::{DetachedWindowId, FloatRect, WindowRef};

fn default_presentation(env: &Environment) -> LayoutPresentation {
    if env.editor_area {
        LayoutPresentation::with_editor_area(Rc::clone(&env.host))
    } else {
        LayoutPresentation::new(Rc::clone(&env.host))
    }
}

pub struct Page {
    env: Environment,
    presentation: LayoutPresentation,
    history: ActivationHistory,
    controller: PageActivationController,
    factory: InstanceFactory,
    events: EventBus,
}

impl Page {
    pub fn new(env: Environment) -> Self {
        Self {
            presentation: default_presentation(&env),
            history: ActivationHistory::new(),
            controller: PageActivationController::new(env.policy),
            factory: InstanceFactory::new(Rc::clone(&env.views)),
            events: EventBus::new(),
            env,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn presentation(&self) -> &LayoutPresentation {
        &self.presentation
    }

    pub fn history(&self) -> &ActivationHistory {
        &self.history
    }

    pub fn controller(&self) -> &PageActivationController {
        &self.controller
    }

    pub fn factory(&self) -> &InstanceFactory {
        &self.factory
    }

    pub fn subscribe(&mut self) -> Receiver<PageEvent> {
        self.events.subscribe()
    }

    pub fn active_part(&self) -> Option<&PartId> {
        self.controller.active()
    }

    pub fn is_owned(&self, id: &PartId) -> bool {
        self.controller.is_owned(id)
    }

    /// Parts with unsaved changes.
    pub fn dirty_parts(&self) -> Vec<PartId> {
        self.controller
            .parts()
            .filter(|part| part.is_dirty())
            .map(|part| part.id())
            .collect()
    }

    fn is_zoomed(&self) -> bool {
        self.presentation.zoomed().is_some()
    }

    fn certified(&self, id: &PartId) -> Option<PartRef> {
        match self.controller.certify(id) {
            Ok(part) => Some(Rc::clone(part)),
            Err(err) => {
                tracing::debug!(%err, "part request ignored");
                None
            }
        }
    }

    fn retire(&mut self, id: &PartId) {
        if let Err(err) = self
            .controller
            .retire(id, &mut self.history, &mut self.events)
        {
            tracing::debug!(%err, "retire ignored");
        }
    }

    /// Bring history and activation in line with the layout after it changed,
    /// then tell subscribers.
    fn changed(&mut self, was_zoomed: bool) {
        for id in self.controller.owned_ids() {
            let fast = self.presentation.is_fast(&id);
            self.history.set_minimized(&id, fast);
        }
        self.controller
            .activate_next(&mut self.history, &mut self.events);
        let zoomed = self.is_zoomed();
        if zoomed != was_zoomed {
            self.events.emit(PageEvent::ZoomChanged { zoomed });
        }
        self.events.emit(PageEvent::LayoutChanged);
    }

    fn mutate<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut LayoutPresentation) -> Result<T, LayoutError>,
    ) -> Option<T> {
        let was_zoomed = self.is_zoomed();
        match apply(&mut self.presentation) {
            Ok(value) => {
                self.changed(was_zoomed);
                Some(value)
            }
            Err(err) => {
                tracing::warn!(operation, %err, "layout request ignored");
                None
            }
        }
    }

    /// Take ownership of an editor, show it in the editor area and activate
    /// it. An editor that is already open is only activated. Returns whether
    /// the editor was newly opened.
    pub fn open_editor(&mut self, part: PartRef) -> bool {
        let id = part.id();
        if part.kind() != PartKind::Editor {
            tracing::warn!(part = %id, "open_editor called with a view");
            return false;
        }
        if self.controller.is_owned(&id) {
            self.activate(&id);
            return false;
        }
        self.controller.register(part);
        if self
            .mutate("open editor", |layout| layout.add_pane(Pane::editor(id.clone())))
            .is_none()
        {
            self.controller.unregister(&id);
            return false;
        }
        self.history.record_opened(id.clone(), PartKind::Editor);
        tracing::debug!(part = %id, "editor opened");
        self.events.emit(PageEvent::PartOpened(id.clone()));
        self.activate(&id);
        true
    }

    /// Show a view and activate it, constructing the instance on first use.
    /// Each call takes one reference on the instance; [`hide_view`] gives it
    /// back. When construction fails nothing is added to the layout.
    ///
    /// [`hide_view`]: Self::hide_view
    pub fn show_view(&mut self, id: &PartId) -> Result<PartRef, CreationError> {
        let part = self.factory.acquire(id)?;
        let newly_owned = !self.controller.is_owned(id);
        if newly_owned {
            self.controller.register(Rc::clone(&part));
        }
        let was_zoomed = self.is_zoomed();
        if let Err(err) = self.presentation.add_pane(Pane::view(id.clone())) {
            tracing::warn!(part = %id, %err, "view could not be placed");
            self.factory.release(id);
            if newly_owned {
                self.controller.unregister(id);
            }
            return Err(CreationError::Failed {
                id: id.clone(),
                reason: err.to_string(),
            });
        }
        if newly_owned {
            self.history.record_opened(id.clone(), PartKind::View);
            tracing::debug!(part = %id, "view opened");
            self.events.emit(PageEvent::PartOpened(id.clone()));
        }
        self.changed(was_zoomed);
        self.activate(id);
        Ok(part)
    }

    /// Hide a view, keeping a placeholder in its slot, and give back one
    /// reference taken by [`show_view`](Self::show_view). The instance is
    /// disposed with its last reference; until then showing the view again
    /// reuses it.
    pub fn hide_view(&mut self, id: &PartId) -> bool {
        let Some(part) = self.certified(id) else {
            return false;
        };
        if part.kind() != PartKind::View {
            tracing::debug!(part = %id, "hide_view called with an editor");
            return false;
        }
        match self.factory.release(id) {
            Release::Retained(references) => {
                tracing::debug!(part = %id, references, "view instance still referenced");
            }
            Release::Unknown => tracing::warn!(part = %id, "view had no cached instance"),
            Release::Disposed(_) => tracing::debug!(part = %id, "view instance disposed"),
        }
        let was_zoomed = self.is_zoomed();
        if !self.presentation.clear_fast(id)
            && let Err(err) = self.presentation.remove_pane(id)
        {
            tracing::warn!(part = %id, %err, "view pane could not be hidden");
        }
        self.retire(id);
        self.changed(was_zoomed);
        true
    }

    /// Close an editor for good. Its slot is not remembered.
    pub fn close_editor(&mut self, id: &PartId) -> bool {
        let Some(part) = self.certified(id) else {
            return false;
        };
        if part.kind() != PartKind::Editor {
            tracing::debug!(part = %id, "close_editor called with a view");
            return false;
        }
        let was_zoomed = self.is_zoomed();
        if let Err(err) = self.presentation.dispose_pane(id) {
            tracing::warn!(part = %id, %err, "editor pane could not be removed");
        }
        self.retire(id);
        self.changed(was_zoomed);
        true
    }

    /// Give focus to a part, raising its tab. A fast view is restored into
    /// the layout first, and a zoom onto some other pane ends. Returns whether
    /// the active part changed.
    pub fn activate(&mut self, id: &PartId) -> bool {
        if self.certified(id).is_none() {
            return false;
        }
        let was_zoomed = self.is_zoomed();
        let mut layout_changed = false;
        if self.presentation.is_fast(id) {
            match self.presentation.restore_fast(id) {
                Ok(_) => layout_changed = true,
                Err(err) => tracing::warn!(part = %id, %err, "fast view could not be restored"),
            }
        }
        if let Some(node) = self.presentation.find_pane(id)
            && !self.presentation.is_within_zoom(node)
        {
            layout_changed |= self.presentation.zoom_out();
        }
        if layout_changed {
            self.changed(was_zoomed);
        }
        if let Err(err) = self.presentation.bring_to_top(id) {
            tracing::debug!(part = %id, %err, "activated part has no pane");
        }
        match self
            .controller
            .activate(id, &mut self.history, &mut self.events)
        {
            Ok(switched) => switched,
            Err(err) => {
                tracing::debug!(%err, "activation ignored");
                false
            }
        }
    }

    /// Raise a part's tab without moving focus.
    pub fn bring_to_top(&mut self, id: &PartId) -> bool {
        match self
            .controller
            .bring_to_top(id, &mut self.presentation, &mut self.events)
        {
            Ok(raised) => raised,
            Err(err) => {
                tracing::debug!(%err, "bring to top ignored");
                false
            }
        }
    }

    /// Minimize a view to a fast view, or restore a fast view to its slot.
    /// Minimizing the active part hands focus to the previous one.
    pub fn toggle_fast_view(&mut self, id: &PartId) -> bool {
        if self.certified(id).is_none() {
            return false;
        }
        if self.presentation.is_fast(id) {
            self.mutate("restore fast view", |layout| layout.restore_fast(id))
                .is_some()
        } else {
            self.mutate("minimize view", |layout| layout.set_fast(id))
                .is_some()
        }
    }

    /// Activate the next (or previous) open editor in recency order.
    pub fn cycle_editors(&mut self, forward: bool) -> Option<PartId> {
        let next = self.history.cycle(forward)?;
        self.activate(&next);
        Some(next)
    }

    pub fn move_part(&mut self, id: &PartId, side: Side, reference: &PartId) -> bool {
        if self.certified(id).is_none() {
            return false;
        }
        self.mutate("move", |layout| layout.move_pane(id, side, reference))
            .is_some()
    }

    pub fn stack(&mut self, id: &PartId, reference: &PartId) -> bool {
        if self.certified(id).is_none() {
            return false;
        }
        self.mutate("stack", |layout| layout.stack(id, reference))
            .is_some()
    }

    /// Float a part in a new detached window. `None` when the host has no
    /// floating windows or the layout refused.
    pub fn detach(&mut self, id: &PartId, bounds: FloatRect) -> Option<DetachedWindowId> {
        self.certified(id)?;
        self.mutate("detach", |layout| layout.detach(id, bounds))
            .flatten()
    }

    pub fn resize_sash(&mut self, split: NodeId, index: usize, delta: i16) -> bool {
        self.mutate("resize sash", |layout| layout.resize_sash(split, index, delta))
            .unwrap_or(false)
    }

    pub fn evaluate_drop(&self, source: NodeId, target: DropTarget, pointer: (i32, i32)) -> DropDecision {
        self.presentation.evaluate_drop(source, target, pointer)
    }

    /// Carry out an accepted drop. Returns whether the layout changed.
    pub fn apply_drop(&mut self, decision: &DropDecision) -> bool {
        if !decision.is_accepted() {
            return false;
        }
        self.mutate("drop", |layout| layout.apply_drop(decision))
            .unwrap_or(false)
    }

    pub fn zoom_in(&mut self, id: &PartId) -> bool {
        if self.certified(id).is_none() {
            return false;
        }
        match self.presentation.zoom_in(id) {
            Ok(changed) => {
                if changed {
                    self.events.emit(PageEvent::ZoomChanged { zoomed: true });
                }
                changed
            }
            Err(err) => {
                tracing::warn!(part = %id, %err, "zoom ignored");
                false
            }
        }
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.presentation.zoom_out();
        if changed {
            self.events.emit(PageEvent::ZoomChanged { zoomed: false });
        }
        changed
    }

    pub fn layout(&mut self, area: Rect) -> Vec<(PartId, Rect)> {
        self.presentation.layout(area)
    }

    pub fn regions(&mut self, window: WindowRef, area: impl Into<Option<Rect>>) -> Vec<(PartId, Rect)> {
        self.presentation.regions(window, area)
    }

    /// Start work that completes later, such as a save. The token goes stale
    /// when the part is closed or reopened before it comes back.
    pub fn begin_operation(&self, id: &PartId) -> Option<OperationToken> {
        let stamp = self.controller.stamp(id)?;
        Some(OperationToken::new(id.clone(), stamp))
    }

    /// Finish deferred work. Nothing happens when the token was cancelled or
    /// went stale. Returns whether `action` was carried out.
    pub fn complete_operation(&mut self, token: &OperationToken, action: DeferredAction) -> bool {
        if let Err(err) = self.recertify(token) {
            tracing::debug!(part = %token.part(), %err, "deferred operation dropped");
            return false;
        }
        let id = token.part();
        match action {
            DeferredAction::Activate => self.activate(id),
            DeferredAction::BringToTop => self.bring_to_top(id),
            DeferredAction::CloseEditor => self.close_editor(id),
            DeferredAction::HideView => self.hide_view(id),
        }
    }

    fn recertify(&self, token: &OperationToken) -> Result<(), CertificationError> {
        if token.is_cancelled() {
            return Err(CertificationError::Cancelled);
        }
        self.controller
            .certify_stamp(token.part(), token.stamp())
            .map(|_| ())
    }

    /// Layout, activation history and the active part.
    pub fn save_state(&self) -> Memento {
        let mut memento = Memento::new("page");
        if let Some(active) = self.controller.active() {
            memento.set("active", active.as_str());
        }
        memento.add_child(self.presentation.save_state());
        memento.add_child(self.history.save_state());
        memento
    }

    /// Apply a document from [`save_state`](Self::save_state) to the parts
    /// this page owns. Saved panes of parts that are not open stay as
    /// placeholders; open parts the document does not mention go to their
    /// default position. A malformed document falls back to the default
    /// layout. Returns whether the document was applied in full.
    pub fn restore_state(&mut self, memento: &Memento) -> bool {
        let was_zoomed = self.is_zoomed();
        let mut complete = self.load_layout(memento.require_child("layout"));
        let history = match memento.child("history").map(ActivationHistory::restore_state) {
            Some(Ok(history)) => history,
            Some(Err(err)) => {
                tracing::warn!(%err, "saved activation history ignored");
                complete = false;
                self.history.clone()
            }
            None => self.history.clone(),
        };
        self.merge_history(history);
        self.changed(was_zoomed);
        let target = memento
            .get_str("active")
            .map(PartId::new)
            .filter(|id| self.controller.is_owned(id))
            .or_else(|| self.controller.active().cloned());
        if let Some(target) = target {
            self.activate(&target);
        }
        complete
    }

    /// Replace the arrangement with a template (a layout document). Open
    /// parts keep their identity and move to the template's slot for them,
    /// or to their default position when it has none.
    pub fn reset_layout(&mut self, template: &Memento) -> bool {
        let was_zoomed = self.is_zoomed();
        let complete = self.load_layout(Ok(template));
        self.changed(was_zoomed);
        complete
    }

    fn load_layout(&mut self, saved: Result<&Memento, RestoreError>) -> bool {
        let restored = saved.and_then(|layout| {
            LayoutPresentation::restore_state(Rc::clone(&self.env.host), layout)
        });
        match restored {
            Ok(presentation) => {
                self.install(presentation);
                true
            }
            Err(err) => {
                tracing::warn!(%err, "saved layout unusable, falling back to the default layout");
                let presentation = default_presentation(&self.env);
                self.install(presentation);
                false
            }
        }
    }

    fn install(&mut self, presentation: LayoutPresentation) {
        let mut replaced = std::mem::replace(&mut self.presentation, presentation);
        replaced.close_windows();

        let owned = self.controller.owned_ids();
        if let Err(err) = self.presentation.retain_panes(|id| owned.contains(id)) {
            tracing::warn!(%err, "saved panes could not be pruned");
        }
        let stale_fast: Vec<PartId> = self
            .presentation
            .fast_views()
            .iter()
            .filter(|id| !owned.contains(id))
            .cloned()
            .collect();
        for id in &stale_fast {
            self.presentation.clear_fast(id);
        }
        for id in &owned {
            if self.presentation.find_pane(id).is_some() || self.presentation.is_fast(id) {
                continue;
            }
            let Ok(part) = self.controller.certify(id) else {
                continue;
            };
            let pane = Pane::new(id.clone(), part.kind());
            if let Err(err) = self.presentation.add_pane(pane) {
                tracing::warn!(part = %id, %err, "open part could not be placed");
            }
        }
    }

    fn merge_history(&mut self, mut history: ActivationHistory) {
        let owned = self.controller.owned_ids();
        history.retain(|id| owned.contains(id));
        for id in &owned {
            if history.contains(id) {
                continue;
            }
            if let Ok(part) = self.controller.certify(id) {
                history.record_opened(id.clone(), part.kind());
            }
        }
        self.history = history;
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.presentation.close_windows();
    }
}
