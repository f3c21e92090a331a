use std::collections::BTreeMap;
use std::rc::Rc;

use super::history::ActivationHistory;
use crate::environment::ActivationPolicy;
use crate::error::CertificationError;
use crate::events::{EventBus, PageEvent};
use crate::layout::LayoutPresentation;
use crate::part::{PartId, PartKind, PartRef};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Inactive,
    Active(PartId),
}

struct Owned {
    part: PartRef,
    stamp: u64,
}

/// Which part of a page has focus, and the set of parts the page owns.
///
/// Every operation certifies its part first: a part the page does not own
/// (closed, never opened, or reopened since a token was issued) is refused
/// with a [`CertificationError`] and nothing changes.
pub struct PageActivationController {
    state: ActivationState,
    parts: BTreeMap<PartId, Owned>,
    next_stamp: u64,
    policy: ActivationPolicy,
}

impl PageActivationController {
    pub fn new(policy: ActivationPolicy) -> Self {
        Self {
            state: ActivationState::Inactive,
            parts: BTreeMap::new(),
            next_stamp: 0,
            policy,
        }
    }

    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    pub fn active(&self) -> Option<&PartId> {
        match &self.state {
            ActivationState::Active(id) => Some(id),
            ActivationState::Inactive => None,
        }
    }

    pub fn is_active(&self, id: &PartId) -> bool {
        self.active() == Some(id)
    }

    /// Take ownership of a part. Returns its ownership stamp; registering an
    /// owned part again keeps the existing stamp.
    pub fn register(&mut self, part: PartRef) -> u64 {
        let id = part.id();
        if let Some(owned) = self.parts.get(&id) {
            return owned.stamp;
        }
        self.next_stamp += 1;
        let stamp = self.next_stamp;
        self.parts.insert(id, Owned { part, stamp });
        stamp
    }

    /// Drop ownership without any activation bookkeeping. Used to roll back a
    /// part that never made it into the layout.
    pub fn unregister(&mut self, id: &PartId) -> Option<PartRef> {
        if self.is_active(id) {
            self.state = ActivationState::Inactive;
        }
        self.parts.remove(id).map(|owned| owned.part)
    }

    pub fn is_owned(&self, id: &PartId) -> bool {
        self.parts.contains_key(id)
    }

    pub fn owned_ids(&self) -> Vec<PartId> {
        self.parts.keys().cloned().collect()
    }

    pub fn parts(&self) -> impl Iterator<Item = &PartRef> {
        self.parts.values().map(|owned| &owned.part)
    }

    pub fn certify(&self, id: &PartId) -> Result<&PartRef, CertificationError> {
        self.parts
            .get(id)
            .map(|owned| &owned.part)
            .ok_or_else(|| CertificationError::NotOwned(id.clone()))
    }

    pub fn stamp(&self, id: &PartId) -> Option<u64> {
        self.parts.get(id).map(|owned| owned.stamp)
    }

    /// Certify against the stamp handed out when an operation started.
    pub fn certify_stamp(&self, id: &PartId, stamp: u64) -> Result<&PartRef, CertificationError> {
        let owned = self
            .parts
            .get(id)
            .ok_or_else(|| CertificationError::NotOwned(id.clone()))?;
        if owned.stamp != stamp {
            return Err(CertificationError::Stale(id.clone()));
        }
        Ok(&owned.part)
    }

    fn active_with_kind(&self) -> Option<(PartId, PartKind)> {
        let id = self.active()?;
        let kind = self.parts.get(id)?.part.kind();
        Some((id.clone(), kind))
    }

    /// Give focus to `id`. Returns whether the active part changed.
    pub fn activate(
        &mut self,
        id: &PartId,
        history: &mut ActivationHistory,
        events: &mut EventBus,
    ) -> Result<bool, CertificationError> {
        let part = Rc::clone(self.certify(id)?);
        if self.is_active(id) {
            history.record_activated(id.clone(), part.kind());
            return Ok(false);
        }
        let previous = self.active_with_kind();
        self.switch(previous, Some(part), history, events);
        Ok(true)
    }

    /// Hand activation to the most recent part in `history` once the active
    /// part has been minimized. Returns whether activation moved.
    pub fn activate_next(&mut self, history: &mut ActivationHistory, events: &mut EventBus) -> bool {
        let Some(previous) = self.active_with_kind() else {
            return false;
        };
        if !history.is_minimized(&previous.0) {
            return false;
        }
        let next = history
            .current()
            .and_then(|id| self.parts.get(id))
            .map(|owned| Rc::clone(&owned.part));
        self.switch(Some(previous), next, history, events);
        true
    }

    fn switch(
        &mut self,
        previous: Option<(PartId, PartKind)>,
        next: Option<PartRef>,
        history: &mut ActivationHistory,
        events: &mut EventBus,
    ) {
        let forced = match &next {
            Some(next) => {
                let next_id = next.id();
                self.policy.is_forced(
                    previous.as_ref().map(|(id, kind)| (id, *kind)),
                    (&next_id, next.kind()),
                )
            }
            None => self.policy != ActivationPolicy::Never,
        };
        if let Some((id, _)) = previous {
            tracing::debug!(part = %id, forced, "part deactivated");
            events.emit(PageEvent::PartDeactivated { part: id, forced });
        }
        match next {
            Some(part) => {
                let id = part.id();
                self.state = ActivationState::Active(id.clone());
                part.request_focus();
                history.record_activated(id.clone(), part.kind());
                tracing::debug!(part = %id, forced, "part activated");
                events.emit(PageEvent::PartActivated { part: id, forced });
            }
            None => self.state = ActivationState::Inactive,
        }
    }

    /// Raise a part's tab without moving focus. Refused while the window is
    /// zoomed onto something else. Returns whether the part was raised.
    pub fn bring_to_top(
        &mut self,
        id: &PartId,
        presentation: &mut LayoutPresentation,
        events: &mut EventBus,
    ) -> Result<bool, CertificationError> {
        self.certify(id)?;
        let Some(node) = presentation.find_pane(id) else {
            return Ok(false);
        };
        if !presentation.is_within_zoom(node) {
            tracing::debug!(part = %id, "bring to top ignored while zoomed elsewhere");
            return Ok(false);
        }
        if let Err(err) = presentation.bring_to_top(id) {
            tracing::warn!(part = %id, %err, "bring to top failed");
            return Ok(false);
        }
        events.emit(PageEvent::PartBroughtToTop(id.clone()));
        Ok(true)
    }

    /// Forget a closed or hidden part. When it was active, the previous part
    /// in `history` takes over. Returns the part activated instead, if any.
    pub fn retire(
        &mut self,
        id: &PartId,
        history: &mut ActivationHistory,
        events: &mut EventBus,
    ) -> Result<Option<PartId>, CertificationError> {
        let kind = self.certify(id)?.kind();
        let was_active = self.is_active(id);
        let next = if was_active {
            history
                .previous()
                .and_then(|next| self.parts.get(next))
                .map(|owned| Rc::clone(&owned.part))
        } else {
            None
        };
        history.remove(id);
        self.parts.remove(id);
        let next_id = next.as_ref().map(|part| part.id());
        if was_active {
            self.switch(Some((id.clone(), kind)), next, history, events);
        }
        events.emit(PageEvent::PartClosed(id.clone()));
        Ok(next_id)
    }
}
