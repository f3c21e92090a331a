use std::collections::BTreeSet;

use crate::error::RestoreError;
use crate::part::{PartId, PartKind};
use crate::persist::Memento;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    id: PartId,
    kind: PartKind,
}

/// Recency order of a page's open parts. The tail is the most recently
/// activated part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationHistory {
    entries: Vec<Entry>,
    minimized: BTreeSet<PartId>,
}

impl ActivationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &PartId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == *id)
    }

    /// Move `id` to the tail, appending it when absent.
    pub fn record_activated(&mut self, id: PartId, kind: PartKind) {
        if self.entries.last().is_some_and(|entry| entry.id == id) {
            return;
        }
        if let Some(index) = self.position(&id) {
            self.entries.remove(index);
        }
        self.entries.push(Entry { id, kind });
    }

    /// New parts start as least recent so they do not take over activation.
    pub fn record_opened(&mut self, id: PartId, kind: PartKind) {
        if self.position(&id).is_none() {
            self.entries.insert(0, Entry { id, kind });
        }
    }

    pub fn remove(&mut self, id: &PartId) -> bool {
        self.minimized.remove(id);
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Mark a part as a fast view so recency queries pass over it.
    pub fn set_minimized(&mut self, id: &PartId, minimized: bool) {
        if minimized {
            if self.position(id).is_some() {
                self.minimized.insert(id.clone());
            }
        } else {
            self.minimized.remove(id);
        }
    }

    pub fn is_minimized(&self, id: &PartId) -> bool {
        self.minimized.contains(id)
    }

    fn scan(&self, skip: usize) -> Option<&PartId> {
        self.entries
            .iter()
            .rev()
            .skip(skip)
            .map(|entry| &entry.id)
            .find(|id| !self.minimized.contains(*id))
    }

    pub fn current(&self) -> Option<&PartId> {
        self.scan(0)
    }

    pub fn previous(&self) -> Option<&PartId> {
        self.scan(1)
    }

    /// Rotate the open editors. Forward moves the most recent editor to the
    /// head and returns the editor that is now most recent; backward moves
    /// the least recent editor to the tail and returns it. `None` with fewer
    /// than two editors.
    pub fn cycle(&mut self, forward: bool) -> Option<PartId> {
        let editors: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.kind == PartKind::Editor)
            .map(|(index, _)| index)
            .collect();
        let (&head, &tail) = (editors.first()?, editors.last()?);
        if editors.len() < 2 {
            return None;
        }
        if forward {
            let entry = self.entries.remove(tail);
            self.entries.insert(0, entry);
            self.entries
                .iter()
                .rev()
                .find(|entry| entry.kind == PartKind::Editor)
                .map(|entry| entry.id.clone())
        } else {
            let entry = self.entries.remove(head);
            let id = entry.id.clone();
            self.entries.push(entry);
            Some(id)
        }
    }

    pub fn contains(&self, id: &PartId) -> bool {
        self.position(id).is_some()
    }

    /// Parts from least to most recent.
    pub fn parts(&self) -> impl Iterator<Item = &PartId> {
        self.entries.iter().map(|entry| &entry.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every part `keep` rejects.
    pub fn retain<F: Fn(&PartId) -> bool>(&mut self, keep: F) {
        self.entries.retain(|entry| keep(&entry.id));
        self.minimized.retain(|id| keep(id));
    }

    pub fn save_state(&self) -> Memento {
        let mut memento = Memento::new("history");
        for entry in &self.entries {
            let saved = memento
                .create_child("entry")
                .set("part", entry.id.as_str())
                .set("kind", entry.kind.as_str());
            if self.minimized.contains(&entry.id) {
                saved.set("minimized", true);
            }
        }
        memento
    }

    pub fn restore_state(memento: &Memento) -> Result<Self, RestoreError> {
        let mut history = Self::new();
        for saved in memento.children_of("entry") {
            let id = PartId::new(saved.require_str("part")?);
            let kind =
                PartKind::parse(saved.require_str("kind")?).ok_or_else(|| RestoreError::InvalidValue {
                    element: saved.kind().to_string(),
                    key: "kind",
                })?;
            if saved.get_bool("minimized") == Some(true) {
                history.minimized.insert(id.clone());
            }
            history.record_activated(id, kind);
        }
        Ok(history)
    }
}
