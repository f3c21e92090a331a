use std::collections::BTreeMap;
use std::rc::Rc;

use crate::environment::ViewRegistry;
use crate::error::CreationError;
use crate::part::{PartId, PartRef};

struct Cached {
    instance: PartRef,
    references: usize,
}

/// Outcome of [`InstanceFactory::release`].
pub enum Release {
    /// The last reference went away. The caller tears the instance down.
    Disposed(PartRef),
    /// Still referenced this many times.
    Retained(usize),
    /// Nothing was cached under that id.
    Unknown,
}

/// One live view instance per identity, kept alive by a reference count.
pub struct InstanceFactory {
    views: Rc<ViewRegistry>,
    cache: BTreeMap<PartId, Cached>,
}

impl InstanceFactory {
    pub fn new(views: Rc<ViewRegistry>) -> Self {
        Self {
            views,
            cache: BTreeMap::new(),
        }
    }

    /// Return the live instance for `id`, constructing it on first use.
    /// Every successful call takes one reference.
    pub fn acquire(&mut self, id: &PartId) -> Result<PartRef, CreationError> {
        if let Some(cached) = self.cache.get_mut(id) {
            cached.references += 1;
            tracing::trace!(part = %id, references = cached.references, "view reused");
            return Ok(Rc::clone(&cached.instance));
        }
        let instance = self
            .views
            .construct(id)
            .ok_or_else(|| CreationError::UnknownView(id.clone()))?
            .map_err(|reason| CreationError::Failed {
                id: id.clone(),
                reason,
            })?;
        let reported = instance.id();
        if reported != *id {
            return Err(CreationError::IdentityMismatch {
                requested: id.clone(),
                reported,
            });
        }
        tracing::debug!(part = %id, "view constructed");
        self.cache.insert(
            id.clone(),
            Cached {
                instance: Rc::clone(&instance),
                references: 1,
            },
        );
        Ok(instance)
    }

    /// Give back one reference taken by [`acquire`](Self::acquire).
    pub fn release(&mut self, id: &PartId) -> Release {
        let Some(cached) = self.cache.get_mut(id) else {
            return Release::Unknown;
        };
        cached.references = cached.references.saturating_sub(1);
        if cached.references > 0 {
            return Release::Retained(cached.references);
        }
        match self.cache.remove(id) {
            Some(cached) => {
                tracing::debug!(part = %id, "view disposed");
                Release::Disposed(cached.instance)
            }
            None => Release::Unknown,
        }
    }

    pub fn peek(&self, id: &PartId) -> Option<PartRef> {
        self.cache.get(id).map(|cached| Rc::clone(&cached.instance))
    }

    pub fn reference_count(&self, id: &PartId) -> usize {
        self.cache.get(id).map_or(0, |cached| cached.references)
    }

    pub fn live_ids(&self) -> Vec<PartId> {
        self.cache.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::part::{Part, PartKind};

    struct Stub(PartId);

    impl Part for Stub {
        fn id(&self) -> PartId {
            self.0.clone()
        }

        fn kind(&self) -> PartKind {
            PartKind::View
        }

        fn request_focus(&self) {}
    }

    fn registry(builds: Rc<Cell<usize>>) -> Rc<ViewRegistry> {
        let mut views = ViewRegistry::new();
        views.register("view.x", PartKind::View, move |id| {
            builds.set(builds.get() + 1);
            Ok(Rc::new(Stub(id.clone())) as PartRef)
        });
        views.register("view.liar", PartKind::View, |_| {
            Ok(Rc::new(Stub(PartId::new("view.other"))) as PartRef)
        });
        views.register("view.broken", PartKind::View, |_| Err("no backend".to_string()));
        Rc::new(views)
    }

    #[test]
    fn single_instance_until_last_release() {
        let builds = Rc::new(Cell::new(0));
        let mut factory = InstanceFactory::new(registry(builds.clone()));
        let id = PartId::new("view.x");
        let first = factory.acquire(&id).unwrap();
        let second = factory.acquire(&id).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);
        assert_eq!(factory.reference_count(&id), 2);

        assert!(matches!(factory.release(&id), Release::Retained(1)));
        assert!(factory.peek(&id).is_some());
        assert!(matches!(factory.release(&id), Release::Disposed(_)));
        assert!(factory.peek(&id).is_none());
        assert!(matches!(factory.release(&id), Release::Unknown));
    }

    #[test]
    fn creation_failures_cache_nothing() {
        let mut factory = InstanceFactory::new(registry(Rc::new(Cell::new(0))));
        assert_eq!(
            factory.acquire(&PartId::new("view.none")).err(),
            Some(CreationError::UnknownView(PartId::new("view.none")))
        );
        assert!(matches!(
            factory.acquire(&PartId::new("view.broken")),
            Err(CreationError::Failed { .. })
        ));
        assert!(matches!(
            factory.acquire(&PartId::new("view.liar")),
            Err(CreationError::IdentityMismatch { .. })
        ));
        assert!(factory.live_ids().is_empty());
    }

    #[test]
    fn secondary_ids_are_separate_instances() {
        let builds = Rc::new(Cell::new(0));
        let mut factory = InstanceFactory::new(registry(builds.clone()));
        factory.acquire(&PartId::new("view.x:1")).unwrap();
        factory.acquire(&PartId::new("view.x:2")).unwrap();
        assert_eq!(builds.get(), 2);
        assert_eq!(factory.live_ids().len(), 2);
    }
}
