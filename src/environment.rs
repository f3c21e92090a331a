//! Explicitly constructed services a page is wired to.
//!
//! Everything that would otherwise be a process-wide registry lives here and
//! is handed to [`crate::page::Page::new`] by the embedding application.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::host::{HeadlessHost, HostWindowing};
use crate::part::{PartId, PartKind, PartRef};

pub type SharedHost = Rc<RefCell<dyn HostWindowing>>;

type Constructor = Box<dyn Fn(&PartId) -> Result<PartRef, String>>;

struct ViewDescriptor {
    kind: PartKind,
    construct: Constructor,
}

/// Descriptor id to constructor table.
///
/// Lookups use the primary id, so `view.console:2` is built by the
/// constructor registered for `view.console`.
#[derive(Default)]
pub struct ViewRegistry {
    descriptors: BTreeMap<String, ViewDescriptor>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, primary: impl Into<String>, kind: PartKind, construct: F)
    where
        F: Fn(&PartId) -> Result<PartRef, String> + 'static,
    {
        let primary = primary.into();
        tracing::trace!(descriptor = %primary, %kind, "view descriptor registered");
        self.descriptors.insert(
            primary,
            ViewDescriptor {
                kind,
                construct: Box::new(construct),
            },
        );
    }

    pub fn contains(&self, id: &PartId) -> bool {
        self.descriptors.contains_key(id.primary())
    }

    pub fn kind_of(&self, id: &PartId) -> Option<PartKind> {
        self.descriptors.get(id.primary()).map(|desc| desc.kind)
    }

    /// Run the registered constructor. `None` when no descriptor matches.
    pub fn construct(&self, id: &PartId) -> Option<Result<PartRef, String>> {
        self.descriptors
            .get(id.primary())
            .map(|desc| (desc.construct)(id))
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.keys()).finish()
    }
}

/// When an activation switch is reported as forced to the action bars.
///
/// A forced switch tears down and rebuilds toolbar contributions; an
/// unforced one only toggles their enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPolicy {
    /// Forced when the part kind (editor or view) changes.
    #[default]
    KindChange,
    /// Forced when the kind or the descriptor (primary id) changes.
    TypeChange,
    Always,
    Never,
}

impl ActivationPolicy {
    /// `previous` is the part losing activation, if any.
    pub fn is_forced(self, previous: Option<(&PartId, PartKind)>, next: (&PartId, PartKind)) -> bool {
        let Some((prev_id, prev_kind)) = previous else {
            return self != ActivationPolicy::Never;
        };
        match self {
            ActivationPolicy::Always => true,
            ActivationPolicy::Never => false,
            ActivationPolicy::KindChange => prev_kind != next.1,
            ActivationPolicy::TypeChange => {
                prev_kind != next.1 || prev_id.primary() != next.0.primary()
            }
        }
    }
}

#[derive(Clone)]
pub struct Environment {
    pub host: SharedHost,
    pub views: Rc<ViewRegistry>,
    pub policy: ActivationPolicy,
    /// Whether new pages carve an editor area out of the main window.
    pub editor_area: bool,
}

impl Environment {
    pub fn new(host: SharedHost, views: ViewRegistry) -> Self {
        Self {
            host,
            views: Rc::new(views),
            policy: ActivationPolicy::default(),
            editor_area: true,
        }
    }

    pub fn with_host<H: HostWindowing + 'static>(host: H, views: ViewRegistry) -> Self {
        Self::new(Rc::new(RefCell::new(host)), views)
    }

    /// Headless host with floating support, as used by tests and tools.
    pub fn headless(views: ViewRegistry) -> Self {
        Self::with_host(HeadlessHost::new(true), views)
    }

    pub fn with_policy(mut self, policy: ActivationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn without_editor_area(mut self) -> Self {
        self.editor_area = false;
        self
    }

    pub fn supports_floating(&self) -> bool {
        self.host.borrow().supports_floating()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("views", &self.views)
            .field("policy", &self.policy)
            .field("editor_area", &self.editor_area)
            .finish_non_exhaustive()
    }
}
