//! Error taxonomy of the layout and activation engine.
//!
//! Only [`CreationError`] ever reaches a user-facing caller. Layout and
//! certification failures are logged by the page and turned into no-ops so
//! the docking UI stays responsive.

use thiserror::Error;

use crate::layout::NodeId;
use crate::part::PartId;
use crate::window::DetachedWindowId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreationError {
    #[error("no view is registered for `{0}`")]
    UnknownView(PartId),
    #[error("could not open view `{id}`: {reason}")]
    Failed { id: PartId, reason: String },
    #[error("view requested as `{requested}` reported identity `{reported}`")]
    IdentityMismatch { requested: PartId, reported: PartId },
}

/// Structural requests the layout tree refuses to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("part `{0}` is not in the layout")]
    UnknownPart(PartId),
    #[error("layout node {0:?} has no container")]
    Orphan(NodeId),
    #[error("layout node {0:?} cannot be used as a target")]
    InvalidTarget(NodeId),
    #[error("layout node {0:?} cannot be moved relative to itself")]
    SelfReference(NodeId),
    #[error("the root container and the editor area are fixed")]
    Immovable,
    #[error("part `{0}` cannot be minimized")]
    NotMinimizable(PartId),
    #[error("detached window {0:?} does not exist")]
    UnknownWindow(DetachedWindowId),
}

/// A part operation arrived for a part the page does not own (any more).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificationError {
    #[error("part `{0}` is not owned by this page")]
    NotOwned(PartId),
    #[error("the operation was cancelled")]
    Cancelled,
    #[error("part `{0}` was closed or reopened after the operation started")]
    Stale(PartId),
}

/// A persisted layout document that cannot be turned back into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("`{element}` element is missing child `{child}`")]
    MissingChild {
        element: String,
        child: &'static str,
    },
    #[error("`{element}` element is missing `{key}`")]
    MissingKey { element: String, key: &'static str },
    #[error("`{element}` element has an invalid `{key}`")]
    InvalidValue { element: String, key: &'static str },
    #[error("unknown layout node type `{0}`")]
    UnknownNodeType(String),
}
