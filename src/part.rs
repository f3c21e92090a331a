//! Part contract consumed by the layout engine.
//!
//! The engine never looks inside an editor or view. It only needs the
//! identity, the kind, a way to hand keyboard focus over and the dirty flag.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Identity of an editor or view.
///
/// View identities may carry a secondary id after a `:` (`"view.console:2"`)
/// so several instances of one view type can be open side by side. The part
/// before the colon is the primary id used to look up the view descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(String);

impl PartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn primary(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(primary, _)| primary)
    }

    pub fn secondary(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, secondary)| secondary)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PartId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Editor,
    View,
}

impl PartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PartKind::Editor => "editor",
            PartKind::View => "view",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "editor" => Some(PartKind::Editor),
            "view" => Some(PartKind::View),
            _ => None,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live editor or view instance.
///
/// All calls happen on the UI thread, so implementors use interior
/// mutability (`Cell`, `RefCell`) for any state `request_focus` touches.
pub trait Part {
    fn id(&self) -> PartId;

    fn kind(&self) -> PartKind;

    fn request_focus(&self);

    fn is_dirty(&self) -> bool {
        false
    }
}

pub type PartRef = Rc<dyn Part>;
