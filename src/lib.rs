//! Dockable pane layout and activation engine for workbench-style shells.
//!
//! A [`page::Page`] owns one arrangement of editors and views: a main window
//! tree of splits and tab folders, any number of detached floating windows,
//! and the zoom and fast-view state laid over them. It also tracks which
//! part has focus and in what order parts were used.
//!
//! Rendering and input are left to the embedding toolkit. It reports drags
//! through [`layout::LayoutPresentation::evaluate_drop`], floats windows
//! through [`host::HostWindowing`] and listens to [`events::PageEvent`]s.

pub mod constants;
pub mod environment;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod page;
pub mod part;
pub mod persist;
pub mod tracing_sub;
pub mod window;

pub use environment::{ActivationPolicy, Environment, ViewRegistry};
pub use error::{CertificationError, CreationError, LayoutError, RestoreError};
pub use page::Page;
pub use part::{Part, PartId, PartKind, PartRef};
