//! Persistence document model.
//!
//! Layout, activation history and page state are written to [`Memento`]
//! trees. The engine never picks a file format; any serde format the host
//! prefers can carry a memento.

mod memento;

pub use memento::{Memento, Value};
