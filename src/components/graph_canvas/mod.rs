//! The 2D graph canvas: snapshot model, incremental layout, hit-testing,
//! interaction state, painting and the Leptos component tying them together.

mod clipboard;
mod color;
mod component;
mod layout;
mod pick;
mod render;
mod state;
mod surface;
mod types;

pub use color::{HIGHLIGHT_PALETTE, LabelColors};
pub use component::GraphCanvas;
pub use state::{Selection, SelectionEvent};
pub use types::{GraphSnapshot, Link, LinkId, Node, NodeId, Properties, PropertyValue};
