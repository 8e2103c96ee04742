//! Rendering runtime and reactive state for the armature framework.
//!
//! This crate provides:
//! - `View` / `Element` - Declarative element descriptions
//! - `render_to_string` / `mount` - Server and client rendering
//! - `Document` / `MemoryDocument` - Minimal DOM surface used for mounting and patching
//! - `StateContainer` - Owns the signal registry, tracking stack and effects
//! - `Signal<T>` - Reactive cell with `read`, `write`, `map_view`, `conditional_view`
//! - `KeyValueStorage` - Durable backing for persistent signals
//!
//! Reactivity is identifier-addressed: a signal write patches every element
//! tagged `data-sid`, `data-smid` or `data-scid` with the signal's id. There is
//! no virtual-DOM diff.
//!
//! # Example
//!
//! ```ignore
//! use armature_runtime::{Element, StateContainer, render_to_string};
//!
//! let state = StateContainer::new();
//! let count = state.create_signal(0);
//! let view = Element::new("button").child(count.bind()).into_view();
//! assert_eq!(render_to_string(&view)?, r#"<button><span data-sid="s1">0</span></button>"#);
//! ```

mod derived;
mod dom;
mod effect;
mod error;
mod escape;
mod render;
mod signal;
mod state;
mod storage;
mod view;

pub use derived::*;
pub use dom::*;
pub use effect::*;
pub use error::*;
pub use escape::*;
pub use render::*;
pub use signal::*;
pub use state::*;
pub use storage::*;
pub use view::*;
