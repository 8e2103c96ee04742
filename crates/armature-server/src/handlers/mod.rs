//! Request handlers.

mod artifact;
mod hmr;
mod page;

pub use artifact::*;
pub use hmr::*;
pub use page::*;
