//! File-system routing for the armature framework.
//!
//! Routes are modules under the routes root; the URL is the file path:
//!
//! ```text
//! routes/
//! ├── layout.tsx        -> wraps every route below
//! ├── index.tsx         -> /
//! ├── about.tsx         -> /about
//! └── users/
//!     ├── layout.tsx    -> wraps /users/** (nearest wins)
//!     ├── index.tsx     -> /users
//!     └── [id]/
//!         └── index.tsx -> /users/:id
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use armature_router::RouteResolver;
//!
//! let resolver = RouteResolver::new(routes_dir, config.routes.clone(), cache);
//! let info = resolver.resolve("/users/42").await?;
//! assert_eq!(info.param("id"), Some("42"));
//! ```

mod error;
mod resolver;
mod segment;
mod tree;

pub use error::*;
pub use resolver::*;
pub use segment::*;
pub use tree::*;
