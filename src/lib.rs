//! Tsuji is a trie-based HTTP router for Rust.
//!
//! Route patterns are compiled into a shared prefix tree. Each incoming
//! request walks the tree once, binding named parameters along the way,
//! and is dispatched to the handler registered for its method.
//!
//! # Patterns
//!
//! Both paths and hosts support three kinds of pattern matching:
//!
//! - `text` — matches the bytes as-is.
//! - `{name}` — wildcard; consumes greedily up to the byte that follows
//!   it in the pattern and binds the consumed run to `name`.
//! - `{name:regex}` — anchored regular expression bound to `name`.
//!
//! ```
//! use tsuji::{output, Resource, Router};
//!
//! # fn main() -> tsuji::Result<()> {
//! let mut router = Router::new("/");
//! router.route(
//!     "/blog/{id:[0-9]+}",
//!     Resource::new().get(|input: &mut tsuji::Input<'_>| {
//!         output::text(format!("article {}", &input.params()["id"]))
//!     }),
//! )?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/tsuji/0.1.0")]
#![warn(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    unused
)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handler;
pub mod input;
pub mod middleware;
pub mod mux;
pub mod output;
pub mod router;

mod handle;
mod matcher;
mod pattern;
mod tree;

#[doc(inline)]
pub use crate::{
    error::{Error, Result},
    handler::Handler,
    input::{BindError, BindParams, FromBinding, Input, Params},
    mux::Mux,
    output::ResponseBody,
    router::{Resource, Router},
};
