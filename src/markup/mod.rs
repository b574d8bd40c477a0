//! Markup compiler.
//!
//! Two stages, kept apart so a malformed document is rejected before any
//! component runs:
//!
//! ```text
//! body text ──compile()──► Program ──execute(registry)──► HTML fragment
//!             CompileError            UnknownComponent
//! ```

mod parse;
mod registry;
mod render;

pub use parse::compile;
pub use registry::{Component, ComponentRegistry, Props, prop_text};
pub use render::execute;
