//! Built-in presentational components.
//!
//! Components emit utility classes; the stylesheet resolver is expected to
//! produce the matching CSS.

mod callout;
mod quote;

pub use callout::Callout;
pub use quote::Quote;

use crate::markup::ComponentRegistry;

/// Registry with every built-in component.
pub fn builtin() -> ComponentRegistry {
    ComponentRegistry::new()
        .with("Quote", Quote)
        .with("Callout", Callout)
}
