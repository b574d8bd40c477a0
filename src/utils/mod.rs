//! Shared helpers: external commands and HTML minification.

pub mod exec;
pub mod minify;
