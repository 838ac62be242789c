//! Template rendering module.
//!
//! Built-in templates live in the crate's `templates/` directory and are
//! compiled into the binary; a directory of `*.tera` files can shadow them.

mod engine;

pub use engine::TemplateEngine;
