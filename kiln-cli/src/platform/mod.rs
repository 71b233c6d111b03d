//! Terminal output helpers

mod cli;

pub use cli::{print_build_error, print_source_context};
