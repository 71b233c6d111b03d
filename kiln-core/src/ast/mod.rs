//! Script syntax capability
//!
//! The bundler needs three things from a JavaScript front end: parse a
//! module's source, visit its dependency calls (`require("...")`) with the
//! ability to rewrite their argument, and render the tree back to text.
//! Those are captured by [`ScriptParser`] and [`SyntaxTree`]; any front end
//! can be plugged into the compiler through them.
//!
//! [`SwcParser`] is the built-in front end, on the swc parser shipped with
//! `deno_ast`. Rendering an unmodified tree reproduces the input exactly.

mod position;
mod script;

pub use position::SourcePosition;
pub use script::{ScriptTree, SwcParser};

use crate::error::BuildError;
use std::ops::Range;
use thiserror::Error;

/// Parse failure with its location
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {position}")]
pub struct SyntaxError {
    pub message: String,
    pub position: SourcePosition,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// The argument of a dependency call, as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgument {
    /// A single string literal, already unescaped
    Literal(String),
    /// Anything else: computed, templated, several or no arguments
    Dynamic(String),
}

/// One `require(...)` call expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCall {
    position: SourcePosition,
    argument: CallArgument,
    /// Byte range of the literal in the owning tree's source
    argument_range: Option<Range<usize>>,
    replacement: Option<String>,
}

impl DependencyCall {
    pub(crate) fn new(
        position: SourcePosition,
        argument: CallArgument,
        argument_range: Option<Range<usize>>,
    ) -> Self {
        Self {
            position,
            argument,
            argument_range,
            replacement: None,
        }
    }

    /// Where the call starts
    pub fn position(&self) -> SourcePosition {
        self.position
    }

    /// The argument as written
    pub fn argument(&self) -> &CallArgument {
        &self.argument
    }

    /// The literal specifier, if the argument is a single string literal
    pub fn literal(&self) -> Option<&str> {
        match &self.argument {
            CallArgument::Literal(value) => Some(value),
            CallArgument::Dynamic(_) => None,
        }
    }

    /// Replace the literal argument with `value`
    ///
    /// Returns `false` (and changes nothing) for a dynamic argument.
    pub fn rewrite(&mut self, value: &str) -> bool {
        if self.argument_range.is_none() {
            return false;
        }
        self.replacement = Some(value.to_string());
        true
    }

    /// The value the argument was rewritten to, if any
    pub fn rewritten(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    pub(crate) fn argument_range(&self) -> Option<Range<usize>> {
        self.argument_range.clone()
    }
}

/// Visitor over dependency calls
pub type CallVisitor<'v> = dyn FnMut(&mut DependencyCall) -> Result<(), BuildError> + 'v;

/// A parsed module
pub trait SyntaxTree: Send {
    /// Visit every dependency call in source order
    ///
    /// The first error returned by `visitor` stops the walk and is returned.
    fn visit_dependency_calls(&mut self, visitor: &mut CallVisitor<'_>) -> Result<(), BuildError>;

    /// Render the (possibly rewritten) tree back to source text
    fn render(&self) -> String;
}

/// A JavaScript front end
pub trait ScriptParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SyntaxError>;
}
