//! swc-backed syntax tree

use super::{CallArgument, CallVisitor, DependencyCall, ScriptParser, SourcePosition, SyntaxError, SyntaxTree};
use crate::error::BuildError;
use deno_ast::swc::ast::{CallExpr, Callee, EsVersion, Expr, ExprOrSpread, Lit};
use deno_ast::swc::common::sync::Lrc;
use deno_ast::swc::common::{BytePos, FileName, Globals, SourceMap, Span, Spanned, GLOBALS};
use deno_ast::swc::ecma_visit::{Visit, VisitWith};
use deno_ast::swc::parser::lexer::Lexer;
use deno_ast::swc::parser::{EsSyntax, Parser, StringInput, Syntax};
use std::ops::Range;
use tracing::trace;

/// Name of the dependency-request function
const REQUIRE: &str = "require";

/// Built-in [`ScriptParser`] on the swc ECMAScript parser
#[derive(Debug, Clone, Copy, Default)]
pub struct SwcParser;

impl SwcParser {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptParser for SwcParser {
    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SyntaxError> {
        Ok(Box::new(ScriptTree::parse(source)?))
    }
}

/// A parsed script: its source and the `require` calls found in its AST
///
/// Rendering splices rewritten arguments into the original text by span,
/// so comments and formatting survive untouched.
#[derive(Debug, Clone)]
pub struct ScriptTree {
    source: String,
    calls: Vec<DependencyCall>,
}

impl ScriptTree {
    /// Parse `source` as a script or module and collect its `require` calls
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let globals = Globals::new();
        GLOBALS.set(&globals, || {
            let source_map: Lrc<SourceMap> = Default::default();
            let file = source_map.new_source_file(FileName::Anon.into(), source.to_string());
            let base = file.start_pos;

            let lexer = Lexer::new(
                Syntax::Es(EsSyntax::default()),
                EsVersion::EsNext,
                StringInput::from(&*file),
                None,
            );
            let mut parser = Parser::new_from(lexer);
            let program = parser
                .parse_program()
                .map_err(|err| syntax_error(source, base, err))?;
            if let Some(err) = parser.take_errors().into_iter().next() {
                return Err(syntax_error(source, base, err));
            }

            let mut finder = CallFinder {
                source,
                base,
                calls: Vec::new(),
            };
            program.visit_with(&mut finder);
            trace!(target: "kiln::parse", calls = finder.calls.len(), "parsed module");

            Ok(Self {
                source: source.to_string(),
                calls: finder.calls,
            })
        })
    }

    /// Dependency calls, in source order
    pub fn calls(&self) -> &[DependencyCall] {
        &self.calls
    }
}

impl SyntaxTree for ScriptTree {
    fn visit_dependency_calls(&mut self, visitor: &mut CallVisitor<'_>) -> Result<(), BuildError> {
        for call in &mut self.calls {
            visitor(call)?;
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut replacements: Vec<(Range<usize>, &str)> = self
            .calls
            .iter()
            .filter_map(|call| Some((call.argument_range()?, call.rewritten()?)))
            .collect();
        replacements.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (range, value) in replacements {
            out.push_str(&self.source[cursor..range.start]);
            out.push_str(&quote(value));
            cursor = range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Collects `require(...)` call expressions in pre-order
///
/// Only a bare `require` identifier as callee counts: member calls such as
/// `obj.require(x)` and method definitions named `require` are not calls to it.
struct CallFinder<'s> {
    source: &'s str,
    base: BytePos,
    calls: Vec<DependencyCall>,
}

impl CallFinder<'_> {
    fn range(&self, span: Span) -> Option<Range<usize>> {
        let start = span.lo.0.checked_sub(self.base.0)? as usize;
        let end = span.hi.0.checked_sub(self.base.0)? as usize;
        self.source.get(start..end).map(|_| start..end)
    }

    fn dependency_call(&self, call: &CallExpr) -> DependencyCall {
        let position = self
            .range(call.span)
            .map(|range| SourcePosition::at_offset(self.source, range.start))
            .unwrap_or_default();

        if let [only] = call.args.as_slice() {
            if let Some(range) = self.string_literal(only) {
                let literal = unescape(&self.source[range.clone()]);
                return DependencyCall::new(position, CallArgument::Literal(literal), Some(range));
            }
        }

        let written = match (call.args.first(), call.args.last()) {
            (Some(first), Some(last)) => self
                .range(first.span().with_hi(last.span().hi))
                .map(|range| self.source[range].to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        DependencyCall::new(position, CallArgument::Dynamic(written), None)
    }

    fn string_literal(&self, arg: &ExprOrSpread) -> Option<Range<usize>> {
        if arg.spread.is_some() {
            return None;
        }
        match &*arg.expr {
            Expr::Lit(Lit::Str(literal)) => self.range(literal.span),
            _ => None,
        }
    }
}

impl Visit for CallFinder<'_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if is_require(&call.callee) {
            let found = self.dependency_call(call);
            self.calls.push(found);
        }
        call.visit_children_with(self);
    }
}

fn is_require(callee: &Callee) -> bool {
    match callee {
        Callee::Expr(expr) => matches!(&**expr, Expr::Ident(ident) if &*ident.sym == REQUIRE),
        _ => false,
    }
}

fn syntax_error(source: &str, base: BytePos, err: deno_ast::swc::parser::error::Error) -> SyntaxError {
    let offset = err.span().lo.0.saturating_sub(base.0) as usize;
    SyntaxError::new(err.kind().msg().to_string(), SourcePosition::at_offset(source, offset))
}

/// Render `value` as a double-quoted JavaScript string literal
fn quote(value: &str) -> String {
    let mut quoted = serde_json::Value::String(value.to_string()).to_string();
    // Valid in JSON strings, line terminators in older JavaScript
    quoted = quoted.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");
    quoted
}

/// Decode a quoted JavaScript string literal (quotes included)
fn unescape(literal: &str) -> String {
    let inner = literal.get(1..literal.len().saturating_sub(1)).unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().map_or(false, |d| d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|d| *d != '}').collect();
                push_code_point(&mut out, &hex);
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                push_code_point(&mut out, &hex);
            }
            // line continuation
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push('\u{fffd}'),
    }
}
