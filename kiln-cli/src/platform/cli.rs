//! CLI formatted output
//!
//! Error display with source context.

use kiln_core::graph::{normalize, ModuleId};
use kiln_core::{BuildError, Compiler};
use kiln_vfs::VirtualFileSystem;
use std::path::PathBuf;

/// Print a build error, with the offending source lines when available
pub fn print_build_error(err: &BuildError, compiler: &Compiler, vfs: &dyn VirtualFileSystem) {
    eprintln!("error[{}]: {}", err.kind(), err);

    match err {
        BuildError::Resolution { tried, .. } => {
            for candidate in tried {
                eprintln!("  tried {}", candidate.display());
            }
        }
        BuildError::Parse { module, source } => {
            print_module_context(compiler, vfs, module, source.position.line, source.position.column);
        }
        BuildError::UnsupportedDependency { module, position, .. } => {
            print_module_context(compiler, vfs, module, position.line, position.column);
        }
        _ => {}
    }
}

/// Positions refer to loader output, so raw file lines are only shown for
/// modules no rule applies to
fn print_module_context(
    compiler: &Compiler,
    vfs: &dyn VirtualFileSystem,
    module: &ModuleId,
    line: usize,
    column: usize,
) {
    let options = compiler.options();
    let path: PathBuf = normalize(&options.root.join(module.as_str()));
    if options.rules.iter().any(|rule| rule.matches(&path)) {
        return;
    }
    if let Ok(source) = vfs.read_to_string(&path) {
        print_source_context(&source, line, column);
    }
}

/// Print source context (lines around the error line)
pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    // lines shown before and after the error line
    const CONTEXT_LINES: usize = 2;

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return;
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);
    let width = end_line.to_string().len();

    let separator = "-".repeat(width + 1);
    eprintln!("{}|--", separator);

    for line_idx in start_line..=end_line {
        eprintln!("{:>width$} | {}", line_idx, lines[line_idx - 1], width = width);
        if line_idx == error_line {
            let marker = " ".repeat(error_col.saturating_sub(1));
            eprintln!("{} | {}^", " ".repeat(width), marker);
        }
    }

    eprintln!("{}|--", separator);
}
