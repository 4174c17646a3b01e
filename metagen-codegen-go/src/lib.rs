//! Go backend for the metagen code generator.
//!
//! The backend computes Go names, packages, and type reference forms
//! for every model entity, then drives a family of emitters that
//! produce the typed SDK: data objects with accessors, builders, JSON
//! readers and writers, HTTP client stubs, and server dispatch
//! adapters.

use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use rustc_hash::FxHashSet;

mod bindings;
mod buffer;
mod builders;
mod clients;
mod errors;
mod generator;
mod helpers;
mod naming;
mod packages;
mod readers;
mod refs;
mod servers;
mod types;
mod writers;

pub use buffer::{Buffer, BufferBuilder};
pub use generator::{Generator, GeneratorBuilder};
pub use naming::NamesCalculator;
pub use packages::{GoPackage, PackagesCalculator};
pub use refs::{GoImport, GoTypeRef, ReferenceError, TypesCalculator};

/// Formats a documentation string as Go line comments, wrapping at 80
/// characters. Absent documentation formats as nothing.
pub(crate) fn line_comment(doc: Option<&str>) -> String {
    use itertools::Itertools;
    let Some(doc) = doc else {
        return String::new();
    };
    textwrap::wrap(doc, 80)
        .into_iter()
        .map(|line| format!("// {line}"))
        .join("\n")
}

/// A mandatory piece of generator configuration is missing.
///
/// These are fatal at startup: nothing is generated.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error, miette::Diagnostic)]
#[error("{what} is mandatory")]
pub struct ConfigError {
    what: &'static str,
}

impl ConfigError {
    pub(crate) fn missing(what: &'static str) -> Self {
        Self { what }
    }
}

/// Pretty-prints emitted source before it reaches disk.
///
/// The real `gofmt` is an external collaborator; the default
/// [`GoFormatter`] normalizes whitespace well enough that its output
/// is stable under `gofmt`.
pub trait Formatter {
    fn format(&self, source: &str) -> String;
}

/// Normalizes the whitespace of emitted Go source: re-indents by
/// bracket depth using tabs, collapses runs of blank lines, and drops
/// blanks hugging braces.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoFormatter;

impl Formatter for GoFormatter {
    fn format(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut depth: usize = 0;
        let mut previous_blank = true; // Swallows leading blanks.
        let mut previous_open = false;
        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if !previous_blank {
                    out.push('\n');
                    previous_blank = true;
                }
                continue;
            }
            let (closers, delta) = scan_brackets(trimmed);
            // `case` and `default` clauses sit one level shallower
            // than the switch body they label.
            let label = (trimmed.starts_with("case ") || trimmed.starts_with("default:")) as usize;
            let indent = depth.saturating_sub(closers + label);
            // A blank line directly after an opening brace reads as
            // accidental; drop it.
            if previous_blank && previous_open && out.ends_with("\n\n") {
                out.pop();
            }
            // Same for a blank directly before a closing brace.
            if trimmed.starts_with('}') || trimmed.starts_with(')') {
                while out.ends_with("\n\n") {
                    out.pop();
                }
            }
            for _ in 0..indent {
                out.push('\t');
            }
            out.push_str(trimmed);
            out.push('\n');
            depth = (depth as isize + delta).max(0) as usize;
            previous_open = trimmed.ends_with('{') || trimmed.ends_with('(');
            previous_blank = false;
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

/// Counts bracket structure on one line, ignoring string literals and
/// line comments. Returns the number of leading closers and the net
/// depth change.
fn scan_brackets(line: &str) -> (usize, isize) {
    let mut leading_closers = 0;
    let mut counting_leaders = true;
    let mut delta = 0isize;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                counting_leaders = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '`' => {
                counting_leaders = false;
                for c in chars.by_ref() {
                    if c == '`' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => break,
            '{' | '(' => {
                counting_leaders = false;
                delta += 1;
            }
            '}' | ')' => {
                if counting_leaders {
                    leading_closers += 1;
                }
                delta -= 1;
            }
            c if c.is_whitespace() => {}
            _ => counting_leaders = false,
        }
    }
    (leading_closers, delta)
}

/// The set of files produced by one generator run.
///
/// Writes go through the configured [`Formatter`] and are tracked so
/// that a second write to the same path fails the run immediately: a
/// path collision means two emitters computed the same file name.
pub struct FileSet {
    root: PathBuf,
    formatter: Box<dyn Formatter>,
    written: FxHashSet<PathBuf>,
}

impl FileSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_formatter(root, Box::new(GoFormatter))
    }

    pub fn with_formatter(root: impl Into<PathBuf>, formatter: Box<dyn Formatter>) -> Self {
        Self {
            root: root.into(),
            formatter,
            written: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Formats and writes one output file. `path` is relative to the
    /// output root.
    pub fn write(&mut self, path: &Path, source: &str) -> miette::Result<()> {
        if !self.written.insert(path.to_owned()) {
            miette::bail!("output file `{}` was generated twice", path.display());
        }
        let source = self.formatter.format(source);
        let path = self.root.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .into_diagnostic()
                .with_context(|| format!("Failed to create directory `{}`", parent.display()))?;
        }
        std::fs::write(&path, source)
            .into_diagnostic()
            .with_context(|| format!("Failed to write `{}`", path.display()))?;
        Ok(())
    }
}

impl std::fmt::Debug for FileSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSet")
            .field("root", &self.root)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}
