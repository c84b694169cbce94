//! Shader Source Preprocessor
//!
//! Flattens `#include "relative/path"` directives into a single source string
//! before it is handed to the GPU compiler.
//!
//! # Rules
//!
//! - Quoted paths resolve relative to the directory of the file containing the
//!   directive. Angle-bracket includes (`#include <...>`) pass through untouched.
//! - Every file gets a small integer id in first-seen order; the root file is
//!   always id `0`.
//! - Included text is preceded by a `#line 1 <id>` marker and followed by a
//!   `#line <next> <parent id>` marker restoring the parent's context. The root
//!   file never receives a leading marker, so a first-line `#version`-style
//!   statement stays first.
//! - A file that is still being expanded higher up the include chain is a cycle
//!   and fails with [`DuskError::ShaderIncludeCycle`]. A file that was already
//!   fully expanded through another branch is not expanded again.
//! - A header comment block maps every id to its canonical path.
//!
//! # Line Directive Styles
//!
//! GLSL-family compilers consume `#line` natively ([`LineDirectiveStyle::Glsl`]).
//! WGSL has no such directive, so [`LineDirectiveStyle::Comment`] writes the
//! same markers as `// #line` comments and relies on the [`LineMap`] to map
//! compiler diagnostics back to source files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::errors::{DuskError, Result};

const HEADER_TITLE: &str = "// === dusk shader source map ===";
const HEADER_RULE: &str = "// ===============================";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineDirectiveStyle {
    /// `#line <line> <source id>`
    Glsl,
    /// `// #line <line> <source id>`
    #[default]
    Comment,
}

/// Origin of one line of flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub source_id: u32,
    /// 1-based line in the originating file.
    pub line: u32,
}

/// Output line → originating file and line.
///
/// Header and directive lines have no origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMap {
    lines: Vec<Option<SourceLocation>>,
}

impl LineMap {
    /// `output_line` is 1-based.
    #[must_use]
    pub fn resolve(&self, output_line: u32) -> Option<SourceLocation> {
        let index = usize::try_from(output_line).ok()?.checked_sub(1)?;
        self.lines.get(index).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of [`ShaderPreprocessor::process`].
#[derive(Debug, Clone, Default)]
pub struct ProcessedShader {
    /// Flattened source, header first.
    pub source: String,
    /// Root file plus every distinct file reached through an include, in
    /// first-seen order. This is the set the hot-reload tracker watches.
    pub dependencies: Vec<PathBuf>,
    /// Canonical path of each source id (`sources[id]`).
    pub sources: Vec<PathBuf>,
    pub line_map: LineMap,
}

impl ProcessedShader {
    /// Path and line that produced `output_line` (1-based).
    #[must_use]
    pub fn locate(&self, output_line: u32) -> Option<(&Path, u32)> {
        let loc = self.line_map.resolve(output_line)?;
        let path = self.sources.get(loc.source_id as usize)?;
        Some((path.as_path(), loc.line))
    }

    /// Appends `[path:line]` to every diagnostic line that cites a position in
    /// the flattened source as `wgsl:<line>:<col>`.
    #[must_use]
    pub fn remap_diagnostic(&self, message: &str) -> String {
        let mut out = String::with_capacity(message.len());
        for line in message.lines() {
            out.push_str(line);
            if let Some((path, src_line)) = cited_line(line).and_then(|l| self.locate(l)) {
                let _ = write!(out, "  [{}:{src_line}]", path.display());
            }
            out.push('\n');
        }
        out
    }
}

fn cited_line(text: &str) -> Option<u32> {
    let start = text.find("wgsl:")? + "wgsl:".len();
    let digits: String = text[start..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderPreprocessor {
    style: LineDirectiveStyle,
}

impl ShaderPreprocessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_style(style: LineDirectiveStyle) -> Self {
        Self { style }
    }

    /// Flattens `path` and everything it includes.
    ///
    /// # Errors
    ///
    /// - [`DuskError::Io`] if any file cannot be resolved or read
    /// - [`DuskError::ShaderInclude`] for a malformed quoted include
    /// - [`DuskError::ShaderIncludeCycle`] for an include cycle
    pub fn process(&self, path: impl AsRef<Path>) -> Result<ProcessedShader> {
        let path = path.as_ref();
        let root = std::fs::canonicalize(path).map_err(|e| DuskError::io(path, e))?;

        let mut expansion = Expansion {
            style: self.style,
            ..Expansion::default()
        };
        expansion.expand(&root, false)?;

        let mut source = String::with_capacity(expansion.body.len() + 256);
        source.push_str(HEADER_TITLE);
        source.push('\n');
        for (id, path) in expansion.sources.iter().enumerate() {
            let _ = writeln!(source, "// source {id}: {}", path.display());
        }
        source.push_str(HEADER_RULE);
        source.push('\n');
        let header_lines = expansion.sources.len() + 2;
        source.push_str(&expansion.body);

        let mut lines = vec![None; header_lines];
        lines.extend(expansion.lines);

        Ok(ProcessedShader {
            source,
            dependencies: expansion.sources.clone(),
            sources: expansion.sources,
            line_map: LineMap { lines },
        })
    }
}

/// State of one `process` invocation.
#[derive(Default)]
struct Expansion {
    style: LineDirectiveStyle,
    /// Files currently being expanded, root first.
    stack: SmallVec<[PathBuf; 8]>,
    /// Every file entered so far.
    visited: FxHashSet<PathBuf>,
    ids: FxHashMap<PathBuf, u32>,
    sources: Vec<PathBuf>,
    body: String,
    lines: Vec<Option<SourceLocation>>,
}

impl Expansion {
    fn source_id(&mut self, path: &Path) -> u32 {
        if let Some(&id) = self.ids.get(path) {
            return id;
        }
        let id = self.sources.len() as u32;
        self.ids.insert(path.to_path_buf(), id);
        self.sources.push(path.to_path_buf());
        id
    }

    fn push_line(&mut self, text: &str, origin: Option<SourceLocation>) {
        self.body.push_str(text);
        self.body.push('\n');
        self.lines.push(origin);
    }

    fn push_directive(&mut self, line: usize, id: u32) {
        let text = match self.style {
            LineDirectiveStyle::Glsl => format!("#line {line} {id}"),
            LineDirectiveStyle::Comment => format!("// #line {line} {id}"),
        };
        self.push_line(&text, None);
    }

    fn expand(&mut self, path: &Path, emit_preamble: bool) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| DuskError::io(path, e))?;

        let id = self.source_id(path);
        self.visited.insert(path.to_path_buf());
        self.stack.push(path.to_path_buf());

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        if emit_preamble {
            self.push_directive(1, id);
        }

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let origin = Some(SourceLocation {
                source_id: id,
                line: line_number as u32,
            });

            let Some(rest) = include_argument(line) else {
                self.push_line(line, origin);
                continue;
            };

            if rest.starts_with('<') {
                self.push_line(line, origin);
                continue;
            }

            let relative = parse_quoted(rest).ok_or_else(|| DuskError::ShaderInclude {
                path: path.to_path_buf(),
                line: line_number,
                reason: format!("expected a quoted path, found `{}`", line.trim()),
            })?;

            let target = dir.join(relative);
            let target = std::fs::canonicalize(&target).map_err(|e| DuskError::io(&target, e))?;

            if self.stack.contains(&target) {
                let chain = self
                    .stack
                    .iter()
                    .chain(std::iter::once(&target))
                    .map(|p| display_name(p))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DuskError::ShaderIncludeCycle {
                    path: path.to_path_buf(),
                    line: line_number,
                    chain,
                });
            }

            if self.visited.contains(&target) {
                let note = format!("// {} (already included)", line.trim());
                self.push_line(&note, origin);
                continue;
            }

            self.expand(&target, true)?;
            self.push_directive(line_number + 1, id);
        }

        self.stack.pop();
        Ok(())
    }
}

/// Argument of an `#include` directive, trimmed. The keyword must end at
/// whitespace, a quote or `<`, so `#includes` is ordinary text.
fn include_argument(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?;
    let directive = rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '"' || c == '<');
    directive.then(|| rest.trim())
}

/// Contents of the first `"..."` pair; `None` when unquoted or empty.
fn parse_quoted(text: &str) -> Option<&str> {
    let open = text.find('"')?;
    let close = text.rfind('"')?;
    if close <= open + 1 {
        return None;
    }
    Some(&text[open + 1..close])
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quoted_rejects_missing_or_empty_paths() {
        assert_eq!(parse_quoted("\"common.wgsl\""), Some("common.wgsl"));
        assert_eq!(parse_quoted("\"a/b.wgsl\" // trailing"), Some("a/b.wgsl"));
        assert_eq!(parse_quoted("common.wgsl"), None);
        assert_eq!(parse_quoted("\"common.wgsl"), None);
        assert_eq!(parse_quoted("\"\""), None);
    }

    #[test]
    fn include_keyword_must_stand_alone() {
        assert_eq!(include_argument("#include \"a.wgsl\""), Some("\"a.wgsl\""));
        assert_eq!(include_argument("  #include\t<lib>"), Some("<lib>"));
        assert_eq!(include_argument("#include\"a.wgsl\""), Some("\"a.wgsl\""));
        assert_eq!(include_argument("#include"), Some(""));
        assert_eq!(include_argument("#includeX \"a.wgsl\""), None);
        assert_eq!(include_argument("#include_once"), None);
    }

    #[test]
    fn cited_line_reads_naga_locations() {
        assert_eq!(cited_line("   ┌─ wgsl:42:7"), Some(42));
        assert_eq!(cited_line("no location here"), None);
    }

    #[test]
    fn line_map_is_one_based() {
        let map = LineMap {
            lines: vec![
                None,
                Some(SourceLocation {
                    source_id: 0,
                    line: 1,
                }),
            ],
        };
        assert_eq!(map.resolve(0), None);
        assert_eq!(map.resolve(1), None);
        assert_eq!(map.resolve(2).map(|l| l.line), Some(1));
        assert_eq!(map.resolve(3), None);
    }
}
