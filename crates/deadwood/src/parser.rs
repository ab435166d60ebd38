//! Tree-sitter parser host for Python sources.
//!
//! Wraps a configured `tree_sitter::Parser` and the per-file read path
//! (memory-mapped, with a u32 byte-range guard). Parse failures never abort
//! an analysis run; callers translate [`FileError`] into diagnostics.

use crate::EngineError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tree_sitter::{Parser, Tree};

/// Per-file failure modes. All of them skip the file and continue the run.
#[derive(Debug)]
pub enum FileError {
    /// File could not be opened or mapped.
    Io(std::io::Error),
    /// File exceeds the u32 byte range tree-sitter can address.
    TooLarge,
    /// Tree-sitter returned no tree at all.
    ParseFailed,
    /// The tree contains syntax errors; the file is excluded from the graph.
    SyntaxErrors,
    /// Parsing exceeded the configured per-file budget.
    Timeout { elapsed_ms: u64, budget_ms: u64 },
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Io(e)
    }
}

/// Owns one tree-sitter parser configured for Python.
///
/// One host per worker thread; the host itself is cheap, the compiled
/// grammar is shared process-wide by tree-sitter.
pub struct ParserHost {
    parser: Parser,
    /// Per-file parse budget in milliseconds; `None` = unbounded.
    budget_ms: Option<u64>,
}

impl ParserHost {
    /// Creates a host with the Python grammar loaded.
    pub fn new() -> Result<Self, EngineError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| EngineError::Parser(format!("failed to load Python grammar: {e}")))?;
        Ok(Self {
            parser,
            budget_ms: None,
        })
    }

    /// Sets the per-file parse budget.
    pub fn with_budget_ms(mut self, budget_ms: Option<u64>) -> Self {
        self.budget_ms = budget_ms;
        self
    }

    /// Parses a byte buffer into a CST.
    ///
    /// A tree with recovery errors counts as [`FileError::SyntaxErrors`]:
    /// its symbols and usages must stay out of the graph (§7), so the file
    /// is dropped wholesale rather than half-collected.
    pub fn parse(&mut self, source: &[u8]) -> Result<Tree, FileError> {
        let started = Instant::now();
        let tree = self.parser.parse(source, None).ok_or(FileError::ParseFailed)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Some(budget_ms) = self.budget_ms {
            if elapsed_ms > budget_ms {
                return Err(FileError::Timeout {
                    elapsed_ms,
                    budget_ms,
                });
            }
        }
        if tree.root_node().has_error() {
            return Err(FileError::SyntaxErrors);
        }
        Ok(tree)
    }
}

/// A read-only, memory-mapped source buffer.
///
/// Empty files cannot be mapped; they are held inline instead.
pub enum SourceBuffer {
    Mapped(Mmap),
    Empty,
}

impl SourceBuffer {
    pub fn bytes(&self) -> &[u8] {
        match self {
            SourceBuffer::Mapped(mmap) => &mmap[..],
            SourceBuffer::Empty => b"",
        }
    }
}

/// Opens and maps a source file, enforcing the 4 GB byte-range limit.
pub fn read_source(path: &Path) -> Result<SourceBuffer, FileError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len > u32::MAX as u64 {
        return Err(FileError::TooLarge);
    }
    if len == 0 {
        return Ok(SourceBuffer::Empty);
    }
    // SAFETY: read-only map; the file handle does not outlive the mmap use.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(SourceBuffer::Mapped(mmap))
}
