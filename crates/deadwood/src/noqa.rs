//! Noqa index: `(file, line) → set of suppression codes`.
//!
//! Recognizes trailing `# noqa`, `# noqa: CODE[,CODE…]`, `# type: ignore`,
//! plus any extra markers from `linting.noqa_patterns`. A bare marker
//! records the `ALL` sentinel. The scan is byte-level and does not tokenize
//! strings; a marker inside a string literal is treated as live, which only
//! ever suppresses more.

use crate::EngineError;
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::{BTreeSet, HashMap};

/// Sentinel stored for markers without explicit codes.
pub const ALL: &str = "ALL";

#[derive(Debug, Clone, Copy)]
enum Marker {
    /// `# noqa`, optionally followed by `: CODE[,CODE…]`.
    Noqa,
    /// Marker that always records `ALL` (`# type: ignore`, user patterns).
    Blanket,
}

/// Compiled multi-marker scanner, one per analysis run.
pub struct NoqaScanner {
    ac: AhoCorasick,
    markers: Vec<Marker>,
}

impl NoqaScanner {
    pub fn new(extra_patterns: &[String]) -> Result<Self, EngineError> {
        let mut patterns: Vec<String> = vec!["# noqa".into(), "# type: ignore".into()];
        let mut markers = vec![Marker::Noqa, Marker::Blanket];
        for pattern in extra_patterns {
            patterns.push(pattern.clone());
            markers.push(Marker::Blanket);
        }
        let ac = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(&patterns)
            .map_err(|e| EngineError::Config(format!("linting.noqa_patterns: {e}")))?;
        Ok(Self { ac, markers })
    }

    /// Scans one line; `None` when the line carries no suppression.
    fn scan_line(&self, line: &str) -> Option<BTreeSet<String>> {
        let mut codes = BTreeSet::new();
        let mut hit = false;
        for mat in self.ac.find_iter(line) {
            hit = true;
            match self.markers[mat.pattern().as_usize()] {
                Marker::Blanket => {
                    codes.insert(ALL.to_string());
                }
                Marker::Noqa => {
                    let rest = line[mat.end()..].trim_start();
                    if let Some(list) = rest.strip_prefix(':') {
                        let mut any = false;
                        for token in list
                            .split(|c: char| c == ',' || c.is_whitespace())
                            .filter(|t| !t.is_empty())
                        {
                            if token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                            {
                                codes.insert(token.to_string());
                                any = true;
                            } else {
                                break;
                            }
                        }
                        if !any {
                            codes.insert(ALL.to_string());
                        }
                    } else {
                        codes.insert(ALL.to_string());
                    }
                }
            }
        }
        if hit {
            Some(codes)
        } else {
            None
        }
    }
}

/// Per-run suppression table consulted by the scorer.
#[derive(Debug, Default)]
pub struct NoqaIndex {
    map: HashMap<(String, u32), BTreeSet<String>>,
}

impl NoqaIndex {
    /// Scans every line of one file into the index.
    pub fn scan_file(&mut self, scanner: &NoqaScanner, rel_path: &str, source: &[u8]) {
        for (idx, raw_line) in source.split(|&b| b == b'\n').enumerate() {
            if !raw_line.contains(&b'#') {
                continue;
            }
            let line = String::from_utf8_lossy(raw_line);
            if let Some(codes) = scanner.scan_line(&line) {
                self.map
                    .insert((rel_path.to_string(), idx as u32 + 1), codes);
            }
        }
    }

    /// Suppression codes in effect at `(file, line)`.
    pub fn codes(&self, file: &str, line: u32) -> Option<&BTreeSet<String>> {
        self.map.get(&(file.to_string(), line))
    }

    /// Folds another index into this one (parallel per-file scans).
    pub fn merge(&mut self, other: NoqaIndex) {
        self.map.extend(other.map);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
