//! Result serializer: the deterministic candidate report.
//!
//! Items are ordered by (descending confidence, file, line, qualified name);
//! the JSON rendering is byte-identical across runs on the same input.

use crate::score::Scored;
use crate::{Diagnostic, Symbol};
use serde::Serialize;

/// Counts by confidence band plus run-level totals.
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    /// Items with confidence ≥ 80.
    pub high: usize,
    /// Items with confidence in 50–79.
    pub medium: usize,
    /// Items with confidence < 50.
    pub low: usize,
    pub total: usize,
    pub orphaned_files: usize,
}

/// One serialized candidate.
#[derive(Debug, Serialize)]
pub struct DeadCodeItem {
    pub qualified_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub file: String,
    pub line: u32,
    pub decorators: Vec<String>,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub suggested_action: &'static str,
}

/// The results document handed to external collaborators. Unknown fields
/// must be treated as opaque by consumers.
#[derive(Debug, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub items: Vec<DeadCodeItem>,
    /// Qualified names treated as reachable roots.
    pub entrypoints: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Assembles and orders the report.
    pub fn build(
        scored: Vec<(&Symbol, Scored)>,
        entrypoints: Vec<String>,
        orphaned_files: usize,
        diagnostics: Vec<Diagnostic>,
    ) -> Report {
        let mut items: Vec<DeadCodeItem> = scored
            .into_iter()
            .map(|(symbol, scored)| DeadCodeItem {
                qualified_name: symbol.qualified_name.clone(),
                name: symbol.name.clone(),
                item_type: symbol.kind.report_label(),
                file: symbol.location.file.clone(),
                line: symbol.location.line,
                decorators: symbol.decorators.clone(),
                confidence: scored.confidence,
                reasons: scored.reasons,
                suggested_action: scored.suggested_action,
            })
            .collect();

        items.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });

        let mut summary = Summary {
            total: items.len(),
            orphaned_files,
            ..Default::default()
        };
        for item in &items {
            match item.confidence {
                80.. => summary.high += 1,
                50..=79 => summary.medium += 1,
                _ => summary.low += 1,
            }
        }

        Report {
            summary,
            items,
            entrypoints,
            diagnostics,
        }
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Looks up an item by qualified name.
    pub fn item(&self, qualified_name: &str) -> Option<&DeadCodeItem> {
        self.items
            .iter()
            .find(|i| i.qualified_name == qualified_name)
    }
}
