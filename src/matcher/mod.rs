//! Resolution of a source header row against the template columns.
//!
//! Template columns are visited in order. Each one tries, in turn, an exact
//! alias hit, an exact hit on its own name, and finally the best fuzzy
//! candidate above the configured threshold. With containment enabled, a
//! header that contains the other one scores 1.0 in the fuzzy pass. A source column consumed by one
//! template column is never offered to another.

pub mod similarity;

use std::collections::BTreeSet;

use tracing::debug;

use crate::alias::HeaderAliasMap;
use crate::config::MergeConfig;
use crate::model::{ColumnResolution, TemplateSchema};
use crate::normalize::NormalizeOptions;
use similarity::SimilarityMetric;

/// How a template column found its source column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Alias,
    Exact,
    Fuzzy(f64),
}

/// Matches header rows against one template and alias map.
///
/// Normalized template names are computed once and reused for every source.
#[derive(Debug)]
pub struct HeaderMatcher<'a> {
    template: Vec<String>,
    aliases: &'a HeaderAliasMap,
    normalize: &'a NormalizeOptions,
    metric: SimilarityMetric,
    threshold: f64,
    containment: bool,
}

impl<'a> HeaderMatcher<'a> {
    pub fn new(schema: &TemplateSchema, aliases: &'a HeaderAliasMap, config: &'a MergeConfig) -> Self {
        let template = schema
            .columns()
            .iter()
            .map(|column| config.normalize.apply(column))
            .collect();
        Self {
            template,
            aliases,
            normalize: &config.normalize,
            metric: config.metric,
            threshold: config.fuzzy_threshold,
            containment: config.fuzzy_containment,
        }
    }

    /// Resolves every template column to at most one source column.
    pub fn resolve(&self, source_headers: &[String]) -> ColumnResolution {
        let headers: Vec<String> = source_headers
            .iter()
            .map(|header| self.normalize.apply(header))
            .collect();

        let mut consumed = BTreeSet::new();
        let mut slots = Vec::with_capacity(self.template.len());

        for name in &self.template {
            let hit = self.resolve_column(name, &headers, &consumed);
            if let Some((index, kind)) = hit {
                debug!(template = %name, source = %source_headers[index], ?kind, "resolved column");
                consumed.insert(index);
            }
            slots.push(hit.map(|(index, _)| index));
        }

        ColumnResolution::from_slots(slots)
    }

    fn resolve_column(
        &self,
        name: &str,
        headers: &[String],
        consumed: &BTreeSet<usize>,
    ) -> Option<(usize, MatchKind)> {
        self.alias_hit(name, headers, consumed)
            .map(|index| (index, MatchKind::Alias))
            .or_else(|| exact_hit(name, headers, consumed).map(|index| (index, MatchKind::Exact)))
            .or_else(|| {
                self.fuzzy_hit(name, headers, consumed)
                    .map(|(index, score)| (index, MatchKind::Fuzzy(score)))
            })
    }

    fn alias_hit(&self, name: &str, headers: &[String], consumed: &BTreeSet<usize>) -> Option<usize> {
        let aliases = self.aliases.aliases(name)?;
        available(headers, consumed)
            .find(|(_, header)| aliases.contains(*header))
            .map(|(index, _)| index)
    }

    /// Highest-scoring candidate at or above the threshold. Equal scores keep
    /// the leftmost column.
    fn fuzzy_hit(&self, name: &str, headers: &[String], consumed: &BTreeSet<usize>) -> Option<(usize, f64)> {
        if name.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (index, header) in available(headers, consumed) {
            let score = if self.containment && contains_either(name, header) {
                1.0
            } else {
                self.metric.score(name, header)
            };
            if score < self.threshold {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }
        best
    }

    /// Index of the first of the leading `probe_rows` rows that contains a
    /// template name or alias. Falls back to the first row.
    pub fn detect_header_row(&self, rows: &[Vec<String>], probe_rows: usize) -> usize {
        if probe_rows <= 1 {
            return 0;
        }
        let known: BTreeSet<&str> = self
            .template
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .chain(self.aliases.all_aliases())
            .collect();

        rows.iter()
            .take(probe_rows)
            .position(|row| {
                row.iter()
                    .any(|cell| known.contains(self.normalize.apply(cell).as_str()))
            })
            .unwrap_or(0)
    }
}

fn exact_hit(name: &str, headers: &[String], consumed: &BTreeSet<usize>) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    available(headers, consumed)
        .find(|(_, header)| *header == name)
        .map(|(index, _)| index)
}

fn contains_either(lhs: &str, rhs: &str) -> bool {
    lhs.contains(rhs) || rhs.contains(lhs)
}

/// Non-empty source headers not yet claimed, left to right.
fn available<'h>(
    headers: &'h [String],
    consumed: &'h BTreeSet<usize>,
) -> impl Iterator<Item = (usize, &'h str)> + 'h {
    headers
        .iter()
        .enumerate()
        .filter(move |(index, header)| !header.is_empty() && !consumed.contains(index))
        .map(|(index, header)| (index, header.as_str()))
}

/// Resolves `source_headers` against the template in one call.
pub fn resolve(
    schema: &TemplateSchema,
    aliases: &HeaderAliasMap,
    source_headers: &[String],
    config: &MergeConfig,
) -> ColumnResolution {
    HeaderMatcher::new(schema, aliases, config).resolve(source_headers)
}
