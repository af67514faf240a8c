//! Loading of the optional header-mapping table.
//!
//! The mapping file has two columns: a template header and one source header
//! alias (or several, joined by one of the configured delimiters). Aliases for
//! the same template header accumulate across rows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use crate::io::excel_read;
use crate::model::{CellValue, TemplateSchema};
use crate::normalize::NormalizeOptions;

/// Normalized template header → normalized source header aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAliasMap {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl HeaderAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `alias` to the entry for `template_header`, normalizing both.
    ///
    /// Returns false when either side normalizes to an empty string.
    pub fn insert(&mut self, template_header: &str, alias: &str, options: &NormalizeOptions) -> bool {
        let key = options.apply(template_header);
        let alias = options.apply(alias);
        if key.is_empty() || alias.is_empty() {
            return false;
        }
        self.entries.entry(key).or_default().insert(alias);
        true
    }

    /// Aliases registered for an already-normalized template header.
    pub fn aliases(&self, normalized_template: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(normalized_template)
    }

    /// Iterates the normalized template headers that have aliases.
    pub fn template_headers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every normalized alias across all entries.
    pub fn all_aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.values().flatten().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the map from already-read table rows.
    ///
    /// Rows without a usable template header or alias are skipped with a
    /// warning rather than failing the whole load.
    pub fn from_rows(rows: &[Vec<String>], config: &MergeConfig) -> Self {
        let mut map = HeaderAliasMap::new();
        let skip = usize::from(config.mapping_has_header);

        for (row_idx, row) in rows.iter().enumerate().skip(skip) {
            let line = row_idx + 1;
            let template = row.first().map(String::as_str).unwrap_or_default();
            let alias_cell = row.get(1).map(String::as_str).unwrap_or_default();

            if row.iter().all(|cell| cell.trim().is_empty()) {
                debug!(line, "skipping blank mapping row");
                continue;
            }
            if config.normalize.apply(template).is_empty() {
                warn!(line, alias = alias_cell, "mapping row has no template header; skipped");
                continue;
            }

            let mut added = 0usize;
            for alias in alias_cell.split(config.alias_delimiters.as_slice()) {
                if map.insert(template, alias, &config.normalize) {
                    added += 1;
                }
            }
            if added == 0 {
                warn!(line, template, "mapping row has no source alias; skipped");
            }
        }

        map
    }

    /// Warns about entries that name a column the template does not have.
    pub fn report_unknown(&self, schema: &TemplateSchema, options: &NormalizeOptions) {
        let known: BTreeSet<String> = schema.columns().iter().map(|c| options.apply(c)).collect();
        for key in self.template_headers().filter(|key| !known.contains(*key)) {
            warn!(template = key, "mapping entry names a column missing from the template");
        }
    }
}

/// Reads the mapping table at `path`.
///
/// An unreadable file, or one that never has a second column, is a fatal
/// configuration error.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_alias_map(path: &Path, config: &MergeConfig) -> Result<HeaderAliasMap> {
    let grid = excel_read::read_grid(path).map_err(|err| MergeError::config(path, err))?;
    let rows: Vec<Vec<String>> = grid
        .iter()
        .map(|row| row.iter().map(CellValue::to_string).collect())
        .collect();

    if !rows.is_empty() && rows.iter().all(|row| row.len() < 2) {
        return Err(MergeError::config(
            path,
            "mapping file needs two columns: template header | source header",
        ));
    }

    let map = HeaderAliasMap::from_rows(&rows, config);
    if map.is_empty() {
        warn!("mapping file contains no usable entries; relying on header matching alone");
    }
    info!(entries = map.len(), aliases = map.all_aliases().count(), "loaded header mapping");
    Ok(map)
}
