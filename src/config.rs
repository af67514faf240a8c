use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::matcher::similarity::SimilarityMetric;
use crate::normalize::NormalizeOptions;

/// What to do when no source file is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPolicy {
    /// Write an output containing only the template header row.
    #[default]
    WriteTemplate,
    /// Fail the run with [`MergeError::NothingMerged`] and write nothing.
    Abort,
}

/// Settings for converting legacy spreadsheet formats through an office suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Lower-case extensions (without the dot) that require conversion.
    pub extensions: Vec<String>,
    /// Converter executable, invoked as `<program> --headless --convert-to xlsx`.
    pub program: String,
    /// Seconds to wait for one conversion before the converter is killed.
    pub timeout_secs: u64,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            extensions: ["et", "sxc", "wk1", "wks", "dif"]
                .into_iter()
                .map(String::from)
                .collect(),
            program: "soffice".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LegacyConfig {
    /// Whether `path` has one of the legacy extensions, ignoring case.
    pub fn is_legacy(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|candidate| *candidate == ext)
            })
            .unwrap_or(false)
    }
}

/// Tunables for one merge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Minimum number of resolved template columns for a file to be kept.
    pub min_matches: usize,
    /// Minimum similarity (0 to 1) for a fuzzy header match.
    pub fuzzy_threshold: f64,
    /// Score a header that contains the template name, or is contained in it, as 1.0.
    pub fuzzy_containment: bool,
    /// Similarity score used by the fuzzy pass.
    pub metric: SimilarityMetric,
    /// Header normalization applied before any comparison.
    pub normalize: NormalizeOptions,
    /// Separators splitting one mapping cell into several aliases.
    pub alias_delimiters: Vec<char>,
    /// Skip the first row of the mapping file.
    pub mapping_has_header: bool,
    /// Value written into template columns a source file does not provide.
    pub empty_value: String,
    /// Leading rows of each source scanned for the header row.
    pub header_probe_rows: usize,
    /// Drop data rows whose cells are all blank.
    pub skip_blank_rows: bool,
    /// Resolve and project source files on a worker pool.
    pub parallel: bool,
    /// Behaviour when no source file is accepted.
    pub on_empty: EmptyPolicy,
    /// Conversion of legacy formats before reading.
    pub legacy: LegacyConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_matches: 1,
            fuzzy_threshold: 0.6,
            fuzzy_containment: true,
            metric: SimilarityMetric::default(),
            normalize: NormalizeOptions::default(),
            alias_delimiters: vec!['|', '｜', ';', '；'],
            mapping_has_header: true,
            empty_value: String::new(),
            header_probe_rows: 1,
            skip_blank_rows: true,
            parallel: false,
            on_empty: EmptyPolicy::default(),
            legacy: LegacyConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| MergeError::config(path, err))?;
        let config: MergeConfig =
            serde_json::from_str(&data).map_err(|err| MergeError::config(path, err))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects out-of-range values with [`MergeError::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(MergeError::InvalidConfig(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.header_probe_rows == 0 {
            return Err(MergeError::InvalidConfig(
                "header_probe_rows must be at least 1".to_string(),
            ));
        }
        if self.legacy.timeout_secs == 0 {
            return Err(MergeError::InvalidConfig(
                "legacy.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
