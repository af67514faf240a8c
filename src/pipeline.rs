use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::alias::{self, HeaderAliasMap};
use crate::config::{EmptyPolicy, MergeConfig};
use crate::error::{MergeError, Result};
use crate::gate;
use crate::io::convert::LegacyConverter;
use crate::io::excel_read::{self, header_text};
use crate::io::excel_write;
use crate::matcher::HeaderMatcher;
use crate::merge::{MergeAccumulator, project_rows};
use crate::model::{CellValue, MergeResult, SourceFile, TemplateSchema};

const OUTPUT_SUFFIX: &str = "_filled";

/// Inputs of one merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    pub template: PathBuf,
    pub mapping: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    /// Output path. Defaults to [`output_path_for`] applied to the template.
    pub output: Option<PathBuf>,
}

/// A finished run: where the output went and what happened to each file.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output: PathBuf,
    pub result: MergeResult,
}

/// Runs the whole pipeline and writes the merged output.
///
/// Only an unusable template, mapping file, or configuration, and a failed
/// final write, abort the run. Per-file problems become rejections. When the
/// output is not written, [`MergeError::Unwritten`] still carries the report.
#[instrument(level = "info", skip_all, fields(template = %request.template.display(), sources = request.sources.len()))]
pub fn run(request: &MergeRequest, config: &MergeConfig) -> Result<MergeReport> {
    config.validate()?;
    let session = MergeSession::open(&request.template, request.mapping.as_deref(), config.clone())?;
    let result = session.process(&request.sources);

    let summary = result.summary();
    info!(accepted = summary.accepted, rejected = summary.rejected, rows = summary.rows, "merge complete");

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| output_path_for(&request.template));
    let report = MergeReport { output, result };

    if summary.accepted == 0 {
        match config.on_empty {
            EmptyPolicy::Abort => return Err(MergeError::unwritten(report, MergeError::NothingMerged)),
            EmptyPolicy::WriteTemplate => warn!("no source file accepted; writing template header only"),
        }
    }

    if let Err(err) = excel_write::write_result(&report.output, &report.result) {
        return Err(MergeError::unwritten(report, err));
    }
    info!(output = %report.output.display(), "wrote merged output");

    Ok(report)
}

/// `<dir>/<stem>_filled.xlsx` next to `base`; a `.csv` base keeps `.csv`.
pub fn output_path_for(base: &Path) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string());
    let ext = match excel_read::extension(base).as_deref() {
        Some("csv") => "csv",
        _ => "xlsx",
    };
    base.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{ext}"))
}

/// Reads the template header row. Trailing blank header cells are dropped.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_template(path: &Path, config: &MergeConfig) -> Result<TemplateSchema> {
    let grid = excel_read::read_grid(path).map_err(|err| MergeError::config(path, err))?;
    let mut columns: Vec<String> = grid
        .first()
        .map(|row| row.iter().map(header_text).collect())
        .unwrap_or_default();

    while columns.last().is_some_and(|column| column.is_empty()) {
        columns.pop();
    }
    if columns.is_empty() {
        return Err(MergeError::config(path, "template has no header row"));
    }

    let blank = columns
        .iter()
        .filter(|column| config.normalize.apply(column).is_empty())
        .count();
    if blank > 0 {
        warn!(blank, "template has blank column headers; they only receive empty values");
    }

    info!(columns = ?columns, "loaded template");
    Ok(TemplateSchema::new(columns))
}

/// Template, alias map, and configuration shared read-only by every source
/// file of one run.
#[derive(Debug)]
pub struct MergeSession {
    schema: TemplateSchema,
    aliases: HeaderAliasMap,
    config: MergeConfig,
}

struct ProjectedFile {
    matched: usize,
    missing: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl MergeSession {
    pub fn new(schema: TemplateSchema, aliases: HeaderAliasMap, config: MergeConfig) -> Self {
        Self {
            schema,
            aliases,
            config,
        }
    }

    /// Loads the template and the optional mapping file.
    pub fn open(template: &Path, mapping: Option<&Path>, config: MergeConfig) -> Result<Self> {
        let schema = load_template(template, &config)?;
        let aliases = match mapping {
            Some(path) => alias::load_alias_map(path, &config)?,
            None => HeaderAliasMap::new(),
        };
        aliases.report_unknown(&schema, &config.normalize);
        Ok(Self::new(schema, aliases, config))
    }

    pub fn schema(&self) -> &TemplateSchema {
        &self.schema
    }

    pub fn aliases(&self) -> &HeaderAliasMap {
        &self.aliases
    }

    /// Processes `sources` and returns the merged rows in input order.
    ///
    /// With `parallel` set, files are resolved and projected on the rayon
    /// pool; the results are still appended in input order.
    pub fn process(&self, sources: &[PathBuf]) -> MergeResult {
        let matcher = HeaderMatcher::new(&self.schema, &self.aliases, &self.config);
        let scratch_dir = self.scratch_dir(sources);
        let scratch = scratch_dir.as_ref().map(TempDir::path);

        let processed: Vec<Result<ProjectedFile>> = if self.config.parallel {
            sources
                .par_iter()
                .enumerate()
                .map(|(index, path)| self.process_source(&matcher, index, path, scratch))
                .collect()
        } else {
            sources
                .iter()
                .enumerate()
                .map(|(index, path)| self.process_source(&matcher, index, path, scratch))
                .collect()
        };

        let mut accumulator = MergeAccumulator::new(&self.schema);
        for (path, outcome) in sources.iter().zip(processed) {
            match outcome {
                Ok(file) => accumulator.append(path.clone(), file.matched, file.missing, file.rows),
                Err(err) => {
                    warn!(path = %path.display(), reason = %err, "skipping source file");
                    accumulator.reject(path.clone(), &err);
                }
            }
        }

        debug!(rows = accumulator.row_count(), "accumulated rows");
        accumulator.finish()
    }

    /// Reads one source file and locates its header row.
    pub fn load_source(&self, matcher: &HeaderMatcher<'_>, path: &Path, scratch: Option<&Path>) -> Result<SourceFile> {
        let readable = if self.config.legacy.is_legacy(path) {
            let out_dir = scratch.ok_or_else(|| MergeError::Conversion {
                path: path.to_path_buf(),
                reason: "no scratch directory for converted files".to_string(),
            })?;
            fs::create_dir_all(out_dir).map_err(|err| MergeError::Conversion {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
            LegacyConverter::from_config(&self.config.legacy).convert(path, out_dir)?
        } else {
            path.to_path_buf()
        };

        let grid = excel_read::read_grid(&readable).map_err(|err| MergeError::file_load(path, err))?;

        let probe: Vec<Vec<String>> = grid
            .iter()
            .take(self.config.header_probe_rows)
            .map(|row| row.iter().map(header_text).collect())
            .collect();
        let header_row = matcher.detect_header_row(&probe, self.config.header_probe_rows);
        let headers = probe.get(header_row).cloned().unwrap_or_default();

        let rows = grid
            .into_iter()
            .skip(header_row + 1)
            .filter(|row| !(self.config.skip_blank_rows && row.iter().all(CellValue::is_blank)))
            .collect();

        debug!(header_row, headers = ?headers, "loaded source");
        Ok(SourceFile {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    #[instrument(level = "info", skip(self, matcher, path, scratch), fields(path = %path.display()))]
    fn process_source(
        &self,
        matcher: &HeaderMatcher<'_>,
        index: usize,
        path: &Path,
        scratch: Option<&Path>,
    ) -> Result<ProjectedFile> {
        let file_scratch = scratch.map(|dir| dir.join(index.to_string()));
        let source = self.load_source(matcher, path, file_scratch.as_deref())?;

        let resolution = matcher.resolve(&source.headers);
        let matched = gate::accept(&resolution, self.config.min_matches).into_result()?;

        let missing: Vec<String> = resolution
            .unresolved()
            .map(|idx| self.schema.columns()[idx].clone())
            .collect();
        info!(matched, missing = missing.len(), "resolved header row");
        if !missing.is_empty() {
            warn!(columns = ?missing, "template columns missing from source");
        }

        let empty = CellValue::text(self.config.empty_value.clone());
        let rows = project_rows(&resolution, &source.rows, &empty);
        Ok(ProjectedFile { matched, missing, rows })
    }

    fn scratch_dir(&self, sources: &[PathBuf]) -> Option<TempDir> {
        if !sources.iter().any(|path| self.config.legacy.is_legacy(path)) {
            return None;
        }
        match tempfile::tempdir() {
            Ok(dir) => Some(dir),
            Err(err) => {
                warn!(%err, "could not create scratch directory for legacy conversion");
                None
            }
        }
    }
}
