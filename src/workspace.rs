//! Stage sequencing over a staging store.
//!
//! A [`Workspace`] runs one pipeline stage per call and hands results to the
//! next stage through a [`DocumentStore`]: upload stages the raw text, clean
//! stages the cleaned table as JSON, dashboard and download read it back.
//! Nothing is written to the store until a stage has fully succeeded.

use std::{fmt, path::Path};

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    charts::{self, ChartSet},
    clean::{self, Cleaned},
    export::{self, Quoting},
    inference::InferenceMode,
    model::Table,
    stats::{self, DataStats},
    store::{ALL_KEYS, CLEANED_FILE_KEY, DocumentStore, FILE_NAME_KEY, INFERENCE_KEY, RAW_FILE_KEY},
    tokenizer::Tokenizer,
};

pub const UPLOAD_PREVIEW_ROWS: usize = 5;
pub const CLEAN_PREVIEW_ROWS: usize = 10;

/// Extensions accepted at upload. Spreadsheet files must already have been
/// converted to delimited text.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "xls", "xlsx"];

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspaceOptions {
    /// Applied at upload and remembered for every later stage.
    pub inference: InferenceMode,
    pub quoting: Quoting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Clean,
    Dashboard,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Upload => "upload",
            Stage::Clean => "clean",
            Stage::Dashboard => "dashboard",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardSource {
    #[default]
    Cleaned,
    Original,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub table: Table,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub original: Table,
    pub cleaned: Cleaned,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub stats: DataStats,
    pub charts: ChartSet,
}

pub struct Workspace<S: DocumentStore> {
    store: S,
    options: WorkspaceOptions,
}

impl<S: DocumentStore> Workspace<S> {
    pub fn new(store: S, options: WorkspaceOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mode recorded by the last upload, else the configured one.
    pub fn inference_mode(&self) -> Result<InferenceMode> {
        match self.store.get(INFERENCE_KEY)? {
            Some(staged) => serde_json::from_str(&staged).context("Reading staged inference mode"),
            None => Ok(self.options.inference),
        }
    }

    /// Validates and stages an uploaded file. A new upload invalidates any
    /// previously cleaned table.
    pub fn upload(&mut self, file_name: &str, text: &str) -> Result<Upload> {
        ensure_accepted_extension(file_name)?;
        let mode = self.options.inference;
        let table = Tokenizer::new()
            .inference(mode)
            .try_parse(text)
            .with_context(|| format!("Failed to parse '{file_name}'. Please check the file format"))?;

        self.store.set(RAW_FILE_KEY, text)?;
        self.store.set(FILE_NAME_KEY, file_name)?;
        let serialized_mode =
            serde_json::to_string(&mode).context("Serializing inference mode")?;
        self.store.set(INFERENCE_KEY, &serialized_mode)?;
        self.store.clear(CLEANED_FILE_KEY)?;
        info!(
            "Uploaded '{}' with {} column(s) and {} row(s)",
            file_name,
            table.column_count(),
            table.row_count()
        );
        Ok(Upload {
            file_name: file_name.to_string(),
            table,
        })
    }

    pub fn file_name(&self) -> Result<Option<String>> {
        self.store.get(FILE_NAME_KEY)
    }

    /// Re-tokenizes the staged upload.
    pub fn original_table(&self) -> Result<Table> {
        let Some(raw) = self.store.get(RAW_FILE_KEY)? else {
            bail!("No uploaded file found. Please upload a file first");
        };
        Tokenizer::new()
            .inference(self.inference_mode()?)
            .try_parse(&raw)
            .context("Parsing staged upload")
    }

    pub fn clean(&mut self) -> Result<CleanOutcome> {
        let original = self.original_table()?;
        let cleaned = clean::clean(&original);
        let serialized =
            serde_json::to_string(&cleaned.table).context("Serializing cleaned table")?;
        self.store.set(CLEANED_FILE_KEY, &serialized)?;
        Ok(CleanOutcome { original, cleaned })
    }

    pub fn cleaned_table(&self) -> Result<Table> {
        let Some(staged) = self.store.get(CLEANED_FILE_KEY)? else {
            bail!("No cleaned data found. Please clean your data first");
        };
        serde_json::from_str(&staged).context("Reading staged cleaned table")
    }

    pub fn dashboard(&self, source: DashboardSource) -> Result<Dashboard> {
        let table = match source {
            DashboardSource::Cleaned => self.cleaned_table()?,
            DashboardSource::Original => self.original_table()?,
        };
        Ok(Dashboard {
            stats: stats::compute_stats(&table),
            charts: charts::compute_charts(&table),
        })
    }

    /// Delimited-text artifact of the cleaned table.
    pub fn download(&self) -> Result<String> {
        let table = self.cleaned_table()?;
        export::to_delimited_text(&table, self.options.quoting)
    }

    /// Stages a user may enter given what is currently staged.
    pub fn reachable_stages(&self) -> Result<Vec<Stage>> {
        let mut stages = vec![Stage::Upload];
        if self.store.contains(RAW_FILE_KEY)? {
            stages.push(Stage::Clean);
        }
        if self.store.contains(CLEANED_FILE_KEY)? {
            stages.push(Stage::Dashboard);
        }
        Ok(stages)
    }

    pub fn reset(&mut self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.clear(key)?;
        }
        info!("Cleared staged data");
        Ok(())
    }
}

fn ensure_accepted_extension(file_name: &str) -> Result<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => bail!("Please upload a CSV or Excel file (got '{file_name}')"),
    }
}
