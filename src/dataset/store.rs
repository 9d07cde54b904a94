use anyhow::{anyhow, bail, Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::models::Category;

use super::layout::{self, Sample, COLUMN_COUNT};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Append-only CSV store holding every sample of one category.
///
/// Several collector processes may append to the same store. Creation is an
/// atomic no-clobber rename of a fully written header, and each row goes out
/// in a single `write_all` on an append-mode handle, so rows never interleave
/// and no existing byte is ever rewritten.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    category: Category,
    path: PathBuf,
}

impl CategoryStore {
    pub fn new(dataset_dir: &Path, category: Category) -> Self {
        Self {
            category,
            path: dataset_dir.join(category.store_file_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Check that an existing store uses the current column layout. A store
    /// that does not exist yet trivially conforms.
    pub fn verify_schema(&self) -> Result<()> {
        if !self.exists() {
            return Ok(());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open store {}", self.path.display()))?;
        let found = reader
            .headers()
            .with_context(|| format!("failed to read header of {}", self.path.display()))?;

        if found.len() != COLUMN_COUNT {
            bail!(
                "store {} has {} columns, expected {}",
                self.path.display(),
                found.len(),
                COLUMN_COUNT
            );
        }
        let expected = layout::header();
        if let Some((i, (have, want))) = found
            .iter()
            .zip(expected.iter().map(String::as_str))
            .enumerate()
            .find(|(_, (have, want))| have != want)
        {
            bail!(
                "store {} column {} is '{}', expected '{}'",
                self.path.display(),
                i + 1,
                have,
                want
            );
        }
        Ok(())
    }

    /// Create the store with its header unless it already exists. Returns
    /// `true` when this call created it.
    pub fn ensure_created(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }

        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("store path {} has no parent", self.path.display()))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create dataset directory {}", dir.display()))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".store-")
            .suffix(".csv.tmp")
            .tempfile_in(dir)
            .context("failed to stage store header")?;
        staged
            .write_all(&encode_record(&layout::header())?)
            .context("failed to write store header")?;
        staged.as_file().sync_all().context("failed to sync store header")?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {
                log_info!(
                    "created store {} ({} columns)",
                    self.path.display(),
                    COLUMN_COUNT
                );
                Ok(true)
            }
            // Another collector won the race; its header is identical.
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(anyhow::Error::new(err.error)
                .context(format!("failed to create store {}", self.path.display()))),
        }
    }

    /// Append one sample, creating the store on first use.
    pub fn append(&self, sample: &Sample) -> Result<()> {
        if sample.category != self.category {
            bail!(
                "sample for {} cannot be written to the {} store",
                sample.category,
                self.category
            );
        }
        let record = sample.to_record();
        if record.len() != COLUMN_COUNT {
            bail!(
                "encoded row has {} fields, expected {}",
                record.len(),
                COLUMN_COUNT
            );
        }
        let bytes = encode_record(&record)?;

        self.ensure_created()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {} for append", self.path.display()))?;
        file.write_all(&bytes)
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

/// Serialize one CSV record, terminator included, into a single buffer.
fn encode_record(fields: &[String]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(fields.len() * 12));
    writer.write_record(fields).context("failed to encode row")?;
    writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush encoded row: {}", err.error()))
}
