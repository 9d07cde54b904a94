//! Read-only scan of the category stores.
//!
//! Progress is never cached: other contributors append to the same stores,
//! so every query re-reads the files. A store that cannot be read counts as
//! zero samples and leaves a [`ScanDiagnostic`] behind instead of failing the
//! whole scan.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::Category;

use super::layout::CONTRIBUTOR_COLUMN;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// No file yet; zero samples.
    Missing,
    Readable,
    /// Could not be read or parsed; counted as zero.
    Unreadable,
}

/// A store that could not be counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDiagnostic {
    pub category: Category,
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreScan {
    pub category: Category,
    pub status: StoreStatus,
    pub total: u64,
    pub by_contributor: BTreeMap<String, u64>,
}

impl StoreScan {
    fn empty(category: Category, status: StoreStatus) -> Self {
        Self {
            category,
            status,
            total: 0,
            by_contributor: BTreeMap::new(),
        }
    }

    pub fn count_for(&self, contributor: &str) -> u64 {
        self.by_contributor.get(contributor).copied().unwrap_or(0)
    }
}

/// Counts for every store at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSnapshot {
    /// One entry per category, in canonical order.
    pub stores: Vec<StoreScan>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// One category's counts from a single contributor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub contributor_count: u64,
    pub project_total: u64,
    pub status: StoreStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorProgress {
    pub contributor: String,
    /// Canonical category order.
    pub categories: Vec<CategoryCount>,
    pub contributor_total: u64,
    pub project_total: u64,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ContributorProgress {
    pub fn count_for(&self, category: Category) -> u64 {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.contributor_count)
            .unwrap_or(0)
    }
}

/// Scan the stores and summarise them for `contributor`.
pub fn progress(dataset_dir: &Path, contributor: &str) -> ContributorProgress {
    DatasetSnapshot::scan(dataset_dir).progress_for(contributor)
}

impl DatasetSnapshot {
    pub fn scan(dataset_dir: &Path) -> Self {
        let mut stores = Vec::with_capacity(Category::COUNT);
        let mut diagnostics = Vec::new();

        for category in Category::ALL {
            let path = dataset_dir.join(category.store_file_name());
            if !path.exists() {
                stores.push(StoreScan::empty(category, StoreStatus::Missing));
                continue;
            }

            match count_store(&path) {
                Ok(by_contributor) => {
                    let total = by_contributor.values().sum();
                    stores.push(StoreScan {
                        category,
                        status: StoreStatus::Readable,
                        total,
                        by_contributor,
                    });
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    log_warn!("skipping unreadable store {}: {message}", path.display());
                    diagnostics.push(ScanDiagnostic {
                        category,
                        path,
                        message,
                    });
                    stores.push(StoreScan::empty(category, StoreStatus::Unreadable));
                }
            }
        }

        Self {
            stores,
            diagnostics,
        }
    }

    pub fn store(&self, category: Category) -> Option<&StoreScan> {
        self.stores.iter().find(|s| s.category == category)
    }

    pub fn project_total(&self) -> u64 {
        self.stores.iter().map(|s| s.total).sum()
    }

    /// Total samples per contributor across all categories.
    pub fn contributor_totals(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for store in &self.stores {
            for (contributor, count) in &store.by_contributor {
                *totals.entry(contributor.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    /// Contributor × category counts, columns in canonical category order.
    pub fn matrix(&self) -> BTreeMap<String, [u64; Category::COUNT]> {
        let mut matrix: BTreeMap<String, [u64; Category::COUNT]> = BTreeMap::new();
        for store in &self.stores {
            for (contributor, count) in &store.by_contributor {
                matrix
                    .entry(contributor.clone())
                    .or_insert([0; Category::COUNT])[store.category.index()] = *count;
            }
        }
        matrix
    }

    pub fn progress_for(&self, contributor: &str) -> ContributorProgress {
        let categories: Vec<CategoryCount> = self
            .stores
            .iter()
            .map(|store| CategoryCount {
                category: store.category,
                contributor_count: store.count_for(contributor),
                project_total: store.total,
                status: store.status,
            })
            .collect();

        ContributorProgress {
            contributor: contributor.to_string(),
            contributor_total: categories.iter().map(|c| c.contributor_count).sum(),
            project_total: self.project_total(),
            categories,
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Rows per contributor in one store. Any parse problem fails the whole
/// store so its per-contributor counts always sum to its row count.
fn count_store(path: &Path) -> Result<BTreeMap<String, u64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let contributor_index = reader
        .headers()
        .context("failed to read header")?
        .iter()
        .position(|column| column == CONTRIBUTOR_COLUMN)
        .ok_or_else(|| anyhow!("no '{CONTRIBUTOR_COLUMN}' column"))?;

    let mut counts = BTreeMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad row {}", line + 2))?;
        let contributor = record
            .get(contributor_index)
            .ok_or_else(|| anyhow!("row {} has no contributor field", line + 2))?;
        *counts.entry(contributor.to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}
