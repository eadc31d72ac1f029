//! Backend descriptor store.
//!
//! # Responsibilities
//! - Read descriptors from the configured source (flat file, inline lines, live directory)
//! - Build a fresh `RoutingTable` on demand
//!
//! # Design Decisions
//! - One bad descriptor never aborts the rest; it is logged and skipped
//! - An unreadable source fails the whole build so a reload leaves the
//!   previous snapshot in place
//! - The store never publishes; callers decide what to do with the table

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::descriptor::{self, BackendDescriptor, DESCRIPTOR_FILES};
use crate::config::schema::ServicesConfig;
use crate::routing::RoutingTable;

/// Where descriptors are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSource {
    /// Flat file, one descriptor line each.
    File(PathBuf),
    /// Inline flat lines from the main config.
    Inline(Vec<String>),
    /// One descriptor document per subdirectory.
    LiveDir(PathBuf),
}

impl ServiceSource {
    /// Pick the configured source. Validation guarantees exactly one is set;
    /// the file wins if that was bypassed.
    pub fn from_config(services: &ServicesConfig) -> Self {
        if let Some(file) = &services.file {
            ServiceSource::File(file.clone())
        } else if let Some(dir) = &services.live_dir {
            ServiceSource::LiveDir(dir.clone())
        } else {
            ServiceSource::Inline(services.entries.clone())
        }
    }

    /// Filesystem path to watch for changes, if any.
    pub fn watch_path(&self) -> Option<&Path> {
        match self {
            ServiceSource::File(path) | ServiceSource::LiveDir(path) => Some(path),
            ServiceSource::Inline(_) => None,
        }
    }
}

/// The descriptor source as a whole could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("service source {path:?} unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces routing tables from durable configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    source: ServiceSource,
}

impl ConfigStore {
    pub fn new(source: ServiceSource) -> Self {
        Self { source }
    }

    pub fn from_config(services: &ServicesConfig) -> Self {
        Self::new(ServiceSource::from_config(services))
    }

    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    /// Read every descriptor and build a table from the ones that parse.
    pub fn build_routing_table(&self) -> Result<RoutingTable, SourceError> {
        let descriptors = match &self.source {
            ServiceSource::File(path) => {
                let content = fs::read_to_string(path).map_err(|source| SourceError::Unreadable {
                    path: path.clone(),
                    source,
                })?;
                parse_lines(content.lines(), &path.display().to_string())
            }
            ServiceSource::Inline(lines) => parse_lines(lines.iter().map(String::as_str), "inline"),
            ServiceSource::LiveDir(dir) => scan_live_dir(dir)?,
        };

        let table = RoutingTable::from_descriptors(descriptors);
        tracing::debug!(backends = table.backends().len(), hosts = table.len(), "Routing table built");
        Ok(table)
    }

    /// Re-read the source into a brand-new table.
    pub fn reload(&self) -> Result<RoutingTable, SourceError> {
        tracing::info!(source = ?self.source, "Reloading service descriptors");
        self.build_routing_table()
    }
}

fn parse_lines<'a, I>(lines: I, origin: &str) -> Vec<BackendDescriptor>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !descriptor::is_skippable(line))
        .filter_map(|(index, line)| match descriptor::parse_line(line) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!(origin, line = index + 1, error = %e, "Skipping malformed service line");
                None
            }
        })
        .collect()
}

fn scan_live_dir(dir: &Path) -> Result<Vec<BackendDescriptor>, SourceError> {
    let unreadable = |source| SourceError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(unreadable)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::warn!(dir = ?dir, error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_dir())
        .collect();
    // Stable order keeps duplicate resolution deterministic.
    subdirs.sort();

    let mut descriptors = Vec::with_capacity(subdirs.len());
    for subdir in subdirs {
        let Some(file) = DESCRIPTOR_FILES
            .iter()
            .map(|name| subdir.join(name))
            .find(|candidate| candidate.is_file())
        else {
            tracing::debug!(dir = ?subdir, "No service descriptor, skipping");
            continue;
        };

        match descriptor::read_document(&file) {
            Ok(d) => descriptors.push(d),
            Err(e) => tracing::warn!(error = %e, "Skipping invalid service descriptor"),
        }
    }
    Ok(descriptors)
}
