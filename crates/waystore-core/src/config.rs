//! Storage configuration
//!
//! A publish cycle reads a fixed family of artifact files that share one
//! base path and differ only in their extension, e.g. `map.names`,
//! `map.edges`, `map.hsgr`. [`StorageConfig`] derives and hands out those
//! paths keyed by [`ArtifactKey`].

use std::path::{Path, PathBuf};

/// Key of one input artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKey {
    Names,
    FileIndex,
    RamIndex,
    Edges,
    EbgNodes,
    Geometry,
    Properties,
    Timestamp,
    NbgNodes,
    Tls,
    Tld,
    Icd,
    TurnWeightPenalties,
    TurnDurationPenalties,
    DatasourceNames,
    ManeuverOverrides,
    Hsgr,
    Partition,
    Cells,
    CellMetrics,
    Mldgr,
}

/// Artifacts every dataset must provide
pub const REQUIRED_ARTIFACTS: [ArtifactKey; 16] = [
    ArtifactKey::Names,
    ArtifactKey::FileIndex,
    ArtifactKey::RamIndex,
    ArtifactKey::Edges,
    ArtifactKey::EbgNodes,
    ArtifactKey::Geometry,
    ArtifactKey::Properties,
    ArtifactKey::Timestamp,
    ArtifactKey::NbgNodes,
    ArtifactKey::Tls,
    ArtifactKey::Tld,
    ArtifactKey::Icd,
    ArtifactKey::TurnWeightPenalties,
    ArtifactKey::TurnDurationPenalties,
    ArtifactKey::DatasourceNames,
    ArtifactKey::ManeuverOverrides,
];

/// Artifacts of optional features; absence yields zero-sized blocks
pub const OPTIONAL_ARTIFACTS: [ArtifactKey; 5] = [
    ArtifactKey::Hsgr,
    ArtifactKey::Partition,
    ArtifactKey::Cells,
    ArtifactKey::CellMetrics,
    ArtifactKey::Mldgr,
];

impl ArtifactKey {
    /// File extension appended to the dataset base path
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKey::Names => "names",
            ArtifactKey::FileIndex => "fileIndex",
            ArtifactKey::RamIndex => "ramIndex",
            ArtifactKey::Edges => "edges",
            ArtifactKey::EbgNodes => "ebg_nodes",
            ArtifactKey::Geometry => "geometry",
            ArtifactKey::Properties => "properties",
            ArtifactKey::Timestamp => "timestamp",
            ArtifactKey::NbgNodes => "nbg_nodes",
            ArtifactKey::Tls => "tls",
            ArtifactKey::Tld => "tld",
            ArtifactKey::Icd => "icd",
            ArtifactKey::TurnWeightPenalties => "turn_weight_penalties",
            ArtifactKey::TurnDurationPenalties => "turn_duration_penalties",
            ArtifactKey::DatasourceNames => "datasource_names",
            ArtifactKey::ManeuverOverrides => "maneuver_overrides",
            ArtifactKey::Hsgr => "hsgr",
            ArtifactKey::Partition => "partition",
            ArtifactKey::Cells => "cells",
            ArtifactKey::CellMetrics => "cell_metrics",
            ArtifactKey::Mldgr => "mldgr",
        }
    }
}

/// Bundle of artifact paths derived from one dataset base path
#[derive(Debug, Clone)]
pub struct StorageConfig {
    base: PathBuf,
}

impl StorageConfig {
    /// Configuration for the dataset rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The dataset base path
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of the artifact for `key`
    pub fn path(&self, key: ArtifactKey) -> PathBuf {
        let mut path = self.base.clone().into_os_string();
        path.push(".");
        path.push(key.extension());
        PathBuf::from(path)
    }

    /// Whether the optional artifact for `key` is present
    pub fn has(&self, key: ArtifactKey) -> bool {
        self.path(key).exists()
    }

    /// All required artifact paths exist
    pub fn is_valid(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// The required artifact paths that are absent
    pub fn missing_required(&self) -> Vec<PathBuf> {
        REQUIRED_ARTIFACTS
            .iter()
            .map(|key| self.path(*key))
            .filter(|path| !path.exists())
            .collect()
    }
}
