//! Shared dataset fixtures for the integration tests
//!
//! Builds a tiny but complete artifact set in a temp directory. Element
//! values are arbitrary yet deterministic so tests can assert byte-for-byte
//! round trips through the published region.

#![allow(dead_code)]

use std::path::Path;
use tempfile::TempDir;
use waystore_core::io::{FINGERPRINT_MAGIC, FINGERPRINT_VERSION};
use waystore_core::types::{
    CellData, ChGraphEdgeEntry, Coordinate, Datasources, EdgeBasedNode, GraphNodeEntry,
    LaneTupleIdPair, LevelData, ManeuverOverride, MldGraphEdgeEntry, NodeBasedEdgeAnnotation,
    ProfileProperties, RTreeNode, RangeTableBlock, TurnInstruction,
};
use waystore_core::{ArtifactKey, StorageConfig};

pub const NAMES: &[u8] = b"main st\0highway 1\0";
pub const TIMESTAMP: &[u8] = b"2026-08-01T00:00:00Z";
pub const CONNECTIVITY: u32 = 0xC0FF_EE00;
pub const NUM_TURNS: u64 = 4;
pub const TURN_WEIGHT_PENALTIES: [i16; 3] = [10, -5, 3];
pub const TURN_DURATION_PENALTIES: [i16; 3] = [100, 50, 30];
pub const GEOMETRY_NODES: [u32; 5] = [7, 8, 9, 10, 11];
pub const COORDINATES: [(i32, i32); 3] = [(-122_419_400, 37_774_900), (13_404_954, 52_520_007), (0, 0)];
pub const HSGR_NODES: u64 = 2;
pub const HSGR_EDGES: u64 = 3;

/// Edge filter words of metric `index`, length [`HSGR_EDGES`]
pub fn ch_filter(index: u64) -> [u32; 3] {
    [10 + index as u32, 20 + index as u32, 30 + index as u32]
}

/// Per-cell weights of metric `index`
pub fn cell_weights(index: u64) -> [i32; 4] {
    let k = index as i32 * 10;
    [k + 1, k + 2, k + 3, k + 4]
}

/// Per-cell durations of metric `index`
pub fn cell_durations(index: u64) -> [i32; 4] {
    let k = index as i32 * 10;
    [k + 5, k + 6, k + 7, k + 8]
}

/// Which artifacts the fixture writes and with what knobs
pub struct FixtureSpec {
    /// metrics declared by the contracted graph, if present
    pub hsgr_metrics: Option<u64>,
    /// connectivity checksum stored in the contracted graph
    pub hsgr_checksum: u32,
    /// write the partition / cells artifacts
    pub mld: bool,
    /// metrics declared by the cell metrics artifact, if present
    pub cell_metrics: Option<u64>,
    /// write the multi-level graph, with this connectivity checksum
    pub mldgr: Option<u32>,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            hsgr_metrics: Some(2),
            hsgr_checksum: CONNECTIVITY,
            mld: true,
            cell_metrics: Some(2),
            mldgr: Some(CONNECTIVITY),
        }
    }
}

/// A dataset on disk plus the config pointing at it
pub struct Fixture {
    _dir: TempDir,
    pub config: StorageConfig,
}

impl Fixture {
    /// Every artifact, default knobs
    pub fn full() -> Self {
        Self::create(FixtureSpec::default())
    }

    /// Required artifacts only; optional features absent
    pub fn minimal() -> Self {
        Self::create(FixtureSpec {
            hsgr_metrics: None,
            mld: false,
            cell_metrics: None,
            mldgr: None,
            ..FixtureSpec::default()
        })
    }

    pub fn create(spec: FixtureSpec) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = StorageConfig::new(dir.path().join("map"));
        write_dataset(&config, &spec);
        Self { _dir: dir, config }
    }
}

fn write_dataset(config: &StorageConfig, spec: &FixtureSpec) {
    // names: raw character data
    Artifact::new().bytes(NAMES).save(&config.path(ArtifactKey::Names));

    // fileIndex: only the path matters, content is opaque
    Artifact::new().save(&config.path(ArtifactKey::FileIndex));

    // lane description strings
    Artifact::new()
        .vec_pod(&[0u32, 5, 9])
        .vec_pod(&[1u16, 2, 3, 4])
        .save(&config.path(ArtifactKey::Tls));

    // turn data: five parallel arrays plus the connectivity checksum
    {
        let mut instructions = [TurnInstruction::default(); NUM_TURNS as usize];
        for (index, instruction) in instructions.iter_mut().enumerate() {
            instruction.ty = index as u8;
            instruction.direction_modifier = 7;
        }
        Artifact::new()
            .u64(NUM_TURNS)
            .pods(&instructions)
            .pods(&[2u16, 4, 6, 8]) // lane data ids
            .pods(&[1u16, 1, 2, 2]) // entry class ids
            .pods(&[10u8, 20, 30, 40]) // pre turn bearings
            .pods(&[11u8, 21, 31, 41]) // post turn bearings
            .u32(CONNECTIVITY)
            .save(&config.path(ArtifactKey::Edges));
    }

    // edge based graph nodes
    {
        let mut nodes = [EdgeBasedNode::default(); 3];
        for (index, node) in nodes.iter_mut().enumerate() {
            node.geometry_id = index as u32;
            node.annotation_id = (index % 2) as u32;
        }
        let annotations = [NodeBasedEdgeAnnotation::default(); 2];
        Artifact::new()
            .u64(3)
            .u64(2)
            .pods(&nodes)
            .pods(&annotations)
            .save(&config.path(ArtifactKey::EbgNodes));
    }

    // r-tree
    {
        let mut tree = [RTreeNode::default(); 2];
        tree[0].first_child = 1;
        tree[0].child_count = 1;
        Artifact::new()
            .vec_pod(&tree)
            .vec_pod(&[1u64, 1])
            .save(&config.path(ArtifactKey::RamIndex));
    }

    Artifact::new()
        .pod(&ProfileProperties::default())
        .save(&config.path(ArtifactKey::Properties));

    Artifact::new()
        .bytes(TIMESTAMP)
        .save(&config.path(ArtifactKey::Timestamp));

    Artifact::new()
        .vec_pod(&TURN_WEIGHT_PENALTIES)
        .save(&config.path(ArtifactKey::TurnWeightPenalties));

    Artifact::new()
        .vec_pod(&TURN_DURATION_PENALTIES)
        .save(&config.path(ArtifactKey::TurnDurationPenalties));

    // node based graph nodes: coordinates plus packed id blocks
    {
        let coordinates: Vec<Coordinate> = COORDINATES
            .iter()
            .map(|(lon, lat)| {
                let mut c = Coordinate::default();
                c.lon = *lon;
                c.lat = *lat;
                c
            })
            .collect();
        Artifact::new()
            .vec_pod(&coordinates)
            .u64(coordinates.len() as u64)
            .vec_pod(&[0xDEAD_BEEFu64, 0xFEED_FACE])
            .save(&config.path(ArtifactKey::NbgNodes));
    }

    // compressed geometry
    Artifact::new()
        .vec_pod(&[0u32, 2, 4])
        .vec_pod(&GEOMETRY_NODES)
        .vec_pod(&[1i32, 2, 3, 4, 5]) // fwd weights
        .vec_pod(&[5i32, 4, 3, 2, 1]) // rev weights
        .vec_pod(&[11i32, 12, 13, 14, 15]) // fwd durations
        .vec_pod(&[15i32, 14, 13, 12, 11]) // rev durations
        .vec_pod(&[0u8, 0, 1, 1, 2]) // fwd datasources
        .vec_pod(&[2u8, 1, 1, 0, 0]) // rev datasources
        .save(&config.path(ArtifactKey::Geometry));

    {
        let mut datasources = Datasources::default();
        datasources.num_sources = 1;
        datasources.lengths[0] = 3;
        datasources.names[..3].copy_from_slice(b"lua");
        Artifact::new()
            .pod(&datasources)
            .save(&config.path(ArtifactKey::DatasourceNames));
    }

    // intersection data
    Artifact::new()
        .vec_pod(&[0u16, 90, 180, 270]) // bearing values
        .vec_pod(&[0u32, 1, 1]) // bearing class ids
        .u32(4) // sum of range lengths
        .vec_pod(&[0u32, 2, 4]) // offsets
        .vec_pod(&[RangeTableBlock::default()])
        .vec_pod(&[waystore_core::types::EntryClass(0b1011), waystore_core::types::EntryClass(0b0110)])
        .save(&config.path(ArtifactKey::Icd));

    // turn lane data
    {
        let mut pair = LaneTupleIdPair::default();
        pair.lanes_in_turn = 2;
        pair.lane_description_id = 1;
        Artifact::new()
            .u64(2)
            .pods(&[pair, LaneTupleIdPair::default()])
            .save(&config.path(ArtifactKey::Tld));
    }

    // maneuver overrides
    {
        let mut over = ManeuverOverride::default();
        over.node_sequence_offset_end = 3;
        over.instruction_node = 42;
        Artifact::new()
            .vec_pod(&[over])
            .vec_pod(&[40u32, 41, 42])
            .save(&config.path(ArtifactKey::ManeuverOverrides));
    }

    if let Some(num_metrics) = spec.hsgr_metrics {
        let mut artifact = Artifact::new();
        artifact = artifact
            .u32(42) // graph checksum
            .vec_pod(&[GraphNodeEntry { first_edge: 0 }, GraphNodeEntry { first_edge: 2 }])
            .vec_pod(&[ChGraphEdgeEntry::default(); HSGR_EDGES as usize])
            .u64(num_metrics);
        if num_metrics <= 8 {
            for index in 0..num_metrics {
                artifact = artifact.vec_pod(&ch_filter(index));
            }
            artifact = artifact.u32(spec.hsgr_checksum);
        }
        artifact.save(&config.path(ArtifactKey::Hsgr));
    }

    if spec.mld {
        Artifact::new()
            .pod(&LevelData::default())
            .vec_pod(&[0x11u64, 0x22, 0x33])
            .vec_pod(&[5u32, 6])
            .save(&config.path(ArtifactKey::Partition));

        let mut cell = CellData::default();
        cell.num_source_nodes = 2;
        cell.num_destination_nodes = 2;
        Artifact::new()
            .vec_pod(&[1u32, 2])
            .vec_pod(&[3u32, 4])
            .vec_pod(&[cell])
            .vec_pod(&[0u64, 1])
            .save(&config.path(ArtifactKey::Cells));
    }

    if let Some(num_metrics) = spec.cell_metrics {
        let mut artifact = Artifact::new().u64(num_metrics);
        if num_metrics <= 8 {
            for index in 0..num_metrics {
                artifact = artifact
                    .vec_pod(&cell_weights(index))
                    .vec_pod(&cell_durations(index));
            }
        }
        artifact.save(&config.path(ArtifactKey::CellMetrics));
    }

    if let Some(checksum) = spec.mldgr {
        Artifact::new()
            .vec_pod(&[GraphNodeEntry { first_edge: 0 }, GraphNodeEntry { first_edge: 1 }])
            .vec_pod(&[MldGraphEdgeEntry::default(); 2])
            .vec_pod(&[0u64, 8])
            .u32(checksum)
            .save(&config.path(ArtifactKey::Mldgr));
    }
}

/// Byte-level artifact builder; every file starts with the fingerprint
struct Artifact {
    buf: Vec<u8>,
}

impl Artifact {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FINGERPRINT_MAGIC);
        buf.extend_from_slice(&FINGERPRINT_VERSION.to_le_bytes());
        Self { buf }
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Packed struct bytes, no count prefix
    fn pod<T: Copy>(self, value: &T) -> Self {
        // SAFETY: T is repr(C) plain old data in this test suite
        let bytes = unsafe {
            std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>())
        };
        let mut this = self;
        this.buf.extend_from_slice(bytes);
        this
    }

    /// Packed element bytes, no count prefix
    fn pods<T: Copy>(self, values: &[T]) -> Self {
        // SAFETY: as pod()
        let bytes = unsafe {
            std::slice::from_raw_parts(values.as_ptr() as *const u8, std::mem::size_of_val(values))
        };
        let mut this = self;
        this.buf.extend_from_slice(bytes);
        this
    }

    /// u64 element count followed by the packed elements
    fn vec_pod<T: Copy>(self, values: &[T]) -> Self {
        self.u64(values.len() as u64).pods(values)
    }

    fn save(self, path: &Path) {
        std::fs::write(path, &self.buf).expect("write artifact");
    }
}
