//! Layout catalog of the published region
//!
//! The region is one contiguous byte range:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ DataLayout header (raw struct bytes)                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ canary │ pad │ block 0 body │ canary                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ canary │ pad │ block 1 body │ canary                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ ...                                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers attach, copy the header out of the region prefix, and walk to any
//! block body with the same arithmetic the writer used. Alignment padding
//! sits between the leading canary and the body; bodies are never padded
//! internally.

use crate::block::Block;
use crate::error::{Error, Result};

/// Written before and after every block body as a corruption check
pub const CANARY: [u8; 4] = [b'O', b'S', b'R', b'M'];

/// Identifier of one block in the published region.
///
/// The enumeration is a versioned wire contract: readers index the same
/// catalog slots by the same identifiers, so variants may be appended but
/// never reordered or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum BlockId {
    NameCharData = 0,
    EdgeBasedNodeData,
    AnnotationData,
    ChGraphNodeList,
    ChGraphEdgeList,
    ChEdgeFilter0,
    ChEdgeFilter1,
    ChEdgeFilter2,
    ChEdgeFilter3,
    ChEdgeFilter4,
    ChEdgeFilter5,
    ChEdgeFilter6,
    ChEdgeFilter7,
    CoordinateList,
    OsmNodeIdList,
    TurnInstruction,
    EntryClassId,
    RSearchTree,
    RSearchTreeLevels,
    GeometriesIndex,
    GeometriesNodeList,
    GeometriesFwdWeightList,
    GeometriesRevWeightList,
    GeometriesFwdDurationList,
    GeometriesRevDurationList,
    GeometriesFwdDatasourcesList,
    GeometriesRevDatasourcesList,
    HsgrChecksum,
    Timestamp,
    FileIndexPath,
    DatasourcesNames,
    Properties,
    BearingClassId,
    BearingOffsets,
    BearingBlocks,
    BearingValues,
    EntryClass,
    LaneDataId,
    PreTurnBearing,
    PostTurnBearing,
    TurnLaneData,
    LaneDescriptionOffsets,
    LaneDescriptionMasks,
    TurnWeightPenalties,
    TurnDurationPenalties,
    MldLevelData,
    MldPartition,
    MldCellToChildren,
    MldCellWeights0,
    MldCellWeights1,
    MldCellWeights2,
    MldCellWeights3,
    MldCellWeights4,
    MldCellWeights5,
    MldCellWeights6,
    MldCellWeights7,
    MldCellDurations0,
    MldCellDurations1,
    MldCellDurations2,
    MldCellDurations3,
    MldCellDurations4,
    MldCellDurations5,
    MldCellDurations6,
    MldCellDurations7,
    MldCellSourceBoundary,
    MldCellDestinationBoundary,
    MldCells,
    MldCellLevelOffsets,
    MldGraphNodeList,
    MldGraphEdgeList,
    MldGraphNodeToOffset,
    ManeuverOverrides,
    ManeuverOverrideNodeSequences,
}

/// Number of catalog slots
pub const NUM_BLOCKS: usize = 73;

/// All identifiers in catalog order
pub const ALL_BLOCKS: [BlockId; NUM_BLOCKS] = [
    BlockId::NameCharData,
    BlockId::EdgeBasedNodeData,
    BlockId::AnnotationData,
    BlockId::ChGraphNodeList,
    BlockId::ChGraphEdgeList,
    BlockId::ChEdgeFilter0,
    BlockId::ChEdgeFilter1,
    BlockId::ChEdgeFilter2,
    BlockId::ChEdgeFilter3,
    BlockId::ChEdgeFilter4,
    BlockId::ChEdgeFilter5,
    BlockId::ChEdgeFilter6,
    BlockId::ChEdgeFilter7,
    BlockId::CoordinateList,
    BlockId::OsmNodeIdList,
    BlockId::TurnInstruction,
    BlockId::EntryClassId,
    BlockId::RSearchTree,
    BlockId::RSearchTreeLevels,
    BlockId::GeometriesIndex,
    BlockId::GeometriesNodeList,
    BlockId::GeometriesFwdWeightList,
    BlockId::GeometriesRevWeightList,
    BlockId::GeometriesFwdDurationList,
    BlockId::GeometriesRevDurationList,
    BlockId::GeometriesFwdDatasourcesList,
    BlockId::GeometriesRevDatasourcesList,
    BlockId::HsgrChecksum,
    BlockId::Timestamp,
    BlockId::FileIndexPath,
    BlockId::DatasourcesNames,
    BlockId::Properties,
    BlockId::BearingClassId,
    BlockId::BearingOffsets,
    BlockId::BearingBlocks,
    BlockId::BearingValues,
    BlockId::EntryClass,
    BlockId::LaneDataId,
    BlockId::PreTurnBearing,
    BlockId::PostTurnBearing,
    BlockId::TurnLaneData,
    BlockId::LaneDescriptionOffsets,
    BlockId::LaneDescriptionMasks,
    BlockId::TurnWeightPenalties,
    BlockId::TurnDurationPenalties,
    BlockId::MldLevelData,
    BlockId::MldPartition,
    BlockId::MldCellToChildren,
    BlockId::MldCellWeights0,
    BlockId::MldCellWeights1,
    BlockId::MldCellWeights2,
    BlockId::MldCellWeights3,
    BlockId::MldCellWeights4,
    BlockId::MldCellWeights5,
    BlockId::MldCellWeights6,
    BlockId::MldCellWeights7,
    BlockId::MldCellDurations0,
    BlockId::MldCellDurations1,
    BlockId::MldCellDurations2,
    BlockId::MldCellDurations3,
    BlockId::MldCellDurations4,
    BlockId::MldCellDurations5,
    BlockId::MldCellDurations6,
    BlockId::MldCellDurations7,
    BlockId::MldCellSourceBoundary,
    BlockId::MldCellDestinationBoundary,
    BlockId::MldCells,
    BlockId::MldCellLevelOffsets,
    BlockId::MldGraphNodeList,
    BlockId::MldGraphEdgeList,
    BlockId::MldGraphNodeToOffset,
    BlockId::ManeuverOverrides,
    BlockId::ManeuverOverrideNodeSequences,
];

/// Diagnostic names, parallel to the enumeration
pub const BLOCK_NAMES: [&str; NUM_BLOCKS] = [
    "NAME_CHAR_DATA",
    "EDGE_BASED_NODE_DATA",
    "ANNOTATION_DATA",
    "CH_GRAPH_NODE_LIST",
    "CH_GRAPH_EDGE_LIST",
    "CH_EDGE_FILTER_0",
    "CH_EDGE_FILTER_1",
    "CH_EDGE_FILTER_2",
    "CH_EDGE_FILTER_3",
    "CH_EDGE_FILTER_4",
    "CH_EDGE_FILTER_5",
    "CH_EDGE_FILTER_6",
    "CH_EDGE_FILTER_7",
    "COORDINATE_LIST",
    "OSM_NODE_ID_LIST",
    "TURN_INSTRUCTION",
    "ENTRY_CLASSID",
    "R_SEARCH_TREE",
    "R_SEARCH_TREE_LEVELS",
    "GEOMETRIES_INDEX",
    "GEOMETRIES_NODE_LIST",
    "GEOMETRIES_FWD_WEIGHT_LIST",
    "GEOMETRIES_REV_WEIGHT_LIST",
    "GEOMETRIES_FWD_DURATION_LIST",
    "GEOMETRIES_REV_DURATION_LIST",
    "GEOMETRIES_FWD_DATASOURCES_LIST",
    "GEOMETRIES_REV_DATASOURCES_LIST",
    "HSGR_CHECKSUM",
    "TIMESTAMP",
    "FILE_INDEX_PATH",
    "DATASOURCES_NAMES",
    "PROPERTIES",
    "BEARING_CLASSID",
    "BEARING_OFFSETS",
    "BEARING_BLOCKS",
    "BEARING_VALUES",
    "ENTRY_CLASS",
    "LANE_DATA_ID",
    "PRE_TURN_BEARING",
    "POST_TURN_BEARING",
    "TURN_LANE_DATA",
    "LANE_DESCRIPTION_OFFSETS",
    "LANE_DESCRIPTION_MASKS",
    "TURN_WEIGHT_PENALTIES",
    "TURN_DURATION_PENALTIES",
    "MLD_LEVEL_DATA",
    "MLD_PARTITION",
    "MLD_CELL_TO_CHILDREN",
    "MLD_CELL_WEIGHTS_0",
    "MLD_CELL_WEIGHTS_1",
    "MLD_CELL_WEIGHTS_2",
    "MLD_CELL_WEIGHTS_3",
    "MLD_CELL_WEIGHTS_4",
    "MLD_CELL_WEIGHTS_5",
    "MLD_CELL_WEIGHTS_6",
    "MLD_CELL_WEIGHTS_7",
    "MLD_CELL_DURATIONS_0",
    "MLD_CELL_DURATIONS_1",
    "MLD_CELL_DURATIONS_2",
    "MLD_CELL_DURATIONS_3",
    "MLD_CELL_DURATIONS_4",
    "MLD_CELL_DURATIONS_5",
    "MLD_CELL_DURATIONS_6",
    "MLD_CELL_DURATIONS_7",
    "MLD_CELL_SOURCE_BOUNDARY",
    "MLD_CELL_DESTINATION_BOUNDARY",
    "MLD_CELLS",
    "MLD_CELL_LEVEL_OFFSETS",
    "MLD_GRAPH_NODE_LIST",
    "MLD_GRAPH_EDGE_LIST",
    "MLD_GRAPH_NODE_TO_OFFSET",
    "MANEUVER_OVERRIDES",
    "MANEUVER_OVERRIDE_NODE_SEQUENCES",
];

// Catalog slots and diagnostic names must stay in one-to-one correspondence.
const _: () = assert!(ALL_BLOCKS.len() == BLOCK_NAMES.len());

impl BlockId {
    /// Convert from a catalog index
    pub fn from_index(index: usize) -> Option<Self> {
        ALL_BLOCKS.get(index).copied()
    }

    /// Diagnostic name of this block
    pub fn name(self) -> &'static str {
        BLOCK_NAMES[self as usize]
    }

    /// Contracted-graph edge filter slot `index` of the metric family
    pub fn ch_edge_filter(index: usize) -> Self {
        ALL_BLOCKS[BlockId::ChEdgeFilter0 as usize + index]
    }

    /// Cell weight slot `index` of the metric family
    pub fn mld_cell_weights(index: usize) -> Self {
        ALL_BLOCKS[BlockId::MldCellWeights0 as usize + index]
    }

    /// Cell duration slot `index` of the metric family
    pub fn mld_cell_durations(index: usize) -> Self {
        ALL_BLOCKS[BlockId::MldCellDurations0 as usize + index]
    }
}

/// Round `addr` up to the next multiple of `align` (power of two)
#[inline]
fn align_up(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (addr + align - 1) & !(align - 1)
}

/// The planned catalog: one descriptor per block, in enumeration order.
///
/// The raw struct bytes form the region's header; writer and reader must be
/// built from the same catalog revision.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DataLayout {
    blocks: [Block; NUM_BLOCKS],
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            blocks: [Block::default(); NUM_BLOCKS],
        }
    }
}

impl DataLayout {
    /// Byte size of the serialized catalog header
    pub const HEADER_SIZE: usize = std::mem::size_of::<DataLayout>();

    /// Store the descriptor for `id`; idempotent, any call order
    pub fn set_block(&mut self, id: BlockId, block: Block) {
        self.blocks[id as usize] = block;
    }

    /// Number of entries in block `id`
    pub fn entries(&self, id: BlockId) -> u64 {
        self.blocks[id as usize].num_entries
    }

    /// Body size of block `id` in bytes
    pub fn byte_size(&self, id: BlockId) -> u64 {
        self.blocks[id as usize].byte_size
    }

    /// Conservative total byte size of all block frames.
    ///
    /// Each block accounts for two canaries, one full alignment worth of
    /// padding and its body. The alignment term over-reserves by at most
    /// `align - 1` bytes per block; readers walk offsets with the identical
    /// formula, so the bound is never tightened.
    pub fn total_size(&self) -> u64 {
        self.blocks
            .iter()
            .map(|block| {
                debug_assert!(block.is_valid());
                2 * CANARY.len() as u64 + block.entry_align + block.byte_size
            })
            .sum()
    }

    /// Address of the body of block `id`, aligned to the block's alignment.
    ///
    /// Walks every prior block in enumeration order: skip its leading canary,
    /// round up to its alignment, skip its body, skip its trailing canary.
    ///
    /// # Safety
    ///
    /// `base` must point at the first block frame of a region laid out by
    /// this catalog (directly after the serialized header), with at least
    /// `total_size()` addressable bytes.
    pub unsafe fn aligned_block_ptr(&self, base: *mut u8, id: BlockId) -> *mut u8 {
        let mut addr = base as usize;
        for block in &self.blocks[..id as usize] {
            addr += CANARY.len();
            addr = align_up(addr, block.entry_align as usize);
            addr += block.byte_size as usize;
            addr += CANARY.len();
        }
        addr += CANARY.len();
        addr = align_up(addr, self.blocks[id as usize].entry_align as usize);
        addr as *mut u8
    }

    /// Body address of block `id` with both canaries freshly written.
    ///
    /// # Safety
    ///
    /// As [`aligned_block_ptr`](Self::aligned_block_ptr); the region must be
    /// writable and not yet visible to readers.
    pub unsafe fn block_ptr_mut(&self, base: *mut u8, id: BlockId) -> *mut u8 {
        let ptr = self.aligned_block_ptr(base, id);
        let lead = ptr.sub(CANARY.len());
        let trail = ptr.add(self.byte_size(id) as usize);
        std::ptr::copy_nonoverlapping(CANARY.as_ptr(), lead, CANARY.len());
        std::ptr::copy_nonoverlapping(CANARY.as_ptr(), trail, CANARY.len());
        ptr
    }

    /// Body address of block `id` with both canaries verified.
    ///
    /// # Safety
    ///
    /// As [`aligned_block_ptr`](Self::aligned_block_ptr).
    pub unsafe fn block_ptr(&self, base: *mut u8, id: BlockId) -> Result<*const u8> {
        let ptr = self.aligned_block_ptr(base, id);
        let lead = std::slice::from_raw_parts(ptr.sub(CANARY.len()), CANARY.len());
        let trail = std::slice::from_raw_parts(
            ptr.add(self.byte_size(id) as usize),
            CANARY.len(),
        );
        if lead != CANARY {
            return Err(Error::CanaryCorruption {
                block: id.name(),
                side: "start",
            });
        }
        if trail != CANARY {
            return Err(Error::CanaryCorruption {
                block: id.name(),
                side: "end",
            });
        }
        Ok(ptr as *const u8)
    }

    /// One past the last entry of block `id`
    ///
    /// # Safety
    ///
    /// As [`aligned_block_ptr`](Self::aligned_block_ptr).
    pub unsafe fn block_end(&self, base: *mut u8, id: BlockId) -> *const u8 {
        self.aligned_block_ptr(base, id)
            .add(self.byte_size(id) as usize) as *const u8
    }

    /// Mutable typed view of the body of block `id`, canaries written.
    ///
    /// # Safety
    ///
    /// As [`block_ptr_mut`](Self::block_ptr_mut); `T` must be the element
    /// type the block was planned with.
    pub unsafe fn write_block_slice<'a, T>(&self, base: *mut u8, id: BlockId) -> &'a mut [T] {
        let block = &self.blocks[id as usize];
        debug_assert!(
            block.num_entries == 0 || block.entry_size == std::mem::size_of::<T>() as u64,
            "element type mismatch for {}",
            id.name()
        );
        let ptr = self.block_ptr_mut(base, id);
        std::slice::from_raw_parts_mut(ptr as *mut T, block.num_entries as usize)
    }

    /// Shared typed view of the body of block `id`, canaries verified.
    ///
    /// # Safety
    ///
    /// As [`block_ptr`](Self::block_ptr); `T` must be the element type the
    /// block was planned with.
    pub unsafe fn read_block_slice<'a, T>(&self, base: *mut u8, id: BlockId) -> Result<&'a [T]> {
        let block = &self.blocks[id as usize];
        debug_assert!(
            block.num_entries == 0 || block.entry_size == std::mem::size_of::<T>() as u64,
            "element type mismatch for {}",
            id.name()
        );
        let ptr = self.block_ptr(base, id)?;
        Ok(std::slice::from_raw_parts(
            ptr as *const T,
            block.num_entries as usize,
        ))
    }

    /// The catalog header as raw bytes, ready to copy into the region prefix
    pub fn as_bytes(&self) -> &[u8] {
        // Self is repr(C) plain old data
        unsafe {
            std::slice::from_raw_parts(self as *const Self as *const u8, Self::HEADER_SIZE)
        }
    }

    /// Rebuild a catalog from a region prefix
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::SharedMemory(format!(
                "region too small for layout header: {} < {}",
                bytes.len(),
                Self::HEADER_SIZE
            )));
        }
        // read_unaligned: the prefix of an attached region is page aligned in
        // practice, but the reader contract only promises bytes
        let layout =
            unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const DataLayout) };
        for (index, block) in layout.blocks.iter().enumerate() {
            if !block.is_valid() {
                return Err(Error::SharedMemory(format!(
                    "layout header holds invalid descriptor for {}",
                    BLOCK_NAMES[index]
                )));
            }
        }
        Ok(layout)
    }
}
