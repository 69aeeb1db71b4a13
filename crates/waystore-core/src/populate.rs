//! Layout and data population
//!
//! Two passes over the artifact set. The first pass reads just enough of
//! every artifact header to size each catalog block; the second streams the
//! artifact payloads into a freshly allocated region. Both passes walk the
//! same per-artifact field sequences, so a vector that changes length
//! between the passes is reported as corruption rather than written out of
//! bounds.

use crate::block::Block;
use crate::config::{ArtifactKey, StorageConfig};
use crate::error::{Error, Result};
use crate::io::FileReader;
use crate::layout::{BlockId, DataLayout};
use crate::types::{
    BearingClassId, CellData, CellId, ChGraphEdgeEntry, Coordinate, Datasources, DiscreteBearing,
    EdgeBasedNode, EdgeDuration, EdgeWeight, EntryClass, EntryClassId, GraphNodeEntry, LaneDataId,
    LaneTupleIdPair, LevelData, ManeuverOverride, MldGraphEdgeEntry, NodeBasedEdgeAnnotation,
    NodeId, PartitionId, ProfileProperties, RTreeNode, RangeTableBlock, TurnBearing, EdgeOffset,
    TurnInstruction, TurnLaneMask, TurnPenalty,
};
use std::path::PathBuf;
use tracing::info;

/// Hard cap on the metric families (contracted edge filters, cell metrics)
pub const NUM_METRICS: usize = 8;

/// Absolute path stored in the `FileIndexPath` block, NUL terminated
fn file_index_path(config: &StorageConfig) -> Result<PathBuf> {
    let path = config.path(ArtifactKey::FileIndex);
    std::path::absolute(&path).map_err(|source| Error::Io { path, source })
}

/// Examine every artifact and fill the catalog with one descriptor per
/// block: how many entries it has and how they are laid out.
pub fn populate_layout(config: &StorageConfig, layout: &mut DataLayout) -> Result<()> {
    {
        let absolute = file_index_path(config)?;
        let length = absolute.as_os_str().len() as u64 + 1;
        layout.set_block(BlockId::FileIndexPath, Block::for_type::<u8>(length));
    }

    {
        let path = config.path(ArtifactKey::Names);
        info!("loading names from {}", path.display());
        let reader = FileReader::open(&path)?;
        layout.set_block(BlockId::NameCharData, Block::for_type::<u8>(reader.size()?));
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Tls))?;
        let num_offsets = reader.read_vector_size::<u32>()?;
        let num_masks = reader.read_vector_size::<TurnLaneMask>()?;
        layout.set_block(
            BlockId::LaneDescriptionOffsets,
            Block::for_type::<u32>(num_offsets),
        );
        layout.set_block(
            BlockId::LaneDescriptionMasks,
            Block::for_type::<TurnLaneMask>(num_masks),
        );
    }

    // turn data: five parallel arrays over the same turn count
    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Edges))?;
        let num_turns = reader.read_element_count()?;
        layout.set_block(
            BlockId::TurnInstruction,
            Block::for_type::<TurnInstruction>(num_turns),
        );
        layout.set_block(BlockId::LaneDataId, Block::for_type::<LaneDataId>(num_turns));
        layout.set_block(
            BlockId::EntryClassId,
            Block::for_type::<EntryClassId>(num_turns),
        );
        layout.set_block(
            BlockId::PreTurnBearing,
            Block::for_type::<TurnBearing>(num_turns),
        );
        layout.set_block(
            BlockId::PostTurnBearing,
            Block::for_type::<TurnBearing>(num_turns),
        );
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::EbgNodes))?;
        let num_nodes = reader.read_element_count()?;
        let num_annotations = reader.read_element_count()?;
        layout.set_block(
            BlockId::EdgeBasedNodeData,
            Block::for_type::<EdgeBasedNode>(num_nodes),
        );
        layout.set_block(
            BlockId::AnnotationData,
            Block::for_type::<NodeBasedEdgeAnnotation>(num_annotations),
        );
    }

    if config.has(ArtifactKey::Hsgr) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Hsgr))?;
        reader.skip::<u32>(1)?; // checksum
        let num_nodes = reader.read_vector_size::<GraphNodeEntry>()?;
        let num_edges = reader.read_vector_size::<ChGraphEdgeEntry>()?;
        let num_metrics = reader.read_element_count()?;

        if num_metrics > NUM_METRICS as u64 {
            return Err(Error::LayoutOverflow {
                declared: num_metrics,
                max: NUM_METRICS as u64,
            });
        }

        layout.set_block(BlockId::HsgrChecksum, Block::for_type::<u32>(1));
        layout.set_block(
            BlockId::ChGraphNodeList,
            Block::for_type::<GraphNodeEntry>(num_nodes),
        );
        layout.set_block(
            BlockId::ChGraphEdgeList,
            Block::for_type::<ChGraphEdgeEntry>(num_edges),
        );
        for index in 0..num_metrics as usize {
            layout.set_block(
                BlockId::ch_edge_filter(index),
                Block::for_type::<u32>(num_edges),
            );
        }
        for index in num_metrics as usize..NUM_METRICS {
            layout.set_block(BlockId::ch_edge_filter(index), Block::for_type::<u32>(0));
        }
    } else {
        layout.set_block(BlockId::HsgrChecksum, Block::for_type::<u32>(0));
        layout.set_block(BlockId::ChGraphNodeList, Block::for_type::<GraphNodeEntry>(0));
        layout.set_block(
            BlockId::ChGraphEdgeList,
            Block::for_type::<ChGraphEdgeEntry>(0),
        );
        for index in 0..NUM_METRICS {
            layout.set_block(BlockId::ch_edge_filter(index), Block::for_type::<u32>(0));
        }
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::RamIndex))?;
        let tree_size = reader.read_vector_size::<RTreeNode>()?;
        layout.set_block(BlockId::RSearchTree, Block::for_type::<RTreeNode>(tree_size));
        let tree_levels = reader.read_vector_size::<u64>()?;
        layout.set_block(
            BlockId::RSearchTreeLevels,
            Block::for_type::<u64>(tree_levels),
        );
    }

    layout.set_block(BlockId::Properties, Block::for_type::<ProfileProperties>(1));

    {
        let reader = FileReader::open(&config.path(ArtifactKey::Timestamp))?;
        layout.set_block(BlockId::Timestamp, Block::for_type::<u8>(reader.size()?));
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::TurnWeightPenalties))?;
        let num_penalties = reader.read_element_count()?;
        layout.set_block(
            BlockId::TurnWeightPenalties,
            Block::for_type::<TurnPenalty>(num_penalties),
        );
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::TurnDurationPenalties))?;
        let num_penalties = reader.read_element_count()?;
        layout.set_block(
            BlockId::TurnDurationPenalties,
            Block::for_type::<TurnPenalty>(num_penalties),
        );
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::NbgNodes))?;
        let num_coordinates = reader.read_vector_size::<Coordinate>()?;
        layout.set_block(
            BlockId::CoordinateList,
            Block::for_type::<Coordinate>(num_coordinates),
        );
        // packed id count, then the backing block vector
        reader.skip::<u64>(1)?;
        let num_id_blocks = reader.read_element_count()?;
        layout.set_block(BlockId::OsmNodeIdList, Block::for_type::<u64>(num_id_blocks));
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Geometry))?;
        let num_indices = reader.read_vector_size::<u32>()?;
        layout.set_block(BlockId::GeometriesIndex, Block::for_type::<u32>(num_indices));

        let num_geometries = reader.read_vector_size::<NodeId>()?;
        layout.set_block(
            BlockId::GeometriesNodeList,
            Block::for_type::<NodeId>(num_geometries),
        );

        let num_fwd_weights = reader.read_vector_size::<EdgeWeight>()?;
        let num_rev_weights = reader.read_vector_size::<EdgeWeight>()?;
        if num_fwd_weights != num_rev_weights {
            return Err(Error::ArtifactCorrupt {
                path: config.path(ArtifactKey::Geometry),
                detail: format!(
                    "forward/reverse weight counts disagree: {num_fwd_weights} != {num_rev_weights}"
                ),
            });
        }
        layout.set_block(
            BlockId::GeometriesFwdWeightList,
            Block::for_type::<EdgeWeight>(num_fwd_weights),
        );
        layout.set_block(
            BlockId::GeometriesRevWeightList,
            Block::for_type::<EdgeWeight>(num_rev_weights),
        );

        let num_fwd_durations = reader.read_vector_size::<EdgeDuration>()?;
        let num_rev_durations = reader.read_vector_size::<EdgeDuration>()?;
        if num_fwd_durations != num_rev_durations {
            return Err(Error::ArtifactCorrupt {
                path: config.path(ArtifactKey::Geometry),
                detail: format!(
                    "forward/reverse duration counts disagree: {num_fwd_durations} != {num_rev_durations}"
                ),
            });
        }
        layout.set_block(
            BlockId::GeometriesFwdDurationList,
            Block::for_type::<EdgeDuration>(num_fwd_durations),
        );
        layout.set_block(
            BlockId::GeometriesRevDurationList,
            Block::for_type::<EdgeDuration>(num_rev_durations),
        );

        let num_fwd_datasources = reader.read_vector_size::<u8>()?;
        let num_rev_datasources = reader.read_vector_size::<u8>()?;
        layout.set_block(
            BlockId::GeometriesFwdDatasourcesList,
            Block::for_type::<u8>(num_fwd_datasources),
        );
        layout.set_block(
            BlockId::GeometriesRevDatasourcesList,
            Block::for_type::<u8>(num_rev_datasources),
        );
    }

    layout.set_block(BlockId::DatasourcesNames, Block::for_type::<Datasources>(1));

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Icd))?;
        let num_bearings = reader.read_vector_size::<DiscreteBearing>()?;
        layout.set_block(
            BlockId::BearingValues,
            Block::for_type::<DiscreteBearing>(num_bearings),
        );

        let num_classes = reader.read_vector_size::<BearingClassId>()?;
        layout.set_block(
            BlockId::BearingClassId,
            Block::for_type::<BearingClassId>(num_classes),
        );

        reader.skip::<u32>(1)?; // sum of range lengths
        let num_offsets = reader.read_vector_size::<u32>()?;
        let num_blocks = reader.read_vector_size::<RangeTableBlock>()?;
        layout.set_block(BlockId::BearingOffsets, Block::for_type::<u32>(num_offsets));
        layout.set_block(
            BlockId::BearingBlocks,
            Block::for_type::<RangeTableBlock>(num_blocks),
        );

        let num_entry_classes = reader.read_vector_size::<EntryClass>()?;
        layout.set_block(
            BlockId::EntryClass,
            Block::for_type::<EntryClass>(num_entry_classes),
        );
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Tld))?;
        let num_lane_tuples = reader.read_element_count()?;
        layout.set_block(
            BlockId::TurnLaneData,
            Block::for_type::<LaneTupleIdPair>(num_lane_tuples),
        );
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::ManeuverOverrides))?;
        let num_overrides = reader.read_vector_size::<ManeuverOverride>()?;
        layout.set_block(
            BlockId::ManeuverOverrides,
            Block::for_type::<ManeuverOverride>(num_overrides),
        );
        let num_sequence_nodes = reader.read_vector_size::<NodeId>()?;
        layout.set_block(
            BlockId::ManeuverOverrideNodeSequences,
            Block::for_type::<NodeId>(num_sequence_nodes),
        );
    }

    if config.has(ArtifactKey::Partition) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Partition))?;
        reader.skip::<LevelData>(1)?;
        layout.set_block(BlockId::MldLevelData, Block::for_type::<LevelData>(1));
        let num_partition_ids = reader.read_vector_size::<PartitionId>()?;
        layout.set_block(
            BlockId::MldPartition,
            Block::for_type::<PartitionId>(num_partition_ids),
        );
        let num_children = reader.read_vector_size::<CellId>()?;
        layout.set_block(
            BlockId::MldCellToChildren,
            Block::for_type::<CellId>(num_children),
        );
    } else {
        layout.set_block(BlockId::MldLevelData, Block::for_type::<LevelData>(0));
        layout.set_block(BlockId::MldPartition, Block::for_type::<PartitionId>(0));
        layout.set_block(BlockId::MldCellToChildren, Block::for_type::<CellId>(0));
    }

    if config.has(ArtifactKey::Cells) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Cells))?;
        let num_source_nodes = reader.read_vector_size::<NodeId>()?;
        layout.set_block(
            BlockId::MldCellSourceBoundary,
            Block::for_type::<NodeId>(num_source_nodes),
        );
        let num_destination_nodes = reader.read_vector_size::<NodeId>()?;
        layout.set_block(
            BlockId::MldCellDestinationBoundary,
            Block::for_type::<NodeId>(num_destination_nodes),
        );
        let num_cells = reader.read_vector_size::<CellData>()?;
        layout.set_block(BlockId::MldCells, Block::for_type::<CellData>(num_cells));
        let num_level_offsets = reader.read_vector_size::<u64>()?;
        layout.set_block(
            BlockId::MldCellLevelOffsets,
            Block::for_type::<u64>(num_level_offsets),
        );
    } else {
        layout.set_block(BlockId::MldCellSourceBoundary, Block::for_type::<NodeId>(0));
        layout.set_block(
            BlockId::MldCellDestinationBoundary,
            Block::for_type::<NodeId>(0),
        );
        layout.set_block(BlockId::MldCells, Block::for_type::<CellData>(0));
        layout.set_block(BlockId::MldCellLevelOffsets, Block::for_type::<u64>(0));
    }

    if config.has(ArtifactKey::CellMetrics) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::CellMetrics))?;
        let num_metrics = reader.read_element_count()?;

        if num_metrics > NUM_METRICS as u64 {
            return Err(Error::LayoutOverflow {
                declared: num_metrics,
                max: NUM_METRICS as u64,
            });
        }

        for index in 0..num_metrics as usize {
            let num_weights = reader.read_vector_size::<EdgeWeight>()?;
            layout.set_block(
                BlockId::mld_cell_weights(index),
                Block::for_type::<EdgeWeight>(num_weights),
            );
            let num_durations = reader.read_vector_size::<EdgeDuration>()?;
            layout.set_block(
                BlockId::mld_cell_durations(index),
                Block::for_type::<EdgeDuration>(num_durations),
            );
        }
        for index in num_metrics as usize..NUM_METRICS {
            layout.set_block(
                BlockId::mld_cell_weights(index),
                Block::for_type::<EdgeWeight>(0),
            );
            layout.set_block(
                BlockId::mld_cell_durations(index),
                Block::for_type::<EdgeDuration>(0),
            );
        }
    } else {
        for index in 0..NUM_METRICS {
            layout.set_block(
                BlockId::mld_cell_weights(index),
                Block::for_type::<EdgeWeight>(0),
            );
            layout.set_block(
                BlockId::mld_cell_durations(index),
                Block::for_type::<EdgeDuration>(0),
            );
        }
    }

    if config.has(ArtifactKey::Mldgr) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Mldgr))?;
        let num_nodes = reader.read_vector_size::<GraphNodeEntry>()?;
        let num_edges = reader.read_vector_size::<MldGraphEdgeEntry>()?;
        let num_offsets = reader.read_vector_size::<EdgeOffset>()?;
        layout.set_block(
            BlockId::MldGraphNodeList,
            Block::for_type::<GraphNodeEntry>(num_nodes),
        );
        layout.set_block(
            BlockId::MldGraphEdgeList,
            Block::for_type::<MldGraphEdgeEntry>(num_edges),
        );
        layout.set_block(
            BlockId::MldGraphNodeToOffset,
            Block::for_type::<EdgeOffset>(num_offsets),
        );
    } else {
        layout.set_block(BlockId::MldGraphNodeList, Block::for_type::<GraphNodeEntry>(0));
        layout.set_block(
            BlockId::MldGraphEdgeList,
            Block::for_type::<MldGraphEdgeEntry>(0),
        );
        layout.set_block(
            BlockId::MldGraphNodeToOffset,
            Block::for_type::<EdgeOffset>(0),
        );
    }

    Ok(())
}

/// Stream every artifact into the region body at `base`.
///
/// Each section acquires its blocks through write-mode access, which brackets
/// the body with fresh canaries; blocks of absent optional artifacts get
/// their canary frame and nothing else. Cross-artifact consistency is
/// verified here: the connectivity checksum read from the turn data must
/// match the one carried by each graph artifact.
///
/// # Safety
///
/// `base` must point at the first block frame of a region sized and laid out
/// by `layout` (directly after the serialized header).
pub unsafe fn populate_data(
    config: &StorageConfig,
    layout: &DataLayout,
    base: *mut u8,
) -> Result<()> {
    // filled in by the turn data section, checked by the graph sections
    let turns_connectivity_checksum: u32;

    {
        let block: &mut [u8] = layout.write_block_slice(base, BlockId::FileIndexPath);
        block.fill(0);
        let absolute = file_index_path(config)?;
        let bytes = absolute.as_os_str().as_encoded_bytes();
        block[..bytes.len()].copy_from_slice(bytes);
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Names))?;
        let block: &mut [u8] = layout.write_block_slice(base, BlockId::NameCharData);
        if reader.size()? != block.len() as u64 {
            return Err(Error::ArtifactCorrupt {
                path: reader.path().to_path_buf(),
                detail: "size changed between passes".to_string(),
            });
        }
        reader.read_into_slice(block)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Tld))?;
        let num_lane_tuples = reader.read_element_count()?;
        let block: &mut [LaneTupleIdPair] = layout.write_block_slice(base, BlockId::TurnLaneData);
        if num_lane_tuples != block.len() as u64 {
            return Err(Error::ArtifactCorrupt {
                path: reader.path().to_path_buf(),
                detail: "lane tuple count changed between passes".to_string(),
            });
        }
        reader.read_into_slice(block)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Tls))?;
        let offsets: &mut [u32] = layout.write_block_slice(base, BlockId::LaneDescriptionOffsets);
        reader.read_vector_into(offsets)?;
        let masks: &mut [TurnLaneMask] =
            layout.write_block_slice(base, BlockId::LaneDescriptionMasks);
        reader.read_vector_into(masks)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::EbgNodes))?;
        reader.skip::<u64>(2)?; // counts already in the layout
        let nodes: &mut [EdgeBasedNode] = layout.write_block_slice(base, BlockId::EdgeBasedNodeData);
        reader.read_into_slice(nodes)?;
        let annotations: &mut [NodeBasedEdgeAnnotation] =
            layout.write_block_slice(base, BlockId::AnnotationData);
        reader.read_into_slice(annotations)?;
    }

    // turn data; carries the connectivity checksum the graphs must repeat
    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Edges))?;
        let num_turns = reader.read_element_count()?;
        if num_turns != layout.entries(BlockId::TurnInstruction) {
            return Err(Error::ArtifactCorrupt {
                path: reader.path().to_path_buf(),
                detail: "turn count changed between passes".to_string(),
            });
        }
        let instructions: &mut [TurnInstruction] =
            layout.write_block_slice(base, BlockId::TurnInstruction);
        reader.read_into_slice(instructions)?;
        let lane_data_ids: &mut [LaneDataId] = layout.write_block_slice(base, BlockId::LaneDataId);
        reader.read_into_slice(lane_data_ids)?;
        let entry_class_ids: &mut [EntryClassId] =
            layout.write_block_slice(base, BlockId::EntryClassId);
        reader.read_into_slice(entry_class_ids)?;
        let pre_bearings: &mut [TurnBearing] =
            layout.write_block_slice(base, BlockId::PreTurnBearing);
        reader.read_into_slice(pre_bearings)?;
        let post_bearings: &mut [TurnBearing] =
            layout.write_block_slice(base, BlockId::PostTurnBearing);
        reader.read_into_slice(post_bearings)?;

        turns_connectivity_checksum = reader.read_u32()?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Geometry))?;
        let indices: &mut [u32] = layout.write_block_slice(base, BlockId::GeometriesIndex);
        reader.read_vector_into(indices)?;
        let nodes: &mut [NodeId] = layout.write_block_slice(base, BlockId::GeometriesNodeList);
        reader.read_vector_into(nodes)?;
        let fwd_weights: &mut [EdgeWeight] =
            layout.write_block_slice(base, BlockId::GeometriesFwdWeightList);
        reader.read_vector_into(fwd_weights)?;
        let rev_weights: &mut [EdgeWeight] =
            layout.write_block_slice(base, BlockId::GeometriesRevWeightList);
        reader.read_vector_into(rev_weights)?;
        let fwd_durations: &mut [EdgeDuration] =
            layout.write_block_slice(base, BlockId::GeometriesFwdDurationList);
        reader.read_vector_into(fwd_durations)?;
        let rev_durations: &mut [EdgeDuration] =
            layout.write_block_slice(base, BlockId::GeometriesRevDurationList);
        reader.read_vector_into(rev_durations)?;
        let fwd_datasources: &mut [u8] =
            layout.write_block_slice(base, BlockId::GeometriesFwdDatasourcesList);
        reader.read_vector_into(fwd_datasources)?;
        let rev_datasources: &mut [u8] =
            layout.write_block_slice(base, BlockId::GeometriesRevDatasourcesList);
        reader.read_vector_into(rev_datasources)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::DatasourceNames))?;
        let block: &mut [Datasources] = layout.write_block_slice(base, BlockId::DatasourcesNames);
        reader.read_into_slice(block)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::NbgNodes))?;
        let coordinates: &mut [Coordinate] = layout.write_block_slice(base, BlockId::CoordinateList);
        reader.read_vector_into(coordinates)?;
        reader.skip::<u64>(1)?; // packed id count
        let id_blocks: &mut [u64] = layout.write_block_slice(base, BlockId::OsmNodeIdList);
        reader.read_vector_into(id_blocks)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::TurnWeightPenalties))?;
        let penalties: &mut [TurnPenalty] =
            layout.write_block_slice(base, BlockId::TurnWeightPenalties);
        reader.read_vector_into(penalties)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::TurnDurationPenalties))?;
        let penalties: &mut [TurnPenalty] =
            layout.write_block_slice(base, BlockId::TurnDurationPenalties);
        reader.read_vector_into(penalties)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Timestamp))?;
        let block: &mut [u8] = layout.write_block_slice(base, BlockId::Timestamp);
        if reader.size()? != block.len() as u64 {
            return Err(Error::ArtifactCorrupt {
                path: reader.path().to_path_buf(),
                detail: "size changed between passes".to_string(),
            });
        }
        reader.read_into_slice(block)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::RamIndex))?;
        let tree: &mut [RTreeNode] = layout.write_block_slice(base, BlockId::RSearchTree);
        reader.read_vector_into(tree)?;
        let levels: &mut [u64] = layout.write_block_slice(base, BlockId::RSearchTreeLevels);
        reader.read_vector_into(levels)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Properties))?;
        let block: &mut [ProfileProperties] = layout.write_block_slice(base, BlockId::Properties);
        reader.read_into_slice(block)?;
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Icd))?;
        let bearings: &mut [DiscreteBearing] = layout.write_block_slice(base, BlockId::BearingValues);
        reader.read_vector_into(bearings)?;
        let classes: &mut [BearingClassId] =
            layout.write_block_slice(base, BlockId::BearingClassId);
        reader.read_vector_into(classes)?;
        reader.skip::<u32>(1)?; // sum of range lengths
        let offsets: &mut [u32] = layout.write_block_slice(base, BlockId::BearingOffsets);
        reader.read_vector_into(offsets)?;
        let blocks: &mut [RangeTableBlock] = layout.write_block_slice(base, BlockId::BearingBlocks);
        reader.read_vector_into(blocks)?;
        let entry_classes: &mut [EntryClass] = layout.write_block_slice(base, BlockId::EntryClass);
        reader.read_vector_into(entry_classes)?;
    }

    if config.has(ArtifactKey::Hsgr) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Hsgr))?;
        let checksum: &mut [u32] = layout.write_block_slice(base, BlockId::HsgrChecksum);
        reader.read_into_slice(checksum)?;
        let nodes: &mut [GraphNodeEntry] = layout.write_block_slice(base, BlockId::ChGraphNodeList);
        reader.read_vector_into(nodes)?;
        let edges: &mut [ChGraphEdgeEntry] =
            layout.write_block_slice(base, BlockId::ChGraphEdgeList);
        reader.read_vector_into(edges)?;
        let num_metrics = reader.read_element_count()?;
        for index in 0..NUM_METRICS {
            let filter: &mut [u32] =
                layout.write_block_slice(base, BlockId::ch_edge_filter(index));
            if (index as u64) < num_metrics {
                reader.read_vector_into(filter)?;
            }
        }

        let graph_connectivity_checksum = reader.read_u32()?;
        if graph_connectivity_checksum != turns_connectivity_checksum {
            return Err(Error::ChecksumMismatch {
                file_a: config.path(ArtifactKey::Edges),
                checksum_a: turns_connectivity_checksum,
                file_b: config.path(ArtifactKey::Hsgr),
                checksum_b: graph_connectivity_checksum,
            });
        }
    } else {
        // absent graph: zero-entry blocks still get their canary frames
        layout.block_ptr_mut(base, BlockId::HsgrChecksum);
        layout.block_ptr_mut(base, BlockId::ChGraphNodeList);
        layout.block_ptr_mut(base, BlockId::ChGraphEdgeList);
        for index in 0..NUM_METRICS {
            layout.block_ptr_mut(base, BlockId::ch_edge_filter(index));
        }
    }

    if config.has(ArtifactKey::Partition) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Partition))?;
        let level_data: &mut [LevelData] = layout.write_block_slice(base, BlockId::MldLevelData);
        reader.read_into_slice(level_data)?;
        let partition: &mut [PartitionId] = layout.write_block_slice(base, BlockId::MldPartition);
        reader.read_vector_into(partition)?;
        let children: &mut [CellId] = layout.write_block_slice(base, BlockId::MldCellToChildren);
        reader.read_vector_into(children)?;
    } else {
        layout.block_ptr_mut(base, BlockId::MldLevelData);
        layout.block_ptr_mut(base, BlockId::MldPartition);
        layout.block_ptr_mut(base, BlockId::MldCellToChildren);
    }

    if config.has(ArtifactKey::Cells) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Cells))?;
        let source: &mut [NodeId] = layout.write_block_slice(base, BlockId::MldCellSourceBoundary);
        reader.read_vector_into(source)?;
        let destination: &mut [NodeId] =
            layout.write_block_slice(base, BlockId::MldCellDestinationBoundary);
        reader.read_vector_into(destination)?;
        let cells: &mut [CellData] = layout.write_block_slice(base, BlockId::MldCells);
        reader.read_vector_into(cells)?;
        let level_offsets: &mut [u64] =
            layout.write_block_slice(base, BlockId::MldCellLevelOffsets);
        reader.read_vector_into(level_offsets)?;
    } else {
        layout.block_ptr_mut(base, BlockId::MldCellSourceBoundary);
        layout.block_ptr_mut(base, BlockId::MldCellDestinationBoundary);
        layout.block_ptr_mut(base, BlockId::MldCells);
        layout.block_ptr_mut(base, BlockId::MldCellLevelOffsets);
    }

    if config.has(ArtifactKey::CellMetrics) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::CellMetrics))?;
        let num_metrics = reader.read_element_count()?;
        for index in 0..NUM_METRICS {
            let weights: &mut [EdgeWeight] =
                layout.write_block_slice(base, BlockId::mld_cell_weights(index));
            let durations: &mut [EdgeDuration] =
                layout.write_block_slice(base, BlockId::mld_cell_durations(index));
            if (index as u64) < num_metrics {
                reader.read_vector_into(weights)?;
                reader.read_vector_into(durations)?;
            }
        }
    } else {
        for index in 0..NUM_METRICS {
            layout.block_ptr_mut(base, BlockId::mld_cell_weights(index));
            layout.block_ptr_mut(base, BlockId::mld_cell_durations(index));
        }
    }

    if config.has(ArtifactKey::Mldgr) {
        let mut reader = FileReader::open(&config.path(ArtifactKey::Mldgr))?;
        let nodes: &mut [GraphNodeEntry] = layout.write_block_slice(base, BlockId::MldGraphNodeList);
        reader.read_vector_into(nodes)?;
        let edges: &mut [MldGraphEdgeEntry] =
            layout.write_block_slice(base, BlockId::MldGraphEdgeList);
        reader.read_vector_into(edges)?;
        let offsets: &mut [EdgeOffset] =
            layout.write_block_slice(base, BlockId::MldGraphNodeToOffset);
        reader.read_vector_into(offsets)?;

        let graph_connectivity_checksum = reader.read_u32()?;
        if graph_connectivity_checksum != turns_connectivity_checksum {
            return Err(Error::ChecksumMismatch {
                file_a: config.path(ArtifactKey::Edges),
                checksum_a: turns_connectivity_checksum,
                file_b: config.path(ArtifactKey::Mldgr),
                checksum_b: graph_connectivity_checksum,
            });
        }
    } else {
        layout.block_ptr_mut(base, BlockId::MldGraphNodeList);
        layout.block_ptr_mut(base, BlockId::MldGraphEdgeList);
        layout.block_ptr_mut(base, BlockId::MldGraphNodeToOffset);
    }

    {
        let mut reader = FileReader::open(&config.path(ArtifactKey::ManeuverOverrides))?;
        let overrides: &mut [ManeuverOverride] =
            layout.write_block_slice(base, BlockId::ManeuverOverrides);
        reader.read_vector_into(overrides)?;
        let sequences: &mut [NodeId] =
            layout.write_block_slice(base, BlockId::ManeuverOverrideNodeSequences);
        reader.read_vector_into(sequences)?;
    }

    Ok(())
}
