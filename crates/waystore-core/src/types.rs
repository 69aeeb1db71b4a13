//! Element types of the published blocks
//!
//! Every type here is `#[repr(C)]` plain old data: the data populator streams
//! artifact bytes straight into shared memory and readers reinterpret block
//! bodies according to the element type documented for each block identifier.

/// Node identifier in the node-based or edge-based graph
pub type NodeId = u32;
/// Routing weight of an edge or cell entry
pub type EdgeWeight = i32;
/// Travel duration of an edge or cell entry, deciseconds
pub type EdgeDuration = i32;
/// Penalty applied to a turn, weight or duration units
pub type TurnPenalty = i16;
/// Index into the datasource name table
pub type DatasourceId = u8;
/// Index into the entry class table
pub type EntryClassId = u16;
/// Index into the turn lane data table
pub type LaneDataId = u16;
/// Index into the bearing class table
pub type BearingClassId = u32;
/// Bearing discretized to 360/256 degree steps
pub type DiscreteBearing = u16;
/// Cell identifier within one partition level
pub type CellId = u32;
/// Partition cell assignment of a node, all levels packed
pub type PartitionId = u64;
/// Bit mask describing the lanes of one turn
pub type TurnLaneMask = u16;
/// Offset of a node's first edge in the multi-level graph edge array
pub type EdgeOffset = u64;

/// Fixed-point WGS84 coordinate, 1e-6 degree units
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coordinate {
    pub lon: i32,
    pub lat: i32,
}

/// Per-node data of the edge-based graph
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeBasedNode {
    pub geometry_id: u32,
    pub component_id: u32,
    pub annotation_id: u32,
    pub flags: u32,
}

/// Annotation shared by edges that carry identical metadata
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeBasedEdgeAnnotation {
    pub name_id: u32,
    pub class_data: u8,
    pub travel_mode: u8,
    pub is_left_hand_driving: u8,
    _pad: u8,
}

/// Guidance instruction attached to a turn
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnInstruction {
    pub ty: u8,
    pub direction_modifier: u8,
}

/// Bearing of the road before or after a turn, 360/256 degree steps
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnBearing(pub u8);

/// Node of the packed R-tree over the road network geometry
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RTreeNode {
    pub min_lon: i32,
    pub max_lon: i32,
    pub min_lat: i32,
    pub max_lat: i32,
    pub first_child: u32,
    pub child_count: u32,
}

/// One row of the turn lane data table
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneTupleIdPair {
    pub lanes_in_turn: u8,
    pub first_lane_from_right: u8,
    pub lane_description_id: u16,
}

/// Allowed-entry bit set of one intersection class
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryClass(pub u32);

/// Block of the two-level range table over bearing values
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeTableBlock {
    pub offsets: [u8; 16],
}

/// Maneuver override keyed by a node path through the network
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManeuverOverride {
    pub node_sequence_offset_begin: u32,
    pub node_sequence_offset_end: u32,
    pub instruction_node: NodeId,
    pub override_type: u8,
    pub direction: u8,
    _pad: [u8; 2],
}

/// Node entry of a static adjacency-array graph
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphNodeEntry {
    pub first_edge: u32,
}

/// Edge entry of the contracted query graph
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChGraphEdgeEntry {
    pub target: NodeId,
    pub weight: EdgeWeight,
    pub duration: EdgeDuration,
    /// shortcut middle node, or the packed turn id for original edges
    pub id: u32,
    pub flags: u32,
}

/// Edge entry of the multi-level edge-based graph
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MldGraphEdgeEntry {
    pub target: NodeId,
    pub turn_id: u32,
    pub flags: u32,
}

/// Per-level metadata of the multi-level partition
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelData {
    pub num_levels: u32,
    _pad: u32,
    pub lidx_to_offset: [u64; 9],
    pub lidx_to_mask: [u64; 9],
    pub bit_to_level: [u8; 64],
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            num_levels: 0,
            _pad: 0,
            lidx_to_offset: [0; 9],
            lidx_to_mask: [0; 9],
            bit_to_level: [0; 64],
        }
    }
}

/// Boundary-node bookkeeping of one partition cell
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellData {
    pub value_offset: u64,
    pub source_boundary_offset: u32,
    pub destination_boundary_offset: u32,
    pub num_source_nodes: u32,
    pub num_destination_nodes: u32,
}

/// Maximum number of named datasources
pub const MAX_DATASOURCES: usize = 255;
/// Bytes reserved for one datasource name
pub const DATASOURCE_NAME_LEN: usize = 32;

/// Fixed-size table of datasource names, stored as a single block entry
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Datasources {
    pub num_sources: u32,
    pub lengths: [u32; MAX_DATASOURCES],
    pub names: [u8; MAX_DATASOURCES * DATASOURCE_NAME_LEN],
}

impl Default for Datasources {
    fn default() -> Self {
        Self {
            num_sources: 0,
            lengths: [0; MAX_DATASOURCES],
            names: [0; MAX_DATASOURCES * DATASOURCE_NAME_LEN],
        }
    }
}

/// Profile-wide routing properties, stored as a single block entry
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ProfileProperties {
    pub traffic_signal_penalty: i32,
    pub u_turn_penalty: i32,
    pub max_speed_for_map_matching: f64,
    pub continue_straight_at_waypoint: u8,
    pub use_turn_restrictions: u8,
    pub left_hand_driving: u8,
    pub fallback_to_duration: u8,
    pub weight_name: [u8; 32],
    pub weight_precision: u32,
    pub force_split_edges: u8,
    _pad: [u8; 3],
}

impl Default for ProfileProperties {
    fn default() -> Self {
        let mut weight_name = [0u8; 32];
        weight_name[..8].copy_from_slice(b"duration");
        Self {
            traffic_signal_penalty: 0,
            u_turn_penalty: 0,
            max_speed_for_map_matching: 180.0 / 3.6,
            continue_straight_at_waypoint: 1,
            use_turn_restrictions: 0,
            left_hand_driving: 0,
            fallback_to_duration: 1,
            weight_name,
            weight_precision: 1,
            force_split_edges: 0,
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_sizes_are_stable() {
        // These sizes are part of the artifact and region wire contract
        assert_eq!(std::mem::size_of::<Coordinate>(), 8);
        assert_eq!(std::mem::size_of::<EdgeBasedNode>(), 16);
        assert_eq!(std::mem::size_of::<NodeBasedEdgeAnnotation>(), 8);
        assert_eq!(std::mem::size_of::<TurnInstruction>(), 2);
        assert_eq!(std::mem::size_of::<TurnBearing>(), 1);
        assert_eq!(std::mem::size_of::<RTreeNode>(), 24);
        assert_eq!(std::mem::size_of::<LaneTupleIdPair>(), 4);
        assert_eq!(std::mem::size_of::<RangeTableBlock>(), 16);
        assert_eq!(std::mem::size_of::<ManeuverOverride>(), 16);
        assert_eq!(std::mem::size_of::<ChGraphEdgeEntry>(), 20);
        assert_eq!(std::mem::size_of::<MldGraphEdgeEntry>(), 12);
        assert_eq!(std::mem::size_of::<CellData>(), 24);
    }

    #[test]
    fn test_datasources_is_fixed_size() {
        assert_eq!(
            std::mem::size_of::<Datasources>(),
            4 + 4 * MAX_DATASOURCES + MAX_DATASOURCES * DATASOURCE_NAME_LEN
        );
    }
}
