//! Block descriptor for the published layout

/// Descriptor of one typed array inside the published region.
///
/// The struct is part of the on-wire catalog header and must keep a stable
/// layout across writer and reader builds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Size of a single entry in bytes
    pub entry_size: u64,
    /// Alignment of the block body, power of two
    pub entry_align: u64,
    /// Number of entries
    pub num_entries: u64,
    /// Total body size in bytes, `entry_size * num_entries`
    pub byte_size: u64,
}

impl Block {
    /// Describe `num_entries` packed values of type `T`
    pub fn for_type<T>(num_entries: u64) -> Self {
        let entry_size = std::mem::size_of::<T>() as u64;
        Self {
            entry_size,
            entry_align: std::mem::align_of::<T>() as u64,
            num_entries,
            byte_size: entry_size * num_entries,
        }
    }

    /// A descriptor is valid iff its alignment is a non-zero power of two
    pub fn is_valid(&self) -> bool {
        self.entry_align > 0 && self.entry_align.is_power_of_two()
    }
}

impl Default for Block {
    fn default() -> Self {
        Self {
            entry_size: 0,
            entry_align: 1,
            num_entries: 0,
            byte_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_and_empty() {
        let block = Block::default();
        assert!(block.is_valid());
        assert_eq!(block.num_entries, 0);
        assert_eq!(block.byte_size, 0);
        assert_eq!(block.entry_align, 1);
    }

    #[test]
    fn test_for_type_derives_byte_size() {
        let block = Block::for_type::<u32>(10);
        assert_eq!(block.entry_size, 4);
        assert_eq!(block.entry_align, 4);
        assert_eq!(block.byte_size, 40);
    }

    #[test]
    fn test_zeroed_alignment_is_invalid() {
        let block = Block {
            entry_align: 0,
            ..Block::default()
        };
        assert!(!block.is_valid());
    }
}
