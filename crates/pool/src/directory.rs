//! Block directory
//!
//! The directory partitions the pool into contiguous ranges. Records live in
//! an arena (`Vec` of slots) and are chained in offset order through `next`
//! and `prev` indices, so destroying a record never invalidates the indices of
//! the others.
//!
//! ## Invariants
//!
//! - Walking `next` from `first` visits every live record exactly once
//! - The first record starts at offset 0
//! - `record.offset + record.size == successor.offset`
//! - Sizes sum to the pool size
//! - `prev` mirrors `next`

use crate::handle::BlockHandle;

/// Metadata describing one contiguous range of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockRecord {
    pub(crate) offset: usize,
    pub(crate) size: usize,
    pub(crate) free: bool,
    pub(crate) next: Option<u32>,
    pub(crate) prev: Option<u32>,
}

/// Arena slot: a record plus the generation used to validate handles
#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<BlockRecord>,
}

/// Public, copyable view of a block record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Byte offset of the block inside the pool
    pub offset: usize,
    /// Block length in bytes
    pub size: usize,
    /// Whether the block is available for allocation
    pub free: bool,
}

impl From<&BlockRecord> for BlockInfo {
    fn from(record: &BlockRecord) -> Self {
        Self {
            offset: record.offset,
            size: record.size,
            free: record.free,
        }
    }
}

/// Address-ordered chain of block records backed by an arena
#[derive(Debug)]
pub(crate) struct BlockDirectory {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    first: Option<u32>,
    len: usize,
}

impl BlockDirectory {
    /// Creates a directory holding one free record that spans `pool_size` bytes
    pub(crate) fn new(pool_size: usize) -> Self {
        let mut directory = Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            first: None,
            len: 0,
        };
        let index = directory.insert(BlockRecord {
            offset: 0,
            size: pool_size,
            free: true,
            next: None,
            prev: None,
        });
        directory.first = Some(index);
        directory
    }

    /// Index of the lowest-offset record
    #[cfg(test)]
    pub(crate) fn first(&self) -> Option<u32> {
        self.first
    }

    /// Number of live records
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn get(&self, index: u32) -> Option<&BlockRecord> {
        self.slots.get(index as usize)?.record.as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, index: u32) -> Option<&mut BlockRecord> {
        self.slots.get_mut(index as usize)?.record.as_mut()
    }

    /// Current handle for the record at `index`
    pub(crate) fn handle(&self, index: u32) -> Option<BlockHandle> {
        let slot = self.slots.get(index as usize)?;
        slot.record
            .as_ref()
            .map(|_| BlockHandle::new(index, slot.generation))
    }

    /// Resolves a handle to its slot index, rejecting stale generations
    pub(crate) fn resolve(&self, handle: BlockHandle) -> Option<u32> {
        let slot = self.slots.get(handle.index() as usize)?;
        match slot.record {
            Some(_) if slot.generation == handle.generation() => Some(handle.index()),
            _ => None,
        }
    }

    /// Invalidates every handle issued for `index` so far
    pub(crate) fn retire_handle(&mut self, index: u32) {
        if let Some(slot) = self.slots.get_mut(index as usize) {
            slot.generation = slot.generation.wrapping_add(1);
        }
    }

    /// Links a new record directly after `index`
    pub(crate) fn insert_after(
        &mut self,
        index: u32,
        offset: usize,
        size: usize,
        free: bool,
    ) -> u32 {
        let next = self.get(index).and_then(|record| record.next);
        let new_index = self.insert(BlockRecord {
            offset,
            size,
            free,
            next,
            prev: Some(index),
        });
        if let Some(record) = self.get_mut(index) {
            record.next = Some(new_index);
        }
        if let Some(next) = next.and_then(|next| self.get_mut(next)) {
            next.prev = Some(new_index);
        }
        new_index
    }

    /// Unlinks the record at `index` and releases its slot
    ///
    /// The record's bytes are not given to anyone; callers fold its size into
    /// a neighbour first.
    pub(crate) fn remove(&mut self, index: u32) -> Option<BlockRecord> {
        let record = self.slots.get_mut(index as usize)?.record.take()?;
        match record.prev.and_then(|prev| self.get_mut(prev)) {
            Some(prev) => prev.next = record.next,
            None => self.first = record.next,
        }
        if let Some(next) = record.next.and_then(|next| self.get_mut(next)) {
            next.prev = record.prev;
        }
        self.retire_handle(index);
        self.vacant.push(index);
        self.len -= 1;
        Some(record)
    }

    /// Iterates `(index, record)` pairs in offset order
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            directory: self,
            cursor: self.first,
        }
    }

    /// Verifies the structural invariants listed in the module docs
    pub(crate) fn validate(&self, pool_size: usize) -> Result<(), String> {
        let mut expected_offset = 0usize;
        let mut prev: Option<u32> = None;
        let mut visited = 0usize;

        for (index, record) in self.iter() {
            visited += 1;
            if visited > self.len {
                return Err("record chain contains a cycle".to_string());
            }
            if record.prev != prev {
                return Err(format!(
                    "record #{index} has prev {:?}, expected {prev:?}",
                    record.prev
                ));
            }
            if record.offset != expected_offset {
                return Err(format!(
                    "record #{index} starts at {}, expected {expected_offset}",
                    record.offset
                ));
            }
            expected_offset = record
                .offset
                .checked_add(record.size)
                .ok_or_else(|| format!("record #{index} overflows the address space"))?;
            prev = Some(index);
        }

        if visited != self.len {
            return Err(format!(
                "{visited} records reachable, {} live",
                self.len
            ));
        }
        if expected_offset != pool_size {
            return Err(format!(
                "record sizes sum to {expected_offset}, pool holds {pool_size}"
            ));
        }
        Ok(())
    }

    fn insert(&mut self, record: BlockRecord) -> u32 {
        self.len += 1;
        if let Some(index) = self.vacant.pop() {
            self.slots[index as usize].record = Some(record);
            return index;
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        index
    }
}

/// Offset-order iterator over the directory
pub(crate) struct Iter<'a> {
    directory: &'a BlockDirectory,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (u32, &'a BlockRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let record = self.directory.get(index)?;
        self.cursor = record.next;
        Some((index, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_directory_spans_pool() {
        let directory = BlockDirectory::new(256);
        let records: Vec<_> = directory.iter().map(|(_, r)| BlockInfo::from(r)).collect();
        assert_eq!(
            records,
            vec![BlockInfo {
                offset: 0,
                size: 256,
                free: true
            }]
        );
        assert!(directory.validate(256).is_ok());
    }

    #[test]
    fn test_insert_after_links_both_ways() {
        let mut directory = BlockDirectory::new(100);
        let first = directory.first().unwrap();
        directory.get_mut(first).unwrap().size = 40;
        let second = directory.insert_after(first, 40, 60, true);

        assert_eq!(directory.get(first).unwrap().next, Some(second));
        assert_eq!(directory.get(second).unwrap().prev, Some(first));
        assert_eq!(directory.len(), 2);
        assert!(directory.validate(100).is_ok());
    }

    #[test]
    fn test_remove_reuses_slot_with_new_generation() {
        let mut directory = BlockDirectory::new(100);
        let first = directory.first().unwrap();
        directory.get_mut(first).unwrap().size = 40;
        let second = directory.insert_after(first, 40, 60, true);
        let stale = directory.handle(second).unwrap();

        directory.remove(second).unwrap();
        directory.get_mut(first).unwrap().size = 100;
        assert_eq!(directory.resolve(stale), None);

        directory.get_mut(first).unwrap().size = 30;
        let reused = directory.insert_after(first, 30, 70, true);
        assert_eq!(reused, second);
        assert_ne!(directory.handle(reused), Some(stale));
        assert!(directory.validate(100).is_ok());
    }

    #[test]
    fn test_generation_wraps_after_u32_max_retirements() {
        let mut directory = BlockDirectory::new(10);
        let first = directory.first().unwrap();
        let issued = directory.handle(first).unwrap();

        directory.slots[first as usize].generation = u32::MAX;
        assert_eq!(directory.resolve(issued), None);

        directory.retire_handle(first);
        assert_eq!(directory.resolve(issued), Some(first));
    }

    #[test]
    fn test_remove_first_moves_head() {
        let mut directory = BlockDirectory::new(10);
        let first = directory.first().unwrap();
        directory.get_mut(first).unwrap().size = 0;
        let second = directory.insert_after(first, 0, 10, true);

        directory.remove(first).unwrap();
        assert_eq!(directory.first(), Some(second));
        assert_eq!(directory.get(second).unwrap().prev, None);
        assert!(directory.validate(10).is_ok());
    }

    #[test]
    fn test_validate_detects_gap() {
        let mut directory = BlockDirectory::new(100);
        let first = directory.first().unwrap();
        directory.get_mut(first).unwrap().size = 40;
        directory.insert_after(first, 50, 50, true);

        let err = directory.validate(100).unwrap_err();
        assert!(err.contains("expected 40"));
    }

    #[test]
    fn test_validate_detects_conservation_loss() {
        let mut directory = BlockDirectory::new(100);
        let first = directory.first().unwrap();
        directory.get_mut(first).unwrap().size = 90;

        let err = directory.validate(100).unwrap_err();
        assert!(err.contains("sum to 90"));
    }
}
