//! # Ordered Index Module
//!
//! Implements an **ordered secondary index** from integer search keys to
//! the storage blocks holding records with that key.
//!
//! The index is a flat vector of [`Entry`] values sorted strictly ascending
//! by key. Each entry owns the blocks registered under its key together with
//! a reference count per block, so the same (key, block) pair can be
//! inserted many times and survives until the matching number of deletes.
//!
//! ## Invariants
//!
//! After every public call returns:
//!
//! 1. Entries are sorted ascending by key, with no duplicate keys.
//! 2. Within one entry, no block appears twice.
//! 3. Every block reference count is ≥ 1; a count reaching 0 removes the block.
//! 4. Every entry has at least one block; an emptied entry is removed.
//! 5. `size()` equals the sum of all block reference counts.
//!
//! [`OrdIndex::validate`] checks all five and is run by the tests after
//! every mutation.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

mod search;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::{DbIndex, IndexConfig};

/// Integer value records are indexed by.
pub type SearchKey = i64;

/// Opaque identifier of a storage block (e.g. a disk page number).
pub type BlockNo = u64;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Represents possible errors returned by [`OrdIndex`] operations.
///
/// The core operations (`lookup`, `insert`, `delete`, `size`) never fail;
/// a missing key is an empty result or a no-op.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The operation is part of the index surface but is not implemented.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Invalid configuration parameter.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Internal invariant violation detected by [`OrdIndex::validate`].
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

// ------------------------------------------------------------------------------------------------
// Index Core
// ------------------------------------------------------------------------------------------------

/// One (key, block) association and how many times it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockRef {
    /// The storage block.
    block: BlockNo,

    /// Outstanding inserts of this pair not yet cancelled by a delete.
    refs: usize,
}

/// All blocks currently associated with one search key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: SearchKey,

    /// Blocks in first-registration order. Never empty.
    blocks: Vec<BlockRef>,
}

impl Entry {
    fn new(key: SearchKey, block: BlockNo, blocks_hint: usize) -> Self {
        let mut blocks = Vec::with_capacity(blocks_hint);
        blocks.push(BlockRef { block, refs: 1 });
        Self { key, blocks }
    }

    fn position(&self, block: BlockNo) -> Option<usize> {
        self.blocks.iter().position(|b| b.block == block)
    }
}

/// Point-in-time counters describing an [`OrdIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Number of distinct search keys.
    pub key_count: usize,
    /// Number of distinct (key, block) pairs.
    pub block_ref_count: usize,
    /// Sum of all reference counts; equal to [`OrdIndex::size`].
    pub total_refs: usize,
}

/// An in-memory ordered index with reference-counted block associations.
///
/// See the [module documentation](self) for the invariants it maintains.
pub struct OrdIndex {
    /// Entries sorted strictly ascending by key.
    entries: Vec<Entry>,

    /// Sum of all `BlockRef::refs`, updated together with every mutation.
    total_refs: usize,

    /// Initial block capacity for newly created entries.
    blocks_per_key_hint: usize,
}

impl std::fmt::Debug for OrdIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdIndex")
            .field("keys", &self.entries.len())
            .field("size", &self.total_refs)
            .finish_non_exhaustive()
    }
}

impl Default for OrdIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OrdIndex {
    /// Creates an empty index with the default [`IndexConfig`].
    pub fn new() -> Self {
        Self::build(IndexConfig::default())
    }

    /// Creates an empty index with pre-allocated storage.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidConfig`] if any configuration parameter
    /// is out of range.
    pub fn with_config(config: IndexConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Allocates an empty index from an already validated config.
    fn build(config: IndexConfig) -> Self {
        info!(
            initial_capacity = config.initial_capacity,
            blocks_per_key_hint = config.blocks_per_key_hint,
            "index created"
        );

        Self {
            entries: Vec::with_capacity(config.initial_capacity),
            total_refs: 0,
            blocks_per_key_hint: config.blocks_per_key_hint,
        }
    }

    // --------------------------------------------------------------------------------------------
    // Read operations
    // --------------------------------------------------------------------------------------------

    /// Returns the blocks associated with `key`, each exactly once.
    ///
    /// Blocks appear in the order they were first registered under `key`.
    /// A block registered several times is still listed once. Returns an
    /// empty `Vec` if the key is absent.
    pub fn lookup(&self, key: SearchKey) -> Vec<BlockNo> {
        match search::find_exact(&self.entries, key) {
            Some(pos) => self.entries[pos].blocks.iter().map(|b| b.block).collect(),
            None => Vec::new(),
        }
    }

    /// Number of outstanding (key, block) registrations, counting multiplicity.
    pub fn size(&self) -> usize {
        self.total_refs
    }

    /// Returns `true` if no registrations are outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if at least one block is associated with `key`.
    pub fn contains_key(&self, key: SearchKey) -> bool {
        search::find_exact(&self.entries, key).is_some()
    }

    /// Number of distinct search keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Outstanding registrations of the exact (key, block) pair; 0 if absent.
    pub fn ref_count(&self, key: SearchKey, block: BlockNo) -> usize {
        search::find_exact(&self.entries, key)
            .and_then(|pos| {
                let entry = &self.entries[pos];
                entry.position(block).map(|i| entry.blocks[i].refs)
            })
            .unwrap_or(0)
    }

    /// Distinct search keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = SearchKey> + '_ {
        self.entries.iter().map(|e| e.key)
    }

    /// Returns current index counters.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            key_count: self.entries.len(),
            block_ref_count: self.entries.iter().map(|e| e.blocks.len()).sum(),
            total_refs: self.total_refs,
        }
    }

    /// String rendering of the index contents is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`IndexError::Unsupported`].
    pub fn render(&self) -> Result<String, IndexError> {
        Err(IndexError::Unsupported("string representation"))
    }

    // --------------------------------------------------------------------------------------------
    // Write operations
    // --------------------------------------------------------------------------------------------

    /// Registers one more record with `key` stored in `block`.
    ///
    /// # Behavior
    /// - A new key gets a new entry at its sorted position.
    /// - A new block under an existing key is appended to that entry.
    /// - An already registered pair has its reference count incremented.
    ///
    /// `size()` grows by exactly one on every call.
    pub fn insert(&mut self, key: SearchKey, block: BlockNo) {
        trace!(key, block, "insert() started");

        let pos = search::insertion_point(&self.entries, key);

        if self.entries.get(pos).is_some_and(|e| e.key == key) {
            let entry = &mut self.entries[pos];
            match entry.position(block) {
                Some(i) => {
                    entry.blocks[i].refs += 1;
                    trace!(key, block, refs = entry.blocks[i].refs, "block ref incremented");
                }
                None => {
                    entry.blocks.push(BlockRef { block, refs: 1 });
                    debug!(key, block, "block added to existing key");
                }
            }
        } else {
            // `pos` may equal `len`, which appends.
            let entry = Entry::new(key, block, self.blocks_per_key_hint);
            self.entries.insert(pos, entry);
            debug!(key, block, pos, "new key entry created");
        }

        self.total_refs += 1;
    }

    /// Removes one registration of `key` in `block`.
    ///
    /// # Behavior
    /// - The block's reference count is decremented and `size()` drops by one.
    /// - A block whose count reaches zero is removed from the entry.
    /// - An entry left without blocks is removed from the index.
    ///
    /// Deleting an absent key, or a block not registered under the key, is a
    /// no-op: nothing is returned to the caller, only a `warn` event is
    /// emitted.
    pub fn delete(&mut self, key: SearchKey, block: BlockNo) {
        trace!(key, block, "delete() started");

        let Some(pos) = search::find_exact(&self.entries, key) else {
            warn!(key, block, "delete of absent key ignored");
            return;
        };

        let entry = &mut self.entries[pos];
        let Some(i) = entry.position(block) else {
            warn!(key, block, "delete of unregistered block ignored");
            return;
        };

        entry.blocks[i].refs -= 1;
        self.total_refs -= 1;

        if entry.blocks[i].refs == 0 {
            entry.blocks.remove(i);
            debug!(key, block, "block ref removed");
        }

        if entry.blocks.is_empty() {
            self.entries.remove(pos);
            debug!(key, pos, "key entry removed");
        }
    }

    /// Drops every entry. `size()` becomes zero.
    pub fn clear(&mut self) {
        info!(
            keys = self.entries.len(),
            size = self.total_refs,
            "clearing index"
        );
        self.entries.clear();
        self.total_refs = 0;
    }

    // --------------------------------------------------------------------------------------------
    // Consistency check
    // --------------------------------------------------------------------------------------------

    /// Verifies the structural invariants listed in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvariantViolation`] describing the first
    /// broken invariant found.
    pub fn validate(&self) -> Result<(), IndexError> {
        let violation = |msg: String| {
            error!("{msg}");
            Err(IndexError::InvariantViolation(msg))
        };

        if let Some(w) = self.entries.windows(2).find(|w| w[0].key >= w[1].key) {
            return violation(format!(
                "entries out of order: key {} followed by {}",
                w[0].key, w[1].key
            ));
        }

        let mut sum = 0usize;
        for entry in &self.entries {
            if entry.blocks.is_empty() {
                return violation(format!("key {} has no blocks", entry.key));
            }

            let mut seen = HashSet::with_capacity(entry.blocks.len());
            for b in &entry.blocks {
                if !seen.insert(b.block) {
                    return violation(format!(
                        "key {} lists block {} twice",
                        entry.key, b.block
                    ));
                }
                if b.refs == 0 {
                    return violation(format!(
                        "key {} block {} has zero references",
                        entry.key, b.block
                    ));
                }
                sum += b.refs;
            }
        }

        if sum != self.total_refs {
            return violation(format!(
                "size {} does not match reference total {}",
                self.total_refs, sum
            ));
        }

        Ok(())
    }
}

impl DbIndex for OrdIndex {
    fn lookup(&self, key: SearchKey) -> Vec<BlockNo> {
        OrdIndex::lookup(self, key)
    }

    fn insert(&mut self, key: SearchKey, block: BlockNo) {
        OrdIndex::insert(self, key, block)
    }

    fn delete(&mut self, key: SearchKey, block: BlockNo) {
        OrdIndex::delete(self, key, block)
    }

    fn size(&self) -> usize {
        OrdIndex::size(self)
    }
}
