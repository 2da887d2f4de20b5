//! # ordindex
//!
//! An in-memory **ordered secondary index** for a block-oriented record
//! store. It maps integer search keys to the storage blocks that hold
//! records with that key, so a storage engine can answer "which blocks
//! might contain key K?" without scanning every block.
//!
//! ## Quick Start
//!
//! ```rust
//! use ordindex::{DbIndex, OrdIndex};
//!
//! let mut index = OrdIndex::new();
//!
//! // One record with key 5 written to block 100, another to block 101.
//! index.insert(5, 100);
//! index.insert(5, 101);
//!
//! // A second record with key 5 lands in block 100 again.
//! index.insert(5, 100);
//!
//! assert_eq!(index.lookup(5), vec![100, 101]);
//! assert_eq!(index.size(), 3);
//!
//! // Removing one record from block 100 keeps the association alive.
//! index.delete(5, 100);
//! assert_eq!(index.lookup(5), vec![100, 101]);
//!
//! index.delete(5, 100);
//! assert_eq!(index.lookup(5), vec![101]);
//! ```
//!
//! ## Features
//!
//! - **Non-unique keys** — any number of blocks per key.
//! - **Reference counting** — the same (key, block) pair may be registered
//!   repeatedly; the association disappears only when its last registration
//!   is deleted.
//! - **Binary search** — lookups, inserts and deletes locate their entry in
//!   `O(log n)` comparisons over a flat sorted vector.
//!
//! ## Concurrency
//!
//! [`OrdIndex`] is a plain single-owner value. Mutations take `&mut self`, so
//! sharing it across threads requires an exclusive lock around the whole
//! structure (e.g. `Mutex<OrdIndex>`).

pub mod index;

pub use index::{BlockNo, IndexError, IndexStats, OrdIndex, SearchKey};

// ------------------------------------------------------------------------------------------------
// Index contract
// ------------------------------------------------------------------------------------------------

/// The capability set a storage engine expects from a secondary index.
///
/// The engine calls [`insert`](DbIndex::insert) once per record written and
/// [`delete`](DbIndex::delete) once per record removed. Results of
/// [`lookup`](DbIndex::lookup) are *candidate* blocks: every block holding
/// the key is returned, but the caller still has to check the records
/// inside each block.
pub trait DbIndex {
    /// Returns every block associated with `key`, without duplicates.
    ///
    /// An absent key yields an empty `Vec`.
    fn lookup(&self, key: SearchKey) -> Vec<BlockNo>;

    /// Registers one more record with `key` stored in `block`.
    fn insert(&mut self, key: SearchKey, block: BlockNo);

    /// Removes one registration of `key` in `block`.
    ///
    /// Deleting a pair that was never inserted is a no-op.
    fn delete(&mut self, key: SearchKey, block: BlockNo);

    /// Number of outstanding registrations, counting multiplicity.
    fn size(&self) -> usize;
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Upper bound accepted for [`IndexConfig::initial_capacity`].
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

/// Upper bound accepted for [`IndexConfig::blocks_per_key_hint`].
pub const MAX_BLOCKS_PER_KEY_HINT: usize = 1 << 16;

/// Pre-allocation settings for an [`OrdIndex`].
///
/// The configuration only controls how much memory is reserved up front;
/// it never changes the behaviour of the index. Validated by
/// [`OrdIndex::with_config`].
///
/// # Example
///
/// ```rust
/// use ordindex::{IndexConfig, OrdIndex};
///
/// let index = OrdIndex::with_config(IndexConfig {
///     initial_capacity: 4096,
///     ..IndexConfig::default()
/// })
/// .unwrap();
/// assert!(index.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of distinct keys to reserve space for.
    ///
    /// Default: 0. Must be ≤ [`MAX_INITIAL_CAPACITY`].
    pub initial_capacity: usize,

    /// Block slots reserved for each newly created key.
    ///
    /// Default: 1. Must be in `1..=`[`MAX_BLOCKS_PER_KEY_HINT`].
    pub blocks_per_key_hint: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            blocks_per_key_hint: 1,
        }
    }
}

impl IndexConfig {
    /// Validates all configuration parameters.
    pub(crate) fn validate(&self) -> Result<(), IndexError> {
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(IndexError::InvalidConfig(format!(
                "initial_capacity must be <= {MAX_INITIAL_CAPACITY}"
            )));
        }
        if self.blocks_per_key_hint < 1 {
            return Err(IndexError::InvalidConfig(
                "blocks_per_key_hint must be >= 1".into(),
            ));
        }
        if self.blocks_per_key_hint > MAX_BLOCKS_PER_KEY_HINT {
            return Err(IndexError::InvalidConfig(format!(
                "blocks_per_key_hint must be <= {MAX_BLOCKS_PER_KEY_HINT}"
            )));
        }
        Ok(())
    }
}
