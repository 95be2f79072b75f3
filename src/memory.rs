/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Binary buddy allocator over a fixed-size memory pool.
//!
//! The pool is modelled as a binary tree.  The root spans the whole pool;
//! splitting a node produces two "buddy" children of half its size, the left
//! one sharing the parent's offset.  An allocation claims a free leaf of
//! exactly the rounded request size, splitting larger free leaves on the way
//! down in left-first depth-first order.  Freeing marks the leaf free again
//! and merges free buddy pairs back into their parent, cascading towards the
//! root:
//!
//! ```text
//!        1024                      after allocate(100), allocate(240):
//!       /    \
//!     512    512                   [128:A] [128:F] [256:A] [512:F]
//!    /   \
//!  256   256
//!  / \
//! 128 128
//! ```
//!
//! Request sizes are rounded up to the next power of two, never below
//! [`MIN_BLOCK`].  Allocation failure is an ordinary `None` — the caller
//! decides whether to retry later or give up.

use tracing::trace;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default pool size in bytes.
pub const POOL_SIZE: usize = 1024;

/// Smallest leaf the allocator will hand out, in bytes.  Requests below this
/// (including zero) are rounded up to it.
pub const MIN_BLOCK: usize = 8;

// ── Block ─────────────────────────────────────────────────────────────────────

/// A claimed byte range inside the pool.
///
/// `offset` and `size` together identify the leaf that backs the block; they
/// are all the allocator needs to find it again on [`BuddyAllocator::deallocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Start offset within the pool.
    pub offset: usize,
    /// Block size in bytes (a power of two, ≥ [`MIN_BLOCK`]).
    pub size: usize,
}

impl Block {
    /// Inclusive `(start, end)` byte range of this block.
    pub fn range(&self) -> (usize, usize) {
        (self.offset, self.offset + self.size - 1)
    }
}

// ── Leaf rendering ────────────────────────────────────────────────────────────

/// Snapshot of one leaf, in pool order.  Produced by
/// [`BuddyAllocator::leaves`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafState {
    pub offset: usize,
    pub size: usize,
    pub free: bool,
}

// ── Tree node ─────────────────────────────────────────────────────────────────

/// One node of the buddy tree.
///
/// A node either is a leaf (`children = None`) or has exactly two children of
/// half its size.  Only leaves can be allocated; the `free` flag of an
/// internal node is meaningless while its children exist.
#[derive(Debug)]
struct BuddyNode {
    size: usize,
    offset: usize,
    free: bool,
    children: Option<Box<(BuddyNode, BuddyNode)>>,
}

impl BuddyNode {
    fn leaf(size: usize, offset: usize) -> Self {
        Self {
            size,
            offset,
            free: true,
            children: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Split a free leaf into two free buddies of half the size.
    fn split(&mut self) {
        debug_assert!(self.is_leaf() && self.free && self.size >= 2 * MIN_BLOCK);
        let half = self.size / 2;
        self.children = Some(Box::new((
            BuddyNode::leaf(half, self.offset),
            BuddyNode::leaf(half, self.offset + half),
        )));
    }

    /// Left-first depth-first search for a free leaf of exactly `size`,
    /// splitting larger free leaves on the way down.  Returns the offset of
    /// the claimed leaf.
    fn allocate(&mut self, size: usize) -> Option<usize> {
        if let Some(children) = self.children.as_mut() {
            if let Some(offset) = children.0.allocate(size) {
                return Some(offset);
            }
            return children.1.allocate(size);
        }
        if !self.free || self.size < size {
            return None;
        }
        if self.size == size {
            self.free = false;
            return Some(self.offset);
        }
        self.split();
        match self.children.as_mut() {
            Some(children) => {
                if let Some(offset) = children.0.allocate(size) {
                    return Some(offset);
                }
                children.1.allocate(size)
            }
            None => None,
        }
    }

    /// Free the leaf matching `(offset, size)`.  Returns `true` if a leaf was
    /// actually freed; on the way back up, merges children that are both free
    /// leaves so the cascade reaches the root.
    fn free_block(&mut self, offset: usize, size: usize) -> bool {
        let Some(children) = self.children.as_mut() else {
            if self.offset == offset && self.size == size && !self.free {
                self.free = true;
                return true;
            }
            return false;
        };

        let freed = if offset < children.1.offset {
            children.0.free_block(offset, size)
        } else {
            children.1.free_block(offset, size)
        };
        let buddies_free = freed && children.0.is_free_leaf() && children.1.is_free_leaf();
        if buddies_free {
            self.children = None;
            self.free = true;
        }
        freed
    }

    fn is_free_leaf(&self) -> bool {
        self.is_leaf() && self.free
    }

    /// In-order leaf enumeration.
    fn collect_leaves(&self, out: &mut Vec<LeafState>) {
        match self.children.as_ref() {
            None => out.push(LeafState {
                offset: self.offset,
                size: self.size,
                free: self.free,
            }),
            Some(children) => {
                children.0.collect_leaves(out);
                children.1.collect_leaves(out);
            }
        }
    }
}

// ── BuddyAllocator ────────────────────────────────────────────────────────────

/// The buddy allocator: a binary tree over a contiguous pool.
///
/// The pool size must be a power of two ≥ [`MIN_BLOCK`].  The allocator never
/// touches actual memory — blocks are byte ranges the simulation bookkeeps,
/// not pointers.
#[derive(Debug)]
pub struct BuddyAllocator {
    root: BuddyNode,
}

impl Default for BuddyAllocator {
    fn default() -> Self {
        Self::new(POOL_SIZE)
    }
}

impl BuddyAllocator {
    /// Create an allocator with a single free root spanning `pool_size`
    /// bytes.
    ///
    /// # Panics
    /// Panics if `pool_size` is not a power of two or is below
    /// [`MIN_BLOCK`] — both are configuration mistakes the settings loader
    /// rejects before an allocator is ever constructed.
    pub fn new(pool_size: usize) -> Self {
        assert!(
            pool_size.is_power_of_two() && pool_size >= MIN_BLOCK,
            "pool size must be a power of two >= {MIN_BLOCK}, got {pool_size}"
        );
        Self {
            root: BuddyNode::leaf(pool_size, 0),
        }
    }

    /// Total pool size in bytes.
    pub fn pool_size(&self) -> usize {
        self.root.size
    }

    /// Round a request up to the size class actually allocated:
    /// `max(MIN_BLOCK, next power of two)`.
    pub fn round_request(bytes: usize) -> usize {
        bytes.max(MIN_BLOCK).next_power_of_two()
    }

    /// Allocate `bytes` (rounded up per [`Self::round_request`]).
    ///
    /// Returns `None` when the request exceeds the pool or no free leaf of
    /// the rounded size can be carved out.
    pub fn allocate(&mut self, bytes: usize) -> Option<Block> {
        let size = Self::round_request(bytes);
        if size > self.root.size {
            return None;
        }
        let offset = self.root.allocate(size)?;
        trace!(offset, size, requested = bytes, "block allocated");
        Some(Block { offset, size })
    }

    /// Release `block` and merge free buddy pairs back up to the root.
    ///
    /// Freeing a block that is already free, or one the allocator never
    /// handed out, is a no-op.
    pub fn deallocate(&mut self, block: Block) {
        if self.root.free_block(block.offset, block.size) {
            trace!(offset = block.offset, size = block.size, "block freed");
        }
    }

    /// In-order snapshot of every leaf.
    pub fn leaves(&self) -> Vec<LeafState> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    /// Render the leaf states as the classic one-line layout, e.g.
    /// `[256:Allocated] [256:Free] [512:Free]`.
    pub fn layout(&self) -> String {
        self.leaves()
            .iter()
            .map(|leaf| {
                if leaf.free {
                    format!("[{}:Free]", leaf.size)
                } else {
                    format!("[{}:Allocated]", leaf.size)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Sum of the sizes of all allocated leaves.
    pub fn allocated_bytes(&self) -> usize {
        self.leaves()
            .iter()
            .filter(|leaf| !leaf.free)
            .map(|leaf| leaf.size)
            .sum()
    }

    /// `true` when the tree has collapsed back to a single free root.
    pub fn is_pristine(&self) -> bool {
        self.root.is_free_leaf()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Rounding ──────────────────────────────────────────────────────────────

    #[test]
    fn requests_round_to_size_classes() {
        assert_eq!(BuddyAllocator::round_request(0), MIN_BLOCK);
        assert_eq!(BuddyAllocator::round_request(1), MIN_BLOCK);
        assert_eq!(BuddyAllocator::round_request(5), 8);
        assert_eq!(BuddyAllocator::round_request(8), 8);
        assert_eq!(BuddyAllocator::round_request(9), 16);
        assert_eq!(BuddyAllocator::round_request(100), 128);
        assert_eq!(BuddyAllocator::round_request(240), 256);
        assert_eq!(BuddyAllocator::round_request(1024), 1024);
    }

    #[test]
    fn allocated_block_sizes_match_rounding() {
        let mut alloc = BuddyAllocator::default();
        assert_eq!(alloc.allocate(5).unwrap().size, 8);
        assert_eq!(alloc.allocate(9).unwrap().size, 16);
    }

    #[test]
    fn full_pool_allocation_succeeds_once() {
        let mut alloc = BuddyAllocator::default();
        let block = alloc.allocate(1024).unwrap();
        assert_eq!(block.offset, 0);
        assert_eq!(block.size, 1024);
        assert!(alloc.allocate(1).is_none());
    }

    #[test]
    fn oversized_request_fails() {
        let mut alloc = BuddyAllocator::default();
        assert!(alloc.allocate(1025).is_none());
        assert!(alloc.is_pristine(), "failed allocation must not split");
    }

    // ── Placement ─────────────────────────────────────────────────────────────

    #[test]
    fn allocation_is_left_first() {
        let mut alloc = BuddyAllocator::default();
        let a = alloc.allocate(512).unwrap();
        let b = alloc.allocate(512).unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 512);
        assert!(alloc.allocate(1).is_none(), "pool is full");
    }

    #[test]
    fn blocks_never_overlap() {
        let mut alloc = BuddyAllocator::default();
        let mut taken: Vec<Block> = Vec::new();
        for bytes in [100, 240, 30, 8, 60, 120, 16] {
            if let Some(block) = alloc.allocate(bytes) {
                taken.push(block);
            }
        }
        for (i, a) in taken.iter().enumerate() {
            for b in &taken[i + 1..] {
                let (a0, a1) = a.range();
                let (b0, b1) = b.range();
                assert!(a1 < b0 || b1 < a0, "blocks {a:?} and {b:?} overlap");
            }
        }
        let total: usize = taken.iter().map(|b| b.size).sum();
        assert!(total <= POOL_SIZE);
        assert_eq!(alloc.allocated_bytes(), total);
    }

    #[test]
    fn block_range_is_inclusive() {
        let block = Block {
            offset: 256,
            size: 128,
        };
        assert_eq!(block.range(), (256, 383));
    }

    // ── Free & merge ──────────────────────────────────────────────────────────

    #[test]
    fn split_then_merge_collapses_to_root() {
        // allocate(100) -> 128, allocate(240) -> 256, allocate(30) -> 32
        let mut alloc = BuddyAllocator::default();
        let a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(240).unwrap();
        let c = alloc.allocate(30).unwrap();
        alloc.deallocate(a);
        alloc.deallocate(c);
        alloc.deallocate(b);
        assert!(alloc.is_pristine());
        assert_eq!(alloc.layout(), "[1024:Free]");
    }

    #[test]
    fn reverse_order_free_restores_initial_state() {
        let mut alloc = BuddyAllocator::default();
        let blocks: Vec<Block> = [8, 16, 32, 64, 128]
            .iter()
            .map(|&n| alloc.allocate(n).unwrap())
            .collect();
        for block in blocks.into_iter().rev() {
            alloc.deallocate(block);
        }
        assert!(alloc.is_pristine());
    }

    #[test]
    fn single_alloc_free_round_trip() {
        for bytes in [1, 8, 100, 512, 1024] {
            let mut alloc = BuddyAllocator::default();
            let block = alloc.allocate(bytes).unwrap();
            alloc.deallocate(block);
            assert!(alloc.is_pristine(), "round-trip of {bytes} bytes left debris");
        }
    }

    #[test]
    fn double_free_is_idempotent() {
        let mut alloc = BuddyAllocator::default();
        let a = alloc.allocate(100).unwrap();
        let b = alloc.allocate(100).unwrap();
        alloc.deallocate(a);
        alloc.deallocate(a);
        assert_eq!(alloc.allocated_bytes(), b.size);
    }

    #[test]
    fn freeing_unknown_offset_is_a_noop() {
        let mut alloc = BuddyAllocator::default();
        let block = alloc.allocate(100).unwrap();
        alloc.deallocate(Block {
            offset: 999,
            size: 64,
        });
        assert_eq!(alloc.allocated_bytes(), block.size);
    }

    #[test]
    fn free_makes_space_reusable() {
        let mut alloc = BuddyAllocator::default();
        let a = alloc.allocate(512).unwrap();
        let _b = alloc.allocate(512).unwrap();
        assert!(alloc.allocate(512).is_none());
        alloc.deallocate(a);
        let c = alloc.allocate(512).unwrap();
        assert_eq!(c.offset, 0, "freed left half should be reused");
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn layout_shows_leaves_in_pool_order() {
        let mut alloc = BuddyAllocator::default();
        let _a = alloc.allocate(100).unwrap(); // 128 at offset 0
        let _b = alloc.allocate(240).unwrap(); // 256 at offset 256
        assert_eq!(
            alloc.layout(),
            "[128:Allocated] [128:Free] [256:Allocated] [512:Free]"
        );
    }

    #[test]
    fn leaves_report_offsets() {
        let mut alloc = BuddyAllocator::default();
        let _ = alloc.allocate(512).unwrap();
        let leaves = alloc.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].offset, 0);
        assert!(!leaves[0].free);
        assert_eq!(leaves[1].offset, 512);
        assert!(leaves[1].free);
    }

    #[test]
    fn smaller_pool_is_honoured() {
        let mut alloc = BuddyAllocator::new(64);
        assert!(alloc.allocate(65).is_none());
        let a = alloc.allocate(64).unwrap();
        assert_eq!(a.size, 64);
    }
}
