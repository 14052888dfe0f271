pub mod mutation;

use crate::block::Block;

pub use mutation::{Container, Location, StructuralError};

/// A composed program: an ordered list of top-level slots.
///
/// Slots are evaluated in index order. An empty slot is a gap left by
/// [`Program::clear_slot`] or read from a persisted program; it is skipped.
#[derive(Debug, Default)]
pub struct Program {
    pub slots: Vec<Option<Block>>,
}

impl Program {
    /// A program whose first slot is the locked initializer `x = initial`.
    pub fn new(initial: f64) -> Self {
        Program {
            slots: vec![Some(Block::initializer(initial))],
        }
    }

    /// Populated top-level blocks in evaluation order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of blocks in the tree, nested ones included.
    pub fn block_count(&self) -> usize {
        let mut count = 0;
        for block in self.blocks() {
            block.walk(&mut |_| count += 1);
        }
        count
    }
}
