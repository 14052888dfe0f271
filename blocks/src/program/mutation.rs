use std::fmt;

use thiserror::Error;

use crate::block::compound::{CompoundBlock, HeaderRejected, SectionKind};
use crate::block::header::{HeaderBlock, HeaderKind};
use crate::block::{Block, BlockId};
use crate::program::Program;

/// A place that holds an ordered list of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// The program's top-level slots.
    Program,
    /// The body of a for or while loop.
    Body(BlockId),
    /// One section of an if/else block.
    Section(BlockId, SectionKind),
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Program => write!(f, "program"),
            Container::Body(id) => write!(f, "body of {}", id),
            Container::Section(id, kind) => write!(f, "{} section of {}", kind, id),
        }
    }
}

/// Where a block currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub container: Container,
    pub index: usize,
}

/// A rejected tree edit. The tree is left as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    #[error("block {0} is not in this program")]
    NotFound(BlockId),

    #[error("block {0} is not a compound block and has no header slots")]
    NotCompound(BlockId),

    #[error("block {0} cannot hold child blocks")]
    NotAContainer(BlockId),

    #[error("{container} does not exist on block {block}")]
    WrongContainer { block: BlockId, container: Container },

    #[error("cannot attach header to {block}: {rejected}")]
    HeaderRejected {
        block: BlockId,
        rejected: HeaderRejected,
    },

    #[error("block {block} has no {kind} header")]
    HeaderMissing { block: BlockId, kind: HeaderKind },

    #[error("block {0} is already part of this program")]
    AlreadyAttached(BlockId),

    #[error("index {index} is out of bounds for a container of {len} blocks")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("block {0} is locked")]
    Locked(BlockId),
}

impl Program {
    pub fn find(&self, id: BlockId) -> Option<&Block> {
        find_in(self.slots.iter().flatten(), id)
    }

    pub fn find_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        find_in_mut(self.slots.iter_mut().flatten(), id)
    }

    pub fn locate(&self, id: BlockId) -> Option<Location> {
        let top = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|block| (index, block)));
        locate_in(top, Container::Program, id)
    }

    /// Insert `block` at `index` of `container`. `index` may equal the
    /// container's length to append.
    pub fn insert_child(
        &mut self,
        container: Container,
        index: usize,
        block: Block,
    ) -> Result<BlockId, StructuralError> {
        let mut duplicate = None;
        block.walk(&mut |b| {
            if duplicate.is_none() && self.find(b.id()).is_some() {
                duplicate = Some(b.id());
            }
        });
        if let Some(id) = duplicate {
            return Err(StructuralError::AlreadyAttached(id));
        }

        let id = block.id();
        match self.children_mut(container)? {
            Some(children) => {
                let len = children.len();
                if index > len {
                    return Err(StructuralError::IndexOutOfBounds { index, len });
                }
                children.insert(index, block);
            }
            None => {
                let len = self.slots.len();
                if index > len {
                    return Err(StructuralError::IndexOutOfBounds { index, len });
                }
                if let Some(Some(first)) = self.slots.first() {
                    if index == 0 && first.locked {
                        return Err(StructuralError::Locked(first.id()));
                    }
                }
                self.slots.insert(index, Some(block));
            }
        }
        Ok(id)
    }

    /// Append `block` to the end of `container`.
    pub fn push_child(
        &mut self,
        container: Container,
        block: Block,
    ) -> Result<BlockId, StructuralError> {
        let index = match self.children_mut(container)? {
            Some(children) => children.len(),
            None => self.slots.len(),
        };
        self.insert_child(container, index, block)
    }

    /// Detach the child `id` from `container` and hand it back.
    ///
    /// Removing a top-level block closes its slot so later blocks move up.
    pub fn remove_child(
        &mut self,
        container: Container,
        id: BlockId,
    ) -> Result<Block, StructuralError> {
        let location = self.locate(id).ok_or(StructuralError::NotFound(id))?;
        if location.container != container {
            return Err(StructuralError::WrongContainer {
                block: id,
                container,
            });
        }
        if self.find(id).is_some_and(|block| block.locked) {
            return Err(StructuralError::Locked(id));
        }

        match self.children_mut(container)? {
            Some(children) => Ok(children.remove(location.index)),
            None => self
                .slots
                .remove(location.index)
                .ok_or(StructuralError::NotFound(id)),
        }
    }

    /// Detach `id` from wherever it lives in the tree.
    pub fn remove(&mut self, id: BlockId) -> Result<Block, StructuralError> {
        let location = self.locate(id).ok_or(StructuralError::NotFound(id))?;
        self.remove_child(location.container, id)
    }

    /// Empty a top-level slot without moving the blocks after it.
    pub fn clear_slot(&mut self, index: usize) -> Result<Option<Block>, StructuralError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(StructuralError::IndexOutOfBounds { index, len })?;
        if let Some(block) = slot {
            if block.locked {
                return Err(StructuralError::Locked(block.id()));
            }
        }
        Ok(slot.take())
    }

    /// Drop empty top-level slots, keeping the order of the remaining blocks.
    pub fn compact(&mut self) {
        self.slots.retain(Option::is_some);
    }

    pub fn attach_header(
        &mut self,
        compound: BlockId,
        header: HeaderBlock,
    ) -> Result<(), StructuralError> {
        self.compound_mut(compound)?
            .attach_header(header)
            .map_err(|rejected| StructuralError::HeaderRejected {
                block: compound,
                rejected,
            })
    }

    pub fn detach_header(
        &mut self,
        compound: BlockId,
        kind: HeaderKind,
    ) -> Result<HeaderBlock, StructuralError> {
        self.compound_mut(compound)?
            .detach_header(kind)
            .ok_or(StructuralError::HeaderMissing {
                block: compound,
                kind,
            })
    }

    /// Raise `id` above its siblings. Only the stacking layer changes.
    pub fn move_to_top(&mut self, id: BlockId) -> Result<(), StructuralError> {
        let location = self.locate(id).ok_or(StructuralError::NotFound(id))?;
        let siblings: Vec<u32> = match self.children_mut(location.container)? {
            Some(children) => children.iter().filter(|b| b.id() != id).map(|b| b.layer).collect(),
            None => self.blocks().filter(|b| b.id() != id).map(|b| b.layer).collect(),
        };
        let top = siblings.into_iter().max();
        let block = self.find_mut(id).ok_or(StructuralError::NotFound(id))?;
        if let Some(top) = top {
            if block.layer <= top {
                block.layer = top.saturating_add(1);
            }
        }
        Ok(())
    }

    fn compound_mut(&mut self, id: BlockId) -> Result<&mut CompoundBlock, StructuralError> {
        self.find_mut(id)
            .ok_or(StructuralError::NotFound(id))?
            .as_compound_mut()
            .ok_or(StructuralError::NotCompound(id))
    }

    /// The child list behind `container`, or `None` for the top-level slots.
    fn children_mut(
        &mut self,
        container: Container,
    ) -> Result<Option<&mut Vec<Block>>, StructuralError> {
        let (id, section) = match container {
            Container::Program => return Ok(None),
            Container::Body(id) => (id, None),
            Container::Section(id, kind) => (id, Some(kind)),
        };
        let block = self.find_mut(id).ok_or(StructuralError::NotFound(id))?;
        let compound = block
            .as_compound_mut()
            .ok_or(StructuralError::NotAContainer(id))?;
        match (compound, section) {
            (CompoundBlock::ForLoop(l) | CompoundBlock::While(l), None) => Ok(Some(&mut l.children)),
            (CompoundBlock::IfElse(ie), Some(kind)) => Ok(Some(&mut ie.section_mut(kind).children)),
            _ => Err(StructuralError::WrongContainer {
                block: id,
                container,
            }),
        }
    }
}

fn find_in<'a>(blocks: impl Iterator<Item = &'a Block>, id: BlockId) -> Option<&'a Block> {
    for block in blocks {
        if block.id() == id {
            return Some(block);
        }
        if let Some(compound) = block.as_compound() {
            for children in compound.child_lists() {
                if let Some(found) = find_in(children.iter(), id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn find_in_mut<'a>(
    blocks: impl Iterator<Item = &'a mut Block>,
    id: BlockId,
) -> Option<&'a mut Block> {
    for block in blocks {
        if block.id() == id {
            return Some(block);
        }
        if let Some(compound) = block.as_compound_mut() {
            for children in compound.child_lists_mut() {
                if let Some(found) = find_in_mut(children.iter_mut(), id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn locate_in<'a>(
    blocks: impl Iterator<Item = (usize, &'a Block)>,
    container: Container,
    id: BlockId,
) -> Option<Location> {
    for (index, block) in blocks {
        if block.id() == id {
            return Some(Location { container, index });
        }
        let nested: Vec<(Container, &Vec<Block>)> = match block.as_compound() {
            Some(CompoundBlock::ForLoop(l) | CompoundBlock::While(l)) => {
                vec![(Container::Body(block.id()), &l.children)]
            }
            Some(CompoundBlock::IfElse(ie)) => vec![
                (
                    Container::Section(block.id(), SectionKind::If),
                    &ie.if_section.children,
                ),
                (
                    Container::Section(block.id(), SectionKind::Else),
                    &ie.else_section.children,
                ),
            ],
            None => Vec::new(),
        };
        for (inner, children) in nested {
            if let Some(found) = locate_in(children.iter().enumerate(), inner, id) {
                return Some(found);
            }
        }
    }
    None
}
