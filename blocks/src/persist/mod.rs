//! Plain-data form of a program, for saving and loading.
//!
//! Only what affects behavior is kept: block kinds, statement text, header
//! values and child order. Identities and stacking layers are not persisted,
//! so loading always yields fresh block ids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::compound::{CompoundBlock, IfElse, Loop, Section, SectionKind};
use crate::block::header::{Condition, DEFAULT_COUNTER, Headers, Increment, Init};
use crate::block::{Block, BlockKind};
use crate::instruction::Code;
use crate::program::Program;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockRecord {
    Statement {
        text: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        locked: bool,
    },
    Print,
    Break,
    AddLoopVariable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    For {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        counter: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        increment: Option<f64>,
        #[serde(default)]
        body: Vec<BlockRecord>,
    },
    While {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(default)]
        body: Vec<BlockRecord>,
    },
    IfElse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(default)]
        if_body: Vec<BlockRecord>,
        #[serde(default)]
        else_body: Vec<BlockRecord>,
    },
    /// An empty top-level slot. Ignored inside child lists.
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(default)]
    pub slots: Vec<BlockRecord>,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write program: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to read program: {0}")]
    Deserialize(#[from] toml::de::Error),
}

pub fn serialize(program: &Program) -> ProgramRecord {
    ProgramRecord {
        slots: program
            .slots
            .iter()
            .map(|slot| slot.as_ref().map_or(BlockRecord::Empty, serialize_block))
            .collect(),
    }
}

pub fn serialize_block(block: &Block) -> BlockRecord {
    match &block.kind {
        BlockKind::Statement(code) => BlockRecord::Statement {
            text: code.source().to_string(),
            locked: block.locked,
        },
        BlockKind::Print => BlockRecord::Print,
        BlockKind::Break => BlockRecord::Break,
        BlockKind::AddLoopVariable { name } => BlockRecord::AddLoopVariable {
            name: (name != DEFAULT_COUNTER).then(|| name.clone()),
        },
        BlockKind::Compound(compound) => {
            let headers = compound.headers();
            let condition = headers
                .condition
                .as_ref()
                .map(|c| c.code.source().to_string());
            match compound {
                CompoundBlock::ForLoop(l) => BlockRecord::For {
                    counter: headers
                        .init
                        .as_ref()
                        .filter(|init| init.counter != DEFAULT_COUNTER)
                        .map(|init| init.counter.clone()),
                    init: headers.init.as_ref().map(|init| init.value),
                    condition,
                    increment: headers.increment.as_ref().map(|inc| inc.value),
                    body: serialize_list(&l.children),
                },
                CompoundBlock::While(l) => BlockRecord::While {
                    condition,
                    body: serialize_list(&l.children),
                },
                CompoundBlock::IfElse(ie) => BlockRecord::IfElse {
                    condition,
                    if_body: serialize_list(&ie.if_section.children),
                    else_body: serialize_list(&ie.else_section.children),
                },
            }
        }
    }
}

fn serialize_list(blocks: &[Block]) -> Vec<BlockRecord> {
    blocks.iter().map(serialize_block).collect()
}

/// Rebuild a program. Statement and condition text is parsed again; text
/// that no longer parses is kept and degrades when evaluated.
pub fn deserialize(record: ProgramRecord) -> Program {
    Program {
        slots: record.slots.into_iter().map(deserialize_block).collect(),
    }
}

/// Rebuild one block, or `None` for an empty slot.
pub fn deserialize_block(record: BlockRecord) -> Option<Block> {
    let kind = match record {
        BlockRecord::Statement { text, locked } => {
            let mut block = Block::statement(text);
            block.locked = locked;
            return Some(block);
        }
        BlockRecord::Print => BlockKind::Print,
        BlockRecord::Break => BlockKind::Break,
        BlockRecord::AddLoopVariable { name } => BlockKind::AddLoopVariable {
            name: name.unwrap_or_else(|| DEFAULT_COUNTER.to_string()),
        },
        BlockRecord::For {
            counter,
            init,
            condition,
            increment,
            body,
        } => BlockKind::Compound(CompoundBlock::ForLoop(Loop {
            headers: Headers {
                init: init.map(|value| Init {
                    counter: counter.unwrap_or_else(|| DEFAULT_COUNTER.to_string()),
                    value,
                }),
                condition: condition.map(deserialize_condition),
                increment: increment.map(|value| Increment { value }),
            },
            children: deserialize_list(body),
        })),
        BlockRecord::While { condition, body } => {
            BlockKind::Compound(CompoundBlock::While(Loop {
                headers: Headers {
                    condition: condition.map(deserialize_condition),
                    ..Headers::default()
                },
                children: deserialize_list(body),
            }))
        }
        BlockRecord::IfElse {
            condition,
            if_body,
            else_body,
        } => BlockKind::Compound(CompoundBlock::IfElse(IfElse {
            headers: Headers {
                condition: condition.map(deserialize_condition),
                ..Headers::default()
            },
            if_section: Section {
                kind: SectionKind::If,
                children: deserialize_list(if_body),
            },
            else_section: Section {
                kind: SectionKind::Else,
                children: deserialize_list(else_body),
            },
        })),
        BlockRecord::Empty => return None,
    };
    Some(Block::new(kind))
}

fn deserialize_list(records: Vec<BlockRecord>) -> Vec<Block> {
    records.into_iter().filter_map(deserialize_block).collect()
}

fn deserialize_condition(text: String) -> Condition {
    Condition {
        code: Code::condition(text),
    }
}

pub fn to_toml(program: &Program) -> Result<String, PersistError> {
    Ok(toml::to_string(&serialize(program))?)
}

pub fn from_toml(source: &str) -> Result<Program, PersistError> {
    let record: ProgramRecord = toml::from_str(source)?;
    Ok(deserialize(record))
}
