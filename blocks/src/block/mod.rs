pub mod compound;
pub mod header;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::block::compound::{CompoundBlock, IfElse, Loop};
use crate::block::header::{DEFAULT_COUNTER, HeaderBlock, format_number};
use crate::instruction::{Code, Instruction};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a block. Allocated when the block is constructed and never
/// persisted; a deserialized tree gets fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    fn fresh() -> Self {
        BlockId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The unit of a visual program.
///
/// A block lives in exactly one place in a tree. It is moved, never copied:
/// removal hands it back by value and insertion takes it by value.
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    /// Locked blocks (the program's initializer) cannot be removed.
    pub locked: bool,
    /// Stacking order among siblings. Has no effect on evaluation.
    pub layer: u32,
    pub kind: BlockKind,
}

#[derive(Debug)]
pub enum BlockKind {
    /// Mutation of `x`, e.g. `x += 5` or `x = x * x`.
    Statement(Code<Vec<Instruction>>),
    /// Emits `x` to the output channel; `x` is unchanged.
    Print,
    /// Halts the nearest enclosing loop.
    Break,
    /// `x += <counter>` for the named loop counter.
    AddLoopVariable { name: String },
    Compound(CompoundBlock),
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            id: BlockId::fresh(),
            locked: false,
            layer: 0,
            kind,
        }
    }

    pub fn statement(source: impl Into<String>) -> Self {
        Block::new(BlockKind::Statement(Code::statement(source)))
    }

    pub fn print() -> Self {
        Block::new(BlockKind::Print)
    }

    pub fn break_loop() -> Self {
        Block::new(BlockKind::Break)
    }

    pub fn add_loop_variable() -> Self {
        Block::new(BlockKind::AddLoopVariable {
            name: DEFAULT_COUNTER.to_string(),
        })
    }

    pub fn for_loop() -> Self {
        Block::new(BlockKind::Compound(CompoundBlock::ForLoop(Loop::default())))
    }

    pub fn while_loop() -> Self {
        Block::new(BlockKind::Compound(CompoundBlock::While(Loop::default())))
    }

    pub fn if_else() -> Self {
        Block::new(BlockKind::Compound(CompoundBlock::IfElse(IfElse::default())))
    }

    /// The locked first statement of a program: `x = <value>`.
    pub fn initializer(value: f64) -> Self {
        // Block text has no NaN or infinity literals
        let literal = if value.is_nan() {
            "0 / 0".to_string()
        } else if value.is_infinite() {
            if value > 0.0 { "1 / 0" } else { "-1 / 0" }.to_string()
        } else {
            format_number(value)
        };
        let mut block = Block::statement(format!("x = {}", literal));
        block.locked = true;
        block
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn as_compound(&self) -> Option<&CompoundBlock> {
        match &self.kind {
            BlockKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut CompoundBlock> {
        match &mut self.kind {
            BlockKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    /// Informational source text for this block.
    pub fn label(&self) -> String {
        match &self.kind {
            BlockKind::Statement(code) => code.source().to_string(),
            BlockKind::Print => "print(x);".to_string(),
            BlockKind::Break => "break;".to_string(),
            BlockKind::AddLoopVariable { name } => format!("x += {};", name),
            BlockKind::Compound(compound) => {
                let headers = compound.headers();
                let slot = |header: Option<HeaderBlock>| {
                    header.map_or_else(|| "?".to_string(), |h| h.label())
                };
                let condition = slot(headers.condition.clone().map(HeaderBlock::Condition));
                match compound {
                    CompoundBlock::ForLoop(_) => {
                        let init = slot(headers.init.clone().map(HeaderBlock::Init));
                        let counter = headers
                            .init
                            .as_ref()
                            .map_or(DEFAULT_COUNTER, |init| init.counter.as_str());
                        let increment = headers
                            .increment
                            .as_ref()
                            .map_or_else(|| "?".to_string(), |inc| inc.label(counter));
                        format!("for ({}; {}; {})", init, condition, increment)
                    }
                    CompoundBlock::While(_) => format!("while ({})", condition),
                    CompoundBlock::IfElse(_) => format!("if ({}) {{ }} else {{ }}", condition),
                }
            }
        }
    }

    /// Visit this block and every block nested below it, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        if let Some(compound) = self.as_compound() {
            for list in compound.child_lists() {
                for child in list {
                    child.walk(visit);
                }
            }
        }
    }
}
