pub mod block;
pub mod catalog;
pub mod instruction;
pub mod parser;
pub mod persist;
pub mod problem;
pub mod program;

pub use block::compound::{CompoundBlock, SectionKind};
pub use block::header::{HeaderBlock, HeaderKind};
pub use block::{Block, BlockId, BlockKind};
pub use problem::Problem;
pub use program::{Container, Location, Program, StructuralError};
