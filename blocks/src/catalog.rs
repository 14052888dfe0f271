//! The palette of blocks a player can place.

use crate::block::Block;
use crate::block::header::HeaderBlock;

/// A freshly made palette item, not yet attached anywhere.
#[derive(Debug)]
pub enum Item {
    Block(Block),
    Header(HeaderBlock),
}

pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub make: fn() -> Item,
}

impl CatalogEntry {
    pub fn create(&self) -> Item {
        (self.make)()
    }
}

static ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        id: "for_loop",
        name: "For Loop",
        description: "A classic for loop block",
        make: || Item::Block(Block::for_loop()),
    },
    CatalogEntry {
        id: "while_loop",
        name: "While Loop",
        description: "Loop while a condition is true",
        make: || Item::Block(Block::while_loop()),
    },
    CatalogEntry {
        id: "if_else",
        name: "If-Else Block",
        description: "Branch based on conditions",
        make: || Item::Block(Block::if_else()),
    },
    CatalogEntry {
        id: "add_1",
        name: "Add 1",
        description: "Increment value by 1",
        make: || Item::Block(Block::statement("x += 1;")),
    },
    CatalogEntry {
        id: "add_2",
        name: "Add 2",
        description: "Increment value by 2",
        make: || Item::Block(Block::statement("x += 2;")),
    },
    CatalogEntry {
        id: "add_5",
        name: "Add 5",
        description: "Increment value by 5",
        make: || Item::Block(Block::statement("x += 5;")),
    },
    CatalogEntry {
        id: "add_10",
        name: "Add 10",
        description: "Increment value by 10",
        make: || Item::Block(Block::statement("x += 10;")),
    },
    CatalogEntry {
        id: "sub_1",
        name: "Subtract 1",
        description: "Decrement value by 1",
        make: || Item::Block(Block::statement("x -= 1;")),
    },
    CatalogEntry {
        id: "sub_3",
        name: "Subtract 3",
        description: "Decrement value by 3",
        make: || Item::Block(Block::statement("x -= 3;")),
    },
    CatalogEntry {
        id: "mult_2",
        name: "Multiply ×2",
        description: "Multiply value by 2",
        make: || Item::Block(Block::statement("x *= 2;")),
    },
    CatalogEntry {
        id: "mult_3",
        name: "Multiply ×3",
        description: "Multiply value by 3",
        make: || Item::Block(Block::statement("x *= 3;")),
    },
    CatalogEntry {
        id: "mult_5",
        name: "Multiply ×5",
        description: "Multiply value by 5",
        make: || Item::Block(Block::statement("x *= 5;")),
    },
    CatalogEntry {
        id: "div_2",
        name: "Divide ÷2",
        description: "Divide value by 2",
        make: || Item::Block(Block::statement("x /= 2;")),
    },
    CatalogEntry {
        id: "div_3",
        name: "Divide ÷3",
        description: "Divide value by 3",
        make: || Item::Block(Block::statement("x /= 3;")),
    },
    CatalogEntry {
        id: "square",
        name: "Square",
        description: "Square the value",
        make: || Item::Block(Block::statement("x = x * x;")),
    },
    CatalogEntry {
        id: "mod_2",
        name: "Modulo 2",
        description: "Remainder when divided by 2",
        make: || Item::Block(Block::statement("x = x % 2;")),
    },
    CatalogEntry {
        id: "print",
        name: "Print",
        description: "Show the current value",
        make: || Item::Block(Block::print()),
    },
    CatalogEntry {
        id: "break",
        name: "Break",
        description: "Leave the enclosing loop",
        make: || Item::Block(Block::break_loop()),
    },
    CatalogEntry {
        id: "add_loop_var",
        name: "Add i",
        description: "Add the loop counter to the value",
        make: || Item::Block(Block::add_loop_variable()),
    },
    CatalogEntry {
        id: "inc_by_1",
        name: "Increment +1",
        description: "Increment by 1 in loops",
        make: || Item::Header(HeaderBlock::increment(1.0)),
    },
    CatalogEntry {
        id: "inc_by_2",
        name: "Increment +2",
        description: "Increment by 2 in loops",
        make: || Item::Header(HeaderBlock::increment(2.0)),
    },
    CatalogEntry {
        id: "inc_by_5",
        name: "Increment +5",
        description: "Increment by 5 in loops",
        make: || Item::Header(HeaderBlock::increment(5.0)),
    },
    CatalogEntry {
        id: "dec_by_1",
        name: "Decrement -1",
        description: "Decrement by 1 in loops",
        make: || Item::Header(HeaderBlock::increment(-1.0)),
    },
    CatalogEntry {
        id: "dec_by_2",
        name: "Decrement -2",
        description: "Decrement by 2 in loops",
        make: || Item::Header(HeaderBlock::increment(-2.0)),
    },
    CatalogEntry {
        id: "cond_less_10",
        name: "x < 10",
        description: "True when x less than 10",
        make: || Item::Header(HeaderBlock::condition("x < 10")),
    },
    CatalogEntry {
        id: "cond_less_20",
        name: "x < 20",
        description: "True when x less than 20",
        make: || Item::Header(HeaderBlock::condition("x < 20")),
    },
    CatalogEntry {
        id: "cond_greater_5",
        name: "x > 5",
        description: "True when x greater than 5",
        make: || Item::Header(HeaderBlock::condition("x > 5")),
    },
    CatalogEntry {
        id: "cond_greater_50",
        name: "x > 50",
        description: "True when x greater than 50",
        make: || Item::Header(HeaderBlock::condition("x > 50")),
    },
    CatalogEntry {
        id: "cond_equal_0",
        name: "x === 0",
        description: "True when x equals 0",
        make: || Item::Header(HeaderBlock::condition("x === 0")),
    },
    CatalogEntry {
        id: "cond_mod2_0",
        name: "x % 2 === 0",
        description: "True when x is even",
        make: || Item::Header(HeaderBlock::condition("x % 2 === 0")),
    },
    CatalogEntry {
        id: "init_0",
        name: "let i = 0",
        description: "Initialize loop at 0",
        make: || Item::Header(HeaderBlock::init(0.0)),
    },
    CatalogEntry {
        id: "init_1",
        name: "let i = 1",
        description: "Initialize loop at 1",
        make: || Item::Header(HeaderBlock::init(1.0)),
    },
    CatalogEntry {
        id: "init_5",
        name: "let i = 5",
        description: "Initialize loop at 5",
        make: || Item::Header(HeaderBlock::init(5.0)),
    },
    CatalogEntry {
        id: "init_10",
        name: "let i = 10",
        description: "Initialize loop at 10",
        make: || Item::Header(HeaderBlock::init(10.0)),
    },
    CatalogEntry {
        id: "double_squared",
        name: "Double Squared",
        description: "Square the value then double it",
        make: || Item::Block(Block::statement("x = x * x * 2;")),
    },
    CatalogEntry {
        id: "flip_sign",
        name: "Flip Sign",
        description: "Change value to its opposite",
        make: || Item::Block(Block::statement("x = -x;")),
    },
    CatalogEntry {
        id: "power_of_2",
        name: "Power of 2",
        description: "Raise 2 to the power of x",
        make: || Item::Block(Block::statement("x = Math.pow(2, x);")),
    },
    CatalogEntry {
        id: "factorial",
        name: "Factorial",
        description: "Calculate x! (if x <= 12)",
        make: || Item::Block(Block::statement("x = x > 12 ? x : factorial(x);")),
    },
];

pub fn entries() -> &'static [CatalogEntry] {
    ENTRIES
}

pub fn lookup(id: &str) -> Option<&'static CatalogEntry> {
    ENTRIES.iter().find(|entry| entry.id == id)
}

/// Make a fresh item from the palette entry `id`.
pub fn create(id: &str) -> Option<Item> {
    lookup(id).map(CatalogEntry::create)
}
