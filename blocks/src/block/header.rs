use std::fmt;

use crate::instruction::Code;
use crate::instruction::value::Value;

/// Name of the loop counter when an init header does not choose one.
pub const DEFAULT_COUNTER: &str = "i";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Init,
    Condition,
    Increment,
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderKind::Init => write!(f, "init"),
            HeaderKind::Condition => write!(f, "condition"),
            HeaderKind::Increment => write!(f, "increment"),
        }
    }
}

/// Starting value of a for-loop counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Init {
    pub counter: String,
    pub value: f64,
}

/// Boolean expression used as a loop test or a branch selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub code: Code<Value>,
}

/// Signed per-iteration delta applied to the loop counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Increment {
    pub value: f64,
}

impl Increment {
    /// `counter += n`, or `counter -= n` for negative steps.
    pub fn label(&self, counter: &str) -> String {
        if self.value < 0.0 {
            format!("{} -= {}", counter, format_number(-self.value))
        } else {
            format!("{} += {}", counter, format_number(self.value))
        }
    }
}

/// A non-executing parameter block attached to a compound block's header slot.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderBlock {
    Init(Init),
    Condition(Condition),
    Increment(Increment),
}

impl HeaderBlock {
    pub fn init(value: f64) -> Self {
        HeaderBlock::Init(Init {
            counter: DEFAULT_COUNTER.to_string(),
            value,
        })
    }

    pub fn init_named(counter: impl Into<String>, value: f64) -> Self {
        HeaderBlock::Init(Init {
            counter: counter.into(),
            value,
        })
    }

    pub fn condition(source: impl Into<String>) -> Self {
        HeaderBlock::Condition(Condition {
            code: Code::condition(source),
        })
    }

    pub fn increment(value: f64) -> Self {
        HeaderBlock::Increment(Increment { value })
    }

    pub fn kind(&self) -> HeaderKind {
        match self {
            HeaderBlock::Init(_) => HeaderKind::Init,
            HeaderBlock::Condition(_) => HeaderKind::Condition,
            HeaderBlock::Increment(_) => HeaderKind::Increment,
        }
    }

    /// Display text, e.g. `let i = 0`, `x < 10`, `i -= 2`.
    pub fn label(&self) -> String {
        match self {
            HeaderBlock::Init(init) => {
                format!("let {} = {}", init.counter, format_number(init.value))
            }
            HeaderBlock::Condition(condition) => condition.code.source().to_string(),
            HeaderBlock::Increment(increment) => increment.label(DEFAULT_COUNTER),
        }
    }
}

/// The header slots of a compound block. At most one header of each kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    pub init: Option<Init>,
    pub condition: Option<Condition>,
    pub increment: Option<Increment>,
}

impl Headers {
    pub fn has(&self, kind: HeaderKind) -> bool {
        match kind {
            HeaderKind::Init => self.init.is_some(),
            HeaderKind::Condition => self.condition.is_some(),
            HeaderKind::Increment => self.increment.is_some(),
        }
    }

    /// Store a header in its slot. Returns the header back if the slot is taken.
    pub(crate) fn insert(&mut self, header: HeaderBlock) -> Result<(), HeaderBlock> {
        if self.has(header.kind()) {
            return Err(header);
        }
        match header {
            HeaderBlock::Init(init) => self.init = Some(init),
            HeaderBlock::Condition(condition) => self.condition = Some(condition),
            HeaderBlock::Increment(increment) => self.increment = Some(increment),
        }
        Ok(())
    }

    pub(crate) fn take(&mut self, kind: HeaderKind) -> Option<HeaderBlock> {
        match kind {
            HeaderKind::Init => self.init.take().map(HeaderBlock::Init),
            HeaderKind::Condition => self.condition.take().map(HeaderBlock::Condition),
            HeaderKind::Increment => self.increment.take().map(HeaderBlock::Increment),
        }
    }
}

/// Format a number the way block labels show it: integers without a
/// fractional part, everything else in shortest form.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
