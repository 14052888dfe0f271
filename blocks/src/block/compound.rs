use std::fmt;

use crate::block::Block;
use crate::block::header::{HeaderBlock, HeaderKind, Headers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    ForLoop,
    While,
    IfElse,
}

impl CompoundKind {
    /// Header kinds this variant accepts. All of them are required for evaluation.
    pub fn permitted_headers(self) -> &'static [HeaderKind] {
        match self {
            CompoundKind::ForLoop => &[HeaderKind::Init, HeaderKind::Condition, HeaderKind::Increment],
            CompoundKind::While | CompoundKind::IfElse => &[HeaderKind::Condition],
        }
    }
}

impl fmt::Display for CompoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompoundKind::ForLoop => write!(f, "for loop"),
            CompoundKind::While => write!(f, "while loop"),
            CompoundKind::IfElse => write!(f, "if/else"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    If,
    Else,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::If => write!(f, "if"),
            SectionKind::Else => write!(f, "else"),
        }
    }
}

/// A named child list belonging to an if/else block.
#[derive(Debug)]
pub struct Section {
    pub kind: SectionKind,
    pub children: Vec<Block>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Section {
            kind,
            children: Vec::new(),
        }
    }
}

/// Body shared by for and while loops.
#[derive(Debug, Default)]
pub struct Loop {
    pub headers: Headers,
    pub children: Vec<Block>,
}

#[derive(Debug)]
pub struct IfElse {
    pub headers: Headers,
    pub if_section: Section,
    pub else_section: Section,
}

impl Default for IfElse {
    fn default() -> Self {
        IfElse {
            headers: Headers::default(),
            if_section: Section::new(SectionKind::If),
            else_section: Section::new(SectionKind::Else),
        }
    }
}

impl IfElse {
    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::If => &self.if_section,
            SectionKind::Else => &self.else_section,
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::If => &mut self.if_section,
            SectionKind::Else => &mut self.else_section,
        }
    }
}

/// Why a header was not attached. The header is handed back untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRejected {
    pub header: HeaderBlock,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The compound variant has no slot for this kind.
    NotPermitted,
    /// A header of this kind is already attached.
    Duplicate,
}

impl fmt::Display for HeaderRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RejectReason::NotPermitted => {
                write!(f, "{} header is not accepted here", self.header.kind())
            }
            RejectReason::Duplicate => {
                write!(f, "a {} header is already attached", self.header.kind())
            }
        }
    }
}

impl std::error::Error for HeaderRejected {}

/// A container block that controls the execution of its children.
#[derive(Debug)]
pub enum CompoundBlock {
    ForLoop(Loop),
    While(Loop),
    IfElse(IfElse),
}

impl CompoundBlock {
    pub fn kind(&self) -> CompoundKind {
        match self {
            CompoundBlock::ForLoop(_) => CompoundKind::ForLoop,
            CompoundBlock::While(_) => CompoundKind::While,
            CompoundBlock::IfElse(_) => CompoundKind::IfElse,
        }
    }

    pub fn headers(&self) -> &Headers {
        match self {
            CompoundBlock::ForLoop(l) | CompoundBlock::While(l) => &l.headers,
            CompoundBlock::IfElse(ie) => &ie.headers,
        }
    }

    fn headers_mut(&mut self) -> &mut Headers {
        match self {
            CompoundBlock::ForLoop(l) | CompoundBlock::While(l) => &mut l.headers,
            CompoundBlock::IfElse(ie) => &mut ie.headers,
        }
    }

    pub fn permits(&self, kind: HeaderKind) -> bool {
        self.kind().permitted_headers().contains(&kind)
    }

    /// Attach a header. Fails if the variant has no slot for its kind or the
    /// slot is already taken; the header already in place is left intact.
    pub fn attach_header(&mut self, header: HeaderBlock) -> Result<(), HeaderRejected> {
        if !self.permits(header.kind()) {
            return Err(HeaderRejected {
                header,
                reason: RejectReason::NotPermitted,
            });
        }
        self.headers_mut().insert(header).map_err(|header| HeaderRejected {
            header,
            reason: RejectReason::Duplicate,
        })
    }

    pub fn detach_header(&mut self, kind: HeaderKind) -> Option<HeaderBlock> {
        self.headers_mut().take(kind)
    }

    /// Required header kinds that are not attached.
    pub fn missing_headers(&self) -> Vec<HeaderKind> {
        let headers = self.headers();
        self.kind()
            .permitted_headers()
            .iter()
            .copied()
            .filter(|kind| !headers.has(*kind))
            .collect()
    }

    /// Every child list of this block. If/else yields the if section first.
    pub fn child_lists(&self) -> Vec<&Vec<Block>> {
        match self {
            CompoundBlock::ForLoop(l) | CompoundBlock::While(l) => vec![&l.children],
            CompoundBlock::IfElse(ie) => vec![&ie.if_section.children, &ie.else_section.children],
        }
    }

    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Block>> {
        match self {
            CompoundBlock::ForLoop(l) | CompoundBlock::While(l) => vec![&mut l.children],
            CompoundBlock::IfElse(ie) => {
                vec![&mut ie.if_section.children, &mut ie.else_section.children]
            }
        }
    }
}
