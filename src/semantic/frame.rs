use std::sync::atomic::{AtomicU64, Ordering};

use crate::token::TokenHandle;

use super::identifier::IdentifierTable;
use super::typeinfo::TypeInfo;

/// Unique, process-lifetime-monotonic id for a frame, generated the same
/// way `why_lib`'s `SymbolIndex` mints `SymbolId`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_frame_id() -> FrameId {
    FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::SeqCst))
}

/// What kind of lexical scope a [`SourceFrame`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Module,
    Function,
    Class,
    Lambda,
}

/// One positional/variadic/keyword parameter of a callable frame.
#[derive(Debug, Clone)]
pub enum Parameter {
    Positional { name: String, type_hint: TypeInfo },
    PositionalDefault { name: String, type_hint: TypeInfo, default: TokenHandle },
    Variable { name: String },
    Keyword { name: String },
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Positional { name, .. }
            | Parameter::PositionalDefault { name, .. }
            | Parameter::Variable { name }
            | Parameter::Keyword { name } => name,
        }
    }
}

/// A lexical scope rooted at a module, `def`, `class`, or `lambda`.
/// `SPEC_FULL.md` §4.2 describes construction and invalidation.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub id: FrameId,
    pub kind: FrameKind,
    pub name: String,
    pub header_token: TokenHandle,
    /// First token of the body (the token after the header's `:`).
    pub first: TokenHandle,
    /// Re-derived on demand from indentation; `None` once invalidated by an
    /// edit until the next analysis pass recomputes it.
    pub last: Option<TokenHandle>,
    pub header_indent: u32,
    pub parent: Option<FrameId>,
    pub children: Vec<FrameId>,
    pub parameters: Vec<Parameter>,
    pub identifiers: IdentifierTable,
    pub return_type: Option<TypeInfo>,
}

impl SourceFrame {
    pub fn new_module(header_token: TokenHandle) -> Self {
        SourceFrame {
            id: next_frame_id(),
            kind: FrameKind::Module,
            name: "<module>".to_string(),
            header_token,
            first: header_token,
            last: None,
            header_indent: 0,
            parent: None,
            children: Vec::new(),
            parameters: Vec::new(),
            identifiers: IdentifierTable::new(),
            return_type: None,
        }
    }

    pub fn new_child(
        kind: FrameKind,
        name: String,
        header_token: TokenHandle,
        first: TokenHandle,
        header_indent: u32,
        parent: FrameId,
    ) -> Self {
        SourceFrame {
            id: next_frame_id(),
            kind,
            name,
            header_token,
            first,
            last: None,
            header_indent,
            parent: Some(parent),
            children: Vec::new(),
            parameters: Vec::new(),
            identifiers: IdentifierTable::new(),
            return_type: None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, FrameKind::Function | FrameKind::Lambda)
    }

    pub fn invalidate_body(&mut self) {
        self.last = None;
    }
}
