//! Source model & type inference. `SPEC_FULL.md` §4.2.
//!
//! [`Analyzer`] owns the frame tree and identifier tables built from a
//! [`crate::token::TokenList`]; [`frame`]/[`identifier`]/[`typeinfo`] hold
//! the data these analyses produce.

pub mod analyzer;
pub mod frame;
pub mod identifier;
pub mod typeinfo;

pub use analyzer::Analyzer;
pub use frame::{FrameId, FrameKind, Parameter, SourceFrame};
pub use identifier::{Assignment, IdentifierTable, SourceIdentifier};
pub use typeinfo::{NameId, TypeInfo};
