//! `pycore`: an embeddable Python source debugger plus a lexer/semantic
//! analyzer, extracted as a reusable core. See `SPEC_FULL.md` for the full
//! specification this crate implements.

pub mod debugger;
pub mod lexer;
pub mod semantic;
pub mod token;
