//! The per-line diagnostic channel. See `SPEC_FULL.md` §3 (`ScanInfo`) and
//! §7 (error handling design).

use super::TokenHandle;

/// Ordered so that `Severity::SyntaxError > Severity::Message` etc; the
/// ordering is the total order given in the spec:
/// `Message < Warning < Issue < LookupError < IndentError < SyntaxError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Message,
    Warning,
    Issue,
    LookupError,
    IndentError,
    SyntaxError,
}

#[derive(Debug, Clone)]
pub struct ParseMsg {
    pub token: TokenHandle,
    pub text: String,
    pub severity: Severity,
}

/// A line's diagnostic messages, keyed by the token that produced them.
#[derive(Debug, Clone, Default)]
pub struct ScanInfo {
    messages: Vec<ParseMsg>,
}

impl ScanInfo {
    pub fn new() -> Self {
        ScanInfo::default()
    }

    pub fn push(&mut self, token: TokenHandle, text: impl Into<String>, severity: Severity) {
        self.messages.push(ParseMsg { token, text: text.into(), severity });
    }

    /// Remove every message attached to `token` (used when a token is
    /// about to be replaced by a re-scan).
    pub fn clear_token(&mut self, token: TokenHandle) {
        self.messages.retain(|m| m.token != token);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ParseMsg] {
        &self.messages
    }

    pub fn for_token(&self, token: TokenHandle) -> impl Iterator<Item = &ParseMsg> {
        self.messages.iter().filter(move |m| m.token == token)
    }

    pub fn at_least(&self, min: Severity) -> impl Iterator<Item = &ParseMsg> {
        self.messages.iter().filter(move |m| m.severity >= min)
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.messages.iter().map(|m| m.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::arena::{Handle, Slab};

    #[test]
    fn severities_are_ordered_as_spec_states() {
        assert!(Severity::Message < Severity::Warning);
        assert!(Severity::Warning < Severity::Issue);
        assert!(Severity::Issue < Severity::LookupError);
        assert!(Severity::LookupError < Severity::IndentError);
        assert!(Severity::IndentError < Severity::SyntaxError);
    }

    #[test]
    fn filters_by_minimum_severity() {
        let mut slab: Slab<crate::token::Token> = Slab::new();
        let tok_a = slab.insert(dummy_token());
        let tok_b = slab.insert(dummy_token());
        let mut info = ScanInfo::new();
        info.push(tok_a, "lookup", Severity::LookupError);
        info.push(tok_b, "warn", Severity::Warning);
        let hits: Vec<_> = info.at_least(Severity::LookupError).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "lookup");
    }

    fn dummy_token() -> crate::token::Token {
        crate::token::Token::new(
            crate::token::TokenKind::Undetermined,
            0..0,
            crate::token::TokenOptions::NONE,
            Handle::default(),
            "",
        )
    }
}
