//! The indentation-aware, incremental Python lexer. See `SPEC_FULL.md` §2.
//!
//! [`Scanner`] is the pure per-line scan function; [`Lexer`] owns a
//! [`crate::token::TokenList`] and drives `Scanner` line by line, feeding
//! each line's carried-over state (open brackets, open multi-line string)
//! forward from the previous committed line.

mod keywords;
mod scanner;

pub use scanner::{LexerConfig, LineCarry, Scanner};

use crate::token::{LineHandle, TokenList};

/// Owns the document's token stream and re-lexes lines on demand. Mirrors
/// how the rest of this crate separates a pure scan step from the stateful
/// store it populates (see [`crate::token::list::TokenList::commit_line`]).
pub struct Lexer {
    scanner: Scanner,
    tokens: TokenList,
}

impl Lexer {
    pub fn new(config: LexerConfig) -> Self {
        Lexer { scanner: Scanner::new(config), tokens: TokenList::new() }
    }

    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenList {
        &mut self.tokens
    }

    /// Lex an entire document from scratch, discarding any existing tokens.
    pub fn load(&mut self, source: &str) {
        self.scanner.reset();
        self.tokens = TokenList::new();
        let mut carry = LineCarry::initial();
        for line_text in split_lines(source) {
            let handle = self.tokens.append_line(line_text.to_string());
            let scan = self.scanner.scan_line(line_text, &carry);
            carry = carry_from_scan(&scan);
            self.tokens.commit_line(handle, scan);
        }
    }

    /// Re-lex a single line after an edit, threading the carried state from
    /// the previous line in and re-lexing every following line whose
    /// leading state depends on it (an open bracket or multi-line string).
    pub fn relex_line(&mut self, line: LineHandle, new_text: String) {
        if let Some(l) = self.tokens.line_mut(line) {
            l.text = new_text;
        } else {
            return;
        }

        let mut current = Some(line);
        let mut carry = self
            .tokens
            .line(line)
            .and_then(|l| l.prev())
            .and_then(|p| self.tokens.line(p))
            .map(LineCarry::from_line)
            .unwrap_or_else(LineCarry::initial);

        while let Some(handle) = current {
            let text = self.tokens.line(handle).map(|l| l.text().to_string()).unwrap_or_default();
            let prev_end_state = self.tokens.line(handle).map(|l| l.end_state);
            let prev_hash = self.tokens.line_content_hash(handle);
            let scan = self.scanner.scan_line(&text, &carry);
            let next_carry = carry_from_scan(&scan);
            let content_changed = prev_hash != scan_content_hash(&scan, &text);
            let needs_downstream_relex = content_changed
                || prev_end_state != Some(scan.end_state)
                || scan.open_parens != 0
                || scan.open_brackets != 0
                || scan.open_braces != 0;
            self.tokens.commit_line(handle, scan);
            carry = next_carry;

            let next = self.tokens.line(handle).and_then(|l| l.next());
            if handle != line && !needs_downstream_relex {
                break;
            }
            current = next;
        }
    }

    pub fn config(&self) -> &LexerConfig {
        self.scanner.config()
    }
}

fn carry_from_scan(scan: &crate::token::LineScan) -> LineCarry {
    LineCarry {
        end_state: scan.end_state,
        resume_options: scan
            .tokens
            .last()
            .map(|t| t.options)
            .filter(|_| scan.end_state.is_some())
            .unwrap_or(crate::token::TokenOptions::NONE),
        open_parens: scan.open_parens,
        open_brackets: scan.open_brackets,
        open_braces: scan.open_braces,
        continues_next: false,
        is_parameter_line: scan.is_parameter_line,
    }
}

/// Hash of what a [`crate::token::LineScan`]'s tokens would read as text,
/// computed without committing the scan. Lets [`Lexer::relex_line`] compare
/// against [`TokenList::line_content_hash`] and stop propagating downstream
/// once a re-scan turns out to be byte-identical to what was already there.
fn scan_content_hash(scan: &crate::token::LineScan, text: &str) -> u64 {
    scan.tokens.iter().fold(0u64, |acc, t| {
        let slice = &text[t.span.start as usize..t.span.end as usize];
        acc.wrapping_mul(0x0000_0100_0000_01b3).wrapping_add(crate::token::content_hash(slice))
    })
}

fn split_lines(source: &str) -> Vec<&str> {
    if source.is_empty() {
        return vec![""];
    }
    source.split('\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn loads_a_small_module() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("def f():\n    return 1\n");
        assert_eq!(lexer.tokens().line_count(), 3);
    }

    #[test]
    fn relex_line_updates_tokens_in_place() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("x = 1\n");
        let line = lexer.tokens().line_at(0).unwrap();
        lexer.relex_line(line, "x = 2".to_string());
        let tok = lexer.tokens().line(line).unwrap().back().unwrap();
        let token = lexer.tokens().token(tok).unwrap();
        assert_eq!(token.kind, TokenKind::NumberDecInt);
        assert_eq!(token.text("x = 2"), "2");
    }

    #[test]
    fn multiline_string_edit_relexes_following_lines() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("s = \"\"\"a\nb\"\"\"\nx = 1\n");
        let first = lexer.tokens().line_at(0).unwrap();
        assert!(lexer.tokens().line(first).unwrap().end_state.is_some());
    }

    #[test]
    fn scan_content_hash_matches_committed_line_hash() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("x = 1\n");
        let line = lexer.tokens().line_at(0).unwrap();
        let committed_hash = lexer.tokens().line_content_hash(line);

        let mut scanner = Scanner::new(LexerConfig::default());
        let scan = scanner.scan_line("x = 1", &LineCarry::initial());
        assert_eq!(scan_content_hash(&scan, "x = 1"), committed_hash);
    }

    #[test]
    fn relex_line_stops_propagating_once_downstream_content_is_unchanged() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("x = 1\ny = 2\nz = 3\n");
        let z_line = lexer.tokens().line_at(2).unwrap();
        let z_tok_before = lexer.tokens().line(z_line).unwrap().front().unwrap();

        // Editing `x` doesn't change carried state or `y`'s/`z`'s text, so
        // `y` gets re-scanned once to confirm nothing changed but `z` is
        // never touched.
        let x_line = lexer.tokens().line_at(0).unwrap();
        lexer.relex_line(x_line, "x = 9".to_string());

        let z_tok_after = lexer.tokens().line(z_line).unwrap().front().unwrap();
        assert_eq!(z_tok_before, z_tok_after);
    }
}
