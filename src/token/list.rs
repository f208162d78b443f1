use super::arena::Slab;
use super::{LineHandle, Token, TokenHandle, TokenKind, TokenLine, TokenOptions};

/// One token produced by the lexer for a line, before it has been committed
/// into the document-wide stream (i.e. before it has a `line` handle or
/// `prev`/`next` links). See [`crate::lexer::Lexer::tokenize_line`].
#[derive(Debug, Clone)]
pub struct ScannedToken {
    pub kind: TokenKind,
    pub span: std::ops::Range<u32>,
    pub options: TokenOptions,
}

/// Everything the lexer derives from a single line, ready to be committed
/// into a [`TokenList`] by [`TokenList::commit_line`].
#[derive(Debug, Clone, Default)]
pub struct LineScan {
    pub tokens: Vec<ScannedToken>,
    pub indent: u32,
    pub open_parens: i32,
    pub open_brackets: i32,
    pub open_braces: i32,
    pub block_delta: i32,
    pub is_continuation: bool,
    pub is_parameter_line: bool,
    pub end_state: super::LexEndState,
    pub unfinished: Vec<usize>,
    /// `(token index, message, severity)` triples the scanner wants attached
    /// to this line's [`super::scan_info::ScanInfo`] once tokens are committed.
    pub diagnostics: Vec<(usize, String, super::scan_info::Severity)>,
}

/// The document-level owner of every token and line. Lines are kept in
/// document order both by an index (for O(1) `line_at`) and by intrusive
/// `prev`/`next` links on [`TokenLine`] (for the doubly-linked traversal
/// `SPEC_FULL.md` §3 describes); tokens form one global doubly-linked
/// stream threaded through their owning lines.
#[derive(Default)]
pub struct TokenList {
    tokens: Slab<Token>,
    lines: Slab<TokenLine>,
    order: Vec<LineHandle>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList::default()
    }

    pub fn line_count(&self) -> usize {
        self.order.len()
    }

    /// Negative indices count from the end, per `SPEC_FULL.md` §3.
    pub fn line_at(&self, index: i64) -> Option<LineHandle> {
        let len = self.order.len() as i64;
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 || resolved >= len {
            return None;
        }
        self.order.get(resolved as usize).copied()
    }

    pub fn line(&self, handle: LineHandle) -> Option<&TokenLine> {
        self.lines.get(handle)
    }

    pub fn line_mut(&mut self, handle: LineHandle) -> Option<&mut TokenLine> {
        self.lines.get_mut(handle)
    }

    pub fn token(&self, handle: TokenHandle) -> Option<&Token> {
        self.tokens.get(handle)
    }

    pub fn token_mut(&mut self, handle: TokenHandle) -> Option<&mut Token> {
        self.tokens.get_mut(handle)
    }

    /// Append a blank line with no tokens yet; callers then call
    /// [`TokenList::commit_line`] to populate it from a [`LineScan`].
    pub fn append_line(&mut self, text: String) -> LineHandle {
        let number = self.order.len() as u32;
        let handle = self.lines.insert(TokenLine::new(text, number));
        if let Some(&last) = self.order.last() {
            self.lines.get_mut(last).unwrap().next = Some(handle);
            self.lines.get_mut(handle).unwrap().prev = Some(last);
        }
        self.order.push(handle);
        handle
    }

    pub fn insert_line(&mut self, index: usize, text: String) -> LineHandle {
        let handle = self.lines.insert(TokenLine::new(text, index as u32));
        let prev = if index == 0 { None } else { self.order.get(index - 1).copied() };
        let next = self.order.get(index).copied();
        if let Some(p) = prev {
            self.lines.get_mut(p).unwrap().next = Some(handle);
        }
        if let Some(n) = next {
            self.lines.get_mut(n).unwrap().prev = Some(handle);
        }
        {
            let line = self.lines.get_mut(handle).unwrap();
            line.prev = prev;
            line.next = next;
        }
        self.order.insert(index, handle);
        self.renumber_from(index);
        handle
    }

    pub fn remove_line(&mut self, index: usize) -> bool {
        let Some(handle) = self.order.get(index).copied() else { return false };
        let tokens: Vec<TokenHandle> = self.tokens_in_line(handle).collect();
        for t in tokens {
            self.tokens.remove(t);
        }
        let (prev, next) = {
            let line = self.lines.get(handle).unwrap();
            (line.prev, line.next)
        };
        if let Some(p) = prev {
            self.lines.get_mut(p).unwrap().next = next;
        }
        if let Some(n) = next {
            self.lines.get_mut(n).unwrap().prev = prev;
        }
        self.lines.remove(handle);
        self.order.remove(index);
        self.renumber_from(index);
        true
    }

    fn renumber_from(&mut self, start: usize) {
        for (i, &handle) in self.order.iter().enumerate().skip(start) {
            if let Some(line) = self.lines.get_mut(handle) {
                line.number = i as u32;
            }
        }
    }

    /// Replace whatever tokens `line` currently owns with `scan`'s tokens,
    /// destroying the old ones (their handles become stale per the arena's
    /// generation scheme) and re-linking the global token stream.
    pub fn commit_line(&mut self, line: LineHandle, scan: LineScan) {
        let old_tokens: Vec<TokenHandle> = self.tokens_in_line(line).collect();
        for t in old_tokens {
            self.tokens.remove(t);
        }

        let text = self.lines.get(line).map(|l| l.text.clone()).unwrap_or_default();
        let mut handles = Vec::with_capacity(scan.tokens.len());
        for scanned in &scan.tokens {
            let tok = Token::new(scanned.kind, scanned.span.clone(), scanned.options, line, &text);
            handles.push(self.tokens.insert(tok));
        }
        for pair in handles.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            self.tokens.get_mut(a).unwrap().next = Some(b);
            self.tokens.get_mut(b).unwrap().prev = Some(a);
        }

        let prev_line_last = self.lines.get(line).and_then(|l| l.prev).and_then(|p| self.lines.get(p)).and_then(|p| p.back);
        let next_line_first = self.lines.get(line).and_then(|l| l.next).and_then(|n| self.lines.get(n)).and_then(|n| n.front);

        if let (Some(&first), Some(prev_last)) = (handles.first(), prev_line_last) {
            self.tokens.get_mut(prev_last).unwrap().next = Some(first);
            self.tokens.get_mut(first).unwrap().prev = Some(prev_last);
        }
        if let (Some(&last), Some(next_first)) = (handles.last(), next_line_first) {
            self.tokens.get_mut(next_first).unwrap().prev = Some(last);
            self.tokens.get_mut(last).unwrap().next = Some(next_first);
        }

        let unfinished: Vec<TokenHandle> =
            scan.unfinished.iter().filter_map(|&i| handles.get(i).copied()).collect();

        if !scan.diagnostics.is_empty() {
            let mut info = super::scan_info::ScanInfo::new();
            for (idx, text, severity) in &scan.diagnostics {
                if let Some(&handle) = handles.get(*idx) {
                    info.push(handle, text.clone(), *severity);
                }
            }
            self.lines.get_mut(line).unwrap().scan_info = Some(info);
        } else {
            self.lines.get_mut(line).unwrap().scan_info = None;
        }

        let l = self.lines.get_mut(line).unwrap();
        l.front = handles.first().copied();
        l.back = handles.last().copied();
        l.indent = scan.indent;
        l.open_parens = scan.open_parens;
        l.open_brackets = scan.open_brackets;
        l.open_braces = scan.open_braces;
        l.block_delta = scan.block_delta;
        l.is_continuation = scan.is_continuation;
        l.is_parameter_line = scan.is_parameter_line;
        l.end_state = scan.end_state;
        l.unfinished = unfinished;
    }

    /// Walk the tokens belonging to `line` in order, via the line's
    /// `front`/`back` range (`SPEC_FULL.md` §3's `[front, back]`).
    pub fn tokens_in_line(&self, line: LineHandle) -> impl Iterator<Item = TokenHandle> + '_ {
        let line_ref = self.lines.get(line);
        let mut current = line_ref.and_then(|l| l.front);
        let back = line_ref.and_then(|l| l.back);
        std::iter::from_fn(move || {
            let handle = current?;
            if let Some(b) = back {
                if current.is_some() && handle == b {
                    current = None;
                    return Some(handle);
                }
            }
            current = self.tokens.get(handle).and_then(|t| t.next);
            Some(handle)
        })
    }

    /// Iterate every line in document order.
    pub fn iter_lines(&self) -> impl Iterator<Item = LineHandle> + '_ {
        self.order.iter().copied()
    }

    /// Fold of this line's committed tokens' content hashes, used by
    /// [`crate::lexer::Lexer::relex_line`] to tell whether a re-scan
    /// actually changed the line's tokens rather than only inferring that
    /// from carried bracket/string state.
    pub fn line_content_hash(&self, line: LineHandle) -> u64 {
        self.tokens_in_line(line).fold(0u64, |acc, h| {
            let hash = self.tokens.get(h).map(|t| t.hash).unwrap_or(0);
            acc.wrapping_mul(0x0000_0100_0000_01b3).wrapping_add(hash)
        })
    }

    /// Reconstruct a line's text purely from its committed token spans,
    /// used by the round-trip invariant in `SPEC_FULL.md` §8.
    /// Reconstructs this line's original text from its committed tokens.
    ///
    /// Zero-width markers (`Indent`/`Dedent` and friends) contribute
    /// nothing; every other token contributes its own span, and any gap
    /// between two token spans (or before the first / after the last) is
    /// filled from the line's original text, so whitespace the scanner
    /// does not itself tokenize still round-trips.
    pub fn render_line(&self, line: LineHandle) -> Option<String> {
        let text = &self.lines.get(line)?.text;
        let mut out = String::new();
        let mut cursor = 0usize;
        for handle in self.tokens_in_line(line) {
            let tok = self.tokens.get(handle)?;
            if tok.kind.is_marker() && tok.is_empty() {
                continue;
            }
            let start = tok.span.start as usize;
            if start > cursor {
                out.push_str(&text[cursor..start]);
            }
            out.push_str(tok.text(text));
            cursor = cursor.max(tok.span.end as usize);
        }
        if cursor < text.len() {
            out.push_str(&text[cursor..]);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenOptions;

    fn simple_scan(text: &str) -> LineScan {
        LineScan {
            tokens: vec![ScannedToken {
                kind: TokenKind::IdentifierUnknown,
                span: 0..text.len() as u32,
                options: TokenOptions::NONE,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn negative_index_counts_from_end() {
        let mut list = TokenList::new();
        let a = list.append_line("a".into());
        let b = list.append_line("b".into());
        assert_eq!(list.line_at(-1), Some(b));
        assert_eq!(list.line_at(-2), Some(a));
        assert_eq!(list.line_at(5), None);
    }

    #[test]
    fn insert_and_remove_keep_numbers_dense() {
        let mut list = TokenList::new();
        list.append_line("a".into());
        list.append_line("c".into());
        list.insert_line(1, "b".into());
        let texts: Vec<_> =
            list.iter_lines().map(|h| list.line(h).unwrap().text().to_string()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        for (i, h) in list.iter_lines().enumerate() {
            assert_eq!(list.line(h).unwrap().line_number(), i as u32 + 1);
        }

        list.remove_line(1);
        let texts: Vec<_> =
            list.iter_lines().map(|h| list.line(h).unwrap().text().to_string()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(list.line(list.line_at(1).unwrap()).unwrap().line_number(), 2);
    }

    #[test]
    fn commit_line_links_tokens_across_line_boundary() {
        let mut list = TokenList::new();
        let l0 = list.append_line("foo".into());
        let l1 = list.append_line("bar".into());
        list.commit_line(l0, simple_scan("foo"));
        list.commit_line(l1, simple_scan("bar"));

        let l0_back = list.line(l0).unwrap().back().unwrap();
        let l1_front = list.line(l1).unwrap().front().unwrap();
        assert_eq!(list.token(l0_back).unwrap().next, Some(l1_front));
        assert_eq!(list.token(l1_front).unwrap().prev, Some(l0_back));
    }

    #[test]
    fn render_line_reconstructs_original_text() {
        let mut list = TokenList::new();
        let l0 = list.append_line("x = 1".into());
        list.commit_line(
            l0,
            LineScan {
                tokens: vec![
                    ScannedToken { kind: TokenKind::IdentifierUnknown, span: 0..1, options: TokenOptions::NONE },
                    ScannedToken { kind: TokenKind::Delimiter, span: 1..2, options: TokenOptions::NONE },
                    ScannedToken { kind: TokenKind::OperatorEqual, span: 2..3, options: TokenOptions::NONE },
                    ScannedToken { kind: TokenKind::Delimiter, span: 3..4, options: TokenOptions::NONE },
                    ScannedToken { kind: TokenKind::NumberDecInt, span: 4..5, options: TokenOptions::NONE },
                ],
                ..Default::default()
            },
        );
        assert_eq!(list.render_line(l0).unwrap(), "x = 1");
    }

    #[test]
    fn stale_token_handle_after_recommit_is_rejected() {
        let mut list = TokenList::new();
        let l0 = list.append_line("foo".into());
        list.commit_line(l0, simple_scan("foo"));
        let old = list.line(l0).unwrap().front().unwrap();
        list.commit_line(l0, simple_scan("foo"));
        assert!(list.token(old).is_none());
    }
}
