//! The per-line scanner. `SPEC_FULL.md` §2 describes the line-at-a-time
//! contract this implements: every call is handed the previous line's
//! carried-over state and returns tokens plus the state the following line
//! needs.

use crate::token::scan_info::Severity;
use crate::token::{
    LexEndState, LineScan, ScannedToken, TokenKind, TokenOptions, OPT_NUM_IMAGINARY, OPT_STR_BYTES,
    OPT_STR_FORMAT, OPT_STR_MULTILINE, OPT_STR_RAW, OPT_STR_UNICODE,
};

use super::keywords::{KEYWORDS, OPERATORS_1, OPERATORS_2, OPERATORS_3};

/// Lexer-wide knobs. `SPEC_FULL.md` §2.1 (ambient configuration).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LexerConfig {
    pub tab_width: u32,
}

impl Default for LexerConfig {
    fn default() -> Self {
        LexerConfig { tab_width: 8 }
    }
}

/// Everything the scanner needs from the previous physical line to resume
/// correctly: an open multi-line string, open bracket depth, or a trailing
/// backslash continuation.
#[derive(Debug, Clone, Default)]
pub struct LineCarry {
    pub end_state: LexEndState,
    pub resume_options: TokenOptions,
    pub open_parens: i32,
    pub open_brackets: i32,
    pub open_braces: i32,
    pub continues_next: bool,
    pub is_parameter_line: bool,
}

impl LineCarry {
    pub fn initial() -> Self {
        LineCarry::default()
    }

    /// Build the carry for the line that follows `line` in the document.
    pub fn from_line(line: &crate::token::TokenLine) -> Self {
        LineCarry {
            end_state: line.end_state,
            resume_options: TokenOptions::NONE,
            open_parens: line.open_parens,
            open_brackets: line.open_brackets,
            open_braces: line.open_braces,
            continues_next: false,
            is_parameter_line: line.open_parens > 0 && line.is_parameter_line,
        }
    }
}

/// The indentation stack lives on the scanner, not on any single line,
/// since an indent/dedent decision depends on every enclosing level.
pub struct Scanner {
    config: LexerConfig,
    indent_stack: Vec<u32>,
}

impl Scanner {
    pub fn new(config: LexerConfig) -> Self {
        Scanner { config, indent_stack: vec![0] }
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Reset indentation tracking, e.g. when the document is reloaded from
    /// scratch rather than incrementally edited.
    pub fn reset(&mut self) {
        self.indent_stack.clear();
        self.indent_stack.push(0);
    }

    pub fn scan_line(&mut self, text: &str, carry: &LineCarry) -> LineScan {
        let mut out = LineScan { is_parameter_line: carry.is_parameter_line, ..Default::default() };
        let bytes: Vec<char> = text.chars().collect();
        let mut pos: usize = 0;
        let mut open_parens = carry.open_parens;
        let mut open_brackets = carry.open_brackets;
        let mut open_braces = carry.open_braces;

        if let Some(open_kind) = carry.end_state {
            pos = self.resume_literal(&bytes, open_kind, carry.resume_options, &mut out);
            out.is_continuation = true;
        } else if open_parens + open_brackets + open_braces > 0 {
            out.is_continuation = true;
        } else {
            pos = self.scan_indent(&bytes, &mut out);
        }

        let mut continues_next = false;
        let mut saw_code = !out.tokens.is_empty();

        while pos < bytes.len() {
            let c = bytes[pos];
            if c == ' ' || c == '\t' {
                pos += 1;
                continue;
            }
            if c == '#' {
                let start = pos as u32;
                pos = bytes.len();
                out.tokens.push(ScannedToken { kind: TokenKind::Comment, span: start..pos as u32, options: TokenOptions::NONE });
                continue;
            }
            if c == '\\' && pos == bytes.len() - 1 {
                continues_next = true;
                out.tokens.push(ScannedToken {
                    kind: TokenKind::DelimiterBackSlash,
                    span: pos as u32..(pos + 1) as u32,
                    options: TokenOptions::NONE,
                });
                pos += 1;
                continue;
            }
            if c.is_ascii_digit() {
                pos = self.scan_number(&bytes, pos, &mut out);
                saw_code = true;
                continue;
            }
            if c == '"' || c == '\'' {
                pos = self.scan_string(&bytes, pos, TokenOptions::NONE, &mut out);
                saw_code = true;
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                pos = self.scan_identifier_or_prefixed_string(&bytes, pos, &mut out);
                saw_code = true;
                continue;
            }

            if let Some((kind, len)) = match_operator(&bytes, pos) {
                match kind {
                    TokenKind::DelimiterOpenParen => open_parens += 1,
                    TokenKind::DelimiterCloseParen => open_parens -= 1,
                    TokenKind::DelimiterOpenBracket => open_brackets += 1,
                    TokenKind::DelimiterCloseBracket => open_brackets -= 1,
                    TokenKind::DelimiterOpenBrace => open_braces += 1,
                    TokenKind::DelimiterCloseBrace => open_braces -= 1,
                    _ => {}
                }
                out.tokens.push(ScannedToken { kind, span: pos as u32..(pos + len) as u32, options: TokenOptions::NONE });
                pos += len;
                saw_code = true;
                continue;
            }

            let idx = out.tokens.len();
            out.tokens.push(ScannedToken { kind: TokenKind::SyntaxError, span: pos as u32..(pos + 1) as u32, options: TokenOptions::NONE });
            out.diagnostics.push((idx, format!("unrecognized character '{c}'"), Severity::SyntaxError));
            pos += 1;
            saw_code = true;
        }

        if saw_code && open_parens == 0 && open_brackets == 0 && open_braces == 0 && !continues_next {
            if let Some(last) = out.tokens.iter().rev().find(|t| !t.kind.is_marker()) {
                if last.kind == TokenKind::DelimiterColon {
                    out.block_delta = 1;
                }
            }
        }

        if out.end_state.is_none() {
            if out.is_continuation {
                out.indent = self.indent_stack.last().copied().unwrap_or(0);
            } else {
                let current_indent = out.indent;
                self.apply_indent_transition(current_indent, &mut out);
            }
        }

        out.open_parens = open_parens;
        out.open_brackets = open_brackets;
        out.open_braces = open_braces;
        out.is_parameter_line = carry.is_parameter_line || (open_parens > 0 && looks_like_def_params(&out));
        out.unfinished = out
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind.is_unresolved_identifier())
            .map(|(i, _)| i)
            .collect();

        out
    }

    fn scan_indent(&mut self, bytes: &[char], out: &mut LineScan) -> usize {
        let mut col = 0u32;
        let mut pos = 0usize;
        while pos < bytes.len() {
            match bytes[pos] {
                ' ' => col += 1,
                '\t' => col += self.config.tab_width - (col % self.config.tab_width),
                _ => break,
            }
            pos += 1;
        }
        out.indent = col;
        pos
    }

    fn apply_indent_transition(&mut self, indent: u32, out: &mut LineScan) {
        let trimmed_is_blank = out.tokens.iter().all(|t| t.kind.is_marker());
        if trimmed_is_blank {
            return;
        }
        let current = *self.indent_stack.last().unwrap();
        if indent > current {
            self.indent_stack.push(indent);
            out.tokens.insert(0, ScannedToken { kind: TokenKind::Indent, span: 0..0, options: TokenOptions::NONE });
        } else if indent < current {
            let mut popped = 0;
            while self.indent_stack.len() > 1 && *self.indent_stack.last().unwrap() > indent {
                self.indent_stack.pop();
                popped += 1;
            }
            for _ in 0..popped {
                out.tokens.insert(0, ScannedToken { kind: TokenKind::Dedent, span: 0..0, options: TokenOptions::NONE });
            }
            out.block_delta -= popped as i32;
        }
    }

    /// Resume scanning inside an open triple-quoted string, returning the
    /// byte position to resume normal scanning from (`bytes.len()` if the
    /// whole line was consumed by the literal).
    fn resume_literal(&mut self, bytes: &[char], open_kind: TokenKind, options: TokenOptions, out: &mut LineScan) -> usize {
        let quote = if open_kind == TokenKind::LiteralBlockDblQuote { '"' } else { '\'' };
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let text: String = bytes.iter().collect();
        if let Some(end) = find_unescaped(&text, &triple, options.is_raw()) {
            let close_end = end + 3;
            out.tokens.push(ScannedToken { kind: open_kind, span: 0..close_end as u32, options });
            out.end_state = None;
            close_end
        } else {
            out.tokens.push(ScannedToken { kind: open_kind, span: 0..bytes.len() as u32, options });
            out.end_state = Some(open_kind);
            bytes.len()
        }
    }

    fn scan_number(&mut self, bytes: &[char], start: usize, out: &mut LineScan) -> usize {
        let mut pos = start;
        let mut kind = TokenKind::NumberDecInt;
        if bytes[pos] == '0' && pos + 1 < bytes.len() {
            match bytes[pos + 1].to_ascii_lowercase() {
                'x' => {
                    kind = TokenKind::NumberHexInt;
                    pos += 2;
                    while pos < bytes.len() && (bytes[pos].is_ascii_hexdigit() || bytes[pos] == '_') {
                        pos += 1;
                    }
                    self.push_number(bytes, start, pos, kind, out);
                    return pos;
                }
                'b' => {
                    kind = TokenKind::NumberBinInt;
                    pos += 2;
                    while pos < bytes.len() && (bytes[pos] == '0' || bytes[pos] == '1' || bytes[pos] == '_') {
                        pos += 1;
                    }
                    self.push_number(bytes, start, pos, kind, out);
                    return pos;
                }
                'o' => {
                    kind = TokenKind::NumberOctInt;
                    pos += 2;
                    while pos < bytes.len() && (('0'..='7').contains(&bytes[pos]) || bytes[pos] == '_') {
                        pos += 1;
                    }
                    self.push_number(bytes, start, pos, kind, out);
                    return pos;
                }
                _ => {}
            }
        }

        while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == '_') {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == '.' {
            kind = TokenKind::NumberFloat;
            pos += 1;
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == '_') {
                pos += 1;
            }
        }
        if pos < bytes.len() && (bytes[pos] == 'e' || bytes[pos] == 'E') {
            let save = pos;
            let mut look = pos + 1;
            if look < bytes.len() && (bytes[look] == '+' || bytes[look] == '-') {
                look += 1;
            }
            if look < bytes.len() && bytes[look].is_ascii_digit() {
                kind = TokenKind::NumberFloat;
                pos = look;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
            } else {
                pos = save;
            }
        }
        let mut options = TokenOptions::NONE;
        if pos < bytes.len() && (bytes[pos] == 'j' || bytes[pos] == 'J') {
            options.set(OPT_NUM_IMAGINARY);
            pos += 1;
        }
        out.tokens.push(ScannedToken { kind, span: start as u32..pos as u32, options });
        pos
    }

    fn push_number(&mut self, _bytes: &[char], start: usize, end: usize, kind: TokenKind, out: &mut LineScan) {
        out.tokens.push(ScannedToken { kind, span: start as u32..end as u32, options: TokenOptions::NONE });
    }

    /// Scan an identifier; if it turns out to be a string-literal prefix
    /// (`r`, `b`, `rb`, `f`, ...) immediately followed by a quote, defers to
    /// [`Scanner::scan_string`] instead.
    fn scan_identifier_or_prefixed_string(&mut self, bytes: &[char], start: usize, out: &mut LineScan) -> usize {
        let mut pos = start;
        while pos < bytes.len() && (bytes[pos].is_alphanumeric() || bytes[pos] == '_') {
            pos += 1;
        }
        let word: String = bytes[start..pos].iter().collect();

        if pos < bytes.len() && (bytes[pos] == '"' || bytes[pos] == '\'') {
            if let Some(options) = prefix_options(&word) {
                let end = self.scan_string(bytes, pos, options, out);
                if let Some(last) = out.tokens.last_mut() {
                    last.span.start = start as u32;
                }
                return end;
            }
        }

        let kind = if word == "self" {
            TokenKind::IdentifierSelf
        } else if let Some(&k) = KEYWORDS.get(word.as_str()) {
            k
        } else {
            match out.tokens.iter().rev().find(|t| !t.kind.is_marker()).map(|t| t.kind) {
                Some(TokenKind::KeywordDef) | Some(TokenKind::KeywordClass) => TokenKind::IdentifierDefUnknown,
                _ => TokenKind::IdentifierUnknown,
            }
        };
        out.tokens.push(ScannedToken { kind, span: start as u32..pos as u32, options: TokenOptions::NONE });
        pos
    }

    fn scan_string(&mut self, bytes: &[char], start: usize, mut options: TokenOptions, out: &mut LineScan) -> usize {
        let quote = bytes[start];
        let triple = start + 2 < bytes.len() && bytes[start + 1] == quote && bytes[start + 2] == quote;
        if triple {
            options.set(OPT_STR_MULTILINE);
            let block_kind = if quote == '"' { TokenKind::LiteralBlockDblQuote } else { TokenKind::LiteralBlockSglQuote };
            let rest: String = bytes[start + 3..].iter().collect();
            let delim: String = std::iter::repeat(quote).take(3).collect();
            if let Some(end_rel) = find_unescaped(&rest, &delim, options.is_raw()) {
                let end = start + 3 + end_rel + 3;
                out.tokens.push(ScannedToken { kind: block_kind, span: start as u32..end as u32, options });
                end
            } else {
                out.tokens.push(ScannedToken { kind: block_kind, span: start as u32..bytes.len() as u32, options });
                out.end_state = Some(block_kind);
                bytes.len()
            }
        } else {
            let line_kind = if quote == '"' { TokenKind::LiteralDblQuote } else { TokenKind::LiteralSglQuote };
            let mut pos = start + 1;
            let raw = options.is_raw();
            while pos < bytes.len() {
                if bytes[pos] == '\\' && !raw && pos + 1 < bytes.len() {
                    pos += 2;
                    continue;
                }
                if bytes[pos] == quote {
                    pos += 1;
                    break;
                }
                pos += 1;
            }
            out.tokens.push(ScannedToken { kind: line_kind, span: start as u32..pos as u32, options });
            pos
        }
    }
}

fn prefix_options(word: &str) -> Option<TokenOptions> {
    let lower = word.to_ascii_lowercase();
    let mut opt = TokenOptions::NONE;
    let valid = match lower.as_str() {
        "r" => true,
        "b" => {
            opt.set(OPT_STR_BYTES);
            true
        }
        "u" => {
            opt.set(OPT_STR_UNICODE);
            true
        }
        "f" => {
            opt.set(OPT_STR_FORMAT);
            true
        }
        "rb" | "br" => {
            opt.set(OPT_STR_BYTES);
            true
        }
        "rf" | "fr" => {
            opt.set(OPT_STR_FORMAT);
            true
        }
        _ => false,
    };
    if !valid {
        return None;
    }
    if lower.starts_with('r') || lower.ends_with('r') {
        opt.set(OPT_STR_RAW);
    }
    Some(opt)
}

fn looks_like_def_params(scan: &LineScan) -> bool {
    scan.tokens.iter().any(|t| t.kind == TokenKind::KeywordDef)
}

fn match_operator(bytes: &[char], pos: usize) -> Option<(TokenKind, usize)> {
    let rest: String = bytes[pos..bytes.len().min(pos + 3)].iter().collect();
    for (spelling, kind) in OPERATORS_3 {
        if rest.starts_with(spelling) {
            return Some((*kind, spelling.len()));
        }
    }
    let rest2: String = bytes[pos..bytes.len().min(pos + 2)].iter().collect();
    for (spelling, kind) in OPERATORS_2 {
        if rest2.starts_with(spelling) {
            return Some((*kind, spelling.len()));
        }
    }
    for (ch, kind) in OPERATORS_1 {
        if bytes[pos] == *ch {
            return Some((*kind, 1));
        }
    }
    None
}

/// Find the first unescaped occurrence of `needle` in `haystack`. When
/// `raw` is set, backslashes never escape (matching Python's `r"..."` rule).
fn find_unescaped(haystack: &str, needle: &str, raw: bool) -> Option<usize> {
    let chars: Vec<char> = haystack.chars().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    let mut i = 0;
    while i + needle_chars.len() <= chars.len() {
        if !raw && chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i..i + needle_chars.len()] == needle_chars[..] {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_line_produces_expected_kinds() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let result = scanner.scan_line("x = 1", &LineCarry::initial());
        let kinds: Vec<_> = result.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IdentifierUnknown,
                TokenKind::OperatorEqual,
                TokenKind::NumberDecInt,
            ]
        );
    }

    #[test]
    fn def_introduces_indent_on_next_line() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let first = scanner.scan_line("def f():", &LineCarry::initial());
        assert_eq!(first.block_delta, 1);
        let carry = LineCarry { is_parameter_line: false, ..LineCarry::initial() };
        let second = scanner.scan_line("    return 1", &carry);
        assert_eq!(second.tokens.first().map(|t| t.kind), Some(TokenKind::Indent));
    }

    #[test]
    fn dedent_emitted_when_indent_decreases() {
        let mut scanner = Scanner::new(LexerConfig::default());
        scanner.scan_line("if x:", &LineCarry::initial());
        scanner.scan_line("    y = 1", &LineCarry::initial());
        let third = scanner.scan_line("z = 2", &LineCarry::initial());
        assert_eq!(third.tokens.first().map(|t| t.kind), Some(TokenKind::Dedent));
    }

    #[test]
    fn triple_quoted_string_spans_multiple_lines() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let first = scanner.scan_line("s = \"\"\"start", &LineCarry::initial());
        assert_eq!(first.end_state, Some(TokenKind::LiteralBlockDblQuote));
        let carry = LineCarry {
            end_state: first.end_state,
            resume_options: TokenOptions::new(OPT_STR_MULTILINE),
            ..LineCarry::initial()
        };
        let second = scanner.scan_line("end\"\"\"", &carry);
        assert_eq!(second.end_state, None);
        assert_eq!(second.tokens[0].kind, TokenKind::LiteralBlockDblQuote);
    }

    #[test]
    fn unterminated_bracket_marks_continuation() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let first = scanner.scan_line("values = [1,", &LineCarry::initial());
        assert_eq!(first.open_brackets, 1);
        let carry = LineCarry { open_brackets: 1, ..LineCarry::initial() };
        let second = scanner.scan_line("2]", &carry);
        assert!(second.is_continuation);
        assert_eq!(second.open_brackets, 0);
    }

    #[test]
    fn unrecognized_character_is_a_syntax_error_token() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let result = scanner.scan_line("x = $", &LineCarry::initial());
        assert!(result.tokens.iter().any(|t| t.kind == TokenKind::SyntaxError));
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn raw_string_prefix_is_recognized() {
        let mut scanner = Scanner::new(LexerConfig::default());
        let result = scanner.scan_line("r'\\d+'", &LineCarry::initial());
        assert_eq!(result.tokens[0].kind, TokenKind::LiteralSglQuote);
        assert!(result.tokens[0].options.is_raw());
    }
}
