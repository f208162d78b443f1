use super::scan_info::ScanInfo;
use super::{LexEndState, LineHandle, TokenHandle};

/// One physical line of source text together with everything the lexer and
/// semantic pass derived from it. See `SPEC_FULL.md` §3.
#[derive(Debug, Clone)]
pub struct TokenLine {
    pub(crate) text: String,
    /// 0-indexed position in the owning [`TokenList`](super::TokenList),
    /// kept in sync by every insert/remove.
    pub(crate) number: u32,
    pub(crate) prev: Option<LineHandle>,
    pub(crate) next: Option<LineHandle>,
    /// First/last token belonging to this line, `None` for a blank line.
    pub(crate) front: Option<TokenHandle>,
    pub(crate) back: Option<TokenHandle>,
    /// Leading-whitespace width; a tab counts as `tab_width - (col % tab_width)`.
    pub indent: u32,
    pub open_parens: i32,
    pub open_brackets: i32,
    pub open_braces: i32,
    /// `+1` when this line opens a block (trailing `:`), `-1` per dedent level.
    pub block_delta: i32,
    pub is_parameter_line: bool,
    pub is_continuation: bool,
    pub end_state: LexEndState,
    /// Tokens the semantic pass still needs to resolve (identifiers lexed
    /// as `IdentifierUnknown`/`IdentifierDefUnknown`).
    pub(crate) unfinished: Vec<TokenHandle>,
    pub(crate) scan_info: Option<ScanInfo>,
}

impl TokenLine {
    pub(crate) fn new(text: String, number: u32) -> Self {
        TokenLine {
            text,
            number,
            prev: None,
            next: None,
            front: None,
            back: None,
            indent: 0,
            open_parens: 0,
            open_brackets: 0,
            open_braces: 0,
            block_delta: 0,
            is_parameter_line: false,
            is_continuation: false,
            end_state: None,
            unfinished: Vec::new(),
            scan_info: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-indexed line number as exposed to external callers (§3: "Line
    /// numbers are dense and 1-indexed externally, 0-indexed internally").
    pub fn line_number(&self) -> u32 {
        self.number + 1
    }

    pub fn front(&self) -> Option<TokenHandle> {
        self.front
    }

    pub fn back(&self) -> Option<TokenHandle> {
        self.back
    }

    pub fn prev(&self) -> Option<LineHandle> {
        self.prev
    }

    pub fn next(&self) -> Option<LineHandle> {
        self.next
    }

    pub fn is_code_line(&self) -> bool {
        let trimmed = self.text.trim_start();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    }

    pub fn unfinished_tokens(&self) -> &[TokenHandle] {
        &self.unfinished
    }

    pub fn scan_info(&self) -> Option<&ScanInfo> {
        self.scan_info.as_ref()
    }

    pub fn scan_info_mut(&mut self) -> &mut ScanInfo {
        self.scan_info.get_or_insert_with(ScanInfo::new)
    }

    /// Is the paren/bracket/brace depth non-zero at the end of this line?
    pub fn has_open_groups(&self) -> bool {
        self.open_parens > 0 || self.open_brackets > 0 || self.open_braces > 0
    }
}
