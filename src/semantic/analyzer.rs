//! Incremental frame/identifier analysis. `SPEC_FULL.md` §4.2.
//!
//! The analyzer walks the token stream once per `analyze_all` call (or once
//! per touched line via `reanalyze_line`), maintaining a stack of open
//! frames keyed by indentation the same way the lexer tracks indent levels:
//! a frame closes the moment a later line's indent falls back to or below
//! the frame header's indent.

use std::collections::HashMap;

use crate::token::scan_info::Severity;
use crate::token::{LineHandle, TokenHandle, TokenKind, TokenList};

use super::frame::{next_frame_id, FrameId, FrameKind, Parameter, SourceFrame};
use super::typeinfo::{NameId, TypeInfo};

const BUILTINS: &[&str] = &[
    "print", "len", "range", "str", "int", "float", "bool", "list", "dict", "set", "tuple",
    "object", "super", "isinstance", "type", "open", "enumerate", "zip", "map", "filter",
    "Exception", "ValueError", "TypeError", "KeyError", "IndexError", "StopIteration",
];

/// Owns the frame tree and name interning table for one document.
pub struct Analyzer {
    frames: HashMap<FrameId, SourceFrame>,
    module_frame: FrameId,
    names: Vec<String>,
    name_ids: HashMap<String, NameId>,
    /// Notified with a token's handle every time the analyzer retypes it
    /// in place (`SPEC_FULL.md` §6's "tokens-changed" highlighter hook).
    on_tokens_changed: Option<Box<dyn FnMut(TokenHandle)>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let module_frame = next_frame_id();
        let mut frames = HashMap::new();
        frames.insert(
            module_frame,
            SourceFrame {
                id: module_frame,
                kind: FrameKind::Module,
                name: "<module>".to_string(),
                header_token: TokenHandle::default(),
                first: TokenHandle::default(),
                last: None,
                header_indent: 0,
                parent: None,
                children: Vec::new(),
                parameters: Vec::new(),
                identifiers: super::identifier::IdentifierTable::new(),
                return_type: None,
            },
        );
        Analyzer { frames, module_frame, names: Vec::new(), name_ids: HashMap::new(), on_tokens_changed: None }
    }

    /// Subscribe to retype notifications. Only one subscriber is kept; a
    /// later call replaces an earlier one.
    pub fn set_tokens_changed(&mut self, callback: impl FnMut(TokenHandle) + 'static) {
        self.on_tokens_changed = Some(Box::new(callback));
    }

    fn notify_tokens_changed(&mut self, token: TokenHandle) {
        if let Some(cb) = self.on_tokens_changed.as_mut() {
            cb(token);
        }
    }

    pub fn module_frame(&self) -> FrameId {
        self.module_frame
    }

    pub fn frame(&self, id: FrameId) -> Option<&SourceFrame> {
        self.frames.get(&id)
    }

    pub fn intern_name(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.name_ids.get(name) {
            return id;
        }
        let id = self.names.len() as NameId;
        self.names.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    pub fn name_for(&self, id: NameId) -> &str {
        self.names.get(id as usize).map(String::as_str).unwrap_or("")
    }

    /// Which frame owns `token`, i.e. the innermost frame whose `[first,
    /// last]` range contains it.
    pub fn frame_containing(&self, tokens: &TokenList, token: TokenHandle) -> FrameId {
        let mut best = self.module_frame;
        let mut best_depth = 0usize;
        for frame in self.frames.values() {
            if frame.id == self.module_frame {
                continue;
            }
            if token_in_range(tokens, frame.first, frame.last, token) {
                let depth = ancestor_depth(&self.frames, frame.id);
                if depth >= best_depth {
                    best = frame.id;
                    best_depth = depth;
                }
            }
        }
        best
    }

    pub fn identifier_type(&self, tokens: &TokenList, token: TokenHandle) -> TypeInfo {
        let Some(tok) = tokens.token(token) else { return TypeInfo::Invalid };
        let Some(line) = tokens.line(tok.line) else { return TypeInfo::Unknown };
        let text = tok.text(line.text());
        let frame = self.frame_containing(tokens, token);
        self.lookup_type(frame, text)
    }

    fn lookup_type(&self, frame: FrameId, name: &str) -> TypeInfo {
        let mut current = Some(frame);
        while let Some(id) = current {
            let Some(f) = self.frames.get(&id) else { break };
            if let Some(ident) = f.identifiers.get(name) {
                return ident.current_type();
            }
            current = f.parent;
        }
        if BUILTINS.contains(&name) {
            TypeInfo::ReferenceBuiltin
        } else {
            TypeInfo::Unknown
        }
    }

    /// Full rebuild of the frame tree from every committed line.
    pub fn analyze_all(&mut self, tokens: &mut TokenList) {
        self.reset();
        let lines: Vec<LineHandle> = tokens.iter_lines().collect();
        let mut stack: Vec<FrameId> = vec![self.module_frame];
        let mut indents: Vec<u32> = vec![0];

        for line in lines {
            self.analyze_line_in_context(tokens, line, &mut stack, &mut indents);
        }

        let last_token = tokens.iter_lines().last().and_then(|l| tokens.line(l)).and_then(|l| l.back());
        for &id in &stack {
            if let Some(f) = self.frames.get_mut(&id) {
                f.last = last_token;
            }
        }
    }

    /// Re-analyze a single line in place: clear its previous identifier
    /// assignments, then re-walk it. Frame *structure* is not rebuilt
    /// (callers that change indentation or add/remove a `def`/`class`
    /// header should call [`Analyzer::analyze_all`] instead).
    pub fn reanalyze_line(&mut self, tokens: &mut TokenList, line: LineHandle) {
        let line_tokens: Vec<TokenHandle> = tokens.tokens_in_line(line).collect();
        for frame in self.frames.values_mut() {
            frame.identifiers.clear_tokens(&line_tokens);
        }
        let frame = self.frame_for_line(tokens, line);
        self.resolve_identifiers_on_line(tokens, line, frame);
    }

    fn reset(&mut self) {
        let module = self.frames.remove(&self.module_frame).map(|mut f| {
            f.children.clear();
            f
        });
        self.frames.clear();
        if let Some(f) = module {
            self.frames.insert(self.module_frame, f);
        }
    }

    fn frame_for_line(&self, tokens: &TokenList, line: LineHandle) -> FrameId {
        let Some(first) = tokens.line(line).and_then(|l| l.front()) else { return self.module_frame };
        self.frame_containing(tokens, first)
    }

    fn analyze_line_in_context(
        &mut self,
        tokens: &mut TokenList,
        line: LineHandle,
        stack: &mut Vec<FrameId>,
        indents: &mut Vec<u32>,
    ) {
        let Some(tl) = tokens.line(line) else { return };
        if !tl.is_code_line() {
            return;
        }
        let line_indent = tl.indent;
        let first_token = tl.front();

        while stack.len() > 1 && line_indent <= *indents.last().unwrap() {
            let closing = stack.pop().unwrap();
            indents.pop();
            if let Some(f) = self.frames.get_mut(&closing) {
                f.last = tokens.token(first_token.unwrap_or_default())
                    .and_then(|t| t.prev)
                    .or(f.first.into());
            }
        }

        let current_frame = *stack.last().unwrap();
        let line_token_handles: Vec<TokenHandle> = tokens.tokens_in_line(line).collect();

        let header_idx = line_token_handles.iter().position(|&h| {
            tokens.token(h).map(|t| t.kind == TokenKind::KeywordDef || t.kind == TokenKind::KeywordClass).unwrap_or(false)
        });

        if let Some(idx) = header_idx {
            let is_class = tokens.token(line_token_handles[idx]).unwrap().kind == TokenKind::KeywordClass;
            let name_idx = idx + 1;
            if let Some(&name_handle) = line_token_handles.get(name_idx) {
                let (name, params) = self.extract_header(tokens, &line_token_handles, name_idx, is_class);
                let kind = if is_class { FrameKind::Class } else { FrameKind::Function };
                let new_id = next_frame_id();
                let first = line_token_handles.last().copied().unwrap_or(name_handle);
                let mut frame = SourceFrame::new_child(kind, name.clone(), name_handle, first, line_indent, current_frame);
                frame.parameters = params;
                frame.id = new_id;
                self.frames.insert(new_id, frame);
                if let Some(parent) = self.frames.get_mut(&current_frame) {
                    parent.children.push(new_id);
                    let type_info = if is_class { TypeInfo::Class } else { TypeInfo::Function };
                    parent.identifiers.entry(&name).push(name_handle, type_info, true);
                }
                if let Some(t) = tokens.token_mut(name_handle) {
                    t.kind = if is_class { TokenKind::IdentifierClass } else { TokenKind::IdentifierFunction };
                }
                self.notify_tokens_changed(name_handle);
                stack.push(new_id);
                indents.push(line_indent);
                return;
            }
        }

        self.resolve_identifiers_on_line(tokens, line, current_frame);
    }

    fn extract_header(
        &mut self,
        tokens: &TokenList,
        line_tokens: &[TokenHandle],
        name_idx: usize,
        _is_class: bool,
    ) -> (String, Vec<Parameter>) {
        let line_text = line_tokens
            .first()
            .and_then(|&h| tokens.token(h))
            .and_then(|t| tokens.line(t.line))
            .map(|l| l.text().to_string())
            .unwrap_or_default();
        let name = line_tokens
            .get(name_idx)
            .and_then(|&h| tokens.token(h))
            .map(|t| t.text(&line_text).to_string())
            .unwrap_or_default();

        let mut params = Vec::new();
        let mut i = name_idx + 1;
        while i < line_tokens.len() && tokens.token(line_tokens[i]).map(|t| t.kind != TokenKind::DelimiterOpenParen).unwrap_or(true) {
            i += 1;
        }
        i += 1; // past the opening `(`

        while i < line_tokens.len() {
            let Some(tok) = tokens.token(line_tokens[i]) else { i += 1; continue };
            if tok.kind == TokenKind::DelimiterCloseParen {
                break;
            }
            if tok.kind == TokenKind::DelimiterComma {
                i += 1;
                continue;
            }

            let star = if tok.kind == TokenKind::OperatorMul {
                i += 1;
                1
            } else if tok.kind == TokenKind::OperatorExponential {
                i += 1;
                2
            } else {
                0
            };

            let Some(name_tok) = line_tokens.get(i).and_then(|&h| tokens.token(h)) else { break };
            if !name_tok.kind.is_identifier() {
                i += 1;
                continue;
            }
            let pname = name_tok.text(&line_text).to_string();
            i += 1;

            let mut type_hint = TypeInfo::Unknown;
            if line_tokens.get(i).and_then(|&h| tokens.token(h)).map(|t| t.kind == TokenKind::DelimiterColon).unwrap_or(false) {
                i += 1;
                if let Some(ann_tok) = line_tokens.get(i).and_then(|&h| tokens.token(h)) {
                    if ann_tok.kind.is_identifier() {
                        type_hint = self.builtin_type_hint(ann_tok.text(&line_text));
                    }
                }
                i = skip_expression_run(tokens, line_tokens, i, &[TokenKind::OperatorEqual, TokenKind::DelimiterComma, TokenKind::DelimiterCloseParen]);
            }

            let mut default = None;
            if line_tokens.get(i).and_then(|&h| tokens.token(h)).map(|t| t.kind == TokenKind::OperatorEqual).unwrap_or(false) {
                i += 1;
                default = line_tokens.get(i).copied();
                i = skip_expression_run(tokens, line_tokens, i, &[TokenKind::DelimiterComma, TokenKind::DelimiterCloseParen]);
            }

            let param = match star {
                1 => Parameter::Variable { name: pname },
                2 => Parameter::Keyword { name: pname },
                _ => match default {
                    Some(default) => Parameter::PositionalDefault { name: pname, type_hint, default },
                    None => Parameter::Positional { name: pname, type_hint },
                },
            };
            params.push(param);
        }
        (name, params)
    }

    /// Maps a recognized builtin annotation name to its [`TypeInfo`];
    /// anything else interns as a [`TypeInfo::Custom`] class reference.
    fn builtin_type_hint(&mut self, name: &str) -> TypeInfo {
        match name {
            "int" => TypeInfo::Int,
            "float" => TypeInfo::Float,
            "complex" => TypeInfo::Complex,
            "str" => TypeInfo::Str,
            "bytes" => TypeInfo::Bytes,
            "bool" => TypeInfo::Bool,
            "list" | "List" => TypeInfo::List,
            "dict" | "Dict" => TypeInfo::Dict,
            "tuple" | "Tuple" => TypeInfo::Tuple,
            "set" | "Set" => TypeInfo::Set,
            "frozenset" | "FrozenSet" => TypeInfo::FrozenSet,
            "None" => TypeInfo::None,
            _ => TypeInfo::Custom(self.intern_name(name)),
        }
    }

    fn resolve_identifiers_on_line(&mut self, tokens: &mut TokenList, line: LineHandle, frame: FrameId) {
        let line_text = tokens.line(line).map(|l| l.text().to_string()).unwrap_or_default();
        let handles: Vec<TokenHandle> = tokens.tokens_in_line(line).collect();

        let assign_idx = handles.iter().position(|&h| {
            tokens.token(h).map(|t| t.kind == TokenKind::OperatorEqual).unwrap_or(false)
        });

        let rhs_type =
            assign_idx.map(|idx| self.infer_rhs_type(tokens, &handles, idx + 1, &line_text, frame)).unwrap_or(TypeInfo::Unknown);

        for (i, &handle) in handles.iter().enumerate() {
            let Some(tok) = tokens.token(handle) else { continue };
            if !tok.kind.is_unresolved_identifier() {
                continue;
            }
            let name = tok.text(&line_text).to_string();
            let is_lhs_assignment = assign_idx == Some(i + 1) || (assign_idx.is_some() && i < assign_idx.unwrap() && i == 0);

            if name == "self" {
                if let Some(t) = tokens.token_mut(handle) {
                    t.kind = TokenKind::IdentifierSelf;
                }
                self.notify_tokens_changed(handle);
                continue;
            }

            if is_lhs_assignment {
                let declared_type = rhs_type;
                if let Some(f) = self.frames.get_mut(&frame) {
                    f.identifiers.entry(&name).push(handle, declared_type, true);
                }
                if let Some(t) = tokens.token_mut(handle) {
                    t.kind = TokenKind::IdentifierDefined;
                }
                self.notify_tokens_changed(handle);
                continue;
            }

            let resolved = self.lookup_type(frame, &name);
            let new_kind = match resolved {
                TypeInfo::Unknown => TokenKind::IdentifierInvalid,
                TypeInfo::ReferenceBuiltin => TokenKind::IdentifierBuiltin,
                _ => TokenKind::IdentifierDefined,
            };
            if new_kind == TokenKind::IdentifierInvalid {
                if let Some(l) = tokens.line_mut(line) {
                    l.scan_info_mut().push(handle, format!("unresolved name '{name}'"), Severity::LookupError);
                }
            }
            if let Some(t) = tokens.token_mut(handle) {
                t.kind = new_kind;
            }
            self.notify_tokens_changed(handle);
        }
    }

    /// Walks the RHS of an assignment starting at `start`, folding each
    /// operand's type into the running total through [`TypeInfo::combine_numeric`]
    /// across binary operators, per `SPEC_FULL.md` §4.2.
    fn infer_rhs_type(&self, tokens: &TokenList, handles: &[TokenHandle], start: usize, line_text: &str, frame: FrameId) -> TypeInfo {
        let mut idx = start;
        let Some(first_type) = self.infer_operand_type(tokens, handles, &mut idx, line_text, frame) else {
            return TypeInfo::Unknown;
        };
        if !first_type.is_numeric() && first_type != TypeInfo::Str {
            return first_type;
        }

        let mut acc = first_type;
        while let Some(op_tok) = handles.get(idx).and_then(|&h| tokens.token(h)) {
            if !is_combinable_operator(op_tok.kind) {
                break;
            }
            idx += 1;
            let Some(operand_type) = self.infer_operand_type(tokens, handles, &mut idx, line_text, frame) else { break };
            acc = acc.combine_numeric(operand_type);
        }
        acc
    }

    /// Types the single operand starting at `*idx` (a literal, container
    /// literal, or identifier lookup) and advances `*idx` past it.
    fn infer_operand_type(
        &self,
        tokens: &TokenList,
        handles: &[TokenHandle],
        idx: &mut usize,
        line_text: &str,
        frame: FrameId,
    ) -> Option<TypeInfo> {
        let &handle = handles.get(*idx)?;
        let tok = tokens.token(handle)?;
        let ty = match tok.kind {
            TokenKind::NumberDecInt | TokenKind::NumberHexInt | TokenKind::NumberBinInt | TokenKind::NumberOctInt => {
                if tok.options.bits() & crate::token::OPT_NUM_IMAGINARY != 0 {
                    TypeInfo::Complex
                } else {
                    TypeInfo::Int
                }
            }
            TokenKind::NumberFloat => TypeInfo::Float,
            k if k.is_string_literal() => TypeInfo::Str,
            TokenKind::IdentifierNone => TypeInfo::None,
            TokenKind::IdentifierTrue | TokenKind::IdentifierFalse => TypeInfo::Bool,
            TokenKind::DelimiterOpenBracket | TokenKind::DelimiterOpenBrace | TokenKind::DelimiterOpenParen => {
                let container = TypeInfo::container_for(tok.kind).unwrap_or(TypeInfo::Unknown);
                *idx += 1;
                skip_balanced_group(tokens, handles, idx, tok.kind);
                return Some(container);
            }
            _ if tok.kind.is_unresolved_identifier() => {
                let name = tok.text(line_text);
                self.lookup_type(frame, name)
            }
            _ => TypeInfo::Unknown,
        };
        *idx += 1;
        Some(ty)
    }
}

/// Binary operators `infer_rhs_type` folds operand types across.
fn is_combinable_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::OperatorPlus
            | TokenKind::OperatorMinus
            | TokenKind::OperatorMul
            | TokenKind::OperatorDiv
            | TokenKind::OperatorFloorDiv
            | TokenKind::OperatorModulo
            | TokenKind::OperatorExponential
    )
}

/// Advances from `start` through a parameter's annotation or default-value
/// expression, stopping at the first token in `stop_kinds` seen at the
/// starting nesting depth (so a `,` or `)` inside a nested call or literal
/// doesn't end the scan early).
fn skip_expression_run(tokens: &TokenList, line_tokens: &[TokenHandle], start: usize, stop_kinds: &[TokenKind]) -> usize {
    let mut i = start;
    let mut depth = 0i32;
    while i < line_tokens.len() {
        let Some(tok) = tokens.token(line_tokens[i]) else { i += 1; continue };
        if depth == 0 && stop_kinds.contains(&tok.kind) {
            break;
        }
        match tok.kind {
            TokenKind::DelimiterOpenParen | TokenKind::DelimiterOpenBracket | TokenKind::DelimiterOpenBrace => depth += 1,
            TokenKind::DelimiterCloseParen | TokenKind::DelimiterCloseBracket | TokenKind::DelimiterCloseBrace => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    i
}

/// Advances `*idx` (already positioned just past `open_kind`) to just past
/// its matching close delimiter, accounting for nested groups of the same
/// kind.
fn skip_balanced_group(tokens: &TokenList, handles: &[TokenHandle], idx: &mut usize, open_kind: TokenKind) {
    let close_kind = match open_kind {
        TokenKind::DelimiterOpenBracket => TokenKind::DelimiterCloseBracket,
        TokenKind::DelimiterOpenBrace => TokenKind::DelimiterCloseBrace,
        TokenKind::DelimiterOpenParen => TokenKind::DelimiterCloseParen,
        _ => return,
    };
    let mut depth = 1;
    while let Some(&h) = handles.get(*idx) {
        *idx += 1;
        let Some(t) = tokens.token(h) else { continue };
        if t.kind == open_kind {
            depth += 1;
        } else if t.kind == close_kind {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

fn token_in_range(tokens: &TokenList, first: TokenHandle, last: Option<TokenHandle>, target: TokenHandle) -> bool {
    let Some(last) = last else { return false };
    let mut current = Some(first);
    while let Some(h) = current {
        if h == target {
            return true;
        }
        if h == last {
            break;
        }
        current = tokens.token(h).and_then(|t| t.next);
    }
    false
}

fn ancestor_depth(frames: &HashMap<FrameId, SourceFrame>, mut id: FrameId) -> usize {
    let mut depth = 0;
    while let Some(f) = frames.get(&id) {
        match f.parent {
            Some(p) => {
                id = p;
                depth += 1;
            }
            None => break,
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, LexerConfig};

    #[test]
    fn simple_assignment_infers_int_then_propagates() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("x = 1\ny = x + 2\n");
        let mut analyzer = Analyzer::new();
        analyzer.analyze_all(lexer.tokens_mut());

        let x_line = lexer.tokens().line_at(0).unwrap();
        let x_tok = lexer.tokens().tokens_in_line(x_line).next().unwrap();
        assert_eq!(lexer.tokens().token(x_tok).unwrap().kind, TokenKind::IdentifierDefined);
        assert_eq!(analyzer.identifier_type(lexer.tokens(), x_tok), TypeInfo::Int);

        let y_line = lexer.tokens().line_at(1).unwrap();
        let y_tok = lexer.tokens().tokens_in_line(y_line).next().unwrap();
        assert_eq!(lexer.tokens().token(y_tok).unwrap().kind, TokenKind::IdentifierDefined);
        assert_eq!(analyzer.identifier_type(lexer.tokens(), y_tok), TypeInfo::Int);
    }

    #[test]
    fn def_with_parameters_creates_child_frame() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("def f(a, b=3, *c, **d):\n    pass\n");
        let mut analyzer = Analyzer::new();
        analyzer.analyze_all(lexer.tokens_mut());

        let module = analyzer.frame(analyzer.module_frame()).unwrap();
        assert_eq!(module.children.len(), 1);
        let f = analyzer.frame(module.children[0]).unwrap();
        assert_eq!(f.name, "f");
        assert_eq!(f.parameters.len(), 4);
        assert!(matches!(f.parameters[0], Parameter::Positional { .. }));
        assert!(matches!(f.parameters[1], Parameter::PositionalDefault { .. }));
        assert!(matches!(f.parameters[2], Parameter::Variable { .. }));
        assert!(matches!(f.parameters[3], Parameter::Keyword { .. }));
    }

    #[test]
    fn annotated_parameter_is_typed_and_keeps_its_default() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("def f(a:int=3, *b, **c):\n    pass\n");
        let mut analyzer = Analyzer::new();
        analyzer.analyze_all(lexer.tokens_mut());

        let module = analyzer.frame(analyzer.module_frame()).unwrap();
        let f = analyzer.frame(module.children[0]).unwrap();
        assert_eq!(f.parameters.len(), 3);
        match &f.parameters[0] {
            Parameter::PositionalDefault { name, type_hint, default } => {
                assert_eq!(name, "a");
                assert_eq!(*type_hint, TypeInfo::Int);
                let default_tok = lexer.tokens().token(*default).unwrap();
                let line = lexer.tokens().line(default_tok.line).unwrap();
                assert_eq!(default_tok.text(line.text()), "3");
            }
            other => panic!("expected PositionalDefault, got {other:?}"),
        }
        assert!(matches!(f.parameters[1], Parameter::Variable { .. }));
        assert!(matches!(f.parameters[2], Parameter::Keyword { .. }));
    }

    #[test]
    fn retyping_a_token_notifies_the_tokens_changed_callback() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("x = 1\n");
        let mut analyzer = Analyzer::new();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let recorder = seen.clone();
        analyzer.set_tokens_changed(move |handle| recorder.borrow_mut().push(handle));
        analyzer.analyze_all(lexer.tokens_mut());

        let line = lexer.tokens().line_at(0).unwrap();
        let x_tok = lexer.tokens().tokens_in_line(line).next().unwrap();
        assert!(seen.borrow().contains(&x_tok));
    }

    #[test]
    fn unresolved_name_becomes_invalid_with_lookup_error() {
        let mut lexer = Lexer::new(LexerConfig::default());
        lexer.load("print(unknown_name)\n");
        let mut analyzer = Analyzer::new();
        analyzer.analyze_all(lexer.tokens_mut());

        let line = lexer.tokens().line_at(0).unwrap();
        let handles: Vec<_> = lexer.tokens().tokens_in_line(line).collect();
        let unresolved = handles
            .iter()
            .find(|&&h| lexer.tokens().token(h).unwrap().kind == TokenKind::IdentifierInvalid);
        assert!(unresolved.is_some());
        assert!(lexer.tokens().line(line).unwrap().scan_info().is_some());
    }
}
