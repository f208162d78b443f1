//! End-to-end exercises of the scenarios listed in `SPEC_FULL.md` §8, driven
//! entirely through the public API (no process-spawning: this core has no
//! standalone interpreter binary to shell out to).

use pycore::debugger::breakpoint::{BreakpointFile, BreakpointStore};
use pycore::debugger::exception::{ExceptionInfo, TracebackFrame};
use pycore::debugger::{rewrite_condition, Debugger, DebuggerEvent, DebuggerPreferences, InterpreterFrame, TraceAction, TraceEvent};
use pycore::lexer::{Lexer, LexerConfig};
use pycore::semantic::{Analyzer, TypeInfo};
use pycore::token::TokenKind;

struct ScriptedFrame {
    file: &'static str,
    line: std::sync::atomic::AtomicU32,
    depth: std::sync::atomic::AtomicU32,
    locals: Vec<(&'static str, &'static str)>,
}

impl InterpreterFrame for ScriptedFrame {
    fn file(&self) -> &str {
        self.file
    }
    fn function(&self) -> &str {
        "<module>"
    }
    fn line(&self) -> u32 {
        self.line.load(std::sync::atomic::Ordering::SeqCst)
    }
    fn depth(&self) -> u32 {
        self.depth.load(std::sync::atomic::Ordering::SeqCst)
    }
    fn eval_condition(&self, expr: &str) -> Option<bool> {
        let (lhs, rhs) = expr.split_once("==")?;
        let value = self.locals.iter().find(|(k, _)| *k == lhs.trim())?.1;
        Some(value == rhs.trim())
    }
    fn exception_will_be_caught(&self) -> bool {
        false
    }
    fn current_exception(&self) -> Option<ExceptionInfo> {
        None
    }
}

#[test]
fn scenario_1_assignment_and_propagation() {
    let mut lexer = Lexer::new(LexerConfig::default());
    lexer.load("x = 1\ny = x + 2\n");
    let mut analyzer = Analyzer::new();
    analyzer.analyze_all(lexer.tokens_mut());

    let line0 = lexer.tokens().line_at(0).unwrap();
    let x_tok = lexer.tokens().tokens_in_line(line0).next().unwrap();
    assert_eq!(lexer.tokens().token(x_tok).unwrap().kind, TokenKind::IdentifierDefined);
    assert_eq!(analyzer.identifier_type(lexer.tokens(), x_tok), TypeInfo::Int);

    let line1 = lexer.tokens().line_at(1).unwrap();
    let y_tok = lexer.tokens().tokens_in_line(line1).next().unwrap();
    assert_eq!(lexer.tokens().token(y_tok).unwrap().kind, TokenKind::IdentifierDefined);
    assert_eq!(analyzer.identifier_type(lexer.tokens(), y_tok), TypeInfo::Int);
}

#[test]
fn scenario_5_multiline_string_literal() {
    let mut lexer = Lexer::new(LexerConfig::default());
    lexer.load("a = \"\"\"hello\nworld\"\"\"\n");
    let first = lexer.tokens().line_at(0).unwrap();
    let closing = lexer.tokens().line_at(1).unwrap();

    let opening_tok_handle = lexer.tokens().line(first).unwrap().back().unwrap();
    let opening_tok = lexer.tokens().token(opening_tok_handle).unwrap();
    assert!(opening_tok.options.has(pycore::token::OPT_STR_MULTILINE));
    assert_eq!(opening_tok.kind, TokenKind::LiteralBlockDblQuote);
    // The literal resumes on line 2 and closes there, so line 1's carried
    // end-state names the open literal kind and line 2's does not.
    assert_eq!(lexer.tokens().line(first).unwrap().end_state, Some(TokenKind::LiteralBlockDblQuote));
    assert_eq!(lexer.tokens().line(closing).unwrap().end_state, None);

    let closing_tok_handle = lexer.tokens().line(closing).unwrap().front().unwrap();
    let closing_tok = lexer.tokens().token(closing_tok_handle).unwrap();
    assert_eq!(closing_tok.kind, TokenKind::LiteralBlockDblQuote);
    assert!(closing_tok.options.has(pycore::token::OPT_STR_MULTILINE));
}

#[test]
fn tokenize_then_render_round_trips() {
    let source = "def f(a, b):\n    return a + b  # comment\n";
    let mut lexer = Lexer::new(LexerConfig::default());
    lexer.load(source);
    for (i, original) in source.trim_end_matches('\n').split('\n').enumerate() {
        let line = lexer.tokens().line_at(i as i64).unwrap();
        assert_eq!(lexer.tokens().render_line(line).unwrap(), original);
    }
}

#[test]
fn scenario_3_condition_rewrite_and_evaluation() {
    let mut store = BreakpointStore::new();
    let (id, _) = store.add("file.py", 7);
    store.set_condition(id, Some("i = 5".to_string()));
    let bp = store.lookup("file.py", 7).unwrap();
    let rewritten = rewrite_condition(bp.condition.as_deref().unwrap());
    assert_eq!(rewritten, "i == 5");

    let matching = ScriptedFrame { file: "file.py", line: 7.into(), depth: 0.into(), locals: vec![("i", "5")] };
    assert_eq!(matching.eval_condition(&rewritten), Some(true));
    let non_matching = ScriptedFrame { file: "file.py", line: 7.into(), depth: 0.into(), locals: vec![("i", "4")] };
    assert_eq!(non_matching.eval_condition(&rewritten), Some(false));
}

#[test]
fn scenario_6_step_over_then_step_into() {
    let (debugger, rx) = Debugger::new(DebuggerPreferences::default());
    debugger.add_breakpoint("a.py", 1);
    debugger.start();
    debugger.continue_();

    let caller = ScriptedFrame { file: "a.py", line: 1.into(), depth: 0.into(), locals: vec![] };
    let debugger = std::sync::Arc::new(debugger);

    // Halt on the breakpoint line, then request step-over.
    let d = debugger.clone();
    let handle = std::thread::spawn(move || d.on_trace(TraceEvent::Line, &caller));
    while !debugger.is_halted() {
        std::thread::yield_now();
    }
    debugger.step_over();
    assert_eq!(handle.join().unwrap(), TraceAction::Continue);

    // A deeper call during step-over must not halt...
    let callee_line = ScriptedFrame { file: "a.py", line: 10.into(), depth: 1.into(), locals: vec![] };
    assert_eq!(debugger.on_trace(TraceEvent::Line, &callee_line), TraceAction::Continue);
    assert!(!debugger.is_halted());

    // ...but the line after the call site, back at the original depth, does.
    let after_call = ScriptedFrame { file: "a.py", line: 2.into(), depth: 0.into(), locals: vec![] };
    let d = debugger.clone();
    let handle = std::thread::spawn(move || d.on_trace(TraceEvent::Line, &after_call));
    while !debugger.is_halted() {
        std::thread::yield_now();
    }
    debugger.stop();
    handle.join().unwrap();

    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, DebuggerEvent::HaltAt { line: 1, .. })));
    assert!(events.iter().any(|e| matches!(e, DebuggerEvent::HaltAt { line: 2, .. })));
}

#[test]
fn breakpoint_file_round_trips_through_bytes() {
    let mut store = BreakpointStore::new();
    let (a, _) = store.add("m.py", 3);
    let (b, _) = store.add("m.py", 9);
    store.set_condition(a, Some("n == 1".to_string()));
    store.set_ignore_to(b, 4);

    let bytes = store.file("m.py").unwrap().serialize();
    let restored = BreakpointFile::deserialize(&bytes).unwrap();
    let ids: Vec<_> = restored.breakpoints().iter().map(|bp| bp.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(restored.breakpoints()[0].condition.as_deref(), Some("n == 1"));
}
