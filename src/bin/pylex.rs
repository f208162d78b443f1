//! `pylex`: tokenize a Python source file and dump its tokens/scan-info, or
//! replay a serialized breakpoint file against a mock interpreter frame to
//! smoke-test condition evaluation. All logic lives in the `pycore` library;
//! this binary only adapts CLI argument parsing and console output.

use clap::{Parser, Subcommand};
use log::info;

use pycore::debugger::breakpoint::BreakpointFile;
use pycore::debugger::exception::ExceptionInfo;
use pycore::debugger::{rewrite_condition, InterpreterFrame};
use pycore::lexer::{Lexer, LexerConfig};
use pycore::semantic::Analyzer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tokenize Python source or replay a breakpoint file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize `file` and print its tokens plus any scan-info messages.
    Tokenize {
        file: std::path::PathBuf,
        /// Also run the semantic pass and print resolved identifier types.
        #[arg(long)]
        semantic: bool,
    },
    /// Load breakpoints serialized per SPEC_FULL.md §6 and evaluate each
    /// condition against a mock frame built from `--locals key=value` pairs.
    ReplayBreakpoints {
        file: std::path::PathBuf,
        #[arg(long = "locals", value_delimiter = ',')]
        locals: Vec<String>,
    },
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let args = Cli::parse();

    match args.command {
        Command::Tokenize { file, semantic } => tokenize(&file, semantic),
        Command::ReplayBreakpoints { file, locals } => replay_breakpoints(&file, &locals),
    }
}

fn tokenize(path: &std::path::Path, semantic: bool) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        log::error!("could not read {}: {e}", path.display());
        std::process::exit(1);
    });

    let mut lexer = Lexer::new(LexerConfig::default());
    lexer.load(&source);
    info!("tokenized {} lines", lexer.tokens().line_count());

    let mut analyzer = Analyzer::new();
    if semantic {
        analyzer.analyze_all(lexer.tokens_mut());
    }

    for line in lexer.tokens().iter_lines() {
        let Some(tl) = lexer.tokens().line(line) else { continue };
        println!("L{:>4} | indent={:<3} cont={} block_delta={:+} {:?}", tl.line_number(), tl.indent, tl.is_continuation, tl.block_delta, tl.text());
        for handle in lexer.tokens().tokens_in_line(line) {
            let Some(tok) = lexer.tokens().token(handle) else { continue };
            let text = tok.text(tl.text());
            let type_suffix = if semantic {
                format!(" -> {:?}", analyzer.identifier_type(lexer.tokens(), handle))
            } else {
                String::new()
            };
            println!("       {:?} {:?}{type_suffix}", tok.kind, text);
        }
        if let Some(scan) = tl.scan_info() {
            for msg in scan.messages() {
                println!("       [{:?}] {}", msg.severity, msg.text);
            }
        }
    }
}

struct StaticFrame {
    file: String,
    line: u32,
    locals: Vec<(String, String)>,
}

impl InterpreterFrame for StaticFrame {
    fn file(&self) -> &str {
        &self.file
    }
    fn function(&self) -> &str {
        "<module>"
    }
    fn line(&self) -> u32 {
        self.line
    }
    fn depth(&self) -> u32 {
        0
    }
    fn eval_condition(&self, expr: &str) -> Option<bool> {
        // A tiny `name OP literal` evaluator — enough to smoke-test the
        // `=` -> `==` rewrite without embedding a real interpreter.
        for (op, f) in [("==", (|a: &str, b: &str| a == b) as fn(&str, &str) -> bool), ("!=", |a, b| a != b)] {
            if let Some((lhs, rhs)) = expr.split_once(op) {
                let lhs = lhs.trim();
                let rhs = rhs.trim();
                let value = self.locals.iter().find(|(k, _)| k == lhs).map(|(_, v)| v.as_str())?;
                return Some(f(value, rhs));
            }
        }
        None
    }
    fn exception_will_be_caught(&self) -> bool {
        false
    }
    fn current_exception(&self) -> Option<ExceptionInfo> {
        None
    }
}

fn replay_breakpoints(path: &std::path::Path, locals: &[String]) {
    let bytes = std::fs::read(path).unwrap_or_else(|e| {
        log::error!("could not read {}: {e}", path.display());
        std::process::exit(1);
    });
    let bf = BreakpointFile::deserialize(&bytes).unwrap_or_else(|e| {
        log::error!("malformed breakpoint file: {e}");
        std::process::exit(1);
    });
    let locals: Vec<(String, String)> = locals
        .iter()
        .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect();

    for bp in bf.breakpoints() {
        let frame = StaticFrame { file: bf.path.clone(), line: bp.line, locals: locals.clone() };
        let verdict = match &bp.condition {
            Some(cond) => frame.eval_condition(&rewrite_condition(cond)),
            None => Some(bp.enabled),
        };
        println!("{}:{} condition={:?} -> {:?}", bf.path, bp.line, bp.condition, verdict);
    }
}
