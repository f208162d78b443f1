//! `pyls`: a minimal editor-protocol server. Publishes diagnostics built
//! from `ScanInfo` and answers goto-definition from the analyzer's
//! `frame_containing`/`identifier_type` queries. All analysis lives in the
//! `pycore` library; this binary only adapts LSP transport.

use std::collections::HashMap;

use anyhow::Result;
use lsp_server::{Connection, ExtractError, Message, Notification, Request, RequestId, Response};
use lsp_types::notification::{DidOpenTextDocument, Notification as _, PublishDiagnostics};
use lsp_types::request::{GotoDefinition, Request as _};
use lsp_types::{
    Diagnostic, DiagnosticSeverity, GotoDefinitionParams, GotoDefinitionResponse, InitializeParams,
    Location, OneOf, Position, PublishDiagnosticsParams, Range, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use tracing::{error, info};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use pycore::lexer::{Lexer, LexerConfig};
use pycore::semantic::Analyzer;
use pycore::token::scan_info::Severity;

fn main() -> Result<()> {
    let filter = filter::Targets::new().with_target("pyls", tracing::metadata::LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact().with_ansi(false))
        .with(filter)
        .init();

    info!("starting pyls");

    let (connection, io_threads) = Connection::stdio();
    let server_capabilities = serde_json::to_value(ServerCapabilities {
        definition_provider: Some(OneOf::Left(true)),
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        ..Default::default()
    })
    .unwrap();
    let initialization_params = match connection.initialize(server_capabilities) {
        Ok(it) => it,
        Err(e) => {
            if e.channel_is_disconnected() {
                io_threads.join()?;
            }
            return Err(e.into());
        }
    };
    main_loop(connection, initialization_params)?;
    io_threads.join()?;
    info!("shutting down pyls");
    Ok(())
}

/// One document's analysis, rebuilt wholesale on every `didOpen`/`didChange`
/// (the incremental `reanalyze_line` path is exercised by the library's own
/// tests; this binary keeps the transport-facing slice simple).
struct Document {
    lexer: Lexer,
    analyzer: Analyzer,
}

fn main_loop(connection: Connection, params: serde_json::Value) -> Result<()> {
    let _params: InitializeParams = serde_json::from_value(params)?;
    let mut docs: HashMap<Url, Document> = HashMap::new();

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    return Ok(());
                }
                match cast::<GotoDefinition>(req) {
                    Ok((id, params)) => {
                        let response = goto_definition(&docs, params);
                        connection.sender.send(Message::Response(Response {
                            id,
                            result: Some(serde_json::to_value(&response)?),
                            error: None,
                        }))?;
                    }
                    Err(ExtractError::MethodMismatch(_)) => {}
                    Err(err) => error!("bad request: {err:?}"),
                }
            }
            Message::Notification(not) => {
                handle_notification(&connection, &mut docs, not)?;
            }
            Message::Response(_) => {}
        }
    }
    Ok(())
}

fn handle_notification(connection: &Connection, docs: &mut HashMap<Url, Document>, not: Notification) -> Result<()> {
    if not.method != DidOpenTextDocument::METHOD {
        return Ok(());
    }
    let params: lsp_types::DidOpenTextDocumentParams = serde_json::from_value(not.params)?;
    let uri = params.text_document.uri.clone();
    let mut lexer = Lexer::new(LexerConfig::default());
    lexer.load(&params.text_document.text);
    let mut analyzer = Analyzer::new();
    analyzer.analyze_all(lexer.tokens_mut());

    let diagnostics = collect_diagnostics(&lexer);
    connection.sender.send(Message::Notification(Notification {
        method: PublishDiagnostics::METHOD.to_string(),
        params: serde_json::to_value(PublishDiagnosticsParams { uri: uri.clone(), diagnostics, version: None })?,
    }))?;

    docs.insert(uri, Document { lexer, analyzer });
    Ok(())
}

fn collect_diagnostics(lexer: &Lexer) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for line in lexer.tokens().iter_lines() {
        let Some(tl) = lexer.tokens().line(line) else { continue };
        let Some(scan) = tl.scan_info() else { continue };
        let row = tl.line_number() - 1;
        for msg in scan.messages() {
            let severity = match msg.severity {
                Severity::SyntaxError | Severity::IndentError => DiagnosticSeverity::ERROR,
                Severity::LookupError => DiagnosticSeverity::WARNING,
                Severity::Issue | Severity::Warning => DiagnosticSeverity::WARNING,
                Severity::Message => DiagnosticSeverity::HINT,
            };
            let range = Range::new(Position::new(row, 0), Position::new(row, tl.text().len() as u32));
            out.push(Diagnostic { range, severity: Some(severity), message: msg.text.clone(), ..Default::default() });
        }
    }
    out
}

fn goto_definition(docs: &HashMap<Url, Document>, params: GotoDefinitionParams) -> Option<GotoDefinitionResponse> {
    let uri = params.text_document_position_params.text_document.uri;
    let doc = docs.get(&uri)?;
    let position = params.text_document_position_params.position;
    let line = doc.lexer.tokens().line_at(position.line as i64)?;
    let col = position.character;
    let token = doc
        .lexer
        .tokens()
        .tokens_in_line(line)
        .find(|&h| doc.lexer.tokens().token(h).map(|t| t.span.contains(&col)).unwrap_or(false))?;

    let frame_id = doc.analyzer.frame_containing(doc.lexer.tokens(), token);
    let frame = doc.analyzer.frame(frame_id)?;
    let header = doc.lexer.tokens().token(frame.header_token)?;
    let header_line = doc.lexer.tokens().line(header.line)?;
    let range = Range::new(
        Position::new(header_line.line_number() - 1, header.span.start),
        Position::new(header_line.line_number() - 1, header.span.end),
    );
    Some(GotoDefinitionResponse::Scalar(Location { uri, range }))
}

fn cast<R>(req: Request) -> Result<(RequestId, R::Params), ExtractError<Request>>
where
    R: lsp_types::request::Request,
    R::Params: serde::de::DeserializeOwned,
{
    req.extract(R::METHOD)
}
