//! Mode-switching lexer for embedded-SQL source files
//!
//! A unit is host-language code with SQL statements spliced in behind the
//! `EXEC SQL` introducer. The lexer runs the host grammar until it pairs
//! an `EXEC` with a following `SQL`, then switches to the SQL grammar
//! until the statement terminator at matching nesting depth. Mode changes
//! are a stack, so a `;` inside a parenthesized sub-select never ends the
//! statement.
//!
//! The output is lossless: every non-whitespace byte of the input is
//! covered by a token span or a comment span, in source order. Comments
//! are collected on the side so comment-preserving output can reattach
//! them without the parser ever seeing them.

use esqlc_ast::{CancelToken, Cancelled, DiagCode, Diagnostic, Span};
use logos::Logos;

pub mod token;

pub use token::{HostToken, LexMode, SqlToken, TokenKind};

/// A single token with its source span and originating mode
///
/// The lexeme is not stored; slice it from the source via [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub mode: LexMode,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// Everything the lexer produced for one unit
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    /// Token stream, ending with a single `Eof` token
    pub tokens: Vec<Token>,
    /// Comment spans in source order, host and SQL comments alike
    pub comments: Vec<Span>,
    /// Lexical diagnostics; never fatal, the stream is always complete
    pub diagnostics: Vec<Diagnostic>,
}

/// Lexing mode stack entries
///
/// `SqlGroup` marks a parenthesized group inside an embedded statement.
/// The terminator only pops when `Sql` itself is on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Host,
    Sql,
    SqlGroup,
}

enum Step<'a> {
    Host(logos::Lexer<'a, HostToken>),
    Sql(logos::Lexer<'a, SqlToken>),
    Done,
}

struct LexState<'a> {
    source: &'a str,
    cancel: &'a CancelToken,
    out: LexOutput,
    stack: Vec<Mode>,
    /// Span of an `EXEC` waiting for its `SQL`
    pending_exec: Option<Span>,
    /// Start of the introducer of the embedded statement being lexed
    embedded_start: usize,
}

impl<'a> LexState<'a> {
    fn emit(&mut self, kind: TokenKind, span: Span, mode: LexMode) {
        self.out.tokens.push(Token { kind, span, mode });
    }

    /// A pending `EXEC` that never met its `SQL` is an ordinary identifier
    fn flush_pending_exec(&mut self) {
        if let Some(span) = self.pending_exec.take() {
            self.emit(TokenKind::Ident, span, LexMode::Host);
        }
    }

    fn text_at(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }
}

/// Tokenize a unit without cancellation
pub fn tokenize(source: &str) -> LexOutput {
    let token = CancelToken::new();
    match tokenize_with(source, &token) {
        Ok(output) => output,
        // the token above has no other handle, so this arm cannot run
        Err(Cancelled) => LexOutput::default(),
    }
}

/// Tokenize a unit, polling `cancel` at statement boundaries
pub fn tokenize_with(source: &str, cancel: &CancelToken) -> Result<LexOutput, Cancelled> {
    let mut state = LexState {
        source,
        cancel,
        out: LexOutput::default(),
        stack: vec![Mode::Host],
        pending_exec: None,
        embedded_start: 0,
    };

    let mut step = Step::Host(HostToken::lexer(source));
    loop {
        step = match step {
            Step::Host(lx) => host_step(&mut state, lx)?,
            Step::Sql(lx) => sql_step(&mut state, lx)?,
            Step::Done => break,
        };
    }

    let end = source.len();
    state.out.tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
        mode: LexMode::Host,
    });
    Ok(state.out)
}

fn host_step<'a>(
    state: &mut LexState<'a>,
    mut lx: logos::Lexer<'a, HostToken>,
) -> Result<Step<'a>, Cancelled> {
    let Some(result) = lx.next() else {
        state.flush_pending_exec();
        return Ok(Step::Done);
    };
    let span = Span::new(lx.span().start, lx.span().end);

    match result {
        Ok(HostToken::LineComment) | Ok(HostToken::BlockComment) => {
            // comments may sit between EXEC and SQL, so keep the pair pending
            state.out.comments.push(span);
        }
        Ok(HostToken::Exec) => {
            state.flush_pending_exec();
            state.pending_exec = Some(span);
        }
        Ok(HostToken::Sql) => {
            if let Some(exec) = state.pending_exec.take() {
                let intro = exec.merge(span);
                state.emit(TokenKind::ExecSql, intro, LexMode::Host);
                state.stack.push(Mode::Sql);
                state.embedded_start = intro.start;
                return Ok(Step::Sql(lx.morph()));
            }
            state.emit(TokenKind::Ident, span, LexMode::Host);
        }
        Ok(HostToken::Directive) => {
            state.flush_pending_exec();
            let kind = classify_directive(state.text_at(span));
            state.emit(kind, span, LexMode::Host);
        }
        Ok(HostToken::StringUnterminated) => {
            state.flush_pending_exec();
            state.out.diagnostics.push(Diagnostic::error(
                DiagCode::UnterminatedString,
                "string literal is not terminated",
                span,
            ));
            state.emit(TokenKind::StringLit, span, LexMode::Host);
        }
        Ok(HostToken::CharUnterminated) => {
            state.flush_pending_exec();
            state.out.diagnostics.push(Diagnostic::error(
                DiagCode::UnterminatedString,
                "character literal is not terminated",
                span,
            ));
            state.emit(TokenKind::CharLit, span, LexMode::Host);
        }
        Ok(other) => {
            state.flush_pending_exec();
            let kind = other.unified();
            state.emit(kind, span, LexMode::Host);
            if matches!(kind, TokenKind::Semi | TokenKind::RBrace) && state.cancel.is_cancelled() {
                return Err(Cancelled);
            }
        }
        Err(_) => {
            state.flush_pending_exec();
            if state.text_at(span).starts_with("/*") {
                state.out.diagnostics.push(Diagnostic::error(
                    DiagCode::UnterminatedComment,
                    "block comment is not terminated",
                    span,
                ));
                state.out.comments.push(span);
            } else {
                state.out.diagnostics.push(Diagnostic::error(
                    DiagCode::UnexpectedCharacter,
                    format!("unexpected character {:?}", state.text_at(span)),
                    span,
                ));
                state.emit(TokenKind::Error, span, LexMode::Host);
            }
        }
    }
    Ok(Step::Host(lx))
}

fn sql_step<'a>(
    state: &mut LexState<'a>,
    mut lx: logos::Lexer<'a, SqlToken>,
) -> Result<Step<'a>, Cancelled> {
    let Some(result) = lx.next() else {
        let span = Span::new(state.embedded_start, state.source.len());
        state.out.diagnostics.push(Diagnostic::error(
            DiagCode::UnterminatedEmbedded,
            "embedded statement is not terminated before end of input",
            span,
        ));
        // treat end of input as the terminator: tokens so far stand
        return Ok(Step::Done);
    };
    let span = Span::new(lx.span().start, lx.span().end);

    match result {
        Ok(SqlToken::LineComment) | Ok(SqlToken::BlockComment) => {
            state.out.comments.push(span);
        }
        Ok(SqlToken::LParen) => {
            state.stack.push(Mode::SqlGroup);
            state.emit(TokenKind::LParen, span, LexMode::Sql);
        }
        Ok(SqlToken::RParen) => {
            if state.stack.last() == Some(&Mode::SqlGroup) {
                state.stack.pop();
            } else {
                state.out.diagnostics.push(Diagnostic::error(
                    DiagCode::UnbalancedNesting,
                    "')' without a matching '(' in embedded statement",
                    span,
                ));
            }
            state.emit(TokenKind::RParen, span, LexMode::Sql);
        }
        Ok(SqlToken::Semi) => {
            state.emit(TokenKind::Semi, span, LexMode::Sql);
            if state.stack.last() == Some(&Mode::Sql) {
                state.stack.pop();
                if state.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                return Ok(Step::Host(lx.morph()));
            }
            // inside a parenthesized group the terminator is inert
        }
        Ok(SqlToken::StringUnterminated) => {
            state.out.diagnostics.push(Diagnostic::error(
                DiagCode::UnterminatedString,
                "string literal is not terminated",
                span,
            ));
            state.emit(TokenKind::StringLit, span, LexMode::Sql);
        }
        Ok(other) => {
            state.emit(other.unified(), span, LexMode::Sql);
        }
        Err(_) => {
            if state.text_at(span).starts_with("/*") {
                state.out.diagnostics.push(Diagnostic::error(
                    DiagCode::UnterminatedComment,
                    "block comment is not terminated",
                    span,
                ));
                state.out.comments.push(span);
            } else {
                state.out.diagnostics.push(Diagnostic::error(
                    DiagCode::UnexpectedCharacter,
                    format!("unexpected character {:?}", state.text_at(span)),
                    span,
                ));
                state.emit(TokenKind::Error, span, LexMode::Sql);
            }
        }
    }
    Ok(Step::Sql(lx))
}

fn classify_directive(text: &str) -> TokenKind {
    let body = text.trim_start_matches('#').trim_start();
    if body.starts_with("include") {
        TokenKind::IncludeDirective
    } else if body.starts_with("define") {
        TokenKind::DefineDirective
    } else {
        TokenKind::Directive
    }
}

/// Extract the header name from an `#include` line, plus whether it used
/// angle brackets
pub fn parse_include(text: &str) -> Option<(String, bool)> {
    let body = text
        .trim_start_matches('#')
        .trim_start()
        .strip_prefix("include")?
        .trim_start();
    if let Some(rest) = body.strip_prefix('<') {
        let name = rest.split('>').next()?;
        Some((name.trim().to_string(), true))
    } else if let Some(rest) = body.strip_prefix('"') {
        let name = rest.split('"').next()?;
        Some((name.to_string(), false))
    } else {
        None
    }
}

/// Extract name and replacement body from a `#define` line
pub fn parse_define(text: &str) -> Option<(String, Option<String>)> {
    let body = text
        .trim_start_matches('#')
        .trim_start()
        .strip_prefix("define")?
        .trim_start();
    let name_end = body
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_'))
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    if name_end == 0 {
        return None;
    }
    let name = body[..name_end].to_string();
    let replacement = body[name_end..].replace("\\\n", " ");
    let replacement = replacement.trim();
    if replacement.is_empty() {
        Some((name, None))
    } else {
        Some((name, Some(replacement.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(output: &LexOutput) -> Vec<TokenKind> {
        output.tokens.iter().map(|t| t.kind).collect()
    }

    fn find_text<'a>(output: &'a LexOutput, source: &str, text: &str) -> Option<&'a Token> {
        output.tokens.iter().find(|t| t.text(source) == text)
    }

    #[test]
    fn test_tokenize_host_only() {
        let source = "int main() { return 0; }";
        let output = tokenize(source);
        assert!(output.diagnostics.is_empty());
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::KwInt,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::IntLit,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
        assert!(output.tokens.iter().all(|t| t.mode == LexMode::Host));
    }

    #[test]
    fn test_exec_sql_is_one_token() {
        let source = "EXEC SQL COMMIT;";
        let output = tokenize(source);
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::ExecSql,
                TokenKind::KwCommit,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
        assert_eq!(output.tokens[0].text(source), "EXEC SQL");
        assert_eq!(output.tokens[1].mode, LexMode::Sql);
        assert_eq!(output.tokens[2].mode, LexMode::Sql);
    }

    #[test]
    fn test_introducer_is_case_insensitive() {
        let output = tokenize("exec sql commit;");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::ExecSql,
                TokenKind::KwCommit,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lone_exec_is_an_identifier() {
        let source = "EXEC frobnicate();";
        let output = tokenize(source);
        assert_eq!(output.tokens[0].kind, TokenKind::Ident);
        assert_eq!(output.tokens[0].text(source), "EXEC");
        assert!(output.tokens.iter().all(|t| t.mode == LexMode::Host));
    }

    #[test]
    fn test_mode_switches_back_after_terminator() {
        let source = "int x; EXEC SQL OPEN c1; x = 1;";
        let output = tokenize(source);
        let open = find_text(&output, source, "OPEN").unwrap();
        assert_eq!(open.kind, TokenKind::KwOpen);
        assert_eq!(open.mode, LexMode::Sql);
        let x_after = output
            .tokens
            .iter()
            .filter(|t| t.text(source) == "x")
            .nth(1)
            .unwrap();
        assert_eq!(x_after.mode, LexMode::Host);
    }

    #[test]
    fn test_terminator_inside_group_is_inert() {
        let source = "EXEC SQL INSERT INTO t VALUES (1; 2); y = 1;";
        let output = tokenize(source);
        let semis: Vec<&Token> = output
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Semi && t.mode == LexMode::Sql)
            .collect();
        assert_eq!(semis.len(), 2);
        let y = find_text(&output, source, "y").unwrap();
        assert_eq!(y.mode, LexMode::Host);
    }

    #[test]
    fn test_multiline_embedded_statement() {
        let source = "EXEC SQL\n  SELECT name\n  INTO :n\n  FROM emp;\n";
        let output = tokenize(source);
        assert!(output.diagnostics.is_empty());
        let var = find_text(&output, source, ":n").unwrap();
        assert_eq!(var.kind, TokenKind::HostVar);
        assert_eq!(var.mode, LexMode::Sql);
    }

    #[test]
    fn test_host_var_with_member_access() {
        let source = "EXEC SQL SELECT name INTO :emp.name FROM t;";
        let output = tokenize(source);
        let var = find_text(&output, source, ":emp.name").unwrap();
        assert_eq!(var.kind, TokenKind::HostVar);
    }

    #[test]
    fn test_comments_are_collected_not_streamed() {
        let source = "/* a */ int x; // b\nEXEC SQL -- c\n COMMIT;";
        let output = tokenize(source);
        assert_eq!(output.comments.len(), 3);
        assert_eq!(&source[output.comments[0].start..output.comments[0].end], "/* a */");
        assert_eq!(&source[output.comments[1].start..output.comments[1].end], "// b");
        assert_eq!(&source[output.comments[2].start..output.comments[2].end], "-- c");
        assert!(kinds(&output).contains(&TokenKind::KwCommit));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let source = "int x; /* never closed";
        let output = tokenize(source);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, DiagCode::UnterminatedComment);
        let span = output.comments[0];
        assert_eq!(span.end, source.len());
    }

    #[test]
    fn test_unterminated_string_still_yields_a_token() {
        let source = "char *s = \"abc;";
        let output = tokenize(source);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, DiagCode::UnterminatedString);
        assert!(kinds(&output).contains(&TokenKind::StringLit));
    }

    #[test]
    fn test_unterminated_embedded_statement() {
        let source = "EXEC SQL SELECT 1";
        let output = tokenize(source);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, DiagCode::UnterminatedEmbedded);
        assert_eq!(output.tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_sql_string_with_doubled_quote() {
        let source = "EXEC SQL SELECT 'it''s' INTO :x FROM t;";
        let output = tokenize(source);
        let lit = find_text(&output, source, "'it''s'").unwrap();
        assert_eq!(lit.kind, TokenKind::StringLit);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_directive_classification() {
        let source = "#include <stdio.h>\n#include \"local.h\"\n#define NOT_FOUND 1403\n#ifdef X\n";
        let output = tokenize(source);
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::IncludeDirective,
                TokenKind::IncludeDirective,
                TokenKind::DefineDirective,
                TokenKind::Directive,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_parse_include() {
        assert_eq!(
            parse_include("#include <stdio.h>"),
            Some(("stdio.h".to_string(), true))
        );
        assert_eq!(
            parse_include("# include \"emp.h\""),
            Some(("emp.h".to_string(), false))
        );
        assert_eq!(parse_include("#define X 1"), None);
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("#define NOT_FOUND 1403"),
            Some(("NOT_FOUND".to_string(), Some("1403".to_string())))
        );
        assert_eq!(parse_define("#define FLAG"), Some(("FLAG".to_string(), None)));
    }

    #[test]
    fn test_every_nonblank_byte_is_covered() {
        let source = "#include <a.h>\nint f() {\n  /* c1 */\n  EXEC SQL SELECT a -- tail\n    INTO :x FROM t;\n  return 0; // done\n}\n";
        let output = tokenize(source);
        let mut covered = vec![false; source.len()];
        for token in &output.tokens {
            for slot in &mut covered[token.span.start..token.span.end] {
                *slot = true;
            }
        }
        for comment in &output.comments {
            for slot in &mut covered[comment.start..comment.end] {
                *slot = true;
            }
        }
        for (i, byte) in source.bytes().enumerate() {
            if !byte.is_ascii_whitespace() {
                assert!(covered[i], "byte {} ({:?}) not covered", i, byte as char);
            }
        }
    }

    #[test]
    fn test_tokens_are_in_source_order() {
        let source = "int a; EXEC SQL OPEN c; int b;";
        let output = tokenize(source);
        let starts: Vec<usize> = output.tokens.iter().map(|t| t.span.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_cancellation_stops_at_statement_boundary() {
        let token = CancelToken::new();
        token.cancel();
        let result = tokenize_with("int x; int y;", &token);
        assert_eq!(result.err(), Some(Cancelled));
    }
}
