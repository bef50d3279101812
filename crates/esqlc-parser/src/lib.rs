//! Recursive descent parser for embedded-SQL units
//!
//! Parsing never fails: malformed regions become `Unparsed` nodes with
//! diagnostics attached, and the rest of the unit is still structured.
//! Key parsing points:
//! - Host code is shallow: control flow that can contain embedded SQL is
//!   recursed, everything else stays opaque statement text
//! - Embedded statements are classified by leading keywords
//! - A "no more rows" conditional right after a fetch is folded into the
//!   fetch itself

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use esqlc_ast::{CancelToken, Cancelled, Diagnostic, Program, Span};
use esqlc_lexer::tokenize_with;

/// Everything the front half of the pipeline produced for one unit
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    /// Comment spans carried over from the lexer, in source order
    pub comments: Vec<Span>,
    /// Lexical and syntactic diagnostics combined
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a source string into a program
pub fn parse(source: &str) -> ParseOutput {
    let token = CancelToken::new();
    match parse_with(source, &token) {
        Ok(output) => output,
        // the token above has no other handle, so this arm cannot run
        Err(Cancelled) => ParseOutput {
            program: Program::new(Vec::new(), Span::new(0, 0)),
            comments: Vec::new(),
            diagnostics: Vec::new(),
        },
    }
}

/// Parse a source string, polling `cancel` at unit boundaries
pub fn parse_with(source: &str, cancel: &CancelToken) -> Result<ParseOutput, Cancelled> {
    let lexed = tokenize_with(source, cancel)?;
    let mut diagnostics = lexed.diagnostics;
    let mut parser = Parser::new(source, lexed.tokens);
    let program = parser.parse_program(cancel)?;
    diagnostics.extend(parser.take_diagnostics());
    Ok(ParseOutput {
        program,
        comments: lexed.comments,
        diagnostics,
    })
}
