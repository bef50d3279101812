//! Statement AST nodes (function-body level)

use serde::{Deserialize, Serialize};

use crate::{EmbeddedStmt, Span, VariableDecl};

/// A statement inside a function body
///
/// Host control flow is kept shallow: headers stay opaque text, but block
/// and branch bodies are recursed so embedded statements nested in loops
/// and conditionals are always discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    /// Local host variable declaration
    #[serde(rename = "VariableDeclaration")]
    Declaration(VariableDecl),

    /// Opaque host statement up to its `;`
    #[serde(rename = "HostStatement")]
    Host(HostStmt),

    /// `{ ... }`
    #[serde(rename = "Block")]
    Block(Block),

    /// `if (...) ... [else ...]`
    #[serde(rename = "If")]
    If(IfStmt),

    /// `while (...)`, `for (...)`, `do ... while (...)`
    #[serde(rename = "Loop")]
    Loop(LoopStmt),

    /// `EXEC SQL ... ;`
    #[serde(rename = "EmbeddedStatement")]
    Embedded(EmbeddedStmt),

    /// Recovery placeholder for a malformed statement
    #[serde(rename = "Unparsed")]
    Unparsed(UnparsedNode),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declaration(node) => node.span,
            Stmt::Host(node) => node.span,
            Stmt::Block(node) => node.span,
            Stmt::If(node) => node.span,
            Stmt::Loop(node) => node.span,
            Stmt::Embedded(node) => node.span,
            Stmt::Unparsed(node) => node.span,
        }
    }
}

/// An opaque host-language statement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStmt {
    /// Statement text as written, terminator included
    pub text: String,
    pub span: Span,
}

/// A braced block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// An `if` with an opaque condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfStmt {
    /// Condition text without the surrounding parentheses
    pub cond: String,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// A loop with an opaque header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopStmt {
    pub kind: LoopKind,
    /// Header text without the surrounding parentheses
    pub header: String,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    While,
    For,
    /// `do ... while (header);` -- the header is tested after the body
    DoWhile,
}

/// Text the parser gave up on; the generator emits a marker in its place
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparsedNode {
    pub text: String,
    pub span: Span,
}
