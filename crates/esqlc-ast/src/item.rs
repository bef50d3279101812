//! Top-level AST nodes
//!
//! A translation unit is an ordered sequence of items; order is source
//! order and the generator's schedule.

use serde::{Deserialize, Serialize};

use crate::{Block, EmbeddedStmt, HostStmt, HostType, Span, UnparsedNode};

/// A top-level item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    /// `#include <stdio.h>` or `#include "sqldefs.h"`
    #[serde(rename = "IncludeDirective")]
    Include(IncludeDirective),

    /// `#define NOT_FOUND 1403`
    #[serde(rename = "MacroDefine")]
    Define(MacroDefine),

    /// `struct employee { ... };`
    #[serde(rename = "StructDeclaration")]
    Struct(StructDecl),

    /// `int report(int dept_id) { ... }`
    #[serde(rename = "FunctionDeclaration")]
    Function(FunctionDecl),

    /// File-scope `int counter;`
    #[serde(rename = "VariableDeclaration")]
    Variable(VariableDecl),

    /// File-scope `EXEC SQL ... ;` (declare sections, cursor declares)
    #[serde(rename = "EmbeddedStatement")]
    Embedded(EmbeddedStmt),

    /// Host text we carry through without interpreting
    #[serde(rename = "HostStatement")]
    Host(HostStmt),

    /// Recovery placeholder for a malformed item
    #[serde(rename = "Unparsed")]
    Unparsed(UnparsedNode),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Include(node) => node.span,
            Item::Define(node) => node.span,
            Item::Struct(node) => node.span,
            Item::Function(node) => node.span,
            Item::Variable(node) => node.span,
            Item::Embedded(node) => node.span,
            Item::Host(node) => node.span,
            Item::Unparsed(node) => node.span,
        }
    }
}

/// Include directive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeDirective {
    /// Header name without the delimiters
    pub name: String,
    /// True for `<...>`, false for `"..."`
    pub system: bool,
    pub span: Span,
}

/// Macro definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroDefine {
    pub name: String,
    /// Replacement text, `None` for a bare `#define FLAG`
    pub body: Option<String>,
    pub span: Span,
}

/// Struct declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// Field in a struct
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HostType,
    /// `char name[40]` carries `Some(40)`
    pub array_len: Option<u32>,
    pub span: Span,
}

/// Function definition with its body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDecl {
    pub name: String,
    /// Return type as written (`int`, `void`, `struct employee`)
    pub return_type: String,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: HostType,
    pub span: Span,
}

/// One declarator of a host variable declaration
///
/// `int a, b;` produces two of these, one per declared name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDecl {
    pub name: String,
    pub ty: HostType,
    pub array_len: Option<u32>,
    /// Initializer text, kept opaque
    pub init: Option<String>,
    pub span: Span,
}
