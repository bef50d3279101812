//! esqlc AST - Core types for the translator front end
//!
//! This crate defines the node types for the mixed host/embedded-SQL
//! syntax tree, source spans, structured diagnostics, and the shared
//! cancellation token. Serialization is serde throughout: the JSON tree
//! carries a `"type"` discriminator per node and a `"subtype"` per
//! embedded statement.

mod cancel;
mod diag;
mod embedded;
mod item;
mod span;
mod stmt;
mod types;

pub use cancel::*;
pub use diag::*;
pub use embedded::*;
pub use item::*;
pub use span::*;
pub use stmt::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// A complete translation unit
///
/// Items appear in source order; that order is semantically significant
/// and must survive translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

impl Program {
    pub fn new(items: Vec<Item>, span: Span) -> Self {
        Self { items, span }
    }

    /// Iterate every function definition in source order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(func) => Some(func),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_items_carry_type_discriminator() {
        let program = Program::new(
            vec![Item::Include(IncludeDirective {
                name: "stdio.h".into(),
                system: true,
                span: Span::new(0, 18),
            })],
            Span::new(0, 18),
        );
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["items"][0]["type"], "IncludeDirective");
        assert_eq!(json["items"][0]["name"], "stdio.h");
    }

    #[test]
    fn test_serialized_embedded_carries_subtype() {
        let stmt = EmbeddedStmt {
            kind: EmbeddedKind::Close {
                cursor_name: "emp_cur".into(),
            },
            sql: "CLOSE emp_cur".into(),
            span: Span::new(0, 22),
        };
        let json = serde_json::to_value(Item::Embedded(stmt)).unwrap();
        assert_eq!(json["type"], "EmbeddedStatement");
        assert_eq!(json["subtype"], "Close");
        assert_eq!(json["cursorName"], "emp_cur");
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(4, 10).merge(Span::new(8, 20));
        assert_eq!(merged, Span::new(4, 20));
    }
}
