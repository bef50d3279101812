//! Host-language type representation
//!
//! Only the subset a precompiler needs: enough to pick typed column
//! accessors for fetch destinations and to size character buffers.
//! Full host type checking is out of scope.

use serde::{Deserialize, Serialize};

/// Declared type of a host variable or struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostType {
    Int,
    Short,
    Long,
    Float,
    Double,
    Char,
    /// `struct <name> x;`
    Struct(String),
    /// A typedef'd name we do not resolve further
    Named(String),
    Unknown,
}

impl HostType {
    pub fn describe(&self) -> String {
        match self {
            HostType::Int => "int".into(),
            HostType::Short => "short".into(),
            HostType::Long => "long".into(),
            HostType::Float => "float".into(),
            HostType::Double => "double".into(),
            HostType::Char => "char".into(),
            HostType::Struct(name) => format!("struct {}", name),
            HostType::Named(name) => name.clone(),
            HostType::Unknown => "<unknown>".into(),
        }
    }
}
