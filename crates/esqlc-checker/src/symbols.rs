//! Symbol table for host-variable resolution

use std::collections::HashMap;

use esqlc_ast::{FieldDecl, HostType, Span, StructDecl};

/// A declared host variable, parameter, or struct field
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub ty: HostType,
    pub array_len: Option<u32>,
    /// Where the declaration was made
    pub span: Span,
}

impl VarInfo {
    /// True for `char buf[n]` style declarations, which bind as strings
    pub fn is_char_array(&self) -> bool {
        self.ty == HostType::Char && self.array_len.is_some()
    }
}

/// Scope-stacked variable table plus the unit's struct types
///
/// Scope zero is file scope; function entry and each block push a scope.
/// Lookup walks innermost-out, so local declarations shadow file-scope
/// ones the way the host compiler sees them.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, VarInfo>>,
    structs: HashMap<String, Vec<FieldDecl>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            structs: HashMap::new(),
        }
    }

    /// Define a variable in the innermost scope
    pub fn define(&mut self, name: impl Into<String>, info: VarInfo) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), info);
        }
    }

    /// Register a struct type for member resolution
    pub fn define_struct(&mut self, decl: &StructDecl) {
        self.structs.insert(decl.name.clone(), decl.fields.clone());
    }

    /// Look up a variable, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look up a field on a registered struct
    pub fn struct_field(&self, struct_name: &str, field: &str) -> Option<&FieldDecl> {
        self.structs
            .get(struct_name)?
            .iter()
            .find(|f| f.name == field)
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope; file scope is never popped
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
