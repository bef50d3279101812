//! Cursor descriptors and the lifecycle registry

use std::collections::HashMap;

use esqlc_ast::{QueryText, Span};

/// Lifecycle states a named cursor moves through
///
/// Undeclared is represented by absence from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Declared,
    Open,
    Fetching,
    Closed,
}

impl CursorState {
    pub fn describe(&self) -> &'static str {
        match self {
            CursorState::Declared => "declared",
            CursorState::Open => "open",
            CursorState::Fetching => "fetching",
            CursorState::Closed => "closed",
        }
    }
}

/// Where a cursor's declaration appeared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorScope {
    File,
    Function,
}

/// Everything the unit knows about one named cursor
#[derive(Debug, Clone)]
pub struct CursorDescriptor {
    pub name: String,
    pub query: QueryText,
    pub declared_at: Span,
    pub state: CursorState,
    pub scope: CursorScope,
    /// Installed by an open with no visible declaration
    pub placeholder: bool,
}

/// Unit-wide cursor registry
///
/// Cursor names are global to the unit. Each function pass restarts every
/// lifecycle at Declared, so a file-scope cursor can be opened and closed
/// independently in several functions.
#[derive(Debug, Default)]
pub struct CursorTable {
    cursors: Vec<CursorDescriptor>,
    index: HashMap<String, usize>,
}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cursor; returns false when the name is already taken.
    /// A redeclaration keeps the first descriptor and restarts its
    /// lifecycle at the redeclaration point. The first real declaration
    /// of a name claims a placeholder left by an undeclared open.
    pub fn declare(&mut self, descriptor: CursorDescriptor) -> bool {
        if let Some(&existing) = self.index.get(&descriptor.name) {
            if self.cursors[existing].placeholder {
                self.cursors[existing] = descriptor;
                return true;
            }
            self.cursors[existing].state = CursorState::Declared;
            return false;
        }
        self.index
            .insert(descriptor.name.clone(), self.cursors.len());
        self.cursors.push(descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&CursorDescriptor> {
        self.index.get(name).map(|&i| &self.cursors[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CursorDescriptor> {
        let i = *self.index.get(name)?;
        Some(&mut self.cursors[i])
    }

    /// Restart every lifecycle for a fresh function pass
    pub fn reset(&mut self) {
        for cursor in &mut self.cursors {
            cursor.state = CursorState::Declared;
        }
    }

    /// Cursors currently open or mid-fetch
    pub fn left_open(&self) -> impl Iterator<Item = &CursorDescriptor> {
        self.cursors
            .iter()
            .filter(|c| matches!(c.state, CursorState::Open | CursorState::Fetching))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CursorDescriptor> {
        self.cursors.iter()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> CursorDescriptor {
        CursorDescriptor {
            name: name.to_string(),
            query: QueryText {
                text: "SELECT a FROM t".to_string(),
                params: Vec::new(),
                columns: Some(1),
            },
            declared_at: Span::new(0, 10),
            state: CursorState::Declared,
            scope: CursorScope::Function,
            placeholder: false,
        }
    }

    #[test]
    fn test_declare_rejects_duplicate_name() {
        let mut table = CursorTable::new();
        assert!(table.declare(descriptor("c1")));
        assert!(!table.declare(descriptor("c1")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_declare_claims_a_placeholder() {
        let mut table = CursorTable::new();
        let mut stub = descriptor("c1");
        stub.query.text = String::new();
        stub.state = CursorState::Open;
        stub.placeholder = true;
        table.declare(stub);

        assert!(table.declare(descriptor("c1")));
        assert_eq!(table.len(), 1);
        let claimed = table.get("c1").unwrap();
        assert!(!claimed.placeholder);
        assert_eq!(claimed.query.text, "SELECT a FROM t");
        assert_eq!(claimed.state, CursorState::Declared);
    }

    #[test]
    fn test_reset_restarts_lifecycles() {
        let mut table = CursorTable::new();
        table.declare(descriptor("c1"));
        table.get_mut("c1").unwrap().state = CursorState::Fetching;
        table.reset();
        assert_eq!(table.get("c1").unwrap().state, CursorState::Declared);
    }

    #[test]
    fn test_left_open_reports_open_and_fetching() {
        let mut table = CursorTable::new();
        table.declare(descriptor("a"));
        table.declare(descriptor("b"));
        table.declare(descriptor("c"));
        table.get_mut("a").unwrap().state = CursorState::Open;
        table.get_mut("b").unwrap().state = CursorState::Fetching;
        table.get_mut("c").unwrap().state = CursorState::Closed;
        let names: Vec<&str> = table.left_open().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
