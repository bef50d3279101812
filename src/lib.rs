//! esqlc - an embedded-SQL translator front end
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export the pipeline crates for convenience
pub use esqlc_ast as ast;
pub use esqlc_driver as driver;
pub use esqlc_lexer as lexer;
pub use esqlc_parser as parser;

#[cfg(test)]
mod tests {
    #[test]
    fn facade_reaches_the_pipeline() {
        let output = crate::parser::parse("int main() { return 0; }");
        assert_eq!(output.program.items.len(), 1);
        assert!(output.diagnostics.is_empty());
    }
}
