use esqlc_ast::{DiagCode, Diagnostic};

/// Assert that no diagnostic in the list is an error
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
}

/// Assert that some diagnostic carries the given code
pub fn assert_has_code(diagnostics: &[Diagnostic], code: DiagCode) {
    assert!(
        diagnostics.iter().any(|d| d.code == code),
        "Expected a {} diagnostic, got: {:?}",
        code.as_str(),
        diagnostics
    );
}
