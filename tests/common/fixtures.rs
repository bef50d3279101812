use std::fs;
use std::path::{Path, PathBuf};

/// Get path to the tests/fixtures/ directory
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_dir().join(name);
    fs::read_to_string(&path).expect(&format!("Failed to load fixture: {}", name))
}
