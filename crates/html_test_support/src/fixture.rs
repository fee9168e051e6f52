//! Golden fixtures for the html rewrite.
//!
//! One TOML file per case:
//!
//! ```toml
//! format = "html-rewrite-v1"
//! status = "active"          # active | xfail | skip
//! reason = "..."             # required unless active
//! kind = "html"              # template content kind, default html
//! input = '''<div class=foo>'''
//! source = '''<div class=foo>'''   # optional
//! shape = '''
//! HTML_OPEN_TAG_NODE
//!   RAW_TEXT_NODE
//! '''
//! errors = []
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use template_ast::ContentKind;

pub const REWRITE_FIXTURE_FORMAT_V1: &str = "html-rewrite-v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixtureStatus {
    Active,
    Xfail,
    Skip,
}

#[derive(Clone, Debug)]
pub struct Expected {
    pub shape: Vec<String>,
    pub source: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RewriteFixture {
    pub name: String,
    pub path: PathBuf,
    pub status: FixtureStatus,
    pub reason: Option<String>,
    pub kind: ContentKind,
    pub input: String,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFixture {
    format: String,
    #[serde(default)]
    status: RawStatus,
    reason: Option<String>,
    kind: Option<String>,
    input: String,
    shape: String,
    source: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum RawStatus {
    #[default]
    Active,
    Xfail,
    Skip,
}

/// Load every `*.toml` fixture under `root`, sorted by file name.
pub fn load_fixtures(root: &Path) -> Vec<RewriteFixture> {
    let mut entries: Vec<_> = fs::read_dir(root)
        .unwrap_or_else(|err| panic!("failed to read fixture root {root:?}: {err}"))
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut fixtures = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        let Some(name) = path.file_stem().map(|stem| stem.to_string_lossy().to_string()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if name != name.trim() {
            panic!("fixture file has leading/trailing whitespace: '{name}'");
        }
        fixtures.push(parse_fixture(name, path));
    }
    fixtures
}

fn parse_fixture(name: String, path: PathBuf) -> RewriteFixture {
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
    let raw: RawFixture = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse fixture {path:?}: {err}"));
    assert_eq!(
        raw.format, REWRITE_FIXTURE_FORMAT_V1,
        "unsupported format in {path:?}"
    );

    let status = match raw.status {
        RawStatus::Active => FixtureStatus::Active,
        RawStatus::Xfail => FixtureStatus::Xfail,
        RawStatus::Skip => FixtureStatus::Skip,
    };
    if status != FixtureStatus::Active && raw.reason.as_deref().unwrap_or("").is_empty() {
        panic!("non-active fixture missing reason in {path:?}");
    }
    let kind = match raw.kind.as_deref() {
        None => ContentKind::Html,
        Some(kind) => ContentKind::from_name(kind)
            .unwrap_or_else(|| panic!("unsupported kind '{kind}' in {path:?}")),
    };
    let shape = shape_lines(&raw.shape);
    if shape.is_empty() {
        panic!("fixture {path:?} has no shape lines");
    }

    RewriteFixture {
        name,
        path,
        status,
        reason: raw.reason,
        kind,
        input: raw.input,
        expected: Expected {
            shape,
            source: raw.source,
            errors: raw.errors,
        },
    }
}

/// Non-empty lines of a shape dump, trailing whitespace removed.
pub fn shape_lines(shape: &str) -> Vec<String> {
    shape
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
