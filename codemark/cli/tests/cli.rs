use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const DEMO: &str = "# Demo\n\n```python TI:\"demo.py\" HL:\"1-2,4\"\na = 1\nb = 2\nc = 3\nd = 4\ne = 5\n```\n\n```mermaid\ngraph TD\n```\n";

fn markdown_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("codemark")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("line numbers"))
        .stdout(predicate::str::contains("--exclude"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("codemark")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("codemark"));
}

// ============================================================================
// HTML Output Tests
// ============================================================================

#[test]
fn test_html_output_has_overlays_and_styles() {
    let file = markdown_file(DEMO);
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<style>"))
        .stdout(predicate::str::contains(r#"<span class="codemark-title-text">demo.py</span>"#))
        .stdout(predicate::str::contains(r#"<span class="codemark-lang-name">Python</span>"#))
        .stdout(predicate::str::contains("codemark-linenum-wrap"))
        .stdout(predicate::str::contains("codemark-highlight-wrap"));
}

#[test]
fn test_no_styles_flag() {
    let file = markdown_file(DEMO);
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .arg("--no-styles")
        .assert()
        .success()
        .stdout(predicate::str::contains("<style>").not())
        .stdout(predicate::str::contains("codemark-title"));
}

#[test]
fn test_exclude_flag_leaves_block_untouched() {
    let file = markdown_file("```mermaid\ngraph TD\n```\n");
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .args(["--exclude", "mermaid", "--no-styles"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<pre><code class="language-mermaid">graph TD"#,
        ))
        .stdout(predicate::str::contains("codemark-title").not());
}

#[test]
fn test_no_line_numbers_flag() {
    let file = markdown_file(DEMO);
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .args(["--no-line-numbers", "--no-styles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("codemark-linenum").not())
        .stdout(predicate::str::contains("codemark-highlight-wrap"));
}

#[test]
fn test_narrow_width_wraps_long_lines() {
    let file = markdown_file(&format!("```text\n{}\n```\n", "x".repeat(100)));
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .args(["--width", "400", "--no-styles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("height: 40px"));
}

// ============================================================================
// JSON Output Tests
// ============================================================================

#[test]
fn test_json_output() {
    let file = markdown_file(DEMO);
    let output = cargo_bin_cmd!("codemark")
        .arg(file.path())
        .args(["--json", "--exclude", "mermaid"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let blocks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["language"], "python");
    assert_eq!(blocks[0]["lineCount"], 5);
    assert_eq!(blocks[0]["directives"]["title"], "demo.py");
    assert_eq!(
        blocks[0]["directives"]["highlightLines"]["ranges"],
        serde_json::json!([{ "start": 1, "end": 2 }, { "start": 4, "end": 4 }])
    );
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_missing_input_fails() {
    cargo_bin_cmd!("codemark")
        .arg("/definitely/not/here.md")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_bad_config_extension_fails() {
    let file = markdown_file(DEMO);
    let config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    cargo_bin_cmd!("codemark")
        .arg(file.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported settings format"));
}
