use std::path::Path;

use predicates::prelude::*;

fn bookforge(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bookforge");
    for key in [
        "BOOKFORGE_API_KEY",
        "OPENAI_API_KEY",
        "BOOKFORGE_CONFIG",
        "BOOKFORGE_MODEL",
        "BOOKFORGE_FINALIZE_MODEL",
        "BOOKFORGE_BASE_URL",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("BOOKFORGE_FALLBACK_DELAY_MS", "0")
        .env("BOOKFORGE_PROJECTS_DIR", dir.join("projects"))
        .env("BOOKFORGE_OUTPUT_DIR", dir.join("out"));
    cmd
}

#[test]
fn list_on_an_empty_store_prints_nothing() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn offline_run_writes_a_whole_book() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .args([
            "run",
            "--theme",
            "Quantum Computing Basics",
            "--chapters",
            "2",
            "--paragraphs",
            "2-3",
            "--project",
            "qc",
            "--format",
            "md",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("project `qc`: 2 chapters"))
        .stdout(predicate::str::contains("finalization: revision applied"))
        .stdout(predicate::str::contains("wrote"));

    let rendered: Vec<_> = std::fs::read_dir(temp.path().join("out"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .collect();
    assert_eq!(rendered.len(), 1);

    bookforge(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout("qc\n");

    bookforge(temp.path())
        .args(["show", "--project", "qc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"context_summary\""))
        .stdout(predicate::str::contains("\"finalized_at\""));
}

#[test]
fn invalid_paragraph_range_is_rejected() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .args(["run", "--theme", "x", "--paragraphs", "3-1"])
        .assert()
        .failure();
}

#[test]
fn missing_project_is_reported() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .args(["render", "--project", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .env("RUST_LOG", "debug")
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}

#[test]
fn zero_chapters_fails_before_planning_starts() {
    let temp = tempfile::TempDir::new().unwrap();
    bookforge(temp.path())
        .args(["plan", "--theme", "x", "--title", "T", "--chapters", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chapter count must be at least 1"))
        .stderr(predicate::str::contains("planning: outline").not());
}
