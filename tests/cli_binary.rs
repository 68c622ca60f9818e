use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

/// Run the binary with an isolated config location so a developer's own
/// config file cannot leak into the test.
fn sortdir(home: &Path, args: &[&str]) -> Output {
    let me = assert_cmd::cargo::cargo_bin!("sortdir");
    Command::new(me)
        .args(args)
        .env_remove("SORTDIR_CONFIG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .output()
        .expect("spawn binary")
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn print_config_succeeds() {
    let td = tempdir().unwrap();
    let out = sortdir(td.path(), &["--print-config"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("config.xml"), "stdout: {stdout}");
}

#[test]
fn sorts_tree_and_exits_zero() {
    let td = tempdir().unwrap();
    let src = td.path().join("inbox");
    let dst = td.path().join("sorted");
    fs::create_dir_all(src.join("deep/er")).unwrap();
    fs::write(src.join("deep/er/a.rs"), b"fn main() {}").unwrap();
    fs::write(src.join("b.toml"), b"[x]").unwrap();

    let out = sortdir(td.path(), &["-s", s(&src), "-o", s(&dst), "--log-level", "quiet"]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(dst.join(".rs/a.rs").is_file());
    assert!(dst.join(".toml/b.toml").is_file());
    assert!(!src.exists());
}

#[test]
fn missing_source_fails_without_touching_output() {
    let td = tempdir().unwrap();
    let dst = td.path().join("sorted");
    let out = sortdir(
        td.path(),
        &["-s", s(&td.path().join("nope")), "-o", s(&dst)],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Source path not found"), "stderr: {stderr}");
    assert!(!dst.exists());
}

#[test]
fn missing_source_flag_is_an_error() {
    let td = tempdir().unwrap();
    let out = sortdir(td.path(), &["-o", s(&td.path().join("sorted"))]);
    assert!(!out.status.success());
}

#[test]
fn dry_run_prints_plan_and_changes_nothing() {
    let td = tempdir().unwrap();
    let src = td.path().join("inbox");
    let dst = td.path().join("sorted");
    fs::create_dir_all(src.join("x")).unwrap();
    fs::write(src.join("x/1.txt"), b"a").unwrap();
    fs::write(src.join("1.txt"), b"b").unwrap();

    let out = sortdir(
        td.path(),
        &["-s", s(&src), "-o", s(&dst), "--dry-run", "--log-level", "quiet"],
    );
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("1_renamed_001_.txt"), "stdout: {stdout}");
    assert!(stdout.contains("Dry-run"), "stdout: {stdout}");
    assert!(src.join("x/1.txt").is_file());
    assert!(src.join("1.txt").is_file());
    assert!(!dst.exists());
}

#[test]
fn json_logs_carry_move_events() {
    let td = tempdir().unwrap();
    let src = td.path().join("inbox");
    let dst = td.path().join("sorted");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("photo.png"), b"png").unwrap();

    let out = sortdir(td.path(), &["-s", s(&src), "-o", s(&dst), "--json"]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).expect("valid json log line"))
        .collect();
    let moved = events
        .iter()
        .find(|e| e["fields"]["event"] == "file-moved")
        .expect("a file-moved event");
    assert!(moved["fields"]["to"].as_str().unwrap().ends_with("photo.png"));
    assert_eq!(moved["level"], "INFO");
}

#[cfg(unix)]
#[test]
fn failed_file_gives_nonzero_exit() {
    use std::os::unix::fs::PermissionsExt;

    if unsafe { libc::geteuid() } == 0 {
        eprintln!("skipping: running as root");
        return;
    }
    let td = tempdir().unwrap();
    let src = td.path().join("inbox");
    let locked = src.join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(locked.join("a.txt"), b"a").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    let out = sortdir(
        td.path(),
        &["-s", s(&src), "-o", s(&td.path().join("sorted")), "--log-level", "quiet"],
    );
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(!out.status.success());
    assert!(locked.join("a.txt").is_file());
}
