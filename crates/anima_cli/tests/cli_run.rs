use assert_cmd::Command;
use std::fs;

fn write_tree(root: &std::path::Path) {
    let main = root.join("Main");
    fs::create_dir_all(&main).unwrap();
    fs::write(main.join("main().an"), "() { write_line(\"hello\") }").unwrap();

    let guard = root.join("Actor").join("Guard");
    fs::create_dir_all(&guard).unwrap();
    fs::write(
        guard.join("_watch().an"),
        "() { _wait(1.0)\n write_line(\"watched\") }",
    )
    .unwrap();
}

#[test]
fn run_invokes_the_default_entry_method() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    Command::cargo_bin("anima")
        .unwrap()
        .args(["run", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn run_drives_coroutines_across_ticks() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    Command::cargo_bin("anima")
        .unwrap()
        .args([
            "run",
            dir.path().to_str().unwrap(),
            "--invoke",
            "Guard._watch",
            "--ticks",
            "4",
            "--delta",
            "0.5",
        ])
        .assert()
        .success()
        .stdout("watched\n");
}

#[test]
fn check_reports_errors_with_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("Broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("bad().an"), "() { ??? }").unwrap();
    Command::cargo_bin("anima")
        .unwrap()
        .args(["check", dir.path().to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn pack_then_run_produces_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let blob = dir.path().join("program.anb");
    Command::cargo_bin("anima")
        .unwrap()
        .args([
            "pack",
            dir.path().to_str().unwrap(),
            blob.to_str().unwrap(),
        ])
        .assert()
        .success();
    Command::cargo_bin("anima")
        .unwrap()
        .args(["run", blob.to_str().unwrap()])
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn tokens_lists_the_member_file() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let file = dir.path().join("Main").join("main().an");
    let output = Command::cargo_bin("anima")
        .unwrap()
        .args(["tokens", file.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Ident"));
    assert!(text.contains("LBrace"));
}
