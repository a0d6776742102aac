use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn local_config_file_is_picked_up() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    fs::write(&input, ":::danger\nStop\n:::\n").unwrap();
    fs::write(
        dir.path().join("mdbridge.toml"),
        r#"[markdown]
flavor = "obsidian"
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path()).arg("normalize").arg("notes.md");
    cmd.assert().success().stdout("> [!danger]\n> Stop\n");
}

#[test]
fn explicit_config_and_flag_precedence() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    fs::write(&input, ":::danger\nStop\n:::\n").unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(
        &config_path,
        r#"[markdown]
flavor = "commonmark"

[convert]
pretty_json = false
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path())
        .arg("normalize")
        .arg(&input)
        .arg("--config")
        .arg(&config_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("> **Danger**"));

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path())
        .arg("normalize")
        .arg(&input)
        .arg("--config")
        .arg(&config_path)
        .arg("--flavor")
        .arg("docusaurus");
    cmd.assert().success().stdout(":::danger\nStop\n:::\n");

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--to")
        .arg("json")
        .arg("--config")
        .arg(&config_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("{\"type\":\"doc\""));
}

#[test]
fn diagram_transform_follows_config() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("flow.md");
    fs::write(&input, "```mermaid\ngraph TD\n```\n").unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[sync]\ntransform_diagrams_on_import = false\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path()).arg(&input).arg("--to").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"diagram\""));

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--to")
        .arg("json")
        .arg("--config")
        .arg(&config_path);
    cmd.assert().success().stdout(
        predicate::str::contains("\"type\": \"codeBlock\"")
            .and(predicate::str::contains("\"type\": \"diagram\"").not()),
    );
}

#[test]
fn missing_config_file_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    fs::write(&input, "Plain\n").unwrap();

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.current_dir(dir.path())
        .arg("normalize")
        .arg(&input)
        .arg("--config")
        .arg(dir.path().join("absent.toml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn listing_commands() {
    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.arg("--list-formats");
    cmd.assert().success().stdout(
        predicate::str::contains("json").and(predicate::str::contains("markdown")),
    );

    let mut cmd = cargo_bin_cmd!("mdbridge");
    cmd.arg("--list-flavors");
    cmd.assert().success().stdout(
        predicate::str::contains("commonmark")
            .and(predicate::str::contains("gfm"))
            .and(predicate::str::contains("obsidian"))
            .and(predicate::str::contains("docusaurus")),
    );
}
