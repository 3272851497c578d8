// Runs the compiled binary without a terminal. `--write-config` must finish
// before the tty check, so these run everywhere.

use assert_cmd::Command;

#[test]
fn write_config_exits_without_a_tty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");

    Command::cargo_bin("whirl")?
        .args(["--log-level", "off", "--seed", "5", "--write-config", "-c"])
        .arg(&path)
        .assert()
        .success();

    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("\"seed\": 5"));
    assert!(written.contains("\"idle_ms\": 250"));
    Ok(())
}

#[test]
fn write_config_keeps_existing_timing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "timing": { "base_interval_ms": 120 } }"#)?;

    Command::cargo_bin("whirl")?
        .args(["--log-level", "off", "--write-config", "-c"])
        .arg(&path)
        .assert()
        .success();

    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("\"base_interval_ms\": 120"));
    assert!(written.contains("\"seed\": null"));
    Ok(())
}

#[test]
fn refuses_to_start_without_a_tty() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("whirl")?
        .args(["--log-level", "off", "Sushi", "Pizza"])
        .write_stdin("")
        .assert()
        .failure();
    Ok(())
}
