use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

const FAKE_DEBUGGER: &str = r#"
n=0
printf '> '
while IFS= read -r line; do
  case "$line" in
    run)
      printf 'Breakpoint hit: "thread=main", Main.main(), line=3 bci=0\nmain[1] ' ;;
    cont)
      n=$((n+1))
      if [ "$n" -ge 2 ]; then
        printf 'The application exited\n'
        exit 0
      fi
      printf 'Breakpoint hit: "thread=main", Main.main(), line=5 bci=4\nmain[1] ' ;;
    print*)
      printf ' x = 5\nmain[1] ' ;;
    quit)
      exit 0 ;;
    *)
      printf 'Unrecognized command: %s\nmain[1] ' "$line" ;;
  esac
done
"#;

fn dh_command(home: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("dh")?;
    cmd.env("HOME", home).env("RUST_LOG", "warn");
    Ok(cmd)
}

fn write_script(dir: &Path, body: &str) -> Result<std::path::PathBuf> {
    let path = dir.join("session.dhs");
    std::fs::write(&path, body)?;
    Ok(path)
}

#[test]
fn run_script_to_completion_with_transcript() -> Result<()> {
    let home = TempDir::new()?;
    let script = write_script(
        home.path(),
        "# drive the fake debugger\nrun\n@expect Breakpoint hit:\nprint x\n@expect x = 5\n@cont-to-exit 3\n",
    )?;
    let transcript = home.path().join("out").join("transcript.json");

    let output = dh_command(home.path())?
        .arg("run")
        .arg("--script")
        .arg(&script)
        .arg("--tool")
        .arg("/bin/sh")
        .arg("--poll-ms")
        .arg("50")
        .arg("--transcript")
        .arg(&transcript)
        .arg("--")
        .arg("-c")
        .arg(FAKE_DEBUGGER)
        .output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("> print x"), "{stdout}");
    assert!(stdout.contains("x = 5"), "{stdout}");

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&transcript)?)?;
    assert_eq!(json["program"], "/bin/sh");
    let steps: Vec<&str> = json["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .filter_map(|e| e["step"].as_str())
        .collect();
    assert_eq!(
        steps,
        vec![
            "@startup",
            "run",
            "@expect Breakpoint hit:",
            "print x",
            "@expect x = 5",
            "@cont-to-exit 3",
        ]
    );
    Ok(())
}

#[test]
fn failed_expectation_exits_nonzero() -> Result<()> {
    let home = TempDir::new()?;
    let script = write_script(home.path(), "run\n@expect Exception occurred\n@quit\n")?;

    let output = dh_command(home.path())?
        .args(["run", "--tool", "/bin/sh", "--poll-ms", "50", "--script"])
        .arg(&script)
        .args(["--", "-c", FAKE_DEBUGGER])
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("expected 'Exception occurred'"), "{stderr}");
    Ok(())
}

#[test]
fn bad_script_is_rejected_before_launch() -> Result<()> {
    let home = TempDir::new()?;
    let script = write_script(home.path(), "run\n@frobnicate\n")?;

    let output = dh_command(home.path())?
        .args(["run", "--tool", "/nonexistent/jdb", "--script"])
        .arg(&script)
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("@frobnicate"), "{stderr}");
    Ok(())
}

#[test]
fn launch_args_prints_connector() -> Result<()> {
    let home = TempDir::new()?;
    let output = dh_command(home.path())?
        .args(["launch-args", "--main", "pkg.Main", "--options=-Xint"])
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "-connect",
            "com.sun.jdi.CommandLineLaunch:options=-Xint,main=pkg.Main"
        ]
    );
    Ok(())
}

#[test]
fn config_prints_effective_settings() -> Result<()> {
    let home = TempDir::new()?;
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[session]\npoll_interval_ms = 250\n")?;

    let output = dh_command(home.path())?
        .arg("--config")
        .arg(&config)
        .arg("config")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("poll_interval_ms = 250"), "{stdout}");
    assert!(stdout.contains("timeout_ms = 60000"), "{stdout}");
    assert!(stdout.contains("tool = \"jdb\""), "{stdout}");
    Ok(())
}
