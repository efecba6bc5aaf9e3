use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn hexbots(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hexbots"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch the hexbots binary")
}

#[test]
fn runs_the_demo_skirmish() {
    let path = demos().join("skirmish.toml");
    let output = hexbots(&["run", path.to_str().expect("utf-8 path"), "--rounds", "3"]);

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("rounds played"));
    for piece in ["lookout", "gunner", "bulwark", "runner"] {
        assert!(stdout.contains(piece), "missing {piece} in {stdout}");
    }
}

#[test]
fn checks_every_demo_script() {
    for script in ["lookout", "gunner", "bulwark", "runner"] {
        let path = demos().join("scripts").join(format!("{script}.hxs"));
        let output = hexbots(&["check", path.to_str().expect("utf-8 path")]);
        assert!(output.status.success(), "{script}: {output:?}");
    }
}

#[test]
fn missing_match_files_are_reported() {
    let output = hexbots(&["run", "does/not/exist.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("failed to read match file"), "{stderr}");
}
