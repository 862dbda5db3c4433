use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn cli_steps_player_at_sixty_hertz() {
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.args(["--hold", "d"]);
    cmd.assert()
        .success()
        .stdout(contains(
            "Loaded scene: ground 200x200, player speed 6.00, loop 60 Hz (PerFrame render)",
        ))
        .stdout(contains("Ran 60 frames, 57 ticks"))
        .stdout(contains("Player pos=(5.70, 0.00, 0.00)"))
        .stdout(contains("Minimap follow size=200 zoom=1.00 marker=(5.70, 0.10, 0.00)"));
}

#[test]
fn cli_toggles_minimap_overview() {
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.args(["--frames", "5", "--toggle-minimap"]);
    cmd.assert()
        .success()
        .stdout(contains("Minimap overview size=400 zoom=1.00"))
        .stdout(contains("camera=(0.00, 100.00, 0.00)"));
}

#[test]
fn cli_applies_debug_panel_overrides() {
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.args(["--frames", "1", "--background", "#336699", "--value", "2.5"]);
    cmd.assert()
        .success()
        .stdout(contains("Debug background=#336699 value=1.000"));
}

#[test]
fn cli_loads_scene_overrides() {
    let scene = write_scene(
        r#"<scene>
  <ground><size>50</size></ground>
  <player><speed>12</speed></player>
  <loop><hz>30</hz></loop>
</scene>
"#,
    );
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.arg(scene.path()).args(["--hold", "d"]);
    cmd.assert()
        .success()
        .stdout(contains(
            "Loaded scene: ground 50x50, player speed 12.00, loop 30 Hz (PerFrame render)",
        ))
        .stdout(contains("Ran 60 frames, 28 ticks"))
        .stdout(contains("Player pos=(11.20, 0.00, 0.00)"));
}

#[test]
fn cli_rejects_bad_input() {
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.arg("--warp");
    cmd.assert().failure().stderr(contains("Unknown argument: --warp"));

    let scene = write_scene("<level/>");
    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.arg(scene.path());
    cmd.assert().failure().stderr(contains("failed to parse scene"));

    let mut cmd = Command::cargo_bin("minimap-scene").expect("binary exists");
    cmd.args(["--hold", "d,nope"]);
    cmd.assert().failure().stderr(contains("unknown key 'nope'"));
}
