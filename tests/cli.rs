// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate image;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn automata() -> Command {
    Command::cargo_bin("automata").unwrap()
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::open(path).unwrap().to_rgba().dimensions()
}

#[test]
fn presets_are_listed() {
    automata()
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Conway's Game of Life (moore1): B3/S2,3"));
}

#[test]
fn fractal_writes_a_png() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("mandel.png");
    automata()
        .args(&["fractal", "-o"])
        .arg(&out)
        .args(&["--size", "40x20", "--iterations", "50", "--threads", "3"])
        .assert()
        .success();
    assert_eq!(dimensions(&out), (40, 20));
}

#[test]
fn julia_with_pan_and_zoom() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("julia.png");
    automata()
        .args(&["fractal", "-o"])
        .arg(&out)
        .args(&[
            "--size",
            "32x32",
            "--kind",
            "julia",
            "--seed",
            "-0.4,0.6",
            "--smooth",
            "distance",
            "--colors",
            "ff0000,00ff00,0000ff",
            "--zoom",
            "16,16,2",
            "--pan",
            "-3,4",
        ])
        .assert()
        .success();
    assert_eq!(dimensions(&out), (32, 32));
}

#[test]
fn bad_zoom_is_a_render_failure() {
    let dir = TempDir::new().unwrap();
    automata()
        .args(&["fractal", "-o"])
        .arg(dir.path().join("never.png"))
        .args(&["--size", "8x8", "--zoom", "4,4,0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Render failure"));
}

#[test]
fn bad_window_is_rejected() {
    automata()
        .args(&["fractal", "-o", "never.png", "--window", "1,2,3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse window"));
}

#[test]
fn life_preset_scales_the_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("life.png");
    automata()
        .args(&["life", "-o"])
        .arg(&out)
        .args(&[
            "--size",
            "30x20",
            "--preset",
            "bugs",
            "--generations",
            "5",
            "--rng-seed",
            "7",
            "--scale",
            "2",
            "--threads",
            "2",
        ])
        .assert()
        .success();
    assert_eq!(dimensions(&out), (60, 40));
}

#[test]
fn life_rejects_unreachable_counts() {
    let dir = TempDir::new().unwrap();
    automata()
        .args(&["life", "-o"])
        .arg(dir.path().join("never.png"))
        .args(&["--birth", "3,12", "--neighborhood", "moore1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
}

#[test]
fn unknown_preset_is_rejected() {
    automata()
        .args(&["life", "-o", "never.png", "--preset", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no preset named"));
}

#[test]
fn gradient_runs() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("gradient.png");
    automata()
        .args(&["gradient", "-o"])
        .arg(&out)
        .args(&["--size", "16x12", "--generations", "3", "--rng-seed", "1", "--scale", "1"])
        .assert()
        .success();
    assert_eq!(dimensions(&out), (16, 12));
}

#[test]
fn elementary_runs() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("rule90.png");
    automata()
        .args(&["elementary", "-o"])
        .arg(&out)
        .args(&["--size", "21x10", "--rule", "90", "--clamp", "--scale", "3"])
        .assert()
        .success();
    assert_eq!(dimensions(&out), (63, 30));
}
