extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn mandelbrot() -> Command {
    Command::cargo_bin("mandelbrot").unwrap()
}

#[test]
fn renders_reference_view() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("set.ppm");
    mandelbrot()
        .arg("--output")
        .arg(&output)
        .args(&["--size", "100x100", "--iterations", "100", "--threads", "1"])
        .arg("--center=-0.5,0")
        .args(&["--zoom", "2"])
        .assert()
        .success();

    let bytes = fs::read(&output).unwrap();
    let header = b"P6\n100 100\n255\n";
    assert!(bytes.starts_with(header));
    assert_eq!(bytes.len(), header.len() + 100 * 100 * 3);

    // Pixel 50,50 sits on -0.5+0i, inside the set.
    let middle = header.len() + (50 * 100 + 50) * 3;
    assert_eq!(&bytes[middle..middle + 3], &[0, 0, 0]);
}

#[test]
fn sequential_output_matches_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let parallel = dir.path().join("parallel.ppm");
    let sequential = dir.path().join("sequential.ppm");
    mandelbrot()
        .arg("-o")
        .arg(&parallel)
        .args(&["-s", "64x40", "-i", "250", "--chunk", "3", "-t", "1"])
        .assert()
        .success();
    mandelbrot()
        .arg("-o")
        .arg(&sequential)
        .args(&["-s", "64x40", "-i", "250", "--sequential"])
        .assert()
        .success();
    assert_eq!(fs::read(&parallel).unwrap(), fs::read(&sequential).unwrap());
}

#[test]
fn balance_report_lists_each_worker() {
    let dir = tempfile::tempdir().unwrap();
    mandelbrot()
        .arg("-o")
        .arg(dir.path().join("balance.ppm"))
        .args(&["-s", "20x20", "-i", "50", "-t", "1", "--balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#0 :"));
}

#[test]
fn zero_zoom_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.ppm");
    mandelbrot()
        .arg("-o")
        .arg(&output)
        .args(&["-s", "10x10", "--zoom", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zoom radius must be positive"));
    assert!(!output.exists());
}

#[test]
fn empty_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    mandelbrot()
        .arg("-o")
        .arg(dir.path().join("empty.ppm"))
        .args(&["-s", "0x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("image dimensions must be positive"));
}

#[test]
fn unwritable_output_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing").join("set.ppm");
    mandelbrot()
        .arg("-o")
        .arg(&output)
        .args(&["-s", "10x10", "-i", "10", "-t", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not write image"))
        .stderr(predicate::str::contains("caused by"));
}

#[test]
fn malformed_size_is_rejected() {
    mandelbrot()
        .args(&["-s", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse output image size"));
}

#[cfg(unix)]
#[test]
fn device_output_is_accepted_and_kept() {
    mandelbrot()
        .args(&["-o", "/dev/null", "-s", "16x16", "-i", "50", "-t", "1"])
        .assert()
        .success();
    assert!(std::path::Path::new("/dev/null").exists());
}

#[test]
fn elapsed_time_is_always_reported() {
    let dir = tempfile::tempdir().unwrap();
    mandelbrot()
        .arg("-o")
        .arg(dir.path().join("timed.ppm"))
        .args(&["-s", "16x16", "-i", "50", "--sequential"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rendered in"));
}

#[test]
fn balance_with_sequential_warns() {
    let dir = tempfile::tempdir().unwrap();
    mandelbrot()
        .env_remove("RUST_LOG")
        .arg("-o")
        .arg(dir.path().join("quiet.ppm"))
        .args(&["-s", "16x16", "-i", "50", "--sequential", "--balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#0 :").not())
        .stderr(predicate::str::contains(
            "--balance has nothing to report with --sequential",
        ));
}
