//! End-to-end tests of posting, editing, deleting and the feed

#![allow(deprecated)]

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::vjour_cmd;

fn journal() -> TempDir {
    let temp = TempDir::new().unwrap();
    vjour_cmd()
        .args(["init", "--name", "Mia"])
        .arg(temp.path())
        .assert()
        .success();
    temp
}

fn write_image(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, [0x89, b'P', b'N', b'G', 0x0d, 0x0a]).unwrap();
    path.to_string_lossy().into_owned()
}

/// Run `post` and return the new entry id
fn post(root: &Path, args: &[&str]) -> String {
    let output = vjour_cmd()
        .current_dir(root)
        .arg("post")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "post failed: {:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .split_whitespace()
        .nth(2)
        .expect("entry id in output")
        .to_string()
}

fn blob_count(root: &Path) -> usize {
    let blobs = root.join(".vjour/blobs");
    let mut count = 0;
    let mut dirs = vec![blobs];
    while let Some(dir) = dirs.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                dirs.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_post_and_show_feed() {
    let temp = journal();
    post(temp.path(), &["Walk by the river https://example.com/river"]);

    vjour_cmd()
        .current_dir(temp.path())
        .arg("feed")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Today\n"))
        .stdout(predicate::str::contains("Mia"))
        .stdout(predicate::str::contains("Walk by the river https://example.com/river"));
}

#[test]
fn test_empty_post_is_rejected() {
    let temp = journal();

    vjour_cmd()
        .current_dir(temp.path())
        .args(["post", "   "])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Entry needs some text"));

    vjour_cmd()
        .current_dir(temp.path())
        .arg("feed")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet"));
}

#[test]
fn test_post_images_only() {
    let temp = journal();
    let pics = TempDir::new().unwrap();
    let a = write_image(pics.path(), "a.png");
    let b = write_image(pics.path(), "b.jpg");

    vjour_cmd()
        .current_dir(temp.path())
        .args(["post", "--image", &a, "--image", &b])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attached 2 image(s)"));

    assert_eq!(blob_count(temp.path()), 2);
    vjour_cmd()
        .current_dir(temp.path())
        .arg("feed")
        .assert()
        .success()
        .stdout(predicate::str::contains("[image] file://").count(2));
}

#[test]
fn test_non_image_file_fails_alone() {
    let temp = journal();
    let files = TempDir::new().unwrap();
    let notes = files.path().join("notes.txt");
    fs::write(&notes, "not a picture").unwrap();

    vjour_cmd()
        .current_dir(temp.path())
        .args(["post", "hi", "--image"])
        .arg(&notes)
        .assert()
        .success()
        .stdout(predicate::str::contains("Posted entry"))
        .stdout(predicate::str::contains("notes.txt not uploaded: Not an image"))
        .stdout(predicate::str::contains("vjour edit").not());

    assert_eq!(blob_count(temp.path()), 0);
}

#[test]
fn test_post_on_past_date() {
    let temp = journal();
    post(temp.path(), &["--date", "2025-01-15", "Lunch"]);

    vjour_cmd()
        .current_dir(temp.path())
        .args(["feed", "2025-01-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("January 15"))
        .stdout(predicate::str::contains("Lunch"));

    vjour_cmd()
        .current_dir(temp.path())
        .arg("feed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lunch").not());
}

#[test]
fn test_invalid_date_exit_code() {
    let temp = journal();

    vjour_cmd()
        .current_dir(temp.path())
        .args(["feed", "someday"])
        .assert()
        .code(3);
}

#[test]
fn test_edit_text_and_images() {
    let temp = journal();
    let pics = TempDir::new().unwrap();
    let a = write_image(pics.path(), "a.png");
    let id = post(temp.path(), &["first", "--image", &a]);
    assert_eq!(blob_count(temp.path()), 1);

    vjour_cmd()
        .current_dir(temp.path())
        .args(["edit", &id, "--text", "second"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated entry"));
    assert_eq!(blob_count(temp.path()), 1);

    let b = write_image(pics.path(), "b.png");
    vjour_cmd()
        .current_dir(temp.path())
        .args(["edit", &id, "--add-image", &b])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attached 1 image(s)"));
    assert_eq!(blob_count(temp.path()), 2);

    vjour_cmd()
        .current_dir(temp.path())
        .args(["feed", "--ids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("first").not());
}

#[test]
fn test_delete_entry_removes_blobs() {
    let temp = journal();
    let pics = TempDir::new().unwrap();
    let a = write_image(pics.path(), "a.png");
    let b = write_image(pics.path(), "b.png");
    let id = post(temp.path(), &["", "--image", &a, "--image", &b]);

    vjour_cmd()
        .current_dir(temp.path())
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("and 2 image(s)"));

    assert_eq!(blob_count(temp.path()), 0);
    vjour_cmd()
        .current_dir(temp.path())
        .args(["delete", &id])
        .assert()
        .code(6);
}

#[test]
fn test_other_user_cannot_delete() {
    let temp = journal();
    let id = post(temp.path(), &["mine"]);

    vjour_cmd()
        .current_dir(temp.path())
        .env("VJOUR_USER", "7f1d3c1e-3f55-4a8e-9d7c-2a1b6c0e9f42")
        .args(["delete", &id])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Permission denied"));
}

#[test]
fn test_signed_out_cannot_post() {
    let temp = journal();

    vjour_cmd()
        .current_dir(temp.path())
        .env("VJOUR_USER", "")
        .args(["post", "hello"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_invalid_entry_id() {
    let temp = journal();

    vjour_cmd()
        .current_dir(temp.path())
        .args(["delete", "not-a-uuid"])
        .assert()
        .code(4);
}
