//! Integration tests for entry and image deletion against flaky stores

use chrono::NaiveDate;
use std::sync::atomic::Ordering;
use vjour::application::{Journal, SubmitOutcome};
use vjour::domain::{Draft, SubmitRequest, UserId};
use vjour::error::{StoreError, VjourError};

mod common;
use common::{png, Harness};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()
}

async fn post(h: &Harness, journal: &Journal, content: &str, images: &[&str]) -> SubmitOutcome {
    let draft = images
        .iter()
        .fold(Draft::new(content, day()), |d, name| d.with_image(png(name)));
    journal
        .submit
        .submit(&h.owner, SubmitRequest::create(draft))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delete_entry_with_empty_text_removes_everything() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "", &["a.png", "b.png", "c.png"]).await;

    let report = journal
        .deletion
        .delete_entry(&h.owner, &posted.entry.id)
        .await
        .unwrap();

    assert_eq!(report.images_removed, 3);
    assert_eq!(h.blobs.removal_attempts.load(Ordering::SeqCst), 3);
    let tables = h.records.inner.snapshot();
    assert!(tables.entries.is_empty());
    assert!(tables.images.is_empty());
    assert!(h.blobs.inner.is_empty());
}

#[tokio::test]
async fn test_failed_blob_delete_still_removes_rows() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "two pictures", &["a.png", "b.png"]).await;
    let stuck = posted.added[1].storage_path.clone();
    h.blobs.fail_removal_of(&stuck);

    let report = journal
        .deletion
        .delete_entry(&h.owner, &posted.entry.id)
        .await
        .unwrap();

    assert_eq!(report.leaked_blobs, vec![stuck.clone()]);
    let tables = h.records.inner.snapshot();
    assert!(tables.entries.is_empty());
    assert!(tables.images.is_empty());
    assert_eq!(h.blobs.inner.keys(), vec![stuck]);
}

#[tokio::test]
async fn test_delete_single_image_keeps_parent_and_siblings() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "three", &["a.png", "b.png", "c.png"]).await;
    let target = posted.added[1].clone();

    journal
        .deletion
        .delete_image(&h.owner, &target.id)
        .await
        .unwrap();

    let tables = h.records.inner.snapshot();
    assert_eq!(tables.entries.len(), 1);
    assert_eq!(tables.images.len(), 2);
    assert!(tables.images.iter().all(|img| img.id != target.id));
    assert!(!h.blobs.inner.contains(&target.storage_path));
    assert_eq!(h.blobs.inner.len(), 2);
}

#[tokio::test]
async fn test_failed_blob_delete_on_single_image_still_drops_row() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "one", &["a.png"]).await;
    let image = posted.added[0].clone();
    h.blobs.fail_removal_of(&image.storage_path);

    let deletion = journal
        .deletion
        .delete_image(&h.owner, &image.id)
        .await
        .unwrap();

    assert!(deletion.blob_leaked);
    assert!(h.records.inner.snapshot().images.is_empty());
    assert!(h.blobs.inner.contains(&image.storage_path));
}

#[tokio::test]
async fn test_only_owner_may_delete() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "mine", &["a.png"]).await;
    let stranger = UserId::new();

    let entry_err = journal
        .deletion
        .delete_entry(&stranger, &posted.entry.id)
        .await
        .unwrap_err();
    let image_err = journal
        .deletion
        .delete_image(&stranger, &posted.added[0].id)
        .await
        .unwrap_err();

    assert!(matches!(entry_err, VjourError::NotOwner(_)));
    assert!(matches!(image_err, VjourError::NotOwner(_)));
    assert_eq!(h.blobs.removal_attempts.load(Ordering::SeqCst), 0);
    assert_eq!(h.records.inner.snapshot().images.len(), 1);
}

#[tokio::test]
async fn test_failed_row_delete_after_blob_removal_is_fatal() {
    let h = Harness::new();
    let journal = Journal::new(h.backend.clone());
    let posted = post(&h, &journal, "one", &["a.png"]).await;
    let image = posted.added[0].clone();
    let before = journal.refresh.current();
    h.records.fail_image_delete.store(true, Ordering::SeqCst);

    let err = journal
        .deletion
        .delete_image(&h.owner, &image.id)
        .await
        .unwrap_err();

    assert!(matches!(err, VjourError::RowStore(StoreError::Unavailable(_))));
    assert!(!h.blobs.inner.contains(&image.storage_path));
    assert_eq!(h.records.inner.snapshot().images.len(), 1);
    assert_eq!(journal.refresh.current(), before);
}
