//! Output formatting utilities

use crate::application::{EntryDeletion, ImageDeletion, SubmitOutcome, SubmitWarning};
use crate::domain::linkify::render_plain;
use crate::domain::{day_label, EntryWithDetails};
use chrono::{Local, NaiveDate};

/// Format the entries of one day for display
pub fn format_feed(date: NaiveDate, today: NaiveDate, entries: &[EntryWithDetails], show_ids: bool) -> String {
    let mut output = format!("{}\n", day_label(date, today));

    if entries.is_empty() {
        output.push_str("No entries yet\n");
        return output;
    }

    for details in entries {
        let time = details.entry.created_at.with_timezone(&Local).format("%H:%M");
        output.push('\n');
        output.push_str(&format!("{}  {}", time, details.author()));
        if show_ids {
            output.push_str(&format!("  [{}]", details.entry.id));
        }
        output.push('\n');

        for line in render_plain(&details.entry.content).lines() {
            output.push_str(&format!("  {}\n", line));
        }
        for image in &details.images {
            if show_ids {
                output.push_str(&format!("  [image {}] {}\n", image.id, image.url));
            } else {
                output.push_str(&format!("  [image] {}\n", image.url));
            }
        }
    }
    output
}

/// Summary of a create or edit, including partial failures
pub fn format_submit(outcome: &SubmitOutcome, created: bool) -> String {
    let verb = if created { "Posted" } else { "Updated" };
    let mut output = format!("{} entry {} ({})\n", verb, outcome.entry.id, outcome.entry.date);

    if !outcome.added.is_empty() {
        output.push_str(&format!("Attached {} image(s)\n", outcome.added.len()));
    }
    if !outcome.removed.is_empty() {
        output.push_str(&format!("Removed {} image(s)\n", outcome.removed.len()));
    }
    for failure in &outcome.upload_failures {
        output.push_str(&format!("Warning: {} not uploaded: {}\n", failure.file_name, failure.error));
    }
    for warning in &outcome.warnings {
        output.push_str(&format!("Warning: {}\n", describe_warning(warning)));
    }
    if outcome.worth_retrying() {
        output.push_str(&format!(
            "Some images were not saved. Retry with: vjour edit {}\n",
            outcome.entry.id
        ));
    } else if !outcome.is_complete() {
        output.push_str("Some images were not saved.\n");
    }
    output
}

fn describe_warning(warning: &SubmitWarning) -> String {
    match warning {
        SubmitWarning::ImageRowsNotSaved { uploaded, leaked, error } => {
            let mut text = format!("{} uploaded image(s) could not be attached: {}", uploaded, error);
            if !leaked.is_empty() {
                text.push_str(&format!(" ({} file(s) left in storage)", leaked.len()));
            }
            text
        }
        SubmitWarning::ImageNotRemoved { image, error } => {
            format!("image {} is still attached: {}", image, error)
        }
        SubmitWarning::BlobLeftBehind { key, .. } => {
            format!("image file {} could not be deleted from storage", key)
        }
    }
}

pub fn format_entry_deletion(report: &EntryDeletion) -> String {
    let mut output = format!(
        "Deleted entry {} and {} image(s)\n",
        report.entry, report.images_removed
    );
    for key in &report.leaked_blobs {
        output.push_str(&format!("Warning: image file {} could not be deleted from storage\n", key));
    }
    output
}

pub fn format_image_deletion(deletion: &ImageDeletion) -> String {
    let mut output = format!("Deleted image {}\n", deletion.image.id);
    if deletion.blob_leaked {
        output.push_str(&format!(
            "Warning: image file {} could not be deleted from storage\n",
            deletion.image.storage_path
        ));
    }
    output
}
