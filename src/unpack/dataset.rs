// dataset-level files: directory skeleton, dataset_description.json, README, CHANGES
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::BIDS_VERSION;

pub const DEFAULT_CHANGE: (&str, &str) =
    ("9.9.9", "No message provided by user regarding these changes");

fn ensure_dir(path: &Path, what: &str) -> Result<()> {
    if path.exists() {
        println!("Using existing {what}: {}", path.display());
    } else {
        println!("Creating {what}: {}", path.display());
        fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

/// Create the output skeleton (output dir, `code/`, subject dir, session
/// dir), returning the session directory the scans get copied into.
pub fn ensure_layout(output_dir: &Path, subject: &str, session: &str) -> Result<PathBuf> {
    ensure_dir(output_dir, "output directory")?;
    ensure_dir(&output_dir.join("code"), "code directory")?;

    let subject_dir = output_dir.join(format!("sub-{subject}"));
    ensure_dir(&subject_dir, "subject directory")?;

    let session_dir = subject_dir.join(format!("ses-{session}"));
    ensure_dir(&session_dir, "session directory")?;

    Ok(session_dir)
}

/// Create `dataset_description.json`, or refresh `BIDSVersion` in an
/// existing one without disturbing any other keys it has picked up.
pub fn write_dataset_description(output_dir: &Path, proj_name: &str) -> Result<()> {
    let path = output_dir.join("dataset_description.json");

    let data = if path.exists() {
        println!("Updating existing dataset_description.json");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut data: Value =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("BIDSVersion".to_string(), json!(BIDS_VERSION));
        }
        data
    } else {
        println!("Creating dataset_description.json");
        json!({ "Name": proj_name, "BIDSVersion": BIDS_VERSION })
    };

    fs::write(&path, serde_json::to_string_pretty(&data)?)
        .with_context(|| format!("writing {}", path.display()))
}

/// Write README with the project name, BIDS version and a generation stamp.
pub fn write_readme(output_dir: &Path, proj_name: &str) -> Result<()> {
    println!("Creating README");
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .context("formatting README timestamp")?;
    let text = format!(
        "Project Name: {proj_name}\nBIDS Version: {BIDS_VERSION}\n\
         This dataset was unpacked into BIDS format by bids-unpack on {stamp}\n"
    );
    let path = output_dir.join("README");
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
}

/// One CHANGES entry: `VERSION DATE` then the indented description.
pub fn changes_entry(version: &str, description: &str, date: time::Date) -> String {
    format!("{version} {date}\n\t- {description}\n")
}

/// Create the CHANGES log with an initial entry, or prepend the
/// user-supplied `(version, description)` (newest entries come first).
pub fn update_changes(output_dir: &Path, change: Option<(&str, &str)>) -> Result<()> {
    let path = output_dir.join("CHANGES");
    let today = OffsetDateTime::now_utc().date();

    if !path.exists() {
        println!("Creating CHANGES file");
        return fs::write(&path, changes_entry("1.0.0", "Initial release.", today))
            .with_context(|| format!("writing {}", path.display()));
    }

    let (version, description) = change.unwrap_or(DEFAULT_CHANGE);
    println!("Updating CHANGES file: {description}");
    let existing =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let updated = format!("{}{existing}", changes_entry(version, description, today));
    fs::write(&path, updated).with_context(|| format!("writing {}", path.display()))
}
