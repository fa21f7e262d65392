// dcm2niix invocation
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Subdirectory of the input dir where converter output lands.
pub const UNPACKED_DIR: &str = "UNPACKED";

/// Convert the DICOM series under `input_dir` to NIFTI + JSON pairs in
/// `<input_dir>/UNPACKED`, named `%i_%p_%t_%s` so every output ends in the
/// series (run) number the copy stage matches on.
pub fn run_dcm2niix(input_dir: &Path) -> Result<PathBuf> {
    let unpacked = input_dir.join(UNPACKED_DIR);
    if !unpacked.exists() {
        println!("---- Creating directory for unpacked images: {}", unpacked.display());
        fs::create_dir_all(&unpacked)
            .with_context(|| format!("creating {}", unpacked.display()))?;
    }

    let status = Command::new("dcm2niix")
        .arg("-f")
        .arg("%i_%p_%t_%s")
        .arg("-z")
        .arg("n")
        .arg("-o")
        .arg(&unpacked)
        .arg(input_dir)
        .status()
        .context("failed to launch dcm2niix (is it on PATH?)")?;

    if !status.success() {
        bail!("dcm2niix exited with {status}");
    }

    Ok(unpacked)
}
