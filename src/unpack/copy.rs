// placing converter output into the BIDS tree and keeping sidecars current
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use walkdir::WalkDir;

use crate::core::intended_for::FieldmapTargets;
use crate::core::tags::parse_tags;
use crate::core::types::{ModalityClass, RunSpec};

const ARTIFACT_EXTENSIONS: &[&str] = &["nii", "json", "bval", "bvec"];

/// Which artifact of run `run_number` this converter output file is, if any.
/// dcm2niix names every output `..._<series>.<ext>`, so a trailing
/// `_<runNumber>.<ext>` identifies the run; the run number string is matched
/// verbatim, exactly as the user declared it.
pub fn run_artifact(file_name: &str, run_number: &str) -> Option<&'static str> {
    ARTIFACT_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| file_name.ends_with(&format!("_{run_number}.{ext}")))
}

/// Copy every artifact of the given runs from the converter output dir into
/// the class subdirectory under `session_dir`, renamed to the declared BIDS
/// filename. JSON sidecars are touched up after copying: functional runs
/// get `TaskName`, fieldmap runs get `IntendedFor` from the resolver rows.
pub fn copy_runs(
    unpacked: &Path,
    session_dir: &Path,
    class: ModalityClass,
    runs: &[RunSpec],
    fmap_rows: &[FieldmapTargets],
) -> Result<()> {
    if runs.is_empty() {
        return Ok(());
    }
    println!("Copying files into {class}");

    let class_dir = session_dir.join(class.dir_name());
    if !class_dir.exists() {
        fs::create_dir_all(&class_dir)
            .with_context(|| format!("creating {}", class_dir.display()))?;
    }

    let entries: Vec<_> = WalkDir::new(unpacked)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<_, _>>()
        .with_context(|| format!("scanning {}", unpacked.display()))?;
    if entries.len() <= 1 {
        eprintln!("WARNING: no files found in {}", unpacked.display());
    }

    for run in runs {
        for entry in &entries {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            let Some(ext) = run_artifact(&file_name, &run.number) else {
                continue;
            };

            let dest = class_dir.join(format!("{}.{ext}", run.name));
            println!("---- {}.{ext}", run.name);
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("copying {} to {}", entry.path().display(), dest.display())
            })?;

            if ext == "json" {
                match class {
                    ModalityClass::Func => update_task_name(&dest, &run.name)?,
                    ModalityClass::Fmap => update_intended_for(&dest, &run.name, fmap_rows)?,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn read_sidecar(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_sidecar(path: &Path, data: &Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(data)?)
        .with_context(|| format!("writing {}", path.display()))
}

/// Set `TaskName` in a functional sidecar from the filename's `task` tag.
/// The filename passed validation already, so the tag is present.
pub fn update_task_name(path: &Path, fname: &str) -> Result<()> {
    let tags = parse_tags(fname)?;
    let task = tags
        .get("task")
        .with_context(|| format!("no task tag in functional filename {fname}"))?;

    println!("-------- Setting TaskName in {}", path.display());
    let mut data = read_sidecar(path)?;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("TaskName".to_string(), json!(task));
    }
    write_sidecar(path, &data)
}

/// Set `IntendedFor` in a fieldmap sidecar from the resolver output. With
/// several rows for the same fieldmap filename, the last one wins.
pub fn update_intended_for(path: &Path, fname: &str, rows: &[FieldmapTargets]) -> Result<()> {
    let Some(row) = rows.iter().rev().find(|row| row.fieldmap == fname) else {
        return Ok(());
    };

    println!("-------- Setting IntendedFor in {}", path.display());
    let mut data = read_sidecar(path)?;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("IntendedFor".to_string(), json!(row.intended_for));
    }
    write_sidecar(path, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_artifact_matches_trailing_run_number_only() {
        assert_eq!(run_artifact("SUBJ_ep2d_bold_20260830_11.nii", "11"), Some("nii"));
        assert_eq!(run_artifact("SUBJ_ep2d_bold_20260830_11.json", "11"), Some("json"));
        assert_eq!(run_artifact("SUBJ_dti_20260830_4.bval", "4"), Some("bval"));
        assert_eq!(run_artifact("SUBJ_dti_20260830_4.bvec", "4"), Some("bvec"));

        // run 1 must not match run 11 output
        assert_eq!(run_artifact("SUBJ_ep2d_bold_20260830_11.nii", "1"), None);
        // the run number string is matched verbatim: declared "01" is not "1"
        assert_eq!(run_artifact("SUBJ_ep2d_bold_20260830_1.nii", "01"), None);
        // unrelated extensions are ignored
        assert_eq!(run_artifact("SUBJ_ep2d_bold_20260830_11.txt", "11"), None);
    }
}
