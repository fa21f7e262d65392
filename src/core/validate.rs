// filename grammar checks per modality class
use std::collections::HashMap;

use crate::core::manifest::{BidsError, SessionManifest};
use crate::core::tags::{MODALITY_KEY, parse_tags};
use crate::core::types::{Advisory, ModalityClass};

const ANAT_MODALITIES: &[&str] = &[
    "T1w", "T2w", "T1rho", "T1map", "T2map", "T2star", "FLAIR", "FLASH", "PD", "PDT2", "inplaneT1",
    "inplaneT2", "angio", "defacemask", "SWImagandphase",
];
const FUNC_MODALITIES: &[&str] = &["bold", "sbref"];
const DWI_MODALITIES: &[&str] = &["dwi"];
const FMAP_MODALITIES: &[&str] = &[
    "phasediff",
    "magnitude",
    "phase1",
    "phase2",
    "magnitude1",
    "magnitude2",
    "fieldmap",
    "epi",
];

// empty strings fail both checks, matching how an empty tag value should read
fn is_alnum(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphanumeric)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn fname_error(fname: &str, reason: impl Into<String>) -> BidsError {
    BidsError::InvalidFilename {
        filename: fname.to_string(),
        reason: reason.into(),
    }
}

// returns whether the tag is present; errors only when a present value
// fails the alphanumeric check
fn check_tag_alnum(
    fname: &str,
    tags: &HashMap<String, String>,
    key: &str,
    label: &str,
) -> Result<bool, BidsError> {
    match tags.get(key) {
        Some(value) if !is_alnum(value) => Err(fname_error(
            fname,
            format!("{label} tag '{value}' contains non-alphanumeric characters"),
        )),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

fn check_tag_digits(
    fname: &str,
    tags: &HashMap<String, String>,
    key: &str,
    label: &str,
) -> Result<bool, BidsError> {
    match tags.get(key) {
        Some(value) if !is_digits(value) => Err(fname_error(
            fname,
            format!("{label} tag '{value}' must only contain digits"),
        )),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

// the trailing modality tag: mandatory, alphanumeric, and for every class
// but fieldmap restricted to a fixed set. Fieldmap naming in the wild is
// permissive, so an off-list fieldmap modality is only an advisory.
fn check_modality(
    fname: &str,
    tags: &HashMap<String, String>,
    class: ModalityClass,
) -> Result<Option<Advisory>, BidsError> {
    let modality = tags.get(MODALITY_KEY).ok_or_else(|| {
        fname_error(
            fname,
            format!(
                "could not find a modality tag at the end of the filename. For example, a {class} \
                 image would end in '{}'",
                class.example_modality()
            ),
        )
    })?;

    if !is_alnum(modality) {
        return Err(fname_error(
            fname,
            format!("modality tag '{modality}' contains non-alphanumeric characters"),
        ));
    }

    let allowed = match class {
        ModalityClass::Anat => ANAT_MODALITIES,
        ModalityClass::Func => FUNC_MODALITIES,
        ModalityClass::Dwi => DWI_MODALITIES,
        ModalityClass::Fmap => FMAP_MODALITIES,
    };

    if allowed.contains(&modality.as_str()) {
        return Ok(None);
    }

    if class == ModalityClass::Fmap {
        return Ok(Some(Advisory::UnusualFieldmapModality {
            filename: fname.to_string(),
            modality: modality.clone(),
        }));
    }

    Err(fname_error(
        fname,
        format!("'{modality}' not supported for {class} images. Choose from: {allowed:?}"),
    ))
}

/// Check one proposed output filename against the BIDS tag grammar for its
/// modality class. Pure: inspects the name and either returns (with at most
/// one advisory) or fails with the offending tag named in the reason.
pub fn check_filename(
    fname: &str,
    class: ModalityClass,
) -> Result<Option<Advisory>, BidsError> {
    let tags = parse_tags(fname)?;

    // subject tag is mandatory for every class
    if !check_tag_alnum(fname, &tags, "sub", "Subject")? {
        return Err(fname_error(
            fname,
            "filename should start with a 'sub-PARTICIPANT' tag",
        ));
    }

    // session tag is optional but must be clean when present
    check_tag_alnum(fname, &tags, "ses", "Session")?;

    let advisory = check_modality(fname, &tags, class)?;

    match class {
        ModalityClass::Anat => {
            check_tag_alnum(fname, &tags, "acq", "Acquisition")?;
            check_tag_alnum(fname, &tags, "ce", "Contrast Enhancement")?;
            check_tag_alnum(fname, &tags, "rec", "Reconstruction")?;
            check_tag_alnum(fname, &tags, "mod", "Modalities Ref")?;
            check_tag_digits(fname, &tags, "run", "Run")?;
        }
        ModalityClass::Func => {
            if !check_tag_alnum(fname, &tags, "task", "Task")? {
                return Err(fname_error(
                    fname,
                    "functional filename must contain a 'task-DESCRIPTION' tag",
                ));
            }
            check_tag_alnum(fname, &tags, "rec", "Reconstruction")?;
            check_tag_digits(fname, &tags, "run", "Run")?;
            check_tag_digits(fname, &tags, "echo", "Echo")?;
        }
        ModalityClass::Dwi => {
            check_tag_alnum(fname, &tags, "acq", "Acquisition")?;
            check_tag_digits(fname, &tags, "run", "Run")?;
        }
        ModalityClass::Fmap => {
            check_tag_alnum(fname, &tags, "acq", "Acquisition")?;
            check_tag_alnum(fname, &tags, "dir", "Direction")?;
            check_tag_digits(fname, &tags, "run", "Run")?;
        }
    }

    Ok(advisory)
}

impl SessionManifest {
    /// Check every declared filename, fail-fast on the first violation.
    /// Collected advisories are returned for the caller to report; none of
    /// them block the run.
    pub fn check_filenames(&self) -> Result<Vec<Advisory>, BidsError> {
        let mut advisories = Vec::new();
        for class in [
            ModalityClass::Anat,
            ModalityClass::Func,
            ModalityClass::Dwi,
            ModalityClass::Fmap,
        ] {
            for run in self.runs(class) {
                if let Some(advisory) = check_filename(&run.name, class)? {
                    advisories.push(advisory);
                }
            }
        }
        Ok(advisories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RunSpec;

    #[test]
    fn missing_sub_tag_fails_for_every_class() {
        for class in [
            ModalityClass::Anat,
            ModalityClass::Func,
            ModalityClass::Dwi,
            ModalityClass::Fmap,
        ] {
            let err = check_filename("task-rest_bold", class).unwrap_err();
            assert!(
                matches!(err, BidsError::InvalidFilename { .. }),
                "class {class} should reject a filename without sub-"
            );
        }
    }

    #[test]
    fn well_formed_anat_filename_passes() {
        let advisory = check_filename(
            "sub-01_ses-02_acq-highres_ce-gad_rec-norm_run-01_T1w",
            ModalityClass::Anat,
        )
        .unwrap();
        assert_eq!(advisory, None);
    }

    #[test]
    fn anat_modality_outside_the_allowed_set_fails() {
        let err = check_filename("sub-01_bold", ModalityClass::Anat).unwrap_err();
        match err {
            BidsError::InvalidFilename { reason, .. } => {
                assert!(reason.contains("not supported for anat"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn func_requires_a_task_tag() {
        assert_eq!(
            check_filename("sub-01_task-rest_bold", ModalityClass::Func).unwrap(),
            None
        );

        let err = check_filename("sub-01_bold", ModalityClass::Func).unwrap_err();
        match err {
            BidsError::InvalidFilename { reason, .. } => {
                assert!(reason.contains("task-DESCRIPTION"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dwi_run_tag_must_be_digits() {
        assert_eq!(
            check_filename("sub-01_acq-test_run-01_dwi", ModalityClass::Dwi).unwrap(),
            None
        );

        let err = check_filename("sub-01_acq-test_run-A1_dwi", ModalityClass::Dwi).unwrap_err();
        match err {
            BidsError::InvalidFilename { reason, .. } => {
                assert!(reason.contains("must only contain digits"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_modality_tag_fails() {
        let err = check_filename("sub-01_task-rest", ModalityClass::Func).unwrap_err();
        match err {
            BidsError::InvalidFilename { reason, .. } => {
                assert!(reason.contains("modality tag"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn session_tag_must_be_alphanumeric_when_present() {
        let err = check_filename("sub-01_ses-0.1_T1w", ModalityClass::Anat).unwrap_err();
        assert!(matches!(err, BidsError::InvalidFilename { .. }));
    }

    #[test]
    fn off_list_fieldmap_modality_is_an_advisory_not_an_error() {
        let advisory =
            check_filename("sub-01_acq-1_dir-AP_unknownmod", ModalityClass::Fmap).unwrap();
        assert_eq!(
            advisory,
            Some(Advisory::UnusualFieldmapModality {
                filename: "sub-01_acq-1_dir-AP_unknownmod".to_string(),
                modality: "unknownmod".to_string(),
            })
        );

        // known fieldmap modalities stay silent
        assert_eq!(
            check_filename("sub-01_phasediff", ModalityClass::Fmap).unwrap(),
            None
        );
    }

    #[test]
    fn fieldmap_dir_tag_must_still_be_alphanumeric() {
        let err = check_filename("sub-01_dir-A_P_phasediff", ModalityClass::Fmap).unwrap_err();
        // "A_P" splits on the underscore first, so 'P' lands on the modality
        // key and collides with 'phasediff'
        assert!(matches!(err, BidsError::InvalidFilename { .. }));

        let err = check_filename("sub-01_dir-A.P_phasediff", ModalityClass::Fmap).unwrap_err();
        match err {
            BidsError::InvalidFilename { reason, .. } => {
                assert!(reason.contains("Direction"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn manifest_check_collects_advisories_across_classes() {
        let mut m = SessionManifest::new("01", "01");
        m.add_run(ModalityClass::Anat, RunSpec::new("2", "sub-01_T1w"))
            .unwrap();
        m.add_run(ModalityClass::Func, RunSpec::new("3", "sub-01_task-rest_bold"))
            .unwrap();
        m.add_run(ModalityClass::Fmap, RunSpec::new("4", "sub-01_oddball"))
            .unwrap();

        let advisories = m.check_filenames().unwrap();
        assert_eq!(advisories.len(), 1);
        assert!(matches!(
            advisories[0],
            Advisory::UnusualFieldmapModality { .. }
        ));
    }

    #[test]
    fn manifest_check_fails_fast_on_a_bad_name() {
        let mut m = SessionManifest::new("01", "01");
        m.add_run(ModalityClass::Func, RunSpec::new("3", "sub-01_bold"))
            .unwrap();
        assert!(m.check_filenames().is_err());
    }
}
