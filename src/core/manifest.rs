// session manifest: everything the user declared for one subject/session
use serde::{Deserialize, Serialize};

use crate::core::types::{ModalityClass, RunNumber, RunSpec};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BidsError {
    #[error("bad filename {filename}: {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("too many associations: found {fieldmaps} fieldmaps, but {given} association entries")]
    TooManyAssociations { given: usize, fieldmaps: usize },

    #[error("association entry is empty: the first integer must name a fieldmap run")]
    EmptyAssociation,

    #[error("run number '{value}' must only contain digits")]
    InvalidRunNumber { value: String },
}

/// All runs and association hints declared for one subject/session, in
/// command-line order. The validator and the fieldmap resolver both read
/// from here and never mutate it; the copy stage consumes it afterwards.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionManifest {
    pub subject: String,
    pub session: String,
    pub anat: Vec<RunSpec>,
    pub func: Vec<RunSpec>,
    pub dwi: Vec<RunSpec>,
    pub fmap: Vec<RunSpec>,
    /// User-supplied association entries: first integer names a fieldmap
    /// run, the rest name the runs it corrects.
    pub intended_for: Vec<Vec<RunNumber>>,
}

impl SessionManifest {
    pub fn new(subject: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            session: session.into(),
            ..Self::default()
        }
    }

    /// Register one declared acquisition. Run numbers must be digit strings:
    /// they are matched against converter output suffixes verbatim and
    /// against association entries numerically.
    pub fn add_run(
        &mut self,
        class: ModalityClass,
        run: RunSpec,
    ) -> Result<(), BidsError> {
        if run.number.is_empty() || !run.number.chars().all(|c| c.is_ascii_digit()) {
            return Err(BidsError::InvalidRunNumber { value: run.number });
        }
        self.runs_mut(class).push(run);
        Ok(())
    }

    /// Register one user association entry. Entries must be non-empty; run
    /// numbers that match nothing are tolerated here and ignored during
    /// resolution.
    pub fn add_intended_for(&mut self, entry: Vec<RunNumber>) -> Result<(), BidsError> {
        if entry.is_empty() {
            return Err(BidsError::EmptyAssociation);
        }
        self.intended_for.push(entry);
        Ok(())
    }

    pub fn runs(&self, class: ModalityClass) -> &[RunSpec] {
        match class {
            ModalityClass::Anat => &self.anat,
            ModalityClass::Func => &self.func,
            ModalityClass::Dwi => &self.dwi,
            ModalityClass::Fmap => &self.fmap,
        }
    }

    fn runs_mut(&mut self, class: ModalityClass) -> &mut Vec<RunSpec> {
        match class {
            ModalityClass::Anat => &mut self.anat,
            ModalityClass::Func => &mut self.func,
            ModalityClass::Dwi => &mut self.dwi,
            ModalityClass::Fmap => &mut self.fmap,
        }
    }

    /// The subject id reduced to its alphanumeric characters, for use in the
    /// `sub-` entity. Callers should warn when this differs from `subject`.
    pub fn bids_subject(&self) -> String {
        self.subject.chars().filter(|c| c.is_alphanumeric()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_run_rejects_non_digit_numbers() {
        let mut m = SessionManifest::new("01", "01");

        m.add_run(ModalityClass::Anat, RunSpec::new("7", "sub-01_T1w"))
            .unwrap();

        let err = m
            .add_run(ModalityClass::Dwi, RunSpec::new("A1", "sub-01_dwi"))
            .unwrap_err();
        assert_eq!(
            err,
            BidsError::InvalidRunNumber {
                value: "A1".to_string()
            }
        );

        let err = m
            .add_run(ModalityClass::Func, RunSpec::new("", "sub-01_task-rest_bold"))
            .unwrap_err();
        assert!(matches!(err, BidsError::InvalidRunNumber { .. }));
    }

    #[test]
    fn add_intended_for_rejects_empty_entries() {
        let mut m = SessionManifest::new("01", "01");
        assert_eq!(m.add_intended_for(vec![]), Err(BidsError::EmptyAssociation));
        m.add_intended_for(vec![3, 1, 2]).unwrap();
        assert_eq!(m.intended_for, vec![vec![3, 1, 2]]);
    }

    #[test]
    fn bids_subject_strips_non_alphanumeric() {
        let m = SessionManifest::new("RPMS_20-01", "01");
        assert_eq!(m.bids_subject(), "RPMS2001");

        // already compliant names pass through unchanged
        let m = SessionManifest::new("RPMS2001", "01");
        assert_eq!(m.bids_subject(), "RPMS2001");
    }
}
