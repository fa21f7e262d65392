// shared run/modality types
use std::fmt;

use serde::{Deserialize, Serialize};

/// Run numbers as they appear in association entries. Run specs keep the
/// user's original digit string (it is echoed into converter-output suffix
/// matching); comparisons against association entries are numeric, so a run
/// declared as "01" matches an entry naming 1.
pub type RunNumber = i64;

/// The four BIDS modality classes this tool sorts scans into. The class
/// decides both the target subdirectory and which filename tags are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalityClass {
    Anat,
    Func,
    Dwi,
    Fmap,
}

impl ModalityClass {
    /// Subdirectory name under the session directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ModalityClass::Anat => "anat",
            ModalityClass::Func => "func",
            ModalityClass::Dwi => "dwi",
            ModalityClass::Fmap => "fmap",
        }
    }

    /// A representative modality tag, used in diagnostics.
    pub fn example_modality(&self) -> &'static str {
        match self {
            ModalityClass::Anat => "T1w",
            ModalityClass::Func => "bold",
            ModalityClass::Dwi => "dwi",
            ModalityClass::Fmap => "phasediff or magnitude",
        }
    }
}

impl fmt::Display for ModalityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One declared acquisition: the converter-side run number and the
/// BIDS-format output filename (no extension) the scan should land under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    pub number: String,
    pub name: String,
}

impl RunSpec {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
        }
    }

    /// Numeric view of the run number, for association matching.
    /// Returns `None` for a number that does not parse (such a run can
    /// never be named by an association entry).
    pub fn number_value(&self) -> Option<RunNumber> {
        self.number.parse().ok()
    }
}

/// Non-fatal findings the validator wants surfaced. The caller decides how
/// to report them; nothing here aborts a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// A fieldmap filename ends in a modality outside the usual set.
    /// Fieldmap modality naming is permissive, so this warns instead of
    /// failing like the other classes do.
    UnusualFieldmapModality { filename: String, modality: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::UnusualFieldmapModality { filename, modality } => write!(
                f,
                "potentially bad filename {filename}: '{modality}' might not be a good tag for a fieldmap"
            ),
        }
    }
}
