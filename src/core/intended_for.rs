// fieldmap -> corrected-run association resolution
use serde::{Deserialize, Serialize};

use crate::core::manifest::{BidsError, SessionManifest};
use crate::core::types::{ModalityClass, RunNumber, RunSpec};

/// One resolved row: a fieldmap output filename and the relative paths of
/// the scans it corrects, ready for that sidecar's `IntendedFor` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldmapTargets {
    pub fieldmap: String,
    pub intended_for: Vec<String>,
}

impl SessionManifest {
    /// Resolve every fieldmap run to the ordered list of target scan paths
    /// it is intended for.
    ///
    /// User entries are taken first, in the order given; every fieldmap run
    /// not named by one of them gets a synthesized default entry covering
    /// all functional runs (absent explicit intent, a fieldmap is assumed
    /// to correct every functional scan). Target run numbers are looked up
    /// in functional, then anatomical, then diffusion runs — a fixed
    /// precedence, so a number present in two classes resolves to the
    /// earlier class only. Numbers that match nothing contribute nothing,
    /// and an entry whose fieldmap number matches no declared fieldmap is
    /// dropped, keeping the tool usable with partial specifications.
    pub fn resolve_intended_for(&self) -> Result<Vec<FieldmapTargets>, BidsError> {
        if self.intended_for.len() > self.fmap.len() {
            return Err(BidsError::TooManyAssociations {
                given: self.intended_for.len(),
                fieldmaps: self.fmap.len(),
            });
        }
        if self.intended_for.iter().any(Vec::is_empty) {
            return Err(BidsError::EmptyAssociation);
        }

        // working list: user entries, then defaults in declaration order
        let mut entries = self.intended_for.clone();
        for fmap_run in &self.fmap {
            let Some(number) = fmap_run.number_value() else {
                continue;
            };
            if !entries.iter().any(|entry| entry[0] == number) {
                let mut entry = vec![number];
                entry.extend(self.func.iter().filter_map(RunSpec::number_value));
                entries.push(entry);
            }
        }

        let mut resolved = Vec::new();
        for entry in &entries {
            let Some(fmap_run) = self
                .fmap
                .iter()
                .find(|run| run.number_value() == Some(entry[0]))
            else {
                // entry names no declared fieldmap: dropped, not an error
                continue;
            };

            let intended_for = entry[1..]
                .iter()
                .filter_map(|&number| self.lookup_target(number))
                .map(|(class, run)| {
                    format!("ses-{}/{}/{}.nii", self.session, class.dir_name(), run.name)
                })
                .collect();

            resolved.push(FieldmapTargets {
                fieldmap: fmap_run.name.clone(),
                intended_for,
            });
        }

        Ok(resolved)
    }

    // fixed lookup precedence: functional, then anatomical, then diffusion
    fn lookup_target(&self, number: RunNumber) -> Option<(ModalityClass, &RunSpec)> {
        for class in [ModalityClass::Func, ModalityClass::Anat, ModalityClass::Dwi] {
            if let Some(run) = self
                .runs(class)
                .iter()
                .find(|run| run.number_value() == Some(number))
            {
                return Some((class, run));
            }
        }
        None
    }
}
