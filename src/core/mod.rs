pub mod intended_for;
pub mod manifest;
pub mod tags;
pub mod types;
pub mod validate;

pub use intended_for::FieldmapTargets;
pub use manifest::{BidsError, SessionManifest};
pub use types::{Advisory, ModalityClass, RunSpec};
