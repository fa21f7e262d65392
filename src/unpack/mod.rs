pub mod convert;
pub mod copy;
pub mod dataset;
