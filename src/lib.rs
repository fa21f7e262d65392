pub mod core;
pub mod unpack;

pub const BIDS_VERSION: &str = "1.0.2";
