pub mod analysis;
pub mod error;
pub mod export;
pub mod planning;
pub mod tables;
