pub mod builds;
pub mod diag;
pub mod files;
pub mod locations;
pub mod versions;
