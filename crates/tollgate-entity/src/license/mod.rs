//! License domain entities.

pub mod model;
pub mod status;

pub use model::License;
pub use status::LicenseStatus;
