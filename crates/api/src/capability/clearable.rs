//! Reset support for test tooling

use dsbridge_core::Result;

/// Drop all stored data
pub trait Clearable {
    /// Remove every entity and schema record of the application
    fn clear(&self) -> Result<()>;
}
