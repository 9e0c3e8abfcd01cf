//! Cube face definitions and source crop windows.

pub mod crop;
pub mod face;
