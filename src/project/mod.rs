//! Sphere-to-cube projection: the rasterizer, its `atan2` approximation and
//! the face-assignment diagram.

pub mod atan;
pub mod diagram;
pub mod extract;
