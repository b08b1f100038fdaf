//! Vector geometry helpers
//!
//! Only the DXF curve interpolation is provided: see [`dxf`].

pub mod dxf;

pub use dxf::{DxfTriple, LeaderLine};
