//! Mesh to BSP asset compiler.
//!
//! Builds a Binary Space Partitioning tree over the faces of a polygon mesh
//! and serializes it, together with the geometry, into the compact binary
//! asset read by the renderer.
//!
//! ```ignore
//! use bsp_compiler::{convert, ConvertConfig, parse_obj};
//!
//! let mesh = parse_obj(&text)?;
//! let output = convert(mesh, &ConvertConfig::default())?;
//! std::fs::write("model.bin", &output.bytes)?;
//! ```

pub mod asset;
pub mod bsp;
pub mod normalize;
pub mod obj;
pub mod pipeline;

mod config;
mod error;
mod face;
mod mesh;
mod plane;

pub use asset::{encode, write_to, BspAsset};
pub use bsp::{BspTree, FlatBsp, FlatNode, NO_CHILD};
pub use config::{ConvertConfig, RangePolicy};
pub use error::{BspError, Result, Stage};
pub use face::Face;
pub use mesh::Mesh;
pub use obj::{parse_obj, read_obj};
pub use pipeline::{convert, convert_file, ConvertOutput, ConvertStats};
pub use plane::{compute_plane, default_normal, Classification, Plane, PlaneSide, PLANE_EPSILON};
