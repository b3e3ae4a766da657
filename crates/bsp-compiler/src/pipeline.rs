//! End-to-end conversion from a mesh to asset bytes.
//!
//! Stages run strictly in order and the first failure aborts, tagged with
//! the [`Stage`] it happened in:
//!
//! ```text
//! config → read → normalize → build → flatten → encode → write
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::asset;
use crate::bsp::{BspTree, FlatBsp};
use crate::config::{ConvertConfig, RangePolicy};
use crate::error::{BspError, Result, Stage};
use crate::mesh::Mesh;
use crate::normalize::{center_and_scale, check_coordinate_range, CoordinateRange};
use crate::obj::read_obj;

/// Counts gathered while converting a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertStats {
    pub vertex_count: usize,
    pub face_count: usize,
    pub node_count: usize,
    /// Length of the shared coplanar table.
    pub coplanar_entries: usize,
    /// Depth of the tree, 0 when empty.
    pub depth: usize,
    /// Coordinate range after normalization.
    pub coordinate_range: CoordinateRange,
    /// Scale factor applied, 1 when normalization is off.
    pub scale: f32,
    /// Encoded size in bytes.
    pub byte_len: usize,
}

/// Encoded asset bytes plus the statistics of the conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOutput {
    pub bytes: Vec<u8>,
    pub stats: ConvertStats,
}

/// Converts a mesh into asset bytes.
///
/// # Errors
/// Returns a [`BspError::Stage`] wrapping the first failure; an unusable
/// configuration is [`BspError::InvalidConfig`] in the config stage.
pub fn convert(mesh: Mesh, config: &ConvertConfig) -> Result<ConvertOutput> {
    config
        .validate()
        .map_err(|err| err.in_stage(Stage::Config))?;
    let mut mesh = mesh;

    let scale = if config.normalize {
        center_and_scale(mesh.vertices_mut(), config.target_size)
    } else {
        1.0
    };
    let coordinate_range = check_coordinate_range(mesh.vertices(), config.coordinate_limit);
    info!(
        "normalize: scale {scale}, coordinates in [{}, {}]",
        coordinate_range.min, coordinate_range.max
    );
    if !coordinate_range.is_valid() {
        match config.range_policy {
            RangePolicy::Warn => warn!(
                "{} coordinate components exceed the fixed-point range [{}, {}]",
                coordinate_range.out_of_range,
                -config.coordinate_limit - 1.0,
                config.coordinate_limit
            ),
            RangePolicy::Abort => {
                return Err(BspError::CoordinateRange {
                    min: coordinate_range.min,
                    max: coordinate_range.max,
                    out_of_range: coordinate_range.out_of_range,
                }
                .in_stage(Stage::Normalize));
            }
        }
    }

    let tree = BspTree::build(&mesh, config.epsilon).map_err(|err| err.in_stage(Stage::Build))?;
    let depth = tree.depth();
    info!(
        "build: {} faces into {} nodes, depth {depth}",
        mesh.face_count(),
        tree.len()
    );

    let flat = FlatBsp::from_tree(&tree, mesh.face_count())
        .map_err(|err| err.in_stage(Stage::Flatten))?;
    info!(
        "flatten: {} nodes, {} coplanar entries",
        flat.len(),
        flat.coplanar_table().len()
    );

    let bytes = asset::encode(mesh.vertices(), mesh.faces(), &flat)
        .map_err(|err| err.in_stage(Stage::Encode))?;
    info!("encode: {} bytes", bytes.len());

    let stats = ConvertStats {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        node_count: flat.len(),
        coplanar_entries: flat.coplanar_table().len(),
        depth,
        coordinate_range,
        scale,
        byte_len: bytes.len(),
    };
    Ok(ConvertOutput { bytes, stats })
}

/// Reads an OBJ file, converts it and writes the asset to `output`.
///
/// The output is written to a staging file next to `output` and renamed
/// into place, so a failed run never leaves a partial asset behind.
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<ConvertStats> {
    let input = input.as_ref();
    let output = output.as_ref();

    config
        .validate()
        .map_err(|err| err.in_stage(Stage::Config))?;
    let mesh = read_obj(input).map_err(|err| err.in_stage(Stage::Read))?;
    info!(
        "read: {} vertices, {} faces from {}",
        mesh.vertex_count(),
        mesh.face_count(),
        input.display()
    );

    let ConvertOutput { bytes, stats } = convert(mesh, config)?;

    write_atomic(output, &bytes).map_err(|err| err.in_stage(Stage::Write))?;
    info!("write: {} bytes to {}", bytes.len(), output.display());
    Ok(stats)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Writes `bytes` to a staging file and renames it onto `path`.
///
/// # Errors
/// Returns [`BspError::Io`] naming `path`; the staging file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = staging_path(path);
    let written = fs::File::create(&staging)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staging, path));

    written.map_err(|err| {
        debug!("writing {} failed: {err}", staging.display());
        // The staging file may never have been created.
        let _ = fs::remove_file(&staging);
        BspError::io(path, err)
    })
}
