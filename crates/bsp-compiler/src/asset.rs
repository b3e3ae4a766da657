//! BSP binary asset read/write implementation.
//!
//! # Format Specification
//!
//! All integers are little-endian, all indices 0-based.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ HEADER (6 bytes)                                                   │
//! │  0-1: vertex_count (u16)                                           │
//! │  2-3: face_count (u16)                                             │
//! │  4-5: node_count (u16)                                             │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ VERTICES (12 bytes each)                                           │
//! │  f32 x, f32 y, f32 z                                               │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ FACES (variable)                                                   │
//! │  u8 vertex_per_face, then u16 vertex index × vertex_per_face       │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ NODES (10 bytes each)                                              │
//! │  u16 plane_face, u16 coplanar_count, u16 coplanar_start,           │
//! │  i16 front, i16 back            (-1 = no child)                    │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ COPLANAR TABLE (2 bytes each, to end of data)                      │
//! │  u16 face index                                                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The header carries no length for the coplanar table; readers take
//! everything after the nodes.

use std::fs;
use std::io::Write;
use std::path::Path;

use nalgebra::Point3;

use crate::bsp::{FlatBsp, FlatNode};
use crate::error::{BspError, Result};
use crate::face::Face;
use crate::plane::{compute_plane, Plane};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 6;

/// Size of one encoded vertex in bytes.
pub const VERTEX_SIZE: usize = 12;

/// Size of one encoded node in bytes.
pub const NODE_SIZE: usize = 10;

/// Largest number of vertices a face may have.
pub const MAX_FACE_VERTICES: usize = u8::MAX as usize;

/// Asset header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetHeader {
    /// Number of vertices.
    pub vertex_count: u16,
    /// Number of faces.
    pub face_count: u16,
    /// Number of BSP nodes.
    pub node_count: u16,
}

impl AssetHeader {
    /// Serialize the header to a byte array.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.face_count.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.node_count.to_le_bytes());
        bytes
    }

    /// Deserialize a header from a byte array.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            vertex_count: u16::from_le_bytes([bytes[0], bytes[1]]),
            face_count: u16::from_le_bytes([bytes[2], bytes[3]]),
            node_count: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Compute the encoded size of an asset.
///
/// Useful for pre-allocation and for checking a file against its header.
pub fn encoded_size(
    vertex_count: usize,
    faces: &[Face],
    node_count: usize,
    table_len: usize,
) -> usize {
    let face_bytes: usize = faces.iter().map(|face| 1 + 2 * face.len()).sum();
    HEADER_SIZE + vertex_count * VERTEX_SIZE + face_bytes + node_count * NODE_SIZE + table_len * 2
}

fn fit_u16(what: &'static str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| BspError::CountOverflow {
        what,
        value,
        max: u16::MAX as usize,
    })
}

/// Encode geometry and a flattened tree into asset bytes.
///
/// Encoding is a pure function of its inputs: the same inputs always
/// produce the same bytes.
///
/// # Errors
/// Returns [`BspError::CountOverflow`] if a count or index does not fit its
/// field (more than 65535 vertices or faces, or a face with more than 255
/// vertices).
pub fn encode(vertices: &[Point3<f32>], faces: &[Face], bsp: &FlatBsp) -> Result<Vec<u8>> {
    let header = AssetHeader {
        vertex_count: fit_u16("vertex count", vertices.len())?,
        face_count: fit_u16("face count", faces.len())?,
        node_count: fit_u16("node count", bsp.len())?,
    };

    let mut out = Vec::with_capacity(encoded_size(
        vertices.len(),
        faces,
        bsp.len(),
        bsp.coplanar_table().len(),
    ));
    out.extend_from_slice(&header.to_bytes());

    for vertex in vertices {
        out.extend_from_slice(&vertex.x.to_le_bytes());
        out.extend_from_slice(&vertex.y.to_le_bytes());
        out.extend_from_slice(&vertex.z.to_le_bytes());
    }

    for face in faces {
        let count = u8::try_from(face.len()).map_err(|_| BspError::CountOverflow {
            what: "vertices per face",
            value: face.len(),
            max: MAX_FACE_VERTICES,
        })?;
        out.push(count);
        for &index in face.indices() {
            out.extend_from_slice(&fit_u16("vertex index", index)?.to_le_bytes());
        }
    }

    for node in bsp.nodes() {
        out.extend_from_slice(&node.plane_face.to_le_bytes());
        out.extend_from_slice(&node.coplanar_count.to_le_bytes());
        out.extend_from_slice(&node.coplanar_start.to_le_bytes());
        out.extend_from_slice(&node.front.to_le_bytes());
        out.extend_from_slice(&node.back.to_le_bytes());
    }

    for face in bsp.coplanar_table() {
        out.extend_from_slice(&face.to_le_bytes());
    }

    Ok(out)
}

/// Encode an asset and write it to `writer`.
///
/// # Errors
/// The [`encode`] errors, or [`BspError::Stream`] if writing fails.
pub fn write_to<W: Write>(
    writer: &mut W,
    vertices: &[Point3<f32>],
    faces: &[Face],
    bsp: &FlatBsp,
) -> Result<()> {
    let bytes = encode(vertices, faces, bsp)?;
    writer.write_all(&bytes).map_err(BspError::Stream)
}

/// A decoded BSP asset: geometry plus the flattened tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BspAsset {
    /// Vertex positions.
    pub vertices: Vec<Point3<f32>>,
    /// Faces as vertex index lists, in canonical order.
    pub faces: Vec<Face>,
    /// The flattened BSP tree.
    pub bsp: FlatBsp,
}

impl BspAsset {
    /// Encode this asset into bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(&self.vertices, &self.faces, &self.bsp)
    }

    /// Decode an asset from bytes, validating every cross reference.
    ///
    /// # Errors
    /// Returns [`BspError::InvalidFormat`] for truncated data, a trailing odd
    /// byte, vertex or face indices out of range, node children out of
    /// range, coplanar runs past the table, or the unresolved-face sentinel.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let header_bytes: [u8; HEADER_SIZE] = reader
            .take(HEADER_SIZE, "header")?
            .try_into()
            .map_err(|_| BspError::invalid_format(0, "short header"))?;
        let header = AssetHeader::from_bytes(&header_bytes);
        let vertex_count = usize::from(header.vertex_count);
        let face_count = usize::from(header.face_count);
        let node_count = usize::from(header.node_count);

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let x = reader.f32("vertex")?;
            let y = reader.f32("vertex")?;
            let z = reader.f32("vertex")?;
            vertices.push(Point3::new(x, y, z));
        }

        let mut faces = Vec::with_capacity(face_count);
        for index in 0..face_count {
            let offset = reader.offset();
            let count = usize::from(reader.u8("face vertex count")?);
            let mut indices = Vec::with_capacity(count);
            for _ in 0..count {
                let vertex = usize::from(reader.u16("face vertex index")?);
                if vertex >= vertex_count {
                    return Err(BspError::invalid_format(
                        offset,
                        format!("face {index} references vertex {vertex} of {vertex_count}"),
                    ));
                }
                indices.push(vertex);
            }
            faces.push(Face::new(indices));
        }

        let nodes_offset = reader.offset();
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            nodes.push(FlatNode {
                plane_face: reader.u16("node")?,
                coplanar_count: reader.u16("node")?,
                coplanar_start: reader.u16("node")?,
                front: reader.i16("node")?,
                back: reader.i16("node")?,
            });
        }

        let table_offset = reader.offset();
        let rest = reader.rest();
        if rest.len() % 2 != 0 {
            return Err(BspError::invalid_format(
                table_offset,
                "coplanar table has a trailing odd byte",
            ));
        }
        let coplanar = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let bsp = FlatBsp::from_parts(nodes, coplanar, face_count).map_err(|err| match err {
            BspError::InvalidFormat { message, .. } => {
                BspError::invalid_format(nodes_offset, message)
            }
            other => other,
        })?;

        Ok(Self {
            vertices,
            faces,
            bsp,
        })
    }

    /// Encode this asset and write it to `path` atomically.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::pipeline::write_atomic(path.as_ref(), &self.encode()?)
    }

    /// Read and decode an asset file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| BspError::io(path, err))?;
        Self::decode(&bytes)
    }

    /// Computes the plane of every face, indexed by canonical face index.
    ///
    /// # Errors
    /// Fails if a face has fewer than three vertices.
    pub fn planes(&self) -> Result<Vec<Plane>> {
        self.faces
            .iter()
            .enumerate()
            .map(|(index, face)| compute_plane(index, face, &self.vertices))
            .collect()
    }
}

/// Little-endian cursor over asset bytes.
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let bytes = self.bytes;
        let end = self.offset + len;
        let slice = bytes.get(self.offset..end).ok_or_else(|| {
            BspError::invalid_format(
                self.offset,
                format!("unexpected end of data while reading {what}"),
            )
        })?;
        self.offset = end;
        Ok(slice)
    }

    fn rest(&mut self) -> &'a [u8] {
        let bytes = self.bytes;
        let rest = &bytes[self.offset.min(bytes.len())..];
        self.offset = bytes.len();
        rest
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn i16(&mut self, what: &str) -> Result<i16> {
        let b = self.take(2, what)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        let b = self.take(4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
