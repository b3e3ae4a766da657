//! Minimal Wavefront OBJ reader.
//!
//! Only vertex (`v x y z`) and face (`f a b c ...`) records are read. Face
//! tokens may carry texture/normal references (`7/2/5`, `7//5`); only the
//! position index is kept. Positive indices are 1-based, negative indices
//! count back from the last vertex defined so far. Comments, groups,
//! materials, texture coordinates and normals are ignored.

use std::fs;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{BspError, Result};
use crate::face::Face;
use crate::mesh::Mesh;

/// Parses OBJ text into a validated [`Mesh`].
///
/// # Errors
/// - [`BspError::ObjParse`] for malformed `v` or `f` records.
/// - The [`Mesh::new`] validation errors for faces that are too short or
///   reference missing vertices.
pub fn parse_obj(text: &str) -> Result<Mesh> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => vertices.push(parse_vertex(tokens, line_no)?),
            Some("f") => faces.push(parse_face(tokens, vertices.len(), line_no)?),
            _ => {}
        }
    }

    Mesh::new(vertices, faces)
}

/// Reads and parses an OBJ file.
///
/// # Errors
/// Returns [`BspError::Io`] naming `path` if the file cannot be read, and
/// the [`parse_obj`] errors otherwise.
pub fn read_obj(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| BspError::io(path, err))?;
    parse_obj(&text)
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<Point3<f32>> {
    let mut coord = || -> Result<f32> {
        let token = tokens.next().ok_or_else(|| BspError::ObjParse {
            line,
            message: "vertex needs three coordinates".to_string(),
        })?;
        token.parse::<f32>().map_err(|_| BspError::ObjParse {
            line,
            message: format!("invalid coordinate {token:?}"),
        })
    };
    let (x, y, z) = (coord()?, coord()?, coord()?);
    Ok(Point3::new(x, y, z))
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    vertices_so_far: usize,
    line: usize,
) -> Result<Face> {
    tokens
        .map(|token| parse_face_index(token, vertices_so_far, line))
        .collect::<Result<Vec<usize>>>()
        .map(Face::new)
}

fn parse_face_index(token: &str, vertices_so_far: usize, line: usize) -> Result<usize> {
    let position = token.split('/').next().unwrap_or_default();
    let invalid = |message: String| BspError::ObjParse { line, message };

    let raw: i64 = position
        .parse()
        .map_err(|_| invalid(format!("invalid face index {token:?}")))?;
    let resolved = match raw {
        0 => return Err(invalid("face index 0 is not valid in OBJ".to_string())),
        n if n > 0 => n - 1,
        n => vertices_so_far as i64 + n,
    };
    usize::try_from(resolved)
        .map_err(|_| invalid(format!("relative face index {raw} points before the first vertex")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_CORNER: &str = "\
# three faces around a corner
o corner
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vt 0.5 0.5
vn 0 0 1
usemtl none
f 1 3 2
f 1/1/1 2/1/1 4/1/1
f 1//1 4//1 3//1
";

    #[test]
    fn parses_vertices_and_faces() {
        let mesh = parse_obj(CUBE_CORNER).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.vertices()[3], Point3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.faces()[0].indices(), &[0, 2, 1]);
        assert_eq!(mesh.faces()[1].indices(), &[0, 1, 3]);
        assert_eq!(mesh.faces()[2].indices(), &[0, 3, 2]);
    }

    #[test]
    fn quads_and_negative_indices() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4 -3 -2 -1\n").unwrap();
        assert_eq!(mesh.faces()[0].indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn bad_coordinate_reports_line() {
        let err = parse_obj("v 0 0 0\nv 1 x 0\n").unwrap_err();
        assert!(matches!(err, BspError::ObjParse { line: 2, .. }));
    }

    #[test]
    fn missing_coordinate_reports_line() {
        let err = parse_obj("v 0 0\n").unwrap_err();
        assert!(matches!(err, BspError::ObjParse { line: 1, .. }));
    }

    #[test]
    fn zero_index_is_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(matches!(err, BspError::ObjParse { line: 4, .. }));
    }

    #[test]
    fn short_face_is_invalid() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
        assert!(matches!(
            err,
            BspError::InvalidFace {
                face: 0,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn dangling_index_is_invalid() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 7\n").unwrap_err();
        assert!(matches!(err, BspError::VertexOutOfRange { vertex: 6, .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_obj("/definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, BspError::Io { .. }));
    }
}
