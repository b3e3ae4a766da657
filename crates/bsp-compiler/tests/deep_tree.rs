//! Degenerate input producing a tree as deep as its face count.

use bsp_compiler::bsp::FnVisitor;
use bsp_compiler::{convert, BspAsset, BspTree, ConvertConfig, Face, FlatBsp, Mesh};
use nalgebra::Point3;

const LAYERS: usize = 5000;

/// Horizontal triangles stacked along z, each one above the previous.
fn stacked_mesh(layers: usize) -> Mesh {
    let mut vertices = Vec::with_capacity(layers * 3);
    let mut faces = Vec::with_capacity(layers);
    for layer in 0..layers {
        let z = layer as f32;
        vertices.push(Point3::new(0.0, 0.0, z));
        vertices.push(Point3::new(1.0, 0.0, z));
        vertices.push(Point3::new(0.0, 1.0, z));
        faces.push(Face::from([3 * layer, 3 * layer + 1, 3 * layer + 2]));
    }
    Mesh::new(vertices, faces).unwrap()
}

#[test]
fn stacked_faces_build_a_single_chain() {
    let mesh = stacked_mesh(LAYERS);
    let tree = BspTree::from_mesh(&mesh).unwrap();
    assert_eq!(tree.len(), LAYERS);
    assert_eq!(tree.depth(), LAYERS);

    let flat = FlatBsp::from_tree(&tree, mesh.face_count()).unwrap();
    assert_eq!(flat.depth(), LAYERS);
    for (position, node) in flat.nodes().iter().enumerate() {
        assert_eq!(usize::from(node.plane_face), position);
        assert_eq!(node.back_child(), None);
        let expected_front = (position + 1 < LAYERS).then_some(position + 1);
        assert_eq!(node.front_child(), expected_front);
    }
}

#[test]
fn stacked_faces_survive_the_whole_pipeline() {
    let output = convert(stacked_mesh(LAYERS), &ConvertConfig::default()).unwrap();
    assert_eq!(output.stats.node_count, LAYERS);
    assert_eq!(output.stats.depth, LAYERS);

    let asset = BspAsset::decode(&output.bytes).unwrap();
    let planes = asset.planes().unwrap();

    let mut visited = 0usize;
    let mut last = None;
    let mut visitor = FnVisitor::new(|faces: &[u16]| {
        visited += faces.len();
        last = faces.last().copied();
    });
    // Looking from far above, the lowest face is drawn first and the top one last.
    asset
        .bsp
        .traverse_back_to_front(Point3::new(0.0, 0.0, 1.0e6), &planes, &mut visitor);
    drop(visitor);

    assert_eq!(visited, LAYERS);
    assert_eq!(last, Some((LAYERS - 1) as u16));
}
