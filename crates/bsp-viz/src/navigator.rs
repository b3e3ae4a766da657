//! BSP tree navigation for interactive visualization.

use bsp_compiler::{BspAsset, FlatBsp, Plane};
use macroquad::prelude::*;
use nalgebra::Point3;

use crate::RenderVisitor;

/// Direction taken at each node in the navigation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Front,
    Back,
}

/// Interactive navigator over the nodes of a flat BSP tree.
///
/// The current node is identified by the path of front/back steps taken
/// from the root.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    path: Vec<Direction>,
}

impl TreeNavigator {
    /// Creates a new navigator starting at the root.
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    /// Returns the current navigation path.
    pub fn path(&self) -> &[Direction] {
        &self.path
    }

    /// Returns the current depth in the tree.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Returns the array position of the current node, if the tree is non-empty.
    pub fn current_position(&self, bsp: &FlatBsp) -> Option<usize> {
        let mut position = usize::try_from(bsp.root()).ok()?;
        for direction in &self.path {
            let node = bsp.node(position)?;
            position = match direction {
                Direction::Front => node.front_child()?,
                Direction::Back => node.back_child()?,
            };
        }
        Some(position)
    }

    fn step(&mut self, bsp: &FlatBsp, direction: Direction) -> bool {
        let child = self
            .current_position(bsp)
            .and_then(|position| bsp.node(position))
            .and_then(|node| match direction {
                Direction::Front => node.front_child(),
                Direction::Back => node.back_child(),
            });
        if child.is_some() {
            self.path.push(direction);
        }
        child.is_some()
    }

    /// Attempts to navigate to the front child. Returns true if successful.
    pub fn go_front(&mut self, bsp: &FlatBsp) -> bool {
        self.step(bsp, Direction::Front)
    }

    /// Attempts to navigate to the back child. Returns true if successful.
    pub fn go_back(&mut self, bsp: &FlatBsp) -> bool {
        self.step(bsp, Direction::Back)
    }

    /// Navigates to the parent node. Returns true if not already at root.
    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    /// Returns to the root node.
    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input for navigation.
    /// Returns true if navigation state changed.
    pub fn update(&mut self, bsp: &FlatBsp) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed |= self.go_front(bsp);
        }
        if is_key_pressed(KeyCode::B) {
            changed |= self.go_back(bsp);
        }
        if is_key_pressed(KeyCode::P) {
            changed |= self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// Renders the faces of the current subtree in painter's order.
    /// Returns the number of faces drawn.
    pub fn render(&self, asset: &BspAsset, planes: &[Plane], eye: Point3<f32>) -> usize {
        let mut visitor = RenderVisitor::new(asset);
        if let Some(position) = self.current_position(&asset.bsp) {
            asset
                .bsp
                .traverse_subtree_back_to_front(position, eye, planes, &mut visitor);
        }
        visitor.drawn()
    }

    /// Path from the root as `F`/`B` steps, or `root`.
    pub fn path_label(&self) -> String {
        if self.path.is_empty() {
            return "root".to_string();
        }
        let steps: Vec<&str> = self
            .path
            .iter()
            .map(|direction| match direction {
                Direction::Front => "F",
                Direction::Back => "B",
            })
            .collect();
        steps.join(" -> ")
    }

    /// Describes the current node, or `None` for an empty tree.
    pub fn summary(&self, bsp: &FlatBsp) -> Option<NodeSummary> {
        let position = self.current_position(bsp)?;
        let node = bsp.node(position)?;
        Some(NodeSummary {
            position,
            plane_face: node.plane_face,
            coplanar_faces: usize::from(node.coplanar_count),
            subtree_faces: subtree_face_count(bsp, position),
            has_front: node.front_child().is_some(),
            has_back: node.back_child().is_some(),
        })
    }

    /// Draws the navigation overlay starting at `y_offset`.
    pub fn draw_ui(&self, bsp: &FlatBsp, y_offset: f32) {
        let path = format!("Path: {} (depth {})", self.path_label(), self.depth());
        let lines: Vec<(String, f32, Color)> = match self.summary(bsp) {
            Some(summary) => {
                let mut children = String::from("Children:");
                if summary.has_front {
                    children.push_str(" [F]ront");
                }
                if summary.has_back {
                    children.push_str(" [B]ack");
                }
                if summary.is_leaf() {
                    children.push_str(" (leaf)");
                }
                vec![
                    (
                        format!(
                            "Node {}: plane face {}, {} coplanar, {} in subtree",
                            summary.position,
                            summary.plane_face,
                            summary.coplanar_faces,
                            summary.subtree_faces
                        ),
                        18.0,
                        WHITE,
                    ),
                    (path, 18.0, YELLOW),
                    (children, 18.0, if summary.is_leaf() { ORANGE } else { GREEN }),
                ]
            }
            None => vec![("Empty tree".to_string(), 18.0, WHITE), (path, 18.0, YELLOW)],
        };

        let mut y = y_offset;
        for (text, size, color) in lines {
            draw_text(&text, 10.0, y, size, color);
            y += 20.0;
        }
        draw_text("[P]arent | [R]oot", 10.0, y, 16.0, DARKGRAY);
    }
}

/// What the overlay shows about the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSummary {
    pub position: usize,
    pub plane_face: u16,
    pub coplanar_faces: usize,
    pub subtree_faces: usize,
    pub has_front: bool,
    pub has_back: bool,
}

impl NodeSummary {
    pub fn is_leaf(&self) -> bool {
        !self.has_front && !self.has_back
    }
}

/// Counts the faces stored in the subtree rooted at `position`.
pub fn subtree_face_count(bsp: &FlatBsp, position: usize) -> usize {
    let mut count = 0;
    let mut stack = vec![position];
    let mut visited = vec![false; bsp.len()];
    while let Some(position) = stack.pop() {
        let Some(node) = bsp.node(position) else {
            continue;
        };
        if std::mem::replace(&mut visited[position], true) {
            continue;
        }
        count += usize::from(node.coplanar_count);
        stack.extend(node.front_child().into_iter().chain(node.back_child()));
    }
    count
}
