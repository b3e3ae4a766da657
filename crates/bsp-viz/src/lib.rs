//! Interactive viewer utilities for compiled BSP assets.

use std::hash::{Hash, Hasher};

use bsp_compiler::bsp::BspVisitor;
use bsp_compiler::BspAsset;
use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::Point3;

pub mod navigator;
pub use navigator::TreeNavigator;

/// Generates a deterministic color from a face's canonical index.
pub fn face_color(face: u16) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    face.hash(&mut hasher);
    let hash = hasher.finish();

    let r = ((hash >> 16) & 0xFF) as u8;
    let g = ((hash >> 8) & 0xFF) as u8;
    let b = (hash & 0xFF) as u8;

    // Keep faces visible against the dark background
    Color::from_rgba(r.max(40), g.max(40), b.max(40), 255)
}

/// Triangle indices of a fan over a convex polygon with `vertex_count` corners.
pub fn fan_indices(vertex_count: usize) -> Vec<u16> {
    (1..vertex_count.saturating_sub(1))
        .flat_map(|i| [0, i as u16, (i + 1) as u16])
        .collect()
}

/// Draws one face of the asset by fan triangulation.
pub fn draw_face(asset: &BspAsset, face: u16) {
    let Some(indices) = asset.faces.get(usize::from(face)).map(|f| f.indices()) else {
        return;
    };
    if indices.len() < 3 {
        return;
    }

    let color = face_color(face);
    let vertices: Vec<Vertex> = indices
        .iter()
        .filter_map(|&i| asset.vertices.get(i))
        .map(|p| Vertex::new2(vec3(p.x, p.y, p.z), vec2(0.0, 0.0), color))
        .collect();
    if vertices.len() != indices.len() {
        return;
    }

    draw_mesh(&Mesh {
        indices: fan_indices(vertices.len()),
        vertices,
        texture: None,
    });
}

/// Visitor that draws the faces of an asset as they are visited.
pub struct RenderVisitor<'a> {
    asset: &'a BspAsset,
    drawn: usize,
}

impl<'a> RenderVisitor<'a> {
    pub fn new(asset: &'a BspAsset) -> Self {
        Self { asset, drawn: 0 }
    }

    /// Number of faces drawn so far.
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl BspVisitor for RenderVisitor<'_> {
    fn visit(&mut self, faces: &[u16]) {
        for &face in faces {
            draw_face(self.asset, face);
        }
        self.drawn += faces.len();
    }
}

/// Axis-aligned bounds of a vertex set, `None` when empty.
pub fn bounds(vertices: &[Point3<f32>]) -> Option<(Point3<f32>, Point3<f32>)> {
    let first = *vertices.first()?;
    Some(vertices.iter().fold((first, first), |(min, max), v| {
        (min.inf(v), max.sup(v))
    }))
}

/// Mouse and keyboard input gathered for one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraInput {
    /// Mouse movement while the left button is held, in normalized units.
    pub drag: Vec2,
    /// Vertical scroll wheel movement.
    pub scroll: f32,
    /// Arrow key steps: x turns yaw, y turns pitch.
    pub keys: Vec2,
}

impl CameraInput {
    /// Reads this frame's input from macroquad.
    pub fn poll() -> Self {
        let drag = if is_mouse_button_down(MouseButton::Left) {
            mouse_delta_position()
        } else {
            Vec2::ZERO
        };
        let axis = |positive, negative| {
            f32::from(u8::from(is_key_down(positive))) - f32::from(u8::from(is_key_down(negative)))
        };
        Self {
            drag,
            scroll: mouse_wheel().1,
            keys: vec2(
                axis(KeyCode::Left, KeyCode::Right),
                axis(KeyCode::Up, KeyCode::Down),
            ),
        }
    }
}

const KEY_TURN: f32 = 0.02;
const DRAG_TURN: f32 = 2.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera circling a target point, sized to the loaded asset.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    zoom_step: f32,
    zoom_range: (f32, f32),
}

impl OrbitCamera {
    /// Creates a camera looking at the center of `vertices` from far enough
    /// away to see all of them.
    pub fn framing(vertices: &[Point3<f32>]) -> Self {
        let (center, radius) = match bounds(vertices) {
            Some((min, max)) => (
                nalgebra::center(&min, &max),
                ((max - min).norm() / 2.0).max(1.0),
            ),
            None => (Point3::origin(), 40.0),
        };
        Self {
            target: vec3(center.x, center.y, center.z),
            distance: radius * 2.5,
            yaw: 0.4,
            pitch: 0.4,
            zoom_step: radius / 10.0,
            zoom_range: (radius / 4.0, radius * 10.0),
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Largest distance the camera may zoom out to.
    pub fn max_distance(&self) -> f32 {
        self.zoom_range.1
    }

    /// Applies one frame of input.
    pub fn apply(&mut self, input: CameraInput) {
        self.yaw += input.keys.x * KEY_TURN - input.drag.x * DRAG_TURN;
        self.pitch += input.keys.y * KEY_TURN - input.drag.y * DRAG_TURN;
        // Stay clear of the poles where the up vector flips
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (min, max) = self.zoom_range;
        self.distance = (self.distance - input.scroll * self.zoom_step).clamp(min, max);
    }

    /// Polls macroquad input and applies it.
    pub fn update(&mut self) {
        self.apply(CameraInput::poll());
    }

    /// Returns the camera's world position.
    pub fn position(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target + self.distance * vec3(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    /// Converts to macroquad's Camera3D for rendering.
    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: Vec3::Y,
            target: self.target,
            ..Default::default()
        }
    }

    /// Returns the eye point for BSP traversal.
    pub fn eye_point(&self) -> Point3<f32> {
        let eye = self.position();
        Point3::new(eye.x, eye.y, eye.z)
    }
}
