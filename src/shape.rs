//! Reference shapes, their palettes, and the meshes particles morph into.
//!
//! The set of shapes is closed. Each [`Shape`] carries a built-in
//! [`Palette`] (start color, end color, emissive intensity) and is backed by a
//! [`ShapeMesh`] registered in a [`ShapeLibrary`]. Loading real mesh assets is
//! left to the caller; the library only needs flat vertex position arrays.
//!
//! # Example
//!
//! ```ignore
//! let mut library = ShapeLibrary::new();
//! library.insert(Shape::Book, ShapeMesh::from_flat(vec![1.0, 2.0, 3.0]));
//! ```

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The closed enumeration of reference shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shape {
    Fox,
    Book,
    #[default]
    Humanoid,
}

impl Shape {
    /// Every shape, in selection order.
    pub const ALL: [Shape; 3] = [Shape::Fox, Shape::Book, Shape::Humanoid];

    /// Display name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Shape::Fox => "Fox",
            Shape::Book => "Book",
            Shape::Humanoid => "Humanoid",
        }
    }

    /// Built-in colors for this shape.
    pub fn palette(self) -> Palette {
        // Hex literals below are all well formed.
        let (start, end, emissive_intensity) = match self {
            Shape::Fox => ("#ff8a00", "#66f2a5", 0.1),
            Shape::Book => ("#fff6a0", "#55f2aa", 0.1),
            Shape::Humanoid => ("#ff6a00", "#42f5f2", 11.0),
        };
        Palette {
            start: hex_to_linear(start).unwrap_or(Vec3::ONE),
            end: hex_to_linear(end).unwrap_or(Vec3::ONE),
            emissive_intensity,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownShape(s.to_string()))
    }
}

impl TryFrom<u32> for Shape {
    type Error = ConfigError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Shape::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| ConfigError::UnknownShape(index.to_string()))
    }
}

/// Start/end colors (linear RGB) and emissive intensity for a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub start: Vec3,
    pub end: Vec3,
    pub emissive_intensity: f32,
}

impl Palette {
    /// Build a palette from sRGB hex strings like `#ff6a00`.
    pub fn from_hex(start: &str, end: &str, emissive_intensity: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            start: hex_to_linear(start)?,
            end: hex_to_linear(end)?,
            emissive_intensity,
        })
    }
}

/// Parse `#rrggbb` as sRGB and convert to linear RGB.
pub fn hex_to_linear(hex: &str) -> Result<Vec3, ConfigError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ConfigError::InvalidColor(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| srgb_to_linear(v as f32 / 255.0))
            .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// One sub-mesh: a flat `[x0, y0, z0, x1, y1, z1, ...]` position array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMesh {
    positions: Vec<f32>,
}

impl SubMesh {
    /// Wrap a flat position array. A trailing partial vertex is ignored.
    pub fn from_flat(positions: Vec<f32>) -> Self {
        Self { positions }
    }

    /// Number of complete vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Vertex `i` as a vector.
    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }
}

/// A reference shape as a set of sub-meshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeMesh {
    sub_meshes: Vec<SubMesh>,
}

impl ShapeMesh {
    /// An empty mesh. Sampling it is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mesh with a single sub-mesh built from a flat position array.
    pub fn from_flat(positions: Vec<f32>) -> Self {
        Self::new().with_sub_mesh(SubMesh::from_flat(positions))
    }

    /// A mesh with a single sub-mesh built from points.
    pub fn from_points(points: &[Vec3]) -> Self {
        Self::from_flat(points.iter().flat_map(|p| p.to_array()).collect())
    }

    /// Add a sub-mesh.
    pub fn with_sub_mesh(mut self, sub_mesh: SubMesh) -> Self {
        self.sub_meshes.push(sub_mesh);
        self
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    /// Total vertices across all sub-meshes.
    pub fn vertex_count(&self) -> usize {
        self.sub_meshes.iter().map(SubMesh::vertex_count).sum()
    }

    /// Sphere surface, `rings` latitude bands by `segments` longitude steps.
    pub fn sphere(center: Vec3, radius: f32, rings: u32, segments: u32) -> Self {
        let mut points = Vec::with_capacity(((rings + 1) * segments) as usize);
        for r in 0..=rings {
            let phi = PI * r as f32 / rings.max(1) as f32;
            for s in 0..segments {
                let theta = TAU * s as f32 / segments.max(1) as f32;
                points.push(
                    center
                        + radius * Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()),
                );
            }
        }
        Self::from_points(&points)
    }

    /// Torus around the Y axis.
    pub fn torus(center: Vec3, major: f32, minor: f32, rings: u32, segments: u32) -> Self {
        let mut points = Vec::with_capacity((rings * segments) as usize);
        for r in 0..rings {
            let u = TAU * r as f32 / rings.max(1) as f32;
            for s in 0..segments {
                let v = TAU * s as f32 / segments.max(1) as f32;
                let d = major + minor * v.cos();
                points.push(center + Vec3::new(d * u.cos(), minor * v.sin(), d * u.sin()));
            }
        }
        Self::from_points(&points)
    }

    /// Flat grid of `steps x steps` points spanning `u` and `v` from `origin`.
    pub fn grid(origin: Vec3, u: Vec3, v: Vec3, steps: u32) -> Self {
        let n = steps.max(2);
        let mut points = Vec::with_capacity((n * n) as usize);
        for a in 0..n {
            for b in 0..n {
                let fa = a as f32 / (n - 1) as f32;
                let fb = b as f32 / (n - 1) as f32;
                points.push(origin + u * fa + v * fb);
            }
        }
        Self::from_points(&points)
    }

    /// Merge the sub-meshes of `other` into this mesh.
    pub fn merged(mut self, other: ShapeMesh) -> Self {
        self.sub_meshes.extend(other.sub_meshes);
        self
    }
}

/// Meshes for each shape in the enumeration.
#[derive(Debug, Clone, Default)]
pub struct ShapeLibrary {
    meshes: HashMap<Shape, ShapeMesh>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the mesh for a shape.
    pub fn insert(&mut self, shape: Shape, mesh: ShapeMesh) {
        self.meshes.insert(shape, mesh);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, shape: Shape, mesh: ShapeMesh) -> Self {
        self.insert(shape, mesh);
        self
    }

    /// Mesh for `shape`, if one was registered.
    pub fn get(&self, shape: Shape) -> Option<&ShapeMesh> {
        self.meshes.get(&shape)
    }

    /// Procedural point clouds standing in for the real mesh assets.
    pub fn procedural() -> Self {
        let fox = ShapeMesh::sphere(Vec3::new(0.0, 0.6, 0.0), 0.35, 24, 48)
            .merged(ShapeMesh::torus(Vec3::new(0.0, -0.2, 0.0), 0.6, 0.25, 64, 24))
            .merged(ShapeMesh::sphere(Vec3::new(0.25, 1.0, 0.0), 0.08, 8, 16))
            .merged(ShapeMesh::sphere(Vec3::new(-0.25, 1.0, 0.0), 0.08, 8, 16));

        let book = ShapeMesh::grid(
            Vec3::new(0.0, -0.5, -0.7),
            Vec3::new(-1.0, 0.35, 0.0),
            Vec3::new(0.0, 0.0, 1.4),
            96,
        )
        .merged(ShapeMesh::grid(
            Vec3::new(0.0, -0.5, -0.7),
            Vec3::new(1.0, 0.35, 0.0),
            Vec3::new(0.0, 0.0, 1.4),
            96,
        ));

        let humanoid = ShapeMesh::sphere(Vec3::new(0.0, 1.55, 0.0), 0.22, 24, 48)
            .merged(ShapeMesh::sphere(Vec3::new(0.0, 0.85, 0.0), 0.4, 32, 64))
            .merged(ShapeMesh::sphere(Vec3::new(0.0, 0.2, 0.0), 0.3, 24, 48))
            .merged(ShapeMesh::torus(Vec3::new(0.0, 1.05, 0.0), 0.55, 0.08, 64, 12))
            .merged(ShapeMesh::sphere(Vec3::new(-0.18, -0.5, 0.0), 0.14, 16, 32))
            .merged(ShapeMesh::sphere(Vec3::new(0.18, -0.5, 0.0), 0.14, 16, 32));

        Self::new()
            .with(Shape::Fox, fox)
            .with(Shape::Book, book)
            .with(Shape::Humanoid, humanoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_from_str() {
        assert_eq!("fox".parse::<Shape>().unwrap(), Shape::Fox);
        assert_eq!(" Humanoid ".parse::<Shape>().unwrap(), Shape::Humanoid);
        assert!(matches!("Dragon".parse::<Shape>(), Err(ConfigError::UnknownShape(_))));
    }

    #[test]
    fn test_shape_try_from_index() {
        assert_eq!(Shape::try_from(1).unwrap(), Shape::Book);
        assert!(Shape::try_from(3).is_err());
    }

    #[test]
    fn test_hex_to_linear() {
        let white = hex_to_linear("#ffffff").unwrap();
        assert!((white - Vec3::ONE).length() < 1e-6);
        let black = hex_to_linear("000000").unwrap();
        assert_eq!(black, Vec3::ZERO);
        // sRGB mid grey is darker in linear space
        let grey = hex_to_linear("#808080").unwrap();
        assert!(grey.x > 0.2 && grey.x < 0.23);
        assert!(hex_to_linear("#12345").is_err());
        assert!(hex_to_linear("#zzzzzz").is_err());
    }

    #[test]
    fn test_palettes_differ_per_shape() {
        let fox = Shape::Fox.palette();
        let humanoid = Shape::Humanoid.palette();
        assert_ne!(fox.start, humanoid.start);
        assert_eq!(humanoid.emissive_intensity, 11.0);
    }

    #[test]
    fn test_mesh_vertex_access() {
        let mesh = ShapeMesh::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.sub_meshes()[0].vertex(1), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_procedural_library_covers_all_shapes() {
        let library = ShapeLibrary::procedural();
        for shape in Shape::ALL {
            let mesh = library.get(shape).unwrap();
            assert!(mesh.vertex_count() > 1000, "{shape} mesh too sparse");
        }
    }
}
