//! Hierarchical polygon shape generator.
//!
//! Builds a root regular octagon, then for `depth` rounds spawns one regular
//! child polygon on every vertex of every polygon created in the previous
//! round. Children are `child_scale` times smaller than their parent and have
//! a random number of sides in `[min_sides, max_sides]`.
//!
//! Only the vertex count and the depth feed the flow simulation; the geometry
//! and draw order are consumed by the timeline generator.
//!
//! # Example
//!
//! ```
//! use flow_calibration_core_rs::shape::{ShapeGenerator, ShapeParams};
//!
//! let generated = ShapeGenerator::new(ShapeParams {
//!     fixed_depth: Some(1),
//!     ..ShapeParams::default()
//! })
//! .generate();
//! assert_eq!(generated.depth, 1);
//! assert!(generated.total_vertices() >= 8 + 8 * 3);
//! ```

use crate::models::flow::{MAX_DEPTH, MIN_DEPTH};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Sides of the root polygon
const ROOT_SIDES: usize = 8;

/// Most sides a child polygon may have; keeps
/// [`ShapeGenerator::theoretical_max_vertices`] an upper bound
pub const MAX_SIDES: usize = ROOT_SIDES;

/// Generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    /// Approximate diameter of the root octagon
    pub base_size: f64,

    /// Child radius as a fraction of the parent radius
    pub child_scale: f64,

    pub min_sides: usize,
    pub max_sides: usize,

    /// Recursion depth; drawn uniformly in [1, 4] when absent
    pub fixed_depth: Option<u32>,

    pub seed: u64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            base_size: 1.0,
            child_scale: 0.25,
            min_sides: 3,
            max_sides: 8,
            fixed_depth: None,
            seed: 0xC0FFEE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Segment between two vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub a: usize,
    pub b: usize,
}

/// Vertices, segments and the order segments were traced in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub vertices: Vec<Vec2>,
    pub edges: Vec<Segment>,
    /// Indices into `edges`
    pub draw_order: Vec<usize>,
}

/// A generated shape and the depth it was generated with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedShape {
    pub shape: Shape,
    pub depth: u32,
}

impl GeneratedShape {
    pub fn total_vertices(&self) -> usize {
        self.shape.vertices.len()
    }
}

/// Span of one polygon inside the shape's vertex list
#[derive(Debug, Clone, Copy)]
struct Polygon {
    first_vertex: usize,
    vertex_count: usize,
    radius: f64,
}

pub struct ShapeGenerator {
    params: ShapeParams,
    rng: RngManager,
}

impl ShapeGenerator {
    pub fn new(params: ShapeParams) -> Self {
        let rng = RngManager::new(params.seed);
        Self { params, rng }
    }

    /// Upper bound on the vertex count for depth `r` (clamped to [1, 4])
    ///
    /// `8 + 8 × Σ_{d=1..r} 8^d`, reached when every child is an octagon.
    pub fn theoretical_max_vertices(depth: u32) -> u64 {
        let r = depth.clamp(MIN_DEPTH, MAX_DEPTH);
        let sum: u64 = (1..=r).map(|d| 8u64.pow(d)).sum();
        8 + 8 * sum
    }

    /// Generate a shape
    ///
    /// Successive calls continue the same random stream.
    pub fn generate(&mut self) -> GeneratedShape {
        let depth = match self.params.fixed_depth {
            Some(d) => d.clamp(MIN_DEPTH, MAX_DEPTH),
            None => self
                .rng
                .uniform_int(MIN_DEPTH as i64, MAX_DEPTH as i64) as u32,
        };

        let mut shape = Shape::default();
        let orientation = self.rng.angle();
        let mut frontier = Vec::new();
        if let Some(root) = self.add_regular_polygon(
            &mut shape,
            Vec2 { x: 0.0, y: 0.0 },
            self.params.base_size * 0.5,
            ROOT_SIDES,
            orientation,
        ) {
            frontier.push(root);
        }

        for _ in 0..depth {
            let mut next = Vec::with_capacity(frontier.len() * ROOT_SIDES);
            for parent in &frontier {
                let child_radius = parent.radius * self.params.child_scale;
                for offset in 0..parent.vertex_count {
                    let center = shape.vertices[parent.first_vertex + offset];
                    let sides = self.rng.uniform_int(
                        self.params.min_sides as i64,
                        self.params.max_sides as i64,
                    ) as usize;
                    let orientation = self.rng.angle();
                    if let Some(child) =
                        self.add_regular_polygon(&mut shape, center, child_radius, sides, orientation)
                    {
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }

        GeneratedShape { shape, depth }
    }

    fn add_regular_polygon(
        &self,
        shape: &mut Shape,
        center: Vec2,
        radius: f64,
        sides: usize,
        orientation: f64,
    ) -> Option<Polygon> {
        let sides = sides.clamp(self.params.min_sides, self.params.max_sides.max(self.params.min_sides));
        if sides < 3 || !(radius > 0.0) {
            return None;
        }

        let first_vertex = shape.vertices.len();
        let step = 2.0 * std::f64::consts::PI / sides as f64;
        for i in 0..sides {
            let angle = orientation + i as f64 * step;
            shape.vertices.push(Vec2 {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            });
        }
        for i in 0..sides {
            shape.edges.push(Segment {
                a: first_vertex + i,
                b: first_vertex + (i + 1) % sides,
            });
            shape.draw_order.push(shape.edges.len() - 1);
        }

        Some(Polygon {
            first_vertex,
            vertex_count: sides,
            radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theoretical_max_vertices() {
        assert_eq!(ShapeGenerator::theoretical_max_vertices(1), 8 + 8 * 8);
        assert_eq!(ShapeGenerator::theoretical_max_vertices(4), 37448);
        assert_eq!(ShapeGenerator::theoretical_max_vertices(0), 72);
    }

    #[test]
    fn test_fixed_depth_is_clamped() {
        let generated = ShapeGenerator::new(ShapeParams {
            fixed_depth: Some(9),
            ..ShapeParams::default()
        })
        .generate();
        assert_eq!(generated.depth, 4);
    }

    #[test]
    fn test_edges_close_every_polygon() {
        let generated = ShapeGenerator::new(ShapeParams {
            fixed_depth: Some(2),
            ..ShapeParams::default()
        })
        .generate();
        let shape = &generated.shape;
        // one segment per vertex
        assert_eq!(shape.edges.len(), shape.vertices.len());
        assert_eq!(shape.draw_order.len(), shape.edges.len());
        for edge in &shape.edges {
            assert!(edge.a < shape.vertices.len());
            assert!(edge.b < shape.vertices.len());
        }
    }

    #[test]
    fn test_octagon_children_reach_max() {
        let generated = ShapeGenerator::new(ShapeParams {
            min_sides: 8,
            max_sides: 8,
            fixed_depth: Some(2),
            ..ShapeParams::default()
        })
        .generate();
        assert_eq!(
            generated.total_vertices() as u64,
            ShapeGenerator::theoretical_max_vertices(2)
        );
    }
}
