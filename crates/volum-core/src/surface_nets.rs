//! Surface nets isosurface extraction.
//!
//! Extracts a triangle mesh of the level set `field == level` from a scalar
//! field on a structured grid. One vertex is placed in every cell whose
//! corners straddle the level, at the mean of the interpolated edge
//! crossings. Every grid edge with a sign change is shared by four cells, and
//! their vertices are joined into a quad (two triangles).
//!
//! A node counts as inside when `value - level < 0`. A value exactly equal to
//! the level is outside, so a constant field never produces a surface, not
//! even when the level equals the constant.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumError};
use crate::field::{Bounds, GridShape};
use crate::mesh::TriangleMesh;

/// Maps grid-index space to world space: `offset + index * scale`.
///
/// The scale spreads the grid over the bounds extent and the offset is minus
/// half the extent, so the surface is centered at the world origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridTransform {
    pub offset: Vec3,
    pub scale: Vec3,
}

impl GridTransform {
    /// Builds the transform for a grid of `shape` nodes spanning `bounds`.
    #[must_use]
    pub fn new(bounds: &Bounds, shape: &GridShape) -> Self {
        let extent = bounds.extent();
        let steps = shape.as_vec3() - Vec3::ONE;
        // single-node axes have no cells; leave them unscaled
        let scale = Vec3::select(steps.cmpgt(Vec3::ZERO), extent / steps.max(Vec3::ONE), Vec3::ONE);
        Self {
            offset: -extent * 0.5,
            scale,
        }
    }

    /// Maps a grid-space point to world space.
    #[inline]
    #[must_use]
    pub fn apply(&self, index: Vec3) -> Vec3 {
        self.offset + index * self.scale
    }

    /// The equivalent local transform matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.offset) * Mat4::from_scale(self.scale)
    }
}

/// The isosurface of one level, in world space.
#[derive(Debug, Clone)]
pub struct IsoSurface {
    pub level: f32,
    pub mesh: TriangleMesh,
    /// Mapping from grid-index space to world space. `mesh` has already been
    /// through it, so it must not be applied to `mesh` again.
    pub grid_to_world: GridTransform,
}

/// Extracts the isosurface `field == level` in grid-index space.
///
/// `field` holds `shape.node_count()` values with x varying fastest. Grids
/// with a single node along any axis have no cells and yield an empty mesh.
pub fn extract(field: &[f32], shape: GridShape, level: f32) -> Result<TriangleMesh> {
    check_size(field, shape)?;
    Ok(surface_nets(field, shape, level))
}

/// Extracts one grid-space mesh per level. Levels are independent and the
/// meshes are never merged.
pub fn extract_levels(field: &[f32], shape: GridShape, levels: &[f32]) -> Result<Vec<TriangleMesh>> {
    check_size(field, shape)?;
    Ok(levels
        .iter()
        .map(|&level| surface_nets(field, shape, level))
        .collect())
}

fn check_size(field: &[f32], shape: GridShape) -> Result<()> {
    if field.len() == shape.node_count() {
        Ok(())
    } else {
        Err(VolumError::SizeMismatch {
            expected: shape.node_count(),
            actual: field.len(),
        })
    }
}

const NO_VERTEX: u32 = u32::MAX;

/// Cube edges as corner pairs. Corner `c` sits at offset
/// `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`.
#[rustfmt::skip]
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7), // x
    (0, 2), (1, 3), (4, 6), (5, 7), // y
    (0, 4), (1, 5), (2, 6), (3, 7), // z
];

#[inline]
fn corner_offset(corner: usize) -> Vec3 {
    Vec3::new(
        (corner & 1) as f32,
        ((corner >> 1) & 1) as f32,
        ((corner >> 2) & 1) as f32,
    )
}

fn surface_nets(field: &[f32], shape: GridShape, level: f32) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();
    if shape.cell_count() == 0 {
        return mesh;
    }

    let cells = [
        shape.nx as usize - 1,
        shape.ny as usize - 1,
        shape.nz as usize - 1,
    ];
    let cell_index = |c: [usize; 3]| c[0] + cells[0] * (c[1] + cells[1] * c[2]);
    let mut cell_vertex = vec![NO_VERTEX; shape.cell_count()];
    let mut corners = [0.0_f32; 8];

    for z in 0..cells[2] {
        for y in 0..cells[1] {
            for x in 0..cells[0] {
                let mut mask = 0_u8;
                for (c, value) in corners.iter_mut().enumerate() {
                    let node = shape.index(x + (c & 1), y + ((c >> 1) & 1), z + ((c >> 2) & 1));
                    *value = field[node] - level;
                    if *value < 0.0 {
                        mask |= 1 << c;
                    }
                }

                // Skip fully inside or fully outside
                if mask == 0 || mask == 0xFF {
                    continue;
                }

                let mut sum = Vec3::ZERO;
                let mut crossings = 0_u32;
                for &(a, b) in &CUBE_EDGES {
                    let (fa, fb) = (corners[a], corners[b]);
                    if (fa < 0.0) == (fb < 0.0) {
                        continue;
                    }
                    let t = fa / (fa - fb);
                    sum += corner_offset(a).lerp(corner_offset(b), t);
                    crossings += 1;
                }

                let cell = [x, y, z];
                let vertex = mesh.positions.len() as u32;
                cell_vertex[cell_index(cell)] = vertex;
                mesh.positions
                    .push(Vec3::new(x as f32, y as f32, z as f32) + sum / crossings as f32);

                // Quads around the three edges leaving corner 0. The other
                // three cells sharing each edge precede this one in scan order.
                let inside = mask & 1 != 0;
                for axis in 0..3 {
                    if inside == (mask & (1 << (1 << axis)) != 0) {
                        continue;
                    }
                    let u = (axis + 1) % 3;
                    let v = (axis + 2) % 3;
                    if cell[u] == 0 || cell[v] == 0 {
                        continue;
                    }

                    let mut cell_u = cell;
                    cell_u[u] -= 1;
                    let mut cell_v = cell;
                    cell_v[v] -= 1;
                    let mut cell_uv = cell_u;
                    cell_uv[v] -= 1;

                    let b = cell_vertex[cell_index(cell_u)];
                    let c = cell_vertex[cell_index(cell_uv)];
                    let d = cell_vertex[cell_index(cell_v)];
                    if b == NO_VERTEX || c == NO_VERTEX || d == NO_VERTEX {
                        continue;
                    }

                    // Wind so normals point towards increasing field values
                    if inside {
                        mesh.triangles.push([vertex, b, c]);
                        mesh.triangles.push([vertex, c, d]);
                    } else {
                        mesh.triangles.push([vertex, d, c]);
                        mesh.triangles.push([vertex, c, b]);
                    }
                }
            }
        }
    }

    mesh.compute_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(nx: u32, ny: u32, nz: u32) -> GridShape {
        GridShape::new(nx, ny, nz).unwrap()
    }

    fn sphere_field(n: u32, radius: f32) -> (Vec<f32>, Vec3) {
        let grid = shape(n, n, n);
        let center = Vec3::splat((n - 1) as f32 / 2.0);
        let mut field = vec![0.0_f32; grid.node_count()];
        for k in 0..n as usize {
            for j in 0..n as usize {
                for i in 0..n as usize {
                    let p = Vec3::new(i as f32, j as f32, k as f32);
                    field[grid.index(i, j, k)] = (p - center).length() - radius;
                }
            }
        }
        (field, center)
    }

    #[test]
    fn test_constant_field_is_empty() {
        let field = vec![1.0; 3 * 3 * 3];
        assert!(extract(&field, shape(3, 3, 3), 0.0).unwrap().is_empty());
        assert!(extract(&field, shape(3, 3, 3), 2.0).unwrap().is_empty());
        // exact crossing counts as outside everywhere
        let mesh = extract(&field, shape(3, 3, 3), 1.0).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.positions.is_empty());
    }

    #[test]
    fn test_zero_grid_level_one_is_empty() {
        let field = vec![0.0; 27];
        assert!(extract(&field, shape(3, 3, 3), 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_single_peak_is_closed() {
        // One hot node in the middle of a 3x3x3 grid: six quads around it.
        let grid = shape(3, 3, 3);
        let mut field = vec![0.0_f32; 27];
        field[grid.index(1, 1, 1)] = 1.0;
        let mesh = extract(&field, grid, 0.5).unwrap();

        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.num_triangles(), 12);

        // closed surface: every edge is shared by exactly two triangles
        let mut edges = std::collections::HashMap::new();
        for t in &mesh.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert!(edges.values().all(|&n| n == 2));
    }

    #[test]
    fn test_sphere_sdf() {
        let n = 20_u32;
        let radius = 5.0;
        let (field, center) = sphere_field(n, radius);
        let mesh = extract(&field, shape(n, n, n), 0.0).unwrap();

        assert!(
            mesh.num_triangles() > 100,
            "Expected >100 triangles, got {}",
            mesh.num_triangles()
        );
        assert_eq!(mesh.positions.len(), mesh.normals.len());

        for t in &mesh.triangles {
            for &idx in t {
                assert!((idx as usize) < mesh.positions.len());
            }
        }

        for (p, normal) in mesh.positions.iter().zip(&mesh.normals) {
            let dist = (*p - center).length();
            assert!(
                (dist - radius).abs() < 1.0,
                "Vertex {p:?} is {dist} from center (radius {radius})"
            );
            assert!((normal.length() - 1.0).abs() < 0.01);
            // field grows outwards, so normals point away from the center
            assert!(normal.dot(*p - center) > 0.0);
        }
    }

    #[test]
    fn test_vertex_moves_continuously_with_level() {
        let grid = shape(2, 2, 2);
        let mut field = vec![1.0_f32; 8];
        field[0] = 0.0;
        let a = extract(&field, grid, 0.5).unwrap();
        let b = extract(&field, grid, 0.5001).unwrap();
        assert_eq!(a.positions.len(), 1);
        assert!((a.positions[0] - b.positions[0]).length() < 1e-3);
    }

    #[test]
    fn test_world_transform_centers_unit_cell() {
        // two opposite corners on either side of the level
        let grid = shape(2, 2, 2);
        let mut field = vec![0.5_f32; 8];
        field[grid.index(0, 0, 0)] = 0.0;
        field[grid.index(1, 1, 1)] = 1.0;
        let bounds = Bounds::UNIT;
        let transform = GridTransform::new(&bounds, &grid);
        let mesh = extract(&field, grid, 0.25).unwrap().mapped(|p| transform.apply(p));

        let (lo, hi) = mesh.bounding_box().unwrap();
        assert!(lo.min_element() >= -0.5 && hi.max_element() <= 0.5);
    }

    #[test]
    fn test_transform_matches_matrix() {
        let grid = shape(3, 5, 2);
        let bounds = Bounds::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 2.0, 4.0));
        let transform = GridTransform::new(&bounds, &grid);
        assert_eq!(transform.scale, Vec3::new(2.0, 0.5, 2.0));
        assert_eq!(transform.offset, Vec3::new(-2.0, -1.0, -1.0));
        let p = Vec3::new(1.0, 4.0, 1.0);
        let via_matrix = transform.to_matrix().transform_point3(p);
        assert!((via_matrix - transform.apply(p)).length() < 1e-6);
        assert_eq!(transform.apply(Vec3::new(2.0, 4.0, 1.0)), Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_flat_axis_is_empty() {
        let field = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mesh = extract(&field, shape(1, 3, 3), 0.5).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_levels_are_independent() {
        let (field, _) = sphere_field(12, 3.0);
        let meshes = extract_levels(&field, shape(12, 12, 12), &[-1.0, 0.0, 100.0]).unwrap();
        assert_eq!(meshes.len(), 3);
        assert!(!meshes[0].is_empty());
        assert!(meshes[1].num_triangles() > meshes[0].num_triangles());
        assert!(meshes[2].is_empty());
    }

    #[test]
    fn test_wrong_field_size() {
        let err = extract(&[0.0; 10], shape(3, 3, 3), 0.0);
        assert!(matches!(
            err,
            Err(VolumError::SizeMismatch {
                expected: 27,
                actual: 10
            })
        ));
    }
}
