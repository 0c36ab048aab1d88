//! Indexed triangle meshes.

use glam::Vec3;

/// An indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex unit normals (area-weighted average of incident faces).
    pub normals: Vec<Vec3>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh and computes its normals.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            triangles,
        };
        mesh.compute_normals();
        mesh
    }

    /// Returns the number of triangles in the mesh.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle indices as a flat list, three per triangle.
    #[must_use]
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    /// Axis-aligned bounding box of the vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Maps every vertex through `f` and recomputes the normals.
    #[must_use]
    pub fn mapped(mut self, f: impl Fn(Vec3) -> Vec3) -> Self {
        for p in &mut self.positions {
            *p = f(*p);
        }
        self.compute_normals();
        self
    }

    /// Translates the mesh so its bounding box is centered at the origin.
    #[must_use]
    pub fn recentered(self) -> Self {
        match self.bounding_box() {
            Some((lo, hi)) => {
                let center = (lo + hi) * 0.5;
                self.mapped(|p| p - center)
            }
            None => self,
        }
    }

    /// Recomputes vertex normals from the triangles.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    pub fn compute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), Vec3::ZERO);

        for &[a, b, c] in &self.triangles {
            let pa = self.positions[a as usize];
            let pb = self.positions[b as usize];
            let pc = self.positions[c as usize];
            let n = (pb - pa).cross(pc - pa);
            self.normals[a as usize] += n;
            self.normals[b as usize] += n;
            self.normals[c as usize] += n;
        }

        for normal in &mut self.normals {
            let len = normal.length();
            if len > 1e-12 {
                *normal /= len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_normals_follow_winding() {
        let mesh = quad();
        for n in &mesh.normals {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_area_weighting() {
        // a big and a tiny face meeting at vertex 0 at right angles
        let mesh = TriangleMesh::new(
            vec![
                Vec3::ZERO,
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::new(0.0, 0.0, 0.1),
                Vec3::new(0.0, 0.1, 0.0),
            ],
            vec![[0, 1, 2], [0, 3, 4]],
        );
        // dominated by the large +z face
        assert!(mesh.normals[0].z > 0.99);
    }

    #[test]
    fn test_recentered() {
        let mesh = quad().recentered();
        let (lo, hi) = mesh.bounding_box().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.flat_indices(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = TriangleMesh::default().recentered();
        assert!(mesh.is_empty());
        assert!(mesh.bounding_box().is_none());
    }
}
