//! CPU-side triangle meshes
//!
//! Geometry is immutable once built and shared between scene instances through
//! `Arc`. The renderer uploads it lazily, keyed by that `Arc`.

use cgmath::{InnerSpace, Vector3};

use super::vertex::Vertex3D;
use crate::gfx::picking::AABB;

#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: AABB,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays as produced by OBJ loaders.
    ///
    /// Normals are computed per face when `normals` does not match `positions`.
    pub fn new(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> Self {
        let computed;
        let normals = if !normals.is_empty() && normals.len() == positions.len() {
            normals
        } else {
            computed = Self::calculate_face_normals(positions, &indices);
            computed.as_slice()
        };

        let vertices: Vec<Vertex3D> = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Self::from_vertices(vertices, indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let bounds = AABB::from_points(vertices.iter().map(|v| Vector3::from(v.position)));
        Self {
            vertices,
            indices,
            bounds,
        }
    }

    /// Axis-aligned box centred on the origin with the given half extents.
    pub fn cuboid(half: [f32; 3]) -> Self {
        let [hx, hy, hz] = half;
        // (normal, u axis, v axis) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = [
                    (n[0] + u[0] * su + v[0] * sv) * hx,
                    (n[1] + u[1] * su + v[1] * sv) * hy,
                    (n[2] + u[2] * su + v[2] * sv) * hz,
                ];
                vertices.push(Vertex3D {
                    position: corner,
                    normal: n,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_vertices(vertices, indices)
    }

    /// Unit square in the XZ plane facing +Y, spanning -1..1 on both axes.
    pub fn ground_plane() -> Self {
        let vertices = [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]]
            .map(|[x, z]| Vertex3D {
                position: [x, 0.0, z],
                normal: [0.0, 1.0, 0.0],
            })
            .to_vec();
        Self::from_vertices(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Flat normals accumulated per vertex from the faces that use it.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let mut normals = vec![0.0f32; positions.len()];
        let vertex = |i: u32| {
            let i = i as usize * 3;
            Vector3::new(positions[i], positions[i + 1], positions[i + 2])
        };

        for tri in indices.chunks_exact(3) {
            if tri.iter().any(|&i| (i as usize) * 3 + 2 >= positions.len()) {
                continue;
            }
            let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
            let face = (b - a).cross(c - a);
            for &i in tri {
                let i = i as usize * 3;
                normals[i] += face.x;
                normals[i + 1] += face.y;
                normals[i + 2] += face.z;
            }
        }

        for n in normals.chunks_exact_mut(3) {
            let v = Vector3::new(n[0], n[1], n[2]);
            let len = v.magnitude();
            if len > f32::EPSILON {
                n[0] = v.x / len;
                n[1] = v.y / len;
                n[2] = v.z / len;
            } else {
                n.copy_from_slice(&[0.0, 1.0, 0.0]);
            }
        }

        normals
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Bounding box in mesh space.
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3
    }

    /// Triangles in mesh space. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let get = |i: u32| self.vertices.get(i as usize).map(|v| Vector3::from(v.position));
            Some([get(tri[0])?, get(tri[1])?, get(tri[2])?])
        })
    }
}
