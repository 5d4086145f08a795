use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use gltf::mesh::Mode;
use std::path::Path;

const DEFAULT_TANGENT: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// GPU-layout vertex. Plain old data so whole meshes can be compared as bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, tangent: Vec4, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tangent: tangent.to_array(),
            uv: uv.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

/// Axis-aligned bounds of a mesh's vertex positions.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, bounds }
    }

    /// Flat road-like strip on the xz plane, `width` across x and running from
    /// z = 0 to z = `length`, split into `rows` quads along z.
    pub fn strip(width: f32, length: f32, rows: u32) -> Self {
        let rows = rows.max(1);
        let half = width * 0.5;
        let mut vertices = Vec::with_capacity(((rows + 1) * 2) as usize);
        for row in 0..=rows {
            let v = row as f32 / rows as f32;
            let z = length * v;
            for (x, u) in [(-half, 0.0), (half, 1.0)] {
                vertices.push(MeshVertex::new(Vec3::new(x, 0.0, z), Vec3::Y, DEFAULT_TANGENT, Vec2::new(u, v)));
            }
        }
        let mut indices = Vec::with_capacity((rows * 6) as usize);
        for row in 0..rows {
            let base = row * 2;
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
        }
        let mut mesh = Self::new(vertices, indices);
        mesh.recalculate();
        mesh
    }

    /// Axis-aligned box centred on the origin, four vertices per face.
    pub fn box_mesh(size: Vec3) -> Self {
        // (normal, u, v) with u × v == normal so every face winds outward.
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let half = size * 0.5;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in FACES {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = (normal + u * su + v * sv) * half;
                let uv = Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5);
                vertices.push(MeshVertex::new(corner, normal, DEFAULT_TANGENT, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        let mut mesh = Self::new(vertices, indices);
        mesh.recalculate();
        mesh
    }

    /// Loads the first mesh of a glTF file. Triangle primitives are merged
    /// into one vertex/index list; missing normals are generated.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (document, buffers, _) =
            gltf::import(path).with_context(|| format!("Failed to load glTF {}", path.display()))?;
        let source = document.meshes().next().ok_or_else(|| anyhow!("{} contains no meshes", path.display()))?;

        let mut mesh = Mesh::new(Vec::new(), Vec::new());
        for primitive in source.primitives().filter(|p| p.mode() == Mode::Triangles) {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                bail!("primitive {} in {} has no positions", primitive.index(), path.display());
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(read) => read.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let normals = reader
                .read_normals()
                .map(|normals| normals.map(Vec3::from_array).collect::<Vec<_>>())
                .filter(|normals| normals.len() == positions.len())
                .unwrap_or_else(|| compute_normals(&positions, &indices));
            let uvs: Vec<Vec2> =
                reader.read_tex_coords(0).map(|uvs| uvs.into_f32().map(Vec2::from_array).collect()).unwrap_or_default();

            let base = mesh.vertices.len() as u32;
            for (i, position) in positions.iter().enumerate() {
                let uv = uvs.get(i).copied().unwrap_or(Vec2::ZERO);
                mesh.vertices.push(MeshVertex::new(*position, normals[i].normalize_or_zero(), DEFAULT_TANGENT, uv));
            }
            mesh.indices.extend(indices.into_iter().map(|index| index + base));
        }

        if mesh.vertices.is_empty() {
            bail!("{} contains no triangle primitives", path.display());
        }
        mesh.recalculate();
        Ok(mesh)
    }

    /// Rebuilds tangents and bounds after the vertex positions or normals were
    /// rewritten.
    pub fn recalculate(&mut self) {
        compute_tangents(&mut self.vertices, &self.indices);
        self.bounds = MeshBounds::from_vertices(&self.vertices);
    }

    /// z-extent (min, max) of the mesh after mapping it through `transform`.
    pub fn z_extent(&self, transform: Mat4) -> Option<(f32, f32)> {
        self.vertices.iter().map(|v| transform.transform_point3(v.position()).z).fold(None, |acc, z| {
            Some(match acc {
                None => (z, z),
                Some((min, max)) => (min.min(z), max.max(z)),
            })
        })
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Complete, in-range triangles of an index list.
fn triangles(indices: &[u32], vertex_count: usize) -> impl Iterator<Item = [usize; 3]> + '_ {
    indices.chunks_exact(3).filter_map(move |tri| {
        let tri = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        tri.iter().all(|&i| i < vertex_count).then_some(tri)
    })
}

/// Area-weighted vertex normals; isolated vertices point up.
fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for [a, b, c] in triangles(indices, positions.len()) {
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        for i in [a, b, c] {
            normals[i] += face;
        }
    }
    normals.into_iter().map(|normal| normal.try_normalize().unwrap_or(Vec3::Y)).collect()
}

/// Per-vertex tangents from UV gradients, Gram-Schmidt against the normal.
/// `w` carries the bitangent handedness.
fn compute_tangents(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut gradients = vec![(Vec3::ZERO, Vec3::ZERO); vertices.len()];
    for [a, b, c] in triangles(indices, vertices.len()) {
        let edge1 = vertices[b].position() - vertices[a].position();
        let edge2 = vertices[c].position() - vertices[a].position();
        let duv1 = vertices[b].uv() - vertices[a].uv();
        let duv2 = vertices[c].uv() - vertices[a].uv();
        let det = duv1.perp_dot(duv2);
        if det.abs() < 1e-8 {
            continue;
        }
        let along_u = (edge1 * duv2.y - edge2 * duv1.y) / det;
        let along_v = (edge2 * duv1.x - edge1 * duv2.x) / det;
        for i in [a, b, c] {
            gradients[i].0 += along_u;
            gradients[i].1 += along_v;
        }
    }

    for (vertex, (along_u, along_v)) in vertices.iter_mut().zip(gradients) {
        let normal = vertex.normal();
        let tangent = match (along_u - normal * normal.dot(along_u)).try_normalize() {
            Some(tangent) => {
                let handedness = if normal.cross(along_u).dot(along_v) < 0.0 { -1.0 } else { 1.0 };
                tangent.extend(handedness)
            }
            None => DEFAULT_TANGENT,
        };
        vertex.tangent = tangent.to_array();
    }
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        let mut positions = vertices.iter().map(MeshVertex::position);
        let Some(first) = positions.next() else {
            return Self::default();
        };
        let (min, max) = positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self { min, max }
    }
}
