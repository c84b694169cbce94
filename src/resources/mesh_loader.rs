//! Wavefront OBJ import through `tobj`.

use std::path::Path;

use glam::{Vec2, Vec3};
use tobj::LoadOptions;

use super::mesh::{MeshVertex, RawMesh};

pub struct MeshLoader;

impl MeshLoader {
    /// Imports every model in `path` as one [`RawMesh`] per submesh.
    ///
    /// Faces are triangulated and re-indexed to a single index stream; missing
    /// normals are smoothed, tangents are always generated and V is flipped
    /// to the top-left texture origin. Import failure is logged and yields an
    /// empty list.
    #[must_use]
    pub fn load(path: &Path) -> Vec<RawMesh> {
        let options = LoadOptions {
            // one index per vertex, positions/normals/uvs re-indexed together
            single_index: true,
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
        };

        let models = match tobj::load_obj(path, &options) {
            Ok((models, _materials)) => models,
            Err(err) => {
                log::error!("MeshLoader: failed to import '{}': {err}", path.display());
                return Vec::new();
            }
        };

        models
            .iter()
            .filter_map(|model| {
                let mesh = convert(&model.mesh);
                if mesh.is_empty() {
                    log::warn!(
                        "MeshLoader: skipping empty submesh '{}' in '{}'",
                        model.name,
                        path.display()
                    );
                    None
                } else {
                    Some(mesh)
                }
            })
            .collect()
    }
}

fn convert(mesh: &tobj::Mesh) -> RawMesh {
    let count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_uvs = mesh.texcoords.len() / 2 == count;

    let vertices = (0..count)
        .map(|i| {
            let position = Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]);
            let normal = if has_normals {
                Vec3::from_slice(&mesh.normals[i * 3..i * 3 + 3])
            } else {
                Vec3::ZERO
            };
            let uv = if has_uvs {
                Vec2::new(mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1])
            } else {
                Vec2::ZERO
            };
            MeshVertex::new(position, normal, uv, Vec3::ZERO)
        })
        .collect();

    let mut raw = RawMesh::new(vertices, mesh.indices.clone());
    if !has_normals {
        raw.compute_smooth_normals();
    }
    raw.compute_tangents();
    raw
}
