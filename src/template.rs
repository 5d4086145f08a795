use crate::document::{TransformData, Vec3Data};
use crate::mesh::Mesh;
use anyhow::{bail, Context, Result};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Mesh warped continuously along the path.
#[derive(Debug, Clone)]
pub struct TemplateSurface {
    pub name: String,
    pub mesh: Mesh,
    /// Mesh space → template space.
    pub transform: Mat4,
    /// Main surfaces define how far the template advances along the path.
    pub is_main: bool,
}

/// Object repeated at fixed intervals by a spacing group.
#[derive(Debug, Clone)]
pub struct SpacedObject {
    pub name: String,
    pub group: usize,
    /// Object space → template space. The z translation is replaced by the
    /// group's placement distance.
    pub transform: Mat4,
    /// Placements are skipped where |pitch| exceeds this, in degrees.
    pub max_pitch: f32,
    /// Placements are skipped where |bank| exceeds this, in degrees.
    pub max_bank: f32,
    /// Keep the object's up axis aligned with world up.
    pub vertical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingGroupSettings {
    pub spacing: f32,
    #[serde(default)]
    pub spacing_before: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Template {
    pub name: String,
    pub surfaces: Vec<TemplateSurface>,
    pub spaced: Vec<SpacedObject>,
    pub spacing_groups: BTreeMap<usize, SpacingGroupSettings>,
}

impl SpacedObject {
    pub fn new(name: impl Into<String>, group: usize, transform: Mat4) -> Self {
        Self { name: name.into(), group, transform, max_pitch: 90.0, max_bank: 180.0, vertical: false }
    }
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_surface(mut self, name: impl Into<String>, mesh: Mesh, transform: Mat4, is_main: bool) -> Self {
        self.surfaces.push(TemplateSurface { name: name.into(), mesh, transform, is_main });
        self
    }

    pub fn with_spaced(mut self, object: SpacedObject) -> Self {
        self.spaced.push(object);
        self
    }

    pub fn with_spacing_group(mut self, group: usize, spacing: f32, spacing_before: f32) -> Self {
        self.spacing_groups.insert(group, SpacingGroupSettings { spacing, spacing_before });
        self
    }

    /// Template-space z-extent of the main surfaces, or of every surface when
    /// none is marked main.
    pub fn span(&self) -> Option<(f32, f32)> {
        let any_main = self.surfaces.iter().any(|s| s.is_main);
        self.surfaces
            .iter()
            .filter(|s| s.is_main || !any_main)
            .filter_map(|s| s.mesh.z_extent(s.transform))
            .reduce(|(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)))
    }

    pub fn length(&self) -> f32 {
        self.span().map(|(min, max)| max - min).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn with(mut self, template: Template) -> Self {
        self.insert(template);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|k| k.as_str())
    }

    /// Loads a JSON manifest. glTF paths are resolved relative to the
    /// manifest's directory.
    pub fn load_manifest(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read template manifest {}", path.display()))?;
        let manifest: TemplateManifest = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse template manifest {}", path.display()))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        manifest.into_library(&base)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSource {
    Gltf { path: PathBuf },
    Strip { width: f32, length: f32, #[serde(default = "default_strip_rows")] rows: u32 },
    Box { size: Vec3Data },
}

const fn default_strip_rows() -> u32 {
    1
}

impl MeshSource {
    pub fn load(&self, base: &Path) -> Result<Mesh> {
        match self {
            MeshSource::Gltf { path } => Mesh::load_gltf(base.join(path)),
            MeshSource::Strip { width, length, rows } => {
                if *length <= 0.0 {
                    bail!("strip length must be positive, got {length}");
                }
                Ok(Mesh::strip(*width, *length, *rows))
            }
            MeshSource::Box { size } => Ok(Mesh::box_mesh((*size).into())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceDef {
    pub name: String,
    pub mesh: MeshSource,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default)]
    pub main: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacedObjectDef {
    pub name: String,
    pub group: usize,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default = "default_max_pitch")]
    pub max_pitch: f32,
    #[serde(default = "default_max_bank")]
    pub max_bank: f32,
    #[serde(default)]
    pub vertical: bool,
}

const fn default_max_pitch() -> f32 {
    90.0
}

const fn default_max_bank() -> f32 {
    180.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default)]
    pub surfaces: Vec<SurfaceDef>,
    #[serde(default)]
    pub spaced: Vec<SpacedObjectDef>,
    #[serde(default)]
    pub spacing_groups: BTreeMap<usize, SpacingGroupSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateManifest {
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
}

impl TemplateManifest {
    pub fn into_library(self, base: &Path) -> Result<TemplateLibrary> {
        let mut library = TemplateLibrary::new();
        for def in self.templates {
            let mut template = Template::new(def.name.clone());
            for surface in def.surfaces {
                let mesh = surface
                    .mesh
                    .load(base)
                    .with_context(|| format!("template '{}' surface '{}'", def.name, surface.name))?;
                template.surfaces.push(TemplateSurface {
                    name: surface.name,
                    mesh,
                    transform: surface.transform.to_mat4(),
                    is_main: surface.main,
                });
            }
            template.spaced = def
                .spaced
                .into_iter()
                .map(|object| SpacedObject {
                    name: object.name,
                    group: object.group,
                    transform: object.transform.to_mat4(),
                    max_pitch: object.max_pitch,
                    max_bank: object.max_bank,
                    vertical: object.vertical,
                })
                .collect();
            template.spacing_groups = def.spacing_groups;
            library.insert(template);
        }
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn span_prefers_main_surfaces() {
        let template = Template::new("road")
            .with_surface("road", Mesh::strip(6.0, 10.0, 4), Mat4::IDENTITY, true)
            .with_surface("kerb", Mesh::strip(1.0, 12.0, 4), Mat4::from_translation(Vec3::new(3.0, 0.0, -1.0)), false);
        assert_eq!(template.span(), Some((0.0, 10.0)));
        assert_eq!(template.length(), 10.0);

        let unflagged = Template::new("plain")
            .with_surface("a", Mesh::strip(6.0, 10.0, 4), Mat4::IDENTITY, false)
            .with_surface("b", Mesh::strip(1.0, 12.0, 4), Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0)), false);
        assert_eq!(unflagged.span(), Some((-1.0, 11.0)));
        assert_eq!(Template::new("empty").length(), 0.0);
    }

    #[test]
    fn manifest_builds_library_from_builtin_meshes() {
        let json = r#"{
            "templates": [{
                "name": "road",
                "surfaces": [{
                    "name": "deck",
                    "mesh": { "kind": "strip", "width": 8.0, "length": 20.0, "rows": 10 },
                    "main": true
                }],
                "spaced": [{
                    "name": "post",
                    "group": 0,
                    "transform": { "translation": { "x": 4.0, "y": 0.0, "z": 0.0 } },
                    "vertical": true
                }],
                "spacing_groups": { "0": { "spacing": 5.0 } }
            }]
        }"#;
        let manifest: TemplateManifest = serde_json::from_str(json).expect("parse manifest");
        let library = manifest.into_library(Path::new(".")).expect("build library");
        let road = library.get("road").expect("road template");
        assert_eq!(road.length(), 20.0);
        assert_eq!(road.spaced[0].max_pitch, 90.0);
        assert!(road.spaced[0].vertical);
        assert_eq!(road.spacing_groups[&0], SpacingGroupSettings { spacing: 5.0, spacing_before: 0.0 });
    }
}
