use crate::curve::Curve;
use crate::host::ObjectId;
use crate::mesh::Mesh;
use crate::path::SegmentLocator;
use crate::spacing::{SpacingGroups, TemplateSpan};
use crate::template::TemplateLibrary;
use crate::warp::{warp_mesh, WarpParams};
use glam::Mat4;
use std::ops::Range;

/// Template copies shorter than this are treated as empty.
const MIN_TEMPLATE_LENGTH: f32 = 1e-4;

/// Snapshot taken after a curve has been fully processed. Seeding a build
/// from `states[i]` reproduces exactly what a full build does from curve
/// `i + 1` on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildState {
    pub spacing_groups: SpacingGroups,
    /// Path distance where the next template copy starts.
    pub mesh_z_offset: f32,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSurface {
    pub id: ObjectId,
    pub name: String,
    pub template: String,
    /// Surface space → track space; the warped mesh is expressed in surface space.
    pub transform: Mat4,
    pub z_offset: f32,
    pub mesh: Mesh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: ObjectId,
    pub name: String,
    pub group: usize,
    pub z: f32,
    /// Object space → track space.
    pub transform: Mat4,
}

/// Everything generated for one curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveGeometry {
    pub surfaces: Vec<GeneratedSurface>,
    pub placements: Vec<Placement>,
}

impl CurveGeometry {
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.surfaces.iter().map(|s| s.id).chain(self.placements.iter().map(|p| p.id))
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty() && self.placements.is_empty()
    }
}

/// Recoverable authoring problem found while building.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub curve: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildReport {
    pub range: Range<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) struct BuildContext<'a> {
    pub curves: &'a [Curve],
    pub locator: SegmentLocator<'a>,
    pub templates: &'a TemplateLibrary,
}

pub(crate) struct BuildOutput {
    /// Geometry for every curve in the requested range, in curve order.
    pub geometry: Vec<(usize, CurveGeometry)>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Builder<'a, 'b> {
    ctx: &'b BuildContext<'a>,
    states: &'b mut [Option<BuildState>],
    range: Range<usize>,
    work: BuildState,
    /// Next curve whose snapshot has not been persisted.
    tracked: usize,
    /// Next curve whose template assignment has not been applied.
    applied: usize,
    next_id: &'b mut u64,
    output: BuildOutput,
}

impl Builder<'_, '_> {
    fn diagnose(&mut self, curve: usize, message: String) {
        if !self.range.contains(&curve) {
            return;
        }
        log::warn!("curve {curve}: {message}");
        self.output.diagnostics.push(Diagnostic { curve: Some(curve), message });
    }

    fn allocate_id(&mut self) -> ObjectId {
        *self.next_id += 1;
        ObjectId(*self.next_id)
    }

    fn geometry_mut(&mut self, curve: usize) -> Option<&mut CurveGeometry> {
        let slot = curve.checked_sub(self.range.start)?;
        self.output.geometry.get_mut(slot).map(|(_, geometry)| geometry)
    }

    /// Applies template assignments of every curve up to and including `curve`.
    fn apply_templates_through(&mut self, curve: usize) {
        let ctx = self.ctx;
        while self.applied <= curve && self.applied < ctx.curves.len() {
            let index = self.applied;
            self.applied += 1;
            let Some(name) = ctx.curves[index].template.as_ref() else {
                continue;
            };
            if ctx.templates.has(name) {
                self.work.template = Some(name.clone());
            } else {
                self.diagnose(index, format!("unknown template '{name}', keeping the inherited template"));
            }
        }
    }

    /// Persists the working state for every curve before `curve`.
    fn persist_before(&mut self, curve: usize) {
        let limit = curve.min(self.states.len());
        while self.tracked < limit {
            self.apply_templates_through(self.tracked);
            self.states[self.tracked] = Some(self.work.clone());
            self.tracked += 1;
        }
    }

    fn run(mut self) -> BuildOutput {
        let ctx = self.ctx;
        let path = ctx.locator.path();
        // Curves below this were skipped and must not be revisited.
        let mut min_curve = self.tracked;

        while self.work.mesh_z_offset < path.length() {
            let Some(found) = path.curve_at(self.work.mesh_z_offset) else {
                break;
            };
            let curve_index = found.max(min_curve);
            if curve_index >= ctx.curves.len() {
                break;
            }
            self.persist_before(curve_index);
            if curve_index >= self.range.end {
                return self.output;
            }
            self.apply_templates_through(curve_index);

            let curve = &ctx.curves[curve_index];
            let template = self.work.template.as_deref().and_then(|name| ctx.templates.get(name));
            let span = template.and_then(|t| t.span()).filter(|(min, max)| max - min > MIN_TEMPLATE_LENGTH);
            let (Some(template), Some((min_z, max_z)), false) = (template, span, curve.is_jump) else {
                if !curve.is_jump {
                    if let Some(name) = self.work.template.clone() {
                        self.diagnose(curve_index, format!("template '{name}' has no surface span, skipping curve"));
                    }
                }
                self.work.mesh_z_offset = path.next_curve_start_z(curve_index).max(self.work.mesh_z_offset);
                min_curve = curve_index + 1;
                continue;
            };

            let emit = self.range.contains(&curve_index);
            let start_z = self.work.mesh_z_offset;
            let length = max_z - min_z;

            if emit {
                for surface in &template.surfaces {
                    let params = WarpParams {
                        z_offset: start_z,
                        template_min_z: min_z,
                        mesh_to_template: surface.transform,
                        track_to_mesh: surface.transform.inverse(),
                    };
                    let (mesh, _) = warp_mesh(&surface.mesh, &ctx.locator, &params);
                    let generated = GeneratedSurface {
                        id: self.allocate_id(),
                        name: surface.name.clone(),
                        template: template.name.clone(),
                        transform: surface.transform,
                        z_offset: start_z,
                        mesh,
                    };
                    if let Some(geometry) = self.geometry_mut(curve_index) {
                        geometry.surfaces.push(generated);
                    }
                }
            }

            let span = TemplateSpan { start_z, end_z: start_z + length };
            self.work.spacing_groups.begin_template();
            for object in &template.spaced {
                match self.work.spacing_groups.place(object, template, span, &ctx.locator) {
                    Ok(placed) if emit => {
                        for placement in placed {
                            let placement = Placement {
                                id: self.allocate_id(),
                                name: placement.name,
                                group: placement.group,
                                z: placement.z,
                                transform: placement.transform,
                            };
                            if let Some(geometry) = self.geometry_mut(curve_index) {
                                geometry.placements.push(placement);
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(err) => self.diagnose(
                        curve_index,
                        format!("'{}': {err}, skipping its placements", object.name),
                    ),
                }
            }
            self.work.spacing_groups.end_template();
            self.work.mesh_z_offset = start_z + length;
        }

        // End of path: every remaining curve is fully processed.
        self.persist_before(ctx.curves.len());
        self.output
    }
}

/// Generates geometry for curves in `range`, seeding from the nearest
/// persisted snapshot at or before `range.start - 1` and persisting snapshots
/// for every curve it walks past.
pub(crate) fn generate(
    ctx: &BuildContext<'_>,
    states: &mut [Option<BuildState>],
    range: Range<usize>,
    next_id: &mut u64,
) -> BuildOutput {
    let mut seed = range.start.min(states.len());
    while seed > 0 && states[seed - 1].is_none() {
        seed -= 1;
    }
    let work = match seed.checked_sub(1).and_then(|i| states[i].clone()) {
        Some(state) => state,
        None => BuildState::default(),
    };
    log::debug!("building curves {}..{} seeded from curve {seed}", range.start, range.end);

    let geometry = range.clone().map(|index| (index, CurveGeometry::default())).collect();
    let builder = Builder {
        ctx,
        states,
        range,
        work,
        tracked: seed,
        applied: seed,
        next_id,
        output: BuildOutput { geometry, diagnostics: Vec::new() },
    };
    builder.run()
}
