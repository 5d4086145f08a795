use crate::build::{self, BuildContext, BuildReport, BuildState, CurveGeometry};
use crate::config::TrackConfig;
use crate::curve::{Curve, CurveKind, CurveRuntimeInfo};
use crate::document::TrackDocument;
use crate::error::TrackError;
use crate::host::{HostServices, NoopHost, ObjectId, ObjectRef};
use crate::path::{build_segments, OverrunPolicy, SegmentLocator, SegmentPath, SegmenterSettings};
use crate::template::TemplateLibrary;
use crate::wrap_degrees;
use glam::Vec3;
use std::ops::Range;

/// Owns the curve list and everything derived from it: the segment path,
/// per-curve build snapshots, generated geometry and runtime info.
///
/// Derived data is only refreshed by explicit calls. Edits mark the path dirty
/// and the rebuild entry points refresh it before generating.
pub struct Track {
    config: TrackConfig,
    curves: Vec<Curve>,
    /// Host identity of each curve; survives renumbering.
    curve_ids: Vec<ObjectId>,
    templates: TemplateLibrary,
    path: SegmentPath,
    dirty: bool,
    build_states: Vec<Option<BuildState>>,
    geometry: Vec<CurveGeometry>,
    runtime_info: Vec<CurveRuntimeInfo>,
    pending: Option<Range<usize>>,
    host: Box<dyn HostServices>,
    next_object_id: u64,
}

impl Track {
    pub fn new(config: TrackConfig) -> Self {
        Self::with_host(config, NoopHost)
    }

    pub fn with_host(config: TrackConfig, host: impl HostServices + 'static) -> Self {
        let settings = segmenter_settings(&config);
        Self {
            config,
            curves: Vec::new(),
            curve_ids: Vec::new(),
            templates: TemplateLibrary::new(),
            path: build_segments(&[], &settings),
            dirty: false,
            build_states: Vec::new(),
            geometry: Vec::new(),
            runtime_info: Vec::new(),
            pending: None,
            host: Box::new(host),
            next_object_id: 0,
        }
    }

    pub fn from_document(document: &TrackDocument) -> Self {
        let mut track = Self::new(document.config.clone());
        for curve in document.to_curves() {
            track.add_curve(curve);
        }
        track
    }

    pub fn to_document(&self) -> TrackDocument {
        TrackDocument::from_curves(self.config.clone(), &self.curves)
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TrackConfig) -> Result<(), TrackError> {
        config.validate()?;
        self.host.object_changing(ObjectRef::Track);
        self.config = config;
        self.invalidate(0);
        Ok(())
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn set_templates(&mut self, templates: TemplateLibrary) {
        self.templates = templates;
        self.invalidate(0);
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn curve(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Stable host handle of the curve currently at `index`.
    pub fn curve_id(&self, index: usize) -> Option<ObjectId> {
        self.curve_ids.get(index).copied()
    }

    // --- editing -----------------------------------------------------------

    pub fn add_curve(&mut self, curve: Curve) -> usize {
        let index = self.curves.len();
        self.attach_curve(index, curve);
        index
    }

    pub fn insert_curve(&mut self, index: usize, curve: Curve) -> Result<usize, TrackError> {
        if index > self.curves.len() {
            return Err(TrackError::CurveOutOfBounds { index, count: self.curves.len() });
        }
        self.attach_curve(index, curve);
        Ok(index)
    }

    fn attach_curve(&mut self, index: usize, curve: Curve) {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        self.curves.insert(index, curve);
        self.curve_ids.insert(index, id);
        self.build_states.insert(index, None);
        self.geometry.insert(index, CurveGeometry::default());
        self.renumber();
        self.host.object_created(ObjectRef::Curve(id));
        self.host.reparent(ObjectRef::Curve(id), ObjectRef::Track);
        self.invalidate(index);
    }

    pub fn remove_curve(&mut self, index: usize) -> Result<Curve, TrackError> {
        if index >= self.curves.len() {
            return Err(TrackError::CurveOutOfBounds { index, count: self.curves.len() });
        }
        let geometry = self.geometry.remove(index);
        for id in geometry.object_ids() {
            self.host.object_destroyed(ObjectRef::Generated(id));
        }
        let id = self.curve_ids.remove(index);
        self.host.object_destroyed(ObjectRef::Curve(id));
        self.build_states.remove(index);
        let curve = self.curves.remove(index);
        self.renumber();
        self.invalidate(index);
        Ok(curve)
    }

    /// Mutates one curve in place. The index is restored afterwards.
    pub fn update_curve(&mut self, index: usize, edit: impl FnOnce(&mut Curve)) -> Result<(), TrackError> {
        let count = self.curves.len();
        let Some(curve) = self.curves.get_mut(index) else {
            return Err(TrackError::CurveOutOfBounds { index, count });
        };
        self.host.object_changing(ObjectRef::Curve(self.curve_ids[index]));
        edit(curve);
        curve.index = index;
        self.invalidate(index);
        Ok(())
    }

    fn renumber(&mut self) {
        for (index, curve) in self.curves.iter_mut().enumerate() {
            curve.index = index;
        }
    }

    // --- derived data ------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the segment path stale and drops every build snapshot an edit at
    /// `from_curve` can reach. Bank windows span two curves back.
    pub fn invalidate(&mut self, from_curve: usize) {
        self.dirty = true;
        let first = from_curve.saturating_sub(2).min(self.build_states.len());
        for state in &mut self.build_states[first..] {
            *state = None;
        }
    }

    /// Recomputes the segment path, writes derived curve data back and
    /// re-derives the runtime info.
    pub fn update_segments(&mut self) -> Result<(), TrackError> {
        self.config.validate()?;
        self.path = build_segments(&self.curves, &segmenter_settings(&self.config));
        for (curve, extent) in self.curves.iter_mut().zip(self.path.extents()) {
            match curve.kind {
                CurveKind::Bezier => curve.length = extent.length,
                CurveKind::Arc => curve.end_position = extent.end_position,
            }
        }
        self.runtime_info = self.derive_runtime_info();
        self.dirty = false;
        Ok(())
    }

    fn derive_runtime_info(&self) -> Vec<CurveRuntimeInfo> {
        let locator = self.locator();
        let respawn = &self.config.respawn;
        self.curves
            .iter()
            .zip(self.path.extents())
            .map(|(curve, extent)| {
                let middle = extent.start_z + extent.length * 0.5;
                let normal = locator.transform_at(middle).transform_vector3(Vec3::Y).normalize_or_zero();
                let respawn_transform = locator.transform_at(middle + respawn.z_offset);
                let (_, respawn_rotation, _) = respawn_transform.to_scale_rotation_translation();
                CurveRuntimeInfo {
                    normal,
                    respawn_position: respawn_transform.transform_point3(Vec3::new(0.0, respawn.height, 0.0)),
                    respawn_rotation,
                    is_jump: curve.is_jump,
                    can_respawn: curve.can_respawn,
                    z_offset: extent.start_z,
                }
            })
            .collect()
    }

    pub fn segment_path(&self) -> &SegmentPath {
        &self.path
    }

    pub fn locator(&self) -> SegmentLocator<'_> {
        SegmentLocator::new(&self.path, self.config.overrun, self.config.loop_seam_offset)
    }

    pub fn runtime_info(&self) -> &[CurveRuntimeInfo] {
        &self.runtime_info
    }

    pub fn geometry(&self, curve: usize) -> Option<&CurveGeometry> {
        self.geometry.get(curve)
    }

    pub fn build_state(&self, curve: usize) -> Option<&BuildState> {
        self.build_states.get(curve).and_then(Option::as_ref)
    }

    /// Nearest curve at or before `index` a player may respawn on.
    pub fn respawn_curve_for(&self, index: usize) -> Option<usize> {
        let last = self.curves.len().checked_sub(1)?;
        (0..=index.min(last)).rev().find(|&i| self.curves[i].can_respawn && !self.curves[i].is_jump)
    }

    // --- rebuilds ----------------------------------------------------------

    pub fn rebuild_all(&mut self) -> Result<BuildReport, TrackError> {
        self.pending = None;
        self.rebuild_range(0, self.curves.len())
    }

    /// Regenerates geometry for curves in `[start, end)`.
    pub fn rebuild_range(&mut self, start: usize, end: usize) -> Result<BuildReport, TrackError> {
        let count = self.curves.len();
        if count == 0 {
            return Err(TrackError::NoCurves);
        }
        if start > end || end > count {
            return Err(TrackError::InvalidRange { start, end, count });
        }
        if self.dirty {
            self.update_segments()?;
        }

        let ctx = BuildContext {
            curves: &self.curves,
            locator: SegmentLocator::new(&self.path, self.config.overrun, self.config.loop_seam_offset),
            templates: &self.templates,
        };
        let output = build::generate(&ctx, &mut self.build_states, start..end, &mut self.next_object_id);

        for (index, geometry) in output.geometry {
            let previous = std::mem::replace(&mut self.geometry[index], geometry);
            for id in previous.object_ids() {
                self.host.object_destroyed(ObjectRef::Generated(id));
            }
            let parent = ObjectRef::Curve(self.curve_ids[index]);
            for id in self.geometry[index].object_ids() {
                self.host.object_created(ObjectRef::Generated(id));
                self.host.reparent(ObjectRef::Generated(id), parent);
            }
        }
        Ok(BuildReport { range: start..end, diagnostics: output.diagnostics })
    }

    /// Queues a rebuild around `curve`, merged with anything already queued.
    ///
    /// `single_curve_only` is for edits that leave the curve's length and
    /// template alone, such as bank: the range then stops after the two
    /// curves whose bank window still reaches `curve`. Otherwise everything up to
    /// the end of the track is queued.
    pub fn schedule_rebuild(&mut self, curve: usize, single_curve_only: bool) {
        let count = self.curves.len();
        let start = self.rebuild_start_for(curve);
        let end = if single_curve_only { (curve + 3).min(count).max(curve + 1) } else { count.max(curve + 1) };
        self.pending = Some(match self.pending.take() {
            Some(pending) => pending.start.min(start)..pending.end.max(end),
            None => start..end,
        });
    }

    /// First curve whose geometry can change when `curve` is edited: the
    /// previous curve (its segments bank towards `curve`), extended back to
    /// every curve owning a template copy that runs into those segments.
    fn rebuild_start_for(&self, curve: usize) -> usize {
        let mut start = curve.saturating_sub(1).min(self.curves.len());
        if start == 0 {
            return 0;
        }
        // Where the segments of the first affected curve begin.
        let reach = self.path.next_curve_start_z(start - 1);
        while start > 0 {
            let reaches_in = match self.build_state(start - 1) {
                Some(state) => state.mesh_z_offset >= reach,
                None => true,
            };
            if !reaches_in {
                break;
            }
            start -= 1;
        }
        start
    }

    pub fn pending_rebuild(&self) -> Option<Range<usize>> {
        self.pending.clone()
    }

    /// Runs the queued rebuild, if any. The queue is cleared even when the
    /// rebuild fails.
    pub fn apply_scheduled_rebuild(&mut self) -> Result<Option<BuildReport>, TrackError> {
        let Some(range) = self.pending.take() else {
            return Ok(None);
        };
        let end = range.end.min(self.curves.len());
        let start = range.start.min(end);
        self.rebuild_range(start, end).map(Some)
    }

    /// Appends a Bezier curve returning to the origin with the starting
    /// orientation and switches lookups past the end to loop.
    pub fn close_circuit(&mut self) -> Result<usize, TrackError> {
        if self.curves.is_empty() {
            return Err(TrackError::NoCurves);
        }
        if self.dirty {
            self.update_segments()?;
        }
        let end_yaw = self.path.extents().last().map(|extent| extent.end_direction.y).unwrap_or(0.0);
        let closing = Curve::bezier(Vec3::ZERO, Vec3::new(0.0, -wrap_degrees(end_yaw), 0.0));
        let index = self.add_curve(closing);
        self.host.object_changing(ObjectRef::Track);
        self.config.overrun = OverrunPolicy::Loop;
        log::debug!("closed circuit with curve {index}");
        Ok(index)
    }
}

fn segmenter_settings(config: &TrackConfig) -> SegmenterSettings {
    SegmenterSettings {
        segment_length: config.segment_length,
        bank: config.bank_interpolation,
        bezier_tolerance: config.bezier_tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with(count: usize) -> Track {
        let mut track = Track::new(TrackConfig::default());
        for _ in 0..count {
            track.add_curve(Curve::arc(10.0, Vec3::ZERO));
        }
        track
    }

    #[test]
    fn schedule_rebuild_coalesces_ranges() {
        let mut track = track_with(8);
        track.rebuild_all().expect("rebuild");
        // Bank windows reach two curves ahead and one behind; curve 1's
        // snapshot ends exactly where curve 2's segments begin.
        track.schedule_rebuild(3, true);
        assert_eq!(track.pending_rebuild(), Some(1..6));
        track.schedule_rebuild(0, true);
        assert_eq!(track.pending_rebuild(), Some(0..6));
        track.schedule_rebuild(4, false);
        assert_eq!(track.pending_rebuild(), Some(0..8));
        track.apply_scheduled_rebuild().expect("apply");

        track.update_curve(6, |c| c.angles.z = 15.0).expect("edit");
        track.schedule_rebuild(6, true);
        assert_eq!(track.pending_rebuild(), Some(4..8));
    }

    #[test]
    fn curve_ids_survive_renumbering() {
        let mut track = track_with(2);
        let first = track.curve_id(0).expect("id");
        let second = track.curve_id(1).expect("id");
        assert_ne!(first, second);
        track.insert_curve(1, Curve::arc(5.0, Vec3::ZERO)).expect("insert");
        assert_eq!(track.curve_id(0), Some(first));
        assert_eq!(track.curve_id(2), Some(second));
        track.remove_curve(0).expect("remove");
        assert_eq!(track.curve_id(1), Some(second));
        assert_eq!(track.curve_id(2), None);
    }

    #[test]
    fn edits_renumber_curves_and_mark_dirty() {
        let mut track = track_with(3);
        track.update_segments().expect("segments");
        assert!(!track.is_dirty());
        track.insert_curve(1, Curve::arc(5.0, Vec3::ZERO)).expect("insert");
        assert!(track.is_dirty());
        assert!(track.curves().iter().enumerate().all(|(i, c)| c.index == i));
        let removed = track.remove_curve(0).expect("remove");
        assert_eq!(removed.length, 10.0);
        assert_eq!(track.curve(0).map(|c| c.length), Some(5.0));
        assert!(matches!(track.remove_curve(9), Err(TrackError::CurveOutOfBounds { index: 9, count: 3 })));
    }

    #[test]
    fn respawn_search_skips_jumps_and_blocked_curves() {
        let mut track = track_with(4);
        track.update_curve(2, |c| c.is_jump = true).expect("edit");
        track.update_curve(1, |c| c.can_respawn = false).expect("edit");
        assert_eq!(track.respawn_curve_for(3), Some(3));
        assert_eq!(track.respawn_curve_for(2), Some(0));
        assert_eq!(track.respawn_curve_for(10), Some(3));
    }

    #[test]
    fn close_circuit_requires_curves() {
        let mut track = Track::new(TrackConfig::default());
        assert_eq!(track.close_circuit(), Err(TrackError::NoCurves));
        assert!(track.curves().is_empty());
        assert_eq!(track.config().overrun, OverrunPolicy::Extrapolate);
    }
}
