// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame loop, change detection and viewer lifecycle
//!
//! The viewer is polled once per rendered frame with the caller's current
//! body parameters and product selection. It compares both against what it
//! last applied and, on change, runs deformation, then floor placement, then
//! the garment binding, before issuing the draw call.
//!
//! Asset loading happens on the rayon pool. The result is delivered through a
//! channel drained at the start of each frame; once the viewer is disposed the
//! receiving end is gone and a late result is simply dropped. A panicking
//! loader is caught on the worker and delivered as an ordinary load failure.

use crate::camera::{CameraConfig, CameraState, InputEvent, OrbitController};
use crate::error::{Error, Result};
use crate::garment::{apply_garment, GarmentState};
use crate::loader::{AssetSource, RigLoader};
use crate::morph::apply_weights;
use crate::placement::{position_on_floor, FloorPlacement};
use crate::rig::{MeshClassifier, MeshTarget, ModelRig, NameHeuristic};
use mannequin_core::{BodyParameters, MannequinConfig, Product, ProductSignature};
use nalgebra::Point3;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Everything injected into a viewer at construction
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub mannequin: MannequinConfig,
    pub camera: CameraConfig,
}

/// What the rendering backend gets to see each frame
#[derive(Debug)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub camera: &'a CameraState,
    pub fov_degrees: f32,
    pub aspect: f32,
    /// `None` until the asset has loaded
    pub rig: Option<&'a ModelRig>,
}

impl FrameView<'_> {
    pub fn eye(&self) -> Point3<f32> {
        self.camera.position
    }
}

/// Rendering backend the viewer draws through
pub trait RenderSurface {
    /// Host container changed size, in physical pixels
    fn resize(&mut self, width: u32, height: u32);
    fn draw(&mut self, view: &FrameView<'_>);
    /// Free the surface and any GPU-side buffers
    fn release(&mut self);
}

/// Conditions the viewer degrades around instead of failing
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Mesh exposes no morph dictionary; deformation is a no-op for it
    MissingMorphTargets { mesh: String },
    /// No body mesh was found; floor placement is a no-op
    MissingBodyMesh,
    /// The asset could not be loaded; the scene stays empty
    LoadFailed { source: String, error: String },
}

/// Observer for [`Diagnostic`]s
pub trait Diagnostics: Send {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Default observer: structured log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::MissingMorphTargets { mesh } => {
                tracing::debug!(mesh = %mesh, "Mesh has no morph targets, deformation disabled")
            }
            Diagnostic::MissingBodyMesh => {
                tracing::warn!("No body mesh detected, floor placement disabled")
            }
            Diagnostic::LoadFailed { source, error } => {
                tracing::error!(source = %source, error = %error, "Failed to load mannequin asset")
            }
        }
    }
}

/// Work done during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// The asset finished loading this frame
    pub attached: bool,
    pub zoom_moved: bool,
    /// Body parameters changed and were re-applied
    pub deformed: bool,
    pub placement: Option<FloorPlacement>,
    /// Selection changed and the garment was re-bound
    pub garment: Option<GarmentState>,
    pub drawn: bool,
    /// Materials whose pending change the surface picked up with this draw
    pub uploaded_materials: usize,
}

/// Resources released by [`Viewer::dispose`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub meshes: usize,
    pub materials: usize,
    pub abandoned_load: bool,
}

struct PendingLoad {
    source: String,
    rx: Receiver<Result<Vec<MeshTarget>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Running,
    Disposed,
}

/// The mannequin deformation and view controller
pub struct Viewer<S: RenderSurface> {
    config: ViewerConfig,
    surface: S,
    camera: OrbitController,
    aspect: f32,
    rig: Option<ModelRig>,
    pending: Option<PendingLoad>,
    last_params: Option<BodyParameters>,
    last_signature: Option<ProductSignature>,
    classifier: Box<dyn MeshClassifier>,
    diagnostics: Box<dyn Diagnostics>,
    lifecycle: Lifecycle,
    frames: u64,
}

impl<S: RenderSurface> Viewer<S> {
    pub fn new(surface: S, config: ViewerConfig) -> Self {
        Self {
            camera: OrbitController::new(config.camera),
            config,
            surface,
            aspect: 1.0,
            rig: None,
            pending: None,
            last_params: None,
            last_signature: None,
            classifier: Box::new(NameHeuristic::default()),
            diagnostics: Box::new(TracingDiagnostics),
            lifecycle: Lifecycle::Running,
            frames: 0,
        }
    }

    /// Replace the mesh-role strategy used when a rig is attached.
    pub fn with_classifier(mut self, classifier: impl MeshClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the diagnostics observer.
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraState {
        self.camera.state()
    }

    pub fn controller(&self) -> &OrbitController {
        &self.camera
    }

    pub fn rig(&self) -> Option<&ModelRig> {
        self.rig.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn is_model_loaded(&self) -> bool {
        self.rig.is_some()
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Start loading an asset in the background. Fire and forget: failures
    /// are reported through diagnostics and never retried.
    pub fn load_async<L>(&mut self, loader: L, source: AssetSource)
    where
        L: RigLoader + 'static,
    {
        if self.is_disposed() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.pending = Some(PendingLoad {
            source: source.to_string(),
            rx,
        });
        tracing::debug!(source = %source, "Loading mannequin asset");

        rayon::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| loader.load(&source)))
                .unwrap_or_else(|payload| Err(Error::LoaderPanicked(panic_message(&*payload))));
            if tx.send(outcome).is_err() {
                tracing::debug!(source = %source, "Viewer gone before load finished, dropping result");
            }
        });
    }

    /// Attach already-loaded meshes, bypassing the background loader.
    pub fn attach(&mut self, meshes: Vec<MeshTarget>) {
        if self.is_disposed() {
            return;
        }
        let rig = ModelRig::with_classifier(meshes, self.classifier.as_ref());

        for mesh in rig.meshes() {
            if !mesh.has_morphs() {
                self.diagnostics.report(&Diagnostic::MissingMorphTargets {
                    mesh: mesh.name.clone(),
                });
            }
        }
        if rig.body().is_none() {
            self.diagnostics.report(&Diagnostic::MissingBodyMesh);
        }

        if let Some(mut previous) = self.rig.replace(rig) {
            previous.dispose();
        }
        self.last_params = None;
        self.last_signature = None;
        tracing::info!(meshes = self.rig.as_ref().map_or(0, |r| r.meshes().len()), "Mannequin attached");
    }

    fn poll_load(&mut self) -> bool {
        let Some(pending) = self.pending.as_ref() else {
            return false;
        };
        let outcome = match pending.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(Error::LoaderDisconnected),
        };

        let Some(pending) = self.pending.take() else {
            return false;
        };
        match outcome {
            Ok(meshes) => {
                self.attach(meshes);
                true
            }
            Err(error) => {
                self.diagnostics.report(&Diagnostic::LoadFailed {
                    source: pending.source,
                    error: error.to_string(),
                });
                false
            }
        }
    }

    /// Feed one input event to the orbit controller.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if self.is_disposed() {
            return;
        }
        self.camera.handle(event);
    }

    /// Host container resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.is_disposed() {
            return;
        }
        self.aspect = width as f32 / height.max(1) as f32;
        self.surface.resize(width, height);
    }

    /// Run one frame of the render loop.
    ///
    /// Order: zoom smoothing, deformation and floor placement on parameter
    /// change, garment binding on selection change, draw. Material upload
    /// flags are visible to the surface during the draw and cleared after it.
    pub fn frame(&mut self, params: &BodyParameters, products: &[Product]) -> FrameReport {
        let mut report = FrameReport::default();
        if self.is_disposed() {
            return report;
        }

        report.attached = self.poll_load();
        report.zoom_moved = self.camera.smooth();

        if let Some(rig) = self.rig.as_mut() {
            let config = &self.config.mannequin;

            let params_changed = self
                .last_params
                .map_or(true, |last| params.differs_from(&last));
            if params_changed {
                if let Some(body) = rig.body_mut() {
                    apply_weights(body, params, config);
                }
                if let Some(garment) = rig.garment_mut().filter(|g| g.visible) {
                    apply_weights(garment, params, config);
                }
                report.placement = position_on_floor(rig);
                if let Some(placement) = report.placement {
                    self.camera.set_look_at_height(placement.look_at_height);
                }
                self.last_params = Some(*params);
                report.deformed = true;
            }

            let signature = ProductSignature::of(products);
            if self.last_signature.as_ref() != Some(&signature) {
                report.garment = Some(apply_garment(rig, products, params, config));
                self.last_signature = Some(signature);
            }
        }

        self.frames += 1;
        self.surface.draw(&FrameView {
            frame: self.frames,
            camera: self.camera.state(),
            fov_degrees: self.config.camera.fov_degrees,
            aspect: self.aspect,
            rig: self.rig.as_ref(),
        });
        report.drawn = true;
        report.uploaded_materials = self.rig.as_mut().map_or(0, ModelRig::take_material_updates);
        report
    }

    /// Stop the loop, detach input, free every mesh and release the surface.
    ///
    /// Safe to call more than once; later calls release nothing.
    pub fn dispose(&mut self) -> DisposeReport {
        if self.is_disposed() {
            return DisposeReport::default();
        }
        self.lifecycle = Lifecycle::Disposed;

        let abandoned_load = self.pending.take().is_some();
        self.camera.release();

        let (meshes, materials) = self.rig.take().map_or((0, 0), |mut rig| rig.dispose());
        self.surface.release();

        tracing::info!(meshes, materials, abandoned_load, "Viewer disposed");
        DisposeReport {
            meshes,
            materials,
            abandoned_load,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

impl<S: RenderSurface> Drop for Viewer<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::morph::MorphChannels;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct NullSurface {
        draws: usize,
        released: bool,
        size: (u32, u32),
    }

    impl RenderSurface for NullSurface {
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }
        fn draw(&mut self, _view: &FrameView<'_>) {
            self.draws += 1;
        }
        fn release(&mut self) {
            self.released = true;
        }
    }

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Diagnostic>>>);

    impl Diagnostics for Collect {
        fn report(&self, diagnostic: &Diagnostic) {
            self.0.lock().unwrap().push(diagnostic.clone());
        }
    }

    fn meshes() -> Vec<MeshTarget> {
        let mut morph = MorphChannels::new();
        morph.push("Height", vec![0.0, 0.0, 0.0, 0.0, 0.2, 0.0]);
        vec![
            MeshTarget::new("Body", Mesh::from_positions(vec![0.0, -1.0, 0.0, 0.0, 0.7, 0.0])).with_morph(morph),
            MeshTarget::new("Shirt", Mesh::from_positions(vec![0.0, 0.0, 0.0])),
        ]
    }

    #[test]
    fn test_renders_empty_scene_before_load() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        let report = viewer.frame(&BodyParameters::default(), &[]);
        assert!(report.drawn);
        assert!(!report.deformed);
        assert_eq!(report.garment, None);
        assert_eq!(viewer.surface().draws, 1);
    }

    #[test]
    fn test_first_frame_after_attach_applies_everything() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        viewer.attach(meshes());
        let report = viewer.frame(&BodyParameters::default(), &[]);
        assert!(report.deformed);
        assert_eq!(report.garment, Some(GarmentState::Hidden));
        let placement = report.placement.unwrap();
        // body spans -1.0 .. 0.7 + 0.5 * 0.2
        assert!((placement.model_height - 1.8).abs() < 1e-5);
        assert!((viewer.camera().look_at.y - 0.45 * 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_unchanged_inputs_skip_work() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        viewer.attach(meshes());
        let params = BodyParameters::default();
        viewer.frame(&params, &[]);
        let report = viewer.frame(&params, &[]);
        assert!(!report.deformed);
        assert_eq!(report.garment, None);
        assert!(report.drawn);
    }

    #[test]
    fn test_material_updates_are_consumed_by_the_draw() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        viewer.attach(meshes());
        let params = BodyParameters::default();
        let shirt = [Product::new("1", "shirt")];

        let first = viewer.frame(&params, &shirt);
        assert_eq!(first.uploaded_materials, 1);
        assert!(viewer.rig().unwrap().garment().unwrap().material.iter().all(|m| !m.needs_update));

        assert_eq!(viewer.frame(&params, &shirt).uploaded_materials, 0);
    }

    #[test]
    fn test_diagnostics_for_missing_features() {
        let diagnostics = Collect::default();
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default())
            .with_diagnostics(diagnostics.clone());
        viewer.attach(Vec::new());
        viewer.attach(meshes());
        let seen = diagnostics.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Diagnostic::MissingBodyMesh,
                Diagnostic::MissingMorphTargets { mesh: "Shirt".into() },
            ]
        );
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        viewer.resize(1200, 600);
        assert_eq!(viewer.surface().size, (1200, 600));
        assert_eq!(viewer.aspect, 2.0);
        viewer.resize(10, 0);
        assert_eq!(viewer.aspect, 10.0);
    }

    #[test]
    fn test_dispose_releases_and_stops() {
        let mut viewer = Viewer::new(NullSurface::default(), ViewerConfig::default());
        viewer.attach(meshes());
        let report = viewer.dispose();
        assert_eq!(report.meshes, 2);
        assert_eq!(report.materials, 2);
        assert!(viewer.surface().released);
        assert!(!viewer.is_model_loaded());

        let frame = viewer.frame(&BodyParameters::default(), &[]);
        assert!(!frame.drawn);
        viewer.handle_input(&InputEvent::Wheel { delta_y: 500.0 });
        assert_eq!(viewer.camera().target_distance, viewer.config().camera.default_distance);
        assert_eq!(viewer.dispose(), DisposeReport::default());
    }
}
