//! Mannequin Geometry
//!
//! Shape-key deformation, floor placement, garment binding and orbit camera
//! for the mannequin preview, using nalgebra for the vector math and the
//! gltf crate for asset loading.
//!
//! The [`Viewer`] ties the pieces into a frame loop:
//!
//! ```rust,ignore
//! use mannequin_geometry::{AssetSource, GltfLoader, Viewer, ViewerConfig};
//!
//! let mut viewer = Viewer::new(surface, ViewerConfig::default());
//! viewer.load_async(GltfLoader, AssetSource::Path("mannequin.glb".into()));
//! loop {
//!     viewer.frame(&params, &selected_products);
//! }
//! ```

pub mod bounds;
pub mod camera;
pub mod error;
pub mod garment;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod morph;
pub mod placement;
pub mod rig;
pub mod transform;
pub mod viewer;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use bounds::Aabb;
pub use camera::{CameraConfig, CameraState, DragState, InputEvent, OrbitController};
pub use error::{Error, Result};
pub use garment::{apply_garment, GarmentState};
pub use loader::{AssetSource, GltfLoader, RigLoader};
pub use material::{Material, MaterialSlot};
pub use mesh::Mesh;
pub use morph::{apply_shape_weights, apply_weights, MorphChannel, MorphChannels};
pub use placement::{morphed_bounds, position_on_floor, FloorPlacement, EYE_LINE_FRACTION};
pub use rig::{FixedRoles, MeshClassifier, MeshRoles, MeshTarget, ModelRig, NameHeuristic};
pub use transform::Transform;
pub use viewer::{
    Diagnostic, Diagnostics, DisposeReport, FrameReport, FrameView, RenderSurface,
    TracingDiagnostics, Viewer, ViewerConfig,
};
