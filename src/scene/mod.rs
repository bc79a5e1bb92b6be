//! Sculpture input data and camera collaborators.
//!
//! The asset loader hands over typed vertex arrays ([`SculptureAsset`]); this
//! module turns them into the immutable [`SculptureData`] every chapter reads
//! from. Viewpoints come from the page as well and drive [`CameraPath`].

pub mod camera;
pub mod figures;
pub mod sculpture;

pub use camera::{CameraPath, CameraPose, Viewpoint};
pub use figures::{Figure, FigureKind};
pub use sculpture::{CrossSection, PATH_ROUND_EPS, SculptureAsset, SculptureData, SculptureError};
