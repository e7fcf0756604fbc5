//! Coordinate frames of an external beam radiotherapy device, following IEC 61217.
//!
//! The frames form a fixed tree rooted at the fixed reference system. Every edge carries an
//! elementary transform rebuilt from the device's kinematic parameters (gantry angle, table
//! position, ...). [`IecTransformTree`] composes them into the transform between any two frames:
//!
//! ```
//! use iec61217_transform::{Frame, GantryParameters, IecTransformTree};
//! use uom::si::angle::degree;
//! use uom::si::f64::Angle;
//!
//! let mut tree = IecTransformTree::new();
//! tree.update_gantry_to_fixed_reference(GantryParameters {
//!     rotation_angle: Angle::new::<degree>(90.0),
//!     ..Default::default()
//! });
//! let ras_to_collimator = tree.transform_between(Frame::Ras, Frame::Collimator).unwrap();
//! ```

pub mod composer;
pub mod config;
pub mod error;
pub mod frames;
pub mod hierarchy;
mod path;
pub mod store;
pub mod transform;

pub use composer::IecTransformTree;
pub use config::{read_kinematic_state, KinematicState};
pub use error::{TransformError, TransformResult};
pub use frames::{transform_name_between, Edge, Frame};
pub use hierarchy::FrameHierarchy;
pub use store::{
    CollimatorParameters, EccentricRotationParameters, EdgeParameters, ElementaryTransformStore,
    GantryParameters, ImageGridParameters, PatientParameters, PatientSupportParameters,
    TableTopParameters, WedgeFilterParameters,
};
pub use transform::{AffineMatrix, ComposedTransform, ElementaryTransform};
