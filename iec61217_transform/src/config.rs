//! Serialized kinematic state of a treatment machine.
//! The state is stored in the RON format; every field is optional in the file and falls back
//! to the machine's home position (all angles and offsets zero, unit image spacing).

use crate::composer::IecTransformTree;
use crate::error::{TransformError, TransformResult};
use crate::store::{
    CollimatorParameters, EccentricRotationParameters, GantryParameters, ImageGridParameters,
    PatientParameters, PatientSupportParameters, TableTopParameters, WedgeFilterParameters,
};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use uom::si::angle::degree;
use uom::si::f64::{Angle, Length};
use uom::si::length::millimeter;

fn deg(value: f64) -> Angle {
    Angle::new::<degree>(value)
}

fn mm(value: f64) -> Length {
    Length::new::<millimeter>(value)
}

fn mm3(values: [f64; 3]) -> [Length; 3] {
    values.map(mm)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct GantryState {
    pub rotation_deg: f64,
    pub pitch_deg: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct RotatingDeviceState {
    pub rotation_deg: f64,
    pub offset_mm: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct TableTopState {
    pub translation_mm: [f64; 3],
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct PatientState {
    pub translation_mm: [f64; 3],
    pub psi_deg: f64,
    pub phi_deg: f64,
    pub theta_deg: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ImageGridState {
    /// (column, row, slice) spacing.
    pub spacing_mm: [f64; 3],
    pub origin_mm: [f64; 3],
    pub row_direction: [f64; 3],
    pub column_direction: [f64; 3],
}

impl Default for ImageGridState {
    fn default() -> Self {
        Self {
            spacing_mm: [1.0, 1.0, 1.0],
            origin_mm: [0.0, 0.0, 0.0],
            row_direction: [1.0, 0.0, 0.0],
            column_direction: [0.0, 1.0, 0.0],
        }
    }
}

/// Every kinematic parameter of the device, in degrees and millimeters.
//
// (
//   gantry: (rotation_deg: 90.0, pitch_deg: 0.0),
//   collimator: (rotation_deg: 15.0, offset_mm: 0.0),
//   patient_support_rotation_deg: 270.0,
//   table_top: (translation_mm: (0.0, 0.0, -100.0)),
// )
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct KinematicState {
    pub gantry: GantryState,
    pub collimator: RotatingDeviceState,
    pub wedge_filter: RotatingDeviceState,
    pub patient_support_rotation_deg: f64,
    /// Offset along Y.
    pub table_top_eccentric_rotation: RotatingDeviceState,
    pub table_top: TableTopState,
    pub patient: PatientState,
    pub image_grid: ImageGridState,
}

impl KinematicState {
    pub fn from_ron(ron: &str) -> TransformResult<Self> {
        ron::from_str(ron).map_err(|e| {
            TransformError::ConfigurationError(format!("Syntax Error in kinematic state: {e}"))
        })
    }

    pub fn to_ron(&self) -> TransformResult<String> {
        ron::ser::to_string_pretty(self, PrettyConfig::default()).map_err(|e| {
            TransformError::ConfigurationError(format!("Failed to serialize kinematic state: {e}"))
        })
    }

    pub fn gantry_parameters(&self) -> GantryParameters {
        GantryParameters {
            rotation_angle: deg(self.gantry.rotation_deg),
            pitch_angle: deg(self.gantry.pitch_deg),
        }
    }

    pub fn collimator_parameters(&self) -> CollimatorParameters {
        CollimatorParameters {
            rotation_angle: deg(self.collimator.rotation_deg),
            offset_z: mm(self.collimator.offset_mm),
        }
    }

    pub fn wedge_filter_parameters(&self) -> WedgeFilterParameters {
        WedgeFilterParameters {
            rotation_angle: deg(self.wedge_filter.rotation_deg),
            offset_z: mm(self.wedge_filter.offset_mm),
        }
    }

    pub fn patient_support_parameters(&self) -> PatientSupportParameters {
        PatientSupportParameters {
            rotation_angle: deg(self.patient_support_rotation_deg),
        }
    }

    pub fn eccentric_rotation_parameters(&self) -> EccentricRotationParameters {
        EccentricRotationParameters {
            rotation_angle: deg(self.table_top_eccentric_rotation.rotation_deg),
            offset_y: mm(self.table_top_eccentric_rotation.offset_mm),
        }
    }

    pub fn table_top_parameters(&self) -> TableTopParameters {
        TableTopParameters {
            translation: mm3(self.table_top.translation_mm),
            pitch_angle: deg(self.table_top.pitch_deg),
            roll_angle: deg(self.table_top.roll_deg),
        }
    }

    pub fn patient_parameters(&self) -> PatientParameters {
        PatientParameters {
            translation: mm3(self.patient.translation_mm),
            psi_angle: deg(self.patient.psi_deg),
            phi_angle: deg(self.patient.phi_deg),
            theta_angle: deg(self.patient.theta_deg),
        }
    }

    pub fn image_grid_parameters(&self) -> ImageGridParameters {
        let [column, row, slice] = self.image_grid.spacing_mm;
        ImageGridParameters {
            column_spacing: mm(column),
            row_spacing: mm(row),
            slice_distance: mm(slice),
            origin: mm3(self.image_grid.origin_mm),
            row_direction: self.image_grid.row_direction,
            column_direction: self.image_grid.column_direction,
        }
    }

    /// Pushes the whole state through the update operations of `tree`.
    /// The image grid goes first so a degenerate orientation leaves the tree untouched.
    pub fn apply(&self, tree: &mut IecTransformTree) -> TransformResult<()> {
        tree.update_patient_image_grid_to_dicom(self.image_grid_parameters())?;
        tree.update_gantry_to_fixed_reference(self.gantry_parameters());
        tree.update_collimator_to_gantry(self.collimator_parameters());
        tree.update_wedge_filter_to_collimator(self.wedge_filter_parameters());
        tree.update_patient_support_rotation_to_fixed_reference(self.patient_support_parameters());
        tree.update_table_top_eccentric_rotation_to_patient_support_rotation(
            self.eccentric_rotation_parameters(),
        );
        tree.update_table_top_to_table_top_eccentric_rotation(self.table_top_parameters());
        tree.update_patient_to_table_top(self.patient_parameters());
        Ok(())
    }
}

/// Reads a kinematic state from a RON file.
pub fn read_kinematic_state<P: AsRef<Path>>(path: P) -> TransformResult<KinematicState> {
    let path = path.as_ref();
    let content = read_to_string(path).map_err(|e| {
        TransformError::ConfigurationError(format!(
            "Failed to read kinematic state file {path:?}: {e}"
        ))
    })?;
    KinematicState::from_ron(&content).map_err(|e| match e {
        TransformError::ConfigurationError(msg) => {
            TransformError::ConfigurationError(format!("{path:?}: {msg}"))
        }
        other => other,
    })
}
