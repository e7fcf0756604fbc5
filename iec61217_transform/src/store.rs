//! Elementary transforms of the IEC 61217 hierarchy.
//!
//! Every edge owns one [`ElementaryTransform`] expressing the child frame in its parent frame.
//! Parametric edges are rebuilt from scratch by their `update_*` operation: the matrix is reset
//! to identity, then the joint's translate/rotate sequence is replayed in kinematic order.

use crate::error::{TransformError, TransformResult};
use crate::frames::{transform_name_between, Edge, Frame};
use crate::transform::{AffineMatrix, ElementaryTransform};
use log::trace;
use nalgebra::Vector3;
use uom::si::angle::degree;
use uom::si::f64::{Angle, Length};
use uom::si::length::millimeter;

/// IEC patient (LSA) from DICOM patient (LPS), row-major.
const DICOM_TO_PATIENT: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// LPS from RAS: flip of the first two axes.
const RAS_TO_LPS: [f64; 16] = [
    -1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Below this norm the slice direction of an image grid is considered undefined.
const DIRECTION_COSINE_EPSILON: f64 = 1e-9;

fn zero_angle() -> Angle {
    Angle::new::<degree>(0.0)
}

fn zero_length() -> Length {
    Length::new::<millimeter>(0.0)
}

/// Gantry rotation about Y, with the DICOM gantry pitch about X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GantryParameters {
    pub rotation_angle: Angle,
    /// Not part of IEC 61217. The table top rotation order is assumed to apply here too.
    pub pitch_angle: Angle,
}

impl Default for GantryParameters {
    fn default() -> Self {
        Self {
            rotation_angle: zero_angle(),
            pitch_angle: zero_angle(),
        }
    }
}

/// Beam limiting device rotation about Z, offset along the beam axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollimatorParameters {
    pub rotation_angle: Angle,
    pub offset_z: Length,
}

impl Default for CollimatorParameters {
    fn default() -> Self {
        Self {
            rotation_angle: zero_angle(),
            offset_z: zero_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WedgeFilterParameters {
    pub rotation_angle: Angle,
    pub offset_z: Length,
}

impl Default for WedgeFilterParameters {
    fn default() -> Self {
        Self {
            rotation_angle: zero_angle(),
            offset_z: zero_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientSupportParameters {
    pub rotation_angle: Angle,
}

impl Default for PatientSupportParameters {
    fn default() -> Self {
        Self {
            rotation_angle: zero_angle(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EccentricRotationParameters {
    pub rotation_angle: Angle,
    pub offset_y: Length,
}

impl Default for EccentricRotationParameters {
    fn default() -> Self {
        Self {
            rotation_angle: zero_angle(),
            offset_y: zero_length(),
        }
    }
}

/// Table top position in the eccentric rotation frame, then pitch about X and roll about Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableTopParameters {
    pub translation: [Length; 3],
    pub pitch_angle: Angle,
    pub roll_angle: Angle,
}

impl Default for TableTopParameters {
    fn default() -> Self {
        Self {
            translation: [zero_length(); 3],
            pitch_angle: zero_angle(),
            roll_angle: zero_angle(),
        }
    }
}

/// Patient position on the table top, then psi about X, phi about Y and theta about Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientParameters {
    pub translation: [Length; 3],
    pub psi_angle: Angle,
    pub phi_angle: Angle,
    pub theta_angle: Angle,
}

impl Default for PatientParameters {
    fn default() -> Self {
        Self {
            translation: [zero_length(); 3],
            psi_angle: zero_angle(),
            phi_angle: zero_angle(),
            theta_angle: zero_angle(),
        }
    }
}

/// Geometry of a regular image grid in the DICOM patient frame (LPS).
///
/// The default describes a grid whose X pixel index increases from the right to the left of
/// the patient, Y from anterior to posterior, and slices from inferior to superior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGridParameters {
    pub column_spacing: Length,
    pub row_spacing: Length,
    pub slice_distance: Length,
    /// Position of the first pixel of the first slice.
    pub origin: [Length; 3],
    /// Image Orientation (Patient), row direction cosine.
    pub row_direction: [f64; 3],
    /// Image Orientation (Patient), column direction cosine.
    pub column_direction: [f64; 3],
}

impl Default for ImageGridParameters {
    fn default() -> Self {
        let one = Length::new::<millimeter>(1.0);
        Self {
            column_spacing: one,
            row_spacing: one,
            slice_distance: one,
            origin: [zero_length(); 3],
            row_direction: [1.0, 0.0, 0.0],
            column_direction: [0.0, 1.0, 0.0],
        }
    }
}

/// Parameters of one parametric edge, for callers that drive updates generically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeParameters {
    Gantry(GantryParameters),
    Collimator(CollimatorParameters),
    WedgeFilter(WedgeFilterParameters),
    PatientSupport(PatientSupportParameters),
    EccentricRotation(EccentricRotationParameters),
    TableTop(TableTopParameters),
    Patient(PatientParameters),
    ImageGrid(ImageGridParameters),
}

impl EdgeParameters {
    pub fn edge(&self) -> Edge {
        match self {
            EdgeParameters::Gantry(_) => Edge::GantryToFixedReference,
            EdgeParameters::Collimator(_) => Edge::CollimatorToGantry,
            EdgeParameters::WedgeFilter(_) => Edge::WedgeFilterToCollimator,
            EdgeParameters::PatientSupport(_) => Edge::PatientSupportRotationToFixedReference,
            EdgeParameters::EccentricRotation(_) => {
                Edge::TableTopEccentricRotationToPatientSupportRotation
            }
            EdgeParameters::TableTop(_) => Edge::TableTopToTableTopEccentricRotation,
            EdgeParameters::Patient(_) => Edge::PatientToTableTop,
            EdgeParameters::ImageGrid(_) => Edge::PatientImageRegularGridToDicom,
        }
    }
}

/// One elementary transform per [`Edge`], indexed by the edge itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementaryTransformStore {
    transforms: Vec<ElementaryTransform>,
}

impl ElementaryTransformStore {
    pub fn new() -> Self {
        let mut transforms: Vec<ElementaryTransform> = Edge::ALL
            .iter()
            .map(|edge| ElementaryTransform::new(edge.name()))
            .collect();

        let dicom_to_patient =
            ElementaryTransform::from_row_major(Edge::DicomToPatient.name(), &DICOM_TO_PATIENT);
        let ras_to_patient = dicom_to_patient.matrix() * AffineMatrix::from_row_slice(&RAS_TO_LPS);
        transforms[Edge::RasToPatient.index()] =
            ElementaryTransform::from_matrix(Edge::RasToPatient.name(), ras_to_patient);
        transforms[Edge::DicomToPatient.index()] = dicom_to_patient;

        Self { transforms }
    }

    pub fn get(&self, edge: Edge) -> &ElementaryTransform {
        &self.transforms[edge.index()]
    }

    fn get_mut(&mut self, edge: Edge) -> &mut ElementaryTransform {
        &mut self.transforms[edge.index()]
    }

    /// The transform expressing `child` in `parent`.
    pub fn between(&self, child: Frame, parent: Frame) -> TransformResult<&ElementaryTransform> {
        Edge::between(child, parent)
            .map(|edge| self.get(edge))
            .ok_or_else(|| TransformError::TransformNotFound(transform_name_between(child, parent)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edge, &ElementaryTransform)> {
        Edge::ALL.iter().copied().zip(self.transforms.iter())
    }

    pub fn update(&mut self, parameters: EdgeParameters) -> TransformResult<()> {
        match parameters {
            EdgeParameters::Gantry(p) => self.update_gantry_to_fixed_reference(p),
            EdgeParameters::Collimator(p) => self.update_collimator_to_gantry(p),
            EdgeParameters::WedgeFilter(p) => self.update_wedge_filter_to_collimator(p),
            EdgeParameters::PatientSupport(p) => {
                self.update_patient_support_rotation_to_fixed_reference(p)
            }
            EdgeParameters::EccentricRotation(p) => {
                self.update_table_top_eccentric_rotation_to_patient_support_rotation(p)
            }
            EdgeParameters::TableTop(p) => self.update_table_top_to_table_top_eccentric_rotation(p),
            EdgeParameters::Patient(p) => self.update_patient_to_table_top(p),
            EdgeParameters::ImageGrid(p) => return self.update_patient_image_grid_to_dicom(p),
        }
        Ok(())
    }

    pub fn update_gantry_to_fixed_reference(&mut self, parameters: GantryParameters) {
        trace!("{}: {:?}", Edge::GantryToFixedReference, parameters);
        self.get_mut(Edge::GantryToFixedReference)
            .identity()
            .rotate_x(parameters.pitch_angle)
            .rotate_y(parameters.rotation_angle);
    }

    pub fn update_collimator_to_gantry(&mut self, parameters: CollimatorParameters) {
        trace!("{}: {:?}", Edge::CollimatorToGantry, parameters);
        self.get_mut(Edge::CollimatorToGantry)
            .identity()
            .translate(zero_length(), zero_length(), parameters.offset_z)
            .rotate_z(parameters.rotation_angle);
    }

    pub fn update_wedge_filter_to_collimator(&mut self, parameters: WedgeFilterParameters) {
        trace!("{}: {:?}", Edge::WedgeFilterToCollimator, parameters);
        self.get_mut(Edge::WedgeFilterToCollimator)
            .identity()
            .translate(zero_length(), zero_length(), parameters.offset_z)
            .rotate_z(parameters.rotation_angle);
    }

    pub fn update_patient_support_rotation_to_fixed_reference(
        &mut self,
        parameters: PatientSupportParameters,
    ) {
        trace!(
            "{}: {:?}",
            Edge::PatientSupportRotationToFixedReference,
            parameters
        );
        self.get_mut(Edge::PatientSupportRotationToFixedReference)
            .identity()
            .rotate_z(parameters.rotation_angle);
    }

    pub fn update_table_top_eccentric_rotation_to_patient_support_rotation(
        &mut self,
        parameters: EccentricRotationParameters,
    ) {
        trace!(
            "{}: {:?}",
            Edge::TableTopEccentricRotationToPatientSupportRotation,
            parameters
        );
        self.get_mut(Edge::TableTopEccentricRotationToPatientSupportRotation)
            .identity()
            .translate(zero_length(), parameters.offset_y, zero_length())
            .rotate_z(parameters.rotation_angle);
    }

    pub fn update_table_top_to_table_top_eccentric_rotation(
        &mut self,
        parameters: TableTopParameters,
    ) {
        trace!(
            "{}: {:?}",
            Edge::TableTopToTableTopEccentricRotation,
            parameters
        );
        let [tx, ty, tz] = parameters.translation;
        self.get_mut(Edge::TableTopToTableTopEccentricRotation)
            .identity()
            .translate(tx, ty, tz)
            .rotate_x(parameters.pitch_angle)
            .rotate_y(parameters.roll_angle);
    }

    pub fn update_patient_to_table_top(&mut self, parameters: PatientParameters) {
        trace!("{}: {:?}", Edge::PatientToTableTop, parameters);
        let [px, py, pz] = parameters.translation;
        self.get_mut(Edge::PatientToTableTop)
            .identity()
            .translate(px, py, pz)
            .rotate_x(parameters.psi_angle)
            .rotate_y(parameters.phi_angle)
            .rotate_z(parameters.theta_angle);
    }

    /// Rebuilds the image grid transform from the DICOM image plane attributes.
    /// Fails, leaving the previous matrix in place, if the direction cosines are parallel or not finite.
    pub fn update_patient_image_grid_to_dicom(
        &mut self,
        parameters: ImageGridParameters,
    ) -> TransformResult<()> {
        trace!("{}: {:?}", Edge::PatientImageRegularGridToDicom, parameters);
        let row = Vector3::from(parameters.row_direction);
        let column = Vector3::from(parameters.column_direction);
        let slice = row.cross(&column);
        let norm = slice.norm();
        if !norm.is_finite() || norm < DIRECTION_COSINE_EPSILON {
            return Err(TransformError::DegenerateDirectionCosines);
        }

        let column_spacing = parameters.column_spacing.get::<millimeter>();
        let row_spacing = parameters.row_spacing.get::<millimeter>();
        let slice_distance = parameters.slice_distance.get::<millimeter>();
        let [sx, sy, sz] = parameters.origin.map(|l| l.get::<millimeter>());

        #[rustfmt::skip]
        let grid = AffineMatrix::new(
            row.x * column_spacing, column.x * row_spacing, slice.x * slice_distance, sx,
            row.y * column_spacing, column.y * row_spacing, slice.y * slice_distance, sy,
            row.z * column_spacing, column.z * row_spacing, slice.z * slice_distance, sz,
            0.0, 0.0, 0.0, 1.0,
        );
        self.get_mut(Edge::PatientImageRegularGridToDicom)
            .identity()
            .concatenate(&grid);
        Ok(())
    }
}

impl Default for ElementaryTransformStore {
    fn default() -> Self {
        Self::new()
    }
}
