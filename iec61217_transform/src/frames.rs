//! Coordinate frame registry.
//! Every frame of the IEC 61217 device model (plus the DICOM/RAS helper frames) is a variant of
//! [`Frame`]; every elementary transform between two adjacent frames is a variant of [`Edge`].

use crate::error::{TransformError, TransformResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a coordinate frame.
/// Discriminants are stable and contiguous so they can index fixed tables.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Frame {
    /// Patient in RAS (3D Slicer). Not an IEC frame.
    Ras = 0,
    FixedReference,
    Gantry,
    /// Beam limiting device or delineator.
    Collimator,
    LeftImagingPanel,
    RightImagingPanel,
    /// Rotation component of the patient support.
    PatientSupportRotation,
    PatientSupport,
    TableTopEccentricRotation,
    TableTop,
    /// X-ray image receptor.
    FlatPanel,
    WedgeFilter,
    /// IEC patient (LSA).
    Patient,
    /// Patient in LPS (DICOM). Not an IEC frame.
    Dicom,
    PatientImageRegularGrid,
    /// Reserved, not attached to the hierarchy.
    Imager,
    /// Reserved, not attached to the hierarchy.
    Focus,
}

impl Frame {
    pub const COUNT: usize = 17;

    pub const ALL: [Frame; Frame::COUNT] = [
        Frame::Ras,
        Frame::FixedReference,
        Frame::Gantry,
        Frame::Collimator,
        Frame::LeftImagingPanel,
        Frame::RightImagingPanel,
        Frame::PatientSupportRotation,
        Frame::PatientSupport,
        Frame::TableTopEccentricRotation,
        Frame::TableTop,
        Frame::FlatPanel,
        Frame::WedgeFilter,
        Frame::Patient,
        Frame::Dicom,
        Frame::PatientImageRegularGrid,
        Frame::Imager,
        Frame::Focus,
    ];

    /// The single frame without a parent.
    pub const ROOT: Frame = Frame::FixedReference;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Frame::Ras => "Ras",
            Frame::FixedReference => "FixedReference",
            Frame::Gantry => "Gantry",
            Frame::Collimator => "Collimator",
            Frame::LeftImagingPanel => "LeftImagingPanel",
            Frame::RightImagingPanel => "RightImagingPanel",
            Frame::PatientSupportRotation => "PatientSupportRotation",
            Frame::PatientSupport => "PatientSupport",
            Frame::TableTopEccentricRotation => "TableTopEccentricRotation",
            Frame::TableTop => "TableTop",
            Frame::FlatPanel => "FlatPanel",
            Frame::WedgeFilter => "WedgeFilter",
            Frame::Patient => "Patient",
            Frame::Dicom => "DICOM",
            Frame::PatientImageRegularGrid => "PatientImageRegularGrid",
            Frame::Imager => "Imager",
            Frame::Focus => "Focus",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frame {
    type Err = TransformError;

    fn from_str(s: &str) -> TransformResult<Self> {
        Frame::ALL
            .iter()
            .copied()
            .find(|frame| frame.name() == s)
            .ok_or_else(|| TransformError::UnknownFrameName(s.to_string()))
    }
}

/// Name of the transform expressing `child` in `parent`, e.g. `CollimatorToGantryTransform`.
/// Valid for any pair; only pairs matching an [`Edge`] name an elementary transform.
pub fn transform_name_between(child: Frame, parent: Frame) -> String {
    format!("{}To{}Transform", child.name(), parent.name())
}

/// An elementary transform slot: one per parent/child pair of the IEC hierarchy.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    GantryToFixedReference = 0,
    CollimatorToGantry,
    WedgeFilterToCollimator,
    LeftImagingPanelToGantry,
    RightImagingPanelToGantry,
    FlatPanelToGantry,
    PatientSupportRotationToFixedReference,
    PatientSupportToPatientSupportRotation,
    TableTopEccentricRotationToPatientSupportRotation,
    TableTopToTableTopEccentricRotation,
    PatientToTableTop,
    DicomToPatient,
    PatientImageRegularGridToDicom,
    RasToPatient,
}

impl Edge {
    pub const COUNT: usize = 14;

    pub const ALL: [Edge; Edge::COUNT] = [
        Edge::GantryToFixedReference,
        Edge::CollimatorToGantry,
        Edge::WedgeFilterToCollimator,
        Edge::LeftImagingPanelToGantry,
        Edge::RightImagingPanelToGantry,
        Edge::FlatPanelToGantry,
        Edge::PatientSupportRotationToFixedReference,
        Edge::PatientSupportToPatientSupportRotation,
        Edge::TableTopEccentricRotationToPatientSupportRotation,
        Edge::TableTopToTableTopEccentricRotation,
        Edge::PatientToTableTop,
        Edge::DicomToPatient,
        Edge::PatientImageRegularGridToDicom,
        Edge::RasToPatient,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// (child, parent) of this edge.
    pub fn frames(self) -> (Frame, Frame) {
        match self {
            Edge::GantryToFixedReference => (Frame::Gantry, Frame::FixedReference),
            Edge::CollimatorToGantry => (Frame::Collimator, Frame::Gantry),
            Edge::WedgeFilterToCollimator => (Frame::WedgeFilter, Frame::Collimator),
            Edge::LeftImagingPanelToGantry => (Frame::LeftImagingPanel, Frame::Gantry),
            Edge::RightImagingPanelToGantry => (Frame::RightImagingPanel, Frame::Gantry),
            Edge::FlatPanelToGantry => (Frame::FlatPanel, Frame::Gantry),
            Edge::PatientSupportRotationToFixedReference => {
                (Frame::PatientSupportRotation, Frame::FixedReference)
            }
            Edge::PatientSupportToPatientSupportRotation => {
                (Frame::PatientSupport, Frame::PatientSupportRotation)
            }
            Edge::TableTopEccentricRotationToPatientSupportRotation => {
                (Frame::TableTopEccentricRotation, Frame::PatientSupportRotation)
            }
            Edge::TableTopToTableTopEccentricRotation => {
                (Frame::TableTop, Frame::TableTopEccentricRotation)
            }
            Edge::PatientToTableTop => (Frame::Patient, Frame::TableTop),
            Edge::DicomToPatient => (Frame::Dicom, Frame::Patient),
            Edge::PatientImageRegularGridToDicom => (Frame::PatientImageRegularGrid, Frame::Dicom),
            Edge::RasToPatient => (Frame::Ras, Frame::Patient),
        }
    }

    pub fn child(self) -> Frame {
        self.frames().0
    }

    pub fn parent(self) -> Frame {
        self.frames().1
    }

    /// The edge expressing `child` in `parent`, if the IEC model defines one.
    pub fn between(child: Frame, parent: Frame) -> Option<Edge> {
        Edge::ALL
            .iter()
            .copied()
            .find(|edge| edge.frames() == (child, parent))
    }

    pub fn name(self) -> String {
        let (child, parent) = self.frames();
        transform_name_between(child, parent)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
