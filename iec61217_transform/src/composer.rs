use crate::error::{TransformError, TransformResult};
use crate::frames::{transform_name_between, Frame};
use crate::hierarchy::FrameHierarchy;
use crate::store::{
    CollimatorParameters, EccentricRotationParameters, EdgeParameters, ElementaryTransformStore,
    GantryParameters, ImageGridParameters, PatientParameters, PatientSupportParameters,
    TableTopParameters, WedgeFilterParameters,
};
use crate::transform::{AffineMatrix, ComposedTransform};
use log::error;
use std::fmt;

/// The IEC 61217 frame hierarchy together with the current elementary transforms.
///
/// Updates take `&mut self` and lookups `&self`; hosts sharing a tree across threads wrap it in
/// a `RwLock`.
#[derive(Debug, Clone, PartialEq)]
pub struct IecTransformTree {
    hierarchy: FrameHierarchy,
    store: ElementaryTransformStore,
}

impl IecTransformTree {
    pub fn new() -> Self {
        Self::with_hierarchy(FrameHierarchy::iec61217())
    }

    /// Uses a custom hierarchy, e.g. a reduced device model.
    pub fn with_hierarchy(hierarchy: FrameHierarchy) -> Self {
        Self {
            hierarchy,
            store: ElementaryTransformStore::new(),
        }
    }

    pub fn hierarchy(&self) -> &FrameHierarchy {
        &self.hierarchy
    }

    pub fn store(&self) -> &ElementaryTransformStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ElementaryTransformStore {
        &mut self.store
    }

    pub fn transform_name_between(&self, from: Frame, to: Frame) -> String {
        transform_name_between(from, to)
    }

    /// Transform mapping coordinates in `from` to coordinates in `to`.
    pub fn transform_between(&self, from: Frame, to: Frame) -> TransformResult<AffineMatrix> {
        self.transform_between_with(from, to, true)
    }

    /// Variant used by the beam model: the destination side is concatenated without inversion.
    // TODO: confirm with the beam model owners whether the un-inverted destination side is
    // still needed; it is kept only for compatibility.
    pub fn transform_between_for_beam(
        &self,
        from: Frame,
        to: Frame,
    ) -> TransformResult<AffineMatrix> {
        self.transform_between_with(from, to, false)
    }

    /// Composes `from -> root` with `root -> to`.
    ///
    /// The source side concatenates the elementary transforms as they are. The destination side
    /// concatenates their inverses, unless `invert_destination` is false.
    /// Either the whole transform is returned or an error, never a partial chain.
    pub fn transform_between_with(
        &self,
        from: Frame,
        to: Frame,
        invert_destination: bool,
    ) -> TransformResult<AffineMatrix> {
        let mut output = ComposedTransform::new(transform_name_between(from, to));
        match self.compose(&mut output, from, to, invert_destination) {
            Ok(()) => Ok(output.into_matrix()),
            Err(e) => {
                error!("Failed to get transform {}: {e}", output.name());
                Err(e)
            }
        }
    }

    fn compose(
        &self,
        output: &mut ComposedTransform,
        from: Frame,
        to: Frame,
        invert_destination: bool,
    ) -> TransformResult<()> {
        let from_path = self.hierarchy.path_to_root(from)?;
        let to_path = self.hierarchy.path_from_root(to)?;

        for pair in from_path.windows(2) {
            let (child, parent) = (pair[0], pair[1]);
            if child == parent {
                continue;
            }
            let transform = self.store.between(child, parent)?;
            output.concatenate(transform.matrix());
        }

        for pair in to_path.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            if child == parent {
                continue;
            }
            let transform = self.store.between(child, parent)?;
            if invert_destination {
                output.concatenate(&transform.inverse()?);
            } else {
                output.concatenate(transform.matrix());
            }
        }

        Ok(())
    }

    /// `frame -> FixedReference`, recomputed from the current elementary transforms.
    pub fn concatenated_transform(&self, frame: Frame) -> TransformResult<AffineMatrix> {
        self.transform_between(frame, Frame::ROOT)
    }

    pub fn update(&mut self, parameters: EdgeParameters) -> TransformResult<()> {
        self.store.update(parameters)
    }

    pub fn update_gantry_to_fixed_reference(&mut self, parameters: GantryParameters) {
        self.store.update_gantry_to_fixed_reference(parameters);
    }

    pub fn update_collimator_to_gantry(&mut self, parameters: CollimatorParameters) {
        self.store.update_collimator_to_gantry(parameters);
    }

    pub fn update_wedge_filter_to_collimator(&mut self, parameters: WedgeFilterParameters) {
        self.store.update_wedge_filter_to_collimator(parameters);
    }

    pub fn update_patient_support_rotation_to_fixed_reference(
        &mut self,
        parameters: PatientSupportParameters,
    ) {
        self.store
            .update_patient_support_rotation_to_fixed_reference(parameters);
    }

    pub fn update_table_top_eccentric_rotation_to_patient_support_rotation(
        &mut self,
        parameters: EccentricRotationParameters,
    ) {
        self.store
            .update_table_top_eccentric_rotation_to_patient_support_rotation(parameters);
    }

    pub fn update_table_top_to_table_top_eccentric_rotation(
        &mut self,
        parameters: TableTopParameters,
    ) {
        self.store
            .update_table_top_to_table_top_eccentric_rotation(parameters);
    }

    pub fn update_patient_to_table_top(&mut self, parameters: PatientParameters) {
        self.store.update_patient_to_table_top(parameters);
    }

    pub fn update_patient_image_grid_to_dicom(
        &mut self,
        parameters: ImageGridParameters,
    ) -> TransformResult<()> {
        self.store.update_patient_image_grid_to_dicom(parameters)
    }
}

impl Default for IecTransformTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Dumps every elementary transform, then every frame's transform to the fixed reference.
impl fmt::Display for IecTransformTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Elementary transforms:")?;
        for (_, transform) in self.store.iter() {
            writeln!(f, "{transform}")?;
        }
        writeln!(f, "Concatenated transforms:")?;
        for frame in Frame::ALL {
            if frame == Frame::ROOT {
                continue;
            }
            match self.concatenated_transform(frame) {
                Ok(matrix) => writeln!(
                    f,
                    "{}:{matrix}",
                    transform_name_between(frame, Frame::ROOT)
                )?,
                Err(TransformError::FrameNotInHierarchy(_)) => continue,
                Err(e) => writeln!(f, "{}: {e}", transform_name_between(frame, Frame::ROOT))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Edge;
    use nalgebra::Point3;
    use uom::si::angle::degree;
    use uom::si::f64::{Angle, Length};
    use uom::si::length::millimeter;

    fn assert_approx_eq(actual: f64, expected: f64, epsilon: f64, message: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= epsilon,
            "{message}: expected {expected}, got {actual}, difference {diff} exceeds epsilon {epsilon}",
        );
    }

    fn assert_matrix_eq(actual: &AffineMatrix, expected: &AffineMatrix) {
        for r in 0..4 {
            for c in 0..4 {
                assert_approx_eq(actual[(r, c)], expected[(r, c)], 1e-9, &format!("m[{r}][{c}]"));
            }
        }
    }

    fn deg(value: f64) -> Angle {
        Angle::new::<degree>(value)
    }

    fn mm(value: f64) -> Length {
        Length::new::<millimeter>(value)
    }

    #[test]
    fn test_same_frame_is_identity() {
        let mut tree = IecTransformTree::new();
        tree.update_gantry_to_fixed_reference(GantryParameters {
            rotation_angle: deg(33.0),
            pitch_angle: deg(4.0),
        });
        let m = tree.transform_between(Frame::Collimator, Frame::Collimator).unwrap();
        assert_matrix_eq(&m, &AffineMatrix::identity());
    }

    #[test]
    fn test_child_to_parent_is_elementary() {
        let mut tree = IecTransformTree::new();
        tree.update_collimator_to_gantry(CollimatorParameters {
            rotation_angle: deg(15.0),
            offset_z: mm(20.0),
        });
        let m = tree.transform_between(Frame::Collimator, Frame::Gantry).unwrap();
        assert_matrix_eq(&m, tree.store().get(Edge::CollimatorToGantry).matrix());
    }

    #[test]
    fn test_parent_to_child_is_inverse() {
        let mut tree = IecTransformTree::new();
        tree.update_gantry_to_fixed_reference(GantryParameters {
            rotation_angle: deg(90.0),
            ..Default::default()
        });
        let m = tree
            .transform_between(Frame::FixedReference, Frame::Gantry)
            .unwrap();
        // (1, 0, 0) in fixed reference is the gantry +Z axis
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_approx_eq(p.x, 0.0, 1e-9, "x");
        assert_approx_eq(p.z, 1.0, 1e-9, "z");
    }

    #[test]
    fn test_beam_variant_skips_inversion() {
        let mut tree = IecTransformTree::new();
        tree.update_gantry_to_fixed_reference(GantryParameters {
            rotation_angle: deg(30.0),
            ..Default::default()
        });
        tree.update_collimator_to_gantry(CollimatorParameters {
            rotation_angle: deg(10.0),
            offset_z: mm(5.0),
        });
        let beam = tree
            .transform_between_for_beam(Frame::FixedReference, Frame::Collimator)
            .unwrap();
        let gantry = tree.store().get(Edge::GantryToFixedReference).matrix();
        let collimator = tree.store().get(Edge::CollimatorToGantry).matrix();
        assert_matrix_eq(&beam, &(collimator * gantry));

        let regular = tree
            .transform_between(Frame::FixedReference, Frame::Collimator)
            .unwrap();
        let expected = (gantry * collimator).try_inverse().unwrap();
        assert_matrix_eq(&regular, &expected);
    }

    #[test]
    fn test_beam_variant_source_side_unchanged() {
        let mut tree = IecTransformTree::new();
        tree.update_patient_to_table_top(PatientParameters {
            translation: [mm(10.0), mm(20.0), mm(30.0)],
            theta_angle: deg(12.0),
            ..Default::default()
        });
        let regular = tree.transform_between(Frame::Patient, Frame::FixedReference).unwrap();
        let beam = tree
            .transform_between_for_beam(Frame::Patient, Frame::FixedReference)
            .unwrap();
        assert_matrix_eq(&regular, &beam);
    }

    #[test]
    fn test_reserved_frame_fails() {
        let tree = IecTransformTree::new();
        assert_eq!(
            tree.transform_between(Frame::Imager, Frame::Gantry),
            Err(TransformError::FrameNotInHierarchy(Frame::Imager))
        );
        assert_eq!(
            tree.transform_between(Frame::Gantry, Frame::Focus),
            Err(TransformError::FrameNotInHierarchy(Frame::Focus))
        );
    }

    #[test]
    fn test_hierarchy_edge_without_elementary_transform() {
        let hierarchy = FrameHierarchy::from_adjacency(&[(
            Frame::FixedReference,
            &[Frame::Gantry, Frame::Imager],
        )])
        .unwrap();
        let tree = IecTransformTree::with_hierarchy(hierarchy);
        assert!(tree.transform_between(Frame::Gantry, Frame::FixedReference).is_ok());
        assert_eq!(
            tree.transform_between(Frame::Imager, Frame::Gantry),
            Err(TransformError::TransformNotFound(
                "ImagerToFixedReferenceTransform".to_string()
            ))
        );
    }

    #[test]
    fn test_singular_destination_fails() {
        let mut tree = IecTransformTree::new();
        tree.update_patient_image_grid_to_dicom(ImageGridParameters {
            slice_distance: mm(0.0),
            ..Default::default()
        })
        .unwrap();
        assert!(tree
            .transform_between(Frame::PatientImageRegularGrid, Frame::Dicom)
            .is_ok());
        assert_eq!(
            tree.transform_between(Frame::Dicom, Frame::PatientImageRegularGrid),
            Err(TransformError::SingularTransform(
                "PatientImageRegularGridToDICOMTransform".to_string()
            ))
        );
    }

    #[test]
    fn test_concatenated_transform_tracks_updates() {
        let mut tree = IecTransformTree::new();
        let before = tree.concatenated_transform(Frame::WedgeFilter).unwrap();
        assert_matrix_eq(&before, &AffineMatrix::identity());

        tree.update_gantry_to_fixed_reference(GantryParameters {
            rotation_angle: deg(90.0),
            ..Default::default()
        });
        let after = tree.concatenated_transform(Frame::WedgeFilter).unwrap();
        assert_matrix_eq(
            &after,
            tree.store().get(Edge::GantryToFixedReference).matrix(),
        );
    }

    #[test]
    fn test_display_lists_transforms() {
        let tree = IecTransformTree::new();
        let dump = tree.to_string();
        assert!(dump.starts_with("Elementary transforms:"));
        assert!(dump.contains("RasToPatientTransform:"));
        assert!(dump.contains("Concatenated transforms:"));
        assert!(dump.contains("PatientImageRegularGridToFixedReferenceTransform:"));
        assert!(!dump.contains("Imager"));
    }
}
