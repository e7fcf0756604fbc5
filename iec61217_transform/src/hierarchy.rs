use crate::error::{TransformError, TransformResult};
use crate::frames::Frame;

/// IEC 61217:2011 hierarchy, parent -> children.
///
/// ```text
///                    -------------("f")--------------
///                    |                              |
///         ---------("g")----------                ("s")
///         |        |      |      |                  |
///       ("b")   ("lp")  ("rp")  ("fp")            ("e")
///         |                                         |
///       ("w")                                     ("t")
///                                                   |
///                                       ----------("p")
///                                       |           |
///                                    ("ras")      ("dp")
///                                                   |
///                                                 ("pi")
/// ```
/// PatientSupport hangs off PatientSupportRotation next to the eccentric rotation.
const IEC61217_ADJACENCY: &[(Frame, &[Frame])] = &[
    (
        Frame::FixedReference,
        &[Frame::Gantry, Frame::PatientSupportRotation],
    ),
    (
        Frame::Gantry,
        &[
            Frame::Collimator,
            Frame::LeftImagingPanel,
            Frame::RightImagingPanel,
            Frame::FlatPanel,
        ],
    ),
    (Frame::Collimator, &[Frame::WedgeFilter]),
    (
        Frame::PatientSupportRotation,
        &[Frame::PatientSupport, Frame::TableTopEccentricRotation],
    ),
    (Frame::TableTopEccentricRotation, &[Frame::TableTop]),
    (Frame::TableTop, &[Frame::Patient]),
    (Frame::Patient, &[Frame::Dicom, Frame::Ras]),
    (Frame::Dicom, &[Frame::PatientImageRegularGrid]),
];

/// Static tree of coordinate frames rooted at [`Frame::FixedReference`].
/// Built once, then only traversed.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHierarchy {
    children: Vec<Vec<Frame>>,
    parents: [Option<Frame>; Frame::COUNT],
    // parent order as declared, for stable edge listings
    declared: Vec<Frame>,
}

impl FrameHierarchy {
    /// The device hierarchy of IEC 61217 extended with the DICOM, image grid and RAS frames.
    pub fn iec61217() -> Self {
        Self::build(IEC61217_ADJACENCY).expect("IEC 61217 adjacency table is a valid tree")
    }

    /// Builds a hierarchy from a parent -> children table.
    ///
    /// Frames left without a parent are accepted here; resolving a path through them fails later.
    pub fn from_adjacency(adjacency: &[(Frame, &[Frame])]) -> TransformResult<Self> {
        Self::build(adjacency)
    }

    fn build(adjacency: &[(Frame, &[Frame])]) -> TransformResult<Self> {
        let mut children = vec![Vec::new(); Frame::COUNT];
        let mut parents = [None; Frame::COUNT];
        let mut declared = Vec::with_capacity(adjacency.len());

        for (parent, kids) in adjacency {
            if !declared.contains(parent) {
                declared.push(*parent);
            }
            for child in kids.iter().copied() {
                if child == Frame::ROOT {
                    return Err(TransformError::RootHasParent(*parent));
                }
                match parents[child.index()] {
                    Some(first) if first != *parent => {
                        return Err(TransformError::DuplicateParent {
                            child,
                            first,
                            second: *parent,
                        });
                    }
                    Some(_) => continue,
                    None => {
                        parents[child.index()] = Some(*parent);
                        children[parent.index()].push(child);
                    }
                }
            }
        }

        let hierarchy = Self {
            children,
            parents,
            declared,
        };
        hierarchy.check_acyclic()?;
        Ok(hierarchy)
    }

    fn check_acyclic(&self) -> TransformResult<()> {
        for start in Frame::ALL {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = self.parent_of(current) {
                steps += 1;
                if steps > Frame::COUNT {
                    return Err(TransformError::CyclicHierarchy(start));
                }
                current = parent;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> Frame {
        Frame::ROOT
    }

    #[inline]
    pub fn parent_of(&self, frame: Frame) -> Option<Frame> {
        self.parents[frame.index()]
    }

    pub fn children_of(&self, frame: Frame) -> &[Frame] {
        &self.children[frame.index()]
    }

    /// Whether `frame` is connected to the root.
    pub fn contains(&self, frame: Frame) -> bool {
        self.path_to_root(frame).is_ok()
    }

    /// All (parent, child) pairs in declaration order.
    pub fn edges(&self) -> Vec<(Frame, Frame)> {
        self.declared
            .iter()
            .flat_map(|parent| {
                self.children_of(*parent)
                    .iter()
                    .map(move |child| (*parent, *child))
            })
            .collect()
    }

    /// Number of edges between `frame` and the root.
    pub fn depth(&self, frame: Frame) -> TransformResult<usize> {
        Ok(self.path_to_root(frame)?.len() - 1)
    }
}

impl Default for FrameHierarchy {
    fn default() -> Self {
        Self::iec61217()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iec_table_is_valid() {
        assert!(FrameHierarchy::from_adjacency(IEC61217_ADJACENCY).is_ok());
    }

    #[test]
    fn test_iec_edges() {
        let hierarchy = FrameHierarchy::iec61217();
        let edges = hierarchy.edges();
        assert_eq!(edges.len(), 14);
        assert_eq!(edges[0], (Frame::FixedReference, Frame::Gantry));
        assert_eq!(edges[1], (Frame::FixedReference, Frame::PatientSupportRotation));
        assert_eq!(edges[2], (Frame::Gantry, Frame::Collimator));
        assert_eq!(
            edges.last().copied(),
            Some((Frame::Dicom, Frame::PatientImageRegularGrid))
        );
    }

    #[test]
    fn test_parents() {
        let hierarchy = FrameHierarchy::iec61217();
        assert_eq!(hierarchy.parent_of(Frame::FixedReference), None);
        assert_eq!(hierarchy.parent_of(Frame::Ras), Some(Frame::Patient));
        assert_eq!(hierarchy.parent_of(Frame::Dicom), Some(Frame::Patient));
        assert_eq!(
            hierarchy.parent_of(Frame::PatientSupport),
            Some(Frame::PatientSupportRotation)
        );
        assert_eq!(hierarchy.parent_of(Frame::FlatPanel), Some(Frame::Gantry));
        assert_eq!(hierarchy.parent_of(Frame::Imager), None);
        assert_eq!(hierarchy.parent_of(Frame::Focus), None);
    }

    #[test]
    fn test_children_order() {
        let hierarchy = FrameHierarchy::iec61217();
        assert_eq!(
            hierarchy.children_of(Frame::Gantry),
            &[
                Frame::Collimator,
                Frame::LeftImagingPanel,
                Frame::RightImagingPanel,
                Frame::FlatPanel
            ]
        );
        assert_eq!(hierarchy.children_of(Frame::Patient), &[Frame::Dicom, Frame::Ras]);
        assert!(hierarchy.children_of(Frame::WedgeFilter).is_empty());
    }

    #[test]
    fn test_every_edge_has_an_elementary_transform() {
        use crate::frames::Edge;
        let hierarchy = FrameHierarchy::iec61217();
        for (parent, child) in hierarchy.edges() {
            assert!(Edge::between(child, parent).is_some(), "{child} -> {parent}");
        }
        assert_eq!(hierarchy.edges().len(), Edge::COUNT);
    }

    #[test]
    fn test_depth() {
        let hierarchy = FrameHierarchy::iec61217();
        assert_eq!(hierarchy.depth(Frame::FixedReference).unwrap(), 0);
        assert_eq!(hierarchy.depth(Frame::TableTop).unwrap(), 3);
        assert_eq!(hierarchy.depth(Frame::Ras).unwrap(), 5);
        assert_eq!(hierarchy.depth(Frame::Gantry).unwrap(), 1);
        assert_eq!(hierarchy.depth(Frame::WedgeFilter).unwrap(), 3);
        assert_eq!(hierarchy.depth(Frame::Patient).unwrap(), 4);
        assert_eq!(hierarchy.depth(Frame::PatientImageRegularGrid).unwrap(), 6);
    }

    #[test]
    fn test_duplicate_parent() {
        let result = FrameHierarchy::from_adjacency(&[
            (Frame::FixedReference, &[Frame::Gantry]),
            (Frame::PatientSupportRotation, &[Frame::Gantry]),
        ]);
        assert_eq!(
            result,
            Err(TransformError::DuplicateParent {
                child: Frame::Gantry,
                first: Frame::FixedReference,
                second: Frame::PatientSupportRotation,
            })
        );
    }

    #[test]
    fn test_root_cannot_be_a_child() {
        let result = FrameHierarchy::from_adjacency(&[(Frame::Gantry, &[Frame::FixedReference])]);
        assert_eq!(result, Err(TransformError::RootHasParent(Frame::Gantry)));
    }

    #[test]
    fn test_cycle_detection() {
        let result = FrameHierarchy::from_adjacency(&[
            (Frame::Gantry, &[Frame::Collimator]),
            (Frame::Collimator, &[Frame::WedgeFilter]),
            (Frame::WedgeFilter, &[Frame::Gantry]),
        ]);
        assert!(matches!(result, Err(TransformError::CyclicHierarchy(_))));
    }

    #[test]
    fn test_detached_frame_is_accepted() {
        let hierarchy = FrameHierarchy::from_adjacency(&[
            (Frame::FixedReference, &[Frame::Gantry]),
            (Frame::Collimator, &[Frame::WedgeFilter]),
        ])
        .unwrap();
        assert!(hierarchy.contains(Frame::Gantry));
        assert!(!hierarchy.contains(Frame::WedgeFilter));
        assert!(!hierarchy.contains(Frame::Collimator));
    }
}
