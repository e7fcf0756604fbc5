use crate::error::{TransformError, TransformResult};
use crate::frames::Frame;
use crate::hierarchy::FrameHierarchy;
use log::debug;

impl FrameHierarchy {
    /// Frames from `frame` up to the root, both included.
    pub fn path_to_root(&self, frame: Frame) -> TransformResult<Vec<Frame>> {
        let mut path = vec![frame];
        let mut current = frame;

        while current != Frame::ROOT {
            // A well formed tree never needs more steps than it has frames.
            if path.len() > Frame::COUNT {
                return Err(TransformError::CyclicHierarchy(frame));
            }
            let parent = self
                .parent_of(current)
                .ok_or(TransformError::FrameNotInHierarchy(current))?;
            debug!("path_to_root: \"{current}\" -> \"{parent}\"");
            path.push(parent);
            current = parent;
        }

        Ok(path)
    }

    /// Frames from the root down to `frame`, both included.
    pub fn path_from_root(&self, frame: Frame) -> TransformResult<Vec<Frame>> {
        let mut path = self.path_to_root(frame)?;
        path.reverse();
        Ok(path)
    }
}
