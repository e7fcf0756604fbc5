//! Index conversions for DICOM pixel data stacked by slice position as a regular grid.
//!
//! Dimension 0 is the slice index, dimension 1 the row index and dimension 2 the column index,
//! all starting at zero. Pixel data is stored row-major (C order): the last dimension is
//! contiguous in memory and the first one is the most distant.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridIndexError {
    #[error(
        "Indices ({},{},{}) out of range ({},{},{})",
        .index[0], .index[1], .index[2], .dims[0], .dims[1], .dims[2]
    )]
    OutOfRange { index: [u16; 3], dims: [u16; 3] },

    #[error("Index ({index}) out of range (totalElems = {total})")]
    LinearOutOfRange { index: u64, total: u64 },
}

pub type GridIndexResult<T> = Result<T, GridIndexError>;

/// Linear offset of `(e0, e1, e2)` in a grid of `dims` elements.
pub fn vectorized_to_linearized(index: [u16; 3], dims: [u16; 3]) -> GridIndexResult<u64> {
    let [e0, e1, e2] = index.map(u64::from);
    let [n0, n1, n2] = dims.map(u64::from);
    if e0 >= n0 || e1 >= n1 || e2 >= n2 {
        return Err(GridIndexError::OutOfRange { index, dims });
    }
    Ok(e0 * n1 * n2 + e1 * n2 + e2)
}

/// `(e0, e1, e2)` of the linear offset `index` in a grid of `dims` elements.
pub fn linearized_to_vectorized(index: u64, dims: [u16; 3]) -> GridIndexResult<[u16; 3]> {
    let [n0, n1, n2] = dims.map(u64::from);
    let total = n0 * n1 * n2;
    if index >= total {
        return Err(GridIndexError::LinearOutOfRange { index, total });
    }
    // every component is bounded by its dimension, which fits in u16
    let e0 = ((index / n2) / n1) as u16;
    let e1 = ((index / n2) % n1) as u16;
    let e2 = (index % n2) as u16;
    Ok([e0, e1, e2])
}

/// Number of slices, rows and columns of a regular grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDimensions(pub [u16; 3]);

impl GridDimensions {
    pub fn new(slices: u16, rows: u16, columns: u16) -> Self {
        Self([slices, rows, columns])
    }

    pub fn len(&self) -> u64 {
        self.0.iter().map(|n| u64::from(*n)).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn linearize(&self, index: [u16; 3]) -> GridIndexResult<u64> {
        vectorized_to_linearized(index, self.0)
    }

    pub fn vectorize(&self, index: u64) -> GridIndexResult<[u16; 3]> {
        linearized_to_vectorized(index, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_order() {
        let dims = [2, 3, 4];
        assert_eq!(vectorized_to_linearized([0, 0, 0], dims), Ok(0));
        assert_eq!(vectorized_to_linearized([0, 0, 1], dims), Ok(1));
        assert_eq!(vectorized_to_linearized([0, 1, 0], dims), Ok(4));
        assert_eq!(vectorized_to_linearized([1, 0, 0], dims), Ok(12));
        assert_eq!(vectorized_to_linearized([1, 2, 3], dims), Ok(23));
    }

    #[test]
    fn test_vectorize() {
        let dims = [2, 3, 4];
        assert_eq!(linearized_to_vectorized(0, dims), Ok([0, 0, 0]));
        assert_eq!(linearized_to_vectorized(13, dims), Ok([1, 0, 1]));
        assert_eq!(linearized_to_vectorized(23, dims), Ok([1, 2, 3]));
    }

    #[test]
    fn test_every_index_maps_back() {
        let dims = GridDimensions::new(3, 5, 7);
        for i in 0..dims.len() {
            let v = dims.vectorize(i).unwrap();
            assert_eq!(dims.linearize(v), Ok(i));
        }
    }

    #[test]
    fn test_large_grid_does_not_overflow() {
        let dims = [u16::MAX, u16::MAX, u16::MAX];
        let last = [u16::MAX - 1; 3];
        let n = u64::from(u16::MAX);
        assert_eq!(vectorized_to_linearized(last, dims), Ok(n * n * n - 1));
        assert_eq!(linearized_to_vectorized(n * n * n - 1, dims), Ok(last));
    }

    #[test]
    fn test_out_of_range() {
        let dims = [2, 3, 4];
        let err = vectorized_to_linearized([0, 3, 0], dims).unwrap_err();
        assert_eq!(
            err,
            GridIndexError::OutOfRange {
                index: [0, 3, 0],
                dims
            }
        );
        assert_eq!(err.to_string(), "Indices (0,3,0) out of range (2,3,4)");

        let err = linearized_to_vectorized(24, dims).unwrap_err();
        assert_eq!(err, GridIndexError::LinearOutOfRange { index: 24, total: 24 });
        assert_eq!(err.to_string(), "Index (24) out of range (totalElems = 24)");
    }

    #[test]
    fn test_empty_grid() {
        let dims = GridDimensions::new(0, 10, 10);
        assert!(dims.is_empty());
        assert!(dims.vectorize(0).is_err());
        assert!(dims.linearize([0, 0, 0]).is_err());
    }
}
