use std::fmt;

// Shape — N-dimensional shape and Horner (mixed-radix) indexing
//
// A Shape lists the length of every axis of a tensor. Values are stored in a
// single flat buffer, and a coordinate maps onto that buffer with Horner's
// scheme, FIRST axis varying fastest:
//
//   index = c0 + d0 * (c1 + d1 * (c2 + d2 * (...)))
//         = Σ c[i] · Π_{j<i} d[j]
//
// For dims [2, 3, 4] the per-axis weights are [1, 2, 6]:
//   (0, 0, 0) → 0,  (1, 0, 0) → 1,  (0, 1, 0) → 2,  (0, 0, 1) → 6
//
// This is the reverse of the usual row-major convention. Every iterator in
// this crate walks coordinates in the same order, so a region copied
// coordinate-by-coordinate lands in its own buffer at consecutive indices.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    /// A rank-0 shape holds a single element.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> crate::Result<usize> {
        self.0.get(d).copied().ok_or(crate::Error::RankMismatch {
            expected: d + 1,
            got: self.rank(),
        })
    }

    /// Whether every axis has a positive length.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|&d| d > 0)
    }

    /// Per-axis weights of the Horner scheme: `[1, d0, d0*d1, ...]`.
    pub fn horner_weights(&self) -> Vec<usize> {
        let mut weights = Vec::with_capacity(self.rank());
        let mut product = 1;
        for &d in &self.0 {
            weights.push(product);
            product *= d;
        }
        weights
    }

    /// Flat index of `coords`. Coordinates are not bounds-checked.
    pub fn index_of(&self, coords: &[usize]) -> usize {
        coords_to_horner(coords, &self.0)
    }

    /// Coordinates of flat index `index`.
    pub fn coords_of(&self, index: usize) -> Vec<usize> {
        horner_to_coords(index, &self.0)
    }

    /// Whether `coords` has this shape's rank and lies inside every axis.
    pub fn contains(&self, coords: &[usize]) -> bool {
        coords.len() == self.rank() && coords.iter().zip(&self.0).all(|(&c, &d)| c < d)
    }

    /// Extend with trailing axes of length 1 up to `rank`. Never truncates.
    pub fn extend_to_rank(&self, rank: usize) -> Shape {
        let mut dims = self.0.clone();
        if dims.len() < rank {
            dims.resize(rank, 1);
        }
        Shape(dims)
    }

    /// A copy of this shape with one more trailing axis.
    pub fn with_trailing(&self, len: usize) -> Shape {
        let mut dims = self.0.clone();
        dims.push(len);
        Shape(dims)
    }

    /// This shape without its trailing axis (a rank-0 shape stays rank 0).
    pub fn without_trailing(&self) -> Shape {
        let mut dims = self.0.clone();
        dims.pop();
        Shape(dims)
    }
}

/// Convert a coordinate vector to a flat index: `i = c0 + d0*(c1 + d1*(c2 + ...))`.
pub fn coords_to_horner(coords: &[usize], dims: &[usize]) -> usize {
    let mut index = 0;
    let mut product = 1;
    for (&c, &d) in coords.iter().zip(dims) {
        index += c * product;
        product *= d;
    }
    index
}

/// Convert a flat index back into a coordinate vector, peeling the fastest
/// axis off first.
pub fn horner_to_coords(mut index: usize, dims: &[usize]) -> Vec<usize> {
    let mut coords = Vec::with_capacity(dims.len());
    for &d in dims {
        coords.push(index % d);
        index /= d;
    }
    coords
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Convenient From implementations
// These let you write: Shape::from((28, 28)) instead of Shape::new(vec![28, 28])

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize,)> for Shape {
    fn from((d0,): (usize,)) -> Self {
        Shape(vec![d0])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(a: [usize; N]) -> Self {
        Shape(a.to_vec())
    }
}

impl From<&Shape> for Shape {
    fn from(s: &Shape) -> Self {
        s.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::from(());
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 1);
        assert_eq!(s.horner_weights(), Vec::<usize>::new());
    }

    #[test]
    fn test_3d_weights() {
        let s = Shape::from((2, 3, 4));
        // first axis fastest: [1, 2, 2*3]
        assert_eq!(s.horner_weights(), vec![1, 2, 6]);
        assert_eq!(s.elem_count(), 24);
    }

    #[test]
    fn test_index_of() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.index_of(&[0, 0, 0]), 0);
        assert_eq!(s.index_of(&[1, 0, 0]), 1);
        assert_eq!(s.index_of(&[0, 0, 2]), 12);
        assert_eq!(s.index_of(&[1, 2, 3]), 23);
    }

    #[test]
    fn test_large_index() {
        let s = Shape::from(vec![3, 5, 2, 3, 6, 8, 2, 3]);
        assert_eq!(s.index_of(&[0, 4, 1, 2, 5, 7, 1, 2]), 8640 * 3 - 3);
    }

    #[test]
    fn test_coords_roundtrip() {
        let dims = [4, 1, 3, 2];
        let count: usize = dims.iter().product();
        for i in 0..count {
            let coords = horner_to_coords(i, &dims);
            assert_eq!(coords_to_horner(&coords, &dims), i);
        }
    }

    #[test]
    fn test_extend_and_trailing() {
        let s = Shape::from((3, 3));
        assert_eq!(s.extend_to_rank(4), Shape::from((3, 3, 1, 1)));
        assert_eq!(s.extend_to_rank(1), s);
        assert_eq!(s.with_trailing(8), Shape::from((3, 3, 8)));
        assert_eq!(Shape::from((3, 3, 8)).without_trailing(), s);
    }

    #[test]
    fn test_contains() {
        let s = Shape::from((2, 3));
        assert!(s.contains(&[1, 2]));
        assert!(!s.contains(&[2, 0]));
        assert!(!s.contains(&[0, 0, 0]));
    }

    #[test]
    fn test_display() {
        let s = Shape::from((28, 28));
        assert_eq!(format!("{}", s), "[28, 28]");
    }
}
