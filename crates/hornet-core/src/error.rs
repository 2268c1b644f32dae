use crate::shape::Shape;

/// All errors that can occur within hornet.
///
/// Every variant describes a programming or configuration mistake (a shape
/// that does not line up, a coordinate outside a tensor, a layer used out of
/// order). Computation is deterministic, so none of these are retryable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Shape mismatch between two operands or between a layer and its input.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Operation requires a specific rank (number of axes).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Element count mismatch when building a tensor from a value buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Direct (non-padded) access with a coordinate outside the tensor.
    #[error("coordinate {coords:?} out of bounds for tensor of shape {shape}")]
    IndexOutOfBounds { coords: Vec<usize>, shape: Shape },

    /// A shape with a zero-length axis.
    #[error("invalid shape {shape}: every axis must have a positive length")]
    InvalidShape { shape: Shape },

    /// A sliding window that does not fit inside the (padded) tensor.
    #[error("window {window:?} does not fit tensor of shape {shape} with padding {padding:?}")]
    WindowTooLarge {
        window: Vec<usize>,
        shape: Shape,
        padding: Vec<usize>,
    },

    /// Strides must be positive.
    #[error("invalid strides {strides:?}: every stride must be at least 1")]
    InvalidStride { strides: Vec<usize> },

    /// Two sequences that must pair up element-for-element differ in length.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// `backward` called on a layer that has not seen a matching `forward`.
    #[error("{layer}: backward called before forward")]
    NoForwardPass { layer: &'static str },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout hornet.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails() -> Result<()> {
        bail!("layer {} is misconfigured", 3)
    }

    #[test]
    fn test_bail_formats_message() {
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "layer 3 is misconfigured");
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            expected: Shape::from((2, 3)),
            got: Shape::from(6),
        };
        assert_eq!(err.to_string(), "shape mismatch: expected [2, 3], got [6]");
    }
}
