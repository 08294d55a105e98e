use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("lattice dimensions must be positive, got {length} x {width} x {height}")]
    BadDimensions {
        length: i32,
        width: i32,
        height: i32,
    },

    #[error("position ({x}, {y}, {z}) is outside the lattice")]
    OutOfBounds { x: i32, y: i32, z: i32 },

    #[error("site index {0} is outside the lattice")]
    BadIndex(i32),

    #[error("{name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },
}

pub type LatticeResult<T> = Result<T, LatticeError>;
