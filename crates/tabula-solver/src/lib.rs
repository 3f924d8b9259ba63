mod matrix;
mod scalar;
mod simplex;

pub use matrix::Matrix;
pub use scalar::Scalar;
pub use simplex::{load_matrix, simple_solve, solve, SolverError, System};
