use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use tabula_solver::{load_matrix, Matrix, Scalar, SolverError, System};

use crate::ast::{Constraint, Direction, Program, Relation};
use crate::parser::{ParseError, Parser};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("improper input: {0}")]
    ImproperInput(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Lowers a parsed program into the tableau-shaped matrix phase I consumes.
///
/// The engine always maximizes, so `min` objectives have every coefficient
/// except the constant negated. `<=` rows pass through, `>=` rows are fully
/// negated, and `=` rows are emitted twice, once in each orientation.
pub fn tableau_matrix<T: Scalar>(program: &Program<T>) -> Matrix<T> {
    let vars = program.num_variables();
    let mut rows = Vec::with_capacity(1 + 2 * program.num_constraints());
    let mut objective = program.objective.clone();
    if program.direction == Direction::Minimize {
        for coeff in &mut objective[..vars] {
            *coeff = -coeff.clone();
        }
    }
    rows.push(objective);
    for constraint in &program.constraints {
        match constraint.relation {
            Relation::Le => rows.push(constraint_row(constraint, false)),
            Relation::Ge => rows.push(constraint_row(constraint, true)),
            Relation::Eq => {
                rows.push(constraint_row(constraint, false));
                rows.push(constraint_row(constraint, true));
            }
        }
    }
    Matrix::from_rows(rows)
}

fn constraint_row<T: Scalar>(constraint: &Constraint<T>, negate: bool) -> Vec<T> {
    let mut row = constraint.coefficients.clone();
    row.push(constraint.rhs.clone());
    if negate {
        for cell in &mut row {
            *cell = -cell.clone();
        }
    }
    row
}

/// Parses an LP source and runs phase I on it. `Ok(None)` means the
/// constraints are infeasible.
pub fn load_str<T: Scalar>(source: &str) -> Result<Option<System<T>>, LoadError> {
    let program = Parser::parse::<T>(source)?;
    debug!(
        "parsed program: {} variables, {} constraints",
        program.num_variables(),
        program.num_constraints()
    );
    Ok(load_matrix(tableau_matrix(&program))?)
}

/// Reads a file, parses it, and runs phase I.
pub fn load_file<T: Scalar>(path: impl AsRef<Path>) -> Result<Option<System<T>>, LoadError> {
    let source = fs::read_to_string(path)?;
    load_str(&source)
}
