use std::mem;

use log::{debug, trace};
use thiserror::Error;

use crate::matrix::Matrix;
use crate::scalar::{is_negative, is_positive, Scalar};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("tableau invariant violated: {0}")]
    Internal(&'static str),
}

/// A canonical tableau paired with its nonbasic/basic column lists.
///
/// Row 0 is the objective row: reduced costs in the variable columns, and
/// the negated current objective value in the last column. Rows `1..n` are
/// constraint rows whose last-column entries are the basic-variable values.
/// Every basic column is a unit column with its `one` in a unique constraint
/// row; pivots mutate the matrix in place and rebuild both lists.
#[derive(Debug, Clone, PartialEq)]
pub struct System<T> {
    matrix: Matrix<T>,
    nonbasic: Vec<usize>,
    basic: Vec<usize>,
}

impl<T: Scalar> System<T> {
    /// Assembles a system without validation. Testing hook.
    pub fn from_parts(matrix: Matrix<T>, nonbasic: Vec<usize>, basic: Vec<usize>) -> Self {
        Self {
            matrix,
            nonbasic,
            basic,
        }
    }

    /// Destructures into `(matrix, nonbasic, basic)`. Testing hook.
    pub fn into_parts(self) -> (Matrix<T>, Vec<usize>, Vec<usize>) {
        (self.matrix, self.nonbasic, self.basic)
    }

    pub fn matrix(&self) -> &Matrix<T> {
        &self.matrix
    }

    pub fn nonbasic(&self) -> &[usize] {
        &self.nonbasic
    }

    pub fn basic(&self) -> &[usize] {
        &self.basic
    }

    /// The current objective value, read out of the top-right cell (which
    /// stores its negation).
    pub fn objective(&self) -> T {
        let (_, cols) = self.matrix.dimensions();
        -self.matrix.get(0, cols - 1).clone()
    }

    /// Current values of the first `count` columns: basic columns take the
    /// right-hand side of their unit row, nonbasic columns are zero.
    pub fn variable_values(&self, count: usize) -> Vec<T> {
        let (_, cols) = self.matrix.dimensions();
        let mut values = vec![T::zero(); count];
        for &col in &self.basic {
            if col < count {
                if let Some(row) = self.unit_row(col) {
                    values[col] = self.matrix.get(row, cols - 1).clone();
                }
            }
        }
        values
    }

    /// The constraint row holding the `one` of a basic column. Row 0 is the
    /// objective row and is never searched.
    fn unit_row(&self, col: usize) -> Option<usize> {
        let (rows, _) = self.matrix.dimensions();
        (1..rows).find(|&row| self.matrix.get(row, col).is_one())
    }

    /// One Gauss-Jordan step: `entering` (nonbasic) swaps into the basis,
    /// `leaving` (basic) swaps out. Afterwards the entering column is a unit
    /// column with its `one` in the leaving column's old row, and the
    /// objective row has been swept along with the rest.
    pub fn pivot(&mut self, entering: usize, leaving: usize) -> Result<(), SolverError> {
        let (rows, _) = self.matrix.dimensions();
        let row = self
            .unit_row(leaving)
            .ok_or(SolverError::Internal("leaving column has no unit entry"))?;
        let piv = self.matrix.get(row, entering).clone();
        if piv.is_zero() {
            return Err(SolverError::Internal("pivot element is zero"));
        }
        self.matrix.scale_row(row, &(T::one() / piv));
        for other in 0..rows {
            if other == row {
                continue;
            }
            let factor = self.matrix.get(other, entering).clone();
            if factor.is_zero() {
                continue;
            }
            self.matrix.sub_mult(other, row, &factor);
        }
        trace!("pivot: column {entering} enters, column {leaving} leaves via row {row}");
        let basic = mem::take(&mut self.basic);
        let nonbasic = mem::take(&mut self.nonbasic);
        self.basic = std::iter::once(entering)
            .chain(basic.into_iter().filter(|&col| col != leaving))
            .collect();
        self.nonbasic = std::iter::once(leaving)
            .chain(nonbasic.into_iter().filter(|&col| col != entering))
            .collect();
        Ok(())
    }
}

enum Step {
    Enter(usize),
    Optimal,
    Unbounded,
}

/// Bland's entering rule: the lowest-index nonbasic column with a positive
/// reduced cost and at least one positive entry in a constraint row.
fn entering_column<T: Scalar>(sys: &System<T>) -> Step {
    let (rows, _) = sys.matrix.dimensions();
    let mut columns = sys.nonbasic.clone();
    columns.sort_unstable();
    let mut profitable = false;
    for col in columns {
        if !is_positive(sys.matrix.get(0, col)) {
            continue;
        }
        profitable = true;
        if (1..rows).any(|row| is_positive(sys.matrix.get(row, col))) {
            return Step::Enter(col);
        }
    }
    if profitable {
        Step::Unbounded
    } else {
        Step::Optimal
    }
}

/// Minimum-ratio test over the positive entries of the entering column,
/// keeping the earliest row on ties, then the basic column owning that row.
fn leaving_column<T: Scalar>(sys: &System<T>, entering: usize) -> Result<usize, SolverError> {
    let (rows, cols) = sys.matrix.dimensions();
    let mut best: Option<(T, usize)> = None;
    for row in 1..rows {
        let coeff = sys.matrix.get(row, entering);
        if !is_positive(coeff) {
            continue;
        }
        let ratio = sys.matrix.get(row, cols - 1).clone() / coeff.clone();
        let better = match &best {
            None => true,
            Some((current, _)) => ratio < *current,
        };
        if better {
            best = Some((ratio, row));
        }
    }
    let (_, pivot_row) = best.ok_or(SolverError::Internal(
        "entering column has no positive entry",
    ))?;
    sys.basic
        .iter()
        .copied()
        .find(|&col| sys.matrix.get(pivot_row, col).is_one())
        .ok_or(SolverError::Internal("no basic column owns the pivot row"))
}

/// Phase II: pivots until no nonbasic column can improve the objective.
/// Returns the maximized objective together with the final system, or
/// `Unbounded` when a profitable column has no positive constraint entry.
pub fn simple_solve<T: Scalar>(mut sys: System<T>) -> Result<(T, System<T>), SolverError> {
    loop {
        match entering_column(&sys) {
            Step::Optimal => {
                let objective = sys.objective();
                debug!("optimal, objective {objective}");
                return Ok((objective, sys));
            }
            Step::Unbounded => return Err(SolverError::Unbounded),
            Step::Enter(entering) => {
                let leaving = leaving_column(&sys, entering)?;
                sys.pivot(entering, leaving)?;
            }
        }
    }
}

/// Phase II, discarding the final tableau.
pub fn solve<T: Scalar>(sys: System<T>) -> Result<T, SolverError> {
    simple_solve(sys).map(|(objective, _)| objective)
}

/// Phase I. The input is tableau-shaped: row 0 carries the objective
/// coefficients with the constant in the last column, rows `1..m` carry the
/// constraint coefficients with the right-hand side in the last column.
/// Returns a feasible canonical system ready for phase II, or `None` when
/// the constraints admit no solution.
pub fn load_matrix<T: Scalar>(input: Matrix<T>) -> Result<Option<System<T>>, SolverError> {
    let (rows, cols) = input.dimensions();
    let mut min_row = 0;
    for row in 1..rows {
        if min_row == 0 || *input.get(row, cols - 1) < *input.get(min_row, cols - 1) {
            min_row = row;
        }
    }
    if min_row == 0 || !is_negative(input.get(min_row, cols - 1)) {
        debug!("origin is feasible, skipping the auxiliary problem");
        return Ok(Some(slack_system(&input)));
    }
    auxiliary_phase(&input, min_row)
}

/// The origin-feasible tableau: decision columns, a slack identity block,
/// and the right-hand side, with the objective constant negated into the
/// top-right cell.
fn slack_system<T: Scalar>(input: &Matrix<T>) -> System<T> {
    let (m, n) = input.dimensions();
    let vars = n - 1;
    let width = n + m - 1;
    let mut tableau = Matrix::zeros(m, width);
    for col in 0..vars {
        tableau.set(0, col, input.get(0, col).clone());
    }
    tableau.set(0, width - 1, -input.get(0, n - 1).clone());
    for row in 1..m {
        for col in 0..vars {
            tableau.set(row, col, input.get(row, col).clone());
        }
        tableau.set(row, vars + row - 1, T::one());
        tableau.set(row, width - 1, input.get(row, n - 1).clone());
    }
    System {
        matrix: tableau,
        nonbasic: (0..vars).collect(),
        basic: (vars..vars + m - 1).collect(),
    }
}

/// Solves the auxiliary problem `min x0` and, when its optimum is zero,
/// rebuilds the original objective over the feasible basis it found.
fn auxiliary_phase<T: Scalar>(
    input: &Matrix<T>,
    min_row: usize,
) -> Result<Option<System<T>>, SolverError> {
    let (m, n) = input.dimensions();
    let vars = n - 1;
    let aux = vars + m - 1;
    let width = n + m;
    let mut tableau = Matrix::zeros(m, width);
    tableau.set(0, aux, -T::one());
    for row in 1..m {
        for col in 0..vars {
            tableau.set(row, col, input.get(row, col).clone());
        }
        tableau.set(row, vars + row - 1, T::one());
        tableau.set(row, aux, -T::one());
        tableau.set(row, width - 1, input.get(row, n - 1).clone());
    }
    let mut sys = System {
        matrix: tableau,
        nonbasic: (0..vars).chain([aux]).collect(),
        basic: (vars..vars + m - 1).collect(),
    };

    // The forced pivot against the most negative row's slack makes every
    // right-hand side non-negative, a feasible start for the auxiliary LP.
    sys.pivot(aux, vars + min_row - 1)?;
    let (aux_objective, sys) = simple_solve(sys)?;
    if !aux_objective.is_zero() {
        debug!("auxiliary optimum {aux_objective} is non-zero, infeasible");
        return Ok(None);
    }
    restore_objective(sys, input, aux).map(Some)
}

/// Drops the auxiliary column, overwrites row 0 with the original objective
/// (constant negated into the top-right cell), and eliminates the basic
/// columns from it so the tableau is canonical again.
fn restore_objective<T: Scalar>(
    mut sys: System<T>,
    input: &Matrix<T>,
    aux: usize,
) -> Result<System<T>, SolverError> {
    if sys.basic.contains(&aux) {
        let row = sys
            .unit_row(aux)
            .ok_or(SolverError::Internal("auxiliary column has no unit entry"))?;
        let entering = sys
            .nonbasic
            .iter()
            .copied()
            .find(|&col| !sys.matrix.get(row, col).is_zero())
            .ok_or(SolverError::Internal(
                "no column available to drive out the auxiliary variable",
            ))?;
        debug!("driving the auxiliary variable out through column {entering}");
        sys.pivot(entering, aux)?;
    }

    let (_, n) = input.dimensions();
    let vars = n - 1;
    let (rows, old_width) = sys.matrix.dimensions();
    let width = old_width - 1;
    let mut reduced = Matrix::zeros(rows, width);
    for row in 0..rows {
        for col in 0..aux {
            reduced.set(row, col, sys.matrix.get(row, col).clone());
        }
        reduced.set(row, width - 1, sys.matrix.get(row, old_width - 1).clone());
    }

    let mut objective = vec![T::zero(); width];
    objective[..vars].clone_from_slice(&input.row(0)[..vars]);
    objective[width - 1] = -input.get(0, n - 1).clone();
    reduced.set_row(0, &objective);

    let mut sys = System {
        matrix: reduced,
        nonbasic: sys.nonbasic.iter().copied().filter(|&col| col != aux).collect(),
        basic: sys.basic.clone(),
    };
    for col in sys.basic.clone() {
        let coeff = sys.matrix.get(0, col).clone();
        if coeff.is_zero() {
            continue;
        }
        let row = sys
            .unit_row(col)
            .ok_or(SolverError::Internal("basic column has no unit entry"))?;
        sys.matrix.sub_mult(0, row, &coeff);
    }
    debug!("feasible basis found, objective restored");
    Ok(sys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_rational::Ratio;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Checks the tableau invariants: the column lists partition the
    /// variable columns, and every basic column is a unit column with its
    /// `one` in a constraint row.
    fn assert_canonical(sys: &System<f64>) {
        let (rows, cols) = sys.matrix().dimensions();
        let mut seen = vec![false; cols - 1];
        for &col in sys.basic().iter().chain(sys.nonbasic()) {
            assert!(col < cols - 1, "column {col} out of range");
            assert!(!seen[col], "column {col} listed twice");
            seen[col] = true;
        }
        assert!(seen.iter().all(|&s| s), "column lists do not cover the tableau");
        assert_eq!(sys.basic().len(), rows - 1);
        for &col in sys.basic() {
            let mut ones = 0;
            assert_eq!(*sys.matrix().get(0, col), 0.0, "objective entry of basic column {col}");
            for row in 1..rows {
                let cell = *sys.matrix().get(row, col);
                if cell == 1.0 {
                    ones += 1;
                } else {
                    assert_eq!(cell, 0.0, "column {col} is not a unit column");
                }
            }
            assert_eq!(ones, 1, "column {col} is not a unit column");
        }
    }

    fn assert_feasible(sys: &System<f64>) {
        let (rows, cols) = sys.matrix().dimensions();
        for row in 1..rows {
            assert!(
                *sys.matrix().get(row, cols - 1) >= 0.0,
                "negative right-hand side in row {row}"
            );
        }
    }

    fn loaded(rows: Vec<Vec<f64>>) -> System<f64> {
        let sys = load_matrix(Matrix::from_rows(rows)).unwrap().expect("feasible");
        assert_canonical(&sys);
        assert_feasible(&sys);
        sys
    }

    #[test]
    fn test_make_break_roundtrip() {
        let matrix = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 2.0]]);
        let sys = System::from_parts(matrix.clone(), vec![0], vec![1]);
        let (back, nonbasic, basic) = sys.into_parts();
        assert_eq!(back, matrix);
        assert_eq!(nonbasic, vec![0]);
        assert_eq!(basic, vec![1]);
    }

    #[test]
    fn test_pivot_swaps_unit_columns() {
        init();
        // max x subject to x <= 4 after phase I.
        let mut sys = loaded(vec![vec![1.0, 0.0], vec![1.0, 4.0]]);
        sys.pivot(0, 1).unwrap();
        assert_canonical(&sys);
        assert_eq!(sys.basic(), &[0]);
        assert_eq!(sys.nonbasic(), &[1]);
        assert_relative_eq!(sys.objective(), 4.0);
    }

    #[test]
    fn test_pivot_rejects_zero_element() {
        // Column 1 has a zero in column 0's unit row.
        let matrix = Matrix::from_rows(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 2.0],
            vec![0.0, 0.0, 1.0, 3.0],
        ]);
        let mut sys = System::from_parts(matrix, vec![1], vec![0, 2]);
        assert_eq!(
            sys.pivot(1, 0),
            Err(SolverError::Internal("pivot element is zero"))
        );
    }

    #[test]
    fn test_objective_is_monotone_under_phase_two_pivots() {
        init();
        let mut sys = loaded(vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
        ]);
        let mut last = sys.objective();
        loop {
            let entering = match entering_column(&sys) {
                Step::Enter(col) => col,
                _ => break,
            };
            let leaving = leaving_column(&sys, entering).unwrap();
            sys.pivot(entering, leaving).unwrap();
            assert_canonical(&sys);
            let current = sys.objective();
            assert!(current >= last, "objective regressed: {current} < {last}");
            last = current;
        }
        assert_relative_eq!(last, 2.0);
    }

    #[test]
    fn test_two_bounds_optimum() {
        init();
        // max x + y subject to x <= 1, y <= 1.
        let sys = loaded(vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
        ]);
        let (objective, sys) = simple_solve(sys).unwrap();
        assert_relative_eq!(objective, 2.0);
        assert_canonical(&sys);
        assert_eq!(sys.variable_values(2), vec![1.0, 1.0]);
    }

    #[test]
    fn test_unbounded_ray() {
        init();
        // max x subject to -x <= 1.
        let sys = loaded(vec![vec![1.0, 0.0], vec![-1.0, 1.0]]);
        assert_eq!(solve(sys), Err(SolverError::Unbounded));
    }

    #[test]
    fn test_infeasible_constraints() {
        init();
        // max x subject to x <= -1, x >= 0.
        let result = load_matrix(Matrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![1.0, -1.0],
            vec![-1.0, 0.0],
        ]))
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_degenerate_problem_terminates() {
        init();
        // Chvatal's cycling example; the lowest-index rule must reach the
        // optimum instead of looping.
        let sys = loaded(vec![
            vec![10.0, -57.0, -9.0, -24.0, 0.0],
            vec![0.5, -5.5, -2.5, 9.0, 0.0],
            vec![0.5, -1.5, -0.5, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0, 1.0],
        ]);
        let (objective, sys) = simple_solve(sys).unwrap();
        assert_relative_eq!(objective, 1.0);
        assert_canonical(&sys);
        assert_relative_eq!(sys.variable_values(4)[0], 1.0);
    }

    #[test]
    fn test_equality_split_goes_through_the_auxiliary() {
        init();
        // max x + y subject to x + y = 1, split into two inequalities; the
        // negative right-hand side forces the auxiliary problem.
        let sys = loaded(vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 1.0, 1.0],
            vec![-1.0, -1.0, -1.0],
        ]);
        let (objective, _) = simple_solve(sys).unwrap();
        assert_relative_eq!(objective, 1.0);
    }

    #[test]
    fn test_min_conversion_shape() {
        init();
        // min 3x + 2y subject to x + y >= 4, x <= 10, y <= 10, arriving
        // pre-negated from the parser. Non-square: 3 constraints, 2 vars.
        let sys = loaded(vec![
            vec![-3.0, -2.0, 0.0],
            vec![-1.0, -1.0, -4.0],
            vec![1.0, 0.0, 10.0],
            vec![0.0, 1.0, 10.0],
        ]);
        let (objective, sys) = simple_solve(sys).unwrap();
        assert_relative_eq!(objective, -8.0);
        assert_eq!(sys.variable_values(2), vec![0.0, 4.0]);
    }

    #[test]
    fn test_redundant_constraint_keeps_optimum() {
        init();
        // x + y <= 2 is the sum of the two bounds and must not change
        // anything.
        let sys = loaded(vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 1.0, 2.0],
        ]);
        assert_relative_eq!(solve(sys).unwrap(), 2.0);
    }

    #[test]
    fn test_objective_constant_is_carried() {
        init();
        // max x + 5 subject to x <= 1.
        let sys = loaded(vec![vec![1.0, 5.0], vec![1.0, 1.0]]);
        assert_relative_eq!(solve(sys).unwrap(), 6.0);
    }

    #[test]
    fn test_exact_arithmetic_over_rationals() {
        init();
        let ratio = |n: i64, d: i64| Ratio::new(n, d);
        let sys = load_matrix(Matrix::from_rows(vec![
            vec![ratio(1, 1), ratio(1, 1), ratio(0, 1)],
            vec![ratio(1, 1), ratio(1, 1), ratio(1, 1)],
            vec![ratio(-1, 1), ratio(-1, 1), ratio(-1, 1)],
        ]))
        .unwrap()
        .expect("feasible");
        let (objective, _) = simple_solve(sys).unwrap();
        assert_eq!(objective, ratio(1, 1));
    }

    #[test]
    fn test_auxiliary_values_are_exact_rationals() {
        init();
        let ratio = |n: i64, d: i64| Ratio::new(n, d);
        let sys = load_matrix(Matrix::from_rows(vec![
            vec![ratio(-3, 1), ratio(-2, 1), ratio(0, 1)],
            vec![ratio(-1, 1), ratio(-1, 1), ratio(-4, 1)],
            vec![ratio(1, 1), ratio(0, 1), ratio(10, 1)],
            vec![ratio(0, 1), ratio(1, 1), ratio(10, 1)],
        ]))
        .unwrap()
        .expect("feasible");
        let (objective, sys) = simple_solve(sys).unwrap();
        assert_eq!(objective, ratio(-8, 1));
        assert_eq!(sys.variable_values(2), vec![ratio(0, 1), ratio(4, 1)]);
    }
}
