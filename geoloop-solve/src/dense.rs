use crate::SolveError;

const PIVOT_TOLERANCE: f64 = 1e-14;

/// Solves the dense system `a·x = b` by Gaussian elimination with partial
/// pivoting.
///
/// `a` is given row-major and consumed as scratch space.
///
/// # Errors
///
/// Returns [`SolveError::Empty`] for an empty system,
/// [`SolveError::LengthMismatch`] if `b` or any row of `a` has the wrong
/// length, and [`SolveError::Singular`] if a column has no usable pivot.
pub fn solve_dense(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, SolveError> {
    let n = a.len();
    if n == 0 {
        return Err(SolveError::Empty);
    }
    if b.len() != n {
        return Err(SolveError::LengthMismatch {
            expected: n,
            found: b.len(),
        });
    }
    if let Some(row) = a.iter().find(|row| row.len() != n) {
        return Err(SolveError::LengthMismatch {
            expected: n,
            found: row.len(),
        });
    }

    for col in 0..n {
        let (pivot_row, pivot_val) = (col..n)
            .map(|r| (r, a[r][col].abs()))
            .fold((col, -1.0), |best, cand| if cand.1 > best.1 { cand } else { best });

        if !(pivot_val > PIVOT_TOLERANCE) {
            return Err(SolveError::Singular { column: col });
        }

        if pivot_row != col {
            a.swap(pivot_row, col);
            b.swap(pivot_row, col);
        }

        let pivot = a[col][col];
        for r in (col + 1)..n {
            let factor = a[r][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            a[r][col] = 0.0;
            for c in (col + 1)..n {
                a[r][c] -= factor * a[col][c];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|c| a[i][c] * x[c]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }

    Ok(x)
}
