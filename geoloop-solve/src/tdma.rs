use crate::SolveError;

/// Solves a tri-diagonal linear system with the Thomas algorithm.
///
/// Row `i` of the system reads `a[i]·x[i-1] + b[i]·x[i] + c[i]·x[i+1] = d[i]`.
/// The first entry of `a` and the last entry of `c` are ignored.
///
/// # Errors
///
/// Returns [`SolveError::Empty`] for an empty system,
/// [`SolveError::LengthMismatch`] if the four sequences differ in length, and
/// [`SolveError::ZeroPivot`] if forward elimination hits a zero pivot.
pub fn tdma(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> Result<Vec<f64>, SolveError> {
    let n = d.len();
    if n == 0 {
        return Err(SolveError::Empty);
    }
    for len in [a.len(), b.len(), c.len()] {
        if len != n {
            return Err(SolveError::LengthMismatch {
                expected: n,
                found: len,
            });
        }
    }

    let mut c_prime = vec![0.0; n];
    let mut x = vec![0.0; n];

    let pivot = check_pivot(b[0], b[0], 0)?;
    c_prime[0] = c[0] / pivot;
    x[0] = d[0] / pivot;

    for i in 1..n {
        let eliminated = a[i] * c_prime[i - 1];
        let pivot = check_pivot(b[i] - eliminated, b[i].abs().max(eliminated.abs()), i)?;
        c_prime[i] = c[i] / pivot;
        x[i] = (d[i] - a[i] * x[i - 1]) / pivot;
    }

    for i in (0..n - 1).rev() {
        x[i] -= c_prime[i] * x[i + 1];
    }

    Ok(x)
}

/// Rejects a pivot that is zero relative to the terms it was formed from.
fn check_pivot(pivot: f64, scale: f64, row: usize) -> Result<f64, SolveError> {
    if pivot.abs() <= f64::EPSILON * 4.0 * scale.abs() || !pivot.is_finite() {
        Err(SolveError::ZeroPivot { row })
    } else {
        Ok(pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn identity_returns_rhs() -> Result<(), SolveError> {
        let n = 4;
        let x = tdma(&vec![0.0; n], &vec![1.0; n], &vec![0.0; n], &[1.0, 2.0, 3.0, 4.0])?;
        assert_eq!(x, vec![1.0, 2.0, 3.0, 4.0]);
        Ok(())
    }

    #[test]
    fn single_unknown() -> Result<(), SolveError> {
        let x = tdma(&[0.0], &[4.0], &[0.0], &[2.0])?;
        assert_relative_eq!(x[0], 0.5);
        Ok(())
    }

    #[test]
    fn laplacian_with_unit_source() -> Result<(), SolveError> {
        // -x[i-1] + 2x[i] - x[i+1] = 1 with zero Dirichlet ends has the
        // discrete solution x[i] = (i + 1)(n - i) / 2.
        let n = 9;
        let a = vec![-1.0; n];
        let b = vec![2.0; n];
        let c = vec![-1.0; n];
        let d = vec![1.0; n];

        let x = tdma(&a, &b, &c, &d)?;
        for (i, value) in x.iter().enumerate() {
            let expected = ((i + 1) * (n - i)) as f64 / 2.0;
            assert_relative_eq!(*value, expected, max_relative = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn flux_and_fixed_boundary_rows() -> Result<(), SolveError> {
        // Mirrors the radial model rows: a flux row, an interior row, and a
        // fixed-value row.
        let a = [0.0, -1.0, 0.0];
        let b = [-2.0, 3.0, 1.0];
        let c = [1.0, -1.0, 0.0];
        let d = [-3.0, 2.0, 5.0];

        let x = tdma(&a, &b, &c, &d)?;
        assert_relative_eq!(x[2], 5.0);
        assert_relative_eq!(-2.0 * x[0] + x[1], -3.0, epsilon = 1e-12);
        assert_relative_eq!(-x[0] + 3.0 * x[1] - x[2], 2.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn zero_pivot_is_an_error() {
        let result = tdma(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]);
        assert_eq!(result, Err(SolveError::ZeroPivot { row: 0 }));

        // Elimination cancels the second pivot: 1 - 1·(1/1) = 0.
        let result = tdma(&[0.0, 1.0], &[1.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]);
        assert_eq!(result, Err(SolveError::ZeroPivot { row: 1 }));
    }

    #[test]
    fn round_off_pivot_is_an_error() {
        // Row two is ten times row one, but 0.3 / 0.1 is not exactly 3 so
        // elimination leaves a residue of a few ulps instead of zero.
        let result = tdma(&[0.0, 1.0], &[0.1, 3.0], &[0.3, 0.0], &[1.0, 1.0]);
        assert_eq!(result, Err(SolveError::ZeroPivot { row: 1 }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = tdma(&[0.0], &[1.0, 1.0], &[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(
            result,
            Err(SolveError::LengthMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(tdma(&[], &[], &[], &[]), Err(SolveError::Empty));
    }
}
