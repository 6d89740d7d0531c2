// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Tridiag
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thomas algorithm for complex tridiagonal systems.
//!
//! One system per toroidal Fourier mode in the Laplacian inversion.

use emdrift_types::error::{DriftError, DriftResult};
use num_complex::Complex64;

/// Pivots smaller than this are treated as singular.
const PIVOT_FLOOR: f64 = 1e-300;

/// Solve tridiagonal system Ax = d using the Thomas algorithm.
///
/// - `a`: sub-diagonal \[n\] (a\[0\] unused)
/// - `b`: main diagonal \[n\]
/// - `c`: super-diagonal \[n\] (c\[n-1\] unused)
/// - `d`: right-hand side \[n\]
///
/// Returns the solution, or `SolverDiverged` naming the row whose pivot
/// vanished or went non-finite.
pub fn thomas_solve(
    a: &[Complex64],
    b: &[Complex64],
    c: &[Complex64],
    d: &[Complex64],
) -> DriftResult<Vec<Complex64>> {
    let n = d.len();
    if n == 0 || a.len() != n || b.len() != n || c.len() != n {
        return Err(DriftError::PhysicsViolation(format!(
            "Tridiagonal size mismatch: a={}, b={}, c={}, d={n}",
            a.len(),
            b.len(),
            c.len()
        )));
    }

    let zero = Complex64::new(0.0, 0.0);
    let mut c_prime = vec![zero; n];
    let mut d_prime = vec![zero; n];

    check_pivot(b[0], 0)?;
    c_prime[0] = c[0] / b[0];
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let den = b[i] - a[i] * c_prime[i - 1];
        check_pivot(den, i)?;
        if i < n - 1 {
            c_prime[i] = c[i] / den;
        }
        d_prime[i] = (d[i] - a[i] * d_prime[i - 1]) / den;
    }

    // Back substitution
    let mut x = vec![zero; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    if x.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
        return Err(DriftError::SolverDiverged {
            iteration: n,
            message: "Tridiagonal solution contains non-finite values".to_string(),
        });
    }
    Ok(x)
}

fn check_pivot(p: Complex64, row: usize) -> DriftResult<()> {
    if !p.re.is_finite() || !p.im.is_finite() || p.norm() < PIVOT_FLOOR {
        return Err(DriftError::SolverDiverged {
            iteration: row,
            message: format!("Singular pivot {p} in tridiagonal solve"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(v: &[f64]) -> Vec<Complex64> {
        v.iter().map(|x| Complex64::new(*x, 0.0)).collect()
    }

    #[test]
    fn test_thomas_identity() {
        let n = 5;
        let a = re(&vec![0.0; n]);
        let b = re(&vec![1.0; n]);
        let c = re(&vec![0.0; n]);
        let d = re(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let x = thomas_solve(&a, &b, &c, &d).unwrap();
        for i in 0..n {
            assert!((x[i] - d[i]).norm() < 1e-12, "x[{i}] should equal d[{i}]");
        }
    }

    #[test]
    fn test_thomas_simple_tridiag() {
        // [-1, 2, -1] 1D Laplacian
        let a = re(&[0.0, -1.0, -1.0, -1.0]);
        let b = re(&[2.0, 2.0, 2.0, 2.0]);
        let c = re(&[-1.0, -1.0, -1.0, 0.0]);
        let d = re(&[1.0, 0.0, 0.0, 1.0]);
        let x = thomas_solve(&a, &b, &c, &d).unwrap();

        let ax = [
            b[0] * x[0] + c[0] * x[1],
            a[1] * x[0] + b[1] * x[1] + c[1] * x[2],
            a[2] * x[1] + b[2] * x[2] + c[2] * x[3],
            a[3] * x[2] + b[3] * x[3],
        ];
        for i in 0..4 {
            assert!(
                (ax[i] - d[i]).norm() < 1e-10,
                "Ax[{i}] = {}, expected {}",
                ax[i],
                d[i]
            );
        }
    }

    #[test]
    fn test_thomas_complex_coefficients() {
        // Off-diagonals carry the g13 cross term: ±i*k*g13/dx
        let n = 6;
        let i_k = Complex64::new(0.0, 0.3);
        let a: Vec<Complex64> = (0..n).map(|_| Complex64::new(1.0, 0.0) - i_k).collect();
        let b = vec![Complex64::new(-4.0, 0.0); n];
        let c: Vec<Complex64> = (0..n).map(|_| Complex64::new(1.0, 0.0) + i_k).collect();
        let d: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new(i as f64, -(i as f64) * 0.5))
            .collect();
        let x = thomas_solve(&a, &b, &c, &d).unwrap();
        for i in 0..n {
            let mut ax = b[i] * x[i];
            if i > 0 {
                ax += a[i] * x[i - 1];
            }
            if i < n - 1 {
                ax += c[i] * x[i + 1];
            }
            assert!((ax - d[i]).norm() < 1e-10, "row {i} residual too large");
        }
    }

    #[test]
    fn test_thomas_reports_singular_pivot() {
        let a = re(&[0.0, 1.0, 1.0]);
        let b = re(&[1.0, 1.0, 1.0]);
        let c = re(&[1.0, 1.0, 0.0]);
        let d = re(&[1.0, 1.0, 1.0]);
        // Row 1 pivot: 1 - 1*1 = 0
        match thomas_solve(&a, &b, &c, &d) {
            Err(DriftError::SolverDiverged { iteration, .. }) => assert_eq!(iteration, 1),
            other => panic!("expected singular pivot, got {other:?}"),
        }
    }

    #[test]
    fn test_thomas_rejects_size_mismatch() {
        let a = re(&[0.0, 1.0]);
        let b = re(&[1.0]);
        assert!(thomas_solve(&a, &b, &a, &a).is_err());
    }
}
