use nalgebra::Matrix3;
use std::f64::consts::PI;
use tracing::warn;

/// Sweep cap for the iterative Jacobi solver. Exceeding it is reported as a
/// diagnostic and the best approximation so far is used.
const MAX_SWEEPS: usize = 50;

/// Sweeps during which small off-diagonal entries are still rotated rather
/// than skipped.
const WARMUP_SWEEPS: usize = 4;

/// A strategy for eigen-decomposing a real symmetric 3×3 matrix.
///
/// Only the eigenvalues are exposed through this trait; the optimal-RMSD
/// computation needs nothing more. The two implementations cross-validate
/// each other in tests on random symmetric matrices.
pub trait SymmetricEigen3 {
    /// Returns the three eigenvalues in unspecified order, or `None` when
    /// the method cannot handle the matrix.
    fn eigenvalues(&self, m: &Matrix3<f64>) -> Option<[f64; 3]>;
}

/// Iterative cyclic-Jacobi eigen-solver.
///
/// Repeatedly eliminates off-diagonal entries with plane rotations until the
/// sum of their magnitudes vanishes or [`MAX_SWEEPS`] is reached. Follows
/// the classical formulation in Numerical Recipes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JacobiEigen;

/// Result of a full Jacobi decomposition.
#[derive(Debug, Clone)]
pub struct JacobiDecomposition {
    pub values: [f64; 3],
    /// Normalized eigenvectors, one per column, parallel to `values`.
    pub vectors: Matrix3<f64>,
    /// False when the sweep cap was hit; the values are then the best
    /// approximation reached.
    pub converged: bool,
}

impl JacobiEigen {
    /// Full decomposition with eigenvectors.
    pub fn decompose(&self, m: &Matrix3<f64>) -> JacobiDecomposition {
        let mut a = *m;
        let mut v = Matrix3::identity();
        let mut d = [a[(0, 0)], a[(1, 1)], a[(2, 2)]];

        for sweep in 0..MAX_SWEEPS {
            let off_sum: f64 =
                a[(0, 1)].abs() + a[(0, 2)].abs() + a[(1, 2)].abs();
            if off_sum == 0.0 {
                return JacobiDecomposition {
                    values: d,
                    vectors: v,
                    converged: true,
                };
            }

            // During the first sweeps rotate even small entries; afterwards
            // only entries above zero threshold.
            let threshold = if sweep < WARMUP_SWEEPS {
                0.2 * off_sum / 9.0
            } else {
                0.0
            };

            for i in 0..2 {
                for j in (i + 1)..3 {
                    let g = 100.0 * a[(i, j)].abs();
                    let negligible = sweep > WARMUP_SWEEPS
                        && d[i].abs() + g == d[i].abs()
                        && d[j].abs() + g == d[j].abs();

                    if negligible {
                        a[(i, j)] = 0.0;
                    } else if a[(i, j)].abs() > threshold {
                        let diff = d[j] - d[i];
                        let t = if diff.abs() + g == diff.abs() {
                            a[(i, j)] / diff
                        } else {
                            let theta = 0.5 * diff / a[(i, j)];
                            let t = 1.0 / (theta.abs() + (theta * theta + 1.0).sqrt());
                            if theta < 0.0 { -t } else { t }
                        };

                        let c = 1.0 / (t * t + 1.0).sqrt();
                        let s = t * c;
                        let tau = s / (1.0 + c);
                        let h = t * a[(i, j)];
                        d[i] -= h;
                        d[j] += h;
                        a[(i, j)] = 0.0;

                        let rotate = |m: &mut Matrix3<f64>, p: (usize, usize), q: (usize, usize)| {
                            let g = m[p];
                            let h = m[q];
                            m[p] = g - s * (h + tau * g);
                            m[q] = h + s * (g - tau * h);
                        };

                        // Only the upper triangle of `a` is maintained, so
                        // the rotation is applied in three index ranges.
                        for k in 0..i {
                            rotate(&mut a, (k, i), (k, j));
                        }
                        for k in (i + 1)..j {
                            rotate(&mut a, (i, k), (k, j));
                        }
                        for k in (j + 1)..3 {
                            rotate(&mut a, (i, k), (j, k));
                        }
                        for k in 0..3 {
                            rotate(&mut v, (k, i), (k, j));
                        }
                    }
                }
            }
        }

        warn!(
            sweeps = MAX_SWEEPS,
            "Jacobi eigen-solver did not converge; using best approximation"
        );
        JacobiDecomposition {
            values: d,
            vectors: v,
            converged: false,
        }
    }
}

impl SymmetricEigen3 for JacobiEigen {
    fn eigenvalues(&self, m: &Matrix3<f64>) -> Option<[f64; 3]> {
        Some(self.decompose(m).values)
    }
}

/// Closed-form eigen-solver via the characteristic cubic polynomial.
///
/// Solves the depressed cubic trigonometrically, which is valid only when
/// three distinct real roots exist. Degenerate spectra (repeated or complex
/// roots) report failure so the caller can defer to [`JacobiEigen`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicEigen;

impl SymmetricEigen3 for CubicEigen {
    fn eigenvalues(&self, m: &Matrix3<f64>) -> Option<[f64; 3]> {
        // det(M - λI) = 0  ⇔  λ³ + a2·λ² + a1·λ + a0 = 0
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];
        let minor_sum = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
            + m[(0, 0)] * m[(2, 2)]
            - m[(0, 2)] * m[(2, 0)]
            + m[(1, 1)] * m[(2, 2)]
            - m[(1, 2)] * m[(2, 1)];
        let a2 = -trace;
        let a1 = minor_sum;
        let a0 = -m.determinant();

        cubic_roots(a0, a1, a2)
    }
}

/// Real roots of z³ + a2·z² + a1·z + a0 via the depressed-cubic
/// substitution. `None` unless three distinct real roots exist.
fn cubic_roots(a0: f64, a1: f64, a2: f64) -> Option<[f64; 3]> {
    let q = (3.0 * a1 - a2 * a2) / 9.0;
    let r = (9.0 * a2 * a1 - 27.0 * a0 - 2.0 * a2 * a2 * a2) / 54.0;
    let q3 = q * q * q;

    // q³ + r² < 0 is the three-distinct-real-roots condition; it implies
    // q < 0, so the square roots below are real.
    if q3 + r * r >= 0.0 {
        return None;
    }

    let theta = (r / (-q3).sqrt()).acos();
    let scale = 2.0 * (-q).sqrt();
    let shift = a2 / 3.0;
    Some([
        scale * (theta / 3.0).cos() - shift,
        scale * ((theta + 2.0 * PI) / 3.0).cos() - shift,
        scale * ((theta + 4.0 * PI) / 3.0).cos() - shift,
    ])
}
