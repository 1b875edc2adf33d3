use super::eigen::{CubicEigen, JacobiEigen, SymmetricEigen3};
use crate::core::models::Decoy;
use nalgebra::Matrix3;

/// Variance below which a pair of structures is treated as geometrically
/// degenerate and given distance zero.
const DEGENERATE_NORM: f64 = 1e-12;

/// Minimum RMSD between two equal-length decoys over all rigid
/// superpositions (rotation + translation).
///
/// Both decoys are already centered, so only the rotation remains. The
/// squared deviation under the optimal rotation is a closed-form function of
/// the squared norms of both point sets and the eigenvalues of `M = RᵀR`,
/// where `R` is the 3×3 cross-covariance of the two sets:
///
/// ```text
/// n·rmsd² = |a|² + |b|² − 2(√λ₁ + √λ₂ ± √λ₃)
/// ```
///
/// The sign on the smallest eigenvalue follows `det(R)`, which rejects
/// reflections (improper rotations) from being selected as optimal.
///
/// The closed-form cubic eigen-solver is tried first; degenerate spectra
/// fall back to the iterative Jacobi solver. Numerically degenerate inputs
/// degrade to a zero distance rather than failing, so callers can rely on
/// this function being total.
pub fn exact_distance(a: &Decoy, b: &Decoy) -> f64 {
    let n = a.residue_count().min(b.residue_count());
    if n == 0 {
        return 0.0;
    }

    let norm_sum = a.squared_norm() + b.squared_norm();
    if norm_sum < DEGENERATE_NORM {
        return 0.0;
    }

    let mut r = Matrix3::zeros();
    for (pa, pb) in a.coords().iter().zip(b.coords()) {
        r += pa.coords * pb.coords.transpose();
    }

    let reflection_sign = if r.determinant() < 0.0 { -1.0 } else { 1.0 };
    let m = r.transpose() * r;

    let mut eigenvalues = match CubicEigen.eigenvalues(&m) {
        Some(values) => values,
        None => JacobiEigen
            .eigenvalues(&m)
            .unwrap_or([0.0, 0.0, 0.0]),
    };
    eigenvalues.sort_by(|x, y| y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal));

    // M is positive semidefinite; tiny negative eigenvalues are numerical
    // noise and are clamped before the square root.
    let root = |v: f64| v.max(0.0).sqrt();
    let correlation =
        root(eigenvalues[0]) + root(eigenvalues[1]) + reflection_sign * root(eigenvalues[2]);

    let msd = (norm_sum - 2.0 * correlation) / n as f64;
    msd.max(0.0).sqrt()
}

/// Cheap approximate distance from the per-residue centroid signatures.
///
/// For centered structures `||aᵢ| − |bᵢ|| ≤ |aᵢ − Q·bᵢ|` for every rotation
/// `Q`, so this is a lower bound on [`exact_distance`] and safe for
/// pre-filtering: a signature distance above the threshold proves the pair
/// is not a neighbor.
pub fn estimated_distance(a: &Decoy, b: &Decoy) -> f64 {
    let n = a.residue_count().min(b.residue_count());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a
        .signature()
        .iter()
        .zip(b.signature())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();
    (sum / n as f64).sqrt()
}
