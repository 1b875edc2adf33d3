use nalgebra::{Point3, Vector3};

/// One candidate 3D structural model of the molecule.
///
/// Coordinates are translated to centroid-zero on construction and are
/// immutable afterwards. Two derived quantities are cached because the
/// distance functions consume them on every pairwise comparison:
///
/// - the total squared norm of the centered coordinates, which enters the
///   closed-form optimal-RMSD expression, and
/// - a compact signature (distance of each residue to the centroid) used by
///   the cheap pre-filtering distance.
#[derive(Debug, Clone)]
pub struct Decoy {
    name: String,
    coords: Vec<Point3<f64>>,
    signature: Vec<f64>,
    squared_norm: f64,
}

impl Decoy {
    /// Builds a decoy from raw coordinates, centering them at their centroid.
    pub fn new(name: impl Into<String>, mut coords: Vec<Point3<f64>>) -> Self {
        center_at_centroid(&mut coords);

        let signature: Vec<f64> = coords.iter().map(|p| p.coords.norm()).collect();
        let squared_norm = coords.iter().map(|p| p.coords.norm_squared()).sum();

        Self {
            name: name.into(),
            coords,
            signature,
            squared_norm,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of residues (points) in this decoy.
    pub fn residue_count(&self) -> usize {
        self.coords.len()
    }

    /// Centered coordinates, one point per residue.
    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    /// Per-residue distances to the centroid, in residue order.
    pub fn signature(&self) -> &[f64] {
        &self.signature
    }

    /// Sum of squared norms of the centered coordinates.
    pub fn squared_norm(&self) -> f64 {
        self.squared_norm
    }
}

fn center_at_centroid(coords: &mut [Point3<f64>]) {
    if coords.is_empty() {
        return;
    }
    let centroid = coords
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / coords.len() as f64;
    for p in coords.iter_mut() {
        p.coords -= centroid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn sample_coords() -> Vec<Point3<f64>> {
        vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, 5.0, 6.0),
            Point3::new(7.0, 8.0, 12.0),
        ]
    }

    #[test]
    fn construction_centers_coordinates_at_centroid() {
        let decoy = Decoy::new("d1", sample_coords());
        let centroid: Vector3<f64> = decoy
            .coords()
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / decoy.residue_count() as f64;
        assert!(centroid.norm() < TOLERANCE);
    }

    #[test]
    fn signature_holds_distance_to_centroid_per_residue() {
        let decoy = Decoy::new("d1", sample_coords());
        for (p, sig) in decoy.coords().iter().zip(decoy.signature()) {
            assert!((p.coords.norm() - sig).abs() < TOLERANCE);
        }
    }

    #[test]
    fn squared_norm_matches_sum_over_centered_coordinates() {
        let decoy = Decoy::new("d1", sample_coords());
        let expected: f64 = decoy.coords().iter().map(|p| p.coords.norm_squared()).sum();
        assert!((decoy.squared_norm() - expected).abs() < TOLERANCE);
    }

    #[test]
    fn centering_is_idempotent_for_already_centered_input() {
        let first = Decoy::new("d1", sample_coords());
        let second = Decoy::new("d1", first.coords().to_vec());
        for (a, b) in first.coords().iter().zip(second.coords()) {
            assert!((a - b).norm() < TOLERANCE);
        }
    }

    #[test]
    fn empty_coordinate_array_is_tolerated() {
        let decoy = Decoy::new("empty", Vec::new());
        assert_eq!(decoy.residue_count(), 0);
        assert_eq!(decoy.squared_norm(), 0.0);
    }
}
