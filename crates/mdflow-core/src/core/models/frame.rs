use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

const LENGTH_RELATIVE_TOLERANCE: f64 = 1e-3;
const ANGLE_TOLERANCE_DEGREES: f64 = 0.1;
const FCC_PRIMITIVE_ANGLE: f64 = 60.0;
const SC_ANGLE: f64 = 90.0;

/// Angle between two primitive vectors of a body-centered-cubic cell, `acos(-1/3)` in degrees.
fn bcc_primitive_angle() -> f64 {
    (-1.0f64 / 3.0).acos().to_degrees()
}

/// A periodic simulation cell, stored as three lattice vectors (rows `a`, `b`, `c`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    matrix: Matrix3<f64>,
}

impl Cell {
    pub fn from_vectors(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]),
        }
    }

    pub fn orthorhombic(lx: f64, ly: f64, lz: f64) -> Self {
        Self::from_vectors(
            Vector3::new(lx, 0.0, 0.0),
            Vector3::new(0.0, ly, 0.0),
            Vector3::new(0.0, 0.0, lz),
        )
    }

    pub fn cubic(length: f64) -> Self {
        Self::orthorhombic(length, length, length)
    }

    /// Builds a cell from its six scalar parameters, with `a` along x and `b` in the xy-plane.
    pub fn from_parameters(params: &CellParameters) -> Self {
        let (alpha, beta, gamma) = (
            params.alpha.to_radians(),
            params.beta.to_radians(),
            params.gamma.to_radians(),
        );
        let a = Vector3::new(params.a, 0.0, 0.0);
        let b = Vector3::new(params.b * gamma.cos(), params.b * gamma.sin(), 0.0);
        let cx = params.c * beta.cos();
        let cy = params.c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (params.c * params.c - cx * cx - cy * cy).max(0.0).sqrt();
        Self::from_vectors(a, b, Vector3::new(cx, cy, cz))
    }

    pub fn vectors(&self) -> [Vector3<f64>; 3] {
        [
            self.matrix.row(0).transpose(),
            self.matrix.row(1).transpose(),
            self.matrix.row(2).transpose(),
        ]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn lengths(&self) -> [f64; 3] {
        let [a, b, c] = self.vectors();
        [a.norm(), b.norm(), c.norm()]
    }

    /// Returns `[alpha, beta, gamma]` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = self.vectors();
        [
            angle_between(&b, &c),
            angle_between(&a, &c),
            angle_between(&a, &b),
        ]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn parameters(&self) -> CellParameters {
        let [a, b, c] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        CellParameters {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }
}

fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let denom = u.norm() * v.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (u.dot(v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Cell lengths (Å) and angles (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl fmt::Display for CellParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6} {:.6} {:.6} {:.4} {:.4} {:.4}",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

/// The Bravais lattice families the volume analysis knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatticeFamily {
    FaceCenteredCubic,
    BodyCenteredCubic,
    SimpleCubic,
    Unrecognized,
}

impl LatticeFamily {
    /// Classifies a cell by its parameters.
    ///
    /// Equal lengths are required for every recognized family. The angles then decide:
    /// 90° is simple cubic, 60° is the primitive face-centered-cubic cell, and
    /// `acos(-1/3)` is the primitive body-centered-cubic cell.
    pub fn detect(cell: &Cell) -> Self {
        let params = cell.parameters();
        let lengths = [params.a, params.b, params.c];
        let reference = params.a;
        if reference <= 0.0
            || lengths
                .iter()
                .any(|l| ((l - reference) / reference).abs() > LENGTH_RELATIVE_TOLERANCE)
        {
            return LatticeFamily::Unrecognized;
        }

        let angles = [params.alpha, params.beta, params.gamma];
        let all_near = |target: f64| {
            angles
                .iter()
                .all(|angle| (angle - target).abs() < ANGLE_TOLERANCE_DEGREES)
        };

        if all_near(SC_ANGLE) {
            LatticeFamily::SimpleCubic
        } else if all_near(FCC_PRIMITIVE_ANGLE) {
            LatticeFamily::FaceCenteredCubic
        } else if all_near(bcc_primitive_angle()) {
            LatticeFamily::BodyCenteredCubic
        } else {
            LatticeFamily::Unrecognized
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LatticeFamily::FaceCenteredCubic => "FCC",
            LatticeFamily::BodyCenteredCubic => "BCC",
            LatticeFamily::SimpleCubic => "SC",
            LatticeFamily::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for LatticeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural snapshot. Energies are in eV, masses in atomic mass units.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub symbols: Vec<String>,
    pub positions: Vec<Point3<f64>>,
    pub masses: Vec<f64>,
    pub cell: Cell,
    pub potential_energy: f64,
    pub kinetic_energy: f64,
}

impl Frame {
    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    pub fn total_energy(&self) -> f64 {
        self.potential_energy + self.kinetic_energy
    }

    pub fn volume(&self) -> f64 {
        self.cell.volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn orthorhombic_cell_reports_lengths_angles_and_volume() {
        let cell = Cell::orthorhombic(2.0, 3.0, 4.0);
        assert_eq!(cell.lengths(), [2.0, 3.0, 4.0]);
        for angle in cell.angles() {
            assert!(f64_approx_equal(angle, 90.0));
        }
        assert!(f64_approx_equal(cell.volume(), 24.0));
    }

    #[test]
    fn from_parameters_round_trips_through_parameters() {
        let params = CellParameters {
            a: 2.5,
            b: 2.5,
            c: 2.5,
            alpha: 60.0,
            beta: 60.0,
            gamma: 60.0,
        };
        let recovered = Cell::from_parameters(&params).parameters();
        assert!(f64_approx_equal(recovered.a, 2.5));
        assert!(f64_approx_equal(recovered.c, 2.5));
        assert!((recovered.alpha - 60.0).abs() < 1e-6);
        assert!((recovered.beta - 60.0).abs() < 1e-6);
    }

    #[test]
    fn detect_recognizes_simple_cubic() {
        assert_eq!(
            LatticeFamily::detect(&Cell::cubic(3.6)),
            LatticeFamily::SimpleCubic
        );
    }

    #[test]
    fn detect_recognizes_primitive_fcc_cell() {
        let a = 3.6;
        let cell = Cell::from_vectors(
            Vector3::new(0.0, a / 2.0, a / 2.0),
            Vector3::new(a / 2.0, 0.0, a / 2.0),
            Vector3::new(a / 2.0, a / 2.0, 0.0),
        );
        assert_eq!(LatticeFamily::detect(&cell), LatticeFamily::FaceCenteredCubic);
        assert!(f64_approx_equal(cell.volume(), a * a * a / 4.0));
    }

    #[test]
    fn detect_recognizes_primitive_bcc_cell() {
        let a = 2.87;
        let h = a / 2.0;
        let cell = Cell::from_vectors(
            Vector3::new(-h, h, h),
            Vector3::new(h, -h, h),
            Vector3::new(h, h, -h),
        );
        assert_eq!(LatticeFamily::detect(&cell), LatticeFamily::BodyCenteredCubic);
    }

    #[test]
    fn detect_rejects_tetragonal_cell() {
        let cell = Cell::orthorhombic(3.0, 3.0, 4.0);
        assert_eq!(LatticeFamily::detect(&cell), LatticeFamily::Unrecognized);
    }

    #[test]
    fn frame_aggregates_mass_and_energy() {
        let frame = Frame {
            symbols: vec!["Ar".into(), "Ar".into()],
            positions: vec![Point3::origin(), Point3::new(1.0, 1.0, 1.0)],
            masses: vec![39.948, 39.948],
            cell: Cell::cubic(10.0),
            potential_energy: -1.5,
            kinetic_energy: 0.5,
        };
        assert_eq!(frame.atom_count(), 2);
        assert!(f64_approx_equal(frame.total_mass(), 79.896));
        assert!(f64_approx_equal(frame.total_energy(), -1.0));
        assert!(f64_approx_equal(frame.volume(), 1000.0));
    }
}
