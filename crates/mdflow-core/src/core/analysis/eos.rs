//! Stabilized-jellium equation of state, `E(V) = a + b t + c t² + d t³` with `t = V^(-1/3)`.

use super::units::EV_PER_CUBIC_ANGSTROM_TO_GPA;
use crate::core::models::frame::LatticeFamily;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Smallest number of (volume, energy) points a fit is attempted with.
pub const MIN_POINTS: usize = 4;

const DEGREE: usize = 3;
const RELATIVE_SINGULAR_CUTOFF: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EosError {
    #[error("Equation of state needs at least {required} points, got {found}")]
    InsufficientData { found: usize, required: usize },
    #[error("Got {volumes} volumes but {energies} energies")]
    LengthMismatch { volumes: usize, energies: usize },
    #[error("Volume must be positive and finite, got {0}")]
    InvalidVolume(f64),
    #[error("Least-squares system is singular")]
    Singular,
    #[error("Fitted equation of state has no minimum")]
    NoMinimum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EosFit {
    /// Å³.
    pub equilibrium_volume: f64,
    /// eV.
    pub equilibrium_energy: f64,
    /// eV/Å³.
    pub bulk_modulus: f64,
}

impl EosFit {
    pub fn bulk_modulus_gpa(&self) -> f64 {
        self.bulk_modulus * EV_PER_CUBIC_ANGSTROM_TO_GPA
    }
}

/// Coefficients, highest power first.
fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, EosError> {
    let columns = degree + 1;
    let mut vandermonde =
        DMatrix::from_fn(x.len(), columns, |i, j| x[i].powi((degree - j) as i32));

    let scale: Vec<f64> = (0..columns)
        .map(|j| vandermonde.column(j).norm())
        .collect();
    if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
        return Err(EosError::Singular);
    }
    for (j, s) in scale.iter().enumerate() {
        vandermonde.column_mut(j).scale_mut(1.0 / s);
    }

    let rhs = DVector::from_column_slice(y);
    let svd = vandermonde.svd(true, true);
    let cutoff = RELATIVE_SINGULAR_CUTOFF * svd.singular_values.max();
    let solution = svd.solve(&rhs, cutoff).map_err(|_| EosError::Singular)?;

    let coefficients: Vec<f64> = solution.iter().zip(&scale).map(|(c, s)| c / s).collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(EosError::Singular);
    }
    Ok(coefficients)
}

fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

fn derivative(coefficients: &[f64]) -> Vec<f64> {
    let degree = coefficients.len().saturating_sub(1);
    coefficients[..degree]
        .iter()
        .enumerate()
        .map(|(i, c)| c * (degree - i) as f64)
        .collect()
}

/// Real roots of `a x² + b x + c`.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        return if b == 0.0 { Vec::new() } else { vec![-c / b] };
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q / a, c / q]
}

/// Fits the stabilized-jellium form and locates its minimum.
pub fn fit_sjeos(volumes: &[f64], energies: &[f64]) -> Result<EosFit, EosError> {
    if volumes.len() != energies.len() {
        return Err(EosError::LengthMismatch {
            volumes: volumes.len(),
            energies: energies.len(),
        });
    }
    if volumes.len() < MIN_POINTS {
        return Err(EosError::InsufficientData {
            found: volumes.len(),
            required: MIN_POINTS,
        });
    }
    if let Some(bad) = volumes.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(EosError::InvalidVolume(*bad));
    }
    if volumes.iter().all(|v| *v == volumes[0]) {
        return Err(EosError::Singular);
    }

    let t: Vec<f64> = volumes.iter().map(|v| v.powf(-1.0 / 3.0)).collect();
    let fit = polyfit(&t, energies, DEGREE)?;
    let first = derivative(&fit);
    let second = derivative(&first);

    let minimum = quadratic_roots(first[0], first[1], first[2])
        .into_iter()
        .find(|root| *root > 0.0 && evaluate(&second, *root) > 0.0)
        .ok_or(EosError::NoMinimum)?;

    Ok(EosFit {
        equilibrium_volume: minimum.powi(-3),
        equilibrium_energy: evaluate(&fit, minimum),
        bulk_modulus: minimum.powi(5) * evaluate(&second, minimum) / 9.0,
    })
}

/// Conventional cubic lattice constant for `atoms` atoms occupying `volume`.
pub fn lattice_constant(family: LatticeFamily, volume: f64, atoms: usize) -> Option<f64> {
    let atoms_per_cell = match family {
        LatticeFamily::FaceCenteredCubic => 4.0,
        LatticeFamily::BodyCenteredCubic => 2.0,
        LatticeFamily::SimpleCubic => 1.0,
        LatticeFamily::Unrecognized => return None,
    };
    Some((atoms_per_cell * volume / atoms as f64).cbrt())
}
