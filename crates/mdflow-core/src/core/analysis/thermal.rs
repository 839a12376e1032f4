//! Fluctuation-based heat capacity, Debye temperature and cohesive energy.
//!
//! Energies are in eV and masses in atomic mass units; heat capacities are reported
//! mass-specific, in J/(K·kg).

use super::AnalysisError;
use super::average::{window_mean, window_variance};
use super::units::{BOLTZMANN_EV, BOLTZMANN_J, ELEMENTARY_CHARGE, amu_to_kg};
use std::f64::consts::PI;

/// `T / θ_D` above which the Debye estimate is flagged.
pub const DEBYE_RATIO_LIMIT: f64 = 0.3;

fn check_inputs(temperature: f64, total_mass: f64) -> Result<(), AnalysisError> {
    if temperature.is_nan() || temperature <= 0.0 {
        return Err(AnalysisError::NonPositiveTemperature(temperature));
    }
    if total_mass.is_nan() || total_mass <= 0.0 {
        return Err(AnalysisError::NonPositiveMass(total_mass));
    }
    Ok(())
}

/// Microcanonical estimate from kinetic-energy fluctuations:
/// `Cv = (3/2) N kB / (1 - Var(K) / ((3/2) N (kB T)^2))`.
pub fn constant_energy_heat_capacity(
    kinetic_energy: &[f64],
    t0: usize,
    temperature: f64,
    atoms: usize,
    total_mass: f64,
) -> Result<f64, AnalysisError> {
    check_inputs(temperature, total_mass)?;
    let variance = window_variance(t0, kinetic_energy).ok_or(AnalysisError::EmptyWindow {
        index: t0,
        len: kinetic_energy.len(),
    })?;

    let canonical = 1.5 * atoms as f64 * BOLTZMANN_EV;
    let denominator = 1.0 - variance / (canonical * BOLTZMANN_EV * temperature * temperature);
    if denominator <= 0.0 {
        return Err(AnalysisError::DivergentHeatCapacity);
    }
    let extensive = canonical / denominator;
    Ok(extensive * ELEMENTARY_CHARGE / amu_to_kg(total_mass))
}

/// Canonical estimate from total-energy fluctuations: `Cv = Var(E) / (kB T^2)`.
pub fn constant_temperature_heat_capacity(
    total_energy: &[f64],
    t0: usize,
    temperature: f64,
    total_mass: f64,
) -> Result<f64, AnalysisError> {
    check_inputs(temperature, total_mass)?;
    let variance = window_variance(t0, total_energy).ok_or(AnalysisError::EmptyWindow {
        index: t0,
        len: total_energy.len(),
    })?;
    let extensive = variance / (BOLTZMANN_EV * temperature * temperature);
    Ok(extensive * ELEMENTARY_CHARGE / amu_to_kg(total_mass))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebyeTemperature {
    pub value: f64,
    /// The simulation temperature is too high relative to `θ_D` for the estimate to hold.
    pub warning: bool,
}

/// `θ_D = T (12 π⁴ N kB / (5 C))^(1/3)` with `C` the extensive heat capacity.
pub fn debye_temperature(
    temperature: f64,
    atoms: usize,
    total_mass: f64,
    specific_heat_capacity: f64,
) -> Result<DebyeTemperature, AnalysisError> {
    check_inputs(temperature, total_mass)?;
    if specific_heat_capacity.is_nan() || specific_heat_capacity <= 0.0 {
        return Err(AnalysisError::NonPositiveHeatCapacity(specific_heat_capacity));
    }
    let extensive = specific_heat_capacity * amu_to_kg(total_mass);
    let value =
        temperature * (12.0 * PI.powi(4) * atoms as f64 * BOLTZMANN_J / (5.0 * extensive)).cbrt();
    Ok(DebyeTemperature {
        value,
        warning: temperature / value > DEBYE_RATIO_LIMIT,
    })
}

/// `-mean(potential energy over the window) / N`, in eV/atom.
pub fn cohesive_energy(
    potential_energy: &[f64],
    t0: usize,
    atoms: usize,
) -> Result<f64, AnalysisError> {
    let mean = window_mean(t0, potential_energy).ok_or(AnalysisError::EmptyWindow {
        index: t0,
        len: potential_energy.len(),
    })?;
    Ok(-mean / atoms.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_relative(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            ((actual - expected) / expected).abs() < tolerance,
            "{actual} != {expected}"
        );
    }

    #[test]
    fn no_kinetic_fluctuation_gives_dulong_petit() {
        let cv = constant_energy_heat_capacity(&[0.5, 0.5, 0.5, 0.5], 1, 300.0, 1, 1.0).unwrap();
        assert_relative(cv, 12471.69, 1e-6);
    }

    #[test]
    fn half_canonical_fluctuation_doubles_heat_capacity() {
        let temperature = 1000.0;
        let spread = (0.5 * 1.5 * (BOLTZMANN_EV * temperature).powi(2)).sqrt();
        let kinetic = [1.0 - spread, 1.0 + spread, 1.0 - spread, 1.0 + spread];
        let baseline = constant_energy_heat_capacity(&[1.0; 4], 0, temperature, 1, 1.0).unwrap();
        let cv = constant_energy_heat_capacity(&kinetic, 0, temperature, 1, 1.0).unwrap();
        assert_relative(cv, 2.0 * baseline, 1e-6);
    }

    #[test]
    fn excessive_kinetic_fluctuation_diverges() {
        let kinetic = [0.0, 1.0, 0.0, 1.0];
        assert_eq!(
            constant_energy_heat_capacity(&kinetic, 0, 10.0, 1, 1.0),
            Err(AnalysisError::DivergentHeatCapacity)
        );
    }

    #[test]
    fn canonical_heat_capacity_from_energy_variance() {
        let temperature = 500.0;
        let cv = constant_temperature_heat_capacity(&[9.0, -1.0, 1.0, -1.0, 1.0], 1, temperature, 2.0)
            .unwrap();
        let expected = 1.0 / (BOLTZMANN_EV * temperature * temperature) * ELEMENTARY_CHARGE
            / amu_to_kg(2.0);
        assert_relative(cv, expected, 1e-12);
    }

    #[test]
    fn debye_temperature_reference_value() {
        let debye = debye_temperature(20.0, 2, 3.0, 3.0).unwrap();
        assert!((debye.value - 1511.8455).abs() < 1e-3, "{}", debye.value);
        assert!(!debye.warning);
    }

    #[test]
    fn large_heat_capacity_per_atom_raises_debye_warning() {
        let debye = debye_temperature(300.0, 1, 63.546, 1000.0).unwrap();
        assert!(debye.warning);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert_eq!(
            debye_temperature(0.0, 1, 1.0, 1.0),
            Err(AnalysisError::NonPositiveTemperature(0.0))
        );
        assert_eq!(
            constant_temperature_heat_capacity(&[1.0, 2.0], 0, 300.0, 0.0),
            Err(AnalysisError::NonPositiveMass(0.0))
        );
        assert_eq!(
            debye_temperature(300.0, 1, 1.0, -2.0),
            Err(AnalysisError::NonPositiveHeatCapacity(-2.0))
        );
    }

    #[test]
    fn cohesive_energy_is_negative_mean_per_atom() {
        let energy = cohesive_energy(&[0.0, -8.0, -7.0, -9.0], 1, 4).unwrap();
        assert_eq!(energy, 2.0);
        assert!(cohesive_energy(&[1.0], 1, 1).is_err());
    }
}
