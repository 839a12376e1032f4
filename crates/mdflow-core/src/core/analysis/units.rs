//! Physical constants (CODATA 2014) and unit conversions.

/// Elementary charge in C; also J per eV.
pub const ELEMENTARY_CHARGE: f64 = 1.6021766208e-19;
/// Boltzmann constant in J/K.
pub const BOLTZMANN_J: f64 = 1.38064852e-23;
/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = BOLTZMANN_J / ELEMENTARY_CHARGE;
/// Unified atomic mass unit in kg.
pub const ATOMIC_MASS_UNIT: f64 = 1.660539040e-27;
/// eV/Å³ to GPa.
pub const EV_PER_CUBIC_ANGSTROM_TO_GPA: f64 = ELEMENTARY_CHARGE * 1e21;

pub fn amu_to_kg(mass: f64) -> f64 {
    mass * ATOMIC_MASS_UNIT
}
