use std::fmt;

/// The named columns of a scalar-series table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesColumn {
    Timestep,
    PotentialEnergy,
    KineticEnergy,
    Pressure,
    Temperature,
    HeatCapacity,
}

impl SeriesColumn {
    pub const REQUIRED: [SeriesColumn; 5] = [
        SeriesColumn::Timestep,
        SeriesColumn::PotentialEnergy,
        SeriesColumn::KineticEnergy,
        SeriesColumn::Pressure,
        SeriesColumn::Temperature,
    ];

    /// The canonical header written by [`crate::core::io::series`].
    pub fn header(&self) -> &'static str {
        match self {
            SeriesColumn::Timestep => "timestep",
            SeriesColumn::PotentialEnergy => "potential_energy",
            SeriesColumn::KineticEnergy => "kinetic_energy",
            SeriesColumn::Pressure => "pressure",
            SeriesColumn::Temperature => "temperature",
            SeriesColumn::HeatCapacity => "heat_capacity",
        }
    }

    /// Headers accepted on input, including the unit-suffixed names older integrators emit.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            SeriesColumn::Timestep => &["timestep", "Time (fs)", "time"],
            SeriesColumn::PotentialEnergy => &["potential_energy", "Potential Energy (eV)"],
            SeriesColumn::KineticEnergy => &["kinetic_energy", "Kinetic Energy (eV)"],
            SeriesColumn::Pressure => &["pressure", "Pressure (Pa)"],
            SeriesColumn::Temperature => &["temperature", "Temperature (K)"],
            SeriesColumn::HeatCapacity => &["heat_capacity", "Heat Capacity"],
        }
    }
}

impl fmt::Display for SeriesColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Per-sample scalar observables of one simulation, one entry per sampled step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarSeries {
    pub timestep: Vec<f64>,
    pub potential_energy: Vec<f64>,
    pub kinetic_energy: Vec<f64>,
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub heat_capacity: Option<Vec<f64>>,
}

impl ScalarSeries {
    pub fn len(&self) -> usize {
        self.timestep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestep.is_empty()
    }

    pub fn column(&self, column: SeriesColumn) -> Option<&[f64]> {
        match column {
            SeriesColumn::Timestep => Some(&self.timestep),
            SeriesColumn::PotentialEnergy => Some(&self.potential_energy),
            SeriesColumn::KineticEnergy => Some(&self.kinetic_energy),
            SeriesColumn::Pressure => Some(&self.pressure),
            SeriesColumn::Temperature => Some(&self.temperature),
            SeriesColumn::HeatCapacity => self.heat_capacity.as_deref(),
        }
    }

    pub fn total_energy(&self) -> Vec<f64> {
        self.potential_energy
            .iter()
            .zip(&self.kinetic_energy)
            .map(|(p, k)| p + k)
            .collect()
    }

    /// Appends one sample. Used by integrator adapters that record while stepping.
    pub fn push_sample(
        &mut self,
        timestep: f64,
        potential_energy: f64,
        kinetic_energy: f64,
        pressure: f64,
        temperature: f64,
    ) {
        self.timestep.push(timestep);
        self.potential_energy.push(potential_energy);
        self.kinetic_energy.push(kinetic_energy);
        self.pressure.push(pressure);
        self.temperature.push(temperature);
    }
}
