use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DESCRIPTOR_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value '{value}' for parameter '{key}': {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },
}

/// The sampling regime of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensemble {
    /// Constant particle number, volume, and energy.
    #[serde(alias = "NVE")]
    Nve,
    /// Constant particle number, volume, and temperature.
    #[serde(alias = "NVT")]
    Nvt,
}

impl Ensemble {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensemble::Nve => "nve",
            Ensemble::Nvt => "nvt",
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ensemble {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nve" => Ok(Ensemble::Nve),
            "nvt" => Ok(Ensemble::Nvt),
            other => Err(format!("unknown ensemble '{}', expected 'nve' or 'nvt'", other)),
        }
    }
}

/// The interatomic potential the integrator should use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Potential {
    LennardJones,
    /// A named model from an external potential repository (e.g. an OpenKIM identifier).
    Named(String),
}

impl From<String> for Potential {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "lennard_jones" | "lj" => Potential::LennardJones,
            _ => Potential::Named(s),
        }
    }
}

impl From<Potential> for String {
    fn from(p: Potential) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Potential::LennardJones => f.write_str("lennard_jones"),
            Potential::Named(name) => f.write_str(name),
        }
    }
}

/// Everything one simulation needs, serialized as one JSON file per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub material: PathBuf,
    pub ensemble: Ensemble,
    pub potential: Potential,
    pub steps: u64,
    pub traj_output_path: PathBuf,
    pub csv_output_path: PathBuf,
    #[serde(default, alias = "volume-scale", skip_serializing_if = "Option::is_none")]
    pub volume_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Free-form parameters forwarded to the integrator untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JobDescriptor {
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let file = File::open(path).map_err(|e| DescriptorError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| DescriptorError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        let file = File::create(path).map_err(|e| DescriptorError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| DescriptorError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        writer.flush().map_err(|e| DescriptorError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Builds a descriptor from one expanded parameter combination.
    ///
    /// Keys are matched case-insensitively with `-` and `_` treated alike. Unknown keys
    /// are kept in [`JobDescriptor::extra`]. The material name resolves to
    /// `{workspace}/materials/<material>.xyz`, and the outputs are named after `job_name`.
    pub fn from_parameters(
        workspace_root: &Path,
        job_name: &str,
        params: &[(String, String)],
    ) -> Result<Self, DescriptorError> {
        let mut material = None;
        let mut ensemble = None;
        let mut potential = None;
        let mut steps = None;
        let mut volume_scale = None;
        let mut temperature = None;
        let mut extra = BTreeMap::new();

        for (key, value) in params {
            let invalid = |reason: String| DescriptorError::InvalidParameter {
                key: key.clone(),
                value: value.clone(),
                reason,
            };
            match normalize_key(key).as_str() {
                "material" => material = Some(value.clone()),
                "ensemble" => ensemble = Some(value.parse::<Ensemble>().map_err(invalid)?),
                "potential" => potential = Some(Potential::from(value.clone())),
                "steps" => {
                    steps = Some(
                        value
                            .trim()
                            .parse::<u64>()
                            .map_err(|e| invalid(e.to_string()))?,
                    )
                }
                "volume_scale" => {
                    volume_scale = Some(
                        value
                            .trim()
                            .parse::<f64>()
                            .map_err(|e| invalid(e.to_string()))?,
                    )
                }
                "temperature" => {
                    temperature = Some(
                        value
                            .trim()
                            .parse::<f64>()
                            .map_err(|e| invalid(e.to_string()))?,
                    )
                }
                _ => {
                    extra.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }

        let material = material.ok_or(DescriptorError::MissingParameter("material"))?;
        Ok(Self {
            material: workspace_root
                .join("materials")
                .join(format!("{}.xyz", material)),
            ensemble: ensemble.ok_or(DescriptorError::MissingParameter("ensemble"))?,
            potential: potential.unwrap_or(Potential::LennardJones),
            steps: steps.ok_or(DescriptorError::MissingParameter("steps"))?,
            traj_output_path: workspace_root
                .join("output")
                .join("traj")
                .join(format!("{}.xyz", job_name)),
            csv_output_path: workspace_root
                .join("output")
                .join("csv")
                .join(format!("{}.csv", job_name)),
            volume_scale,
            temperature,
            extra,
        })
    }

    /// Two descriptors belong to the same volume series when they differ at most in the
    /// volume-scale factor and the output paths.
    pub fn is_volume_equivalent(&self, other: &Self) -> bool {
        self.material == other.material
            && self.ensemble == other.ensemble
            && self.potential == other.potential
            && self.steps == other.steps
            && self.temperature == other.temperature
            && self.extra == other.extra
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

/// Derives a job name from the ordered values of its parameters.
pub fn job_name_from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(|v| v.trim().replace(['/', '\\', ' '], "-"))
        .collect::<Vec<_>>()
        .join("_")
}

/// The job name of a descriptor file: its file stem.
pub fn job_name_from_path(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_descriptor(scale: Option<f64>, name: &str) -> JobDescriptor {
        let mut p = params(&[
            ("material", "Cu"),
            ("ensemble", "nve"),
            ("potential", "lennard_jones"),
            ("steps", "1000"),
        ]);
        if let Some(s) = scale {
            p.push(("volume-scale".into(), s.to_string()));
        }
        JobDescriptor::from_parameters(Path::new("/ws"), name, &p).unwrap()
    }

    #[test]
    fn from_parameters_resolves_paths_in_workspace() {
        let d = sample_descriptor(Some(0.98), "Cu_nve_lennard_jones_1000_0.98");
        assert_eq!(d.material, PathBuf::from("/ws/materials/Cu.xyz"));
        assert_eq!(
            d.traj_output_path,
            PathBuf::from("/ws/output/traj/Cu_nve_lennard_jones_1000_0.98.xyz")
        );
        assert_eq!(
            d.csv_output_path,
            PathBuf::from("/ws/output/csv/Cu_nve_lennard_jones_1000_0.98.csv")
        );
        assert_eq!(d.volume_scale, Some(0.98));
        assert_eq!(d.ensemble, Ensemble::Nve);
        assert_eq!(d.potential, Potential::LennardJones);
    }

    #[test]
    fn from_parameters_reports_missing_and_invalid_values() {
        let missing = JobDescriptor::from_parameters(
            Path::new("/ws"),
            "x",
            &params(&[("material", "Cu"), ("steps", "10")]),
        );
        assert!(matches!(
            missing,
            Err(DescriptorError::MissingParameter("ensemble"))
        ));

        let invalid = JobDescriptor::from_parameters(
            Path::new("/ws"),
            "x",
            &params(&[("material", "Cu"), ("ensemble", "npt"), ("steps", "10")]),
        );
        assert!(matches!(
            invalid,
            Err(DescriptorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn unknown_parameters_are_kept_as_extra_fields() {
        let d = JobDescriptor::from_parameters(
            Path::new("/ws"),
            "x",
            &params(&[
                ("material", "Ar"),
                ("ensemble", "NVT"),
                ("steps", "10"),
                ("thermostat", "langevin"),
            ]),
        )
        .unwrap();
        assert_eq!(d.ensemble, Ensemble::Nvt);
        assert_eq!(
            d.extra.get("thermostat"),
            Some(&Value::String("langevin".into()))
        );
    }

    #[test]
    fn descriptor_survives_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.json");
        let d = sample_descriptor(Some(1.02), "job");
        d.save(&path).unwrap();
        assert_eq!(JobDescriptor::load(&path).unwrap(), d);
    }

    #[test]
    fn load_accepts_hyphenated_volume_scale_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{"material": "m.xyz", "ensemble": "NVE", "potential": "EAM_Dynamo_Cu",
                "steps": 50, "traj_output_path": "t.xyz", "csv_output_path": "c.csv",
                "volume-scale": 0.9}"#,
        )
        .unwrap();
        let d = JobDescriptor::load(&path).unwrap();
        assert_eq!(d.volume_scale, Some(0.9));
        assert_eq!(d.potential, Potential::Named("EAM_Dynamo_Cu".into()));
        assert!(d.extra.is_empty());
    }

    #[test]
    fn volume_equivalence_ignores_scale_and_outputs_only() {
        let a = sample_descriptor(Some(0.98), "a");
        let b = sample_descriptor(Some(1.02), "b");
        assert!(a.is_volume_equivalent(&b));

        let mut c = sample_descriptor(Some(1.02), "c");
        c.steps = 2000;
        assert!(!a.is_volume_equivalent(&c));

        let mut d = sample_descriptor(Some(1.02), "d");
        d.ensemble = Ensemble::Nvt;
        assert!(!a.is_volume_equivalent(&d));
    }

    #[test]
    fn job_name_joins_sanitized_values() {
        assert_eq!(
            job_name_from_values(["Cu", "nve", "EAM/Cu", "1000"]),
            "Cu_nve_EAM-Cu_1000"
        );
        assert_eq!(
            job_name_from_path(Path::new("/a/b/Cu_nve.json")).as_deref(),
            Some("Cu_nve")
        );
    }
}
