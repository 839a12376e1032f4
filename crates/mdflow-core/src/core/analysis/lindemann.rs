use crate::core::models::frame::LatticeFamily;

/// Equilibrium Lindemann parameter above which the material is considered molten.
pub const LINDEMANN_THRESHOLD: f64 = 0.1;

pub const MELTED_MESSAGE: &str = "According to the Lindemann criterion the material has melted.";
pub const UNRECOGNIZED_LATTICE_CAVEAT: &str = "Lattice structure was not recognized. The \
     lattice constant is used as nearest-neighbour distance, which might give wrong values.";

/// Nearest-neighbour distance for lattice constant `a`, and whether the family was known.
pub fn nearest_neighbour_distance(family: LatticeFamily, a: f64) -> (f64, bool) {
    match family {
        LatticeFamily::FaceCenteredCubic => (a / 2f64.sqrt(), true),
        LatticeFamily::BodyCenteredCubic => (3f64.sqrt() * a / 2.0, true),
        LatticeFamily::SimpleCubic => (a / 2.0, true),
        LatticeFamily::Unrecognized => (a, false),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LindemannAssessment {
    /// `sqrt(MSD_t) / d` for every sampled step.
    pub parameters: Vec<f64>,
    /// `sqrt(equilibrium MSD) / d`.
    pub equilibrium_parameter: f64,
    pub melted: bool,
    pub caveat: Option<&'static str>,
}

impl LindemannAssessment {
    /// Caveat and verdict joined; empty for a recognized, solid lattice.
    pub fn message(&self) -> String {
        let verdict = self.melted.then_some(MELTED_MESSAGE);
        [self.caveat, verdict]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Checks the Lindemann melting criterion for lattice constant `a`.
///
/// The volume workflow never passes `LatticeFamily::Unrecognized`: it reports the raw
/// cell and skips this check when no lattice constant can be derived. That branch
/// serves direct callers, who get `d = a` together with a caveat.
pub fn assess(
    lattice_constant: f64,
    msd: &[f64],
    msd_average: f64,
    family: LatticeFamily,
) -> LindemannAssessment {
    let (distance, recognized) = nearest_neighbour_distance(family, lattice_constant);
    let parameters = msd.iter().map(|m| m.sqrt() / distance).collect();
    let equilibrium_parameter = msd_average.sqrt() / distance;
    LindemannAssessment {
        parameters,
        equilibrium_parameter,
        melted: equilibrium_parameter > LINDEMANN_THRESHOLD,
        caveat: (!recognized).then_some(UNRECOGNIZED_LATTICE_CAVEAT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-5;

    #[test]
    fn fcc_parameters_use_half_face_diagonal() {
        let result = assess(5.0, &[0.2, 0.2, 0.1, 0.1], 0.15, LatticeFamily::FaceCenteredCubic);
        let expected = [0.12649, 0.12649, 0.08944, 0.08944];
        for (p, e) in result.parameters.iter().zip(expected) {
            assert!((p - e).abs() < TOLERANCE, "{p} != {e}");
        }
        assert_eq!(result.caveat, None);
    }

    #[test]
    fn small_vibrations_are_solid() {
        let result = assess(5.0, &[0.1; 4], 0.1, LatticeFamily::FaceCenteredCubic);
        assert!(!result.melted);
        assert!(result.message().is_empty());
    }

    #[test]
    fn large_vibrations_in_bcc_are_molten() {
        let result = assess(
            2f64.sqrt(),
            &[2.0, 3.0, 3.0, 3.0, 3.0],
            2.8,
            LatticeFamily::BodyCenteredCubic,
        );
        assert!(result.melted);
        assert_eq!(result.message(), MELTED_MESSAGE);
    }

    #[test]
    fn unrecognized_lattice_keeps_caveat_and_verdict() {
        let result = assess(1.0, &[1.0], 1.0, LatticeFamily::Unrecognized);
        assert_eq!(result.parameters, vec![1.0]);
        assert!(result.melted);
        let message = result.message();
        assert!(message.starts_with(UNRECOGNIZED_LATTICE_CAVEAT));
        assert!(message.ends_with(MELTED_MESSAGE));
    }

    #[test]
    fn simple_cubic_uses_half_lattice_constant() {
        assert_eq!(
            nearest_neighbour_distance(LatticeFamily::SimpleCubic, 4.0),
            (2.0, true)
        );
    }
}
