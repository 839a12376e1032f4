use super::AnalysisError;
use crate::core::models::trajectory::Trajectory;
use nalgebra::{Point3, Vector3};

/// Which frame displacements are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MsdReference {
    #[default]
    Initial,
    Final,
}

fn minimum_image(delta: f64, length: f64) -> f64 {
    if delta > length / 2.0 {
        delta - length
    } else if delta <= -length / 2.0 {
        delta + length
    } else {
        delta
    }
}

/// Reconstructs continuous atom paths from wrapped coordinates.
///
/// Each step's displacement is folded back with the minimum-image convention against
/// the first frame's cell lengths and accumulated onto the previous unwrapped position.
pub fn unwrap_positions(trajectory: &Trajectory) -> Result<Vec<Vec<Point3<f64>>>, AnalysisError> {
    let first = trajectory.first().ok_or(AnalysisError::EmptyTrajectory)?;
    let lengths = first.cell.lengths();
    let atoms = first.atom_count();

    let mut unwrapped = Vec::with_capacity(trajectory.len());
    unwrapped.push(first.positions.clone());

    for (index, pair) in trajectory.frames().windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.atom_count() != atoms {
            return Err(AnalysisError::AtomCountMismatch {
                frame: index + 1,
                expected: atoms,
                found: current.atom_count(),
            });
        }
        let last = &unwrapped[index];
        let next: Vec<Point3<f64>> = current
            .positions
            .iter()
            .zip(&previous.positions)
            .zip(last)
            .map(|((now, before), base)| {
                let raw = now - before;
                let folded = Vector3::new(
                    minimum_image(raw.x, lengths[0]),
                    minimum_image(raw.y, lengths[1]),
                    minimum_image(raw.z, lengths[2]),
                );
                base + folded
            })
            .collect();
        unwrapped.push(next);
    }

    Ok(unwrapped)
}

/// Per-frame mean square displacement (Å²) of the unwrapped paths against the
/// reference frame.
pub fn mean_square_displacement(
    trajectory: &Trajectory,
    reference: MsdReference,
) -> Result<Vec<f64>, AnalysisError> {
    let paths = unwrap_positions(trajectory)?;
    let reference_frame = match reference {
        MsdReference::Initial => paths.first(),
        MsdReference::Final => paths.last(),
    }
    .ok_or(AnalysisError::EmptyTrajectory)?;

    let atoms = reference_frame.len().max(1) as f64;
    Ok(paths
        .iter()
        .map(|frame| {
            frame
                .iter()
                .zip(reference_frame)
                .map(|(p, r)| (p - r).norm_squared())
                .sum::<f64>()
                / atoms
        })
        .collect())
}

/// Einstein-relation slope `(MSD[-1] - MSD[t0]) / (6 (len - t0))`, in Å² per sampled step.
pub fn self_diffusion_coefficient(msd: &[f64], t0: usize) -> Result<f64, AnalysisError> {
    let (Some(last), Some(start)) = (msd.last(), msd.get(t0)) else {
        return Err(AnalysisError::EmptyWindow {
            index: t0,
            len: msd.len(),
        });
    };
    Ok((last - start) / (6.0 * (msd.len() - t0) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::average::time_average;
    use crate::core::models::frame::{Cell, Frame};

    fn frame(positions: &[[f64; 3]]) -> Frame {
        Frame {
            symbols: vec!["Ar".into(); positions.len()],
            positions: positions.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect(),
            masses: vec![39.948; positions.len()],
            cell: Cell::cubic(10.0),
            potential_energy: 0.0,
            kinetic_energy: 0.0,
        }
    }

    fn boundary_crossing() -> Trajectory {
        Trajectory::new(vec![
            frame(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]),
            frame(&[[9.0, 9.0, 9.0], [3.0, 3.0, 3.0]]),
        ])
    }

    #[test]
    fn final_reference_unwraps_across_the_boundary() {
        let msd = mean_square_displacement(&boundary_crossing(), MsdReference::Final).unwrap();
        assert_eq!(msd, vec![7.5, 0.0]);
        assert_eq!(time_average(0, &msd), vec![7.5, 3.75]);
    }

    #[test]
    fn initial_reference_starts_at_zero() {
        let msd = mean_square_displacement(&boundary_crossing(), MsdReference::Initial).unwrap();
        assert_eq!(msd, vec![0.0, 7.5]);
    }

    #[test]
    fn unwrapped_path_keeps_accumulating() {
        let traj = Trajectory::new(vec![
            frame(&[[9.0, 5.0, 5.0]]),
            frame(&[[1.0, 5.0, 5.0]]),
            frame(&[[3.0, 5.0, 5.0]]),
        ]);
        let paths = unwrap_positions(&traj).unwrap();
        assert_eq!(paths[2][0], Point3::new(13.0, 5.0, 5.0));
    }

    #[test]
    fn half_box_displacement_folds_to_positive() {
        assert_eq!(minimum_image(5.0, 10.0), 5.0);
        assert_eq!(minimum_image(-5.0, 10.0), 5.0);
        assert_eq!(minimum_image(6.0, 10.0), -4.0);
    }

    #[test]
    fn atom_count_change_is_rejected() {
        let traj = Trajectory::new(vec![
            frame(&[[0.0, 0.0, 0.0]]),
            frame(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
        ]);
        assert_eq!(
            mean_square_displacement(&traj, MsdReference::Initial),
            Err(AnalysisError::AtomCountMismatch {
                frame: 1,
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn diffusion_from_two_point_msd() {
        assert_eq!(self_diffusion_coefficient(&[0.0, 7.5], 0).unwrap(), 0.625);
    }

    #[test]
    fn diffusion_window_must_be_non_empty() {
        assert!(matches!(
            self_diffusion_coefficient(&[0.0, 1.0], 2),
            Err(AnalysisError::EmptyWindow { index: 2, len: 2 })
        ));
    }
}
