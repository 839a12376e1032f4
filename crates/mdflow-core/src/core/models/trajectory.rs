use super::frame::Frame;

/// An ordered sequence of frames produced by the external integrator.
///
/// The engine only ever reads trajectories; the per-frame accessors below are the
/// capability surface the analysis layer relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn potential_energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.potential_energy).collect()
    }

    pub fn kinetic_energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.kinetic_energy).collect()
    }

    pub fn total_energies(&self) -> Vec<f64> {
        self.frames.iter().map(Frame::total_energy).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.frames.iter().map(Frame::volume).collect()
    }
}

impl From<Vec<Frame>> for Trajectory {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}
