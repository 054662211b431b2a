//! Fixed-capacity, append-only time-stamped sequence of motion states.

use core::fmt;

use crate::motion_state::MotionState;
use crate::vec3::Vec3;

/// One sample in a [`Trajectory`]: simulated time plus the motion state
/// at that time. `t` is monotonic non-strict within a single trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectorySample {
    pub t: f32,
    pub state: MotionState,
}

impl TrajectorySample {
    pub fn new(t: f32, state: MotionState) -> Self {
        Self { t, state }
    }
}

/// Owned, capacity-bounded append-only buffer of [`TrajectorySample`]s.
///
/// Capacity is fixed at construction; `add_sample` never reallocates and
/// reports failure via `bool` once the buffer is full, matching the
/// `Exhausted` error kind rather than silently growing.
#[derive(Clone, Debug)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    capacity: usize,
}

impl Trajectory {
    /// Construct with the given fixed capacity. `capacity == 0` is
    /// accepted (an always-full trajectory); callers that need an error
    /// on zero capacity should check before constructing.
    pub fn new(capacity: usize) -> Self {
        Self { samples: Vec::with_capacity(capacity), capacity }
    }

    /// Alias for [`Trajectory::new`]; kept for symmetry with the
    /// init/init_full naming used across the rest of the engine.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity)
    }

    /// Empties the buffer; capacity is preserved.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Changes capacity. If the new capacity is smaller than the current
    /// length, existing samples are truncated to fit.
    pub fn resize(&mut self, new_capacity: usize) {
        self.capacity = new_capacity;
        if self.samples.len() > new_capacity {
            self.samples.truncate(new_capacity);
        }
    }

    /// Appends a sample; returns `false` (does not mutate) if the buffer
    /// is already at capacity.
    #[must_use]
    pub fn add_sample(&mut self, t: f32, state: MotionState) -> bool {
        if self.samples.len() >= self.capacity {
            return false;
        }
        self.samples.push(TrajectorySample::new(t, state));
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    /// Deep copy `src` into `self`, reallocating if `self`'s capacity is
    /// smaller than `src`'s length.
    pub fn assign(&mut self, src: &Trajectory) {
        if self.capacity < src.samples.len() {
            self.capacity = src.samples.len();
        }
        self.samples = src.samples.clone();
    }

    fn bracket(&self, t: f32) -> Option<(usize, usize)> {
        if self.samples.is_empty() {
            return None;
        }
        if t <= self.samples[0].t {
            return Some((0, 0));
        }
        let last = self.samples.len() - 1;
        if t >= self.samples[last].t {
            return Some((last, last));
        }
        for i in 0..last {
            if self.samples[i].t <= t && t <= self.samples[i + 1].t {
                return Some((i, i + 1));
            }
        }
        Some((last, last))
    }

    /// Linear interpolation between the bracketing samples; clamps to
    /// the first/last sample outside the trajectory's time range.
    pub fn interpolate_position(&self, t: f32) -> Option<Vec3> {
        let (i, j) = self.bracket(t)?;
        if i == j {
            return Some(self.samples[i].state.linear.position);
        }
        let (a, b) = (&self.samples[i], &self.samples[j]);
        let span = b.t - a.t;
        let frac = if span.abs() < 1e-12 { 0.0 } else { (t - a.t) / span };
        Some(a.state.linear.position.lerp(b.state.linear.position, frac))
    }

    /// Finite-difference velocity estimate between the bracketing
    /// samples; clamps at the ends.
    pub fn estimate_velocity(&self, t: f32) -> Option<Vec3> {
        let (i, j) = self.bracket(t)?;
        let (i, j) = if i == j {
            if i == 0 {
                (i, (i + 1).min(self.samples.len() - 1))
            } else {
                (i - 1, i)
            }
        } else {
            (i, j)
        };
        if i == j {
            return Some(Vec3::zero());
        }
        let (a, b) = (&self.samples[i], &self.samples[j]);
        let dt = b.t - a.t;
        if dt.abs() < 1e-12 {
            return Some(Vec3::zero());
        }
        Some((b.state.linear.position - a.state.linear.position).scale(1.0 / dt))
    }

    /// Second finite-difference acceleration estimate; requires at least
    /// three samples.
    pub fn estimate_acceleration(&self, t: f32) -> Option<Vec3> {
        if self.samples.len() < 3 {
            return None;
        }
        let (i, j) = self.bracket(t)?;
        let mid = if i == j { i } else { i };
        let mid = mid.clamp(1, self.samples.len() - 2);
        let (prev, cur, next) =
            (&self.samples[mid - 1], &self.samples[mid], &self.samples[mid + 1]);
        let dt1 = cur.t - prev.t;
        let dt2 = next.t - cur.t;
        if dt1.abs() < 1e-12 || dt2.abs() < 1e-12 {
            return Some(Vec3::zero());
        }
        let v1 = (cur.state.linear.position - prev.state.linear.position).scale(1.0 / dt1);
        let v2 = (next.state.linear.position - cur.state.linear.position).scale(1.0 / dt2);
        let dt_mid = 0.5 * (dt1 + dt2);
        Some((v2 - v1).scale(1.0 / dt_mid))
    }

    pub fn extract_positions(&self) -> Vec<Vec3> {
        self.samples.iter().map(|s| s.state.linear.position).collect()
    }

    pub fn extract_speeds(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.state.linear.velocity.length()).collect()
    }

    /// Logs a one-line summary of every sample via [`log::info!`].
    pub fn print(&self) {
        log::info!("{}", self);
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trajectory({}/{} samples)", self.samples.len(), self.capacity)?;
        for s in &self.samples {
            writeln!(f, "  t={:.4} pos={} vel={}", s.t, s.state.linear.position, s.state.linear.velocity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion_state::LinearState;

    fn sample_at(t: f32, x: f32) -> TrajectorySample {
        let linear = LinearState::new(Vec3::new(x, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::zero());
        TrajectorySample::new(t, MotionState { linear, ..Default::default() })
    }

    fn filled(n: usize) -> Trajectory {
        let mut traj = Trajectory::new(n);
        for i in 0..n {
            let t = i as f32;
            assert!(traj.add_sample(t, sample_at(t, t).state));
        }
        traj
    }

    #[test]
    fn add_sample_fails_when_full() {
        let mut traj = Trajectory::new(2);
        assert!(traj.add_sample(0.0, sample_at(0.0, 0.0).state));
        assert!(traj.add_sample(1.0, sample_at(1.0, 1.0).state));
        assert!(!traj.add_sample(2.0, sample_at(2.0, 2.0).state));
        assert_eq!(traj.len(), 2);
    }

    #[test]
    fn clear_preserves_capacity() {
        let mut traj = filled(3);
        traj.clear();
        assert_eq!(traj.len(), 0);
        assert_eq!(traj.capacity(), 3);
    }

    #[test]
    fn resize_truncates_when_shrinking() {
        let mut traj = filled(5);
        traj.resize(2);
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.capacity(), 2);
    }

    #[test]
    fn interpolate_clamps_at_ends() {
        let traj = filled(3);
        assert_eq!(traj.interpolate_position(-5.0), Some(Vec3::new(0.0, 0.0, 0.0)));
        assert_eq!(traj.interpolate_position(50.0), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn interpolate_midpoint() {
        let traj = filled(3);
        let mid = traj.interpolate_position(0.5).unwrap();
        assert!(mid.approx_eq(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn acceleration_needs_three_samples() {
        let traj = filled(2);
        assert_eq!(traj.estimate_acceleration(0.5), None);
    }

    #[test]
    fn assign_reallocates_to_fit_source() {
        let mut dst = Trajectory::new(1);
        let src = filled(4);
        dst.assign(&src);
        assert_eq!(dst.len(), 4);
        assert!(dst.capacity() >= 4);
    }
}
