use crate::shared::identity::{Centroid, Identity};

use super::trajectory::Trajectory;

/// Accumulated state for one identity.
#[derive(Clone, Debug)]
pub struct Track {
    identity: Identity,
    trajectory: Trajectory,
    cumulative_time: f64,
    last_seen: f64,
}

impl Track {
    /// First sighting: establishes the baseline, no time accrued yet.
    pub(crate) fn start(
        identity: Identity,
        centroid: Centroid,
        timestamp: f64,
        capacity: usize,
    ) -> Self {
        let mut trajectory = Trajectory::with_capacity(capacity);
        trajectory.push(centroid);
        Self {
            identity,
            trajectory,
            cumulative_time: 0.0,
            last_seen: timestamp,
        }
    }

    /// Subsequent sighting: accrues the gap since the previous one.
    pub(crate) fn observe(&mut self, centroid: Centroid, timestamp: f64) {
        self.trajectory.push(centroid);
        self.credit_until(timestamp);
    }

    /// `timestamp` must not precede `last_seen`.
    pub(crate) fn credit_until(&mut self, timestamp: f64) {
        debug_assert!(
            timestamp >= self.last_seen,
            "credit_until({timestamp}) before last sighting at {}",
            self.last_seen
        );
        self.cumulative_time += timestamp - self.last_seen;
        self.last_seen = timestamp;
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn cumulative_time(&self) -> f64 {
        self.cumulative_time
    }

    pub fn last_seen(&self) -> f64 {
        self.last_seen
    }
}
