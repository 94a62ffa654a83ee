use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::shared::constants::TRAJECTORY_CAPACITY;
use crate::shared::identity::{Centroid, Identity};

use super::track::Track;
use super::tracking_error::{LedgerMisuse, TrackingError};
use super::trajectory::Trajectory;

/// How `finalize` treats the time between an identity's last sighting and
/// the end of the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DwellPolicy {
    /// Credit every identity through the final timestamp.
    #[default]
    ThroughStreamEnd,
    /// Stop crediting at the last sighting; finalize adds nothing.
    UntilLastSeen,
}

impl FromStr for DwellPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "through-end" => Ok(Self::ThroughStreamEnd),
            "last-seen" => Ok(Self::UntilLastSeen),
            other => Err(format!(
                "dwell policy must be 'through-end' or 'last-seen', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for DwellPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThroughStreamEnd => write!(f, "through-end"),
            Self::UntilLastSeen => write!(f, "last-seen"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Points kept per trajectory; zero is raised to one.
    pub trajectory_capacity: usize,
    pub dwell_policy: DwellPolicy,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            trajectory_capacity: TRAJECTORY_CAPACITY,
            dwell_policy: DwellPolicy::default(),
        }
    }
}

/// Owns every per-identity track for one processing run.
///
/// Tracks are stored in order of first appearance and never removed, so the
/// number of tracks is the unique-identity count. Timestamps fed to
/// `begin_frame`, `record` and `finalize` must never decrease.
#[derive(Debug)]
pub struct TrackLedger {
    options: LedgerOptions,
    tracks: Vec<Track>,
    slots: HashMap<Identity, usize>,
    clock: Option<f64>,
    finalized: bool,
}

impl TrackLedger {
    pub fn new(mut options: LedgerOptions) -> Self {
        if options.trajectory_capacity == 0 {
            log::warn!("Trajectory capacity 0 is not usable, keeping 1 point per track");
            options.trajectory_capacity = 1;
        }
        Self {
            options,
            tracks: Vec::new(),
            slots: HashMap::new(),
            clock: None,
            finalized: false,
        }
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    /// Advances the ledger clock to a new frame without recording anything.
    ///
    /// Lets empty frames clear the set of currently visible tracks.
    pub fn begin_frame(&mut self, timestamp: f64) -> Result<(), TrackingError> {
        if self.finalized {
            return Err(LedgerMisuse::RecordAfterFinalize.into());
        }
        self.advance_clock(timestamp)
    }

    pub fn record(
        &mut self,
        identity: Identity,
        centroid: Centroid,
        timestamp: f64,
    ) -> Result<(), TrackingError> {
        if self.finalized {
            return Err(LedgerMisuse::RecordAfterFinalize.into());
        }
        self.advance_clock(timestamp)?;

        match self.slots.get(&identity) {
            Some(&slot) => self.tracks[slot].observe(centroid, timestamp),
            None => {
                log::debug!("New identity {identity} at {timestamp:.3}s");
                self.slots.insert(identity, self.tracks.len());
                self.tracks.push(Track::start(
                    identity,
                    centroid,
                    timestamp,
                    self.options.trajectory_capacity,
                ));
            }
        }
        Ok(())
    }

    /// Closes out all tracks at `final_timestamp`. Must be called exactly once.
    pub fn finalize(&mut self, final_timestamp: f64) -> Result<(), TrackingError> {
        if self.finalized {
            return Err(LedgerMisuse::FinalizedTwice.into());
        }
        self.advance_clock(final_timestamp)?;

        if self.options.dwell_policy == DwellPolicy::ThroughStreamEnd {
            for track in &mut self.tracks {
                track.credit_until(final_timestamp);
            }
        }
        self.finalized = true;
        log::debug!(
            "Ledger finalized at {final_timestamp:.3}s with {} identities",
            self.tracks.len()
        );
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn unique_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.slots.contains_key(&identity)
    }

    pub fn track(&self, identity: Identity) -> Option<&Track> {
        self.slots.get(&identity).map(|&slot| &self.tracks[slot])
    }

    /// Last recorded centroids (oldest first), at most the trajectory capacity.
    pub fn trajectory_of(&self, identity: Identity) -> Option<&Trajectory> {
        self.track(identity).map(Track::trajectory)
    }

    pub fn cumulative_time_of(&self, identity: Identity) -> Option<f64> {
        self.track(identity).map(Track::cumulative_time)
    }

    /// Latest timestamp the ledger has been advanced to.
    pub fn current_timestamp(&self) -> Option<f64> {
        self.clock
    }

    /// All tracks in order of first appearance.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Tracks recorded at the current timestamp, i.e. in the current frame.
    pub fn visible_tracks(&self) -> impl Iterator<Item = &Track> {
        let clock = self.clock;
        self.tracks
            .iter()
            .filter(move |t| clock == Some(t.last_seen()))
    }

    fn advance_clock(&mut self, timestamp: f64) -> Result<(), TrackingError> {
        if let Some(previous) = self.clock {
            if timestamp < previous {
                return Err(LedgerMisuse::TimestampRegressed {
                    previous,
                    given: timestamp,
                }
                .into());
            }
        }
        self.clock = Some(timestamp);
        Ok(())
    }
}

impl Default for TrackLedger {
    fn default() -> Self {
        Self::new(LedgerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn id(n: u32) -> Identity {
        Identity(n)
    }

    fn at(x: i32, y: i32) -> Centroid {
        Centroid::new(x, y)
    }

    fn ledger_with(policy: DwellPolicy) -> TrackLedger {
        TrackLedger::new(LedgerOptions {
            dwell_policy: policy,
            ..LedgerOptions::default()
        })
    }

    // ── Trajectory bound ─────────────────────────────────────────────

    #[test]
    fn test_trajectory_keeps_thirty_most_recent() {
        let mut ledger = TrackLedger::default();
        for i in 0..45 {
            ledger
                .record(id(1), at(i, -i), (i + 1) as f64 / 10.0)
                .unwrap();
        }
        let trajectory = ledger.trajectory_of(id(1)).unwrap().to_vec();
        assert_eq!(trajectory.len(), 30);
        let expected: Vec<_> = (15..45).map(|i| at(i, -i)).collect();
        assert_eq!(trajectory, expected);
    }

    #[test]
    fn test_custom_trajectory_capacity() {
        let mut ledger = TrackLedger::new(LedgerOptions {
            trajectory_capacity: 2,
            ..LedgerOptions::default()
        });
        for i in 0..5 {
            ledger.record(id(1), at(i, 0), i as f64).unwrap();
        }
        assert_eq!(
            ledger.trajectory_of(id(1)).unwrap().to_vec(),
            vec![at(3, 0), at(4, 0)]
        );
    }

    #[test]
    fn test_zero_trajectory_capacity_keeps_latest_point() {
        let mut ledger = TrackLedger::new(LedgerOptions {
            trajectory_capacity: 0,
            ..LedgerOptions::default()
        });
        assert_eq!(ledger.options().trajectory_capacity, 1);

        ledger.record(id(1), at(1, 1), 0.5).unwrap();
        ledger.record(id(1), at(2, 2), 1.0).unwrap();
        let trajectory = ledger.trajectory_of(id(1)).unwrap();
        assert_eq!(trajectory.capacity(), 1);
        assert_eq!(trajectory.to_vec(), vec![at(2, 2)]);
    }

    #[test]
    fn test_unknown_identity_has_no_state() {
        let ledger = TrackLedger::default();
        assert!(ledger.trajectory_of(id(5)).is_none());
        assert!(ledger.cumulative_time_of(id(5)).is_none());
        assert!(!ledger.contains(id(5)));
    }

    // ── Unique count ─────────────────────────────────────────────────

    #[test]
    fn test_unique_count_is_monotonic_and_counts_distinct_ids() {
        let mut ledger = TrackLedger::default();
        let sequence = [3, 1, 3, 7, 1, 1, 9, 3];
        let mut previous = 0;
        for (frame, &n) in sequence.iter().enumerate() {
            ledger.record(id(n), at(0, 0), frame as f64).unwrap();
            assert!(ledger.unique_count() >= previous);
            previous = ledger.unique_count();
        }
        assert_eq!(ledger.unique_count(), 4);
    }

    #[test]
    fn test_tracks_iterate_in_first_appearance_order() {
        let mut ledger = TrackLedger::default();
        for (t, n) in [(0.1, 8), (0.2, 2), (0.2, 8), (0.3, 5), (0.4, 2)] {
            ledger.record(id(n), at(0, 0), t).unwrap();
        }
        let order: Vec<_> = ledger.tracks().map(Track::identity).collect();
        assert_eq!(order, vec![id(8), id(2), id(5)]);
    }

    // ── Time accrual ─────────────────────────────────────────────────

    #[test]
    fn test_accrues_between_consecutive_sightings() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 1.0).unwrap();
        ledger.record(id(1), at(1, 0), 1.5).unwrap();
        ledger.record(id(1), at(2, 0), 2.5).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 1.5);

        ledger.finalize(4.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 3.0);
    }

    #[test]
    fn test_first_sighting_contributes_nothing() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(4), at(0, 0), 12.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(4)).unwrap(), 0.0);
    }

    #[test]
    fn test_single_sighting_credited_through_stream_end() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 0.5).unwrap();
        ledger.finalize(2.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 1.5);
    }

    #[test]
    fn test_until_last_seen_policy_adds_nothing_on_finalize() {
        let mut ledger = ledger_with(DwellPolicy::UntilLastSeen);
        ledger.record(id(1), at(0, 0), 0.5).unwrap();
        ledger.record(id(1), at(0, 0), 0.75).unwrap();
        ledger.record(id(2), at(0, 0), 0.75).unwrap();
        ledger.finalize(10.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 0.25);
        assert_relative_eq!(ledger.cumulative_time_of(id(2)).unwrap(), 0.0);
    }

    #[test]
    fn test_absent_frames_do_not_advance_time_until_next_sighting() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 1.0).unwrap();
        ledger.begin_frame(2.0).unwrap();
        ledger.begin_frame(3.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 0.0);
        ledger.record(id(1), at(0, 0), 4.0).unwrap();
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 3.0);
    }

    #[test]
    fn test_empty_ledger_finalizes_cleanly() {
        let mut ledger = TrackLedger::default();
        ledger.finalize(3.0).unwrap();
        assert_eq!(ledger.unique_count(), 0);
        assert_eq!(ledger.tracks().count(), 0);
        assert!(ledger.is_finalized());
    }

    #[test]
    fn test_two_object_scenario() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 0.1).unwrap();
        ledger.record(id(1), at(1, 0), 0.2).unwrap();
        ledger.record(id(2), at(5, 5), 0.2).unwrap();
        ledger.record(id(2), at(6, 5), 0.3).unwrap();
        ledger.finalize(0.3).unwrap();

        assert_eq!(
            ledger.trajectory_of(id(1)).unwrap().to_vec(),
            vec![at(0, 0), at(1, 0)]
        );
        assert_eq!(
            ledger.trajectory_of(id(2)).unwrap().to_vec(),
            vec![at(5, 5), at(6, 5)]
        );
        assert_relative_eq!(
            ledger.cumulative_time_of(id(1)).unwrap(),
            0.2,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            ledger.cumulative_time_of(id(2)).unwrap(),
            0.1,
            epsilon = 1e-9
        );
        assert_eq!(ledger.unique_count(), 2);
    }

    // ── Visibility ───────────────────────────────────────────────────

    #[test]
    fn test_visible_tracks_follow_current_frame() {
        let mut ledger = TrackLedger::default();
        ledger.begin_frame(0.1).unwrap();
        ledger.record(id(1), at(0, 0), 0.1).unwrap();
        ledger.record(id(2), at(0, 0), 0.1).unwrap();
        assert_eq!(ledger.visible_tracks().count(), 2);

        ledger.begin_frame(0.2).unwrap();
        ledger.record(id(2), at(1, 1), 0.2).unwrap();
        let visible: Vec<_> = ledger.visible_tracks().map(Track::identity).collect();
        assert_eq!(visible, vec![id(2)]);

        ledger.begin_frame(0.3).unwrap();
        assert_eq!(ledger.visible_tracks().count(), 0);
        assert_eq!(ledger.current_timestamp(), Some(0.3));
    }

    // ── Misuse ───────────────────────────────────────────────────────

    #[test]
    fn test_record_after_finalize_is_rejected() {
        let mut ledger = TrackLedger::default();
        ledger.finalize(1.0).unwrap();
        let err = ledger.record(id(1), at(0, 0), 2.0).unwrap_err();
        assert_eq!(
            err,
            TrackingError::LedgerMisuse(LedgerMisuse::RecordAfterFinalize)
        );
        assert_eq!(ledger.unique_count(), 0);
    }

    #[test]
    fn test_begin_frame_after_finalize_is_rejected() {
        let mut ledger = TrackLedger::default();
        ledger.finalize(1.0).unwrap();
        assert!(ledger.begin_frame(2.0).is_err());
    }

    #[test]
    fn test_finalize_twice_is_rejected_without_double_credit() {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 1.0).unwrap();
        ledger.finalize(2.0).unwrap();
        let err = ledger.finalize(3.0).unwrap_err();
        assert_eq!(err, TrackingError::LedgerMisuse(LedgerMisuse::FinalizedTwice));
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 1.0);
    }

    #[rstest]
    #[case::record(true)]
    #[case::finalize(false)]
    fn test_regressing_timestamp_is_rejected(#[case] via_record: bool) {
        let mut ledger = TrackLedger::default();
        ledger.record(id(1), at(0, 0), 1.0).unwrap();
        let result = if via_record {
            ledger.record(id(1), at(0, 0), 0.5)
        } else {
            ledger.finalize(0.5)
        };
        assert_eq!(
            result.unwrap_err(),
            TrackingError::LedgerMisuse(LedgerMisuse::TimestampRegressed {
                previous: 1.0,
                given: 0.5,
            })
        );
        assert_relative_eq!(ledger.cumulative_time_of(id(1)).unwrap(), 0.0);
    }

    // ── Policy parsing ───────────────────────────────────────────────

    #[rstest]
    #[case("through-end", DwellPolicy::ThroughStreamEnd)]
    #[case("last-seen", DwellPolicy::UntilLastSeen)]
    fn test_dwell_policy_round_trips_through_text(
        #[case] text: &str,
        #[case] policy: DwellPolicy,
    ) {
        assert_eq!(text.parse::<DwellPolicy>().unwrap(), policy);
        assert_eq!(policy.to_string(), text);
    }

    #[test]
    fn test_unknown_dwell_policy_is_rejected() {
        assert!("forever".parse::<DwellPolicy>().is_err());
    }
}
