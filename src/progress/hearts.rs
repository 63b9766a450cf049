//! Hearts: the capped, regenerating retry budget of a learning path
//!
//! A student starts every path with [`MAX_HEARTS`]. Redoing an imperfect
//! quiz spends one. The first heart lost while full anchors a refill window;
//! further losses inside the window do not move the anchor. Once
//! [`REGEN_INTERVAL`] has elapsed since the anchor the student is full again.
//!
//! Regeneration is lazy: nothing runs in the background, callers reconcile
//! with the current time whenever they load progress.

use chrono::{DateTime, Duration, Utc};

/// Maximum (and starting) number of hearts
pub const MAX_HEARTS: u8 = 5;

/// Time after the first loss at which hearts are fully restored
pub const REGEN_INTERVAL: Duration = Duration::hours(3);

/// Heart budget of one student on one path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeartState {
    /// All hearts available, no refill pending
    #[default]
    Full,
    /// Fewer than [`MAX_HEARTS`] remain
    Depleted {
        /// Hearts left, always below [`MAX_HEARTS`]
        hearts: u8,
        /// When the first heart of this streak was lost
        since: DateTime<Utc>,
    },
}

impl HeartState {
    /// Rebuild the state from its persisted columns.
    ///
    /// A depleted count without a timestamp cannot be timed, so it is read as
    /// [`HeartState::Full`] rather than locking the student out forever.
    pub fn from_parts(hearts: u8, last_loss: Option<DateTime<Utc>>) -> Self {
        match last_loss {
            Some(since) if hearts < MAX_HEARTS => Self::Depleted { hearts, since },
            _ => Self::Full,
        }
    }

    /// Split into the persisted `(hearts, lastHeartLoss)` pair
    pub fn into_parts(self) -> (u8, Option<DateTime<Utc>>) {
        match self {
            Self::Full => (MAX_HEARTS, None),
            Self::Depleted { hearts, since } => (hearts, Some(since)),
        }
    }

    /// Hearts currently available
    pub fn hearts(&self) -> u8 {
        match self {
            Self::Full => MAX_HEARTS,
            Self::Depleted { hearts, .. } => *hearts,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Spend one heart. Returns `None` when none are left.
    pub fn spend(self, now: DateTime<Utc>) -> Option<Self> {
        match self {
            Self::Full => Some(Self::Depleted { hearts: MAX_HEARTS - 1, since: now }),
            Self::Depleted { hearts: 0, .. } => None,
            Self::Depleted { hearts, since } => Some(Self::Depleted { hearts: hearts - 1, since }),
        }
    }

    /// Apply any regeneration that is due at `now`
    pub fn reconcile(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::Depleted { since, .. } if now >= since + REGEN_INTERVAL => Self::Full,
            other => other,
        }
    }

    /// When the pending refill lands, if one is pending
    pub fn next_refill(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Full => None,
            Self::Depleted { since, .. } => Some(*since + REGEN_INTERVAL),
        }
    }

    /// Time left until the pending refill. A refill that is already due
    /// reports zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_refill().map(|at| (at - now).max(Duration::zero()))
    }

    /// Human-readable countdown (`HH:MM:SS`) until the pending refill
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<String> {
        self.remaining(now).map(format_countdown)
    }
}

/// Format a duration as `HH:MM:SS`
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn missing_timestamp_reads_as_full() {
        assert_eq!(HeartState::from_parts(2, None), HeartState::Full);
    }

    #[test]
    fn full_count_ignores_stale_timestamp() {
        assert_eq!(HeartState::from_parts(MAX_HEARTS, Some(at(1, 0))), HeartState::Full);
    }

    #[test]
    fn first_loss_anchors_window() {
        let state = HeartState::Full.spend(at(10, 0)).unwrap();
        assert_eq!(state, HeartState::Depleted { hearts: 4, since: at(10, 0) });
    }

    #[test]
    fn later_losses_keep_anchor() {
        let state = HeartState::Full.spend(at(10, 0)).unwrap().spend(at(11, 30)).unwrap();
        assert_eq!(state, HeartState::Depleted { hearts: 3, since: at(10, 0) });
    }

    #[test]
    fn cannot_spend_last_heart_twice() {
        let empty = HeartState::Depleted { hearts: 0, since: at(10, 0) };
        assert_eq!(empty.spend(at(10, 5)), None);
    }

    #[test]
    fn reconcile_after_seven_hours_refills() {
        let now = at(17, 0);
        let state = HeartState::Depleted { hearts: 2, since: now - Duration::hours(7) };
        assert_eq!(state.reconcile(now), HeartState::Full);
        assert_eq!(state.reconcile(now).into_parts(), (5, None));
    }

    #[test]
    fn reconcile_inside_window_keeps_hearts() {
        let now = at(17, 0);
        let state = HeartState::Depleted { hearts: 3, since: now - Duration::hours(2) };
        assert_eq!(state.reconcile(now), state);
    }

    #[test]
    fn reconcile_exactly_at_deadline_refills() {
        let state = HeartState::Depleted { hearts: 0, since: at(9, 0) };
        assert_eq!(state.reconcile(at(12, 0)), HeartState::Full);
    }

    #[test]
    fn future_anchor_restores_nothing() {
        let state = HeartState::Depleted { hearts: 1, since: at(12, 0) };
        assert_eq!(state.reconcile(at(9, 0)), state);
    }

    #[test]
    fn countdown_formats_remaining_time() {
        let state = HeartState::Depleted { hearts: 4, since: at(10, 0) };
        assert_eq!(state.countdown(at(11, 45)).as_deref(), Some("01:15:00"));
        assert_eq!(state.countdown(at(14, 0)).as_deref(), Some("00:00:00"));
        assert_eq!(HeartState::Full.countdown(at(11, 0)), None);
    }

    proptest! {
        #[test]
        fn hearts_stay_in_range(spends in 0usize..12, minutes in 0i64..600) {
            let start = at(8, 0);
            let mut state = HeartState::Full;
            for i in 0..spends {
                if let Some(next) = state.spend(start + Duration::minutes(i as i64)) {
                    state = next;
                }
            }
            let state = state.reconcile(start + Duration::minutes(minutes));
            prop_assert!(state.hearts() <= MAX_HEARTS);
            let (hearts, last) = state.into_parts();
            prop_assert_eq!(last.is_none(), hearts == MAX_HEARTS);
        }
    }
}
