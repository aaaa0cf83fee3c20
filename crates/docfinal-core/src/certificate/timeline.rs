//! Signature IDs and the back-computed audit timeline

use crate::clock::Clock;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand_core::RngCore;

pub const SIGNATURE_ID_LENGTH: usize = 26;
const SIGNATURE_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Seconds between "viewed" and "signed" (1 to 6 minutes)
pub const VIEWED_OFFSET_SECS: (u64, u64) = (60, 360);
/// Seconds between "sent" and "viewed" (1 to 11 minutes)
pub const SENT_OFFSET_SECS: (u64, u64) = (60, 660);

/// Display format for certificate timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p (UTC)";

/// Fresh 26-character uppercase alphanumeric identifier
pub fn signature_id<R: RngCore>(rng: &mut R) -> String {
    (0..SIGNATURE_ID_LENGTH)
        .map(|_| {
            let index = rng.next_u32() as usize % SIGNATURE_ID_ALPHABET.len();
            SIGNATURE_ID_ALPHABET[index] as char
        })
        .collect()
}

/// Uniform draw from the inclusive range `[low, high]`
fn offset_in<R: RngCore>(rng: &mut R, (low, high): (u64, u64)) -> u64 {
    let span = high - low + 1;
    low + rng.next_u64() % span
}

/// Sent, viewed and signed instants; always `sent < viewed < signed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditTimeline {
    pub sent: DateTime<Utc>,
    pub viewed: DateTime<Utc>,
    pub signed: DateTime<Utc>,
}

impl AuditTimeline {
    /// Anchor the timeline at `signed` and walk backwards by random offsets
    pub fn derive<R: RngCore>(signed: DateTime<Utc>, rng: &mut R) -> Self {
        let viewed = signed - Duration::seconds(offset_in(rng, VIEWED_OFFSET_SECS) as i64);
        let sent = viewed - Duration::seconds(offset_in(rng, SENT_OFFSET_SECS) as i64);
        Self {
            sent,
            viewed,
            signed,
        }
    }

    /// Signed instant for a signing date: the date at the clock's time of day.
    /// Without a date the clock's current instant is used.
    pub fn signed_at<C: Clock>(signing_date: Option<NaiveDate>, clock: &C) -> DateTime<Utc> {
        let now = clock.now();
        match signing_date {
            Some(date) => Utc.from_utc_datetime(&date.and_time(now.time())),
            None => now,
        }
    }

    pub fn format(instant: &DateTime<Utc>) -> String {
        instant.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use pretty_assertions::assert_eq;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 2, 14, 30, 5).unwrap())
    }

    #[test]
    fn test_signature_id_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let id = signature_id(&mut rng);
        assert_eq!(id.len(), SIGNATURE_ID_LENGTH);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_signature_id_deterministic_per_seed() {
        let a = signature_id(&mut ChaCha8Rng::seed_from_u64(42));
        let b = signature_id(&mut ChaCha8Rng::seed_from_u64(42));
        let c = signature_id(&mut ChaCha8Rng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_signed_at_uses_date_with_clock_time() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let signed = AuditTimeline::signed_at(date, &clock());
        assert_eq!(signed, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 5).unwrap());
    }

    #[test]
    fn test_signed_at_without_date_is_now() {
        assert_eq!(AuditTimeline::signed_at(None, &clock()), clock().0);
    }

    #[test]
    fn test_offsets_within_bounds() {
        let signed = clock().0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let timeline = AuditTimeline::derive(signed, &mut rng);
            let viewed_gap = (timeline.signed - timeline.viewed).num_seconds();
            let sent_gap = (timeline.viewed - timeline.sent).num_seconds();
            assert!((60..=360).contains(&viewed_gap), "{}", viewed_gap);
            assert!((60..=660).contains(&sent_gap), "{}", sent_gap);
        }
    }

    #[test]
    fn test_format() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 5).unwrap();
        assert_eq!(AuditTimeline::format(&instant), "2024-01-15 02:30:05 PM (UTC)");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    proptest! {
        /// Property: sent < viewed < signed for any seed and anchor
        #[test]
        fn timeline_strictly_ordered(seed in any::<u64>(), secs in 0i64..4_000_000_000) {
            let signed = Utc.timestamp_opt(secs, 0).unwrap();
            let timeline = AuditTimeline::derive(signed, &mut ChaCha8Rng::seed_from_u64(seed));
            prop_assert!(timeline.sent < timeline.viewed);
            prop_assert!(timeline.viewed < timeline.signed);
            prop_assert_eq!(timeline.signed, signed);
        }
    }
}
