//! # TTL Jitter and Bounds
//!
//! Expiration hygiene for every write to the shared backend. Jitter spreads
//! the expirations of entries cached in the same burst so they do not stampede
//! the upstream when they lapse together; the cap keeps TTLs inside the
//! backend's 32-bit second range.

use crate::constants::cache::MAX_TTL_SECONDS;

/// Applies a uniformly random offset of up to `±percent%` to a TTL.
///
/// The result is rounded to whole seconds and never drops below 1, so an
/// entry that was meant to expire always does. `percent` of 0 leaves the
/// TTL unchanged (aside from the floor).
pub fn deviate_ttl(ttl_seconds: u64, percent: u32) -> u64 {
    if percent == 0 {
        return ttl_seconds.max(1);
    }
    let spread = ttl_seconds as f64 * (f64::from(percent) / 100.0);
    let offset = (fastrand::f64() * 2.0 - 1.0) * spread;
    let jittered = (ttl_seconds as f64 + offset).round().max(1.0);
    jittered as u64
}

/// Clamps a TTL to the backend's maximum representable expiration.
pub fn cap_ttl(ttl_seconds: u64) -> u64 {
    ttl_seconds.min(MAX_TTL_SECONDS)
}

/// Jitter followed by the cap: the exact TTL handed to the backend.
///
/// The cap runs last so that a deviated TTL can never escape the backend's
/// range, no matter how large the input or the deviation.
pub fn effective_ttl(ttl_seconds: u64, deviate_percent: u32) -> u64 {
    cap_ttl(deviate_ttl(ttl_seconds, deviate_percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_percent_is_identity_above_floor() {
        assert_eq!(deviate_ttl(60, 0), 60);
        assert_eq!(deviate_ttl(1, 0), 1);
    }

    #[test]
    fn test_floor_applies_to_degenerate_inputs() {
        assert_eq!(deviate_ttl(0, 0), 1);
        // A ±100% deviation on a 1s TTL may reach 0 before the floor.
        for _ in 0..100 {
            assert!(deviate_ttl(1, 100) >= 1);
        }
    }

    #[test]
    fn test_cap_passes_small_values_through() {
        assert_eq!(cap_ttl(60), 60);
        assert_eq!(cap_ttl(MAX_TTL_SECONDS), MAX_TTL_SECONDS);
    }

    #[test]
    fn test_cap_clamps_oversized_values() {
        assert_eq!(cap_ttl(MAX_TTL_SECONDS + 1), MAX_TTL_SECONDS);
        assert_eq!(cap_ttl(u64::MAX), MAX_TTL_SECONDS);
    }

    #[test]
    fn test_effective_ttl_caps_after_jitter() {
        // Even a +50% deviation on a near-cap TTL must come back capped.
        for _ in 0..100 {
            assert!(effective_ttl(MAX_TTL_SECONDS, 50) <= MAX_TTL_SECONDS);
        }
    }

    proptest! {
        #[test]
        fn prop_deviation_stays_in_band(ttl in 1u64..=86_400 * 365, percent in 0u32..=50) {
            let deviated = deviate_ttl(ttl, percent);
            let spread = ttl as f64 * (f64::from(percent) / 100.0);
            let lo = ((ttl as f64 - spread).floor().max(1.0)) as u64;
            let hi = ((ttl as f64 + spread).ceil()) as u64;
            prop_assert!(deviated >= lo, "deviated {} below {}", deviated, lo);
            prop_assert!(deviated <= hi, "deviated {} above {}", deviated, hi);
        }

        #[test]
        fn prop_deviation_never_below_one(ttl in 0u64..=10_000, percent in 0u32..=100) {
            prop_assert!(deviate_ttl(ttl, percent) >= 1);
        }

        #[test]
        fn prop_effective_ttl_never_exceeds_cap(ttl in 0u64..=u64::MAX / 2, percent in 0u32..=100) {
            prop_assert!(effective_ttl(ttl, percent) <= MAX_TTL_SECONDS);
        }
    }
}
