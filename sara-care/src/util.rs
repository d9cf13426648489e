use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, RngCore};

/// Returns `bytes` random bytes encoded as lowercase hex
pub fn random_hex(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    thread_rng().fill_bytes(&mut buffer);

    hex::encode(buffer)
}

/// The instant `amount` units before now, where `unit` is a fallible [Duration] constructor.
///
/// Windows reaching further back than the unix epoch start at the epoch, so an oversized
/// window covers every record instead of overflowing.
pub fn lookback(amount: i64, unit: fn(i64) -> Option<Duration>) -> DateTime<Utc> {
    let start = unit(amount).and_then(|delta| Utc::now().checked_sub_signed(delta));

    match start {
        Some(start) => start.max(DateTime::UNIX_EPOCH),
        // A negative window lies entirely in the future
        None if amount < 0 => DateTime::<Utc>::MAX_UTC,
        None => DateTime::UNIX_EPOCH,
    }
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, Utc};

    use super::{lookback, random_hex};

    #[test]
    fn hex_length_and_alphabet() {
        let token = random_hex(16);

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, random_hex(16));
    }

    #[test]
    fn lookback_subtracts_from_now() {
        let before = Utc::now();
        let since = lookback(24, Duration::try_hours);
        let after = Utc::now();

        assert!(since >= before - Duration::hours(24));
        assert!(since <= after - Duration::hours(24));
    }

    #[test]
    fn oversized_lookback_starts_at_epoch() {
        assert_eq!(lookback(i64::MAX, Duration::try_hours), DateTime::UNIX_EPOCH);
        assert_eq!(lookback(10_000_000_000, Duration::try_hours), DateTime::UNIX_EPOCH);
        assert_eq!(lookback(i64::MAX, Duration::try_days), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn negative_lookback_is_in_the_future() {
        assert!(lookback(-1, Duration::try_hours) > Utc::now());
        assert_eq!(lookback(i64::MIN, Duration::try_days), DateTime::<Utc>::MAX_UTC);
    }
}
