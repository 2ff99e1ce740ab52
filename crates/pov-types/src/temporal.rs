use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds since the UNIX epoch, with sub-second precision.
///
/// A clock set before the epoch reads as `0.0` rather than failing; block
/// timestamps are informational and never used for ordering.
pub fn unix_seconds_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_produces_reasonable_timestamp() {
        // After 2020-01-01.
        assert!(unix_seconds_now() > 1_577_836_800.0);
    }

    #[test]
    fn now_is_not_truncated_to_whole_seconds() {
        let samples: Vec<f64> = (0..50).map(|_| unix_seconds_now()).collect();
        assert!(samples.iter().any(|t| t.fract() != 0.0));
    }
}
