//! Go-to-time text entry and time label formatting.
//!
//! Accepted forms and their literal mapping:
//!
//! | input          | result                         |
//! |----------------|--------------------------------|
//! | `N`            | `N` milliseconds (raw)         |
//! | `S.F`          | `S * 1000 + F` ms              |
//! | `MM:SS`        | minutes and seconds            |
//! | `HH:MM:SS`     | hours, minutes and seconds     |
//! | `..:SS.F`      | either of the above `+ F` ms   |
//!
//! The fractional part is taken as an integer count of milliseconds, not as a
//! decimal fraction: `1.5` is 1005 ms, `1.500` is 1500 ms. Segments that do
//! not parse (or do not fit 32 bits) count as zero and malformed segment
//! counts yield zero; parsing never fails.

/// Segment as a 32-bit count widened to `i64`. Out-of-range or non-numeric
/// segments are 0, so the arithmetic below cannot overflow.
fn int(segment: &str) -> i64 {
    segment.trim().parse::<i32>().map(i64::from).unwrap_or(0)
}

/// `MM:SS` or `HH:MM:SS` to milliseconds; any other shape is 0.
fn clock_ms(clock: &str) -> i64 {
    let parts: Vec<&str> = clock.split(':').collect();
    let (hh, mm, ss) = match parts.as_slice() {
        [mm, ss] => (0, int(mm), int(ss)),
        [hh, mm, ss] => (int(hh), int(mm), int(ss)),
        _ => (0, 0, 0),
    };
    hh * 60 * 60 * 1000 + mm * 60 * 1000 + ss * 1000
}

/// Parse operator time entry into milliseconds.
pub fn parse_time_ms(text: &str) -> i64 {
    let text = text.trim();
    let has_dot = text.contains('.');
    let has_colon = text.contains(':');

    match (has_dot, has_colon) {
        (false, false) => int(text),
        (true, false) => match text.split('.').collect::<Vec<_>>().as_slice() {
            [sec, msec] => int(sec) * 1000 + int(msec),
            _ => 0,
        },
        (false, true) => clock_ms(text),
        (true, true) => match text.split('.').collect::<Vec<_>>().as_slice() {
            [clock, msec] => clock_ms(clock) + int(msec),
            _ => 0,
        },
    }
}

/// Format milliseconds as `hh:mm:ss.zzz`. Negative values clamp to zero.
pub fn format_time_ms(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_seconds_millis() {
        assert_eq!(parse_time_ms("01:02.500"), 62_500);
    }

    #[test]
    fn test_bare_integer_is_raw_millis() {
        assert_eq!(parse_time_ms("5"), 5);
        assert_eq!(parse_time_ms("1500"), 1500);
    }

    #[test]
    fn test_seconds_with_fraction() {
        assert_eq!(parse_time_ms("01.500"), 1500);
        // fraction is an integer millisecond count
        assert_eq!(parse_time_ms("1.5"), 1005);
    }

    #[test]
    fn test_clock_forms() {
        assert_eq!(parse_time_ms("01:02"), 62_000);
        assert_eq!(parse_time_ms("1:00:00"), 3_600_000);
        assert_eq!(parse_time_ms("01:00:01.250"), 3_601_250);
    }

    #[test]
    fn test_malformed_defaults_to_zero() {
        assert_eq!(parse_time_ms(""), 0);
        assert_eq!(parse_time_ms("abc"), 0);
        assert_eq!(parse_time_ms("1.2.3"), 0);
        assert_eq!(parse_time_ms("1:2:3:4"), 0);
        assert_eq!(parse_time_ms("xx:30"), 30_000);
        assert_eq!(parse_time_ms("00:10.zz"), 10_000);
    }

    #[test]
    fn test_oversized_segments_count_as_zero() {
        assert_eq!(parse_time_ms("9999999999999999:00:00"), 0);
        assert_eq!(parse_time_ms("99999999999999999.5"), 5);
        assert_eq!(parse_time_ms("99999999999999999999"), 0);
        assert_eq!(parse_time_ms("00:99999999999:01.99999999999"), 1000);
        // the largest accepted segments still fit after widening
        assert_eq!(parse_time_ms("2147483647:00:00"), 7_730_941_129_200_000);
        assert_eq!(
            parse_time_ms("2147483647:2147483647:2147483647.2147483647"),
            2_147_483_647 * (3_600_000 + 60_000 + 1000 + 1)
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(format_time_ms(0), "00:00:00.000");
        assert_eq!(format_time_ms(62_500), "00:01:02.500");
        assert_eq!(format_time_ms(3_601_250), "01:00:01.250");
        assert_eq!(format_time_ms(-3), "00:00:00.000");
    }
}
