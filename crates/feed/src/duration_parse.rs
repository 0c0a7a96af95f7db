// ABOUTME: iTunes duration parsing for podcast episode lengths.
// ABOUTME: Supports MM:SS and HH:MM:SS; any other shape is rejected.

/// Parses an `itunes:duration` value into seconds.
///
/// Two colon-separated parts are `M:SS`; three or more are `H:MM:SS`, with
/// anything past the third part ignored. A single part, an empty string, a
/// non-numeric component or a total past `u32::MAX` yields None.
pub fn parse_duration_secs(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s, ..] => (*h, *m, *s),
        _ => return None,
    };

    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
