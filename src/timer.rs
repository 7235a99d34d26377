//! Remaining-time display formatting.
//!
//! The server pushes the round countdown as raw integer seconds; the display
//! string is a pure projection of the latest value, recomputed on every tick
//! so there is no stored history to drift from the primary state.

/// Format a non-negative seconds count as an `"mm:ss"` clock string.
///
/// Uses fixed-epoch integer arithmetic, not wall-clock time. The minutes
/// field grows beyond two digits rather than wrapping for inputs of 100
/// minutes or more.
///
/// # Examples
///
/// ```
/// use letter_rush_client::timer::format_clock;
///
/// assert_eq!(format_clock(125), "02:05");
/// assert_eq!(format_clock(0), "00:00");
/// ```
pub fn format_clock(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{minutes:02}:{secs:02}")
}
