//! Staleness policy for content sources.
//!
//! Pure decision function: given a source's cadence, last successful sync
//! time, and checkout presence, decide whether a fetch is due. The elapsed
//! comparisons are strict — exactly one hour or one day elapsed is still
//! fresh.

use chrono::{DateTime, Duration, Utc};

use crate::config::UpdateFrequency;

/// Returns true when the source should be fetched.
///
/// A missing checkout or an absent last-sync time always forces a fetch,
/// regardless of cadence.
pub fn needs_update(
    frequency: UpdateFrequency,
    last_sync: Option<DateTime<Utc>>,
    checkout_exists: bool,
    now: DateTime<Utc>,
) -> bool {
    if !checkout_exists {
        return true;
    }
    let Some(last) = last_sync else {
        return true;
    };

    match frequency {
        UpdateFrequency::OnStartup => false,
        UpdateFrequency::Hourly => now - last > Duration::hours(1),
        UpdateFrequency::Daily => now - last > Duration::hours(24),
        UpdateFrequency::Never => false,
    }
}
