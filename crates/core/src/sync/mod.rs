//! Sync domain: DTOs, dirty-row selection and the pull/push engine.

mod device;
mod dto;
mod engine;
mod status;

pub use device::*;
pub use dto::*;
pub use engine::*;
pub use status::*;

use chrono::{DateTime, Utc};

/// Staleness threshold after which a synced row is considered dirty again.
pub const SYNC_STALENESS_SECS: i64 = 60;

/// Whether a row needs to be pushed.
///
/// A row is dirty when it has never been synced, when its `synced_at` stamp
/// cannot be parsed, or when the stamp is older than [`SYNC_STALENESS_SECS`]
/// relative to `now`.
pub fn is_dirty(synced_at: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(stamp) = synced_at else {
        return true;
    };
    match DateTime::parse_from_rfc3339(stamp) {
        Ok(parsed) => {
            let age = now.signed_duration_since(parsed.with_timezone(&Utc));
            age.num_seconds() > SYNC_STALENESS_SECS
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn never_synced_row_is_dirty() {
        assert!(is_dirty(None, Utc::now()));
    }

    #[test]
    fn stale_row_is_dirty_fresh_row_is_not() {
        let now = Utc::now();
        let two_minutes_ago = (now - Duration::seconds(120)).to_rfc3339();
        let ten_seconds_ago = (now - Duration::seconds(10)).to_rfc3339();

        assert!(is_dirty(Some(&two_minutes_ago), now));
        assert!(!is_dirty(Some(&ten_seconds_ago), now));
    }

    #[test]
    fn unparseable_stamp_is_dirty() {
        assert!(is_dirty(Some("not-a-timestamp"), Utc::now()));
    }
}
