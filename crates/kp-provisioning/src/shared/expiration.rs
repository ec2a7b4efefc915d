//! Expiration policy shared by accounts and authorizations.

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Sentinel for "never expires".
pub const NEVER_EXPIRES: i64 = 0;

/// Absolute expiry for `expiration_days` counted from `now`.
///
/// Zero and negative day counts both mean no expiration.
pub fn expires_at(now: i64, expiration_days: i64) -> i64 {
    if expiration_days > 0 {
        now.saturating_add(expiration_days.saturating_mul(SECONDS_PER_DAY))
    } else {
        NEVER_EXPIRES
    }
}
