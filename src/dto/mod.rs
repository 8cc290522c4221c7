use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod decisions;
pub mod identity;
pub mod session;
pub mod validation;

/// Render a unix timestamp (seconds) the way the owner panel displays session expiration.
pub fn format_expiration(unix_seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(unix_seconds)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
