use std::fmt::Display;

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::{Error, Result};

/// A point in time with the UTC offset it was recorded in, as it appears in commit signatures:
/// `<unix seconds> <+|-><hhmm>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub DateTime<FixedOffset>);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::offset::Local::now().into())
    }

    /// Build from unix seconds and an offset east of UTC in seconds.
    pub fn from_unix(secs: i64, offset_secs: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_secs)?
            .timestamp_opt(secs, 0)
            .single()
            .map(Self)
    }

    /// Parse a timestamp from a unix + HH + mm offset
    pub fn from_git(s: &str) -> Result<Self> {
        let invalid = || Error::malformed(format!("invalid timestamp {s:?}"));

        let (secs, offset) = s.split_once(' ').ok_or_else(invalid)?;
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let secs: i64 = secs.parse().map_err(|_| invalid())?;

        let (sign, hhmm) = match offset.as_bytes() {
            [b'+', rest @ ..] => (1, rest),
            [b'-', rest @ ..] => (-1, rest),
            _ => return Err(invalid()),
        };
        let offset_secs = match hhmm {
            [h1, h2, m1, m2] if hhmm.iter().all(u8::is_ascii_digit) => {
                let hours = i32::from((h1 - b'0') * 10 + (h2 - b'0'));
                let minutes = i32::from((m1 - b'0') * 10 + (m2 - b'0'));
                sign * (hours * 3600 + minutes * 60)
            }
            _ => return Err(invalid()),
        };

        Self::from_unix(secs, offset_secs).ok_or_else(invalid)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%s %z"))
    }
}
