use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use thiserror::Error;
use tracing::debug;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_TIME_LEN: usize = "2006-01-02 15:04:05".len();

/// Parses an Oxidized timestamp like `2019-11-19 14:00:00 CET` into unix seconds.
///
/// The zone must be three upper-case letters, four to five ending in `T`, or `GMT` with a
/// signed hour offset such as `GMT+3`. Abbreviations with a well-known offset are honoured,
/// any other well-formed one is read as UTC.
pub fn parse_backend_timestamp(value: &str) -> Result<i64, TimeFormatError> {
    let invalid = || TimeFormatError { value: value.to_string() };

    let (date_time, zone) = value.rsplit_once(' ').ok_or_else(invalid)?;
    if date_time.len() != DATE_TIME_LEN {
        return Err(invalid());
    }

    let offset_seconds = zone_offset_seconds(zone).ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(date_time, DATE_TIME_FORMAT).map_err(|_| invalid())?;
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(invalid)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|date_time| date_time.timestamp())
        .ok_or_else(invalid)
}

fn zone_offset_seconds(zone: &str) -> Option<i32> {
    if let Some(offset) = zone.strip_prefix("GMT").filter(|offset| !offset.is_empty()) {
        return gmt_offset_seconds(offset);
    }

    let well_formed = zone.bytes().all(|b| b.is_ascii_uppercase())
        && match zone.len() {
            3 => true,
            4 | 5 => zone.ends_with('T'),
            _ => false,
        };
    if !well_formed {
        return None;
    }

    let hours = match zone {
        "UTC" | "GMT" | "WET" => 0,
        "WEST" | "CET" | "BST" => 1,
        "CEST" | "EET" => 2,
        "EEST" | "MSK" => 3,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => {
            debug!(zone, "Unknown time zone abbreviation, reading the timestamp as UTC");
            0
        }
    };
    Some(hours * 3600)
}

// `+3`, `-10`: a sign followed by one or two digits, at most 23 hours
fn gmt_offset_seconds(offset: &str) -> Option<i32> {
    let (sign, hours) = match offset.split_at_checked(1)? {
        ("+", hours) => (1, hours),
        ("-", hours) => (-1, hours),
        _ => return None,
    };
    if hours.is_empty() || hours.len() > 2 || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours = hours.parse::<i32>().ok().filter(|hours| *hours <= 23)?;
    Some(sign * hours * 3600)
}

#[derive(Error, Debug, PartialEq)]
#[error("timestamp '{value}' does not match the format 'YYYY-MM-DD HH:MM:SS ZONE'")]
pub struct TimeFormatError {
    pub value: String,
}
