//! Spreadsheet serial dates: whole days since 1899-12-30.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 30) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Serial number of a calendar date.
pub fn date_to_serial(date: NaiveDate) -> i64 {
    date.signed_duration_since(EPOCH).num_days()
}

/// Calendar date of a serial number. The fractional (time of day) part is
/// dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    if days.abs() > f64::from(i32::MAX) {
        return None;
    }
    EPOCH.checked_add_signed(chrono::Duration::days(days as i64))
}

/// Serial number of the local calendar day `at` falls on in `tz`.
pub fn instant_to_serial(at: DateTime<Utc>, tz: Tz) -> i64 {
    date_to_serial(local_date(at, tz))
}

pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    tz.from_utc_datetime(&at.naive_utc()).date_naive()
}

/// Today in `tz`.
pub fn today(tz: Tz) -> NaiveDate {
    local_date(Utc::now(), tz)
}
