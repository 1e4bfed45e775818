//! Excel date serial numbers
//!
//! Dates are stored in cells as numbers: whole days since the epoch plus a
//! fraction of a day.
//!
//! - In the 1900 system serial 1 is 1900-01-01, and serial 60 is the
//!   non-existent 1900-02-29 that Excel keeps for Lotus compatibility.
//! - In the 1904 system serial 0 is 1904-01-01.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Day number (from the common era) of 1899-12-31, serial 0 in the 1900 system
const EPOCH_1900: i32 = 693_595;

/// Day number of 1904-01-01, serial 0 in the 1904 system
const EPOCH_1904: i32 = 695_056;

/// Day number of 1900-03-01, the first day after the phantom leap day
const MARCH_1_1900: i32 = 693_655;

/// Serial of the phantom 1900-02-29
const PHANTOM_LEAP_DAY: i64 = 60;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Serial of 9999-12-31, the last date Excel accepts, in the 1900 system
const LAST_SERIAL_1900: f64 = 2_958_465.0;

/// The same date in the 1904 system
const LAST_SERIAL_1904: f64 = 2_957_003.0;

/// Convert a date/time to an Excel serial number
pub fn to_serial(value: NaiveDateTime, date_1904: bool) -> f64 {
    let day = value.date().num_days_from_ce();
    let whole = if date_1904 {
        day - EPOCH_1904
    } else if day >= MARCH_1_1900 {
        day - EPOCH_1900 + 1
    } else {
        day - EPOCH_1900
    };

    let time = value.time();
    let millis = time.num_seconds_from_midnight() as f64 * 1000.0
        + (time.nanosecond() / 1_000_000) as f64;
    whole as f64 + millis / MILLIS_PER_DAY as f64
}

/// Convert an Excel serial number to a date/time.
///
/// Returns `None` for negative serials, serials after 9999-12-31 and the
/// phantom 1900-02-29. The time of day is rounded to the millisecond.
pub fn from_serial(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    let last = if date_1904 {
        LAST_SERIAL_1904
    } else {
        LAST_SERIAL_1900
    };
    if !serial.is_finite() || serial < 0.0 || serial >= last + 1.0 {
        return None;
    }

    let mut whole = serial.floor() as i64;
    let mut millis = ((serial - serial.floor()) * MILLIS_PER_DAY as f64).round() as i64;
    if millis >= MILLIS_PER_DAY {
        whole += 1;
        millis -= MILLIS_PER_DAY;
    }

    let day = if date_1904 {
        EPOCH_1904 as i64 + whole
    } else if whole == PHANTOM_LEAP_DAY {
        return None;
    } else if whole > PHANTOM_LEAP_DAY {
        EPOCH_1900 as i64 + whole - 1
    } else {
        EPOCH_1900 as i64 + whole
    };

    let date = NaiveDate::from_num_days_from_ce_opt(i32::try_from(day).ok()?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Whether a serial is a plausible date in the given system
pub fn is_valid_serial(serial: f64, date_1904: bool) -> bool {
    from_serial(serial, date_1904).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_1900_system_known_serials() {
        assert_eq!(to_serial(ymd_hms(1900, 1, 1, 0, 0, 0), false), 1.0);
        assert_eq!(to_serial(ymd_hms(1900, 2, 28, 0, 0, 0), false), 59.0);
        assert_eq!(to_serial(ymd_hms(1900, 3, 1, 0, 0, 0), false), 61.0);
        assert_eq!(to_serial(ymd_hms(2008, 1, 1, 6, 0, 0), false), 39448.25);
    }

    #[test]
    fn test_1900_system_phantom_leap_day() {
        assert_eq!(from_serial(59.0, false), Some(ymd_hms(1900, 2, 28, 0, 0, 0)));
        assert_eq!(from_serial(60.0, false), None);
        assert_eq!(from_serial(61.0, false), Some(ymd_hms(1900, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_1904_system() {
        assert_eq!(to_serial(ymd_hms(1904, 1, 1, 0, 0, 0), true), 0.0);
        assert_eq!(to_serial(ymd_hms(2008, 1, 1, 0, 0, 0), true), 37986.0);
        assert_eq!(from_serial(37986.5, true), Some(ymd_hms(2008, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn test_round_trip_to_millisecond() {
        let when = ymd_hms(2021, 7, 15, 23, 59, 59);
        for date_1904 in [false, true] {
            assert_eq!(from_serial(to_serial(when, date_1904), date_1904), Some(when));
        }
    }

    #[test]
    fn test_invalid_serials() {
        assert_eq!(from_serial(-1.0, false), None);
        assert_eq!(from_serial(f64::NAN, false), None);
        assert!(!is_valid_serial(1e12, false));
        assert!(is_valid_serial(1.0, true));
        assert_eq!(from_serial(1e300, false), None);
        assert_eq!(from_serial(f64::MAX, true), None);
    }

    #[test]
    fn test_last_valid_date() {
        let last = ymd_hms(9999, 12, 31, 0, 0, 0);
        assert_eq!(from_serial(2_958_465.0, false), Some(last));
        assert_eq!(from_serial(2_958_465.5, false), Some(last + Duration::hours(12)));
        assert_eq!(from_serial(2_958_466.0, false), None);
        assert_eq!(from_serial(2_957_003.0, true), Some(last));
        assert_eq!(from_serial(2_957_004.0, true), None);
    }
}
