/*!
 * Calendar months and the naming conventions used to find them in file names.
 *
 * MODIS monthly burned area composites are named by the day of year the composite starts on,
 * e.g. `MCD64A1.A2004061.h17v05.061.reproj.tiff` for March 2004. Leap years shift every start
 * day after February by one, so the lookup is done with an explicit table for each kind of
 * year instead of matching substrings.
 */

use crate::{error::FireSeasonError, FireSeasonResult};
use chrono::NaiveDate;
use std::{path::Path, str::FromStr};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// A calendar month, displayed and parsed as its three letter code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

/// Day of year each month starts on in a common year.
const COMMON_YEAR_MONTH_STARTS: [u32; 12] = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Day of year each month starts on in a leap year.
const LEAP_YEAR_MONTH_STARTS: [u32; 12] = [1, 32, 61, 92, 122, 153, 183, 214, 245, 275, 306, 336];

impl Month {
    /// The three letter code, e.g. "Jan".
    pub fn code(self) -> &'static str {
        self.into()
    }

    /// The full English name of the month.
    pub fn full_name(self) -> &'static str {
        use Month::*;

        match self {
            Jan => "January",
            Feb => "February",
            Mar => "March",
            Apr => "April",
            May => "May",
            Jun => "June",
            Jul => "July",
            Aug => "August",
            Sep => "September",
            Oct => "October",
            Nov => "November",
            Dec => "December",
        }
    }

    /// The month number, 1 for January through 12 for December.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Parse either the three letter code or the full name, ignoring case.
    pub fn parse_name(name: &str) -> FireSeasonResult<Month> {
        let name = name.trim();

        if let Ok(month) = Month::from_str(name) {
            return Ok(month);
        }

        Month::iter()
            .find(|m| m.full_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                FireSeasonError::UnrecognizedMonthCode {
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /**
     * Find the month a MODIS monthly composite starting on `day_of_year` belongs to.
     *
     * Only the first day of a month is a valid composite start, anything else is reported as
     * an unrecognized month code.
     */
    pub fn from_composite_day(year: i32, day_of_year: u32) -> FireSeasonResult<Month> {
        let starts = if is_leap_year(year) {
            &LEAP_YEAR_MONTH_STARTS
        } else {
            &COMMON_YEAR_MONTH_STARTS
        };

        starts
            .iter()
            .zip(Month::iter())
            .find(|(start, _)| **start == day_of_year)
            .map(|(_, month)| month)
            .ok_or_else(|| {
                FireSeasonError::UnrecognizedMonthCode {
                    name: format!("A{}{:03}", year, day_of_year),
                }
                .into()
            })
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/**
 * Find the year and month of a MODIS composite from its file name.
 *
 * The name must contain an acquisition token, a capital 'A' followed by a four digit year and a
 * three digit day of year.
 */
pub fn parse_composite_name(file_name: &str) -> FireSeasonResult<(i32, Month)> {
    let bytes = file_name.as_bytes();

    for (i, _) in file_name.match_indices('A') {
        let token = match bytes.get((i + 1)..(i + 8)) {
            Some(token) => token,
            None => break,
        };

        if !token.iter().all(u8::is_ascii_digit) {
            continue;
        }

        let year: i32 = file_name[(i + 1)..(i + 5)].parse()?;
        let doy: u32 = file_name[(i + 5)..(i + 8)].parse()?;

        return Ok((year, Month::from_composite_day(year, doy)?));
    }

    Err(FireSeasonError::UnrecognizedMonthCode {
        name: file_name.to_owned(),
    }
    .into())
}

/// The label a renamed raster carries, e.g. "2005_Aug".
pub fn year_month_label(year: i32, month: Month) -> String {
    format!("{}_{}", year, month)
}

/// Parse a renamed raster path or label of the form `{year}_{Mon}` (any extension ignored).
pub fn parse_year_month<P: AsRef<Path>>(path: P) -> FireSeasonResult<(i32, Month)> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let unrecognized = || -> Box<dyn std::error::Error> {
        FireSeasonError::UnrecognizedMonthCode {
            name: path.display().to_string(),
        }
        .into()
    };

    let (year, month) = stem.split_once('_').ok_or_else(unrecognized)?;
    let year: i32 = year.parse().map_err(|_| unrecognized())?;
    let month = Month::from_str(month).map_err(|_| unrecognized())?;

    Ok((year, month))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_start_tables_agree_with_calendar() {
        for (year, table) in [
            (2001, &COMMON_YEAR_MONTH_STARTS),
            (2004, &LEAP_YEAR_MONTH_STARTS),
        ] {
            for month in Month::iter() {
                let first = NaiveDate::from_ymd_opt(year, month.number(), 1).unwrap();
                assert_eq!(first.ordinal(), table[month as usize]);
            }
        }
    }

    #[test]
    fn test_composite_day_leap_years() {
        assert_eq!(Month::from_composite_day(2001, 60).unwrap(), Month::Mar);
        assert_eq!(Month::from_composite_day(2004, 61).unwrap(), Month::Mar);
        assert_eq!(Month::from_composite_day(2004, 336).unwrap(), Month::Dec);
        assert_eq!(Month::from_composite_day(2001, 1).unwrap(), Month::Jan);

        // Feb 29th is not the start of any month.
        assert!(Month::from_composite_day(2004, 60).is_err());
        assert!(Month::from_composite_day(2001, 61).is_err());
        assert!(Month::from_composite_day(2001, 15).is_err());
    }

    #[test]
    fn test_parse_composite_name() {
        let (year, month) = parse_composite_name("MCD64A1.A2004061.h17v05.061.reproj.tiff").unwrap();
        assert_eq!(year, 2004);
        assert_eq!(month, Month::Mar);

        let (year, month) = parse_composite_name("MCD64A1.A2010213.Burn_Date.reproj.tiff").unwrap();
        assert_eq!(year, 2010);
        assert_eq!(month, Month::Aug);

        let err = parse_composite_name("MCD64A1.A2010215.reproj.tiff").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::UnrecognizedMonthCode { .. })
        ));

        assert!(parse_composite_name("MCD64A1.reproj.tiff").is_err());
    }

    #[test]
    fn test_names_and_labels() {
        assert_eq!(Month::parse_name("aug").unwrap(), Month::Aug);
        assert_eq!(Month::parse_name(" September ").unwrap(), Month::Sep);
        assert!(Month::parse_name("Sept").is_err());

        assert_eq!(year_month_label(2005, Month::Aug), "2005_Aug");
        assert_eq!(
            parse_year_month("clipped/2005/2005_Aug.tiff").unwrap(),
            (2005, Month::Aug)
        );
        assert!(parse_year_month("2005-Aug.tiff").is_err());
        assert!(parse_year_month("2005_Agu.tiff").is_err());
    }
}
