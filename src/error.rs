use crate::month::Month;
use std::{
    error::Error,
    fmt::{Display, Formatter},
    path::PathBuf,
};

/// The result type used throughout this crate.
pub type FireSeasonResult<T> = Result<T, Box<dyn Error>>;

/**
 * Failures the pipeline knows how to describe.
 *
 * None of these are recoverable inside the library. They are reported with enough context for
 * the operator to fix the input data and rerun.
 */
#[derive(Debug)]
pub enum FireSeasonError {
    /// A raster file is missing, unreadable, or not a GeoTIFF this crate understands.
    RasterOpenFailure { path: PathBuf, reason: String },
    /// A percentile was requested over zero records.
    EmptyStatisticsInput,
    /// A name did not map to any month (bad file name, bad composite day, bad season record).
    UnrecognizedMonthCode { name: String },
    /// The season selector was closed without confirming a season.
    SelectionAborted { year: i32 },
    /// A line in a season record could not be parsed.
    InvalidSeasonRecord { line: String },
    /// A raster with no pixels, for which a burned percentage is undefined.
    EmptyRaster,
    /// A crop window that does not intersect the raster.
    CropOutsideRaster,
    /// Rotated or skewed transforms are not supported for this operation.
    UnsupportedTransform,
    /// Wraps a failure with the unit of work it happened in.
    Processing {
        year: i32,
        month: Month,
        source: Box<dyn Error>,
    },
}

impl Display for FireSeasonError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        use FireSeasonError::*;

        match self {
            RasterOpenFailure { path, reason } => {
                write!(f, "unable to open raster {}: {}", path.display(), reason)
            }
            EmptyStatisticsInput => write!(f, "percentile requested over an empty set of months"),
            UnrecognizedMonthCode { name } => write!(f, "no month matches '{}'", name),
            SelectionAborted { year } => {
                write!(f, "fire season selection for {} was aborted", year)
            }
            InvalidSeasonRecord { line } => write!(f, "invalid fire season record: '{}'", line),
            EmptyRaster => write!(f, "raster has no pixels"),
            CropOutsideRaster => write!(f, "crop bounds do not intersect the raster"),
            UnsupportedTransform => write!(f, "rotated geotransforms are not supported"),
            Processing {
                year,
                month,
                source,
            } => write!(f, "error processing {} {}: {}", year, month, source),
        }
    }
}

impl Error for FireSeasonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FireSeasonError::Processing { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl FireSeasonError {
    /// Attach the (year, month) being processed to an error.
    pub fn in_unit(year: i32, month: Month, source: Box<dyn Error>) -> Box<dyn Error> {
        Box::new(FireSeasonError::Processing {
            year,
            month,
            source,
        })
    }
}
