/*!
 * Monthly burned area statistics and the fire season threshold derived from them.
 *
 * The threshold is a single number for the whole study period. It is computed once, after the
 * statistics for every year and month exist, and then used unchanged for every year's season
 * decision.
 */

use crate::{
    classify::is_burned,
    error::FireSeasonError,
    month::Month,
    raster::RasterGrid,
    store::RasterStore,
    FireSeasonResult,
};
use log::{debug, info};
use std::{
    fmt::{self, Display},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Area of a 500m x 500m MODIS pixel in square meters.
pub const DEFAULT_PIXEL_AREA_M2: f64 = 250_000.0;

/// The percentile used for the fire season threshold.
pub const SEASON_PERCENTILE: f64 = 75.0;

/// Burn statistics for a single (year, month).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyBurnStat {
    pub year: i32,
    pub month: Month,
    /// Number of pixels with a burn date.
    pub burned_count: usize,
    /// Number of pixels in the raster, including water and unmapped pixels.
    pub total_count: usize,
    /// 100 * burned_count / total_count
    pub percent_burned: f64,
    /// Burned area in square kilometers.
    pub burned_area_km2: f64,
}

/// The 75th percentile of the monthly percent burned over the whole study period.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SeasonThreshold(pub f64);

impl SeasonThreshold {
    pub fn value(self) -> f64 {
        self.0
    }

    /// True if a month's percent burned is above normal.
    pub fn is_exceeded_by(self, percent_burned: f64) -> bool {
        percent_burned > self.0
    }
}

impl Display for SeasonThreshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:.4}%", self.0)
    }
}

/**
 * Count the burned pixels of a raster.
 *
 * The raw values are tested directly with the same predicate the classifier uses, the mask is
 * not built first.
 */
pub fn accumulate(
    raster: &RasterGrid,
    year: i32,
    month: Month,
    pixel_area_m2: f64,
) -> FireSeasonResult<MonthlyBurnStat> {
    let total_count = raster.len();
    if total_count == 0 {
        return Err(FireSeasonError::EmptyRaster.into());
    }

    let burned_count = raster.data().iter().filter(|&&v| is_burned(v)).count();

    Ok(MonthlyBurnStat {
        year,
        month,
        burned_count,
        total_count,
        percent_burned: burned_count as f64 * 100.0 / total_count as f64,
        burned_area_km2: burned_count as f64 * pixel_area_m2 / 1_000_000.0,
    })
}

/**
 * The `p`th percentile of `values`, interpolating linearly between the closest ranks.
 *
 * With the values sorted, the rank is `p / 100 * (n - 1)`; a fractional rank interpolates
 * between the values on either side of it. This is the same definition numpy uses by default.
 */
pub fn percentile(values: &[f64], p: f64) -> FireSeasonResult<f64> {
    if values.is_empty() {
        return Err(FireSeasonError::EmptyStatisticsInput.into());
    }

    if !(0.0..=100.0).contains(&p) {
        return Err(format!("percentile out of range: {}", p).into());
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    Ok(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}

/// The fire season threshold over every month in `stats`.
pub fn threshold(stats: &[MonthlyBurnStat]) -> FireSeasonResult<SeasonThreshold> {
    let values: Vec<f64> = stats.iter().map(|s| s.percent_burned).collect();
    percentile(&values, SEASON_PERCENTILE).map(SeasonThreshold)
}

/**
 * Gather the statistics for every month of every year in `years`.
 *
 * Years are visited in the order given, months in the order the store lists them. The first
 * raster that cannot be read or counted stops the whole collection, a month that failed is
 * never recorded as unburned.
 */
pub fn collect_statistics<S: RasterStore + ?Sized>(
    store: &S,
    years: &[i32],
    pixel_area_m2: f64,
) -> FireSeasonResult<Vec<MonthlyBurnStat>> {
    let mut stats = vec![];

    for &year in years {
        for month in store.months(year)? {
            let stat = store
                .open(year, month)
                .and_then(|raster| accumulate(&raster, year, month, pixel_area_m2))
                .map_err(|err| FireSeasonError::in_unit(year, month, err))?;

            debug!(
                target: "stats",
                "{} {}: {:.4}% burned ({:.2} km²)",
                year,
                month,
                stat.percent_burned,
                stat.burned_area_km2
            );

            stats.push(stat);
        }
    }

    info!(target: "stats", "collected statistics for {} months", stats.len());

    Ok(stats)
}

/// The (month, percent burned) pairs for one year, in the order they were collected.
pub fn year_series(stats: &[MonthlyBurnStat], year: i32) -> Vec<(Month, f64)> {
    stats
        .iter()
        .filter(|s| s.year == year)
        .map(|s| (s.month, s.percent_burned))
        .collect()
}

/// Write the statistics as a CSV table, followed by a comment line with the threshold.
pub fn write_stats_table<P: AsRef<Path>>(
    path: P,
    stats: &[MonthlyBurnStat],
    threshold: SeasonThreshold,
) -> FireSeasonResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_writer(BufWriter::new(File::create(path)?));

    wtr.write_record([
        "year",
        "month",
        "burned_pixels",
        "total_pixels",
        "percent_burned",
        "burned_area_km2",
    ])?;

    for s in stats {
        wtr.write_record(&[
            s.year.to_string(),
            s.month.to_string(),
            s.burned_count.to_string(),
            s.total_count.to_string(),
            format!("{:.6}", s.percent_burned),
            format!("{:.6}", s.burned_area_km2),
        ])?;
    }

    wtr.flush()?;
    let mut out = wtr.into_inner().map_err(|err| err.to_string())?;

    writeln!(out, "# percentile_{:.0},{:.6}", SEASON_PERCENTILE, threshold.0)?;
    out.flush()?;

    Ok(())
}
