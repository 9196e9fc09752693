/*!
 * Where the data lives on disk, and the housekeeping done on those directories.
 *
 * All paths are derived from a single project root that is passed in explicitly, nothing is
 * read from the current working directory.
 *
 * ```text
 * ROOT/Data/Initial/MODIS/Reprojected/YEAR/       raw monthly composites
 * ROOT/Data/Intermediate/Modis_clipped/YEAR/      cropped rasters, YEAR_Mon.tiff
 * ROOT/Data/Intermediate/modis_poly/YEAR/         polygon layers, YEAR_Mon.geojson
 * ROOT/Data/stats/                                statistics and fire season records
 * ```
 */

use crate::{
    error::FireSeasonError,
    month::{parse_composite_name, parse_year_month, year_month_label, Month},
    FireSeasonResult,
};
use log::{debug, info};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// The directory layout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DataLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reprojected monthly composites, one sub-directory per year.
    pub fn reprojected_dir(&self) -> PathBuf {
        self.root.join("Data/Initial/MODIS/Reprojected")
    }

    /// Rasters cropped to the study region, one sub-directory per year.
    pub fn clipped_dir(&self) -> PathBuf {
        self.root.join("Data/Intermediate/Modis_clipped")
    }

    /// Polygon layers, one sub-directory per year.
    pub fn polygon_dir(&self) -> PathBuf {
        self.root.join("Data/Intermediate/modis_poly")
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.root.join("Data/stats")
    }

    /// The persisted fire season assignment.
    pub fn fire_season_file(&self) -> PathBuf {
        self.stats_dir()
            .join("yearly_fire_seasons")
            .join("fire_seasons.txt")
    }

    /// The table of monthly burn statistics.
    pub fn stats_table_file(&self) -> PathBuf {
        self.stats_dir().join("monthly_burn_stats.csv")
    }
}

/// The sub-directory for `year` under `base`.
pub fn year_dir<P: AsRef<Path>>(base: P, year: i32) -> PathBuf {
    base.as_ref().join(year.to_string())
}

/// The path of the `{year}_{Mon}.tiff` raster for (year, month) under `base`.
pub fn raster_path<P: AsRef<Path>>(base: P, year: i32, month: Month) -> PathBuf {
    year_dir(base, year).join(format!("{}.tiff", year_month_label(year, month)))
}

/// True if the path looks like a TIFF file.
pub fn is_tiff(path: &Path) -> bool {
    path.extension()
        .map(|ex| ex == "tiff" || ex == "tif")
        .unwrap_or(false)
}

/// Iterate the files directly inside `dir`, sorted by name.
fn files_in(dir: &Path) -> FireSeasonResult<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/**
 * Find the years in a directory that holds one sub-directory per year.
 *
 * Sub-directories whose names are not numbers are ignored. It is an error if there are no years
 * at all, since nothing downstream can run.
 */
pub fn list_years<P: AsRef<Path>>(dir: P) -> FireSeasonResult<Vec<i32>> {
    let dir = dir.as_ref();

    let mut years = vec![];
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        match entry.file_name().to_string_lossy().parse::<i32>() {
            Ok(year) => years.push(year),
            Err(_) => debug!(target: "layout", "skipping {}", entry.path().display()),
        }
    }

    years.sort_unstable();

    match (years.first(), years.last()) {
        (Some(first), Some(last)) => {
            info!(target: "layout", "first year: {} last year: {}", first, last);
            Ok(years)
        }
        _ => Err(format!("no year directories found in {}", dir.display()).into()),
    }
}

/**
 * Rename the MODIS composites of one year into the `{year}_{Mon}.tiff` convention.
 *
 * Quality assurance (`ba_qa`) files are deleted. Files already following the convention are
 * left alone, so this can be rerun on a partially renamed directory. Anything else, including a
 * composite from a different year or a day of year that does not start a month, stops the
 * process before any file is touched.
 *
 * Nothing is changed unless `execute` is true. Returns the renames (from, to).
 */
pub fn rename_modis_year<P: AsRef<Path>>(
    dir: P,
    year: i32,
    execute: bool,
) -> FireSeasonResult<Vec<(PathBuf, PathBuf)>> {
    let dir = dir.as_ref();

    let mut to_delete = vec![];
    let mut renames = vec![];
    let mut claimed: HashSet<Month> = HashSet::new();

    for path in files_in(dir)? {
        let fname = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();

        if fname.contains("ba_qa") {
            to_delete.push(path);
            continue;
        }

        if !is_tiff(&path) {
            return Err(format!("invalid file format: {}", path.display()).into());
        }

        if let Ok((file_year, month)) = parse_year_month(&path) {
            if file_year == year && claimed.insert(month) {
                continue;
            }
        }

        let (file_year, month) = parse_composite_name(&fname)?;
        if file_year != year {
            return Err(format!("{} does not belong to {}", fname, year).into());
        }

        if !claimed.insert(month) {
            return Err(FireSeasonError::UnrecognizedMonthCode {
                name: format!("{} (second file for {})", fname, month),
            }
            .into());
        }

        let to = dir.join(format!("{}.tiff", year_month_label(year, month)));
        renames.push((path, to));
    }

    if execute {
        for path in &to_delete {
            debug!(target: "rename", "removing {}", path.display());
            std::fs::remove_file(path)?;
        }

        for (from, to) in &renames {
            debug!(target: "rename", "{} -> {}", from.display(), to.display());
            std::fs::rename(from, to)?;
        }
    }

    info!(
        target: "rename",
        "{}: {} files renamed, {} quality assurance files removed",
        year,
        renames.len(),
        to_delete.len()
    );

    Ok(renames)
}

/**
 * Remove the rasters in a year directory whose month is not part of the fire season.
 *
 * Nothing is deleted unless `execute` is true. Returns the paths that were (or would be)
 * removed.
 */
pub fn prune_year<P: AsRef<Path>>(
    dir: P,
    season: &[Month],
    execute: bool,
) -> FireSeasonResult<Vec<PathBuf>> {
    let mut removed = vec![];

    for path in files_in(dir.as_ref())? {
        if !is_tiff(&path) {
            continue;
        }

        let (_year, month) = parse_year_month(&path)?;
        if season.contains(&month) {
            continue;
        }

        if execute {
            debug!(target: "prune", "removing {}", path.display());
            std::fs::remove_file(&path)?;
        }
        removed.push(path);
    }

    Ok(removed)
}
