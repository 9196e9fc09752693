/*!
 * Access to the monthly rasters, keyed by (year, month).
 *
 * The pipeline only ever talks to a [RasterStore]. The directory backed [GeoTiffStore] is what
 * the programs use; the [MemoryStore] holds grids that were built in memory.
 */

use crate::{
    error::FireSeasonError,
    layout::{is_tiff, list_years, raster_path, year_dir},
    month::{parse_year_month, year_month_label, Month},
    raster::{read_geotiff, RasterGrid},
    FireSeasonResult,
};
use log::debug;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Something that can produce the raster for a (year, month).
pub trait RasterStore {
    /// The years available, ascending.
    fn years(&self) -> FireSeasonResult<Vec<i32>>;

    /// The months available for `year`, in a stable order.
    fn months(&self, year: i32) -> FireSeasonResult<Vec<Month>>;

    /// Read the raster for (`year`, `month`).
    fn open(&self, year: i32, month: Month) -> FireSeasonResult<RasterGrid>;
}

/**
 * Rasters stored as `BASE/{year}/{year}_{Mon}.tiff` (or `.tif`).
 *
 * Any TIFF in a year directory that doesn't follow the naming convention is an error rather
 * than being skipped, a missing month would silently change the statistics.
 */
#[derive(Debug, Clone)]
pub struct GeoTiffStore {
    base: PathBuf,
}

impl GeoTiffStore {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        GeoTiffStore { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The file the raster for (`year`, `month`) is stored in, or would be written to.
    pub fn path(&self, year: i32, month: Month) -> PathBuf {
        raster_path(&self.base, year, month)
    }

    /// The existing file for (`year`, `month`), `.tiff` first and then `.tif`.
    fn locate(&self, year: i32, month: Month) -> PathBuf {
        let path = self.path(year, month);
        if path.is_file() {
            return path;
        }

        let alt = path.with_extension("tif");
        if alt.is_file() {
            alt
        } else {
            path
        }
    }
}

impl RasterStore for GeoTiffStore {
    fn years(&self) -> FireSeasonResult<Vec<i32>> {
        list_years(&self.base)
    }

    fn months(&self, year: i32) -> FireSeasonResult<Vec<Month>> {
        let dir = year_dir(&self.base, year);

        let mut months = vec![];
        for entry in walkdir::WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type().is_file() || !is_tiff(path) {
                debug!(target: "store", "ignoring {}", path.display());
                continue;
            }

            let (file_year, month) = parse_year_month(path)?;
            if file_year != year {
                return Err(FireSeasonError::UnrecognizedMonthCode {
                    name: path.display().to_string(),
                }
                .into());
            }

            months.push(month);
        }

        months.sort_unstable();
        months.dedup();

        Ok(months)
    }

    fn open(&self, year: i32, month: Month) -> FireSeasonResult<RasterGrid> {
        read_geotiff(self.locate(year, month))
    }
}

/// Rasters held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rasters: BTreeMap<(i32, Month), RasterGrid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the raster for (`year`, `month`).
    pub fn insert(&mut self, year: i32, month: Month, raster: RasterGrid) {
        self.rasters.insert((year, month), raster);
    }
}

impl RasterStore for MemoryStore {
    fn years(&self) -> FireSeasonResult<Vec<i32>> {
        let mut years: Vec<i32> = self.rasters.keys().map(|(year, _)| *year).collect();
        years.dedup();
        Ok(years)
    }

    fn months(&self, year: i32) -> FireSeasonResult<Vec<Month>> {
        Ok(self
            .rasters
            .keys()
            .filter(|(y, _)| *y == year)
            .map(|(_, month)| *month)
            .collect())
    }

    fn open(&self, year: i32, month: Month) -> FireSeasonResult<RasterGrid> {
        self.rasters.get(&(year, month)).cloned().ok_or_else(|| {
            FireSeasonError::RasterOpenFailure {
                path: PathBuf::from(format!("memory:{}", year_month_label(year, month))),
                reason: "no such raster".to_owned(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::{write_geotiff, Crs, GeoTransform};

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        let grid = RasterGrid::filled(2, 2, 0, GeoTransform::default(), None).unwrap();
        store.insert(2002, Month::Sep, grid.clone());
        store.insert(2001, Month::Aug, grid.clone());
        store.insert(2001, Month::Jul, grid.clone());

        assert_eq!(store.years().unwrap(), vec![2001, 2002]);
        assert_eq!(store.months(2001).unwrap(), vec![Month::Jul, Month::Aug]);
        assert_eq!(store.open(2002, Month::Sep).unwrap(), grid);
        assert!(store.open(2002, Month::Oct).is_err());
    }

    #[test]
    fn test_geotiff_store() {
        let base = std::env::temp_dir().join(format!("fireseason-store-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(base.join("2003")).unwrap();

        let store = GeoTiffStore::new(&base);
        let transform = GeoTransform::new(0.0, 1000.0, 500.0, -500.0);
        let grid = RasterGrid::new(2, 1, vec![0, 213], transform, Some(Crs::projected(20790)))
            .unwrap();

        write_geotiff(&grid, store.path(2003, Month::Aug)).unwrap();
        write_geotiff(&grid, store.path(2003, Month::Jul)).unwrap();
        std::fs::write(base.join("2003").join("2003_Aug.tiff.aux.xml"), b"").unwrap();

        assert_eq!(store.years().unwrap(), vec![2003]);
        assert_eq!(store.months(2003).unwrap(), vec![Month::Jul, Month::Aug]);
        assert_eq!(store.open(2003, Month::Aug).unwrap(), grid);

        let err = store.open(2003, Month::Sep).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FireSeasonError>(),
            Some(FireSeasonError::RasterOpenFailure { .. })
        ));

        std::fs::write(base.join("2003").join("MCD64A1.A2003244.tiff"), b"").unwrap();
        assert!(store.months(2003).is_err());
    }

    #[test]
    fn test_geotiff_store_short_extension() {
        let base = std::env::temp_dir().join(format!("fireseason-store-tif-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(base.join("2003")).unwrap();

        let store = GeoTiffStore::new(&base);
        let grid = RasterGrid::new(1, 1, vec![230], GeoTransform::default(), None).unwrap();
        write_geotiff(&grid, base.join("2003").join("2003_Aug.tif")).unwrap();

        assert_eq!(store.months(2003).unwrap(), vec![Month::Aug]);
        for month in store.months(2003).unwrap() {
            assert_eq!(store.open(2003, month).unwrap(), grid);
        }
    }
}
