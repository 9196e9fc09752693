/*!
 * The stages of the batch run, in the order they happen.
 *
 * 1. [crop_rasters] cuts the renamed composites down to the study region.
 * 2. [assign_fire_seasons] gathers the statistics for every month of every year, computes the
 *    threshold once, and then asks the selector for each year's season, one year at a time.
 * 3. [polygonise_seasons] writes a polygon layer for every month of every fire season.
 *
 * Everything runs sequentially on the calling thread. The first failure stops the stage.
 */

use crate::{
    error::FireSeasonError,
    layout::{prune_year, raster_path, year_dir, DataLayout},
    month::{year_month_label, Month},
    polygon::PolygonExtractor,
    raster::{write_geotiff, BoundingBox},
    season::{FireSeasonAssignment, SeasonSelector},
    stats::{
        collect_statistics, threshold, write_stats_table, year_series, MonthlyBurnStat,
        SeasonThreshold, DEFAULT_PIXEL_AREA_M2,
    },
    store::RasterStore,
    vector::write_layer,
    FireSeasonResult,
};
use log::{debug, info};
use std::{fmt, path::Path};

/// Settings shared by the stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where the input and output directories are.
    pub layout: DataLayout,
    /// Area of one pixel in square meters, used for the burned area.
    pub pixel_area_m2: f64,
    /// Which pixels become polygons.
    pub extractor: PolygonExtractor,
    /// Remove the clipped rasters of months outside the fire season after the selection.
    pub prune: bool,
    /// Without this, pruning only reports what it would remove.
    pub execute: bool,
}

impl PipelineConfig {
    pub fn new(layout: DataLayout) -> Self {
        PipelineConfig {
            layout,
            pixel_area_m2: DEFAULT_PIXEL_AREA_M2,
            extractor: PolygonExtractor::default(),
            prune: false,
            execute: false,
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "        Root: {}", self.layout.root().display())?;
        writeln!(f, "  Pixel area: {} m²", self.pixel_area_m2)?;
        writeln!(f, "Min burn day: > {}", self.extractor.min_burn_day)?;
        writeln!(f, "       Prune: {} (execute: {})", self.prune, self.execute)?;
        Ok(())
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                           Cropping
 *-----------------------------------------------------------------------------------------------*/

/**
 * Crop every raster of `years` in `store` to `bbox`, writing them under `dst_base` with the same
 * `{year}/{year}_{Mon}.tiff` naming.
 *
 * Returns the number of rasters written.
 */
pub fn crop_rasters<S: RasterStore + ?Sized>(
    store: &S,
    years: &[i32],
    bbox: &BoundingBox,
    dst_base: &Path,
) -> FireSeasonResult<usize> {
    let mut count = 0;

    for &year in years {
        std::fs::create_dir_all(year_dir(dst_base, year))?;

        for month in store.months(year)? {
            let dst = raster_path(dst_base, year, month);

            store
                .open(year, month)
                .and_then(|raster| raster.crop(bbox))
                .and_then(|cropped| write_geotiff(&cropped, &dst))
                .map_err(|err| FireSeasonError::in_unit(year, month, err))?;

            debug!(target: "crop", "wrote {}", dst.display());
            count += 1;
        }

        info!(target: "crop", "{} cropped", year);
    }

    Ok(count)
}

/*-------------------------------------------------------------------------------------------------
 *                                     Fire Season Selection
 *-----------------------------------------------------------------------------------------------*/

/// Everything the season selection produced.
#[derive(Debug, Clone)]
pub struct SeasonReport {
    pub stats: Vec<MonthlyBurnStat>,
    pub threshold: SeasonThreshold,
    pub assignment: FireSeasonAssignment,
}

/**
 * Decide the fire season of every year in the store.
 *
 * The threshold is computed from all months of all years before the selector is asked about the
 * first year, and the same value is handed to it for every year.
 */
pub fn assign_fire_seasons<S, Sel>(
    store: &S,
    selector: &mut Sel,
    pixel_area_m2: f64,
) -> FireSeasonResult<SeasonReport>
where
    S: RasterStore + ?Sized,
    Sel: SeasonSelector + ?Sized,
{
    let years = store.years()?;
    let stats = collect_statistics(store, &years, pixel_area_m2)?;
    let threshold = threshold(&stats)?;

    info!(target: "season", "fire season threshold: {}", threshold);

    let mut assignment = FireSeasonAssignment::new();
    for year in years {
        let series = year_series(&stats, year);
        let season = selector.select(year, &series, threshold)?;
        assignment.insert(year, &season);

        let codes: Vec<&str> = season.iter().map(|m| m.code()).collect();
        info!(target: "season", "{} : {}", year, codes.join(", "));
    }

    Ok(SeasonReport {
        stats,
        threshold,
        assignment,
    })
}

/**
 * Run the season selection on the clipped rasters and save the results.
 *
 * The statistics table and the season record are written to the stats directory. If the config
 * asks for it, the clipped rasters of months outside each year's season are pruned afterwards.
 */
pub fn run_season_stage<S, Sel>(
    config: &PipelineConfig,
    store: &S,
    selector: &mut Sel,
) -> FireSeasonResult<SeasonReport>
where
    S: RasterStore + ?Sized,
    Sel: SeasonSelector + ?Sized,
{
    let report = assign_fire_seasons(store, selector, config.pixel_area_m2)?;

    write_stats_table(
        config.layout.stats_table_file(),
        &report.stats,
        report.threshold,
    )?;
    report
        .assignment
        .write_to(config.layout.fire_season_file())?;

    if config.prune {
        for (year, season) in report.assignment.iter() {
            let dir = year_dir(config.layout.clipped_dir(), year);
            let removed = prune_year(&dir, season, config.execute)?;

            let verb = if config.execute { "removed" } else { "would remove" };
            info!(target: "prune", "{}: {} {} rasters", year, verb, removed.len());
        }
    }

    Ok(report)
}

/*-------------------------------------------------------------------------------------------------
 *                                        Polygonisation
 *-----------------------------------------------------------------------------------------------*/

/**
 * Write a polygon layer for every fire season month in `assignment`.
 *
 * Layers go to `{out_base}/{year}/{year}_{Mon}.geojson` in the coordinate system of the source
 * raster. A month without burned pixels still gets a (featureless) layer. Returns the total number
 * of polygons written.
 */
pub fn polygonise_seasons<S: RasterStore + ?Sized>(
    store: &S,
    assignment: &FireSeasonAssignment,
    extractor: &PolygonExtractor,
    out_base: &Path,
) -> FireSeasonResult<usize> {
    let mut total = 0;

    for (year, season) in assignment.iter() {
        for &month in season {
            total += polygonise_month(store, year, month, extractor, out_base)
                .map_err(|err| FireSeasonError::in_unit(year, month, err))?;
        }

        info!(
            target: "polygon",
            "polygonisation for {} complete, layers are in {}",
            year,
            year_dir(out_base, year).display()
        );
    }

    Ok(total)
}

fn polygonise_month<S: RasterStore + ?Sized>(
    store: &S,
    year: i32,
    month: Month,
    extractor: &PolygonExtractor,
    out_base: &Path,
) -> FireSeasonResult<usize> {
    let label = year_month_label(year, month);
    let raster = store.open(year, month)?;

    let polygons = extractor.extract(&raster, &label);

    let path = year_dir(out_base, year).join(format!("{}.geojson", label));
    write_layer(&path, raster.crs(), &polygons)?;

    debug!(target: "polygon", "{}: {} polygons", label, polygons.len());

    Ok(polygons.len())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        raster::{GeoTransform, RasterGrid},
        season::ThresholdSelector,
        store::MemoryStore,
    };

    fn grid(burned: usize) -> RasterGrid {
        let mut data = vec![0; 10];
        for v in data.iter_mut().take(burned) {
            *v = 200;
        }
        RasterGrid::new(5, 2, data, GeoTransform::new(0.0, 0.0, 500.0, -500.0), None).unwrap()
    }

    /// Records every threshold it is handed.
    struct Spy(Vec<(i32, SeasonThreshold)>);

    impl SeasonSelector for Spy {
        fn select(
            &mut self,
            year: i32,
            _series: &[(Month, f64)],
            threshold: SeasonThreshold,
        ) -> FireSeasonResult<Vec<Month>> {
            self.0.push((year, threshold));
            Ok(vec![Month::Aug, Month::Aug])
        }
    }

    #[test]
    fn test_threshold_shared_by_all_years() {
        let mut store = MemoryStore::new();
        store.insert(2001, Month::Jul, grid(1));
        store.insert(2001, Month::Aug, grid(9));
        store.insert(2002, Month::Jul, grid(2));
        store.insert(2002, Month::Aug, grid(3));

        let mut spy = Spy(vec![]);
        let report = assign_fire_seasons(&store, &mut spy, DEFAULT_PIXEL_AREA_M2).unwrap();

        assert_eq!(report.stats.len(), 4);
        assert_eq!(spy.0.len(), 2);
        assert_eq!(spy.0[0].0, 2001);
        assert_eq!(spy.0[1].0, 2002);
        assert_eq!(spy.0[0].1, report.threshold);
        assert_eq!(spy.0[1].1, report.threshold);

        // Duplicates from the selector are dropped.
        assert_eq!(report.assignment.get(2001), Some(&[Month::Aug][..]));
    }

    #[test]
    fn test_failed_month_stops_selection() {
        let mut store = MemoryStore::new();
        store.insert(2001, Month::Jul, grid(1));
        store.insert(
            2001,
            Month::Aug,
            RasterGrid::new(0, 0, vec![], GeoTransform::default(), None).unwrap(),
        );

        let err = assign_fire_seasons(&store, &mut ThresholdSelector, DEFAULT_PIXEL_AREA_M2)
            .unwrap_err();

        match err.downcast_ref::<FireSeasonError>() {
            Some(FireSeasonError::Processing { year, month, .. }) => {
                assert_eq!(*year, 2001);
                assert_eq!(*month, Month::Aug);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_polygonise_missing_month() {
        let store = MemoryStore::new();
        let mut assignment = FireSeasonAssignment::new();
        assignment.insert(2001, &[Month::Sep]);

        let out = std::env::temp_dir().join(format!("fireseason-poly-{}", std::process::id()));
        let err = polygonise_seasons(&store, &assignment, &PolygonExtractor::default(), &out)
            .unwrap_err();

        assert!(err.to_string().contains("2001 Sep"));
    }
}
