/*!
 * Select the wildfire season of each year from MODIS monthly burned area rasters, and turn the
 * burned pixels of those months into polygons.
 *
 * The monthly rasters hold the MODIS "Burn Date" codes. For every month of every year the
 * percentage of burned pixels is computed, and the 75th percentile of all those percentages is
 * used as a single, global threshold for what counts as an above normal month. A
 * [SeasonSelector] (usually a person at a terminal) uses that to confirm the fire season months
 * of each year, and only those months are polygonised.
 */

pub use classify::{classify, is_burned, BurnMask};
pub use error::{FireSeasonError, FireSeasonResult};
pub use layout::{
    is_tiff, list_years, prune_year, raster_path, rename_modis_year, year_dir, DataLayout,
};
pub use month::{parse_composite_name, parse_year_month, year_month_label, Month};
pub use pipeline::{
    assign_fire_seasons, crop_rasters, polygonise_seasons, run_season_stage, PipelineConfig,
    SeasonReport,
};
pub use polygon::{extract, BurnPolygon, PolygonExtractor};
pub use raster::{
    read_geotiff, write_geotiff, BoundingBox, Crs, GeoTransform, RasterGrid, NO_DATA, UNBURNED,
    WATER,
};
pub use season::{
    ConsoleSelector, FireSeasonAssignment, RecordedSelector, SeasonSelector, ThresholdSelector,
};
pub use stats::{
    accumulate, collect_statistics, percentile, threshold, write_stats_table, year_series,
    MonthlyBurnStat, SeasonThreshold, DEFAULT_PIXEL_AREA_M2, SEASON_PERCENTILE,
};
pub use store::{GeoTiffStore, MemoryStore, RasterStore};
pub use vector::{write_layer, FeatureWriter, GeoJsonFile};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod classify;
mod error;
mod layout;
mod month;
mod pipeline;
mod polygon;
mod raster;
mod season;
mod stats;
mod store;
mod vector;
