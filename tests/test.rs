use fireseason::{
    assign_fire_seasons, polygonise_seasons, run_season_stage, write_geotiff, ConsoleSelector,
    Crs, DataLayout, FireSeasonAssignment, GeoTiffStore, GeoTransform, MemoryStore, Month,
    PipelineConfig, PolygonExtractor, RasterGrid, ThresholdSelector, DEFAULT_PIXEL_AREA_M2,
    WATER,
};
use std::{io::Cursor, path::PathBuf};
use strum::IntoEnumIterator;

/// A 10 x 10 grid of 500m pixels with `burned` pixels set to `burn_day`.
fn month_grid(burned: usize, burn_day: i32) -> RasterGrid {
    let mut data = vec![0; 100];
    for v in data.iter_mut().take(burned) {
        *v = burn_day;
    }
    if burned < 100 {
        data[99] = WATER;
    }

    let transform = GeoTransform::new(-120000.0, 250000.0, 500.0, -500.0);
    RasterGrid::new(10, 10, data, transform, Some(Crs::projected(20790))).unwrap()
}

fn scratch_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fireseason-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_threshold_spans_all_years() {
    let year_a = [1, 2, 1, 3, 2, 4, 5, 90, 3, 2, 1, 1];

    let mut store = MemoryStore::new();
    for (month, &pct) in Month::iter().zip(year_a.iter()) {
        store.insert(2001, month, month_grid(pct, 200));
        store.insert(2002, month, month_grid(1, 200));
    }

    let report = assign_fire_seasons(&store, &mut ThresholdSelector, DEFAULT_PIXEL_AREA_M2).unwrap();
    assert_eq!(report.stats.len(), 24);

    let threshold = report.threshold.value();
    assert!(threshold < 90.0);
    for stat in report.stats.iter().filter(|s| s.year == 2002) {
        assert!(threshold > stat.percent_burned);
    }

    assert_eq!(report.assignment.get(2002), Some(&[][..]));
    assert!(report.assignment.get(2001).unwrap().contains(&Month::Aug));
}

#[test]
fn test_console_seasons_saved_and_reloaded() {
    let mut store = MemoryStore::new();
    for month in [Month::Jun, Month::Jul, Month::Aug] {
        store.insert(2010, month, month_grid(5, 180));
        store.insert(2011, month, month_grid(40, 190));
    }

    let input = Cursor::new(b"Jul, aug\n\nJune\nundo\nAugust\ndone\n".to_vec());
    let mut selector = ConsoleSelector::new(input, vec![]);

    let report = assign_fire_seasons(&store, &mut selector, DEFAULT_PIXEL_AREA_M2).unwrap();
    assert_eq!(report.assignment.get(2010), Some(&[Month::Jul, Month::Aug][..]));
    assert_eq!(report.assignment.get(2011), Some(&[Month::Aug][..]));

    let root = scratch_root("reload");
    let path = DataLayout::new(&root).fire_season_file();
    report.assignment.write_to(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "2010 : Jul, Aug\n2011 : Aug\n");
    assert_eq!(FireSeasonAssignment::read_from(&path).unwrap(), report.assignment);
}

#[test]
fn test_season_and_polygon_stages_on_disk() {
    let root = scratch_root("stages");
    let mut config = PipelineConfig::new(DataLayout::new(&root));
    config.prune = true;
    config.execute = true;

    let clipped = config.layout.clipped_dir();
    let store = GeoTiffStore::new(&clipped);
    for (year, month, burned) in [
        (2001, Month::Jul, 10),
        (2001, Month::Aug, 90),
        (2002, Month::Jul, 1),
        (2002, Month::Aug, 1),
    ] {
        std::fs::create_dir_all(clipped.join(year.to_string())).unwrap();
        write_geotiff(&month_grid(burned, 215), store.path(year, month)).unwrap();
    }

    // Percentages 1, 1, 10, 90: the 75th percentile is 10 + 0.25 * 80.
    let report = run_season_stage(&config, &store, &mut ThresholdSelector).unwrap();
    assert_eq!(report.threshold.value(), 30.0);
    assert_eq!(report.assignment.get(2001), Some(&[Month::Aug][..]));
    assert_eq!(report.assignment.get(2002), Some(&[][..]));

    let stats_table = std::fs::read_to_string(config.layout.stats_table_file()).unwrap();
    assert_eq!(stats_table.lines().count(), 6);
    assert!(stats_table.lines().last().unwrap().starts_with("# percentile_75,30.0"));

    // Only the fire season rasters survive pruning.
    assert!(store.path(2001, Month::Aug).exists());
    assert!(!store.path(2001, Month::Jul).exists());
    assert!(!store.path(2002, Month::Aug).exists());

    let saved = FireSeasonAssignment::read_from(config.layout.fire_season_file()).unwrap();
    let count = polygonise_seasons(
        &store,
        &saved,
        &PolygonExtractor::default(),
        &config.layout.polygon_dir(),
    )
    .unwrap();
    assert_eq!(count, 90);

    let layer = config
        .layout
        .polygon_dir()
        .join("2001")
        .join("2001_Aug.geojson");
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&layer).unwrap()).unwrap();
    let features = doc["features"].as_array().unwrap();
    assert_eq!(features.len(), 90);
    assert_eq!(features[0]["properties"]["burn_date"], 215);
    assert_eq!(features[0]["properties"]["yymm"], "2001_Aug");
    assert_eq!(doc["crs"]["properties"]["name"], "EPSG:20790");

    assert!(!config.layout.polygon_dir().join("2001").join("2001_Jul.geojson").exists());
}
