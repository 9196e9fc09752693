//! Documentation for the binary is with the definition of `PolyFireOptionsInit` below.

use clap::Parser;
use fireseason::{
    polygonise_seasons, DataLayout, FireSeasonAssignment, FireSeasonResult, GeoTiffStore,
    PolygonExtractor,
};
use log::{debug, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Convert the burned pixels of every fire season month into polygons.
///
/// The fire seasons saved by the fireseason program decide which clipped rasters are used. Every
/// burned pixel becomes a square polygon with its burn day and YEAR_Mon label as attributes, one
/// GeoJSON layer per month in Data/Intermediate/modis_poly/YEAR.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "polyfire")]
#[clap(author, version, about)]
struct PolyFireOptionsInit {
    /// The project root directory, the one holding the Data directory.
    ///
    /// If this is not specified, then the program will check for it in the "FIRE_DATA_ROOT"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FIRE_DATA_ROOT")]
    root: PathBuf,

    /// The fire season record to use instead of the one in Data/stats.
    #[clap(short, long)]
    seasons: Option<PathBuf>,

    /// Only pixels with a burn day greater than this become polygons.
    ///
    /// The default of 1 skips burns on the first day of the year, 0 keeps every burned pixel.
    #[clap(short, long)]
    #[clap(default_value_t = 1)]
    min_burn_day: i32,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct PolyFireOptionsChecked {
    /// The directory layout.
    layout: DataLayout,

    /// The fire season record.
    seasons: PathBuf,

    /// Which pixels become polygons.
    extractor: PolygonExtractor,

    /// Verbose output
    verbose: bool,
}

impl Display for PolyFireOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "     Rasters: {}", self.layout.clipped_dir().display())?;
        writeln!(f, "     Seasons: {}", self.seasons.display())?;
        writeln!(f, "      Output: {}", self.layout.polygon_dir().display())?;
        writeln!(f, "Min burn day: > {}", self.extractor.min_burn_day)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> FireSeasonResult<PolyFireOptionsChecked> {
    let PolyFireOptionsInit {
        root,
        seasons,
        min_burn_day,
        verbose,
    } = PolyFireOptionsInit::parse();

    let layout = DataLayout::new(root);
    let seasons = seasons.unwrap_or_else(|| layout.fire_season_file());

    Ok(PolyFireOptionsChecked {
        layout,
        seasons,
        extractor: PolygonExtractor::new(min_burn_day),
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> FireSeasonResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if opts.verbose {
        info!(target: "startup", "{}", opts);
        debug!(target: "startup", "Debug logging active.");
    }

    let assignment = FireSeasonAssignment::read_from(&opts.seasons)?;
    let store = GeoTiffStore::new(opts.layout.clipped_dir());

    let count = polygonise_seasons(
        &store,
        &assignment,
        &opts.extractor,
        &opts.layout.polygon_dir(),
    )?;

    info!("{} burn polygons written", count);

    Ok(())
}
