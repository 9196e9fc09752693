//! Documentation for the binary is with the definition of `FireSeasonOptionsInit` below.

use clap::Parser;
use fireseason::{
    run_season_stage, ConsoleSelector, DataLayout, FireSeasonAssignment, FireSeasonResult,
    GeoTiffStore, PipelineConfig, RecordedSelector, SeasonReport, SeasonSelector,
    ThresholdSelector, DEFAULT_PIXEL_AREA_M2,
};
use log::{debug, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
    str::FromStr,
};
use strum::{Display as StrumDisplay, EnumString};

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Choose the fire season months of every year.
///
/// The percent of burned pixels is computed for every clipped monthly raster, and the 75th
/// percentile over all years and months is reported as the threshold for an above normal month.
/// Each year is then shown in turn and the fire season months are confirmed. The results are saved
/// to Data/stats.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "fireseason")]
#[clap(author, version, about)]
struct FireSeasonOptionsInit {
    /// The project root directory, the one holding the Data directory.
    ///
    /// If this is not specified, then the program will check for it in the "FIRE_DATA_ROOT"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FIRE_DATA_ROOT")]
    root: PathBuf,

    /// How the months are chosen.
    ///
    /// "console" asks at the terminal, "threshold" takes every month above the threshold, and
    /// "recorded" reuses the previously saved fire seasons.
    #[clap(short, long)]
    #[clap(parse(try_from_str=parse_mode))]
    #[clap(default_value = "console")]
    mode: SelectionMode,

    /// The area of one pixel in square meters.
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_PIXEL_AREA_M2)]
    pixel_area: f64,

    /// Remove the clipped rasters of months that are not in the fire season.
    #[clap(short, long)]
    prune: bool,

    /// Default to a dry run when pruning, but if execute, then actually delete the files.
    #[clap(short, long)]
    execute: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum SelectionMode {
    Console,
    Threshold,
    Recorded,
}

fn parse_mode(mode: &str) -> Result<SelectionMode, String> {
    SelectionMode::from_str(mode).map_err(|_| format!("Argument is not a valid mode: {}", mode))
}

#[derive(Debug)]
struct FireSeasonOptionsChecked {
    /// Paths and stage settings.
    config: PipelineConfig,

    /// How the months are chosen.
    mode: SelectionMode,

    /// Verbose output
    verbose: bool,
}

impl Display for FireSeasonOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        write!(f, "{}", self.config)?;
        writeln!(f, "        Mode: {}", self.mode)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> FireSeasonResult<FireSeasonOptionsChecked> {
    let FireSeasonOptionsInit {
        root,
        mode,
        pixel_area,
        prune,
        execute,
        verbose,
    } = FireSeasonOptionsInit::parse();

    if !(pixel_area > 0.0) {
        return Err(format!("pixel area must be positive: {}", pixel_area).into());
    }

    let mut config = PipelineConfig::new(DataLayout::new(root));
    config.pixel_area_m2 = pixel_area;
    config.prune = prune;
    config.execute = execute;

    Ok(FireSeasonOptionsChecked {
        config,
        mode,
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

    let config = &opts.config;
    let store = GeoTiffStore::new(config.layout.clipped_dir());

    let mut selector: Box<dyn SeasonSelector> = match opts.mode {
        SelectionMode::Console => Box::new(ConsoleSelector::new(
            std::io::stdin().lock(),
            std::io::stdout(),
        )),
        SelectionMode::Threshold => Box::new(ThresholdSelector),
        SelectionMode::Recorded => Box::new(RecordedSelector::new(
            FireSeasonAssignment::read_from(config.layout.fire_season_file())?,
        )),
    };

    let SeasonReport {
        stats, threshold, ..
    } = run_season_stage(config, &store, selector.as_mut())?;

    info!(
        "{} months analysed, 75th percentile of percent burned: {}",
        stats.len(),
        threshold
    );
    info!(
        "fire seasons saved to {}",
        config.layout.fire_season_file().display()
    );

    Ok(())
}
