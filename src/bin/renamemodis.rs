//! Documentation for the binary is with the definition of `RenameModisOptionsInit` below.

use clap::Parser;
use fireseason::{list_years, rename_modis_year, year_dir, DataLayout, FireSeasonResult};
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
/// Rename reprojected MODIS burned area composites to YEAR_Mon.tiff.
///
/// Every year directory under Data/Initial/MODIS/Reprojected is processed. The month is found
/// from the day of year in the composite's acquisition token (e.g. A2004061 is March 2004). The
/// quality assurance (ba_qa) files are deleted.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "renamemodis")]
#[clap(author, version, about)]
struct RenameModisOptionsInit {
    /// The project root directory, the one holding the Data directory.
    ///
    /// If this is not specified, then the program will check for it in the "FIRE_DATA_ROOT"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FIRE_DATA_ROOT")]
    root: PathBuf,

    /// Default to a dry run, but if execute, then actually rename and delete the files.
    #[clap(short, long)]
    execute: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct RenameModisOptionsChecked {
    /// The directory layout.
    layout: DataLayout,

    /// Default to a dry run, but if execute, then actually rename and delete the files.
    execute: bool,

    /// Verbose output
    verbose: bool,
}

impl Display for RenameModisOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "Reprojected: {}", self.layout.reprojected_dir().display())?;
        writeln!(f, "    Execute: {}", self.execute)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> FireSeasonResult<RenameModisOptionsChecked> {
    let RenameModisOptionsInit {
        root,
        execute,
        verbose,
    } = RenameModisOptionsInit::parse();

    Ok(RenameModisOptionsChecked {
        layout: DataLayout::new(root),
        execute,
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

    let base = opts.layout.reprojected_dir();
    let mut total = 0;
    for year in list_years(&base)? {
        total += rename_modis_year(year_dir(&base, year), year, opts.execute)?.len();
    }

    if !opts.execute {
        info!("dry run, {} files would be renamed, rerun with --execute", total);
    }

    Ok(())
}
