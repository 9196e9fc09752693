//! Documentation for the binary is with the definition of `CropModisOptionsInit` below.

use clap::Parser;
use fireseason::{
    crop_rasters, BoundingBox, DataLayout, FireSeasonResult, GeoTiffStore, RasterStore,
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
/// Crop the renamed MODIS rasters to the study region.
///
/// Rasters are read from Data/Initial/MODIS/Reprojected/YEAR and written, with the same names, to
/// Data/Intermediate/Modis_clipped/YEAR.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "cropmodis")]
#[clap(author, version, about)]
struct CropModisOptionsInit {
    /// The project root directory, the one holding the Data directory.
    ///
    /// If this is not specified, then the program will check for it in the "FIRE_DATA_ROOT"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FIRE_DATA_ROOT")]
    root: PathBuf,

    /// The study region as min_x,min_y,max_x,max_y in the coordinates of the rasters.
    #[clap(parse(try_from_str=parse_bbox))]
    #[clap(allow_hyphen_values = true)]
    bbox: BoundingBox,

    /// Only crop these years, default is every year found.
    #[clap(short, long)]
    year: Vec<i32>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

/// Parse a bounding box argument.
fn parse_bbox(bbox_str: &str) -> Result<BoundingBox, String> {
    let corners: Vec<_> = bbox_str.split(',').map(str::trim).collect();

    if corners.len() != 4 {
        return Err("Invalid number of coords".to_owned());
    }

    let mut vals = [0.0; 4];
    for (val, corner) in vals.iter_mut().zip(&corners) {
        *val = corner
            .parse()
            .map_err(|err| format!("invalid coordinate '{}': {}", corner, err))?;
    }
    let [min_x, min_y, max_x, max_y] = vals;

    if min_x >= max_x || min_y >= max_y {
        return Err(format!(
            concat!(
                "Minimum x/y must be less than maximum x/y:",
                " min_x={} max_x={} min_y={} max_y={}"
            ),
            min_x, max_x, min_y, max_y
        ));
    }

    Ok(BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    })
}

#[derive(Debug)]
struct CropModisOptionsChecked {
    /// The directory layout.
    layout: DataLayout,

    /// The study region.
    bbox: BoundingBox,

    /// Years to crop, empty for all of them.
    years: Vec<i32>,

    /// Verbose output
    verbose: bool,
}

impl Display for CropModisOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "      Source: {}", self.layout.reprojected_dir().display())?;
        writeln!(f, " Destination: {}", self.layout.clipped_dir().display())?;
        writeln!(f, "Bounding Box: {}", self.bbox)?;
        if !self.years.is_empty() {
            writeln!(f, "       Years: {:?}", self.years)?;
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> FireSeasonResult<CropModisOptionsChecked> {
    let CropModisOptionsInit {
        root,
        bbox,
        year,
        verbose,
    } = CropModisOptionsInit::parse();

    Ok(CropModisOptionsChecked {
        layout: DataLayout::new(root),
        bbox,
        years: year,
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

    let store = GeoTiffStore::new(opts.layout.reprojected_dir());
    let years = if opts.years.is_empty() {
        store.years()?
    } else {
        opts.years.clone()
    };

    let count = crop_rasters(&store, &years, &opts.bbox, &opts.layout.clipped_dir())?;
    info!("{} rasters cropped to {}", count, opts.bbox);

    Ok(())
}
