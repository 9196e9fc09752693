/*!
 * Single band raster grids and their georeferencing.
 *
 * Pixel values are the MODIS burned area "Burn Date" codes: -1 for unmapped, -2 for water, 0
 * for unburned land, and 1-366 for the ordinal day of the year a burn was detected.
 */

pub use geotiff::{read_geotiff, write_geotiff};

use crate::{error::FireSeasonError, FireSeasonResult};
use std::fmt::{self, Display};

mod geotiff;

/// Pixel value for areas left unmapped due to insufficient data.
pub const NO_DATA: i32 = -1;
/// Pixel value for water.
pub const WATER: i32 = -2;
/// Pixel value for land that did not burn.
pub const UNBURNED: i32 = 0;

/**
 * Affine transform from pixel (column, row) space to map coordinates.
 *
 * Coefficients follow the usual `a b c / d e f` layout:
 *
 * ```text
 * x = c + a * col + b * row
 * y = f + d * col + e * row
 * ```
 *
 * For north up images `b` and `d` are zero and `e` (the pixel height) is negative.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// Pixel width.
    pub a: f64,
    /// Row rotation.
    pub b: f64,
    /// X coordinate of the upper left corner of the upper left pixel.
    pub c: f64,
    /// Column rotation.
    pub d: f64,
    /// Pixel height, usually negative.
    pub e: f64,
    /// Y coordinate of the upper left corner of the upper left pixel.
    pub f: f64,
}

impl GeoTransform {
    /// Create a north up transform with no rotation.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            a: pixel_width,
            b: 0.0,
            c: origin_x,
            d: 0.0,
            e: pixel_height,
            f: origin_y,
        }
    }

    /// Create from the GDAL ordering `[c, a, b, f, d, e]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        GeoTransform {
            c: coeffs[0],
            a: coeffs[1],
            b: coeffs[2],
            f: coeffs[3],
            d: coeffs[4],
            e: coeffs[5],
        }
    }

    /// Convert to the GDAL ordering `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// The map coordinates of the center of the pixel at (`row`, `col`).
    pub fn xy(&self, row: usize, col: usize) -> (f64, f64) {
        let col = col as f64 + 0.5;
        let row = row as f64 + 0.5;

        let x = self.c + self.a * col + self.b * row;
        let y = self.f + self.d * col + self.e * row;

        (x, y)
    }

    /// True if there is no rotation or skew.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    epsg: u16,
    geographic: bool,
}

impl Crs {
    /// A projected coordinate system, e.g. 20790 for Lisbon / Portuguese National Grid.
    pub fn projected(epsg: u16) -> Self {
        Crs {
            epsg,
            geographic: false,
        }
    }

    /// A geographic (latitude-longitude) coordinate system, e.g. 4326.
    pub fn geographic(epsg: u16) -> Self {
        Crs {
            epsg,
            geographic: true,
        }
    }

    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// An axis aligned rectangle in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "({:.3}, {:.3}) <---> ({:.3}, {:.3})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/**
 * A two dimensional grid of pixel values for one (year, month).
 *
 * Values are stored in row major order. Once created the grid is never modified, operations
 * like cropping produce a new grid.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    data: Vec<i32>,
    transform: GeoTransform,
    crs: Option<Crs>,
}

impl RasterGrid {
    /// Create a grid, checking the data matches the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<i32>,
        transform: GeoTransform,
        crs: Option<Crs>,
    ) -> FireSeasonResult<Self> {
        if Some(data.len()) != width.checked_mul(height) {
            return Err(format!(
                "raster data length {} does not match {}x{}",
                data.len(),
                width,
                height
            )
            .into());
        }

        Ok(RasterGrid {
            width,
            height,
            data,
            transform,
            crs,
        })
    }

    /// Create a grid with every pixel set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        value: i32,
        transform: GeoTransform,
        crs: Option<Crs>,
    ) -> FireSeasonResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or_else(|| format!("raster dimensions {}x{} are too large", width, height))?;

        Ok(RasterGrid {
            width,
            height,
            data: vec![value; len],
            transform,
            crs,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw values in row major order.
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    /// Get the value at (`row`, `col`), if it is inside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Iterate over `((row, col), value)` in row major order.
    pub fn indexed_values(&self) -> impl Iterator<Item = ((usize, usize), i32)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(index, &value)| ((index / width, index % width), value))
    }

    /// The extent covered by the grid. Only meaningful for rectilinear transforms.
    pub fn bounds(&self) -> BoundingBox {
        let t = &self.transform;
        let x0 = t.c;
        let x1 = t.c + t.a * self.width as f64;
        let y0 = t.f;
        let y1 = t.f + t.e * self.height as f64;

        BoundingBox {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /**
     * Cut out the window of pixels whose cells intersect `bbox`.
     *
     * The result has new dimensions and a transform whose origin is moved to the corner of the
     * window, everything else is carried over unchanged.
     */
    pub fn crop(&self, bbox: &BoundingBox) -> FireSeasonResult<RasterGrid> {
        let t = &self.transform;
        if !t.is_rectilinear() || t.a == 0.0 || t.e == 0.0 {
            return Err(FireSeasonError::UnsupportedTransform.into());
        }

        let (col_start, col_end) = window_range(bbox.min_x, bbox.max_x, t.c, t.a, self.width);
        let (row_start, row_end) = window_range(bbox.min_y, bbox.max_y, t.f, t.e, self.height);

        if col_start >= col_end || row_start >= row_end {
            return Err(FireSeasonError::CropOutsideRaster.into());
        }

        let width = col_end - col_start;
        let height = row_end - row_start;

        let mut data = Vec::with_capacity(width * height);
        for row in row_start..row_end {
            let start = row * self.width + col_start;
            data.extend_from_slice(&self.data[start..(start + width)]);
        }

        let transform = GeoTransform {
            c: t.c + t.a * col_start as f64,
            f: t.f + t.e * row_start as f64,
            ..*t
        };

        RasterGrid::new(width, height, data, transform, self.crs)
    }
}

/// The half open range of pixel indexes along one axis overlapping [lo, hi] in map units.
fn window_range(lo: f64, hi: f64, origin: f64, step: f64, len: usize) -> (usize, usize) {
    let p0 = (lo - origin) / step;
    let p1 = (hi - origin) / step;

    let start = p0.min(p1).floor().max(0.0);
    let end = p0.max(p1).ceil().min(len as f64);

    if end <= start {
        (0, 0)
    } else {
        (start as usize, end as usize)
    }
}
