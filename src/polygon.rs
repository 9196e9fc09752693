/*!
 * Turn the burned pixels of a monthly raster into polygons.
 *
 * Every burned pixel becomes its own square, exactly the footprint of the cell. Neighboring cells
 * that burned on the same day are not merged.
 */

use crate::raster::RasterGrid;

/// The footprint of one burned pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnPolygon {
    /// Closed ring of (x, y) map coordinates, the first and last vertex are the same.
    pub ring: [(f64, f64); 5],
    /// Ordinal day of the year the burn was detected.
    pub burn_date: i32,
    /// The year and month label of the source raster, e.g. "2005_Aug".
    pub yymm: String,
}

impl BurnPolygon {
    /// The center of the cell.
    pub fn center(&self) -> (f64, f64) {
        let (x0, y0) = self.ring[0];
        let (x1, y1) = self.ring[2];
        ((x0 + x1) / 2.0, (y0 + y1) / 2.0)
    }
}

/**
 * Extracts a polygon for every pixel with a burn day above `min_burn_day`.
 *
 * The default of 1 leaves out pixels that burned on the first day of the year. Set it to 0 to
 * use the same burned / not burned rule as the statistics.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonExtractor {
    pub min_burn_day: i32,
}

impl Default for PolygonExtractor {
    fn default() -> Self {
        PolygonExtractor { min_burn_day: 1 }
    }
}

impl PolygonExtractor {
    pub fn new(min_burn_day: i32) -> Self {
        PolygonExtractor { min_burn_day }
    }

    /// Polygons for the burned pixels of `raster`, in row major order.
    pub fn extract(&self, raster: &RasterGrid, label: &str) -> Vec<BurnPolygon> {
        let t = raster.transform();
        let half_w = 0.5 * t.a;
        let half_h = 0.5 * t.e;

        raster
            .indexed_values()
            .filter(|&(_, burn_date)| burn_date > self.min_burn_day)
            .map(|((row, col), burn_date)| {
                let (x, y) = t.xy(row, col);

                BurnPolygon {
                    ring: [
                        (x - half_w, y - half_h),
                        (x + half_w, y - half_h),
                        (x + half_w, y + half_h),
                        (x - half_w, y + half_h),
                        (x - half_w, y - half_h),
                    ],
                    burn_date,
                    yymm: label.to_owned(),
                }
            })
            .collect()
    }
}

/// Extract polygons with the default [PolygonExtractor].
pub fn extract(raster: &RasterGrid, label: &str) -> Vec<BurnPolygon> {
    PolygonExtractor::default().extract(raster, label)
}
