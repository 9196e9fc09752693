/*!
 * Reduce a burn date raster to burned / not burned.
 *
 * Unmapped (-1), water (-2), and unburned (0) pixels all collapse into "not burned". Only a
 * positive day of year counts as a burn.
 */

use crate::raster::{Crs, GeoTransform, RasterGrid};

/// The one test for whether a raw pixel value records a burn.
#[inline]
pub fn is_burned(value: i32) -> bool {
    value > 0
}

/// A grid of burned / not burned flags with the same shape and georeferencing as its source.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnMask {
    width: usize,
    height: usize,
    mask: Vec<bool>,
    transform: GeoTransform,
    crs: Option<Crs>,
}

impl BurnMask {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    /// The flags in row major order.
    pub fn data(&self) -> &[bool] {
        &self.mask
    }

    /// Get the flag at (`row`, `col`), if it is inside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.height && col < self.width {
            Some(self.mask[row * self.width + col])
        } else {
            None
        }
    }

    /// The number of burned pixels.
    pub fn burned_count(&self) -> usize {
        self.mask.iter().filter(|&&burned| burned).count()
    }
}

/// Classify every pixel of `raster` as burned or not.
pub fn classify(raster: &RasterGrid) -> BurnMask {
    BurnMask {
        width: raster.width(),
        height: raster.height(),
        mask: raster.data().iter().map(|&v| is_burned(v)).collect(),
        transform: *raster.transform(),
        crs: raster.crs(),
    }
}
