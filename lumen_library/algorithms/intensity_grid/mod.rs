//! 2D Intensity Grid
//!
//! Rasterized brightness map of the world, sampled by the light sensors.
//!
//! # Coordinates
//!
//! - Cells are indexed `(row, col)`, row 0 is the **top** of the map
//! - World `(0, 0)` is the **bottom-left** corner, `y` grows upward
//! - `scale_x = width_px / world_width`, `scale_y = height_px / world_height`
//!
//! # Example
//!
//! ```rust
//! use lumen_library::algorithms::intensity_grid::IntensityGrid;
//!
//! // 100 x 50 px map covering a 10m x 5m world, dark everywhere
//! let grid = IntensityGrid::filled(100, 50, 0.0, 10.0, 5.0).unwrap();
//!
//! let (col, row) = grid.world_to_pixel(2.5, 1.0);
//! assert_eq!((col, row), (25.0, 40.0));
//! ```

use lumen_core::{LumenError, LumenResult};
use std::path::Path;

/// Row-major brightness grid with world-size scale factors
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    width: usize,
    height: usize,
    cells: Vec<f32>, // 0.0 = dark, 1.0 = bright
    world_width: f64,
    world_height: f64,
    scale_x: f64, // pixels per world unit, horizontal
    scale_y: f64, // pixels per world unit, vertical
}

impl IntensityGrid {
    /// Create a grid from row-major cells.
    ///
    /// Cell values are clamped to `[0, 1]`; NaN cells become 0.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<f32>,
        world_width: f64,
        world_height: f64,
    ) -> LumenResult<Self> {
        if width == 0 || height == 0 {
            return Err(LumenError::InvalidParameter(format!(
                "grid must be non-empty, got {}x{}",
                width, height
            )));
        }
        if cells.len() != width * height {
            return Err(LumenError::InvalidParameter(format!(
                "expected {} cells for a {}x{} grid, got {}",
                width * height,
                width,
                height,
                cells.len()
            )));
        }
        if !(world_width.is_finite() && world_width > 0.0 && world_height.is_finite() && world_height > 0.0) {
            return Err(LumenError::InvalidParameter(format!(
                "world size must be positive, got {} x {}",
                world_width, world_height
            )));
        }

        let cells = cells
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
            .collect();

        Ok(Self {
            width,
            height,
            cells,
            world_width,
            world_height,
            scale_x: width as f64 / world_width,
            scale_y: height as f64 / world_height,
        })
    }

    /// Grid with every cell set to `value`
    pub fn filled(
        width: usize,
        height: usize,
        value: f32,
        world_width: f64,
        world_height: f64,
    ) -> LumenResult<Self> {
        Self::new(width, height, vec![value; width * height], world_width, world_height)
    }

    /// Grid whose cells are produced by `f(row, col)`
    pub fn from_fn(
        width: usize,
        height: usize,
        world_width: f64,
        world_height: f64,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> LumenResult<Self> {
        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                cells.push(f(row, col));
            }
        }
        Self::new(width, height, cells, world_width, world_height)
    }

    /// Load a map image as grayscale intensities in `[0, 1]`.
    ///
    /// The image spans `world_width x world_height` world units.
    pub fn from_image(path: impl AsRef<Path>, world_width: f64, world_height: f64) -> LumenResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| LumenError::MapLoad(format!("{}: {}", path.display(), e)))?;
        let gray = img.to_luma8();
        let (width_px, height_px) = gray.dimensions();

        let grid = Self::from_luma(&gray, world_width, world_height)
            .map_err(|e| LumenError::MapLoad(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            width_px,
            height_px,
            world_width,
            world_height,
            "loaded map"
        );
        Ok(grid)
    }

    /// Convert an 8-bit grayscale image (row 0 = top) into a grid
    pub fn from_luma(img: &image::GrayImage, world_width: f64, world_height: f64) -> LumenResult<Self> {
        let (width_px, height_px) = img.dimensions();
        let cells = img.pixels().map(|p| p[0] as f32 / 255.0).collect();
        Self::new(width_px as usize, height_px as usize, cells, world_width, world_height)
    }

    /// Intensity at `(row, col)`, `None` when out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if self.is_valid(row, col) {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// World coordinates to fractional pixel coordinates `(col, row)`.
    ///
    /// The vertical axis is flipped: world `y = world_height` maps to row 0.
    pub fn world_to_pixel(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        let col = world_x * self.scale_x;
        let row = (self.world_height - world_y) * self.scale_y;
        (col, row)
    }

    /// Fractional pixel coordinates `(col, row)` back to world coordinates
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let world_x = col / self.scale_x;
        let world_y = self.world_height - row / self.scale_y;
        (world_x, world_y)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn world_width(&self) -> f64 {
        self.world_width
    }

    pub fn world_height(&self) -> f64 {
        self.world_height
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_creation() {
        let grid = IntensityGrid::filled(40, 20, 0.5, 4.0, 2.0).unwrap();
        assert_eq!(grid.width(), 40);
        assert_eq!(grid.height(), 20);
        assert_relative_eq!(grid.scale_x(), 10.0);
        assert_relative_eq!(grid.scale_y(), 10.0);
        assert_eq!(grid.get(19, 39), Some(0.5));
        assert_eq!(grid.get(20, 0), None);
        assert_eq!(grid.get(0, 40), None);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(IntensityGrid::new(0, 10, vec![], 1.0, 1.0).is_err());
        assert!(IntensityGrid::new(2, 2, vec![0.0; 3], 1.0, 1.0).is_err());
        assert!(IntensityGrid::filled(2, 2, 0.0, 0.0, 1.0).is_err());
        assert!(IntensityGrid::filled(2, 2, 0.0, 1.0, -3.0).is_err());
    }

    #[test]
    fn test_cells_are_clamped() {
        let grid = IntensityGrid::new(3, 1, vec![-1.0, 2.0, f32::NAN], 1.0, 1.0).unwrap();
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(0, 1), Some(1.0));
        assert_eq!(grid.get(0, 2), Some(0.0));
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = IntensityGrid::from_fn(3, 2, 3.0, 2.0, |row, _col| row as f32).unwrap();
        assert_eq!(grid.get(0, 2), Some(0.0));
        assert_eq!(grid.get(1, 0), Some(1.0));
    }

    #[test]
    fn test_world_pixel_conversion_flips_y() {
        let grid = IntensityGrid::filled(100, 50, 0.0, 10.0, 5.0).unwrap();

        // Bottom-left of the world is the bottom-left pixel corner
        let (col, row) = grid.world_to_pixel(0.0, 0.0);
        assert_relative_eq!(col, 0.0);
        assert_relative_eq!(row, 50.0);

        // Top of the world is row 0
        let (_, row) = grid.world_to_pixel(0.0, 5.0);
        assert_relative_eq!(row, 0.0);

        let (x, y) = grid.pixel_to_world(25.0, 40.0);
        assert_relative_eq!(x, 2.5);
        assert_relative_eq!(y, 1.0);
    }

    #[test]
    fn test_from_luma_normalizes() {
        let img = image::GrayImage::from_fn(4, 2, |x, _y| image::Luma([if x < 2 { 0 } else { 255 }]));
        let grid = IntensityGrid::from_luma(&img, 4.0, 2.0).unwrap();
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(1, 3), Some(1.0));
    }

    #[test]
    fn test_from_image_roundtrip_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        let img = image::GrayImage::from_fn(8, 4, |_x, y| image::Luma([if y == 0 { 255 } else { 0 }]));
        img.save(&path).unwrap();

        let grid = IntensityGrid::from_image(&path, 8.0, 4.0).unwrap();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.get(0, 5), Some(1.0));
        assert_eq!(grid.get(3, 5), Some(0.0));
    }

    #[test]
    fn test_missing_image_is_map_load_error() {
        let err = IntensityGrid::from_image("/nonexistent/track.png", 25.0, 25.0).unwrap_err();
        assert!(matches!(err, LumenError::MapLoad(_)));
    }
}
