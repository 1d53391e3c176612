//! Scrolling waterfall image stored as a ring of rows.
//!
//! Inserting rows moves a write cursor instead of shifting the buffer;
//! rows older than the ring height are overwritten.

use image::{Rgba, RgbaImage};

/// Fixed-size ring of spectral rows
#[derive(Debug, Clone)]
pub struct Waterfall {
    width: usize,
    height: usize,
    data: Vec<f32>,
    /// Ring index of the newest row
    cursor: usize,
}

impl Waterfall {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0.0; width * height],
            cursor: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Insert `row` as the newest `rows` rows (scroll speed per tick).
    ///
    /// A row shorter than the width is zero-padded; a longer one is cut.
    pub fn push(&mut self, row: &[f32], rows: usize) {
        for _ in 0..rows.min(self.height) {
            self.cursor = (self.cursor + 1) % self.height;
            let start = self.cursor * self.width;
            let dest = &mut self.data[start..start + self.width];
            let len = row.len().min(self.width);
            dest[..len].copy_from_slice(&row[..len]);
            dest[len..].fill(0.0);
        }
    }

    /// Row by age: 0 is the newest
    pub fn row(&self, age: usize) -> &[f32] {
        let age = age % self.height;
        let index = (self.cursor + self.height - age) % self.height;
        let start = index * self.width;
        &self.data[start..start + self.width]
    }

    /// Rows from newest (top of the display) to oldest
    pub fn rows_newest_first(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.height).map(move |age| self.row(age))
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.cursor = 0;
    }

    /// Render with the blue → purple → white map, newest row on top
    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width as u32, self.height as u32);
        for (y, row) in self.rows_newest_first().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                image.put_pixel(x as u32, y as u32, colorize(value));
            }
        }
        image
    }
}

/// Map an intensity to the display palette
pub fn colorize(value: f32) -> Rgba<u8> {
    let channel = |scale: f32| ((value * scale).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(0.5), channel(0.2), channel(1.0), 255])
}
