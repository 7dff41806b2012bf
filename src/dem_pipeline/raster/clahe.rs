//! Contrast-limited adaptive histogram equalization.
//!
//! The grid is split into a fixed `tiles_x` x `tiles_y` layout (padded on the
//! bottom/right by reflection when the size is not a multiple of the tile
//! count). Each tile gets its own clipped histogram and lookup table, and every
//! output sample is a bilinear blend of the four nearest tile tables.

use ndarray::Array2;
use tracing::debug;

use crate::dem_pipeline::common::{BorderMode, IntensityGrid};

const HIST_SIZE: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct ContrastEnhancer {
    clip_limit: f64,
    tiles_x: usize,
    tiles_y: usize,
}

impl Default for ContrastEnhancer {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles_x: 8,
            tiles_y: 8,
        }
    }
}

impl ContrastEnhancer {
    /// A non-positive `clip_limit` disables clipping (plain tiled equalization).
    pub fn new(clip_limit: f64, tiles_x: usize, tiles_y: usize) -> Self {
        Self {
            clip_limit,
            tiles_x: tiles_x.max(1),
            tiles_y: tiles_y.max(1),
        }
    }

    pub fn apply(&self, grid: &IntensityGrid) -> IntensityGrid {
        let src = grid.view();
        let (height, width) = src.dim();

        let padded_w = width + (self.tiles_x - width % self.tiles_x) % self.tiles_x;
        let padded_h = height + (self.tiles_y - height % self.tiles_y) % self.tiles_y;
        let tile_w = padded_w / self.tiles_x;
        let tile_h = padded_h / self.tiles_y;
        let tile_area = tile_w * tile_h;

        let clip = if self.clip_limit > 0.0 {
            Some(((self.clip_limit * tile_area as f64 / HIST_SIZE as f64) as u32).max(1))
        } else {
            None
        };

        debug!(
            "CLAHE: {}x{} tiles of {}x{}, clip {:?}",
            self.tiles_x, self.tiles_y, tile_w, tile_h, clip
        );

        let lut_scale = 255.0f32 / tile_area as f32;
        let mut luts = vec![[0u8; HIST_SIZE]; self.tiles_x * self.tiles_y];

        for ty in 0..self.tiles_y {
            for tx in 0..self.tiles_x {
                let mut hist = [0u32; HIST_SIZE];
                for py in ty * tile_h..(ty + 1) * tile_h {
                    let sy = BorderMode::Reflect101.index(py as isize, height);
                    for px in tx * tile_w..(tx + 1) * tile_w {
                        let sx = BorderMode::Reflect101.index(px as isize, width);
                        hist[src[[sy, sx]] as usize] += 1;
                    }
                }

                if let Some(limit) = clip {
                    clip_histogram(&mut hist, limit);
                }

                let lut = &mut luts[ty * self.tiles_x + tx];
                let mut sum = 0u32;
                for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
                    sum += count;
                    *entry = saturate_u8(sum as f32 * lut_scale);
                }
            }
        }

        let inv_tw = 1.0f32 / tile_w as f32;
        let inv_th = 1.0f32 / tile_h as f32;

        // Column interpolation terms are identical for every row.
        let columns: Vec<(usize, usize, f32)> = (0..width)
            .map(|x| {
                let txf = x as f32 * inv_tw - 0.5;
                let tx1 = txf.floor() as isize;
                let xa = txf - tx1 as f32;
                let tx2 = (tx1 + 1).min(self.tiles_x as isize - 1) as usize;
                (tx1.max(0) as usize, tx2, xa)
            })
            .collect();

        let mut out = Array2::<u8>::zeros((height, width));
        for y in 0..height {
            let tyf = y as f32 * inv_th - 0.5;
            let ty1 = tyf.floor() as isize;
            let ya = tyf - ty1 as f32;
            let ya1 = 1.0 - ya;
            let ty2 = (ty1 + 1).min(self.tiles_y as isize - 1) as usize;
            let ty1 = ty1.max(0) as usize;

            let row1 = &luts[ty1 * self.tiles_x..(ty1 + 1) * self.tiles_x];
            let row2 = &luts[ty2 * self.tiles_x..(ty2 + 1) * self.tiles_x];

            for (x, &(tx1, tx2, xa)) in columns.iter().enumerate() {
                let v = src[[y, x]] as usize;
                let xa1 = 1.0 - xa;
                let res = (row1[tx1][v] as f32 * xa1 + row1[tx2][v] as f32 * xa) * ya1
                    + (row2[tx1][v] as f32 * xa1 + row2[tx2][v] as f32 * xa) * ya;
                out[[y, x]] = saturate_u8(res);
            }
        }

        IntensityGrid::from_valid(out)
    }
}

/// Clips every bin at `limit` and spreads the excess uniformly, with the
/// remainder handed out at a fixed stride from the low end.
fn clip_histogram(hist: &mut [u32; HIST_SIZE], limit: u32) {
    let mut clipped = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            clipped += *count - limit;
            *count = limit;
        }
    }

    let batch = clipped / HIST_SIZE as u32;
    let mut residual = clipped - batch * HIST_SIZE as u32;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (HIST_SIZE / residual as usize).max(1);
        let mut i = 0;
        while i < HIST_SIZE && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

fn saturate_u8(v: f32) -> u8 {
    v.round_ties_even().clamp(0.0, 255.0) as u8
}
