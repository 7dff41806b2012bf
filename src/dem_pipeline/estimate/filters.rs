//! Separable neighborhood filters over `f64` grids.

use ndarray::Array2;

use crate::dem_pipeline::common::BorderMode;

/// Fixed binomial kernels used for small apertures when no sigma is given.
const SMALL_GAUSSIAN_KERNELS: [&[f64]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Sigma derived from an aperture size, `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn sigma_for_aperture(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian of odd length `size`.
///
/// Without an explicit sigma, sizes up to 7 use the fixed binomial tables and
/// larger sizes derive sigma from the aperture.
pub fn gaussian_kernel(size: usize, sigma: Option<f64>) -> Vec<f64> {
    let size = if size % 2 == 0 { size + 1 } else { size };

    if sigma.is_none() && size <= 7 {
        return SMALL_GAUSSIAN_KERNELS[size / 2].to_vec();
    }

    let sigma = sigma
        .filter(|s| *s > 0.0)
        .unwrap_or_else(|| sigma_for_aperture(size));
    let scale = -0.5 / (sigma * sigma);
    let center = (size / 2) as f64;

    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Gaussian with a radius of `truncate * sigma` samples, rounded.
pub fn truncated_gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as usize;
    gaussian_kernel(2 * radius + 1, Some(sigma))
}

/// Correlates rows with `kx`, then columns with `ky`.
pub fn separable_filter(src: &Array2<f64>, kx: &[f64], ky: &[f64], border: BorderMode) -> Array2<f64> {
    let (rows, cols) = src.dim();
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut horizontal = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0;
            for (k, &w) in kx.iter().enumerate() {
                let sc = border.index(c as isize + k as isize - rx, cols);
                acc += w * src[[r, sc]];
            }
            horizontal[[r, c]] = acc;
        }
    }

    let mut out = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0;
            for (k, &w) in ky.iter().enumerate() {
                let sr = border.index(r as isize + k as isize - ry, rows);
                acc += w * horizontal[[sr, c]];
            }
            out[[r, c]] = acc;
        }
    }
    out
}

/// Square Gaussian blur of aperture `size` with reflect-101 borders.
pub fn gaussian_blur(src: &Array2<f64>, size: usize) -> Array2<f64> {
    let kernel = gaussian_kernel(size, None);
    separable_filter(src, &kernel, &kernel, BorderMode::Reflect101)
}

/// Isotropic Gaussian smoothing by sigma, kernel truncated at 4 sigma, mirrored
/// borders.
pub fn gaussian_smooth(src: &Array2<f64>, sigma: f64) -> Array2<f64> {
    let kernel = truncated_gaussian_kernel(sigma, 4.0);
    separable_filter(src, &kernel, &kernel, BorderMode::Reflect)
}

const SOBEL_DERIVATIVE: [f64; 3] = [-1.0, 0.0, 1.0];
const SOBEL_SMOOTHING: [f64; 3] = [1.0, 2.0, 1.0];

/// 3x3 Sobel first derivatives `(dx, dy)`, x along columns, y along rows.
pub fn sobel(src: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let dx = separable_filter(src, &SOBEL_DERIVATIVE, &SOBEL_SMOOTHING, BorderMode::Reflect101);
    let dy = separable_filter(src, &SOBEL_SMOOTHING, &SOBEL_DERIVATIVE, BorderMode::Reflect101);
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_small_kernels_are_binomial() {
        assert_eq!(gaussian_kernel(3, None), vec![0.25, 0.5, 0.25]);
        let k7 = gaussian_kernel(7, None);
        assert_eq!(k7.len(), 7);
        assert_abs_diff_eq!(k7.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_large_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel(11, None);
        assert_abs_diff_eq!(k.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for i in 0..5 {
            assert_abs_diff_eq!(k[i], k[10 - i], epsilon = 1e-15);
        }
        assert!(k[5] > k[4]);
    }

    #[test]
    fn test_truncated_kernel_radius() {
        // sigma 0.5, truncate 4 -> radius 2
        assert_eq!(truncated_gaussian_kernel(0.5, 4.0).len(), 5);
    }

    #[test]
    fn test_blur_preserves_constant() {
        let src = Array2::from_elem((6, 9), 0.42);
        let blurred = gaussian_blur(&src, 7);
        let first = blurred[[0, 0]];
        assert!(blurred.iter().all(|&v| v == first));
        assert_abs_diff_eq!(first, 0.42, epsilon = 1e-12);
    }

    #[test]
    fn test_sobel_horizontal_ramp() {
        let src = Array2::from_shape_fn((5, 5), |(_, c)| c as f64);
        let (dx, dy) = sobel(&src);
        // Interior: (c+1) - (c-1) = 2, times column weights 1 + 2 + 1
        assert_eq!(dx[[2, 2]], 8.0);
        assert_eq!(dy[[2, 2]], 0.0);
        // Reflect-101 border mirrors the ramp, so the edge derivative vanishes.
        assert_eq!(dx[[2, 0]], 0.0);
    }

    #[test]
    fn test_sobel_flat_is_zero() {
        let src = Array2::from_elem((4, 4), 0.7);
        let (dx, dy) = sobel(&src);
        assert!(dx.iter().chain(dy.iter()).all(|&v| v == 0.0));
    }
}
