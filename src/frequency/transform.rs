//! Forward and inverse per-channel 2D DFT.

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{Array4, Axis};
use rustfft::{num_complex::Complex, Fft, FftDirection, FftPlanner};

use super::{FrequencyMode, FrequencyTensor};
use crate::error::{Error, Result};
use crate::image::{check_shape, clamp_unit, Image};

/// Row and column plans for one transform direction.
struct Plans {
    rows: Arc<dyn Fft<f64>>,
    cols: Arc<dyn Fft<f64>>,
}

impl Plans {
    fn new(height: usize, width: usize, direction: FftDirection) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows: planner.plan_fft(width, direction),
            cols: planner.plan_fft(height, direction),
        }
    }

    /// Transform a row-major `height x width` plane in place. Unnormalized.
    fn apply(&self, buffer: &mut Vec<Complex<f64>>, height: usize, width: usize) {
        // rustfft processes every `width`-long chunk, i.e. every row
        self.rows.process(buffer);

        let mut columns = transpose(buffer, height, width);
        self.cols.process(&mut columns);
        *buffer = transpose(&columns, width, height);
    }
}

/// Transpose a row-major `rows x cols` buffer.
fn transpose(src: &[Complex<f64>], rows: usize, cols: usize) -> Vec<Complex<f64>> {
    let mut dst = vec![Complex::default(); src.len()];
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
    dst
}

/// Phase of `z` in (-pi, pi].
fn phase(z: Complex<f64>) -> f64 {
    let angle = z.im.atan2(z.re);
    // atan2(-0.0, x < 0) yields exactly -pi
    if angle <= -PI {
        PI
    } else {
        angle
    }
}

/// Compute the per-channel 2D DFT of an image.
///
/// Each (H, W) plane is transformed independently and written back to the
/// same channel index of the (H, W, C, 2) output, so channel order matches the
/// input. Coefficients are not scaled by `1 / (H * W)`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the image is not at the operating
/// resolution with three channels.
pub fn to_frequency_domain(image: &Image, mode: FrequencyMode) -> Result<FrequencyTensor> {
    check_shape(image, "image")?;

    let (height, width, channels) = image.dim();
    let plans = Plans::new(height, width, FftDirection::Forward);
    let mut data = Array4::<f64>::zeros((height, width, channels, 2));

    for c in 0..channels {
        let mut buffer: Vec<Complex<f64>> = image
            .index_axis(Axis(2), c)
            .iter()
            .map(|&v| Complex::new(f64::from(v), 0.0))
            .collect();
        plans.apply(&mut buffer, height, width);

        let mut plane = data.index_axis_mut(Axis(2), c);
        for (mut pair, z) in plane.lanes_mut(Axis(2)).into_iter().zip(&buffer) {
            let (first, second) = match mode {
                FrequencyMode::RealImag => (z.re, z.im),
                FrequencyMode::MagPhase => (z.norm(), phase(*z)),
            };
            pair[0] = first;
            pair[1] = second;
        }
    }

    tracing::debug!("Forward transform ({mode}) of {height}x{width}x{channels}");
    FrequencyTensor::new(mode, data)
}

/// Invert a (real, imaginary) spectrum back to an image.
///
/// The imaginary part of the inverse transform is discarded without a
/// tolerance check and the result is clipped to [0, 1].
///
/// # Errors
///
/// Returns [`Error::UnsupportedMode`] for magnitude/phase spectra; convert
/// them with [`FrequencyTensor::to_real_imag`] first.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn from_frequency_domain(freq: &FrequencyTensor) -> Result<Image> {
    if freq.mode() != FrequencyMode::RealImag {
        return Err(Error::UnsupportedMode { mode: freq.mode() });
    }

    let (height, width, channels) = freq.dim();
    let data = freq.view();
    let plans = Plans::new(height, width, FftDirection::Inverse);
    let scale = 1.0 / (height * width) as f64;
    let mut image = Image::zeros((height, width, channels));

    for c in 0..channels {
        let mut buffer: Vec<Complex<f64>> = data
            .index_axis(Axis(2), c)
            .lanes(Axis(2))
            .into_iter()
            .map(|pair| Complex::new(pair[0], pair[1]))
            .collect();
        plans.apply(&mut buffer, height, width);

        let mut plane = image.index_axis_mut(Axis(2), c);
        for (pixel, z) in plane.iter_mut().zip(&buffer) {
            *pixel = clamp_unit((z.re * scale) as f32);
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_image(seed: u64) -> Image {
        let mut rng = StdRng::seed_from_u64(seed);
        Image::from_shape_fn((256, 256, 3), |_| rng.random::<f32>())
    }

    #[test]
    fn test_round_trip() {
        let image = random_image(7);
        let freq = to_frequency_domain(&image, FrequencyMode::RealImag).unwrap();
        let restored = from_frequency_domain(&freq).unwrap();

        let max_err = image
            .iter()
            .zip(restored.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f32, f32::max);
        assert!(max_err < 1e-5, "max error {max_err}");
    }

    #[test]
    fn test_round_trip_through_mag_phase() {
        let image = random_image(11);
        let freq = to_frequency_domain(&image, FrequencyMode::MagPhase).unwrap();
        let restored = from_frequency_domain(&freq.to_real_imag()).unwrap();

        for (a, b) in image.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_inverse_rejects_mag_phase() {
        let image = random_image(3);
        let freq = to_frequency_domain(&image, FrequencyMode::MagPhase).unwrap();

        assert!(matches!(
            from_frequency_domain(&freq),
            Err(Error::UnsupportedMode {
                mode: FrequencyMode::MagPhase
            })
        ));
    }

    #[test]
    fn test_dc_coefficient_is_unnormalized_sum() {
        let image = random_image(5);
        let freq = to_frequency_domain(&image, FrequencyMode::RealImag).unwrap();

        for c in 0..3 {
            let sum: f64 = image
                .index_axis(Axis(2), c)
                .iter()
                .map(|&v| f64::from(v))
                .sum();
            assert!((freq.view()[[0, 0, c, 0]] - sum).abs() < 1e-6);
            assert!(freq.view()[[0, 0, c, 1]].abs() < 1e-6);
        }
    }

    #[test]
    fn test_channel_order_preserved() {
        let mut image = Image::zeros((256, 256, 3));
        image.index_axis_mut(Axis(2), 1).fill(0.25);
        let freq = to_frequency_domain(&image, FrequencyMode::RealImag).unwrap();
        let data = freq.view();

        assert!((data[[0, 0, 1, 0]] - 0.25 * 65536.0).abs() < 1e-6);
        assert!(data.index_axis(Axis(2), 0).iter().all(|v| v.abs() < 1e-9));
        assert!(data.index_axis(Axis(2), 2).iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_phase_range() {
        let image = random_image(13);
        let freq = to_frequency_domain(&image, FrequencyMode::MagPhase).unwrap();
        let data = freq.view();

        for pair in data.lanes(Axis(3)) {
            assert!(pair[0] >= 0.0);
            assert!(pair[1] > -PI && pair[1] <= PI);
        }
    }

    #[test]
    fn test_phase_of_negative_real_axis() {
        assert_eq!(phase(Complex::new(-1.0, -0.0)), PI);
        assert_eq!(phase(Complex::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn test_forward_rejects_wrong_shape() {
        for dims in [(256, 256, 4), (128, 256, 3)] {
            let result = to_frequency_domain(&Image::zeros(dims), FrequencyMode::RealImag);
            assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
        }
    }
}
