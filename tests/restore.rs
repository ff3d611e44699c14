//! End-to-end restoration scenarios.

use derain::frequency::{from_frequency_domain, to_frequency_domain};
use derain::image::{decode_u8, Image, RainMap};
use derain::model::ZeroRainEstimator;
use derain::pipeline::{
    blend_luminance, brightness_channel, composite, enhance_contrast, sharpen,
};
use derain::{restore, Error, FrequencyMode, FrequencyTensor, RestoreConfig};

fn assert_close(actual: &Image, expected: &Image, tolerance: f32) {
    assert_eq!(actual.dim(), expected.dim());
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() <= tolerance, "{a} vs {e}");
    }
}

#[test]
fn mid_gray_without_rain_is_unchanged() {
    let gray = Image::from_elem((256, 256, 3), 0.5);
    let no_rain =
        |f: &FrequencyTensor| -> derain::Result<RainMap> { Ok(RainMap::zeros(f.dim())) };

    for config in [
        RestoreConfig::default(),
        RestoreConfig {
            blend_luminance: false,
            ..RestoreConfig::default()
        },
    ] {
        let restored = restore(&gray, &no_rain, &config).unwrap();
        assert_close(&restored, &gray, 1.0 / 255.0);
    }
}

#[test]
fn uniform_rain_is_removed() {
    let clean = Image::from_elem((256, 256, 3), decode_u8(90));
    let rainy = clean.mapv(|v| v + decode_u8(60));
    let estimate = |f: &FrequencyTensor| -> derain::Result<RainMap> {
        Ok(RainMap::from_elem(f.dim(), decode_u8(60)))
    };
    let config = RestoreConfig {
        blend_luminance: false,
        ..RestoreConfig::default()
    };

    let restored = restore(&rainy, &estimate, &config).unwrap();
    assert_close(&restored, &clean, 1.0 / 255.0);
}

#[test]
fn blended_output_keeps_source_brightness() {
    let rainy = Image::from_shape_fn((256, 256, 3), |(y, x, c)| {
        let streak = if (x + 2 * y) % 23 == 0 { 0.1 } else { 0.0 };
        let base = [0.35, 0.45, 0.55][c] + 0.1 * ((x / 32 + y / 32) % 2) as f32;
        base + streak
    });
    let darkening = |f: &FrequencyTensor| -> derain::Result<RainMap> {
        Ok(RainMap::from_elem(f.dim(), 0.1))
    };

    let restored = restore(&rainy, &darkening, &RestoreConfig::default()).unwrap();

    let mean = |plane: ndarray::Array2<u8>| {
        plane.iter().map(|&v| f64::from(v)).sum::<f64>() / plane.len() as f64
    };
    let expected = mean(brightness_channel(&rainy).unwrap());
    let actual = mean(brightness_channel(&restored).unwrap());
    assert!((expected - actual).abs() <= 1.0, "{expected} vs {actual}");
}

#[test]
fn every_stage_rejects_wrong_shapes() {
    let good = Image::zeros((256, 256, 3));

    for dims in [(256, 256, 4), (128, 256, 3)] {
        let bad = Image::zeros(dims);

        assert!(matches!(
            to_frequency_domain(&bad, FrequencyMode::RealImag),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(composite(&bad, &good), Err(Error::ShapeMismatch { .. })));
        assert!(matches!(composite(&good, &bad), Err(Error::ShapeMismatch { .. })));
        assert!(matches!(sharpen(&bad), Err(Error::ShapeMismatch { .. })));
        assert!(matches!(
            blend_luminance(&good, &bad),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(enhance_contrast(&bad), Err(Error::ShapeMismatch { .. })));
        assert!(matches!(
            restore(&bad, &ZeroRainEstimator, &RestoreConfig::default()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    assert!(matches!(
        FrequencyTensor::new(FrequencyMode::RealImag, ndarray::Array4::zeros((128, 256, 3, 2))),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn mode_errors() {
    assert!(matches!(
        "bogus".parse::<FrequencyMode>(),
        Err(Error::InvalidMode { .. })
    ));

    let freq = to_frequency_domain(&Image::zeros((256, 256, 3)), FrequencyMode::MagPhase).unwrap();
    assert!(matches!(
        from_frequency_domain(&freq),
        Err(Error::UnsupportedMode { .. })
    ));
}
