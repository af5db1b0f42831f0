//! Advisory quality heuristics
//!
//! Brightness is the mean of per-pixel luma (`0.299R + 0.587G + 0.114B`) and
//! contrast its population standard deviation. The verdict and the
//! recommendations use different thresholds; a report can fail the verdict
//! while still saying the quality looks good, and vice versa.

use bloodclan_core::{QualityReport, UploadedImage};
use image::RgbaImage;

use super::processor::{decode_rgba, QualityError};

// Verdict thresholds
const MIN_SIDE: u32 = 200;
const MIN_PIXELS: u64 = 40_000;
const MIN_BRIGHTNESS: f64 = 30.0;
const MAX_BRIGHTNESS: f64 = 220.0;
const MIN_CONTRAST: f64 = 20.0;

// Recommendation thresholds
const RECOMMENDED_SIDE: u32 = 300;
const DARK_BELOW: f64 = 50.0;
const BRIGHT_ABOVE: f64 = 200.0;
const LOW_CONTRAST_BELOW: f64 = 20.0;

/// Mean and population standard deviation of luma over an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl LumaStats {
    pub fn of(img: &RgbaImage) -> Self {
        let count = (img.width() as u64 * img.height() as u64) as f64;
        if count == 0.0 {
            return LumaStats {
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let mean = img.pixels().map(|p| luma(p.0)).sum::<f64>() / count;
        let variance = img
            .pixels()
            .map(|p| {
                let d = luma(p.0) - mean;
                d * d
            })
            .sum::<f64>()
            / count;

        LumaStats {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

fn luma([r, g, b, _]: [u8; 4]) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

pub fn is_good_quality(width: u32, height: u32, brightness: f64, contrast: f64) -> bool {
    width >= MIN_SIDE
        && height >= MIN_SIDE
        && (width as u64 * height as u64) >= MIN_PIXELS
        && (MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness)
        && contrast >= MIN_CONTRAST
}

/// Suggestions in priority order: resolution, exposure, contrast. Never empty.
pub fn quality_recommendations(
    width: u32,
    height: u32,
    brightness: f64,
    contrast: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if width < RECOMMENDED_SIDE || height < RECOMMENDED_SIDE {
        recommendations.push(format!(
            "Use a higher resolution image (at least {0}x{0} pixels)",
            RECOMMENDED_SIDE
        ));
    }

    if brightness < DARK_BELOW {
        recommendations.push("Image is too dark - ensure good lighting".to_string());
    } else if brightness > BRIGHT_ABOVE {
        recommendations.push("Image is too bright - reduce lighting or exposure".to_string());
    }

    if contrast < LOW_CONTRAST_BELOW {
        recommendations
            .push("Image lacks contrast - ensure clear fingerprint definition".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Image quality looks good for analysis".to_string());
    }

    recommendations
}

/// Decode and assess raw image bytes on the current thread.
pub fn assess_bytes(data: &[u8]) -> Result<QualityReport, QualityError> {
    let img = decode_rgba(data)?;
    let (width, height) = img.dimensions();
    let stats = LumaStats::of(&img);

    let aspect_ratio = if height == 0 {
        0.0
    } else {
        width as f64 / height as f64
    };

    Ok(QualityReport {
        width,
        height,
        brightness: stats.mean,
        contrast: stats.std_dev,
        aspect_ratio,
        file_size: data.len(),
        is_good_quality: is_good_quality(width, height, stats.mean, stats.std_dev),
        recommendations: quality_recommendations(width, height, stats.mean, stats.std_dev),
    })
}

/// Assess an uploaded image on the blocking pool.
pub async fn assess(image: &UploadedImage) -> Result<QualityReport, QualityError> {
    let data = image.data.clone();
    let report = tokio::task::spawn_blocking(move || assess_bytes(&data))
        .await
        .map_err(|e| QualityError::Worker(e.to_string()))??;

    tracing::debug!(
        width = report.width,
        height = report.height,
        brightness = report.brightness,
        contrast = report.contrast,
        good = report.is_good_quality,
        "Quality assessment complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn checkerboard(size: u32, a: u8, b: u8) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let v = if (x + y) % 2 == 0 { a } else { b };
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_luma_weights() {
        assert!((luma([255, 0, 0, 255]) - 76.245).abs() < 1e-9);
        assert!((luma([0, 255, 0, 255]) - 149.685).abs() < 1e-9);
        assert!((luma([0, 0, 255, 255]) - 29.07).abs() < 1e-9);
    }

    #[test]
    fn test_checkerboard_stats() {
        let stats = LumaStats::of(&checkerboard(10, 80, 180));
        assert!((stats.mean - 130.0).abs() < 1e-6);
        assert!((stats.std_dev - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_good_image_passes() {
        let report = assess_bytes(&png(&checkerboard(400, 80, 180))).unwrap();
        assert_eq!((report.width, report.height), (400, 400));
        assert!(report.is_good_quality);
        assert_eq!(report.aspect_ratio, 1.0);
        assert_eq!(
            report.recommendations,
            vec!["Image quality looks good for analysis".to_string()]
        );
    }

    #[test]
    fn test_all_white_fails() {
        let img = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
        let report = assess_bytes(&png(&img)).unwrap();
        assert!(report.brightness > 220.0);
        assert!(!report.is_good_quality);
        assert_eq!(
            report.primary_recommendation(),
            Some("Image is too bright - reduce lighting or exposure")
        );
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("lacks contrast")));
    }

    #[test]
    fn test_small_image_always_fails() {
        let report = assess_bytes(&png(&checkerboard(150, 80, 180))).unwrap();
        assert!(!report.is_good_quality);
        assert_eq!(
            report.primary_recommendation(),
            Some("Use a higher resolution image (at least 300x300 pixels)")
        );
    }

    #[test]
    fn test_dark_image() {
        let report = assess_bytes(&png(&checkerboard(300, 0, 50))).unwrap();
        assert!(report.brightness < 30.0);
        assert!(!report.is_good_quality);
        assert_eq!(
            report.recommendations,
            vec!["Image is too dark - ensure good lighting".to_string()]
        );
    }

    #[test]
    fn test_verdict_boundaries() {
        assert!(is_good_quality(200, 200, 30.0, 20.0));
        assert!(is_good_quality(200, 200, 220.0, 20.0));
        assert!(!is_good_quality(199, 400, 100.0, 50.0));
        assert!(!is_good_quality(200, 200, 29.9, 50.0));
        assert!(!is_good_quality(200, 200, 100.0, 19.9));
    }

    #[test]
    fn test_recommendation_order() {
        let recs = quality_recommendations(100, 100, 10.0, 5.0);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].starts_with("Use a higher resolution"));
        assert!(recs[1].contains("too dark"));
        assert!(recs[2].contains("lacks contrast"));
    }

    #[test]
    fn test_assess_is_deterministic() {
        let data = png(&checkerboard(250, 40, 200));
        assert_eq!(assess_bytes(&data).unwrap(), assess_bytes(&data).unwrap());
    }

    #[tokio::test]
    async fn test_assess_on_blocking_pool() {
        let data = png(&checkerboard(320, 80, 180));
        let size = data.len();
        let image = UploadedImage::new(data, "image/png");

        let report = assess(&image).await.unwrap();
        assert_eq!(report.file_size, size);
        assert!(report.is_good_quality);
    }

    #[tokio::test]
    async fn test_assess_decode_failure() {
        let image = UploadedImage::new(vec![0u8; 2048], "image/png");
        assert!(matches!(
            assess(&image).await,
            Err(QualityError::Decode(_))
        ));
    }
}
