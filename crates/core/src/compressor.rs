//! Image downscaling and JPEG recompression under a byte budget
//!
//! Settings documents embed their photos as data URLs, so every image is
//! measured by the length of its `data:image/jpeg;base64,...` form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{ImageField, Settings};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Result of one compression run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    /// JPEG quality in percent of the returned encoding
    pub quality: u8,
}

impl CompressedImage {
    /// Size counted against budgets and the settings ceiling
    pub fn encoded_len(&self) -> usize {
        self.data_url.len()
    }
}

/// Fields rewritten by [`ImageBudgetCompressor::recompress_if_oversized`]
#[derive(Debug)]
pub struct RecompressOutcome {
    pub settings: Settings,
    pub recompressed: Vec<ImageField>,
    /// Fields left untouched because their stored encoding could not be decoded
    pub failures: Vec<(ImageField, Error)>,
}

impl RecompressOutcome {
    pub fn changed(&self) -> bool {
        !self.recompressed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageBudgetCompressor {
    pub max_dimension: u32,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
}

impl Default for ImageBudgetCompressor {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            initial_quality: 80,
            min_quality: 10,
            quality_step: 10,
        }
    }
}

impl ImageBudgetCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, downscale and re-encode until the data URL fits `max_size` bytes.
    ///
    /// Never fails for budget reasons: when even the lowest quality is too
    /// large, that encoding is returned anyway.
    #[instrument(skip(self, bytes), fields(input_bytes = bytes.len()))]
    pub fn compress(&self, bytes: &[u8], max_size: usize) -> Result<CompressedImage> {
        let decoded = image::load_from_memory(bytes)?;
        let scaled = self.downscale(decoded);
        let rgb = scaled.to_rgb8();

        let mut quality = self.initial_quality;
        let mut data_url = encode_jpeg(&rgb, quality)?;

        while data_url.len() > max_size && quality > self.min_quality {
            quality = quality
                .saturating_sub(self.quality_step)
                .max(self.min_quality);
            data_url = encode_jpeg(&rgb, quality)?;
            debug!(quality, size = data_url.len(), "Re-encoded at lower quality");
        }

        if data_url.len() > max_size {
            warn!(
                size = data_url.len(),
                max_size, "Image still over budget at minimum quality"
            );
        }

        Ok(CompressedImage {
            data_url,
            width: rgb.width(),
            height: rgb.height(),
            quality,
        })
    }

    /// Compress an upload against the budget of the slot it is going into
    pub fn compress_for(&self, bytes: &[u8], field: ImageField) -> Result<CompressedImage> {
        self.compress(bytes, field.budget_bytes())
    }

    /// Re-run the pipeline on a stored data URL only when it exceeds `threshold`
    pub fn recompress_field_if_oversized(
        &self,
        encoded: &str,
        threshold: usize,
    ) -> Result<Option<CompressedImage>> {
        if encoded.is_empty() || encoded.len() <= threshold {
            return Ok(None);
        }
        let bytes = decode_data_url(encoded)?;
        self.compress(&bytes, threshold).map(Some)
    }

    /// Shrink every oversized image of a settings document.
    ///
    /// Returns an updated copy; persisting it is up to the caller.
    pub fn recompress_if_oversized(&self, settings: &Settings) -> RecompressOutcome {
        let mut outcome = RecompressOutcome {
            settings: settings.clone(),
            recompressed: Vec::new(),
            failures: Vec::new(),
        };

        for field in ImageField::ALL {
            let stored = settings.image(field);
            match self.recompress_field_if_oversized(stored, field.budget_bytes()) {
                Ok(Some(image)) => {
                    debug!(
                        %field,
                        before = stored.len(),
                        after = image.encoded_len(),
                        "Recompressed oversized image"
                    );
                    outcome.settings.set_image(field, image.data_url);
                    outcome.recompressed.push(field);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%field, error = %e, "Keeping stored image that failed to decode");
                    outcome.failures.push((field, e));
                }
            }
        }

        outcome
    }

    fn downscale(&self, image: DynamicImage) -> DynamicImage {
        if image.width() <= self.max_dimension && image.height() <= self.max_dimension {
            return image;
        }
        image.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
    }
}

fn encode_jpeg(rgb: &image::RgbImage, quality: u8) -> Result<String> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(rgb)?;
    Ok(format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(&buf)))
}

/// Raw bytes of a base64 data URL
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| Error::ImageDecode("not a data URL".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(Error::ImageDecode(
            "data URL is not base64 encoded".to_string(),
        ));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::ImageDecode(e.to_string()))
}
