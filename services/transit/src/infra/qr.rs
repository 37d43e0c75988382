use anyhow::Context as _;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::domain::repository::QrRenderer;
use crate::error::TransitError;

/// Minimum rendered edge, in SVG user units.
const MIN_DIMENSION: u32 = 256;

/// Renders payloads as black-on-white SVG QR codes (error correction level M).
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgQrRenderer;

impl QrRenderer for SvgQrRenderer {
    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn render(&self, payload: &str) -> Result<Vec<u8>, TransitError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .context("encode QR payload")?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(image.into_bytes())
    }
}
