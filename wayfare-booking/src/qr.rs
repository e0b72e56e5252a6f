//! QR encoding for voucher deep links.
//!
//! Produces PNG bytes so the document layer stays decoupled from the QR
//! renderer. Encoding is CPU-bound and runs on the blocking pool.

use std::io::Cursor;

use image::Luma;
use qrcode::{EcLevel, QrCode};

#[derive(Debug, Clone)]
pub struct QrOptions {
    pub ec_level: EcLevel,
    pub min_size: u32,
    pub quiet_zone: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
            min_size: 240,
            quiet_zone: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QrEncodeError {
    #[error("qr encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("png encoding failed: {0}")]
    Png(#[from] image::ImageError),
    #[error("qr encoding task failed: {0}")]
    Task(String),
}

/// Encode `data` as a PNG QR image.
pub async fn encode_png(data: String, options: QrOptions) -> Result<Vec<u8>, QrEncodeError> {
    tokio::task::spawn_blocking(move || encode_png_blocking(&data, &options))
        .await
        .map_err(|e| QrEncodeError::Task(e.to_string()))?
}

fn encode_png_blocking(data: &str, options: &QrOptions) -> Result<Vec<u8>, QrEncodeError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), options.ec_level)?;
    let rendered = code
        .render::<Luma<u8>>()
        .min_dimensions(options.min_size, options.min_size)
        .quiet_zone(options.quiet_zone)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(rendered)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}
