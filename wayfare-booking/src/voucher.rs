//! Booking voucher documents: a fixed-layout A4 PDF with the booking details
//! and a QR code deep-linking back to the booking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::BookingDetail;
use crate::qr::{self, QrEncodeError, QrOptions};
use crate::repository::BookingRepository;
use wayfare_core::StoreError;

#[derive(Debug, Clone)]
pub struct VoucherConfig {
    /// Storefront base URL the QR deep link points at.
    pub frontend_base_url: String,
    /// Directory persisted vouchers are written to.
    pub output_dir: PathBuf,
    /// Public URL prefix mapped onto `output_dir` by the static file layer.
    pub public_prefix: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VoucherError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Qr(#[from] QrEncodeError),
    #[error("document assembly failed: {0}")]
    Document(String),
    #[error("voucher I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Produces voucher PDFs from booking read projections.
pub struct VoucherProducer {
    bookings: Arc<dyn BookingRepository>,
    pub config: VoucherConfig,
}

impl VoucherProducer {
    pub fn new(bookings: Arc<dyn BookingRepository>, config: VoucherConfig) -> Self {
        Self { bookings, config }
    }

    pub fn booking_url(&self, booking_id: Uuid) -> String {
        format!(
            "{}/booking/{}",
            self.config.frontend_base_url.trim_end_matches('/'),
            booking_id
        )
    }

    /// Render the voucher for a booking into a PDF byte buffer.
    ///
    /// The QR image is encoded first and the document finalized only once its
    /// bytes are embedded; a QR failure fails the whole operation.
    pub async fn generate(&self, booking_id: Uuid) -> Result<Vec<u8>, VoucherError> {
        let detail = self
            .bookings
            .find_detail(booking_id)
            .await?
            .ok_or(VoucherError::NotFound(booking_id))?;

        let url = self.booking_url(booking_id);
        let qr_png = qr::encode_png(url.clone(), QrOptions::default()).await?;

        let generated_at = Utc::now();
        let bytes = tokio::task::spawn_blocking(move || {
            render_document(&detail, &qr_png, &url, generated_at)
        })
        .await
        .map_err(|e| VoucherError::Document(format!("render task failed: {e}")))??;

        Ok(bytes)
    }

    /// Generate and write the voucher to disk, record its public path on the
    /// booking, and clean up the previously persisted file (best effort).
    /// Returns the public relative path.
    pub async fn persist(&self, booking_id: Uuid) -> Result<String, VoucherError> {
        let bytes = self.generate(booking_id).await?;

        fs::create_dir_all(&self.config.output_dir).await?;
        let filename = format!(
            "booking-{}-{}.pdf",
            booking_id,
            Utc::now().timestamp_millis()
        );
        let target = self.config.output_dir.join(&filename);
        fs::write(&target, &bytes).await?;

        let public_path = format!(
            "{}/{}",
            self.config.public_prefix.trim_end_matches('/'),
            filename
        );
        let previous = self
            .bookings
            .set_voucher_path(booking_id, &public_path)
            .await?;

        if let Some(previous) = previous {
            if previous != public_path {
                self.remove_persisted(&previous).await;
            }
        }

        info!(%booking_id, path = %public_path, "voucher persisted");
        Ok(public_path)
    }

    /// Read back a previously persisted voucher, if its file still exists.
    pub async fn load_persisted(&self, public_path: &str) -> Option<Vec<u8>> {
        let local = self.local_path(public_path)?;
        fs::read(&local).await.ok()
    }

    async fn remove_persisted(&self, public_path: &str) {
        let Some(local) = self.local_path(public_path) else {
            return;
        };
        match fs::remove_file(&local).await {
            Ok(()) => debug!(path = %public_path, "superseded voucher removed"),
            Err(e) => warn!(path = %public_path, error = %e, "could not remove superseded voucher"),
        }
    }

    pub fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let filename = Path::new(public_path).file_name()?;
        Some(self.config.output_dir.join(filename))
    }
}

/// The text block of the voucher, in render order. Zero-count party
/// categories are omitted; adults are always present.
fn body_lines(detail: &BookingDetail) -> Vec<String> {
    let booking = &detail.booking;
    let mut lines = vec![
        format!("Tour: {}", detail.tour.title),
        format!("Package: {} ({})", detail.package.name, detail.package.language),
        format!("Date: {}", booking.tour_date.format("%d %b %Y")),
        format!("Adults: {}", booking.adults),
    ];
    if booking.children > 0 {
        lines.push(format!("Children: {}", booking.children));
    }
    if booking.infants > 0 {
        lines.push(format!("Infants: {}", booking.infants));
    }
    lines.push(format!("Total: {} {:.2}", booking.currency, booking.total));
    lines
}

fn render_document(
    detail: &BookingDetail,
    qr_png: &[u8],
    url: &str,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, VoucherError> {
    let (doc, page, layer) = PdfDocument::new("Booking Voucher", Mm(210.0), Mm(297.0), "voucher");
    let layer = doc.get_page(page).get_layer(layer);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| VoucherError::Document(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| VoucherError::Document(e.to_string()))?;

    layer.use_text("Booking Voucher", 22.0, Mm(20.0), Mm(270.0), &bold);
    layer.use_text(
        format!("Reference: {}", detail.booking.reference),
        12.0,
        Mm(20.0),
        Mm(258.0),
        &regular,
    );

    let mut y = 244.0;
    for line in body_lines(detail) {
        layer.use_text(line, 11.0, Mm(20.0), Mm(y), &regular);
        y -= 7.0;
    }

    let decoded = printpdf::image_crate::load_from_memory(qr_png)
        .map_err(|e| VoucherError::Document(format!("qr image decode failed: {e}")))?;
    let qr_image = Image::from_dynamic_image(&decoded);
    // 240px at 300dpi is roughly a 20mm square.
    let qr_top = y - 26.0;
    qr_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(20.0)),
            translate_y: Some(Mm(qr_top)),
            dpi: Some(300.0),
            ..Default::default()
        },
    );
    layer.use_text(url.to_string(), 9.0, Mm(20.0), Mm(qr_top - 5.0), &regular);

    layer.use_text(
        format!("Generated at {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        8.0,
        Mm(20.0),
        Mm(14.0),
        &regular,
    );

    doc.save_to_bytes()
        .map_err(|e| VoucherError::Document(e.to_string()))
}
