//! QR rendering seam.
//!
//! Rasterization is delegated to a [`QrRenderer`]; this crate only decides
//! what string is encoded and with which options.

use crate::wire::serialize;
use serde::{Deserialize, Serialize};
use sigkit_types::PaymentPayload;
use thiserror::Error;

/// Errors that can occur while rendering a QR code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QrError {
	#[error("Invalid QR options: {0}")]
	InvalidOptions(String),
	#[error("QR rendering failed: {0}")]
	Render(String),
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
	L,
	#[default]
	M,
	Q,
	H,
}

/// Rendering options passed to a [`QrRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
	/// Image width in pixels.
	pub width: u32,
	/// Quiet zone in modules.
	pub margin: u32,
	pub error_correction: ErrorCorrectionLevel,
	/// `#RRGGBB` colour of dark modules.
	pub dark: String,
	/// `#RRGGBB` colour of light modules.
	pub light: String,
}

impl Default for QrOptions {
	fn default() -> Self {
		Self {
			width: 256,
			margin: 2,
			error_correction: ErrorCorrectionLevel::M,
			dark: "#000000".to_string(),
			light: "#FFFFFF".to_string(),
		}
	}
}

impl QrOptions {
	/// Smaller image for mobile screens.
	pub fn mobile() -> Self {
		Self {
			width: 200,
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<(), QrError> {
		if self.width == 0 {
			return Err(QrError::InvalidOptions("width must be positive".to_string()));
		}
		for (name, colour) in [("dark", &self.dark), ("light", &self.light)] {
			let valid = colour.len() == 7
				&& colour.starts_with('#')
				&& colour[1..].chars().all(|c| c.is_ascii_hexdigit());
			if !valid {
				return Err(QrError::InvalidOptions(format!(
					"{} colour '{}' is not #RRGGBB",
					name, colour
				)));
			}
		}
		Ok(())
	}
}

/// Turns a string into an encoded image.
pub trait QrRenderer: Send + Sync {
	fn render(&self, data: &str, options: &QrOptions) -> Result<Vec<u8>, QrError>;
}

/// Serializes `payload` and renders it with `renderer`.
pub fn render_payment_qr(
	renderer: &dyn QrRenderer,
	payload: &PaymentPayload,
	options: &QrOptions,
) -> Result<Vec<u8>, QrError> {
	options.validate()?;
	let data = serialize(payload).map_err(|e| QrError::Render(e.to_string()))?;
	tracing::debug!(bytes = data.len(), width = options.width, "Rendering payment QR");
	renderer.render(&data, options)
}
