//! QR Code (Model 2, versions 1 to 40) generator. Builds the module matrix
//! for a textual value and renders it as text or SVG.
//!
//! ```
//! use qrgrid::{ECLevel, QRBuilder};
//!
//! let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::M).build().unwrap();
//! assert_eq!(qr.width(), 21);
//! println!("{}", qr.to_printable());
//! ```

pub mod builder;
mod common;

pub use builder::{QRBuilder, QRCode};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Module, Version};
