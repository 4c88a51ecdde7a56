pub mod manifest;
pub mod raw;

pub use manifest::*;
pub use raw::{RawContainer, RawHousebill, RawManifestDocument, RawMasterbill, RawPiece, UNKNOWN_ULD};
