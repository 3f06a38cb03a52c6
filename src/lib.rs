//! # multibmp
//!
//! A decoder for the successive generations of Microsoft *bmp* files.
//!
//! The info header size selects the layout: Windows 2.x (12 bytes), 3.x
//! (40 bytes, with the NT bit mask extension), 4.x (108 bytes) and 5.x
//! (124 bytes). Uncompressed and bitfield pixel arrays of 8, 16, 24 and
//! 32 bits per pixel are decoded into a buffer of unpadded rows, top row
//! first. Formats that are recognized but not decoded (Windows 1.x device
//! dependent bitmaps, 5.x headers, RLE compression, sub-byte depths) are
//! reported as errors for which [`DecodeError::is_unsupported`] is true.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::fs::File;
//!
//! fn main() -> multibmp::Result<()> {
//!     let file = File::open( "image.bmp" )?;
//!     let bitmap = multibmp::decode( file )?;
//!
//!     for row in bitmap.pixels().rows() {
//!         // Each row holds width * bytes_per_pixel bytes in file channel order
//!         let _ = row;
//!     }
//!     Ok( () )
//! }
//! ```
//!
mod bitmap;
mod error;
mod header;
mod info;
mod limits;
mod palette;
mod pixels;
mod reader;

use std::io::{
    Read,
    Seek,
};

pub use crate::bitmap::Bitmap;
pub use crate::error::{
    DecodeError,
    Result,
};
pub use crate::header::{
    DdbHeader,
    FileHeader,
    BMP_MAGIC,
    DDB_HEADER_LEN,
    DDB_MAGIC,
    FILE_HEADER_LEN,
};
pub use crate::info::{
    BitMasks,
    Compression,
    CoreHeader,
    HeaderVersion,
    InfoHeader,
    InfoV3,
    InfoV4,
};
pub use crate::limits::Limits;
pub use crate::palette::{
    Palette,
    PaletteEntry,
};
pub use crate::pixels::{
    PixelBuffer,
    RowOrder,
};

/// Decodes a bitmap from a seekable stream without resource limits.
pub fn decode<R: Read + Seek>( input: R ) -> Result<Bitmap> {
    bitmap::decode( input, &Limits::default() )
}

/// Decodes a bitmap, failing with [`DecodeError::LimitExceeded`] before
/// allocating pixels for an image larger than `limits` allow.
pub fn decode_with_limits<R: Read + Seek>( input: R, limits: &Limits ) -> Result<Bitmap> {
    bitmap::decode( input, limits )
}
