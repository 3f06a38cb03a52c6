use std::io::{
    Read,
    Seek,
};

use log::{
    debug,
    warn,
};

use crate::error::{
    DecodeError,
    Result,
};
use crate::header::{
    self,
    FileHeader,
    FILE_HEADER_LEN,
};
use crate::info::{
    self,
    BitMasks,
    Compression,
    HeaderVersion,
    InfoHeader,
};
use crate::limits::Limits;
use crate::palette::{
    self,
    Palette,
};
use crate::pixels::{
    decode_pixels,
    Geometry,
    PixelBuffer,
};
use crate::reader::ByteReader;

/// A decoded bitmap. Rows of the pixel buffer run top to bottom.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Bitmap {
    file: FileHeader,
    info: InfoHeader,
    palette: Option<Palette>,
    pixel_data_offset: u64,
    pixels: PixelBuffer,
}

impl Bitmap {
    pub fn file_header( &self ) -> &FileHeader {
        &self.file
    }

    pub fn info( &self ) -> &InfoHeader {
        &self.info
    }

    pub fn version( &self ) -> HeaderVersion {
        self.info.version()
    }

    pub fn width( &self ) -> u32 {
        self.pixels.width()
    }

    pub fn height( &self ) -> u32 {
        self.pixels.height()
    }

    pub fn bit_count( &self ) -> u16 {
        self.info.core().bit_count
    }

    pub fn compression( &self ) -> Compression {
        self.info.compression()
    }

    pub fn palette( &self ) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Channel masks stored in the header, or the defaults implied by the
    /// bit depth.
    pub fn masks( &self ) -> Option<BitMasks> {
        self.info.masks().copied()
            .or_else( || BitMasks::default_for( self.bit_count() ) )
    }

    /// Offset the pixel array was read from. Differs from the file header
    /// when that declared zero.
    pub fn pixel_data_offset( &self ) -> u64 {
        self.pixel_data_offset
    }

    pub fn pixels( &self ) -> &PixelBuffer {
        &self.pixels
    }

    pub fn into_pixels( self ) -> PixelBuffer {
        self.pixels
    }
}

pub( crate ) fn decode<R: Read + Seek>( input: R, limits: &Limits ) -> Result<Bitmap> {
    let mut input = ByteReader::new( input );

    // Read file header
    let ( file, version ) = header::classify( &mut input )?;

    // Read info header
    let info = info::read_info_header( &mut input, version )?;

    // Resolve the pixel layout before anything gets allocated
    let geometry = Geometry::from_info( &info )?;
    limits.check( geometry.width, geometry.height )?;
    limits.check_memory( geometry.buffer_len() )?;

    // Locate palette and pixel data
    let palette_offset = FILE_HEADER_LEN as u64 + info.encoded_len() as u64;
    let header_end = palette_offset + palette::byte_len( &info )?;

    let pixel_data_offset = match file.pixel_data_offset {
        0 => header_end,
        x if ( x as u64 ) < palette_offset => {
            return Err( DecodeError::InvalidDataOffset { offset: x, header_end: palette_offset } );
        },
        x @ _ => x as u64,
    };

    debug!( "Pixel data at {} (declared {})", pixel_data_offset, file.pixel_data_offset );

    // Read palette
    let palette = palette::read_palette( &mut input, &info, palette_offset, pixel_data_offset )?;

    // Read pixel data
    let pixels = decode_pixels( &mut input, &geometry, pixel_data_offset )?;

    let stream_len = input.stream_len()?;
    if file.file_size != 0 && file.file_size as u64 != stream_len {
        warn!( "Declared file size {} differs from stream length {}", file.file_size, stream_len );
    }

    Ok( Bitmap {
        file,
        info,
        palette,
        pixel_data_offset,
        pixels,
    } )
}
