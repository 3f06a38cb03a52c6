//! Pixel array decoding.
//!
//! Rows are stored on disk padded to a multiple of four bytes. The decoded
//! buffer drops that padding and always lists rows top to bottom, whatever
//! order the file used.

use std::io::{
    Read,
    Seek,
};

use log::debug;

use crate::error::{
    invalid_geometry,
    DecodeError,
    Result,
};
use crate::info::{
    Compression,
    InfoHeader,
};
use crate::reader::ByteReader;

/// Order in which rows were stored in the source file.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum RowOrder {
    /// Positive height, last row first.
    BottomUp,
    /// Negative height, first row first.
    TopDown,
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: usize,
    /// Bytes of pixel data in one row.
    pub row_len: usize,
    /// Bytes one row occupies on disk, padding included.
    pub stride: usize,
    pub order: RowOrder,
}

impl Geometry {
    pub fn new( width: i32, height: i32, bit_count: u16 ) -> Result<Geometry> {
        let bytes_per_pixel = match bit_count {
            8 | 16 | 24 | 32 => ( bit_count / 8 ) as usize,
            x @ _ => return Err( DecodeError::UnsupportedBitDepth( x ) ),
        };

        if width <= 0 {
            return Err( invalid_geometry( format!( "width {}", width ) ) );
        }

        let order = match height {
            0 => return Err( invalid_geometry( "height 0" ) ),
            h if h > 0 => RowOrder::BottomUp,
            _ => RowOrder::TopDown,
        };
        let abs_height = height.checked_abs()
            .ok_or_else( || invalid_geometry( format!( "height {}", height ) ) )?;

        let overflow = || invalid_geometry( format!(
            "{}x{} at {}-bit overflows the addressable size", width, height, bit_count ) );

        // Nothing larger than isize::MAX bytes can be addressed or allocated.
        let max = isize::MAX as usize;

        let row_len = ( width as usize ).checked_mul( bytes_per_pixel ).ok_or_else( overflow )?;
        let stride = row_len.checked_add( 3 ).ok_or_else( overflow )? & !3;
        let file_len = stride.checked_mul( abs_height as usize ).ok_or_else( overflow )?;

        if stride > max || file_len > max {
            return Err( overflow() );
        }

        Ok( Geometry {
            width: width as u32,
            height: abs_height as u32,
            bytes_per_pixel,
            row_len,
            stride,
            order,
        } )
    }

    /// Resolves the geometry of an info header whose pixels this crate can
    /// decode. Compression is dispatched before the bit depth is checked.
    pub fn from_info( info: &InfoHeader ) -> Result<Geometry> {
        match info.compression() {
            Compression::None => {},
            Compression::Bitfields => debug!( "Bitfields pixels are read uncompressed" ),
            x @ _ => return Err( DecodeError::UnsupportedCompression( x ) ),
        }

        let core = info.core();
        Geometry::new( core.width, core.height, core.bit_count )
    }

    pub fn padding( &self ) -> usize {
        self.stride - self.row_len
    }

    /// Length of the decoded buffer.
    pub fn buffer_len( &self ) -> usize {
        self.row_len * self.height as usize
    }

    /// Length of the pixel array on disk.
    pub fn file_len( &self ) -> u64 {
        self.stride as u64 * self.height as u64
    }
}

#[derive( Debug, PartialEq, Eq, Clone )]
pub struct PixelBuffer {
    geometry: Geometry,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn width( &self ) -> u32 {
        self.geometry.width
    }

    pub fn height( &self ) -> u32 {
        self.geometry.height
    }

    pub fn bytes_per_pixel( &self ) -> usize {
        self.geometry.bytes_per_pixel
    }

    pub fn row_len( &self ) -> usize {
        self.geometry.row_len
    }

    pub fn stride( &self ) -> usize {
        self.geometry.stride
    }

    pub fn source_order( &self ) -> RowOrder {
        self.geometry.order
    }

    /// Row `y`, counted from the top of the image.
    pub fn row( &self, y: u32 ) -> Option<&[u8]> {
        if y >= self.geometry.height {
            return None;
        }

        let start = y as usize * self.geometry.row_len;
        Some( &self.data[ start .. start + self.geometry.row_len ] )
    }

    /// Raw bytes of the pixel at `x`, `y` in file channel order.
    pub fn pixel( &self, x: u32, y: u32 ) -> Option<&[u8]> {
        if x >= self.geometry.width {
            return None;
        }

        let bpp = self.geometry.bytes_per_pixel;
        let start = x as usize * bpp;
        self.row( y ).map( |row| &row[ start .. start + bpp ] )
    }

    pub fn rows( &self ) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact( self.geometry.row_len )
    }

    pub fn as_bytes( &self ) -> &[u8] {
        &self.data
    }

    pub fn into_vec( self ) -> Vec<u8> {
        self.data
    }
}

/// Seeks to `offset` and reads an uncompressed pixel array.
pub fn decode_pixels<R: Read + Seek>( input: &mut ByteReader<R>, geometry: &Geometry, offset: u64 )
    -> Result<PixelBuffer> {

    let end = offset.checked_add( geometry.file_len() )
        .ok_or_else( || invalid_geometry( "pixel array ends past the addressable size" ) )?;
    if end > input.stream_len()? {
        return Err( DecodeError::TruncatedInput );
    }

    input.seek_to( offset )?;

    let width = geometry.row_len;
    let height = geometry.height as usize;
    let padding = geometry.padding() as u64;
    let mut data = vec![0; geometry.buffer_len()];

    for y in 0..height {
        let row = match geometry.order {
            RowOrder::BottomUp => height - y - 1,
            RowOrder::TopDown => y,
        };

        input.read_exact( &mut data[ row * width .. ( row + 1 ) * width ] )?;
        input.skip( padding )?;
    }

    debug!( "Read {} rows of {} bytes ({} padding) from {}",
        height, width, geometry.padding(), offset );

    Ok( PixelBuffer {
        geometry: *geometry,
        data,
    } )
}

#[cfg( test )]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stride_is_dword_aligned() {
        for height in &[ 1, 2, 7, -3 ] {
            let geometry = Geometry::new( 3, *height, 24 ).unwrap();
            assert_eq!( geometry.row_len, 9 );
            assert_eq!( geometry.stride, 12 );
            assert_eq!( geometry.padding(), 3 );
        }

        assert_eq!( Geometry::new( 4, 1, 24 ).unwrap().stride, 12 );
        assert_eq!( Geometry::new( 1, 1, 8 ).unwrap().stride, 4 );
        assert_eq!( Geometry::new( 3, 1, 16 ).unwrap().stride, 8 );
        assert_eq!( Geometry::new( 5, 1, 32 ).unwrap().padding(), 0 );
    }

    #[test]
    fn height_sign_selects_order() {
        assert_eq!( Geometry::new( 1, 2, 8 ).unwrap().order, RowOrder::BottomUp );
        assert_eq!( Geometry::new( 1, -2, 8 ).unwrap().order, RowOrder::TopDown );
        assert_eq!( Geometry::new( 1, -2, 8 ).unwrap().height, 2 );
    }

    #[test]
    fn sub_byte_and_odd_depths_are_unsupported() {
        for bits in &[ 0u16, 1, 2, 4, 12, 48 ] {
            match Geometry::new( 4, 4, *bits ) {
                Err( DecodeError::UnsupportedBitDepth( x ) ) => assert_eq!( x, *bits ),
                other => panic!( "unexpected {:?}", other ),
            }
        }
    }

    #[test]
    fn invalid_dimensions() {
        assert!( matches!( Geometry::new( 0, 1, 24 ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
        assert!( matches!( Geometry::new( -4, 1, 24 ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
        assert!( matches!( Geometry::new( 4, 0, 24 ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
        assert!( matches!( Geometry::new( 4, i32::MIN, 24 ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
    }

    #[test]
    fn unaddressable_images_are_invalid() {
        assert!( matches!(
            Geometry::new( i32::MAX, i32::MAX, 32 ),
            Err( DecodeError::InvalidGeometry( _ ) ) ) );
    }

    #[cfg( target_pointer_width = "64" )]
    #[test]
    fn large_addressable_images_fail_before_allocating() {
        let geometry = Geometry::new( 65536, 65536, 32 ).unwrap();
        assert_eq!( geometry.file_len(), 1 << 34 );
        let mut input = ByteReader::new( Cursor::new( vec![ 0u8; 64 ] ) );

        assert!( matches!(
            decode_pixels( &mut input, &geometry, 0 ),
            Err( DecodeError::TruncatedInput ) ) );
    }

    #[test]
    fn padding_is_dropped_and_rows_flipped() {
        // two rows of 3 bytes, one padding byte each, stored bottom-up
        let data = vec![ 1, 2, 3, 0xFF, 4, 5, 6, 0xFF ];
        let geometry = Geometry::new( 3, 2, 8 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( data ) );
        let pixels = decode_pixels( &mut input, &geometry, 0 ).unwrap();

        assert_eq!( pixels.as_bytes(), &[ 4, 5, 6, 1, 2, 3 ] );
        assert_eq!( pixels.row( 0 ), Some( &[ 4u8, 5, 6 ][..] ) );
        assert_eq!( pixels.row( 2 ), None );
        assert_eq!( pixels.pixel( 2, 1 ), Some( &[ 3u8 ][..] ) );
        assert_eq!( pixels.pixel( 3, 1 ), None );
        assert_eq!( pixels.source_order(), RowOrder::BottomUp );
    }

    #[test]
    fn top_down_rows_keep_order() {
        let data = vec![ 0xAA, 0xAA, 1, 2, 3, 0xFF, 4, 5, 6, 0xFF ];
        let geometry = Geometry::new( 3, -2, 8 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( data ) );
        let pixels = decode_pixels( &mut input, &geometry, 2 ).unwrap();

        assert_eq!( pixels.rows().collect::<Vec<_>>(), vec![ &[ 1u8, 2, 3 ][..], &[ 4, 5, 6 ][..] ] );
    }

    #[test]
    fn missing_final_padding_is_truncated() {
        let data = vec![ 1, 2, 3, 0xFF, 4, 5, 6 ];
        let geometry = Geometry::new( 3, 2, 8 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( data ) );
        assert!( matches!( decode_pixels( &mut input, &geometry, 0 ), Err( DecodeError::TruncatedInput ) ) );
    }
}
