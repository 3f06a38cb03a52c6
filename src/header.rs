//! File type detection and the fixed headers that precede the info header.

use std::io::{
    Read,
    Seek,
};

use log::{
    debug,
    warn,
};

use crate::error::{
    invalid_geometry,
    DecodeError,
    Result,
};
use crate::info::HeaderVersion;
use crate::reader::ByteReader;

pub const BMP_MAGIC: u16 = 0x4D42;
pub const DDB_MAGIC: u16 = 0x0000;

pub const FILE_HEADER_LEN: u32 = 14;
pub const DDB_HEADER_LEN: u32 = 10;

/// Common preamble of every Windows 2.x and later bitmap.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct FileHeader {
    pub file_type: u16,
    /// Declared size of the whole file. Informational only.
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    /// Absolute offset of the pixel array, zero if the writer left it out.
    pub pixel_data_offset: u32,
}

impl FileHeader {
    fn from_reader<R: Read + Seek>( input: &mut ByteReader<R>, file_type: u16 )
        -> Result<FileHeader> {

        let file_size = input.read_u32_le()?;
        let reserved1 = input.read_u16_le()?;
        let reserved2 = input.read_u16_le()?;
        let pixel_data_offset = input.read_u32_le()?;

        if reserved1 != 0 || reserved2 != 0 {
            warn!( "Non-zero reserved fields 0x{:X} 0x{:X}", reserved1, reserved2 );
        }

        Ok( FileHeader {
            file_type,
            file_size,
            reserved1,
            reserved2,
            pixel_data_offset,
        } )
    }
}

/// Header of a Windows 1.x device dependent bitmap.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct DdbHeader {
    pub width: u16,
    pub height: u16,
    pub stride_bytes: u16,
    pub planes: u8,
    pub bits_per_pixel: u8,
}

impl DdbHeader {
    fn from_reader<R: Read + Seek>( input: &mut ByteReader<R> ) -> Result<DdbHeader> {
        let width = input.read_u16_le()?;
        let height = input.read_u16_le()?;
        let stride_bytes = input.read_u16_le()?;
        let planes = input.read_u8()?;
        let bits_per_pixel = input.read_u8()?;

        let min_stride = ( width as u32 * bits_per_pixel as u32 + 7 ) / 8;
        if ( stride_bytes as u32 ) < min_stride {
            return Err( invalid_geometry( format!(
                "scan line of {} bytes is shorter than {} pixels at {}-bit",
                stride_bytes, width, bits_per_pixel ) ) );
        }

        Ok( DdbHeader {
            width,
            height,
            stride_bytes,
            planes,
            bits_per_pixel,
        } )
    }
}

/// Rewinds `input`, identifies the file type and reads up to and including
/// the info header size. On success the stream is positioned at the first
/// field after the size.
pub fn classify<R: Read + Seek>( input: &mut ByteReader<R> )
    -> Result<( FileHeader, HeaderVersion )> {

    input.seek_to( 0 )?;

    match input.read_u16_le()? {
        DDB_MAGIC => {
            let ddb = DdbHeader::from_reader( input )?;
            debug!( "Device dependent bitmap {:?}", ddb );

            Err( DecodeError::LegacyFormat( ddb ) )
        },
        BMP_MAGIC => {
            let file = FileHeader::from_reader( input, BMP_MAGIC )?;
            let header_size = input.read_u32_le()?;
            let version = HeaderVersion::from_size( header_size )?;

            debug!( "Bitmap with {}-byte info header, pixels at {}",
                header_size, file.pixel_data_offset );

            Ok( ( file, version ) )
        },
        x @ _ => Err( DecodeError::UnrecognizedMagic( x ) ),
    }
}

#[cfg( test )]
mod tests {
    use super::*;
    use std::io::Cursor;

    use byteorder::{
        LittleEndian,
        WriteBytesExt,
    };

    fn file_header( header_size: u32 ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>( BMP_MAGIC ).unwrap();
        buf.write_u32::<LittleEndian>( 70 ).unwrap();
        buf.write_u16::<LittleEndian>( 0 ).unwrap();
        buf.write_u16::<LittleEndian>( 0 ).unwrap();
        buf.write_u32::<LittleEndian>( 54 ).unwrap();
        buf.write_u32::<LittleEndian>( header_size ).unwrap();
        buf
    }

    #[test]
    fn classifies_windows_bitmap() {
        let mut input = ByteReader::new( Cursor::new( file_header( 40 ) ) );
        let ( file, version ) = classify( &mut input ).unwrap();

        assert_eq!( version, HeaderVersion::V3 );
        assert_eq!( file.file_size, 70 );
        assert_eq!( file.pixel_data_offset, 54 );
        assert_eq!( input.position().unwrap(), 18 );
    }

    #[test]
    fn unknown_header_size_carries_raw_value() {
        let mut input = ByteReader::new( Cursor::new( file_header( 56 ) ) );
        assert!( matches!( classify( &mut input ), Err( DecodeError::UnrecognizedHeaderVersion( 56 ) ) ) );
    }

    #[test]
    fn unknown_magic() {
        let mut input = ByteReader::new( Cursor::new( vec![ b'P', b'6', 0, 0 ] ) );
        assert!( matches!( classify( &mut input ), Err( DecodeError::UnrecognizedMagic( 0x3650 ) ) ) );
    }

    #[test]
    fn device_dependent_bitmap_is_legacy() {
        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>( DDB_MAGIC ).unwrap();
        buf.write_u16::<LittleEndian>( 10 ).unwrap();
        buf.write_u16::<LittleEndian>( 4 ).unwrap();
        buf.write_u16::<LittleEndian>( 12 ).unwrap();
        buf.write_u8( 1 ).unwrap();
        buf.write_u8( 8 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( buf ) );
        match classify( &mut input ) {
            Err( DecodeError::LegacyFormat( ddb ) ) => {
                assert_eq!( ddb.width, 10 );
                assert_eq!( ddb.stride_bytes, 12 );
                assert_eq!( ddb.bits_per_pixel, 8 );
            },
            other => panic!( "unexpected {:?}", other ),
        }
        assert_eq!( input.position().unwrap(), DDB_HEADER_LEN as u64 );
    }

    #[test]
    fn device_dependent_bitmap_with_short_stride() {
        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>( DDB_MAGIC ).unwrap();
        buf.write_u16::<LittleEndian>( 10 ).unwrap();
        buf.write_u16::<LittleEndian>( 4 ).unwrap();
        buf.write_u16::<LittleEndian>( 8 ).unwrap();
        buf.write_u8( 1 ).unwrap();
        buf.write_u8( 8 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( buf ) );
        assert!( matches!( classify( &mut input ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
    }

    #[test]
    fn truncated_device_dependent_header() {
        let mut input = ByteReader::new( Cursor::new( vec![ 0, 0, 10, 0 ] ) );
        assert!( matches!( classify( &mut input ), Err( DecodeError::TruncatedInput ) ) );
    }
}
