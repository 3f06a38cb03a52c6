//! Info header generations and their parsers.
//!
//! The info header starts with its own size, which is the only thing that
//! selects the layout of every field after it.

use std::io::{
    Read,
    Seek,
};

use log::{
    debug,
    trace,
    warn,
};

use crate::error::{
    DecodeError,
    Result,
};
use crate::reader::ByteReader;

pub const V2_SIZE: u32 = 12;
pub const V3_SIZE: u32 = 40;
pub const V4_SIZE: u32 = 108;
pub const V5_SIZE: u32 = 124;

/// Bytes of colour space, endpoint and gamma fields that a V4 header
/// carries after its masks.
pub const V4_UNDECODED_LEN: u32 = V4_SIZE - V3_SIZE - 16;

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum HeaderVersion {
    V2,
    V3,
    V4,
    V5,
}

impl HeaderVersion {
    pub fn from_size( size: u32 ) -> Result<HeaderVersion> {
        match size {
            V2_SIZE => Ok( HeaderVersion::V2 ),
            V3_SIZE => Ok( HeaderVersion::V3 ),
            V4_SIZE => Ok( HeaderVersion::V4 ),
            V5_SIZE => Ok( HeaderVersion::V5 ),
            x @ _ => Err( DecodeError::UnrecognizedHeaderVersion( x ) ),
        }
    }

    pub fn size( self ) -> u32 {
        match self {
            HeaderVersion::V2 => V2_SIZE,
            HeaderVersion::V3 => V3_SIZE,
            HeaderVersion::V4 => V4_SIZE,
            HeaderVersion::V5 => V5_SIZE,
        }
    }
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum Compression {
    None,
    Rle8,
    Rle4,
    Bitfields,
    Jpeg,
    Png,
    AlphaBitfields,
    Unknown( u32 ),
}

impl Compression {
    pub fn from_u32( value: u32 ) -> Compression {
        match value {
            0 => Compression::None,
            1 => Compression::Rle8,
            2 => Compression::Rle4,
            3 => Compression::Bitfields,
            4 => Compression::Jpeg,
            5 => Compression::Png,
            6 => Compression::AlphaBitfields,
            x @ _ => Compression::Unknown( x ),
        }
    }

    pub fn to_u32( self ) -> u32 {
        match self {
            Compression::None => 0,
            Compression::Rle8 => 1,
            Compression::Rle4 => 2,
            Compression::Bitfields => 3,
            Compression::Jpeg => 4,
            Compression::Png => 5,
            Compression::AlphaBitfields => 6,
            Compression::Unknown( x ) => x,
        }
    }
}

/// Fields shared by every info header generation. V2 stores width and
/// height as 16-bit values; they are widened here.
#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct CoreHeader {
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
}

impl CoreHeader {
    fn from_reader<R: Read + Seek>( input: &mut ByteReader<R>, version: HeaderVersion )
        -> Result<CoreHeader> {

        let ( width, height ) = match version {
            HeaderVersion::V2 => {
                let w = input.read_i16_le()? as i32;
                let h = input.read_i16_le()? as i32;

                ( w, h )
            },
            _ => {
                let w = input.read_i32_le()?;
                let h = input.read_i32_le()?;

                ( w, h )
            },
        };

        let planes = input.read_u16_le()?;
        if planes != 1 {
            return Err( DecodeError::InvalidPlanes( planes ) );
        }

        let bit_count = input.read_u16_le()?;

        trace!( "Width: {}", width );
        trace!( "Height: {}", height );
        trace!( "Bit count: {}", bit_count );

        Ok( CoreHeader {
            width,
            height,
            planes,
            bit_count,
        } )
    }
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct InfoV3 {
    pub core: CoreHeader,
    pub compression: Compression,
    pub size_image: u32,
    pub x_px_per_meter: i32,
    pub y_px_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl InfoV3 {
    fn from_reader<R: Read + Seek>( input: &mut ByteReader<R>, version: HeaderVersion )
        -> Result<InfoV3> {

        let core = CoreHeader::from_reader( input, version )?;
        let compression = Compression::from_u32( input.read_u32_le()? );
        let size_image = input.read_u32_le()?;
        let x_px_per_meter = input.read_i32_le()?;
        let y_px_per_meter = input.read_i32_le()?;
        let colors_used = input.read_u32_le()?;
        let colors_important = input.read_u32_le()?;

        trace!( "Compression: {:?}", compression );
        trace!( "Colors used: {}", colors_used );

        Ok( InfoV3 {
            core,
            compression,
            size_image,
            x_px_per_meter,
            y_px_per_meter,
            colors_used,
            colors_important,
        } )
    }
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct BitMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

impl BitMasks {
    /// Masks implied by an uncompressed 16 or 32-bit image.
    pub fn default_for( bit_count: u16 ) -> Option<BitMasks> {
        match bit_count {
            16 => Some( BitMasks {
                red: 0x7C00,
                green: 0x3E0,
                blue: 0x1F,
                alpha: 0x00,
            } ),
            32 => Some( BitMasks {
                red: 0xFF0000,
                green: 0xFF00,
                blue: 0xFF,
                alpha: 0x00,
            } ),
            _ => None,
        }
    }

    fn from_reader<R: Read + Seek>( input: &mut ByteReader<R>, has_alpha: bool )
        -> Result<BitMasks> {

        let red = input.read_u32_le()?;
        let green = input.read_u32_le()?;
        let blue = input.read_u32_le()?;
        let alpha = match has_alpha {
            true => input.read_u32_le()?,
            false => 0x00,
        };

        Ok( BitMasks { red, green, blue, alpha } )
    }
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct InfoV4 {
    pub info: InfoV3,
    pub masks: BitMasks,
    /// Length of the trailing fields that were left unread.
    pub undecoded_len: u32,
}

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub enum InfoHeader {
    V2( CoreHeader ),
    V3( InfoV3 ),
    /// V3 header with BITFIELDS compression, followed by three masks.
    V3Nt { info: InfoV3, masks: BitMasks },
    V4( InfoV4 ),
}

impl InfoHeader {
    pub fn version( &self ) -> HeaderVersion {
        match self {
            InfoHeader::V2( _ ) => HeaderVersion::V2,
            InfoHeader::V3( _ ) | InfoHeader::V3Nt { .. } => HeaderVersion::V3,
            InfoHeader::V4( _ ) => HeaderVersion::V4,
        }
    }

    pub fn core( &self ) -> &CoreHeader {
        match self {
            InfoHeader::V2( core ) => core,
            InfoHeader::V3( info ) | InfoHeader::V3Nt { info, .. } => &info.core,
            InfoHeader::V4( v4 ) => &v4.info.core,
        }
    }

    pub fn v3( &self ) -> Option<&InfoV3> {
        match self {
            InfoHeader::V2( _ ) => None,
            InfoHeader::V3( info ) | InfoHeader::V3Nt { info, .. } => Some( info ),
            InfoHeader::V4( v4 ) => Some( &v4.info ),
        }
    }

    pub fn compression( &self ) -> Compression {
        self.v3().map( |i| i.compression ).unwrap_or( Compression::None )
    }

    pub fn colors_used( &self ) -> u32 {
        self.v3().map( |i| i.colors_used ).unwrap_or( 0 )
    }

    /// Masks stored in the header itself, if any.
    pub fn masks( &self ) -> Option<&BitMasks> {
        match self {
            InfoHeader::V3Nt { masks, .. } => Some( masks ),
            InfoHeader::V4( v4 ) => Some( &v4.masks ),
            _ => None,
        }
    }

    /// Bytes occupied by the info header including the V3 NT masks that
    /// follow it.
    pub fn encoded_len( &self ) -> u32 {
        match self {
            InfoHeader::V3Nt { .. } => V3_SIZE + 12,
            _ => self.version().size(),
        }
    }

    /// Palette entries are RGB triples in V2 and RGB quads afterwards.
    pub fn palette_entry_len( &self ) -> u32 {
        match self {
            InfoHeader::V2( _ ) => 3,
            _ => 4,
        }
    }
}

/// Reads the remaining fields of an info header. `input` must be positioned
/// right after the size field.
pub fn read_info_header<R: Read + Seek>( input: &mut ByteReader<R>, version: HeaderVersion )
    -> Result<InfoHeader> {

    debug!( "Info header version {:?}", version );

    match version {
        HeaderVersion::V2 => Ok( InfoHeader::V2( CoreHeader::from_reader( input, version )? ) ),
        HeaderVersion::V3 => {
            let info = InfoV3::from_reader( input, version )?;

            match info.compression {
                Compression::Bitfields => {
                    let masks = BitMasks::from_reader( input, false )?;
                    debug!( "V3 NT header with masks {:?}", masks );

                    Ok( InfoHeader::V3Nt { info, masks } )
                },
                _ => Ok( InfoHeader::V3( info ) ),
            }
        },
        HeaderVersion::V4 => {
            let info = InfoV3::from_reader( input, version )?;
            let masks = BitMasks::from_reader( input, true )?;

            warn!( "V4 color space fields ({} bytes) are not decoded", V4_UNDECODED_LEN );

            Ok( InfoHeader::V4( InfoV4 {
                info,
                masks,
                undecoded_len: V4_UNDECODED_LEN,
            } ) )
        },
        HeaderVersion::V5 => Err( DecodeError::UnsupportedVersion( version ) ),
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

    fn v3_body( compression: u32 ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>( 3 ).unwrap();
        buf.write_i32::<LittleEndian>( -2 ).unwrap();
        buf.write_u16::<LittleEndian>( 1 ).unwrap();
        buf.write_u16::<LittleEndian>( 32 ).unwrap();
        buf.write_u32::<LittleEndian>( compression ).unwrap();
        buf.write_u32::<LittleEndian>( 0 ).unwrap();
        buf.write_i32::<LittleEndian>( 2835 ).unwrap();
        buf.write_i32::<LittleEndian>( 2835 ).unwrap();
        buf.write_u32::<LittleEndian>( 0 ).unwrap();
        buf.write_u32::<LittleEndian>( 0 ).unwrap();
        buf
    }

    #[test]
    fn header_sizes_select_versions() {
        assert_eq!( HeaderVersion::from_size( 12 ).unwrap(), HeaderVersion::V2 );
        assert_eq!( HeaderVersion::from_size( 40 ).unwrap(), HeaderVersion::V3 );
        assert_eq!( HeaderVersion::from_size( 108 ).unwrap(), HeaderVersion::V4 );
        assert_eq!( HeaderVersion::from_size( 124 ).unwrap(), HeaderVersion::V5 );

        match HeaderVersion::from_size( 64 ) {
            Err( DecodeError::UnrecognizedHeaderVersion( 64 ) ) => {},
            other => panic!( "unexpected {:?}", other ),
        }
    }

    #[test]
    fn v2_reads_16_bit_dimensions() {
        let mut buf = Vec::new();
        buf.write_i16::<LittleEndian>( 5 ).unwrap();
        buf.write_i16::<LittleEndian>( -7 ).unwrap();
        buf.write_u16::<LittleEndian>( 1 ).unwrap();
        buf.write_u16::<LittleEndian>( 24 ).unwrap();

        let mut input = ByteReader::new( Cursor::new( buf ) );
        let header = read_info_header( &mut input, HeaderVersion::V2 ).unwrap();

        assert_eq!( header, InfoHeader::V2( CoreHeader { width: 5, height: -7, planes: 1, bit_count: 24 } ) );
        assert_eq!( input.position().unwrap(), 8 );
        assert_eq!( header.palette_entry_len(), 3 );
    }

    #[test]
    fn v3_without_bitfields_reads_no_masks() {
        let mut input = ByteReader::new( Cursor::new( v3_body( 0 ) ) );
        let header = read_info_header( &mut input, HeaderVersion::V3 ).unwrap();

        assert_eq!( header.version(), HeaderVersion::V3 );
        assert_eq!( header.core().height, -2 );
        assert_eq!( header.masks(), None );
        assert_eq!( input.position().unwrap(), 36 );
        assert_eq!( header.encoded_len(), 40 );
    }

    #[test]
    fn v3_bitfields_consumes_twelve_mask_bytes() {
        let mut buf = v3_body( 3 );
        buf.write_u32::<LittleEndian>( 0xFF0000 ).unwrap();
        buf.write_u32::<LittleEndian>( 0x00FF00 ).unwrap();
        buf.write_u32::<LittleEndian>( 0x0000FF ).unwrap();
        buf.write_u32::<LittleEndian>( 0xDEADBEEF ).unwrap();

        let mut input = ByteReader::new( Cursor::new( buf ) );
        let header = read_info_header( &mut input, HeaderVersion::V3 ).unwrap();

        assert_eq!( input.position().unwrap(), 48 );
        assert_eq!( header.encoded_len(), 52 );
        assert_eq!( header.masks(), Some( &BitMasks { red: 0xFF0000, green: 0xFF00, blue: 0xFF, alpha: 0 } ) );
    }

    #[test]
    fn v4_reads_masks_and_reports_undecoded_tail() {
        let mut buf = v3_body( 3 );
        for mask in &[ 0xFF0000u32, 0xFF00, 0xFF, 0xFF000000 ] {
            buf.write_u32::<LittleEndian>( *mask ).unwrap();
        }
        buf.extend_from_slice( &[ 0xAB; 52 ] );

        let mut input = ByteReader::new( Cursor::new( buf ) );
        let header = read_info_header( &mut input, HeaderVersion::V4 ).unwrap();

        match header {
            InfoHeader::V4( v4 ) => {
                assert_eq!( v4.masks.alpha, 0xFF000000 );
                assert_eq!( v4.undecoded_len, 52 );
            },
            other => panic!( "unexpected {:?}", other ),
        }
        assert_eq!( input.position().unwrap(), 52 );
    }

    #[test]
    fn v5_is_recognized_but_unsupported() {
        let mut input = ByteReader::new( Cursor::new( v3_body( 0 ) ) );
        match read_info_header( &mut input, HeaderVersion::V5 ) {
            Err( DecodeError::UnsupportedVersion( HeaderVersion::V5 ) ) => {},
            other => panic!( "unexpected {:?}", other ),
        }
        assert_eq!( input.position().unwrap(), 0 );
    }

    #[test]
    fn planes_must_be_one() {
        let mut buf = v3_body( 0 );
        buf[8] = 2;

        let mut input = ByteReader::new( Cursor::new( buf ) );
        assert!( matches!(
            read_info_header( &mut input, HeaderVersion::V3 ),
            Err( DecodeError::InvalidPlanes( 2 ) ) ) );
    }

    #[test]
    fn compression_values_round_trip() {
        for value in 0..8 {
            assert_eq!( Compression::from_u32( value ).to_u32(), value );
        }
        assert_eq!( Compression::from_u32( 9 ), Compression::Unknown( 9 ) );
    }
}
