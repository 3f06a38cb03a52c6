use std::io::{
    Read,
    Seek,
};

use log::trace;

use crate::error::{
    DecodeError,
    Result,
};
use crate::info::InfoHeader;
use crate::reader::ByteReader;

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub struct PaletteEntry {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

#[derive( Debug, PartialEq, Eq, Clone )]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn entries( &self ) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len( &self ) -> usize {
        self.entries.len()
    }

    pub fn is_empty( &self ) -> bool {
        self.entries.is_empty()
    }

    pub fn get( &self, index: u8 ) -> Option<&PaletteEntry> {
        self.entries.get( index as usize )
    }
}

/// Number of palette entries stored after the info header. Only bit depths
/// of 8 and below carry a palette.
pub fn entry_count( info: &InfoHeader ) -> Result<u32> {
    let bit_count = info.core().bit_count;
    if bit_count == 0 || bit_count > 8 {
        return Ok( 0 );
    }

    let max = 1u32 << bit_count;
    match info.colors_used() {
        0 => Ok( max ),
        x if x <= max => Ok( x ),
        x @ _ => Err( DecodeError::InvalidPalette { entries: x, bit_count } ),
    }
}

/// Bytes the palette occupies in the file.
pub fn byte_len( info: &InfoHeader ) -> Result<u64> {
    Ok( entry_count( info )? as u64 * info.palette_entry_len() as u64 )
}

/// Reads the palette stored at the absolute `offset`. Entries that would
/// reach past `end` (the start of the pixel data) are left out.
pub fn read_palette<R: Read + Seek>(
    input: &mut ByteReader<R>, info: &InfoHeader, offset: u64, end: u64 ) -> Result<Option<Palette>> {

    let entry_len = info.palette_entry_len() as usize;
    let room = ( end.saturating_sub( offset ) / entry_len as u64 ) as usize;
    let count = ( entry_count( info )? as usize ).min( room );
    if count == 0 {
        return Ok( None );
    }

    let mut buffer = vec![0; count * entry_len];

    input.seek_to( offset )?;
    input.read_exact( &mut buffer )?;

    let entries = buffer.chunks( entry_len )
        .map( |x| PaletteEntry {
            blue: x[0],
            green: x[1],
            red: x[2],
            reserved: if entry_len == 4 { x[3] } else { 0 },
        } )
        .collect();

    trace!( "Palette of {} entries at {}", count, offset );

    Ok( Some( Palette { entries } ) )
}

#[cfg( test )]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::info::{
        Compression,
        CoreHeader,
        InfoV3,
    };

    fn core( bit_count: u16 ) -> CoreHeader {
        CoreHeader { width: 1, height: 1, planes: 1, bit_count }
    }

    fn v3( bit_count: u16, colors_used: u32 ) -> InfoHeader {
        InfoHeader::V3( InfoV3 {
            core: core( bit_count ),
            compression: Compression::None,
            size_image: 0,
            x_px_per_meter: 0,
            y_px_per_meter: 0,
            colors_used,
            colors_important: 0,
        } )
    }

    #[test]
    fn counts_follow_bit_depth() {
        assert_eq!( entry_count( &v3( 8, 0 ) ).unwrap(), 256 );
        assert_eq!( entry_count( &v3( 8, 2 ) ).unwrap(), 2 );
        assert_eq!( entry_count( &v3( 4, 0 ) ).unwrap(), 16 );
        assert_eq!( entry_count( &v3( 24, 16 ) ).unwrap(), 0 );
        assert_eq!( byte_len( &InfoHeader::V2( core( 8 ) ) ).unwrap(), 768 );
    }

    #[test]
    fn oversized_palette_is_rejected() {
        assert!( matches!(
            entry_count( &v3( 4, 17 ) ),
            Err( DecodeError::InvalidPalette { entries: 17, bit_count: 4 } ) ) );
    }

    #[test]
    fn reads_quads_at_offset() {
        let mut data = vec![0xEE; 4];
        data.extend_from_slice( &[ 1, 2, 3, 0, 4, 5, 6, 0 ] );

        let mut input = ByteReader::new( Cursor::new( data ) );
        let palette = read_palette( &mut input, &v3( 8, 2 ), 4, 12 ).unwrap().unwrap();

        assert_eq!( palette.len(), 2 );
        assert_eq!( palette.get( 1 ), Some( &PaletteEntry { blue: 4, green: 5, red: 6, reserved: 0 } ) );
    }

    #[test]
    fn reads_v2_triples() {
        let data = vec![ 9, 8, 7, 6, 5, 4 ];
        let info = InfoHeader::V2( core( 1 ) );

        let mut input = ByteReader::new( Cursor::new( data ) );
        let palette = read_palette( &mut input, &info, 0, 6 ).unwrap().unwrap();

        assert_eq!( palette.entries()[1], PaletteEntry { blue: 6, green: 5, red: 4, reserved: 0 } );
    }

    #[test]
    fn palette_stops_at_pixel_data() {
        let data = vec![ 1, 2, 3, 0, 4, 5, 6, 0, 7, 8, 9, 0 ];

        let mut input = ByteReader::new( Cursor::new( data ) );
        let palette = read_palette( &mut input, &v3( 8, 0 ), 0, 8 ).unwrap().unwrap();
        assert_eq!( palette.len(), 2 );

        let mut input = ByteReader::new( Cursor::new( vec![ 0; 4 ] ) );
        assert_eq!( read_palette( &mut input, &v3( 8, 0 ), 4, 4 ).unwrap(), None );
    }

    #[test]
    fn short_palette_is_truncated() {
        let mut input = ByteReader::new( Cursor::new( vec![ 0; 10 ] ) );
        assert!( matches!(
            read_palette( &mut input, &v3( 8, 0 ), 0, 1024 ),
            Err( DecodeError::TruncatedInput ) ) );
    }
}
