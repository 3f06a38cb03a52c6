//! Little-endian integer reads over a seekable stream.
//!
//! Bitmap files are always stored little-endian. The host byte order is
//! probed once, by looking at the first byte of a known constant, and every
//! read below decodes in native order and swaps only on big-endian hosts.

use std::io;
use std::io::{
    Read,
    Seek,
    SeekFrom,
};
use std::sync::OnceLock;

use byteorder::{
    ByteOrder,
    NativeEndian,
};

use crate::error::Result;

#[derive( Debug, PartialEq, Eq, Clone, Copy )]
pub( crate ) enum HostOrder {
    Little,
    Big,
}

static HOST_ORDER: OnceLock<HostOrder> = OnceLock::new();

pub( crate ) fn host_order() -> HostOrder {
    *HOST_ORDER.get_or_init( || {
        match 0x00FFu16.to_ne_bytes()[0] {
            0xFF => HostOrder::Little,
            _ => HostOrder::Big,
        }
    } )
}

fn swap_needed() -> bool {
    host_order() == HostOrder::Big
}

pub struct ByteReader<R> {
    input: R,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new( input: R ) -> ByteReader<R> {
        ByteReader { input }
    }

    pub fn read_u8( &mut self ) -> Result<u8> {
        let mut buf = [0; 1];
        self.input.read_exact( &mut buf )?;
        Ok( buf[0] )
    }

    pub fn read_u16_le( &mut self ) -> Result<u16> {
        let mut buf = [0; 2];
        self.input.read_exact( &mut buf )?;

        let value = NativeEndian::read_u16( &buf );
        Ok( if swap_needed() { value.swap_bytes() } else { value } )
    }

    pub fn read_u32_le( &mut self ) -> Result<u32> {
        let mut buf = [0; 4];
        self.input.read_exact( &mut buf )?;

        let value = NativeEndian::read_u32( &buf );
        Ok( if swap_needed() { value.swap_bytes() } else { value } )
    }

    pub fn read_i16_le( &mut self ) -> Result<i16> {
        Ok( self.read_u16_le()? as i16 )
    }

    pub fn read_i32_le( &mut self ) -> Result<i32> {
        Ok( self.read_u32_le()? as i32 )
    }

    pub fn read_exact( &mut self, buf: &mut [u8] ) -> Result<()> {
        self.input.read_exact( buf )?;
        Ok( () )
    }

    /// Reads and drops `count` bytes. Fails if fewer are available.
    pub fn skip( &mut self, count: u64 ) -> Result<()> {
        let skipped = io::copy( &mut ( &mut self.input ).take( count ), &mut io::sink() )?;
        if skipped != count {
            return Err( crate::DecodeError::TruncatedInput );
        }
        Ok( () )
    }

    pub fn seek_to( &mut self, offset: u64 ) -> Result<()> {
        self.input.seek( SeekFrom::Start( offset ) )?;
        Ok( () )
    }

    pub fn position( &mut self ) -> Result<u64> {
        Ok( self.input.seek( SeekFrom::Current( 0 ) )? )
    }

    /// Total length of the stream. The current position is preserved.
    pub fn stream_len( &mut self ) -> Result<u64> {
        let current = self.position()?;
        let len = self.input.seek( SeekFrom::End( 0 ) )?;
        self.seek_to( current )?;
        Ok( len )
    }
}

#[cfg( test )]
mod tests {
    use super::*;
    use std::io::Cursor;

    use byteorder::LittleEndian;

    use crate::DecodeError;

    #[test]
    fn host_order_matches_target_endian() {
        let expected = if cfg!( target_endian = "big" ) { HostOrder::Big } else { HostOrder::Little };
        assert_eq!( host_order(), expected );
        // cached value is stable
        assert_eq!( host_order(), expected );
    }

    #[test]
    fn reads_little_endian_values() {
        let bytes = [ 0x42, 0x4D, 0x78, 0x56, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F ];
        let mut reader = ByteReader::new( Cursor::new( &bytes[..] ) );

        assert_eq!( reader.read_u16_le().unwrap(), 0x4D42 );
        assert_eq!( reader.read_u32_le().unwrap(), 0x12345678 );
        assert_eq!( reader.read_i16_le().unwrap(), -2 );
        assert_eq!( reader.read_i32_le().unwrap(), 0x7FFFFFFF );
        assert_eq!( reader.position().unwrap(), 12 );
    }

    #[test]
    fn agrees_with_byteorder_little_endian() {
        let bytes = [ 0x01, 0x80, 0xAA, 0x55, 0x00, 0xF0 ];
        let mut reader = ByteReader::new( Cursor::new( &bytes[..] ) );

        assert_eq!( reader.read_u16_le().unwrap(), LittleEndian::read_u16( &bytes[0..2] ) );
        assert_eq!( reader.read_i32_le().unwrap(), LittleEndian::read_i32( &bytes[2..6] ) );
    }

    #[test]
    fn short_reads_are_truncated_input() {
        let bytes = [ 0x01, 0x02, 0x03 ];
        let mut reader = ByteReader::new( Cursor::new( &bytes[..] ) );

        assert!( matches!( reader.read_u32_le(), Err( DecodeError::TruncatedInput ) ) );

        let mut reader = ByteReader::new( Cursor::new( &bytes[..1] ) );
        assert!( matches!( reader.read_i16_le(), Err( DecodeError::TruncatedInput ) ) );
    }

    #[test]
    fn skip_fails_past_the_end() {
        let bytes = [ 0; 6 ];
        let mut reader = ByteReader::new( Cursor::new( &bytes[..] ) );

        reader.skip( 4 ).unwrap();
        assert!( matches!( reader.skip( 3 ), Err( DecodeError::TruncatedInput ) ) );
    }

    #[test]
    fn stream_len_keeps_position() {
        let bytes = [ 0; 10 ];
        let mut reader = ByteReader::new( Cursor::new( &bytes[..] ) );

        reader.seek_to( 3 ).unwrap();
        assert_eq!( reader.stream_len().unwrap(), 10 );
        assert_eq!( reader.position().unwrap(), 3 );
    }
}
