use std::io;

use thiserror::Error;

use crate::header::DdbHeader;
use crate::info::{
    Compression,
    HeaderVersion,
};

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive( Debug, Error )]
#[non_exhaustive]
pub enum DecodeError {
    #[error( "unexpected end of input" )]
    TruncatedInput,

    #[error( "unrecognized file type 0x{0:04X}" )]
    UnrecognizedMagic( u16 ),

    #[error( "unrecognized info header size {0}" )]
    UnrecognizedHeaderVersion( u32 ),

    #[error( "unsupported bits per pixel {0}" )]
    UnsupportedBitDepth( u16 ),

    #[error( "unsupported compression {0:?}" )]
    UnsupportedCompression( Compression ),

    #[error( "{0:?} info header is recognized but not decoded" )]
    UnsupportedVersion( HeaderVersion ),

    #[error( "legacy device dependent bitmap is not implemented ({0:?})" )]
    LegacyFormat( DdbHeader ),

    #[error( "invalid geometry: {0}" )]
    InvalidGeometry( String ),

    #[error( "invalid number of planes {0}" )]
    InvalidPlanes( u16 ),

    #[error( "invalid palette of {entries} entries for {bit_count}-bit" )]
    InvalidPalette { entries: u32, bit_count: u16 },

    #[error( "pixel data offset {offset} lies inside the headers ending at {header_end}" )]
    InvalidDataOffset { offset: u32, header_end: u64 },

    #[error( "limit exceeded: {0}" )]
    LimitExceeded( String ),

    #[error( transparent )]
    Io( io::Error ),
}

impl DecodeError {
    /// True for inputs that are well formed but use a feature this crate
    /// recognizes without decoding.
    pub fn is_unsupported( &self ) -> bool {
        match self {
            DecodeError::UnsupportedBitDepth( _ )
            | DecodeError::UnsupportedCompression( _ )
            | DecodeError::UnsupportedVersion( _ )
            | DecodeError::LegacyFormat( _ ) => true,
            _ => false,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from( err: io::Error ) -> DecodeError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::TruncatedInput,
            _ => DecodeError::Io( err ),
        }
    }
}

pub( crate ) fn invalid_geometry<S>( message: S ) -> DecodeError
    where S: Into<String> {

    DecodeError::InvalidGeometry( message.into() )
}

#[cfg( test )]
mod tests {
    use super::*;

    #[test]
    fn eof_becomes_truncated_input() {
        let err = DecodeError::from( io::Error::new( io::ErrorKind::UnexpectedEof, "eof" ) );
        assert!( matches!( err, DecodeError::TruncatedInput ) );
    }

    #[test]
    fn other_io_errors_are_kept() {
        let err = DecodeError::from( io::Error::new( io::ErrorKind::PermissionDenied, "nope" ) );
        match err {
            DecodeError::Io( e ) => assert_eq!( e.kind(), io::ErrorKind::PermissionDenied ),
            e => panic!( "unexpected {:?}", e ),
        }
    }

    #[test]
    fn unsupported_family_is_distinct_from_malformed() {
        assert!( DecodeError::UnsupportedCompression( Compression::Rle8 ).is_unsupported() );
        assert!( DecodeError::UnsupportedVersion( HeaderVersion::V5 ).is_unsupported() );
        assert!( DecodeError::UnsupportedBitDepth( 4 ).is_unsupported() );
        assert!( !DecodeError::TruncatedInput.is_unsupported() );
        assert!( !DecodeError::UnrecognizedMagic( 0x1234 ).is_unsupported() );
        assert!( !DecodeError::UnrecognizedHeaderVersion( 64 ).is_unsupported() );
    }
}
