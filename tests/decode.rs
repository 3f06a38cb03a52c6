
mod common;

use std::io::Cursor;

use multibmp::{
    decode,
    decode_with_limits,
    BitMasks,
    Compression,
    DecodeError,
    HeaderVersion,
    InfoHeader,
    Limits,
    RowOrder,
};

use common::BmpWriter;

const RED: [ u8; 3 ] = [ 0x00, 0x00, 0xFF ];
const GREEN: [ u8; 3 ] = [ 0x00, 0xFF, 0x00 ];
const BLUE: [ u8; 3 ] = [ 0xFF, 0x00, 0x00 ];
const WHITE: [ u8; 3 ] = [ 0xFF, 0xFF, 0xFF ];

fn row( pixels: &[ [ u8; 3 ] ] ) -> Vec<u8> {
    pixels.iter().flat_map( |p| p.iter().cloned() ).collect()
}

fn decode_bytes( bytes: &[u8] ) -> multibmp::Result<multibmp::Bitmap> {
    decode( Cursor::new( bytes ) )
}

#[test]
fn round_trip_2x2_24_bit() {
    // bottom-up: the bottom row comes first in the file
    let bytes = BmpWriter::v3( 2, 2, 24 )
        .rows( vec![ row( &[ BLUE, WHITE ] ), row( &[ RED, GREEN ] ) ] )
        .encode();

    let bitmap = decode_bytes( &bytes ).unwrap();
    let pixels = bitmap.pixels();

    assert_eq!( bitmap.version(), HeaderVersion::V3 );
    assert_eq!( bitmap.width(), 2 );
    assert_eq!( bitmap.height(), 2 );
    assert_eq!( bitmap.bit_count(), 24 );
    assert_eq!( bitmap.compression(), Compression::None );
    assert_eq!( bitmap.pixel_data_offset(), 54 );
    assert_eq!( bitmap.palette(), None );
    assert_eq!( pixels.stride(), 8 );
    assert_eq!( pixels.source_order(), RowOrder::BottomUp );

    assert_eq!( pixels.pixel( 0, 0 ), Some( &RED[..] ) );
    assert_eq!( pixels.pixel( 1, 0 ), Some( &GREEN[..] ) );
    assert_eq!( pixels.pixel( 0, 1 ), Some( &BLUE[..] ) );
    assert_eq!( pixels.pixel( 1, 1 ), Some( &WHITE[..] ) );
    assert_eq!( pixels.as_bytes().len(), 12 );
}

#[test]
fn three_pixel_rows_have_twelve_byte_stride() {
    for height in 1..5 {
        let mut writer = BmpWriter::v3( 3, height, 24 )
            .rows( ( 0..height ).map( |y| vec![ y as u8; 9 ] ).collect() );
        writer.padding_byte = 0xEE;
        let bytes = writer.encode();

        assert_eq!( bytes.len(), 54 + 12 * height as usize );

        let bitmap = decode_bytes( &bytes ).unwrap();
        let pixels = bitmap.pixels();

        assert_eq!( pixels.stride(), 12 );
        assert_eq!( pixels.row_len(), 9 );
        assert_eq!( pixels.as_bytes().len(), 9 * height as usize );
        assert!( !pixels.as_bytes().contains( &0xEE ) );
    }
}

#[test]
fn height_sign_reverses_rows() {
    let raw = vec![ row( &[ RED, GREEN, BLUE ] ), row( &[ WHITE, WHITE, RED ] ) ];

    let bottom_up = decode_bytes( &BmpWriter::v3( 3, 2, 24 ).rows( raw.clone() ).encode() ).unwrap();
    let top_down = decode_bytes( &BmpWriter::v3( 3, -2, 24 ).rows( raw.clone() ).encode() ).unwrap();

    assert_eq!( top_down.pixels().source_order(), RowOrder::TopDown );
    assert_eq!( top_down.height(), 2 );

    let up: Vec<&[u8]> = bottom_up.pixels().rows().collect();
    let mut down: Vec<&[u8]> = top_down.pixels().rows().collect();
    down.reverse();

    assert_eq!( up, down );
    assert_eq!( top_down.pixels().row( 0 ), Some( &raw[0][..] ) );
    assert_eq!( bottom_up.pixels().row( 0 ), Some( &raw[1][..] ) );
}

#[test]
fn every_truncation_is_truncated_input() {
    let rgb = BmpWriter::v3( 3, 2, 24 )
        .rows( vec![ vec![ 1; 9 ], vec![ 2; 9 ] ] )
        .encode();

    let mut indexed = BmpWriter::v3( 5, 3, 8 ).rows( vec![ vec![ 1; 5 ]; 3 ] );
    indexed.colors_used = 4;
    indexed.palette = vec![ [ 0, 0, 0, 0 ], [ 1, 1, 1, 0 ], [ 2, 2, 2, 0 ], [ 3, 3, 3, 0 ] ];
    let indexed = indexed.encode();

    let mut v4_indexed = BmpWriter::new( 108, 3, -2, 8 ).rows( vec![ vec![ 2; 3 ]; 2 ] );
    v4_indexed.colors_used = 3;
    v4_indexed.palette = vec![ [ 9, 9, 9, 0 ], [ 8, 8, 8, 0 ], [ 7, 7, 7, 0 ] ];
    let v4_indexed = v4_indexed.encode();

    for bytes in &[ rgb, indexed, v4_indexed ] {
        assert!( decode_bytes( bytes ).is_ok() );

        for cut in 0..bytes.len() {
            match decode_bytes( &bytes[ .. cut ] ) {
                Err( DecodeError::TruncatedInput ) => {},
                other => panic!( "cut at {} gave {:?}", cut, other ),
            }
        }
    }
}

#[test]
fn known_header_sizes_decode() {
    let v2 = BmpWriter::new( 12, 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] ).encode();
    let v3 = BmpWriter::new( 40, 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] ).encode();
    let v4 = BmpWriter::new( 108, 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] ).encode();

    assert_eq!( decode_bytes( &v2 ).unwrap().version(), HeaderVersion::V2 );
    assert_eq!( decode_bytes( &v3 ).unwrap().version(), HeaderVersion::V3 );
    assert_eq!( decode_bytes( &v4 ).unwrap().version(), HeaderVersion::V4 );

    for bytes in &[ v2, v3, v4 ] {
        assert_eq!( decode_bytes( bytes ).unwrap().pixels().as_bytes(), &RED[..] );
    }
}

#[test]
fn v5_header_is_recognized_but_unsupported() {
    let bytes = BmpWriter::new( 124, 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] ).encode();

    match decode_bytes( &bytes ) {
        Err( e @ DecodeError::UnsupportedVersion( HeaderVersion::V5 ) ) => assert!( e.is_unsupported() ),
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn unknown_header_sizes_are_rejected() {
    for size in &[ 0u32, 16, 52, 56, 64, 128 ] {
        let bytes = BmpWriter::new( *size, 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] ).encode();

        match decode_bytes( &bytes ) {
            Err( DecodeError::UnrecognizedHeaderVersion( x ) ) => assert_eq!( x, *size ),
            other => panic!( "size {} gave {:?}", size, other ),
        }
    }
}

#[test]
fn unknown_magic_is_rejected() {
    let mut writer = BmpWriter::v3( 1, 1, 24 ).rows( vec![ row( &[ RED ] ) ] );
    writer.magic = 0x4142; // "BA"

    assert!( matches!(
        decode_bytes( &writer.encode() ),
        Err( DecodeError::UnrecognizedMagic( 0x4142 ) ) ) );
}

#[test]
fn device_dependent_bitmap_is_legacy() {
    let bytes = [ 0, 0, 4, 0, 2, 0, 4, 0, 1, 8, 1, 2, 3, 4, 5, 6, 7, 8 ];

    match decode_bytes( &bytes ) {
        Err( DecodeError::LegacyFormat( ddb ) ) => {
            assert_eq!( ddb.width, 4 );
            assert_eq!( ddb.height, 2 );
            assert_eq!( ddb.stride_bytes, 4 );
            assert_eq!( ddb.planes, 1 );
            assert_eq!( ddb.bits_per_pixel, 8 );
        },
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn run_length_compression_is_unsupported() {
    let mut rle8 = BmpWriter::v3( 2, 2, 8 );
    rle8.compression = 1;
    rle8.colors_used = 2;
    rle8.palette = vec![ [ 0; 4 ], [ 255; 4 ] ];
    let mut bytes = rle8.encode();
    bytes.extend_from_slice( &[ 2, 1, 0, 0, 2, 0, 0, 1 ] );

    match decode_bytes( &bytes ) {
        Err( e @ DecodeError::UnsupportedCompression( Compression::Rle8 ) ) => assert!( e.is_unsupported() ),
        other => panic!( "unexpected {:?}", other ),
    }

    let mut rle4 = BmpWriter::v3( 2, 2, 4 );
    rle4.compression = 2;
    assert!( matches!(
        decode_bytes( &rle4.encode() ),
        Err( DecodeError::UnsupportedCompression( Compression::Rle4 ) ) ) );
}

#[test]
fn sub_byte_depths_are_unsupported() {
    for bits in &[ 1u16, 4 ] {
        let bytes = BmpWriter::v3( 8, 1, *bits ).rows( vec![ vec![ 0; 4 ] ] ).encode();

        match decode_bytes( &bytes ) {
            Err( DecodeError::UnsupportedBitDepth( x ) ) => assert_eq!( x, *bits ),
            other => panic!( "{}-bit gave {:?}", bits, other ),
        }
    }
}

#[test]
fn bitfields_masks_precede_pixel_data() {
    let pixel = vec![ 0x11, 0x22, 0x33, 0x44 ];
    let mut writer = BmpWriter::v3( 1, 1, 32 )
        .bitfields( 0x00FF0000, 0x0000FF00, 0x000000FF, 0 )
        .rows( vec![ pixel.clone() ] );
    writer.data_offset = Some( 0 );

    assert_eq!( writer.computed_offset(), 66 );

    let bitmap = decode_bytes( &writer.encode() ).unwrap();

    assert_eq!( bitmap.compression(), Compression::Bitfields );
    assert_eq!( bitmap.pixel_data_offset(), 66 );
    assert_eq!( bitmap.pixels().as_bytes(), &pixel[..] );
    assert_eq!( bitmap.masks(), Some( BitMasks { red: 0xFF0000, green: 0xFF00, blue: 0xFF, alpha: 0 } ) );

    match bitmap.info() {
        InfoHeader::V3Nt { masks, .. } => assert_eq!( masks.green, 0xFF00 ),
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn bitfields_offset_without_masks_is_rejected() {
    let mut writer = BmpWriter::v3( 1, 1, 32 )
        .bitfields( 0xF800, 0x07E0, 0x001F, 0 )
        .rows( vec![ vec![ 1, 2, 3, 4 ] ] );
    writer.data_offset = Some( 54 );

    match decode_bytes( &writer.encode() ) {
        Err( DecodeError::InvalidDataOffset { offset, header_end } ) => {
            assert_eq!( offset, 54 );
            assert_eq!( header_end, 66 );
        },
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn v4_masks_and_undecoded_fields() {
    let writer = BmpWriter::new( 108, 2, -1, 32 )
        .bitfields( 0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000 )
        .rows( vec![ vec![ 1, 2, 3, 4, 5, 6, 7, 8 ] ] );

    let bitmap = decode_bytes( &writer.encode() ).unwrap();

    assert_eq!( bitmap.pixel_data_offset(), 122 );
    assert_eq!( bitmap.masks().unwrap().alpha, 0xFF000000 );
    assert_eq!( bitmap.pixels().pixel( 1, 0 ), Some( &[ 5u8, 6, 7, 8 ][..] ) );

    match bitmap.info() {
        InfoHeader::V4( v4 ) => assert_eq!( v4.undecoded_len, 52 ),
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn default_masks_for_uncompressed_high_color() {
    let bytes = BmpWriter::v3( 2, 1, 16 ).rows( vec![ vec![ 0x1F, 0x00, 0x00, 0x7C ] ] ).encode();
    let bitmap = decode_bytes( &bytes ).unwrap();

    assert_eq!( bitmap.masks(), BitMasks::default_for( 16 ) );
    assert_eq!( bitmap.pixels().stride(), 4 );
}

#[test]
fn v2_palette_uses_triples() {
    let mut writer = BmpWriter::new( 12, 3, 1, 8 ).rows( vec![ vec![ 0, 1, 0 ] ] );
    writer.palette = ( 0..256 ).map( |i| [ i as u8, 0, 255 - i as u8, 0 ] ).collect();
    let bytes = writer.encode();

    let bitmap = decode_bytes( &bytes ).unwrap();
    let palette = bitmap.palette().unwrap();

    assert_eq!( bitmap.pixel_data_offset(), 14 + 12 + 768 );
    assert_eq!( palette.len(), 256 );
    assert_eq!( palette.get( 1 ).unwrap().blue, 1 );
    assert_eq!( palette.get( 1 ).unwrap().red, 254 );
    assert_eq!( bitmap.pixels().as_bytes(), &[ 0, 1, 0 ] );
}

#[test]
fn zero_offset_accounts_for_palette() {
    let mut writer = BmpWriter::v3( 2, 2, 8 ).rows( vec![ vec![ 1, 0 ], vec![ 0, 1 ] ] );
    writer.colors_used = 2;
    writer.palette = vec![ [ 0, 0, 0, 0 ], [ 255, 255, 255, 0 ] ];
    writer.data_offset = Some( 0 );

    let bitmap = decode_bytes( &writer.encode() ).unwrap();

    assert_eq!( bitmap.file_header().pixel_data_offset, 0 );
    assert_eq!( bitmap.pixel_data_offset(), 54 + 8 );
    assert_eq!( bitmap.pixels().as_bytes(), &[ 0, 1, 1, 0 ] );
}

#[test]
fn unaddressable_dimensions_are_invalid_geometry() {
    let bytes = BmpWriter::v3( i32::MAX, i32::MAX, 32 ).encode();

    match decode_bytes( &bytes ) {
        Err( e @ DecodeError::InvalidGeometry( _ ) ) => assert!( !e.is_unsupported() ),
        other => panic!( "unexpected {:?}", other ),
    }
}

#[test]
fn zero_width_is_invalid_geometry() {
    let bytes = BmpWriter::v3( 0, 1, 24 ).encode();
    assert!( matches!( decode_bytes( &bytes ), Err( DecodeError::InvalidGeometry( _ ) ) ) );

    let bytes = BmpWriter::v3( -3, 1, 24 ).encode();
    assert!( matches!( decode_bytes( &bytes ), Err( DecodeError::InvalidGeometry( _ ) ) ) );
}

#[test]
fn limits_stop_large_images() {
    let bytes = BmpWriter::v3( 4, 4, 24 ).rows( vec![ vec![ 0; 12 ]; 4 ] ).encode();

    let limits = Limits { max_pixels: Some( 15 ), ..Limits::default() };
    assert!( matches!(
        decode_with_limits( Cursor::new( &bytes[..] ), &limits ),
        Err( DecodeError::LimitExceeded( _ ) ) ) );

    let limits = Limits { max_memory_bytes: Some( 48 ), ..Limits::default() };
    assert!( decode_with_limits( Cursor::new( &bytes[..] ), &limits ).is_ok() );
}

#[test]
fn bitmaps_decode_independently_across_threads() {
    let bytes = BmpWriter::v3( 2, 2, 24 )
        .rows( vec![ row( &[ BLUE, WHITE ] ), row( &[ RED, GREEN ] ) ] )
        .encode();

    let handles: Vec<_> = ( 0..4 )
        .map( |_| {
            let bytes = bytes.clone();
            std::thread::spawn( move || decode( Cursor::new( bytes ) ).map( |b| b.into_pixels().into_vec() ) )
        } )
        .collect();

    for handle in handles {
        let pixels = handle.join().unwrap().unwrap();
        assert_eq!( &pixels[ .. 3 ], &RED[..] );
    }
}
