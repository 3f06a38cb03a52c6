#![allow( dead_code )]

use byteorder::{
    LittleEndian,
    WriteBytesExt,
};

/// Builds synthetic bitmap files. Rows are given in file order, without
/// padding.
pub struct BmpWriter {
    pub magic: u16,
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub colors_used: u32,
    pub masks: [ u32; 4 ],
    pub write_masks: bool,
    pub palette: Vec<[ u8; 4 ]>,
    /// Declared pixel data offset. Computed from the headers when `None`.
    pub data_offset: Option<u32>,
    pub padding_byte: u8,
    pub rows: Vec<Vec<u8>>,
}

impl BmpWriter {
    pub fn new( header_size: u32, width: i32, height: i32, bit_count: u16 ) -> BmpWriter {
        BmpWriter {
            magic: 0x4D42,
            header_size,
            width,
            height,
            planes: 1,
            bit_count,
            compression: 0,
            colors_used: 0,
            masks: [ 0; 4 ],
            write_masks: false,
            palette: Vec::new(),
            data_offset: None,
            padding_byte: 0,
            rows: Vec::new(),
        }
    }

    pub fn v3( width: i32, height: i32, bit_count: u16 ) -> BmpWriter {
        BmpWriter::new( 40, width, height, bit_count )
    }

    pub fn rows( mut self, rows: Vec<Vec<u8>> ) -> BmpWriter {
        self.rows = rows;
        self
    }

    pub fn bitfields( mut self, red: u32, green: u32, blue: u32, alpha: u32 ) -> BmpWriter {
        self.compression = 3;
        self.masks = [ red, green, blue, alpha ];
        self.write_masks = true;
        self
    }

    fn info_header( &self ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>( self.header_size ).unwrap();

        if self.header_size == 12 {
            buf.write_i16::<LittleEndian>( self.width as i16 ).unwrap();
            buf.write_i16::<LittleEndian>( self.height as i16 ).unwrap();
            buf.write_u16::<LittleEndian>( self.planes ).unwrap();
            buf.write_u16::<LittleEndian>( self.bit_count ).unwrap();
            return buf;
        }

        buf.write_i32::<LittleEndian>( self.width ).unwrap();
        buf.write_i32::<LittleEndian>( self.height ).unwrap();
        buf.write_u16::<LittleEndian>( self.planes ).unwrap();
        buf.write_u16::<LittleEndian>( self.bit_count ).unwrap();
        buf.write_u32::<LittleEndian>( self.compression ).unwrap();
        buf.write_u32::<LittleEndian>( 0 ).unwrap(); // size_image
        buf.write_i32::<LittleEndian>( 2835 ).unwrap();
        buf.write_i32::<LittleEndian>( 2835 ).unwrap();
        buf.write_u32::<LittleEndian>( self.colors_used ).unwrap();
        buf.write_u32::<LittleEndian>( 0 ).unwrap();

        if self.header_size > 40 {
            for mask in &self.masks {
                buf.write_u32::<LittleEndian>( *mask ).unwrap();
            }
            buf.resize( self.header_size as usize, 0x5A );
        } else if self.write_masks {
            for mask in &self.masks[ .. 3 ] {
                buf.write_u32::<LittleEndian>( *mask ).unwrap();
            }
        }

        buf
    }

    fn palette_bytes( &self ) -> Vec<u8> {
        let mut buf = Vec::new();
        for entry in &self.palette {
            let len = if self.header_size == 12 { 3 } else { 4 };
            buf.extend_from_slice( &entry[ .. len ] );
        }
        buf
    }

    pub fn computed_offset( &self ) -> u32 {
        14 + self.info_header().len() as u32 + self.palette_bytes().len() as u32
    }

    pub fn encode( &self ) -> Vec<u8> {
        let info = self.info_header();
        let palette = self.palette_bytes();
        let offset = self.data_offset.unwrap_or( self.computed_offset() );

        let mut pixels = Vec::new();
        for row in &self.rows {
            pixels.extend_from_slice( row );
            while pixels.len() % 4 != 0 {
                pixels.push( self.padding_byte );
            }
        }

        let file_size = 14 + info.len() + palette.len() + pixels.len();

        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>( self.magic ).unwrap();
        buf.write_u32::<LittleEndian>( file_size as u32 ).unwrap();
        buf.write_u16::<LittleEndian>( 0 ).unwrap();
        buf.write_u16::<LittleEndian>( 0 ).unwrap();
        buf.write_u32::<LittleEndian>( offset ).unwrap();
        buf.extend_from_slice( &info );
        buf.extend_from_slice( &palette );
        buf.extend_from_slice( &pixels );
        buf
    }
}
