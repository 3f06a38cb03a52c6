use crate::error::{
    DecodeError,
    Result,
};

/// Resource limits applied before the pixel buffer is allocated.
///
/// All fields default to `None` (no limit).
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum size of the decoded pixel buffer in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    pub( crate ) fn check( &self, width: u32, height: u32 ) -> Result<()> {
        if let Some( max ) = self.max_width {
            if width as u64 > max {
                return Err( DecodeError::LimitExceeded(
                    format!( "width {} exceeds limit {}", width, max ) ) );
            }
        }
        if let Some( max ) = self.max_height {
            if height as u64 > max {
                return Err( DecodeError::LimitExceeded(
                    format!( "height {} exceeds limit {}", height, max ) ) );
            }
        }
        if let Some( max ) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max {
                return Err( DecodeError::LimitExceeded(
                    format!( "pixel count {} exceeds limit {}", pixels, max ) ) );
            }
        }
        Ok( () )
    }

    pub( crate ) fn check_memory( &self, bytes: usize ) -> Result<()> {
        if let Some( max ) = self.max_memory_bytes {
            if bytes as u64 > max {
                return Err( DecodeError::LimitExceeded(
                    format!( "allocation of {} bytes exceeds limit {}", bytes, max ) ) );
            }
        }
        Ok( () )
    }
}

#[cfg( test )]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        let limits = Limits::default();
        assert!( limits.check( u32::MAX, u32::MAX ).is_ok() );
        assert!( limits.check_memory( usize::MAX ).is_ok() );
    }

    #[test]
    fn dimension_limits() {
        let limits = Limits {
            max_width: Some( 100 ),
            max_height: Some( 50 ),
            max_pixels: Some( 1000 ),
            ..Limits::default()
        };

        assert!( limits.check( 100, 10 ).is_ok() );
        assert!( matches!( limits.check( 101, 1 ), Err( DecodeError::LimitExceeded( _ ) ) ) );
        assert!( matches!( limits.check( 1, 51 ), Err( DecodeError::LimitExceeded( _ ) ) ) );
        assert!( matches!( limits.check( 40, 40 ), Err( DecodeError::LimitExceeded( _ ) ) ) );
    }

    #[test]
    fn memory_limit() {
        let limits = Limits { max_memory_bytes: Some( 64 ), ..Limits::default() };
        assert!( limits.check_memory( 64 ).is_ok() );
        assert!( limits.check_memory( 65 ).is_err() );
    }
}
