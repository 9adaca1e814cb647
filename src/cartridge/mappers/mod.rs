// Mappers module - Implementations of various NES cartridge mappers
//
// This module contains the mapper factory and individual mapper implementations.
// Each mapper handles memory mapping and banking for different cartridge types.

mod mapper0;
mod mapper1;
mod mapper2;
mod mapper4;

use super::{Cartridge, Mapper};
use mapper0::Mapper0;
use mapper1::Mapper1;
use mapper2::Mapper2;
use mapper4::Mapper4;
use thiserror::Error;

/// Error type for mapper creation
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
    #[error("invalid mapper configuration: {0}")]
    InvalidConfiguration(String),
}

/// Mapper numbers this crate implements (NROM, MMC1, UxROM, MMC3).
pub fn is_supported(mapper: u8) -> bool {
    matches!(mapper, 0 | 1 | 2 | 4)
}

/// Create a mapper instance based on the mapper number in the cartridge
///
/// # Errors
/// Returns `MapperError::UnsupportedMapper` if the mapper number is not implemented
pub fn create_mapper(cartridge: Cartridge) -> Result<Box<dyn Mapper>, MapperError> {
    match cartridge.mapper {
        0 => Ok(Box::new(Mapper0::new(cartridge))),
        1 => Ok(Box::new(Mapper1::new(cartridge))),
        2 => Ok(Box::new(Mapper2::new(cartridge))),
        4 => Ok(Box::new(Mapper4::new(cartridge))),
        mapper_num => Err(MapperError::UnsupportedMapper(mapper_num)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;

    #[test]
    fn test_mapper0_creation() {
        let cartridge = Cartridge {
            prg_rom: vec![0xAA; 16 * 1024],
            chr_rom: vec![0xBB; 8 * 1024],
            trainer: None,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        };

        let result = create_mapper(cartridge);
        assert!(result.is_ok());

        let mapper = result.unwrap();
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn test_mapper1_and_4_creation() {
        let cartridge = Cartridge {
            prg_rom: vec![0; 16 * 16 * 1024],
            chr_rom: vec![0; 32 * 4 * 1024],
            trainer: None,
            mapper: 1,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        };
        assert!(create_mapper(cartridge).is_ok());

        let cartridge = Cartridge {
            prg_rom: vec![0; 16 * 8 * 1024],
            chr_rom: vec![0; 128 * 1024],
            trainer: None,
            mapper: 4,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        };
        assert!(create_mapper(cartridge).is_ok());
    }

    #[test]
    fn test_unsupported_mapper() {
        let mut cartridge = Cartridge::new();
        cartridge.mapper = 99;

        let result = create_mapper(cartridge);
        assert!(matches!(result, Err(MapperError::UnsupportedMapper(99))));
    }
}
