// Cartridge module - iNES ROM loading, cartridge data model, and mapper abstraction

pub mod mappers;

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Nametable mirroring mode, as selected by the cartridge/mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    /// One-screen mirroring, fixed to the lower nametable
    SingleScreen,
    /// One-screen mirroring, fixed to the upper nametable (MMC1 one-screen-upper)
    SingleScreenUpper,
    FourScreen,
}

/// Errors that can occur while parsing an iNES ROM image
#[derive(Debug, Error)]
pub enum INesError {
    #[error("not an iNES file: missing 'NES\\x1A' magic number")]
    BadMagic,
    #[error("file too short to contain an iNES header")]
    TooShort,
    #[error("unsupported mapper number {0}")]
    UnsupportedMapper(u8),
    #[error("PRG-ROM size is zero")]
    EmptyPrgRom,
    #[error("file is shorter than its header declares (need {expected} bytes, got {actual})")]
    TruncatedData { expected: usize, actual: usize },
    #[error("I/O error reading ROM file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed iNES v1 header (bytes 0-15 of the file)
#[derive(Debug, Clone, Copy)]
pub struct INesHeader {
    /// Number of 16 KiB PRG-ROM banks
    pub prg_rom_banks: u8,
    /// Number of 8 KiB CHR-ROM banks (0 means the cartridge uses CHR-RAM)
    pub chr_rom_banks: u8,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
}

const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A]; // "NES\x1A"
const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;
const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;

impl INesHeader {
    fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self, INesError> {
        if bytes[0..4] != INES_MAGIC {
            return Err(INesError::BadMagic);
        }

        let prg_rom_banks = bytes[4];
        let chr_rom_banks = bytes[5];
        let flags6 = bytes[6];
        let flags7 = bytes[7];

        let mapper = (flags7 & 0xF0) | (flags6 >> 4);
        let four_screen = flags6 & 0x08 != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(INesHeader {
            prg_rom_banks,
            chr_rom_banks,
            mapper,
            mirroring,
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
        })
    }
}

/// A loaded NES cartridge: ROM/RAM data plus the header fields mappers need
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// CHR memory: ROM data if `header.chr_rom_banks > 0`, otherwise a zeroed 8 KiB CHR-RAM bank
    /// (mappers that support larger CHR-RAM sizes resize it themselves)
    pub chr_rom: Vec<u8>,
    pub trainer: Option<[u8; TRAINER_SIZE]>,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
}

impl Cartridge {
    /// Placeholder cartridge used only to satisfy `Default`-style construction in tests
    pub fn new() -> Self {
        Cartridge {
            prg_rom: vec![0; PRG_BANK_SIZE],
            chr_rom: vec![0; CHR_BANK_SIZE],
            trainer: None,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        }
    }

    /// Parse a complete iNES file image already read into memory
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, INesError> {
        if data.len() < HEADER_SIZE {
            return Err(INesError::TooShort);
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&data[0..HEADER_SIZE]);
        let header = INesHeader::parse(&header_bytes)?;

        if header.prg_rom_banks == 0 {
            return Err(INesError::EmptyPrgRom);
        }
        if !mappers::is_supported(header.mapper) {
            return Err(INesError::UnsupportedMapper(header.mapper));
        }

        let mut offset = HEADER_SIZE;
        let trainer = if header.has_trainer {
            let end = offset + TRAINER_SIZE;
            if data.len() < end {
                return Err(INesError::TruncatedData {
                    expected: end,
                    actual: data.len(),
                });
            }
            let mut buf = [0u8; TRAINER_SIZE];
            buf.copy_from_slice(&data[offset..end]);
            offset = end;
            Some(buf)
        } else {
            None
        };

        let prg_size = header.prg_rom_banks as usize * PRG_BANK_SIZE;
        let prg_end = offset + prg_size;
        if data.len() < prg_end {
            return Err(INesError::TruncatedData {
                expected: prg_end,
                actual: data.len(),
            });
        }
        let prg_rom = data[offset..prg_end].to_vec();
        offset = prg_end;

        let chr_rom = if header.chr_rom_banks > 0 {
            let chr_size = header.chr_rom_banks as usize * CHR_BANK_SIZE;
            let chr_end = offset + chr_size;
            if data.len() < chr_end {
                return Err(INesError::TruncatedData {
                    expected: chr_end,
                    actual: data.len(),
                });
            }
            data[offset..chr_end].to_vec()
        } else {
            // CHR-RAM: mappers detect this via chr_rom_banks == 0, not a content heuristic
            vec![0; CHR_BANK_SIZE]
        };

        log::info!(
            "loaded cartridge: mapper {} ({} x 16KiB PRG, {} x 8KiB CHR{}, mirroring {:?})",
            header.mapper,
            header.prg_rom_banks,
            header.chr_rom_banks,
            if header.chr_rom_banks == 0 { " (RAM)" } else { "" },
            header.mirroring,
        );

        Ok(Cartridge {
            prg_rom,
            chr_rom,
            trainer,
            mapper: header.mapper,
            mirroring: header.mirroring,
            has_battery: header.has_battery,
        })
    }

    /// Read and parse an iNES ROM file from disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, INesError> {
        let data = fs::read(path)?;
        Self::from_ines_bytes(&data)
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-byte mapper-to-bus interface shared by all cartridge mappers, plus the
/// IRQ and mirroring hooks the PPU/bus need.
pub trait Mapper {
    fn cpu_read(&self, address: u16) -> u8;
    fn cpu_write(&mut self, address: u16, value: u8);
    fn ppu_read(&self, address: u16) -> u8;
    fn ppu_write(&mut self, address: u16, value: u8);
    fn mirroring(&self) -> Mirroring;

    /// Cartridge-backed PRG-RAM, for save states. `None` if the mapper has none.
    fn prg_ram(&self) -> Option<&[u8]> {
        None
    }
    fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        None
    }

    /// Called by the PPU on every A12 rising edge (see SPEC_FULL.md §4.3/§4.5). Only MMC3 uses
    /// this; other mappers keep the default no-op.
    fn irq_tick(&mut self) {}
    fn irq_pending(&self) -> bool {
        false
    }
    fn clear_irq(&mut self) {}

    /// Re-initialize mapper registers to power-on state without discarding ROM/RAM contents.
    fn reset(&mut self) {}
}
