// Mapper 4 (MMC3) - One of the most important and complex NES mappers
//
// Memory Layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM (optional, battery-backed in some games)
// - CPU $8000-$9FFF: 8KB PRG-ROM bank (switchable or fixed depending on mode)
// - CPU $A000-$BFFF: 8KB PRG-ROM bank (always switchable)
// - CPU $C000-$DFFF: 8KB PRG-ROM bank (switchable or fixed depending on mode)
// - CPU $E000-$FFFF: 8KB PRG-ROM bank (fixed to last bank)
// - PPU $0000-$07FF: 2KB CHR bank (switchable)
// - PPU $0800-$0FFF: 2KB CHR bank (switchable)
// - PPU $1000-$13FF: 1KB CHR bank (switchable)
// - PPU $1400-$17FF: 1KB CHR bank (switchable)
// - PPU $1800-$1BFF: 1KB CHR bank (switchable)
// - PPU $1C00-$1FFF: 1KB CHR bank (switchable)
//
// Features:
// - Configurable PRG-ROM banking modes (8KB switchable banks)
// - Configurable CHR-ROM banking modes (1KB/2KB switchable banks)
// - Scanline counter for IRQ generation
// - Dynamic mirroring control
// - PRG-ROM size: up to 512KB
// - CHR-ROM size: up to 256KB
//
// Register Interface:
// - $8000-$9FFE (even): Bank select register
//   Bit 7: PRG-ROM bank mode (0 = $8000 switchable, 1 = $C000 switchable)
//   Bit 6: CHR A12 inversion (0 = two 2KB banks at $0000, 1 = two 2KB banks at $1000)
//   Bits 0-2: Bank register to update (0-7)
//
// - $8001-$9FFF (odd): Bank data register
//   Updates the bank register selected by $8000
//
// - $A000-$BFFE (even): Mirroring register
//   Bit 0: Mirroring (0 = vertical, 1 = horizontal)
//
// - $A001-$BFFF (odd): PRG-RAM protect register
//   Bit 7: PRG-RAM chip enable (0 = disabled, 1 = enabled)
//   Bit 6: Write protect (0 = read-only, 1 = read/write)
//
// - $C000-$DFFE (even): IRQ latch register
//   Sets the IRQ counter reload value
//
// - $C001-$DFFF (odd): IRQ reload register
//   Reloads the IRQ counter with the latch value
//
// - $E000-$FFFE (even): IRQ disable register
//   Disables IRQ generation and acknowledges pending IRQs
//
// - $E001-$FFFF (odd): IRQ enable register
//   Enables IRQ generation

use crate::cartridge::{Cartridge, Mapper, Mirroring};

/// PRG-ROM bank size (8KB)
const PRG_BANK_SIZE: usize = 8 * 1024;

/// CHR-ROM 1KB bank size
const CHR_1KB_BANK_SIZE: usize = 1024;

/// PRG-RAM size (8KB)
const PRG_RAM_SIZE: usize = 8 * 1024;

/// Mapper 4 implementation (MMC3)
///
/// MMC3 is one of the most common NES mappers, used by games like:
/// - Super Mario Bros. 3
/// - Mega Man 3, 4, 5, 6
/// - Kirby's Adventure
/// - Super Mario Bros. 2 (USA)
/// - Crystalis
pub struct Mapper4 {
    /// PRG-ROM data
    prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM data
    chr_mem: Vec<u8>,
    /// PRG-RAM (8KB, battery-backed in some games)
    prg_ram: Vec<u8>,
    /// Whether CHR memory is RAM (writable) or ROM (read-only)
    chr_is_ram: bool,

    // Internal registers
    /// Bank select register (which bank register to update)
    bank_select: u8,
    /// Bank data registers (8 registers for different banks)
    bank_registers: [u8; 8],
    /// Current mirroring mode
    mirroring: Mirroring,
    /// PRG-RAM protection (bit 7: enable, bit 6: write protect)
    prg_ram_protect: u8,

    // IRQ registers
    /// IRQ latch value (reload value for counter)
    irq_latch: u8,
    /// IRQ counter (decrements each scanline)
    irq_counter: u8,
    /// IRQ reload flag (reload counter on next scanline)
    irq_reload: bool,
    /// IRQ enabled flag
    irq_enabled: bool,
    /// IRQ pending flag (set when counter reaches 0)
    irq_pending: bool,

    // Derived state
    /// Number of 8KB PRG-ROM banks
    prg_banks: usize,
    /// Number of 1KB CHR banks
    chr_banks: usize,
}

impl Mapper4 {
    /// Create a new Mapper4 instance from a cartridge
    ///
    /// # Arguments
    /// * `cartridge` - The cartridge containing ROM data
    pub fn new(cartridge: Cartridge) -> Self {
        let prg_rom_size = cartridge.prg_rom.len();
        let chr_mem_size = cartridge.chr_rom.len();

        // Calculate number of banks
        let prg_banks = prg_rom_size / PRG_BANK_SIZE;
        let chr_banks = chr_mem_size / CHR_1KB_BANK_SIZE;

        // CHR-RAM is indicated by all zeros in chr_rom
        let chr_is_ram = chr_mem_size == 8 * 1024 && cartridge.chr_rom.iter().all(|&b| b == 0);

        Mapper4 {
            prg_rom: cartridge.prg_rom,
            chr_mem: cartridge.chr_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr_is_ram,

            // Initialize registers to power-on state
            bank_select: 0,
            bank_registers: [0, 0, 0, 0, 0, 0, 0, 0],
            mirroring: cartridge.mirroring,
            prg_ram_protect: 0,

            // Initialize IRQ state
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,

            prg_banks,
            chr_banks,
        }
    }

    /// Get PRG-ROM bank mode from bank select register
    /// Returns true if $C000 is switchable, false if $8000 is switchable
    fn prg_bank_mode(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    /// Get CHR A12 inversion from bank select register
    /// Returns true if two 2KB banks are at $1000, false if at $0000
    fn chr_a12_inversion(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    /// Map CPU address to PRG-ROM offset
    fn map_prg_address(&self, address: u16) -> usize {
        let bank = match address {
            0x8000..=0x9FFF => {
                // First 8KB bank
                if self.prg_bank_mode() {
                    // Fixed to second-to-last bank
                    self.prg_banks - 2
                } else {
                    // Switchable via R6
                    self.bank_registers[6] as usize
                }
            }
            0xA000..=0xBFFF => {
                // Second 8KB bank (always switchable via R7)
                self.bank_registers[7] as usize
            }
            0xC000..=0xDFFF => {
                // Third 8KB bank
                if self.prg_bank_mode() {
                    // Switchable via R6
                    self.bank_registers[6] as usize
                } else {
                    // Fixed to second-to-last bank
                    self.prg_banks - 2
                }
            }
            0xE000..=0xFFFF => {
                // Last 8KB bank (always fixed to last bank)
                self.prg_banks - 1
            }
            _ => 0,
        };

        let offset = (address & 0x1FFF) as usize; // 8KB bank offset
        (bank % self.prg_banks) * PRG_BANK_SIZE + offset
    }

    /// Map PPU address to CHR offset
    fn map_chr_address(&self, address: u16) -> usize {
        let inversion = self.chr_a12_inversion();

        let bank = match address {
            0x0000..=0x03FF => {
                // First 1KB slot
                if inversion {
                    self.bank_registers[2] as usize
                } else {
                    (self.bank_registers[0] & 0xFE) as usize // 2KB bank, use even
                }
            }
            0x0400..=0x07FF => {
                // Second 1KB slot
                if inversion {
                    self.bank_registers[3] as usize
                } else {
                    ((self.bank_registers[0] & 0xFE) | 1) as usize // 2KB bank, use odd
                }
            }
            0x0800..=0x0BFF => {
                // Third 1KB slot
                if inversion {
                    self.bank_registers[4] as usize
                } else {
                    (self.bank_registers[1] & 0xFE) as usize // 2KB bank, use even
                }
            }
            0x0C00..=0x0FFF => {
                // Fourth 1KB slot
                if inversion {
                    self.bank_registers[5] as usize
                } else {
                    ((self.bank_registers[1] & 0xFE) | 1) as usize // 2KB bank, use odd
                }
            }
            0x1000..=0x13FF => {
                // Fifth 1KB slot
                if inversion {
                    (self.bank_registers[0] & 0xFE) as usize // 2KB bank, use even
                } else {
                    self.bank_registers[2] as usize
                }
            }
            0x1400..=0x17FF => {
                // Sixth 1KB slot
                if inversion {
                    ((self.bank_registers[0] & 0xFE) | 1) as usize // 2KB bank, use odd
                } else {
                    self.bank_registers[3] as usize
                }
            }
            0x1800..=0x1BFF => {
                // Seventh 1KB slot
                if inversion {
                    (self.bank_registers[1] & 0xFE) as usize // 2KB bank, use even
                } else {
                    self.bank_registers[4] as usize
                }
            }
            0x1C00..=0x1FFF => {
                // Eighth 1KB slot
                if inversion {
                    ((self.bank_registers[1] & 0xFE) | 1) as usize // 2KB bank, use odd
                } else {
                    self.bank_registers[5] as usize
                }
            }
            _ => 0,
        };

        let offset = (address & 0x03FF) as usize; // 1KB bank offset
        (bank % self.chr_banks) * CHR_1KB_BANK_SIZE + offset
    }

    /// Clock the IRQ counter. Called via `Mapper::irq_tick` on every PPU A12 rising edge.
    pub fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter = self.irq_counter.wrapping_sub(1);
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    /// Check if an IRQ is pending
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Clear the pending IRQ
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }
}

impl Mapper for Mapper4 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            // PRG-RAM
            0x6000..=0x7FFF => {
                // Check if PRG-RAM is enabled
                if self.prg_ram_protect & 0x80 != 0 {
                    let index = (address - 0x6000) as usize;
                    self.prg_ram[index % PRG_RAM_SIZE]
                } else {
                    0 // PRG-RAM disabled, return open bus (simplified as 0)
                }
            }
            // PRG-ROM
            0x8000..=0xFFFF => {
                let index = self.map_prg_address(address);
                self.prg_rom[index]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            // PRG-RAM
            0x6000..=0x7FFF => {
                // Check if PRG-RAM is enabled and writable
                if self.prg_ram_protect & 0x80 != 0 && self.prg_ram_protect & 0x40 != 0 {
                    let index = (address - 0x6000) as usize;
                    self.prg_ram[index % PRG_RAM_SIZE] = value;
                }
            }
            // Mapper registers
            0x8000..=0xFFFF => {
                match address & 0xE001 {
                    // Bank select ($8000-$9FFE, even)
                    0x8000 => {
                        self.bank_select = value;
                    }
                    // Bank data ($8001-$9FFF, odd)
                    0x8001 => {
                        let reg = (self.bank_select & 0x07) as usize;
                        self.bank_registers[reg] = value;
                    }
                    // Mirroring ($A000-$BFFE, even)
                    0xA000 => {
                        self.mirroring = if value & 0x01 != 0 {
                            Mirroring::Horizontal
                        } else {
                            Mirroring::Vertical
                        };
                    }
                    // PRG-RAM protect ($A001-$BFFF, odd)
                    0xA001 => {
                        self.prg_ram_protect = value;
                    }
                    // IRQ latch ($C000-$DFFE, even)
                    0xC000 => {
                        self.irq_latch = value;
                    }
                    // IRQ reload ($C001-$DFFF, odd)
                    0xC001 => {
                        self.irq_reload = true;
                    }
                    // IRQ disable ($E000-$FFFE, even)
                    0xE000 => {
                        self.irq_enabled = false;
                        self.irq_pending = false;
                    }
                    // IRQ enable ($E001-$FFFF, odd)
                    0xE001 => {
                        self.irq_enabled = true;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn ppu_read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => {
                let index = self.map_chr_address(address);
                self.chr_mem[index % self.chr_mem.len()]
            }
            _ => 0,
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            if let 0x0000..=0x1FFF = address {
                let chr_len = self.chr_mem.len();
                let index = self.map_chr_address(address);
                self.chr_mem[index % chr_len] = value;
            }
        }
        // Writes to CHR-ROM are ignored
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn prg_ram(&self) -> Option<&[u8]> {
        Some(&self.prg_ram)
    }

    fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.prg_ram)
    }

    fn irq_tick(&mut self) {
        self.clock_irq_counter();
    }

    fn irq_pending(&self) -> bool {
        Mapper4::irq_pending(self)
    }

    fn clear_irq(&mut self) {
        Mapper4::clear_irq(self)
    }
}
