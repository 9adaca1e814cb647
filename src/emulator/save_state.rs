// Save state functionality
//
// Implements serialization and deserialization of the complete emulator state
// to enable save states and quick save/load functionality.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during save state operations
#[derive(Debug)]
pub enum SaveStateError {
    /// I/O error
    Io(io::Error),

    /// Serialization/deserialization error
    Serialization(serde_json::Error),

    /// Save state version mismatch
    VersionMismatch { expected: u32, found: u32 },

    /// No ROM loaded
    NoRomLoaded,
}

impl std::fmt::Display for SaveStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStateError::Io(e) => write!(f, "I/O error: {}", e),
            SaveStateError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SaveStateError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveStateError::NoRomLoaded => write!(f, "No ROM loaded"),
        }
    }
}

impl std::error::Error for SaveStateError {}

impl From<io::Error> for SaveStateError {
    fn from(e: io::Error) -> Self {
        SaveStateError::Io(e)
    }
}

impl From<serde_json::Error> for SaveStateError {
    fn from(e: serde_json::Error) -> Self {
        SaveStateError::Serialization(e)
    }
}

/// Current save state format version
const SAVE_STATE_VERSION: u32 = 1;

/// Complete emulator save state
///
/// Contains all the state needed to restore the emulator to an exact point in time.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    /// Version number for compatibility checking
    version: u32,

    /// Timestamp when the save state was created
    timestamp: String,

    /// ROM identifier (file name for validation)
    rom_name: Option<String>,

    /// CPU state
    cpu_state: CpuState,

    /// PPU state (placeholder for now)
    ppu_state: PpuState,

    /// APU state
    apu_state: ApuState,

    /// RAM contents
    ram: Vec<u8>,

    /// VRAM contents (nametables)
    vram: Vec<u8>,

    /// Palette RAM
    palette_ram: Vec<u8>,

    /// OAM (sprite memory)
    oam: Vec<u8>,

    /// Cartridge RAM (if battery-backed)
    cartridge_ram: Option<Vec<u8>>,
}

/// CPU state for serialization
#[derive(Debug, Serialize, Deserialize)]
struct CpuState {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    status: u8,
    cycles: u64,
}

/// PPU state for serialization (placeholder)
#[derive(Debug, Serialize, Deserialize)]
struct PpuState {
    // PPU registers
    ppuctrl: u8,
    ppumask: u8,
    ppustatus: u8,
    oam_addr: u8,

    // Internal scroll registers
    v: u16,
    t: u16,
    fine_x: u8,
    write_latch: bool,
    read_buffer: u8,

    // Timing
    scanline: u16,
    cycle: u16,
    frame: u64,
}

/// Envelope generator state
#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeState {
    start: bool,
    divider: u8,
    decay_level: u8,
    period: u8,
    loop_flag: bool,
    constant_volume: bool,
}

/// Length counter state, shared by every channel but DMC
#[derive(Debug, Serialize, Deserialize)]
struct LengthCounterState {
    counter: u8,
    halt: bool,
}

/// Sweep unit state (pulse channels only)
#[derive(Debug, Serialize, Deserialize)]
struct SweepState {
    enabled: bool,
    divider: u8,
    period: u8,
    negate: bool,
    shift: u8,
    reload: bool,
}

/// Timer state, shared by every channel
#[derive(Debug, Serialize, Deserialize)]
struct TimerState {
    period: u16,
    counter: u16,
}

/// Linear counter state (triangle channel only)
#[derive(Debug, Serialize, Deserialize)]
struct LinearCounterState {
    counter: u8,
    reload_value: u8,
    control_flag: bool,
    reload_flag: bool,
}

/// Pulse channel state (used for both pulse 1 and pulse 2)
#[derive(Debug, Serialize, Deserialize)]
struct PulseState {
    enabled: bool,
    duty: u8,
    duty_position: u8,
    envelope: EnvelopeState,
    sweep: SweepState,
    length_counter: LengthCounterState,
    timer: TimerState,
}

/// Triangle channel state
#[derive(Debug, Serialize, Deserialize)]
struct TriangleState {
    enabled: bool,
    linear_counter: LinearCounterState,
    length_counter: LengthCounterState,
    timer: TimerState,
    sequence_position: u8,
}

/// Noise channel state
#[derive(Debug, Serialize, Deserialize)]
struct NoiseState {
    enabled: bool,
    envelope: EnvelopeState,
    length_counter: LengthCounterState,
    timer: TimerState,
    lfsr: u16,
    mode: bool,
}

/// DMC channel state
#[derive(Debug, Serialize, Deserialize)]
struct DmcState {
    enabled: bool,
    irq_enabled: bool,
    loop_flag: bool,
    timer: TimerState,
    sample_address: u16,
    sample_length: u16,
    current_address: u16,
    bytes_remaining: u16,
    sample_buffer: u8,
    sample_buffer_empty: bool,
    shift_register: u8,
    bits_remaining: u8,
    output_level: u8,
    silence_flag: bool,
    irq_flag: bool,
}

/// Frame sequencer state
#[derive(Debug, Serialize, Deserialize)]
struct FrameCounterState {
    five_step_mode: bool,
    cycle: u32,
    step: usize,
    irq_inhibit: bool,
    irq_pending: bool,
    reset_pending: bool,
    write_delay: u8,
}

/// APU state for serialization
#[derive(Debug, Serialize, Deserialize)]
struct ApuState {
    pulse1: PulseState,
    pulse2: PulseState,
    triangle: TriangleState,
    noise: NoiseState,
    dmc: DmcState,
    frame_counter: FrameCounterState,
    cpu_cycle_parity: bool,
}

fn capture_envelope(envelope: &crate::apu::components::Envelope) -> EnvelopeState {
    EnvelopeState {
        start: envelope.start,
        divider: envelope.divider,
        decay_level: envelope.decay_level,
        period: envelope.period,
        loop_flag: envelope.loop_flag,
        constant_volume: envelope.constant_volume,
    }
}

fn restore_envelope(envelope: &mut crate::apu::components::Envelope, state: &EnvelopeState) {
    envelope.start = state.start;
    envelope.divider = state.divider;
    envelope.decay_level = state.decay_level;
    envelope.period = state.period;
    envelope.loop_flag = state.loop_flag;
    envelope.constant_volume = state.constant_volume;
}

fn capture_sweep(sweep: &crate::apu::components::Sweep) -> SweepState {
    SweepState {
        enabled: sweep.enabled,
        divider: sweep.divider,
        period: sweep.period,
        negate: sweep.negate,
        shift: sweep.shift,
        reload: sweep.reload,
    }
}

fn restore_sweep(sweep: &mut crate::apu::components::Sweep, state: &SweepState) {
    sweep.enabled = state.enabled;
    sweep.divider = state.divider;
    sweep.period = state.period;
    sweep.negate = state.negate;
    sweep.shift = state.shift;
    sweep.reload = state.reload;
}

fn capture_length_counter(counter: &crate::apu::components::LengthCounter) -> LengthCounterState {
    LengthCounterState {
        counter: counter.counter,
        halt: counter.halt,
    }
}

fn restore_length_counter(
    counter: &mut crate::apu::components::LengthCounter,
    state: &LengthCounterState,
) {
    counter.counter = state.counter;
    counter.halt = state.halt;
}

fn capture_timer(timer: &crate::apu::components::Timer) -> TimerState {
    TimerState {
        period: timer.period,
        counter: timer.counter,
    }
}

fn restore_timer(timer: &mut crate::apu::components::Timer, state: &TimerState) {
    timer.period = state.period;
    timer.counter = state.counter;
}

fn capture_linear_counter(
    counter: &crate::apu::components::LinearCounter,
) -> LinearCounterState {
    LinearCounterState {
        counter: counter.counter,
        reload_value: counter.reload_value,
        control_flag: counter.control_flag,
        reload_flag: counter.reload_flag,
    }
}

fn restore_linear_counter(
    counter: &mut crate::apu::components::LinearCounter,
    state: &LinearCounterState,
) {
    counter.counter = state.counter;
    counter.reload_value = state.reload_value;
    counter.control_flag = state.control_flag;
    counter.reload_flag = state.reload_flag;
}

fn capture_pulse(pulse: &crate::apu::channels::PulseChannel) -> PulseState {
    PulseState {
        enabled: pulse.enabled,
        duty: pulse.duty,
        duty_position: pulse.duty_position,
        envelope: capture_envelope(&pulse.envelope),
        sweep: capture_sweep(&pulse.sweep),
        length_counter: capture_length_counter(&pulse.length_counter),
        timer: capture_timer(&pulse.timer),
    }
}

fn restore_pulse(pulse: &mut crate::apu::channels::PulseChannel, state: &PulseState) {
    pulse.enabled = state.enabled;
    pulse.duty = state.duty;
    pulse.duty_position = state.duty_position;
    restore_envelope(&mut pulse.envelope, &state.envelope);
    restore_sweep(&mut pulse.sweep, &state.sweep);
    restore_length_counter(&mut pulse.length_counter, &state.length_counter);
    restore_timer(&mut pulse.timer, &state.timer);
}

impl SaveState {
    /// Create a save state from the current emulator state
    ///
    /// # Arguments
    ///
    /// * `emulator` - Reference to the emulator
    ///
    /// # Returns
    ///
    /// Result containing the save state or an error
    pub fn from_emulator(emulator: &super::Emulator) -> Result<Self, SaveStateError> {
        let cpu = emulator.cpu();
        let bus = emulator.bus();

        // Get ROM name for validation
        let rom_name = emulator
            .rom_path()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|s| s.to_string());

        // Create timestamp
        let timestamp = chrono::Local::now().to_rfc3339();

        // Capture CPU state
        let cpu_state = CpuState {
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            sp: cpu.sp,
            pc: cpu.pc,
            status: cpu.status,
            cycles: cpu.cycles,
        };

        // Capture PPU state
        let ppu = bus.ppu();
        let ppu_state = PpuState {
            ppuctrl: ppu.ppuctrl,
            ppumask: ppu.ppumask,
            ppustatus: ppu.ppustatus,
            oam_addr: ppu.oam_addr,
            v: ppu.v,
            t: ppu.t,
            fine_x: ppu.fine_x,
            write_latch: ppu.write_latch,
            read_buffer: ppu.read_buffer,
            scanline: ppu.scanline,
            cycle: ppu.cycle,
            frame: ppu.frame,
        };

        // Capture APU state
        let apu = bus.apu();
        let apu_state = ApuState {
            pulse1: capture_pulse(&apu.pulse1),
            pulse2: capture_pulse(&apu.pulse2),
            triangle: TriangleState {
                enabled: apu.triangle.enabled,
                linear_counter: capture_linear_counter(&apu.triangle.linear_counter),
                length_counter: capture_length_counter(&apu.triangle.length_counter),
                timer: capture_timer(&apu.triangle.timer),
                sequence_position: apu.triangle.sequence_position,
            },
            noise: NoiseState {
                enabled: apu.noise.enabled,
                envelope: capture_envelope(&apu.noise.envelope),
                length_counter: capture_length_counter(&apu.noise.length_counter),
                timer: capture_timer(&apu.noise.timer),
                lfsr: apu.noise.lfsr,
                mode: apu.noise.mode,
            },
            dmc: DmcState {
                enabled: apu.dmc.enabled,
                irq_enabled: apu.dmc.irq_enabled,
                loop_flag: apu.dmc.loop_flag,
                timer: capture_timer(&apu.dmc.timer),
                sample_address: apu.dmc.sample_address,
                sample_length: apu.dmc.sample_length,
                current_address: apu.dmc.current_address,
                bytes_remaining: apu.dmc.bytes_remaining,
                sample_buffer: apu.dmc.sample_buffer,
                sample_buffer_empty: apu.dmc.sample_buffer_empty,
                shift_register: apu.dmc.shift_register,
                bits_remaining: apu.dmc.bits_remaining,
                output_level: apu.dmc.output_level,
                silence_flag: apu.dmc.silence_flag,
                irq_flag: apu.dmc.irq_flag,
            },
            frame_counter: FrameCounterState {
                five_step_mode: apu.frame_counter.mode == crate::apu::components::FrameMode::FiveStep,
                cycle: apu.frame_counter.cycle,
                step: apu.frame_counter.step,
                irq_inhibit: apu.frame_counter.irq_inhibit,
                irq_pending: apu.frame_counter.irq_pending,
                reset_pending: apu.frame_counter.reset_pending,
                write_delay: apu.frame_counter.write_delay,
            },
            cpu_cycle_parity: apu.cpu_cycle_parity,
        };

        // Capture memory
        let ram = bus.ram_contents().to_vec();
        let vram = ppu.nametables.to_vec();
        let palette_ram = ppu.palette_ram.to_vec();
        let oam = ppu.oam.to_vec();
        let cartridge_ram = bus.prg_ram_snapshot();

        Ok(SaveState {
            version: SAVE_STATE_VERSION,
            timestamp,
            rom_name,
            cpu_state,
            ppu_state,
            apu_state,
            ram,
            vram,
            palette_ram,
            oam,
            cartridge_ram,
        })
    }

    /// Restore emulator state from this save state
    ///
    /// # Arguments
    ///
    /// * `emulator` - Mutable reference to the emulator
    ///
    /// # Returns
    ///
    /// Result indicating success or error
    pub fn restore_to_emulator(
        &self,
        emulator: &mut super::Emulator,
    ) -> Result<(), SaveStateError> {
        // Version check
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                found: self.version,
            });
        }

        // Restore CPU state
        let cpu = emulator.cpu_mut();
        cpu.a = self.cpu_state.a;
        cpu.x = self.cpu_state.x;
        cpu.y = self.cpu_state.y;
        cpu.sp = self.cpu_state.sp;
        cpu.pc = self.cpu_state.pc;
        cpu.status = self.cpu_state.status;
        cpu.cycles = self.cpu_state.cycles;

        // Restore bus/memory state
        let bus = emulator.bus_mut();
        bus.restore_ram_contents(&self.ram);

        // Restore PPU state
        let ppu = bus.ppu_mut();
        ppu.ppuctrl = self.ppu_state.ppuctrl;
        ppu.ppumask = self.ppu_state.ppumask;
        ppu.ppustatus = self.ppu_state.ppustatus;
        ppu.oam_addr = self.ppu_state.oam_addr;
        ppu.v = self.ppu_state.v;
        ppu.t = self.ppu_state.t;
        ppu.fine_x = self.ppu_state.fine_x;
        ppu.write_latch = self.ppu_state.write_latch;
        ppu.read_buffer = self.ppu_state.read_buffer;
        ppu.scanline = self.ppu_state.scanline;
        ppu.cycle = self.ppu_state.cycle;
        ppu.frame = self.ppu_state.frame;

        // Validate array sizes before copying to prevent panics
        if self.vram.len() != ppu.nametables.len()
            || self.palette_ram.len() != ppu.palette_ram.len()
            || self.oam.len() != ppu.oam.len()
        {
            let msg = format!(
                "Save state memory size mismatch: vram={} (expected {}), palette={} (expected {}), oam={} (expected {})",
                self.vram.len(),
                ppu.nametables.len(),
                self.palette_ram.len(),
                ppu.palette_ram.len(),
                self.oam.len(),
                ppu.oam.len()
            );
            return Err(SaveStateError::Serialization(
                serde_json::from_str::<()>(&msg).unwrap_err(),
            ));
        }

        ppu.nametables.copy_from_slice(&self.vram);
        ppu.palette_ram.copy_from_slice(&self.palette_ram);
        ppu.oam.copy_from_slice(&self.oam);

        // Restore APU state
        let apu = bus.apu_mut();
        restore_pulse(&mut apu.pulse1, &self.apu_state.pulse1);
        restore_pulse(&mut apu.pulse2, &self.apu_state.pulse2);

        apu.triangle.enabled = self.apu_state.triangle.enabled;
        restore_linear_counter(
            &mut apu.triangle.linear_counter,
            &self.apu_state.triangle.linear_counter,
        );
        restore_length_counter(
            &mut apu.triangle.length_counter,
            &self.apu_state.triangle.length_counter,
        );
        restore_timer(&mut apu.triangle.timer, &self.apu_state.triangle.timer);
        apu.triangle.sequence_position = self.apu_state.triangle.sequence_position;

        apu.noise.enabled = self.apu_state.noise.enabled;
        restore_envelope(&mut apu.noise.envelope, &self.apu_state.noise.envelope);
        restore_length_counter(
            &mut apu.noise.length_counter,
            &self.apu_state.noise.length_counter,
        );
        restore_timer(&mut apu.noise.timer, &self.apu_state.noise.timer);
        apu.noise.lfsr = self.apu_state.noise.lfsr;
        apu.noise.mode = self.apu_state.noise.mode;

        apu.dmc.enabled = self.apu_state.dmc.enabled;
        apu.dmc.irq_enabled = self.apu_state.dmc.irq_enabled;
        apu.dmc.loop_flag = self.apu_state.dmc.loop_flag;
        restore_timer(&mut apu.dmc.timer, &self.apu_state.dmc.timer);
        apu.dmc.sample_address = self.apu_state.dmc.sample_address;
        apu.dmc.sample_length = self.apu_state.dmc.sample_length;
        apu.dmc.current_address = self.apu_state.dmc.current_address;
        apu.dmc.bytes_remaining = self.apu_state.dmc.bytes_remaining;
        apu.dmc.sample_buffer = self.apu_state.dmc.sample_buffer;
        apu.dmc.sample_buffer_empty = self.apu_state.dmc.sample_buffer_empty;
        apu.dmc.shift_register = self.apu_state.dmc.shift_register;
        apu.dmc.bits_remaining = self.apu_state.dmc.bits_remaining;
        apu.dmc.output_level = self.apu_state.dmc.output_level;
        apu.dmc.silence_flag = self.apu_state.dmc.silence_flag;
        apu.dmc.irq_flag = self.apu_state.dmc.irq_flag;

        apu.frame_counter.mode = if self.apu_state.frame_counter.five_step_mode {
            crate::apu::components::FrameMode::FiveStep
        } else {
            crate::apu::components::FrameMode::FourStep
        };
        apu.frame_counter.cycle = self.apu_state.frame_counter.cycle;
        apu.frame_counter.step = self.apu_state.frame_counter.step;
        apu.frame_counter.irq_inhibit = self.apu_state.frame_counter.irq_inhibit;
        apu.frame_counter.irq_pending = self.apu_state.frame_counter.irq_pending;
        apu.frame_counter.reset_pending = self.apu_state.frame_counter.reset_pending;
        apu.frame_counter.write_delay = self.apu_state.frame_counter.write_delay;

        apu.cpu_cycle_parity = self.apu_state.cpu_cycle_parity;

        // Restore cartridge RAM, if the save state captured any
        if let Some(cartridge_ram) = &self.cartridge_ram {
            bus.restore_prg_ram(cartridge_ram);
        }

        Ok(())
    }

    /// Save this save state to a file
    ///
    /// # Arguments
    ///
    /// * `slot` - Save slot number (0-9)
    /// * `rom_path` - Optional path to the currently loaded ROM (for naming)
    ///
    /// # Returns
    ///
    /// Result indicating success or error
    pub fn save_to_file(&self, slot: u8, rom_path: Option<&Path>) -> Result<(), SaveStateError> {
        let save_dir = Self::get_save_directory(rom_path)?;
        fs::create_dir_all(&save_dir)?;

        let file_path = save_dir.join(format!("slot_{}.state", slot));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(file_path, json)?;

        Ok(())
    }

    /// Load a save state from a file
    ///
    /// # Arguments
    ///
    /// * `slot` - Save slot number (0-9)
    /// * `rom_path` - Optional path to the currently loaded ROM (for naming)
    ///
    /// # Returns
    ///
    /// Result containing the save state or an error
    pub fn load_from_file(slot: u8, rom_path: Option<&Path>) -> Result<Self, SaveStateError> {
        let save_dir = Self::get_save_directory(rom_path)?;
        let file_path = save_dir.join(format!("slot_{}.state", slot));

        let json = fs::read_to_string(file_path)?;
        let save_state: SaveState = serde_json::from_str(&json)?;

        Ok(save_state)
    }

    /// Get the save directory for the current ROM
    ///
    /// Creates a directory structure like: saves/<rom_name>/
    fn get_save_directory(rom_path: Option<&Path>) -> Result<PathBuf, SaveStateError> {
        let base_dir = PathBuf::from("saves");

        if let Some(rom_path) = rom_path {
            if let Some(rom_name) = rom_path.file_stem() {
                Ok(base_dir.join(rom_name))
            } else {
                Ok(base_dir.join("default"))
            }
        } else {
            // No ROM loaded, use default directory
            Ok(base_dir.join("default"))
        }
    }
}
