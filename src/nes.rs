// Console orchestrator - ties the CPU, bus, and audio pipeline into a single
// host-facing NES console.
//
// `Emulator` owns the CPU and bus and the quality-of-life features built
// around them (save states, screenshots, speed control); `Nes` drives the
// actual emulation loop on top of it and exposes a pull-based audio API
// suitable for a host that renders a frame, asks for the samples that frame
// produced, and feeds them to its own audio backend.

use crate::audio::mixer::Mixer;
use crate::audio::resampler::{AudioBuffer, Resampler};
use crate::cartridge::Cartridge;
use crate::cpu::DmaKind;
use crate::emulator::{Emulator, SaveStateError, ScreenshotError, SpeedMode};
use crate::input::Controller;
use std::path::PathBuf;

/// NTSC CPU clock rate, in Hz. The APU (and so the audio pipeline) runs at
/// this rate: one raw sample is produced per CPU cycle.
const CPU_CLOCK_HZ: f64 = 1_789_773.0;

/// Sample rate `Nes::new` resamples audio to until a host calls
/// [`Nes::set_sample_rate`].
const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// How much audio to buffer between `get_audio` calls, in milliseconds.
/// Large enough to absorb a dropped host frame, small enough to keep
/// latency low.
const AUDIO_BUFFER_MS: u32 = 200;

/// A complete, runnable NES console.
///
/// Wraps an [`Emulator`] (CPU + bus + save states/screenshots/speed control)
/// and adds the per-frame stepping loop and the audio resampling pipeline
/// that turns the APU's raw channel outputs into host-consumable `i16`
/// samples.
pub struct Nes {
    emulator: Emulator,
    mixer: Mixer,
    resampler: Resampler,
    audio_buffer: AudioBuffer,
    audio_scratch: Vec<i16>,
}

impl Nes {
    /// Build a console around an already-parsed cartridge, resampling audio
    /// to [`DEFAULT_SAMPLE_RATE`] until [`Nes::set_sample_rate`] says
    /// otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `rom`'s mapper number isn't one this crate implements. A
    /// cartridge that made it through [`Cartridge::from_ines_bytes`] is
    /// already a well-formed iNES image; an unsupported mapper is a decision
    /// the host should make before handing the cartridge over, not a runtime
    /// condition this constructor recovers from.
    pub fn new(rom: Cartridge) -> Self {
        let mut emulator = Emulator::new();
        emulator
            .bus_mut()
            .load_cartridge(rom)
            .expect("unsupported mapper");
        emulator.reset();

        Nes {
            emulator,
            mixer: Mixer::new(),
            resampler: Resampler::new(CPU_CLOCK_HZ, DEFAULT_SAMPLE_RATE as f64),
            audio_buffer: AudioBuffer::with_duration(AUDIO_BUFFER_MS, DEFAULT_SAMPLE_RATE as f64),
            audio_scratch: Vec::new(),
        }
    }

    /// Swap in a different iNES ROM from disk and reset the console.
    ///
    /// An ambient convenience for hosts that want to change cartridges after
    /// construction rather than building a new [`Nes`]; [`Nes::new`] covers
    /// the initial load.
    pub fn load_rom<P: AsRef<std::path::Path>>(
        &mut self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.emulator.load_rom(path)?;
        self.resampler.reset();
        self.audio_buffer.clear();
        Ok(())
    }

    /// Reset the console to power-on state, as if the reset button were
    /// pressed. The loaded cartridge stays attached.
    pub fn reset(&mut self) {
        self.emulator.reset();
        self.resampler.reset();
        self.audio_buffer.clear();
    }

    /// Latch both controllers' button state and run the console until the
    /// PPU completes one frame, returning the frame buffer it produced.
    ///
    /// Each iteration executes exactly one CPU step (an interrupt entry or
    /// one instruction), in priority order NMI > IRQ > normal execution,
    /// then charges any OAM DMA and/or DMC sample-fetch stall the step
    /// triggered, then drives the PPU and APU forward by however many CPU
    /// cycles that step cost, feeding every APU sample through the
    /// resampler into the audio buffer. A no-op while [`Nes::pause`] is in
    /// effect, returning whatever the frame buffer already held.
    pub fn run_frame(&mut self, controller1: u8, controller2: u8) -> &[u32; 256 * 240] {
        self.set_controller1(Controller::from(controller1));
        self.set_controller2(Controller::from(controller2));

        if !self.emulator.is_paused() {
            loop {
                let (cycles, frame_complete) = self.step_once();
                self.advance_audio_and_video(cycles);
                if frame_complete {
                    break;
                }
            }
        }

        self.frame()
    }

    /// Execute exactly one CPU step and report its cycle cost.
    ///
    /// Returns `(cycles, frame_complete)`; `frame_complete` is only ever
    /// observed by `advance_audio_and_video`, which actually clocks the PPU.
    /// It's always `false` here since the PPU hasn't been stepped yet for
    /// this instruction's cycles.
    fn step_once(&mut self) -> (u64, bool) {
        let (cpu, bus) = self.emulator.cpu_and_bus_mut();

        let mut cycles: u64 = if bus.ppu_mut().nmi_pending() {
            bus.ppu_mut().clear_nmi();
            cpu.trigger_nmi(bus) as u64
        } else if bus.apu().frame_irq_pending()
            || bus.apu().dmc_irq_pending()
            || bus.mapper_irq_pending()
        {
            let entered = cpu.trigger_irq(bus) as u64;
            if entered == 0 {
                cpu.step(bus) as u64
            } else {
                entered
            }
        } else {
            cpu.step(bus) as u64
        };

        let oam_dma_triggered = bus.take_oam_dma_pending();
        let oam_start_cycle = cpu.cycles;

        // A pending DMC sample fetch (raised by the APU clocking during a previous step's
        // `advance_audio_and_video`) stalls the CPU for its memory fetch just like OAM DMA
        // does. Folding both stalls into this step's lump cycle count keeps the PPU/APU
        // advancing through them the same way it already does for OAM DMA alone.
        if let Some(addr) = bus.apu().dmc_needs_sample_read() {
            let byte = bus.read(addr);
            bus.apu_mut().dmc_load_sample_byte(byte);
            cycles += if oam_dma_triggered {
                cpu.dma_pause(DmaKind::DmcDuringOam, 1) as u64
            } else {
                cpu.dma_pause(DmaKind::Dmc, 1) as u64
            };
        }

        if oam_dma_triggered {
            cycles += cpu.dma_pause(DmaKind::Oam, oam_start_cycle as u16) as u64;
        }

        (cycles, false)
    }

    fn advance_audio_and_video(&mut self, cycles: u64) -> bool {
        let bus = self.emulator.bus_mut();
        let mut frame_complete = false;

        for _ in 0..cycles {
            for _ in 0..3 {
                if bus.ppu_mut().step() {
                    frame_complete = true;
                }
            }
            bus.apu_mut().clock();

            let sample = self.mixer.mix(
                bus.apu().pulse1_output(),
                bus.apu().pulse2_output(),
                bus.apu().triangle_output(),
                bus.apu().noise_output(),
                bus.apu().dmc_output(),
            );
            self.resampler.add_input_sample(sample);
            while let Some(out) = self.resampler.get_output_sample() {
                if self.audio_buffer.is_full() {
                    self.audio_buffer.pop();
                }
                self.audio_buffer.push(out);
            }
        }

        frame_complete
    }

    /// Pull up to `max_samples` of resampled audio, most-recently-produced
    /// first dropped if the buffer overflowed between calls.
    ///
    /// The returned slice borrows an internal scratch buffer that is
    /// overwritten on the next call.
    pub fn get_audio(&mut self, max_samples: usize) -> &[i16] {
        self.audio_scratch.clear();
        for _ in 0..max_samples {
            match self.audio_buffer.pop() {
                Some(sample) => self
                    .audio_scratch
                    .push((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                None => break,
            }
        }
        &self.audio_scratch
    }

    /// Change the host audio sample rate. Rebuilds the resampler in place;
    /// any audio already queued in the buffer is discarded rather than
    /// resampled twice.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.resampler = Resampler::new(CPU_CLOCK_HZ, sample_rate as f64);
        self.audio_buffer = AudioBuffer::with_duration(AUDIO_BUFFER_MS, sample_rate as f64);
    }

    /// Set controller 1's button state directly, bypassing the bitmask
    /// decoding [`Nes::run_frame`] does. An ambient convenience for hosts
    /// that already track button state as a [`Controller`].
    pub fn set_controller1(&mut self, controller: Controller) {
        self.emulator.bus_mut().set_controller1(controller);
    }

    /// Set controller 2's button state directly; see [`Nes::set_controller1`].
    pub fn set_controller2(&mut self, controller: Controller) {
        self.emulator.bus_mut().set_controller2(controller);
    }

    /// Current frame buffer, packed 0xRRGGBB pixels, row-major 256x240.
    pub fn frame(&self) -> &[u32; 256 * 240] {
        self.emulator.bus().ppu().frame()
    }

    /// Pause emulation; `run_frame` becomes a no-op until [`Nes::resume`].
    pub fn pause(&mut self) {
        self.emulator.pause();
    }

    /// Resume emulation after [`Nes::pause`].
    pub fn resume(&mut self) {
        self.emulator.resume();
    }

    /// Whether emulation is currently paused.
    pub fn is_paused(&self) -> bool {
        self.emulator.is_paused()
    }

    /// Set the speed mode (normal/fast-forward/slow-motion).
    pub fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.emulator.set_speed_mode(mode);
    }

    /// Current speed mode.
    pub fn speed_mode(&self) -> SpeedMode {
        self.emulator.speed_mode()
    }

    /// Save the full console state to a numbered slot.
    pub fn save_state(&self, slot: u8) -> Result<(), SaveStateError> {
        self.emulator.save_state(slot)
    }

    /// Load the full console state from a numbered slot.
    pub fn load_state(&mut self, slot: u8) -> Result<(), SaveStateError> {
        self.emulator.load_state(slot)?;
        self.resampler.reset();
        self.audio_buffer.clear();
        Ok(())
    }

    /// Save the current frame as a PNG screenshot.
    pub fn screenshot(&self) -> Result<PathBuf, ScreenshotError> {
        self.emulator.screenshot()
    }

    /// Access the underlying emulator directly, for UI code that needs the
    /// full CPU/bus surface (debugging, disassembly).
    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// Mutably access the underlying emulator.
    pub fn emulator_mut(&mut self) -> &mut Emulator {
        &mut self.emulator
    }
}
