// APU module - Audio Processing Unit implementation
//
// This module emulates the NES APU (Ricoh 2A03): two pulse channels, a
// triangle channel, a noise channel, and a DMC sample-playback channel,
// driven by a shared frame sequencer.
//
// ## Register Map
//
// ### Pulse 1 ($4000-$4003), Pulse 2 ($4004-$4007)
// | Address | Description                           |
// |---------|---------------------------------------|
// | $4000/4 | Duty cycle, envelope                  |
// | $4001/5 | Sweep unit                             |
// | $4002/6 | Timer low byte                         |
// | $4003/7 | Length counter, timer high bits        |
//
// ### Triangle ($4008-$400B)
// | Address | Description                           |
// |---------|---------------------------------------|
// | $4008   | Linear counter                        |
// | $4009   | Unused                                |
// | $400A   | Timer low byte                        |
// | $400B   | Length counter, timer high bits       |
//
// ### Noise ($400C-$400F)
// | Address | Description                           |
// |---------|---------------------------------------|
// | $400C   | Envelope                              |
// | $400D   | Unused                                |
// | $400E   | Mode, period                          |
// | $400F   | Length counter                        |
//
// ### DMC ($4010-$4013)
// | Address | Description                           |
// |---------|---------------------------------------|
// | $4010   | Flags, rate                           |
// | $4011   | Direct load                           |
// | $4012   | Sample address                        |
// | $4013   | Sample length                         |
//
// ### Control ($4015, $4017)
// | Address | Description                           |
// |---------|---------------------------------------|
// | $4015   | Status/Control (R/W)                  |
// | $4017   | Frame counter (W)                     |
//
// Mixing the five channel outputs into an audio stream is handled one layer
// up by `crate::audio`, not here: this module only exposes a `u8` per
// channel plus the legacy two-pulse `output()` sum the earliest consumers of
// this module relied on.

pub mod channels;
pub mod components;
pub mod constants;

#[cfg(test)]
mod tests;

use crate::bus::MemoryMappedDevice;
use channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
use components::{FrameCounter, FrameEvent};

/// APU structure representing the Audio Processing Unit state
pub struct Apu {
    pub(crate) pulse1: PulseChannel,
    pub(crate) pulse2: PulseChannel,
    pub(crate) triangle: TriangleChannel,
    pub(crate) noise: NoiseChannel,
    pub(crate) dmc: DmcChannel,
    pub(crate) frame_counter: FrameCounter,

    /// Toggles every CPU cycle; pulse/noise timers only clock on the low
    /// half (the APU clock runs at CPU/2). Triangle and DMC clock every
    /// CPU cycle.
    pub(crate) cpu_cycle_parity: bool,
}

impl Apu {
    /// Create a new APU instance with default state
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::apu::Apu;
    ///
    /// let apu = Apu::new();
    /// ```
    pub fn new() -> Self {
        Apu {
            pulse1: PulseChannel::new(1),
            pulse2: PulseChannel::new(2),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame_counter: FrameCounter::new(),
            cpu_cycle_parity: false,
        }
    }

    /// Reset APU to power-on state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Clock the APU by one CPU cycle
    ///
    /// Advances the frame sequencer and every channel's timer at the
    /// appropriate rate, dispatching quarter/half-frame events as they fire.
    pub fn clock(&mut self) {
        self.triangle.clock_timer();
        self.dmc.clock_timer();

        if self.cpu_cycle_parity {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }
        self.cpu_cycle_parity = !self.cpu_cycle_parity;

        for event in self.frame_counter.clock() {
            self.dispatch_frame_event(event);
        }
    }

    fn dispatch_frame_event(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::QuarterFrame => self.clock_quarter_frame(),
            FrameEvent::HalfFrame => self.clock_half_frame(),
            FrameEvent::SetIrq => {}
        }
    }

    /// Clock envelopes and the triangle's linear counter
    pub fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.triangle.clock_linear_counter();
        self.noise.clock_envelope();
    }

    /// Clock length counters and sweep units, in addition to a quarter frame
    pub fn clock_half_frame(&mut self) {
        self.clock_quarter_frame();
        self.pulse1.clock_length_counter();
        self.pulse1.clock_sweep();
        self.pulse2.clock_length_counter();
        self.pulse2.clock_sweep();
        self.triangle.clock_length_counter();
        self.noise.clock_length_counter();
    }

    /// Get the mixed output sample from the two pulse channels (0-30)
    ///
    /// Full five-channel mixing (with the non-linear NES mixer formula) is
    /// handled by `crate::audio::AudioSystem::process_apu_sample`, which
    /// takes each channel's raw output via the `*_output` accessors below.
    pub fn output(&self) -> u8 {
        self.pulse1.output().saturating_add(self.pulse2.output())
    }

    /// Get the output from pulse channel 1 (0-15)
    pub fn pulse1_output(&self) -> u8 {
        self.pulse1.output()
    }

    /// Get the output from pulse channel 2 (0-15)
    pub fn pulse2_output(&self) -> u8 {
        self.pulse2.output()
    }

    /// Get the output from the triangle channel (0-15)
    pub fn triangle_output(&self) -> u8 {
        self.triangle.output()
    }

    /// Get the output from the noise channel (0-15)
    pub fn noise_output(&self) -> u8 {
        self.noise.output()
    }

    /// Get the output from the DMC channel (0-127)
    pub fn dmc_output(&self) -> u8 {
        self.dmc.output()
    }

    /// Check if the frame sequencer's IRQ flag is set
    pub fn frame_irq_pending(&self) -> bool {
        self.frame_counter.irq_pending()
    }

    /// Check if the DMC channel's IRQ flag is set
    pub fn dmc_irq_pending(&self) -> bool {
        self.dmc.irq_pending()
    }

    /// Address the DMC wants to read from CPU memory, if its sample buffer
    /// is empty and bytes remain. The bus drives this since the DMC channel
    /// has no memory access of its own and stalls the CPU for the fetch.
    pub fn dmc_needs_sample_read(&self) -> Option<u16> {
        self.dmc.needs_sample_read()
    }

    /// Deliver a byte fetched for `dmc_needs_sample_read`'s address
    pub fn dmc_load_sample_byte(&mut self, byte: u8) {
        self.dmc.load_sample_byte(byte);
    }

    fn read_register(&mut self, addr: u16) -> u8 {
        match addr {
            0x4000..=0x4013 => 0, // all channel registers are write-only

            0x4015 => {
                let mut status = 0u8;
                if self.pulse1.is_active() {
                    status |= 0x01;
                }
                if self.pulse2.is_active() {
                    status |= 0x02;
                }
                if self.triangle.is_active() {
                    status |= 0x04;
                }
                if self.noise.is_active() {
                    status |= 0x08;
                }
                if self.dmc.is_active() {
                    status |= 0x10;
                }
                if self.frame_counter.irq_pending() {
                    status |= 0x40;
                }
                if self.dmc.irq_pending() {
                    status |= 0x80;
                }

                // Reading $4015 clears the frame IRQ flag (not the DMC one)
                self.frame_counter.clear_irq();

                status
            }

            _ => 0,
        }
    }

    fn write_register(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_register_0(data),
            0x4001 => self.pulse1.write_register_1(data),
            0x4002 => self.pulse1.write_register_2(data),
            0x4003 => self.pulse1.write_register_3(data),

            0x4004 => self.pulse2.write_register_0(data),
            0x4005 => self.pulse2.write_register_1(data),
            0x4006 => self.pulse2.write_register_2(data),
            0x4007 => self.pulse2.write_register_3(data),

            0x4008 => self.triangle.write_register_0(data),
            0x4009 => self.triangle.write_register_1(data),
            0x400A => self.triangle.write_register_2(data),
            0x400B => self.triangle.write_register_3(data),

            0x400C => self.noise.write_register_0(data),
            0x400D => self.noise.write_register_1(data),
            0x400E => self.noise.write_register_2(data),
            0x400F => self.noise.write_register_3(data),

            0x4010 => self.dmc.write_register_0(data),
            0x4011 => self.dmc.write_register_1(data),
            0x4012 => self.dmc.write_register_2(data),
            0x4013 => self.dmc.write_register_3(data),

            // $4015: Status/Control
            // Bit 0-4: Enable pulse1/pulse2/triangle/noise/DMC
            // Writing here always clears the DMC IRQ flag
            0x4015 => {
                self.pulse1.set_enabled((data & 0x01) != 0);
                self.pulse2.set_enabled((data & 0x02) != 0);
                self.triangle.set_enabled((data & 0x04) != 0);
                self.noise.set_enabled((data & 0x08) != 0);
                self.dmc.set_enabled((data & 0x10) != 0);
                self.dmc.irq_flag = false;
            }

            // $4017: Frame Counter
            // Bit 6: IRQ inhibit flag, Bit 7: Sequencer mode
            0x4017 => {
                let events = self.frame_counter.write_control(data);
                for event in events {
                    self.dispatch_frame_event(event);
                }
            }

            _ => {}
        }
    }
}

impl MemoryMappedDevice for Apu {
    fn read(&mut self, addr: u16) -> u8 {
        self.read_register(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.write_register(addr, data);
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
