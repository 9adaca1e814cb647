// Integration helpers for connecting PPU with display system
//
// This module provides utilities to convert PPU frame buffer data
// into the display system's frame buffer format.

use super::framebuffer::FrameBuffer;

/// Copy PPU frame buffer data into a display frame buffer
///
/// The PPU frame buffer already holds resolved 0xRRGGBB colors (see `Ppu::frame`), so this
/// is a straight copy into the display's own buffer.
///
/// # Arguments
///
/// * `ppu_frame` - Slice of PPU frame data (packed colors, 256×240 pixels)
/// * `display_buffer` - Mutable reference to the display frame buffer
///
/// # Example
///
/// ```rust,no_run
/// use nes_rs::{Ppu, FrameBuffer};
/// use nes_rs::display::integration::copy_ppu_to_display;
///
/// let ppu = Ppu::new();
/// let mut display_buffer = FrameBuffer::new();
///
/// copy_ppu_to_display(ppu.frame(), &mut display_buffer);
/// ```
pub fn copy_ppu_to_display(ppu_frame: &[u32], display_buffer: &mut FrameBuffer) {
    const EXPECTED_SIZE: usize = 256 * 240;
    assert_eq!(
        ppu_frame.len(),
        EXPECTED_SIZE,
        "PPU frame buffer must be exactly 256×240 pixels"
    );

    display_buffer.as_mut_slice().copy_from_slice(ppu_frame);
}
