mod frame_counter_tests;
mod pulse_tests;
mod triangle_tests;
