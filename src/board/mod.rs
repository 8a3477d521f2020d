//! Board-level collaborators
//!
//! Pad muxing, management-domain signaling and the console sink all live
//! outside the peripheral drivers, in the boot/test harness surrounding the
//! firmware. They are modeled as traits; the firmware binaries bind them to
//! the harness services in [`harness`].

use crate::config;

/// Pad function selection, one call per pad index
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum IoMode {
    Output = 0,
    InputNoPull = 1,
    Bidirectional = 2,
}

/// Pad-mux configuration service
pub trait PadMux {
    fn configure(&mut self, pad: u8, mode: IoMode);
}

/// One management-domain signal line, used only for pass/fail reporting and
/// the user-area power switch
pub trait StatusSignal {
    fn output_enable(&mut self);
    fn write(&mut self, level: bool);
}

/// Route the user-area pads to their peripherals: the serial controllers on
/// pads 8..=23 with the receive lines as inputs, the addressed bus and the
/// digital I/O lines as bidirectional pads.
pub fn configure_pads<P: PadMux>(pads: &mut P) {
    for pad in config::PAD_SPI_FIRST..=config::PAD_SPI_LAST {
        let mode = if config::PAD_SPI_MISO.contains(&pad) {
            IoMode::InputNoPull
        } else {
            IoMode::Output
        };
        pads.configure(pad, mode);
    }
    for pad in config::PAD_I3C {
        pads.configure(pad, IoMode::Bidirectional);
    }
    for pad in config::PAD_GPIO {
        pads.configure(pad, IoMode::Bidirectional);
    }
}

#[cfg(feature = "firmware")]
pub mod harness {
    //! Bindings to the boot/test harness services

    use super::{IoMode, PadMux, StatusSignal};
    use core::convert::Infallible;

    extern "C" {
        fn mgmt_gpio_output_enable();
        fn mgmt_gpio_write(level: u32);
        fn power_gpio_output_enable();
        fn power_gpio_write(level: u32);
        fn pad_mode_select(pad: u32, mode: u32);
        fn console_putc(byte: u8);
    }

    /// Management pass/fail line
    pub struct ManagementGpio;

    impl StatusSignal for ManagementGpio {
        fn output_enable(&mut self) {
            unsafe { mgmt_gpio_output_enable() }
        }

        fn write(&mut self, level: bool) {
            unsafe { mgmt_gpio_write(level as u32) }
        }
    }

    /// User-area power switch
    pub struct PowerGpio;

    impl StatusSignal for PowerGpio {
        fn output_enable(&mut self) {
            unsafe { power_gpio_output_enable() }
        }

        fn write(&mut self, level: bool) {
            unsafe { power_gpio_write(level as u32) }
        }
    }

    /// Harness pad-mux service
    pub struct Pads;

    impl PadMux for Pads {
        fn configure(&mut self, pad: u8, mode: IoMode) {
            unsafe { pad_mode_select(pad as u32, mode as u32) }
        }
    }

    /// Character sink on the harness console
    pub struct Console;

    impl ufmt::uWrite for Console {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            for byte in s.bytes() {
                unsafe { console_putc(byte) }
            }
            Ok(())
        }
    }
}
