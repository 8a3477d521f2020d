//! Standalone self-test image: assumes the harness already configured the
//! pads, runs the peripheral pass once and reports.
#![no_std]
#![no_main]

use panic_halt as _;

use periph_selftest::board::harness::{Console, ManagementGpio};
use periph_selftest::board::StatusSignal;
use periph_selftest::selftest;

#[no_mangle]
pub extern "C" fn main() -> ! {
    let mut status = ManagementGpio;
    let mut console = Console;

    status.output_enable();
    status.write(false);

    let mut periph = unsafe { selftest::Peripherals::take() };
    selftest::run_and_report(&mut periph, &mut status, &mut console);

    #[allow(clippy::empty_loop)]
    loop {}
}
