//! Firmware entry: board bring-up followed by the peripheral self-test
#![no_std]
#![no_main]

use panic_halt as _;

use periph_selftest::board::harness::{Console, ManagementGpio, Pads, PowerGpio};
use periph_selftest::board::{self, StatusSignal};
use periph_selftest::selftest;

#[no_mangle]
pub extern "C" fn main() -> ! {
    let mut status = ManagementGpio;
    let mut power = PowerGpio;
    let mut pads = Pads;
    let mut console = Console;

    // Hold the pass/fail line low until there is a verdict.
    status.output_enable();
    status.write(false);

    // Power up the user area before touching its registers.
    power.output_enable();
    power.write(true);

    board::configure_pads(&mut pads);

    let mut periph = unsafe { selftest::Peripherals::take() };
    selftest::run_and_report(&mut periph, &mut status, &mut console);

    #[allow(clippy::empty_loop)]
    loop {}
}
