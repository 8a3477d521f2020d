//! On-target peripheral test suites, reported over the harness console.
#![no_std]
#![no_main]

use panic_halt as _;

use periph_selftest::board::harness::Console;
use periph_selftest::testing::{
    BusPrescalerTest, GpioOutputTest, SerialInitTest, SerialLoopbackTest, TestCase, TestRunner,
};

#[no_mangle]
pub extern "C" fn main() -> ! {
    let mut runner = TestRunner::new(Console);

    let peripheral_tests: [&dyn TestCase; 4] = [
        &SerialInitTest,
        &SerialLoopbackTest,
        &GpioOutputTest,
        &BusPrescalerTest,
    ];
    runner.run_suite("Peripheral Tests", &peripheral_tests);

    #[allow(clippy::empty_loop)]
    loop {}
}
