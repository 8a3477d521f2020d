//! On-target test support
//!
//! Small suites that exercise the peripherals on real hardware, reporting
//! over the harness console. Driven by the `test_runner` demo binary.

use crate::config;
use crate::hal::gpio::{Direction, Gpio};
use crate::hal::i3c::I3c;
use crate::hal::spi::{Spi, SpiError, SpiMode};
use ufmt::{uwrite, uWrite};

pub struct TestRunner<W: uWrite> {
    console: W,
    total_tests: u32,
    passed_tests: u32,
    current_suite: &'static str,
}

pub trait TestCase {
    fn run(&self) -> TestResult;
    fn name(&self) -> &'static str;
}

#[derive(PartialEq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(PartialEq)]
pub enum TestError {
    AssertionFailed(&'static str),
    Timeout,
    HardwareFault,
}

impl<W: uWrite> TestRunner<W> {
    pub fn new(console: W) -> Self {
        Self {
            console,
            total_tests: 0,
            passed_tests: 0,
            current_suite: "",
        }
    }

    pub fn run_suite(&mut self, name: &'static str, tests: &[&dyn TestCase]) {
        self.current_suite = name;
        let _ = uwrite!(self.console, "\n=== Test Suite: {} ===\n", name);

        for test in tests {
            self.total_tests += 1;
            let _ = uwrite!(self.console, "Running {}: ", test.name());

            match test.run() {
                TestResult::Pass => {
                    self.passed_tests += 1;
                    let _ = self.console.write_str("PASS\n");
                }
                TestResult::Fail(err) => {
                    let reason = match err {
                        TestError::AssertionFailed(msg) => msg,
                        TestError::Timeout => "timeout",
                        TestError::HardwareFault => "hardware fault",
                    };
                    let _ = uwrite!(self.console, "FAIL - {}\n", reason);
                }
            }
        }

        self.print_summary();
    }

    fn print_summary(&mut self) {
        let _ = uwrite!(self.console, "\nTest Summary for {}:\n", self.current_suite);
        let _ = uwrite!(
            self.console,
            "Passed: {}/{} ({}%)\n",
            self.passed_tests,
            self.total_tests,
            (self.passed_tests * 100) / self.total_tests
        );
    }
}

/// Fail the enclosing [`TestCase`] unless both sides are equal.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr, $what:expr) => {
        if $left != $right {
            return $crate::testing::TestResult::Fail($crate::testing::TestError::AssertionFailed(
                $what,
            ));
        }
    };
}

/// Loopback transfer on serial instance 0. Needs the transmit pad wired
/// back to the receive pad externally.
pub struct SerialLoopbackTest;

impl TestCase for SerialLoopbackTest {
    fn name(&self) -> &'static str {
        "serial loopback"
    }

    fn run(&self) -> TestResult {
        let mut spi = unsafe { Spi::new(config::SPI0_BASE) };
        spi.init(config::DEFAULT_PRESCALER, SpiMode::Mode0);

        match spi.transfer_byte(config::SELFTEST_PATTERN) {
            Ok(byte) => crate::check_eq!(byte, config::SELFTEST_PATTERN, "loopback byte"),
            Err(SpiError::Timeout) => return TestResult::Fail(TestError::Timeout),
        }
        crate::check_eq!(spi.is_busy(), false, "busy flag after transfer");

        TestResult::Pass
    }
}

/// Serial init is idempotent and the prescaler register holds its divisor.
pub struct SerialInitTest;

impl TestCase for SerialInitTest {
    fn name(&self) -> &'static str {
        "serial init"
    }

    fn run(&self) -> TestResult {
        let mut spi = unsafe { Spi::new(config::SPI0_BASE) };
        spi.init(config::DEFAULT_PRESCALER, SpiMode::Mode0);
        spi.init(config::DEFAULT_PRESCALER, SpiMode::Mode0);
        crate::check_eq!(spi.prescaler(), config::DEFAULT_PRESCALER, "prescaler divisor");

        TestResult::Pass
    }
}

/// Drive a digital output and confirm both the direction and output bits.
pub struct GpioOutputTest;

impl TestCase for GpioOutputTest {
    fn name(&self) -> &'static str {
        "gpio output"
    }

    fn run(&self) -> TestResult {
        let mut gpio = unsafe { Gpio::new(config::GPIO_BASE) };
        gpio.init();
        gpio.set_direction(0, Direction::Output);
        gpio.write(0, true);

        crate::check_eq!(gpio.direction_bits() & 1, 1, "direction bit");
        crate::check_eq!(gpio.output_bits() & 1, 1, "output bit");

        TestResult::Pass
    }
}

/// Addressed-bus prescaler write/read-back persistence.
pub struct BusPrescalerTest;

impl TestCase for BusPrescalerTest {
    fn name(&self) -> &'static str {
        "bus prescaler"
    }

    fn run(&self) -> TestResult {
        let mut bus = unsafe { I3c::new(config::I3C_BASE) };
        bus.set_prescaler(config::DEFAULT_PRESCALER);
        crate::check_eq!(bus.prescaler(), config::DEFAULT_PRESCALER, "prescaler read-back");

        TestResult::Pass
    }
}
