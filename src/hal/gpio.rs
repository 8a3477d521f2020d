//! Digital I/O block driver
//!
//! One block of 32 lines. Direction, output and input registers carry one
//! bit per line at position `1 << pin`; all field updates are
//! read-modify-write so neighbouring lines are never disturbed.

use crate::hal::mmio::{irq, RegisterBlock, BLOCK_SPAN};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{InputPin, OutputPin, ToggleableOutputPin};

/// Register offsets within the block
mod regs {
    pub const DATA_IN: usize = 0x00;
    pub const DATA_OUT: usize = 0x04;
    pub const DIR: usize = 0x08;
}

/// Number of lines in the block
pub const LINE_COUNT: u8 = 32;

/// Per-line direction; exactly one of the two at any time
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Input,
    Output,
}

/// Driver for the digital I/O block
pub struct Gpio {
    regs: RegisterBlock,
}

impl Gpio {
    /// Create the driver for the block at `base`.
    ///
    /// # Safety
    /// `base` must be the block's base address and only one driver may exist
    /// at any time.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegisterBlock::new(base, BLOCK_SPAN),
        }
    }

    /// Acknowledge any interrupt conditions left over from before reset.
    ///
    /// Not a precondition for the other operations.
    pub fn init(&mut self) {
        self.regs.write(irq::IC, u32::MAX);
    }

    // Out-of-range indices fail fast, never silently masked.
    fn mask(pin: u8) -> u32 {
        assert!(pin < LINE_COUNT, "pin index out of range");
        1 << pin
    }

    /// Mark `pin` as an output or an input.
    pub fn set_direction(&mut self, pin: u8, direction: Direction) {
        let mask = Self::mask(pin);
        self.regs.modify(regs::DIR, |v| match direction {
            Direction::Output => v | mask,
            Direction::Input => v & !mask,
        });
    }

    /// Set or clear the output latch for `pin`.
    ///
    /// Accepted for a pin currently configured as input: the value has no
    /// external effect yet, but is staged for a later direction change.
    pub fn write(&mut self, pin: u8, level: bool) {
        let mask = Self::mask(pin);
        self.regs.modify(regs::DATA_OUT, |v| {
            if level {
                v | mask
            } else {
                v & !mask
            }
        });
    }

    /// Sample the input register bit for `pin`, whatever its direction.
    pub fn read(&self, pin: u8) -> bool {
        self.regs.read(regs::DATA_IN) & Self::mask(pin) != 0
    }

    /// Unmask the interrupt condition for `pin`. Delivery is not handled
    /// here; the core is polling only.
    pub fn enable_interrupt(&mut self, pin: u8) {
        let mask = Self::mask(pin);
        self.regs.modify(irq::IM, |v| v | mask);
    }

    /// Acknowledge the interrupt condition for `pin`.
    pub fn clear_interrupt(&mut self, pin: u8) {
        self.regs.write(irq::IC, Self::mask(pin));
    }

    /// Whole input register.
    pub fn input_bits(&self) -> u32 {
        self.regs.read(regs::DATA_IN)
    }

    /// Whole output register.
    pub fn output_bits(&self) -> u32 {
        self.regs.read(regs::DATA_OUT)
    }

    /// Whole direction register (1 = output).
    pub fn direction_bits(&self) -> u32 {
        self.regs.read(regs::DIR)
    }

    /// Detach a typed handle for one line, starting in the input state.
    ///
    /// Lines alias the block's registers; keep every handle of one block in
    /// a single execution context so read-modify-write stays atomic.
    pub fn line(&mut self, pin: u8) -> Line<Input> {
        let _ = Self::mask(pin);
        let line: Line<Input> = Line {
            regs: self.regs,
            pin,
            _mode: PhantomData,
        };
        line.into_input()
    }
}

/// Marker for a line configured as input
pub struct Input;
/// Marker for a line configured as output
pub struct Output;

/// Typed handle to a single line of the block
pub struct Line<MODE> {
    regs: RegisterBlock,
    pin: u8,
    _mode: PhantomData<MODE>,
}

impl<MODE> Line<MODE> {
    fn mask(&self) -> u32 {
        1 << self.pin
    }

    pub fn into_output(self) -> Line<Output> {
        let mask = self.mask();
        self.regs.modify(regs::DIR, |v| v | mask);
        Line {
            regs: self.regs,
            pin: self.pin,
            _mode: PhantomData,
        }
    }

    pub fn into_input(self) -> Line<Input> {
        let mask = self.mask();
        self.regs.modify(regs::DIR, |v| v & !mask);
        Line {
            regs: self.regs,
            pin: self.pin,
            _mode: PhantomData,
        }
    }
}

impl Line<Output> {
    #[inline]
    pub fn set_high(&mut self) {
        let mask = self.mask();
        self.regs.modify(regs::DATA_OUT, |v| v | mask);
    }

    #[inline]
    pub fn set_low(&mut self) {
        let mask = self.mask();
        self.regs.modify(regs::DATA_OUT, |v| v & !mask);
    }

    #[inline]
    pub fn toggle(&mut self) {
        let mask = self.mask();
        self.regs.modify(regs::DATA_OUT, |v| v ^ mask);
    }
}

impl Line<Input> {
    #[inline]
    pub fn is_high(&self) -> bool {
        self.regs.read(regs::DATA_IN) & self.mask() != 0
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl OutputPin for Line<Output> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Line::set_low(self);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Line::set_high(self);
        Ok(())
    }
}

impl ToggleableOutputPin for Line<Output> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Line::toggle(self);
        Ok(())
    }
}

impl InputPin for Line<Input> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(Line::is_high(self))
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(Line::is_low(self))
    }
}
