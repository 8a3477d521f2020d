//! Synchronous serial (SPI) controller driver
//!
//! Four independent instances, distinguished solely by base address. Each
//! instance is expected to be driven from a single execution context;
//! transfers block the caller until the controller goes idle.

use crate::config;
use crate::hal::mmio::{irq, RegisterBlock, BLOCK_SPAN};
use embedded_hal::blocking;
use embedded_hal::spi::FullDuplex;

/// Register offsets within one controller instance
mod regs {
    pub const RXDATA: usize = 0x00;
    pub const TXDATA: usize = 0x04;
    pub const CFG: usize = 0x08;
    pub const CTRL: usize = 0x0C;
    pub const PRESCALER: usize = 0x10;
    pub const STATUS: usize = 0x14;
    pub const RX_FIFO_LEVEL: usize = 0x18;
    pub const RX_FIFO_THRESHOLD: usize = 0x1C;
    pub const RX_FIFO_FLUSH: usize = 0x20;
    pub const TX_FIFO_LEVEL: usize = 0x24;
    pub const TX_FIFO_THRESHOLD: usize = 0x28;
    pub const TX_FIFO_FLUSH: usize = 0x2C;
}

// Control register bits
const CTRL_GO: u32 = 1 << 0;
const CTRL_BSY: u32 = 1 << 1;
const CTRL_NEG: u32 = 1 << 2;

// Configuration register bits
const CFG_CPOL: u32 = 1 << 0;
const CFG_CPHA: u32 = 1 << 1;

/// Status register: transfer in progress
pub const STATUS_TIP: u32 = 1 << 0;
/// Status register: idle flag
pub const STATUS_IDLE: u32 = 1 << 1;
/// Status register: receive data available
pub const STATUS_RXNE: u32 = 1 << 2;
/// Status register: transmit register empty
pub const STATUS_TXE: u32 = 1 << 3;
/// Status register: receive FIFO full
pub const STATUS_RXFULL: u32 = 1 << 4;
/// Status register: transmit FIFO empty
pub const STATUS_TXEMPTY: u32 = 1 << 5;

/// Clock polarity/phase configurations
#[derive(Clone, Copy)]
pub enum SpiMode {
    Mode0, // CPOL=0, CPHA=0
    Mode1, // CPOL=0, CPHA=1
    Mode2, // CPOL=1, CPHA=0
    Mode3, // CPOL=1, CPHA=1
}

impl SpiMode {
    fn cfg_bits(self) -> u32 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => CFG_CPHA,
            SpiMode::Mode2 => CFG_CPOL,
            SpiMode::Mode3 => CFG_CPOL | CFG_CPHA,
        }
    }
}

/// Serial driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiError {
    /// The busy flag did not clear within the poll budget
    Timeout,
}

/// Driver for one serial controller instance
pub struct Spi {
    regs: RegisterBlock,
    poll_budget: u32,
}

impl Spi {
    /// Create a driver for the instance at `base`.
    ///
    /// # Safety
    /// `base` must be the base address of one serial controller instance and
    /// only one driver may exist per instance at any time.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegisterBlock::new(base, BLOCK_SPAN),
            poll_budget: config::SPI_POLL_BUDGET,
        }
    }

    /// Program the clock prescaler and the polarity/phase configuration.
    ///
    /// Idempotent. Must run before the first transfer; the instance is
    /// assumed otherwise idle.
    pub fn init(&mut self, prescaler: u32, mode: SpiMode) {
        self.regs.write(regs::PRESCALER, prescaler);
        self.regs.write(regs::CFG, mode.cfg_bits());
    }

    /// Shift one byte out and return the byte shifted in.
    ///
    /// Blocks until the controller clears its busy flag, bounded by the poll
    /// budget; a stuck controller surfaces as [`SpiError::Timeout`] instead
    /// of hanging the caller forever.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, SpiError> {
        self.regs.write(regs::TXDATA, byte as u32);
        // The go bit must be written alone; the controller owns the rest of
        // the control register while a transfer runs.
        self.regs.write(regs::CTRL, CTRL_GO);
        self.wait_idle()?;
        Ok((self.regs.read(regs::RXDATA) & 0xFF) as u8)
    }

    /// Transmit a byte, discarding whatever is shifted in.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SpiError> {
        self.transfer_byte(byte).map(|_| ())
    }

    /// Receive a byte by clocking out an idle pattern.
    pub fn read_byte(&mut self) -> Result<u8, SpiError> {
        self.transfer_byte(0x00)
    }

    /// Poll the control register until the busy flag clears.
    fn wait_idle(&mut self) -> Result<(), SpiError> {
        let mut budget = self.poll_budget;
        while self.regs.read(regs::CTRL) & CTRL_BSY != 0 {
            if budget == 0 {
                return Err(SpiError::Timeout);
            }
            budget -= 1;
        }
        Ok(())
    }

    /// Transfer in progress, as reported by the control register busy flag.
    pub fn is_busy(&self) -> bool {
        self.regs.read(regs::CTRL) & CTRL_BSY != 0
    }

    /// Raw status register.
    pub fn status(&self) -> u32 {
        self.regs.read(regs::STATUS)
    }

    /// Currently programmed prescaler divisor.
    pub fn prescaler(&self) -> u32 {
        self.regs.read(regs::PRESCALER)
    }

    /// Select inverted chip-select polarity. Read-modify-write while the
    /// instance is idle; go and busy are left untouched.
    pub fn set_negate(&mut self, on: bool) {
        self.regs.modify(regs::CTRL, |v| {
            if on {
                v | CTRL_NEG
            } else {
                v & !CTRL_NEG
            }
        });
    }

    /// Bytes waiting in the receive FIFO.
    pub fn rx_fifo_level(&self) -> u32 {
        self.regs.read(regs::RX_FIFO_LEVEL)
    }

    /// Bytes pending in the transmit FIFO.
    pub fn tx_fifo_level(&self) -> u32 {
        self.regs.read(regs::TX_FIFO_LEVEL)
    }

    /// Receive FIFO fill level that raises the threshold condition.
    pub fn set_rx_fifo_threshold(&mut self, level: u32) {
        self.regs.write(regs::RX_FIFO_THRESHOLD, level);
    }

    /// Transmit FIFO fill level that raises the threshold condition.
    pub fn set_tx_fifo_threshold(&mut self, level: u32) {
        self.regs.write(regs::TX_FIFO_THRESHOLD, level);
    }

    /// Drop anything left in both FIFOs.
    pub fn flush_fifos(&mut self) {
        self.regs.write(regs::RX_FIFO_FLUSH, 1);
        self.regs.write(regs::TX_FIFO_FLUSH, 1);
    }

    /// Acknowledge every pending interrupt condition of this instance.
    pub fn clear_interrupts(&mut self) {
        self.regs.write(irq::IC, u32::MAX);
    }
}

impl FullDuplex<u8> for Spi {
    type Error = SpiError;

    fn send(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.is_busy() {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write(regs::TXDATA, word as u32);
        self.regs.write(regs::CTRL, CTRL_GO);
        Ok(())
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.is_busy() || self.status() & STATUS_RXNE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok((self.regs.read(regs::RXDATA) & 0xFF) as u8)
    }
}

impl blocking::spi::Transfer<u8> for Spi {
    type Error = SpiError;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(*word)?;
        }
        Ok(words)
    }
}

impl blocking::spi::Write<u8> for Spi {
    type Error = SpiError;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.write_byte(word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mmio::sim::SimWindow;

    fn spi_over(win: &mut SimWindow) -> Spi {
        unsafe { Spi::new(win.base()) }
    }

    #[test]
    fn init_programs_prescaler_then_config() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        spi.init(0x10, SpiMode::Mode3);
        assert_eq!(win.peek(0x10), 0x10);
        assert_eq!(win.peek(0x08), CFG_CPOL | CFG_CPHA);
    }

    #[test]
    fn init_twice_is_idempotent() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        spi.init(0x10, SpiMode::Mode0);
        let (pr, cfg) = (win.peek(0x10), win.peek(0x08));
        spi.init(0x10, SpiMode::Mode0);
        assert_eq!((win.peek(0x10), win.peek(0x08)), (pr, cfg));
    }

    #[test]
    fn transfer_writes_data_then_go_and_reads_echo() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);
        spi.init(0x10, SpiMode::Mode0);

        // Loopback wiring: the receive register holds what was transmitted.
        win.poke(0x00, 0xA5);
        assert_eq!(spi.transfer_byte(0xA5), Ok(0xA5));
        assert_eq!(win.peek(0x04), 0xA5);
        assert_eq!(win.peek(0x0C), CTRL_GO);
        assert!(!spi.is_busy());
    }

    #[test]
    fn transfer_returns_only_the_low_byte() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        win.poke(0x00, 0x0000_01FF);
        assert_eq!(spi.transfer_byte(0x00), Ok(0xFF));
    }

    #[test]
    fn stuck_busy_flag_times_out_instead_of_hanging() {
        let mut win = SimWindow::new();
        win.poke(0x0C, CTRL_BSY);
        let mut spi = spi_over(&mut win);

        assert_eq!(spi.wait_idle(), Err(SpiError::Timeout));
    }

    #[test]
    fn wait_idle_returns_once_busy_is_clear() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        assert_eq!(spi.wait_idle(), Ok(()));
    }

    #[test]
    fn every_byte_value_survives_loopback() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        for value in 0..=255u8 {
            win.poke(0x00, value as u32);
            assert_eq!(spi.transfer_byte(value), Ok(value));
        }
    }

    #[test]
    fn negate_is_read_modify_write_on_the_control_register() {
        let mut win = SimWindow::new();
        win.poke(0x0C, 0x8);
        let mut spi = spi_over(&mut win);

        spi.set_negate(true);
        assert_eq!(win.peek(0x0C), 0x8 | CTRL_NEG);

        spi.set_negate(false);
        assert_eq!(win.peek(0x0C), 0x8);
    }

    #[test]
    fn fifo_window_accessors_hit_their_registers() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        spi.set_rx_fifo_threshold(4);
        spi.set_tx_fifo_threshold(2);
        spi.flush_fifos();
        assert_eq!(win.peek(0x1C), 4);
        assert_eq!(win.peek(0x28), 2);
        assert_eq!(win.peek(0x20), 1);
        assert_eq!(win.peek(0x2C), 1);

        win.poke(0x18, 3);
        win.poke(0x24, 5);
        assert_eq!(spi.rx_fifo_level(), 3);
        assert_eq!(spi.tx_fifo_level(), 5);
    }

    #[test]
    fn clear_interrupts_writes_all_ones() {
        let mut win = SimWindow::new();
        let mut spi = spi_over(&mut win);

        spi.clear_interrupts();
        assert_eq!(win.peek(irq::IC), u32::MAX);
    }
}
