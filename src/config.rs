//! Configuration constants for the user-area peripheral firmware

/// Serial controller instance 0 base address
pub const SPI0_BASE: usize = 0x3000_0000;

/// Serial controller instance 1 base address
pub const SPI1_BASE: usize = 0x3000_0400;

/// Serial controller instance 2 base address
pub const SPI2_BASE: usize = 0x3000_0800;

/// Serial controller instance 3 base address
pub const SPI3_BASE: usize = 0x3000_0C00;

/// Addressed-bus controller base address
pub const I3C_BASE: usize = 0x3000_1000;

/// Digital I/O block base address
pub const GPIO_BASE: usize = 0x3000_2000;

/// Default clock prescaler divisor programmed at init (divide by 16)
pub const DEFAULT_PRESCALER: u32 = 0x10;

/// Byte pattern shifted through the serial loopback during self-test
pub const SELFTEST_PATTERN: u8 = 0xA5;

/// Upper bound on busy-flag polls before a serial transfer is declared stuck
pub const SPI_POLL_BUDGET: u32 = 100_000;

/// First and last pad carrying the serial controllers
pub const PAD_SPI_FIRST: u8 = 8;
pub const PAD_SPI_LAST: u8 = 23;

/// Serial receive (MISO) pads, one per controller instance
pub const PAD_SPI_MISO: [u8; 4] = [9, 13, 17, 21];

/// Addressed-bus pads (clock, data)
pub const PAD_I3C: [u8; 2] = [24, 25];

/// Digital I/O pads routed off-chip
pub const PAD_GPIO: [u8; 2] = [26, 27];
