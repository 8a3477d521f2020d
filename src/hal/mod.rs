pub mod gpio;
pub mod i3c;
pub mod mmio;
pub mod spi;

// Re-export commonly used types
pub use gpio::{Direction, Gpio, Line};
pub use i3c::I3c;
pub use mmio::RegisterBlock;
pub use spi::{Spi, SpiError, SpiMode};
