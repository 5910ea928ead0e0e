//! MCP413X/415X/423X/425X dual digital potentiometer (SPI)
//!
//! 7/8-bit volatile digital potentiometers from Microchip (DS22060).
//!
//! # SPI Protocol
//!
//! Every command starts with a command byte:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! ┌───────────────┬───────┬───────┐
//! │ AD3..AD0      │ C1 C0 │ D9 D8 │
//! └───────────────┴───────┴───────┘
//! ```
//!
//! Read and write carry a second byte with D7..D0 (10 data bits in total);
//! increment and decrement are a single byte. While the command is clocked
//! in, the device drives SDO high for every valid bit; bit 0 of the first
//! response byte is D8 of the result on reads. A low bit in positions 7..1
//! means the device rejected the command.

use audioswitch_core::traits::{Attenuator, Wiper};
use audioswitch_hal::{OutputPin, SpiBus};

/// Memory map addresses
pub mod addr {
    /// Volatile wiper 0
    pub const WIPER_0: u8 = 0x00;
    /// Volatile wiper 1
    pub const WIPER_1: u8 = 0x01;
    /// Terminal control register
    pub const TCON: u8 = 0x04;
    /// Status register
    pub const STATUS: u8 = 0x05;
}

/// Command codes
pub mod cmd {
    pub const WRITE: u8 = 0b00;
    pub const INCREMENT: u8 = 0b01;
    pub const DECREMENT: u8 = 0b10;
    pub const READ: u8 = 0b11;
}

/// Bits that must all be set in the first response byte
const VALID_MASK: u8 = 0b1111_1110;

/// Status register: hardware shutdown pin asserted
const STATUS_SHDN: u16 = 0b10;

/// MCP4 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mcp4Error<E> {
    /// SPI bus error
    Bus(E),
    /// Device rejected the command
    InvalidCommand,
}

/// Build the bytes for a command
///
/// Returns the buffer and the number of bytes used (1 or 2).
pub fn command_bytes(address: u8, command: u8, data: u16) -> ([u8; 2], usize) {
    let command_byte = ((address << 4) & 0b1111_0000) | ((command << 2) & 0b0000_1100);
    match command {
        cmd::WRITE | cmd::READ => (
            [
                command_byte | ((data >> 8) as u8 & 0b11),
                (data & 0xFF) as u8,
            ],
            2,
        ),
        _ => ([command_byte, 0], 1),
    }
}

/// Connection state of one resistor network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkControl {
    /// Network follows the hardware shutdown pin
    pub hardware_shutdown: bool,
    pub terminal_a: bool,
    pub wiper: bool,
    pub terminal_b: bool,
}

impl NetworkControl {
    /// Decode the low nibble of a TCON value
    pub fn from_bits(bits: u16) -> Self {
        Self {
            hardware_shutdown: bits & 0b1000 != 0,
            terminal_a: bits & 0b0100 != 0,
            wiper: bits & 0b0010 != 0,
            terminal_b: bits & 0b0001 != 0,
        }
    }
}

/// Terminal control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TerminalControl {
    pub resistor_0: NetworkControl,
    pub resistor_1: NetworkControl,
}

impl TerminalControl {
    pub fn from_bits(bits: u16) -> Self {
        Self {
            resistor_0: NetworkControl::from_bits(bits),
            resistor_1: NetworkControl::from_bits(bits >> 4),
        }
    }
}

/// MCP4 dual potentiometer on a dedicated chip select
pub struct Mcp4<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI: SpiBus, CS: OutputPin> Mcp4<SPI, CS> {
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        cs.set_high();
        Self { spi, cs }
    }

    /// Release the bus and chip select
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// Execute a command and return its result
    ///
    /// Chip select is released before the response is checked.
    pub fn execute(
        &mut self,
        address: u8,
        command: u8,
        data: u16,
    ) -> Result<u16, Mcp4Error<SPI::Error>> {
        let (tx, len) = command_bytes(address, command, data);
        let mut rx = [0u8; 2];

        self.cs.set_low();
        let transfer = self.spi.transfer(&mut rx[..len], &tx[..len]);
        self.cs.set_high();
        transfer.map_err(Mcp4Error::Bus)?;

        if rx[0] & VALID_MASK != VALID_MASK {
            return Err(Mcp4Error::InvalidCommand);
        }

        let mut result = u16::from(rx[0] & 0b01);
        if len > 1 {
            result = (result << 8) | u16::from(rx[1]);
        }
        Ok(result)
    }

    fn wiper_address(wiper: Wiper) -> u8 {
        match wiper {
            Wiper::Left => addr::WIPER_0,
            Wiper::Right => addr::WIPER_1,
        }
    }

    pub fn read(&mut self, wiper: Wiper) -> Result<u16, Mcp4Error<SPI::Error>> {
        self.execute(Self::wiper_address(wiper), cmd::READ, 0)
    }

    pub fn write(&mut self, wiper: Wiper, value: u16) -> Result<(), Mcp4Error<SPI::Error>> {
        self.execute(Self::wiper_address(wiper), cmd::WRITE, value)
            .map(|_| ())
    }

    pub fn increment(&mut self, wiper: Wiper) -> Result<(), Mcp4Error<SPI::Error>> {
        self.execute(Self::wiper_address(wiper), cmd::INCREMENT, 0)
            .map(|_| ())
    }

    pub fn decrement(&mut self, wiper: Wiper) -> Result<(), Mcp4Error<SPI::Error>> {
        self.execute(Self::wiper_address(wiper), cmd::DECREMENT, 0)
            .map(|_| ())
    }

    /// Whether the hardware shutdown pin is asserted
    pub fn is_shutdown(&mut self) -> Result<bool, Mcp4Error<SPI::Error>> {
        let status = self.execute(addr::STATUS, cmd::READ, 0)?;
        Ok(status & STATUS_SHDN == STATUS_SHDN)
    }

    pub fn terminal_control(&mut self) -> Result<TerminalControl, Mcp4Error<SPI::Error>> {
        self.execute(addr::TCON, cmd::READ, 0)
            .map(TerminalControl::from_bits)
    }
}

impl<SPI: SpiBus, CS: OutputPin> Attenuator for Mcp4<SPI, CS> {
    type Error = Mcp4Error<SPI::Error>;

    fn level(&mut self, wiper: Wiper) -> Result<u16, Self::Error> {
        self.read(wiper)
    }

    fn set_level(&mut self, wiper: Wiper, level: u16) -> Result<(), Self::Error> {
        self.write(wiper, level)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn bits(bytes: &[u8]) -> std::string::String {
        bytes.iter().map(|b| std::format!("{:08b}", b)).collect()
    }

    #[test]
    fn test_increment_decrement_bytes() {
        let (buf, len) = command_bytes(0b0000, cmd::INCREMENT, 0);
        assert_eq!(bits(&buf[..len]), "00000100");
        let (buf, len) = command_bytes(0b0001, cmd::INCREMENT, 0);
        assert_eq!(bits(&buf[..len]), "00010100");
        let (buf, len) = command_bytes(0b0001, cmd::DECREMENT, 0);
        assert_eq!(bits(&buf[..len]), "00011000");
    }

    #[test]
    fn test_read_write_bytes() {
        let (buf, len) = command_bytes(0b0000, cmd::READ, 0);
        assert_eq!(bits(&buf[..len]), "0000110000000000");
        let (buf, len) = command_bytes(0b0000, cmd::WRITE, 0b00_0111_1111);
        assert_eq!(bits(&buf[..len]), "0000000001111111");
        let (buf, len) = command_bytes(0b0001, cmd::WRITE, 0x100);
        assert_eq!(bits(&buf[..len]), "0001000100000000");
    }

    /// Mock SPI bus that records writes and answers with canned bytes
    struct MockSpi {
        written: Vec<Vec<u8>>,
        response: [u8; 2],
        fail: bool,
    }

    impl MockSpi {
        fn answering(response: [u8; 2]) -> Self {
            Self {
                written: Vec::new(),
                response,
                fail: false,
            }
        }
    }

    impl SpiBus for MockSpi {
        type Error = ();

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.written.push(write.to_vec());
            read.copy_from_slice(&self.response[..read.len()]);
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            self.written.push(data.to_vec());
            Ok(())
        }
    }

    /// Mock chip select counting falling edges
    struct MockCs {
        high: bool,
        selects: usize,
    }

    impl OutputPin for MockCs {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
            self.selects += 1;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn mcp4(response: [u8; 2]) -> Mcp4<MockSpi, MockCs> {
        Mcp4::new(
            MockSpi::answering(response),
            MockCs {
                high: false,
                selects: 0,
            },
        )
    }

    #[test]
    fn test_new_deselects() {
        let pot = mcp4([0xFF, 0xFF]);
        let (_, cs) = pot.release();
        assert!(cs.is_set_high());
    }

    #[test]
    fn test_read_wiper() {
        let mut pot = mcp4([0xFE, 0x40]);
        assert_eq!(pot.read(Wiper::Right), Ok(0x40));

        let (spi, cs) = pot.release();
        assert_eq!(spi.written, [std::vec![0b0001_1100, 0x00]]);
        assert_eq!(cs.selects, 1);
        assert!(cs.is_set_high());
    }

    #[test]
    fn test_read_full_scale_uses_d8() {
        let mut pot = mcp4([0xFF, 0x00]);
        assert_eq!(pot.level(Wiper::Left), Ok(0x100));
    }

    #[test]
    fn test_write_wiper() {
        let mut pot = mcp4([0xFF, 0xFF]);
        pot.set_level(Wiper::Left, 0x7F).unwrap();
        let (spi, _) = pot.release();
        assert_eq!(spi.written, [std::vec![0x00, 0x7F]]);
    }

    #[test]
    fn test_invalid_command_releases_cs() {
        let mut pot = mcp4([0b1111_0111, 0xFF]);
        assert_eq!(pot.write(Wiper::Left, 3), Err(Mcp4Error::InvalidCommand));
        let (_, cs) = pot.release();
        assert!(cs.is_set_high());
    }

    #[test]
    fn test_bus_error() {
        let mut pot = mcp4([0xFF, 0xFF]);
        pot.spi.fail = true;
        assert_eq!(pot.read(Wiper::Left), Err(Mcp4Error::Bus(())));
        assert!(pot.cs.is_set_high());
    }

    #[test]
    fn test_increment_is_single_byte() {
        let mut pot = mcp4([0xFF, 0xFF]);
        pot.increment(Wiper::Right).unwrap();
        pot.decrement(Wiper::Left).unwrap();
        let (spi, _) = pot.release();
        assert_eq!(spi.written, [std::vec![0b0001_0100], std::vec![0b0000_1000]]);
    }

    #[test]
    fn test_status_shutdown() {
        let mut pot = mcp4([0xFE, 0b0000_0010]);
        assert_eq!(pot.is_shutdown(), Ok(true));
        let mut pot = mcp4([0xFE, 0b0000_0000]);
        assert_eq!(pot.is_shutdown(), Ok(false));
    }

    #[test]
    fn test_terminal_control() {
        // R1: A and W connected, R0: everything connected
        let mut pot = mcp4([0xFF, 0b0110_1111]);
        let tcon = pot.terminal_control().unwrap();
        assert_eq!(
            tcon.resistor_0,
            NetworkControl {
                hardware_shutdown: true,
                terminal_a: true,
                wiper: true,
                terminal_b: true,
            }
        );
        assert_eq!(
            tcon.resistor_1,
            NetworkControl {
                hardware_shutdown: false,
                terminal_a: true,
                wiper: true,
                terminal_b: false,
            }
        );
    }
}
