//! Blocking SPI bus implementation

use audioswitch_hal::SpiBus;
use embassy_rp::spi::{Blocking, Error, Instance, Spi};

/// Blocking SPI master
///
/// The attenuator transfers are two bytes each, so there is nothing to gain
/// from DMA here.
pub struct BlockingSpi<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
}

impl<'d, T: Instance> BlockingSpi<'d, T> {
    pub fn new(spi: Spi<'d, T, Blocking>) -> Self {
        Self { spi }
    }
}

impl<T: Instance> SpiBus for BlockingSpi<'_, T> {
    type Error = Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.spi.blocking_transfer(read, write)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.blocking_write(data)
    }
}

/// Translate the shared SPI configuration into embassy-rp's
pub fn rp_config(config: &audioswitch_hal::spi::SpiConfig) -> embassy_rp::spi::Config {
    use audioswitch_hal::spi::Mode;
    use embassy_rp::spi::{Phase, Polarity};

    let (polarity, phase) = match config.mode {
        Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
        Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
        Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
        Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
    };

    let mut rp = embassy_rp::spi::Config::default();
    rp.frequency = config.frequency;
    rp.polarity = polarity;
    rp.phase = phase;
    rp
}
