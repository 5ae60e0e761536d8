//! DS1307 battery-backed real-time clock over async I2C.
//!
//! The clock keeps seven BCD registers starting at 0x00: seconds (bit 7
//! is the clock-halt flag), minutes, hours, weekday (1..=7), day, month,
//! year (two digits, 2000-based here).

use agrolog_core::clock::{DateTime, Rtc};
use embedded_hal_async::i2c::I2c;

const I2C_ADDR: u8 = 0x68;
const CLOCK_HALT: u8 = 0x80;

#[derive(Debug)]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// The oscillator is halted; the registers hold no meaningful time
    Halted,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::I2c(e)
    }
}

pub struct Ds1307<I2C> {
    i2c: I2C,
}

impl<I2C> Ds1307<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }
}

impl<I2C> Rtc for Ds1307<I2C>
where
    I2C: I2c,
{
    type Error = Error<I2C::Error>;

    /// Writing the seconds register with bit 7 clear also starts the
    /// oscillator, so setting the time doubles as bring-up.
    async fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Self::Error> {
        let buf = [
            0x00,
            to_bcd(datetime.second) & !CLOCK_HALT,
            to_bcd(datetime.minute),
            to_bcd(datetime.hour),
            to_bcd(datetime.weekday + 1),
            to_bcd(datetime.day),
            to_bcd(datetime.month),
            to_bcd((datetime.year % 100) as u8),
        ];
        self.i2c.write(I2C_ADDR, &buf).await?;
        Ok(())
    }

    async fn datetime(&mut self) -> Result<DateTime, Self::Error> {
        let mut regs = [0u8; 7];
        self.i2c.write_read(I2C_ADDR, &[0x00], &mut regs).await?;

        if regs[0] & CLOCK_HALT != 0 {
            return Err(Error::Halted);
        }

        Ok(DateTime {
            second: from_bcd(regs[0] & !CLOCK_HALT),
            minute: from_bcd(regs[1]),
            // Bit 6 selects 12-hour mode; it is never set by this driver.
            hour: from_bcd(regs[2] & 0x3F),
            weekday: from_bcd(regs[3]).saturating_sub(1),
            day: from_bcd(regs[4]),
            month: from_bcd(regs[5]),
            year: 2000 + u16::from(from_bcd(regs[6])),
        })
    }
}

const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

const fn from_bcd(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}
