//! A USART without hardware behind it.
//!
//! [SimUsart] keeps RDR, TDR and the two interrupt enables the way the
//! STM32 USART does: RDR holds one byte and a new one overwrites it, TDR is
//! empty again once the transmitter took the byte. The bytes the transmitter
//! shifted out are collected on the line so tests can look at them.

use heapless::Vec;

use crate::echo::{Echo, EchoUsart, Interrupts};
use crate::led::Led;

/// Number of bytes the simulated TX line records
pub const LINE_CAPACITY: usize = 64;

/// Upper bound of interrupt entries [run_until_idle] makes
pub const MAX_ENTRIES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimError {
    /// the TX line record holds [LINE_CAPACITY] bytes already
    LineFull,
    /// the interrupt was still pending after [MAX_ENTRIES] entries
    StillPending,
}

/// A USART [run_until_idle] can step
pub trait Simulated: EchoUsart {
    /// the NVIC would enter the handler
    fn interrupt_pending(&self) -> bool;

    /// the transmitter moves TDR to the line
    fn shift(&mut self) -> Result<(), SimError>;
}

#[derive(Debug)]
pub struct SimUsart {
    enabled: Interrupts,
    rdr: Option<u8>,
    tdr: Option<u8>,
    line: Vec<u8, LINE_CAPACITY>,
}

impl Default for SimUsart {
    fn default() -> Self {
        Self::new()
    }
}

impl SimUsart {
    /// A USART after its setup: receive interrupt enabled, transmit interrupt
    /// disabled, both data registers empty.
    pub fn new() -> Self {
        Self {
            enabled: Interrupts::RXNE,
            rdr: None,
            tdr: None,
            line: Vec::new(),
        }
    }

    /// a byte arrives on RX, silently replacing an unread one
    pub fn deliver(&mut self, byte: u8) {
        self.rdr = Some(byte);
    }

    pub fn tx_interrupt_enabled(&self) -> bool {
        self.enabled.contains(Interrupts::TXE)
    }

    /// TXE, TDR holds no byte
    pub fn tx_empty(&self) -> bool {
        self.tdr.is_none()
    }

    /// bytes shifted out so far
    pub fn line(&self) -> &[u8] {
        &self.line
    }
}

impl EchoUsart for SimUsart {
    fn interrupts(&self) -> Interrupts {
        self.enabled
    }

    fn try_read(&mut self) -> Option<u8> {
        self.rdr.take()
    }

    fn try_write(&mut self, byte: u8) -> bool {
        if self.tdr.is_some() {
            return false;
        }
        self.tdr = Some(byte);
        true
    }

    fn listen_tx(&mut self, enable: bool) {
        self.enabled.set(Interrupts::TXE, enable);
    }
}

impl Simulated for SimUsart {
    fn interrupt_pending(&self) -> bool {
        (self.enabled.contains(Interrupts::RXNE) && self.rdr.is_some())
            || (self.enabled.contains(Interrupts::TXE) && self.tdr.is_none())
    }

    fn shift(&mut self) -> Result<(), SimError> {
        if let Some(byte) = self.tdr {
            self.line.push(byte).map_err(|_| SimError::LineFull)?;
            self.tdr = None;
        }
        Ok(())
    }
}

/// Enter the handler while the interrupt is pending, letting the transmitter
/// shift after every entry. Returns the number of entries.
pub fn run_until_idle<U: Simulated, L: Led>(echo: &mut Echo<U, L>) -> Result<usize, SimError> {
    let mut entries = 0;
    while echo.usart().interrupt_pending() {
        if entries == MAX_ENTRIES {
            return Err(SimError::StillPending);
        }
        echo.on_interrupt();
        echo.usart_mut().shift()?;
        entries += 1;
    }
    Ok(entries)
}
