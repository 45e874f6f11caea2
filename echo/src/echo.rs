//! The echo interrupt handler.
//!
//! [Echo] owns the USART, the LED and the one byte that waits to be sent
//! back. Every interrupt entry calls [Echo::on_interrupt], which takes one
//! [Interrupts] snapshot of the enabled sources and checks two conditions,
//! receive first:
//!
//! - RXNEIE and RXNE: read the byte, toggle the LED, arm TXEIE
//! - TXEIE and TXE: write the byte, disarm TXEIE
//!
//! RXNE and TXE are the outcome of a non-blocking read or write. Because the
//! enables come from the snapshot taken on entry, arming TXEIE while
//! receiving never sends in the same entry. The still pending TXE interrupt
//! brings the handler back and the byte goes out then. A byte that arrives
//! before that replaces the retained one.

use bitflags::bitflags;

use crate::led::{Led, LedState};

/// Value of the retained byte before anything was received
pub const INITIAL_BYTE: u8 = b'A';

bitflags! {
    /// USART interrupt sources enabled in CR1
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Interrupts: u8 {
        /// RXNEIE
        const RXNE = 1 << 0;
        /// TXEIE
        const TXE = 1 << 1;
    }
}

/// What the echo handler needs from a USART
pub trait EchoUsart {
    /// snapshot of the enabled interrupt sources
    fn interrupts(&self) -> Interrupts;

    /// the received byte if RXNE is set, `None` otherwise
    fn try_read(&mut self) -> Option<u8>;

    /// writes TDR if TXE is set, `false` while the transmitter is busy
    fn try_write(&mut self, byte: u8) -> bool;

    /// set or clear TXEIE
    fn listen_tx(&mut self, enable: bool);
}

/// What one interrupt entry did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Serviced {
    pub received: Option<u8>,
    pub sent: Option<u8>,
    /// LED state after the toggle, only set on receive
    pub led: Option<LedState>,
}

impl Serviced {
    /// neither condition held on entry
    pub fn is_spurious(&self) -> bool {
        self.received.is_none() && self.sent.is_none()
    }
}

pub struct Echo<U, L> {
    usart: U,
    led: L,
    data: u8,
}

impl<U: EchoUsart, L: Led> Echo<U, L> {
    pub fn new(usart: U, led: L) -> Self {
        Self {
            usart,
            led,
            data: INITIAL_BYTE,
        }
    }

    pub fn on_interrupt(&mut self) -> Serviced {
        let enabled = self.usart.interrupts();
        let mut serviced = Serviced::default();

        if enabled.contains(Interrupts::RXNE) {
            if let Some(byte) = self.usart.try_read() {
                self.led.toggle();
                self.data = byte;
                self.usart.listen_tx(true);

                serviced.received = Some(byte);
                serviced.led = Some(LedState::from(self.led.is_on()));
            }
        }

        if enabled.contains(Interrupts::TXE) && self.usart.try_write(self.data) {
            // one-shot, TXE stays set once the byte left TDR
            self.usart.listen_tx(false);

            serviced.sent = Some(self.data);
        }

        serviced
    }

    /// the byte the next transmit will send
    pub fn retained(&self) -> u8 {
        self.data
    }

    pub fn usart(&self) -> &U {
        &self.usart
    }

    pub fn usart_mut(&mut self) -> &mut U {
        &mut self.usart
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::VirtualLed;

    /// Fixed register contents, records every call
    struct Scripted {
        enabled: Interrupts,
        rdr: Option<u8>,
        tdr_empty: bool,
        written: Vec<u8>,
        listen_calls: Vec<bool>,
    }

    impl EchoUsart for Scripted {
        fn interrupts(&self) -> Interrupts {
            self.enabled
        }

        fn try_read(&mut self) -> Option<u8> {
            self.rdr.take()
        }

        fn try_write(&mut self, byte: u8) -> bool {
            if self.tdr_empty {
                self.written.push(byte);
            }
            self.tdr_empty
        }

        fn listen_tx(&mut self, enable: bool) {
            self.enabled.set(Interrupts::TXE, enable);
            self.listen_calls.push(enable);
        }
    }

    fn echo_with(enabled: Interrupts, rdr: Option<u8>) -> Echo<Scripted, VirtualLed> {
        let usart = Scripted {
            enabled,
            rdr,
            tdr_empty: true,
            written: Vec::new(),
            listen_calls: Vec::new(),
        };
        Echo::new(usart, VirtualLed::new())
    }

    #[test]
    fn receive_toggles_and_arms_transmit() {
        let mut echo = echo_with(Interrupts::RXNE, Some(b'k'));

        let serviced = echo.on_interrupt();

        assert_eq!(serviced.received, Some(b'k'));
        assert_eq!(serviced.led, Some(LedState::On));
        assert_eq!(serviced.sent, None);
        assert_eq!(echo.retained(), b'k');
        assert_eq!(echo.led().toggles(), 1);
        assert_eq!(echo.usart().listen_calls, [true]);
        assert!(echo.usart().written.is_empty());
    }

    #[test]
    fn transmit_sends_retained_and_disarms() {
        let mut echo = echo_with(Interrupts::RXNE, Some(b'z'));
        echo.on_interrupt();

        let serviced = echo.on_interrupt();

        assert_eq!(serviced.received, None);
        assert_eq!(serviced.sent, Some(b'z'));
        assert_eq!(echo.usart().written, [b'z']);
        assert_eq!(echo.usart().listen_calls, [true, false]);
        assert!(!echo.usart().enabled.contains(Interrupts::TXE));
        assert_eq!(echo.led().toggles(), 1);
    }

    #[test]
    fn both_conditions_in_one_entry_send_the_new_byte() {
        let mut echo = echo_with(Interrupts::all(), Some(b'n'));

        let serviced = echo.on_interrupt();

        assert_eq!(serviced.received, Some(b'n'));
        assert_eq!(serviced.sent, Some(b'n'));
        assert_eq!(echo.usart().listen_calls, [true, false]);
    }

    #[test]
    fn busy_transmitter_keeps_transmit_armed() {
        let mut echo = echo_with(Interrupts::RXNE | Interrupts::TXE, None);
        echo.usart_mut().tdr_empty = false;

        assert!(echo.on_interrupt().is_spurious());
        assert!(echo.usart().enabled.contains(Interrupts::TXE));
        assert!(echo.usart().listen_calls.is_empty());

        echo.usart_mut().tdr_empty = true;
        assert_eq!(echo.on_interrupt().sent, Some(INITIAL_BYTE));
        assert_eq!(echo.usart().listen_calls, [false]);
    }

    #[test]
    fn empty_receive_register_changes_nothing() {
        let mut echo = echo_with(Interrupts::RXNE, None);

        let serviced = echo.on_interrupt();

        assert!(serviced.is_spurious());
        assert_eq!(echo.retained(), INITIAL_BYTE);
        assert_eq!(echo.led().toggles(), 0);
        assert!(echo.usart().listen_calls.is_empty());
    }

    #[test]
    fn disabled_receive_interrupt_ignores_data() {
        let mut echo = echo_with(Interrupts::empty(), Some(b'x'));

        assert!(echo.on_interrupt().is_spurious());
        assert_eq!(echo.retained(), INITIAL_BYTE);
        assert_eq!(echo.usart().rdr, Some(b'x'));
    }
}
