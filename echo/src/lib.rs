//! Interrupt driven USART echo.
//!
//! Hardware independent part of the NUCLEO-L053R8 echo firmware: the
//! [led::Led] abstraction and the handler in [echo]. With the `sim` feature,
//! `sim` adds a simulated USART to run the handler on the host.
#![cfg_attr(not(test), no_std)]

pub mod echo;
pub mod led;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use echo::{Echo, EchoUsart, Interrupts, Serviced, INITIAL_BYTE};
pub use led::{Led, LedState};
