//! Bring-up of the NUCLEO-L053R8 and the adapters that hand USART2 and LD2
//! to the echo handler.
//!
//! The setup functions run once, in the order [clock_setup], [gpio_setup],
//! [usart_setup]. Each one hands what the next needs on to it.

use cortex_m::peripheral::NVIC;

use stm32l0xx_hal::gpio::gpioa::{PA2, PA3, PA5};
use stm32l0xx_hal::gpio::{Analog, Output, PushPull};
use stm32l0xx_hal::pac::{self, GPIOA, RCC, USART2};
use stm32l0xx_hal::prelude::*;
use stm32l0xx_hal::rcc::{Config as ClockConfig, Rcc};
use stm32l0xx_hal::serial::{self, Serial};

use usart_echo::{EchoUsart, Interrupts, Led};

/// Console baud rate, 8N1 without flow control
pub const CONSOLE_BAUD: u32 = 115_200;

/// USART2 pins on the ST-LINK virtual COM port
pub struct ConsolePins {
    pub tx: PA2<Analog>,
    pub rx: PA3<Analog>,
}

/// HSI16 as system clock, so PCLK1 divides down to 115200 baud within 0.1 %
pub fn clock_setup(rcc: RCC) -> Rcc {
    rcc.freeze(ClockConfig::hsi16())
}

/// Enables the GPIOA clock and makes PA5 (LD2) a push-pull output.
///
/// PA2 and PA3 are passed on untouched, [usart_setup] switches them to AF4.
pub fn gpio_setup(gpioa: GPIOA, rcc: &mut Rcc) -> (Ld2, ConsolePins) {
    let gpioa = gpioa.split(rcc);

    let led = Ld2::new(gpioa.pa5.into_push_pull_output());
    let pins = ConsolePins {
        tx: gpioa.pa2,
        rx: gpioa.pa3,
    };

    (led, pins)
}

/// Enables the USART2 clock, configures 115200 8N1 on PA2/PA3, enables the
/// receive interrupt and unmasks USART2 at the NVIC.
///
/// USART2 may interrupt as soon as this returns with interrupts enabled.
pub fn usart_setup(usart: USART2, pins: ConsolePins, rcc: &mut Rcc) -> Usart2 {
    // the default frame is 8N1
    let config = serial::Config::default().baudrate(CONSOLE_BAUD.Bd());

    let port = usart
        .usart(pins.tx, pins.rx, config, rcc)
        .expect("USART2 configuration failed");

    let usart = Usart2::new(port);

    unsafe { NVIC::unmask(pac::Interrupt::USART2) };

    usart
}

/// USART2 as seen by the echo handler
pub struct Usart2 {
    port: Serial<USART2>,
    /// mirrors RXNEIE/TXEIE, only this adapter changes them
    enabled: Interrupts,
}

impl Usart2 {
    /// Takes the configured serial port and enables its receive interrupt
    pub fn new(mut port: Serial<USART2>) -> Self {
        port.listen(serial::Event::Rxne);

        Self {
            port,
            enabled: Interrupts::RXNE,
        }
    }
}

impl EchoUsart for Usart2 {
    fn interrupts(&self) -> Interrupts {
        self.enabled
    }

    fn try_read(&mut self) -> Option<u8> {
        // a byte with a framing, noise or overrun error is dropped
        self.port.read().ok()
    }

    fn try_write(&mut self, byte: u8) -> bool {
        self.port.write(byte).is_ok()
    }

    fn listen_tx(&mut self, enable: bool) {
        if enable {
            self.port.listen(serial::Event::Txe);
        } else {
            self.port.unlisten(serial::Event::Txe);
        }
        self.enabled.set(Interrupts::TXE, enable);
    }
}

/// The green user LED on PA5
pub struct Ld2 {
    pin: PA5<Output<PushPull>>,
}

impl Ld2 {
    pub fn new(pin: PA5<Output<PushPull>>) -> Self {
        Self { pin }
    }
}

impl Led for Ld2 {
    // writes to BSRR, which cannot fail
    fn on(&mut self) {
        self.pin.set_high().ok();
    }

    fn off(&mut self) {
        self.pin.set_low().ok();
    }

    fn toggle(&mut self) {
        if self.is_on() {
            self.off();
        } else {
            self.on();
        }
    }

    fn is_on(&self) -> bool {
        self.pin.is_set_high().unwrap_or(false)
    }
}
