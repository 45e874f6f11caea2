#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m::asm;
use cortex_m_rt::entry;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use stm32l0xx_hal::pac::{self, interrupt};

use usart_echo::Echo;

use {defmt_rtt as _, panic_probe as _};

mod board;

use board::{Ld2, Usart2, CONSOLE_BAUD};

/// Echo state, owned by the USART2 handler once `main` installed it
static ECHO: Mutex<CriticalSectionRawMutex, RefCell<Option<Echo<Usart2, Ld2>>>> =
    Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().expect("peripherals taken twice");

    defmt::info!("usart echo on NUCLEO-L053R8, {=u32} baud 8N1", CONSOLE_BAUD);

    // interrupts stay off until the handler finds its state
    critical_section::with(|cs| {
        let mut rcc = board::clock_setup(dp.RCC);
        let (led, pins) = board::gpio_setup(dp.GPIOA, &mut rcc);
        let usart = board::usart_setup(dp.USART2, pins, &mut rcc);

        ECHO.borrow(cs).replace(Some(Echo::new(usart, led)));
    });

    defmt::info!("USART2 live, echoing");

    loop {
        asm::nop(); // all work happens in USART2
    }
}

#[interrupt]
fn USART2() {
    ECHO.lock(|cell| {
        let mut state = cell.borrow_mut();
        let Some(echo) = state.as_mut() else {
            return;
        };

        let serviced = echo.on_interrupt();
        if !serviced.is_spurious() {
            defmt::trace!("{}", serviced);
        }
    });
}
