// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! TG165 board bring-up: clocks, USB pins, power button and GPIO snapshot.

use core::convert::Infallible;
use core::ptr::read_volatile;

use embedded_hal::digital::{ErrorType, InputPin};
use stm32f1xx_hal::gpio::{gpiob::PB1, gpioe::PE0, Input, Output, PullUp, PushPull};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::prelude::*;
use stm32f1xx_hal::usb::{Peripheral, UsbBus, UsbBusType};
use usb_device::class_prelude::UsbBusAllocator;

use crate::flash::StmFlash;
use crate::hal::{GpioPorts, Port};

/// Core clock after [`init_board`].
pub const SYSCLK_HZ: u32 = 72_000_000;

/// Power button on PB1, pressed when low.
pub struct PowerButton {
    pin: PB1<Input<PullUp>>,
}

impl ErrorType for PowerButton {
    type Error = Infallible;
}

impl InputPin for PowerButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}

/// D+ pull-up enable on PE0, active low.
pub struct UsbPullUp {
    pin: PE0<Output<PushPull>>,
}

impl UsbPullUp {
    pub fn connect(&mut self) {
        self.pin.set_low();
    }

    pub fn disconnect(&mut self) {
        self.pin.set_high();
    }
}

/// Input data registers of ports A..E.
pub struct StmGpio {
    _private: (),
}

impl StmGpio {
    fn idr(port: Port) -> *const u32 {
        let base: u32 = match port {
            Port::A => 0x4001_0800,
            Port::B => 0x4001_0C00,
            Port::C => 0x4001_1000,
            Port::D => 0x4001_1400,
            Port::E => 0x4001_1800,
        };
        (base + 0x08) as *const u32
    }
}

impl GpioPorts for StmGpio {
    fn read_port(&self, port: Port) -> u32 {
        unsafe { read_volatile(Self::idr(port)) }
    }
}

pub struct Board {
    pub usb: Peripheral,
    pub usb_pullup: UsbPullUp,
    pub button: PowerButton,
    pub flash: StmFlash,
    pub gpio: StmGpio,
}

/// Bring up clocks (8 MHz HSE, 72 MHz core, 48 MHz USB) and board pins.
/// The USB pull-up starts disconnected.
///
/// # Safety
/// Uses `Peripherals::steal()`; call once, before anything else touches the
/// peripherals.
pub unsafe fn init_board() -> Board {
    let dp = pac::Peripherals::steal();

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let _clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(SYSCLK_HZ.Hz())
        .pclk1(36.MHz())
        .freeze(&mut flash.acr);

    let gpioa = dp.GPIOA.split();
    let mut gpiob = dp.GPIOB.split();
    let mut gpioe = dp.GPIOE.split();
    // Ports C and D only need their clocks for the GPIO snapshot.
    let _gpioc = dp.GPIOC.split();
    let _gpiod = dp.GPIOD.split();

    let mut usb_pullup = UsbPullUp {
        pin: gpioe.pe0.into_push_pull_output(&mut gpioe.crl),
    };
    usb_pullup.disconnect();

    Board {
        usb: Peripheral {
            usb: dp.USB,
            pin_dm: gpioa.pa11,
            pin_dp: gpioa.pa12,
        },
        usb_pullup,
        button: PowerButton {
            pin: gpiob.pb1.into_pull_up_input(&mut gpiob.crl),
        },
        flash: StmFlash::new(),
        gpio: StmGpio { _private: () },
    }
}

/// Static storage for UsbBusAllocator (required by usb-device for 'static lifetime).
static mut USB_BUS: Option<UsbBusAllocator<UsbBusType>> = None;

/// Build the bus allocator once and hand out its `'static` reference.
pub fn store_usb_bus(usb: Peripheral) -> &'static UsbBusAllocator<UsbBusType> {
    unsafe {
        let slot = &mut *core::ptr::addr_of_mut!(USB_BUS);
        slot.insert(UsbBus::new(usb))
    }
}

/// Reset the MCU after `settle_cycles` of busy-wait.
pub fn system_reset(settle_cycles: u32) -> ! {
    cortex_m::asm::delay(settle_cycles);
    cortex_m::peripheral::SCB::sys_reset()
}
