//! RX62N SCI 寄存器布局（8 位寄存器，字节步进）

use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::{Register, RegisterMap};
use crate::{Control, StatusFlags, Variant};

// 寄存器偏移 (相对于基地址)，每个寄存器 1 字节
pub const SCI_SMR: u64 = 0x00;
pub const SCI_BRR: u64 = 0x01;
pub const SCI_SCR: u64 = 0x02;
pub const SCI_TDR: u64 = 0x03;
pub const SCI_SSR: u64 = 0x04;
pub const SCI_RDR: u64 = 0x05;
pub const SCI_SCMR: u64 = 0x06;
pub const SCI_SEMR: u64 = 0x07;

pub const SCI_WINDOW: u64 = 0x08;

register_bitfields! [
    u8,

    /// Serial Control Register
    SCR [
        CKE OFFSET(0) NUMBITS(2) [],
        TEIE OFFSET(2) NUMBITS(1) [],
        MPIE OFFSET(3) NUMBITS(1) [],
        RE OFFSET(4) NUMBITS(1) [],
        TE OFFSET(5) NUMBITS(1) [],
        RIE OFFSET(6) NUMBITS(1) [],
        TIE OFFSET(7) NUMBITS(1) []
    ],

    /// Serial Status Register
    SSR [
        MPBT OFFSET(0) NUMBITS(1) [],
        MPB OFFSET(1) NUMBITS(1) [],
        TEND OFFSET(2) NUMBITS(1) [],
        PER OFFSET(3) NUMBITS(1) [],
        FER OFFSET(4) NUMBITS(1) [],
        ORER OFFSET(5) NUMBITS(1) [],
        RDRF OFFSET(6) NUMBITS(1) [],
        TDRE OFFSET(7) NUMBITS(1) []
    ]
];

/// SSR 覆盖的逻辑标志
const SSR_FLAGS: StatusFlags = StatusFlags::MP_BIT_TRANSFER
    .union(StatusFlags::MP_BIT)
    .union(StatusFlags::TX_END)
    .union(StatusFlags::PARITY_ERROR)
    .union(StatusFlags::FRAMING_ERROR)
    .union(StatusFlags::OVERRUN_ERROR)
    .union(StatusFlags::DATA_READY)
    .union(StatusFlags::TX_EMPTY);

fn bit(status: StatusFlags, flag: StatusFlags) -> u8 {
    u8::from(status.contains(flag))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SciMap;

impl RegisterMap for SciMap {
    fn variant(&self) -> Variant {
        Variant::Sci
    }

    fn window(&self) -> u64 {
        SCI_WINDOW
    }

    fn access_valid(&self, width: u32) -> bool {
        width == 1
    }

    fn decode(&self, offset: u64) -> Option<Register> {
        let reg = match offset {
            SCI_SMR => Register::Mode,
            SCI_BRR => Register::BitRate,
            SCI_SCR => Register::Control,
            SCI_TDR => Register::TxData,
            SCI_SSR => Register::Status,
            SCI_RDR => Register::RxData,
            SCI_SCMR => Register::ExtMode,
            SCI_SEMR => Register::ExtControl,
            _ => return None,
        };
        Some(reg)
    }

    fn control(&self, raw: u16) -> Control {
        let scr = LocalRegisterCopy::<u8, SCR::Register>::new(raw as u8);
        let mut ctl = Control::empty();
        ctl.set(Control::TX_ENABLE, scr.is_set(SCR::TE));
        ctl.set(Control::RX_ENABLE, scr.is_set(SCR::RE));
        ctl.set(Control::TX_IRQ, scr.is_set(SCR::TIE));
        // RIE 同时使能 RXI 与 ERI
        ctl.set(Control::RX_IRQ, scr.is_set(SCR::RIE));
        ctl.set(Control::ERROR_IRQ, scr.is_set(SCR::RIE));
        ctl.set(Control::TX_END_IRQ, scr.is_set(SCR::TEIE));
        ctl
    }

    fn status_mask(&self, reg: Register) -> StatusFlags {
        match reg {
            Register::Status => SSR_FLAGS,
            _ => StatusFlags::empty(),
        }
    }

    fn status_writable(&self, reg: Register) -> StatusFlags {
        match reg {
            Register::Status => StatusFlags::MP_BIT_TRANSFER,
            _ => StatusFlags::empty(),
        }
    }

    fn pack_status(&self, reg: Register, status: StatusFlags) -> u16 {
        if reg != Register::Status {
            return 0;
        }
        let mut ssr = LocalRegisterCopy::<u8, SSR::Register>::new(0);
        ssr.modify(
            SSR::MPBT.val(bit(status, StatusFlags::MP_BIT_TRANSFER))
                + SSR::MPB.val(bit(status, StatusFlags::MP_BIT))
                + SSR::TEND.val(bit(status, StatusFlags::TX_END))
                + SSR::PER.val(bit(status, StatusFlags::PARITY_ERROR))
                + SSR::FER.val(bit(status, StatusFlags::FRAMING_ERROR))
                + SSR::ORER.val(bit(status, StatusFlags::OVERRUN_ERROR))
                + SSR::RDRF.val(bit(status, StatusFlags::DATA_READY))
                + SSR::TDRE.val(bit(status, StatusFlags::TX_EMPTY)),
        );
        u16::from(ssr.get())
    }

    fn unpack_status(&self, reg: Register, value: u16) -> StatusFlags {
        if reg != Register::Status {
            return StatusFlags::empty();
        }
        let ssr = LocalRegisterCopy::<u8, SSR::Register>::new(value as u8);
        let mut status = StatusFlags::empty();
        status.set(StatusFlags::MP_BIT_TRANSFER, ssr.is_set(SSR::MPBT));
        status.set(StatusFlags::MP_BIT, ssr.is_set(SSR::MPB));
        status.set(StatusFlags::TX_END, ssr.is_set(SSR::TEND));
        status.set(StatusFlags::PARITY_ERROR, ssr.is_set(SSR::PER));
        status.set(StatusFlags::FRAMING_ERROR, ssr.is_set(SSR::FER));
        status.set(StatusFlags::OVERRUN_ERROR, ssr.is_set(SSR::ORER));
        status.set(StatusFlags::DATA_READY, ssr.is_set(SSR::RDRF));
        status.set(StatusFlags::TX_EMPTY, ssr.is_set(SSR::TDRE));
        status
    }

    fn break_flags(&self) -> StatusFlags {
        StatusFlags::FRAMING_ERROR
    }
}
