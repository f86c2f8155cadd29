//! R-Car SCIF 寄存器布局（16 位寄存器，`index = offset >> 2`）

use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::{Register, RegisterMap};
use crate::{Control, StatusFlags, Variant};

// 寄存器偏移 (相对于基地址)，步进 4 字节
pub const SCIF_SCSMR: u64 = 0x00;
pub const SCIF_SCBRR: u64 = 0x04;
pub const SCIF_SCSCR: u64 = 0x08;
pub const SCIF_SCFTDR: u64 = 0x0c;
pub const SCIF_SCFSR: u64 = 0x10;
pub const SCIF_SCFRDR: u64 = 0x14;
pub const SCIF_SCFCR: u64 = 0x18;
pub const SCIF_SCFDR: u64 = 0x1c;
pub const SCIF_SCSPTR: u64 = 0x20;
pub const SCIF_SCLSR: u64 = 0x24;
pub const SCIF_DL: u64 = 0x30;
pub const SCIF_CKS: u64 = 0x34;

/// 覆盖到 CKS (index 13)
pub const SCIF_WINDOW: u64 = 0x38;

register_bitfields! [
    u16,

    /// Serial Control Register
    SCSCR [
        CKE OFFSET(0) NUMBITS(2) [],
        TOIE OFFSET(2) NUMBITS(1) [],
        REIE OFFSET(3) NUMBITS(1) [],
        RE OFFSET(4) NUMBITS(1) [],
        TE OFFSET(5) NUMBITS(1) [],
        RIE OFFSET(6) NUMBITS(1) [],
        TIE OFFSET(7) NUMBITS(1) [],
        TEIE OFFSET(11) NUMBITS(1) []
    ],

    /// Serial Status Register
    SCFSR [
        DR OFFSET(0) NUMBITS(1) [],
        RDF OFFSET(1) NUMBITS(1) [],
        PER OFFSET(2) NUMBITS(1) [],
        FER OFFSET(3) NUMBITS(1) [],
        BRK OFFSET(4) NUMBITS(1) [],
        TDFE OFFSET(5) NUMBITS(1) [],
        TEND OFFSET(6) NUMBITS(1) [],
        ER OFFSET(7) NUMBITS(1) [],
        FERC OFFSET(8) NUMBITS(4) [],
        PERC OFFSET(12) NUMBITS(4) []
    ],

    /// FIFO Control Register
    SCFCR [
        LOOP OFFSET(0) NUMBITS(1) [],
        RFRST OFFSET(1) NUMBITS(1) [],
        TFRST OFFSET(2) NUMBITS(1) [],
        MCE OFFSET(3) NUMBITS(1) [],
        TTRG OFFSET(4) NUMBITS(2) [],
        RTRG OFFSET(6) NUMBITS(2) [],
        RSTRG OFFSET(8) NUMBITS(3) []
    ],

    /// FIFO Data Count Register
    SCFDR [
        R OFFSET(0) NUMBITS(5) [],
        T OFFSET(8) NUMBITS(5) []
    ],

    /// Line Status Register
    SCLSR [
        ORER OFFSET(0) NUMBITS(1) [],
        TO OFFSET(2) NUMBITS(1) []
    ]
];

const SCFSR_FLAGS: StatusFlags = StatusFlags::DATA_READY
    .union(StatusFlags::PARITY_ERROR)
    .union(StatusFlags::FRAMING_ERROR)
    .union(StatusFlags::BREAK)
    .union(StatusFlags::TX_EMPTY)
    .union(StatusFlags::TX_END);

const SCLSR_FLAGS: StatusFlags = StatusFlags::OVERRUN_ERROR.union(StatusFlags::TIMEOUT);

fn bit(status: StatusFlags, flag: StatusFlags) -> u16 {
    u16::from(status.contains(flag))
}

/// 解析 SCFCR 中的 FIFO 复位请求，返回 `(rx_reset, tx_reset)`
pub fn fifo_resets(raw: u16) -> (bool, bool) {
    let fcr = LocalRegisterCopy::<u16, SCFCR::Register>::new(raw);
    (fcr.is_set(SCFCR::RFRST), fcr.is_set(SCFCR::TFRST))
}

/// 组装 SCFDR
pub fn fifo_count(rx: u16, tx: u16) -> u16 {
    let mut fdr = LocalRegisterCopy::<u16, SCFDR::Register>::new(0);
    fdr.modify(SCFDR::R.val(rx) + SCFDR::T.val(tx));
    fdr.get()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScifMap;

impl RegisterMap for ScifMap {
    fn variant(&self) -> Variant {
        Variant::Scif
    }

    fn window(&self) -> u64 {
        SCIF_WINDOW
    }

    fn access_valid(&self, width: u32) -> bool {
        matches!(width, 1 | 2)
    }

    fn decode(&self, offset: u64) -> Option<Register> {
        let reg = match (offset >> 2) << 2 {
            SCIF_SCSMR => Register::Mode,
            SCIF_SCBRR => Register::BitRate,
            SCIF_SCSCR => Register::Control,
            SCIF_SCFTDR => Register::TxData,
            SCIF_SCFSR => Register::Status,
            SCIF_SCFRDR => Register::RxData,
            SCIF_SCFCR => Register::FifoControl,
            SCIF_SCFDR => Register::FifoCount,
            SCIF_SCSPTR => Register::PortControl,
            SCIF_SCLSR => Register::LineStatus,
            SCIF_DL => Register::Divisor,
            SCIF_CKS => Register::ClockSelect,
            _ => return None,
        };
        Some(reg)
    }

    fn control(&self, raw: u16) -> Control {
        let scr = LocalRegisterCopy::<u16, SCSCR::Register>::new(raw);
        let mut ctl = Control::empty();
        ctl.set(Control::TX_ENABLE, scr.is_set(SCSCR::TE));
        ctl.set(Control::RX_ENABLE, scr.is_set(SCSCR::RE));
        ctl.set(Control::TX_IRQ, scr.is_set(SCSCR::TIE));
        ctl.set(Control::RX_IRQ, scr.is_set(SCSCR::RIE));
        ctl.set(
            Control::ERROR_IRQ,
            scr.is_set(SCSCR::RIE) || scr.is_set(SCSCR::REIE),
        );
        ctl.set(Control::TX_END_IRQ, scr.is_set(SCSCR::TEIE));
        ctl
    }

    fn status_mask(&self, reg: Register) -> StatusFlags {
        match reg {
            Register::Status => SCFSR_FLAGS,
            Register::LineStatus => SCLSR_FLAGS,
            _ => StatusFlags::empty(),
        }
    }

    fn status_writable(&self, _reg: Register) -> StatusFlags {
        StatusFlags::empty()
    }

    fn pack_status(&self, reg: Register, status: StatusFlags) -> u16 {
        match reg {
            Register::Status => {
                let errors = u16::from(
                    status.intersects(StatusFlags::PARITY_ERROR | StatusFlags::FRAMING_ERROR),
                );
                let mut fsr = LocalRegisterCopy::<u16, SCFSR::Register>::new(0);
                // 单字节 FIFO：触发级别为 1，DR 与 RDF 同步
                fsr.modify(
                    SCFSR::DR.val(bit(status, StatusFlags::DATA_READY))
                        + SCFSR::RDF.val(bit(status, StatusFlags::DATA_READY))
                        + SCFSR::PER.val(bit(status, StatusFlags::PARITY_ERROR))
                        + SCFSR::FER.val(bit(status, StatusFlags::FRAMING_ERROR))
                        + SCFSR::BRK.val(bit(status, StatusFlags::BREAK))
                        + SCFSR::TDFE.val(bit(status, StatusFlags::TX_EMPTY))
                        + SCFSR::TEND.val(bit(status, StatusFlags::TX_END))
                        + SCFSR::ER.val(errors)
                        + SCFSR::FERC.val(bit(status, StatusFlags::FRAMING_ERROR))
                        + SCFSR::PERC.val(bit(status, StatusFlags::PARITY_ERROR)),
                );
                fsr.get()
            }
            Register::LineStatus => {
                let mut lsr = LocalRegisterCopy::<u16, SCLSR::Register>::new(0);
                lsr.modify(
                    SCLSR::ORER.val(bit(status, StatusFlags::OVERRUN_ERROR))
                        + SCLSR::TO.val(bit(status, StatusFlags::TIMEOUT)),
                );
                lsr.get()
            }
            _ => 0,
        }
    }

    fn unpack_status(&self, reg: Register, value: u16) -> StatusFlags {
        let mut status = StatusFlags::empty();
        match reg {
            Register::Status => {
                let fsr = LocalRegisterCopy::<u16, SCFSR::Register>::new(value);
                status.set(
                    StatusFlags::DATA_READY,
                    fsr.is_set(SCFSR::DR) || fsr.is_set(SCFSR::RDF),
                );
                status.set(StatusFlags::PARITY_ERROR, fsr.is_set(SCFSR::PER));
                status.set(StatusFlags::FRAMING_ERROR, fsr.is_set(SCFSR::FER));
                status.set(StatusFlags::BREAK, fsr.is_set(SCFSR::BRK));
                status.set(StatusFlags::TX_EMPTY, fsr.is_set(SCFSR::TDFE));
                status.set(StatusFlags::TX_END, fsr.is_set(SCFSR::TEND));
            }
            Register::LineStatus => {
                let lsr = LocalRegisterCopy::<u16, SCLSR::Register>::new(value);
                status.set(StatusFlags::OVERRUN_ERROR, lsr.is_set(SCLSR::ORER));
                status.set(StatusFlags::TIMEOUT, lsr.is_set(SCLSR::TO));
            }
            _ => {}
        }
        status
    }

    fn break_flags(&self) -> StatusFlags {
        StatusFlags::FRAMING_ERROR | StatusFlags::BREAK
    }
}
