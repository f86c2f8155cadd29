//! SCI / SCIF 寄存器定义与地址译码
//!
//! 两种布局共享同一个行为核心：[`RegisterMap`] 把访问偏移译码为语义寄存器，
//! 并负责逻辑标志与各变体位布局之间的打包/解包。

use enum_dispatch::enum_dispatch;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::{Control, StatusFlags, Variant};

pub mod sci;
pub mod scif;

pub use sci::SciMap;
pub use scif::ScifMap;

register_bitfields! [
    u16,

    /// Serial Mode Register (SMR / SCSMR)，两种变体位置相同
    pub SMR [
        CKS OFFSET(0) NUMBITS(2) [
            Pclk = 0,
            PclkDiv4 = 1,
            PclkDiv16 = 2,
            PclkDiv64 = 3
        ],
        MP OFFSET(2) NUMBITS(1) [],
        STOP OFFSET(3) NUMBITS(1) [],
        PM OFFSET(4) NUMBITS(1) [],
        PE OFFSET(5) NUMBITS(1) [],
        CHR OFFSET(6) NUMBITS(1) [],
        CM OFFSET(7) NUMBITS(1) []
    ]
];

/// 模式寄存器的本地副本
pub type Mode = LocalRegisterCopy<u16, SMR::Register>;

/// 译码后的语义寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// SMR / SCSMR
    Mode,
    /// BRR / SCBRR
    BitRate,
    /// SCR / SCSCR
    Control,
    /// TDR / SCFTDR
    TxData,
    /// SSR / SCFSR
    Status,
    /// RDR / SCFRDR，只读
    RxData,
    /// SCMR (SCI)
    ExtMode,
    /// SEMR (SCI)
    ExtControl,
    /// SCFCR (SCIF)
    FifoControl,
    /// SCFDR (SCIF)，只读
    FifoCount,
    /// SCSPTR (SCIF)
    PortControl,
    /// SCLSR (SCIF)
    LineStatus,
    /// DL (SCIF)
    Divisor,
    /// CKS (SCIF)
    ClockSelect,
}

impl Register {
    /// 收发使能期间写入会被忽略的寄存器
    pub fn is_clock_config(&self) -> bool {
        matches!(
            self,
            Self::Mode | Self::BitRate | Self::Divisor | Self::ClockSelect
        )
    }
}

/// 寄存器布局策略
#[enum_dispatch]
pub trait RegisterMap {
    fn variant(&self) -> Variant;

    /// 内存映射窗口大小（字节）
    fn window(&self) -> u64;

    fn access_valid(&self, width: u32) -> bool;

    /// 偏移到寄存器，未实现的偏移返回 `None`
    fn decode(&self, offset: u64) -> Option<Register>;

    /// 原始控制寄存器值的逻辑视图
    fn control(&self, raw: u16) -> Control;

    /// 某个状态寄存器覆盖的逻辑标志
    fn status_mask(&self, reg: Register) -> StatusFlags;

    /// 写入即生效（无需确认）的状态位
    fn status_writable(&self, reg: Register) -> StatusFlags;

    fn pack_status(&self, reg: Register, status: StatusFlags) -> u16;

    fn unpack_status(&self, reg: Register, value: u16) -> StatusFlags;

    /// 传输端报告 break 时置位的标志
    fn break_flags(&self) -> StatusFlags;
}

/// 变体选择，构造时确定
#[enum_dispatch(RegisterMap)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Sci(SciMap),
    Scif(ScifMap),
}

impl Layout {
    pub fn new(variant: Variant) -> Self {
        match variant {
            Variant::Sci => SciMap.into(),
            Variant::Scif => ScifMap.into(),
        }
    }
}

/// 访问宽度对应的全 1 值
pub(crate) fn all_ones(width: u32) -> u64 {
    match width {
        1..=7 => (1u64 << (width * 8)) - 1,
        _ => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_selects_layout() {
        assert_eq!(Layout::new(Variant::Sci).variant(), Variant::Sci);
        assert_eq!(Layout::new(Variant::Scif).variant(), Variant::Scif);
        assert_eq!(Layout::new(Variant::Sci).window(), 0x8);
    }

    #[test]
    fn all_ones_follows_width() {
        assert_eq!(all_ones(1), 0xff);
        assert_eq!(all_ones(2), 0xffff);
        assert_eq!(all_ones(8), u64::MAX);
    }

    #[test]
    fn mode_fields() {
        let mode = Mode::new(0b0110_1001);
        assert_eq!(mode.read(SMR::CKS), 1);
        assert!(mode.is_set(SMR::STOP));
        assert!(mode.is_set(SMR::PE));
        assert!(mode.is_set(SMR::CHR));
        assert!(!mode.is_set(SMR::PM));
    }
}
