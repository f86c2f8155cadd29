//! Renesas SCI / SCIF 串口控制器模型
//!
//! 供全系统模拟器使用：客户机固件通过内存映射寄存器驱动虚拟 UART，
//! 其寄存器语义、波特率时序与中断行为与真实芯片一致。
//!
//! - [`Variant::Sci`]：8 位寄存器，字节步进（RX62N SCI）
//! - [`Variant::Scif`]：16 位寄存器，`index = offset >> 2`（R-Car SCIF）

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

use bitflags::bitflags;

pub mod config;
pub mod device;
pub mod error;
pub mod irq;
pub mod regs;
pub mod snapshot;
pub mod timeline;
pub mod timing;
pub mod transport;

pub use config::Config;
pub use device::Sci;
pub use error::{ConfigError, ReceiveError, SnapshotError};
pub use irq::{IrqLine, IrqSink, NullIrq, Trigger};
pub use snapshot::SciSnapshot;
pub use timeline::{Expire, Timeline, VirtualClock};
pub use transport::{CaptureTransport, NullTransport, Transport};

// ============================================================================
// 变体
// ============================================================================

/// 控制器寄存器布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// 8 位寄存器，8 字节窗口
    Sci,
    /// 带 FIFO 的 16 位寄存器，字寻址
    Scif,
}

// ============================================================================
// 状态标志类型
// ============================================================================

bitflags! {
    /// 逻辑状态标志，与具体寄存器布局无关
    ///
    /// 读寄存器时由 [`regs::RegisterMap`] 按变体打包。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u16 {
        /// RDRF / DR
        const DATA_READY = 1 << 0;
        /// TDRE / TDFE
        const TX_EMPTY = 1 << 1;
        /// TEND
        const TX_END = 1 << 2;
        const PARITY_ERROR = 1 << 3;
        const FRAMING_ERROR = 1 << 4;
        const OVERRUN_ERROR = 1 << 5;
        /// SCIF BRK
        const BREAK = 1 << 6;
        /// SCIF SCLSR.TO
        const TIMEOUT = 1 << 7;
        /// SCI SSR.MPB
        const MP_BIT = 1 << 8;
        /// SCI SSR.MPBT
        const MP_BIT_TRANSFER = 1 << 9;
    }
}

impl StatusFlags {
    /// 任一置位即驱动 ERI
    pub const ERRORS: Self = Self::PARITY_ERROR
        .union(Self::FRAMING_ERROR)
        .union(Self::OVERRUN_ERROR)
        .union(Self::BREAK);

    /// 只能通过“先读 1 再写 0”清除的标志
    pub const ACKNOWLEDGEABLE: Self = Self::ERRORS.union(Self::TIMEOUT);

    /// 上电复位值
    pub const RESET: Self = Self::TX_EMPTY.union(Self::TX_END);

    pub fn has_error(&self) -> bool {
        self.intersects(Self::ERRORS)
    }
}

bitflags! {
    /// 控制寄存器的逻辑视图
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Control: u8 {
        const TX_ENABLE = 0x01;
        const RX_ENABLE = 0x02;
        const TX_IRQ = 0x04;
        const RX_IRQ = 0x08;
        const ERROR_IRQ = 0x10;
        const TX_END_IRQ = 0x20;
    }
}

impl Control {
    /// 收发任一使能时禁止修改模式与波特率
    pub fn transfer_enabled(&self) -> bool {
        self.intersects(Self::TX_ENABLE | Self::RX_ENABLE)
    }
}
