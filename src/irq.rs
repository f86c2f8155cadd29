//! 中断输出
//!
//! 控制器有四根中断线。ERI 与 TEI 是电平信号，由状态标志持续推导；
//! RXI 与 TXI 是边沿信号，每个事件产生一次脉冲（拉高后立即拉低）。

use alloc::boxed::Box;

use bitflags::bitflags;

/// 中断线编号，顺序与外部连接一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IrqLine {
    /// 接收错误
    Eri = 0,
    /// 接收数据
    Rxi = 1,
    /// 发送数据空
    Txi = 2,
    /// 发送结束
    Tei = 3,
}

/// 中断线的触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Edge,
    Level,
}

impl IrqLine {
    pub const ALL: [IrqLine; 4] = [Self::Eri, Self::Rxi, Self::Txi, Self::Tei];

    pub fn trigger(&self) -> Trigger {
        match self {
            Self::Eri | Self::Tei => Trigger::Level,
            Self::Rxi | Self::Txi => Trigger::Edge,
        }
    }

    fn mask(&self) -> Lines {
        Lines::from_bits_truncate(1 << (*self as u8))
    }
}

/// 外部中断控制器的接入点
pub trait IrqSink {
    fn set(&mut self, line: IrqLine, level: bool);

    fn pulse(&mut self, line: IrqLine) {
        self.set(line, true);
        self.set(line, false);
    }
}

/// 不连接任何中断控制器
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIrq;

impl IrqSink for NullIrq {
    fn set(&mut self, _line: IrqLine, _level: bool) {}
}

bitflags! {
    /// 当前保持为高的电平线
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Lines: u8 {
        const ERI = 1 << 0;
        const RXI = 1 << 1;
        const TXI = 1 << 2;
        const TEI = 1 << 3;
    }
}

/// 中断线驱动，只向外部输出电平变化
pub struct IrqDriver {
    sink: Box<dyn IrqSink>,
    levels: Lines,
}

impl IrqDriver {
    pub fn new(sink: Box<dyn IrqSink>) -> Self {
        Self {
            sink,
            levels: Lines::empty(),
        }
    }

    /// 驱动电平线，电平未变化时不输出
    pub fn set_level(&mut self, line: IrqLine, level: bool) {
        debug_assert_eq!(line.trigger(), Trigger::Level);
        if self.levels.contains(line.mask()) == level {
            return;
        }
        self.levels.set(line.mask(), level);
        log::trace!("irq {:?} -> {}", line, level);
        self.sink.set(line, level);
    }

    /// 边沿线产生一次脉冲
    pub fn pulse(&mut self, line: IrqLine) {
        debug_assert_eq!(line.trigger(), Trigger::Edge);
        log::trace!("irq {:?} pulse", line);
        self.sink.pulse(line);
    }

    pub fn is_raised(&self, line: IrqLine) -> bool {
        self.levels.contains(line.mask())
    }

    pub fn levels(&self) -> Lines {
        self.levels
    }
}

impl core::fmt::Debug for IrqDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IrqDriver")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{rc::Rc, vec::Vec};
    use core::cell::RefCell;

    #[derive(Clone, Default)]
    struct Log(Rc<RefCell<Vec<(IrqLine, bool)>>>);

    impl IrqSink for Log {
        fn set(&mut self, line: IrqLine, level: bool) {
            self.0.borrow_mut().push((line, level));
        }
    }

    #[test]
    fn level_lines_emit_only_transitions() {
        let log = Log::default();
        let mut drv = IrqDriver::new(Box::new(log.clone()));

        drv.set_level(IrqLine::Eri, false);
        drv.set_level(IrqLine::Eri, true);
        drv.set_level(IrqLine::Eri, true);
        drv.set_level(IrqLine::Eri, false);

        assert_eq!(
            *log.0.borrow(),
            [(IrqLine::Eri, true), (IrqLine::Eri, false)]
        );
    }

    #[test]
    fn pulse_raises_then_lowers() {
        let log = Log::default();
        let mut drv = IrqDriver::new(Box::new(log.clone()));

        drv.pulse(IrqLine::Rxi);

        assert_eq!(
            *log.0.borrow(),
            [(IrqLine::Rxi, true), (IrqLine::Rxi, false)]
        );
        assert!(!drv.is_raised(IrqLine::Rxi));
    }

    #[test]
    fn triggers() {
        assert_eq!(IrqLine::Eri.trigger(), Trigger::Level);
        assert_eq!(IrqLine::Tei.trigger(), Trigger::Level);
        assert_eq!(IrqLine::Rxi.trigger(), Trigger::Edge);
        assert_eq!(IrqLine::Txi.trigger(), Trigger::Edge);
    }
}
