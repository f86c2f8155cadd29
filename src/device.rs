//! SCI / SCIF 控制器行为核心
//!
//! 寄存器访问与传输端回调都会更新状态标志，随后重新推导中断线电平。
//! 发送完成由一次性定时器驱动，定时器到期时间由 [`Timeline`] 调度。
//!
//! [`Timeline`]: crate::Timeline

use alloc::boxed::Box;

use crate::{
    irq::{IrqDriver, IrqLine, IrqSink},
    regs::{self, scif, Layout, Register, RegisterMap},
    timeline::{Expire, VirtualClock},
    timing, Config, ConfigError, Control, ReceiveError, StatusFlags, Transport, Variant,
};

/// 可保存的寄存器文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RegFile {
    pub smr: u16,
    pub brr: u8,
    pub scr: u16,
    pub tdr: u8,
    pub rdr: u8,
    pub status: StatusFlags,
    pub last_read: StatusFlags,
    pub scmr: u8,
    pub semr: u8,
    pub fcr: u16,
    pub sptr: u16,
    pub dl: u16,
    pub cks: u16,
}

impl RegFile {
    const RESET: Self = Self {
        smr: 0,
        brr: 0,
        scr: 0,
        tdr: 0xff,
        rdr: 0,
        status: StatusFlags::RESET,
        last_read: StatusFlags::empty(),
        scmr: 0,
        semr: 0,
        fcr: 0,
        sptr: 0,
        dl: 0,
        cks: 0,
    };
}

/// 发送状态机的状态，由 TDRE/TEND 与定时器推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// TEND = 1，无字节在线路上
    Idle,
    /// 字节在线路上，TDR 空闲
    Sending,
    /// 字节在线路上，TDR 中还有一个待发字节
    Loaded,
}

/// 一个 SCI / SCIF 控制器实例
///
/// # Example
///
/// ```
/// use renesas_sci::{CaptureTransport, Config, NullIrq, Sci, Variant, VirtualClock};
///
/// let clock = VirtualClock::new();
/// let wire = CaptureTransport::<16>::new();
/// let mut sci = Sci::new(
///     Config::new(Variant::Sci).input_freq(64_000_000),
///     clock.clone(),
///     Box::new(wire.clone()),
///     Box::new(NullIrq),
/// )
/// .unwrap();
///
/// sci.write(0x01, 1, 1); // BRR
/// sci.write(0x03, 1, b'A' as u64); // TDR
/// assert_eq!(wire.bytes().as_slice(), b"A");
/// assert_eq!(sci.deadline(), Some(5000));
/// ```
pub struct Sci {
    layout: Layout,
    regs: RegFile,
    input_freq: u64,
    char_time_ns: u64,
    rx_next_ns: u64,
    deadline: Option<u64>,
    clock: VirtualClock,
    transport: Box<dyn Transport>,
    irq: IrqDriver,
}

impl Sci {
    /// 创建并复位控制器
    ///
    /// 输入时钟未设置时返回 [`ConfigError::MissingInputFrequency`]，
    /// 控制器不会投入使用。
    pub fn new(
        config: Config,
        clock: VirtualClock,
        transport: Box<dyn Transport>,
        irq: Box<dyn IrqSink>,
    ) -> Result<Self, ConfigError> {
        let input_freq = config.validate().inspect_err(|e| {
            log::error!("renesas-sci: {}", e);
        })?;

        let mut sci = Self {
            layout: Layout::new(config.variant),
            regs: RegFile::RESET,
            input_freq,
            char_time_ns: 0,
            rx_next_ns: 0,
            deadline: None,
            clock,
            transport,
            irq: IrqDriver::new(irq),
        };
        sci.reset();
        Ok(sci)
    }

    /// 上电复位
    pub fn reset(&mut self) {
        self.regs = RegFile::RESET;
        self.rx_next_ns = self.clock.now_ns();
        self.deadline = None;
        self.update_char_time();
        self.update_irq();
    }

    // ==================== 查询 ====================

    pub fn variant(&self) -> Variant {
        self.layout.variant()
    }

    /// 内存映射窗口大小
    pub fn window(&self) -> u64 {
        self.layout.window()
    }

    pub fn status(&self) -> StatusFlags {
        self.regs.status
    }

    pub fn control(&self) -> Control {
        self.layout.control(self.regs.scr)
    }

    pub fn char_time_ns(&self) -> u64 {
        self.char_time_ns
    }

    pub fn rx_next_ns(&self) -> u64 {
        self.rx_next_ns
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn tx_state(&self) -> TxState {
        if self.regs.status.contains(StatusFlags::TX_END) {
            TxState::Idle
        } else if self.regs.status.contains(StatusFlags::TX_EMPTY) {
            TxState::Sending
        } else {
            TxState::Loaded
        }
    }

    /// 电平中断线当前是否为高
    pub fn irq_level(&self, line: IrqLine) -> bool {
        self.irq.is_raised(line)
    }

    // ==================== 寄存器访问 ====================

    /// 读寄存器，未实现的偏移返回全 1
    pub fn read(&mut self, offset: u64, width: u32) -> u64 {
        let ones = regs::all_ones(width);
        let Some(reg) = self.decode(offset, width) else {
            return ones;
        };

        let value = match reg {
            Register::Mode => self.regs.smr,
            Register::BitRate => u16::from(self.regs.brr),
            Register::Control => self.regs.scr,
            Register::TxData => u16::from(self.regs.tdr),
            Register::RxData => {
                self.regs.status.remove(StatusFlags::DATA_READY);
                u16::from(self.regs.rdr)
            }
            Register::Status | Register::LineStatus => {
                let covered = self.layout.status_mask(reg);
                self.regs.last_read =
                    (self.regs.last_read - covered) | (self.regs.status & covered);
                self.layout.pack_status(reg, self.regs.status)
            }
            Register::ExtMode => u16::from(self.regs.scmr),
            Register::ExtControl => u16::from(self.regs.semr),
            Register::FifoControl => self.regs.fcr,
            Register::FifoCount => {
                let rx = u16::from(self.regs.status.contains(StatusFlags::DATA_READY));
                let tx = u16::from(self.tx_state() == TxState::Loaded);
                scif::fifo_count(rx, tx)
            }
            Register::PortControl => self.regs.sptr,
            Register::Divisor => self.regs.dl,
            Register::ClockSelect => self.regs.cks,
        };

        log::trace!("{:?} read {:?} = {:#x}", self.variant(), reg, value);
        u64::from(value) & ones
    }

    /// 写寄存器，非法访问只记录日志
    pub fn write(&mut self, offset: u64, width: u32, value: u64) {
        let Some(reg) = self.decode(offset, width) else {
            return;
        };
        log::trace!("{:?} write {:?} = {:#x}", self.variant(), reg, value);

        if reg.is_clock_config() && self.control().transfer_enabled() {
            log::debug!(
                "{:?}: {:?} write ignored while TE/RE set",
                self.variant(),
                reg
            );
            return;
        }

        let value = value as u16;
        match reg {
            Register::Mode => {
                self.regs.smr = value;
                self.update_char_time();
            }
            Register::BitRate => {
                self.regs.brr = value as u8;
                self.update_char_time();
            }
            Register::Divisor => self.regs.dl = value,
            Register::ClockSelect => self.regs.cks = value,
            Register::Control => self.write_scr(value),
            Register::TxData => self.write_tdr(value as u8),
            Register::Status | Register::LineStatus => self.write_status(reg, value),
            Register::RxData | Register::FifoCount => {
                log::warn!("{:?}: {:?} is read only", self.variant(), reg);
            }
            Register::ExtMode => self.regs.scmr = value as u8,
            Register::ExtControl => self.regs.semr = value as u8,
            Register::FifoControl => self.write_fcr(value),
            Register::PortControl => self.regs.sptr = value,
        }

        self.update_irq();
    }

    fn decode(&self, offset: u64, width: u32) -> Option<Register> {
        if !self.layout.access_valid(width) {
            log::warn!(
                "{:?}: invalid {}-byte access at {:#x}",
                self.variant(),
                width,
                offset
            );
            return None;
        }
        let reg = self.layout.decode(offset);
        if reg.is_none() {
            log::warn!(
                "{:?}: register {:#x} not implemented",
                self.variant(),
                offset
            );
        }
        reg
    }

    fn write_scr(&mut self, value: u16) {
        let before = self.control();
        self.regs.scr = value;
        let after = self.control();

        // 发送使能时 TDR 空闲，通知固件可以写入
        if !before.contains(Control::TX_ENABLE)
            && after.contains(Control::TX_ENABLE)
            && self.tx_state() == TxState::Idle
            && after.contains(Control::TX_IRQ)
        {
            self.irq.pulse(IrqLine::Txi);
        }
    }

    /// 先读到 1 再写 0 才清除对应标志
    fn write_status(&mut self, reg: Register, value: u16) {
        let covered = self.layout.status_mask(reg);
        let written = self.layout.unpack_status(reg, value);

        let ack = self.regs.last_read & covered & StatusFlags::ACKNOWLEDGEABLE & !written;
        self.regs.status.remove(ack);
        self.regs.last_read.remove(ack);

        let writable = self.layout.status_writable(reg);
        self.regs.status = (self.regs.status - writable) | (written & writable);
    }

    fn write_fcr(&mut self, value: u16) {
        self.regs.fcr = value;
        let (rx_reset, tx_reset) = scif::fifo_resets(value);
        if rx_reset {
            self.regs.status.remove(StatusFlags::DATA_READY);
        }
        if tx_reset && self.tx_state() == TxState::Loaded {
            self.regs.status.insert(StatusFlags::TX_EMPTY);
        }
    }

    fn update_char_time(&mut self) {
        self.char_time_ns = timing::char_time_ns(self.regs.smr, self.regs.brr, self.input_freq);
        log::debug!(
            "{:?}: char time {} ns (smr {:#x}, brr {})",
            self.variant(),
            self.char_time_ns,
            self.regs.smr,
            self.regs.brr
        );
    }

    // ==================== 发送 ====================

    fn write_tdr(&mut self, byte: u8) {
        self.regs.tdr = byte;
        if self.regs.status.contains(StatusFlags::TX_END) {
            self.send_byte();
            // TDR 立即空出，固件可以装入下一个字节
            if self.control().contains(Control::TX_IRQ) {
                self.irq.pulse(IrqLine::Txi);
            }
        } else {
            self.regs.status.remove(StatusFlags::TX_EMPTY);
        }
    }

    /// TDR 移入移位寄存器并开始一个字符时间
    fn send_byte(&mut self) {
        let byte = self.regs.tdr;
        if self.transport.is_connected() && !self.transport.write_byte(byte) {
            log::trace!("{:?}: transport dropped {:#04x}", self.variant(), byte);
        }
        self.deadline = Some(self.clock.now_ns().saturating_add(self.char_time_ns));
        self.regs.status.remove(StatusFlags::TX_END);
        self.regs.status.insert(StatusFlags::TX_EMPTY);
        self.irq.set_level(IrqLine::Tei, false);
    }

    /// 发送定时器到期
    ///
    /// 关闭 TE 不会取消已经设置的定时器。
    pub fn timer_expired(&mut self) {
        self.deadline = None;
        if self.regs.status.contains(StatusFlags::TX_EMPTY) {
            self.regs.status.insert(StatusFlags::TX_END);
        } else {
            self.send_byte();
        }
        if self.control().contains(Control::TX_IRQ) {
            self.irq.pulse(IrqLine::Txi);
        }
        self.update_irq();
    }

    // ==================== 接收 ====================

    /// 接收使能且距上个字符已满一个字符时间
    pub fn can_receive(&self) -> bool {
        self.control().contains(Control::RX_ENABLE) && self.clock.now_ns() >= self.rx_next_ns
    }

    /// 传输端送达数据
    ///
    /// 一次送达多个字节视为溢出，整批丢弃。
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), ReceiveError> {
        if !self.control().contains(Control::RX_ENABLE) {
            return Err(ReceiveError::Disabled);
        }
        let now = self.clock.now_ns();
        if now < self.rx_next_ns {
            return Err(ReceiveError::Busy {
                until_ns: self.rx_next_ns,
            });
        }
        let Some(&byte) = bytes.first() else {
            return Ok(());
        };

        self.rx_next_ns = now.saturating_add(self.char_time_ns);
        if self.regs.status.contains(StatusFlags::DATA_READY) || bytes.len() > 1 {
            log::debug!(
                "{:?}: overrun, {} byte(s) discarded",
                self.variant(),
                bytes.len()
            );
            self.regs.status.insert(StatusFlags::OVERRUN_ERROR);
        } else {
            self.regs.rdr = byte;
            self.regs.status.insert(StatusFlags::DATA_READY);
            if self.control().contains(Control::RX_IRQ) {
                self.irq.pulse(IrqLine::Rxi);
            }
        }
        self.update_irq();
        Ok(())
    }

    /// 传输端报告 break
    pub fn line_break(&mut self) {
        log::debug!("{:?}: break", self.variant());
        self.regs.status.insert(self.layout.break_flags());
        self.update_irq();
    }

    // ==================== 中断 ====================

    fn update_irq(&mut self) {
        let ctl = self.control();
        let status = self.regs.status;

        self.irq.set_level(
            IrqLine::Eri,
            status.has_error() && ctl.contains(Control::ERROR_IRQ),
        );
        self.irq.set_level(
            IrqLine::Tei,
            status.contains(StatusFlags::TX_END) && ctl.contains(Control::TX_END_IRQ),
        );
    }

    // ==================== 快照 ====================

    pub(crate) fn regs(&self) -> &RegFile {
        &self.regs
    }

    pub(crate) fn load(
        &mut self,
        regs: RegFile,
        char_time_ns: u64,
        rx_next_ns: u64,
        deadline: Option<u64>,
    ) {
        self.regs = regs;
        self.char_time_ns = char_time_ns;
        self.rx_next_ns = rx_next_ns;
        self.deadline = deadline;
        self.update_irq();
    }
}

impl Expire for Sci {
    fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    fn expire(&mut self) {
        self.timer_expired();
    }
}

impl core::fmt::Debug for Sci {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sci")
            .field("variant", &self.variant())
            .field("regs", &self.regs)
            .field("char_time_ns", &self.char_time_ns)
            .field("rx_next_ns", &self.rx_next_ns)
            .field("deadline", &self.deadline)
            .field("irq", &self.irq)
            .finish_non_exhaustive()
    }
}
