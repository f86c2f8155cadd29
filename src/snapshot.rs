//! 保存/恢复所需的完整状态
//!
//! 只定义内容，序列化由宿主负责。

use crate::{device::RegFile, Sci, SnapshotError, StatusFlags, Variant};

/// 控制器快照：全部寄存器加上派生的时序状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SciSnapshot {
    pub variant: Variant,
    pub smr: u16,
    pub brr: u8,
    pub scr: u16,
    pub tdr: u8,
    pub rdr: u8,
    pub status: StatusFlags,
    pub last_read_status: StatusFlags,
    pub scmr: u8,
    pub semr: u8,
    pub fcr: u16,
    pub sptr: u16,
    pub dl: u16,
    pub cks: u16,
    pub char_time_ns: u64,
    pub rx_next_ns: u64,
    /// 挂起的发送定时器
    pub deadline_ns: Option<u64>,
}

impl Sci {
    pub fn snapshot(&self) -> SciSnapshot {
        let r = self.regs();
        SciSnapshot {
            variant: self.variant(),
            smr: r.smr,
            brr: r.brr,
            scr: r.scr,
            tdr: r.tdr,
            rdr: r.rdr,
            status: r.status,
            last_read_status: r.last_read,
            scmr: r.scmr,
            semr: r.semr,
            fcr: r.fcr,
            sptr: r.sptr,
            dl: r.dl,
            cks: r.cks,
            char_time_ns: self.char_time_ns(),
            rx_next_ns: self.rx_next_ns(),
            deadline_ns: self.deadline(),
        }
    }

    /// 恢复快照，中断线电平按恢复后的状态重新推导
    ///
    /// 定时器到期时间原样恢复，调用方需要重新同步到 [`Timeline`]。
    ///
    /// [`Timeline`]: crate::Timeline
    pub fn restore(&mut self, snap: &SciSnapshot) -> Result<(), SnapshotError> {
        if snap.variant != self.variant() {
            return Err(SnapshotError::VariantMismatch {
                expected: self.variant(),
                found: snap.variant,
            });
        }

        let regs = RegFile {
            smr: snap.smr,
            brr: snap.brr,
            scr: snap.scr,
            tdr: snap.tdr,
            rdr: snap.rdr,
            status: snap.status,
            last_read: snap.last_read_status,
            scmr: snap.scmr,
            semr: snap.semr,
            fcr: snap.fcr,
            sptr: snap.sptr,
            dl: snap.dl,
            cks: snap.cks,
        };
        self.load(regs, snap.char_time_ns, snap.rx_next_ns, snap.deadline_ns);
        Ok(())
    }
}
