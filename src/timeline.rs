//! 虚拟时间与定时事件队列
//!
//! 所有寄存器访问、定时器到期和传输端回调都在同一条虚拟时间线上串行执行。
//! [`Timeline`] 按到期时间排序，依次推进时钟并触发到期的控制器。

use alloc::{collections::BinaryHeap, rc::Rc, vec::Vec};
use core::{cell::Cell, cmp::Reverse};

/// 共享的虚拟时钟（纳秒）
#[derive(Debug, Default, Clone)]
pub struct VirtualClock(Rc<Cell<u64>>);

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    pub fn set_ns(&self, ns: u64) {
        self.0.set(ns);
    }

    pub fn advance_ns(&self, delta: u64) {
        self.0.set(self.0.get().saturating_add(delta));
    }
}

/// 持有单个一次性定时器的设备
pub trait Expire {
    /// 当前挂起的到期时间
    fn deadline(&self) -> Option<u64>;

    /// 到期回调，调用前时钟已推进到到期时间
    fn expire(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    deadline: u64,
    seq: u64,
    slot: usize,
}

/// 按到期时间排序的事件队列
///
/// 设备重新设置定时器时，旧条目不会从堆中删除，而是在出队时与设备当前的
/// 到期时间比对后丢弃。
#[derive(Debug, Default)]
pub struct Timeline {
    clock: VirtualClock,
    queue: BinaryHeap<Reverse<Entry>>,
    armed: Vec<Option<u64>>,
    seq: u64,
}

impl Timeline {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            ..Default::default()
        }
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    /// 下一个到期时间（可能是已失效的条目）
    pub fn peek_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.deadline)
    }

    /// 记录设备当前的到期时间
    pub fn sync<T: Expire>(&mut self, slot: usize, target: &T) {
        if self.armed.len() <= slot {
            self.armed.resize(slot + 1, None);
        }
        let deadline = target.deadline();
        if self.armed[slot] == deadline {
            return;
        }
        self.armed[slot] = deadline;
        if let Some(deadline) = deadline {
            self.seq += 1;
            self.queue.push(Reverse(Entry {
                deadline,
                seq: self.seq,
                slot,
            }));
        }
    }

    /// 推进虚拟时间到 `until_ns`，按时间顺序触发期间到期的设备
    ///
    /// 返回触发次数。
    pub fn run_until<T: Expire>(&mut self, targets: &mut [T], until_ns: u64) -> usize {
        for (slot, target) in targets.iter().enumerate() {
            self.sync(slot, target);
        }

        let mut fired = 0;
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.deadline > until_ns {
                break;
            }
            self.queue.pop();

            let Some(target) = targets.get_mut(entry.slot) else {
                continue;
            };
            if self.armed[entry.slot] != Some(entry.deadline)
                || target.deadline() != Some(entry.deadline)
            {
                continue;
            }

            if entry.deadline > self.clock.now_ns() {
                self.clock.set_ns(entry.deadline);
            }
            self.armed[entry.slot] = None;
            target.expire();
            fired += 1;
            self.sync(entry.slot, &*target);
        }

        if until_ns > self.clock.now_ns() {
            self.clock.set_ns(until_ns);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    struct OneShot {
        clock: VirtualClock,
        deadline: Option<u64>,
        fired_at: Vec<u64>,
        rearm: Option<u64>,
    }

    impl OneShot {
        fn new(clock: &VirtualClock, deadline: Option<u64>) -> Self {
            Self {
                clock: clock.clone(),
                deadline,
                fired_at: Vec::new(),
                rearm: None,
            }
        }
    }

    impl Expire for OneShot {
        fn deadline(&self) -> Option<u64> {
            self.deadline
        }

        fn expire(&mut self) {
            let now = self.clock.now_ns();
            self.fired_at.push(now);
            self.deadline = self.rearm.take().map(|d| now + d);
        }
    }

    #[test]
    fn fires_in_time_order() {
        let clock = VirtualClock::new();
        let mut tl = Timeline::new(clock.clone());
        let mut devs = vec![
            OneShot::new(&clock, Some(300)),
            OneShot::new(&clock, Some(100)),
            OneShot::new(&clock, None),
        ];

        assert_eq!(tl.run_until(&mut devs, 200), 1);
        assert_eq!(devs[1].fired_at, [100]);
        assert!(devs[0].fired_at.is_empty());
        assert_eq!(clock.now_ns(), 200);

        assert_eq!(tl.run_until(&mut devs, 1000), 1);
        assert_eq!(devs[0].fired_at, [300]);
        assert!(devs[2].fired_at.is_empty());
        assert_eq!(clock.now_ns(), 1000);
    }

    #[test]
    fn rearm_supersedes_previous_deadline() {
        let clock = VirtualClock::new();
        let mut tl = Timeline::new(clock.clone());
        let mut devs = vec![OneShot::new(&clock, Some(100))];
        tl.sync(0, &devs[0]);

        devs[0].deadline = Some(500);
        assert_eq!(tl.run_until(&mut devs, 1000), 1);
        assert_eq!(devs[0].fired_at, [500]);
    }

    #[test]
    fn expire_may_rearm() {
        let clock = VirtualClock::new();
        let mut tl = Timeline::new(clock.clone());
        let mut devs = vec![OneShot::new(&clock, Some(10))];
        devs[0].rearm = Some(10);

        assert_eq!(tl.run_until(&mut devs, 100), 2);
        assert_eq!(devs[0].fired_at, [10, 20]);
    }
}
