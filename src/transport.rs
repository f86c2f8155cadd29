//! 字节流传输端
//!
//! 控制器只向传输端写字节，没有反压：传输端拒收时字节直接丢弃。
//! 接收方向由传输端调用 [`Sci::can_receive`]、[`Sci::receive`] 与
//! [`Sci::line_break`]。
//!
//! [`Sci::can_receive`]: crate::Sci::can_receive
//! [`Sci::receive`]: crate::Sci::receive
//! [`Sci::line_break`]: crate::Sci::line_break

use alloc::rc::Rc;
use core::cell::RefCell;

pub trait Transport {
    /// 发送一个字节，返回 `false` 表示字节被丢弃
    fn write_byte(&mut self, byte: u8) -> bool;

    fn is_connected(&self) -> bool {
        true
    }
}

/// 未连接的传输端
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn write_byte(&mut self, _byte: u8) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// 把发送的字节记录到固定容量缓冲区，满后丢弃
///
/// 克隆出的句柄共享同一缓冲区，可在控制器持有传输端后继续读取。
#[derive(Debug, Default, Clone)]
pub struct CaptureTransport<const N: usize> {
    buf: Rc<RefCell<heapless::Vec<u8, N>>>,
}

impl<const N: usize> CaptureTransport<N> {
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(heapless::Vec::new())),
        }
    }

    pub fn bytes(&self) -> heapless::Vec<u8, N> {
        self.buf.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl<const N: usize> Transport for CaptureTransport<N> {
    fn write_byte(&mut self, byte: u8) -> bool {
        self.buf.borrow_mut().push(byte).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_drops_when_full() {
        let cap = CaptureTransport::<2>::new();
        let mut tx = cap.clone();
        assert!(tx.write_byte(b'a'));
        assert!(tx.write_byte(b'b'));
        assert!(!tx.write_byte(b'c'));
        assert_eq!(cap.bytes().as_slice(), b"ab");
    }

    #[test]
    fn null_is_disconnected() {
        let mut tx = NullTransport;
        assert!(!tx.is_connected());
        assert!(!tx.write_byte(0));
    }
}
