//! 字符时间模型
//!
//! 一个字符在线路上的持续时间由帧格式（SMR）、波特率分频（BRR）和
//! 输入时钟共同决定：
//!
//! ```text
//! bits   = data + parity + stop + 1 (start)
//! cycles = bits * 32 * BRR * 4^CKS
//! ns     = cycles * 1e9 / input_freq
//! ```

use crate::regs::{Mode, SMR};

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// 数据位配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataBits {
    Seven = 7,
    Eight = 8,
}

/// 停止位配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopBits {
    One = 1,
    Two = 2,
}

/// 奇偶校验配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// SMR 描述的帧格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharFormat {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl CharFormat {
    pub fn from_mode(mode: u16) -> Self {
        let mode = Mode::new(mode);

        let data_bits = if mode.is_set(SMR::CHR) {
            DataBits::Seven
        } else {
            DataBits::Eight
        };
        let parity = match (mode.is_set(SMR::PE), mode.is_set(SMR::PM)) {
            (false, _) => Parity::None,
            (true, false) => Parity::Even,
            (true, true) => Parity::Odd,
        };
        let stop_bits = if mode.is_set(SMR::STOP) {
            StopBits::Two
        } else {
            StopBits::One
        };

        Self {
            data_bits,
            parity,
            stop_bits,
        }
    }

    /// 包含起始位在内的每字符位数
    pub fn bits_per_char(&self) -> u64 {
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        self.data_bits as u64 + parity + self.stop_bits as u64 + 1
    }
}

/// SMR.CKS 选择的时钟预分频：`4^CKS`
pub fn clock_prescaler(mode: u16) -> u64 {
    1 << (2 * Mode::new(mode).read(SMR::CKS))
}

/// 计算一个字符的传输时间（纳秒）
///
/// `input_freq_hz` 由构造时校验，不为 0。BRR 为 0 时结果为 0，
/// 即不限制接收节奏。
pub fn char_time_ns(mode: u16, bit_rate: u8, input_freq_hz: u64) -> u64 {
    let bits = CharFormat::from_mode(mode).bits_per_char();
    let cycles = bits * 32 * u64::from(bit_rate) * clock_prescaler(mode);
    cycles.saturating_mul(NANOS_PER_SEC) / input_freq_hz.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCLK: u64 = 64_000_000;

    #[test]
    fn eight_n_one_at_64mhz_is_5us() {
        assert_eq!(char_time_ns(0, 1, PCLK), 5000);
    }

    #[test]
    fn frame_format_decoding() {
        // CHR | PE | PM | STOP
        let fmt = CharFormat::from_mode(0x40 | 0x20 | 0x10 | 0x08);
        assert_eq!(fmt.data_bits, DataBits::Seven);
        assert_eq!(fmt.parity, Parity::Odd);
        assert_eq!(fmt.stop_bits, StopBits::Two);
        assert_eq!(fmt.bits_per_char(), 11);
        assert_eq!(CharFormat::from_mode(0).bits_per_char(), 10);
    }

    #[test]
    fn prescaler_is_power_of_four() {
        assert_eq!(clock_prescaler(0), 1);
        assert_eq!(clock_prescaler(1), 4);
        assert_eq!(clock_prescaler(2), 16);
        assert_eq!(clock_prescaler(3), 64);
        assert_eq!(char_time_ns(3, 1, PCLK), 5000 * 64);
    }

    #[test]
    fn positive_and_monotonic() {
        let modes = [0u16, 0x08, 0x20, 0x28, 0x40, 0x48, 0x60, 0x68];
        for cks in 0..4u16 {
            let mut by_bits: std::vec::Vec<(u64, u64)> = modes
                .iter()
                .map(|m| {
                    let m = m | cks;
                    (
                        CharFormat::from_mode(m).bits_per_char(),
                        char_time_ns(m, 10, PCLK),
                    )
                })
                .collect();
            by_bits.sort();
            for pair in by_bits.windows(2) {
                assert!(pair[0].1 <= pair[1].1);
            }

            for mode in modes {
                let mut last = 0;
                for brr in 1..=u8::MAX {
                    let t = char_time_ns(mode | cks, brr, PCLK);
                    assert!(t > 0);
                    assert!(t >= last);
                    last = t;
                }
            }
        }
    }
}
