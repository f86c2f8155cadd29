use crate::Variant;

/// 构造控制器时的配置错误
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// 未设置输入时钟频率，或频率为 0
    #[error("input-freq must be set to a non-zero value")]
    MissingInputFrequency,
}

/// 控制器当前无法接收，传输端应稍后重试
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    /// SCR.RE 未置位
    #[error("receiver is disabled")]
    Disabled,
    /// 距上一个字符不足一个字符时间
    #[error("receiver busy until {until_ns} ns")]
    Busy { until_ns: u64 },
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot taken from {found:?}, controller is {expected:?}")]
    VariantMismatch { expected: Variant, found: Variant },
}
