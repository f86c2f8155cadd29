use crate::{ConfigError, Variant};

/// 控制器构造参数
///
/// ```
/// use renesas_sci::{Config, Variant};
///
/// let config = Config::new(Variant::Scif).input_freq(65_000_000);
/// assert_eq!(config.validate(), Ok(65_000_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub variant: Variant,
    /// 外设输入时钟（Hz），必须设置
    pub input_freq: Option<u64>,
}

impl Config {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            input_freq: None,
        }
    }

    pub fn input_freq(mut self, hz: u64) -> Self {
        self.input_freq = Some(hz);
        self
    }

    /// 返回有效的输入时钟频率
    pub fn validate(&self) -> Result<u64, ConfigError> {
        match self.input_freq {
            Some(hz) if hz > 0 => Ok(hz),
            _ => Err(ConfigError::MissingInputFrequency),
        }
    }
}
