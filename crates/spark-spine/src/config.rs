//! 脊柱缓冲的构造配置。
//!
//! # 模块定位（Why）
//! - 宿主流水线通常在自身配置文件中声明“预期规模”，本模块提供可嵌入的配置片段；
//! - 启用 `serde` 特性后，`SpineConfig` 可直接从 TOML/JSON 片段反序列化，缺失字段回落到默认值。
//!
//! # 契约说明（What）
//! - `initial_capacity`：第 0 块的期望容量，向上取整为 2 的幂且不小于 16；必须大于 0；
//! - `max_chunk_power`：单块容量上限的幂次，取值范围 `[4, usize::BITS - 1)`；
//!   `initial_capacity` 超过上限时按上限截断。
//!
//! # 测试提示（Gotchas）
//! - TOML 反序列化用例受 `serde` 特性门控，默认 `cargo test` 不会执行；
//!   需运行 `cargo test -p spark-spine --features serde` 覆盖该路径。

use alloc::format;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SpineError},
    growth::{MAX_CHUNK_POWER, MIN_CHUNK_POWER, MIN_CHUNK_SIZE},
};

/// 构造 [`SpinedBuffer`](crate::SpinedBuffer) 的配置。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SpineConfig {
    /// 第 0 块的期望容量。
    pub initial_capacity: usize,
    /// 单块容量上限的幂次。
    pub max_chunk_power: u32,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            initial_capacity: MIN_CHUNK_SIZE,
            max_chunk_power: MAX_CHUNK_POWER,
        }
    }
}

impl SpineConfig {
    /// 等价于 [`SpineConfig::default`]。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置第 0 块的期望容量。
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// 设置单块容量上限的幂次。
    pub fn with_max_chunk_power(mut self, max_chunk_power: u32) -> Self {
        self.max_chunk_power = max_chunk_power;
        self
    }

    /// 校验配置；失败时返回 [`SpineError::InvalidConfig`]。
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(SpineError::invalid_config(
                "initial_capacity",
                "must be greater than zero",
            ));
        }
        if self.max_chunk_power < MIN_CHUNK_POWER {
            return Err(SpineError::invalid_config(
                "max_chunk_power",
                format!(
                    "{} is below the minimum chunk power {MIN_CHUNK_POWER}",
                    self.max_chunk_power
                ),
            ));
        }
        let limit = usize::BITS - 1;
        if self.max_chunk_power >= limit {
            return Err(SpineError::invalid_config(
                "max_chunk_power",
                format!("{} must be below {limit}", self.max_chunk_power),
            ));
        }
        Ok(())
    }
}
