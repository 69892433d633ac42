//! 分块增长策略。
//!
//! # 设计概要（How）
//! - 第 0 块与第 1 块容量均为 `2^initial_power`，之后每块容量翻倍，直到 `2^max_power` 封顶；
//! - 因此在封顶之前，第 `i ≥ 1` 块的容量恰好等于其之前所有块的容量之和，
//!   “在最后一块之前拆分”在最后一块写满时即为 50:50 拆分。

use crate::{
    config::SpineConfig,
    error::{Result, SpineError},
};

/// 最小分块幂次，对应最小分块容量 16。
pub const MIN_CHUNK_POWER: u32 = 4;

/// 最小分块容量。
pub const MIN_CHUNK_SIZE: usize = 1 << MIN_CHUNK_POWER;

/// 默认的分块容量上限幂次（`2^30`）。
pub const MAX_CHUNK_POWER: u32 = 30;

/// 脊柱簿记表首次膨胀时预留的条目数。
pub const MIN_SPINE_SIZE: usize = 8;

/// `GrowthPolicy` 决定下一块的容量。
///
/// # 契约说明（What）
/// - `chunk_capacity(i)` 恒为正，且对 `i` 单调不减；
/// - `initial_power <= max_power < usize::BITS - 1`，由构造路径保证。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct GrowthPolicy {
    initial_power: u32,
    max_power: u32,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            initial_power: MIN_CHUNK_POWER,
            max_power: MAX_CHUNK_POWER,
        }
    }
}

impl GrowthPolicy {
    /// 以期望的初始容量构造策略，上限使用 [`MAX_CHUNK_POWER`]。
    ///
    /// 初始容量会向上取整到 2 的幂，且不小于 [`MIN_CHUNK_SIZE`]；`0` 视为默认值。
    pub fn with_initial_capacity(initial_capacity: usize) -> Self {
        Self::new(initial_capacity, MAX_CHUNK_POWER)
    }

    /// 从已校验的配置构造策略。
    pub fn from_config(config: &SpineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.initial_capacity, config.max_chunk_power))
    }

    fn new(initial_capacity: usize, max_power: u32) -> Self {
        let max_power = max_power.clamp(MIN_CHUNK_POWER, usize::BITS - 2);
        let initial_power = ceil_log2(initial_capacity)
            .max(MIN_CHUNK_POWER)
            .min(max_power);
        Self {
            initial_power,
            max_power,
        }
    }

    /// 第 0 块容量的幂次。
    pub fn initial_power(&self) -> u32 {
        self.initial_power
    }

    /// 单块容量上限的幂次。
    pub fn max_power(&self) -> u32 {
        self.max_power
    }

    /// 第 `chunk_index` 块容量的幂次。
    pub fn chunk_power(&self, chunk_index: usize) -> u32 {
        let extra = chunk_index.saturating_sub(1);
        let extra = u32::try_from(extra).unwrap_or(u32::MAX);
        self.initial_power
            .saturating_add(extra)
            .min(self.max_power)
    }

    /// 第 `chunk_index` 块的容量。
    pub fn chunk_capacity(&self, chunk_index: usize) -> usize {
        1usize << self.chunk_power(chunk_index)
    }

    /// 前 `chunk_count` 块的总容量；溢出 `usize` 时返回 `CapacityOverflow`。
    pub fn capacity_through(&self, chunk_count: usize) -> Result<usize> {
        let mut total: usize = 0;
        for index in 0..chunk_count {
            total = total
                .checked_add(self.chunk_capacity(index))
                .ok_or(SpineError::CapacityOverflow {
                    required: usize::MAX,
                    available: total,
                })?;
        }
        Ok(total)
    }
}

/// `ceil(log2(n))`，`n <= 1` 时为 0。
fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
