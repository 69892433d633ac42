//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义脊柱缓冲对外暴露的全部错误语义：越界访问、容量溢出、内部不变式破坏与配置非法；
//! - 结构本身不做 I/O，不存在瞬时失败，因此所有错误都在出错调用点同步返回，不做内部重试。
//!
//! ## 设计要求（What）
//! - `SpineError` 派生 `thiserror::Error`，并满足 `Clone + Eq + Send + Sync + 'static`；
//! - 每个变体对应 [`codes`] 中的稳定错误码，遵循 `<领域>.<语义>` 命名约定，便于日志检索。

use alloc::string::String;

use thiserror::Error;

/// 脊柱缓冲的稳定错误码集合。
///
/// 错误码与 [`SpineError::code`] 一一对应，调用方可据此做告警聚合，而不必匹配人类可读消息。
pub mod codes {
    /// `get` 访问的下标不在 `[0, count)` 内。
    pub const OUT_OF_RANGE: &str = "spine.out_of_range";
    /// 导出目标容量不足，或元素总数无法表示为一次分配。
    pub const CAPACITY_OVERFLOW: &str = "spine.capacity_overflow";
    /// 前缀计数表与分块容量不一致。
    pub const INVARIANT_VIOLATION: &str = "spine.invariant_violation";
    /// 配置项非法。
    pub const INVALID_CONFIG: &str = "spine.invalid_config";
}

/// 脊柱缓冲错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：为随机访问、批量导出与配置校验提供统一的失败表示，便于调用方直接 `?` 传播。
/// - **契约 (What)**：
///   - 所有变体携带足以复现问题的数值上下文（下标、长度、所需容量等）；
///   - `InvariantViolation` 在正确实现中不应出现，仅作为防御性故障上报。
/// - **设计权衡 (Trade-offs)**：`detail` 使用 `String` 保存，牺牲少量分配换取可读性；
///   热路径（`get`、`copy_into`）上的变体只携带整数，不产生堆分配。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SpineError {
    /// 随机访问越界。
    ///
    /// - `index`：请求的逻辑下标；
    /// - `len`：调用时缓冲中的元素总数。
    #[error("index {index} out of range for spined buffer of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// 目标容量不足或总量不可表示。
    ///
    /// - `required`：完成操作所需的槽位数（溢出 `usize` 时为 `usize::MAX`）；
    /// - `available`：目标实际可用的槽位数。
    #[error("capacity overflow: {required} slots required but only {available} available")]
    CapacityOverflow { required: usize, available: usize },

    /// 内部簿记失去一致性。
    #[error("spine invariant violated: {detail}")]
    InvariantViolation { detail: String },

    /// `SpineConfig` 校验失败。
    ///
    /// - `field`：出错的配置字段名；
    /// - `detail`：拒绝原因。
    #[error("invalid spine config `{field}`: {detail}")]
    InvalidConfig { field: &'static str, detail: String },
}

impl SpineError {
    /// 返回与变体一一对应的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            SpineError::OutOfRange { .. } => codes::OUT_OF_RANGE,
            SpineError::CapacityOverflow { .. } => codes::CAPACITY_OVERFLOW,
            SpineError::InvariantViolation { .. } => codes::INVARIANT_VIOLATION,
            SpineError::InvalidConfig { .. } => codes::INVALID_CONFIG,
        }
    }

    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        SpineError::InvariantViolation {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_config(field: &'static str, detail: impl Into<String>) -> Self {
        SpineError::InvalidConfig {
            field,
            detail: detail.into(),
        }
    }
}

/// 本 crate 的统一结果别名。
pub type Result<T, E = SpineError> = core::result::Result<T, E>;
