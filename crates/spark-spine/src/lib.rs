#![cfg_attr(not(feature = "std"), no_std)]

//! `spark-spine` 提供分块追加、零搬移增长、可递归拆分遍历的脊柱缓冲（Spined Buffer）。
//!
//! # 模块定位（Why）
//! - 流水线上游逐个产出元素且事先不知道总数，下游需要按原顺序遍历、随机访问、整体导出，
//!   并把结果切成互不重叠的子区间交给分治/并行消费者；
//! - 增长期间从不复制或搬移已写元素：新容量以新分块的形式追加到脊柱上。
//!
//! # 设计概要（How）
//! - `chunk`：分块存储契约 [`ChunkStorage`]，以及通用的 [`VecChunk`] 与字节专用的 [`ByteChunk`]；
//! - `growth`：分块容量的几何增长策略 [`GrowthPolicy`]；
//! - `spine`：分块竞技场与前缀计数表，负责下标到 `(分块, 偏移)` 的映射；
//! - `buffer`：对外的追加/随机访问/导出接口 [`SpinedBuffer`]；
//! - `cursor`：可拆分的区间游标 [`SpineCursor`]；`observe` 提供带 `tracing` 事件的包装。
//!
//! # 并发约定（What）
//! - 组件内部不加锁：写阶段只有一个生产者，借用规则保证游标存活期间缓冲不可变；
//! - 拆分得到的游标只持有自身位置与对冻结分块表的只读引用，可以安全地交给不同线程。

extern crate alloc;

mod buffer;
pub mod chunk;
pub mod config;
mod cursor;
pub mod error;
pub mod growth;
pub mod observe;
mod spine;

pub use buffer::SpinedBuffer;
pub use chunk::{ByteChunk, ChunkStorage, VecChunk};
pub use config::SpineConfig;
pub use cursor::SpineCursor;
pub use error::{Result, SpineError};
pub use growth::GrowthPolicy;
pub use observe::MonitoredCursor;

/// `i32` 元素的脊柱缓冲，元素内联存放。
pub type IntBuffer = SpinedBuffer<i32>;

/// `i64` 元素的脊柱缓冲。
pub type LongBuffer = SpinedBuffer<i64>;

/// `f64` 元素的脊柱缓冲。
pub type DoubleBuffer = SpinedBuffer<f64>;

/// 以 `bytes::BytesMut` 分块存放的字节脊柱缓冲。
pub type ByteBuffer = SpinedBuffer<u8, ByteChunk>;
