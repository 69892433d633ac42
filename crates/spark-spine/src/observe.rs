//! 带观测能力的游标包装。
//!
//! # 模块定位（Why）
//! - 并行调度器调参时，需要知道每个叶子游标实际从多大的区间开始遍历，以及拆分产生的两段规模；
//! - `MonitoredCursor` 透明转发全部操作，只在首次遍历与每次拆分时输出 `tracing` 事件，
//!   本 crate 从不安装订阅者，事件去向由宿主决定。

use core::iter::FusedIterator;

use tracing::{debug, trace};

use crate::{chunk::ChunkStorage, cursor::SpineCursor};

/// 在首次遍历时输出一次 `debug` 事件的 [`SpineCursor`] 包装。
///
/// - `try_split` 返回的前段同样被包装，且拥有独立的“是否已开始遍历”状态；
/// - 事件字段：`estimate_size` 为开始遍历时的剩余元素数。
#[derive(Clone, Debug)]
pub struct MonitoredCursor<'a, T, S> {
    inner: SpineCursor<'a, T, S>,
    iterating: bool,
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> MonitoredCursor<'a, T, S> {
    pub fn new(inner: SpineCursor<'a, T, S>) -> Self {
        Self {
            inner,
            iterating: false,
        }
    }

    fn mark_iterating(&mut self) {
        if !self.iterating {
            self.iterating = true;
            debug!(
                estimate_size = self.inner.estimate_size(),
                "cursor iteration started"
            );
        }
    }

    pub fn estimate_size(&self) -> usize {
        self.inner.estimate_size()
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    pub fn try_advance<F: FnOnce(&'a T)>(&mut self, f: F) -> bool {
        self.mark_iterating();
        self.inner.try_advance(f)
    }

    pub fn for_each_remaining<F: FnMut(&'a T)>(&mut self, f: F) {
        self.mark_iterating();
        self.inner.for_each_remaining(f);
    }

    pub fn for_each_remaining_slice<F: FnMut(&'a [T])>(&mut self, f: F) {
        self.mark_iterating();
        self.inner.for_each_remaining_slice(f);
    }

    pub fn try_split(&mut self) -> Option<Self> {
        let prefix = self.inner.try_split()?;
        trace!(
            prefix = prefix.estimate_size(),
            suffix = self.inner.estimate_size(),
            "cursor split"
        );
        Some(Self::new(prefix))
    }

    /// 取回被包装的游标。
    pub fn into_inner(self) -> SpineCursor<'a, T, S> {
        self.inner
    }
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> Iterator for MonitoredCursor<'a, T, S> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.mark_iterating();
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> ExactSizeIterator for MonitoredCursor<'a, T, S> {}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> FusedIterator for MonitoredCursor<'a, T, S> {}
