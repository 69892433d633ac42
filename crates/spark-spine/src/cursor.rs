use core::{fmt, iter::FusedIterator, marker::PhantomData};

use crate::{chunk::ChunkStorage, observe::MonitoredCursor};

/// `SpineCursor` 是覆盖脊柱上一段连续逻辑区间的有序、可拆分游标。
///
/// # 设计动机（Why）
/// - 外部分治/并行调度器需要把缓冲反复对半切开，再把叶子区间分发给独立线程；
/// - 游标是显式的值类型，只记录区间边界，拆分本身不依赖递归调用栈。
///
/// # 结构设计（How）
/// - 区间为半开区间 `[(chunk, offset), (last, end))`，通过借用的分块表与前缀计数表定位；
/// - `chunk < last` 时恒有 `offset < capacity(chunk)`：`next` 读完一块后立即滚动到下一块；
/// - 拆分策略：跨多块时在最后一块之前切开（O(1)，无逐元素计算）；
///   仅剩一块时在剩余偏移的算术中点切开，剩余不足 2 个元素时不再拆分。
///
/// # 契约说明（What）
/// - 状态机：未消费 → 部分消费 → 耗尽；耗尽后 `try_advance` 返回 `false`，`try_split` 返回 `None`；
/// - 拆分前后两段区间不相交、无缝衔接，按“返回的前段 + 自身的后段”顺序拼接即为原区间；
/// - 游标只修改自身位置，从不修改底层分块。分块存储 `Sync` 时游标为 `Send`，可移交给其它线程。
pub struct SpineCursor<'a, T, S> {
    chunks: &'a [S],
    prior: &'a [usize],
    chunk: usize,
    offset: usize,
    last: usize,
    end: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> SpineCursor<'a, T, S> {
    /// 覆盖 `chunks` 全部已写元素的游标；`chunks` 之前的分块必须已写满。
    pub(crate) fn new(chunks: &'a [S], prior: &'a [usize]) -> Self {
        let mut last = chunks.len().saturating_sub(1);
        let mut end = chunks.get(last).map_or(0, |chunk| chunk.len());
        // 末块为空时把终点收回到上一块末尾，保证 `chunk < last` 的区间非空。
        while last > 0 && end == 0 {
            last -= 1;
            end = chunks[last].len();
        }
        Self::range(chunks, prior, 0, 0, last, end)
    }

    fn range(
        chunks: &'a [S],
        prior: &'a [usize],
        chunk: usize,
        offset: usize,
        last: usize,
        end: usize,
    ) -> Self {
        Self {
            chunks,
            prior,
            chunk,
            offset,
            last,
            end,
            _marker: PhantomData,
        }
    }

    /// 剩余元素的精确数目，由前缀计数直接算出。
    pub fn estimate_size(&self) -> usize {
        if self.chunk == self.last {
            self.end.saturating_sub(self.offset)
        } else {
            self.prior[self.last] + self.end - self.prior[self.chunk] - self.offset
        }
    }

    /// 区间是否已经读尽。
    pub fn is_exhausted(&self) -> bool {
        self.chunk == self.last && self.offset >= self.end
    }

    /// 若仍有剩余，交付下一个元素并前进一个位置。
    pub fn try_advance<F: FnOnce(&'a T)>(&mut self, f: F) -> bool {
        match self.next() {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// 按顺序交付全部剩余元素，之后游标耗尽。
    pub fn for_each_remaining<F: FnMut(&'a T)>(&mut self, mut f: F) {
        self.for_each_remaining_slice(|slice| {
            for item in slice {
                f(item);
            }
        });
    }

    /// 以连续切片形式交付全部剩余元素（每块至多一段），之后游标耗尽。
    pub fn for_each_remaining_slice<F: FnMut(&'a [T])>(&mut self, mut f: F) {
        for slice in self.remaining_slices() {
            f(slice);
        }
        self.chunk = self.last;
        self.offset = self.end;
    }

    /// 将区间一分为二：返回覆盖前段的新游标，自身保留后段。
    ///
    /// - 跨多块：前段为 `[起点, 倒数第二块末尾)`，自身移到最后一块起点；
    /// - 单块：前段取剩余元素的前 `remaining / 2` 个；
    /// - 剩余不足 2 个元素或已耗尽时返回 `None`，游标仍可继续读取。
    pub fn try_split(&mut self) -> Option<Self> {
        if self.chunk < self.last {
            let penultimate = self.last - 1;
            let prefix = Self::range(
                self.chunks,
                self.prior,
                self.chunk,
                self.offset,
                penultimate,
                self.chunks[penultimate].capacity(),
            );
            self.chunk = self.last;
            self.offset = 0;
            return Some(prefix);
        }
        let half = self.end.saturating_sub(self.offset) / 2;
        if half == 0 {
            return None;
        }
        let prefix = Self::range(
            self.chunks,
            self.prior,
            self.chunk,
            self.offset,
            self.chunk,
            self.offset + half,
        );
        self.offset += half;
        Some(prefix)
    }

    /// 包装为在首次遍历时输出 `tracing` 事件的游标。
    pub fn monitored(self) -> MonitoredCursor<'a, T, S> {
        MonitoredCursor::new(self)
    }

    fn remaining_slices(&self) -> impl Iterator<Item = &'a [T]> + use<'a, T, S> {
        let chunks = self.chunks;
        let (first, start, last, end) = (self.chunk, self.offset, self.last, self.end);
        (first..=last)
            .map(move |index| {
                let filled = chunks[index].filled();
                let lo = if index == first { start } else { 0 };
                let hi = if index == last { end } else { filled.len() };
                &filled[lo.min(hi)..hi]
            })
            .filter(|slice| !slice.is_empty())
    }
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> Iterator for SpineCursor<'a, T, S> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.is_exhausted() {
            return None;
        }
        let chunk = &self.chunks[self.chunk];
        let item = &chunk.filled()[self.offset];
        self.offset += 1;
        if self.chunk < self.last && self.offset == chunk.capacity() {
            self.chunk += 1;
            self.offset = 0;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.estimate_size();
        (remaining, Some(remaining))
    }

    fn fold<B, F>(self, init: B, mut f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        self.remaining_slices()
            .fold(init, |acc, slice| slice.iter().fold(acc, &mut f))
    }
}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> ExactSizeIterator for SpineCursor<'a, T, S> {}

impl<'a, T: 'a, S: ChunkStorage<Item = T>> FusedIterator for SpineCursor<'a, T, S> {}

impl<T, S> Clone for SpineCursor<'_, T, S> {
    fn clone(&self) -> Self {
        Self {
            chunks: self.chunks,
            prior: self.prior,
            chunk: self.chunk,
            offset: self.offset,
            last: self.last,
            end: self.end,
            _marker: PhantomData,
        }
    }
}

impl<T, S> fmt::Debug for SpineCursor<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpineCursor")
            .field("chunk", &self.chunk)
            .field("offset", &self.offset)
            .field("last", &self.last)
            .field("end", &self.end)
            .finish()
    }
}
