use alloc::vec::Vec;
use core::{fmt, marker::PhantomData, mem};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::{
    chunk::{ByteChunk, ChunkStorage, VecChunk},
    config::SpineConfig,
    cursor::SpineCursor,
    error::{Result, SpineError},
    growth::GrowthPolicy,
    spine::Spine,
};

/// `SpinedBuffer` 是分块追加、零搬移增长的有序缓冲。
///
/// # 设计动机（Why）
/// - 上游流水线逐个产出元素且事先不知道总数；单一连续数组扩容时需要整体搬移，
///   而分块存储只需追加新块，已写元素永不复制；
/// - 读取阶段需要按插入顺序遍历、随机访问、整体导出，并能递归拆分为互不重叠的子区间，
///   交由外部的分治/并行调度器消费。
///
/// # 架构关系（How）
/// - `spine` 持有全部分块与前缀计数表，`current` 指向正在写入的分块；
/// - 写指针即 `chunks[current].len()`，元素总数为 `prior[current] + chunks[current].len()`；
/// - 分块容量由 [`GrowthPolicy`] 决定；存储形态由 [`ChunkStorage`] 决定，默认是 [`VecChunk`]。
///
/// # 契约说明（What）
/// - **写读分相**：`accept`/`clear` 需要 `&mut self`，`cursor` 借用 `&self`；
///   借用规则保证任何游标存活期间缓冲不会被修改；
/// - **顺序**：`get(i)`、遍历、导出均严格复现插入顺序；
/// - **稳定性**：已写元素在 `clear` 或缓冲销毁之前地址不变。
///
/// # 风险与取舍（Trade-offs）
/// - 元素可能分布在多块中，因此不提供整体的 `&[T]` 视图；需要连续数组时使用 [`to_vec`](Self::to_vec)。
#[derive(Clone)]
pub struct SpinedBuffer<T, S = VecChunk<T>> {
    spine: Spine<S>,
    current: usize,
    policy: GrowthPolicy,
    _marker: PhantomData<T>,
}

impl<T> SpinedBuffer<T> {
    /// 以默认策略（首块 16 个槽位）创建空缓冲。
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::default())
    }

    /// 以期望的首块容量创建空缓冲，容量向上取整为 2 的幂且不小于 16。
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_policy(GrowthPolicy::with_initial_capacity(initial_capacity))
    }
}

impl<T, S: ChunkStorage<Item = T>> Default for SpinedBuffer<T, S> {
    fn default() -> Self {
        Self::with_policy(GrowthPolicy::default())
    }
}

impl<T, S: ChunkStorage<Item = T>> SpinedBuffer<T, S> {
    /// 以给定增长策略创建空缓冲。
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self {
            spine: Spine::new(S::allocate(policy.chunk_capacity(0))),
            current: 0,
            policy,
            _marker: PhantomData,
        }
    }

    /// 以配置创建空缓冲；配置非法时返回 [`SpineError::InvalidConfig`]。
    pub fn with_config(config: SpineConfig) -> Result<Self> {
        Ok(Self::with_policy(GrowthPolicy::from_config(&config)?))
    }

    /// 当前使用的增长策略。
    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// 追加一个元素。
    ///
    /// 均摊 O(1)，不复制任何已写元素。当前分块写满时切换到下一块，必要时按增长策略分配新块。
    ///
    /// # Panics
    /// 元素总数超出 `usize` 表示范围时 panic，与 `Vec::push` 的容量溢出语义一致。
    #[inline]
    pub fn accept(&mut self, item: T) {
        let item = match self.spine.chunk_mut(self.current).try_push(item) {
            Ok(()) => return,
            Err(item) => item,
        };
        self.advance_chunk();
        if self.spine.chunk_mut(self.current).try_push(item).is_err() {
            unreachable!("新切换的分块必然为空且容量为正");
        }
    }

    #[cold]
    fn advance_chunk(&mut self) {
        self.spine.inflate();
        let next = self.current + 1;
        if next >= self.spine.chunk_count() {
            let capacity = self.policy.chunk_capacity(next);
            if let Err(err) = self.spine.push_chunk(S::allocate(capacity)) {
                panic!("spined buffer capacity overflow: {err}");
            }
        }
        self.current = next;
    }

    /// 已追加的元素总数，O(1)。
    pub fn count(&self) -> usize {
        self.spine.prior(self.current) + self.spine.chunk(self.current).len()
    }

    /// 等同于 [`count`](Self::count)。
    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 全部已分配分块的槽位总数，包含 [`ensure_capacity`](Self::ensure_capacity) 预分配的分块。
    pub fn capacity(&self) -> usize {
        self.spine.total_capacity()
    }

    /// 正在使用的分块数（含当前写入块）。
    pub fn chunk_count(&self) -> usize {
        self.current + 1
    }

    /// 预先分配分块，直到 `capacity() >= target_len`；不改变 `count()`。
    ///
    /// 槽位总数溢出 `usize` 时返回 [`SpineError::CapacityOverflow`]，已分配的分块保留。
    pub fn ensure_capacity(&mut self, target_len: usize) -> Result<()> {
        if target_len <= self.capacity() {
            return Ok(());
        }
        self.spine.inflate();
        while self.spine.total_capacity() < target_len {
            let capacity = self.policy.chunk_capacity(self.spine.chunk_count());
            self.spine.push_chunk(S::allocate(capacity))?;
        }
        Ok(())
    }

    /// 随机访问第 `index` 个元素。
    ///
    /// `index >= count()` 时返回 [`SpineError::OutOfRange`]。
    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.count();
        if index >= len {
            return Err(SpineError::OutOfRange { index, len });
        }
        let (chunk, offset) = if self.current == 0 {
            (0, index)
        } else {
            self.spine.locate(index, self.current)?
        };
        self.spine
            .chunk(chunk)
            .filled()
            .get(offset)
            .ok_or_else(|| SpineError::invariant("located slot is not filled"))
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0).ok()
    }

    pub fn last(&self) -> Option<&T> {
        self.count().checked_sub(1).and_then(|index| self.get(index).ok())
    }

    /// 按顺序返回每个在用分块的已写切片。
    pub fn chunks(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.spine.chunks()[..=self.current]
            .iter()
            .map(|chunk| chunk.filled())
    }

    /// 按插入顺序访问全部元素。
    pub fn for_each<F: FnMut(&T)>(&self, mut f: F) {
        for slice in self.chunks() {
            for item in slice {
                f(item);
            }
        }
    }

    /// 覆盖 `[0, count())` 的拆分游标，是读取阶段的入口。
    pub fn cursor(&self) -> SpineCursor<'_, T, S> {
        let in_use = self.current + 1;
        SpineCursor::new(
            &self.spine.chunks()[..in_use],
            &self.spine.prior_counts()[..in_use],
        )
    }

    /// 等同于 [`cursor`](Self::cursor)，便于 `for` 循环与迭代器适配器使用。
    pub fn iter(&self) -> SpineCursor<'_, T, S> {
        self.cursor()
    }

    /// 复位为初始的单块空状态：丢弃其余分块，保留第 0 块的分配以便复用。
    pub fn clear(&mut self) {
        let discarded = self.spine.truncate_to_first();
        self.current = 0;
        if discarded > 0 {
            debug!(discarded, "spined buffer cleared");
        }
    }

    /// 校验前缀计数与分块状态的一致性；正确实现下恒为 `Ok`。
    pub fn check_invariants(&self) -> Result<()> {
        self.spine.check(self.current)
    }

    /// 导出为 `Vec` 之前确认元素总数可以表示为一次分配。
    fn check_allocation(&self, len: usize) -> Result<()> {
        let size = mem::size_of::<T>();
        if size == 0 {
            return Ok(());
        }
        let limit = isize::MAX as usize / size;
        if len > limit {
            return Err(SpineError::CapacityOverflow {
                required: len,
                available: limit,
            });
        }
        Ok(())
    }
}

impl<T: Clone, S: ChunkStorage<Item = T>> SpinedBuffer<T, S> {
    /// 将全部元素按顺序复制到 `dest[offset..offset + count()]`。
    ///
    /// `offset + count()` 超出 `dest.len()` 或溢出 `usize` 时返回 [`SpineError::CapacityOverflow`]，
    /// 此时 `dest` 保持不变。
    pub fn copy_into(&self, dest: &mut [T], offset: usize) -> Result<()> {
        let len = self.count();
        let available = dest.len();
        let end = offset
            .checked_add(len)
            .ok_or(SpineError::CapacityOverflow {
                required: usize::MAX,
                available,
            })?;
        if end > available {
            return Err(SpineError::CapacityOverflow {
                required: end,
                available,
            });
        }
        let mut at = offset;
        for slice in self.chunks() {
            dest[at..at + slice.len()].clone_from_slice(slice);
            at += slice.len();
        }
        Ok(())
    }

    /// 通过工厂分配长度为 `count()` 的目标数组并复制全部元素。
    ///
    /// 工厂返回的目标短于 `count()` 时返回 [`SpineError::CapacityOverflow`]；
    /// 更长时多余部分保持工厂写入的初值。
    pub fn to_array_with<A, F>(&self, factory: F) -> Result<A>
    where
        A: AsMut<[T]>,
        F: FnOnce(usize) -> A,
    {
        let len = self.count();
        self.check_allocation(len)?;
        let mut array = factory(len);
        self.copy_into(array.as_mut(), 0)?;
        Ok(array)
    }

    /// 导出为长度恰为 `count()` 的 `Vec`。
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let len = self.count();
        self.check_allocation(len)?;
        let mut out = Vec::with_capacity(len);
        for slice in self.chunks() {
            out.extend_from_slice(slice);
        }
        Ok(out)
    }
}

impl SpinedBuffer<u8, ByteChunk> {
    /// 将全部字节导出为连续的 `Bytes`。
    pub fn to_bytes(&self) -> Bytes {
        if self.current == 0 {
            return self.spine.chunk(0).to_bytes();
        }
        let mut out = BytesMut::with_capacity(self.count());
        for slice in self.chunks() {
            out.extend_from_slice(slice);
        }
        out.freeze()
    }
}

impl<T, S: ChunkStorage<Item = T>> Extend<T> for SpinedBuffer<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.accept(item);
        }
    }
}

impl<'a, T: Copy + 'a, S: ChunkStorage<Item = T>> Extend<&'a T> for SpinedBuffer<T, S> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, S: ChunkStorage<Item = T>> FromIterator<T> for SpinedBuffer<T, S> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::default();
        buffer.extend(iter);
        buffer
    }
}

impl<'a, T, S: ChunkStorage<Item = T>> IntoIterator for &'a SpinedBuffer<T, S> {
    type Item = &'a T;
    type IntoIter = SpineCursor<'a, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

impl<T: fmt::Debug, S: ChunkStorage<Item = T>> fmt::Debug for SpinedBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpinedBuffer")?;
        f.debug_list().entries(self.iter()).finish()
    }
}
