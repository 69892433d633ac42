//! 脊柱：分块竞技场（arena）与前缀计数索引。
//!
//! # 设计概要（How）
//! - `chunks` 保存全部已分配分块，`prior[i]` 记录 `chunks[0..i)` 的容量之和，两表等长；
//! - 分块只追加不移除（`truncate_to_first` 除外），簿记表扩容只搬移分块句柄，不搬移元素；
//! - 首次溢出前两表只持有一个条目，不预留簿记空间；膨胀后按 [`MIN_SPINE_SIZE`] 起步并倍增。

use alloc::{format, vec::Vec};

use tracing::{debug, trace};

use crate::{
    chunk::ChunkStorage,
    error::{Result, SpineError},
    growth::MIN_SPINE_SIZE,
};

#[derive(Clone, Debug)]
pub(crate) struct Spine<S> {
    chunks: Vec<S>,
    prior: Vec<usize>,
    inflated: bool,
}

impl<S: ChunkStorage> Spine<S> {
    pub(crate) fn new(first: S) -> Self {
        let mut chunks = Vec::with_capacity(1);
        chunks.push(first);
        let mut prior = Vec::with_capacity(1);
        prior.push(0);
        Self {
            chunks,
            prior,
            inflated: false,
        }
    }

    pub(crate) fn chunks(&self) -> &[S] {
        &self.chunks
    }

    pub(crate) fn prior_counts(&self) -> &[usize] {
        &self.prior
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn chunk(&self, index: usize) -> &S {
        &self.chunks[index]
    }

    pub(crate) fn chunk_mut(&mut self, index: usize) -> &mut S {
        &mut self.chunks[index]
    }

    pub(crate) fn prior(&self, index: usize) -> usize {
        self.prior[index]
    }

    /// 全部已分配分块的容量之和，包括预分配但尚未写入的分块。
    pub(crate) fn total_capacity(&self) -> usize {
        let last = self.chunks.len() - 1;
        self.prior[last].saturating_add(self.chunks[last].capacity())
    }

    /// 首次溢出时为簿记表预留 [`MIN_SPINE_SIZE`] 个条目。
    pub(crate) fn inflate(&mut self) {
        if self.inflated {
            return;
        }
        let additional = MIN_SPINE_SIZE.saturating_sub(self.chunks.len());
        self.chunks.reserve_exact(additional);
        self.prior.reserve_exact(additional);
        self.inflated = true;
        debug!(
            reserved = self.chunks.capacity(),
            first_chunk_capacity = self.chunks[0].capacity(),
            "spine tables inflated"
        );
    }

    /// 追加一块新分配的分块并记录其前缀计数，返回该分块下标。
    pub(crate) fn push_chunk(&mut self, chunk: S) -> Result<usize> {
        let last = self.chunks.len() - 1;
        let prior = self.prior[last]
            .checked_add(self.chunks[last].capacity())
            .ok_or(SpineError::CapacityOverflow {
                required: usize::MAX,
                available: self.total_capacity(),
            })?;
        if self.chunks.len() == self.chunks.capacity() {
            // 倍增簿记表；只移动分块句柄。
            let grow = self.chunks.capacity().max(1);
            self.chunks.reserve_exact(grow);
            self.prior.reserve_exact(grow);
        }
        let index = self.chunks.len();
        trace!(chunk_index = index, capacity = chunk.capacity(), prior, "chunk allocated");
        self.chunks.push(chunk);
        self.prior.push(prior);
        Ok(index)
    }

    /// 将逻辑下标映射为 `(分块下标, 块内偏移)`，仅在 `chunks[0..=current]` 中查找。
    ///
    /// 调用方须保证 `index` 小于当前元素总数。
    pub(crate) fn locate(&self, index: usize, current: usize) -> Result<(usize, usize)> {
        let prior = &self.prior[..=current];
        let chunk = prior.partition_point(|&count| count <= index).saturating_sub(1);
        let offset = index - prior[chunk];
        if offset >= self.chunks[chunk].len() {
            return Err(SpineError::invariant(format!(
                "index {index} resolved to chunk {chunk} offset {offset}, but only {} slots are filled",
                self.chunks[chunk].len()
            )));
        }
        Ok((chunk, offset))
    }

    /// 丢弃除第 0 块以外的全部分块，并清空第 0 块；返回丢弃的分块数。
    pub(crate) fn truncate_to_first(&mut self) -> usize {
        let discarded = self.chunks.len() - 1;
        self.chunks.truncate(1);
        self.prior.truncate(1);
        if self.inflated {
            self.chunks.shrink_to_fit();
            self.prior.shrink_to_fit();
            self.inflated = false;
        }
        self.chunks[0].reset();
        discarded
    }

    /// 校验前缀计数表与分块状态的一致性。
    ///
    /// - `prior[0] == 0`，且 `prior[i] == prior[i-1] + capacity(i-1)`；
    /// - `current` 之前的分块全部写满，之后的预分配分块全部为空。
    pub(crate) fn check(&self, current: usize) -> Result<()> {
        if self.chunks.len() != self.prior.len() {
            return Err(SpineError::invariant(format!(
                "{} chunks but {} prior counts",
                self.chunks.len(),
                self.prior.len()
            )));
        }
        if current >= self.chunks.len() {
            return Err(SpineError::invariant(format!(
                "current chunk {current} beyond {} allocated chunks",
                self.chunks.len()
            )));
        }
        if self.prior[0] != 0 {
            return Err(SpineError::invariant("prior count of chunk 0 is not zero"));
        }
        for (index, chunk) in self.chunks.iter().enumerate() {
            if chunk.capacity() == 0 {
                return Err(SpineError::invariant(format!("chunk {index} has zero capacity")));
            }
            if chunk.len() > chunk.capacity() {
                return Err(SpineError::invariant(format!("chunk {index} overfilled")));
            }
            if index > 0 {
                let expected = self.prior[index - 1] + self.chunks[index - 1].capacity();
                if self.prior[index] != expected {
                    return Err(SpineError::invariant(format!(
                        "prior count of chunk {index} is {}, expected {expected}",
                        self.prior[index]
                    )));
                }
            }
            if index < current && !chunk.is_full() {
                return Err(SpineError::invariant(format!(
                    "retired chunk {index} is not full"
                )));
            }
            if index > current && !chunk.is_empty() {
                return Err(SpineError::invariant(format!(
                    "reserved chunk {index} already holds elements"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::VecChunk;

    fn filled_spine(capacities: &[usize]) -> Spine<VecChunk<usize>> {
        let mut spine = Spine::new(VecChunk::allocate(capacities[0]));
        for &capacity in &capacities[1..] {
            spine.inflate();
            spine.push_chunk(VecChunk::allocate(capacity)).expect("追加分块");
        }
        let mut value = 0;
        for index in 0..spine.chunk_count() {
            let chunk = spine.chunk_mut(index);
            while chunk.try_push(value).is_ok() {
                value += 1;
            }
        }
        spine
    }

    #[test]
    fn prior_counts_accumulate_capacities() {
        let spine = filled_spine(&[16, 16, 32, 64]);
        assert_eq!(spine.prior_counts(), &[0, 16, 32, 64]);
        assert_eq!(spine.total_capacity(), 128);
        assert!(spine.check(3).is_ok());
    }

    #[test]
    fn locate_resolves_chunk_boundaries() {
        let spine = filled_spine(&[16, 16, 32]);
        assert_eq!(spine.locate(0, 2).expect("首元素"), (0, 0));
        assert_eq!(spine.locate(15, 2).expect("首块末尾"), (0, 15));
        assert_eq!(spine.locate(16, 2).expect("第二块起点"), (1, 0));
        assert_eq!(spine.locate(63, 2).expect("末元素"), (2, 31));
    }

    #[test]
    fn bookkeeping_tables_grow_geometrically() {
        let mut spine = Spine::new(VecChunk::<u8>::allocate(16));
        assert_eq!(spine.chunks.capacity(), 1);
        spine.inflate();
        assert!(spine.chunks.capacity() >= MIN_SPINE_SIZE);
        for _ in 0..MIN_SPINE_SIZE {
            spine.push_chunk(VecChunk::allocate(16)).expect("追加分块");
        }
        assert!(spine.chunks.capacity() >= 2 * MIN_SPINE_SIZE);
        assert_eq!(spine.chunks.len(), spine.prior.len());
    }

    #[test]
    fn truncate_keeps_only_first_chunk() {
        let mut spine = filled_spine(&[16, 16, 32]);
        assert_eq!(spine.truncate_to_first(), 2);
        assert_eq!(spine.chunk_count(), 1);
        assert!(spine.chunk(0).is_empty());
        assert_eq!(spine.chunk(0).capacity(), 16);
        assert!(spine.check(0).is_ok());
    }

    #[test]
    fn check_reports_inconsistent_prior_counts() {
        let mut spine = filled_spine(&[16, 16]);
        spine.prior[1] = 17;
        let err = spine.check(1).expect_err("前缀计数被篡改");
        assert!(matches!(err, SpineError::InvariantViolation { .. }));
    }

    #[test]
    fn locate_reports_unfilled_slot_as_invariant_violation() {
        let mut spine = Spine::new(VecChunk::<u8>::allocate(16));
        spine.inflate();
        spine.push_chunk(VecChunk::allocate(16)).expect("追加分块");
        let err = spine.locate(3, 1).expect_err("第 0 块尚未写入");
        assert!(matches!(err, SpineError::InvariantViolation { .. }));
    }
}
