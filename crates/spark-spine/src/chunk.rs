//! 分块存储契约及其默认实现。
//!
//! # 模块定位（Why）
//! - 脊柱算法（前缀计数、增长、拆分）与元素类型无关，真正随存储类型变化的只有：
//!   分配固定容量、查询容量、一次写入、暴露已写区间、复位；
//! - 将这些钩子收敛为 [`ChunkStorage`]，使 `SpinedBuffer` 只写一遍即可覆盖引用类型、数值类型与字节流。
//!
//! # 契约说明（What）
//! - 分块一经分配，容量固定且**永不重新分配**：已写元素的地址在分块生命周期内保持稳定；
//! - `try_push` 在写满时把元素原样交还，调用方据此切换到下一块；
//! - `filled()` 返回 `[0, len)` 的连续切片，批量复制与逐元素访问都基于它完成。

use alloc::vec::Vec;

use bytes::{BufMut, Bytes, BytesMut};

/// 固定容量、只追加的分块存储。
pub trait ChunkStorage {
    /// 分块中的元素类型。
    type Item;

    /// 分配一块恰好可容纳 `capacity` 个元素的空分块。
    fn allocate(capacity: usize) -> Self;

    /// 分配时确定的容量，此后不变。
    fn capacity(&self) -> usize;

    /// 已写入的连续区间。
    fn filled(&self) -> &[Self::Item];

    /// 追加一个元素；分块已满时原样返回该元素，且不触发任何重新分配。
    fn try_push(&mut self, item: Self::Item) -> Result<(), Self::Item>;

    /// 丢弃全部已写元素，保留底层分配。
    fn reset(&mut self);

    /// 已写入的元素数。
    fn len(&self) -> usize {
        self.filled().len()
    }

    /// 是否尚未写入任何元素。
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否已写满。
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// 基于 `Vec<T>` 的通用分块，既用于引用/装箱元素，也用于 `i32`/`i64`/`f64` 等数值元素。
///
/// 元素以内联方式存放，不存在逐元素装箱；`Vec` 只在构造时按容量分配一次，
/// `try_push` 永远不会越过记录的容量，因此不会触发 `Vec` 的扩容搬移。
#[derive(Debug)]
pub struct VecChunk<T> {
    slots: Vec<T>,
    capacity: usize,
}

// `Vec::clone` 只按 `len` 分配；克隆必须保留完整容量，否则后续写入会搬移已写元素。
impl<T: Clone> Clone for VecChunk<T> {
    fn clone(&self) -> Self {
        let mut slots = Vec::with_capacity(self.capacity);
        slots.extend_from_slice(&self.slots);
        Self {
            slots,
            capacity: self.capacity,
        }
    }
}

impl<T> ChunkStorage for VecChunk<T> {
    type Item = T;

    fn allocate(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn filled(&self) -> &[T] {
        &self.slots
    }

    #[inline]
    fn try_push(&mut self, item: T) -> Result<(), T> {
        if self.slots.len() >= self.capacity {
            return Err(item);
        }
        self.slots.push(item);
        Ok(())
    }

    fn reset(&mut self) {
        self.slots.clear();
    }
}

/// 基于 `bytes::BytesMut` 的字节分块。
///
/// 用于字节流水线：整块导出时可直接与 `bytes` 生态对接，
/// 参见 [`ByteBuffer::to_bytes`](crate::SpinedBuffer::to_bytes)。
#[derive(Debug)]
pub struct ByteChunk {
    buf: BytesMut,
    capacity: usize,
}

impl Clone for ByteChunk {
    fn clone(&self) -> Self {
        let mut buf = BytesMut::with_capacity(self.capacity);
        buf.extend_from_slice(&self.buf);
        Self {
            buf,
            capacity: self.capacity,
        }
    }
}

impl ByteChunk {
    /// 复制已写区间为不可变的 `Bytes`。
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }
}

impl ChunkStorage for ByteChunk {
    type Item = u8;

    fn allocate(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn filled(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    fn try_push(&mut self, item: u8) -> Result<(), u8> {
        if self.buf.len() >= self.capacity {
            return Err(item);
        }
        self.buf.put_u8(item);
        Ok(())
    }

    fn reset(&mut self) {
        self.buf.clear();
    }
}
