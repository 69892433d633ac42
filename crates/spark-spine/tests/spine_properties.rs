//! 脊柱缓冲性质验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：对任意长度、任意首块容量的输入序列，验证缓冲的顺序性、拆分覆盖性、
//!   导出往返一致性与复位等价性。这些性质是下游流水线正确性的直接前提。
//! - **设计手法 (How)**：以 `Vec` 作为影子模型，Proptest 随机生成元素序列与拆分深度，
//!   对比缓冲的 `get`/遍历/导出结果与影子模型是否一致。
//!
//! # 合同与边界 (What)
//!
//! - **输入**：长度不超过 2000 的 `Vec<i32>`，首块容量取 1..=300，拆分深度取 0..=12；
//! - **断言**：任何失败都会给出最小化后的反例，便于定位是增长路径还是拆分路径的缺陷。

use proptest::prelude::*;
use spark_spine::{IntBuffer, SpineCursor, SpinedBuffer, VecChunk};

fn build(values: &[i32], initial_capacity: usize) -> IntBuffer {
    let mut buffer = SpinedBuffer::with_capacity(initial_capacity);
    for value in values {
        buffer.accept(*value);
    }
    buffer
}

fn drain_split<'a>(
    mut cursor: SpineCursor<'a, i32, VecChunk<i32>>,
    depth: u32,
    out: &mut Vec<i32>,
) {
    if depth > 0 {
        if let Some(prefix) = cursor.try_split() {
            drain_split(prefix, depth - 1, out);
            drain_split(cursor, depth - 1, out);
            return;
        }
    }
    cursor.for_each_remaining(|value| out.push(*value));
}

proptest! {
    #[test]
    fn prop_get_and_traversal_preserve_insertion_order(
        values in prop::collection::vec(any::<i32>(), 0..2000),
        initial_capacity in 1usize..=300,
    ) {
        let buffer = build(&values, initial_capacity);
        prop_assert_eq!(buffer.count(), values.len());
        for (index, value) in values.iter().enumerate() {
            prop_assert_eq!(buffer.get(index), Ok(value));
        }
        prop_assert!(buffer.get(values.len()).is_err());
        let traversed: Vec<i32> = buffer.iter().copied().collect();
        prop_assert_eq!(&traversed, &values);
        prop_assert!(buffer.check_invariants().is_ok());
    }

    #[test]
    fn prop_recursive_split_covers_every_element_once(
        values in prop::collection::vec(any::<i32>(), 0..2000),
        initial_capacity in 1usize..=300,
        depth in 0u32..=12,
    ) {
        let buffer = build(&values, initial_capacity);
        let mut drained = Vec::with_capacity(values.len());
        drain_split(buffer.cursor(), depth, &mut drained);
        prop_assert_eq!(drained, values);
    }

    #[test]
    fn prop_export_round_trip_is_identity(
        values in prop::collection::vec(any::<i32>(), 0..2000),
    ) {
        let first: IntBuffer = values.iter().copied().collect();
        let exported = first.to_vec().expect("导出");
        let second: IntBuffer = exported.iter().copied().collect();
        prop_assert_eq!(second.to_vec().expect("再次导出"), values);
    }

    #[test]
    fn prop_clear_is_equivalent_to_fresh_buffer(
        before in prop::collection::vec(any::<i32>(), 0..2000),
        after in prop::collection::vec(any::<i32>(), 0..500),
        initial_capacity in 1usize..=300,
    ) {
        let mut reused = build(&before, initial_capacity);
        reused.clear();
        prop_assert_eq!(reused.count(), 0);
        reused.extend(after.iter().copied());

        let fresh = build(&after, initial_capacity);
        prop_assert_eq!(reused.count(), fresh.count());
        prop_assert_eq!(reused.chunk_count(), fresh.chunk_count());
        prop_assert_eq!(reused.to_vec(), fresh.to_vec());
        prop_assert!(reused.check_invariants().is_ok());
    }
}
