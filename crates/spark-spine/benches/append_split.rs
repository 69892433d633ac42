use criterion::{Criterion, black_box};
use spark_spine::{SpineCursor, SpinedBuffer, VecChunk};
use std::{env, time::Duration};

const ELEMENTS: u64 = 100_000;

/// 追加吞吐：逐个 `accept` 十万个元素，对照 `Vec::push`。
///
/// # 设计背景（Why）
/// - 脊柱缓冲的卖点是增长时不搬移已写元素；基准用于确认分块切换的冷路径不会拖慢热路径。
fn bench_append(c: &mut Criterion) {
    c.bench_function("spined_append_100k", |b| {
        b.iter(|| {
            let mut buffer = SpinedBuffer::new();
            for value in 0..ELEMENTS {
                buffer.accept(black_box(value));
            }
            black_box(buffer.count())
        });
    });
    c.bench_function("vec_push_100k", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for value in 0..ELEMENTS {
                vec.push(black_box(value));
            }
            black_box(vec.len())
        });
    });
}

fn sum_split(mut cursor: SpineCursor<'_, u64, VecChunk<u64>>, depth: u32) -> u64 {
    if depth > 0 {
        if let Some(prefix) = cursor.try_split() {
            return sum_split(prefix, depth - 1) + sum_split(cursor, depth - 1);
        }
    }
    cursor.fold(0, |acc, value| acc + *value)
}

/// 遍历与拆分：顺序求和与递归拆分到叶子后求和。
fn bench_traverse(c: &mut Criterion) {
    let buffer: SpinedBuffer<u64> = (0..ELEMENTS).collect();
    c.bench_function("spined_iter_sum_100k", |b| {
        b.iter(|| black_box(buffer.iter().fold(0u64, |acc, value| acc + *value)));
    });
    c.bench_function("spined_split_sum_100k", |b| {
        b.iter(|| black_box(sum_split(buffer.cursor(), 8)));
    });
    c.bench_function("spined_get_strided_100k", |b| {
        b.iter(|| {
            let mut acc = 0u64;
            for index in (0..buffer.count()).step_by(7) {
                if let Ok(value) = buffer.get(index) {
                    acc += *value;
                }
            }
            black_box(acc)
        });
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_append(&mut criterion);
    bench_traverse(&mut criterion);
    criterion.final_summary();
}
