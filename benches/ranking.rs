//! 日榜排序基准测试

use chrono::NaiveDate;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use jcpe_portal::analytics::{calendar_day, rank_counts};
use jcpe_portal::storage::ViewCount;

/// 模拟一天的访问分布：少数热门，大量长尾，夹杂零访问与同票
fn sample_counts(articles: i64) -> Vec<ViewCount> {
    (1..=articles)
        .map(|id| ViewCount {
            article_id: id,
            views: match id % 10 {
                0 => 0,
                1 => 500 + (id % 7),
                _ => id % 37,
            },
        })
        .collect()
}

fn bench_rank_counts(c: &mut Criterion) {
    let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let mut group = c.benchmark_group("ranking/rank_counts");

    for size in [100i64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || sample_counts(size),
                |counts| rank_counts(counts, day),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_calendar_day(c: &mut Criterion) {
    let now = chrono::Utc::now();
    c.bench_function("ranking/calendar_day", |b| {
        b.iter(|| calendar_day(now, -180));
    });
}

criterion_group!(benches, bench_rank_counts, bench_calendar_day);
criterion_main!(benches);
