use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sortwise_analysis::clustering::cluster;
use sortwise_analysis::similarity::SimilarityMatrix;
use sortwise_core::model::Card;

/// Deterministic similarity matrix with block structure so merges are
/// non-trivial.
fn make_matrix(n: usize) -> SimilarityMatrix {
    let cards = (0..n)
        .map(|i| Card::new(format!("card-{i}"), format!("Card {i}")))
        .collect();
    let values = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else if i / 5 == j / 5 {
                        0.8
                    } else {
                        ((i + j) * 7 % 10) as f64 / 20.0
                    }
                })
                .collect()
        })
        .collect();
    SimilarityMatrix { cards, values }
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    group.sample_size(20);

    for n in [10, 30, 60] {
        let matrix = make_matrix(n);
        group.bench_function(format!("cluster n={n}"), |b| {
            b.iter(|| cluster(black_box(&matrix)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clustering);
criterion_main!(benches);
