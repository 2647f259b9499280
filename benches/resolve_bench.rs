//! Benchmarks for context traversal and resolution.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use osdd::core::resolver::{collect_parameters, InputCollector};
use osdd::core::types::*;
use osdd::prompt::ScriptedAsk;
use tokio_util::sync::CancellationToken;

/// `entries` context entries, alternating direct and combined sources,
/// each with three parameters.
fn recipe(entries: usize) -> Recipe {
    let params = |i: usize| UserInputSource {
        entries: (0..3)
            .map(|j| UserInputParameter {
                name: format!("p{}_{}", i, j),
                description: "bench".to_string(),
                optional: j == 2,
            })
            .collect(),
    };
    let entries = (0..entries)
        .map(|i| ContextEntry {
            path: format!("e{}.md", i),
            from: Some(if i % 2 == 0 {
                ContextSource::UserInput(params(i))
            } else {
                ContextSource::Combined(CombinedSource {
                    items: vec![
                        CombinedItem {
                            source: Some(ItemSource::Other(OpaqueSource {
                                kind: "text".to_string(),
                                value: serde_json::Value::String("static".to_string()),
                            })),
                        },
                        CombinedItem {
                            source: Some(ItemSource::UserInput(params(i))),
                        },
                    ],
                })
            }),
        })
        .collect();
    Recipe {
        context: Some(Context { entries }),
        ..Recipe::default()
    }
}

fn bench_collect_parameters(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_parameters");
    for size in [10, 100, 1000] {
        let r = recipe(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &r, |b, r| {
            b.iter(|| black_box(collect_parameters(black_box(r)).len()));
        });
    }
    group.finish();
}

fn bench_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("request");
    for size in [10, 100, 1000] {
        let r = recipe(size);
        let answers: Vec<String> = (0..size * 3)
            .map(|i| if i % 3 == 2 { String::new() } else { format!("v{}", i) })
            .collect();
        let cancel = CancellationToken::new();
        group.bench_with_input(BenchmarkId::from_parameter(size), &r, |b, r| {
            b.iter(|| {
                let mut collector = InputCollector::new(ScriptedAsk::new(answers.clone()));
                black_box(collector.request(&cancel, black_box(r)).answers.len())
            });
        });
    }
    group.finish();
}

fn bench_parse_yaml(c: &mut Criterion) {
    let doc = ExecutableRecipe {
        recipe: Some(recipe(100)),
        ..ExecutableRecipe::default()
    };
    let yaml = serde_yaml_ng::to_string(&doc).unwrap();
    c.bench_function("parse_recipe_yaml_100", |b| {
        b.iter(|| osdd::core::parser::parse_recipe_yaml(black_box(&yaml)).unwrap());
    });
}

criterion_group!(benches, bench_collect_parameters, bench_request, bench_parse_yaml);
criterion_main!(benches);
