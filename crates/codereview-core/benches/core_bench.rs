//! Criterion benchmarks for codereview-core.
//!
//! ## Benchmark groups
//!
//! 1. **analysis**: parsing and structural extraction at several file sizes.
//! 2. **detection**: rule evaluation over precomputed metadata.
//! 3. **similarity**: keyword extraction and `find_similar` over snippet pools.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/codereview-core/Cargo.toml
//! # Run only the similarity group:
//! cargo bench --manifest-path crates/codereview-core/Cargo.toml -- similarity
//! ```

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use codereview_core::detect::PatternDetector;
use codereview_core::indexer::symbols::SourceAnalyzer;
use codereview_core::models::{snippet_id, Snippet, SnippetCategory, SnippetFlags};
use codereview_core::query::search::{extract_keywords, find_similar};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A TypeScript module with `n` functions mixing awaits, branches and loops.
fn synthetic_source(n: usize) -> String {
    let mut src = String::from("import { db } from './db';\nimport axios from 'axios';\n\n");
    for i in 0..n {
        src.push_str(&format!(
            "export async function handler{i}(id: string, retries: number): Promise<number> {{\n\
             \x20 const row = await db.find(id);\n\
             \x20 const remote = await axios.get(`/items/${{id}}`);\n\
             \x20 let total = 0;\n\
             \x20 for (const item of remote.data) {{\n\
             \x20   if (item.active && item.count > 0 || retries > 2) {{\n\
             \x20     total += item.count;\n\
             \x20   }}\n\
             \x20 }}\n\
             \x20 return row ? total : -1;\n\
             }}\n\n"
        ));
    }
    src
}

fn synthetic_pool(n: usize) -> Vec<Snippet> {
    (0..n)
        .map(|i| {
            let file = format!("/app/src/module{}/service.ts", i % 17);
            let name = format!("fn{i}");
            Snippet {
                id: snippet_id(&file, &name, i + 1),
                code: format!(
                    "async function {name}() {{\n  const r = await fetch{}(id);\n  return transform{}(r);\n}}",
                    i % 7,
                    i % 11
                ),
                file_path: file,
                function_name: name,
                category: SnippetCategory::Service,
                flags: SnippetFlags {
                    is_async: true,
                    has_error_handling: false,
                    uses_external_dependency: false,
                    complexity: 1,
                },
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Analysis
// ---------------------------------------------------------------------------

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let analyzer = SourceAnalyzer::new();
    for size in [1usize, 20, 200] {
        let src = synthetic_source(size);
        group.bench_with_input(BenchmarkId::new("analyze_source", size), &src, |b, src| {
            b.iter(|| {
                let metadata = analyzer
                    .analyze_source(Path::new("bench.ts"), black_box(src))
                    .unwrap();
                black_box(metadata);
            })
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Detection
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    let detector = PatternDetector::default();
    for size in [20usize, 200] {
        let src = synthetic_source(size);
        let metadata = SourceAnalyzer::new()
            .analyze_source(Path::new("bench.ts"), &src)
            .unwrap();
        group.bench_with_input(
            BenchmarkId::new("detect_issues", size),
            &(metadata, src),
            |b, (metadata, src)| {
                b.iter(|| black_box(detector.detect_issues(black_box(metadata), black_box(src))))
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Similarity
// ---------------------------------------------------------------------------

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");
    let target = synthetic_source(5);

    group.bench_function("extract_keywords", |b| {
        b.iter(|| black_box(extract_keywords(black_box(&target))))
    });

    for size in [100usize, 1_000, 10_000] {
        let pool = synthetic_pool(size);
        group.bench_with_input(BenchmarkId::new("find_similar", size), &pool, |b, pool| {
            b.iter(|| black_box(find_similar(black_box(&target), 5, pool)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_analysis, bench_detection, bench_similarity);
criterion_main!(benches);
