/// Benchmarks for the trace post-processing pipeline.
///
/// Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

use flowtrace::domain::annotation::{execution_orders, render_annotated};
use flowtrace::domain::flowgraph::{simplify_transitions, FlowGraph};
use flowtrace::domain::trace_log::parse_trace;
use flowtrace::ports::flowchart_exporter::DotExporter;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A loop-heavy trace: `body_lines` statements executed `iterations` times,
/// with every fourth transition duplicated as repeated stops produce.
fn synthetic_trace(iterations: usize, body_lines: u32) -> String {
    let mut out = String::from("START -> src/gol.c:10\n");
    let mut prev = 10;
    let mut n = 0usize;
    for _ in 0..iterations {
        for offset in 0..body_lines {
            let line = 20 + offset;
            out.push_str(&format!("src/gol.c:{prev} -> src/gol.c:{line}\n"));
            if n % 4 == 0 {
                out.push_str(&format!("src/gol.c:{prev} -> src/gol.c:{line}\n"));
            }
            prev = line;
            n += 1;
        }
    }
    out
}

fn synthetic_source(lines: u32) -> String {
    (1..=lines).map(|i| format!("    statement_{i}();\n")).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_parse_and_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocess/parse_simplify");

    for iterations in [100, 1_000, 10_000].iter() {
        let trace = synthetic_trace(*iterations, 25);
        group.throughput(Throughput::Bytes(trace.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &trace, |b, trace| {
            b.iter(|| {
                let parsed = parse_trace(Cursor::new(trace.as_bytes())).unwrap();
                black_box(simplify_transitions(&parsed.events))
            })
        });
    }
    group.finish();
}

fn bench_flow_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocess/flow_graph");

    for iterations in [100, 1_000, 10_000].iter() {
        let trace = synthetic_trace(*iterations, 25);
        let parsed = parse_trace(Cursor::new(trace.as_bytes())).unwrap();
        let simplified = simplify_transitions(&parsed.events);
        group.throughput(Throughput::Elements(simplified.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &simplified,
            |b, simplified| {
                b.iter(|| {
                    let flow = FlowGraph::from_transitions(simplified);
                    black_box(DotExporter::flow_to_dot(&flow))
                })
            },
        );
    }
    group.finish();
}

fn bench_annotation(c: &mut Criterion) {
    let trace = synthetic_trace(1_000, 25);
    let parsed = parse_trace(Cursor::new(trace.as_bytes())).unwrap();
    let source = synthetic_source(60);

    c.bench_function("postprocess/annotate", |b| {
        b.iter(|| {
            let orders = execution_orders(&parsed.events, "src/gol.c");
            black_box(render_annotated("src/gol.c", &source, &orders))
        })
    });
}

/// Full visualize pass reading the log from disk.
fn bench_from_disk(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("statement_trace.txt");
    fs::write(&path, synthetic_trace(1_000, 25)).unwrap();

    c.bench_function("postprocess/from_disk", |b| {
        b.iter(|| {
            let parsed = flowtrace::domain::trace_log::read_trace_file(&path).unwrap();
            let flow = FlowGraph::from_transitions(&simplify_transitions(&parsed.events));
            black_box(flow.edges.len())
        })
    });
}

criterion_group!(
    benches,
    bench_parse_and_simplify,
    bench_flow_graph,
    bench_annotation,
    bench_from_disk
);
criterion_main!(benches);
