/// Classifier and end-to-end analysis throughput
///
/// Measures per-line classification cost across representative strace shapes
/// and the full pipeline over a synthetic trace, to catch regex regressions.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gitlab_strace_analyzer::analyzer::analyze;
use gitlab_strace_analyzer::classifier::classify;
use gitlab_strace_analyzer::source::numbered;

const SAMPLE_LINES: &[(&str, &str)] = &[
    ("plain_open", "open(\"/etc/passwd\", O_RDONLY) = 3"),
    (
        "permission_denied",
        "open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)",
    ),
    (
        "gitlab_path",
        "openat(AT_FDCWD, \"/var/opt/gitlab/git-data/repositories/g/p.git/objects/pack\", O_RDONLY) = 7",
    ),
    (
        "slow_heavy_read",
        "[pid  4242] read(3, \"...\", 2097152) = 2097152 <1.250000>",
    ),
    (
        "db_query",
        "sendto(5, \"SELECT * FROM projects WHERE id = 1\", 36, MSG_NOSIGNAL, NULL, 0) = 36",
    ),
    ("noise", "+++ exited with 0 +++"),
];

fn synthetic_trace(lines: usize) -> Vec<&'static str> {
    SAMPLE_LINES
        .iter()
        .map(|(_, line)| *line)
        .cycle()
        .take(lines)
        .collect()
}

fn bench_classify_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_line");

    for (name, line) in SAMPLE_LINES {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(classify(black_box(line))));
        });
    }

    group.finish();
}

fn bench_analyze_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_trace");

    for size in [1_000usize, 10_000] {
        let trace = synthetic_trace(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &trace, |b, trace| {
            b.iter(|| {
                let report = analyze(numbered(trace.iter().copied())).unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify_line, bench_analyze_trace);
criterion_main!(benches);
