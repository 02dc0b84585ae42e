use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scribble::command::{dispatch, flag_value, tokenize};
use scribble::store::NoteStore;
use tempfile::TempDir;

fn seed_store(store: &NoteStore, count: usize) {
    for i in 0..count {
        store
            .add(
                &format!("Benchmark Note {}", i),
                &format!("This is benchmark note number {} with a short body.", i),
            )
            .expect("Failed to add note");
    }
}

fn bench_tokenize(c: &mut Criterion) {
    let line = r#"edit --title="weekly planning" --body="move the retro to thursday and book a room""#;

    c.bench_function("tokenize", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(line));
            black_box(flag_value(&tokens, "--body"))
        })
    });
}

fn bench_dispatch_read(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = NoteStore::new(temp_dir.path().join("notes.json"));
    seed_store(&store, 200);

    c.bench_function("dispatch_read", |b| {
        b.iter(|| {
            dispatch(&store, black_box(r#"read --title="Benchmark Note 150""#))
                .expect("read should succeed")
        })
    });
}

fn bench_dispatch_edit(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = NoteStore::new(temp_dir.path().join("notes.json"));
    seed_store(&store, 200);

    c.bench_function("dispatch_edit", |b| {
        b.iter(|| {
            dispatch(
                &store,
                black_box(r#"edit --title="Benchmark Note 10" --body="rewritten""#),
            )
            .expect("edit should succeed")
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_dispatch_read, bench_dispatch_edit);
criterion_main!(benches);
