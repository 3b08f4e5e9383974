//! Benchmarks for the editor's per-keystroke pipeline.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use mmdpad::editor::{EditorConfig, InputEvent, OverlayEditor};

fn bench_keystroke(c: &mut Criterion) {
    let src = include_str!("../tests/fixtures/flowchart.mmd").repeat(50);
    c.bench_function("keystroke", |b| {
        b.iter_batched(
            || OverlayEditor::new(&src, EditorConfig::default()),
            |mut editor| {
                editor.handle_input(black_box(InputEvent::Insert("x".to_string())));
                editor
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_keystroke);
criterion_main!(benches);
