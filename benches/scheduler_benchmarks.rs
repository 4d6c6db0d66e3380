use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mymusic_playback::audio::backend::{Destination, RenderBackend};
use mymusic_playback::audio::buffer::AudioBuffer;
use mymusic_playback::sampler::InstrumentBank;
use mymusic_playback::sequencer::NoteScheduler;
use mymusic_playback::synth::envelope::FadePolicy;
use mymusic_playback::{InstrumentRef, NoteStore, ScheduledNote, TimeModel, VoicePool, render_graph};
use std::sync::Arc;

const SAMPLE_RATE: f64 = 48000.0;

/// `count` notes, one every 16th note, cycling through two octaves
fn arrangement(count: u64) -> NoteStore {
    (0..count)
        .map(|i| {
            ScheduledNote::new(
                i + 1,
                0,
                48 + (i % 24) as u8,
                i * 120,
                240,
                100,
                InstrumentRef::new("sine"),
            )
        })
        .collect()
}

/// Tick/second conversions run for every note on every pass
fn bench_time_model(c: &mut Criterion) {
    let model = TimeModel::default();

    c.bench_function("time_model_tick_to_seconds_1000", |b| {
        b.iter(|| {
            for tick in 0..1000 {
                black_box(model.tick_to_seconds(black_box(tick as f64 * 7.5)));
            }
        });
    });

    c.bench_function("time_model_seconds_to_tick_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(model.seconds_to_tick(black_box(i as f64 * 0.013)));
            }
        });
    });
}

/// One lookahead pass from a fresh session, by note store size
fn bench_note_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("note_pass");
    let model = TimeModel::default();
    let bank = InstrumentBank::synthesized("sine", 48..72, 1.0, SAMPLE_RATE as u32);

    for &count in &[100u64, 1_000, 10_000] {
        let notes = arrangement(count);
        // Halfway through the arrangement, so the pass walks the earlier notes too
        let playhead = model.tick_to_seconds((count * 60) as f64);

        group.bench_with_input(BenchmarkId::from_parameter(count), &notes, |b, notes| {
            b.iter_batched(
                || {
                    let (mut handle, graph) = render_graph(SAMPLE_RATE, 65536, 4096);
                    let _ = handle.resume();
                    let mut scheduler = NoteScheduler::new(4.0);
                    scheduler.start();
                    (handle, graph, scheduler, VoicePool::new(10, FadePolicy::default()))
                },
                |(mut handle, graph, mut scheduler, mut pool)| {
                    let report = scheduler.pass(playhead, &model, notes, &bank, &mut pool, &mut handle);
                    black_box(report);
                    (handle, graph)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Render-thread cost of one 512-frame block by number of playing sources
fn bench_render_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_block");
    let buffer = Arc::new(AudioBuffer::sine(440.0, 2.0, SAMPLE_RATE as u32));
    let block_size = 512;

    for &voices in &[1usize, 10, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, &voices| {
            b.iter_batched(
                || {
                    let (mut handle, mut graph) = render_graph(SAMPLE_RATE, 4096, 1024);
                    let _ = handle.resume();
                    for _ in 0..voices {
                        let source = handle.create_source(Arc::clone(&buffer)).ok();
                        let gain = handle.create_gain(0.1).ok();
                        if let (Some(source), Some(gain)) = (source, gain) {
                            let _ = handle.connect(source, Destination::Node(gain));
                            let _ = handle.connect(gain, Destination::Output);
                            let _ = handle.start_source(source, 0.0, 0.0, None);
                        }
                    }
                    // Apply the queued commands before timing
                    let mut block = vec![0.0f32; block_size];
                    graph.render(&mut block);
                    (handle, graph, block)
                },
                |(handle, mut graph, mut block)| {
                    graph.render(&mut block);
                    black_box(&block);
                    (handle, graph)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_time_model, bench_note_pass, bench_render_block);
criterion_main!(benches);
