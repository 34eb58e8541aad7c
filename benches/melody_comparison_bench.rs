//! Performance benchmarks for melody comparison

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use stratum_melody::{compare, compare_melodies, AudioFormat, ComparisonConfig, MelodySequence};

/// Render a sine melody (MIDI pitches, fixed note length) as an in-memory WAV file
fn melody_wav(pitches: &[u8], note_seconds: f32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let note_len = (note_seconds * sample_rate as f32) as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &pitch in pitches {
            let freq = 440.0 * 2.0f32.powf((pitch as f32 - 69.0) / 12.0);
            for i in 0..note_len {
                let s = (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin();
                writer.write_sample((s * 0.5 * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn bench_compare_audio(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();

    // 32 notes of 250 ms: 8 seconds per input
    let a: Vec<u8> = (0..32).map(|i| 60 + (i * 5 % 12) as u8).collect();
    let b: Vec<u8> = (0..32).map(|i| 62 + (i * 7 % 12) as u8).collect();
    let wav_a = melody_wav(&a, 0.25, 44100);
    let wav_b = melody_wav(&b, 0.25, 44100);
    let config = ComparisonConfig::default();

    c.bench_function("compare_8s_44k", |bench| {
        bench.iter(|| {
            let _ = compare(
                black_box(&wav_a),
                AudioFormat::Wav,
                black_box(&wav_b),
                AudioFormat::Wav,
                black_box(&config),
            );
        });
    });
}

fn bench_align(c: &mut Criterion) {
    let notes = |offset: usize| -> Vec<(u8, f32)> {
        (0..500)
            .map(|i| (48 + ((i * 7 + offset) % 24) as u8, 0.2 + ((i + offset) % 3) as f32 * 0.1))
            .collect()
    };
    let a = MelodySequence::from_midi_notes(&notes(0)).unwrap();
    let b = MelodySequence::from_midi_notes(&notes(3)).unwrap();
    let config = ComparisonConfig::default();

    c.bench_function("compare_melodies_500_notes", |bench| {
        bench.iter(|| {
            let _ = compare_melodies(black_box(&a), black_box(&b), black_box(&config));
        });
    });
}

criterion_group!(benches, bench_compare_audio, bench_align);
criterion_main!(benches);
