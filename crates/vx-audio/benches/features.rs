use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vx_audio::extractor::FeatureExtractor;
use vx_audio::fft::SpectrumAnalyzer;
use vx_audio::window::kaiser;
use vx_core::config::FeatureConfig;

fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
        .collect()
}

fn bench_windowed_spectrum(c: &mut Criterion) {
    let mut fft = SpectrumAnalyzer::new(kaiser(65536, 14.0), 44100);
    let frame = tone(65536);
    c.bench_function("windowed_spectrum_65536", |b| {
        b.iter(|| fft.windowed_spectrum(black_box(&frame)));
    });
}

fn bench_extract_frame(c: &mut Criterion) {
    let config = FeatureConfig::default();
    let mut extractor = FeatureExtractor::new(&config, 44100);
    let signal = tone(config.frame_size);
    c.bench_function("extract_one_frame", |b| {
        b.iter(|| extractor.extract(black_box(&signal)));
    });
}

criterion_group!(benches, bench_windowed_spectrum, bench_extract_frame);
criterion_main!(benches);
