//! Ready-made graphs for the `klangstrom` binary and for experimenting.
//!
//! Each preset adds its nodes to a [`Graph`] and returns the channel(s) a sink should
//! read from.

use std::path::Path;

use tracing::debug;

use crate::nodes::source::entropy_seed;
use crate::nodes::{
    design, Chopper, Clip, Combiner, DataBuffer, DelayLine, Dc, Fir, Gain, Noise, Sine,
    Splitter,
};
use crate::{Channel, Graph, Result, Sample, DEFAULT_BLOCK_SIZE};

/// One organ partial: `(frequency, amplitude, vibrato frequency, vibrato depth)`.
pub type Partial = (f32, Sample, f32, Sample);

/// The organ's partials.
pub const ORGAN_PARTIALS: [Partial; 9] = [
    (62.5, 0.2, 0.1, 0.2),
    (31.25, 0.3, 0.3, 0.2),
    (125.0, 0.5, 0.5, 0.2),
    (250.0, 1.0, 0.7, 0.2),
    (500.0, 0.5, 0.6, 0.2),
    (1000.0, 0.4, 0.5, 0.2),
    (2000.0, 0.1, 0.3, 0.2),
    (7500.0, 0.05, 5.0, 0.2),
    (83.0, 0.15, 5.0, 0.2),
];

/// A sine at `frequency` whose amplitude wobbles by `1 + vibrato`.
pub fn tone(graph: &mut Graph, partial: Partial) -> Result<Channel> {
    let (frequency, amplitude, vibrato_frequency, vibrato_depth) = partial;

    let carrier = graph.add(Sine::new(frequency).with_amplitude(amplitude));
    let one = graph.add(Dc::new(1.0));
    let vibrato = graph.add(Sine::new(vibrato_frequency).with_amplitude(vibrato_depth));
    let envelope = graph.add(Combiner::mixer(vec![one.output(), vibrato.output()])?);
    let tone = graph.add(Combiner::modulator(vec![
        carrier.output(),
        envelope.output(),
    ])?);

    Ok(tone.output())
}

/// Nine slightly detuned organ partials, mixed and scaled by `1/9`.
pub fn organ(graph: &mut Graph) -> Result<Channel> {
    organ_with_seed(graph, entropy_seed())
}

/// [`organ`] with reproducible detuning.
pub fn organ_with_seed(graph: &mut Graph, seed: u64) -> Result<Channel> {
    let mut rng = oorandom::Rand32::new(seed);
    // each value drifts by up to 2% either way
    let mut detune = |x: f32| x + x * (rng.rand_float() * 2.0 - 1.0) / 50.0;

    let tones = ORGAN_PARTIALS
        .iter()
        .map(|&(f, a, vf, va)| tone(graph, (detune(f), detune(a), detune(vf), detune(va))))
        .collect::<Result<Vec<_>>>()?;

    let n = tones.len();
    debug!(partials = n, seed, "building organ");
    let mix = graph.add(Combiner::mixer(tones)?);
    let master = graph.add(Gain::new(mix.output(), 1.0 / n as Sample));
    Ok(master.output())
}

/// A 1 kHz sine.
pub fn beep(graph: &mut Graph) -> Channel {
    graph.add(Sine::new(1000.0)).output()
}

/// Lowpassed noise split into a delayed left side and a chopped right side.
///
/// Both returned channels deliver [`DEFAULT_BLOCK_SIZE`] blocks.
pub fn stereo_noise(graph: &mut Graph) -> (Channel, Channel) {
    stereo_noise_with(graph, Noise::new(0.5))
}

/// [`stereo_noise`] with a caller-provided noise source.
pub fn stereo_noise_with(graph: &mut Graph, noise: Noise) -> (Channel, Channel) {
    let rate = graph.sample_rate();

    let noise = graph.add(noise);
    let fir = graph.add(Fir::new(noise.output(), design::lowpass(2000.0, rate, 63)));
    // the filter's warm-up gives short blocks; square them up before fanning out
    let aligned = graph.add(DataBuffer::new(fir.output(), DEFAULT_BLOCK_SIZE));
    let split = graph.add(Splitter::new(aligned.output(), 2));
    let outputs = split.outputs();

    let delay = graph.add(DelayLine::new(outputs[0].clone(), (rate / 200) as usize));
    let left = graph.add(DataBuffer::new(delay.output(), DEFAULT_BLOCK_SIZE));

    let quarter = (rate / 4) as u64;
    let right = graph.add(Chopper::new(outputs[1].clone(), quarter, quarter));

    (left.output(), right.output())
}

/// Raw int16 LE mono file, clipped to `[-1, 1]`.
pub fn pcm_file(graph: &mut Graph, path: impl AsRef<Path>) -> Result<Channel> {
    let source = graph.add(crate::nodes::open_pcm_file(path, DEFAULT_BLOCK_SIZE)?);
    let clip = graph.add(Clip::new(source.output()));
    Ok(clip.output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn organ_stays_in_range() {
        let mut graph = Graph::new(48_000);
        let out = organ_with_seed(&mut graph, 7).unwrap();

        for _ in 0..8 {
            let block = out.pull_vec();
            assert_eq!(block.len(), DEFAULT_BLOCK_SIZE);
            // sum of amplitudes is ~3.2, times 1.2 vibrato, over 9
            assert!(block.iter().all(|s| s.abs() < 0.5));
        }
        // 9 × (carrier, dc, vibrato, envelope, tone) + mixer + gain
        assert_eq!(graph.len(), 47);
    }

    #[test]
    fn beep_is_a_full_scale_sine() {
        let mut graph = Graph::new(48_000);
        let out = beep(&mut graph);
        let block = out.pull_vec();
        let peak = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.99 && peak <= 1.0);
    }

    #[test]
    fn stereo_noise_sides_stay_in_step() {
        let mut graph = Graph::new(48_000);
        let (left, right) = stereo_noise_with(&mut graph, Noise::with_seed(0.5, 1));

        for _ in 0..4 {
            assert_eq!(left.pull_vec().len(), DEFAULT_BLOCK_SIZE);
            assert_eq!(right.pull_vec().len(), DEFAULT_BLOCK_SIZE);
        }
    }

    #[test]
    fn pcm_file_plays_then_ends() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = [16384i16, -16384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let mut graph = Graph::new(48_000);
        let out = pcm_file(&mut graph, file.path()).unwrap();
        assert_eq!(out.pull_vec(), vec![0.5, -0.5]);
        assert!(out.pull_vec().is_empty());
    }

    #[test]
    fn missing_pcm_file_is_an_error() {
        let mut graph = Graph::new(48_000);
        assert!(pcm_file(&mut graph, "/nonexistent/klangstrom.raw").is_err());
    }
}
