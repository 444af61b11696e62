use std::rc::Rc;
use std::sync::atomic::AtomicBool;

use float_cmp::approx_eq;
use klangstrom::device::{PlaybackConfig, RtrbDevice};
use klangstrom::nodes::{
    design, pcm_source, Chunks, Combiner, Converter, Counter, DataBuffer, Dc, DelayLine,
    Deinterleaver, Fir, Gain, Literal, MonoSink, Offset, Sine, SineMessage, Splitter,
    StereoSink, Strided,
};
use klangstrom::{Engine, Graph, Sample};

fn drain(consumer: &mut rtrb::Consumer<Sample>) -> Vec<Sample> {
    std::iter::from_fn(|| consumer.pop().ok()).collect()
}

#[test]
fn dc_through_gain() {
    let mut graph = Graph::new(48_000);
    let dc = graph.add(Dc::new(0.5).with_block_size(4));
    let gain = graph.add(Gain::new(dc.output(), 2.0));

    assert_eq!(gain.output().pull_vec(), vec![1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn splitter_shares_one_upstream() {
    let mut graph = Graph::new(48_000);
    let counter = graph.add(Counter::new(0).with_block_size(4));
    let split = graph.add(Splitter::new(counter.output(), 2));
    let (a, b) = (split.output_at(0).unwrap(), split.output_at(1).unwrap());

    assert_eq!(a.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(b.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(a.pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
    assert_eq!(b.pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
    assert_eq!(counter.pull_count(), 2);
}

#[test]
fn fir_warm_up_then_delayed_input() {
    let mut graph = Graph::new(48_000);
    let src = graph.add(Literal::new([
        0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
    ]));
    let fir = graph.add(Fir::new(src.output(), design::unit_impulse(5, 2)));

    let block = fir.output().pull_vec();
    assert_eq!(&block[..2], &[0.0, 0.0]);
    assert_eq!(&block[2..], &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn one_hertz_sine_wraps_after_a_second() {
    let mut graph = Graph::new(48_000);
    let sine = graph.add(Sine::new(1.0).with_block_size(1000));
    let out = sine.output();

    for _ in 0..48 {
        out.pull_vec();
    }
    let next = out.pull_vec();
    assert!(approx_eq!(f32, next[0], 0.0, epsilon = 1e-4));
}

#[test]
fn mixer_sums_constants() {
    let mut graph = Graph::new(48_000);
    let a = graph.add(Dc::new(0.5));
    let b = graph.add(Dc::new(0.25));
    let mix = graph.add(Combiner::mixer(vec![a.output(), b.output()]).unwrap());

    let block = mix.output().pull_vec();
    assert_eq!(block.len(), 1024);
    assert!(block.iter().all(|&s| s == 0.75));
}

#[test]
fn delay_line_prepends_silence() {
    let mut graph = Graph::new(48_000);
    let counter = graph.add(Counter::new(0).with_block_size(4));
    let delay = graph.add(DelayLine::new(counter.output(), 3));
    let out = delay.output();

    assert_eq!(out.pull_vec(), vec![0.0, 0.0, 0.0]);
    assert_eq!(counter.pull_count(), 0);
    assert_eq!(out.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(out.pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
}

#[test]
fn delayed_branch_realigned_before_mixing() {
    let mut graph = Graph::new(48_000);
    let counter = graph.add(Counter::new(0).with_block_size(8));
    let split = graph.add(Splitter::new(counter.output(), 2));
    let outs = split.outputs();

    let delay = graph.add(DelayLine::new(outs[0].clone(), 2));
    let aligned = graph.add(DataBuffer::new(delay.output(), 8));
    let dry = graph.add(Gain::new(outs[1].clone(), -1.0));
    let mix = graph.add(Combiner::mixer(vec![aligned.output(), dry.output()]).unwrap());

    // x[n - 2] - x[n]
    let first = mix.output().pull_vec();
    assert_eq!(first, vec![0.0, -1.0, -2.0, -2.0, -2.0, -2.0, -2.0, -2.0]);
    let second = mix.output().pull_vec();
    assert!(second.iter().all(|&s| s == -2.0));
}

#[test]
fn interleaved_file_split_into_channels() {
    let bytes: Vec<u8> = [0i16, 8192, 16384, -8192, -16384, 32767]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();

    let mut graph = Graph::new(48_000);
    let file = graph.add(pcm_source(std::io::Cursor::new(bytes), 6));
    let deint = graph.add(Deinterleaver::new(file.output(), 2));
    let left = deint.output_at(0).unwrap();
    let right = deint.output_at(1).unwrap();

    assert_eq!(right.pull_vec(), vec![0.25, -0.25, 32767.0 / 32768.0]);
    assert_eq!(left.pull_vec(), vec![0.0, 0.5, -0.5]);
    assert_eq!(file.pull_count(), 1);

    // exhausted file: empty blocks from here on
    assert!(left.pull_vec().is_empty());
}

#[test]
fn strided_views_match_deinterleaver() {
    let data: Rc<[Sample]> = (0..12).map(|x| x as Sample).collect();

    let mut graph = Graph::new(48_000);
    let raw = graph.add(Converter::new(Chunks::new(data.to_vec(), 12), |x: Sample| x));
    let deint = graph.add(Deinterleaver::new(raw.output(), 3));

    for channel in 0..3 {
        let view = graph.add(Strided::new(Rc::clone(&data), channel, 3).with_block_size(4));
        assert_eq!(
            view.output().pull_vec(),
            deint.output_at(channel).unwrap().pull_vec()
        );
    }
}

#[test]
fn runtime_messages_reach_nodes_mid_stream() {
    let mut graph = Graph::new(48_000);
    let mut sine = graph.add(Sine::new(440.0).with_block_size(64));
    let mut offset = graph.add(Offset::new(sine.output(), 0.0));
    let out = offset.output();

    sine.send(SineMessage::SetAmplitude(0.0)).unwrap();
    offset
        .send(klangstrom::nodes::OffsetMessage::SetOffset(0.5))
        .unwrap();
    assert!(out.pull_vec().iter().all(|&s| s == 0.5));
}

#[test]
fn engine_renders_stereo_offline() {
    let mut engine = Engine::new(48_000);
    let counter = engine.add(Counter::new(0).with_block_size(4));
    let scaled = engine.add(Gain::new(counter.output(), 0.125));
    let split = engine.add(Splitter::new(scaled.output(), 2));
    let outs = split.outputs();
    let right = engine.add(Gain::new(outs[1].clone(), -1.0));

    let (device, mut consumer) = RtrbDevice::new(PlaybackConfig::stereo()).unwrap();
    engine.add_sink(StereoSink::new(outs[0].clone(), right.output(), device).unwrap());

    assert_eq!(engine.run_blocks(2), 2);
    assert_eq!(counter.pull_count(), 2);

    let out = drain(&mut consumer);
    let expected: Vec<Sample> = (0..8)
        .flat_map(|x| [x as Sample * 0.125, -(x as Sample) * 0.125])
        .collect();
    assert_eq!(out, expected);
    assert!(engine.finish().is_ok());
}

#[test]
fn engine_stops_when_the_file_ends() {
    let bytes: Vec<u8> = (0..10i16).flat_map(|s| (s * 1000).to_le_bytes()).collect();

    let mut engine = Engine::new(48_000);
    let file = engine.add(pcm_source(std::io::Cursor::new(bytes), 4));
    let (device, mut consumer) = RtrbDevice::new(PlaybackConfig::mono()).unwrap();
    engine.add_sink(MonoSink::new(file.output(), device).unwrap());

    let stop = AtomicBool::new(false);
    // 4 + 4 + 2 samples, then an empty block
    assert_eq!(engine.run_until(&stop), 3);
    assert_eq!(drain(&mut consumer).len(), 10);
}
