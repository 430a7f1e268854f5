/// The only thing the simulation knows about sound: "play this sample".
///
/// Decoding and mixing happen elsewhere, usually on a real-time audio
/// thread.  `play_sample` must never block on that thread's progress.
use std::sync::mpsc;

/// Opaque handle to a sample loaded by the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sample(pub u32);

pub trait SampleMixer {
    fn play_sample(&self, sample: Sample);
}

/// Drops every request.  Handy for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentMixer;

impl SampleMixer for SilentMixer {
    fn play_sample(&self, _sample: Sample) {}
}

/// Hands samples to a consumer thread through an unbounded channel.
/// Sending never waits; if the consumer is gone the request is dropped.
#[derive(Clone, Debug)]
pub struct ChannelMixer {
    tx: mpsc::Sender<Sample>,
}

impl ChannelMixer {
    pub fn new() -> (ChannelMixer, mpsc::Receiver<Sample>) {
        let (tx, rx) = mpsc::channel();
        (ChannelMixer { tx }, rx)
    }
}

impl SampleMixer for ChannelMixer {
    fn play_sample(&self, sample: Sample) {
        if self.tx.send(sample).is_err() {
            log::trace!("audio consumer gone, dropping {:?}", sample);
        }
    }
}
