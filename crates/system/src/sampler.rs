//! Differential sampling of monotonically increasing kernel counters.
//!
//! Snapshots live in an append-only arena addressed by sequence number. A
//! [`Window`] remembers only the sequence number of the oldest snapshot it
//! still needs; the arena drops snapshots nobody needs any more. With
//! irregular polling the window boundary is the first snapshot that is not
//! older than `now - span`, so the covered interval may be longer than the
//! span asked for.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One snapshot of `N` counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<const N: usize> {
    pub time:     Instant,
    pub counters: [u64; N],
}

/// Append-only chain of samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleChain<const N: usize> {
    samples: VecDeque<Sample<N>>,
    /// Sequence number of `samples[0]`.
    base: u64,
}

impl<const N: usize> Default for SampleChain<N> {
    fn default() -> Self {
        Self {
            samples: VecDeque::new(),
            base: 0,
        }
    }
}

impl<const N: usize> SampleChain<N> {
    /// Append a sample and return its sequence number.
    pub fn push(&mut self, sample: Sample<N>) -> u64 {
        self.samples.push_back(sample);
        self.base + self.samples.len() as u64 - 1
    }

    pub fn get(&self, seq: u64) -> Option<&Sample<N>> {
        let offset = seq.checked_sub(self.base)?;
        self.samples.get(usize::try_from(offset).ok()?)
    }

    pub fn newest_seq(&self) -> Option<u64> {
        (!self.samples.is_empty()).then(|| self.base + self.samples.len() as u64 - 1)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Forget every sample older than `seq`. The newest sample is always kept.
    pub fn prune(&mut self, seq: u64) {
        let Some(newest) = self.newest_seq() else {
            return;
        };
        while self.base < seq.min(newest) {
            self.samples.pop_front();
            self.base += 1;
        }
    }
}

/// A lookback window over a [`SampleChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    span:   Duration,
    oldest: Option<u64>,
}

/// Counter increase across one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta<const N: usize> {
    pub counters: [u64; N],
    /// Time actually covered, which may exceed the window span.
    pub elapsed: Duration,
}

impl Window {
    pub fn new(span: Duration) -> Self {
        Self { span, oldest: None }
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    /// Sequence number of the window boundary, once set.
    pub fn oldest(&self) -> Option<u64> {
        self.oldest
    }

    /// Move the boundary forward past samples older than `now - span` and
    /// return the delta between the newest sample and the boundary.
    ///
    /// Returns `None` only for an empty chain. On the first call the
    /// boundary is the chain's first sample, so a chain holding a single
    /// sample yields an all-zero delta.
    pub fn advance<const N: usize>(
        &mut self,
        chain: &SampleChain<N>,
        now: Instant,
    ) -> Option<Delta<N>> {
        let newest_seq = chain.newest_seq()?;
        let mut seq = self.oldest.unwrap_or(chain.base).max(chain.base);

        if let Some(cutoff) = now.checked_sub(self.span) {
            while seq < newest_seq && chain.get(seq).is_some_and(|s| s.time < cutoff) {
                seq += 1;
            }
        }
        self.oldest = Some(seq);

        let (oldest, newest) = (chain.get(seq)?, chain.get(newest_seq)?);
        let mut counters = [0u64; N];
        for (i, slot) in counters.iter_mut().enumerate() {
            // Some counters (iowait) may step backwards; clamp at zero.
            *slot = newest.counters[i].saturating_sub(oldest.counters[i]);
        }

        Some(Delta {
            counters,
            elapsed: newest.time.saturating_duration_since(oldest.time),
        })
    }
}

/// A sample chain with a single window, the common case for one widget.
#[derive(Debug, Clone)]
pub struct Sampler<const N: usize> {
    chain:  SampleChain<N>,
    window: Window,
}

impl<const N: usize> Sampler<N> {
    pub fn new(span: Duration) -> Self {
        Self {
            chain: SampleChain::default(),
            window: Window::new(span),
        }
    }

    /// Record a snapshot taken at `time` and return the delta across the
    /// window ending at it.
    pub fn observe(&mut self, time: Instant, counters: [u64; N]) -> Delta<N> {
        self.chain.push(Sample { time, counters });
        let delta = self.window.advance(&self.chain, time).unwrap_or(Delta {
            counters: [0; N],
            elapsed: Duration::ZERO,
        });
        if let Some(oldest) = self.window.oldest() {
            self.chain.prune(oldest);
        }
        delta
    }

    /// Number of samples currently retained.
    pub fn retained(&self) -> usize {
        self.chain.len()
    }
}
