//! Incremental window statistics for the two-pointer sweep.
//!
//! Each structure is fed candles as the right edge advances and told to
//! forget them as the left edge advances, so a full pass over a series costs
//! amortised O(1) per candle. Nothing is kept as a running difference: the
//! extremes live in monotonic deques and the moments are re-merged from
//! exact per-candle values.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

/// Sliding maximum or minimum backed by a monotonic deque of `(index, value)`.
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    kind: Extreme,
    entries: VecDeque<(usize, f64)>,
}

impl RollingExtreme {
    pub fn new(kind: Extreme) -> Self {
        Self {
            kind,
            entries: VecDeque::new(),
        }
    }

    /// Adds the value at `index`. Indices must be pushed in increasing order.
    pub fn push(&mut self, index: usize, value: f64) {
        while let Some(&(_, back)) = self.entries.back() {
            let dominated = match self.kind {
                Extreme::Max => back <= value,
                Extreme::Min => back >= value,
            };
            if !dominated {
                break;
            }
            self.entries.pop_back();
        }
        self.entries.push_back((index, value));
    }

    /// Drops every entry whose index is below `left`.
    pub fn evict_before(&mut self, left: usize) {
        while self.entries.front().is_some_and(|&(index, _)| index < left) {
            self.entries.pop_front();
        }
    }

    pub fn current(&self) -> Option<f64> {
        self.entries.front().map(|&(_, value)| value)
    }
}

/// Count, mean, sum of squared deviations (M2) and volume total of a run of
/// consecutive candles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    count: usize,
    mean: f64,
    m2: f64,
    volume_sum: f64,
}

impl Moments {
    pub fn single(close: f64, volume: f64) -> Self {
        Self {
            count: 1,
            mean: close,
            m2: 0.0,
            volume_sum: volume,
        }
    }

    /// Combines two adjacent runs, `self` being the older one.
    ///
    /// Pairwise update of mean and M2, so nothing is ever subtracted back out
    /// and equal closes merge to an exact zero spread.
    pub fn merge(self, newer: Self) -> Self {
        if self.count == 0 {
            return newer;
        }
        if newer.count == 0 {
            return self;
        }
        let count = self.count + newer.count;
        let (older_n, newer_n, n) = (self.count as f64, newer.count as f64, count as f64);
        let delta = newer.mean - self.mean;
        Self {
            count,
            mean: self.mean + delta * newer_n / n,
            m2: self.m2 + newer.m2 + delta * delta * older_n * newer_n / n,
            volume_sum: self.volume_sum + newer.volume_sum,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Population standard deviation of closes; zero for fewer than two.
    pub fn close_std(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / self.count as f64).sqrt()
    }

    pub fn average_volume(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.volume_sum / self.count as f64
    }
}

/// FIFO of candle moments answering "moments of everything queued" in
/// amortised O(1).
///
/// Two stacks: `back` takes pushes and keeps a running total, `front` serves
/// pops and stores, per entry, the aggregate of that entry and every newer one
/// still in `front`. When `front` runs dry the whole of `back` is moved over
/// once, so each candle is merged a constant number of times.
#[derive(Debug, Clone, Default)]
pub struct RollingMoments {
    front: Vec<Moments>,
    back: Vec<Moments>,
    back_total: Moments,
}

impl RollingMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, close: f64, volume: f64) {
        let entry = Moments::single(close, volume);
        self.back.push(entry);
        self.back_total = self.back_total.merge(entry);
    }

    /// Forgets the oldest candle. No-op when empty.
    pub fn pop_front(&mut self) {
        if self.front.is_empty() {
            let mut newer = Moments::default();
            while let Some(entry) = self.back.pop() {
                newer = entry.merge(newer);
                self.front.push(newer);
            }
            self.back_total = Moments::default();
        }
        self.front.pop();
    }

    pub fn count(&self) -> usize {
        self.front.len() + self.back.len()
    }

    /// Moments of every queued candle, oldest first.
    pub fn total(&self) -> Moments {
        self.front
            .last()
            .copied()
            .unwrap_or_default()
            .merge(self.back_total)
    }
}
