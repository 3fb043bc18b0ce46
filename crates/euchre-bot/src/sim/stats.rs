use crate::config::MonteCarloConfig;
use serde::Serialize;

/// Welford running mean and variance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; zero until two values are in.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance() / self.count as f64).sqrt()
    }
}

/// Why sampling for a decision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Best candidate leads the runner-up by more than the confidence band.
    Converged,
    /// Every other candidate was retired.
    Dominated,
    MaxSims,
    SingleCandidate,
}

/// Tracks candidate accumulators across sampling passes and applies the stop rule.
#[derive(Debug, Clone)]
pub struct Controller {
    accumulators: Vec<Accumulator>,
    live: Vec<bool>,
    passes: usize,
    min_sims: usize,
    max_sims: usize,
    stop_margin: f64,
    z: f64,
}

impl Controller {
    pub fn new(candidates: usize, config: &MonteCarloConfig) -> Self {
        Self {
            accumulators: vec![Accumulator::new(); candidates],
            live: vec![true; candidates],
            passes: 0,
            min_sims: config.min_sims,
            max_sims: config.max_sims.max(1),
            stop_margin: config.stop_margin,
            z: config.z,
        }
    }

    /// Indices still being sampled.
    pub fn live(&self) -> Vec<usize> {
        self.live
            .iter()
            .enumerate()
            .filter_map(|(idx, live)| live.then_some(idx))
            .collect()
    }

    pub fn is_live(&self, idx: usize) -> bool {
        self.live.get(idx).copied().unwrap_or(false)
    }

    pub fn record(&mut self, idx: usize, value: f64) {
        if let Some(acc) = self.accumulators.get_mut(idx) {
            acc.push(value);
        }
    }

    pub fn accumulator(&self, idx: usize) -> Option<&Accumulator> {
        self.accumulators.get(idx)
    }

    pub fn accumulators(&self) -> &[Accumulator] {
        &self.accumulators
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Closes one sampling pass: retires dominated candidates and decides whether to stop.
    pub fn end_pass(&mut self) -> Option<StopReason> {
        self.passes += 1;
        let live = self.live();
        if live.len() <= 1 {
            return Some(StopReason::SingleCandidate);
        }

        let warmed_up = live
            .iter()
            .all(|&idx| self.accumulators[idx].count() >= self.min_sims);
        if warmed_up {
            if let Some(best) = self.best_of(&live) {
                let best_mean = self.accumulators[best].mean();
                for &idx in &live {
                    let acc = &self.accumulators[idx];
                    if idx != best
                        && acc.mean() + self.stop_margin + self.z * acc.std_error() < best_mean
                    {
                        self.live[idx] = false;
                    }
                }
            }

            let live = self.live();
            if live.len() == 1 {
                return Some(StopReason::Dominated);
            }
            if let Some((first, second)) = self.top_two(&live) {
                let a = &self.accumulators[first];
                let b = &self.accumulators[second];
                let band = self.stop_margin
                    + self.z * (a.std_error().powi(2) + b.std_error().powi(2)).sqrt();
                if a.mean() - b.mean() > band {
                    return Some(StopReason::Converged);
                }
            }
        }

        if self.passes >= self.max_sims {
            return Some(StopReason::MaxSims);
        }
        None
    }

    /// Highest mean over sampled candidates; ties go to the earliest.
    pub fn best(&self) -> Option<usize> {
        let sampled: Vec<usize> = (0..self.accumulators.len())
            .filter(|&idx| self.accumulators[idx].count() > 0)
            .collect();
        self.best_of(&sampled)
    }

    fn best_of(&self, indices: &[usize]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &idx in indices {
            match best {
                Some(top) if self.accumulators[idx].mean() <= self.accumulators[top].mean() => {}
                _ => best = Some(idx),
            }
        }
        best
    }

    fn top_two(&self, indices: &[usize]) -> Option<(usize, usize)> {
        let first = self.best_of(indices)?;
        let rest: Vec<usize> = indices.iter().copied().filter(|&i| i != first).collect();
        let second = self.best_of(&rest)?;
        Some((first, second))
    }
}
