//! Tempo estimation for clips that arrive without a BPM.
//!
//! Onset strength is the positive change in short-time energy of the
//! stereo-folded signal. The beat period is the autocorrelation peak of that
//! envelope inside the configured BPM range.

use crate::wav::DecodedAudio;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Estimates at or below this are discarded.
pub const MIN_ACCEPTED_BPM: f32 = 30.0;

const SUBDIVISION_RATIO: f64 = 0.5;

/// Search range and analysis hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoEstimator {
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// Frames per energy block.
    pub hop: usize,
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self {
            min_bpm: 60.0,
            max_bpm: 200.0,
            hop: 512,
        }
    }
}

impl TempoEstimator {
    /// Estimated tempo rounded to a whole BPM, or `None` when the clip is too
    /// short, has no rhythmic content or the result is implausibly slow.
    pub fn estimate(&self, clip: &DecodedAudio) -> Option<f32> {
        if self.hop == 0 || !(self.min_bpm > 0.0 && self.max_bpm > self.min_bpm) {
            return None;
        }
        let envelope = onset_envelope(clip, self.hop);
        let blocks_per_minute = 60.0 * clip.params.sample_rate as f64 / self.hop as f64;

        let min_lag = (blocks_per_minute / self.max_bpm as f64).floor().max(1.0) as usize;
        let max_lag = ((blocks_per_minute / self.min_bpm as f64).ceil() as usize)
            .min(envelope.len() / 2);
        if max_lag <= min_lag {
            debug!(blocks = envelope.len(), "Clip too short for tempo estimation");
            return None;
        }

        // One extra lag on each side for the peak interpolation.
        let lo = min_lag.saturating_sub(1).max(1);
        let hi = (max_lag + 1).min(envelope.len() - 1);
        let corr: Vec<f64> = (lo..=hi).map(|lag| autocorrelation(&envelope, lag)).collect();

        let at = |lag: usize| corr[lag - lo];
        let peak_in = |from: usize, to: usize| {
            (from.max(min_lag)..=to.min(max_lag))
                .map(|lag| (lag, at(lag)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
        };
        let (mut best, peak) = peak_in(min_lag, max_lag)?;
        if peak <= f64::EPSILON {
            return None;
        }

        // A beat repeats at every multiple of its period, so a strong peak
        // at an integer fraction of the winner is the actual beat.
        for divisor in [4usize, 3, 2] {
            let center = (best as f64 / divisor as f64).round() as usize;
            if center < min_lag {
                continue;
            }
            if let Some((lag, value)) = peak_in(center.saturating_sub(1), center + 1) {
                if value >= SUBDIVISION_RATIO * peak {
                    best = lag;
                    break;
                }
            }
        }

        let lag = refine_peak(&corr, best - lo) + lo as f64;
        let bpm = (blocks_per_minute / lag).round() as f32;
        debug!(lag, bpm, "Tempo estimated");
        Some(bpm).filter(|b| b.is_finite() && *b > MIN_ACCEPTED_BPM)
    }
}

/// Estimate with the default range.
pub fn estimate_bpm(clip: &DecodedAudio) -> Option<f32> {
    TempoEstimator::default().estimate(clip)
}

fn onset_envelope(clip: &DecodedAudio, hop: usize) -> Vec<f64> {
    let frames = clip.frames();
    let energies: Vec<f64> = (0..frames / hop)
        .map(|block| {
            let start = block * hop;
            (start..start + hop)
                .map(|frame| {
                    let (l, r) = clip.stereo_frame(frame);
                    let mono = (l + r) as f64 * 0.5;
                    mono * mono
                })
                .sum::<f64>()
                / hop as f64
        })
        .collect();

    let rise: Vec<f64> = std::iter::once(0.0)
        .chain(energies.windows(2).map(|w| (w[1] - w[0]).max(0.0)))
        .collect();

    // Spread each onset over its neighbours so beats that straddle a block
    // boundary still line up at integer lags.
    (0..rise.len())
        .map(|i| {
            let prev = if i > 0 { rise[i - 1] } else { 0.0 };
            let next = rise.get(i + 1).copied().unwrap_or(0.0);
            0.25 * prev + 0.5 * rise[i] + 0.25 * next
        })
        .collect()
}

fn autocorrelation(envelope: &[f64], lag: usize) -> f64 {
    envelope
        .iter()
        .zip(&envelope[lag..])
        .map(|(a, b)| a * b)
        .sum()
}

/// Parabolic interpolation around `corr[i]`.
fn refine_peak(corr: &[f64], i: usize) -> f64 {
    if i == 0 || i + 1 >= corr.len() {
        return i as f64;
    }
    let (a, b, c) = (corr[i - 1], corr[i], corr[i + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() <= f64::EPSILON {
        return i as f64;
    }
    i as f64 + (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
}
