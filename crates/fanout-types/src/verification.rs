//! Verification policy and result types

use serde::{Deserialize, Serialize};

/// Relative tolerance used for floating point comparison
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Number of random coordinates checked by the sampled policy
pub const DEFAULT_VERIFICATION_SAMPLES: usize = 2000;

/// Number of mismatches recorded in a result
pub const DEFAULT_MAX_REPORTED_MISMATCHES: usize = 5;

/// Which indices of an output are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum SamplingPolicy {
    /// Check every index
    Full,
    /// Check `samples` uniformly drawn indices
    Sampled { samples: usize },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::Sampled {
            samples: DEFAULT_VERIFICATION_SAMPLES,
        }
    }
}

impl std::fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingPolicy::Full => write!(f, "full"),
            SamplingPolicy::Sampled { samples } => write!(f, "sampled({})", samples),
        }
    }
}

/// Relative-tolerance equality: `|a-b| / max(|a|,|b|) < tolerance`.
///
/// Bitwise-equal values (including two zeros) always match; NaN never does.
pub fn values_match(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs());
    (a - b).abs() / scale < tolerance
}

/// One checked index whose value differed from the expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch<T> {
    pub index: usize,
    pub expected: T,
    pub actual: T,
}

/// Outcome of comparing an output against an expected-value function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult<T> {
    pub policy: SamplingPolicy,
    /// Number of indices compared
    pub checked: usize,
    /// Number of compared indices that differed
    pub mismatch_count: usize,
    /// The first mismatches encountered, bounded
    pub first_mismatches: Vec<Mismatch<T>>,
}

impl<T> VerificationResult<T> {
    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }

    /// Mismatches as a percentage of the checked indices
    pub fn mismatch_rate(&self) -> f64 {
        if self.checked == 0 {
            0.0
        } else {
            self.mismatch_count as f64 / self.checked as f64 * 100.0
        }
    }
}
