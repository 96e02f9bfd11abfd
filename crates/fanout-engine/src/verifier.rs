//! Output verification against an expected-value function

use fanout_interfaces::Element;
use fanout_types::{
    Mismatch, SamplingPolicy, VerificationConfig, VerificationResult,
    DEFAULT_MAX_REPORTED_MISMATCHES, DEFAULT_TOLERANCE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Compares a gathered output with the value every index should hold
#[derive(Debug, Clone)]
pub struct Verifier {
    policy: SamplingPolicy,
    tolerance: f64,
    max_reported: usize,
    seed: Option<u64>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(SamplingPolicy::default())
    }
}

impl Verifier {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self {
            policy,
            tolerance: DEFAULT_TOLERANCE,
            max_reported: DEFAULT_MAX_REPORTED_MISMATCHES,
            seed: None,
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self {
            policy: config.sampling_policy(),
            tolerance: config.tolerance,
            max_reported: config.max_reported,
            seed: config.seed,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Check `output` against `expected`.
    ///
    /// The full policy checks every index. The sampled policy draws indices
    /// uniformly with replacement, so `checked` counts draws, not distinct
    /// indices.
    pub fn verify<T, F>(&self, output: &[T], expected: F) -> VerificationResult<T>
    where
        T: Element,
        F: Fn(usize) -> T,
    {
        let mut result = VerificationResult {
            policy: self.policy,
            checked: 0,
            mismatch_count: 0,
            first_mismatches: Vec::new(),
        };
        if output.is_empty() {
            return result;
        }

        match self.policy {
            SamplingPolicy::Full => {
                for (index, &actual) in output.iter().enumerate() {
                    self.check(&mut result, index, actual, expected(index));
                }
            }
            SamplingPolicy::Sampled { samples } => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                for _ in 0..samples {
                    let index = rng.gen_range(0..output.len());
                    self.check(&mut result, index, output[index], expected(index));
                }
            }
        }

        if result.passed() {
            debug!(policy = %self.policy, checked = result.checked, "verification passed");
        } else {
            warn!(
                policy = %self.policy,
                checked = result.checked,
                mismatches = result.mismatch_count,
                "verification failed"
            );
        }
        result
    }

    fn check<T: Element>(
        &self,
        result: &mut VerificationResult<T>,
        index: usize,
        actual: T,
        expected: T,
    ) {
        result.checked += 1;
        if actual.same_value(expected, self.tolerance) {
            return;
        }
        result.mismatch_count += 1;
        if result.first_mismatches.len() < self.max_reported {
            result.first_mismatches.push(Mismatch {
                index,
                expected,
                actual,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_checks_every_index() {
        let output: Vec<i32> = (0..100).map(|i| i * 2).collect();
        let result = Verifier::new(SamplingPolicy::Full).verify(&output, |i| i as i32 * 2);
        assert!(result.passed());
        assert_eq!(result.checked, 100);
    }

    #[test]
    fn test_mismatches_are_bounded() {
        let output = vec![0i32; 50];
        let result = Verifier::new(SamplingPolicy::Full).verify(&output, |_| 1);
        assert_eq!(result.mismatch_count, 50);
        assert_eq!(result.first_mismatches.len(), DEFAULT_MAX_REPORTED_MISMATCHES);
        assert_eq!(result.first_mismatches[0].index, 0);
        assert_eq!(result.mismatch_rate(), 100.0);
    }

    #[test]
    fn test_sampled_is_reproducible_with_seed() {
        let mut output: Vec<i32> = (0..1000).collect();
        output[500..].iter_mut().for_each(|v| *v = -1);
        let verifier = Verifier::new(SamplingPolicy::Sampled { samples: 64 }).with_seed(7);

        let a = verifier.verify(&output, |i| i as i32);
        let b = verifier.verify(&output, |i| i as i32);
        assert_eq!(a.checked, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_output_checks_nothing() {
        let result = Verifier::default().verify::<f32, _>(&[], |_| 1.0);
        assert_eq!(result.checked, 0);
        assert!(result.passed());
        assert_eq!(result.mismatch_rate(), 0.0);
    }

    #[test]
    fn test_float_tolerance() {
        let output = vec![1.00005f32, 1.01];
        let result = Verifier::new(SamplingPolicy::Full).verify(&output, |_| 1.0f32);
        assert_eq!(result.mismatch_count, 1);
        assert_eq!(result.first_mismatches[0].index, 1);
    }
}
