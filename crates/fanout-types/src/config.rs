//! Run configuration

use crate::devices::BackendKind;
use crate::errors::FanoutError;
use crate::verification::{
    SamplingPolicy, DEFAULT_MAX_REPORTED_MISMATCHES, DEFAULT_TOLERANCE,
    DEFAULT_VERIFICATION_SAMPLES,
};
use serde::{Deserialize, Serialize};

/// Default element count of the vector workloads
pub const DEFAULT_PROBLEM_SIZE: usize = 1 << 20;

/// Configuration of one distributed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Size of the logical problem domain
    pub problem_size: usize,
    /// Number of root devices to use; all discovered devices when unset
    pub device_count: Option<usize>,
    /// Split partitionable devices into sub-devices
    pub split_devices: bool,
    /// Only enumerate platforms of this backend kind
    pub required_backend: Option<BackendKind>,
    /// How the domain is split across contexts
    pub partition_strategy: PartitionStrategy,
    /// Which threads issue dispatches
    pub submission: SubmissionMode,
    /// Number of dispatch rounds over the same buffers
    pub iterations: usize,
    /// Create profiling-enabled contexts
    pub profiling: bool,
    /// What to do when a context cannot be created
    pub context_failure: ContextFailurePolicy,
    /// What to do with launch errors nobody awaited
    pub async_errors: AsyncErrorPolicy,
    /// Output verification settings
    pub verification: VerificationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            problem_size: DEFAULT_PROBLEM_SIZE,
            device_count: None,
            split_devices: true,
            required_backend: None,
            partition_strategy: PartitionStrategy::Flat,
            submission: SubmissionMode::SingleThread,
            iterations: 1,
            profiling: false,
            verification: VerificationConfig::default(),
            context_failure: ContextFailurePolicy::Abort,
            async_errors: AsyncErrorPolicy::Abort,
        }
    }
}

impl RunConfig {
    /// Reject settings no run can honour
    pub fn validate(&self) -> Result<(), FanoutError> {
        if self.iterations == 0 {
            return Err(FanoutError::config("iterations must be at least 1"));
        }
        if self.device_count == Some(0) {
            return Err(FanoutError::config("device_count must be at least 1"));
        }
        self.verification.validate()
    }
}

/// Verification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Check every index or a random sample
    pub policy: VerificationPolicy,
    /// Indices drawn by the sampled policy
    pub samples: usize,
    /// Relative tolerance for floating point outputs
    pub tolerance: f64,
    /// Mismatches recorded in the result
    pub max_reported: usize,
    /// Seed for the sampled policy; random when unset
    pub seed: Option<u64>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            policy: VerificationPolicy::Sampled,
            samples: DEFAULT_VERIFICATION_SAMPLES,
            tolerance: DEFAULT_TOLERANCE,
            max_reported: DEFAULT_MAX_REPORTED_MISMATCHES,
            seed: None,
        }
    }
}

impl VerificationConfig {
    pub fn sampling_policy(&self) -> SamplingPolicy {
        match self.policy {
            VerificationPolicy::Full => SamplingPolicy::Full,
            VerificationPolicy::Sampled => SamplingPolicy::Sampled {
                samples: self.samples,
            },
        }
    }

    pub fn validate(&self) -> Result<(), FanoutError> {
        if self.policy == VerificationPolicy::Sampled && self.samples == 0 {
            return Err(FanoutError::config(
                "verification.samples must be at least 1 for sampled verification",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(FanoutError::config(format!(
                "verification.tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Verification policy as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    Full,
    Sampled,
}

/// How the problem domain is split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// One split across all contexts
    Flat,
    /// Split across root devices, then across each root's sub-devices
    Hierarchical,
}

/// Which threads issue dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// One thread issues every dispatch
    SingleThread,
    /// Each context's dispatches come from its own thread
    ThreadPerContext,
}

/// Reaction to a context that cannot be created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFailurePolicy {
    /// Fail the run with the creation error
    Abort,
    /// Log and continue with fewer contexts
    SkipDevice,
}

/// Reaction to a failed launch that was never awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncErrorPolicy {
    /// Terminate the process
    Abort,
    /// Log the error and keep running
    LogAndContinue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.verification.sampling_policy(),
            SamplingPolicy::Sampled { samples: 2000 }
        );
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let config = RunConfig {
            iterations: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FanoutError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        let mut config = RunConfig::default();
        config.verification.tolerance = 0.0;
        assert!(config.validate().is_err());
        config.verification.tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_full_policy_ignores_sample_count() {
        let mut config = RunConfig::default();
        config.verification.policy = VerificationPolicy::Full;
        config.verification.samples = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.verification.sampling_policy(), SamplingPolicy::Full);
    }
}
