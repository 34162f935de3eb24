use std::num::NonZeroU64;

use crate::{
    error::{Result, VmError},
    page_replacer::ReplacementPolicy,
};

/// Parâmetros de uma simulação. O tamanho vem do header do trace, o resto
/// da linha de comando.
///
/// Só é construída por [`SimConfig::new`], que valida tudo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    num_pages: usize,
    num_frames: usize,
    policy: ReplacementPolicy,
    /// De quantos em quantos acessos os bits de referência são zerados.
    clock_frequency: NonZeroU64,
    /// Semente da política Random. `None` usa entropia do sistema.
    seed: Option<u64>,
}

impl SimConfig {
    pub fn new(
        num_pages: usize,
        num_frames: usize,
        policy: ReplacementPolicy,
        clock_frequency: i64,
    ) -> Result<Self> {
        if num_frames == 0 {
            return Err(VmError::NoFrames);
        }

        Ok(SimConfig {
            num_pages,
            num_frames,
            policy,
            clock_frequency: validate_clock_frequency(clock_frequency)?,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn clock_frequency(&self) -> NonZeroU64 {
        self.clock_frequency
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// A frequência do clock precisa ser positiva.
pub fn validate_clock_frequency(clock_frequency: i64) -> Result<NonZeroU64> {
    u64::try_from(clock_frequency)
        .ok()
        .and_then(NonZeroU64::new)
        .ok_or(VmError::InvalidClockFrequency(clock_frequency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_frames() {
        let err = SimConfig::new(4, 0, ReplacementPolicy::Fifo, 10).unwrap_err();

        assert!(matches!(err, VmError::NoFrames));
        // Problema do trace, não da linha de comando.
        assert!(!err.is_usage_error());
    }

    #[test]
    fn rejects_non_positive_clock_frequency() {
        for freq in [0, -3] {
            let err = SimConfig::new(4, 2, ReplacementPolicy::Fifo, freq).unwrap_err();
            assert!(matches!(err, VmError::InvalidClockFrequency(f) if f == freq));
            assert!(err.is_usage_error());
        }
    }

    #[test]
    fn builds_valid_config() {
        let config = SimConfig::new(8, 4, ReplacementPolicy::Aging, 3)
            .unwrap()
            .with_seed(Some(7));

        assert_eq!(config.num_pages(), 8);
        assert_eq!(config.num_frames(), 4);
        assert_eq!(config.clock_frequency().get(), 3);
        assert_eq!(config.seed(), Some(7));
        assert_eq!(config.policy(), ReplacementPolicy::Aging);
    }
}
