//! # Threshold Arithmetic
//!
//! `met <=> signed * 10000 >= total * bips`. Both products are taken in
//! `U256`, so `u128` weights never overflow and nothing is rounded.

use crate::domain::errors::{ConsensusError, ConsensusResult};
use primitive_types::U256;
use shared_types::BIPS_DENOMINATOR;

/// A validated basis-point threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    bips: u16,
}

impl Threshold {
    pub fn new(bips: u16) -> ConsensusResult<Self> {
        if bips == 0 || bips > BIPS_DENOMINATOR {
            return Err(ConsensusError::InvalidThreshold(bips));
        }
        Ok(Self { bips })
    }

    pub fn bips(&self) -> u16 {
        self.bips
    }

    pub fn is_met(&self, signed_weight: u128, total_weight: u128) -> bool {
        U256::from(signed_weight) * U256::from(BIPS_DENOMINATOR)
            >= U256::from(total_weight) * U256::from(self.bips)
    }

    /// Smallest signed weight that meets the threshold. Never exceeds
    /// `total_weight`.
    pub fn required_weight(&self, total_weight: u128) -> u128 {
        let numerator = U256::from(total_weight) * U256::from(self.bips);
        let denominator = U256::from(BIPS_DENOMINATOR);
        ((numerator + denominator - U256::one()) / denominator).low_u128()
    }
}
