use crate::core::Operation;
use log::debug;

/// Flat fee schedule, in core asset base units.
///
/// Asset creation is priced by symbol length the way graphene chains do it:
/// short symbols are scarce and cost more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    pub account_create: u64,
    pub asset_create_symbol3: u64,
    pub asset_create_symbol4: u64,
    pub asset_create_long_symbol: u64,
    pub asset_issue: u64,
    pub transfer: u64,
}

impl FeeSchedule {
    /// A schedule that charges nothing
    pub fn free() -> Self {
        Self {
            account_create: 0,
            asset_create_symbol3: 0,
            asset_create_symbol4: 0,
            asset_create_long_symbol: 0,
            asset_issue: 0,
            transfer: 0,
        }
    }

    /// Fee for an operation; balance claims are always free
    pub fn fee_for(&self, operation: &Operation) -> u64 {
        let fee = match operation {
            Operation::BalanceClaim { .. } => 0,
            Operation::AccountCreate { .. } => self.account_create,
            Operation::AssetCreate { symbol, .. } => match symbol.len() {
                0..=3 => self.asset_create_symbol3,
                4 => self.asset_create_symbol4,
                _ => self.asset_create_long_symbol,
            },
            Operation::AssetIssue { .. } => self.asset_issue,
            Operation::Transfer { .. } => self.transfer,
        };
        debug!("Fee for {}: {fee}", operation.name());
        fee
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            account_create: 50_000,
            asset_create_symbol3: 5_000_000,
            asset_create_symbol4: 1_000_000,
            asset_create_long_symbol: 50_000,
            asset_issue: 2_000,
            transfer: 2_000,
        }
    }
}
