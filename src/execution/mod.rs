pub mod decision_engine;
pub mod revshare;
pub mod treasury;

pub use decision_engine::{decide, DecisionSource, MarketDecisionEngine};
pub use revshare::{plan_payouts, RevShareConfig, RevShareDistributor, RevShareReport};
pub use treasury::{split_fees, CycleReport, SpendOutcome, TreasuryAllocator};
