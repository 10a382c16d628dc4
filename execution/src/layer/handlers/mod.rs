use super::*;

mod betting;
mod ledger;
mod market;
mod odds;
mod settlement;
mod treasury;

/// States in which stakes can be paid out or refunded.
const SETTLEABLE: &[MarketState] = &[MarketState::Resolved, MarketState::Cancelled];
