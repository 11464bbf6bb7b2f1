//! The matching pass for one incoming order
//!
//! Walks the opposing side in priority order while the incoming order still
//! has quantity and still crosses the best resting price. Each step executes
//! `min(taker.remaining, maker.remaining)` at the maker's price. A maker that
//! is exhausted is popped; a partially filled maker stays at the front with
//! its priority intact. Cost is O(k log n) for k makers consumed.

use std::cmp;

use tracing::{debug, warn};
use types::fill::Fill;
use types::order::Order;

use crate::book::PriceLevelQueue;
use crate::config::SelfTradePolicy;

use super::crossing;
use super::executor::MatchExecutor;

/// Everything one matching pass produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Fills in execution order
    pub fills: Vec<Fill>,
    /// Final state of every resting order the pass touched, in the order touched
    pub maker_updates: Vec<Order>,
    /// Matching stopped because the taker met its own resting order
    pub halted_by_self_trade: bool,
}

impl MatchOutcome {
    /// Resting orders that left the book during the pass
    pub fn resolved_makers(&self) -> impl Iterator<Item = &Order> {
        self.maker_updates.iter().filter(|o| !o.is_active())
    }
}

/// Match `taker` against the opposing side
///
/// The taker's fills are applied in place; resting the remainder is up to
/// the caller.
pub fn match_order(
    taker: &mut Order,
    opposing: &mut PriceLevelQueue,
    executor: &MatchExecutor,
    self_trade_policy: SelfTradePolicy,
    timestamp: i64,
) -> MatchOutcome {
    debug_assert_eq!(opposing.side(), taker.side.opposite());
    let mut outcome = MatchOutcome::default();

    while !taker.remaining_quantity.is_zero() {
        let Some(maker) = opposing.peek_best() else {
            break;
        };
        if !crossing::incoming_can_match(taker.side, taker.price, maker.price) {
            break;
        }

        if maker.account_id == taker.account_id {
            match self_trade_policy {
                SelfTradePolicy::Allow => {}
                SelfTradePolicy::CancelResting => {
                    if let Some(mut resting) = opposing.pop_best() {
                        resting.cancel(timestamp);
                        warn!(
                            order_id = %resting.order_id,
                            taker_id = %taker.order_id,
                            account_id = %taker.account_id,
                            "Self-trade: canceled resting order"
                        );
                        outcome.maker_updates.push(resting);
                    }
                    continue;
                }
                SelfTradePolicy::CancelIncoming => {
                    warn!(
                        taker_id = %taker.order_id,
                        maker_id = %maker.order_id,
                        account_id = %taker.account_id,
                        "Self-trade: halting incoming order"
                    );
                    outcome.halted_by_self_trade = true;
                    break;
                }
            }
        }

        let matched = cmp::min(taker.remaining_quantity, maker.remaining_quantity);
        let fill = executor.execute(maker, taker, matched, timestamp);
        debug!(
            pair = %fill.pair,
            sequence = fill.sequence,
            maker_id = %fill.maker_order_id,
            taker_id = %fill.taker_order_id,
            price = %fill.price,
            quantity = %fill.quantity,
            "Fill executed"
        );
        if fill.is_self_trade() {
            debug!(account_id = %fill.taker_account_id, sequence = fill.sequence, "Self-trade allowed");
        }

        taker.add_fill(matched, timestamp);
        let maker_filled = match opposing.fill_best(matched, timestamp) {
            Some(maker) => maker.is_filled(),
            None => unreachable!("best order vanished during match"),
        };

        if maker_filled {
            if let Some(maker) = opposing.pop_best() {
                outcome.maker_updates.push(maker);
            }
        } else if let Some(maker) = opposing.peek_best() {
            outcome.maker_updates.push(maker.clone());
        }

        outcome.fills.push(fill);
    }

    outcome
}
