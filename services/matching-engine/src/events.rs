//! Event structures for the matching core
//!
//! Records handed to the persistence/notification collaborator once the
//! pair's exclusive section has been released.

use serde::{Deserialize, Serialize};
use types::fill::Fill;
use types::ids::{AccountId, MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

/// Everything the core reports, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    OrderAccepted(OrderAcceptedEvent),
    TradeExecuted(Fill),
    OrderRested(OrderRestedEvent),
    OrderPartiallyFilled(OrderPartiallyFilledEvent),
    OrderFilled(OrderFilledEvent),
    OrderCanceled(OrderCanceledEvent),
}

impl EngineEvent {
    /// Status event describing an order's state after an operation
    ///
    /// A partially filled order still in the book produces
    /// `OrderPartiallyFilled`; an untouched one produces `OrderRested`.
    pub fn for_order(order: &Order, canceled_by: CancelSource) -> Self {
        match order.status {
            OrderStatus::Resting => EngineEvent::OrderRested(OrderRestedEvent::from(order)),
            OrderStatus::PartiallyFilled => EngineEvent::OrderPartiallyFilled(OrderPartiallyFilledEvent {
                order_id: order.order_id,
                pair: order.pair.clone(),
                filled_quantity: order.filled_quantity,
                remaining_quantity: order.remaining_quantity,
            }),
            OrderStatus::Filled => EngineEvent::OrderFilled(OrderFilledEvent {
                order_id: order.order_id,
                pair: order.pair.clone(),
                filled_quantity: order.filled_quantity,
                updated_at: order.updated_at,
            }),
            OrderStatus::Canceled => EngineEvent::OrderCanceled(OrderCanceledEvent {
                order_id: order.order_id,
                pair: order.pair.clone(),
                canceled_by,
                filled_quantity: order.filled_quantity,
                unfilled_quantity: order.remaining_quantity,
                canceled_at: order.updated_at,
            }),
        }
    }

    pub fn event_type_label(&self) -> &'static str {
        match self {
            EngineEvent::OrderAccepted(_) => "OrderAccepted",
            EngineEvent::TradeExecuted(_) => "TradeExecuted",
            EngineEvent::OrderRested(_) => "OrderRested",
            EngineEvent::OrderPartiallyFilled(_) => "OrderPartiallyFilled",
            EngineEvent::OrderFilled(_) => "OrderFilled",
            EngineEvent::OrderCanceled(_) => "OrderCanceled",
        }
    }
}

/// Order admitted to a book under its sequence number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAcceptedEvent {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub pair: MarketId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub accepted_at: i64,
}

impl From<&Order> for OrderAcceptedEvent {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            account_id: order.account_id,
            pair: order.pair.clone(),
            side: order.side,
            price: order.price,
            quantity: order.quantity,
            accepted_at: order.created_at,
        }
    }
}

/// Order sitting in the book untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRestedEvent {
    pub order_id: OrderId,
    pub pair: MarketId,
    pub side: Side,
    pub price: Price,
    pub remaining_quantity: Quantity,
}

impl From<&Order> for OrderRestedEvent {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            pair: order.pair.clone(),
            side: order.side,
            price: order.price,
            remaining_quantity: order.remaining_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPartiallyFilledEvent {
    pub order_id: OrderId,
    pub pair: MarketId,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilledEvent {
    pub order_id: OrderId,
    pub pair: MarketId,
    pub filled_quantity: Quantity,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCanceledEvent {
    pub order_id: OrderId,
    pub pair: MarketId,
    pub canceled_by: CancelSource,
    pub filled_quantity: Quantity,
    pub unfilled_quantity: Quantity,
    pub canceled_at: i64,
}

/// Who canceled the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CancelSource {
    /// Explicit cancellation request
    User,
    /// Self-trade handling inside the matching pass
    System,
}
