// hertrade/src/lifecycle.rs

//! Order status transitions and who may perform them.
//!
//! ```text
//! pending ──> in_progress ──> ready ──> delivered
//!    │             │            │
//!    └─────────────┴────────────┴──> cancelled
//! ```
//!
//! Every write of a new status is a compare-and-set against the expected current status, so two
//! actors racing on the same order can never both apply a transition.

use crate::models::{Order, OrderStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionActor {
  /// Web "Accept Order" / "Mark as Ready" buttons.
  Supplier,
  SmsRelay,
  Admin,
  /// External delivery integration.
  Delivery,
}

/// Whether `actor` may move an order from `from` to `to`.
pub fn can_transition(actor: TransitionActor, from: OrderStatus, to: OrderStatus) -> bool {
  use OrderStatus::*;
  match actor {
    TransitionActor::Supplier => matches!((from, to), (Pending, InProgress) | (InProgress, Ready)),
    TransitionActor::SmsRelay => matches!((from, to), (Pending, Ready) | (InProgress, Ready)),
    TransitionActor::Admin => to == Cancelled && !from.is_terminal(),
    TransitionActor::Delivery => matches!((from, to), (Ready, Delivered)),
  }
}

/// States from which the SMS relay marks orders ready.
pub fn relay_source_states() -> Vec<OrderStatus> {
  [OrderStatus::Pending, OrderStatus::InProgress]
    .into_iter()
    .filter(|from| can_transition(TransitionActor::SmsRelay, *from, OrderStatus::Ready))
    .collect()
}

/// Result of one compare-and-set write.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
  Applied(Order),
  /// The predicate matched no row: someone else moved the order first. `current` is the status
  /// observed afterwards.
  Stale { current: Option<OrderStatus> },
}

impl TransitionOutcome {
  pub fn is_applied(&self) -> bool {
    matches!(self, TransitionOutcome::Applied(_))
  }
}
