//! # Commission Calculator
//!
//! Turns a settled line item into the amount owed to its professional.
//!
//! ```text
//!   TicketItem { professional: P, total: 100.00, commission: 20% }
//!        │
//!        ▼
//!   calculate_commission()
//!        │
//!        ├── no professional      → None
//!        ├── 0% commission        → None
//!        └── otherwise            → CommissionDraft { base 100.00, value 20.00 }
//! ```
//!
//! Drafts are persisted by the settlement engine during Finalize only.

use serde::{Deserialize, Serialize};

use crate::money::{Money, Percentage};
use crate::types::TicketItem;

/// A commission ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDraft {
    pub ticket_item_id: String,
    pub professional_id: String,
    pub base: Money,
    pub rate: Percentage,
    pub value: Money,
}

/// Computes the commission for one item, if any is owed.
///
/// The base is the item total; the value is rounded half-up to the cent.
pub fn calculate_commission(item: &TicketItem) -> Option<CommissionDraft> {
    let professional_id = item.professional_id.as_deref()?;
    let rate = item.commission_percentage();
    if rate.is_zero() {
        return None;
    }

    let base = item.total_value();
    Some(CommissionDraft {
        ticket_item_id: item.id.clone(),
        professional_id: professional_id.to_string(),
        base,
        rate,
        value: base.percentage(rate),
    })
}
