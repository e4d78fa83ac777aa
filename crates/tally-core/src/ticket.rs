//! # Ticket Aggregate
//!
//! A ticket and its line items, mutated only through the methods here so
//! the money invariants always hold:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total    == Σ items.total                                              │
//! │  0 <= discount <= total         (discount = manual + cashback)          │
//! │  net      == total - discount                                           │
//! │  FINISHED / CANCELLED           → no further mutation                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregate performs no I/O. The settlement engine in tally-db loads
//! it inside a transaction, calls one method, and persists the result
//! together with the ledger side effects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::commission::{calculate_commission, CommissionDraft};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage};
use crate::types::{
    CatalogEntry, ItemInput, PaymentLine, Receipt, ReceiptLine, Ticket, TicketItem, TicketStatus,
};
use crate::validation::{
    validate_item_count, validate_notes, validate_percentage, validate_positive_cents,
    validate_quantity, validate_value_cents,
};
use crate::TICKET_NUMBER_PREFIX;

// =============================================================================
// Formatting
// =============================================================================

/// Builds a ticket number: `TICKET-YYYYMMDD-NNNN`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::format_ticket_number;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(format_ticket_number(day, 7), "TICKET-20240309-0007");
/// ```
pub fn format_ticket_number(business_date: NaiveDate, sequence: i64) -> String {
    format!(
        "{}-{}-{:04}",
        TICKET_NUMBER_PREFIX,
        business_date.format("%Y%m%d"),
        sequence
    )
}

/// Renders payments as `"cash: 50.00, card: 30.00"`.
pub fn format_payment_summary(payments: &[PaymentLine]) -> String {
    payments
        .iter()
        .map(|p| format!("{}: {}", p.method, p.value()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn amount_overflow(field: &str) -> CoreError {
    CoreError::rule(field, "amount exceeds the supported range")
}

// =============================================================================
// Ticket
// =============================================================================

impl Ticket {
    /// Creates a new OPEN ticket with zero totals.
    pub fn open(
        company_id: impl Into<String>,
        client_id: impl Into<String>,
        professional_id: Option<String>,
        number: impl Into<String>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<Ticket> {
        Ok(Ticket {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            client_id: client_id.into(),
            professional_id,
            number: number.into(),
            status: TicketStatus::Open,
            notes: validate_notes(notes)?,
            total_cents: 0,
            discount_cents: 0,
            cashback_cents: 0,
            net_cents: 0,
            payment_summary: None,
            payment_received: false,
            version: 0,
            opened_at: now,
            updated_at: now,
            finished_at: None,
            cancelled_at: None,
        })
    }

    /// OPEN and IN_PROGRESS tickets accept mutations.
    #[inline]
    pub fn is_mutable(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn ensure_mutable(&self) -> CoreResult<()> {
        if self.is_mutable() {
            Ok(())
        } else {
            Err(CoreError::invalid_state(&self.id, self.status))
        }
    }
}

// =============================================================================
// Cashback Application
// =============================================================================

/// Outcome of matching a cashback request against balance and net value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashbackApplication {
    pub requested: Money,
    /// min(requested, balance, net)
    pub applied: Money,
}

// =============================================================================
// Aggregate
// =============================================================================

/// A ticket with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketAggregate {
    pub ticket: Ticket,
    pub items: Vec<TicketItem>,
}

impl TicketAggregate {
    pub fn new(ticket: Ticket, items: Vec<TicketItem>) -> Self {
        TicketAggregate { ticket, items }
    }

    /// Checks the money invariants. Holds after every successful mutation.
    pub fn is_balanced(&self) -> bool {
        let Ok(total) = self.items_total() else {
            return false;
        };
        let t = &self.ticket;
        t.total_cents == total.cents()
            && t.discount_cents >= 0
            && t.discount_cents <= t.total_cents
            && t.cashback_cents >= 0
            && t.cashback_cents <= t.discount_cents
            && t.net_cents == t.total_cents - t.discount_cents
    }

    /// Sums the item totals, failing instead of wrapping.
    fn items_total(&self) -> CoreResult<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total_value()))
            .ok_or_else(|| amount_overflow("total"))
    }

    fn recompute(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        let total = self.items_total()?;
        self.ticket.total_cents = total.cents();
        self.ticket.net_cents = self.ticket.total_cents - self.ticket.discount_cents;
        self.ticket.updated_at = now;
        Ok(())
    }

    /// Adds a line item priced from `entry`.
    ///
    /// ## Defaults
    /// - unit value: catalog price
    /// - professional: the ticket's professional
    /// - commission: the entry's default when a professional is set, else 0
    ///
    /// The first item moves an OPEN ticket to IN_PROGRESS.
    pub fn add_item(
        &mut self,
        input: &ItemInput,
        entry: &CatalogEntry,
        now: DateTime<Utc>,
    ) -> CoreResult<&TicketItem> {
        self.ticket.ensure_mutable()?;

        if entry.item_type != input.item_type
            || entry.id != input.reference_id
            || entry.company_id != self.ticket.company_id
        {
            return Err(CoreError::not_found(
                input.item_type.entity_name(),
                &input.reference_id,
            ));
        }

        validate_item_count(self.items.len())?;
        validate_quantity(input.quantity)?;

        let unit_value = match input.unit_value_cents {
            Some(cents) => {
                validate_value_cents("unit value", cents)?;
                Money::from_cents(cents)
            }
            None => entry.price(),
        };

        let professional_id = input
            .professional_id
            .clone()
            .or_else(|| self.ticket.professional_id.clone());

        let commission = match input.commission_bps {
            Some(bps) => validate_percentage("commission percentage", bps)?,
            None if professional_id.is_some() => {
                Percentage::from_bps(entry.default_commission_bps)
            }
            None => Percentage::zero(),
        };

        let line_total = unit_value
            .multiply_quantity(input.quantity)
            .ok_or_else(|| amount_overflow("item total"))?;
        self.items_total()?
            .checked_add(line_total)
            .ok_or_else(|| amount_overflow("total"))?;

        let item = TicketItem {
            id: Uuid::new_v4().to_string(),
            ticket_id: self.ticket.id.clone(),
            company_id: self.ticket.company_id.clone(),
            item_type: input.item_type,
            reference_id: entry.id.clone(),
            name_snapshot: entry.name.clone(),
            professional_id,
            quantity: input.quantity,
            unit_value_cents: unit_value.cents(),
            total_cents: line_total.cents(),
            commission_bps: commission.bps(),
            created_at: now,
        };

        self.items.push(item);
        if self.ticket.status == TicketStatus::Open {
            self.ticket.status = TicketStatus::InProgress;
        }
        self.recompute(now)?;

        Ok(&self.items[self.items.len() - 1])
    }

    /// Removes an item and recomputes totals.
    ///
    /// Rejected when the remaining total would fall below the discount
    /// already applied; the discount has to be reduced first.
    pub fn remove_item(&mut self, item_id: &str, now: DateTime<Utc>) -> CoreResult<TicketItem> {
        self.ticket.ensure_mutable()?;

        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| CoreError::not_found("TicketItem", item_id))?;

        let remaining = self.ticket.total_value() - self.items[index].total_value();
        if self.ticket.discount_value() > remaining {
            return Err(CoreError::rule(
                "item",
                format!(
                    "removing it leaves total {} below discount {}",
                    remaining,
                    self.ticket.discount_value()
                ),
            ));
        }

        let removed = self.items.remove(index);
        self.recompute(now)?;
        Ok(removed)
    }

    /// Sets the manual discount. Cashback already applied is kept on top.
    pub fn apply_discount(&mut self, discount: Money, now: DateTime<Utc>) -> CoreResult<()> {
        self.ticket.ensure_mutable()?;
        validate_value_cents("discount", discount.cents())?;

        let combined = discount
            .checked_add(self.ticket.cashback_value())
            .ok_or_else(|| amount_overflow("discount"))?;
        if combined > self.ticket.total_value() {
            return Err(CoreError::rule(
                "discount",
                format!(
                    "discount {} plus cashback {} exceeds total {}",
                    discount,
                    self.ticket.cashback_value(),
                    self.ticket.total_value()
                ),
            ));
        }

        self.ticket.discount_cents = combined.cents();
        self.recompute(now)
    }

    /// Decides how much of `requested` cashback can be applied.
    ///
    /// ```text
    /// requested 80.00, balance 50.00, net 70.00  →  applied 50.00
    /// requested 10.00, balance 50.00, net  5.00  →  applied  5.00
    /// ```
    pub fn plan_cashback(&self, requested: Money, balance: Money) -> CoreResult<CashbackApplication> {
        self.ticket.ensure_mutable()?;
        validate_positive_cents("cashback amount", requested.cents())?;

        if !balance.is_positive() {
            return Err(CoreError::InsufficientFunds {
                available: balance,
                requested,
            });
        }

        let net = self.ticket.net_value();
        if !net.is_positive() {
            return Err(CoreError::rule("cashback", "ticket has no remaining value to pay"));
        }

        Ok(CashbackApplication {
            requested,
            applied: requested.min(balance).min(net),
        })
    }

    /// Books a planned cashback application as discount.
    pub fn apply_cashback(
        &mut self,
        application: &CashbackApplication,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ticket.ensure_mutable()?;
        if application.applied > self.ticket.net_value() {
            return Err(CoreError::rule("cashback", "exceeds the ticket net value"));
        }

        self.ticket.discount_cents += application.applied.cents();
        self.ticket.cashback_cents += application.applied.cents();
        self.recompute(now)
    }

    /// Settles the ticket and returns the commissions owed.
    ///
    /// Stock and ledger writes happen in the caller's transaction; this
    /// only flips the status and records how the ticket was paid.
    pub fn finalize(
        &mut self,
        payments: &[PaymentLine],
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<CommissionDraft>> {
        self.ticket.ensure_mutable()?;

        if self.items.is_empty() {
            return Err(CoreError::rule("ticket", "cannot finalize a ticket without items"));
        }
        for payment in payments {
            validate_positive_cents("payment value", payment.value_cents)?;
        }

        self.ticket.status = TicketStatus::Finished;
        self.ticket.payment_received = true;
        self.ticket.payment_summary = Some(format_payment_summary(payments));
        self.ticket.finished_at = Some(now);
        self.ticket.updated_at = now;

        Ok(self.items.iter().filter_map(calculate_commission).collect())
    }

    /// Cancels an open ticket. Nothing is reversed: no ledger was touched.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ticket.ensure_mutable()?;
        self.ticket.status = TicketStatus::Cancelled;
        self.ticket.cancelled_at = Some(now);
        self.ticket.updated_at = now;
        Ok(())
    }

    /// Builds the printable receipt of a finished ticket.
    pub fn receipt(&self, payments: &[PaymentLine]) -> CoreResult<Receipt> {
        let finished_at = match (self.ticket.status, self.ticket.finished_at) {
            (TicketStatus::Finished, Some(at)) => at,
            _ => return Err(CoreError::invalid_state(&self.ticket.id, self.ticket.status)),
        };

        Ok(Receipt {
            ticket_id: self.ticket.id.clone(),
            number: self.ticket.number.clone(),
            client_id: self.ticket.client_id.clone(),
            finished_at,
            lines: self
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.name_snapshot.clone(),
                    item_type: item.item_type,
                    quantity: item.quantity,
                    unit_value_cents: item.unit_value_cents,
                    total_cents: item.total_cents,
                })
                .collect(),
            subtotal_cents: self.ticket.total_cents,
            discount_cents: self.ticket.discount_cents,
            cashback_cents: self.ticket.cashback_cents,
            total_cents: self.ticket.net_cents,
            payments: payments.to_vec(),
            payment_summary: self.ticket.payment_summary.clone().unwrap_or_default(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemType, PaymentMethod};
    use crate::ValidationError;

    const COMPANY: &str = "company-1";

    fn open_ticket(professional: Option<&str>) -> TicketAggregate {
        let ticket = Ticket::open(
            COMPANY,
            "client-1",
            professional.map(str::to_string),
            "TICKET-20240101-0001",
            None,
            Utc::now(),
        )
        .unwrap();
        TicketAggregate::new(ticket, Vec::new())
    }

    fn entry(item_type: ItemType, id: &str, name: &str, price: i64, bps: u32) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            company_id: COMPANY.to_string(),
            item_type,
            name: name.to_string(),
            price_cents: price,
            default_commission_bps: bps,
        }
    }

    fn input(item_type: ItemType, id: &str, quantity: i64) -> ItemInput {
        ItemInput {
            item_type,
            reference_id: id.to_string(),
            quantity,
            unit_value_cents: None,
            professional_id: None,
            commission_bps: None,
        }
    }

    fn with_items(total_a: i64, total_b: i64) -> TicketAggregate {
        let mut agg = open_ticket(None);
        let a = entry(ItemType::Service, "svc-a", "Service A", total_a, 0);
        let b = entry(ItemType::Package, "pkg-b", "Package B", total_b, 0);
        agg.add_item(&input(ItemType::Service, "svc-a", 1), &a, Utc::now()).unwrap();
        agg.add_item(&input(ItemType::Package, "pkg-b", 1), &b, Utc::now()).unwrap();
        agg
    }

    #[test]
    fn test_ticket_number_format() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(format_ticket_number(day, 1), "TICKET-20241231-0001");
        assert_eq!(format_ticket_number(day, 12345), "TICKET-20241231-12345");
    }

    #[test]
    fn test_payment_summary_format() {
        let payments = vec![
            PaymentLine::new(PaymentMethod::Cash, Money::from_cents(5000)),
            PaymentLine::new(PaymentMethod::Card, Money::from_cents(3000)),
        ];
        assert_eq!(format_payment_summary(&payments), "cash: 50.00, card: 30.00");
        assert_eq!(format_payment_summary(&[]), "");
    }

    #[test]
    fn test_open_ticket_starts_empty() {
        let agg = open_ticket(None);
        assert_eq!(agg.ticket.status, TicketStatus::Open);
        assert_eq!(agg.ticket.total_cents, 0);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_open_rejects_long_notes() {
        let notes = "n".repeat(501);
        let result = Ticket::open(COMPANY, "c", None, "n", Some(&notes), Utc::now());
        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_add_item_recomputes_and_moves_to_in_progress() {
        let mut agg = open_ticket(None);
        let svc = entry(ItemType::Service, "svc-a", "Service A", 5000, 0);
        let prd = entry(ItemType::Product, "prd-b", "Product B", 2000, 0);

        agg.add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now()).unwrap();
        assert_eq!(agg.ticket.status, TicketStatus::InProgress);

        let item = agg
            .add_item(&input(ItemType::Product, "prd-b", 3), &prd, Utc::now())
            .unwrap();
        assert_eq!(item.total_cents, 6000);
        assert_eq!(item.name_snapshot, "Product B");

        assert_eq!(agg.ticket.total_cents, 11000);
        assert_eq!(agg.ticket.net_cents, 11000);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_add_item_defaults_professional_and_commission() {
        let mut agg = open_ticket(Some("prof-p"));
        let svc = entry(ItemType::Service, "svc-a", "Cut", 10000, 2000);

        let item = agg
            .add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now())
            .unwrap();
        assert_eq!(item.professional_id.as_deref(), Some("prof-p"));
        assert_eq!(item.commission_bps, 2000);
    }

    #[test]
    fn test_add_item_without_professional_has_no_default_commission() {
        let mut agg = open_ticket(None);
        let svc = entry(ItemType::Service, "svc-a", "Cut", 10000, 2000);

        let item = agg
            .add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now())
            .unwrap();
        assert_eq!(item.commission_bps, 0);
    }

    #[test]
    fn test_add_item_overrides() {
        let mut agg = open_ticket(None);
        let svc = entry(ItemType::Service, "svc-a", "Cut", 10000, 2000);
        let mut req = input(ItemType::Service, "svc-a", 2);
        req.unit_value_cents = Some(4500);
        req.professional_id = Some("prof-q".to_string());
        req.commission_bps = Some(1000);

        let item = agg.add_item(&req, &svc, Utc::now()).unwrap();
        assert_eq!(item.total_cents, 9000);
        assert_eq!(item.commission_bps, 1000);
        assert_eq!(item.professional_id.as_deref(), Some("prof-q"));
    }

    #[test]
    fn test_add_item_validation() {
        let mut agg = open_ticket(None);
        let svc = entry(ItemType::Service, "svc-a", "Cut", 1000, 0);

        for qty in [0, -1, 1000] {
            let err = agg
                .add_item(&input(ItemType::Service, "svc-a", qty), &svc, Utc::now())
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidArgument(_)));
        }

        let mut negative = input(ItemType::Service, "svc-a", 1);
        negative.unit_value_cents = Some(-1);
        assert!(agg.add_item(&negative, &svc, Utc::now()).is_err());

        let mut too_much = input(ItemType::Service, "svc-a", 1);
        too_much.commission_bps = Some(10_001);
        assert!(agg.add_item(&too_much, &svc, Utc::now()).is_err());

        assert!(agg.items.is_empty());
        assert_eq!(agg.ticket.status, TicketStatus::Open);
    }

    #[test]
    fn test_add_item_rejects_foreign_catalog_entry() {
        let mut agg = open_ticket(None);
        let mut svc = entry(ItemType::Service, "svc-a", "Cut", 1000, 0);
        svc.company_id = "company-2".to_string();

        let err = agg
            .add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_add_item_rejects_amounts_beyond_range() {
        let mut agg = open_ticket(None);
        let svc = entry(ItemType::Service, "svc-a", "Cut", 1000, 0);

        let mut huge = input(ItemType::Service, "svc-a", 999);
        huge.unit_value_cents = Some(i64::MAX / 10);
        let err = agg.add_item(&huge, &svc, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        // Catalog prices skip the input checks; the multiplication still must not wrap
        let pricey = entry(ItemType::Service, "svc-a", "Cut", i64::MAX / 10, 0);
        let err = agg
            .add_item(&input(ItemType::Service, "svc-a", 999), &pricey, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(agg.items.is_empty());
        assert_eq!(agg.ticket.status, TicketStatus::Open);

        let near_max = entry(ItemType::Service, "svc-a", "Cut", i64::MAX - 10, 0);
        agg.add_item(&input(ItemType::Service, "svc-a", 1), &near_max, Utc::now()).unwrap();
        let small = entry(ItemType::Package, "pkg-b", "Kit", 20, 0);
        let err = agg
            .add_item(&input(ItemType::Package, "pkg-b", 1), &small, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(agg.items.len(), 1);
        assert_eq!(agg.ticket.total_cents, i64::MAX - 10);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_discount_beyond_range_after_cashback() {
        let mut agg = with_items(6000, 4000);
        let plan = agg
            .plan_cashback(Money::from_cents(2000), Money::from_cents(2000))
            .unwrap();
        agg.apply_cashback(&plan, Utc::now()).unwrap();

        let err = agg
            .apply_discount(Money::from_cents(i64::MAX), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(agg.ticket.discount_cents, 2000);
        assert_eq!(agg.ticket.net_cents, 8000);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_remove_item_recomputes() {
        let mut agg = with_items(5000, 3000);
        let id = agg.items[0].id.clone();

        let removed = agg.remove_item(&id, Utc::now()).unwrap();
        assert_eq!(removed.total_cents, 5000);
        assert_eq!(agg.ticket.total_cents, 3000);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut agg = with_items(5000, 3000);
        let err = agg.remove_item("missing", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_remove_item_below_discount_rejected() {
        let mut agg = with_items(5000, 3000);
        agg.apply_discount(Money::from_cents(4000), Utc::now()).unwrap();
        let id = agg.items[0].id.clone();

        let err = agg.remove_item(&id, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(ValidationError::Rule { .. })));
        assert_eq!(agg.items.len(), 2);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_discount_scenario() {
        // total 100, discount 30 → net 70
        let mut agg = with_items(6000, 4000);
        agg.apply_discount(Money::from_cents(3000), Utc::now()).unwrap();
        assert_eq!(agg.ticket.net_cents, 7000);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_discount_bounds() {
        let mut agg = with_items(6000, 4000);
        assert!(agg.apply_discount(Money::from_cents(10001), Utc::now()).is_err());
        assert!(agg.apply_discount(Money::from_cents(-1), Utc::now()).is_err());
        agg.apply_discount(Money::from_cents(10000), Utc::now()).unwrap();
        assert_eq!(agg.ticket.net_cents, 0);
    }

    #[test]
    fn test_cashback_scenario() {
        // total 100, discount 30, cashback 80 on balance 50 → applied 50
        let mut agg = with_items(6000, 4000);
        agg.apply_discount(Money::from_cents(3000), Utc::now()).unwrap();

        let plan = agg
            .plan_cashback(Money::from_cents(8000), Money::from_cents(5000))
            .unwrap();
        assert_eq!(plan.applied.cents(), 5000);

        agg.apply_cashback(&plan, Utc::now()).unwrap();
        assert_eq!(agg.ticket.discount_cents, 8000);
        assert_eq!(agg.ticket.cashback_cents, 5000);
        assert_eq!(agg.ticket.net_cents, 2000);
        assert!(agg.is_balanced());
    }

    #[test]
    fn test_cashback_capped_at_net() {
        let mut agg = with_items(500, 500);
        let plan = agg
            .plan_cashback(Money::from_cents(5000), Money::from_cents(5000))
            .unwrap();
        assert_eq!(plan.applied.cents(), 1000);
    }

    #[test]
    fn test_cashback_errors() {
        let mut agg = with_items(6000, 4000);

        let err = agg
            .plan_cashback(Money::from_cents(1000), Money::zero())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds { .. }));

        let err = agg
            .plan_cashback(Money::zero(), Money::from_cents(1000))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        agg.apply_discount(Money::from_cents(10000), Utc::now()).unwrap();
        let err = agg
            .plan_cashback(Money::from_cents(1000), Money::from_cents(1000))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_discount_keeps_cashback_portion() {
        let mut agg = with_items(6000, 4000);
        let plan = agg
            .plan_cashback(Money::from_cents(2000), Money::from_cents(2000))
            .unwrap();
        agg.apply_cashback(&plan, Utc::now()).unwrap();

        agg.apply_discount(Money::from_cents(1000), Utc::now()).unwrap();
        assert_eq!(agg.ticket.discount_cents, 3000);
        assert_eq!(agg.ticket.manual_discount().cents(), 1000);

        // 8001 manual + 2000 cashback > 10000
        assert!(agg.apply_discount(Money::from_cents(8001), Utc::now()).is_err());
    }

    #[test]
    fn test_finalize_produces_commissions() {
        let mut agg = open_ticket(Some("prof-p"));
        let svc = entry(ItemType::Service, "svc-a", "Cut", 10000, 2000);
        agg.add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now()).unwrap();

        let payments = [PaymentLine::new(PaymentMethod::Cash, Money::from_cents(10000))];
        let drafts = agg.finalize(&payments, Utc::now()).unwrap();

        assert_eq!(agg.ticket.status, TicketStatus::Finished);
        assert!(agg.ticket.payment_received);
        assert_eq!(agg.ticket.payment_summary.as_deref(), Some("cash: 100.00"));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].value.cents(), 2000);
    }

    #[test]
    fn test_finalize_twice_is_invalid_state() {
        let mut agg = with_items(1000, 1000);
        agg.finalize(&[], Utc::now()).unwrap();

        let err = agg.finalize(&[], Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState { status: TicketStatus::Finished, .. }
        ));
    }

    #[test]
    fn test_finalize_rules() {
        let mut empty = open_ticket(None);
        assert!(matches!(
            empty.finalize(&[], Utc::now()),
            Err(CoreError::InvalidArgument(_))
        ));

        let mut agg = with_items(1000, 1000);
        let bad = [PaymentLine::new(PaymentMethod::Pix, Money::zero())];
        assert!(agg.finalize(&bad, Utc::now()).is_err());
        assert_eq!(agg.ticket.status, TicketStatus::InProgress);
    }

    #[test]
    fn test_terminal_tickets_reject_mutation() {
        let mut agg = with_items(1000, 1000);
        agg.cancel(Utc::now()).unwrap();
        assert_eq!(agg.ticket.status, TicketStatus::Cancelled);

        let svc = entry(ItemType::Service, "svc-a", "Cut", 1000, 0);
        assert!(matches!(
            agg.add_item(&input(ItemType::Service, "svc-a", 1), &svc, Utc::now()),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(
            agg.apply_discount(Money::zero(), Utc::now()),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(agg.cancel(Utc::now()), Err(CoreError::InvalidState { .. })));
        assert!(matches!(
            agg.finalize(&[], Utc::now()),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_receipt_only_for_finished() {
        let mut agg = with_items(6000, 4000);
        assert!(agg.receipt(&[]).is_err());

        agg.apply_discount(Money::from_cents(1000), Utc::now()).unwrap();
        let payments = [PaymentLine::new(PaymentMethod::Card, Money::from_cents(9000))];
        agg.finalize(&payments, Utc::now()).unwrap();

        let receipt = agg.receipt(&payments).unwrap();
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].name, "Service A");
        assert_eq!(receipt.subtotal_cents, 10000);
        assert_eq!(receipt.total_cents, 9000);
        assert_eq!(receipt.payment_summary, "card: 90.00");
    }
}
