//! # Settlement Engine
//!
//! Orchestrates every ticket operation as ONE database transaction.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── 0. claim ticket (status-guarded UPDATE, version + 1)            │
//! │    │      FINISHED/CANCELLED → InvalidState                            │
//! │    ├── 1. aggregate.finalize(payments) → commission drafts             │
//! │    │      no items / non-positive payment → InvalidArgument            │
//! │    ├── 2. per PRODUCT item: conditional stock decrement                │
//! │    │      short → InsufficientStock, everything rolls back             │
//! │    ├── 3. write ticket: FINISHED, payment summary                      │
//! │    ├── 4. one income FinancialTransaction (net value)                  │
//! │    └── 5. one Commission per eligible item                             │
//! │  COMMIT                                                                 │
//! │    │                                                                    │
//! │    └── 6. warn! for products at or below minimum stock                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `?` before `commit()` drops the transaction, which rolls it back:
//! no ledger ever sees a partial settlement.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::cashback::{self, CashbackRepository};
use crate::repository::catalog;
use crate::repository::commission;
use crate::repository::financial;
use crate::repository::stock;
use crate::repository::ticket::{self, TicketFilter, TicketRepository};
use tally_core::{
    CashbackBalance, CashbackTransaction, Commission, FinancialOrigin, FinancialStatus,
    FinancialTransaction, FinancialType, ItemInput, ItemType, Money, PaymentLine, Receipt, Ticket,
    TicketAggregate,
};

/// Input of OpenTicket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub client_id: String,
    pub professional_id: Option<String>,
    pub notes: Option<String>,
}

/// Result of ApplyCashback.
#[derive(Debug, Clone, Serialize)]
pub struct CashbackOutcome {
    pub ticket: TicketAggregate,
    pub requested_cents: i64,
    pub applied_cents: i64,
    pub transaction: CashbackTransaction,
}

/// Result of Finalize: the receipt plus every ledger row it created.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub receipt: Receipt,
    pub ticket: TicketAggregate,
    pub financial_transaction: FinancialTransaction,
    pub commissions: Vec<Commission>,
}

/// Ticket operations over a connection pool.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    pool: SqlitePool,
}

impl SettlementEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SettlementEngine { pool }
    }

    // =========================================================================
    // Ticket lifecycle
    // =========================================================================

    /// Opens a ticket for a client of the company.
    ///
    /// The number sequence is bumped first so the transaction holds the
    /// write lock before reading; a missing client rolls the bump back.
    pub async fn open_ticket(&self, company_id: &str, request: NewTicket) -> DbResult<TicketAggregate> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let number = ticket::next_number(&mut tx, company_id, now.date_naive()).await?;
        let client = catalog::get_client(&mut tx, company_id, &request.client_id).await?;

        let opened = Ticket::open(
            company_id,
            client.id,
            request.professional_id,
            number,
            request.notes.as_deref(),
            now,
        )?;
        ticket::insert(&mut tx, &opened).await?;

        tx.commit().await?;

        info!(
            id = %opened.id,
            number = %opened.number,
            %company_id,
            client_id = %opened.client_id,
            "Ticket opened"
        );
        Ok(TicketAggregate::new(opened, Vec::new()))
    }

    /// Adds a line item priced from the catalog.
    pub async fn add_item(
        &self,
        company_id: &str,
        ticket_id: &str,
        input: ItemInput,
    ) -> DbResult<TicketAggregate> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        let entry =
            catalog::get_entry(&mut tx, company_id, input.item_type, &input.reference_id).await?;

        let item = aggregate.add_item(&input, &entry, now)?.clone();
        ticket::insert_item(&mut tx, &item).await?;
        ticket::update(&mut tx, &aggregate.ticket).await?;

        tx.commit().await?;

        debug!(
            %ticket_id,
            item_id = %item.id,
            item_type = item.item_type.as_str(),
            total = %aggregate.ticket.total_value(),
            "Item added"
        );
        Ok(aggregate)
    }

    /// Removes a line item.
    pub async fn remove_item(
        &self,
        company_id: &str,
        ticket_id: &str,
        item_id: &str,
    ) -> DbResult<TicketAggregate> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        let removed = aggregate.remove_item(item_id, now)?;
        ticket::delete_item(&mut tx, ticket_id, &removed.id).await?;
        ticket::update(&mut tx, &aggregate.ticket).await?;

        tx.commit().await?;

        debug!(%ticket_id, %item_id, total = %aggregate.ticket.total_value(), "Item removed");
        Ok(aggregate)
    }

    /// Sets the manual discount of a ticket.
    pub async fn apply_discount(
        &self,
        company_id: &str,
        ticket_id: &str,
        discount: Money,
    ) -> DbResult<TicketAggregate> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        aggregate.apply_discount(discount, now)?;
        ticket::update(&mut tx, &aggregate.ticket).await?;

        tx.commit().await?;

        debug!(%ticket_id, discount = %discount, net = %aggregate.ticket.net_value(), "Discount applied");
        Ok(aggregate)
    }

    /// Spends client cashback on the ticket.
    ///
    /// Applied amount is `min(amount, balance, net)`; the balance debit,
    /// its log entry and the ticket discount commit together.
    pub async fn apply_cashback(
        &self,
        company_id: &str,
        ticket_id: &str,
        amount: Money,
    ) -> DbResult<CashbackOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        let balance =
            cashback::get_or_create_balance(&mut tx, company_id, &aggregate.ticket.client_id)
                .await?;

        let plan = aggregate.plan_cashback(amount, balance.balance())?;
        let transaction =
            cashback::debit(&mut tx, company_id, &balance.id, plan.applied, Some(ticket_id)).await?;
        aggregate.apply_cashback(&plan, now)?;
        ticket::update(&mut tx, &aggregate.ticket).await?;

        tx.commit().await?;

        info!(
            %ticket_id,
            requested = %plan.requested,
            applied = %plan.applied,
            balance_after = %Money::from_cents(transaction.balance_after_cents),
            "Cashback applied"
        );
        Ok(CashbackOutcome {
            ticket: aggregate,
            requested_cents: plan.requested.cents(),
            applied_cents: plan.applied.cents(),
            transaction,
        })
    }

    /// Settles a ticket. See the module docs for the full flow.
    pub async fn finalize(
        &self,
        company_id: &str,
        ticket_id: &str,
        payments: &[PaymentLine],
    ) -> DbResult<Settlement> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        let drafts = aggregate.finalize(payments, now)?;

        let mut low_stock = Vec::new();
        for item in aggregate
            .items
            .iter()
            .filter(|item| item.item_type == ItemType::Product)
        {
            let entry =
                stock::check_and_decrement(&mut tx, company_id, &item.reference_id, item.quantity)
                    .await?;
            if entry.is_low() {
                low_stock.push(entry);
            }
        }

        ticket::update(&mut tx, &aggregate.ticket).await?;

        let ticket = &aggregate.ticket;
        let financial_transaction = FinancialTransaction {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            transaction_type: FinancialType::Income,
            origin: FinancialOrigin::Ticket,
            ticket_id: Some(ticket.id.clone()),
            client_id: Some(ticket.client_id.clone()),
            description: format!("Ticket {}", ticket.number),
            value_cents: ticket.net_cents,
            date: now.date_naive(),
            status: FinancialStatus::Liquidated,
            payment_method: payments.first().map(|p| p.method),
            created_at: now,
        };
        financial::record(&mut tx, &financial_transaction).await?;

        let commissions =
            commission::insert_drafts(&mut tx, company_id, &ticket.id, &drafts, now).await?;

        tx.commit().await?;

        for entry in &low_stock {
            warn!(
                product_id = %entry.product_id,
                product = %entry.name,
                stock_current = entry.stock_current,
                stock_minimum = entry.stock_minimum,
                "Product at or below minimum stock"
            );
        }

        info!(
            %ticket_id,
            number = %ticket.number,
            net = %ticket.net_value(),
            commissions = commissions.len(),
            payments = %ticket.payment_summary.as_deref().unwrap_or_default(),
            "Ticket finalized"
        );

        let receipt = aggregate.receipt(payments)?;
        Ok(Settlement {
            receipt,
            ticket: aggregate,
            financial_transaction,
            commissions,
        })
    }

    /// Cancels a ticket that is not yet settled. No ledger is touched.
    pub async fn cancel(&self, company_id: &str, ticket_id: &str) -> DbResult<TicketAggregate> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut aggregate = ticket::claim_aggregate(&mut tx, company_id, ticket_id, now).await?;
        aggregate.cancel(now)?;
        ticket::update(&mut tx, &aggregate.ticket).await?;

        tx.commit().await?;

        info!(%ticket_id, number = %aggregate.ticket.number, "Ticket cancelled");
        Ok(aggregate)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_ticket(&self, company_id: &str, ticket_id: &str) -> DbResult<TicketAggregate> {
        TicketRepository::new(self.pool.clone())
            .get(company_id, ticket_id)
            .await
    }

    pub async fn list_tickets(&self, company_id: &str, filter: &TicketFilter) -> DbResult<Vec<Ticket>> {
        TicketRepository::new(self.pool.clone())
            .list(company_id, filter)
            .await
    }

    /// Cashback balance of a client with its latest transactions.
    pub async fn client_cashback(
        &self,
        company_id: &str,
        client_id: &str,
        limit: u32,
    ) -> DbResult<(CashbackBalance, Vec<CashbackTransaction>)> {
        CashbackRepository::new(self.pool.clone())
            .statement(company_id, client_id, limit)
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
