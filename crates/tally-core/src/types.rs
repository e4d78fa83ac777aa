//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Ticket      │   │   TicketItem    │   │   Commission    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  number         │◄──│  ticket_id (FK) │◄──│  ticket_item_id │       │
//! │  │  status         │   │  item_type      │   │  professional   │       │
//! │  │  total / net    │   │  quantity       │   │  value          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockEntry    │   │ CashbackBalance │   │ FinancialTrans. │       │
//! │  │  stock_current  │   │  balance        │   │  income/expense │       │
//! │  │  stock_minimum  │   │  + transactions │   │  value, status  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every persisted type carries `company_id`: all reads and writes are
//! scoped to the caller's company.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Percentage};

// =============================================================================
// Ticket Status
// =============================================================================

/// Lifecycle status of a ticket.
///
/// ```text
/// OPEN ──(first item)──► IN_PROGRESS ──(finalize)──► FINISHED
///   │                        │
///   └────────(cancel)────────┴──────────────────────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Created, no items yet.
    Open,
    /// Items are being added.
    InProgress,
    /// Settled. Terminal.
    Finished,
    /// Abandoned before settlement. Terminal.
    Cancelled,
}

impl TicketStatus {
    /// Storage/display name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Finished => "finished",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// FINISHED and CANCELLED accept no further mutation.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Finished | TicketStatus::Cancelled)
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Open
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Item Type
// =============================================================================

/// Kind of catalog entity a line item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Service,
    Product,
    Package,
}

impl ItemType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemType::Service => "service",
            ItemType::Product => "product",
            ItemType::Package => "package",
        }
    }

    /// Entity name used in NotFound errors.
    pub const fn entity_name(&self) -> &'static str {
        match self {
            ItemType::Service => "Service",
            ItemType::Product => "Product",
            ItemType::Package => "Package",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a ticket was paid.
///
/// ## Boundary Mapping
/// Front-ends and older integrations send several spellings for the same
/// method. [`PaymentMethod::parse`] maps every accepted spelling through one
/// explicit table; anything else is rejected instead of guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
    BankTransfer,
    Voucher,
}

/// Accepted spellings, lowercase, mapped to their method.
const PAYMENT_METHOD_ALIASES: &[(&str, PaymentMethod)] = &[
    ("cash", PaymentMethod::Cash),
    ("card", PaymentMethod::Card),
    ("credit", PaymentMethod::Card),
    ("debit", PaymentMethod::Card),
    ("credit_card", PaymentMethod::Card),
    ("debit_card", PaymentMethod::Card),
    ("pix", PaymentMethod::Pix),
    ("bank_transfer", PaymentMethod::BankTransfer),
    ("transfer", PaymentMethod::BankTransfer),
    ("voucher", PaymentMethod::Voucher),
    ("gift_card", PaymentMethod::Voucher),
];

impl PaymentMethod {
    /// Canonical name, as shown in payment summaries.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Voucher => "voucher",
        }
    }

    /// Parses a method name using the alias table.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::parse("Credit").unwrap(), PaymentMethod::Card);
    /// assert!(PaymentMethod::parse("bitcoin").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
        PAYMENT_METHOD_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, method)| *method)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PAYMENT_METHOD_ALIASES
                    .iter()
                    .map(|(alias, _)| alias.to_string())
                    .collect(),
            })
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tender line submitted with Finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLine {
    pub method: PaymentMethod,
    pub value_cents: i64,
}

impl PaymentLine {
    pub fn new(method: PaymentMethod, value: Money) -> Self {
        PaymentLine {
            method,
            value_cents: value.cents(),
        }
    }

    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// A sales ticket opened for one client visit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ticket {
    pub id: String,
    pub company_id: String,
    pub client_id: String,
    pub professional_id: Option<String>,
    /// Human-readable number, `TICKET-YYYYMMDD-NNNN`.
    pub number: String,
    pub status: TicketStatus,
    pub notes: Option<String>,
    /// Σ items.total.
    pub total_cents: i64,
    /// Manual discount plus cashback.
    pub discount_cents: i64,
    /// Portion of `discount_cents` paid with client cashback.
    pub cashback_cents: i64,
    /// total - discount.
    pub net_cents: i64,
    pub payment_summary: Option<String>,
    pub payment_received: bool,
    /// Bumped on every write; a stale writer sees zero rows updated.
    pub version: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Ticket {
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn discount_value(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn cashback_value(&self) -> Money {
        Money::from_cents(self.cashback_cents)
    }

    /// Discount entered by the operator, excluding cashback.
    #[inline]
    pub fn manual_discount(&self) -> Money {
        self.discount_value() - self.cashback_value()
    }

    #[inline]
    pub fn net_value(&self) -> Money {
        Money::from_cents(self.net_cents)
    }
}

// =============================================================================
// Ticket Item
// =============================================================================

/// A billable line within a ticket.
/// Uses the snapshot pattern: the catalog name is frozen when added.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TicketItem {
    pub id: String,
    pub ticket_id: String,
    pub company_id: String,
    pub item_type: ItemType,
    /// Catalog entity matching `item_type`.
    pub reference_id: String,
    /// Catalog name at time of adding (frozen).
    pub name_snapshot: String,
    pub professional_id: Option<String>,
    pub quantity: i64,
    pub unit_value_cents: i64,
    /// quantity × unit value.
    pub total_cents: i64,
    pub commission_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TicketItem {
    #[inline]
    pub fn unit_value(&self) -> Money {
        Money::from_cents(self.unit_value_cents)
    }

    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn commission_percentage(&self) -> Percentage {
        Percentage::from_bps(self.commission_bps)
    }
}

/// Caller input for AddItem.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemInput {
    pub item_type: ItemType,
    pub reference_id: String,
    pub quantity: i64,
    /// Defaults to the catalog price.
    pub unit_value_cents: Option<i64>,
    /// Defaults to the ticket's professional.
    pub professional_id: Option<String>,
    /// Defaults to the catalog entry's default commission.
    pub commission_bps: Option<u32>,
}

// =============================================================================
// Catalog (external collaborator views)
// =============================================================================

/// A client of the company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub company_id: String,
    pub name: String,
}

/// A sellable catalog entry (service, product or package) as seen by
/// AddItem.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogEntry {
    pub id: String,
    pub company_id: String,
    pub item_type: ItemType,
    pub name: String,
    pub price_cents: i64,
    /// Zero for products and packages.
    pub default_commission_bps: u32,
}

impl CatalogEntry {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Available quantity of one product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    pub product_id: String,
    pub company_id: String,
    pub name: String,
    /// Never negative.
    pub stock_current: i64,
    pub stock_minimum: i64,
}

impl StockEntry {
    /// At or under the restock threshold.
    pub fn is_low(&self) -> bool {
        self.stock_current <= self.stock_minimum
    }
}

// =============================================================================
// Cashback
// =============================================================================

/// A client's redeemable cashback balance. One per (company, client).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashbackBalance {
    pub id: String,
    pub company_id: String,
    pub client_id: String,
    /// Never negative.
    pub balance_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashbackBalance {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashbackDirection {
    Used,
    Earned,
}

/// Append-only cashback log entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashbackTransaction {
    pub id: String,
    pub balance_id: String,
    pub company_id: String,
    pub ticket_id: Option<String>,
    pub direction: CashbackDirection,
    pub amount_cents: i64,
    pub balance_after_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Financial Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FinancialType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FinancialOrigin {
    Ticket,
    Purchase,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Liquidated,
}

/// Append-only accounting entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FinancialTransaction {
    pub id: String,
    pub company_id: String,
    pub transaction_type: FinancialType,
    pub origin: FinancialOrigin,
    pub ticket_id: Option<String>,
    pub client_id: Option<String>,
    pub description: String,
    pub value_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: FinancialStatus,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl FinancialTransaction {
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

// =============================================================================
// Commission
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

/// Amount owed to a professional for one sold item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Commission {
    pub id: String,
    pub company_id: String,
    pub ticket_id: String,
    pub ticket_item_id: String,
    pub professional_id: String,
    pub base_cents: i64,
    pub commission_bps: u32,
    pub commission_cents: i64,
    pub status: CommissionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Commission {
    #[inline]
    pub fn base_value(&self) -> Money {
        Money::from_cents(self.base_cents)
    }

    #[inline]
    pub fn commission_value(&self) -> Money {
        Money::from_cents(self.commission_cents)
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Everything needed to print a settled ticket.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub ticket_id: String,
    pub number: String,
    pub client_id: String,
    #[ts(as = "String")]
    pub finished_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub cashback_cents: i64,
    pub total_cents: i64,
    pub payments: Vec<PaymentLine>,
    pub payment_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub item_type: ItemType,
    pub quantity: i64,
    pub unit_value_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
