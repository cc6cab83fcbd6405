//! Resource snapshots and their declared shapes.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shopgate_core::{CustomerId, ShopId, TenantId, TenantScoped, UserId};

use crate::error::PolicyError;
use crate::lifecycle::Status;
use crate::roles::Role;
use crate::scope::ShopSet;

/// Resource types known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tenant,
    Staff,
    Order,
    Payment,
    ReturnRequest,
    PayrollPeriod,
    PayRun,
    Payslip,
    Timesheet,
    WageAdvance,
    FundRequest,
    PurchaseOrder,
    SupplierConnection,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Tenant,
        ResourceKind::Staff,
        ResourceKind::Order,
        ResourceKind::Payment,
        ResourceKind::ReturnRequest,
        ResourceKind::PayrollPeriod,
        ResourceKind::PayRun,
        ResourceKind::Payslip,
        ResourceKind::Timesheet,
        ResourceKind::WageAdvance,
        ResourceKind::FundRequest,
        ResourceKind::PurchaseOrder,
        ResourceKind::SupplierConnection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Tenant => "tenant",
            ResourceKind::Staff => "staff",
            ResourceKind::Order => "order",
            ResourceKind::Payment => "payment",
            ResourceKind::ReturnRequest => "return_request",
            ResourceKind::PayrollPeriod => "payroll_period",
            ResourceKind::PayRun => "pay_run",
            ResourceKind::Payslip => "payslip",
            ResourceKind::Timesheet => "timesheet",
            ResourceKind::WageAdvance => "wage_advance",
            ResourceKind::FundRequest => "fund_request",
            ResourceKind::PurchaseOrder => "purchase_order",
            ResourceKind::SupplierConnection => "supplier_connection",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownResourceKind(s.to_string()))
    }
}

/// Optional snapshot fields a resource kind may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Shops,
    Owner,
    OwnerRole,
    Customer,
    Counterparty,
    Status,
    BalanceSettled,
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Field::Shops => "shops",
            Field::Owner => "owner",
            Field::OwnerRole => "owner_role",
            Field::Customer => "customer",
            Field::Counterparty => "counterparty_tenant_id",
            Field::Status => "status",
            Field::BalanceSettled => "balance_settled",
        };
        f.write_str(name)
    }
}

/// Fields a resource kind declares at registration.
///
/// Required fields must be present on every snapshot of the kind; optional
/// fields may be absent, and predicates reading them treat absence as "not
/// the actor's" / "not bound".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceShape {
    required: BTreeSet<Field>,
    optional: BTreeSet<Field>,
}

impl ResourceShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requires(mut self, field: Field) -> Self {
        self.optional.remove(&field);
        self.required.insert(field);
        self
    }

    pub fn optional(mut self, field: Field) -> Self {
        if !self.required.contains(&field) {
            self.optional.insert(field);
        }
        self
    }

    pub fn declares(&self, field: Field) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    pub fn is_required(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    pub fn required(&self) -> impl Iterator<Item = Field> + '_ {
        self.required.iter().copied()
    }

    /// Whether the kind has a lifecycle dimension.
    pub fn has_status(&self) -> bool {
        self.declares(Field::Status)
    }
}

/// Snapshot of a resource, assembled by the caller for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub kind: ResourceKind,
    pub tenant_id: TenantId,
    /// Shops the resource is tied to (directly or through its parent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shops: Option<ShopSet>,
    /// The user the resource belongs to (requester, preparer, employee, or
    /// the staff member a staff record describes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    /// Role of `owner`, for seniority comparisons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerId>,
    /// The other tenant of a two-party resource (the supplier side).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_tenant_id: Option<TenantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Whether an outstanding balance (e.g. advance repayment) is fully settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_settled: Option<bool>,
}

impl ResourceSnapshot {
    pub fn new(kind: ResourceKind, tenant_id: TenantId) -> Self {
        Self {
            kind,
            tenant_id,
            shops: None,
            owner: None,
            owner_role: None,
            customer: None,
            counterparty_tenant_id: None,
            status: None,
            balance_settled: None,
        }
    }

    pub fn with_shop(self, shop: ShopId) -> Self {
        self.with_shops(ShopSet::single(shop))
    }

    pub fn with_shops(mut self, shops: ShopSet) -> Self {
        self.shops = Some(shops);
        self
    }

    pub fn with_owner(mut self, owner: UserId, role: Role) -> Self {
        self.owner = Some(owner);
        self.owner_role = Some(role);
        self
    }

    pub fn with_owner_id(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_counterparty(mut self, tenant_id: TenantId) -> Self {
        self.counterparty_tenant_id = Some(tenant_id);
        self
    }

    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_balance_settled(mut self, settled: bool) -> Self {
        self.balance_settled = Some(settled);
        self
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Shops => self.shops.is_some(),
            Field::Owner => self.owner.is_some(),
            Field::OwnerRole => self.owner_role.is_some(),
            Field::Customer => self.customer.is_some(),
            Field::Counterparty => self.counterparty_tenant_id.is_some(),
            Field::Status => self.status.is_some(),
            Field::BalanceSettled => self.balance_settled.is_some(),
        }
    }

    /// Check that every field `shape` requires is present.
    pub fn conforms_to(&self, shape: &ResourceShape) -> Result<(), PolicyError> {
        match shape.required().find(|field| !self.has(*field)) {
            Some(field) => Err(PolicyError::MissingField {
                kind: self.kind,
                field,
            }),
            None => Ok(()),
        }
    }
}

impl TenantScoped for ResourceSnapshot {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
