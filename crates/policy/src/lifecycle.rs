//! Per-resource status tables.
//!
//! A table maps each status of a resource kind to the abstract transitions
//! reachable from it. The tables say nothing about who the actor is, with one
//! exception: *override* transitions (`regenerate`, `reopen`) are reachable
//! only for the top role, and the evaluator enforces that.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use shopgate_core::{DomainError, DomainResult};

use crate::error::{ConfigError, PolicyError};
use crate::resource::ResourceKind;

/// Status of a resource. The vocabulary is per kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(Cow<'static, str>);

impl Status {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse a status received from an upstream record.
    pub fn parse(name: &str) -> DomainResult<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("status cannot be empty"));
        }
        Ok(Self(Cow::Owned(trimmed.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Status {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

/// Abstract transitions. Which ones apply, and from where, is per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Calculate,
    Submit,
    Approve,
    Reject,
    Complete,
    Cancel,
    Regenerate,
    Update,
    Delete,
    Disburse,
    RecordRepayment,
    Review,
    Process,
    Reprocess,
    MarkPaid,
    Reopen,
    Confirm,
    RecordPayment,
    Refund,
    Ship,
    Receive,
    PlaceOrder,
    Disconnect,
}

impl Transition {
    /// Settlement transitions record against a terminal resource without
    /// moving its status (repayments against a disbursed advance).
    pub fn is_settlement(&self) -> bool {
        matches!(self, Transition::RecordRepayment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Calculate => "calculate",
            Transition::Submit => "submit",
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
            Transition::Regenerate => "regenerate",
            Transition::Update => "update",
            Transition::Delete => "delete",
            Transition::Disburse => "disburse",
            Transition::RecordRepayment => "record_repayment",
            Transition::Review => "review",
            Transition::Process => "process",
            Transition::Reprocess => "reprocess",
            Transition::MarkPaid => "mark_paid",
            Transition::Reopen => "reopen",
            Transition::Confirm => "confirm",
            Transition::RecordPayment => "record_payment",
            Transition::Refund => "refund",
            Transition::Ship => "ship",
            Transition::Receive => "receive",
            Transition::PlaceOrder => "place_order",
            Transition::Disconnect => "disconnect",
        }
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status row of a lifecycle table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSpec {
    pub status: Status,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub transitions: BTreeSet<Transition>,
    /// Transitions reachable from this status only for the top role.
    #[serde(default)]
    pub overrides: BTreeSet<Transition>,
}

impl StatusSpec {
    pub fn open(status: &'static str, transitions: &[Transition]) -> Self {
        Self {
            status: Status::from(status),
            terminal: false,
            transitions: transitions.iter().copied().collect(),
            overrides: BTreeSet::new(),
        }
    }

    pub fn terminal(status: &'static str) -> Self {
        Self {
            status: Status::from(status),
            terminal: true,
            transitions: BTreeSet::new(),
            overrides: BTreeSet::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: &[Transition]) -> Self {
        self.overrides.extend(overrides.iter().copied());
        self
    }

    pub fn with_settlements(mut self, settlements: &[Transition]) -> Self {
        self.transitions.extend(settlements.iter().copied());
        self
    }
}

/// The lifecycle table of one resource kind, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSpec {
    pub resource: ResourceKind,
    pub statuses: Vec<StatusSpec>,
}

/// Outcome of checking one transition against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Reachable for anyone the ability otherwise permits.
    Open,
    /// Reachable only for the top role.
    OverrideOnly,
    Blocked,
}

/// Validated table of one kind.
#[derive(Debug, Clone)]
pub struct LifecycleTable {
    kind: ResourceKind,
    rows: BTreeMap<Status, StatusSpec>,
}

impl LifecycleTable {
    /// Validate a configured table.
    ///
    /// - statuses are unique and at least one is terminal
    /// - a transition is never both normal and override for the same status
    /// - terminal statuses carry no normal transition except settlements
    pub fn from_spec(spec: LifecycleSpec) -> Result<Self, ConfigError> {
        let kind = spec.resource;
        let mut rows = BTreeMap::new();

        for row in spec.statuses {
            if let Some(t) = row.transitions.intersection(&row.overrides).next() {
                return Err(ConfigError::OverlappingOverride {
                    kind,
                    status: row.status.clone(),
                    transition: *t,
                });
            }
            if row.terminal {
                if let Some(t) = row.transitions.iter().find(|t| !t.is_settlement()) {
                    return Err(ConfigError::TerminalTransition {
                        kind,
                        status: row.status.clone(),
                        transition: *t,
                    });
                }
            }
            let status = row.status.clone();
            if rows.insert(status.clone(), row).is_some() {
                return Err(ConfigError::DuplicateStatus { kind, status });
            }
        }

        if !rows.values().any(|row| row.terminal) {
            return Err(ConfigError::NoTerminalStatus(kind));
        }

        Ok(Self { kind, rows })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn statuses(&self) -> impl Iterator<Item = &Status> {
        self.rows.keys()
    }

    fn row(&self, status: &Status) -> Result<&StatusSpec, PolicyError> {
        self.rows.get(status).ok_or_else(|| PolicyError::UnknownStatus {
            kind: self.kind,
            status: status.clone(),
        })
    }

    pub fn reachable(&self, status: &Status) -> Result<BTreeSet<Transition>, PolicyError> {
        let row = self.row(status)?;
        Ok(row.transitions.union(&row.overrides).copied().collect())
    }

    pub fn check(&self, status: &Status, transition: Transition) -> Result<Gate, PolicyError> {
        let row = self.row(status)?;
        Ok(if row.transitions.contains(&transition) {
            Gate::Open
        } else if row.overrides.contains(&transition) {
            Gate::OverrideOnly
        } else {
            Gate::Blocked
        })
    }

    pub fn is_terminal(&self, status: &Status) -> Result<bool, PolicyError> {
        Ok(self.row(status)?.terminal)
    }

    /// Whether `transition` is reachable from at least one status.
    pub fn knows(&self, transition: Transition) -> bool {
        self.rows
            .values()
            .any(|row| row.transitions.contains(&transition) || row.overrides.contains(&transition))
    }
}

/// All lifecycle tables, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct LifecycleGate {
    tables: HashMap<ResourceKind, LifecycleTable>,
}

impl LifecycleGate {
    pub fn from_specs(specs: Vec<LifecycleSpec>) -> Result<Self, ConfigError> {
        let mut tables = HashMap::with_capacity(specs.len());
        for spec in specs {
            let kind = spec.resource;
            let table = LifecycleTable::from_spec(spec)?;
            if tables.insert(kind, table).is_some() {
                return Err(ConfigError::DuplicateLifecycle(kind));
            }
        }
        Ok(Self { tables })
    }

    pub fn table(&self, kind: ResourceKind) -> Result<&LifecycleTable, PolicyError> {
        self.tables
            .get(&kind)
            .ok_or(PolicyError::NoLifecycleTable(kind))
    }

    pub fn has_table(&self, kind: ResourceKind) -> bool {
        self.tables.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.tables.keys().copied()
    }

    /// Transitions reachable from `status`, overrides included.
    pub fn reachable(
        &self,
        kind: ResourceKind,
        status: &Status,
    ) -> Result<BTreeSet<Transition>, PolicyError> {
        self.table(kind)?.reachable(status)
    }

    pub fn check(
        &self,
        kind: ResourceKind,
        status: &Status,
        transition: Transition,
    ) -> Result<Gate, PolicyError> {
        self.table(kind)?.check(status, transition)
    }

    pub fn is_terminal(&self, kind: ResourceKind, status: &Status) -> Result<bool, PolicyError> {
        self.table(kind)?.is_terminal(status)
    }

    /// Build the compare-and-swap predicate for committing `transition` from
    /// `expected`. Fails if `expected` is not a status of `kind`.
    pub fn guard(
        &self,
        kind: ResourceKind,
        expected: Status,
        transition: Transition,
    ) -> Result<StatusGuard<'_>, PolicyError> {
        let table = self.table(kind)?;
        table.row(&expected)?;
        Ok(StatusGuard {
            table,
            expected,
            transition,
        })
    }
}

/// Precondition a storage layer evaluates inside its atomic commit.
///
/// The engine answers "permitted given the status I observed"; the guard lets
/// the commit re-assert that the stored status is still the observed one, so
/// only one of two racing transitions lands. The loser re-reads the resource
/// and re-evaluates.
#[derive(Debug, Clone)]
pub struct StatusGuard<'a> {
    table: &'a LifecycleTable,
    expected: Status,
    transition: Transition,
}

impl StatusGuard<'_> {
    pub fn expected(&self) -> &Status {
        &self.expected
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Whether the stored status still admits the transition.
    pub fn holds(&self, current: &Status) -> bool {
        current == &self.expected
            && matches!(
                self.table.check(current, self.transition),
                Ok(Gate::Open | Gate::OverrideOnly)
            )
    }
}

/// The built-in tables.
pub(crate) fn standard_lifecycles() -> Vec<LifecycleSpec> {
    use Transition::*;

    let spec = |resource, statuses| LifecycleSpec { resource, statuses };

    vec![
        spec(
            ResourceKind::PayRun,
            vec![
                StatusSpec::open("draft", &[Calculate, Delete]).with_overrides(&[Regenerate]),
                StatusSpec::open("pending_review", &[Submit]),
                StatusSpec::open("pending_approval", &[Approve, Reject]),
                StatusSpec::open("approved", &[Complete, Cancel]),
                StatusSpec::terminal("paid"),
                StatusSpec::terminal("rejected").with_overrides(&[Regenerate]),
                StatusSpec::terminal("cancelled").with_overrides(&[Regenerate]),
            ],
        ),
        spec(
            ResourceKind::PayrollPeriod,
            vec![
                StatusSpec::open("draft", &[Update, Delete, Process, Cancel]),
                StatusSpec::open("processing", &[Cancel]),
                StatusSpec::open("processed", &[Approve, Reprocess, Cancel]),
                StatusSpec::open("approved", &[MarkPaid]).with_overrides(&[Reopen]),
                StatusSpec::terminal("paid"),
                StatusSpec::terminal("cancelled").with_overrides(&[Reopen]),
            ],
        ),
        spec(
            ResourceKind::WageAdvance,
            vec![
                StatusSpec::open("pending", &[Approve, Reject, Cancel, Update]),
                StatusSpec::open("approved", &[Disburse]),
                StatusSpec::terminal("disbursed").with_settlements(&[RecordRepayment]),
                StatusSpec::terminal("rejected"),
                StatusSpec::terminal("cancelled"),
            ],
        ),
        spec(
            ResourceKind::FundRequest,
            vec![
                StatusSpec::open("pending", &[Approve, Reject, Cancel, Update]),
                StatusSpec::open("approved", &[Disburse]),
                StatusSpec::terminal("disbursed"),
                StatusSpec::terminal("rejected"),
                StatusSpec::terminal("cancelled"),
            ],
        ),
        spec(
            ResourceKind::Timesheet,
            vec![
                StatusSpec::open("draft", &[Submit, Update, Delete]),
                StatusSpec::open("submitted", &[Approve, Reject]),
                StatusSpec::open("pending", &[Approve, Reject]),
                StatusSpec::open("rejected", &[Update, Submit]),
                StatusSpec::terminal("approved").with_overrides(&[Reopen]),
                StatusSpec::terminal("paid"),
            ],
        ),
        spec(
            ResourceKind::ReturnRequest,
            vec![
                StatusSpec::open("pending", &[Review, Cancel]),
                StatusSpec::open("under_review", &[Approve, Reject]),
                StatusSpec::open("approved", &[Process]),
                StatusSpec::terminal("completed"),
                StatusSpec::terminal("cancelled"),
                StatusSpec::terminal("rejected"),
            ],
        ),
        spec(
            ResourceKind::Order,
            vec![
                StatusSpec::open("pending", &[Update, Confirm, Cancel, Delete, RecordPayment]),
                StatusSpec::open("confirmed", &[Complete, Cancel, RecordPayment]),
                StatusSpec::terminal("completed"),
                StatusSpec::terminal("cancelled"),
            ],
        ),
        spec(
            ResourceKind::Payment,
            vec![
                StatusSpec::open("pending", &[Complete, Cancel]),
                StatusSpec::open("completed", &[Refund]),
                StatusSpec::terminal("refunded"),
                StatusSpec::terminal("cancelled"),
            ],
        ),
        spec(
            ResourceKind::PurchaseOrder,
            vec![
                StatusSpec::open("draft", &[Update, Submit, Delete, Cancel]),
                StatusSpec::open("submitted", &[Confirm, Reject, Cancel]),
                StatusSpec::open("confirmed", &[Ship]),
                StatusSpec::open("shipped", &[Receive]),
                StatusSpec::terminal("received"),
                StatusSpec::terminal("rejected"),
                StatusSpec::terminal("cancelled"),
            ],
        ),
        spec(
            ResourceKind::SupplierConnection,
            vec![
                StatusSpec::open("pending", &[Approve, Reject, Cancel]),
                StatusSpec::open("active", &[PlaceOrder, Disconnect]),
                StatusSpec::terminal("rejected"),
                StatusSpec::terminal("cancelled"),
                StatusSpec::terminal("disconnected"),
            ],
        ),
    ]
}
