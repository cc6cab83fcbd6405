use serde::{Deserialize, Serialize};

/// Capability identifier.
///
/// Capabilities are a closed set. Configuration refers to them by their
/// snake_case name (e.g. `"manage_inventory"`); an unknown name fails to
/// deserialize, so a typo surfaces when the policy is loaded instead of as a
/// silent denial later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Platform operations across tenants. Reserved for the platform role.
    ManagePlatform,
    ManageSettings,
    ViewStaff,
    ManageStaff,
    AssignRoles,
    ViewOrders,
    ManageOrders,
    ProcessPayments,
    RefundPayments,
    ManageReturns,
    ApproveReturns,
    ManageInventory,
    ManagePurchasing,
    /// Fulfil purchase orders received from buyer tenants.
    FulfilSupplierOrders,
    ManageSuppliers,
    ViewPayroll,
    ManagePayroll,
    ApprovePayroll,
    SubmitTimesheets,
    ManageTimesheets,
    ApproveTimesheets,
    RequestAdvances,
    ApproveAdvances,
    DisburseFunds,
    ViewReports,
}

impl Capability {
    pub const ALL: [Capability; 25] = [
        Capability::ManagePlatform,
        Capability::ManageSettings,
        Capability::ViewStaff,
        Capability::ManageStaff,
        Capability::AssignRoles,
        Capability::ViewOrders,
        Capability::ManageOrders,
        Capability::ProcessPayments,
        Capability::RefundPayments,
        Capability::ManageReturns,
        Capability::ApproveReturns,
        Capability::ManageInventory,
        Capability::ManagePurchasing,
        Capability::FulfilSupplierOrders,
        Capability::ManageSuppliers,
        Capability::ViewPayroll,
        Capability::ManagePayroll,
        Capability::ApprovePayroll,
        Capability::SubmitTimesheets,
        Capability::ManageTimesheets,
        Capability::ApproveTimesheets,
        Capability::RequestAdvances,
        Capability::ApproveAdvances,
        Capability::DisburseFunds,
        Capability::ViewReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManagePlatform => "manage_platform",
            Capability::ManageSettings => "manage_settings",
            Capability::ViewStaff => "view_staff",
            Capability::ManageStaff => "manage_staff",
            Capability::AssignRoles => "assign_roles",
            Capability::ViewOrders => "view_orders",
            Capability::ManageOrders => "manage_orders",
            Capability::ProcessPayments => "process_payments",
            Capability::RefundPayments => "refund_payments",
            Capability::ManageReturns => "manage_returns",
            Capability::ApproveReturns => "approve_returns",
            Capability::ManageInventory => "manage_inventory",
            Capability::ManagePurchasing => "manage_purchasing",
            Capability::FulfilSupplierOrders => "fulfil_supplier_orders",
            Capability::ManageSuppliers => "manage_suppliers",
            Capability::ViewPayroll => "view_payroll",
            Capability::ManagePayroll => "manage_payroll",
            Capability::ApprovePayroll => "approve_payroll",
            Capability::SubmitTimesheets => "submit_timesheets",
            Capability::ManageTimesheets => "manage_timesheets",
            Capability::ApproveTimesheets => "approve_timesheets",
            Capability::RequestAdvances => "request_advances",
            Capability::ApproveAdvances => "approve_advances",
            Capability::DisburseFunds => "disburse_funds",
            Capability::ViewReports => "view_reports",
        }
    }

    /// Capabilities that only make sense for a cross-tenant platform role.
    pub fn is_platform(&self) -> bool {
        matches!(self, Capability::ManagePlatform)
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
