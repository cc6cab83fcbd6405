//! Built-in ability tables, one module per business area.
//!
//! Each table lists a kind's declared shape and its abilities. Inside an
//! ability, checks run in a fixed order: tenant (or bilateral side), explicit
//! self-action rules, role capability and seniority, shop scope, lifecycle.

use crate::registry::ResourcePolicy;

mod advances;
mod payroll;
mod purchasing;
mod sales;
mod staff;
mod tenant;

/// Every built-in resource policy.
pub fn standard() -> Vec<ResourcePolicy> {
    vec![
        tenant::tenant(),
        staff::staff(),
        sales::order(),
        sales::payment(),
        sales::return_request(),
        payroll::payroll_period(),
        payroll::pay_run(),
        payroll::payslip(),
        payroll::timesheet(),
        advances::wage_advance(),
        advances::fund_request(),
        purchasing::purchase_order(),
        purchasing::supplier_connection(),
    ]
}
