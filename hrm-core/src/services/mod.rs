//! Services module
//!
//! Business logic services that coordinate between commands, the
//! repository and the cloud mirror.

pub mod audit;
pub mod dashboard;
pub mod employees;
pub mod reports;

pub use audit::AuditService;
pub use dashboard::DashboardService;
pub use employees::EmployeeService;
pub use reports::CaderService;
