//! Accounting module (expenses, suppliers, fixed assets, company settings,
//! dashboard figures).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod asset;
pub mod company;
pub mod dashboard;
pub mod expense;
pub mod supplier;

pub use asset::{Asset, AssetCategory, AssetDetails};
pub use company::{CompanyInfo, CompanyInfoUpdate};
pub use dashboard::{month_window, DashboardStats, ShippingStatusCounts};
pub use expense::{Expense, ExpenseCategory, ExpenseDetails, ExpenseScope};
pub use supplier::{Supplier, SupplierDetails};
