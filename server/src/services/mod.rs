//! Services module
//!
//! Business logic between the HTTP handlers and the repository. Every
//! tenant-aware operation takes the resolved [`Caller`] first.

pub mod areas;
pub mod checklist;
pub mod exports;
pub mod hospitals;
pub mod reports;
pub mod staff_records;
pub mod tasks;
pub mod tenant;
pub mod users;
mod validation;

pub use areas::AreasService;
pub use checklist::{
    BulkEntryInput, BulkItemOutcome, BulkUpsertResult, ChecklistRow, ChecklistService,
    ChecklistStatistics, EntryInput,
};
pub use exports::{CsvFormatter, ExportDocument, ExportFormat, ExportFormatter, ExportsService};
pub use hospitals::HospitalsService;
pub use reports::{Report, ReportRow, ReportStatistics, ReportsService};
pub use staff_records::{RecordQuery, StaffRecordsService};
pub use tasks::TasksService;
pub use tenant::{Caller, HospitalScope, TenantResolver};
pub use users::UsersService;
