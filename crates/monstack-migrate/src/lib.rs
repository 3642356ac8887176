//! monstack-migrate — moving stack state between running stacks.
//!
//! - [`export_stack`] writes a live stack's dashboards, datasources and local
//!   config files to a snapshot archive.
//! - [`import_stack`] restores such a snapshot (archive or directory).
//! - [`clone_stack`] deploys a second stack on new ports that scrapes the
//!   same targets as the source.
//! - [`copy_stack`] copies dashboards and datasources between two live
//!   dashboard servers.
//!
//! Services are reached through the `DashboardApi`, `MetricsApi` and
//! `ContainerRuntime` traits. Per-item failures never abort a bulk
//! operation; they are returned as [`Warning`]s in each report.

pub mod clone;
pub mod copy;
pub mod error;
pub mod export;
mod fsutil;
pub mod import;
pub mod report;
pub mod rewrite;
pub mod snapshot;
mod transfer;

pub use clone::{clone_stack, CloneNames, CloneOptions};
pub use copy::{copy_stack, CopyOptions};
pub use error::{MigrateError, MigrateResult};
pub use export::{export_stack, ExportOptions};
pub use import::{import_stack, ImportOptions};
pub use report::{
    CloneDeployment, CloneReport, CopyReport, ExportReport, ImportReport, ItemKind, Warning,
};
pub use snapshot::{Metadata, SnapshotDir};
