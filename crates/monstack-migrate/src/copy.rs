//! Live copy of dashboards and datasources between two dashboard servers.

use monstack_client::DashboardApi;
use tracing::info;

use crate::error::{MigrateError, MigrateResult};
use crate::report::CopyReport;
use crate::transfer::{download_dashboards, upload_dashboards, upload_datasources};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    pub include_dashboards: bool,
    pub include_datasources: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            include_dashboards: true,
            include_datasources: true,
        }
    }
}

/// Copy from `source` to `target`. Only a failed listing on the source is
/// fatal.
pub fn copy_stack(
    opts: &CopyOptions,
    source: &dyn DashboardApi,
    target: &dyn DashboardApi,
) -> MigrateResult<CopyReport> {
    let mut report = CopyReport::default();

    if opts.include_datasources {
        let datasources = source
            .list_datasources()
            .map_err(|e| MigrateError::client("listing source datasources", e))?;
        report.datasources_copied =
            upload_datasources(target, datasources, |_| {}, &mut report.warnings);
    }

    if opts.include_dashboards {
        let dashboards = download_dashboards(source, &mut report.warnings)
            .map_err(|e| MigrateError::client("listing source dashboards", e))?;
        report.dashboards_copied = upload_dashboards(target, dashboards, &mut report.warnings);
    }

    info!(
        datasources = report.datasources_copied,
        dashboards = report.dashboards_copied,
        warnings = report.warnings.len(),
        "copy complete"
    );
    Ok(report)
}
