//! Item loops shared by the orchestrators. One bad item never stops the
//! rest: failures become warnings and the loop moves on.

use monstack_client::{ClientResult, DashboardApi};
use monstack_core::Datasource;
use serde_json::Value;
use tracing::{debug, info};

use crate::report::{record, ItemKind, Warning};
use crate::snapshot::{strip_dashboard_id, unwrap_dashboard};

/// Download every dashboard as an id-stripped envelope, keyed by uid.
/// Only the search itself can fail; per-dashboard failures are warnings.
pub(crate) fn download_dashboards(
    api: &dyn DashboardApi,
    warnings: &mut Vec<Warning>,
) -> ClientResult<Vec<(String, Value)>> {
    let found = api.search_dashboards()?;
    let mut dashboards = Vec::with_capacity(found.len());
    for summary in found {
        match api.download_dashboard(&summary.uid) {
            Ok(mut envelope) => {
                strip_dashboard_id(&mut envelope);
                debug!(uid = %summary.uid, title = %summary.name, "downloaded dashboard");
                dashboards.push((summary.uid, envelope));
            }
            Err(e) => record(warnings, ItemKind::Dashboard, summary.uid, e),
        }
    }
    info!(count = dashboards.len(), "downloaded dashboards");
    Ok(dashboards)
}

/// Upsert datasources with their id cleared, after `adjust` has had a
/// chance to rewrite them. Returns how many were accepted.
pub(crate) fn upload_datasources(
    api: &dyn DashboardApi,
    datasources: impl IntoIterator<Item = Datasource>,
    adjust: impl Fn(&mut Datasource),
    warnings: &mut Vec<Warning>,
) -> usize {
    let mut uploaded = 0;
    for mut ds in datasources {
        ds.id = 0;
        let before = ds.url.clone();
        adjust(&mut ds);
        if ds.url != before {
            info!(datasource = %ds.name, old = %before, new = %ds.url, "rewriting datasource URL");
        }
        match api.upsert_datasource(&ds) {
            Ok(()) => uploaded += 1,
            Err(e) => record(warnings, ItemKind::Datasource, ds.name, e),
        }
    }
    info!(count = uploaded, "uploaded datasources");
    uploaded
}

/// Upload dashboards into the general folder, overwriting any existing
/// dashboard with the same uid. Items are `(label, document)`; the document
/// may still be wrapped in its download envelope.
pub(crate) fn upload_dashboards(
    api: &dyn DashboardApi,
    dashboards: impl IntoIterator<Item = (String, Value)>,
    warnings: &mut Vec<Warning>,
) -> usize {
    let mut uploaded = 0;
    for (label, doc) in dashboards {
        let dashboard = unwrap_dashboard(doc);
        match api.upload_dashboard(&dashboard, 0, true) {
            Ok(()) => uploaded += 1,
            Err(e) => record(warnings, ItemKind::Dashboard, label, e),
        }
    }
    info!(count = uploaded, "uploaded dashboards");
    uploaded
}
