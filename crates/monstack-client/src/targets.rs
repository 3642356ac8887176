//! Rebuild file-based service-discovery groups from live scrape targets.
//!
//! The metrics store reports each active target with the labels it was
//! discovered with. For file-based discovery those include the origin file
//! path and the target address, which is enough to write the file back.

use std::collections::BTreeMap;

use monstack_core::{TargetGroup, TargetGroupMap};
use serde::Deserialize;

const META_FILEPATH: &str = "__meta_filepath";
const ADDRESS: &str = "__address__";

/// Labels the store derives itself; they never belong in a discovery file.
const INTERNAL_LABELS: &[&str] = &[
    ADDRESS,
    META_FILEPATH,
    "__metrics_path__",
    "__scheme__",
    "__scrape_interval__",
    "__scrape_timeout__",
];

/// One entry of `data.activeTargets` from the targets endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveTarget {
    #[serde(rename = "discoveredLabels", default)]
    pub discovered_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "scrapePool", default)]
    pub scrape_pool: String,
}

/// Group targets by origin file. Targets without a file path or address
/// (static configs, other discovery mechanisms) are skipped.
pub fn reconstruct_target_groups(targets: &[ActiveTarget]) -> TargetGroupMap {
    let mut groups = TargetGroupMap::new();

    for target in targets {
        let discovered = &target.discovered_labels;
        let Some(path) = discovered.get(META_FILEPATH).filter(|p| !p.is_empty()) else {
            continue;
        };
        let Some(address) = discovered.get(ADDRESS).filter(|a| !a.is_empty()) else {
            continue;
        };

        let labels = discovered
            .iter()
            .filter(|(k, _)| !INTERNAL_LABELS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        groups.entry(path.clone()).or_default().push(TargetGroup {
            targets: vec![address.clone()],
            labels,
        });
    }

    groups
}
