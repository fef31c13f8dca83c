//! Build feature maintenance

use tracing::info;

use crate::constants::{BUILD_FEATURE_NAME, VCS_ROOT_ID_PARAM};
use crate::host::BuildConfiguration;

/// Point features at a renamed VCS root
///
/// Features referencing the old external id, or the old internal id, are
/// rewritten to the new external id. Returns `true` if anything changed.
pub fn update_features(
    old_external_id: &str,
    old_internal_id: Option<u64>,
    new_external_id: &str,
    build_type: &mut BuildConfiguration,
) -> bool {
    let old_internal_id = old_internal_id.map(|id| id.to_string());
    let mut updated = false;

    for feature in build_type
        .features
        .iter_mut()
        .filter(|f| f.feature_type == BUILD_FEATURE_NAME)
    {
        let Some(vcs_root_id) = feature.parameters.get(VCS_ROOT_ID_PARAM) else {
            continue;
        };
        let references_old = vcs_root_id == old_external_id
            || old_internal_id.as_deref() == Some(vcs_root_id.as_str());
        if references_old {
            feature
                .parameters
                .insert(VCS_ROOT_ID_PARAM.to_string(), new_external_id.to_string());
            updated = true;
        }
    }
    updated
}

/// Apply a VCS root external id change to every build configuration
///
/// Returns the external ids of the configurations that need persisting.
pub fn vcs_root_external_id_changed(
    build_types: &mut [BuildConfiguration],
    old_external_id: &str,
    old_internal_id: Option<u64>,
    new_external_id: &str,
) -> Vec<String> {
    let mut changed = Vec::new();
    for build_type in build_types.iter_mut() {
        if update_features(old_external_id, old_internal_id, new_external_id, build_type) {
            info!(
                "Updated VCS root reference {} -> {} in {}",
                old_external_id, new_external_id, build_type.external_id
            );
            changed.push(build_type.external_id.clone());
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::host::BuildFeature;

    fn feature(id: &str, feature_type: &str, vcs_root_id: Option<&str>) -> BuildFeature {
        BuildFeature {
            id: id.to_string(),
            feature_type: feature_type.to_string(),
            parameters: vcs_root_id
                .map(|v| HashMap::from([(VCS_ROOT_ID_PARAM.to_string(), v.to_string())]))
                .unwrap_or_default(),
        }
    }

    fn build_type(external_id: &str, features: Vec<BuildFeature>) -> BuildConfiguration {
        BuildConfiguration {
            internal_id: format!("{}_int", external_id),
            external_id: external_id.to_string(),
            features,
            ..Default::default()
        }
    }

    fn vcs_root_id(bt: &BuildConfiguration, index: usize) -> Option<&str> {
        bt.features[index].parameters.get(VCS_ROOT_ID_PARAM).map(String::as_str)
    }

    #[test]
    fn test_rewrites_external_id() {
        let mut bt = build_type("A", vec![feature("f1", BUILD_FEATURE_NAME, Some("Old"))]);
        assert!(update_features("Old", None, "New", &mut bt));
        assert_eq!(vcs_root_id(&bt, 0), Some("New"));
    }

    #[test]
    fn test_rewrites_internal_id() {
        let mut bt = build_type("A", vec![feature("f1", BUILD_FEATURE_NAME, Some("12"))]);
        assert!(update_features("Old", Some(12), "New", &mut bt));
        assert_eq!(vcs_root_id(&bt, 0), Some("New"));
    }

    #[test]
    fn test_leaves_other_features_alone() {
        let mut bt = build_type(
            "A",
            vec![
                feature("f1", "other-feature", Some("Old")),
                feature("f2", BUILD_FEATURE_NAME, Some("Other")),
                feature("f3", BUILD_FEATURE_NAME, None),
            ],
        );
        assert!(!update_features("Old", Some(12), "New", &mut bt));
        assert_eq!(vcs_root_id(&bt, 0), Some("Old"));
        assert_eq!(vcs_root_id(&bt, 1), Some("Other"));
        assert_eq!(vcs_root_id(&bt, 2), None);
    }

    #[test]
    fn test_reports_changed_configurations() {
        let mut bts = vec![
            build_type("A", vec![feature("f1", BUILD_FEATURE_NAME, Some("Old"))]),
            build_type("B", vec![feature("f1", BUILD_FEATURE_NAME, Some("Other"))]),
        ];
        assert_eq!(vcs_root_external_id_changed(&mut bts, "Old", None, "New"), vec!["A".to_string()]);
    }
}
