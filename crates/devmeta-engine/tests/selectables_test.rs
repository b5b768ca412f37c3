//! Selectable resolution integration tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use devmeta_core::{
    DeviceTypeSelectable, FilterCriteria, FunctionKind, Interaction, RegistryError,
};
use devmeta_engine::{EngineConfig, Registry, SelectableQuery};
use pretty_assertions::assert_eq;

fn device_type_ids(selectables: &[DeviceTypeSelectable]) -> Vec<&str> {
    selectables.iter().map(|s| s.device_type_id.as_str()).collect()
}

fn find<'a>(selectables: &'a [DeviceTypeSelectable], id: &str) -> &'a DeviceTypeSelectable {
    selectables
        .iter()
        .find(|s| s.device_type_id == id)
        .unwrap_or_else(|| panic!("{} not selected", id))
}

// =============================================================================
// Matching
// =============================================================================

#[tokio::test]
async fn test_measuring_inside_air_temperature() {
    let registry = demo_registry().await;
    let query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "inside_air")]);
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermometer", "thermostat"]);

    let thermometer = find(&result, "thermometer");
    let options = &thermometer.service_path_options["thermometer-get-temp"];
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].path, "reading.temperature");
    assert_eq!(options[0].aspect_node.as_ref().unwrap().id, "inside_air");

    let thermostat = find(&result, "thermostat");
    assert_eq!(thermostat.service_ids(), vec!["thermostat-get-temp"]);
    let options = &thermostat.service_path_options["thermostat-get-temp"];
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].aspect_node.as_ref().unwrap().id, "inside_air");
}

#[tokio::test]
async fn test_aspect_matching_is_bidirectional() {
    let registry = demo_registry().await;
    for aspect in ["air", "inside_air", "inside_air_ceiling"] {
        let query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, aspect)]);
        let result = registry.resolve_selectables(&query).await.unwrap();
        assert_eq!(
            device_type_ids(&result),
            vec!["thermometer", "thermostat"],
            "aspect {}",
            aspect
        );
    }

    let query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "outside_air")]);
    assert!(registry.resolve_selectables(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_controlling_requires_device_class() {
    let registry = demo_registry().await;
    let query = SelectableQuery::new(vec![FilterCriteria::controlling(
        SET_TEMPERATURE,
        "thermostat",
    )]);
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermostat"]);

    let option = &result[0].service_path_options["thermostat-set-temp"][0];
    assert!(option.is_controlling_function);
    assert_eq!(option.path, "target.temperature");
    assert_eq!(option.configurables.len(), 1);
    assert_eq!(option.configurables[0].path, "target.duration");
    assert_eq!(option.configurables[0].value, Some(serde_json::json!(0)));

    let query = SelectableQuery::new(vec![FilterCriteria::controlling(SET_TEMPERATURE, "lamp")]);
    assert!(registry.resolve_selectables(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_interaction_filter() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "inside_air")]);

    query.interactions = vec![Interaction::Event];
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermometer"]);

    query.interactions = vec![Interaction::EventAndRequest];
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermometer"]);

    query.interactions = vec![Interaction::Request];
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermometer", "thermostat"]);
}

#[tokio::test]
async fn test_path_prefix() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "inside_air")]);
    query.path_prefix = "value.".to_string();
    let result = registry.resolve_selectables(&query).await.unwrap();
    let thermometer = find(&result, "thermometer");
    assert_eq!(
        thermometer.service_path_options["thermometer-get-temp"][0].path,
        "value.reading.temperature"
    );
}

#[tokio::test]
async fn test_void_controlling_path_is_content_root() {
    let registry = demo_registry().await;
    let query = SelectableQuery::new(vec![FilterCriteria::controlling(ON, "lamp")]);
    let result = registry.resolve_selectables(&query).await.unwrap();
    let option = &find(&result, "lamp").service_path_options["lamp-on"][0];
    assert!(option.is_void);
    assert_eq!(option.path, "on");
    assert_eq!(option.aspect_node.as_ref().unwrap().id, "lighting");
}

#[tokio::test]
async fn test_services_must_match_all() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![
        FilterCriteria::measuring(TEMPERATURE, "inside_air"),
        FilterCriteria::controlling(SET_TEMPERATURE, "thermostat"),
    ]);
    let any = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&any), vec!["thermometer", "thermostat"]);

    query.services_must_match_all = true;
    let all = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&all), vec!["thermostat"]);
    assert_eq!(
        all[0].service_ids(),
        vec!["thermostat-get-temp", "thermostat-set-temp"]
    );
}

#[tokio::test]
async fn test_device_class_only_criteria() {
    let registry = demo_registry().await;
    let query = SelectableQuery::new(vec![FilterCriteria::device_class("socket")]);
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["plug-strip"]);
    assert_eq!(result[0].services.len(), 3);
    assert!(result[0].service_path_options.is_empty());
}

#[tokio::test]
async fn test_empty_criteria_atom_is_rejected() {
    let registry = demo_registry().await;
    let query = SelectableQuery::new(vec![FilterCriteria::default()]);
    let err = registry.resolve_selectables(&query).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidCriteria(_)));
    assert_eq!(err.status_code(), 400);
}

// =============================================================================
// Service group variants
// =============================================================================

#[tokio::test]
async fn test_plug_strip_variants() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::controlling(ON, "socket")]);
    query.include_modified = true;
    query.include_unmodified = false;

    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(
        device_type_ids(&result),
        vec![
            "plug-strip$service_group_selection=sg1",
            "plug-strip$service_group_selection=sg2",
        ]
    );
    assert_eq!(result[0].service_ids(), vec!["plug-strip-on-1"]);
    assert_eq!(result[1].service_ids(), vec!["plug-strip-on-2"]);
}

#[tokio::test]
async fn test_unmodified_is_union_of_variants() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::controlling(ON, "socket")]);
    query.include_modified = true;

    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(result.len(), 3);
    let base = find(&result, "plug-strip");
    let mut union: Vec<&str> = result[1..]
        .iter()
        .flat_map(|s| s.service_path_options.keys().map(String::as_str))
        .collect();
    union.sort();
    let base_keys: Vec<&str> = base.service_path_options.keys().map(String::as_str).collect();
    assert_eq!(base_keys, union);
}

#[tokio::test]
async fn test_variant_without_match_is_omitted() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::measuring(ENERGY, "electricity")]);
    query.include_modified = true;

    let config = EngineConfig {
        service_group: devmeta_engine::ServiceGroupConfig {
            exact_match: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let exact = demo_registry_with(config).await;

    // The energy service is ungrouped: every variant keeps it by default
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(result.len(), 3);
    let result = exact.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["plug-strip"]);
}

// =============================================================================
// Store access
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let store = Arc::new(FaultyStore::new(demo_store().await).with_read_delay(Duration::from_secs(10)));
    let config = EngineConfig {
        read_timeout_ms: 100,
        ..Default::default()
    };
    let registry = Registry::new(store, config);
    let query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "inside_air")]);
    let err = registry.resolve_selectables(&query).await.unwrap_err();
    assert!(matches!(err, RegistryError::Timeout));
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_candidate_paging() {
    let registry = demo_registry().await;
    let mut query = SelectableQuery::new(vec![FilterCriteria::measuring(TEMPERATURE, "inside_air")]);
    query.limit = Some(1);
    query.offset = 1;
    let result = registry.resolve_selectables(&query).await.unwrap();
    assert_eq!(device_type_ids(&result), vec!["thermostat"]);
}

#[tokio::test]
async fn test_function_lookup() {
    let registry = demo_registry().await;
    let function = registry.function(SET_TEMPERATURE).await.unwrap();
    assert_eq!(function.kind(), Some(FunctionKind::Controlling));
    assert_eq!(
        registry.function(TEMPERATURE).await.unwrap().kind(),
        Some(FunctionKind::Measuring)
    );

    let err = registry
        .function("urn:infai:ses:measuring-function:humidity")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::FunctionNotFound(ref id) if id.ends_with("humidity")));
    assert_eq!(err.status_code(), 404);
}
