//! Tests for protocol profiles

use super::*;
use serde_json::json;
use test_case::test_case;

#[test_case(ODataVersion::V2, true, false, "d" ; "v2")]
#[test_case(ODataVersion::Sap, true, true, "d" ; "sap")]
#[test_case(ODataVersion::V3, true, true, "value" ; "v3")]
#[test_case(ODataVersion::V4, false, false, "value" ; "v4")]
fn test_profile_table(
    version: ODataVersion,
    force_json: bool,
    json_in_query_string: bool,
    container: &str,
) {
    let profile = ProtocolProfile::for_version(version);
    assert_eq!(profile.version, version);
    assert_eq!(profile.force_json, force_json);
    assert_eq!(profile.json_in_query_string, json_in_query_string);
    assert_eq!(profile.data_container_key, container);
}

#[test]
fn test_version_deserialize() {
    let version: ODataVersion = serde_json::from_str("\"v4\"").unwrap();
    assert_eq!(version, ODataVersion::V4);

    let version: ODataVersion = serde_json::from_str("\"vSAP\"").unwrap();
    assert_eq!(version, ODataVersion::Sap);
}

#[test]
fn test_accept_header_and_query_options() {
    let v4 = ProtocolProfile::for_version(ODataVersion::V4);
    assert_eq!(v4.accept_header(), None);
    assert!(v4.base_query_options().is_empty());

    let sap = ProtocolProfile::for_version(ODataVersion::Sap);
    assert_eq!(sap.accept_header(), Some(APPLICATION_JSON));
    assert_eq!(sap.base_query_options(), vec![JSON_FORMAT.to_string()]);

    let v2 = ProtocolProfile::for_version(ODataVersion::V2);
    assert!(v2.base_query_options().is_empty());
}

#[test]
fn test_unwrap_v2_results() {
    let profile = ProtocolProfile::for_version(ODataVersion::V2);
    let body = json!({
        "d": {
            "results": [{"ID": 1}, {"ID": 2}],
            "__next": "https://host/svc/Products?$skiptoken=2"
        }
    });

    let page = profile.unwrap_page(&body).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(
        page.next_link.as_deref(),
        Some("https://host/svc/Products?$skiptoken=2")
    );
}

#[test]
fn test_unwrap_v2_single_entity() {
    let profile = ProtocolProfile::for_version(ODataVersion::V2);
    let body = json!({"d": {"ID": 7, "Name": "Chai"}});

    let page = profile.unwrap_page(&body).unwrap();
    assert_eq!(page.items, vec![json!({"ID": 7, "Name": "Chai"})]);
    assert!(page.next_link.is_none());
}

#[test]
fn test_unwrap_v4_value() {
    let profile = ProtocolProfile::for_version(ODataVersion::V4);
    let body = json!({
        "@odata.context": "$metadata#People",
        "value": [{"UserName": "russell"}],
        "@odata.nextLink": "https://host/People?$skiptoken=8"
    });

    let page = profile.unwrap_page(&body).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(
        page.next_link.as_deref(),
        Some("https://host/People?$skiptoken=8")
    );
}

#[test]
fn test_unwrap_v3_next_link() {
    let profile = ProtocolProfile::for_version(ODataVersion::V3);
    let body = json!({
        "odata.metadata": "$metadata#Products",
        "value": [],
        "odata.nextLink": ""
    });

    let page = profile.unwrap_page(&body).unwrap();
    assert!(page.is_empty());
    assert!(page.next_link.is_none());
}

#[test]
fn test_unwrap_missing_container_is_malformed() {
    let profile = ProtocolProfile::for_version(ODataVersion::V4);
    let err = profile.unwrap_page(&json!({"d": {"results": []}})).unwrap_err();
    assert!(matches!(err, crate::Error::MalformedResponse { .. }));
}

#[test]
fn test_entity_set_names_v2() {
    let profile = ProtocolProfile::for_version(ODataVersion::Sap);
    let body = json!({"d": {"EntitySets": ["Products", "Suppliers"]}});
    assert_eq!(
        profile.entity_set_names(&body).unwrap(),
        vec!["Products", "Suppliers"]
    );
}

#[test]
fn test_entity_set_names_v4_skips_singletons() {
    let profile = ProtocolProfile::for_version(ODataVersion::V4);
    let body = json!({
        "value": [
            {"name": "People", "kind": "EntitySet", "url": "People"},
            {"name": "Me", "kind": "Singleton", "url": "Me"},
            {"name": "Airlines", "url": "Airlines"}
        ]
    });
    assert_eq!(
        profile.entity_set_names(&body).unwrap(),
        vec!["People", "Airlines"]
    );
}
