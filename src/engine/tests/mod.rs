use super::*;
use crate::types::{Method, Permission, Probe, Right, RightsRegistry};
use crate::Implies;
use yare::parameterized;


const TEST_POLICY: &str = r#"{
    "rights": [
        { "name": "READ",   "mask": "0x01" },
        { "name": "CREATE", "mask": "0x02" },
        { "name": "UPDATE", "mask": "0x04" },
        { "name": "DELETE", "mask": "0x08" }
    ],
    "permissions": [
        { "name": "read_ehr", "action": "GET_EHR", "object": "EHR", "granted": ["READ"] },
        { "name": "write_composition", "object": "COMPOSITION", "resource": "ehr/[0-9]+/composition",
          "granted": ["CREATE", "UPDATE"] },
        { "name": "icu_only", "object": "QUERY", "parameters": { "dept": ["ICU", "CCU"] },
          "granted": ["READ"] },
        { "name": "no_delete", "revoked": ["DELETE"] }
    ],
    "principals": [
        { "name": "nurse", "permissions": ["read_ehr", "icu_only", "no_delete"] },
        { "name": "doctor", "permissions": [
            "read_ehr", "write_composition", { "granted": ["DELETE"] }, "no_delete"
        ] },
        { "name": "admin", "permissions": [
            "no_delete", { "granted": ["READ", "CREATE", "UPDATE", "DELETE"] }
        ] }
    ]
}"#;

fn engine() -> PolicyEngine {
    PolicyEngine::new_from_str(TEST_POLICY).unwrap()
}

#[parameterized(
    nurse_reads_ehr = { "nurse", Method::Get, Some("GET_EHR"), Some("EHR"), None, true },
    nurse_wrong_action = { "nurse", Method::Get, Some("LIST_EHR"), Some("EHR"), None, false },
    nurse_cannot_create = { "nurse", Method::Post, None, Some("COMPOSITION"), Some("ehr/1/composition"), false },
    doctor_creates = { "doctor", Method::Post, None, Some("COMPOSITION"), Some("ehr/1/composition"), true },
    doctor_updates = { "doctor", Method::Put, None, Some("COMPOSITION"), Some("ehr/77/composition"), true },
    doctor_bad_resource = { "doctor", Method::Post, None, Some("COMPOSITION"), Some("ehr/x/composition"), false },
    doctor_missing_resource = { "doctor", Method::Post, None, Some("COMPOSITION"), None, false },
    doctor_delete_revoked_later = { "doctor", Method::Delete, None, None, None, false },
    admin_delete_granted_later = { "admin", Method::Delete, None, None, None, true },
)]
fn test_evaluate_requests(
    principal: &str,
    method: Method,
    action: Option<&str>,
    object: Option<&str>,
    resource: Option<&str>,
    expected: bool,
) {
    let mut request = RequestDescriptor::new(method);
    request.action = action.map(Into::into);
    request.object = object.map(str::to_string);
    request.resource = resource.map(str::to_string);

    let decision = engine().evaluate(principal, &request).unwrap();
    assert_eq!(decision.is_allowed(), expected, "{decision}");
}

#[parameterized(
    icu = { &["ICU"], true },
    ccu = { &["CCU"], true },
    er = { &["ER"], false },
    er_and_icu = { &["ER", "ICU"], true },
    none = { &[], false },
)]
fn test_parameter_rule(values: &[&str], expected: bool) {
    let mut request = RequestDescriptor::new(Method::Get).with_object("QUERY");
    for value in values {
        request = request.with_parameter("dept", *value);
    }
    let decision = engine().evaluate("nurse", &request).unwrap();
    assert_eq!(decision.is_allowed(), expected);
}

#[test]
fn test_parameter_rule_without_key() {
    let request = RequestDescriptor::new(Method::Get)
        .with_object("QUERY")
        .with_parameter("ward", "ICU");
    assert!(!engine().evaluate("nurse", &request).unwrap().is_allowed());
}

#[test]
fn test_evaluate_permission_by_name() {
    let engine = engine();
    let request = RequestDescriptor::new(Method::Post);
    assert!(
        engine
            .evaluate_permission("doctor", "write_composition", &request)
            .unwrap()
            .is_allowed()
    );
    assert!(
        !engine
            .evaluate_permission("nurse", "write_composition", &request)
            .unwrap()
            .is_allowed()
    );
}

#[parameterized(
    doctor_update = { "doctor", "UPDATE", Some("COMPOSITION"), Some("ehr/5/composition"), true },
    doctor_update_no_resource = { "doctor", "UPDATE", Some("COMPOSITION"), None, false },
    nurse_read_query_needs_parameters = { "nurse", "READ", Some("QUERY"), None, false },
    unknown_right = { "admin", "AUDIT", None, None, false },
)]
fn test_evaluate_right(
    principal: &str,
    right: &str,
    object: Option<&str>,
    resource: Option<&str>,
    expected: bool,
) {
    let decision = engine()
        .evaluate_right(principal, right, object, resource)
        .unwrap();
    assert_eq!(decision.is_allowed(), expected);
}

#[test]
fn test_unknown_principal() {
    let result = engine().evaluate("visitor", &RequestDescriptor::new(Method::Get));
    assert_eq!(
        result.unwrap_err(),
        PolicyError::UnknownPrincipal("visitor".to_string())
    );
}

#[test]
fn test_rights_for_mask() {
    let engine = engine();
    let names = engine.rights_for_mask(&RightsMask::from_u64(0x05)).unwrap();
    assert_eq!(names, vec!["READ", "UPDATE"]);
    assert!(engine.rights_for_mask(&RightsMask::empty()).unwrap().is_empty());
}

#[test]
fn test_principal_names() {
    insta::assert_json_snapshot!(engine().principal_names().unwrap(), @r#"
    [
      "admin",
      "doctor",
      "nurse"
    ]
    "#);
}

#[test]
fn test_evaluation_is_idempotent() {
    let engine = engine();
    let request = RequestDescriptor::new(Method::Get)
        .with_action("GET_EHR")
        .with_object("EHR");
    let first = engine.evaluate("nurse", &request).unwrap();
    for _ in 0..25 {
        assert_eq!(engine.evaluate("nurse", &request).unwrap(), first);
    }
}

#[test]
fn test_concurrent_evaluation() {
    use std::thread;

    let engine = engine();
    let mut handles = vec![];

    for i in 0..8 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for n in 0..100 {
                let request = RequestDescriptor::new(Method::Put)
                    .with_object("COMPOSITION")
                    .with_resource(format!("ehr/{}/composition", i * 100 + n));
                assert!(engine.evaluate("doctor", &request).unwrap().is_allowed());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_engine_from_policy_set() {
    let rights = Arc::new(
        RightsRegistry::new(vec![Right::new("READ", RightsMask::from_u64(1))], None).unwrap(),
    );
    let rule = Permission::new("everything").grant("READ");
    assert!(rule.implies(&Probe::default()));

    let set = PolicySet::new(
        Arc::clone(&rights),
        vec![Principal::new("reader", rights, vec![rule])],
    )
    .unwrap();
    let engine = PolicyEngine::from_policy_set(set);
    assert!(
        engine
            .evaluate("reader", &RequestDescriptor::new(Method::Get))
            .unwrap()
            .is_allowed()
    );
    assert_eq!(engine.generation().unwrap(), 1);
}
