//! The individual checks of the implication test, in evaluation order.

use std::collections::BTreeMap;

use crate::types::{Action, Mismatch, Parameters, Pattern};

pub(crate) fn named_shortcut(rule_name: &str, probe_name: Option<&str>) -> bool {
    !rule_name.is_empty() && probe_name == Some(rule_name)
}

pub(crate) fn action_match(
    constraint: Option<&Action>,
    action: Option<&Action>,
) -> Result<(), Mismatch> {
    match constraint {
        None => Ok(()),
        Some(want) if action == Some(want) => Ok(()),
        Some(_) => Err(Mismatch::Action),
    }
}

/// Object and resource checks. The resource filter only applies when the
/// rule also constrains the object.
pub(crate) fn object_match(
    object_pattern: Option<&Pattern>,
    resource_filter: Option<&Pattern>,
    object: Option<&str>,
    resource: Option<&str>,
) -> Result<(), Mismatch> {
    let Some(object_pattern) = object_pattern else {
        return Ok(());
    };
    let object = object.ok_or(Mismatch::ObjectAbsent)?;
    if !object_pattern.is_full_match(object) {
        return Err(Mismatch::Object);
    }

    let Some(resource_filter) = resource_filter else {
        return Ok(());
    };
    let resource = resource.ok_or(Mismatch::ResourceAbsent)?;
    if !resource_filter.is_full_match(resource) {
        return Err(Mismatch::Resource);
    }
    Ok(())
}

/// AND over declared keys; for each key, OR over rule patterns and probe values.
pub(crate) fn parameters_match(
    constraints: &BTreeMap<String, Vec<Pattern>>,
    parameters: Option<&Parameters>,
) -> Result<(), Mismatch> {
    if constraints.is_empty() {
        return Ok(());
    }
    let parameters = parameters.ok_or(Mismatch::ParametersAbsent)?;

    for (key, patterns) in constraints {
        let values = parameters
            .get(key)
            .ok_or_else(|| Mismatch::ParameterMissing(key.clone()))?;
        let any = patterns
            .iter()
            .any(|pattern| values.iter().any(|value| pattern.is_full_match(value)));
        if !any {
            return Err(Mismatch::ParameterValue(key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn constraints(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<Pattern>> {
        entries
            .iter()
            .map(|(key, sources)| {
                let patterns = sources.iter().map(|s| Pattern::new(*s).unwrap()).collect();
                (key.to_string(), patterns)
            })
            .collect()
    }

    fn params(entries: &[(&str, &[&str])]) -> Parameters {
        entries
            .iter()
            .map(|(key, values)| {
                (
                    key.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[parameterized(
        same = { "admin", Some("admin"), true },
        different = { "admin", Some("user"), false },
        absent = { "admin", None, false },
        empty_rule_name = { "", Some(""), false },
    )]
    fn test_named_shortcut(rule: &str, probe: Option<&str>, expected: bool) {
        assert_eq!(named_shortcut(rule, probe), expected);
    }

    #[test]
    fn test_action_match() {
        let get = Action::new("GET_EHR");
        let post = Action::new("POST_EHR");
        assert_eq!(action_match(None, None), Ok(()));
        assert_eq!(action_match(None, Some(&post)), Ok(()));
        assert_eq!(action_match(Some(&get), Some(&get)), Ok(()));
        assert_eq!(action_match(Some(&get), Some(&post)), Err(Mismatch::Action));
        assert_eq!(action_match(Some(&get), None), Err(Mismatch::Action));
    }

    #[test]
    fn test_object_match_ignores_resource_without_object_pattern() {
        let filter = Pattern::new("ehr/1").unwrap();
        assert_eq!(object_match(None, Some(&filter), None, Some("ehr/2")), Ok(()));
    }

    #[parameterized(
        object_absent = { None, Some("ehr/1"), Err(Mismatch::ObjectAbsent) },
        object_wrong = { Some("COMPOSITION"), Some("ehr/1"), Err(Mismatch::Object) },
        resource_absent = { Some("EHR"), None, Err(Mismatch::ResourceAbsent) },
        resource_wrong = { Some("EHR"), Some("ehr/2"), Err(Mismatch::Resource) },
        all_match = { Some("EHR"), Some("ehr/1"), Ok(()) },
    )]
    fn test_object_match_with_filter(
        object: Option<&str>,
        resource: Option<&str>,
        expected: Result<(), Mismatch>,
    ) {
        let object_pattern = Pattern::new("EHR").unwrap();
        let filter = Pattern::new(r"ehr/1").unwrap();
        assert_eq!(
            object_match(Some(&object_pattern), Some(&filter), object, resource),
            expected
        );
    }

    #[test]
    fn test_object_match_without_filter_accepts_missing_resource() {
        let object_pattern = Pattern::new("EHR").unwrap();
        assert_eq!(object_match(Some(&object_pattern), None, Some("EHR"), None), Ok(()));
    }

    #[test]
    fn test_parameters_empty_constraints_always_pass() {
        assert_eq!(parameters_match(&BTreeMap::new(), None), Ok(()));
        assert_eq!(
            parameters_match(&BTreeMap::new(), Some(&params(&[("x", &["y"])]))),
            Ok(())
        );
    }

    #[test]
    fn test_parameters_absent() {
        let rule = constraints(&[("dept", &["ICU"])]);
        assert_eq!(parameters_match(&rule, None), Err(Mismatch::ParametersAbsent));
    }

    #[parameterized(
        value_mismatch = { &[("dept", &["ER"])], Err(Mismatch::ParameterValue("dept".to_string())) },
        key_missing = { &[("ward", &["ICU"])], Err(Mismatch::ParameterMissing("dept".to_string())) },
        one_of_many_values = { &[("dept", &["ER", "ICU"])], Ok(()) },
        empty_value_list = { &[("dept", &[])], Err(Mismatch::ParameterValue("dept".to_string())) },
    )]
    fn test_parameters_single_key(
        probe: &[(&str, &[&str])],
        expected: Result<(), Mismatch>,
    ) {
        let rule = constraints(&[("dept", &["ICU"])]);
        assert_eq!(parameters_match(&rule, Some(&params(probe))), expected);
    }

    #[test]
    fn test_parameters_or_within_key() {
        let rule = constraints(&[("dept", &["ICU", "ER"])]);
        assert_eq!(parameters_match(&rule, Some(&params(&[("dept", &["ER"])]))), Ok(()));
    }

    #[test]
    fn test_parameters_and_across_keys() {
        let rule = constraints(&[("dept", &["ICU"]), ("role", &["nurse|doctor"])]);
        assert_eq!(
            parameters_match(&rule, Some(&params(&[("dept", &["ICU"]), ("role", &["doctor"])]))),
            Ok(())
        );
        assert_eq!(
            parameters_match(&rule, Some(&params(&[("dept", &["ICU"]), ("role", &["clerk"])]))),
            Err(Mismatch::ParameterValue("role".to_string()))
        );
    }
}
