//! Expanding an environment matrix into concrete environments.
//!
//! A matrix maps each variable to the values it should take. Expansion
//! produces one environment per combination, each a list of `KEY=VALUE`
//! strings in key order.

use std::collections::BTreeMap;

/// Expand `matrix` into every combination of its values.
///
/// Keys with no values are dropped. With nothing left the result is a single
/// empty environment.
///
/// ```
/// use std::collections::BTreeMap;
/// use bundle_util::expand_env_matrix;
///
/// let matrix = BTreeMap::from([
///     ("KEY".to_string(), vec!["A".to_string(), "B".to_string()]),
///     ("OTHER".to_string(), vec!["VALUE".to_string()]),
/// ]);
/// assert_eq!(
///     expand_env_matrix(&matrix),
///     [["KEY=A", "OTHER=VALUE"], ["KEY=B", "OTHER=VALUE"]]
/// );
/// ```
pub fn expand_env_matrix(matrix: &BTreeMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut environments: Vec<Vec<String>> = vec![Vec::new()];

    for (key, values) in matrix.iter().filter(|(_, values)| !values.is_empty()) {
        environments = environments
            .into_iter()
            .flat_map(|env| {
                values.iter().map(move |value| {
                    let mut next = env.clone();
                    next.push(format!("{key}={value}"));
                    next
                })
            })
            .collect();
    }

    environments
}
