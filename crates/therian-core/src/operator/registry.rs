//! Operator registry and matcher
//!
//! Collects the operators of every module into a single ordered list. Order
//! is a deterministic topological sort: a strictly more specific operator
//! precedes a more general one of the same kind, a dependency precedes its
//! dependent when neither is more specific, and declaration order breaks
//! the remaining ties.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use super::RegisteredOperator;
use crate::operation::Profile;
use crate::{Error, Result};
use log::{debug, trace};
use std::cmp::Reverse;
use std::any::TypeId;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

/// Ordered, validated operators of an engine
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: Vec<Arc<RegisteredOperator>>,
}

impl OperatorRegistry {
    /// Validate and order operators given in declaration order
    pub fn build(declared: impl IntoIterator<Item = RegisteredOperator>) -> Result<Self> {
        let mut seen: HashMap<String, (TypeId, &'static str)> = HashMap::new();
        let mut operators = Vec::new();
        for operator in declared {
            match seen.get(operator.name()) {
                None => {
                    validate(&operator)?;
                    seen.insert(
                        operator.name().to_string(),
                        (operator.type_id(), operator.type_name()),
                    );
                    operators.push(operator);
                }
                Some((type_id, _)) if *type_id == operator.type_id() => {
                    debug!("Skipping duplicate registration of {}", operator.name());
                }
                Some((_, registered)) => {
                    return Err(Error::configuration(format!(
                        "operator name '{}' is used by both {} and {}",
                        operator.name(),
                        registered,
                        operator.type_name()
                    )));
                }
            }
        }

        check_dependencies(&operators)?;
        let order = sort(&operators)?;

        let mut slots: Vec<Option<RegisteredOperator>> = operators.into_iter().map(Some).collect();
        let operators = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .map(Arc::new)
            .collect();
        Ok(Self { operators })
    }

    /// All operators in dispatch order
    pub fn operators(&self) -> &[Arc<RegisteredOperator>] {
        &self.operators
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RegisteredOperator>> {
        self.operators.iter().find(|op| op.name() == name)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Operators whose kind and signature match `profile`, in dispatch order
    pub fn candidates(&self, profile: &Profile) -> Vec<Arc<RegisteredOperator>> {
        let found: Vec<_> = self
            .operators
            .iter()
            .filter(|op| op.kind() == profile.kind && op.signature().matches(&profile.args).is_some())
            .cloned()
            .collect();
        trace!("{} candidate(s) for {}", found.len(), profile);
        found
    }
}

fn validate(operator: &RegisteredOperator) -> Result<()> {
    let expected = operator.kind().arity();
    if operator.signature().arity() != expected {
        return Err(Error::operator_definition(
            operator.name(),
            format!(
                "{} takes {} type argument(s) but the signature {} declares {}",
                operator.kind(),
                expected,
                operator.signature(),
                operator.signature().arity()
            ),
        ));
    }

    let mut occurrences: HashMap<&str, (usize, bool)> = HashMap::new();
    for pattern in operator.signature().patterns() {
        for var in pattern.variables() {
            let entry = occurrences.entry(var.name.as_str()).or_insert((0, false));
            entry.0 += 1;
            entry.1 |= var.bound.is_some();
        }
    }
    if let Some((name, _)) = occurrences
        .iter()
        .find(|(_, (count, bounded))| *count < 2 && !bounded)
    {
        return Err(Error::operator_definition(
            operator.name(),
            format!("type variable {} is unbounded and used only once", name),
        ));
    }
    Ok(())
}

fn check_dependencies(operators: &[RegisteredOperator]) -> Result<()> {
    let index: HashMap<&str, usize> = operators
        .iter()
        .enumerate()
        .map(|(i, op)| (op.name(), i))
        .collect();

    for operator in operators {
        for dependency in operator.depends_on() {
            if !index.contains_key(dependency.as_str()) {
                return Err(Error::configuration(format!(
                    "operator {} depends on {}, which is not registered",
                    operator.name(),
                    dependency
                )));
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    fn visit(
        node: usize,
        operators: &[RegisteredOperator],
        index: &HashMap<&str, usize>,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Result<()> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let cycle: Vec<&str> = path[start..]
                    .iter()
                    .chain(std::iter::once(&node))
                    .map(|n| operators[*n].name())
                    .collect();
                return Err(Error::configuration(format!(
                    "cyclic operator dependency: {}",
                    cycle.join(" -> ")
                )));
            }
            Mark::Unvisited => {}
        }
        marks[node] = Mark::Active;
        path.push(node);
        for dependency in operators[node].depends_on() {
            if let Some(&next) = index.get(dependency.as_str()) {
                visit(next, operators, index, marks, path)?;
            }
        }
        path.pop();
        marks[node] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; operators.len()];
    for node in 0..operators.len() {
        visit(node, operators, &index, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}

/// Kahn's algorithm, always releasing the earliest-declared ready operator
fn sort(operators: &[RegisteredOperator]) -> Result<Vec<usize>> {
    let n = operators.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for a in 0..n {
        for b in 0..n {
            if a == b || operators[a].kind() != operators[b].kind() {
                continue;
            }
            let (sa, sb) = (operators[a].signature(), operators[b].signature());
            let before = if sa.is_more_specific_than(sb) {
                true
            } else if sb.is_more_specific_than(sa) {
                false
            } else {
                operators[b].depends_on().iter().any(|d| d == operators[a].name())
            };
            if before {
                edges[a].push(b);
                in_degree[b] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|i| in_degree[*i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(next)) = ready.pop() {
        order.push(next);
        for &after in &edges[next] {
            in_degree[after] -= 1;
            if in_degree[after] == 0 {
                ready.push(Reverse(after));
            }
        }
    }

    if order.len() != n {
        let stuck: Vec<&str> = (0..n)
            .filter(|i| in_degree[*i] > 0)
            .map(|i| operators[i].name())
            .collect();
        return Err(Error::configuration(format!(
            "operators cannot be ordered consistently: {}",
            stuck.join(", ")
        )));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::operation::{Operation, Size};
    use crate::operator::{Operator, Signature};
    use crate::types::Type;

    struct Fixed {
        name: &'static str,
        pattern: Type,
        depends: Vec<&'static str>,
    }

    impl Operator for Fixed {
        type Operation = Size;

        fn signature(&self) -> Signature {
            Signature::new([self.pattern.clone()])
        }

        fn supports(&self, _: &mut EvaluationContext, _: &Size) -> Result<bool> {
            Ok(true)
        }

        fn perform(&self, _: &mut EvaluationContext, op: &mut Size) -> Result<bool> {
            op.set_result(0);
            Ok(true)
        }

        fn depends_on(&self) -> Vec<&'static str> {
            self.depends.clone()
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn op(name: &'static str, pattern: Type, depends: Vec<&'static str>) -> RegisteredOperator {
        RegisteredOperator::new(Fixed {
            name,
            pattern,
            depends,
        })
    }

    fn names(registry: &OperatorRegistry) -> Vec<&str> {
        registry.operators().iter().map(|o| o.name()).collect()
    }

    #[test]
    fn test_specific_before_general() {
        let registry = OperatorRegistry::build([
            op("general", Type::Object, vec![]),
            op("arrays", Type::array(Type::any()), vec![]),
        ])
        .unwrap();
        assert_eq!(names(&registry), vec!["arrays", "general"]);
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        let registry = OperatorRegistry::build([
            op("second", Type::Object, vec![]),
            op("first", Type::Object, vec![]),
        ])
        .unwrap();
        assert_eq!(names(&registry), vec!["second", "first"]);
    }

    #[test]
    fn test_dependency_precedes_dependent_among_equals() {
        let registry = OperatorRegistry::build([
            op("dependent", Type::Object, vec!["dependency"]),
            op("dependency", Type::Object, vec![]),
        ])
        .unwrap();
        assert_eq!(names(&registry), vec!["dependency", "dependent"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let registry = OperatorRegistry::build([
            op("same", Type::Object, vec![]),
            op("same", Type::String, vec![]),
        ])
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("same").unwrap().signature(), &Signature::new([Type::Object]));
    }

    mod elsewhere {
        use super::*;

        /// Same short name as the test operator, different type
        pub struct Fixed;

        impl Operator for Fixed {
            type Operation = Size;

            fn signature(&self) -> Signature {
                Signature::new([Type::Object])
            }

            fn supports(&self, _: &mut EvaluationContext, _: &Size) -> Result<bool> {
                Ok(false)
            }

            fn perform(&self, _: &mut EvaluationContext, _: &mut Size) -> Result<bool> {
                Ok(false)
            }
        }
    }

    #[test]
    fn test_distinct_types_cannot_share_a_name() {
        let clash = OperatorRegistry::build([
            op("Fixed", Type::String, vec![]),
            RegisteredOperator::new(elsewhere::Fixed),
        ]);
        match clash {
            Err(Error::Configuration { message }) => {
                assert!(message.contains("'Fixed'"), "{}", message);
                assert!(message.contains("elsewhere::Fixed"), "{}", message);
            }
            other => panic!("expected a configuration error, got {:?}", other.map(|r| r.len())),
        }

        let renamed = OperatorRegistry::build([
            op("strings", Type::String, vec![]),
            RegisteredOperator::new(elsewhere::Fixed),
        ])
        .unwrap();
        assert_eq!(names(&renamed), vec!["strings", "Fixed"]);
    }

    #[test]
    fn test_cycles_and_missing_dependencies_rejected() {
        let cyclic = OperatorRegistry::build([
            op("a", Type::Object, vec!["b"]),
            op("b", Type::Object, vec!["a"]),
        ]);
        assert!(matches!(cyclic, Err(Error::Configuration { .. })));

        let missing = OperatorRegistry::build([op("a", Type::Object, vec!["ghost"])]);
        assert!(matches!(missing, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_signature_validation() {
        let unbound = OperatorRegistry::build([op("loose", Type::var("T"), vec![])]);
        assert!(matches!(unbound, Err(Error::OperatorDefinition { .. })));

        let bounded = OperatorRegistry::build([op("ok", Type::bounded_var("N", Type::Number), vec![])]);
        assert!(bounded.is_ok());
    }

    #[test]
    fn test_candidates_filter_by_signature() {
        let registry = OperatorRegistry::build([
            op("strings", Type::CharSequence, vec![]),
            op("arrays", Type::array(Type::any()), vec![]),
        ])
        .unwrap();
        let profile = Size::new(crate::position::Positions::read_only_value(crate::value::Value::string("x")))
            .profile();
        let found: Vec<String> = registry
            .candidates(&profile)
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(found, vec!["strings".to_string()]);
    }
}
