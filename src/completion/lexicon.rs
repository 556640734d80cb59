//! Language lexicon: keyword constants, function and operator registries

use super::registry::Registry;
use serde::{Deserialize, Serialize};

pub const SELECT: &str = "SELECT";
pub const FROM: &str = "FROM";
pub const WHERE: &str = "WHERE";
pub const GROUP: &str = "GROUP";
pub const ORDER: &str = "ORDER";
pub const BY: &str = "BY";
pub const DESC: &str = "DESC";
pub const ASC: &str = "ASC";
pub const LIMIT: &str = "LIMIT";
pub const WITH: &str = "WITH";
pub const AS: &str = "AS";
pub const AND: &str = "AND";
pub const OR: &str = "OR";
pub const EQUALS: &str = "=";
pub const NOT_EQUALS: &str = "!=";
pub const IS_NOT: &str = "IS NOT";
pub const STATEMENT_SEPARATOR: &str = "/";

pub const KEYWORDS: &[&str] = &[
    SELECT, FROM, WHERE, GROUP, ORDER, BY, DESC, ASC, LIMIT, WITH, AS, AND, OR,
];

/// Aggregations every dialect supports
pub const STD_STATS: &[&str] = &["AVG", "COUNT", "MAX", "MIN", "SUM"];

/// Base comparison operators as (id, operator)
pub const COMPARISON_OPERATORS: &[(&str, &str)] = &[
    ("EQUAL", EQUALS),
    ("NOT_EQUAL", NOT_EQUALS),
    ("IS_NOT", IS_NOT),
];

/// Base logical operators as (id, operator)
pub const LOGICAL_OPERATORS: &[(&str, &str)] = &[("LOGICAL_AND", AND), ("LOGICAL_OR", OR)];

/// A function known to the language
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: String,
    pub name: String,
}

impl FunctionDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Definition whose id is its name
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorType {
    Comparison,
    Logical,
}

/// An operator known to the language
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    pub id: String,
    pub operator: String,
    #[serde(rename = "type")]
    pub operator_type: OperatorType,
}

impl OperatorDefinition {
    pub fn new(id: impl Into<String>, operator: impl Into<String>, operator_type: OperatorType) -> Self {
        Self {
            id: id.into(),
            operator: operator.into(),
            operator_type,
        }
    }
}

/// Functions and operators the completion engine may suggest
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    functions: Registry<String, FunctionDefinition>,
    operators: Registry<String, OperatorDefinition>,
}

impl Lexicon {
    /// Lexicon seeded with the standard aggregates and base operators
    pub fn standard() -> Self {
        let mut lexicon = Self::default();
        for name in STD_STATS {
            lexicon.register_function(FunctionDefinition::named(name));
        }
        for (id, op) in COMPARISON_OPERATORS {
            lexicon.register_operator(OperatorDefinition::new(*id, *op, OperatorType::Comparison));
        }
        for (id, op) in LOGICAL_OPERATORS {
            lexicon.register_operator(OperatorDefinition::new(*id, *op, OperatorType::Logical));
        }
        lexicon
    }

    /// Returns false when the id is already known
    pub fn register_function(&mut self, function: FunctionDefinition) -> bool {
        self.functions.register(function.id.clone(), function)
    }

    /// Returns false when the id is already known
    pub fn register_operator(&mut self, operator: OperatorDefinition) -> bool {
        self.operators.register(operator.id.clone(), operator)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.functions.list()
    }

    pub fn operators_of(&self, operator_type: OperatorType) -> impl Iterator<Item = &OperatorDefinition> {
        self.operators
            .list()
            .filter(move |op| op.operator_type == operator_type)
    }

    pub fn has_function(&self, id: &str) -> bool {
        self.functions.contains(&id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lexicon() {
        let lexicon = Lexicon::standard();
        let names: Vec<_> = lexicon.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["AVG", "COUNT", "MAX", "MIN", "SUM"]);

        let comparisons: Vec<_> = lexicon
            .operators_of(OperatorType::Comparison)
            .map(|o| o.operator.as_str())
            .collect();
        assert_eq!(comparisons, vec!["=", "!=", "IS NOT"]);

        let logical: Vec<_> = lexicon
            .operators_of(OperatorType::Logical)
            .map(|o| o.operator.as_str())
            .collect();
        assert_eq!(logical, vec!["AND", "OR"]);
    }

    #[test]
    fn test_existing_function_id_is_skipped() {
        let mut lexicon = Lexicon::standard();
        assert!(!lexicon.register_function(FunctionDefinition::new("COUNT", "count")));
        assert!(lexicon.register_function(FunctionDefinition::named("COUNTIF")));
        assert_eq!(lexicon.functions().count(), 6);
        assert!(lexicon.has_function("COUNTIF"));
    }
}
