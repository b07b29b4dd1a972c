use super::{
    filter_object, json_int, json_string, not_a_filter, parse_int, replace_or_push,
    substring_pattern,
};
use crate::error::{JoblyError, JoblyResult};
use crate::fragment::{Clause, Fragment, Operator, SqlFragment};
use crate::ident::Column;
use serde_json::Value;

/// One recognised company filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyCriterion {
    /// `name`: case-insensitive substring of the company name.
    Name(String),
    /// `minEmployees`
    MinEmployees(i32),
    /// `maxEmployees`
    MaxEmployees(i32),
}

impl CompanyCriterion {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::MinEmployees(_) => "minEmployees",
            Self::MaxEmployees(_) => "maxEmployees",
        }
    }

    fn from_json(key: &str, value: &Value) -> JoblyResult<Self> {
        match key {
            "name" => Ok(Self::Name(json_string(key, value)?)),
            "minEmployees" => Ok(Self::MinEmployees(json_int(key, value)?)),
            "maxEmployees" => Ok(Self::MaxEmployees(json_int(key, value)?)),
            _ => Err(not_a_filter(key)),
        }
    }

    fn from_query(key: &str, raw: &str) -> JoblyResult<Self> {
        match key {
            "name" => Ok(Self::Name(raw.to_string())),
            "minEmployees" => Ok(Self::MinEmployees(parse_int(key, raw)?)),
            "maxEmployees" => Ok(Self::MaxEmployees(parse_int(key, raw)?)),
            _ => Err(not_a_filter(key)),
        }
    }

    fn clause(&self) -> JoblyResult<Clause> {
        Ok(match self {
            Self::Name(name) => {
                Clause::bind(Column::new("name")?, Operator::Ilike, substring_pattern(name))
            }
            Self::MinEmployees(n) => Clause::bind(Column::new("num_employees")?, Operator::Gte, *n),
            Self::MaxEmployees(n) => Clause::bind(Column::new("num_employees")?, Operator::Lte, *n),
        })
    }
}

/// Filter for listing companies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    criteria: Vec<CompanyCriterion>,
}

impl CompanyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        replace_or_push(&mut self.criteria, CompanyCriterion::Name(name.into()));
        self
    }

    pub fn min_employees(mut self, n: i32) -> Self {
        replace_or_push(&mut self.criteria, CompanyCriterion::MinEmployees(n));
        self
    }

    pub fn max_employees(mut self, n: i32) -> Self {
        replace_or_push(&mut self.criteria, CompanyCriterion::MaxEmployees(n));
        self
    }

    /// Parse `{name?, minEmployees?, maxEmployees?}`.
    ///
    /// Keys are read in order; the first unknown key fails with
    /// `BadRequest("<key> is not an appropriate filter option")`.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut criteria = Vec::new();
        for (key, value) in filter_object(value)? {
            replace_or_push(&mut criteria, CompanyCriterion::from_json(key, value)?);
        }
        Ok(Self { criteria })
    }

    /// Parse query-string pairs.
    pub fn from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> JoblyResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Vec::new();
        for (key, raw) in pairs {
            replace_or_push(
                &mut criteria,
                CompanyCriterion::from_query(key.as_ref(), raw.as_ref())?,
            );
        }
        Ok(Self { criteria })
    }

    pub fn criteria(&self) -> &[CompanyCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    fn min_employees_value(&self) -> Option<i32> {
        self.criteria.iter().find_map(|c| match c {
            CompanyCriterion::MinEmployees(n) => Some(*n),
            _ => None,
        })
    }

    fn max_employees_value(&self) -> Option<i32> {
        self.criteria.iter().find_map(|c| match c {
            CompanyCriterion::MaxEmployees(n) => Some(*n),
            _ => None,
        })
    }

    /// Reject a contradictory employee range.
    pub fn check_range(&self) -> JoblyResult<()> {
        match (self.min_employees_value(), self.max_employees_value()) {
            (Some(min), Some(max)) if min > max => Err(JoblyError::bad_request(
                "The filter minEmployees cannot be greater than the filter maxEmployees",
            )),
            _ => Ok(()),
        }
    }

    pub fn to_fragment(&self) -> JoblyResult<Fragment> {
        let mut fragment = Fragment::and();
        for criterion in &self.criteria {
            fragment.push(criterion.clause()?);
        }
        Ok(fragment)
    }

    /// Render the clauses standalone, numbered from `$1`.
    pub fn where_clause(&self) -> JoblyResult<SqlFragment> {
        Ok(self.to_fragment()?.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn all_keys_in_given_order() {
        let filter =
            CompanyFilter::from_json(&json!({"name": "dav", "minEmployees": 1, "maxEmployees": 10}))
                .unwrap();
        let w = filter.where_clause().unwrap();
        assert_eq!(
            w.sql,
            r#""name" ILIKE $1 AND "num_employees" >= $2 AND "num_employees" <= $3"#
        );
        assert_eq!(
            w.params,
            vec![SqlValue::from("%dav%"), SqlValue::Int(1), SqlValue::Int(10)]
        );
    }

    #[test]
    fn key_order_decides_placeholder_order() {
        let w = CompanyFilter::from_json(&json!({"maxEmployees": 10, "name": "c"}))
            .unwrap()
            .where_clause()
            .unwrap();
        assert_eq!(w.sql, r#""num_employees" <= $1 AND "name" ILIKE $2"#);
        assert_eq!(w.params, vec![SqlValue::Int(10), SqlValue::from("%c%")]);
    }

    #[test]
    fn max_only() {
        let w = CompanyFilter::new().max_employees(10).where_clause().unwrap();
        assert_eq!(w.sql, r#""num_employees" <= $1"#);
        assert_eq!(w.params, vec![SqlValue::Int(10)]);
    }

    #[test]
    fn unknown_key_is_bad_request() {
        let err = CompanyFilter::from_json(&json!({"notAFilter": "x"})).unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("notAFilter is not an appropriate filter option"));
    }

    #[test]
    fn first_unknown_key_wins() {
        let err = CompanyFilter::from_json(&json!({"name": "a", "zzz": 1, "aaa": 2})).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn wrong_value_types_are_bad_request() {
        assert!(CompanyFilter::from_json(&json!({"name": 3})).is_err());
        assert!(CompanyFilter::from_json(&json!({"minEmployees": "many"})).is_err());
        assert!(CompanyFilter::from_json(&json!("name")).is_err());
    }

    #[test]
    fn contradictory_range() {
        let filter = CompanyFilter::new().min_employees(10).max_employees(1);
        assert!(filter.check_range().unwrap_err().is_bad_request());
        assert!(CompanyFilter::new().min_employees(1).max_employees(1).check_range().is_ok());
        assert!(CompanyFilter::new().min_employees(10).check_range().is_ok());
    }

    #[test]
    fn query_pairs_replace_repeated_keys_in_place() {
        let filter = CompanyFilter::from_query([
            ("minEmployees", "2"),
            ("name", "net"),
            ("minEmployees", "5"),
        ])
        .unwrap();
        assert_eq!(
            filter.criteria(),
            &[
                CompanyCriterion::MinEmployees(5),
                CompanyCriterion::Name("net".into()),
            ]
        );
        assert!(CompanyFilter::from_query([("minEmployees", "x")]).is_err());
        assert!(CompanyFilter::from_query([("handle", "c1")]).is_err());
    }

    #[test]
    fn empty_filter_renders_nothing() {
        let filter = CompanyFilter::from_json(&json!({})).unwrap();
        assert!(filter.is_empty());
        assert!(filter.where_clause().unwrap().is_empty());
    }
}
