use super::{
    filter_object, json_bool, json_int, json_string, not_a_filter, parse_bool, parse_int,
    replace_or_push, substring_pattern,
};
use crate::error::JoblyResult;
use crate::fragment::{Clause, Fragment, Operator, SqlFragment};
use crate::ident::Column;
use serde_json::Value;

/// One recognised job filter key.
///
/// `HasEquity(true)` adds the constant predicate `"equity" > 0`;
/// `HasEquity(false)` adds nothing. Leaving the key out is the same as
/// `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCriterion {
    /// `title`: case-insensitive substring of the job title.
    Title(String),
    /// `minSalary`
    MinSalary(i32),
    /// `hasEquity`
    HasEquity(bool),
}

impl JobCriterion {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::MinSalary(_) => "minSalary",
            Self::HasEquity(_) => "hasEquity",
        }
    }

    fn from_json(key: &str, value: &Value) -> JoblyResult<Self> {
        match key {
            "title" => Ok(Self::Title(json_string(key, value)?)),
            "minSalary" => Ok(Self::MinSalary(json_int(key, value)?)),
            "hasEquity" => Ok(Self::HasEquity(json_bool(key, value)?)),
            _ => Err(not_a_filter(key)),
        }
    }

    fn from_query(key: &str, raw: &str) -> JoblyResult<Self> {
        match key {
            "title" => Ok(Self::Title(raw.to_string())),
            "minSalary" => Ok(Self::MinSalary(parse_int(key, raw)?)),
            "hasEquity" => Ok(Self::HasEquity(parse_bool(key, raw)?)),
            _ => Err(not_a_filter(key)),
        }
    }

    /// Clause for this criterion; `None` for `hasEquity: false`.
    fn clause(&self) -> JoblyResult<Option<Clause>> {
        let clause = match self {
            Self::Title(title) => {
                Clause::bind(Column::new("title")?, Operator::Ilike, substring_pattern(title))
            }
            Self::MinSalary(n) => Clause::bind(Column::new("salary")?, Operator::Gte, *n),
            Self::HasEquity(true) => Clause::constant(Column::new("equity")?, Operator::Gt, "0"),
            Self::HasEquity(false) => return Ok(None),
        };
        Ok(Some(clause))
    }
}

/// Filter for listing jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    criteria: Vec<JobCriterion>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        replace_or_push(&mut self.criteria, JobCriterion::Title(title.into()));
        self
    }

    pub fn min_salary(mut self, n: i32) -> Self {
        replace_or_push(&mut self.criteria, JobCriterion::MinSalary(n));
        self
    }

    pub fn has_equity(mut self, has_equity: bool) -> Self {
        replace_or_push(&mut self.criteria, JobCriterion::HasEquity(has_equity));
        self
    }

    /// Parse `{title?, minSalary?, hasEquity?}`.
    pub fn from_json(value: &Value) -> JoblyResult<Self> {
        let mut criteria = Vec::new();
        for (key, value) in filter_object(value)? {
            replace_or_push(&mut criteria, JobCriterion::from_json(key, value)?);
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
                JobCriterion::from_query(key.as_ref(), raw.as_ref())?,
            );
        }
        Ok(Self { criteria })
    }

    pub fn criteria(&self) -> &[JobCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Surviving clauses, in order. May be empty even when criteria are set.
    pub fn to_fragment(&self) -> JoblyResult<Fragment> {
        let mut fragment = Fragment::and();
        for criterion in &self.criteria {
            if let Some(clause) = criterion.clause()? {
                fragment.push(clause);
            }
        }
        Ok(fragment)
    }

    pub fn where_clause(&self) -> JoblyResult<SqlFragment> {
        Ok(self.to_fragment()?.render())
    }
}
