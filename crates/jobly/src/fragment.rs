//! Positional SQL fragments.
//!
//! A [`Fragment`] is an ordered list of [`Clause`]s. Each clause carries its
//! own operand: either a value to bind or a constant written into the SQL
//! text. Placeholder numbers are never stored; they are assigned when the
//! fragment is written into a [`Sql`] builder, counting only the clauses that
//! actually bind a value. A dropped clause is simply never pushed, so the Nth
//! placeholder always lines up with the Nth parameter.

use crate::ident::Column;
use crate::sql::Sql;
use crate::value::SqlValue;

/// How clauses of a fragment are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// `a AND b`, for WHERE clauses.
    And,
    /// `a, b`, for SET lists.
    Comma,
}

impl Connective {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Comma => ", ",
        }
    }
}

/// Clause operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `"col"=$n` inside a SET list.
    Assign,
    Eq,
    Gt,
    Gte,
    Lte,
    /// Case-insensitive pattern match.
    Ilike,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Eq => " = ",
            Self::Gt => " > ",
            Self::Gte => " >= ",
            Self::Lte => " <= ",
            Self::Ilike => " ILIKE ",
        }
    }
}

/// Right-hand side of a clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as the next `$n` placeholder.
    Bind(SqlValue),
    /// Written verbatim; consumes no placeholder.
    Const(&'static str),
}

/// A single `column <op> operand` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: Column,
    pub op: Operator,
    pub operand: Operand,
}

impl Clause {
    /// A clause that binds `value`.
    pub fn bind(column: Column, op: Operator, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            op,
            operand: Operand::Bind(value.into()),
        }
    }

    /// A clause with a constant right-hand side.
    pub fn constant(column: Column, op: Operator, sql: &'static str) -> Self {
        Self {
            column,
            op,
            operand: Operand::Const(sql),
        }
    }
}

/// An ordered list of clauses joined by one connective.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    connective: Connective,
    clauses: Vec<Clause>,
}

impl Fragment {
    pub fn new(connective: Connective) -> Self {
        Self {
            connective,
            clauses: Vec::new(),
        }
    }

    /// An empty `AND`-joined fragment.
    pub fn and() -> Self {
        Self::new(Connective::And)
    }

    /// An empty comma-joined fragment.
    pub fn comma() -> Self {
        Self::new(Connective::Comma)
    }

    pub fn push(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    pub fn connective(&self) -> Connective {
        self.connective
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Append this fragment to `sql`, numbering placeholders from wherever
    /// `sql` currently is.
    pub fn write_to(&self, sql: &mut Sql) {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push(self.connective.as_sql());
            }
            sql.push_column(&clause.column);
            sql.push(clause.op.as_sql());
            match &clause.operand {
                Operand::Bind(value) => {
                    sql.push_bind(value.clone());
                }
                Operand::Const(text) => {
                    sql.push(text);
                }
            }
        }
    }

    /// Render standalone, numbering placeholders from `$1`.
    pub fn render(&self) -> SqlFragment {
        let mut sql = Sql::empty();
        self.write_to(&mut sql);
        let text = sql.to_sql();
        SqlFragment {
            sql: text,
            params: sql.into_params(),
        }
    }
}

/// A rendered fragment: SQL text plus the parameters its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlFragment {
    /// Returns `true` when no clause survived; callers must then omit the
    /// keyword (`WHERE`/`SET`) entirely.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Column {
        Column::new(name).unwrap()
    }

    #[test]
    fn numbers_only_bound_clauses() {
        let mut f = Fragment::and();
        f.push(Clause::constant(col("equity"), Operator::Gt, "0"))
            .push(Clause::bind(col("salary"), Operator::Gte, 90000))
            .push(Clause::bind(col("title"), Operator::Ilike, "%job%"));

        let r = f.render();
        assert_eq!(
            r.sql,
            r#""equity" > 0 AND "salary" >= $1 AND "title" ILIKE $2"#
        );
        assert_eq!(r.params, vec![SqlValue::Int(90000), SqlValue::from("%job%")]);
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn assignment_list_is_tight() {
        let mut f = Fragment::comma();
        f.push(Clause::bind(col("description"), Operator::Assign, "d"))
            .push(Clause::bind(col("num_employees"), Operator::Assign, 1));
        assert_eq!(f.render().sql, r#""description"=$1, "num_employees"=$2"#);
    }

    #[test]
    fn empty_fragment_renders_empty() {
        let r = Fragment::and().render();
        assert!(r.is_empty());
        assert!(r.params.is_empty());
    }

    #[test]
    fn continues_numbering_inside_larger_statement() {
        let mut f = Fragment::comma();
        f.push(Clause::bind(col("salary"), Operator::Assign, 1));

        let mut q = Sql::new("UPDATE jobs SET ");
        f.write_to(&mut q);
        q.push(" WHERE title = ").push_bind("j1");
        assert_eq!(q.to_sql(), r#"UPDATE jobs SET "salary"=$1 WHERE title = $2"#);
    }

    #[test]
    fn render_is_repeatable() {
        let mut f = Fragment::and();
        f.push(Clause::bind(col("name"), Operator::Ilike, "%dav%"));
        assert_eq!(f.render(), f.render());
    }
}
