/// Parametrized SQL fragments
///
/// Dynamic queries (list filters, partial updates) are assembled from
/// [`Clause`]s: an ordered list of fragments where every fragment is either
/// static SQL text or a value that will be bound as a `$n` parameter. Clauses
/// are collected into a [`ClauseList`] and rendered into a
/// `sqlx::QueryBuilder<Postgres>` joined by a separator (` AND ` for WHERE,
/// `, ` for SET).
///
/// Caller input never reaches the SQL text: only `&'static str` fragments are
/// pushed verbatim, everything else goes through `push_bind`.
///
/// # Example
///
/// ```
/// use fixr_shared::db::query::{Clause, ClauseList};
/// use sqlx::{Postgres, QueryBuilder};
///
/// let mut filter = ClauseList::new();
/// filter.push(Clause::new().sql("s.user_id = ").bind("user_1"));
/// filter.push(Clause::new().sql("s.parent_service_id IS NULL"));
///
/// let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM services s");
/// filter.push_where(&mut qb);
///
/// assert_eq!(
///     qb.sql(),
///     "SELECT COUNT(*) FROM services s WHERE s.user_id = $1 AND s.parent_service_id IS NULL"
/// );
/// ```

use serde_json::Value as JsonValue;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A value bound as a query parameter
///
/// Optional variants bind SQL `NULL` when `None`, which is how partial
/// updates clear nullable columns.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Int(Option<i32>),
    BigInt(i64),
    Json(Option<JsonValue>),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(Some(value.to_string()))
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(Some(value))
    }
}

impl From<Option<String>> for BindValue {
    fn from(value: Option<String>) -> Self {
        BindValue::Text(value)
    }
}

impl From<Uuid> for BindValue {
    fn from(value: Uuid) -> Self {
        BindValue::Uuid(Some(value))
    }
}

impl From<Option<Uuid>> for BindValue {
    fn from(value: Option<Uuid>) -> Self {
        BindValue::Uuid(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        BindValue::Int(Some(value))
    }
}

impl From<Option<i32>> for BindValue {
    fn from(value: Option<i32>) -> Self {
        BindValue::Int(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::BigInt(value)
    }
}

impl From<Option<JsonValue>> for BindValue {
    fn from(value: Option<JsonValue>) -> Self {
        BindValue::Json(value)
    }
}

impl BindValue {
    /// Pushes this value as the next positional parameter
    pub fn push_into(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self.clone() {
            BindValue::Text(v) => qb.push_bind(v),
            BindValue::Uuid(v) => qb.push_bind(v),
            BindValue::Int(v) => qb.push_bind(v),
            BindValue::BigInt(v) => qb.push_bind(v),
            BindValue::Json(v) => qb.push_bind(v),
        };
    }
}

/// One piece of a clause
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Sql(&'static str),
    Bind(BindValue),
}

/// An ordered run of SQL text and bound values, e.g. `s.name ILIKE $1`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    fragments: Vec<Fragment>,
}

impl Clause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends static SQL text
    pub fn sql(mut self, text: &'static str) -> Self {
        self.fragments.push(Fragment::Sql(text));
        self
    }

    /// Appends a bound parameter
    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.fragments.push(Fragment::Bind(value.into()));
        self
    }

    pub fn push_into(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Sql(text) => {
                    qb.push(*text);
                }
                Fragment::Bind(value) => value.push_into(qb),
            }
        }
    }
}

/// Ordered list of clauses rendered with a separator
///
/// The same list can be rendered into several builders (count query and
/// page query share one filter), because rendering only borrows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseList {
    clauses: Vec<Clause>,
}

impl ClauseList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Renders the clauses joined by `separator`
    pub fn push_joined(&self, qb: &mut QueryBuilder<'_, Postgres>, separator: &'static str) {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                qb.push(separator);
            }
            clause.push_into(qb);
        }
    }

    /// Renders ` WHERE a AND b ...`, or nothing when the list is empty
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if self.is_empty() {
            return;
        }
        qb.push(" WHERE ");
        self.push_joined(qb, " AND ");
    }

    /// Renders `a, b ...` for an UPDATE SET list
    pub fn push_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        self.push_joined(qb, ", ");
    }
}

/// Wraps a search term for a case-insensitive substring match
///
/// LIKE metacharacters in the term are escaped so they match literally.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
