//! Parameterized SQL builder.
//!
//! Renders MySQL text with positional `?` placeholders plus the matching
//! parameter vector. Output is a pure function of the builder calls, so the
//! same calls always produce byte-identical text (which the result cache
//! relies on). `LIMIT`/`OFFSET` are inlined as literals; every other value
//! is bound.

use serde::Serialize;
use serde_json::Value;

use crate::Record;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    /// Convert a JSON value from an entity's storage projection. Arrays and
    /// objects are stored as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlParam::Text(s.clone()),
            other => SqlParam::Text(other.to_string()),
        }
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(i64::from(v))
    }
}

impl From<u32> for SqlParam {
    fn from(v: u32) -> Self {
        SqlParam::Int(i64::from(v))
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<&String> for SqlParam {
    fn from(v: &String) -> Self {
        SqlParam::Text(v.clone())
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Finished statement text plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamQuery {
    pub text: String,
    pub values: Vec<SqlParam>,
}

impl ParamQuery {
    /// A hand-written statement, used for stored procedure calls.
    pub fn raw(text: impl Into<String>, values: Vec<SqlParam>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// Append the statement terminator.
    pub fn terminated(mut self) -> Self {
        self.text.push(';');
        self
    }
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Which identifiers get back-quoted. Aliases are always quoted: table
/// aliases with back-quotes, field aliases with double quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteOptions {
    pub tables: bool,
    pub fields: bool,
}

impl QuoteOptions {
    pub const ALL: QuoteOptions = QuoteOptions {
        tables: true,
        fields: true,
    };
    pub const TABLES: QuoteOptions = QuoteOptions {
        tables: true,
        fields: false,
    };
    pub const NONE: QuoteOptions = QuoteOptions {
        tables: false,
        fields: false,
    };

    fn table(&self, name: &str) -> String {
        if self.tables {
            format!("`{name}`")
        } else {
            name.to_string()
        }
    }

    fn field(&self, name: &str) -> String {
        if !self.fields {
            return name.to_string();
        }
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    format!("`{part}`")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn table_alias(alias: &str) -> String {
    format!("`{alias}`")
}

fn field_alias(alias: &str) -> String {
    format!("\"{alias}\"")
}

// ---------------------------------------------------------------------------
// Shared clause pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Source {
    Table(String),
    Query(Box<Select>),
}

#[derive(Debug, Clone)]
struct FromItem {
    source: Source,
    alias: Option<String>,
}

impl FromItem {
    fn render(&self, quote: QuoteOptions, out: &mut Vec<SqlParam>) -> String {
        let base = match &self.source {
            Source::Table(name) => quote.table(name),
            Source::Query(select) => format!("({})", select.render(out)),
        };
        match &self.alias {
            Some(alias) => format!("{base} {}", table_alias(alias)),
            None => base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    item: FromItem,
    on: Option<String>,
}

#[derive(Debug, Clone)]
struct Condition {
    text: String,
    values: Vec<SqlParam>,
}

fn render_where(conditions: &[Condition], out: &mut Vec<SqlParam>) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }
    let clauses: Vec<String> = conditions
        .iter()
        .map(|c| {
            out.extend(c.values.iter().cloned());
            format!("({})", c.text)
        })
        .collect();
    Some(format!("WHERE {}", clauses.join(" AND ")))
}

/// Value assigned to a column by `INSERT`/`UPDATE`.
#[derive(Debug, Clone)]
enum SetValue {
    Param(SqlParam),
    Query(Box<Select>),
}

impl SetValue {
    fn render(&self, out: &mut Vec<SqlParam>) -> String {
        match self {
            SetValue::Param(param) => {
                out.push(param.clone());
                "?".to_string()
            }
            SetValue::Query(select) => format!("({})", select.render(out)),
        }
    }
}

fn upsert(columns: &mut Vec<(String, SetValue)>, column: &str, value: SetValue) {
    match columns.iter_mut().find(|(name, _)| name == column) {
        Some(entry) => entry.1 = value,
        None => columns.push((column.to_string(), value)),
    }
}

/// Row locking hint appended to a `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    ForUpdate,
    ShareMode,
}

// ---------------------------------------------------------------------------
// SELECT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum FieldExpr {
    Name(String),
    Query(Box<Select>),
}

#[derive(Debug, Clone)]
struct Field {
    expr: FieldExpr,
    alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Select {
    quote: QuoteOptions,
    distinct: bool,
    fields: Vec<Field>,
    from: Vec<FromItem>,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    groups: Vec<String>,
    orders: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    lock: Option<RowLock>,
    unions: Vec<Select>,
}

impl Select {
    pub fn new(quote: QuoteOptions) -> Self {
        Self {
            quote,
            distinct: false,
            fields: Vec::new(),
            from: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            unions: Vec::new(),
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from.push(FromItem {
            source: Source::Table(table.to_string()),
            alias: None,
        });
        self
    }

    pub fn from_as(mut self, table: &str, alias: &str) -> Self {
        self.from.push(FromItem {
            source: Source::Table(table.to_string()),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn from_query(mut self, query: Select, alias: &str) -> Self {
        self.from.push(FromItem {
            source: Source::Query(Box::new(query)),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(Field {
            expr: FieldExpr::Name(name.to_string()),
            alias: None,
        });
        self
    }

    pub fn field_as(mut self, name: &str, alias: &str) -> Self {
        self.fields.push(Field {
            expr: FieldExpr::Name(name.to_string()),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn field_query(mut self, query: Select, alias: &str) -> Self {
        self.fields.push(Field {
            expr: FieldExpr::Query(Box::new(query)),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self = self.field(name.as_ref());
        }
        self
    }

    fn push_join(mut self, kind: JoinKind, source: Source, alias: &str, on: Option<&str>) -> Self {
        self.joins.push(Join {
            kind,
            item: FromItem {
                source,
                alias: Some(alias.to_string()),
            },
            on: on.map(str::to_string),
        });
        self
    }

    pub fn join(self, table: &str, alias: &str, on: &str) -> Self {
        self.push_join(JoinKind::Inner, Source::Table(table.into()), alias, Some(on))
    }

    pub fn left_join(self, table: &str, alias: &str, on: &str) -> Self {
        self.push_join(JoinKind::Left, Source::Table(table.into()), alias, Some(on))
    }

    pub fn right_join(self, table: &str, alias: &str, on: &str) -> Self {
        self.push_join(JoinKind::Right, Source::Table(table.into()), alias, Some(on))
    }

    /// Inner join against a sub-select with no join condition.
    pub fn join_query(self, query: Select, alias: &str) -> Self {
        self.push_join(JoinKind::Inner, Source::Query(Box::new(query)), alias, None)
    }

    /// Add a `WHERE` clause with one bound value.
    pub fn filter(mut self, text: &str, value: impl Into<SqlParam>) -> Self {
        self.conditions.push(Condition {
            text: text.to_string(),
            values: vec![value.into()],
        });
        self
    }

    /// Add a `WHERE` clause with no bound values.
    pub fn filter_expr(mut self, text: &str) -> Self {
        self.conditions.push(Condition {
            text: text.to_string(),
            values: Vec::new(),
        });
        self
    }

    pub fn group(mut self, name: &str) -> Self {
        self.groups.push(name.to_string());
        self
    }

    /// `ascending = false` renders `DESC`.
    pub fn order(mut self, name: &str, ascending: bool) -> Self {
        self.orders.push((name.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn lock(mut self, lock: RowLock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn union(mut self, query: Select) -> Self {
        self.unions.push(query);
        self
    }

    /// Apply `f` only when `condition` holds; keeps optional clauses in a
    /// single builder chain.
    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            f(self)
        } else {
            self
        }
    }

    fn render(&self, out: &mut Vec<SqlParam>) -> String {
        let quote = self.quote;
        let mut parts: Vec<String> = vec!["SELECT".into()];
        if self.distinct {
            parts.push("DISTINCT".into());
        }

        if self.fields.is_empty() {
            parts.push("*".into());
        } else {
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|field| {
                    let expr = match &field.expr {
                        FieldExpr::Name(name) => quote.field(name),
                        FieldExpr::Query(select) => format!("({})", select.render(out)),
                    };
                    match &field.alias {
                        Some(alias) => format!("{expr} AS {}", field_alias(alias)),
                        None => expr,
                    }
                })
                .collect();
            parts.push(fields.join(", "));
        }

        if !self.from.is_empty() {
            let items: Vec<String> = self.from.iter().map(|i| i.render(quote, out)).collect();
            parts.push(format!("FROM {}", items.join(", ")));
        }

        for join in &self.joins {
            let item = join.item.render(quote, out);
            match &join.on {
                Some(on) => parts.push(format!("{} {item} ON ({on})", join.kind.keyword())),
                None => parts.push(format!("{} {item}", join.kind.keyword())),
            }
        }

        if let Some(clause) = render_where(&self.conditions, out) {
            parts.push(clause);
        }
        if !self.groups.is_empty() {
            parts.push(format!("GROUP BY {}", self.groups.join(", ")));
        }
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(name, asc)| format!("{name} {}", if *asc { "ASC" } else { "DESC" }))
                .collect();
            parts.push(format!("ORDER BY {}", orders.join(", ")));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {offset}"));
        }
        match self.lock {
            Some(RowLock::ForUpdate) => parts.push("FOR UPDATE".into()),
            Some(RowLock::ShareMode) => parts.push("LOCK IN SHARE MODE".into()),
            None => {}
        }
        for union in &self.unions {
            parts.push(format!("UNION ({})", union.render(out)));
        }
        parts.join(" ")
    }

    pub fn to_param(&self) -> ParamQuery {
        let mut values = Vec::new();
        let text = self.render(&mut values);
        ParamQuery { text, values }
    }
}

// ---------------------------------------------------------------------------
// INSERT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Insert {
    quote: QuoteOptions,
    table: String,
    rows: Vec<Vec<(String, SetValue)>>,
}

impl Insert {
    pub fn into(quote: QuoteOptions, table: &str) -> Self {
        Self {
            quote,
            table: table.to_string(),
            rows: vec![Vec::new()],
        }
    }

    /// Set `column` on every row.
    pub fn set(mut self, column: &str, value: impl Into<SqlParam>) -> Self {
        let value = value.into();
        for row in &mut self.rows {
            upsert(row, column, SetValue::Param(value.clone()));
        }
        self
    }

    /// Set `column` on every row to the result of a sub-select.
    pub fn set_query(mut self, column: &str, query: Select) -> Self {
        for row in &mut self.rows {
            upsert(row, column, SetValue::Query(Box::new(query.clone())));
        }
        self
    }

    /// Set every entry of `record` on the (single) row.
    pub fn set_fields(mut self, record: &Record) -> Self {
        for (column, value) in record {
            self = self.set(column, SqlParam::from_json(value));
        }
        self
    }

    /// Replace the rows with one row per record. Columns are taken from the
    /// first record.
    pub fn set_fields_rows(mut self, records: &[Record]) -> Self {
        self.rows = records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .map(|(column, value)| {
                        (column.clone(), SetValue::Param(SqlParam::from_json(value)))
                    })
                    .collect()
            })
            .collect();
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        self
    }

    pub fn to_param(&self) -> ParamQuery {
        let mut values = Vec::new();
        let columns: Vec<&str> = self.rows[0].iter().map(|(c, _)| c.as_str()).collect();
        let quoted: Vec<String> = columns.iter().map(|c| self.quote.field(c)).collect();
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| match row.iter().find(|(name, _)| name == column) {
                        Some((_, value)) => value.render(&mut values),
                        None => {
                            values.push(SqlParam::Null);
                            "?".to_string()
                        }
                    })
                    .collect();
                format!("({})", cells.join(", "))
            })
            .collect();
        let text = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote.table(&self.table),
            quoted.join(", "),
            rows.join(", ")
        );
        ParamQuery { text, values }
    }
}

// ---------------------------------------------------------------------------
// UPDATE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Update {
    quote: QuoteOptions,
    table: String,
    sets: Vec<(String, SetValue)>,
    conditions: Vec<Condition>,
}

impl Update {
    pub fn table(quote: QuoteOptions, table: &str) -> Self {
        Self {
            quote,
            table: table.to_string(),
            sets: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn set(mut self, column: &str, value: impl Into<SqlParam>) -> Self {
        upsert(&mut self.sets, column, SetValue::Param(value.into()));
        self
    }

    pub fn set_query(mut self, column: &str, query: Select) -> Self {
        upsert(&mut self.sets, column, SetValue::Query(Box::new(query)));
        self
    }

    pub fn set_fields(mut self, record: &Record) -> Self {
        for (column, value) in record {
            self = self.set(column, SqlParam::from_json(value));
        }
        self
    }

    pub fn filter(mut self, text: &str, value: impl Into<SqlParam>) -> Self {
        self.conditions.push(Condition {
            text: text.to_string(),
            values: vec![value.into()],
        });
        self
    }

    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            f(self)
        } else {
            self
        }
    }

    pub fn to_param(&self) -> ParamQuery {
        let mut values = Vec::new();
        let sets: Vec<String> = self
            .sets
            .iter()
            .map(|(column, value)| format!("{} = {}", self.quote.field(column), value.render(&mut values)))
            .collect();
        let mut text = format!("UPDATE {} SET {}", self.quote.table(&self.table), sets.join(", "));
        if let Some(clause) = render_where(&self.conditions, &mut values) {
            text.push(' ');
            text.push_str(&clause);
        }
        ParamQuery { text, values }
    }
}

// ---------------------------------------------------------------------------
// DELETE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Delete {
    quote: QuoteOptions,
    table: String,
    conditions: Vec<Condition>,
}

impl Delete {
    pub fn from(quote: QuoteOptions, table: &str) -> Self {
        Self {
            quote,
            table: table.to_string(),
            conditions: Vec::new(),
        }
    }

    pub fn filter(mut self, text: &str, value: impl Into<SqlParam>) -> Self {
        self.conditions.push(Condition {
            text: text.to_string(),
            values: vec![value.into()],
        });
        self
    }

    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            f(self)
        } else {
            self
        }
    }

    pub fn to_param(&self) -> ParamQuery {
        let mut values = Vec::new();
        let mut text = format!("DELETE FROM {}", self.quote.table(&self.table));
        if let Some(clause) = render_where(&self.conditions, &mut values) {
            text.push(' ');
            text.push_str(&clause);
        }
        ParamQuery { text, values }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test records are objects"),
        }
    }

    // -- select --

    #[test]
    fn select_by_pk() {
        let query = Select::new(QuoteOptions::ALL)
            .from("CATEGORY_LIST")
            .filter("uid= ?", "test uid")
            .to_param()
            .terminated();
        assert_eq!(query.text, "SELECT * FROM `CATEGORY_LIST` WHERE (uid= ?);");
        assert_eq!(query.values, vec![SqlParam::Text("test uid".into())]);
    }

    #[test]
    fn select_quotes_fields_and_aliases() {
        let query = Select::new(QuoteOptions::ALL)
            .from_as("CATEGORY_LIST", "category")
            .fields(["test field"])
            .to_param();
        assert_eq!(query.text, "SELECT `test field` FROM `CATEGORY_LIST` `category`");
    }

    #[test]
    fn dotted_fields_are_quoted_per_segment() {
        let query = Select::new(QuoteOptions::ALL)
            .from_as("REGISTRATION", "registration")
            .field("registration.*")
            .field("hackathon.name")
            .to_param();
        assert_eq!(
            query.text,
            "SELECT `registration`.*, `hackathon`.`name` FROM `REGISTRATION` `registration`"
        );
    }

    #[test]
    fn limit_and_offset_are_inlined() {
        let query = Select::new(QuoteOptions::ALL)
            .from_as("CHECKOUT_ITEMS", "checkoutItems")
            .limit(100)
            .offset(5)
            .to_param();
        assert_eq!(
            query.text,
            "SELECT * FROM `CHECKOUT_ITEMS` `checkoutItems` LIMIT 100 OFFSET 5"
        );
        assert!(query.values.is_empty());
    }

    #[test]
    fn count_alias_uses_double_quotes() {
        let query = Select::new(QuoteOptions::TABLES)
            .from("CATEGORY_LIST")
            .field_as("COUNT(uid)", "count")
            .to_param();
        assert_eq!(query.text, "SELECT COUNT(uid) AS \"count\" FROM `CATEGORY_LIST`");
    }

    #[test]
    fn joins_where_group_order_render_in_clause_order() {
        let query = Select::new(QuoteOptions::ALL)
            .order("time", false)
            .filter("registration.uid= ?", "u1")
            .from_as("REGISTRATION", "registration")
            .join("HACKATHON", "hackathon", "hackathon.uid = registration.hackathon")
            .filter("registration.hackathon = ?", "h1")
            .group("registration.uid")
            .to_param();
        assert_eq!(
            query.text,
            "SELECT * FROM `REGISTRATION` `registration` \
             INNER JOIN `HACKATHON` `hackathon` ON (hackathon.uid = registration.hackathon) \
             WHERE (registration.uid= ?) AND (registration.hackathon = ?) \
             GROUP BY registration.uid ORDER BY time DESC"
        );
        assert_eq!(
            query.values,
            vec![SqlParam::Text("u1".into()), SqlParam::Text("h1".into())]
        );
    }

    #[test]
    fn sub_selects_splice_parameters_in_order() {
        let a = Select::new(QuoteOptions::TABLES)
            .from("PRE_REGISTRATION")
            .field_as("COUNT(uid)", "preregistration_count");
        let b = Select::new(QuoteOptions::TABLES)
            .from("REGISTRATION")
            .field_as("COUNT(uid)", "registration_count")
            .filter("hackathon = ?", "h1");
        let query = Select::new(QuoteOptions::ALL)
            .from_query(a, "a")
            .join_query(b, "b")
            .to_param();
        assert_eq!(
            query.text,
            "SELECT * FROM (SELECT COUNT(uid) AS \"preregistration_count\" FROM `PRE_REGISTRATION`) `a` \
             INNER JOIN (SELECT COUNT(uid) AS \"registration_count\" FROM `REGISTRATION` WHERE (hackathon = ?)) `b`"
        );
        assert_eq!(query.values, vec![SqlParam::Text("h1".into())]);
    }

    #[test]
    fn union_and_lock() {
        let locked = Select::new(QuoteOptions::NONE)
            .from("REGISTRATION")
            .field("MAX(pin)")
            .lock(RowLock::ForUpdate)
            .to_param();
        assert_eq!(locked.text, "SELECT MAX(pin) FROM REGISTRATION FOR UPDATE");

        let query = Select::new(QuoteOptions::TABLES)
            .from("REGISTRATION")
            .field("gender")
            .group("gender")
            .union(Select::new(QuoteOptions::TABLES).from("REGISTRATION").field("race").group("race"))
            .to_param();
        assert_eq!(
            query.text,
            "SELECT gender FROM `REGISTRATION` GROUP BY gender \
             UNION (SELECT race FROM `REGISTRATION` GROUP BY race)"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let build = || {
            Select::new(QuoteOptions::ALL)
                .from_as("EVENTS", "event")
                .join("LOCATIONS", "location", "event.event_location = location.uid")
                .order("event_start_time", true)
                .offset(10)
                .limit(20)
                .to_param()
        };
        assert_eq!(build(), build());
    }

    // -- insert --

    #[test]
    fn insert_single_row() {
        let query = Insert::into(QuoteOptions::ALL, "LOCATIONS")
            .set_fields(&record(json!({"location_name": "test location"})))
            .to_param()
            .terminated();
        assert_eq!(query.text, "INSERT INTO `LOCATIONS` (`location_name`) VALUES (?);");
        assert_eq!(query.values, vec![SqlParam::Text("test location".into())]);
    }

    #[test]
    fn insert_set_overrides_and_appends() {
        let query = Insert::into(QuoteOptions::ALL, "REGISTRATION")
            .set_fields_rows(&[record(json!({"firstname": "a", "hackathon": "old"}))])
            .set("hackathon", "h1")
            .set("time", 42_i64)
            .to_param();
        assert_eq!(
            query.text,
            "INSERT INTO `REGISTRATION` (`firstname`, `hackathon`, `time`) VALUES (?, ?, ?)"
        );
        assert_eq!(
            query.values,
            vec![
                SqlParam::Text("a".into()),
                SqlParam::Text("h1".into()),
                SqlParam::Int(42)
            ]
        );
    }

    #[test]
    fn insert_multiple_rows() {
        let query = Insert::into(QuoteOptions::ALL, "EMAIL_HISTORY")
            .set_fields_rows(&[
                record(json!({"recipient": "a", "status": 200})),
                record(json!({"recipient": "b", "status": 500})),
            ])
            .to_param();
        assert_eq!(
            query.text,
            "INSERT INTO `EMAIL_HISTORY` (`recipient`, `status`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(query.values.len(), 4);
    }

    #[test]
    fn insert_with_sub_select_value() {
        let max_pin = Select::new(QuoteOptions::NONE)
            .from("REGISTRATION")
            .field("MAX(pin)")
            .lock(RowLock::ShareMode);
        let query = Insert::into(QuoteOptions::ALL, "HACKATHON")
            .set("name", "HackPSU")
            .set_query("base_pin", max_pin)
            .to_param();
        assert_eq!(
            query.text,
            "INSERT INTO `HACKATHON` (`name`, `base_pin`) VALUES (?, (SELECT MAX(pin) FROM REGISTRATION LOCK IN SHARE MODE))"
        );
        assert_eq!(query.values, vec![SqlParam::Text("HackPSU".into())]);
    }

    // -- update / delete --

    #[test]
    fn update_by_pk() {
        let query = Update::table(QuoteOptions::ALL, "LOCATIONS")
            .set_fields(&record(json!({"location_name": "test location"})))
            .filter("uid = ?", "test uid")
            .to_param()
            .terminated();
        assert_eq!(
            query.text,
            "UPDATE `LOCATIONS` SET `location_name` = ? WHERE (uid = ?);"
        );
        assert_eq!(
            query.values,
            vec![
                SqlParam::Text("test location".into()),
                SqlParam::Text("test uid".into())
            ]
        );
    }

    #[test]
    fn delete_by_pk() {
        let query = Delete::from(QuoteOptions::ALL, "CATEGORY_LIST")
            .filter("uid = ?", "abc123")
            .to_param()
            .terminated();
        assert_eq!(query.text, "DELETE FROM `CATEGORY_LIST` WHERE (uid = ?);");
        assert_eq!(query.values, vec![SqlParam::Text("abc123".into())]);
    }

    // -- params --

    #[test]
    fn json_values_convert_to_params() {
        assert_eq!(SqlParam::from_json(&json!(3)), SqlParam::Int(3));
        assert_eq!(SqlParam::from_json(&json!(1.5)), SqlParam::Float(1.5));
        assert_eq!(SqlParam::from_json(&json!(true)), SqlParam::Bool(true));
        assert_eq!(SqlParam::from_json(&json!(null)), SqlParam::Null);
        assert_eq!(
            SqlParam::from_json(&json!(["a", "b"])),
            SqlParam::Text("[\"a\",\"b\"]".into())
        );
        assert_eq!(SqlParam::from(None::<i64>), SqlParam::Null);
    }
}
