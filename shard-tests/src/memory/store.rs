use shard::{
    Context, Error, Query, QueryResult, Result, RowLabeled, RowNames, RowsAffected, Value,
};
use sqlparser::{
    ast::{
        self, BinaryOperator, Expr, ObjectName, ObjectType, SelectItem, SetExpr, Statement,
        TableFactor, TableWithJoins, UnaryOperator,
    },
    dialect::MySqlDialect,
    parser::Parser,
};
use std::{cmp::Ordering, collections::HashMap};

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    /// Index of the positional argument.
    Placeholder(usize),
    Literal(Value),
}

impl Operand {
    fn value(&self, args: &[Value]) -> Result<Value> {
        match self {
            Operand::Placeholder(i) => args
                .get(*i)
                .cloned()
                .ok_or_else(|| Error::msg(format!("Missing argument for placeholder {}", i + 1))),
            Operand::Literal(v) => Ok(v.clone()),
        }
    }
}

/// `column = operand`, in a `WHERE` clause or a `SET` list.
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    column: String,
    operand: Operand,
}

fn unsupported(what: &str, node: impl std::fmt::Display) -> Error {
    Error::msg(format!("Unsupported {} `{}`", what, node))
}

/// Integers that fit `i64` first, then `u64`, then anything else as `f64`.
fn number(text: &str) -> Result<Value> {
    text.parse::<i64>()
        .map(Value::Int64)
        .or_else(|_| text.parse::<u64>().map(Value::UInt64))
        .or_else(|_| text.parse::<f64>().map(Value::Float64))
        .map_err(|_| Error::msg(format!("Invalid number literal `{}`", text)))
}

fn literal(value: &ast::Value) -> Result<Value> {
    Ok(match value {
        ast::Value::Number(v, _) => number(v)?,
        ast::Value::SingleQuotedString(v) | ast::Value::DoubleQuotedString(v) => {
            Value::Varchar(v.clone())
        }
        ast::Value::Boolean(v) => Value::Boolean(*v),
        ast::Value::Null => Value::Null,
        _ => return Err(unsupported("literal", value)),
    })
}

fn column(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(|v| v.value.clone())
            .ok_or_else(|| unsupported("column", expr)),
        _ => Err(unsupported("column", expr)),
    }
}

fn object_name(name: &ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|v| v.value.clone())
        .ok_or_else(|| unsupported("name", name))
}

fn table_name(table: &TableWithJoins) -> Result<String> {
    match &table.relation {
        TableFactor::Table { name, .. } if table.joins.is_empty() => object_name(name),
        _ => Err(unsupported("table expression", table)),
    }
}

/// Numbers the `?` placeholders in the order they appear in the statement.
#[derive(Default)]
struct Placeholders(usize);

impl Placeholders {
    fn operand(&mut self, expr: &Expr) -> Result<Operand> {
        Ok(match expr {
            Expr::Value(ast::Value::Placeholder(_)) => {
                self.0 += 1;
                Operand::Placeholder(self.0 - 1)
            }
            Expr::Value(value) => Operand::Literal(literal(value)?),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match &**inner {
                Expr::Value(ast::Value::Number(v, _)) => {
                    Operand::Literal(number(&format!("-{}", v))?)
                }
                _ => return Err(unsupported("operand", expr)),
            },
            Expr::Nested(inner) => self.operand(inner)?,
            _ => return Err(unsupported("operand", expr)),
        })
    }

    fn condition(&mut self, expr: &Expr, result: &mut Vec<Condition>) -> Result<()> {
        match expr {
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.condition(left, result)?;
                self.condition(right, result)
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                result.push(Condition {
                    column: column(left)?,
                    operand: self.operand(right)?,
                });
                Ok(())
            }
            Expr::Nested(inner) => self.condition(inner, result),
            _ => Err(unsupported("condition", expr)),
        }
    }

    /// Equalities joined by `AND`, empty without a `WHERE` clause.
    fn conditions(&mut self, selection: Option<&Expr>) -> Result<Vec<Condition>> {
        let mut result = Vec::new();
        if let Some(expr) = selection {
            self.condition(expr, &mut result)?;
        }
        Ok(result)
    }

    fn bound(&self, args: &[Value]) -> Result<()> {
        if self.0 != args.len() {
            return Err(Error::msg(format!(
                "The statement has {} placeholders but {} arguments were bound",
                self.0,
                args.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    columns: Vec<String>,
    auto_increment: Option<usize>,
    rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl Table {
    fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| Error::msg(format!("Unknown column `{}`", name)))
    }

    fn resolve(&self, conditions: &[Condition], args: &[Value]) -> Result<Vec<(usize, Value)>> {
        conditions
            .iter()
            .map(|v| Ok((self.column(&v.column)?, v.operand.value(args)?)))
            .collect()
    }
}

fn matches(row: &[Value], filters: &[(usize, Value)]) -> bool {
    filters
        .iter()
        .all(|(i, value)| !row[*i].is_null() && compare(&row[*i], value) == Some(Ordering::Equal))
}

fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Boolean(v) => Some(*v as i128),
        Value::Int64(v) => Some(*v as i128),
        Value::UInt64(v) => Some(*v as i128),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => integral(value).map(|v| v as f64),
    }
}

/// Compares numbers by value whatever their variant, everything else by text.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (integral(a), integral(b)) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (float(a), float(b)) {
        return a.partial_cmp(&b);
    }
    match (a.to_text(), b.to_text()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

/// Values as a text protocol would return them.
fn encode(value: Value, text_protocol: bool) -> Value {
    if !text_protocol {
        return value;
    }
    match value.to_text() {
        Some(v) => Value::Blob(v.into_bytes().into()),
        None => Value::Null,
    }
}

fn affected(rows_affected: u64, last_affected_id: Option<i64>) -> Vec<QueryResult> {
    vec![QueryResult::Affected(RowsAffected {
        rows_affected,
        last_affected_id,
    })]
}

/// Tables of an in-memory database.
#[derive(Debug, Clone, Default)]
pub(crate) struct Store {
    tables: HashMap<String, Table>,
}

impl Store {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::msg(format!("Table `{}` doesn't exist", name)))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::msg(format!("Table `{}` doesn't exist", name)))
    }

    pub(crate) fn execute(&mut self, query: &Query, text_protocol: bool) -> Result<Vec<QueryResult>> {
        let mut statements = Parser::parse_sql(&MySqlDialect {}, &query.sql)
            .with_context(|| format!("While parsing `{}`", query.sql))?;
        let statement = match statements.pop() {
            Some(v) if statements.is_empty() => v,
            _ => return Err(Error::msg("Expected exactly one statement")),
        };
        let args = &query.args;
        let mut placeholders = Placeholders::default();
        Ok(match statement {
            Statement::CreateTable {
                name,
                columns,
                if_not_exists,
                ..
            } => {
                placeholders.bound(args)?;
                let name = object_name(&name)?;
                if self.tables.contains_key(&name) {
                    if !if_not_exists {
                        return Err(Error::msg(format!("Table `{}` already exists", name)));
                    }
                } else {
                    let auto_increment = columns.iter().position(|column| {
                        column
                            .options
                            .iter()
                            .any(|v| v.option.to_string().eq_ignore_ascii_case("AUTO_INCREMENT"))
                    });
                    self.tables.insert(
                        name,
                        Table {
                            columns: columns.into_iter().map(|v| v.name.value).collect(),
                            auto_increment,
                            rows: Vec::new(),
                            next_id: 1,
                        },
                    );
                }
                affected(0, None)
            }
            Statement::Drop {
                object_type: ObjectType::Table,
                if_exists,
                names,
                ..
            } => {
                placeholders.bound(args)?;
                for name in &names {
                    let name = object_name(name)?;
                    if self.tables.remove(&name).is_none() && !if_exists {
                        return Err(Error::msg(format!("Unknown table `{}`", name)));
                    }
                }
                affected(0, None)
            }
            Statement::Insert {
                table_name,
                columns,
                source: Some(source),
                ..
            } => {
                let SetExpr::Values(values) = source.body.as_ref() else {
                    return Err(unsupported("insert source", &source));
                };
                let rows = values
                    .rows
                    .iter()
                    .map(|row| {
                        if row.len() != columns.len() {
                            return Err(Error::msg(format!(
                                "Insert into `{}` lists {} columns but {} values",
                                table_name,
                                columns.len(),
                                row.len()
                            )));
                        }
                        row.iter().map(|v| placeholders.operand(v)).collect()
                    })
                    .collect::<Result<Vec<Vec<_>>>>()?;
                placeholders.bound(args)?;
                let table = self.table_mut(&object_name(&table_name)?)?;
                let indexes = columns
                    .iter()
                    .map(|v| table.column(&v.value))
                    .collect::<Result<Vec<_>>>()?;
                let count = rows.len() as u64;
                let mut last_affected_id = None;
                for operands in rows {
                    let mut row = vec![Value::Null; table.columns.len()];
                    for (i, operand) in indexes.iter().zip(operands) {
                        row[*i] = operand.value(args)?;
                    }
                    if let Some(i) = table.auto_increment {
                        match integral(&row[i]) {
                            Some(id) => {
                                table.next_id = table.next_id.max((id as i64).saturating_add(1))
                            }
                            None => {
                                row[i] = Value::Int64(table.next_id);
                                // First generated id of the batch, like MySQL
                                last_affected_id.get_or_insert(table.next_id);
                                table.next_id += 1;
                            }
                        }
                    }
                    table.rows.push(row);
                }
                affected(count, last_affected_id)
            }
            Statement::Query(query) => {
                let SetExpr::Select(select) = query.body.as_ref() else {
                    return Err(unsupported("query", &query));
                };
                if query.limit.is_some() || query.offset.is_some() {
                    return Err(unsupported("query", &query));
                }
                let [from] = select.from.as_slice() else {
                    return Err(unsupported("query", &query));
                };
                let table = self.table(&table_name(from)?)?;
                let mut indexes = Vec::new();
                for item in &select.projection {
                    match item {
                        SelectItem::Wildcard(..) => indexes.extend(0..table.columns.len()),
                        SelectItem::UnnamedExpr(expr) => indexes.push(table.column(&column(expr)?)?),
                        _ => return Err(unsupported("projection", item)),
                    }
                }
                let conditions = placeholders.conditions(select.selection.as_ref())?;
                placeholders.bound(args)?;
                let filters = table.resolve(&conditions, args)?;
                let order = query
                    .order_by
                    .iter()
                    .map(|v| Ok((table.column(&column(&v.expr)?)?, v.asc == Some(false))))
                    .collect::<Result<Vec<_>>>()?;
                let labels: RowNames = indexes.iter().map(|i| table.columns[*i].clone()).collect();
                let mut rows = table
                    .rows
                    .iter()
                    .filter(|row| matches(row, &filters))
                    .collect::<Vec<_>>();
                rows.sort_by(|a, b| {
                    order
                        .iter()
                        .map(|(i, descending)| {
                            let ordering = compare(&a[*i], &b[*i]).unwrap_or(Ordering::Equal);
                            if *descending { ordering.reverse() } else { ordering }
                        })
                        .find(|v| v.is_ne())
                        .unwrap_or(Ordering::Equal)
                });
                // Row locks (`FOR UPDATE`) have no effect on a single writer
                rows.into_iter()
                    .map(|row| {
                        QueryResult::Row(RowLabeled::new(
                            labels.clone(),
                            indexes
                                .iter()
                                .map(|i| encode(row[*i].clone(), text_protocol))
                                .collect(),
                        ))
                    })
                    .collect()
            }
            Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => {
                let assignments = assignments
                    .iter()
                    .map(|assignment| {
                        Ok(Condition {
                            column: assignment
                                .id
                                .last()
                                .map(|v| v.value.clone())
                                .ok_or_else(|| unsupported("assignment", assignment))?,
                            operand: placeholders.operand(&assignment.value)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let conditions = placeholders.conditions(selection.as_ref())?;
                placeholders.bound(args)?;
                let table = self.table_mut(&table_name(&table)?)?;
                let assignments = table.resolve(&assignments, args)?;
                let filters = table.resolve(&conditions, args)?;
                let mut count = 0;
                for row in table.rows.iter_mut().filter(|row| matches(row, &filters)) {
                    for (i, value) in &assignments {
                        row[*i] = value.clone();
                    }
                    count += 1;
                }
                affected(count, None)
            }
            Statement::Delete {
                from, selection, ..
            } => {
                let [from] = from.as_slice() else {
                    return Err(Error::msg("Delete expects exactly one table"));
                };
                let conditions = placeholders.conditions(selection.as_ref())?;
                placeholders.bound(args)?;
                let table = self.table_mut(&table_name(from)?)?;
                let filters = table.resolve(&conditions, args)?;
                let before = table.rows.len();
                table.rows.retain(|row| !matches(row, &filters));
                affected((before - table.rows.len()) as u64, None)
            }
            statement => return Err(unsupported("statement", statement)),
        })
    }
}
