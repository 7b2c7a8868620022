use crate::{
    FieldMetadata, Model, OrmError, Query, Result, TypeMetadata, logged, separated_by,
};

/// Builds the single row statements of a registered model, MySQL flavored.
///
/// Identifiers are quoted with backticks, arguments are `?` placeholders bound in the
/// order they appear in the text.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlWriter;

impl SqlWriter {
    pub fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    pub fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_conditions(&self, out: &mut String, conditions: &[&FieldMetadata]) {
        out.push_str(" WHERE ");
        separated_by(
            out,
            conditions,
            |out, field| {
                self.write_identifier_quoted(out, &field.column);
                out.push_str(" = ?");
            },
            " AND ",
        );
    }

    fn conditions<'m>(
        &self,
        metadata: &'m TypeMetadata,
        columns: &[&str],
    ) -> Result<Vec<&'m FieldMetadata>> {
        if columns.is_empty() {
            Ok(vec![metadata.condition_column()?])
        } else {
            columns.iter().map(|v| metadata.resolve(v)).collect()
        }
    }

    /// `SELECT <all columns> FROM <table> WHERE <c1> = ? AND ...`, conditions default to the
    /// unique key, else the primary key. `lock` appends ` FOR UPDATE`.
    pub fn write_select<M: Model>(
        &self,
        metadata: &TypeMetadata,
        record: &M,
        columns: &[&str],
        lock: bool,
    ) -> Result<Query> {
        let conditions = self.conditions(metadata, columns)?;
        let mut sql = String::with_capacity(64 + metadata.all_columns.len());
        sql.push_str("SELECT ");
        sql.push_str(&metadata.all_columns);
        sql.push_str(" FROM ");
        self.write_identifier_quoted(&mut sql, &metadata.table);
        self.write_conditions(&mut sql, &conditions);
        if lock {
            sql.push_str(" FOR UPDATE");
        }
        let args = conditions
            .iter()
            .map(|field| metadata.value_of(record, field))
            .collect::<Result<_>>()?;
        Ok(Query { sql, args })
    }

    /// `INSERT INTO <table> (<columns>) VALUES (?, ...)` with every column but the primary key.
    pub fn write_insert<M: Model>(&self, metadata: &TypeMetadata, record: &M) -> Result<Query> {
        let fields = metadata
            .fields
            .iter()
            .filter(|v| !v.primary_key)
            .collect::<Vec<_>>();
        let mut sql = String::with_capacity(64 + fields.len() * 16);
        sql.push_str("INSERT INTO ");
        self.write_identifier_quoted(&mut sql, &metadata.table);
        sql.push_str(" (");
        separated_by(
            &mut sql,
            &fields,
            |out, field| self.write_identifier_quoted(out, &field.column),
            ", ",
        );
        sql.push_str(") VALUES (");
        separated_by(&mut sql, &fields, |out, _| out.push('?'), ", ");
        sql.push(')');
        let args = fields
            .iter()
            .map(|field| metadata.value_of(record, field))
            .collect::<Result<_>>()?;
        Ok(Query { sql, args })
    }

    /// `UPDATE <table> SET <c1> = ?, ... WHERE <key> = ?`.
    ///
    /// Sets every column when `columns` is empty, explicit key columns are rejected.
    pub fn write_update<M: Model>(
        &self,
        metadata: &TypeMetadata,
        record: &M,
        columns: &[&str],
    ) -> Result<Query> {
        let condition = metadata.condition_column()?;
        let fields = if columns.is_empty() {
            metadata.fields.iter().collect::<Vec<_>>()
        } else {
            let mut fields = Vec::with_capacity(columns.len());
            for column in columns {
                let field = metadata.resolve(column)?;
                if field.primary_key || field.unique_key {
                    return Err(logged(OrmError::CannotUpdateKey {
                        model: metadata.full_name.into(),
                        column: field.column.clone(),
                    }));
                }
                fields.push(field);
            }
            fields
        };
        let mut sql = String::with_capacity(64 + fields.len() * 16);
        sql.push_str("UPDATE ");
        self.write_identifier_quoted(&mut sql, &metadata.table);
        sql.push_str(" SET ");
        separated_by(
            &mut sql,
            &fields,
            |out, field| {
                self.write_identifier_quoted(out, &field.column);
                out.push_str(" = ?");
            },
            ", ",
        );
        self.write_conditions(&mut sql, &[condition]);
        let args = fields
            .iter()
            .chain([&condition])
            .map(|field| metadata.value_of(record, field))
            .collect::<Result<_>>()?;
        Ok(Query { sql, args })
    }

    /// `DELETE FROM <table> WHERE <key> = ?`.
    pub fn write_delete<M: Model>(&self, metadata: &TypeMetadata, record: &M) -> Result<Query> {
        let condition = metadata.condition_column()?;
        let mut sql = String::with_capacity(64);
        sql.push_str("DELETE FROM ");
        self.write_identifier_quoted(&mut sql, &metadata.table);
        self.write_conditions(&mut sql, &[condition]);
        let args = vec![metadata.value_of(record, condition)?];
        Ok(Query { sql, args })
    }
}

#[cfg(test)]
mod tests {
    use crate::SqlWriter;

    #[test]
    fn quote_identifiers() {
        let mut out = String::new();
        SqlWriter.write_identifier_quoted(&mut out, "Account");
        out.push(' ');
        SqlWriter.write_identifier_quoted(&mut out, "we`ird");
        out.push(' ');
        SqlWriter.write_identifier_quoted(&mut out, "`é`");
        assert_eq!(out, "`Account` `we``ird` ```é```");
    }
}
