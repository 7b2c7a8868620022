use crate::{
    Connection, Context, Driver, Error, Executor, FieldMetadata, Model, OrmError, Query,
    Registry, Result, Routed, RowLabeled, RowsAffected, SqlWriter, Transaction, decode,
    future::Either,
    logged, orm_error,
    stream::{Stream, TryStreamExt},
};
use std::{pin::pin, sync::Arc};

/// Handle used to run mapped and raw statements against one database alias.
///
/// Statements go through the open transaction if there is one, otherwise through the
/// pooled connection of the current alias.
pub struct Session<D: Driver> {
    registry: Arc<Registry<D>>,
    alias: String,
    connection: D::Connection,
    transaction: Option<D::Transaction>,
}

impl<D: Driver> Session<D> {
    pub fn new(registry: Arc<Registry<D>>, alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        let connection = registry.connection(&alias)?.clone();
        Ok(Self {
            registry,
            alias,
            connection,
            transaction: None,
        })
    }

    /// Session on the database the model is routed to.
    pub fn for_model<M: Routed>(registry: Arc<Registry<D>>) -> Result<Self> {
        Self::new(registry, M::database())
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn registry(&self) -> &Arc<Registry<D>> {
        &self.registry
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Switch to another database alias.
    ///
    /// # Panics
    /// If a transaction is open.
    pub fn using(&mut self, alias: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        if self.transaction.is_some() {
            log::error!(
                "Cannot switch from `{}` to `{}` while a transaction is open",
                self.alias,
                alias
            );
            panic!("Cannot switch database alias while a transaction is open");
        }
        self.connection = self.registry.connection(&alias)?.clone();
        self.alias = alias;
        Ok(())
    }

    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send + '_ {
        log::debug!("{}", query);
        match &mut self.transaction {
            Some(transaction) => Either::Left(transaction.fetch(query)),
            None => Either::Right(self.connection.fetch(query)),
        }
    }

    async fn execute(&mut self, query: Query) -> Result<RowsAffected> {
        log::debug!("{}", query);
        match &mut self.transaction {
            Some(transaction) => transaction.execute(query).await,
            None => self.connection.execute(query).await,
        }
    }

    /// Load the row matching `record` on `columns` (the key when empty) into `record`.
    ///
    /// Fails with [`OrmError::NoRowsFound`] leaving `record` untouched when nothing matches.
    /// Inside a transaction the row is locked.
    pub async fn read<M: Model>(&mut self, record: &mut M, columns: &[&str]) -> Result<()> {
        let registry = self.registry.clone();
        let metadata = registry.catalog().get::<M>()?;
        let policy = registry.options().decode_policy;
        let query = SqlWriter.write_select(metadata, record, columns, self.in_transaction())?;
        let row = {
            let mut stream = pin!(self.fetch(query));
            stream.try_next().await?
        };
        let Some(row) = row else {
            log::info!("No rows found in `{}`", metadata.table);
            return Err(Error::new(OrmError::NoRowsFound));
        };
        if row.values.len() != metadata.fields.len() {
            let error = Error::msg(format!(
                "Expected {} columns from `{}` but the row has {}",
                metadata.fields.len(),
                metadata.table,
                row.values.len()
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let values = metadata
            .fields
            .iter()
            .zip(row.values.into_vec())
            .map(|(field, value)| decode(field.semantic_type, value, policy))
            .collect::<Result<Vec<_>>>()?;
        for (accessor, value) in metadata.accessors::<M>()?.iter().zip(values) {
            (accessor.set)(record, value)?;
        }
        Ok(())
    }

    /// Insert `record` and return the identifier generated by the store, 0 if none.
    pub async fn insert<M: Model>(&mut self, record: &M) -> Result<i64> {
        let registry = self.registry.clone();
        let metadata = registry.catalog().get::<M>()?;
        let query = SqlWriter.write_insert(metadata, record)?;
        let result = self
            .execute(query)
            .await
            .with_context(|| format!("While inserting into `{}`", metadata.table))?;
        Ok(result.last_affected_id.unwrap_or_default())
    }

    /// Write `columns` (all of them when empty) of `record`, return the rows affected.
    pub async fn update<M: Model>(&mut self, record: &M, columns: &[&str]) -> Result<u64> {
        let registry = self.registry.clone();
        let metadata = registry.catalog().get::<M>()?;
        let query = SqlWriter.write_update(metadata, record, columns)?;
        let result = self
            .execute(query)
            .await
            .with_context(|| format!("While updating `{}`", metadata.table))?;
        Ok(result.rows_affected)
    }

    pub async fn delete<M: Model>(&mut self, record: &M) -> Result<u64> {
        let registry = self.registry.clone();
        let metadata = registry.catalog().get::<M>()?;
        let query = SqlWriter.write_delete(metadata, record)?;
        let result = self
            .execute(query)
            .await
            .with_context(|| format!("While deleting from `{}`", metadata.table))?;
        Ok(result.rows_affected)
    }

    /// Run a statement as is.
    pub async fn exec(&mut self, query: impl Into<Query>) -> Result<RowsAffected> {
        self.execute(query.into()).await
    }

    /// Run a query as is and stream its rows.
    pub fn query(
        &mut self,
        query: impl Into<Query>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + '_ {
        self.fetch(query.into())
    }

    /// Run a query and append one `M` per row to `destination`.
    ///
    /// Columns are matched by name, every column in the result must belong to `M`.
    /// Rows appended before a failure are kept.
    pub async fn query_into<M: Model + Default>(
        &mut self,
        destination: &mut Vec<M>,
        query: impl Into<Query>,
    ) -> Result<()> {
        let registry = self.registry.clone();
        let metadata = registry.catalog().get::<M>()?;
        let policy = registry.options().decode_policy;
        let mut stream = pin!(self.fetch(query.into()));
        let mut fields: Option<Vec<&FieldMetadata>> = None;
        while let Some(row) = stream.try_next().await? {
            if fields.is_none() {
                fields = Some(
                    row.labels
                        .iter()
                        .map(|label| {
                            metadata.field(label).ok_or_else(|| {
                                logged(OrmError::UnknownColumn {
                                    model: metadata.full_name.into(),
                                    column: label.clone(),
                                })
                            })
                        })
                        .collect::<Result<_>>()?,
                );
            }
            let fields = fields.as_deref().unwrap_or_default();
            let mut record = M::default();
            for (field, value) in fields.iter().zip(row.values.into_vec()) {
                metadata.assign(&mut record, field, value, policy)?;
            }
            destination.push(record);
        }
        Ok(())
    }

    pub async fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(logged(OrmError::TransactionAlreadyBegan));
        }
        let transaction = self
            .connection
            .begin()
            .await
            .with_context(|| format!("While beginning a transaction on `{}`", self.alias))?;
        self.transaction = Some(transaction);
        Ok(())
    }

    /// Fails with [`OrmError::TransactionNotBegan`] without an open transaction, or when
    /// the driver already ended it. The session is out of the transaction either way.
    pub async fn commit(&mut self) -> Result<()> {
        let Some(transaction) = self.transaction.take() else {
            return Err(logged(OrmError::TransactionNotBegan));
        };
        let result = transaction.commit().await;
        self.finished(result, "committing")
    }

    /// Same failures as [`Session::commit`].
    pub async fn rollback(&mut self) -> Result<()> {
        let Some(transaction) = self.transaction.take() else {
            return Err(logged(OrmError::TransactionNotBegan));
        };
        let result = transaction.rollback().await;
        self.finished(result, "rolling back")
    }

    fn finished(&self, result: Result<()>, action: &str) -> Result<()> {
        result.map_err(|error| {
            let error = match orm_error(&error) {
                Some(OrmError::TransactionNotBegan) => error,
                _ => error.context(format!(
                    "While {} the transaction on `{}`",
                    action, self.alias
                )),
            };
            log::error!("{:#}", error);
            error
        })
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            log::warn!(
                "Session on `{}` dropped with an open transaction, it will be rolled back",
                self.alias
            );
        }
    }
}
