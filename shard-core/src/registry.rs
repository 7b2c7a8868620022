use crate::{
    Catalog, Connection, Context, Driver, Model, OrmError, PoolOptions, RegistryOptions, Result,
    TypeMetadata, logged,
};
use std::{borrow::Cow, collections::HashMap};

/// Database alias to pooled connection.
pub type ConnectionRegistry<C> = HashMap<String, C>;

/// Registered models and database aliases.
///
/// Populated at startup, then shared with sessions behind an `Arc`.
pub struct Registry<D: Driver> {
    catalog: Catalog,
    connections: ConnectionRegistry<D::Connection>,
    options: RegistryOptions,
}

impl<D: Driver> Registry<D> {
    pub fn new() -> Self {
        Self::with_options(Default::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            catalog: Catalog::new(),
            connections: Default::default(),
            options,
        }
    }

    pub fn register<M: Model>(&mut self) -> Result<&TypeMetadata> {
        self.catalog.register::<M>()
    }

    /// Connect to `url` and make the pool available under `alias`.
    ///
    /// The alias is registered only if the store answers a ping.
    pub async fn register_database(
        &mut self,
        alias: impl Into<String>,
        url: impl Into<Cow<'static, str>>,
        options: PoolOptions,
    ) -> Result<()> {
        let alias = alias.into();
        if self.connections.contains_key(&alias) {
            return Err(logged(OrmError::DuplicateAlias(alias)));
        }
        let url = url.into();
        let mut connection = D::Connection::connect(url, &options)
            .await
            .with_context(|| format!("While connecting the database `{}`", alias))?;
        if let Err(e) = connection.ping().await {
            let e = e.context(format!("While pinging the database `{}`", alias));
            log::error!("{:#}", e);
            if let Err(e) = connection.disconnect().await {
                log::error!("{:#}", e);
            }
            return Err(e);
        }
        log::info!("Registered database `{}` ({})", alias, D::NAME);
        self.connections.insert(alias, connection);
        Ok(())
    }

    /// Make an already established pool available under `alias`.
    pub fn add_connection(
        &mut self,
        alias: impl Into<String>,
        connection: D::Connection,
    ) -> Result<()> {
        let alias = alias.into();
        if self.connections.contains_key(&alias) {
            return Err(logged(OrmError::DuplicateAlias(alias)));
        }
        self.connections.insert(alias, connection);
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn connection(&self, alias: &str) -> Result<&D::Connection> {
        self.connections
            .get(alias)
            .ok_or_else(|| logged(OrmError::UnknownAlias(alias.into())))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }
}

impl<D: Driver> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}
