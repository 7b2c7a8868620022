use crate::{Result, Value};
use std::fmt::{self, Debug};

/// Reads and writes one field of a model through its [`Value`] representation.
///
/// `get` produces the canonical variant for the field type, `set` accepts the canonical
/// variant produced by [`decode`](crate::decode) and fails on anything else.
pub struct FieldAccessor<M> {
    pub name: &'static str,
    /// Raw annotation, for example `pk;column(account_id)`.
    pub directives: &'static str,
    /// Rust type of the field, as returned by `std::any::type_name`.
    pub type_name: &'static str,
    pub get: fn(&M) -> Value,
    pub set: fn(&mut M, Value) -> Result<()>,
}

impl<M> Clone for FieldAccessor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldAccessor<M> {}

impl<M> Debug for FieldAccessor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("directives", &self.directives)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A record type that maps to a table row.
///
/// Usually implemented with `#[derive(Model)]`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Unqualified type name.
    fn type_name() -> &'static str;
    /// Module qualified name, unique among the registered models.
    fn full_name() -> &'static str;
    fn table_name() -> &'static str {
        Self::type_name()
    }
    /// Fields in declaration order.
    fn fields() -> Vec<FieldAccessor<Self>>;
}

/// A model bound to a specific database alias.
pub trait Routed: Model {
    fn database() -> &'static str;
}
