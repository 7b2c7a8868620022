use crate::DecodePolicy;

/// Limits applied to the pool behind a registered database alias.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Connections kept open while unused.
    pub max_idle: Option<usize>,
    /// Connections open at the same time.
    pub max_open: Option<usize>,
}

impl PoolOptions {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn max_idle(mut self, value: usize) -> Self {
        self.max_idle = Some(value);
        self
    }
    pub fn max_open(mut self, value: usize) -> Self {
        self.max_open = Some(value);
        self
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    pub decode_policy: DecodePolicy,
}

impl RegistryOptions {
    pub fn decode_policy(mut self, value: DecodePolicy) -> Self {
        self.decode_policy = value;
        self
    }
}
