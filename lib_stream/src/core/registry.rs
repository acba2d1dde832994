//! # Handler Registry
//!
//! At most one handler per business message type. Registering again for the
//! same type replaces the previous handler.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::models::envelope::{BusinessType, InboundEnvelope};

/// Type-erased handler: the application result is already converted to JSON.
pub type BoxedHandler = Box<dyn Fn(&InboundEnvelope) -> anyhow::Result<Value> + Send + Sync>;

/// Mapping from business message type to its handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<BusinessType, BoxedHandler>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`, replacing any earlier one. Returns
    /// `true` when a previous handler was replaced.
    pub fn register<F, R>(&mut self, kind: BusinessType, handler: F) -> bool
    where
        F: Fn(&InboundEnvelope) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Serialize + 'static,
    {
        let erased: BoxedHandler = Box::new(move |envelope: &InboundEnvelope| -> anyhow::Result<Value> {
            let result = handler(envelope)?;
            Ok(serde_json::to_value(result)?)
        });
        let replaced = self.handlers.insert(kind, erased).is_some();
        if replaced {
            log::debug!("Replaced handler for {}", kind);
        }
        replaced
    }

    /// The handler for `kind`, if any.
    pub fn get(&self, kind: BusinessType) -> Option<&BoxedHandler> {
        self.handlers.get(&kind)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
