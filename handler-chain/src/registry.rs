//! Handler registry: command handlers keyed by normalized token, plus the ordered fallback chain.
//!
//! Registration is copy-on-write: the current routes are cloned, changed and swapped in under a
//! short write lock. A poll cycle works on one [`RegistrySnapshot`] for a whole batch, so it never
//! sees a half-updated chain even if handlers are registered concurrently.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dbot_core::{CommandHandler, UpdateHandler};
use tracing::{info, warn};

use crate::parser::CommandParser;

/// Immutable view of the registry taken at one point in time.
#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    pub(crate) parser: CommandParser,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    chain: Vec<Arc<dyn UpdateHandler>>,
}

impl RegistrySnapshot {
    /// Command handler registered for an already-normalized token.
    pub fn lookup(&self, token: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(token)
    }

    /// Fallback handlers in registration order.
    pub fn chain(&self) -> &[Arc<dyn UpdateHandler>] {
        &self.chain
    }

    /// Parser carrying the case and addressing policy the tokens were registered with.
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Registered tokens, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.commands.keys().cloned().collect();
        tokens.sort();
        tokens
    }
}

/// Shared, thread-safe registry. Wrap in `Arc` to share between the CLI and the poll loop.
pub struct HandlerRegistry {
    routes: RwLock<Arc<RegistrySnapshot>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new(CommandParser::default())
    }
}

impl HandlerRegistry {
    /// Creates an empty registry whose tokens follow `parser`'s case policy.
    pub fn new(parser: CommandParser) -> Self {
        Self {
            routes: RwLock::new(Arc::new(RegistrySnapshot {
                parser,
                ..RegistrySnapshot::default()
            })),
        }
    }

    /// Adds or replaces the command handler for `token`. Last registration wins.
    pub fn register(&self, token: &str, handler: Arc<dyn CommandHandler>) {
        let handler_name = handler.name().to_string();
        let mut replaced = false;
        let token = self.update(|routes| {
            let token = routes.parser.normalize(token);
            replaced = routes.commands.insert(token.clone(), handler).is_some();
            token
        });
        if replaced {
            warn!(command = %token, handler = %handler_name, "Command handler replaced");
        } else {
            info!(command = %token, handler = %handler_name, "Command handler registered");
        }
    }

    /// Appends a handler to the fallback chain.
    pub fn add_fallback(&self, handler: Arc<dyn UpdateHandler>) {
        let handler_name = handler.name().to_string();
        let position = self.update(|routes| {
            routes.chain.push(handler);
            routes.chain.len()
        });
        info!(handler = %handler_name, position, "Fallback handler registered");
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_command(self, token: &str, handler: Arc<dyn CommandHandler>) -> Self {
        self.register(token, handler);
        self
    }

    /// Builder form of [`add_fallback`](Self::add_fallback).
    pub fn with_fallback(self, handler: Arc<dyn UpdateHandler>) -> Self {
        self.add_fallback(handler);
        self
    }

    /// Command handler for `token` (normalized before lookup).
    pub fn lookup(&self, token: &str) -> Option<Arc<dyn CommandHandler>> {
        let snapshot = self.snapshot();
        let token = snapshot.parser.normalize(token);
        snapshot.lookup(&token).cloned()
    }

    /// Fallback handlers in registration order.
    pub fn chain(&self) -> Vec<Arc<dyn UpdateHandler>> {
        self.snapshot().chain().to_vec()
    }

    /// Registered tokens, sorted.
    pub fn commands(&self) -> Vec<String> {
        self.snapshot().commands()
    }

    /// Current routes. Later registrations do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update<R>(&self, change: impl FnOnce(&mut RegistrySnapshot) -> R) -> R {
        let mut guard = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&guard);
        let out = change(&mut next);
        *guard = Arc::new(next);
        out
    }
}
