//! Purpose: Apply parsed commands to the shared inventory.
//! Exports: `Bank`, `Origin`, `Response`.
//! Role: The single serialization point for every channel; each command's
//! Role: check-then-mutate sequence runs under one lock acquisition.
//! Invariants: Exactly one response per command; malformed input never
//! Invariants: produces silence.
//! Invariants: No I/O while the inventory lock is held; outcome logging
//! Invariants: happens after the guard is dropped.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::core::catalog::{AtomKind, Catalog};
use crate::core::command::Command;
use crate::core::inventory::{Inventory, Levels};

/// Which channel a command arrived on. The console is the one privileged
/// origin: only it may issue `GEN`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    Stream,
    Datagram,
    Console,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::Stream => "stream",
            Origin::Datagram => "datagram",
            Origin::Console => "console",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    Ok,
    Invalid,
    LimitExceeded(AtomKind),
    Rejected,
    Generated {
        name: String,
        count: u64,
        levels: Levels,
        remaining: Vec<(String, u64)>,
    },
}

impl Response {
    /// The single line sent back over stream/datagram transports.
    pub fn wire_text(&self) -> String {
        match self {
            Response::Ok | Response::Generated { .. } => "OK".to_string(),
            Response::Invalid => "invalid command".to_string(),
            Response::LimitExceeded(kind) => {
                format!("error: {} atoms limit exceeded", kind.label())
            }
            Response::Rejected => "ERROR".to_string(),
        }
    }
}

/// Shared state handed by `Arc` to every listener and session.
pub struct Bank {
    inventory: Mutex<Inventory>,
    catalog: Catalog,
}

impl Bank {
    pub fn new(catalog: Catalog, ceiling: u64) -> Self {
        Self {
            inventory: Mutex::new(Inventory::new(ceiling)),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Stock snapshot, for logging and tests.
    pub fn levels(&self) -> Levels {
        self.lock().levels()
    }

    pub fn process(&self, command: Command, origin: Origin) -> Response {
        match command {
            Command::Add { kind, amount } => self.add(kind, amount, origin),
            Command::Deliver { name, count } => self.deliver(&name, count, origin),
            Command::Gen { name, count } => {
                if origin == Origin::Console {
                    self.generate(&name, count)
                } else {
                    debug!(origin = origin.label(), %name, "GEN refused off-console");
                    Response::Invalid
                }
            }
            Command::Invalid => {
                debug!(origin = origin.label(), "invalid command");
                Response::Invalid
            }
        }
    }

    fn add(&self, kind: AtomKind, amount: u64, origin: Origin) -> Response {
        let (outcome, levels) = {
            let mut inventory = self.lock();
            let outcome = inventory.add(kind, amount);
            (outcome, inventory.levels())
        };
        match outcome {
            Ok(total) => {
                debug!(
                    origin = origin.label(),
                    atom = kind.label(),
                    amount,
                    total,
                    %levels,
                    "atoms added"
                );
                Response::Ok
            }
            Err(err) => {
                debug!(origin = origin.label(), %err, "add rejected");
                Response::LimitExceeded(kind)
            }
        }
    }

    fn deliver(&self, name: &str, count: u64, origin: Origin) -> Response {
        let Some(recipe) = self.catalog.get(name) else {
            debug!(origin = origin.label(), %name, "unknown molecule");
            return Response::Rejected;
        };
        let Some(required) = recipe.requirement(count) else {
            debug!(origin = origin.label(), %name, count, "requirement overflows");
            return Response::Rejected;
        };
        let (outcome, levels) = {
            let mut inventory = self.lock();
            let outcome = inventory.try_deduct(required);
            (outcome, inventory.levels())
        };
        match outcome {
            Ok(()) => {
                debug!(origin = origin.label(), %name, count, %levels, "delivered");
                Response::Ok
            }
            Err(err) => {
                debug!(origin = origin.label(), %name, count, %err, "delivery rejected");
                Response::Rejected
            }
        }
    }

    /// Console-only delivery that also reports, for every catalog entry, how
    /// many units the post-deduction stock still supports. The report is
    /// computed under the same lock acquisition as the deduction so no
    /// concurrent channel can slip a mutation in between.
    fn generate(&self, name: &str, count: u64) -> Response {
        let Some(recipe) = self.catalog.get(name) else {
            debug!(%name, "unknown molecule");
            return Response::Rejected;
        };
        let Some(required) = recipe.requirement(count) else {
            debug!(%name, count, "requirement overflows");
            return Response::Rejected;
        };
        let (outcome, levels, remaining) = {
            let mut inventory = self.lock();
            match inventory.try_deduct(required) {
                Ok(()) => {
                    let remaining = self
                        .catalog
                        .iter()
                        .map(|(entry, entry_recipe)| {
                            (entry.to_string(), inventory.producible(entry_recipe))
                        })
                        .collect();
                    (Ok(()), inventory.levels(), remaining)
                }
                Err(err) => (Err(err), inventory.levels(), Vec::new()),
            }
        };
        match outcome {
            Ok(()) => {
                debug!(%name, count, %levels, "generated");
                Response::Generated {
                    name: name.to_string(),
                    count,
                    levels,
                    remaining,
                }
            }
            Err(err) => {
                debug!(%name, count, %err, "generation rejected");
                Response::Rejected
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inventory> {
        self.inventory
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
