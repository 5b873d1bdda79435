//! Purpose: Shared core library crate used by the `atomite` binary and tests.
//! Exports: `core` (catalog, inventory, command parsing, bank, errors).
//! Role: Internal library backing the binary; not a stable public SDK.
//! Invariants: Core modules are pure or lock-disciplined; all channel I/O
//! Invariants: lives in the binary.
pub mod core;
