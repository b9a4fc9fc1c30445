//! System smart-contract execution engine for the keel node.
//!
//! System contracts are privileged, deterministic state machines built
//! into the ledger rather than deployed as user bytecode. The engine
//! dispatches named operations against a sandboxed storage namespace,
//! deducting gas before state mutation and surfacing every failure as an
//! inspectable return code.
//!
//! The token issuance contract in [`contract`] is the canonical instance:
//! it controls the creation of ledger-wide token records and the
//! privileged operations over them.

pub mod contract;
pub mod env;
pub mod epoch;
pub mod error;
pub mod gas;
pub mod testing;
pub mod token;
