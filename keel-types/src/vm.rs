use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::primitives::Address;

/// Function name that runs a system contract's one-time init transition.
///
/// Reserved by the deploy path; it is not reachable through the regular
/// dispatch table.
pub const INIT_FUNCTION_NAME: &str = "_init";

// Built-in ledger functions. System contracts do not move token balances
// themselves; they emit these as transfer payloads or global directives and
// the rest of the ledger applies them.
pub const BUILTIN_TOKEN_TRANSFER: &str = "KSTTransfer";
pub const BUILTIN_TOKEN_BURN: &str = "KSTBurn";
pub const BUILTIN_TOKEN_FREEZE: &str = "KSTFreeze";
pub const BUILTIN_TOKEN_UNFREEZE: &str = "KSTUnFreeze";
pub const BUILTIN_TOKEN_WIPE: &str = "KSTWipe";
pub const BUILTIN_TOKEN_PAUSE: &str = "KSTPause";
pub const BUILTIN_TOKEN_UNPAUSE: &str = "KSTUnPause";

/// Outcome of a system smart-contract call.
///
/// Every failure is a normal, inspectable result; the human-readable
/// detail travels separately through the call context's return message.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum ReturnCode {
    Ok,
    FunctionNotFound,
    FunctionWrongSignature,
    UserError,
    OutOfFunds,
    OutOfGas,
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnCode::Ok => "ok",
            ReturnCode::FunctionNotFound => "function not found",
            ReturnCode::FunctionWrongSignature => "function wrong signature",
            ReturnCode::UserError => "user error",
            ReturnCode::OutOfFunds => "out of funds",
            ReturnCode::OutOfGas => "out of gas",
        };
        write!(f, "{s}")
    }
}

/// Input for one system smart-contract call.
#[derive(Debug, Clone)]
pub struct ContractCallInput {
    /// Address that signed the call.
    pub caller_addr: Address,
    /// Address the call is directed at (the contract's own address).
    pub recipient_addr: Address,
    /// Operation name to dispatch.
    pub function: String,
    /// Value attached to the call.
    pub call_value: BigUint,
    /// Gas budget the caller paid for.
    pub gas_provided: u64,
    /// Ordered, opaque argument list.
    pub arguments: Vec<Vec<u8>>,
}
