// ─── Gas Cost Constants ─────────────────────────────────────────────────────

/// Default cost of issuing a new token.
pub const GAS_TOKEN_ISSUE: u64 = 5_000_000;

/// Default cost of any other privileged token operation.
pub const GAS_TOKEN_OPERATION: u64 = 500_000;

/// Default cost per byte copied into the call's output buffer.
pub const GAS_DATA_COPY_PER_BYTE: u64 = 50;

// ─── Gas Schedule ───────────────────────────────────────────────────────────

/// Gas prices charged by the system contracts.
///
/// The engine snapshots the schedule for the whole duration of a call;
/// live updates go through the contract's `set_gas_schedule` and serialize
/// against in-flight calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSchedule {
    /// Charged once per token issuance.
    pub issue: u64,
    /// Charged once per privileged operation.
    pub operation: u64,
    /// Charged per byte of output copied out of storage.
    pub data_copy_per_byte: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            issue: GAS_TOKEN_ISSUE,
            operation: GAS_TOKEN_OPERATION,
            data_copy_per_byte: GAS_DATA_COPY_PER_BYTE,
        }
    }
}
