use num_bigint::BigUint;

use crate::error::MintError;

/// Execution environment a system contract runs against.
///
/// Storage is a sandboxed key-value namespace owned by the contract.
/// Gas metering, value transfer, balance queries, output accumulation,
/// and ledger-wide broadcasts are capabilities of the surrounding VM;
/// the engine never touches balances or other contracts directly.
///
/// `get`/`set` are assumed atomic per key; multi-key transactions are not
/// part of this seam, which is why calls serialize at the contract level.
pub trait SystemEnv: Send + Sync {
    /// Read a value from contract storage. Missing keys yield an empty
    /// vector.
    fn get_storage(&self, key: &[u8]) -> Vec<u8>;

    /// Write a value into contract storage.
    fn set_storage(&self, key: &[u8], value: &[u8]);

    /// Deduct gas from the current call's budget.
    fn use_gas(&self, amount: u64) -> Result<(), MintError>;

    /// Queue a value transfer from `from` to `to` with an attached
    /// payload, executed by the ledger at call boundary.
    fn transfer(
        &self,
        from: &[u8],
        to: &[u8],
        value: &BigUint,
        payload: &[u8],
        gas_limit: u64,
    ) -> Result<(), MintError>;

    /// Current balance of an account.
    fn get_balance(&self, address: &[u8]) -> BigUint;

    /// Append data to the call's output buffer.
    fn finish(&self, data: &[u8]);

    /// Attach a human-readable message to the call result.
    fn add_return_message(&self, message: &str);

    /// Broadcast a ledger-wide setting change to every shard.
    fn send_global_setting_to_all(&self, sender: &[u8], payload: &[u8]);
}
