//! In-memory [`SystemEnv`] for exercising system contracts in tests.
//!
//! Storage and balances survive across calls, mirroring persistent
//! contract state; gas, output, and return messages accumulate until
//! [`TestEnv::reset_call`].

use std::collections::HashMap;
use std::sync::Mutex;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::env::SystemEnv;
use crate::error::MintError;

/// A value transfer recorded by the test environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub from: Vec<u8>,
    pub to: Vec<u8>,
    pub value: BigUint,
    pub payload: Vec<u8>,
    pub gas_limit: u64,
}

#[derive(Default)]
struct TestEnvState {
    storage: HashMap<Vec<u8>, Vec<u8>>,
    gas_limit: u64,
    gas_used: u64,
    fail_transfers: bool,
    output: Vec<Vec<u8>>,
    return_messages: Vec<String>,
    transfers: Vec<RecordedTransfer>,
    global_settings: Vec<(Vec<u8>, Vec<u8>)>,
    balances: HashMap<Vec<u8>, BigUint>,
}

/// System environment backed by in-process maps.
pub struct TestEnv {
    state: Mutex<TestEnvState>,
}

impl TestEnv {
    /// Create an environment with an effectively unlimited gas budget.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TestEnvState {
                gas_limit: u64::MAX,
                ..TestEnvState::default()
            }),
        }
    }

    /// Cap the gas budget for subsequent calls.
    pub fn set_gas_limit(&self, limit: u64) {
        self.lock().gas_limit = limit;
    }

    /// Make every transfer fail, to exercise transfer error paths.
    pub fn set_fail_transfers(&self, fail: bool) {
        self.lock().fail_transfers = fail;
    }

    /// Seed an account balance.
    pub fn set_balance(&self, address: &[u8], value: BigUint) {
        self.lock().balances.insert(address.to_vec(), value);
    }

    /// Clear per-call state: gas used, output, and return messages.
    /// Storage, balances, and recorded side effects are kept.
    pub fn reset_call(&self) {
        let mut st = self.lock();
        st.gas_used = 0;
        st.output.clear();
        st.return_messages.clear();
    }

    pub fn storage_get(&self, key: &[u8]) -> Vec<u8> {
        self.lock().storage.get(key).cloned().unwrap_or_default()
    }

    pub fn gas_used(&self) -> u64 {
        self.lock().gas_used
    }

    pub fn output(&self) -> Vec<Vec<u8>> {
        self.lock().output.clone()
    }

    pub fn return_messages(&self) -> Vec<String> {
        self.lock().return_messages.clone()
    }

    pub fn last_return_message(&self) -> Option<String> {
        self.lock().return_messages.last().cloned()
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.lock().transfers.clone()
    }

    pub fn global_settings(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.lock().global_settings.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TestEnvState> {
        self.state.lock().expect("test env lock poisoned")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEnv for TestEnv {
    fn get_storage(&self, key: &[u8]) -> Vec<u8> {
        self.lock().storage.get(key).cloned().unwrap_or_default()
    }

    fn set_storage(&self, key: &[u8], value: &[u8]) {
        self.lock().storage.insert(key.to_vec(), value.to_vec());
    }

    fn use_gas(&self, amount: u64) -> Result<(), MintError> {
        let mut st = self.lock();
        let new_used = st.gas_used.saturating_add(amount);
        if new_used > st.gas_limit {
            return Err(MintError::OutOfGas);
        }
        st.gas_used = new_used;
        Ok(())
    }

    fn transfer(
        &self,
        from: &[u8],
        to: &[u8],
        value: &BigUint,
        payload: &[u8],
        gas_limit: u64,
    ) -> Result<(), MintError> {
        let mut st = self.lock();
        if st.fail_transfers {
            return Err(MintError::TransferFailed {
                reason: "transfer disabled by test".to_string(),
            });
        }
        st.transfers.push(RecordedTransfer {
            from: from.to_vec(),
            to: to.to_vec(),
            value: value.clone(),
            payload: payload.to_vec(),
            gas_limit,
        });
        Ok(())
    }

    fn get_balance(&self, address: &[u8]) -> BigUint {
        self.lock()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_else(BigUint::zero)
    }

    fn finish(&self, data: &[u8]) {
        self.lock().output.push(data.to_vec());
    }

    fn add_return_message(&self, message: &str) {
        self.lock().return_messages.push(message.to_string());
    }

    fn send_global_setting_to_all(&self, sender: &[u8], payload: &[u8]) {
        self.lock()
            .global_settings
            .push((sender.to_vec(), payload.to_vec()));
    }
}
