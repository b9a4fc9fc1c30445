use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use borsh::BorshDeserialize;
use keel_types::primitives::{Address, Epoch};
use keel_types::vm::{
    ContractCallInput, ReturnCode, BUILTIN_TOKEN_BURN, BUILTIN_TOKEN_FREEZE, BUILTIN_TOKEN_PAUSE,
    BUILTIN_TOKEN_TRANSFER, BUILTIN_TOKEN_UNFREEZE, BUILTIN_TOKEN_UNPAUSE, BUILTIN_TOKEN_WIPE,
    INIT_FUNCTION_NAME,
};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::env::SystemEnv;
use crate::epoch::{EpochNotifier, EpochSubscriber};
use crate::error::MintError;
use crate::gas::GasSchedule;
use crate::token::{
    apply_token_properties, bool_str, is_token_name_human_readable, BigAmount, TokenConfig,
    TokenData, ALL_ISSUED_TOKENS_KEY, CONFIG_KEY, MAX_TOKEN_NAME_LENGTH, MIN_TOKEN_NAME_LENGTH,
};

/// Static configuration for the token system contract.
pub struct TokenContractConfig {
    /// Address allowed to call the protected operations.
    pub owner_address: Address,
    /// Issuance fee as a decimal string, matching the node config format.
    pub base_issuance_cost: String,
    /// Epoch at which the contract starts serving calls.
    pub activation_epoch: Epoch,
    /// The contract's own ledger address.
    pub contract_address: Address,
}

/// The privileged system contract controlling token issuance.
///
/// A deterministic, gas-metered state machine over the sandboxed contract
/// storage namespace. Each call runs against one consistent gas-schedule
/// snapshot: calls take the schedule lock as readers, live schedule
/// updates as writers.
///
/// Until the activation epoch is confirmed, every call except `_init`
/// returns a user error.
pub struct TokenContract {
    env: Arc<dyn SystemEnv>,
    gas_schedule: RwLock<GasSchedule>,
    base_issuance_cost: BigUint,
    owner_address: Address,
    contract_address: Address,
    activation_epoch: Epoch,
    enabled: AtomicBool,
}

/// Closed dispatch table over the contract's operations. Burn is addressed
/// by its ledger-wide built-in name.
enum TokenFunction {
    Issue,
    IssueProtected,
    Burn,
    Mint,
    Freeze,
    Unfreeze,
    Wipe,
    Pause,
    Unpause,
    Claim,
    ConfigChange,
    ControlChanges,
    TransferOwnership,
    GetAllTokens,
    GetTokenProperties,
}

impl TokenFunction {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "issue" => Some(Self::Issue),
            "issueProtected" => Some(Self::IssueProtected),
            BUILTIN_TOKEN_BURN => Some(Self::Burn),
            "mint" => Some(Self::Mint),
            "freeze" => Some(Self::Freeze),
            "unFreeze" => Some(Self::Unfreeze),
            "wipe" => Some(Self::Wipe),
            "pause" => Some(Self::Pause),
            "unPause" => Some(Self::Unpause),
            "claim" => Some(Self::Claim),
            "configChange" => Some(Self::ConfigChange),
            "controlChanges" => Some(Self::ControlChanges),
            "transferOwnership" => Some(Self::TransferOwnership),
            "getAllTokens" => Some(Self::GetAllTokens),
            "getTokenProperties" => Some(Self::GetTokenProperties),
            _ => None,
        }
    }
}

impl TokenContract {
    /// Create the contract and register it for epoch confirmations.
    ///
    /// The issuance cost must parse as a non-negative decimal integer.
    pub fn new(
        env: Arc<dyn SystemEnv>,
        gas_schedule: GasSchedule,
        config: TokenContractConfig,
        epoch_notifier: &EpochNotifier,
    ) -> Result<Arc<Self>, MintError> {
        let base_issuance_cost = config
            .base_issuance_cost
            .parse::<BigUint>()
            .map_err(|_| MintError::InvalidBaseIssuanceCost)?;

        let contract = Arc::new(Self {
            env,
            gas_schedule: RwLock::new(gas_schedule),
            base_issuance_cost,
            owner_address: config.owner_address,
            contract_address: config.contract_address,
            activation_epoch: config.activation_epoch,
            enabled: AtomicBool::new(false),
        });
        epoch_notifier.register(contract.clone());

        Ok(contract)
    }

    /// Dispatch one contract call.
    ///
    /// Every failure surfaces as a return code plus a message on the call
    /// context; nothing panics across this boundary.
    pub fn execute(&self, input: &ContractCallInput) -> ReturnCode {
        // Held for the whole call so schedule updates serialize behind it.
        let gas_guard = self.gas_schedule.read().expect("gas schedule lock poisoned");
        let gas = *gas_guard;

        if input.function == INIT_FUNCTION_NAME {
            return self.init(input);
        }

        if !self.enabled.load(Ordering::SeqCst) {
            self.env.add_return_message("token contract disabled");
            return ReturnCode::UserError;
        }

        match TokenFunction::parse(&input.function) {
            Some(TokenFunction::Issue) => self.issue(input, &gas),
            Some(TokenFunction::IssueProtected) => self.issue_protected(input, &gas),
            Some(TokenFunction::Burn) => self.burn(input),
            Some(TokenFunction::Mint) => self.mint(input, &gas),
            Some(TokenFunction::Freeze) => self.toggle_freeze(input, &gas, BUILTIN_TOKEN_FREEZE),
            Some(TokenFunction::Unfreeze) => {
                self.toggle_freeze(input, &gas, BUILTIN_TOKEN_UNFREEZE)
            }
            Some(TokenFunction::Wipe) => self.wipe(input, &gas),
            Some(TokenFunction::Pause) => self.toggle_pause(input, &gas, BUILTIN_TOKEN_PAUSE),
            Some(TokenFunction::Unpause) => self.toggle_pause(input, &gas, BUILTIN_TOKEN_UNPAUSE),
            Some(TokenFunction::Claim) => self.claim(input, &gas),
            Some(TokenFunction::ConfigChange) => self.config_change(input, &gas),
            Some(TokenFunction::ControlChanges) => self.control_changes(input, &gas),
            Some(TokenFunction::TransferOwnership) => self.transfer_ownership(input, &gas),
            Some(TokenFunction::GetAllTokens) => self.get_all_tokens(input, &gas),
            Some(TokenFunction::GetTokenProperties) => self.get_token_properties(input, &gas),
            None => {
                self.env.add_return_message("invalid method to call");
                ReturnCode::FunctionNotFound
            }
        }
    }

    /// Replace the gas schedule. Serializes against in-flight calls.
    pub fn set_gas_schedule(&self, schedule: GasSchedule) {
        let mut gas = self.gas_schedule.write().expect("gas schedule lock poisoned");
        *gas = schedule;
    }

    /// Whether the activation epoch has been confirmed.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    // ─── Operations ─────────────────────────────────────────────────────────

    fn init(&self, _input: &ContractCallInput) -> ReturnCode {
        let config = TokenConfig {
            owner_address: self.owner_address.clone(),
            base_issuance_cost: BigAmount(self.base_issuance_cost.clone()),
            min_token_name_length: MIN_TOKEN_NAME_LENGTH,
            max_token_name_length: MAX_TOKEN_NAME_LENGTH,
        };
        match self.save_config(&config) {
            Ok(()) => ReturnCode::Ok,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                ReturnCode::UserError
            }
        }
    }

    fn issue(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.arguments.len() < 2 {
            self.env.add_return_message("not enough arguments");
            return ReturnCode::FunctionWrongSignature;
        }
        if let Err(err) = self.env.use_gas(gas.issue) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }
        let config = match self.load_config() {
            Ok(config) => config,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                return ReturnCode::UserError;
            }
        };
        let name_len = input.arguments[0].len();
        if name_len < config.min_token_name_length as usize
            || name_len > config.max_token_name_length as usize
        {
            self.env.add_return_message("token name length not in parameters");
            return ReturnCode::FunctionWrongSignature;
        }
        if input.call_value != config.base_issuance_cost.0 {
            self.env
                .add_return_message("call value does not equal base issuance cost");
            return ReturnCode::OutOfFunds;
        }

        if let Err(err) = self.issue_token(&input.caller_addr, &input.arguments) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    /// Issue on behalf of an arbitrary owner. Reserved for the contract
    /// owner; skips the public name-length gate.
    fn issue_protected(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.caller_addr != self.owner_address {
            self.env
                .add_return_message("issueProtected can be called by whitelisted address only");
            return ReturnCode::UserError;
        }
        if input.arguments.len() < 3 {
            self.env.add_return_message("not enough arguments");
            return ReturnCode::FunctionWrongSignature;
        }
        if input.arguments[0].len() != input.caller_addr.len() {
            self.env.add_return_message("invalid owner address length");
            return ReturnCode::FunctionWrongSignature;
        }
        if let Err(err) = self.env.use_gas(gas.issue) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }
        let config = match self.load_config() {
            Ok(config) => config,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                return ReturnCode::UserError;
            }
        };
        if input.call_value != config.base_issuance_cost.0 {
            self.env
                .add_return_message("call value does not equal base issuance cost");
            return ReturnCode::OutOfFunds;
        }

        if let Err(err) = self.issue_token(&input.arguments[0], &input.arguments[1..]) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    /// Shared issuance tail: `arguments[0]` is the token name,
    /// `arguments[1]` the initial supply, the rest optional flag pairs.
    fn issue_token(&self, owner: &[u8], arguments: &[Vec<u8>]) -> Result<(), MintError> {
        let token_name = &arguments[0];
        let initial_supply = BigUint::from_bytes_be(&arguments[1]);
        if initial_supply.is_zero() {
            return Err(MintError::NegativeOrZeroInitialSupply);
        }

        let existing = self.env.get_storage(token_name);
        if !existing.is_empty() {
            return Err(MintError::TokenAlreadyRegistered);
        }

        if !is_token_name_human_readable(token_name) {
            return Err(MintError::TokenNameNotHumanReadable);
        }

        let mut token = TokenData {
            owner_address: owner.to_vec(),
            token_name: token_name.clone(),
            minted_value: BigAmount(initial_supply.clone()),
            burnt_value: BigAmount::default(),
            upgradable: true,
            ..TokenData::default()
        };
        apply_token_properties(&mut token, &arguments[2..])?;
        self.save_token(&token)?;

        // Credit the freshly minted supply to the owner through the
        // built-in transfer function.
        let payload = transfer_payload(BUILTIN_TOKEN_TRANSFER, token_name, Some(&initial_supply));
        self.env
            .transfer(&self.contract_address, owner, &BigUint::zero(), &payload, 0)?;

        self.add_to_issued_tokens(token_name);

        Ok(())
    }

    fn burn(&self, input: &ContractCallInput) -> ReturnCode {
        if input.arguments.len() != 2 {
            self.env
                .add_return_message("number of arguments must be equal with 2");
            return ReturnCode::FunctionWrongSignature;
        }
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return ReturnCode::OutOfFunds;
        }
        let burnt_value = BigUint::from_bytes_be(&input.arguments[1]);
        if burnt_value.is_zero() {
            self.env.add_return_message("negative or 0 value to burn");
            return ReturnCode::UserError;
        }
        let mut token = match self.load_token(&input.arguments[0]) {
            Ok(token) => token,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                return ReturnCode::UserError;
            }
        };
        if !token.burnable {
            self.env.add_return_message("token is not burnable");
            return ReturnCode::UserError;
        }

        // Burnt value is not checked against the minted supply.
        token.burnt_value.0 += &burnt_value;

        if let Err(err) = self.save_token(&token) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        // Gas settles after the record is saved.
        if let Err(err) = self.env.use_gas(input.gas_provided) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }

        ReturnCode::Ok
    }

    fn mint(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.arguments.len() < 2 || input.arguments.len() > 3 {
            self.env.add_return_message("accepted arguments number 2/3");
            return ReturnCode::FunctionWrongSignature;
        }
        let mut token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        let mint_value = BigUint::from_bytes_be(&input.arguments[1]);
        if mint_value.is_zero() {
            self.env.add_return_message("negative or zero mint value");
            return ReturnCode::UserError;
        }
        if !token.mintable {
            self.env.add_return_message("token is not mintable");
            return ReturnCode::UserError;
        }

        token.minted_value.0 += &mint_value;
        if let Err(err) = self.save_token(&token) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        let destination = if input.arguments.len() == 3 {
            if input.arguments[2].len() != input.caller_addr.len() {
                self.env
                    .add_return_message("destination address of invalid length");
                return ReturnCode::UserError;
            }
            &input.arguments[2]
        } else {
            &token.owner_address
        };

        let payload = transfer_payload(BUILTIN_TOKEN_TRANSFER, &token.token_name, Some(&mint_value));
        if let Err(err) =
            self.env
                .transfer(&self.contract_address, destination, &BigUint::zero(), &payload, 0)
        {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    /// Freeze or unfreeze a token for one account: the directive travels
    /// to the target account as a built-in call; no local record changes.
    fn toggle_freeze(
        &self,
        input: &ContractCallInput,
        gas: &GasSchedule,
        builtin: &str,
    ) -> ReturnCode {
        if input.arguments.len() != 2 {
            self.env
                .add_return_message("invalid number of arguments, wanted 2");
            return ReturnCode::FunctionWrongSignature;
        }
        let token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        if !token.can_freeze {
            self.env.add_return_message("cannot freeze");
            return ReturnCode::UserError;
        }

        let payload = transfer_payload(builtin, &token.token_name, None);
        if let Err(err) = self.env.transfer(
            &self.contract_address,
            &input.arguments[1],
            &BigUint::zero(),
            &payload,
            0,
        ) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    fn wipe(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.arguments.len() != 2 {
            self.env
                .add_return_message("invalid number of arguments, wanted 2");
            return ReturnCode::FunctionWrongSignature;
        }
        let token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        if !token.can_wipe {
            self.env.add_return_message("cannot wipe");
            return ReturnCode::UserError;
        }
        if input.arguments[1].len() != input.caller_addr.len() {
            self.env.add_return_message("invalid arguments");
            return ReturnCode::UserError;
        }

        let payload = transfer_payload(BUILTIN_TOKEN_WIPE, &token.token_name, None);
        if let Err(err) = self.env.transfer(
            &self.contract_address,
            &input.arguments[1],
            &BigUint::zero(),
            &payload,
            0,
        ) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    /// Pause or unpause a token ledger-wide. Redundant transitions are
    /// rejected; the directive is broadcast to every shard.
    fn toggle_pause(
        &self,
        input: &ContractCallInput,
        gas: &GasSchedule,
        builtin: &str,
    ) -> ReturnCode {
        if input.arguments.len() != 1 {
            self.env
                .add_return_message("invalid number of arguments, wanted 1");
            return ReturnCode::FunctionWrongSignature;
        }
        let mut token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        if !token.can_pause {
            self.env.add_return_message("cannot pause/un-pause");
            return ReturnCode::UserError;
        }
        if token.is_paused && builtin == BUILTIN_TOKEN_PAUSE {
            self.env
                .add_return_message("cannot pause an already paused token");
            return ReturnCode::UserError;
        }
        if !token.is_paused && builtin == BUILTIN_TOKEN_UNPAUSE {
            self.env
                .add_return_message("cannot unpause an already unpaused token");
            return ReturnCode::UserError;
        }

        token.is_paused = !token.is_paused;
        if let Err(err) = self.save_token(&token) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        let payload = transfer_payload(builtin, &token.token_name, None);
        self.env
            .send_global_setting_to_all(&self.contract_address, &payload);

        ReturnCode::Ok
    }

    /// Sweep the contract's accumulated issuance fees to the owner.
    fn claim(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.caller_addr != self.owner_address {
            self.env
                .add_return_message("claim can be called by whitelisted address only");
            return ReturnCode::UserError;
        }
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return ReturnCode::UserError;
        }
        if let Err(err) = self.env.use_gas(gas.operation) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }
        if !input.arguments.is_empty() {
            self.env
                .add_return_message(&MintError::InvalidNumOfArguments.to_string());
            return ReturnCode::UserError;
        }

        let balance = self.env.get_balance(&input.recipient_addr);
        if let Err(err) =
            self.env
                .transfer(&input.recipient_addr, &input.caller_addr, &balance, &[], 0)
        {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    /// Replace the contract configuration wholesale. Owner-only.
    fn config_change(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.caller_addr != self.owner_address {
            self.env
                .add_return_message("configChange can be called by whitelisted address only");
            return ReturnCode::UserError;
        }
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return ReturnCode::UserError;
        }
        if let Err(err) = self.env.use_gas(gas.operation) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }
        if input.arguments.len() != 4 {
            self.env
                .add_return_message(&MintError::InvalidNumOfArguments.to_string());
            return ReturnCode::UserError;
        }

        let new_config = TokenConfig {
            owner_address: input.arguments[0].clone(),
            base_issuance_cost: BigAmount(BigUint::from_bytes_be(&input.arguments[1])),
            min_token_name_length: biguint_arg_to_u32(&input.arguments[2]),
            max_token_name_length: biguint_arg_to_u32(&input.arguments[3]),
        };

        if new_config.owner_address.len() != input.recipient_addr.len() {
            self.env
                .add_return_message("invalid arguments, first argument must be a valid address");
            return ReturnCode::UserError;
        }
        if new_config.min_token_name_length > new_config.max_token_name_length {
            self.env
                .add_return_message("invalid min and max token name lengths");
            return ReturnCode::UserError;
        }

        match self.save_config(&new_config) {
            Ok(()) => ReturnCode::Ok,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                ReturnCode::UserError
            }
        }
    }

    fn control_changes(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.arguments.len() < 2 {
            self.env.add_return_message("not enough arguments");
            return ReturnCode::FunctionWrongSignature;
        }
        let mut token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        if !token.upgradable {
            self.env.add_return_message("token is not upgradable");
            return ReturnCode::UserError;
        }

        if let Err(err) = apply_token_properties(&mut token, &input.arguments[1..]) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }
        if let Err(err) = self.save_token(&token) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    fn transfer_ownership(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if input.arguments.len() != 2 {
            self.env.add_return_message("expected num of arguments 2");
            return ReturnCode::FunctionWrongSignature;
        }
        let mut token = match self.basic_ownership_checks(input, gas) {
            Ok(token) => token,
            Err(code) => return code,
        };
        if !token.can_change_owner {
            self.env
                .add_return_message("cannot change owner of the token");
            return ReturnCode::UserError;
        }
        if input.arguments[1].len() != input.caller_addr.len() {
            self.env
                .add_return_message("destination address of invalid length");
            return ReturnCode::UserError;
        }

        token.owner_address = input.arguments[1].clone();
        if let Err(err) = self.save_token(&token) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        ReturnCode::Ok
    }

    fn get_all_tokens(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return ReturnCode::UserError;
        }
        if !input.arguments.is_empty() {
            self.env
                .add_return_message(&MintError::InvalidNumOfArguments.to_string());
            return ReturnCode::UserError;
        }
        if let Err(err) = self.env.use_gas(gas.operation) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }

        let directory = self.env.get_storage(ALL_ISSUED_TOKENS_KEY);
        let copy_cost = gas.data_copy_per_byte.saturating_mul(directory.len() as u64);
        if let Err(err) = self.env.use_gas(copy_cost) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::UserError;
        }

        self.env.finish(&directory);

        ReturnCode::Ok
    }

    fn get_token_properties(&self, input: &ContractCallInput, gas: &GasSchedule) -> ReturnCode {
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return ReturnCode::UserError;
        }
        if input.arguments.len() != 1 {
            self.env
                .add_return_message(&MintError::InvalidNumOfArguments.to_string());
            return ReturnCode::UserError;
        }
        if let Err(err) = self.env.use_gas(gas.operation) {
            self.env.add_return_message(&err.to_string());
            return ReturnCode::OutOfGas;
        }

        let token = match self.load_token(&input.arguments[0]) {
            Ok(token) => token,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                return ReturnCode::UserError;
            }
        };

        self.env.finish(&token.token_name);
        self.env.finish(&token.owner_address);
        self.env.finish(token.minted_value.to_string().as_bytes());
        self.env.finish(token.burnt_value.to_string().as_bytes());
        self.env
            .finish(format!("IsPaused-{}", bool_str(token.is_paused)).as_bytes());
        self.env
            .finish(format!("CanUpgrade-{}", bool_str(token.upgradable)).as_bytes());
        self.env
            .finish(format!("CanMint-{}", bool_str(token.mintable)).as_bytes());
        self.env
            .finish(format!("CanBurn-{}", bool_str(token.burnable)).as_bytes());
        self.env
            .finish(format!("CanChangeOwner-{}", bool_str(token.can_change_owner)).as_bytes());
        self.env
            .finish(format!("CanPause-{}", bool_str(token.can_pause)).as_bytes());
        self.env
            .finish(format!("CanFreeze-{}", bool_str(token.can_freeze)).as_bytes());
        self.env
            .finish(format!("CanWipe-{}", bool_str(token.can_wipe)).as_bytes());

        ReturnCode::Ok
    }

    // ─── Shared helpers ─────────────────────────────────────────────────────

    /// Validation prefix shared by the owner-gated operations: zero call
    /// value, operation gas, an existing token, and a caller matching the
    /// token owner.
    fn basic_ownership_checks(
        &self,
        input: &ContractCallInput,
        gas: &GasSchedule,
    ) -> Result<TokenData, ReturnCode> {
        if !input.call_value.is_zero() {
            self.env.add_return_message("call value must be 0");
            return Err(ReturnCode::OutOfFunds);
        }
        if let Err(err) = self.env.use_gas(gas.operation) {
            self.env.add_return_message(&err.to_string());
            return Err(ReturnCode::OutOfGas);
        }
        let token = match self.load_token(&input.arguments[0]) {
            Ok(token) => token,
            Err(err) => {
                self.env.add_return_message(&err.to_string());
                return Err(ReturnCode::UserError);
            }
        };
        if token.owner_address != input.caller_addr {
            self.env.add_return_message("can be called by owner only");
            return Err(ReturnCode::UserError);
        }

        Ok(token)
    }

    fn add_to_issued_tokens(&self, token_name: &[u8]) {
        let mut directory = self.env.get_storage(ALL_ISSUED_TOKENS_KEY);
        if directory.is_empty() {
            self.env.set_storage(ALL_ISSUED_TOKENS_KEY, token_name);
            return;
        }

        directory.push(b'@');
        directory.extend_from_slice(token_name);
        self.env.set_storage(ALL_ISSUED_TOKENS_KEY, &directory);
    }

    fn save_token(&self, token: &TokenData) -> Result<(), MintError> {
        let encoded = borsh::to_vec(token).map_err(|err| MintError::Serialization {
            reason: err.to_string(),
        })?;
        self.env.set_storage(&token.token_name, &encoded);
        Ok(())
    }

    fn load_token(&self, token_name: &[u8]) -> Result<TokenData, MintError> {
        let data = self.env.get_storage(token_name);
        if data.is_empty() {
            return Err(MintError::NoTokenWithGivenName);
        }
        TokenData::try_from_slice(&data).map_err(|err| MintError::Serialization {
            reason: err.to_string(),
        })
    }

    fn save_config(&self, config: &TokenConfig) -> Result<(), MintError> {
        let encoded = borsh::to_vec(config).map_err(|err| MintError::Serialization {
            reason: err.to_string(),
        })?;
        self.env.set_storage(CONFIG_KEY, &encoded);
        Ok(())
    }

    /// Missing storage yields the construction-time defaults, so the
    /// contract works even if a caller races the init transition.
    fn load_config(&self) -> Result<TokenConfig, MintError> {
        let data = self.env.get_storage(CONFIG_KEY);
        if data.is_empty() {
            return Ok(TokenConfig {
                owner_address: self.owner_address.clone(),
                base_issuance_cost: BigAmount(self.base_issuance_cost.clone()),
                min_token_name_length: MIN_TOKEN_NAME_LENGTH,
                max_token_name_length: MAX_TOKEN_NAME_LENGTH,
            });
        }
        TokenConfig::try_from_slice(&data).map_err(|err| MintError::Serialization {
            reason: err.to_string(),
        })
    }
}

impl EpochSubscriber for TokenContract {
    fn epoch_confirmed(&self, epoch: Epoch) {
        let enabled = epoch >= self.activation_epoch;
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::debug!(enabled, epoch, "token contract");
    }
}

/// `function@hex(name)[@hex(amount)]`: the payload format the built-in
/// ledger functions consume.
fn transfer_payload(function: &str, token_name: &[u8], amount: Option<&BigUint>) -> Vec<u8> {
    let mut payload = format!("{function}@{}", hex::encode(token_name));
    if let Some(amount) = amount {
        payload.push('@');
        payload.push_str(&hex::encode(amount.to_bytes_be()));
    }
    payload.into_bytes()
}

/// Low 32 bits of a big-endian argument, for the name-length bounds.
fn biguint_arg_to_u32(arg: &[u8]) -> u32 {
    BigUint::from_bytes_be(arg).to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::{GAS_TOKEN_ISSUE, GAS_TOKEN_OPERATION};
    use crate::testing::TestEnv;

    const BASE_COST: u64 = 5_000;
    const TOKEN: &[u8] = b"KEELGOLD01";

    fn owner() -> Vec<u8> {
        vec![0xAA; 32]
    }

    fn alice() -> Vec<u8> {
        vec![1u8; 32]
    }

    fn bob() -> Vec<u8> {
        vec![2u8; 32]
    }

    fn contract_address() -> Vec<u8> {
        vec![0xFF; 32]
    }

    fn supply(value: u64) -> Vec<u8> {
        BigUint::from(value).to_bytes_be()
    }

    fn make_call(
        function: &str,
        caller: Vec<u8>,
        call_value: u64,
        arguments: Vec<Vec<u8>>,
    ) -> ContractCallInput {
        ContractCallInput {
            caller_addr: caller,
            recipient_addr: contract_address(),
            function: function.to_string(),
            call_value: BigUint::from(call_value),
            gas_provided: 1_000_000,
            arguments,
        }
    }

    /// Activated and initialized contract over a fresh test environment.
    fn setup() -> (Arc<TestEnv>, Arc<TokenContract>) {
        let env = Arc::new(TestEnv::new());
        let notifier = EpochNotifier::new();
        let contract = TokenContract::new(
            env.clone(),
            GasSchedule::default(),
            TokenContractConfig {
                owner_address: owner(),
                base_issuance_cost: BASE_COST.to_string(),
                activation_epoch: 1,
                contract_address: contract_address(),
            },
            &notifier,
        )
        .unwrap();
        notifier.confirm(1);

        let init = make_call(INIT_FUNCTION_NAME, owner(), 0, vec![]);
        assert_eq!(contract.execute(&init), ReturnCode::Ok);
        (env, contract)
    }

    fn issue_default(
        env: &TestEnv,
        contract: &TokenContract,
        name: &[u8],
        amount: u64,
        extra_args: Vec<Vec<u8>>,
    ) -> ReturnCode {
        let mut arguments = vec![name.to_vec(), supply(amount)];
        arguments.extend(extra_args);
        let code = contract.execute(&make_call("issue", alice(), BASE_COST, arguments));
        env.reset_call();
        code
    }

    fn load_token(env: &TestEnv, name: &[u8]) -> TokenData {
        TokenData::try_from_slice(&env.storage_get(name)).unwrap()
    }

    // ─── Construction and activation ────────────────────────────────────────

    #[test]
    fn test_invalid_base_cost_rejected() {
        let env = Arc::new(TestEnv::new());
        let notifier = EpochNotifier::new();
        let result = TokenContract::new(
            env,
            GasSchedule::default(),
            TokenContractConfig {
                owner_address: owner(),
                base_issuance_cost: "-5".to_string(),
                activation_epoch: 0,
                contract_address: contract_address(),
            },
            &notifier,
        );
        assert!(matches!(result, Err(MintError::InvalidBaseIssuanceCost)));
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_disabled_until_activation_epoch() {
        let env = Arc::new(TestEnv::new());
        let notifier = EpochNotifier::new();
        let contract = TokenContract::new(
            env.clone(),
            GasSchedule::default(),
            TokenContractConfig {
                owner_address: owner(),
                base_issuance_cost: BASE_COST.to_string(),
                activation_epoch: 5,
                contract_address: contract_address(),
            },
            &notifier,
        )
        .unwrap();

        // Init is the deploy transition and runs even while disabled.
        let init = make_call(INIT_FUNCTION_NAME, owner(), 0, vec![]);
        assert_eq!(contract.execute(&init), ReturnCode::Ok);

        let issue = make_call("issue", alice(), BASE_COST, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&issue), ReturnCode::UserError);
        assert_eq!(
            env.last_return_message().unwrap(),
            "token contract disabled"
        );
        assert!(!contract.is_enabled());

        notifier.confirm(4);
        assert!(!contract.is_enabled());
        notifier.confirm(5);
        assert!(contract.is_enabled());

        env.reset_call();
        assert_eq!(contract.execute(&issue), ReturnCode::Ok);

        // An epoch regression disables the contract again.
        notifier.confirm(3);
        assert!(!contract.is_enabled());
    }

    #[test]
    fn test_unknown_function() {
        let (env, contract) = setup();
        let call = make_call("selfDestruct", alice(), 0, vec![]);
        assert_eq!(contract.execute(&call), ReturnCode::FunctionNotFound);
        assert_eq!(env.last_return_message().unwrap(), "invalid method to call");
    }

    // ─── issue ──────────────────────────────────────────────────────────────

    #[test]
    fn test_issue_records_token_with_defaults() {
        let (env, contract) = setup();
        assert_eq!(issue_default(&env, &contract, TOKEN, 1_000, vec![]), ReturnCode::Ok);

        let token = load_token(&env, TOKEN);
        assert_eq!(token.owner_address, alice());
        assert_eq!(token.token_name, TOKEN);
        assert_eq!(token.minted_value.0, BigUint::from(1_000u32));
        assert!(token.burnt_value.0.is_zero());
        assert!(!token.burnable);
        assert!(!token.mintable);
        assert!(!token.can_pause);
        assert!(!token.can_freeze);
        assert!(!token.can_wipe);
        assert!(!token.can_change_owner);
        assert!(token.upgradable);
        assert!(!token.is_paused);

        // The minted supply is credited to the owner through the built-in
        // transfer, and the directory lists the new token.
        let transfers = env.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from, contract_address());
        assert_eq!(transfers[0].to, alice());
        let expected =
            transfer_payload(BUILTIN_TOKEN_TRANSFER, TOKEN, Some(&BigUint::from(1_000u32)));
        assert_eq!(transfers[0].payload, expected);
        assert_eq!(env.storage_get(ALL_ISSUED_TOKENS_KEY), TOKEN);
    }

    #[test]
    fn test_issue_with_flag_overrides() {
        let (env, contract) = setup();
        let code = issue_default(
            &env,
            &contract,
            TOKEN,
            500,
            vec![
                b"canBurn".to_vec(),
                b"true".to_vec(),
                b"canUpgrade".to_vec(),
                b"false".to_vec(),
            ],
        );
        assert_eq!(code, ReturnCode::Ok);

        let token = load_token(&env, TOKEN);
        assert!(token.burnable);
        assert!(!token.upgradable);
    }

    #[test]
    fn test_issue_wrong_call_value() {
        let (env, contract) = setup();
        let call = make_call(
            "issue",
            alice(),
            BASE_COST - 1,
            vec![TOKEN.to_vec(), supply(100)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::OutOfFunds);
        assert!(env.storage_get(TOKEN).is_empty());
    }

    #[test]
    fn test_issue_name_length_bounds() {
        let (env, contract) = setup();
        // Too short.
        let call = make_call("issue", alice(), BASE_COST, vec![b"SHORT".to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::FunctionWrongSignature);
        env.reset_call();

        // Too long.
        let long = vec![b'A'; 21];
        let call = make_call("issue", alice(), BASE_COST, vec![long, supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::FunctionWrongSignature);
    }

    #[test]
    fn test_issue_not_enough_arguments() {
        let (_env, contract) = setup();
        let call = make_call("issue", alice(), BASE_COST, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&call), ReturnCode::FunctionWrongSignature);
    }

    #[test]
    fn test_issue_zero_supply_rejected() {
        let (env, contract) = setup();
        assert_eq!(issue_default(&env, &contract, TOKEN, 0, vec![]), ReturnCode::UserError);
        assert!(env.storage_get(TOKEN).is_empty());
    }

    #[test]
    fn test_issue_duplicate_rejected_without_mutation() {
        let (env, contract) = setup();
        assert_eq!(issue_default(&env, &contract, TOKEN, 1_000, vec![]), ReturnCode::Ok);
        let stored = env.storage_get(TOKEN);
        let directory = env.storage_get(ALL_ISSUED_TOKENS_KEY);

        let code = issue_default(&env, &contract, TOKEN, 2_000, vec![]);
        assert_eq!(code, ReturnCode::UserError);
        assert_eq!(env.storage_get(TOKEN), stored);
        assert_eq!(env.storage_get(ALL_ISSUED_TOKENS_KEY), directory);
    }

    #[test]
    fn test_issue_non_alphanumeric_name_rejected() {
        let (env, contract) = setup();
        let code = issue_default(&env, &contract, b"KEEL_GOLD1", 1_000, vec![]);
        assert_eq!(code, ReturnCode::UserError);
        assert!(env.storage_get(b"KEEL_GOLD1").is_empty());
    }

    #[test]
    fn test_issue_unknown_flag_rejected() {
        let (env, contract) = setup();
        let code = issue_default(
            &env,
            &contract,
            TOKEN,
            100,
            vec![b"canFly".to_vec(), b"true".to_vec()],
        );
        assert_eq!(code, ReturnCode::UserError);
        assert!(env.storage_get(TOKEN).is_empty());
    }

    #[test]
    fn test_issue_gas_charged_up_front() {
        let (env, contract) = setup();
        env.set_gas_limit(GAS_TOKEN_ISSUE - 1);
        let call = make_call("issue", alice(), BASE_COST, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::OutOfGas);
        assert!(env.storage_get(TOKEN).is_empty());
    }

    // ─── issueProtected ─────────────────────────────────────────────────────

    #[test]
    fn test_issue_protected_owner_only() {
        let (_env, contract) = setup();
        let call = make_call(
            "issueProtected",
            alice(),
            BASE_COST,
            vec![bob(), b"ABC123".to_vec(), supply(1_000)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_issue_protected_skips_name_length_gate() {
        let (env, contract) = setup();
        // "ABC123" is below the public minimum length but issues fine
        // through the protected path, with the given owner.
        let call = make_call(
            "issueProtected",
            owner(),
            BASE_COST,
            vec![bob(), b"ABC123".to_vec(), supply(1_000)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let token = load_token(&env, b"ABC123");
        assert_eq!(token.owner_address, bob());
        assert_eq!(token.minted_value.0, BigUint::from(1_000u32));
        assert!(token.burnt_value.0.is_zero());
        assert!(token.upgradable);
    }

    #[test]
    fn test_issue_protected_owner_address_length_checked() {
        let (_env, contract) = setup();
        let call = make_call(
            "issueProtected",
            owner(),
            BASE_COST,
            vec![vec![1u8; 5], b"ABC123".to_vec(), supply(1_000)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::FunctionWrongSignature);
    }

    // ─── burn ───────────────────────────────────────────────────────────────

    #[test]
    fn test_burn_requires_capability() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call(BUILTIN_TOKEN_BURN, bob(), 0, vec![TOKEN.to_vec(), supply(10)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "token is not burnable");
    }

    #[test]
    fn test_burn_is_not_owner_gated() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canBurn".to_vec(), b"true".to_vec()],
        );

        // Anyone holding the token may burn; the caller is not checked
        // against the owner.
        let call = make_call(BUILTIN_TOKEN_BURN, bob(), 0, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(load_token(&env, TOKEN).burnt_value.0, BigUint::from(100u32));
    }

    #[test]
    fn test_burn_beyond_minted_supply_is_permitted() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canBurn".to_vec(), b"true".to_vec()],
        );

        // Only positivity is checked; the burnt total may exceed the
        // minted supply.
        let call = make_call(BUILTIN_TOKEN_BURN, alice(), 0, vec![TOKEN.to_vec(), supply(5_000)]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let token = load_token(&env, TOKEN);
        assert_eq!(token.burnt_value.0, BigUint::from(5_000u32));
        assert!(token.burnt_value.0 > token.minted_value.0);
    }

    #[test]
    fn test_burn_zero_value_rejected() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canBurn".to_vec(), b"true".to_vec()],
        );

        let call = make_call(BUILTIN_TOKEN_BURN, alice(), 0, vec![TOKEN.to_vec(), supply(0)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_burn_settles_gas_after_saving() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canBurn".to_vec(), b"true".to_vec()],
        );

        // The burn is recorded before the gas deduction runs, so an
        // exhausted budget still leaves the burnt value saved.
        env.set_gas_limit(5);
        let mut call = make_call(BUILTIN_TOKEN_BURN, alice(), 0, vec![TOKEN.to_vec(), supply(40)]);
        call.gas_provided = 10;
        assert_eq!(contract.execute(&call), ReturnCode::OutOfGas);
        assert_eq!(load_token(&env, TOKEN).burnt_value.0, BigUint::from(40u32));
    }

    #[test]
    fn test_burn_missing_token() {
        let (env, contract) = setup();
        let call = make_call(BUILTIN_TOKEN_BURN, alice(), 0, vec![TOKEN.to_vec(), supply(10)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(
            env.last_return_message().unwrap(),
            "no token with given name"
        );
    }

    #[test]
    fn test_burn_nonzero_call_value() {
        let (_env, contract) = setup();
        let call = make_call(BUILTIN_TOKEN_BURN, alice(), 1, vec![TOKEN.to_vec(), supply(10)]);
        assert_eq!(contract.execute(&call), ReturnCode::OutOfFunds);
    }

    // ─── mint ───────────────────────────────────────────────────────────────

    #[test]
    fn test_mint_owner_only() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canMint".to_vec(), b"true".to_vec()],
        );

        let call = make_call("mint", bob(), 0, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "can be called by owner only");
    }

    #[test]
    fn test_mint_increases_supply_and_credits_owner() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canMint".to_vec(), b"true".to_vec()],
        );

        let call = make_call("mint", alice(), 0, vec![TOKEN.to_vec(), supply(500)]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(
            load_token(&env, TOKEN).minted_value.0,
            BigUint::from(1_500u32)
        );

        let transfers = env.transfers();
        assert_eq!(transfers.last().unwrap().to, alice());
    }

    #[test]
    fn test_mint_to_explicit_destination() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canMint".to_vec(), b"true".to_vec()],
        );

        let call = make_call("mint", alice(), 0, vec![TOKEN.to_vec(), supply(500), bob()]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(env.transfers().last().unwrap().to, bob());
    }

    #[test]
    fn test_mint_destination_length_checked() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canMint".to_vec(), b"true".to_vec()],
        );

        let call = make_call(
            "mint",
            alice(),
            0,
            vec![TOKEN.to_vec(), supply(500), vec![9u8; 3]],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_mint_requires_capability() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call("mint", alice(), 0, vec![TOKEN.to_vec(), supply(500)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "token is not mintable");
    }

    // ─── freeze / wipe ──────────────────────────────────────────────────────

    #[test]
    fn test_freeze_sends_directive_to_target() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canFreeze".to_vec(), b"true".to_vec()],
        );
        let stored = env.storage_get(TOKEN);

        let call = make_call("freeze", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let transfers = env.transfers();
        let directive = transfers.last().unwrap();
        assert_eq!(directive.to, bob());
        assert_eq!(
            directive.payload,
            transfer_payload(BUILTIN_TOKEN_FREEZE, TOKEN, None)
        );
        // Freezing is account-scoped; the token record itself is untouched.
        assert_eq!(env.storage_get(TOKEN), stored);

        let unfreeze = make_call("unFreeze", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&unfreeze), ReturnCode::Ok);
        assert_eq!(
            env.transfers().last().unwrap().payload,
            transfer_payload(BUILTIN_TOKEN_UNFREEZE, TOKEN, None)
        );
    }

    #[test]
    fn test_freeze_requires_capability() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call("freeze", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "cannot freeze");
    }

    #[test]
    fn test_wipe_checks_target_length() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canWipe".to_vec(), b"true".to_vec()],
        );

        let bad = make_call("wipe", alice(), 0, vec![TOKEN.to_vec(), vec![9u8; 3]]);
        assert_eq!(contract.execute(&bad), ReturnCode::UserError);
        env.reset_call();

        let good = make_call("wipe", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&good), ReturnCode::Ok);
        assert_eq!(
            env.transfers().last().unwrap().payload,
            transfer_payload(BUILTIN_TOKEN_WIPE, TOKEN, None)
        );
    }

    // ─── pause / unpause ────────────────────────────────────────────────────

    #[test]
    fn test_pause_broadcasts_and_persists() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canPause".to_vec(), b"true".to_vec()],
        );

        let call = make_call("pause", alice(), 0, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert!(load_token(&env, TOKEN).is_paused);

        let broadcasts = env.global_settings();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, contract_address());
        assert_eq!(
            broadcasts[0].1,
            transfer_payload(BUILTIN_TOKEN_PAUSE, TOKEN, None)
        );
    }

    #[test]
    fn test_pause_twice_rejected() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canPause".to_vec(), b"true".to_vec()],
        );

        let pause = make_call("pause", alice(), 0, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&pause), ReturnCode::Ok);
        env.reset_call();

        assert_eq!(contract.execute(&pause), ReturnCode::UserError);
        assert_eq!(
            env.last_return_message().unwrap(),
            "cannot pause an already paused token"
        );
        assert!(load_token(&env, TOKEN).is_paused);
    }

    #[test]
    fn test_unpause_when_not_paused_rejected() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canPause".to_vec(), b"true".to_vec()],
        );

        let unpause = make_call("unPause", alice(), 0, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&unpause), ReturnCode::UserError);
        assert!(!load_token(&env, TOKEN).is_paused);
    }

    #[test]
    fn test_pause_requires_capability() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call("pause", alice(), 0, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "cannot pause/un-pause");
    }

    // ─── transferOwnership / controlChanges ─────────────────────────────────

    #[test]
    fn test_transfer_ownership() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canChangeOwner".to_vec(), b"true".to_vec()],
        );

        let call = make_call("transferOwnership", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(load_token(&env, TOKEN).owner_address, bob());

        // The previous owner lost control.
        env.reset_call();
        let call = make_call("transferOwnership", alice(), 0, vec![TOKEN.to_vec(), alice()]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_transfer_ownership_requires_capability() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call("transferOwnership", alice(), 0, vec![TOKEN.to_vec(), bob()]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(
            env.last_return_message().unwrap(),
            "cannot change owner of the token"
        );
    }

    #[test]
    fn test_control_changes_updates_flags() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 1_000, vec![]);

        let call = make_call(
            "controlChanges",
            alice(),
            0,
            vec![
                TOKEN.to_vec(),
                b"canBurn".to_vec(),
                b"true".to_vec(),
                b"canMint".to_vec(),
                b"true".to_vec(),
            ],
        );
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let token = load_token(&env, TOKEN);
        assert!(token.burnable);
        assert!(token.mintable);
    }

    #[test]
    fn test_control_changes_blocked_when_not_upgradable() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canUpgrade".to_vec(), b"false".to_vec()],
        );

        let call = make_call(
            "controlChanges",
            alice(),
            0,
            vec![TOKEN.to_vec(), b"canBurn".to_vec(), b"true".to_vec()],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert_eq!(env.last_return_message().unwrap(), "token is not upgradable");
    }

    // ─── claim / configChange ───────────────────────────────────────────────

    #[test]
    fn test_claim_sweeps_contract_balance_to_owner() {
        let (env, contract) = setup();
        env.set_balance(&contract_address(), BigUint::from(12_345u32));

        let call = make_call("claim", owner(), 0, vec![]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let transfers = env.transfers();
        let sweep = transfers.last().unwrap();
        assert_eq!(sweep.from, contract_address());
        assert_eq!(sweep.to, owner());
        assert_eq!(sweep.value, BigUint::from(12_345u32));
        assert!(sweep.payload.is_empty());
    }

    #[test]
    fn test_claim_owner_only() {
        let (_env, contract) = setup();
        let call = make_call("claim", alice(), 0, vec![]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_config_change_applies_to_later_issues() {
        let (env, contract) = setup();

        // Lower the minimum name length to 3 and double the cost.
        let call = make_call(
            "configChange",
            owner(),
            0,
            vec![
                owner(),
                BigUint::from(BASE_COST * 2).to_bytes_be(),
                supply(3),
                supply(20),
            ],
        );
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        env.reset_call();

        // Old cost no longer accepted.
        let call = make_call("issue", alice(), BASE_COST, vec![b"SEA".to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::OutOfFunds);
        env.reset_call();

        // Short name now allowed at the new cost.
        let call = make_call(
            "issue",
            alice(),
            BASE_COST * 2,
            vec![b"SEA".to_vec(), supply(100)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
    }

    #[test]
    fn test_config_change_owner_only() {
        let (_env, contract) = setup();
        let call = make_call(
            "configChange",
            alice(),
            0,
            vec![owner(), supply(1), supply(1), supply(5)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_config_change_rejects_inverted_bounds() {
        let (_env, contract) = setup();
        let call = make_call(
            "configChange",
            owner(),
            0,
            vec![owner(), supply(1), supply(20), supply(10)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    #[test]
    fn test_config_change_rejects_bad_owner_length() {
        let (_env, contract) = setup();
        let call = make_call(
            "configChange",
            owner(),
            0,
            vec![vec![1u8; 4], supply(1), supply(1), supply(5)],
        );
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    // ─── queries ────────────────────────────────────────────────────────────

    #[test]
    fn test_get_all_tokens_lists_directory() {
        let (env, contract) = setup();
        issue_default(&env, &contract, b"KEELGOLD01", 100, vec![]);
        issue_default(&env, &contract, b"KEELIRON02", 100, vec![]);

        let call = make_call("getAllTokens", alice(), 0, vec![]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(env.output(), vec![b"KEELGOLD01@KEELIRON02".to_vec()]);
    }

    #[test]
    fn test_get_all_tokens_copy_gas_shortfall_is_user_error() {
        let (env, contract) = setup();
        issue_default(&env, &contract, TOKEN, 100, vec![]);

        // Enough for the flat operation cost but not for the per-byte
        // directory copy: the copy shortfall surfaces as a user error.
        env.set_gas_limit(GAS_TOKEN_OPERATION + 10);
        let call = make_call("getAllTokens", alice(), 0, vec![]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
        assert!(env.output().is_empty());
    }

    #[test]
    fn test_get_token_properties_output() {
        let (env, contract) = setup();
        issue_default(
            &env,
            &contract,
            TOKEN,
            1_000,
            vec![b"canBurn".to_vec(), b"true".to_vec()],
        );

        let call = make_call("getTokenProperties", bob(), 0, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);

        let output = env.output();
        assert_eq!(output.len(), 12);
        assert_eq!(output[0], TOKEN);
        assert_eq!(output[1], alice());
        assert_eq!(output[2], b"1000");
        assert_eq!(output[3], b"0");
        assert_eq!(output[4], b"IsPaused-false");
        assert_eq!(output[5], b"CanUpgrade-true");
        assert_eq!(output[6], b"CanMint-false");
        assert_eq!(output[7], b"CanBurn-true");
        assert_eq!(output[8], b"CanChangeOwner-false");
        assert_eq!(output[9], b"CanPause-false");
        assert_eq!(output[10], b"CanFreeze-false");
        assert_eq!(output[11], b"CanWipe-false");
    }

    #[test]
    fn test_get_token_properties_requires_zero_value() {
        let (_env, contract) = setup();
        let call = make_call("getTokenProperties", bob(), 7, vec![TOKEN.to_vec()]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }

    // ─── gas schedule updates ───────────────────────────────────────────────

    #[test]
    fn test_gas_schedule_update_applies_to_next_call() {
        let (env, contract) = setup();

        contract.set_gas_schedule(GasSchedule {
            issue: 100,
            operation: 10,
            data_copy_per_byte: 1,
        });

        let call = make_call("issue", alice(), BASE_COST, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::Ok);
        assert_eq!(env.gas_used(), 100);
    }

    #[test]
    fn test_transfer_failure_surfaces_as_user_error() {
        let (env, contract) = setup();
        env.set_fail_transfers(true);

        let call = make_call("issue", alice(), BASE_COST, vec![TOKEN.to_vec(), supply(100)]);
        assert_eq!(contract.execute(&call), ReturnCode::UserError);
    }
}
