use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;

use crate::error::MintError;

/// Storage key of the contract-wide configuration record.
pub const CONFIG_KEY: &[u8] = b"tokenConfig";

/// Storage key of the directory listing every issued token name,
/// `@`-separated.
pub const ALL_ISSUED_TOKENS_KEY: &[u8] = b"allIssuedTokens";

/// Default bounds on token name length, seeded at contract init.
pub const MIN_TOKEN_NAME_LENGTH: u32 = 10;
pub const MAX_TOKEN_NAME_LENGTH: u32 = 20;

// Optional property names accepted as flag pairs by issue and
// controlChanges.
pub const PROP_BURNABLE: &[u8] = b"canBurn";
pub const PROP_MINTABLE: &[u8] = b"canMint";
pub const PROP_CAN_PAUSE: &[u8] = b"canPause";
pub const PROP_CAN_FREEZE: &[u8] = b"canFreeze";
pub const PROP_CAN_WIPE: &[u8] = b"canWipe";
pub const PROP_CAN_CHANGE_OWNER: &[u8] = b"canChangeOwner";
pub const PROP_UPGRADABLE: &[u8] = b"canUpgrade";

/// Arbitrary-precision non-negative amount, borsh-encoded as its
/// big-endian byte representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BigAmount(pub BigUint);

impl BorshSerialize for BigAmount {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        self.0.to_bytes_be().serialize(writer)
    }
}

impl BorshDeserialize for BigAmount {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let bytes = Vec::<u8>::deserialize_reader(reader)?;
        Ok(Self(BigUint::from_bytes_be(&bytes)))
    }
}

impl From<BigUint> for BigAmount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl fmt::Display for BigAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One issued token, stored under its name.
///
/// Capability flags default to off; only `upgradable` starts on, so a
/// fresh token can at least have its flags changed later. There is no
/// delete operation; records live as long as the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TokenData {
    pub owner_address: Vec<u8>,
    pub token_name: Vec<u8>,
    pub minted_value: BigAmount,
    pub burnt_value: BigAmount,
    pub burnable: bool,
    pub mintable: bool,
    pub can_pause: bool,
    pub can_freeze: bool,
    pub can_wipe: bool,
    pub can_change_owner: bool,
    pub upgradable: bool,
    pub is_paused: bool,
}

/// Contract-wide configuration singleton, replaceable wholesale by the
/// owner-only reconfiguration operation.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TokenConfig {
    pub owner_address: Vec<u8>,
    pub base_issuance_cost: BigAmount,
    pub min_token_name_length: u32,
    pub max_token_name_length: u32,
}

/// A token name is human readable when it consists solely of ASCII
/// letters and digits.
pub fn is_token_name_human_readable(name: &[u8]) -> bool {
    name.iter().all(|c| c.is_ascii_alphanumeric())
}

/// Apply optional `(property, "true"|"false")` argument pairs to a token.
///
/// An empty list is fine; an odd-length list, an unknown property name,
/// or a malformed boolean rejects the whole call.
pub fn apply_token_properties(token: &mut TokenData, args: &[Vec<u8>]) -> Result<(), MintError> {
    if args.is_empty() {
        return Ok(());
    }
    if args.len() % 2 != 0 {
        return Err(MintError::InvalidNumOfArguments);
    }

    for pair in args.chunks(2) {
        let value = parse_bool_setting(&pair[1])?;
        match pair[0].as_slice() {
            p if p == PROP_BURNABLE => token.burnable = value,
            p if p == PROP_MINTABLE => token.mintable = value,
            p if p == PROP_CAN_PAUSE => token.can_pause = value,
            p if p == PROP_CAN_FREEZE => token.can_freeze = value,
            p if p == PROP_CAN_WIPE => token.can_wipe = value,
            p if p == PROP_CAN_CHANGE_OWNER => token.can_change_owner = value,
            p if p == PROP_UPGRADABLE => token.upgradable = value,
            _ => return Err(MintError::InvalidArgument),
        }
    }

    Ok(())
}

fn parse_bool_setting(arg: &[u8]) -> Result<bool, MintError> {
    match arg {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(MintError::InvalidArgument),
    }
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
