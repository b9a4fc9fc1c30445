/// 32-byte Ed25519 public key identifying a remote peer.
pub type PublicKey = [u8; 32];

/// Numeric shard identifier.
pub type ShardId = u32;

/// Ledger epoch number.
pub type Epoch = u32;

/// Opaque account address as carried in contract calls.
///
/// Address length is a chain parameter rather than a compile-time
/// constant, so call-level validation compares lengths instead of relying
/// on the type.
pub type Address = Vec<u8>;
