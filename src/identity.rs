//! # Player Identity
//!
//! Normalizes player references into a canonical [`PlayerKey`] and answers
//! ownership questions against an external [`AssetAuthority`].
//!
//! A player is either *synthetic* (identified by its owning account alone) or
//! *asset-backed* (represented by a specific external asset). Ownership of
//! asset-backed players is re-checked against the authority on every query
//! and never cached, so a transferred asset immediately follows its new owner.
//!
//! ```rust
//! use guildhall::identity::{Address, AssetRef, Player};
//!
//! let owner = Address::from_low_u64(7);
//! let synthetic = Player::synthetic(owner);
//! let backed = Player::asset_backed(owner, AssetRef::new(Address::from_low_u64(7), 1));
//! assert_ne!(synthetic.compact_key(), backed.compact_key());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 20-byte account identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Build an address whose low eight bytes hold `value` (big-endian). Handy for tests and demos.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Error returned when an address string is not 20 bytes of hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address '{0}': expected 0x followed by 40 hex digits")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let decoded = hex::decode(digits).map_err(|_| ParseAddressError(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to one external asset: the asset class (contract) plus the id within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub contract: Address,
    #[serde(with = "decimal_id")]
    pub id: u128,
}

// Asset ids travel as decimal strings.
mod decimal_id {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl AssetRef {
    pub fn new(contract: Address, id: u128) -> Self {
        Self { contract, id }
    }
}

/// A participant as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub owner: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetRef>,
}

impl Player {
    pub fn synthetic(owner: Address) -> Self {
        Self { owner, asset: None }
    }

    pub fn asset_backed(owner: Address, asset: AssetRef) -> Self {
        Self {
            owner,
            asset: Some(asset),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.asset.is_none()
    }

    /// Canonical identity used for every per-player lookup. Pure; never consults the authority.
    pub fn compact_key(&self) -> PlayerKey {
        match self.asset {
            None => PlayerKey::Synthetic(self.owner),
            Some(asset) => PlayerKey::Asset {
                contract: asset.contract,
                id: asset.id,
            },
        }
    }
}

/// Composite key all per-player state is indexed by.
///
/// Synthetic and asset-backed players live in disjoint variants, so an owner
/// address that happens to equal some asset contract can never alias it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKey {
    Synthetic(Address),
    Asset { contract: Address, id: u128 },
}

impl PlayerKey {
    /// Asset class backing this key, if any.
    pub fn asset_contract(&self) -> Option<Address> {
        match self {
            PlayerKey::Synthetic(_) => None,
            PlayerKey::Asset { contract, .. } => Some(*contract),
        }
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKey::Synthetic(owner) => write!(f, "synthetic:{}", owner),
            PlayerKey::Asset { contract, id } => write!(f, "asset:{}#{}", contract, id),
        }
    }
}

/// External source of truth for asset ownership. Queries must be non-blocking reads.
pub trait AssetAuthority: Send + Sync {
    /// Current owner of `(contract, id)`, or `None` when the asset is unknown.
    fn owner_of(&self, contract: Address, id: u128) -> Option<Address>;

    /// Whether `address` is a deployed asset class rather than a plain account.
    fn is_asset_contract(&self, address: Address) -> bool;
}

/// Ownership queries for players, backed by an [`AssetAuthority`].
#[derive(Clone)]
pub struct PlayerIdentity {
    authority: Arc<dyn AssetAuthority>,
}

impl PlayerIdentity {
    pub fn new(authority: Arc<dyn AssetAuthority>) -> Self {
        Self { authority }
    }

    pub fn is_synthetic(&self, player: &Player) -> bool {
        player.is_synthetic()
    }

    /// True for synthetic players; otherwise the authority must confirm `player.owner`
    /// currently owns the asset. Unknown assets are invalid, not an error.
    pub fn is_valid(&self, player: &Player) -> bool {
        match player.asset {
            None => true,
            Some(asset) => self
                .authority
                .owner_of(asset.contract, asset.id)
                .is_some_and(|current| current == player.owner),
        }
    }

    /// Identity allowed to act for `player`. For asset-backed players this is whoever
    /// holds the asset right now, which may differ from `player.owner`.
    pub fn resolve_owner(&self, player: &Player) -> Option<Address> {
        match player.asset {
            None => Some(player.owner),
            Some(asset) => self.authority.owner_of(asset.contract, asset.id),
        }
    }

    pub fn compact_key(&self, player: &Player) -> PlayerKey {
        player.compact_key()
    }

    pub fn is_asset_contract(&self, address: Address) -> bool {
        self.authority.is_asset_contract(address)
    }
}

#[derive(Default)]
struct AuthorityBook {
    contracts: HashSet<Address>,
    owners: HashMap<(Address, u128), Address>,
}

/// In-process asset authority used by the simulator and tests.
#[derive(Default)]
pub struct InMemoryAssetAuthority {
    book: RwLock<AuthorityBook>,
}

impl InMemoryAssetAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `contract` as a deployed asset class.
    pub fn deploy_contract(&self, contract: Address) {
        if let Ok(mut book) = self.book.write() {
            book.contracts.insert(contract);
        }
    }

    /// Record `owner` as holder of `(contract, id)`, deploying the contract if needed.
    pub fn mint(&self, contract: Address, id: u128, owner: Address) {
        if let Ok(mut book) = self.book.write() {
            book.contracts.insert(contract);
            book.owners.insert((contract, id), owner);
        }
    }

    /// Move an existing asset to `new_owner`. Returns false when the asset is unknown.
    pub fn transfer(&self, contract: Address, id: u128, new_owner: Address) -> bool {
        match self.book.write() {
            Ok(mut book) => match book.owners.get_mut(&(contract, id)) {
                Some(owner) => {
                    *owner = new_owner;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl AssetAuthority for InMemoryAssetAuthority {
    fn owner_of(&self, contract: Address, id: u128) -> Option<Address> {
        self.book
            .read()
            .ok()
            .and_then(|book| book.owners.get(&(contract, id)).copied())
    }

    fn is_asset_contract(&self, address: Address) -> bool {
        self.book
            .read()
            .map(|book| book.contracts.contains(&address))
            .unwrap_or(false)
    }
}
