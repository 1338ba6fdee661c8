//! Core data model: identities, behavioral metrics, stored score records.
//!
//! All numeric fields use `u64`. Scores are dimensionless integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{MAX_LEVERAGE_RATIO, MAX_PERCENTAGE};
use crate::error::IdentityError;

/// A 20-byte subject or provider identity.
///
/// Displayed and parsed as `0x`-prefixed lowercase hex.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, bincode::Encode,
    bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null identity. Never a valid subject.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(IdentityError::MissingPrefix)?;
        if digits.len() != 40 {
            return Err(IdentityError::InvalidLength(digits.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte digest. Used for metrics content hashes (BLAKE3).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, bincode::Encode,
    bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Behavioral metrics submitted for a subject.
///
/// Grouped into four domains: transaction, DeFi, staking, and
/// risk/engagement. Percentage-like fields are bounded by
/// [`MAX_PERCENTAGE`]; `leverage_ratio` is bounded by [`MAX_LEVERAGE_RATIO`]
/// (100 = 1×). Superseded wholesale on each accepted submission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
#[serde(default, deny_unknown_fields)]
pub struct BehavioralMetrics {
    // Transaction domain
    pub transaction_frequency: u64,
    pub average_transaction_value: u64,
    /// 0–100.
    pub gas_efficiency_score: u64,
    pub cross_chain_activity_count: u64,
    /// 0–100.
    pub consistency_metric: u64,

    // DeFi domain
    pub protocol_interaction_count: u64,
    pub total_defi_balance_usd: u64,
    pub liquidity_position_count: u64,
    /// 0–100.
    pub protocol_diversity_score: u64,

    // Staking domain
    pub total_staked_usd: u64,
    pub staking_duration_days: u64,
    pub staking_platform_count: u64,
    pub reward_claim_frequency: u64,

    // Risk and engagement domain
    pub liquidation_event_count: u64,
    /// 0–10000, 100 = 1×.
    pub leverage_ratio: u64,
    /// 0–100.
    pub portfolio_volatility: u64,
    /// 0–100.
    pub staking_loyalty_score: u64,
    /// 0–100.
    pub interaction_depth_score: u64,
    pub yield_farming_active: u64,
    /// 0–100.
    pub account_age_score: u64,
    /// 0–100.
    pub activity_consistency_score: u64,
    /// 0–100.
    pub engagement_score: u64,
}

impl BehavioralMetrics {
    /// Number of fields in the record.
    pub const FIELD_COUNT: usize = 22;

    /// Every bounded field as `(name, value, max)`.
    pub fn bounded_fields(&self) -> [(&'static str, u64, u64); 10] {
        [
            ("gas_efficiency_score", self.gas_efficiency_score, MAX_PERCENTAGE),
            ("consistency_metric", self.consistency_metric, MAX_PERCENTAGE),
            ("protocol_diversity_score", self.protocol_diversity_score, MAX_PERCENTAGE),
            ("leverage_ratio", self.leverage_ratio, MAX_LEVERAGE_RATIO),
            ("portfolio_volatility", self.portfolio_volatility, MAX_PERCENTAGE),
            ("staking_loyalty_score", self.staking_loyalty_score, MAX_PERCENTAGE),
            ("interaction_depth_score", self.interaction_depth_score, MAX_PERCENTAGE),
            ("account_age_score", self.account_age_score, MAX_PERCENTAGE),
            ("activity_consistency_score", self.activity_consistency_score, MAX_PERCENTAGE),
            ("engagement_score", self.engagement_score, MAX_PERCENTAGE),
        ]
    }

    /// All fields in wire order.
    pub fn to_fields(&self) -> [u64; Self::FIELD_COUNT] {
        [
            self.transaction_frequency,
            self.average_transaction_value,
            self.gas_efficiency_score,
            self.cross_chain_activity_count,
            self.consistency_metric,
            self.protocol_interaction_count,
            self.total_defi_balance_usd,
            self.liquidity_position_count,
            self.protocol_diversity_score,
            self.total_staked_usd,
            self.staking_duration_days,
            self.staking_platform_count,
            self.reward_claim_frequency,
            self.liquidation_event_count,
            self.leverage_ratio,
            self.portfolio_volatility,
            self.staking_loyalty_score,
            self.interaction_depth_score,
            self.yield_farming_active,
            self.account_age_score,
            self.activity_consistency_score,
            self.engagement_score,
        ]
    }

    /// Build a record from fields in wire order.
    pub fn from_fields(f: [u64; Self::FIELD_COUNT]) -> Self {
        Self {
            transaction_frequency: f[0],
            average_transaction_value: f[1],
            gas_efficiency_score: f[2],
            cross_chain_activity_count: f[3],
            consistency_metric: f[4],
            protocol_interaction_count: f[5],
            total_defi_balance_usd: f[6],
            liquidity_position_count: f[7],
            protocol_diversity_score: f[8],
            total_staked_usd: f[9],
            staking_duration_days: f[10],
            staking_platform_count: f[11],
            reward_claim_frequency: f[12],
            liquidation_event_count: f[13],
            leverage_ratio: f[14],
            portfolio_volatility: f[15],
            staking_loyalty_score: f[16],
            interaction_depth_score: f[17],
            yield_farming_active: f[18],
            account_age_score: f[19],
            activity_consistency_score: f[20],
            engagement_score: f[21],
        }
    }

    /// BLAKE3 digest over the fields in wire order, each little-endian.
    ///
    /// Identical metrics always hash identically; used for the audit trail.
    pub fn content_hash(&self) -> Hash256 {
        let mut hasher = blake3::Hasher::new();
        for field in self.to_fields() {
            hasher.update(&field.to_le_bytes());
        }
        Hash256(*hasher.finalize().as_bytes())
    }

    /// Whether the subject shows no staking activity at all.
    pub fn has_no_staking(&self) -> bool {
        self.total_staked_usd == 0
            && self.staking_duration_days == 0
            && self.staking_platform_count == 0
    }
}

/// The accepted snapshot for a subject.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct ProcessedData {
    pub metrics: BehavioralMetrics,
    /// 0–100.
    pub data_quality_score: u64,
    /// Unix seconds at which the snapshot was accepted.
    pub timestamp: u64,
    /// Provider that submitted the snapshot.
    pub provider: Address,
}

/// The five component scores, each in `0..=COMPONENT_MAX`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
pub struct ComponentScores {
    pub transaction: u64,
    pub defi: u64,
    pub staking: u64,
    pub risk: u64,
    pub history: u64,
}

impl ComponentScores {
    /// Components as `(name, value)` in aggregation order.
    pub fn named(&self) -> [(&'static str, u64); 5] {
        [
            ("transaction", self.transaction),
            ("defi", self.defi),
            ("staking", self.staking),
            ("risk", self.risk),
            ("history", self.history),
        ]
    }
}

/// The stored credit score for a subject.
///
/// Uninitialized (`is_active == false`) until the first computation; never
/// deleted afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
pub struct CreditScore {
    /// 300–850 once active.
    pub total_score: u64,
    pub components: ComponentScores,
    /// Unix seconds of the last computation.
    pub last_updated: u64,
    /// 0–100.
    pub confidence: u64,
    /// Number of computations committed for this subject.
    pub update_count: u64,
    pub is_active: bool,
}

/// Audit record of the most recent computation for a subject.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct UpdateMetadata {
    /// Block/slot-equivalent sequence number of the computing call.
    pub sequence_number: u64,
    /// Work units consumed by the call at the time of computation.
    pub cost_snapshot: u64,
    /// Content hash of the metrics snapshot used.
    pub content_hash: Hash256,
    /// Total score before this computation (0 when none existed).
    pub previous_score: u64,
}

/// Result of a pure score estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePreview {
    pub total_score: u64,
    pub components: ComponentScores,
    pub confidence: u64,
}

/// Administrative parameters that the owner may adjust.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode,
    bincode::Decode,
)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    MinimumUpdateInterval,
    HistoryCap,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumUpdateInterval => f.write_str("minimum_update_interval"),
            Self::HistoryCap => f.write_str("history_cap"),
        }
    }
}

/// Caller identity and execution environment of a mutating call.
///
/// Time is injected by the caller; nothing in the core reads a wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    /// Unix seconds.
    pub timestamp: u64,
    /// Block/slot-equivalent sequence number.
    pub sequence: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64, sequence: u64) -> Self {
        Self {
            caller,
            timestamp,
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    #[test]
    fn address_display_is_prefixed_hex() {
        assert_eq!(
            addr(0xab).to_string(),
            "0xabababababababababababababababababababab"
        );
    }

    #[test]
    fn address_parse_accepts_display_output() {
        let a = addr(0x42);
        let parsed: Address = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);
    }

    #[test]
    fn address_parse_rejects_missing_prefix() {
        let err = "42".repeat(20).parse::<Address>().unwrap_err();
        assert_eq!(err, IdentityError::MissingPrefix);
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(err, IdentityError::InvalidLength(4));
    }

    #[test]
    fn address_parse_rejects_bad_hex() {
        let s = format!("0x{}", "zz".repeat(20));
        assert!(matches!(
            s.parse::<Address>(),
            Err(IdentityError::InvalidHex(_))
        ));
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!addr(1).is_zero());
    }

    #[test]
    fn address_json_is_string() {
        let json = serde_json::to_string(&addr(0x01)).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr(0x01));
    }

    #[test]
    fn content_hash_is_deterministic() {
        let m = BehavioralMetrics {
            transaction_frequency: 25,
            total_staked_usd: 5000,
            ..Default::default()
        };
        assert_eq!(m.content_hash(), m.content_hash());
        assert!(!m.content_hash().is_zero());
    }

    #[test]
    fn content_hash_changes_with_any_field() {
        let base = BehavioralMetrics::default();
        let base_hash = base.content_hash();
        for i in 0..BehavioralMetrics::FIELD_COUNT {
            let mut fields = base.to_fields();
            fields[i] = 1;
            let changed = BehavioralMetrics::from_fields(fields);
            assert_ne!(changed.content_hash(), base_hash, "field {i}");
        }
    }

    #[test]
    fn fields_roundtrip_in_wire_order() {
        let mut fields = [0u64; BehavioralMetrics::FIELD_COUNT];
        for (i, f) in fields.iter_mut().enumerate() {
            *f = i as u64 + 1;
        }
        let m = BehavioralMetrics::from_fields(fields);
        assert_eq!(m.transaction_frequency, 1);
        assert_eq!(m.leverage_ratio, 15);
        assert_eq!(m.engagement_score, 22);
        assert_eq!(m.to_fields(), fields);
    }

    #[test]
    fn metrics_json_missing_fields_default_to_zero() {
        let m: BehavioralMetrics =
            serde_json::from_str(r#"{"transaction_frequency": 7}"#).unwrap();
        assert_eq!(m.transaction_frequency, 7);
        assert_eq!(m.engagement_score, 0);
    }

    #[test]
    fn metrics_json_rejects_misspelled_field() {
        let parsed = serde_json::from_str::<BehavioralMetrics>(r#"{"transaction_frequncy": 25}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn has_no_staking_requires_all_three_zero() {
        let mut m = BehavioralMetrics::default();
        assert!(m.has_no_staking());
        m.staking_platform_count = 1;
        assert!(!m.has_no_staking());
    }

    #[test]
    fn credit_score_default_is_inactive() {
        let s = CreditScore::default();
        assert!(!s.is_active);
        assert_eq!(s.update_count, 0);
    }

    #[test]
    fn parameter_display() {
        assert_eq!(Parameter::HistoryCap.to_string(), "history_cap");
        assert_eq!(
            Parameter::MinimumUpdateInterval.to_string(),
            "minimum_update_interval"
        );
    }
}
