//! Multi-tier driver with read-through promotion.
//!
//! A [`ChainDriver`] orders several drivers from closest (index 0) to
//! farthest. Reads walk the tiers in order and copy a hit into every tier
//! above the one that answered. Writes go to every tier.
//!
//! ```
//! use cachet_driver::{ChainDriver, MemoryDriver};
//!
//! let chain = ChainDriver::builder()
//!     .tier(MemoryDriver::new())
//!     .tier(MemoryDriver::new())
//!     .build()
//!     .unwrap();
//! assert_eq!(chain.tiers().len(), 2);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use cachet_core::{DriverLabel, Lookup, Raw};
use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::{Driver, DriverError, DriverResult};

/// Composite driver holding an ordered, non-empty list of tiers.
///
/// Promotion writes carry no TTL: the promoted copy follows the upper tier's
/// own expiry handling, not the remaining lifetime of the original entry.
/// Promotion is not atomic with the read that triggered it.
///
/// Cloning is cheap, the tiers are shared.
#[derive(Clone)]
pub struct ChainDriver {
    tiers: Vec<Arc<dyn Driver>>,
    label: DriverLabel,
}

impl ChainDriver {
    /// Creates a chain from tiers ordered closest first.
    pub fn new(tiers: Vec<Arc<dyn Driver>>) -> DriverResult<Self> {
        Self::builder().tiers(tiers).build()
    }

    pub fn builder() -> ChainDriverBuilder {
        ChainDriverBuilder::default()
    }

    pub fn tiers(&self) -> &[Arc<dyn Driver>] {
        &self.tiers
    }

    fn tier_label(&self, tier: &dyn Driver) -> DriverLabel {
        self.label.compose(&tier.label())
    }

    async fn promote(&self, key: &str, value: &Raw, hit_tier: usize) {
        for tier in &self.tiers[..hit_tier] {
            if let Err(error) = tier.set(key, value.clone(), None).await {
                warn!(
                    tier = %self.tier_label(tier.as_ref()),
                    error = ?error,
                    "Failed to promote value into upper tier"
                );
            }
        }
    }
}

/// Builder for [`ChainDriver`].
pub struct ChainDriverBuilder {
    tiers: Vec<Arc<dyn Driver>>,
    label: DriverLabel,
}

impl Default for ChainDriverBuilder {
    fn default() -> Self {
        Self {
            tiers: Vec::new(),
            label: DriverLabel::new_static("chain"),
        }
    }
}

impl ChainDriverBuilder {
    /// Appends a tier below the ones already added.
    pub fn tier<D>(mut self, driver: D) -> Self
    where
        D: Driver + 'static,
    {
        self.tiers.push(Arc::new(driver));
        self
    }

    /// Appends an already shared tier.
    pub fn shared_tier(mut self, driver: Arc<dyn Driver>) -> Self {
        self.tiers.push(driver);
        self
    }

    pub fn tiers(mut self, tiers: impl IntoIterator<Item = Arc<dyn Driver>>) -> Self {
        self.tiers.extend(tiers);
        self
    }

    /// Identifies this chain in logs and in nested chains.
    pub fn label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    pub fn build(self) -> DriverResult<ChainDriver> {
        if self.tiers.is_empty() {
            return Err(DriverError::EmptyChain);
        }
        Ok(ChainDriver {
            tiers: self.tiers,
            label: self.label,
        })
    }
}

/// Collects per-tier outcomes of a fan-out write.
struct FanOut<'a> {
    chain: &'a ChainDriver,
    operation: &'static str,
    first_error: Option<DriverError>,
}

impl<'a> FanOut<'a> {
    fn new(chain: &'a ChainDriver, operation: &'static str) -> Self {
        Self {
            chain,
            operation,
            first_error: None,
        }
    }

    fn record(&mut self, tier: &dyn Driver, result: DriverResult<()>) {
        if let Err(error) = result {
            warn!(
                tier = %self.chain.tier_label(tier),
                operation = self.operation,
                error = ?error,
                "Tier write failed"
            );
            self.first_error.get_or_insert(error);
        }
    }

    fn finish(self) -> DriverResult<()> {
        self.first_error.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Driver for ChainDriver {
    #[tracing::instrument(skip(self), level = "trace")]
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        let mut first_error = None;
        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.fetch(key).await {
                Ok(Lookup::Hit(value)) => {
                    trace!(tier = %self.tier_label(tier.as_ref()), "Chain hit");
                    self.promote(key, &value, index).await;
                    return Ok(Lookup::Hit(value));
                }
                Ok(Lookup::Miss) => {
                    trace!(tier = %self.tier_label(tier.as_ref()), "Chain miss");
                }
                Err(error) => {
                    warn!(
                        tier = %self.tier_label(tier.as_ref()),
                        error = ?error,
                        "Tier read failed"
                    );
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(Lookup::Miss), Err)
    }

    #[tracing::instrument(skip(self, value), level = "trace")]
    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        let mut fan_out = FanOut::new(self, "set");
        for tier in &self.tiers {
            fan_out.record(tier.as_ref(), tier.set(key, value.clone(), ttl).await);
        }
        fan_out.finish()
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn delete(&self, key: &str) -> DriverResult<()> {
        let mut fan_out = FanOut::new(self, "delete");
        for tier in &self.tiers {
            fan_out.record(tier.as_ref(), tier.delete(key).await);
        }
        fan_out.finish()
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn clear(&self) -> DriverResult<()> {
        let mut fan_out = FanOut::new(self, "clear");
        for tier in &self.tiers {
            fan_out.record(tier.as_ref(), tier.clear().await);
        }
        fan_out.finish()
    }

    #[tracing::instrument(skip(self, entries), level = "trace")]
    async fn set_multiple(&self, entries: IndexMap<String, Raw>, ttl: Option<u64>) -> DriverResult<()> {
        let mut fan_out = FanOut::new(self, "set_multiple");
        for tier in &self.tiers {
            fan_out.record(tier.as_ref(), tier.set_multiple(entries.clone(), ttl).await);
        }
        fan_out.finish()
    }

    #[tracing::instrument(skip(self), level = "trace")]
    async fn delete_multiple(&self, keys: &[String]) -> DriverResult<()> {
        let mut fan_out = FanOut::new(self, "delete_multiple");
        for tier in &self.tiers {
            fan_out.record(tier.as_ref(), tier.delete_multiple(keys).await);
        }
        fan_out.finish()
    }

    /// First tier reporting presence wins. No promotion happens here.
    #[tracing::instrument(skip(self), level = "trace")]
    async fn has(&self, key: &str) -> DriverResult<bool> {
        let mut first_error = None;
        for tier in &self.tiers {
            match tier.has(key).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        tier = %self.tier_label(tier.as_ref()),
                        error = ?error,
                        "Tier presence check failed"
                    );
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(false), Err)
    }

    fn label(&self) -> DriverLabel {
        self.label.clone()
    }

    /// The tightest ceiling among the tiers.
    fn max_key_length(&self) -> Option<usize> {
        self.tiers
            .iter()
            .filter_map(|tier| tier.max_key_length())
            .min()
    }
}
