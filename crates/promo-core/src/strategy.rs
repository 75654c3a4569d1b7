//! # Discount Strategies
//!
//! Pluggable strategies named by a discount's `sorterKey`, `applierKey`,
//! `usageKey` and `pickerKey`, and the registry that resolves those keys.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StrategyRegistry                        │
//! │  sorters   PRICE_ASC (default), PRICE_DESC                  │
//! │  appliers  ALL (default), "1", "2", ...                     │
//! │  usages    ALL (default), "1", "2", ...                     │
//! │  pickers   VERTICAL (default), HORIZONTAL                   │
//! └─────────────────────────────────────────────────────────────┘
//!                            │ resolve(StrategyKeys)
//!                            ▼
//!   DiscountStrategies::select_items: pick → sort → usage cap → apply
//! ```
//!
//! The registry is injected into the resolver; nothing else dispatches on
//! strategy key strings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cart::LineItem;
use crate::discount::StrategyKeys;
use crate::error::{DiscountError, DiscountResult};

pub const DEFAULT_SORTER: &str = "PRICE_ASC";
pub const DEFAULT_APPLIER: &str = "ALL";
pub const DEFAULT_USAGE: &str = "ALL";
pub const DEFAULT_PICKER: &str = "VERTICAL";

/// Orders candidate line items before the usage cap is applied
pub trait ItemSorter: Send + Sync {
    fn key(&self) -> &str;

    fn sort(&self, items: &mut [&LineItem]);
}

/// Chooses which of the remaining items receive the discount
pub trait ItemApplier: Send + Sync {
    fn key(&self) -> &str;

    fn select<'a>(&self, items: Vec<&'a LineItem>) -> Vec<&'a LineItem>;
}

/// Caps how many items a discount may be used on
pub trait UsageCounter: Send + Sync {
    fn key(&self) -> &str;

    /// Number of items usable out of `available`
    fn limit(&self, available: usize) -> usize;
}

/// Flattens matched set groups into one candidate list
pub trait GroupPicker: Send + Sync {
    fn key(&self) -> &str;

    fn pick<'a>(&self, groups: &[Vec<&'a LineItem>]) -> Vec<&'a LineItem>;
}

/// Cheapest unit price first
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceAscSorter;

impl ItemSorter for PriceAscSorter {
    fn key(&self) -> &str {
        "PRICE_ASC"
    }

    fn sort(&self, items: &mut [&LineItem]) {
        items.sort_by(|a, b| a.unit_price.total_cmp(&b.unit_price));
    }
}

/// Most expensive unit price first
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceDescSorter;

impl ItemSorter for PriceDescSorter {
    fn key(&self) -> &str {
        "PRICE_DESC"
    }

    fn sort(&self, items: &mut [&LineItem]) {
        items.sort_by(|a, b| b.unit_price.total_cmp(&a.unit_price));
    }
}

/// Every item receives the discount
#[derive(Debug, Clone, Copy, Default)]
pub struct AllApplier;

impl ItemApplier for AllApplier {
    fn key(&self) -> &str {
        "ALL"
    }

    fn select<'a>(&self, items: Vec<&'a LineItem>) -> Vec<&'a LineItem> {
        items
    }
}

/// Only the item at a 1-based position receives the discount
#[derive(Debug, Clone)]
pub struct PositionApplier {
    key: String,
    position: usize,
}

impl PositionApplier {
    pub fn new(position: usize) -> Self {
        Self {
            key: position.to_string(),
            position,
        }
    }
}

impl ItemApplier for PositionApplier {
    fn key(&self) -> &str {
        &self.key
    }

    fn select<'a>(&self, items: Vec<&'a LineItem>) -> Vec<&'a LineItem> {
        self.position
            .checked_sub(1)
            .and_then(|index| items.get(index).copied())
            .into_iter()
            .collect()
    }
}

/// No usage cap
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedUsage;

impl UsageCounter for UnlimitedUsage {
    fn key(&self) -> &str {
        "ALL"
    }

    fn limit(&self, available: usize) -> usize {
        available
    }
}

/// Usable on at most `max` items
#[derive(Debug, Clone)]
pub struct MaxUsage {
    key: String,
    max: usize,
}

impl MaxUsage {
    pub fn new(max: usize) -> Self {
        Self {
            key: max.to_string(),
            max,
        }
    }
}

impl UsageCounter for MaxUsage {
    fn key(&self) -> &str {
        &self.key
    }

    fn limit(&self, available: usize) -> usize {
        available.min(self.max)
    }
}

/// Group after group
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalPicker;

impl GroupPicker for VerticalPicker {
    fn key(&self) -> &str {
        "VERTICAL"
    }

    fn pick<'a>(&self, groups: &[Vec<&'a LineItem>]) -> Vec<&'a LineItem> {
        groups.iter().flatten().copied().collect()
    }
}

/// First item of every group, then the second of every group, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalPicker;

impl GroupPicker for HorizontalPicker {
    fn key(&self) -> &str {
        "HORIZONTAL"
    }

    fn pick<'a>(&self, groups: &[Vec<&'a LineItem>]) -> Vec<&'a LineItem> {
        let depth = groups.iter().map(Vec::len).max().unwrap_or(0);
        (0..depth)
            .flat_map(move |row| groups.iter().filter_map(move |group| group.get(row).copied()))
            .collect()
    }
}

/// Strategies resolved for one discount
#[derive(Clone)]
pub struct DiscountStrategies {
    pub sorter: Arc<dyn ItemSorter>,
    pub applier: Arc<dyn ItemApplier>,
    pub usage: Arc<dyn UsageCounter>,
    pub picker: Arc<dyn GroupPicker>,
}

impl DiscountStrategies {
    /// Items of the matched groups that receive the discount
    pub fn select_items<'a>(&self, groups: &[Vec<&'a LineItem>]) -> Vec<&'a LineItem> {
        let mut items = self.picker.pick(groups);
        self.sorter.sort(&mut items);
        items.truncate(self.usage.limit(items.len()));
        self.applier.select(items)
    }
}

impl fmt::Debug for DiscountStrategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountStrategies")
            .field("sorter", &self.sorter.key())
            .field("applier", &self.applier.key())
            .field("usage", &self.usage.key())
            .field("picker", &self.picker.key())
            .finish()
    }
}

/// Registry mapping strategy keys to implementations
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    sorters: HashMap<String, Arc<dyn ItemSorter>>,
    appliers: HashMap<String, Arc<dyn ItemApplier>>,
    usages: HashMap<String, Arc<dyn UsageCounter>>,
    pickers: HashMap<String, Arc<dyn GroupPicker>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in strategies
    pub fn with_defaults() -> Self {
        Self::new()
            .with_sorter(Arc::new(PriceAscSorter))
            .with_sorter(Arc::new(PriceDescSorter))
            .with_applier(Arc::new(AllApplier))
            .with_usage(Arc::new(UnlimitedUsage))
            .with_picker(Arc::new(VerticalPicker))
            .with_picker(Arc::new(HorizontalPicker))
    }

    pub fn register_sorter(&mut self, sorter: Arc<dyn ItemSorter>) {
        self.sorters.insert(sorter.key().to_string(), sorter);
    }

    pub fn register_applier(&mut self, applier: Arc<dyn ItemApplier>) {
        self.appliers.insert(applier.key().to_string(), applier);
    }

    pub fn register_usage(&mut self, usage: Arc<dyn UsageCounter>) {
        self.usages.insert(usage.key().to_string(), usage);
    }

    pub fn register_picker(&mut self, picker: Arc<dyn GroupPicker>) {
        self.pickers.insert(picker.key().to_string(), picker);
    }

    /// Register with builder pattern
    pub fn with_sorter(mut self, sorter: Arc<dyn ItemSorter>) -> Self {
        self.register_sorter(sorter);
        self
    }

    /// Register with builder pattern
    pub fn with_applier(mut self, applier: Arc<dyn ItemApplier>) -> Self {
        self.register_applier(applier);
        self
    }

    /// Register with builder pattern
    pub fn with_usage(mut self, usage: Arc<dyn UsageCounter>) -> Self {
        self.register_usage(usage);
        self
    }

    /// Register with builder pattern
    pub fn with_picker(mut self, picker: Arc<dyn GroupPicker>) -> Self {
        self.register_picker(picker);
        self
    }

    /// Sorter for `key`, or the default sorter when unset
    pub fn sorter(&self, key: Option<&str>) -> DiscountResult<Arc<dyn ItemSorter>> {
        lookup(&self.sorters, "sorter", key.unwrap_or(DEFAULT_SORTER))
    }

    /// Applier for `key`, or the default applier when unset.
    /// Unregistered positive numeric keys select that position.
    pub fn applier(&self, key: Option<&str>) -> DiscountResult<Arc<dyn ItemApplier>> {
        let key = key.unwrap_or(DEFAULT_APPLIER);
        lookup(&self.appliers, "applier", key).or_else(|err| {
            positive_number(key)
                .map(|n| Arc::new(PositionApplier::new(n)) as Arc<dyn ItemApplier>)
                .ok_or(err)
        })
    }

    /// Usage counter for `key`, or the default counter when unset.
    /// Unregistered positive numeric keys cap usage at that count.
    pub fn usage(&self, key: Option<&str>) -> DiscountResult<Arc<dyn UsageCounter>> {
        let key = key.unwrap_or(DEFAULT_USAGE);
        lookup(&self.usages, "usage", key).or_else(|err| {
            positive_number(key)
                .map(|n| Arc::new(MaxUsage::new(n)) as Arc<dyn UsageCounter>)
                .ok_or(err)
        })
    }

    /// Picker for `key`, or the default picker when unset
    pub fn picker(&self, key: Option<&str>) -> DiscountResult<Arc<dyn GroupPicker>> {
        lookup(&self.pickers, "picker", key.unwrap_or(DEFAULT_PICKER))
    }

    /// Resolve all four keys of a discount
    pub fn resolve(&self, keys: &StrategyKeys) -> DiscountResult<DiscountStrategies> {
        Ok(DiscountStrategies {
            sorter: self.sorter(keys.sorter.as_deref())?,
            applier: self.applier(keys.applier.as_deref())?,
            usage: self.usage(keys.usage.as_deref())?,
            picker: self.picker(keys.picker.as_deref())?,
        })
    }

    /// Registered keys as `kind:key`, sorted
    pub fn registered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sorters
            .keys()
            .map(|k| format!("sorter:{k}"))
            .chain(self.appliers.keys().map(|k| format!("applier:{k}")))
            .chain(self.usages.keys().map(|k| format!("usage:{k}")))
            .chain(self.pickers.keys().map(|k| format!("picker:{k}")))
            .collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("keys", &self.registered_keys())
            .finish()
    }
}

fn lookup<T: ?Sized>(
    map: &HashMap<String, Arc<T>>,
    kind: &'static str,
    key: &str,
) -> DiscountResult<Arc<T>> {
    map.get(key)
        .cloned()
        .ok_or_else(|| DiscountError::UnknownStrategy {
            kind,
            key: key.to_string(),
        })
}

fn positive_number(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new("B", 20.0, 1).with_id("b"),
            LineItem::new("A", 10.0, 1).with_id("a"),
            LineItem::new("C", 30.0, 1).with_id("c"),
            LineItem::new("D", 5.0, 1).with_id("d"),
        ]
    }

    fn ids(items: &[&LineItem]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_defaults_resolve_when_keys_unset() {
        let registry = StrategyRegistry::with_defaults();
        let strategies = registry.resolve(&StrategyKeys::default()).unwrap();

        assert_eq!(strategies.sorter.key(), "PRICE_ASC");
        assert_eq!(strategies.applier.key(), "ALL");
        assert_eq!(strategies.usage.key(), "ALL");
        assert_eq!(strategies.picker.key(), "VERTICAL");
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let registry = StrategyRegistry::with_defaults();

        let err = registry.sorter(Some("RANDOM")).err().unwrap();
        assert_eq!(
            err,
            DiscountError::UnknownStrategy {
                kind: "sorter",
                key: "RANDOM".into(),
            }
        );
        assert!(registry.applier(Some("0")).is_err());
        assert!(registry.usage(Some("")).is_err());
    }

    #[test]
    fn test_empty_registry_has_no_defaults() {
        let registry = StrategyRegistry::new();
        assert!(registry.resolve(&StrategyKeys::default()).is_err());
        assert!(registry.registered_keys().is_empty());
    }

    #[test]
    fn test_numeric_keys() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.applier(Some("2")).unwrap().key(), "2");
        assert_eq!(registry.usage(Some("3")).unwrap().key(), "3");
    }

    #[test]
    fn test_select_items_vertical_cheapest_first() {
        let items = items();
        let groups = vec![vec![&items[0], &items[1]], vec![&items[2], &items[3]]];

        let registry = StrategyRegistry::with_defaults();
        let strategies = registry
            .resolve(&StrategyKeys {
                usage: Some("2".into()),
                ..StrategyKeys::default()
            })
            .unwrap();

        assert_eq!(ids(&strategies.select_items(&groups)), vec!["d", "a"]);
    }

    #[test]
    fn test_select_items_horizontal_position_applier() {
        let items = items();
        let groups = vec![vec![&items[0], &items[1]], vec![&items[2]]];

        let picker = HorizontalPicker;
        assert_eq!(ids(&picker.pick(&groups)), vec!["b", "c", "a"]);

        let registry = StrategyRegistry::with_defaults();
        let strategies = registry
            .resolve(&StrategyKeys {
                sorter: Some("PRICE_DESC".into()),
                applier: Some("2".into()),
                usage: None,
                picker: Some("HORIZONTAL".into()),
            })
            .unwrap();

        assert_eq!(ids(&strategies.select_items(&groups)), vec!["b"]);
    }

    #[test]
    fn test_custom_strategy_registration() {
        struct NoneApplier;

        impl ItemApplier for NoneApplier {
            fn key(&self) -> &str {
                "NONE"
            }

            fn select<'a>(&self, _items: Vec<&'a LineItem>) -> Vec<&'a LineItem> {
                Vec::new()
            }
        }

        let registry = StrategyRegistry::with_defaults().with_applier(Arc::new(NoneApplier));
        let applier = registry.applier(Some("NONE")).unwrap();

        let items = items();
        assert!(applier.select(items.iter().collect()).is_empty());
        assert!(registry.registered_keys().contains(&"applier:NONE".to_string()));
    }

    #[test]
    fn test_debug_lists_keys() {
        let strategies = StrategyRegistry::with_defaults()
            .resolve(&StrategyKeys::default())
            .unwrap();
        let debug = format!("{strategies:?}");
        assert!(debug.contains("PRICE_ASC"));
        assert!(debug.contains("VERTICAL"));
    }
}
