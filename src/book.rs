//! Per-security aggregate bookkeeping powering the constant-time matching
//! size query.

use std::collections::{
    BTreeMap,
    HashMap,
};

use getset::CopyGetters;
use tracing::trace;

use crate::types::{
    Order,
    Side,
};

/// An ordered multiset of combined per-company volumes.
///
/// The matching size query only ever reads the maximum, but cancellation
/// removes arbitrary interior values, which rules out a plain heap.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct VolumeMultiset {
    /// volume value → multiplicity; entries at multiplicity zero are removed.
    counts: BTreeMap<u64, u32>,
}

impl VolumeMultiset {
    /// Add one occurrence of `volume`.
    pub(crate) fn insert(&mut self, volume: u64) {
        *self.counts.entry(volume).or_insert(0) += 1;
    }

    /// Remove one occurrence of `volume`. The occurrence must exist.
    pub(crate) fn remove(&mut self, volume: u64) {
        let Some(count) = self.counts.get_mut(&volume) else {
            assert2::debug_assert!(false, "the removed volume is present");
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&volume);
        }
    }

    /// The largest volume in the set, 0 when empty.
    #[inline(always)]
    pub(crate) fn max(&self) -> u64 {
        self.counts.last_key_value().map_or(0, |(&volume, _)| volume)
    }

    /// The number of occurrences across all values.
    pub(crate) fn len(&self) -> usize {
        self.counts.values().map(|&count| count as usize).sum()
    }
}

/// Running (buy, sell) quantity sums of a single company on one security.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
struct CompanyVolume {
    buy: u64,
    sell: u64,
}

impl CompanyVolume {
    #[inline(always)]
    fn combined(&self) -> u64 {
        self.buy + self.sell
    }
}

/// Aggregate totals of one security, updated incrementally on every order
/// add and remove so that the matching size query never scans orders.
#[derive(Debug, Clone, Default, Eq, PartialEq, CopyGetters)]
pub(crate) struct SecurityBook {
    /// Sum of quantities over the live buy orders of the security.
    #[getset(get_copy = "pub(crate)")]
    total_buy: u64,

    /// Sum of quantities over the live sell orders of the security.
    #[getset(get_copy = "pub(crate)")]
    total_sell: u64,

    /// Per-company (buy, sell) sums, one entry per company with live volume.
    company_volumes: HashMap<String, CompanyVolume>,

    /// The combined (buy + sell) volume of every company with live volume.
    max_volumes: VolumeMultiset,
}

impl SecurityBook {
    /// Fold `order` into the aggregates.
    pub(crate) fn apply(&mut self, order: &Order) {
        trace!("apply: {order}");
        let quantity = u64::from(order.quantity());
        let volume = self
            .company_volumes
            .entry(order.company().clone())
            .or_default();

        let old_combined = volume.combined();
        if old_combined > 0 {
            self.max_volumes.remove(old_combined);
        }
        match order.side() {
            Side::Buy => {
                self.total_buy += quantity;
                volume.buy += quantity;
            }
            Side::Sell => {
                self.total_sell += quantity;
                volume.sell += quantity;
            }
        }
        self.max_volumes.insert(volume.combined());

        self.debug_assert_state();
    }

    /// Undo a previous [`Self::apply`] of `order`.
    pub(crate) fn retract(&mut self, order: &Order) {
        trace!("retract: {order}");
        let quantity = u64::from(order.quantity());
        let Some(volume) = self.company_volumes.get_mut(order.company()) else {
            assert2::debug_assert!(false, "a retracted order was applied before");
            return;
        };

        self.max_volumes.remove(volume.combined());
        match order.side() {
            Side::Buy => {
                self.total_buy -= quantity;
                volume.buy -= quantity;
            }
            Side::Sell => {
                self.total_sell -= quantity;
                volume.sell -= quantity;
            }
        }
        let combined = volume.combined();
        if combined > 0 {
            self.max_volumes.insert(combined);
        } else {
            self.company_volumes.remove(order.company());
        }

        self.debug_assert_state();
    }

    /// `true` once no live order contributes to this book anymore.
    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.total_buy == 0 && self.total_sell == 0
    }

    /// The largest total quantity that can cross between the buy and the
    /// sell side of this security, given that orders of the same company
    /// never match each other.
    ///
    /// Only the leading company's combined volume can limit the cross: the
    /// quantity of a side that cannot find an outside counterparty is the
    /// overshoot of that volume over the opposing side's total.
    pub(crate) fn matching_size(&self) -> u32 {
        if self.total_buy == 0 || self.total_sell == 0 {
            return 0;
        }
        let leader = self.max_volumes.max();
        let excess_buy = leader.saturating_sub(self.total_sell);
        let excess_sell = leader.saturating_sub(self.total_buy);
        let match_buy = self.total_buy.saturating_sub(excess_buy);
        let match_sell = self.total_sell.saturating_sub(excess_sell);
        // The aggregated side totals can exceed the u32 range.
        u32::try_from(match_buy.min(match_sell)).unwrap_or(u32::MAX)
    }

    fn debug_assert_state(&self) {
        assert2::debug_assert!(self.max_volumes.len() == self.company_volumes.len());
        assert2::debug_assert!(
            self.company_volumes.values().map(|v| v.buy).sum::<u64>() == self.total_buy
        );
        assert2::debug_assert!(
            self.company_volumes.values().map(|v| v.sell).sum::<u64>() == self.total_sell
        );
        assert2::debug_assert!(self.max_volumes.max() <= self.total_buy + self.total_sell);
    }
}
