//! The public order cache façade, tying together the primary slot store,
//! the user and security indices and the per-security aggregate books.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    book::SecurityBook,
    ref_index::RefIndex,
    slot_store::SlotStore,
    types::{
        Order,
        OrderId,
    },
};

/// An in-memory cache of live orders.
///
/// Every mutation keeps four views consistent: the primary slot store, the
/// per-user index, the per-security index and the per-security aggregate
/// book that answers [`Self::matching_size`] in O(1).
///
/// The cache is single-threaded; callers that share it across threads wrap
/// it in external mutual exclusion.
#[derive(Debug, Clone, Default)]
pub struct OrderCache {
    store: SlotStore,
    by_user: RefIndex<String>,
    by_security: RefIndex<String>,
    books: HashMap<String, SecurityBook>,
}

impl OrderCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live orders.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// `true` if no order is live.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether the order with `id` is currently live.
    #[inline(always)]
    pub fn contains(&self, id: OrderId) -> bool {
        self.store.contains(id.slot())
    }

    /// Add `order` to the cache.
    ///
    /// Inserting an id that is already live is a no-op: the existing order
    /// is kept untouched. Cancel first to replace an order.
    pub fn insert(&mut self, order: Order) {
        let slot = order.id().slot();
        if self.store.contains(slot) {
            debug!("insert: {} is already live, ignoring", order.id());
            return;
        }
        debug!("insert: {order}");

        self.by_user.add(order.user().clone(), slot);
        self.by_security.add(order.security_id().clone(), slot);
        self.books
            .entry(order.security_id().clone())
            .or_default()
            .apply(&order);
        self.store.insert(order);

        self.debug_assert_state();
    }

    /// Cancel the order with `id`. Cancelling an absent id is a no-op.
    pub fn cancel(&mut self, id: OrderId) {
        self.cancel_slot(id.slot());
        self.debug_assert_state();
    }

    /// Cancel every live order submitted by `user`.
    /// A user without live orders is a no-op.
    pub fn cancel_by_user(&mut self, user: &str) {
        debug!("cancel_by_user: {user}");
        for slot in self.by_user.snapshot(user) {
            self.cancel_slot(slot);
        }
        self.debug_assert_state();
    }

    /// Cancel every live order on `security_id` whose quantity is at least
    /// `min_qty`. A `min_qty` of zero cancels nothing.
    pub fn cancel_by_security_min_qty(&mut self, security_id: &str, min_qty: u32) {
        debug!("cancel_by_security_min_qty: {security_id}, min_qty {min_qty}");
        if min_qty == 0 {
            return;
        }
        for slot in self.by_security.snapshot(security_id) {
            if self
                .store
                .get(slot)
                .is_some_and(|order| order.quantity() >= min_qty)
            {
                self.cancel_slot(slot);
            }
        }
        self.debug_assert_state();
    }

    /// The largest total quantity that can cross between the buy and the
    /// sell side of `security_id`, given that orders of the same company
    /// never match each other. 0 for an unknown security.
    pub fn matching_size(&self, security_id: &str) -> u32 {
        self.books
            .get(security_id)
            .map_or(0, SecurityBook::matching_size)
    }

    /// Copies of all live orders, in no particular order.
    pub fn orders(&self) -> Vec<Order> {
        self.store.iter().cloned().collect()
    }

    /// Copies of the live orders submitted by `user`.
    pub fn orders_for_user(&self, user: &str) -> Vec<Order> {
        self.bucket_orders(self.by_user.get(user))
    }

    /// Copies of the live orders on `security_id`.
    pub fn orders_for_security(&self, security_id: &str) -> Vec<Order> {
        self.bucket_orders(self.by_security.get(security_id))
    }

    fn bucket_orders(&self, bucket: Option<&[usize]>) -> Vec<Order> {
        bucket
            .unwrap_or_default()
            .iter()
            .filter_map(|&slot| self.store.get(slot).cloned())
            .collect()
    }

    /// Remove the live order at `slot` from all four views.
    fn cancel_slot(&mut self, slot: usize) {
        let Some(order) = self.store.remove(slot) else {
            return;
        };
        debug!("cancel: {order}");

        self.by_user.remove(order.user(), slot);
        self.by_security.remove(order.security_id(), slot);

        let book = self.books.get_mut(order.security_id());
        assert2::debug_assert!(book.is_some());
        if let Some(book) = book {
            book.retract(&order);
            if book.is_empty() {
                self.books.remove(order.security_id());
            }
        }
    }

    /// Verify that the four views agree. Debug builds only.
    fn debug_assert_state(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        // Every live order is referenced exactly once per index, under its
        // own key.
        for order in self.store.iter() {
            let slot = order.id().slot();
            let user_refs = self
                .by_user
                .get(order.user())
                .map_or(0, |bucket| bucket.iter().filter(|&&s| s == slot).count());
            assert2::assert!(user_refs == 1);
            let security_refs = self
                .by_security
                .get(order.security_id())
                .map_or(0, |bucket| bucket.iter().filter(|&&s| s == slot).count());
            assert2::assert!(security_refs == 1);
        }
        // No index references a dead slot.
        for (_, bucket) in self.by_user.iter().chain(self.by_security.iter()) {
            for &slot in bucket {
                assert2::assert!(self.store.contains(slot));
            }
        }
        // The books match a fresh fold over the live orders.
        let mut rebuilt = HashMap::<String, SecurityBook>::new();
        for order in self.store.iter() {
            rebuilt
                .entry(order.security_id().clone())
                .or_default()
                .apply(order);
        }
        assert2::assert!(rebuilt == self.books);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;
    use crate::types::Side;

    fn order(slot: u64, security: &str, side: Side, qty: u32, user: &str, company: &str) -> Order {
        Order::builder()
            .id(OrderId::from(slot))
            .security_id(security)
            .side(side)
            .quantity(qty)
            .user(user)
            .company(company)
            .build()
    }

    #[test]
    #[tracing_test::traced_test]
    fn cache_insert_and_lookup() {
        let mut cache = OrderCache::new();
        assert!(cache.is_empty());

        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(OrderId::from(0)));
        assert!(!cache.contains(OrderId::from(1)));
        assert_eq!(cache.orders_for_user("u1").len(), 1);
        assert_eq!(cache.orders_for_security("ABC").len(), 1);
    }

    #[test]
    #[tracing_test::traced_test]
    fn cache_duplicate_insert_keeps_existing_order() {
        let mut cache = OrderCache::new();
        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        cache.insert(order(0, "ABC", Side::Buy, 999, "u9", "CompZ"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.orders()[0].quantity(), 100);
        assert_eq!(cache.orders_for_user("u9").len(), 0);
    }

    #[test]
    #[tracing_test::traced_test]
    fn cache_cancel_removes_from_all_views() {
        let mut cache = OrderCache::new();
        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        cache.insert(order(1, "ABC", Side::Sell, 50, "u2", "CompB"));

        cache.cancel(OrderId::from(0));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(OrderId::from(0)));
        assert_eq!(cache.orders_for_user("u1").len(), 0);
        assert_eq!(cache.orders_for_security("ABC").len(), 1);
    }

    #[test]
    fn cache_cancel_absent_is_noop() {
        let mut cache = OrderCache::new();
        cache.cancel(OrderId::from(5));
        assert!(cache.is_empty());

        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        cache.cancel(OrderId::from(0));
        cache.cancel(OrderId::from(0));
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_readd_after_cancel_starts_fresh() {
        let mut cache = OrderCache::new();
        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        cache.cancel(OrderId::from(0));

        cache.insert(order(0, "XYZ", Side::Sell, 25, "u3", "CompC"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.orders_for_security("XYZ").len(), 1);
        assert_eq!(cache.orders_for_security("ABC").len(), 0);
    }

    #[test]
    fn cache_matching_size_unknown_security_is_zero() {
        let cache = OrderCache::new();
        assert_eq!(cache.matching_size("ABC"), 0);
    }

    #[test]
    fn cache_matching_size_emptied_security_is_zero() {
        let mut cache = OrderCache::new();
        cache.insert(order(0, "ABC", Side::Buy, 100, "u1", "CompA"));
        cache.insert(order(1, "ABC", Side::Sell, 100, "u2", "CompB"));
        assert_eq!(cache.matching_size("ABC"), 100);

        cache.cancel(OrderId::from(0));
        cache.cancel(OrderId::from(1));
        assert_eq!(cache.matching_size("ABC"), 0);
    }

    /// Recompute the matching size of `security_id` from scratch over the
    /// given live orders.
    fn brute_force_matching_size(orders: &[Order], security_id: &str) -> u32 {
        let mut total_buy = 0u64;
        let mut total_sell = 0u64;
        let mut per_company = HashMap::<&str, u64>::new();
        for order in orders.iter().filter(|o| o.security_id() == security_id) {
            let qty = u64::from(order.quantity());
            match order.side() {
                Side::Buy => total_buy += qty,
                Side::Sell => total_sell += qty,
            }
            *per_company.entry(order.company()).or_default() += qty;
        }
        if total_buy == 0 || total_sell == 0 {
            return 0;
        }
        let leader = per_company.values().copied().max().unwrap_or(0);
        let match_buy = total_buy - leader.saturating_sub(total_sell);
        let match_sell = total_sell - leader.saturating_sub(total_buy);
        u32::try_from(match_buy.min(match_sell)).unwrap_or(u32::MAX)
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert {
            slot: u64,
            security: u8,
            is_buy: bool,
            qty: u32,
            user: u8,
            company: u8,
        },
        Cancel {
            slot: u64,
        },
        CancelByUser {
            user: u8,
        },
        CancelByMinQty {
            security: u8,
            min_qty: u32,
        },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..24u64, 0..3u8, prop::bool::ANY, 1..1000u32, 0..5u8, 0..4u8).prop_map(
                |(slot, security, is_buy, qty, user, company)| Op::Insert {
                    slot,
                    security,
                    is_buy,
                    qty,
                    user,
                    company,
                }
            ),
            2 => (0..24u64).prop_map(|slot| Op::Cancel { slot }),
            1 => (0..5u8).prop_map(|user| Op::CancelByUser { user }),
            1 => (0..3u8, 0..1000u32).prop_map(|(security, min_qty)| Op::CancelByMinQty {
                security,
                min_qty,
            }),
        ]
    }

    proptest! {
        /// After an arbitrary operation sequence the incrementally
        /// maintained matching size of every security equals a brute force
        /// recomputation over the surviving orders.
        #[test]
        fn proptest_cache_matches_brute_force(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut cache = OrderCache::new();
            for op in ops {
                match op {
                    Op::Insert { slot, security, is_buy, qty, user, company } => {
                        let side = if is_buy { Side::Buy } else { Side::Sell };
                        cache.insert(order(
                            slot,
                            &format!("SEC{security}"),
                            side,
                            qty,
                            &format!("u{user}"),
                            &format!("Comp{company}"),
                        ));
                    }
                    Op::Cancel { slot } => cache.cancel(OrderId::from(slot)),
                    Op::CancelByUser { user } => cache.cancel_by_user(&format!("u{user}")),
                    Op::CancelByMinQty { security, min_qty } => {
                        cache.cancel_by_security_min_qty(&format!("SEC{security}"), min_qty)
                    }
                }

                let live = cache.orders();
                for security in 0..3u8 {
                    let security = format!("SEC{security}");
                    prop_assert_eq!(
                        cache.matching_size(&security),
                        brute_force_matching_size(&live, &security)
                    );
                }
            }
        }
    }
}
