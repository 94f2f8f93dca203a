//! Node registry and network snapshot management.
//!
//! The set of known nodes lives in an immutable snapshot behind an atomic
//! handle: readers take one atomic load and never observe a partially
//! updated map, and a background refresh replaces the snapshot wholesale
//! with a read-copy-update loop. Only the per-node health fields inside a
//! published snapshot are ever mutated in place, and those are atomics.

mod address_book;
mod node;

pub use address_book::{
    parse_address_book_json, AddressBookSource, NodeAddressEntry, StaticAddressBook,
};
pub use node::Node;

pub(crate) use node::now_millis;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracing::debug;

use meridian_core::{AccountId, Error, Result};

/// One published generation of the node map.
#[derive(Debug)]
struct NetworkSnapshot {
    nodes: HashMap<AccountId, Arc<Node>>,
    /// Sorted ids, for deterministic iteration.
    node_ids: Vec<AccountId>,
    version: u64,
}

/// The client's view of the node network.
pub struct Network {
    snapshot: ArcSwap<NetworkSnapshot>,
    /// 0 means "derive from the node count".
    max_nodes_per_request: AtomicUsize,
}

impl Network {
    /// Builds a network from an address-book entry list.
    pub fn new(entries: Vec<NodeAddressEntry>) -> Result<Self> {
        let snapshot = build_snapshot(&entries, None, 0)?;
        Ok(Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            max_nodes_per_request: AtomicUsize::new(0),
        })
    }

    /// Atomically replaces the node map.
    ///
    /// Nodes present both before and after keep their health state; the
    /// rest are created fresh or dropped. In-flight attempts keep reading
    /// the snapshot they started with.
    pub fn set_nodes(&self, entries: Vec<NodeAddressEntry>) -> Result<()> {
        validate_entries(&entries)?;

        self.snapshot.rcu(|old| {
            // Validated above, so this cannot fail inside the swap loop.
            let snapshot = build_snapshot(&entries, Some(old.as_ref()), old.version + 1)
                .unwrap_or_else(|_| NetworkSnapshot {
                    nodes: old.nodes.clone(),
                    node_ids: old.node_ids.clone(),
                    version: old.version,
                });
            Arc::new(snapshot)
        });

        debug!(
            nodes = entries.len(),
            version = self.version(),
            "network snapshot replaced"
        );
        Ok(())
    }

    /// The generation counter of the current snapshot.
    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }

    pub fn node_count(&self) -> usize {
        self.snapshot.load().node_ids.len()
    }

    /// The node owned by `account_id`, if currently known.
    pub fn node(&self, account_id: &AccountId) -> Option<Arc<Node>> {
        self.snapshot.load().nodes.get(account_id).cloned()
    }

    /// Current `(account id, address)` pairs, sorted by account id.
    pub fn addresses(&self) -> Vec<(AccountId, String)> {
        let snapshot = self.snapshot.load();
        snapshot
            .node_ids
            .iter()
            .filter_map(|id| snapshot.nodes.get(id))
            .map(|node| (node.account_id(), node.address().to_string()))
            .collect()
    }

    /// Caps how many candidate nodes a single request is frozen for.
    pub fn set_max_nodes_per_request(&self, max: usize) {
        self.max_nodes_per_request.store(max, Ordering::Relaxed);
    }

    /// How many candidate nodes to pick for one request: the configured cap,
    /// or a third of the network rounded up.
    pub fn nodes_per_request(&self) -> usize {
        let count = self.node_count();
        match self.max_nodes_per_request.load(Ordering::Relaxed) {
            0 => (count + 2) / 3,
            max => max.min(count),
        }
        .max(1)
    }

    /// Picks up to `count` usable nodes, preferring the least loaded.
    ///
    /// Nodes inside a backoff window and nodes in `excluding` are skipped.
    /// If that leaves nothing, the single node whose backoff expires
    /// soonest is returned instead of failing, so a caller can wait it out
    /// and still make progress.
    pub fn select(&self, excluding: &HashSet<AccountId>, count: usize) -> Vec<AccountId> {
        let snapshot = self.snapshot.load();
        let now = now_millis();

        let mut healthy: Vec<&Arc<Node>> = snapshot
            .node_ids
            .iter()
            .filter_map(|id| snapshot.nodes.get(id))
            .filter(|node| node.is_healthy(now) && !excluding.contains(&node.account_id()))
            .collect();

        if healthy.is_empty() {
            // Everything is backed off (or excluded): soonest to recover
            // wins, ignoring the exclusion set rather than stalling forever.
            return snapshot
                .node_ids
                .iter()
                .filter_map(|id| snapshot.nodes.get(id))
                .min_by_key(|node| (node.backoff_until(), node.account_id()))
                .map(|node| vec![node.account_id()])
                .unwrap_or_default();
        }

        healthy.sort_by_key(|node| node.selection_key());
        healthy
            .iter()
            .take(count.max(1))
            .map(|node| node.account_id())
            .collect()
    }

    /// Records that `account_id` answered an attempt.
    pub(crate) fn record_success(&self, account_id: AccountId) {
        if let Some(node) = self.node(&account_id) {
            node.record_success();
        }
    }

    /// Records that an attempt against `account_id` failed in transit.
    pub(crate) fn record_failure(
        &self,
        account_id: AccountId,
        min_backoff: Duration,
        max_backoff: Duration,
    ) {
        if let Some(node) = self.node(&account_id) {
            node.record_failure(min_backoff, max_backoff);
        }
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("nodes", &self.node_count())
            .field("version", &self.version())
            .finish()
    }
}

fn validate_entries(entries: &[NodeAddressEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::Validation(
            "network must contain at least one node".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.account_id) {
            return Err(Error::Validation(format!(
                "duplicate node account id {}",
                entry.account_id
            )));
        }
        if entry.address.is_empty() {
            return Err(Error::Validation(format!(
                "node {} has an empty address",
                entry.account_id
            )));
        }
    }

    Ok(())
}

fn build_snapshot(
    entries: &[NodeAddressEntry],
    previous: Option<&NetworkSnapshot>,
    version: u64,
) -> Result<NetworkSnapshot> {
    validate_entries(entries)?;

    let mut nodes = HashMap::with_capacity(entries.len());
    for entry in entries {
        // Keep the existing node (and its health) when id and address both
        // survive the refresh.
        let node = match previous.and_then(|snapshot| snapshot.nodes.get(&entry.account_id)) {
            Some(existing) if existing.address() == entry.address => existing.clone(),
            _ => Arc::new(Node::new(entry.account_id, entry.address.clone())),
        };
        nodes.insert(entry.account_id, node);
    }

    let mut node_ids: Vec<AccountId> = nodes.keys().copied().collect();
    node_ids.sort();

    Ok(NetworkSnapshot {
        nodes,
        node_ids,
        version,
    })
}
