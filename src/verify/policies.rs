//! The `valid_policy_tree` of RFC 5280 section 6.1.2, kept as a
//! directed acyclic graph.
//!
//! This representation differs from the RFC's description in a few
//! ways. A policy matching several parents becomes one node with
//! several parents rather than duplicated nodes. The
//! `expected_policy_set` is kept inverted, and only for the newest
//! level: for each expected policy, the nodes expecting it. The
//! pruning of childless interior nodes is deferred to a reachability
//! pass when the user-constrained policy set is finally computed.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};

use crate::types::oid;

/// A policy OID's contents, borrowed from a certificate.
pub(crate) type Policy<'a> = &'a [u8];

/// One node of the policy graph. The policy OID itself is the key in
/// the level map.
#[derive(Clone, Debug, Default)]
pub(crate) struct Node<'a> {
    /// The valid_policy of every parent node other than anyPolicy. An
    /// empty list means the single parent is anyPolicy, which makes
    /// this a root policy of the anchor's policy domain. A node never
    /// has both anyPolicy and a concrete policy as parents: section
    /// 6.1.3 step d.1.ii runs only when step d.1.i found no match.
    pub parent_policies: Vec<Policy<'a>>,
    /// Whether a policy mapping rewrote this node's expected-policy
    /// set. Unmapped nodes expect themselves, filled in at
    /// `start_level`.
    pub mapped: bool,
    /// Whether the node reaches a valid policy in the target
    /// certificate. Computed during `user_constrained_policy_set`.
    pub reachable: bool,
}

type Level<'a> = BTreeMap<Policy<'a>, Node<'a>>;

/// Bookkeeping that only matters for the most recent level.
#[derive(Clone, Debug, Default)]
pub(crate) struct LevelDetails<'a> {
    /// For each policy P other than anyPolicy, the nodes of the level
    /// whose expected-policy set contains P.
    pub expected_policy_map: BTreeMap<Policy<'a>, Vec<Policy<'a>>>,
    /// Whether the level has an anyPolicy node. anyPolicy's expected
    /// set is always {anyPolicy} and never appears in another node's
    /// expected set, so this one flag covers both roles.
    pub has_any_policy: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ValidPolicyGraph<'a> {
    /// The levels, root first.
    levels: Vec<Level<'a>>,
    current_level: LevelDetails<'a>,
}

impl<'a> ValidPolicyGraph<'a> {
    /// Resets to the initial state: a single level holding anyPolicy.
    pub fn init(&mut self) {
        self.set_null();
        self.start_level();
        self.add_any_policy_node();
    }

    /// The RFC's null valid_policy_tree is represented by emptiness.
    pub fn is_null(&self) -> bool {
        !self.current_level.has_any_policy
            && self.levels.last().is_none_or(|level| level.is_empty())
    }

    pub fn set_null(&mut self) {
        self.levels.clear();
        self.current_level = LevelDetails::default();
    }

    /// Completes the previous level, returning its details, and starts
    /// an empty new one.
    pub fn start_level(&mut self) -> LevelDetails<'a> {
        // Unmapped nodes expect their own policy; fill that in now.
        if let Some(level) = self.levels.last() {
            for (&policy, node) in level {
                if !node.mapped {
                    self.current_level
                        .expected_policy_map
                        .entry(policy)
                        .or_default()
                        .push(policy);
                }
            }
        }

        let previous_level = core::mem::take(&mut self.current_level);
        self.levels.push(Level::new());
        previous_level
    }

    /// Marks the current level as containing an anyPolicy node.
    pub fn add_any_policy_node(&mut self) {
        debug_assert!(!self.levels.is_empty());
        self.current_level.has_any_policy = true;
    }

    /// Adds a node with the given concrete parents to the current
    /// level. Duplicate insertion is an internal invariant violation.
    pub fn add_node(&mut self, policy: Policy<'a>, parent_policies: Vec<Policy<'a>>) {
        debug_assert_ne!(policy, oid::ANY_POLICY);
        let previous = self.levels.last_mut().and_then(|level| {
            level.insert(
                policy,
                Node {
                    parent_policies,
                    ..Node::default()
                },
            )
        });
        debug_assert!(previous.is_none());
    }

    /// Adds a node whose only parent is anyPolicy.
    pub fn add_node_with_parent_any_policy(&mut self, policy: Policy<'a>) {
        // An empty parent list encodes the anyPolicy parent.
        self.add_node(policy, Vec::new());
    }

    /// Applies one policy mapping, RFC 5280 section 6.1.4 step b.1.
    pub fn add_policy_mapping(&mut self, issuer_policy: Policy<'a>, subject_policy: Policy<'a>) {
        debug_assert_ne!(issuer_policy, oid::ANY_POLICY);
        debug_assert_ne!(subject_policy, oid::ANY_POLICY);
        let Some(level) = self.levels.last_mut() else {
            return;
        };

        // The mapping only applies when the issuer policy exists in the
        // current level. It can instead match an anyPolicy node, in
        // which case the issuer policy is synthesized as anyPolicy's
        // child (anyPolicy's parent is always anyPolicy, which the
        // default node's empty parent list encodes).
        if !level.contains_key(issuer_policy) && !self.current_level.has_any_policy {
            return;
        }
        level.entry(issuer_policy).or_default().mapped = true;

        self.current_level
            .expected_policy_map
            .entry(subject_policy)
            .or_default()
            .push(issuer_policy);
    }

    /// Removes the node with the given policy from the current level.
    pub fn delete_node(&mut self, policy: Policy<'a>) {
        if let Some(level) = self.levels.last_mut() {
            level.remove(policy);
        }
    }

    /// Computes the user-constrained policy set: the root-domain
    /// policies valid at the deepest level, intersected with the user's
    /// initial policy set. Applies the deferred pruning via a
    /// reachability pass, so call it once, after construction.
    pub fn user_constrained_policy_set(
        &mut self,
        user_initial_policy_set: &BTreeSet<Policy<'a>>,
    ) -> BTreeSet<Policy<'a>> {
        if self.levels.is_empty() {
            return BTreeSet::new();
        }

        let user_has_any_policy = user_initial_policy_set.contains(oid::ANY_POLICY);
        if self.current_level.has_any_policy {
            if user_has_any_policy {
                return BTreeSet::from([oid::ANY_POLICY as Policy<'a>]);
            }
            return user_initial_policy_set.clone();
        }

        if let Some(deepest) = self.levels.last_mut() {
            for node in deepest.values_mut() {
                node.reachable = true;
            }
        }

        let mut policy_set = BTreeSet::new();
        for i in (0..self.levels.len()).rev() {
            let (shallower, deeper) = self.levels.split_at_mut(i);
            let level = &mut deeper[0];
            for (&policy, node) in level.iter_mut() {
                if !node.reachable {
                    continue;
                }
                if node.parent_policies.is_empty() {
                    // Parented by anyPolicy: a root-domain policy.
                    if user_has_any_policy || user_initial_policy_set.contains(policy) {
                        policy_set.insert(policy);
                    }
                } else if let Some(parent_level) = shallower.last_mut() {
                    for parent in &node.parent_policies {
                        if let Some(parent_node) = parent_level.get_mut(parent) {
                            parent_node.reachable = true;
                        }
                    }
                }
            }
        }
        policy_set
    }
}
