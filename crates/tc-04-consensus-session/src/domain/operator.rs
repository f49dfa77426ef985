//! # Operator Set
//!
//! Peers come from the operator directory with every set they belong to.
//! A session resolves them once, at construction, into the weighted set for
//! its task.

use crate::domain::errors::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use shared_types::{format_address, Address, CurveType};
use std::collections::BTreeMap;
use tc_03_signature_schemes::{PublicKeyBytes, SignatureScheme};
use tracing::warn;

/// A peer's registration in one operator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSetMembership {
    pub operator_set_id: u32,
    pub weight: u128,
    pub public_key: PublicKeyBytes,
    pub curve_type: CurveType,
}

/// An operator as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorPeer {
    pub operator_address: Address,
    /// Transport endpoint.
    pub socket: String,
    pub memberships: Vec<OperatorSetMembership>,
}

impl OperatorPeer {
    pub fn membership(&self, operator_set_id: u32) -> Option<&OperatorSetMembership> {
        self.memberships
            .iter()
            .find(|m| m.operator_set_id == operator_set_id)
    }
}

/// A member of a resolved operator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub address: Address,
    pub socket: String,
    pub weight: u128,
    pub public_key: PublicKeyBytes,
}

/// The weighted operator set a session broadcasts to.
#[derive(Debug, Clone)]
pub struct OperatorSet {
    id: u32,
    members: BTreeMap<Address, Operator>,
    total_weight: u128,
}

impl OperatorSet {
    /// Resolve set `operator_set_id` from `peers` for `scheme`.
    pub fn resolve(
        peers: &[OperatorPeer],
        operator_set_id: u32,
        scheme: &dyn SignatureScheme,
    ) -> ConsensusResult<Self> {
        if peers.is_empty() {
            return Err(ConsensusError::EmptyOperatorSet { operator_set_id });
        }

        let mut members = BTreeMap::new();
        let mut total_weight: u128 = 0;
        for peer in peers {
            let Some(membership) = peer.membership(operator_set_id) else {
                continue;
            };
            if membership.curve_type != scheme.curve() {
                return Err(ConsensusError::CurveMismatch {
                    operator: peer.operator_address,
                    expected: scheme.curve(),
                    actual: membership.curve_type,
                });
            }
            scheme
                .validate_public_key(&membership.public_key)
                .map_err(|e| ConsensusError::InvalidOperatorKey {
                    operator: peer.operator_address,
                    reason: e.to_string(),
                })?;
            if members.contains_key(&peer.operator_address) {
                warn!(
                    "[tc-04] Operator {} listed twice in set {}, keeping first entry",
                    format_address(&peer.operator_address),
                    operator_set_id
                );
                continue;
            }

            total_weight = total_weight.saturating_add(membership.weight);
            members.insert(
                peer.operator_address,
                Operator {
                    address: peer.operator_address,
                    socket: peer.socket.clone(),
                    weight: membership.weight,
                    public_key: membership.public_key.clone(),
                },
            );
        }

        if members.is_empty() {
            return Err(ConsensusError::UnknownOperatorSet { operator_set_id });
        }
        if total_weight == 0 {
            return Err(ConsensusError::EmptyOperatorSet { operator_set_id });
        }

        Ok(Self {
            id: operator_set_id,
            members,
            total_weight,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn get(&self, address: &Address) -> Option<&Operator> {
        self.members.get(address)
    }

    /// Members ordered by address.
    pub fn members(&self) -> impl Iterator<Item = &Operator> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn total_weight(&self) -> u128 {
        self.total_weight
    }
}
