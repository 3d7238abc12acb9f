//! Candidate pair enumeration.
//!
//! Produces the unordered token pairs worth probing for pools for one
//! input/output request.

use alloy::primitives::Address;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::assets::{Asset, AssetClassifier};

/// Unordered pair of distinct assets
#[derive(Debug, Clone)]
pub struct AssetPair {
    pub a: Asset,
    pub b: Asset,
}

impl AssetPair {
    /// `None` when both sides are the same asset
    pub fn new(a: Asset, b: Asset) -> Option<Self> {
        if a == b {
            return None;
        }
        Some(Self { a, b })
    }

    /// Sorted address pair
    pub fn key(&self) -> (Address, Address) {
        if self.a.address < self.b.address {
            (self.a.address, self.b.address)
        } else {
            (self.b.address, self.a.address)
        }
    }

    /// Assets in canonical pool order
    pub fn sorted(&self) -> (&Asset, &Asset) {
        if self.a.sorts_before(&self.b) {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }
}

impl PartialEq for AssetPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AssetPair {}

impl Hash for AssetPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

pub struct AssetGraphBuilder {
    bases: Vec<Asset>,
    classifier: Arc<dyn AssetClassifier>,
}

impl AssetGraphBuilder {
    pub fn new(bases: Vec<Asset>, classifier: Arc<dyn AssetClassifier>) -> Self {
        Self { bases, classifier }
    }

    /// Deduplicated candidate pairs, in a deterministic order
    pub fn candidate_pairs(
        &self,
        asset_in: Option<&Asset>,
        asset_out: Option<&Asset>,
    ) -> Vec<AssetPair> {
        let (Some(asset_in), Some(asset_out)) = (asset_in, asset_out) else {
            return Vec::new();
        };

        let mut pairs = PairSet::default();

        pairs.push(asset_in.clone(), asset_out.clone());

        // Counterparts let single-pool bridges reach through a wrap/unwrap
        let in_counterpart = self.classifier.counterpart(asset_in);
        let out_counterpart = self.classifier.counterpart(asset_out);
        if let (Some(ci), Some(co)) = (&in_counterpart, &out_counterpart) {
            pairs.push(ci.clone(), co.clone());
        }
        if let Some(ci) = &in_counterpart {
            pairs.push(ci.clone(), asset_out.clone());
        }
        if let Some(co) = &out_counterpart {
            pairs.push(asset_in.clone(), co.clone());
        }

        let mut bases_with_variants = Vec::with_capacity(self.bases.len() * 2);
        for base in &self.bases {
            bases_with_variants.push(base.clone());
            if let Some(boosted) = self.classifier.boosted_variant(base) {
                bases_with_variants.push(boosted);
            }
        }

        // Endpoints and their counterparts against every base, plain or boosted,
        // so a bridge can cross a vault on either side of the first pool
        let endpoints = [
            Some(asset_in),
            Some(asset_out),
            in_counterpart.as_ref(),
            out_counterpart.as_ref(),
        ];
        for endpoint in endpoints.into_iter().flatten() {
            for base in &bases_with_variants {
                pairs.push(endpoint.clone(), base.clone());
            }
        }

        for (i, a) in bases_with_variants.iter().enumerate() {
            for b in &bases_with_variants[i + 1..] {
                pairs.push(a.clone(), b.clone());
            }
        }

        pairs.into_vec()
    }
}

/// Insertion-ordered set of pairs
#[derive(Default)]
struct PairSet {
    seen: HashSet<(Address, Address)>,
    pairs: Vec<AssetPair>,
}

impl PairSet {
    fn push(&mut self, a: Asset, b: Asset) {
        let Some(pair) = AssetPair::new(a, b) else {
            return;
        };
        if self.seen.insert(pair.key()) {
            self.pairs.push(pair);
        }
    }

    fn into_vec(self) -> Vec<AssetPair> {
        self.pairs
    }
}
