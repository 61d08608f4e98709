//! Ordered stub collection and the matching algorithm.

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{IncomingRequest, Stub, StubResponse};

/// How a request is resolved when several stubs match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Registration order; the first matching stub wins.
    #[default]
    FirstRegistered,
    /// The matching stub with the most required parameters wins; ties go to
    /// the earlier registration.
    MostSpecific,
}

/// Stubs registered for one server.
///
/// Reads take a shared lock, so concurrent request handling never blocks on
/// itself. Registration takes the write lock briefly.
#[derive(Debug, Default)]
pub struct StubRegistry {
    stubs: RwLock<Vec<Stub>>,
    policy: MatchPolicy,
}

impl StubRegistry {
    #[must_use]
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            stubs: RwLock::new(Vec::new()),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Append a stub. Never replaces or deduplicates.
    pub fn register(&self, stub: Stub) {
        debug!(
            method = %stub.method,
            path = %stub.path,
            params = stub.params.len(),
            "Registering stub"
        );
        self.stubs.write().push(stub);
    }

    /// Response of the winning stub for `request`, if any.
    #[must_use]
    pub fn find(&self, request: &IncomingRequest) -> Option<StubResponse> {
        let stubs = self.stubs.read();
        let mut candidates = stubs.iter().enumerate().filter(|(_, s)| s.matches(request));

        let winner = match self.policy {
            MatchPolicy::FirstRegistered => candidates.next(),
            MatchPolicy::MostSpecific => candidates.max_by(|(ia, a), (ib, b)| {
                a.specificity()
                    .cmp(&b.specificity())
                    .then_with(|| ib.cmp(ia))
            }),
        };

        winner.map(|(index, stub)| {
            debug!(index, path = %stub.path, "Stub matched");
            stub.response.clone()
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stubs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stubs.read().is_empty()
    }

    /// Copy of the current stubs in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stub> {
        self.stubs.read().clone()
    }

    pub fn clear(&self) {
        self.stubs.write().clear();
    }
}
