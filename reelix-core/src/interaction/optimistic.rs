/// Snapshot-apply-settle transaction over a piece of state.
///
/// `begin` records the prior value and produces the optimistic one; `settle`
/// either merges the authoritative server value into the optimistic state or
/// restores the snapshot exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction<S> {
    snapshot: S,
    optimistic: S,
}

/// Final state of a settled transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<S, E> {
    Committed(S),
    RolledBack { state: S, error: E },
}

impl<S, E> Settlement<S, E> {
    pub fn state(&self) -> &S {
        match self {
            Settlement::Committed(state) => state,
            Settlement::RolledBack { state, .. } => state,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            Settlement::Committed(state) => state,
            Settlement::RolledBack { state, .. } => state,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Settlement::Committed(_))
    }
}

impl<S: Clone> Transaction<S> {
    pub fn begin(prior: &S, apply: impl FnOnce(&mut S)) -> Self {
        let mut optimistic = prior.clone();
        apply(&mut optimistic);
        Self {
            snapshot: prior.clone(),
            optimistic,
        }
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    pub fn optimistic(&self) -> &S {
        &self.optimistic
    }

    pub fn settle<T, E>(
        self,
        result: Result<T, E>,
        merge: impl FnOnce(&mut S, T),
    ) -> Settlement<S, E> {
        match result {
            Ok(value) => {
                let mut state = self.optimistic;
                merge(&mut state, value);
                Settlement::Committed(state)
            }
            Err(error) => Settlement::RolledBack {
                state: self.snapshot,
                error,
            },
        }
    }
}
