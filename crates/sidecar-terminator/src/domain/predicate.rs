use std::collections::BTreeSet;

use crate::domain::classifier::ContainerSets;

/// Outcome of evaluating one Pod snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Decision {
    /// Some container is neither running nor completed; wait for a later event
    #[display("indeterminate")]
    Indeterminate,
    /// Every primary container finished and exactly the sidecars are running
    #[display("all-sidecars-only")]
    AllSidecarsOnly,
    /// Everything is accounted for but the running set differs from the sidecars
    #[display("mixed")]
    Mixed,
}

impl Decision {
    pub const fn should_shutdown(self) -> bool {
        matches!(self, Self::AllSidecarsOnly)
    }
}

/// Decide whether the declared sidecars should be told to stop.
///
/// Fires only when every container is accounted for and the running set is
/// exactly the sidecar set.
pub fn evaluate(sets: &ContainerSets, sidecars: &BTreeSet<String>) -> Decision {
    if !sets.is_fully_accounted() {
        return Decision::Indeterminate;
    }

    if &sets.running == sidecars {
        Decision::AllSidecarsOnly
    } else {
        Decision::Mixed
    }
}
