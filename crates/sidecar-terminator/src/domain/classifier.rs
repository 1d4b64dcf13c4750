//! Sorts a Pod's containers into running and completed sets.

use std::collections::BTreeSet;

use crate::domain::snapshot::ContainerStatus;

/// Termination reasons that count as "finished" for a primary container.
pub const FINISHED_REASONS: [&str; 2] = ["Completed", "Error"];

/// Container names derived from one Pod snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSets {
    pub all: BTreeSet<String>,
    pub running: BTreeSet<String>,
    pub completed: BTreeSet<String>,
}

impl ContainerSets {
    /// Containers whose state is known: running or completed.
    pub fn accounted_for(&self) -> BTreeSet<String> {
        self.running.union(&self.completed).cloned().collect()
    }

    /// Containers that are neither running nor completed.
    pub fn indeterminate(&self) -> BTreeSet<String> {
        self.all.difference(&self.accounted_for()).cloned().collect()
    }

    pub fn is_fully_accounted(&self) -> bool {
        self.accounted_for() == self.all
    }
}

/// Classify container statuses.
///
/// A ready container is running. A container that is not ready and terminated
/// with one of [`FINISHED_REASONS`] is completed. Anything else (waiting,
/// crash looping, killed for another reason) lands in neither set.
pub fn classify<'a, I>(statuses: I) -> ContainerSets
where
    I: IntoIterator<Item = &'a ContainerStatus>,
{
    let mut sets = ContainerSets::default();

    for status in statuses {
        sets.all.insert(status.name.clone());

        if status.ready {
            sets.running.insert(status.name.clone());
        } else if status
            .termination_reason()
            .is_some_and(|reason| FINISHED_REASONS.contains(&reason))
        {
            sets.completed.insert(status.name.clone());
        }
    }

    sets
}
