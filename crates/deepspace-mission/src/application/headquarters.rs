//! Headquarters side of a mission: the plan, the producer, and the collector.
//!
//! The channel only defines how pairs travel.  This module supplies a
//! reference orchestration layer on top of it:
//!
//! - [`MissionPlan`] decides which systems to decode and how they relate.
//! - [`Headquarters`] turns each [`Assignment`] into the context/work pair the
//!   channel expects, using its own producer handle.
//! - [`ResultCollector`] polls explorer results and records every system
//!   discovered so far.
//!
//! # Plan shape
//!
//! Systems are numbered from 1 and arranged as a binary tree: system `i` is
//! reached from parent `i / 2`, so system 1 hangs off the virtual root `0`.
//! Each assignment uses the system id as its pairing id, which keeps every
//! origin unique for the channel's one-publication-per-origin rule.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use deepspace_core::{
    CancellationToken, Cancelled, Channel, Message, NodeId, PostOutcome, ProducerHandle,
};
use tracing::{debug, info, trace, warn};

/// How long the collector sleeps after an empty poll.
const COLLECT_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// One unit of work: decode `frequency` to reach `system` from `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Shared origin of the pair; unique per assignment.
    pub pairing: NodeId,
    pub parent: NodeId,
    pub system: NodeId,
    pub frequency: String,
}

impl Assignment {
    /// First half of the pair: identifies the parent, carries no data.
    pub fn context_message(&self) -> Message {
        Message::new(self.pairing, self.parent, "")
    }

    /// Second half of the pair: the payload explorers decode.
    pub fn work_message(&self) -> Message {
        Message::new(self.pairing, self.system, self.frequency.clone())
    }
}

/// Deterministic list of assignments for one mission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionPlan {
    assignments: Vec<Assignment>,
}

impl MissionPlan {
    /// Builds a plan for systems `1..=systems`.
    pub fn generate(systems: u32, seed_prefix: &str) -> Self {
        let assignments = (1..=systems)
            .map(|i| {
                let system = i as NodeId;
                Assignment {
                    pairing: system,
                    parent: system / 2,
                    system,
                    frequency: format!("{seed_prefix}-{i}"),
                }
            })
            .collect();
        Self { assignments }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Splits the plan round-robin into `parts` batches (at least one).
    pub fn partition(self, parts: usize) -> Vec<Vec<Assignment>> {
        let parts = parts.max(1);
        let mut batches: Vec<Vec<Assignment>> = (0..parts).map(|_| Vec::new()).collect();
        for (i, assignment) in self.assignments.into_iter().enumerate() {
            batches[i % parts].push(assignment);
        }
        batches
    }
}

/// A single headquarters producer bound to one channel.
pub struct Headquarters {
    name: String,
    channel: Arc<Channel>,
    producer: ProducerHandle,
    published: usize,
}

impl Headquarters {
    /// Registers a new producer on `channel`.
    pub fn new(name: impl Into<String>, channel: Arc<Channel>) -> Self {
        let producer = channel.register_producer();
        let name = name.into();
        debug!("headquarters {name} registered as {}", producer.id());
        Self {
            name,
            channel,
            producer,
            published: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pairs published so far by this headquarters.
    pub fn published(&self) -> usize {
        self.published
    }

    /// Posts the assignment's context and work messages, in that order.
    ///
    /// Returns the outcome of the second post, which says whether the pair
    /// became visible to explorers.
    pub fn dispatch(&mut self, assignment: &Assignment) -> PostOutcome {
        let first = self
            .channel
            .post_from_headquarters(&self.producer, assignment.context_message());
        if first != PostOutcome::Staged {
            warn!(
                "headquarters {}: context for system {} was not staged ({first:?})",
                self.name, assignment.system
            );
        }

        let outcome = self
            .channel
            .post_from_headquarters(&self.producer, assignment.work_message());
        match outcome {
            PostOutcome::Paired => {
                self.published += 1;
                trace!("headquarters {} dispatched system {}", self.name, assignment.system);
            }
            other => warn!(
                "headquarters {}: system {} not published ({other:?})",
                self.name, assignment.system
            ),
        }
        outcome
    }

    /// Posts a skip sentinel for an assignment this headquarters will not send.
    pub fn skip(&self, assignment: &Assignment) -> PostOutcome {
        self.channel.post_from_headquarters(
            &self.producer,
            Message::skip(assignment.pairing, assignment.system),
        )
    }

    /// Posts the terminate sentinel and retires the producer.
    ///
    /// Returns a half-pair stranded in the staging slot, if any.
    pub fn sign_off(self) -> Option<Message> {
        self.channel
            .post_from_headquarters(&self.producer, Message::terminate(-1, -1));
        info!(
            "headquarters {} signing off after {} pairs",
            self.name, self.published
        );
        self.channel.retire_producer(self.producer)
    }
}

/// A decoded system reported back by an explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub parent: NodeId,
    pub system: NodeId,
    pub frequency: String,
}

impl From<Message> for Discovery {
    fn from(msg: Message) -> Self {
        let (parent, system, frequency) = msg.into_parts();
        Self {
            parent,
            system,
            frequency,
        }
    }
}

/// Polls explorer results and records which systems have been discovered.
pub struct ResultCollector {
    channel: Arc<Channel>,
    discovered: HashSet<NodeId>,
    discoveries: Vec<Discovery>,
    duplicates: usize,
}

impl ResultCollector {
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            channel,
            discovered: HashSet::new(),
            discoveries: Vec::new(),
            duplicates: 0,
        }
    }

    /// Drains whatever results are ready without blocking.
    ///
    /// Returns how many new systems were recorded.  A result for a system
    /// that is already discovered is counted as a duplicate and dropped.
    pub fn poll(&mut self) -> usize {
        let mut recorded = 0;
        while let Some(msg) = self.channel.take_for_headquarters() {
            let discovery = Discovery::from(msg);
            if self.discovered.insert(discovery.system) {
                trace!("discovered system {}", discovery.system);
                self.discoveries.push(discovery);
                recorded += 1;
            } else {
                warn!("system {} reported more than once", discovery.system);
                self.duplicates += 1;
            }
        }
        recorded
    }

    /// Polls until `expected` systems are discovered in total.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` is set first.  Everything collected
    /// up to that point stays available through
    /// [`discoveries`](Self::discoveries).
    pub fn collect(&mut self, expected: usize, cancel: &CancellationToken) -> Result<(), Cancelled> {
        while self.discoveries.len() < expected {
            cancel.check()?;
            if self.poll() == 0 {
                thread::sleep(COLLECT_POLL_INTERVAL);
            }
        }
        debug!("collected {} discoveries", self.discoveries.len());
        Ok(())
    }

    pub fn discoveries(&self) -> &[Discovery] {
        &self.discoveries
    }

    pub fn is_discovered(&self, system: NodeId) -> bool {
        self.discovered.contains(&system)
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn into_discoveries(self) -> Vec<Discovery> {
        self.discoveries
    }
}
