//! In-process transport pairing two parties.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Condvar, Mutex},
};

use tracing::{debug, trace};

use crate::{CommError, PartyCommunicationAgent, PartyId, TrafficStatistics};

/// Outbound queue of one party.
#[derive(Default)]
struct Queue {
    chunks: Mutex<VecDeque<Vec<u8>>>,
    not_empty: Condvar,
}

/// The two queues, indexed by the sending party.
#[derive(Default)]
struct Queues([Queue; 2]);

impl Queues {
    fn send(&self, my_id: PartyId, data: &[u8]) -> Result<(), CommError> {
        if data.is_empty() {
            return Ok(());
        }

        let queue = &self.0[my_id];
        let mut chunks = queue.chunks.lock().map_err(|_| CommError::Poisoned)?;
        chunks.push_back(data.to_vec());
        queue.not_empty.notify_one();

        Ok(())
    }

    fn receive(&self, my_id: PartyId, size: usize) -> Result<Vec<u8>, CommError> {
        let queue = &self.0[1 - my_id];
        let mut result = Vec::with_capacity(size);

        let mut chunks = queue.chunks.lock().map_err(|_| CommError::Poisoned)?;
        while result.len() < size {
            chunks = queue
                .not_empty
                .wait_while(chunks, |chunks| chunks.is_empty())
                .map_err(|_| CommError::Poisoned)?;

            while let Some(front) = chunks.front_mut() {
                let needed = size - result.len();
                if needed == 0 {
                    break;
                }

                if front.len() <= needed {
                    result.extend_from_slice(front);
                    chunks.pop_front();
                } else {
                    // Leave the tail queued for the next receive.
                    result.extend(front.drain(..needed));
                }
            }
        }

        Ok(result)
    }
}

/// Owns the queues connecting two in-process parties and hands out one agent per party.
///
/// Each agent can be extracted exactly once. The queues stay alive for as long as either the
/// host or one of its agents does.
pub struct InMemoryPartyCommunicationAgentHost {
    queues: Arc<Queues>,
    agents: [Option<InMemoryPartyCommunicationAgent>; 2],
}

impl fmt::Debug for InMemoryPartyCommunicationAgentHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryPartyCommunicationAgentHost")
            .field("available", &[self.agents[0].is_some(), self.agents[1].is_some()])
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryPartyCommunicationAgentHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPartyCommunicationAgentHost {
    /// Creates a new host along with the agents for party 0 and party 1.
    pub fn new() -> Self {
        let queues = Arc::new(Queues::default());
        let agents = [0, 1].map(|my_id| {
            Some(InMemoryPartyCommunicationAgent {
                my_id,
                queues: queues.clone(),
                sent: 0,
                received: 0,
            })
        });

        debug!("created in-memory agent host");

        Self { queues, agents }
    }

    /// Hands out the agent of party `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::InvalidParty`] if `id` is not 0 or 1, and
    /// [`CommError::AgentAlreadyExtracted`] if the agent was already handed out.
    pub fn get_agent(
        &mut self,
        id: PartyId,
    ) -> Result<InMemoryPartyCommunicationAgent, CommError> {
        let slot = self.agents.get_mut(id).ok_or(CommError::InvalidParty(id))?;
        let agent = slot.take().ok_or(CommError::AgentAlreadyExtracted(id))?;

        debug!(party = id, "extracted in-memory agent");

        Ok(agent)
    }

    /// Enqueues a copy of `data` on the outbound queue of party `my_id`.
    ///
    /// Never blocks on the receiver.
    pub fn send(&self, my_id: PartyId, data: &[u8]) -> Result<(), CommError> {
        check_party(my_id)?;
        self.queues.send(my_id, data)
    }

    /// Blocks until `size` bytes sent by the other party are available and returns them.
    pub fn receive(&self, my_id: PartyId, size: usize) -> Result<Vec<u8>, CommError> {
        check_party(my_id)?;
        self.queues.receive(my_id, size)
    }
}

fn check_party(id: PartyId) -> Result<(), CommError> {
    if id < 2 {
        Ok(())
    } else {
        Err(CommError::InvalidParty(id))
    }
}

/// The endpoint of one party of an [`InMemoryPartyCommunicationAgentHost`].
pub struct InMemoryPartyCommunicationAgent {
    my_id: PartyId,
    queues: Arc<Queues>,
    sent: u64,
    received: u64,
}

impl fmt::Debug for InMemoryPartyCommunicationAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryPartyCommunicationAgent")
            .field("my_id", &self.my_id)
            .field("sent", &self.sent)
            .field("received", &self.received)
            .finish_non_exhaustive()
    }
}

impl InMemoryPartyCommunicationAgent {
    /// Returns the id of the party owning this agent.
    pub fn id(&self) -> PartyId {
        self.my_id
    }
}

impl PartyCommunicationAgent for InMemoryPartyCommunicationAgent {
    fn send(&mut self, data: &[u8]) -> Result<(), CommError> {
        self.queues.send(self.my_id, data)?;
        self.sent += data.len() as u64;

        trace!(party = self.my_id, bytes = data.len(), "sent");

        Ok(())
    }

    fn receive(&mut self, size: usize) -> Result<Vec<u8>, CommError> {
        let data = self.queues.receive(self.my_id, size)?;
        if data.len() != size {
            return Err(CommError::UnexpectedMessageSize {
                expected: size,
                actual: data.len(),
            });
        }
        self.received += size as u64;

        trace!(party = self.my_id, bytes = size, "received");

        Ok(data)
    }

    fn traffic_statistics(&self) -> TrafficStatistics {
        TrafficStatistics {
            sent: self.sent,
            received: self.received,
        }
    }
}
