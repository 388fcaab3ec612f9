use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use bmpc_comm::{CommError, PartyCommunicationAgent, PartyId, TrafficStatistics};
use derive_builder::Builder;
use tracing::{debug, trace};

use crate::{
    keeper::{WireKeeperConfig, WireStatistics},
    scheduler::{
        plaintext::DEFAULT_PARALLEL_BATCH_THRESHOLD, GateStatistics, PlaintextScheduler,
        PlaintextSchedulerConfig, Scheduler,
    },
    wire::{Boolean, WireId},
    SchedulerError,
};

/// Network plaintext scheduler configuration.
#[derive(Debug, Clone, Builder)]
pub struct NetworkPlaintextSchedulerConfig {
    /// Id of the local party.
    my_id: PartyId,
    /// Batch gates with at least this many values are evaluated on the rayon thread pool.
    #[builder(default = "DEFAULT_PARALLEL_BATCH_THRESHOLD")]
    parallel_batch_threshold: usize,
    /// Configuration of the local wire keeper.
    #[builder(default)]
    keeper: WireKeeperConfig,
}

impl NetworkPlaintextSchedulerConfig {
    /// Creates a new builder for NetworkPlaintextSchedulerConfig.
    pub fn builder() -> NetworkPlaintextSchedulerConfigBuilder {
        NetworkPlaintextSchedulerConfigBuilder::default()
    }

    /// Id of the local party.
    pub fn my_id(&self) -> PartyId {
        self.my_id
    }

    /// Batch gates with at least this many values are evaluated on the rayon thread pool.
    pub fn parallel_batch_threshold(&self) -> usize {
        self.parallel_batch_threshold
    }

    /// Configuration of the local wire keeper.
    pub fn keeper(&self) -> &WireKeeperConfig {
        &self.keeper
    }
}

/// A plaintext scheduler for parties running in separate threads or processes.
///
/// Every party holds the true value of every wire: private inputs are sent in the clear from the
/// input party to all other parties. Secret shares form an XOR sharing in which party 0 holds the
/// value and every other party holds `false`. Gates and opening are evaluated locally.
///
/// Running the same circuit on this scheduler and on a secure backend must open the same values.
pub struct NetworkPlaintextScheduler {
    my_id: PartyId,
    parties: usize,
    agents: BTreeMap<PartyId, Mutex<Box<dyn PartyCommunicationAgent>>>,
    inner: PlaintextScheduler,
}

opaque_debug::implement!(NetworkPlaintextScheduler);

impl NetworkPlaintextScheduler {
    /// Creates a new scheduler.
    ///
    /// `agents` must hold one agent for every other party, keyed by the id of the peer. The number
    /// of parties is the number of agents plus one.
    pub fn new(
        config: NetworkPlaintextSchedulerConfig,
        agents: BTreeMap<PartyId, Box<dyn PartyCommunicationAgent>>,
    ) -> Result<Self, SchedulerError> {
        let parties = agents.len() + 1;
        let my_id = config.my_id;

        if my_id >= parties || agents.contains_key(&my_id) {
            return Err(SchedulerError::InvalidParty {
                party: my_id,
                parties,
            });
        }

        if let Some(peer) = agents.keys().find(|peer| **peer >= parties) {
            return Err(SchedulerError::InvalidParty {
                party: *peer,
                parties,
            });
        }

        debug!(my_id, parties, "created network plaintext scheduler");

        Ok(Self {
            my_id,
            parties,
            agents: agents
                .into_iter()
                .map(|(peer, agent)| (peer, Mutex::new(agent)))
                .collect(),
            inner: PlaintextScheduler::new(PlaintextSchedulerConfig {
                keeper: config.keeper,
                parallel_batch_threshold: config.parallel_batch_threshold,
            }),
        })
    }

    /// Returns the id of the local party.
    pub fn my_id(&self) -> PartyId {
        self.my_id
    }

    /// Returns the number of parties.
    pub fn parties(&self) -> usize {
        self.parties
    }

    fn check_party(&self, party: PartyId) -> Result<(), SchedulerError> {
        if party < self.parties {
            Ok(())
        } else {
            Err(SchedulerError::InvalidParty {
                party,
                parties: self.parties,
            })
        }
    }

    fn agent(
        &self,
        peer: PartyId,
    ) -> Result<MutexGuard<'_, Box<dyn PartyCommunicationAgent>>, SchedulerError> {
        let agent = self.agents.get(&peer).ok_or(SchedulerError::InvalidParty {
            party: peer,
            parties: self.parties,
        })?;

        agent.lock().map_err(|_| CommError::Poisoned.into())
    }

    /// Distributes the input of `party` so that every party ends up with the same values.
    fn exchange_input(&self, v: &[bool], party: PartyId) -> Result<Vec<bool>, SchedulerError> {
        self.check_party(party)?;

        if party == self.my_id {
            for peer in self.agents.keys() {
                self.agent(*peer)?.send_bool(v)?;
            }
            trace!(my_id = self.my_id, len = v.len(), "sent input");
            Ok(v.to_vec())
        } else {
            let v = self.agent(party)?.receive_bool(v.len())?;
            trace!(my_id = self.my_id, party, len = v.len(), "received input");
            Ok(v)
        }
    }

    /// Sends the local shares to every other party and XORs in theirs.
    fn exchange_shares(&self, shares: &[bool]) -> Result<Vec<bool>, SchedulerError> {
        for peer in self.agents.keys() {
            self.agent(*peer)?.send_bool(shares)?;
        }

        let mut value = shares.to_vec();
        for peer in self.agents.keys() {
            let theirs = self.agent(*peer)?.receive_bool(shares.len())?;
            value.iter_mut().zip(theirs).for_each(|(v, t)| *v ^= t);
        }

        Ok(value)
    }

    fn share_of(&self, v: bool) -> bool {
        self.my_id == 0 && v
    }
}

macro_rules! delegate {
    ($($name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
        $(
            fn $name(&self, $($arg: $ty),*) -> $ret {
                self.inner.$name($($arg),*)
            }
        )*
    };
}

impl Scheduler for NetworkPlaintextScheduler {
    fn private_boolean_input(
        &self,
        v: bool,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.exchange_input(&[v], party)?;
        self.inner.private_boolean_input(v[0], party)
    }

    fn private_boolean_input_batch(
        &self,
        v: &[bool],
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.exchange_input(v, party)?;
        self.inner.private_boolean_input_batch(&v, party)
    }

    fn recover_boolean_wire(&self, share: bool) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.exchange_shares(&[share])?;
        self.inner.recover_boolean_wire(v[0])
    }

    fn recover_boolean_wire_batch(
        &self,
        shares: &[bool],
    ) -> Result<WireId<Boolean>, SchedulerError> {
        let v = self.exchange_shares(shares)?;
        self.inner.recover_boolean_wire_batch(&v)
    }

    fn open_boolean_value_to_party(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.check_party(party)?;
        self.inner.open_boolean_value_to_party(src, party)
    }

    fn open_boolean_value_to_party_batch(
        &self,
        src: WireId<Boolean>,
        party: PartyId,
    ) -> Result<WireId<Boolean>, SchedulerError> {
        self.check_party(party)?;
        self.inner.open_boolean_value_to_party_batch(src, party)
    }

    fn extract_boolean_secret_share(&self, id: WireId<Boolean>) -> Result<bool, SchedulerError> {
        let v = self.inner.extract_boolean_secret_share(id)?;
        Ok(self.share_of(v))
    }

    fn extract_boolean_secret_share_batch(
        &self,
        id: WireId<Boolean>,
    ) -> Result<Vec<bool>, SchedulerError> {
        let v = self.inner.extract_boolean_secret_share_batch(id)?;
        Ok(v.into_iter().map(|v| self.share_of(v)).collect())
    }

    fn traffic_statistics(&self) -> TrafficStatistics {
        self.agents
            .values()
            .map(|agent| {
                agent
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .traffic_statistics()
            })
            .sum()
    }

    fn increase_reference_count(&self, id: WireId<Boolean>) {
        self.inner.increase_reference_count(id)
    }

    fn increase_reference_count_batch(&self, id: WireId<Boolean>) {
        self.inner.increase_reference_count_batch(id)
    }

    fn decrease_reference_count(&self, id: WireId<Boolean>) {
        self.inner.decrease_reference_count(id)
    }

    fn decrease_reference_count_batch(&self, id: WireId<Boolean>) {
        self.inner.decrease_reference_count_batch(id)
    }

    delegate! {
        public_boolean_input(v: bool) -> Result<WireId<Boolean>, SchedulerError>;
        public_boolean_input_batch(v: &[bool]) -> Result<WireId<Boolean>, SchedulerError>;
        get_boolean_value(id: WireId<Boolean>) -> Result<bool, SchedulerError>;
        get_boolean_value_batch(id: WireId<Boolean>) -> Result<Vec<bool>, SchedulerError>;

        private_and_private(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_and_private_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_and_public(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_and_public_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        public_and_public(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        public_and_public_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

        private_and_private_composite(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;
        private_and_private_composite_batch(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;
        private_and_public_composite(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;
        private_and_public_composite_batch(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;
        public_and_public_composite(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;
        public_and_public_composite_batch(left: WireId<Boolean>, rights: &[WireId<Boolean>]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

        private_xor_private(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_xor_private_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_xor_public(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        private_xor_public_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        public_xor_public(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        public_xor_public_batch(left: WireId<Boolean>, right: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

        not_private(src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        not_private_batch(src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        not_public(src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;
        not_public_batch(src: WireId<Boolean>) -> Result<WireId<Boolean>, SchedulerError>;

        batching_up(src: &[WireId<Boolean>]) -> Result<WireId<Boolean>, SchedulerError>;
        unbatching(src: WireId<Boolean>, strategy: &[usize]) -> Result<Vec<WireId<Boolean>>, SchedulerError>;

        wire_statistics() -> WireStatistics;
        gate_statistics() -> GateStatistics;
    }
}
