use std::{fmt, sync::Arc};

use bmpc_scheduler::{Boolean, PartyId, Scheduler, SchedulerError, Secrecy, WireId};

/// Where the values of a new wire come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Input {
    Public,
    Private(PartyId),
    Share,
}

/// An owned reference to a scheduler wire.
///
/// Cloning registers another holder with the scheduler and dropping releases it, so the wire
/// lives exactly as long as its last handle.
pub(crate) struct BitWire {
    scheduler: Arc<dyn Scheduler>,
    id: WireId<Boolean>,
    secrecy: Secrecy,
    batched: bool,
}

impl fmt::Debug for BitWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitWire")
            .field("id", &self.id)
            .field("secrecy", &self.secrecy)
            .field("batched", &self.batched)
            .finish_non_exhaustive()
    }
}

impl Clone for BitWire {
    fn clone(&self) -> Self {
        if self.batched {
            self.scheduler.increase_reference_count_batch(self.id);
        } else {
            self.scheduler.increase_reference_count(self.id);
        }

        Self {
            scheduler: Arc::clone(&self.scheduler),
            id: self.id,
            secrecy: self.secrecy,
            batched: self.batched,
        }
    }
}

impl Drop for BitWire {
    fn drop(&mut self) {
        if self.batched {
            self.scheduler.decrease_reference_count_batch(self.id);
        } else {
            self.scheduler.decrease_reference_count(self.id);
        }
    }
}

impl BitWire {
    /// Creates a wire holding `values`, which must hold exactly one value unless `batched`.
    pub(crate) fn input(
        scheduler: &Arc<dyn Scheduler>,
        values: &[bool],
        batched: bool,
        input: Input,
    ) -> Result<Self, SchedulerError> {
        let id = match (input, batched) {
            (Input::Public, false) => scheduler.public_boolean_input(values[0]),
            (Input::Public, true) => scheduler.public_boolean_input_batch(values),
            (Input::Private(party), false) => scheduler.private_boolean_input(values[0], party),
            (Input::Private(party), true) => scheduler.private_boolean_input_batch(values, party),
            (Input::Share, false) => scheduler.recover_boolean_wire(values[0]),
            (Input::Share, true) => scheduler.recover_boolean_wire_batch(values),
        }?;

        let secrecy = match input {
            Input::Public => Secrecy::Public,
            Input::Private(_) | Input::Share => Secrecy::Private,
        };

        Ok(Self {
            scheduler: Arc::clone(scheduler),
            id,
            secrecy,
            batched,
        })
    }

    fn derive(&self, id: WireId<Boolean>, secrecy: Secrecy) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
            id,
            secrecy,
            batched: self.batched,
        }
    }

    pub(crate) fn and(&self, other: &BitWire) -> Result<Self, SchedulerError> {
        let s = &self.scheduler;
        let (l, r) = (self.id, other.id);

        let id = match (self.secrecy, other.secrecy, self.batched) {
            (Secrecy::Private, Secrecy::Private, false) => s.private_and_private(l, r),
            (Secrecy::Private, Secrecy::Private, true) => s.private_and_private_batch(l, r),
            (Secrecy::Private, Secrecy::Public, false) => s.private_and_public(l, r),
            (Secrecy::Private, Secrecy::Public, true) => s.private_and_public_batch(l, r),
            (Secrecy::Public, Secrecy::Private, false) => s.private_and_public(r, l),
            (Secrecy::Public, Secrecy::Private, true) => s.private_and_public_batch(r, l),
            (Secrecy::Public, Secrecy::Public, false) => s.public_and_public(l, r),
            (Secrecy::Public, Secrecy::Public, true) => s.public_and_public_batch(l, r),
        }?;

        Ok(self.derive(id, self.secrecy.join(other.secrecy)))
    }

    pub(crate) fn xor(&self, other: &BitWire) -> Result<Self, SchedulerError> {
        let s = &self.scheduler;
        let (l, r) = (self.id, other.id);

        let id = match (self.secrecy, other.secrecy, self.batched) {
            (Secrecy::Private, Secrecy::Private, false) => s.private_xor_private(l, r),
            (Secrecy::Private, Secrecy::Private, true) => s.private_xor_private_batch(l, r),
            (Secrecy::Private, Secrecy::Public, false) => s.private_xor_public(l, r),
            (Secrecy::Private, Secrecy::Public, true) => s.private_xor_public_batch(l, r),
            (Secrecy::Public, Secrecy::Private, false) => s.private_xor_public(r, l),
            (Secrecy::Public, Secrecy::Private, true) => s.private_xor_public_batch(r, l),
            (Secrecy::Public, Secrecy::Public, false) => s.public_xor_public(l, r),
            (Secrecy::Public, Secrecy::Public, true) => s.public_xor_public_batch(l, r),
        }?;

        Ok(self.derive(id, self.secrecy.join(other.secrecy)))
    }

    pub(crate) fn not(&self) -> Result<Self, SchedulerError> {
        let s = &self.scheduler;

        let id = match (self.secrecy, self.batched) {
            (Secrecy::Private, false) => s.not_private(self.id),
            (Secrecy::Private, true) => s.not_private_batch(self.id),
            (Secrecy::Public, false) => s.not_public(self.id),
            (Secrecy::Public, true) => s.not_public_batch(self.id),
        }?;

        Ok(self.derive(id, self.secrecy))
    }

    /// ANDs `self` with every wire in `rights`. All of `rights` must share the same secrecy.
    pub(crate) fn composite_and(&self, rights: &[BitWire]) -> Result<Vec<Self>, SchedulerError> {
        let Some(first) = rights.first() else {
            return Ok(Vec::new());
        };
        let right_secrecy = first.secrecy;

        let s = &self.scheduler;
        let ids: Vec<_> = rights.iter().map(|r| r.id).collect();

        let outs = match (self.secrecy, right_secrecy, self.batched) {
            (Secrecy::Private, Secrecy::Private, false) => {
                s.private_and_private_composite(self.id, &ids)
            }
            (Secrecy::Private, Secrecy::Private, true) => {
                s.private_and_private_composite_batch(self.id, &ids)
            }
            (Secrecy::Private, Secrecy::Public, false) => {
                s.private_and_public_composite(self.id, &ids)
            }
            (Secrecy::Private, Secrecy::Public, true) => {
                s.private_and_public_composite_batch(self.id, &ids)
            }
            (Secrecy::Public, Secrecy::Public, false) => {
                s.public_and_public_composite(self.id, &ids)
            }
            (Secrecy::Public, Secrecy::Public, true) => {
                s.public_and_public_composite_batch(self.id, &ids)
            }
            // A public left operand cannot fan out over private wires.
            (Secrecy::Public, Secrecy::Private, _) => {
                return rights.iter().map(|right| right.and(self)).collect();
            }
        }?;

        let secrecy = self.secrecy.join(right_secrecy);
        Ok(outs.into_iter().map(|id| self.derive(id, secrecy)).collect())
    }

    pub(crate) fn open_to_party(&self, party: PartyId) -> Result<Self, SchedulerError> {
        let id = if self.batched {
            self.scheduler.open_boolean_value_to_party_batch(self.id, party)
        } else {
            self.scheduler.open_boolean_value_to_party(self.id, party)
        }?;

        Ok(self.derive(id, Secrecy::Public))
    }

    /// Returns the plaintext values of a public wire.
    pub(crate) fn values(&self) -> Result<Vec<bool>, SchedulerError> {
        if self.batched {
            self.scheduler.get_boolean_value_batch(self.id)
        } else {
            Ok(vec![self.scheduler.get_boolean_value(self.id)?])
        }
    }

    pub(crate) fn shares(&self) -> Result<Vec<bool>, SchedulerError> {
        if self.batched {
            self.scheduler.extract_boolean_secret_share_batch(self.id)
        } else {
            Ok(vec![self.scheduler.extract_boolean_secret_share(self.id)?])
        }
    }
}
