use std::collections::BTreeMap;

use bmpc_comm::{InMemoryPartyCommunicationAgentHost, PartyCommunicationAgent};
use bmpc_scheduler::{
    Boolean, NetworkPlaintextScheduler, NetworkPlaintextSchedulerConfig, PartyId,
    PlaintextScheduler, PlaintextSchedulerConfig, Scheduler, Secrecy, WireId,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use rstest::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a random circuit from `seed` and returns every opened wire value.
///
/// `my_id` is `None` when a single scheduler plays all parties. Otherwise inputs of other parties
/// are replaced with placeholders.
fn evaluate_random_circuit(
    scheduler: &dyn Scheduler,
    my_id: Option<PartyId>,
    parties: usize,
    seed: u64,
) -> Vec<bool> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let mut wires: Vec<(WireId<Boolean>, Secrecy)> = Vec::new();

    for i in 0..8 {
        let party = i % parties;
        let v: bool = rng.gen();
        let v = if my_id.is_none() || my_id == Some(party) {
            v
        } else {
            false
        };
        wires.push((
            scheduler.private_boolean_input(v, party).unwrap(),
            Secrecy::Private,
        ));
    }
    for _ in 0..2 {
        wires.push((
            scheduler.public_boolean_input(rng.gen()).unwrap(),
            Secrecy::Public,
        ));
    }

    for _ in 0..64 {
        let (a, sa) = wires[rng.gen_range(0..wires.len())];
        let (b, sb) = wires[rng.gen_range(0..wires.len())];

        match rng.gen_range(0..4) {
            0 => {
                let out = match (sa, sb) {
                    (Secrecy::Private, Secrecy::Private) => scheduler.private_and_private(a, b),
                    (Secrecy::Private, Secrecy::Public) => scheduler.private_and_public(a, b),
                    (Secrecy::Public, Secrecy::Private) => scheduler.private_and_public(b, a),
                    (Secrecy::Public, Secrecy::Public) => scheduler.public_and_public(a, b),
                };
                wires.push((out.unwrap(), sa.join(sb)));
            }
            1 => {
                let out = match (sa, sb) {
                    (Secrecy::Private, Secrecy::Private) => scheduler.private_xor_private(a, b),
                    (Secrecy::Private, Secrecy::Public) => scheduler.private_xor_public(a, b),
                    (Secrecy::Public, Secrecy::Private) => scheduler.private_xor_public(b, a),
                    (Secrecy::Public, Secrecy::Public) => scheduler.public_xor_public(a, b),
                };
                wires.push((out.unwrap(), sa.join(sb)));
            }
            2 => {
                let out = match sa {
                    Secrecy::Private => scheduler.not_private(a),
                    Secrecy::Public => scheduler.not_public(a),
                };
                wires.push((out.unwrap(), sa));
            }
            _ => {
                let right_secrecy = if sa == Secrecy::Private && rng.gen() {
                    Secrecy::Private
                } else {
                    Secrecy::Public
                };
                let rights: Vec<_> = wires
                    .iter()
                    .filter(|(_, s)| *s == right_secrecy)
                    .map(|(id, _)| *id)
                    .take(4)
                    .collect();

                let outs = match (sa, right_secrecy) {
                    (Secrecy::Private, Secrecy::Private) => {
                        scheduler.private_and_private_composite(a, &rights)
                    }
                    (Secrecy::Private, Secrecy::Public) => {
                        scheduler.private_and_public_composite(a, &rights)
                    }
                    _ => scheduler.public_and_public_composite(a, &rights),
                };
                wires.extend(outs.unwrap().into_iter().map(|id| (id, sa)));
            }
        }
    }

    let values: Vec<bool> = wires
        .iter()
        .map(|(id, secrecy)| match secrecy {
            Secrecy::Private => {
                let opened = scheduler.open_boolean_value_to_party(*id, 0).unwrap();
                let v = scheduler.get_boolean_value(opened).unwrap();
                scheduler.decrease_reference_count(opened);
                v
            }
            Secrecy::Public => scheduler.get_boolean_value(*id).unwrap(),
        })
        .collect();

    for (id, _) in wires {
        scheduler.decrease_reference_count(id);
    }
    assert_eq!(scheduler.wire_statistics().live, 0);

    values
}

/// Creates a fully connected set of network schedulers, one per party.
fn network_schedulers(parties: usize) -> Vec<NetworkPlaintextScheduler> {
    let mut agents: Vec<BTreeMap<PartyId, Box<dyn PartyCommunicationAgent>>> =
        (0..parties).map(|_| BTreeMap::new()).collect();

    for i in 0..parties {
        for j in (i + 1)..parties {
            let mut host = InMemoryPartyCommunicationAgentHost::new();
            agents[i].insert(j, Box::new(host.get_agent(0).unwrap()));
            agents[j].insert(i, Box::new(host.get_agent(1).unwrap()));
        }
    }

    agents
        .into_iter()
        .enumerate()
        .map(|(my_id, agents)| {
            NetworkPlaintextScheduler::new(
                NetworkPlaintextSchedulerConfig::builder()
                    .my_id(my_id)
                    .build()
                    .unwrap(),
                agents,
            )
            .unwrap()
        })
        .collect()
}

#[rstest]
#[case::two_parties(2, 0)]
#[case::two_parties_other_seed(2, 1)]
#[case::three_parties(3, 2)]
fn test_network_matches_plaintext(#[case] parties: usize, #[case] seed: u64) {
    init_tracing();

    let expected =
        evaluate_random_circuit(&PlaintextScheduler::default(), None, parties, seed);

    let schedulers = network_schedulers(parties);
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = schedulers
            .iter()
            .map(|scheduler| {
                s.spawn(move || {
                    evaluate_random_circuit(scheduler, Some(scheduler.my_id()), parties, seed)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}

#[rstest]
#[case::sequential(usize::MAX)]
#[case::parallel(16)]
fn test_batch_matches_single(#[case] parallel_batch_threshold: usize) {
    let scheduler = PlaintextScheduler::new(
        PlaintextSchedulerConfig::builder()
            .parallel_batch_threshold(parallel_batch_threshold)
            .build()
            .unwrap(),
    );

    let mut rng = ChaCha12Rng::seed_from_u64(0);
    let a: Vec<bool> = (0..100).map(|_| rng.gen()).collect();
    let b: Vec<bool> = (0..100).map(|_| rng.gen()).collect();

    let x = scheduler.private_boolean_input_batch(&a, 0).unwrap();
    let y = scheduler.private_boolean_input_batch(&b, 1).unwrap();

    let and = scheduler.private_and_private_batch(x, y).unwrap();
    let xor = scheduler.private_xor_private_batch(and, x).unwrap();
    let not = scheduler.not_private_batch(xor).unwrap();
    let opened = scheduler.open_boolean_value_to_party_batch(not, 0).unwrap();
    let batch = scheduler.get_boolean_value_batch(opened).unwrap();

    let single: Vec<bool> = a
        .iter()
        .zip(&b)
        .map(|(a, b)| {
            let x = scheduler.private_boolean_input(*a, 0).unwrap();
            let y = scheduler.private_boolean_input(*b, 1).unwrap();
            let and = scheduler.private_and_private(x, y).unwrap();
            let xor = scheduler.private_xor_private(and, x).unwrap();
            let not = scheduler.not_private(xor).unwrap();
            let opened = scheduler.open_boolean_value_to_party(not, 0).unwrap();
            scheduler.get_boolean_value(opened).unwrap()
        })
        .collect();

    assert_eq!(batch, single);
}

#[test]
fn test_unbatching_then_batching_up_is_identity() {
    let scheduler = PlaintextScheduler::default();

    let mut rng = ChaCha12Rng::seed_from_u64(1);
    let v: Vec<bool> = (0..64).map(|_| rng.gen()).collect();
    let src = scheduler.private_boolean_input_batch(&v, 0).unwrap();

    let parts = scheduler.unbatching(src, &[10, 0, 30, 24]).unwrap();
    let joined = scheduler.batching_up(&parts).unwrap();

    assert_eq!(scheduler.get_boolean_value_batch(joined).unwrap(), v);
    assert_eq!(scheduler.wire_secrecy(joined), Secrecy::Private);
}

#[test]
fn test_concurrent_circuit_building() {
    let scheduler = PlaintextScheduler::default();

    let results: Vec<bool> = (0..1_000u32)
        .into_par_iter()
        .map(|i| {
            let x = scheduler.private_boolean_input(i % 2 == 0, 0).unwrap();
            let y = scheduler.private_boolean_input(i % 3 == 0, 1).unwrap();
            let z = scheduler.private_and_private(x, y).unwrap();

            scheduler.increase_reference_count(z);
            let v = scheduler.get_boolean_value(z).unwrap();
            for id in [x, y, z, z] {
                scheduler.decrease_reference_count(id);
            }
            v
        })
        .collect();

    for (i, v) in results.into_iter().enumerate() {
        assert_eq!(v, i % 6 == 0);
    }
    assert_eq!(scheduler.wire_statistics().live, 0);
    assert_eq!(scheduler.gate_statistics().non_free, 1_000);
}
