use std::{collections::BTreeMap, sync::Arc};

use bmpc_comm::{InMemoryPartyCommunicationAgentHost, PartyCommunicationAgent};
use bmpc_frontend::{AsciiString, Batched, Bit, Int, Public, Secret, Single};
use bmpc_scheduler::{
    NetworkPlaintextScheduler, NetworkPlaintextSchedulerConfig, PartyId, PlaintextScheduler,
    Scheduler,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Runs `f` once per party, each on its own thread with its own scheduler.
fn run_two_party<F, R>(f: F) -> [R; 2]
where
    F: Fn(&Arc<dyn Scheduler>, PartyId) -> R + Sync,
    R: Send,
{
    let mut host = InMemoryPartyCommunicationAgentHost::new();
    let schedulers: Vec<Arc<dyn Scheduler>> = (0..2)
        .map(|my_id| {
            let agent: Box<dyn PartyCommunicationAgent> = Box::new(host.get_agent(my_id).unwrap());
            let scheduler = NetworkPlaintextScheduler::new(
                NetworkPlaintextSchedulerConfig::builder()
                    .my_id(my_id)
                    .build()
                    .unwrap(),
                BTreeMap::from([(1 - my_id, agent)]),
            )
            .unwrap();
            Arc::new(scheduler) as Arc<dyn Scheduler>
        })
        .collect();

    std::thread::scope(|s| {
        let f = &f;
        let handles = [0, 1].map(|my_id| {
            let scheduler = &schedulers[my_id];
            s.spawn(move || f(scheduler, my_id))
        });
        handles.map(|h| h.join().unwrap())
    })
}

#[test]
fn test_string_selection() {
    init_tracing();

    let names = vec!["alice", "bob", "carol"];
    let others = vec!["dave", "eve", "mallory"];
    let picks = vec![true, false, true];

    let results = run_two_party(|scheduler, my_id| {
        // Party 0 owns `names`, party 1 owns `others` and the choice bits.
        let placeholder = vec![""; 3];
        let a = AsciiString::<8, Secret, Batched>::new_secret(
            scheduler,
            if my_id == 0 { names.clone() } else { placeholder.clone() },
            0,
        )
        .unwrap();
        let b = AsciiString::<8, Secret, Batched>::new_secret(
            scheduler,
            if my_id == 1 { others.clone() } else { placeholder },
            1,
        )
        .unwrap();
        let choice = Bit::<Secret, Batched>::new_secret(
            scheduler,
            if my_id == 1 { picks.clone() } else { vec![false; 3] },
            1,
        )
        .unwrap();

        let selected = a.mux(&choice, &b).unwrap();
        let opened = selected.open_to_party(0).unwrap();

        (opened.known_size(), opened.get_value().unwrap())
    });

    for (sizes, values) in results {
        assert_eq!(sizes, vec![4, 3, 7]);
        assert_eq!(values, vec!["dave", "bob", "mallory"]);
    }
}

#[test]
fn test_int_shares_survive_recovery() {
    let results = run_two_party(|scheduler, my_id| {
        let x = Int::<32, Secret, Single>::new_secret(
            scheduler,
            if my_id == 1 { -123_456 } else { 0 },
            1,
        )
        .unwrap();

        let share = x.extract_int_share().unwrap();
        drop(x);

        let y = Int::<32, Secret, Single>::from_share(scheduler, share).unwrap();
        let value = y.open_to_party(0).unwrap().get_value().unwrap();

        drop(y);
        (value, scheduler.wire_statistics().live)
    });

    for (value, live) in results {
        assert_eq!(value, -123_456);
        assert_eq!(live, 0);
    }
}

#[test]
fn test_network_matches_plaintext() {
    let mut rng = ChaCha12Rng::seed_from_u64(0);
    let a: Vec<i64> = (0..32).map(|_| rng.gen_range(-1000..1000)).collect();
    let b: Vec<i64> = (0..32).map(|_| rng.gen_range(-1000..1000)).collect();
    let c: Vec<bool> = (0..32).map(|_| rng.gen()).collect();

    let circuit = |scheduler: &Arc<dyn Scheduler>, my_id: Option<PartyId>| {
        let mine = |party: PartyId| my_id.is_none() || my_id == Some(party);

        let x = Int::<16, Secret, Batched>::new_secret(
            scheduler,
            if mine(0) { a.clone() } else { vec![0; 32] },
            0,
        )
        .unwrap();
        let y = Int::<16, Public, Batched>::new_public(scheduler, b.clone()).unwrap();
        let choice = Bit::<Secret, Batched>::new_secret(
            scheduler,
            if mine(1) { c.clone() } else { vec![false; 32] },
            1,
        )
        .unwrap();

        let z = y.mux(&choice, &x).unwrap();
        z.open_to_party(1).unwrap().get_value().unwrap()
    };

    let plaintext: Arc<dyn Scheduler> = Arc::new(PlaintextScheduler::default());
    let expected = circuit(&plaintext, None);
    for (i, v) in expected.iter().enumerate() {
        assert_eq!(*v, if c[i] { a[i] } else { b[i] });
    }

    let results = run_two_party(|scheduler, my_id| circuit(scheduler, Some(my_id)));
    for result in results {
        assert_eq!(result, expected);
    }
}

#[test]
fn test_public_values_need_no_traffic() {
    let results = run_two_party(|scheduler, _| {
        let s = AsciiString::<4, Public, Single>::new_public(scheduler, "mpc").unwrap();
        let t = s.clone();
        (t.get_value().unwrap(), scheduler.traffic_statistics())
    });

    for (value, traffic) in results {
        assert_eq!(value, "mpc");
        assert_eq!(traffic, Default::default());
    }
}
