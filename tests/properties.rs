//! Property-based tests for combat and session invariants.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use conquest::resolve::CombatRules;
use conquest::{
    resolve_attack, GameError, Intent, PlayerId, RandomDice, RulesConfig, Seat, Session,
    TerritoryGraph, TerritoryId,
};

const NAMES: [&str; 6] = ["Aldmark", "Brenn", "Corvale", "Dunmore", "Eskar", "Fenwick"];
const EDGES: [(&str, &str); 7] = [
    ("Aldmark", "Brenn"),
    ("Brenn", "Corvale"),
    ("Corvale", "Dunmore"),
    ("Dunmore", "Eskar"),
    ("Eskar", "Fenwick"),
    ("Fenwick", "Aldmark"),
    ("Brenn", "Eskar"),
];

fn dealt_session(seed: u64, players: usize) -> Session {
    let graph = TerritoryGraph::from_edges(&NAMES, &EDGES).unwrap();
    let seats = (0..players)
        .map(|i| Seat::new(format!("P{}", i), [0, 0, 0]))
        .collect();
    let mut rng = SmallRng::seed_from_u64(seed);
    Session::deal(graph, seats, RulesConfig::default(), &mut rng, Instant::now()).unwrap()
}

fn to_intent(kind: u8, player: u8, a: u16, b: u16, count: u32) -> Intent {
    let (player, from, to) = (PlayerId(player), TerritoryId(a), TerritoryId(b));
    match kind % 4 {
        0 => Intent::PlaceArmy {
            player,
            territory: from,
        },
        1 => Intent::MoveUnits {
            player,
            from,
            to,
            count,
        },
        2 => Intent::Attack { player, from, to },
        _ => Intent::AdvancePhase { player },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every exchange compares min(attack dice, defense dice) pairs and
    /// never takes a side below zero or the attacker below one.
    #[test]
    fn prop_combat_conserves_armies(
        attacker in 2u32..60,
        defender in 1u32..60,
        seed in any::<u64>(),
    ) {
        let outcome = resolve_attack(attacker, defender, &mut RandomDice::seeded(seed)).unwrap();
        let (attack, defense) = CombatRules::default().dice_counts(attacker, defender).unwrap();

        prop_assert_eq!(outcome.attacker_dice.len(), attack);
        prop_assert_eq!(outcome.defender_dice.len(), defense);
        prop_assert_eq!(outcome.pairs.len(), attack.min(defense));
        prop_assert_eq!(
            (outcome.attacker_losses + outcome.defender_losses) as usize,
            outcome.pairs.len()
        );
        prop_assert_eq!(outcome.attacker_armies + outcome.attacker_losses, attacker);
        prop_assert_eq!(outcome.defender_armies + outcome.defender_losses, defender);
        prop_assert!(outcome.attacker_armies >= 1);
        prop_assert_eq!(outcome.ownership_transfers, outcome.defender_armies == 0);
        prop_assert!(outcome.attacker_dice.windows(2).all(|w| w[0] >= w[1]));
    }

    /// Random intent streams keep the board consistent, and a rejected
    /// intent changes nothing.
    #[test]
    fn prop_session_invariants_hold(
        seed in any::<u64>(),
        players in 2usize..4,
        script in prop::collection::vec(
            (any::<u8>(), 0u8..4, 0u16..7, 0u16..7, 0u32..5, 0u64..1200),
            1..120,
        ),
    ) {
        let mut session = dealt_session(seed, players);
        let mut dice = RandomDice::seeded(seed ^ 0x5eed);
        let mut now = Instant::now();

        for (kind, player, a, b, count, wait_ms) in script {
            now += Duration::from_millis(wait_ms);
            let intent = to_intent(kind, player, a, b, count);
            let before = session.view();
            match session.apply(intent, now, &mut dice) {
                Ok(_) => {}
                Err(GameError::DataIntegrity(m)) => prop_assert!(false, "fatal error: {}", m),
                Err(_) => prop_assert_eq!(&session.view(), &before),
            }

            let ledger = session.ledger();
            for t in session.graph().ids() {
                prop_assert!(ledger.owner(t).unwrap().is_some());
                prop_assert!(ledger.armies(t).unwrap() >= 1);
            }
            if let Some(winner) = session.winner() {
                prop_assert_eq!(ledger.territory_count(winner), NAMES.len());
            }
        }
    }

    /// Any edge list yields a symmetric graph without self-loops.
    #[test]
    fn prop_graph_is_symmetric(
        edges in prop::collection::vec((0usize..6, 0usize..6), 0..30),
    ) {
        let named: Vec<(&str, &str)> = edges.iter().map(|&(a, b)| (NAMES[a], NAMES[b])).collect();
        let graph = TerritoryGraph::from_edges(&NAMES, &named).unwrap();
        for a in graph.ids() {
            let neighbors = graph.neighbors(a).unwrap();
            prop_assert!(neighbors.windows(2).all(|w| w[0] < w[1]));
            for &b in neighbors {
                prop_assert_ne!(a, b);
                prop_assert!(graph.is_adjacent(b, a));
            }
        }
        for &(a, b) in &edges {
            if a != b {
                prop_assert!(graph.is_adjacent(TerritoryId(a as u16), TerritoryId(b as u16)));
            }
        }
    }
}
