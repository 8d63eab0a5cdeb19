//! Concurrent access through a shared market (one mutex per market)
//!
//! Stakes and the resolution race on many threads. Whatever the
//! interleaving, no stake may land after resolution and the escrow must
//! stay solvent after every claim.

use std::sync::{Arc, Barrier};
use std::thread;

use trusted_oracle_market::{
    Identity, MarketConfig, MarketError, PredictionMarket, Side, Treasury,
};

const BETTORS: usize = 32;

#[test]
fn test_stakes_racing_resolution() {
    let admin = Identity::from("admin");
    let oracle = Identity::from("oracle");

    let mut market = PredictionMarket::new(&MarketConfig::new("admin"));
    let q = market.add_question(&admin, "Race").unwrap();
    market.add_trusted_source(&admin, oracle.clone()).unwrap();
    let shared = market.into_shared();

    let barrier = Arc::new(Barrier::new(BETTORS + 1));
    let mut handles = Vec::new();

    for i in 0..BETTORS {
        let shared = Arc::clone(&shared);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let bettor = Identity::new(format!("bettor_{}", i));
            let side = Side::from_bool(i % 2 == 0);
            barrier.wait();
            let mut market = shared.lock().unwrap();
            match market.bet(&bettor, q, side, (i as u128 + 1) * 100) {
                Ok(_) => true,
                Err(MarketError::AlreadyResolved(_)) => false,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }));
    }

    let resolver = {
        let shared = Arc::clone(&shared);
        let barrier = Arc::clone(&barrier);
        let oracle = oracle.clone();
        thread::spawn(move || {
            barrier.wait();
            let mut market = shared.lock().unwrap();
            market.resolve_question(&oracle, q, Side::Yes).unwrap();
        })
    };

    let accepted: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    resolver.join().unwrap();

    let mut market = shared.lock().unwrap();
    let question = market.get_question(q).unwrap();
    assert!(question.resolved);
    assert_eq!(
        (question.positive_bet_count + question.negative_bet_count) as usize,
        accepted
    );
    assert_eq!(
        question.positive_stake_total + question.negative_stake_total,
        market.treasury().pool_balance()
    );

    // Winners drain the pool without ever overdrawing it
    for i in (0..BETTORS).step_by(2) {
        let bettor = Identity::new(format!("bettor_{}", i));
        match market.claim_funds(&bettor, q) {
            Ok(_) | Err(MarketError::NoBet { .. }) => {}
            Err(e) => panic!("unexpected claim error: {}", e),
        }
        assert!(market.solvency().unwrap().is_solvent());
    }
    assert_eq!(market.outstanding_liability().unwrap(), 0);
}

#[test]
fn test_concurrent_double_claims_pay_once() {
    let admin = Identity::from("admin");
    let oracle = Identity::from("oracle");
    let winner = Identity::from("winner");

    let mut market = PredictionMarket::new(&MarketConfig::new("admin"));
    let q = market.add_question(&admin, "Double claim").unwrap();
    market.add_trusted_source(&admin, oracle.clone()).unwrap();
    market.bet(&winner, q, Side::Yes, 1_000).unwrap();
    market.bet(&Identity::from("loser"), q, Side::No, 500).unwrap();
    market.resolve_question(&oracle, q, Side::Yes).unwrap();
    let shared = market.into_shared();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let winner = winner.clone();
            thread::spawn(move || shared.lock().unwrap().claim_funds(&winner, q).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    let market = shared.lock().unwrap();
    assert_eq!(successes, 1);
    assert_eq!(market.treasury().credited(&winner), 1_500);
    assert_eq!(market.treasury().pool_balance(), 0);
}
