// Reward accrual tests

use tokenledger::identity::{Address, Keypair};
use tokenledger::ledger::{CallContext, GenesisParams, Ledger, LedgerEvent};

fn at(caller: Address, timestamp: u64) -> CallContext {
    CallContext::new(caller, timestamp)
}

fn deploy(cap: u128, rate: u128) -> (Ledger, Address) {
    let owner = Keypair::generate().address();
    let ledger = Ledger::genesis(&at(owner, 1_000), GenesisParams::new(cap, 10, rate)).unwrap();
    (ledger, owner)
}

#[test]
fn test_claim_after_ten_seconds_increases_balance() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();

    let reward = ledger.claim_reward(&at(holder, 1_010)).unwrap();

    assert!(reward > 0);
    assert!(ledger.balance_of(&holder) > 1_000);
    assert_eq!(ledger.balance_of(&holder), 1_000 + reward);
    ledger.check_invariants().unwrap();
}

#[test]
fn test_reference_formula_value() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();

    // 1000 * 1000 * 10 / 1_000_000
    assert_eq!(ledger.claim_reward(&at(holder, 1_010)).unwrap(), 10);
}

#[test]
fn test_immediate_second_claim_yields_nothing() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();
    ledger.claim_reward(&at(holder, 1_010)).unwrap();
    let balance = ledger.balance_of(&holder);

    let second = ledger.claim_reward(&at(holder, 1_010)).unwrap();

    assert_eq!(second, 0);
    assert_eq!(ledger.balance_of(&holder), balance);
}

#[test]
fn test_claim_advances_timestamp() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();

    ledger.claim_reward(&at(holder, 1_010)).unwrap();

    assert_eq!(ledger.account(&holder).last_reward_timestamp(), Some(1_010));
    assert_eq!(ledger.account(&holder).created_at(), Some(1_000));
}

#[test]
fn test_zero_balance_claim_records_timestamp() {
    let (mut ledger, _) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();

    let reward = ledger.claim_reward(&at(holder, 5_000)).unwrap();

    assert_eq!(reward, 0);
    assert_eq!(ledger.balance_of(&holder), 0);
    assert_eq!(ledger.account(&holder).last_reward_timestamp(), Some(5_000));
    ledger.check_invariants().unwrap();
}

#[test]
fn test_accrual_starts_at_first_funding() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 2_000), holder, 1_000).unwrap();

    // Funded at 2000, so only 10 seconds have accrued
    assert_eq!(ledger.pending_reward(&holder, 2_010), 10);
}

#[test]
fn test_reward_grows_with_elapsed_time() {
    let (mut ledger, owner) = deploy(u128::MAX / 4, 1);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1).unwrap();

    let mut previous = 0;
    for elapsed in [1u64, 2, 10, 1_000, 1_000_000, 10_000_000] {
        let reward = ledger.pending_reward(&holder, 1_000 + elapsed);
        assert!(reward > 0);
        assert!(reward >= previous);
        previous = reward;
    }
}

#[test]
fn test_zero_rate_pays_nothing() {
    let (mut ledger, owner) = deploy(10_000_000, 0);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();

    assert_eq!(ledger.claim_reward(&at(holder, 10_000)).unwrap(), 0);
}

#[test]
fn test_reward_clamped_to_cap() {
    let (mut ledger, owner) = deploy(10_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 4_990).unwrap();
    assert_eq!(ledger.total_supply(), 9_990);

    // Accrued far more than the 10 units of headroom
    let reward = ledger.claim_reward(&at(holder, 2_000)).unwrap();

    assert_eq!(reward, 10);
    assert_eq!(ledger.total_supply(), 10_000);
    ledger.check_invariants().unwrap();
}

#[test]
fn test_claim_at_cap_credits_nothing_but_advances() {
    let (mut ledger, owner) = deploy(10_000, 1_000);
    ledger.mint(&at(owner, 1_000), owner, 5_000).unwrap();

    let reward = ledger.claim_reward(&at(owner, 2_000)).unwrap();

    assert_eq!(reward, 0);
    assert_eq!(ledger.account(&owner).last_reward_timestamp(), Some(2_000));
    assert_eq!(ledger.total_supply(), 10_000);
}

#[test]
fn test_clock_regression_yields_zero_reward() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);

    let reward = ledger.claim_reward(&at(owner, 500)).unwrap();

    assert_eq!(reward, 0);
}

#[test]
fn test_clock_regression_does_not_reopen_paid_window() {
    let (mut ledger, owner) = deploy(u128::MAX / 4, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000_000).unwrap();

    let first = ledger.claim_reward(&at(holder, 1_100)).unwrap();
    let regressed = ledger.claim_reward(&at(holder, 1_050)).unwrap();
    let replayed = ledger.claim_reward(&at(holder, 1_100)).unwrap();

    assert_eq!(first, 100_000);
    assert_eq!(regressed, 0);
    assert_eq!(ledger.account(&holder).last_reward_timestamp(), Some(1_100));
    assert_eq!(replayed, 0);
    ledger.check_invariants().unwrap();
}

#[test]
fn test_claim_allowed_while_frozen() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();
    ledger.freeze_contract(&at(owner, 1_000)).unwrap();

    assert_eq!(ledger.claim_reward(&at(holder, 1_010)).unwrap(), 10);
}

#[test]
fn test_claim_emits_events() {
    let (mut ledger, owner) = deploy(10_000_000, 1_000);
    let holder = Keypair::generate().address();
    ledger.mint(&at(owner, 1_000), holder, 1_000).unwrap();
    ledger.take_events();

    ledger.claim_reward(&at(holder, 1_010)).unwrap();
    let events: Vec<LedgerEvent> = ledger.take_events().into_iter().map(|r| r.event).collect();

    assert_eq!(
        events,
        vec![
            LedgerEvent::Transfer {
                from: None,
                to: holder,
                value: 10
            },
            LedgerEvent::RewardClaimed {
                holder,
                reward: 10,
                elapsed: 10
            },
        ]
    );
}
