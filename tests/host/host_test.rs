// Host tests - invocation, clock handling and persistence end to end

use std::sync::Arc;
use tempfile::TempDir;
use tokenledger::host::{Clock, HostError, ManualClock, TokenHost};
use tokenledger::identity::{Address, Keypair};
use tokenledger::ledger::{GenesisParams, LedgerError};
use tokenledger::storage::LedgerStore;

struct Fixture {
    _dir: TempDir,
    host: TokenHost<Arc<ManualClock>>,
    clock: Arc<ManualClock>,
    owner: Address,
}

fn deploy() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let owner = Keypair::generate().address();
    let host = TokenHost::initialize(store, clock.clone(), owner, GenesisParams::default()).unwrap();
    Fixture {
        _dir: dir,
        host,
        clock,
        owner,
    }
}

#[test]
fn test_initialize_deploys_genesis() {
    let f = deploy();

    assert_eq!(f.host.ledger().balance_of(&f.owner), 5_000_000);
    assert_eq!(f.host.ledger().owner(), f.owner);
    assert_eq!(f.host.store().events().unwrap().len(), 1);
}

#[test]
fn test_initialize_twice_fails() {
    let dir = TempDir::new().unwrap();
    let owner = Keypair::generate().address();
    {
        let store = LedgerStore::open(dir.path()).unwrap();
        TokenHost::initialize(store, ManualClock::new(0), owner, GenesisParams::default()).unwrap();
    }

    let store = LedgerStore::open(dir.path()).unwrap();
    let result = TokenHost::initialize(store, ManualClock::new(0), owner, GenesisParams::default());

    assert!(matches!(result, Err(HostError::AlreadyInitialized)));
}

#[test]
fn test_open_uninitialized_store_fails() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path()).unwrap();

    let result = TokenHost::open(store, ManualClock::new(0));

    assert!(matches!(result, Err(HostError::NotInitialized)));
}

#[test]
fn test_reference_scenario() {
    let mut f = deploy();
    let addr1 = Keypair::generate().address();
    let addr2 = Keypair::generate().address();

    f.host.mint(f.owner, addr1, 1_000).unwrap();
    f.host.transfer(addr1, addr2, 1_000).unwrap();
    assert_eq!(f.host.ledger().balance_of(&addr2), 999);
    assert_eq!(f.host.ledger().balance_of(&f.owner), 5_000_001);

    f.host.mint(f.owner, addr1, 1_000).unwrap();
    f.clock.advance(10);
    let reward = f.host.claim_reward(addr1).unwrap();
    assert!(reward > 0);
    assert!(f.host.ledger().balance_of(&addr1) > 1_000);
    assert_eq!(f.host.claim_reward(addr1).unwrap(), 0);
}

#[test]
fn test_rejected_operation_is_not_persisted() {
    let mut f = deploy();
    let stranger = Keypair::generate().address();
    let events_before = f.host.store().events().unwrap().len();

    let result = f.host.set_fee_percent(stranger, 50);

    assert!(matches!(result, Err(HostError::Ledger(LedgerError::Unauthorized))));
    assert_eq!(f.host.store().events().unwrap().len(), events_before);
    let reloaded = f.host.store().load_ledger().unwrap().unwrap();
    assert_eq!(reloaded.fee_percent(), 10);
}

#[test]
fn test_freeze_blocks_transfers_through_host() {
    let mut f = deploy();
    let addr1 = Keypair::generate().address();

    f.host.freeze_contract(f.owner).unwrap();
    f.host.freeze_contract(f.owner).unwrap();

    let result = f.host.transfer(f.owner, addr1, 10);
    assert!(matches!(result, Err(HostError::Ledger(LedgerError::TransfersDisabled))));
    assert!(f.host.store().load_ledger().unwrap().unwrap().is_frozen());
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let owner = Keypair::generate().address();
    let new_owner = Keypair::generate().address();
    let root = {
        let store = LedgerStore::open(dir.path()).unwrap();
        let mut host = TokenHost::initialize(store, ManualClock::new(10), owner, GenesisParams::default()).unwrap();
        host.transfer_ownership(owner, new_owner).unwrap();
        host.transfer(owner, new_owner, 1_000).unwrap();
        host.store().flush().unwrap();
        host.ledger().state_root()
    };

    let store = LedgerStore::open(dir.path()).unwrap();
    let host = TokenHost::open(store, ManualClock::new(20)).unwrap();

    assert_eq!(host.ledger().state_root(), root);
    assert_eq!(host.ledger().owner(), new_owner);
    assert_eq!(host.ledger().balance_of(&new_owner), 1_000);
}

#[test]
fn test_host_time_never_runs_backwards() {
    let mut f = deploy();
    let holder = Keypair::generate().address();
    f.host.mint(f.owner, holder, 1_000).unwrap();
    f.clock.advance(10);
    f.host.claim_reward(holder).unwrap();

    f.clock.set(0);

    assert_eq!(f.host.now(), 1_700_000_010);
    assert!(f.clock.now() < f.host.now());
    assert_eq!(f.host.claim_reward(holder).unwrap(), 0);
}

#[test]
fn test_reopen_resumes_time_from_persisted_state() {
    let dir = TempDir::new().unwrap();
    let owner = Keypair::generate().address();
    let holder = Keypair::generate().address();
    {
        let store = LedgerStore::open(dir.path()).unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let mut host = TokenHost::initialize(store, clock.clone(), owner, GenesisParams::default()).unwrap();
        host.mint(owner, holder, 1_000_000).unwrap();
        clock.advance(100);
        assert_eq!(host.claim_reward(holder).unwrap(), 100_000);
        host.store().flush().unwrap();
    }

    // Wall clock stepped back between invocations
    let store = LedgerStore::open(dir.path()).unwrap();
    let mut host = TokenHost::open(store, ManualClock::new(1_050)).unwrap();

    assert_eq!(host.now(), 1_100);
    assert_eq!(host.claim_reward(holder).unwrap(), 0);
    assert_eq!(host.ledger().balance_of(&holder), 1_100_000);
}
