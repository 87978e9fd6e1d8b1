//! End-to-end ledger service tests against the file store

use std::sync::Arc;
use stowage::{
    BalanceStore, Decision, DenialReason, LedgerConfig, LedgerService, LedgerStore, ObservedTotals,
    RegionId, Site, WorldPoint,
};
use tempfile::tempdir;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn config_for(dir: &std::path::Path) -> LedgerConfig {
    LedgerConfig {
        data_dir: dir.to_path_buf(),
        ..LedgerConfig::default()
    }
}

/// A player banks at Lumbridge, then Varrock west, then comes back after a
/// restart and tries to withdraw.
#[tokio::test]
async fn test_session_survives_restart() {
    init_logging();
    let dir = tempdir().unwrap();
    let store = Arc::new(LedgerStore::new(dir.path()));

    // First session
    {
        let mut service = LedgerService::new(config_for(dir.path()));
        service.init(Some(store.clone()), "Zezima");

        // Lumbridge castle
        assert_eq!(service.open_site(Some(WorldPoint::new(3208, 3220, 2))), Site::Lumbridge);
        let slots = vec![(995, 1_000), (1511, 27), (-1, 0), (1511, 1)];
        service.observe(&ObservedTotals::from_slots(slots));

        assert_eq!(service.open_region(Some(RegionId(12597))), Site::VarrockWest);
        let slots = vec![(995, 1_500), (1511, 28), (4151, 1)];
        service.observe(&ObservedTotals::from_slots(slots));

        service.shutdown().await;
    }

    assert!(store.path_for("zezima").exists());

    // Second session
    let mut service = LedgerService::new(config_for(dir.path()));
    service.init(Some(store.clone()), "zezima");

    let ledger = service.ledger();
    assert_eq!(ledger.local_quantity(995, Some(Site::Lumbridge)), 1_000);
    assert_eq!(ledger.local_quantity(995, Some(Site::VarrockWest)), 500);
    assert_eq!(ledger.local_quantity(1511, Some(Site::Lumbridge)), 28);
    assert_eq!(ledger.per_site(4151).unwrap().len(), 1);

    service.open_region(Some(RegionId(12597)));
    assert!(service.check_withdraw(995, "Withdraw-500").is_allowed());
    assert_eq!(
        service.check_withdraw(995, "Withdraw-1,000"),
        Decision::Deny(DenialReason::InsufficientLocalStock { available: 500 })
    );
    assert!(!service.check_withdraw(995, "Withdraw-All").is_allowed());
    assert!(service.check_withdraw(4151, "Withdraw-All").is_allowed());
    assert_eq!(
        service.check_withdraw(1511, "Withdraw-1"),
        Decision::Deny(DenialReason::NoLocalStock)
    );

    service.shutdown().await;
}

#[tokio::test]
async fn test_corrupt_file_starts_empty_and_is_overwritten() {
    init_logging();
    let dir = tempdir().unwrap();
    let store = Arc::new(LedgerStore::new(dir.path()));
    std::fs::write(store.path_for("zezima"), b"this is not a ledger").unwrap();

    let mut service = LedgerService::new(config_for(dir.path()));
    service.init(Some(store.clone()), "zezima");
    assert!(service.ledger().is_empty());

    service.open_region(Some(RegionId(10806)));
    service.observe(&[(7, 3)].into_iter().collect());
    service.shutdown().await;

    let restored = store.load("zezima").unwrap();
    assert_eq!(restored.local_quantity(7, Some(Site::SeersVillage)), 3);
}

#[tokio::test]
async fn test_unobserved_changes_drift() {
    init_logging();
    let mut service = LedgerService::new(LedgerConfig::default());

    service.open_region(Some(RegionId(12850)));
    service.observe(&[(7, 10)].into_iter().collect());

    // Ten more deposited at an unmapped bank: nothing is recorded there
    service.open_region(Some(RegionId(1)));
    assert!(service.observe(&[(7, 20)].into_iter().collect()).is_empty());

    // The next known bank absorbs the whole difference
    service.open_region(Some(RegionId(12597)));
    service.observe(&[(7, 20)].into_iter().collect());
    assert_eq!(service.ledger().local_quantity(7, Some(Site::VarrockWest)), 10);
    assert_eq!(service.global_quantity(7), 20);
}
