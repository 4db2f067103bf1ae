use std::sync::Arc;

use simple_bank::account::CreateAccountParams;
use simple_bank::transfer::RetryPolicy;
use simple_bank::{
    Currency, Fixtures, LedgerStore, MemoryLedgerStore, TransferConfig, TransferCoordinator,
    TransferError, TransferParams,
};

/// Store with `n` random-balance USD accounts and a coordinator over it
async fn setup(fx: &mut Fixtures, n: usize) -> (MemoryLedgerStore, Arc<TransferCoordinator>) {
    let store = MemoryLedgerStore::new();
    for _ in 0..n {
        store
            .create_account(&CreateAccountParams {
                owner: fx.random_owner(),
                balance: fx.random_money(),
                currency: Currency::Usd,
            })
            .await
            .unwrap();
    }
    let coordinator = TransferCoordinator::with_config(
        Arc::new(store.clone()),
        TransferConfig {
            retry: RetryPolicy::immediate(5),
            allow_overdraft: false,
        },
    );
    (store, Arc::new(coordinator))
}

#[tokio::test]
async fn prop_successful_transfer_moves_exact_amount() {
    for seed in 0..20 {
        let mut fx = Fixtures::seeded(seed);
        let (store, coordinator) = setup(&mut fx, 2).await;
        let from_before = store.get_account(1).await.unwrap().balance;
        let to_before = store.get_account(2).await.unwrap().balance;
        let amount = fx.random_int(1, 1000);

        match coordinator.execute(TransferParams::new(1, 2, amount)).await {
            Ok(result) => {
                assert!(amount <= from_before, "seed {seed}");
                assert_eq!(result.from_account.balance, from_before - amount);
                assert_eq!(result.to_account.balance, to_before + amount);
                assert_eq!(store.transfer_count(), 1);
                assert_eq!(store.entry_count(), 2);
                assert!(result.is_balanced());
            }
            Err(TransferError::InsufficientFunds { balance, .. }) => {
                assert!(amount > from_before, "seed {seed}");
                assert_eq!(balance, from_before);
                assert_eq!(store.transfer_count(), 0);
                assert_eq!(store.entry_count(), 0);
            }
            Err(e) => panic!("seed {seed}: unexpected error {e}"),
        }
    }
}

#[tokio::test]
async fn prop_rejected_transfer_persists_nothing() {
    let mut fx = Fixtures::seeded(99);
    let (store, coordinator) = setup(&mut fx, 3).await;
    let total = store.total_balance();

    let cases = [
        TransferParams::new(2, 2, 10),
        TransferParams::new(1, 2, 0),
        TransferParams::new(1, 2, -fx.random_int(1, 1000)),
        TransferParams::new(1, 404, 1),
        TransferParams::new(404, 1, 1),
    ];
    for params in cases {
        let err = coordinator.execute(params).await.unwrap_err();
        assert!(
            matches!(
                err,
                TransferError::InvalidArgument(_) | TransferError::AccountNotFound(_)
            ),
            "{params:?} -> {err}"
        );
    }

    assert_eq!(store.transfer_count(), 0);
    assert_eq!(store.entry_count(), 0);
    assert_eq!(store.total_balance(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn prop_concurrent_transfers_conserve_money() {
    for seed in [1_u64, 2, 3] {
        let mut fx = Fixtures::seeded(seed);
        let accounts = 6;
        let (store, coordinator) = setup(&mut fx, accounts).await;
        let total = store.total_balance();

        let mut handles = Vec::new();
        for _ in 0..60 {
            let from = fx.random_int(1, accounts as i64);
            let mut to = fx.random_int(1, accounts as i64);
            if to == from {
                to = from % accounts as i64 + 1;
            }
            let amount = fx.random_int(1, 300);
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .execute(TransferParams::new(from, to, amount))
                    .await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(TransferError::InsufficientFunds { .. }) => {}
                Err(e) => panic!("seed {seed}: unexpected error {e}"),
            }
        }

        assert_eq!(store.total_balance(), total, "seed {seed}");
        assert_eq!(store.transfer_count(), committed);
        assert_eq!(store.entries().iter().map(|e| e.amount).sum::<i64>(), 0);
        for id in 1..=accounts as i64 {
            let account = store.get_account(id).await.unwrap();
            assert!(account.balance >= 0, "seed {seed}: account {id} overdrawn");

            // Balance equals opening balance plus the account's entries
            let delta: i64 = store
                .list_entries(id)
                .await
                .unwrap()
                .iter()
                .map(|e| e.amount)
                .sum();
            assert_eq!(
                account.balance - delta,
                opening_balance(seed, id),
                "seed {seed}: account {id}"
            );
        }
    }
}

/// Re-derive the balance `setup` gave account `id` for `seed`
fn opening_balance(seed: u64, id: i64) -> i64 {
    let mut fx = Fixtures::seeded(seed);
    let mut balance = 0;
    for _ in 0..id {
        fx.random_owner();
        balance = fx.random_money();
    }
    balance
}

#[tokio::test]
async fn prop_transfer_ids_are_unique_and_recorded() {
    let mut fx = Fixtures::seeded(7);
    let (store, coordinator) = setup(&mut fx, 2).await;
    store
        .create_account(&CreateAccountParams {
            owner: "rich".to_string(),
            balance: 1_000_000,
            currency: Currency::Usd,
        })
        .await
        .unwrap();

    let mut ids = Vec::new();
    for _ in 0..10 {
        let to = fx.random_int(1, 2);
        let result = coordinator
            .execute(TransferParams::new(3, to, fx.random_int(1, 100)))
            .await
            .unwrap();
        ids.push(result.transfer.id);
        assert_eq!(store.get_transfer(result.transfer.id).await.unwrap(), result.transfer);
    }

    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}
