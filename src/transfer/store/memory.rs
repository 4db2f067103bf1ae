//! In-Memory Ledger Store
//!
//! Test double with the semantics the coordinator relies on:
//! - row locks held until commit/rollback, blocking other transactions
//! - a lock wait timeout reported as a conflict (like `lock_timeout`)
//! - foreign key checks on transfers and entries
//! - staged writes that become visible atomically on commit
//! - rollback on drop
//!
//! Fault injection hooks drive the retry and failure paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use super::{LedgerStore, LedgerTx};
use crate::account::{Account, AccountId, CreateAccountParams, ListAccountsParams};
use crate::transfer::error::StoreError;
use crate::transfer::types::{Entry, Transfer, TransferId};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
    next_account_id: i64,
    next_transfer_id: i64,
    next_entry_id: i64,
}

impl Tables {
    fn alloc(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Default)]
struct Faults {
    /// Remaining balance updates that fail as deadlock victims
    conflicts: u32,
    unavailable: bool,
    fail_commit: Option<StoreError>,
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<AccountId, Arc<RowLock<()>>>>,
    faults: Mutex<Faults>,
    lock_log: Mutex<Vec<AccountId>>,
    lock_timeout: Duration,
    /// Pause after each granted row lock, widening race windows in tests
    lock_delay: Mutex<Duration>,
    begun: AtomicUsize,
    committed: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory ledger store
#[derive(Clone)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Store whose row lock waits give up after `lock_timeout`
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Mutex::new(Faults::default()),
                lock_log: Mutex::new(Vec::new()),
                lock_timeout,
                lock_delay: Mutex::new(Duration::ZERO),
                begun: AtomicUsize::new(0),
                committed: AtomicUsize::new(0),
            }),
        }
    }

    /// Make the next `n` balance updates fail with a deadlock conflict
    pub fn inject_conflicts(&self, n: u32) {
        lock(&self.inner.faults).conflicts = n;
    }

    /// Make `begin` and reads fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.inner.faults).unavailable = unavailable;
    }

    /// Make the next commit fail with `err`
    pub fn fail_next_commit(&self, err: StoreError) {
        lock(&self.inner.faults).fail_commit = Some(err);
    }

    /// Hold each newly granted row lock for `delay` before continuing
    pub fn set_lock_delay(&self, delay: Duration) {
        *lock(&self.inner.lock_delay) = delay;
    }

    /// Account ids in the order row locks were granted
    pub fn lock_log(&self) -> Vec<AccountId> {
        lock(&self.inner.lock_log).clone()
    }

    pub fn clear_lock_log(&self) {
        lock(&self.inner.lock_log).clear();
    }

    pub fn transfer_count(&self) -> usize {
        lock(&self.inner.tables).transfers.len()
    }

    pub fn entry_count(&self) -> usize {
        lock(&self.inner.tables).entries.len()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        lock(&self.inner.tables).transfers.clone()
    }

    pub fn entries(&self) -> Vec<Entry> {
        lock(&self.inner.tables).entries.clone()
    }

    /// Sum of all committed balances
    pub fn total_balance(&self) -> i64 {
        lock(&self.inner.tables)
            .accounts
            .values()
            .map(|a| a.balance)
            .sum()
    }

    /// Transactions opened so far
    pub fn begun_count(&self) -> usize {
        self.inner.begun.load(Ordering::SeqCst)
    }

    /// Transactions committed so far
    pub fn committed_count(&self) -> usize {
        self.inner.committed.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if lock(&self.inner.faults).unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    fn name(&self) -> &'static str {
        "Memory"
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        self.check_available()?;
        self.inner.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            guards: HashMap::new(),
            balance_deltas: HashMap::new(),
            transfers: Vec::new(),
            entries: Vec::new(),
        }))
    }

    async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, StoreError> {
        self.check_available()?;
        let mut tables = lock(&self.inner.tables);
        let id = Tables::alloc(&mut tables.next_account_id);
        let account = Account {
            id,
            owner: params.owner.clone(),
            balance: params.balance,
            currency: params.currency,
            created_at: Utc::now(),
        };
        tables.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.check_available()?;
        lock(&self.inner.tables)
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_accounts(
        &self,
        params: &ListAccountsParams,
    ) -> Result<Vec<Account>, StoreError> {
        self.check_available()?;
        let tables = lock(&self.inner.tables);
        let rows = tables
            .accounts
            .values()
            .filter(|a| params.owner.as_deref().is_none_or(|o| a.owner == o))
            .skip(params.offset.max(0) as usize)
            .take(params.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, StoreError> {
        self.check_available()?;
        lock(&self.inner.tables)
            .transfers
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_entries(&self, account_id: AccountId) -> Result<Vec<Entry>, StoreError> {
        self.check_available()?;
        let entries = lock(&self.inner.tables)
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        Ok(entries)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

/// Open in-memory transaction
///
/// Row guards and staged writes are plain fields: dropping the value releases
/// the locks and discards the writes.
pub struct MemoryTx {
    inner: Arc<Inner>,
    guards: HashMap<AccountId, OwnedMutexGuard<()>>,
    balance_deltas: HashMap<AccountId, i64>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
}

impl MemoryTx {
    fn committed_account(&self, id: AccountId) -> Result<Account, StoreError> {
        lock(&self.inner.tables)
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Committed row plus this transaction's own staged delta
    fn visible_account(&self, id: AccountId) -> Result<Account, StoreError> {
        let mut account = self.committed_account(id)?;
        let staged = self.balance_deltas.get(&id).copied().unwrap_or(0);
        account.balance = checked_balance(id, account.balance, staged)?;
        Ok(account)
    }

    async fn lock_row(&mut self, id: AccountId) -> Result<(), StoreError> {
        if self.guards.contains_key(&id) {
            return Ok(());
        }

        let row_lock = lock(&self.inner.row_locks)
            .entry(id)
            .or_insert_with(|| Arc::new(RowLock::new(())))
            .clone();

        let guard = tokio::time::timeout(self.inner.lock_timeout, row_lock.lock_owned())
            .await
            .map_err(|_| {
                debug!(account_id = id, "Row lock wait timed out");
                StoreError::Conflict(format!("lock wait timeout on account {id}"))
            })?;

        lock(&self.inner.lock_log).push(id);
        self.guards.insert(id, guard);

        // Give other transactions a chance to run while the row is held
        let delay = *lock(&self.inner.lock_delay);
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn check_account_exists(&self, id: AccountId, table: &str) -> Result<(), StoreError> {
        if lock(&self.inner.tables).accounts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ConstraintViolation(format!(
                "insert on table \"{table}\" violates foreign key constraint: account {id} does not exist"
            )))
        }
    }

    fn take_injected_conflict(&self) -> bool {
        let mut faults = lock(&self.inner.faults);
        if faults.conflicts > 0 {
            faults.conflicts -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn get_account_for_update(&mut self, id: AccountId) -> Result<Account, StoreError> {
        self.committed_account(id)?;
        self.lock_row(id).await?;
        self.visible_account(id)
    }

    async fn add_account_balance(
        &mut self,
        id: AccountId,
        delta: i64,
    ) -> Result<Account, StoreError> {
        let committed = self.committed_account(id)?;
        self.lock_row(id).await?;
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict("deadlock detected".to_string()));
        }
        let staged = self.balance_deltas.get(&id).copied().unwrap_or(0);
        let next = checked_balance(id, staged, delta)?;
        checked_balance(id, committed.balance, next)?;
        self.balance_deltas.insert(id, next);
        self.visible_account(id)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        self.check_account_exists(from_account_id, "transfers")?;
        self.check_account_exists(to_account_id, "transfers")?;
        if amount <= 0 {
            return Err(StoreError::ConstraintViolation(
                "transfers_amount_check".to_string(),
            ));
        }

        let id = Tables::alloc(&mut lock(&self.inner.tables).next_transfer_id);
        let transfer = Transfer {
            id,
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<Entry, StoreError> {
        self.check_account_exists(account_id, "entries")?;

        let id = Tables::alloc(&mut lock(&self.inner.tables).next_entry_id);
        let entry = Entry {
            id,
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if let Some(err) = lock(&self.inner.faults).fail_commit.take() {
            return Err(err);
        }

        let mut this = *self;
        {
            let mut tables = lock(&this.inner.tables);
            // Every new balance is checked before any row changes
            let mut balances = Vec::with_capacity(this.balance_deltas.len());
            for (&id, &delta) in &this.balance_deltas {
                if let Some(account) = tables.accounts.get(&id) {
                    balances.push((id, checked_balance(id, account.balance, delta)?));
                }
            }
            for (id, balance) in balances {
                if let Some(account) = tables.accounts.get_mut(&id) {
                    account.balance = balance;
                }
            }
            tables.transfers.append(&mut this.transfers);
            tables.entries.append(&mut this.entries);
        }
        this.inner.committed.fetch_add(1, Ordering::SeqCst);
        // Row guards drop here, after the writes are visible
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// `balance + delta` for account `id`, or the error PostgreSQL raises for `BIGINT`
fn checked_balance(id: AccountId, balance: i64, delta: i64) -> Result<i64, StoreError> {
    balance
        .checked_add(delta)
        .ok_or_else(|| StoreError::OutOfRange(format!("bigint out of range for account {id}")))
}
