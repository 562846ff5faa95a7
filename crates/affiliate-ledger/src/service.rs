//! # Ledger Service
//!
//! Runs operations as atomic units against the outbound ports.
//!
//! ## Unit of Work
//!
//! 1. Load the committed state and clone it.
//! 2. Run the operation on the clone through a [`Ledger`].
//! 3. Commit the clone.
//! 4. Execute the scheduled transfers as one batch. If the batch fails the
//!    previous state is committed back and the operation is rejected.
//!
//! Units are serialized by a single gate, so every operation sees the state
//! left by the previous one.

use crate::adapters::{InMemoryChain, InMemoryStateStore};
use crate::config::LedgerConfig;
use crate::domain::effects::Outcome;
use crate::domain::entities::{Application, License, Partner};
use crate::domain::ledger::{ActionContext, Ledger};
use crate::domain::state::LedgerState;
use crate::domain::value_objects::LicenseId;
use crate::errors::LedgerResult;
use crate::ports::inbound::{Action, LedgerApi, Receipt};
use crate::ports::outbound::{ChainHost, StateStore, TimeSource, TransferExecutor};

use async_trait::async_trait;
use shared_types::{AccountName, Asset, Authority, TransferNotice, TransferRequest};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Statistics for the ledger service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Units committed.
    pub committed: u64,
    /// Units rejected, for any reason.
    pub rejected: u64,
    /// Transfers executed through the treasury.
    pub transfers_executed: u64,
    /// Transfer notices handled (including relayed transfers).
    pub notices_handled: u64,
}

/// The main ledger service.
pub struct LedgerService {
    config: LedgerConfig,
    store: Arc<dyn StateStore>,
    chain: Arc<dyn ChainHost>,
    treasury: Arc<dyn TransferExecutor>,
    clock: Arc<dyn TimeSource>,
    /// Serializes units of work.
    gate: Mutex<()>,
    stats: RwLock<ServiceStats>,
}

impl LedgerService {
    pub fn new(
        config: LedgerConfig,
        store: Arc<dyn StateStore>,
        chain: Arc<dyn ChainHost>,
        treasury: Arc<dyn TransferExecutor>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            store,
            chain,
            treasury,
            clock,
            gate: Mutex::new(()),
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Service over an in-memory store, with `chain` as both host and treasury.
    pub fn in_memory(
        config: LedgerConfig,
        chain: Arc<InMemoryChain>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryStateStore::new()),
            chain.clone(),
            chain,
            clock,
        )
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Runs one unit of work.
    ///
    /// `leading` transfers are executed ahead of the ones the operation
    /// schedules, in the same batch.
    #[instrument(skip_all, fields(correlation_id = %correlation_id, action = name))]
    async fn run<F>(
        &self,
        correlation_id: Uuid,
        name: &'static str,
        signers: BTreeSet<Authority>,
        leading: Vec<TransferRequest>,
        op: F,
    ) -> LedgerResult<Receipt>
    where
        F: for<'a> FnOnce(Ledger<'a>) -> LedgerResult<Outcome> + Send,
    {
        let started = Instant::now();
        let _gate = self.gate.lock().await;

        let result = self.execute_unit(signers, leading, op).await;

        match result {
            Ok((outcome, state)) => {
                let transfers = outcome.transfers().len();
                {
                    let mut stats = self.stats.write().await;
                    stats.committed += 1;
                    stats.transfers_executed += transfers as u64;
                }
                #[cfg(feature = "metrics")]
                {
                    use ledger_telemetry::metrics;
                    metrics::record_committed(name, started.elapsed().as_secs_f64());
                    metrics::record_transfers(transfers);
                    metrics::record_state(
                        state.config.as_ref().map_or(0, |c| c.locked.amount),
                        state.partners.len(),
                        state.applications.len(),
                    );
                }
                #[cfg(not(feature = "metrics"))]
                let _ = &state;

                for recipient in outcome.recipients() {
                    debug!(%recipient, "notified");
                }
                info!(
                    created = ?outcome.created,
                    transfers,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "action committed"
                );
                Ok(Receipt {
                    correlation_id,
                    action: name.to_string(),
                    created: outcome.created,
                    effects: outcome.effects,
                })
            }
            Err(e) => {
                self.stats.write().await.rejected += 1;
                #[cfg(feature = "metrics")]
                ledger_telemetry::metrics::record_rejected(name, e.class().as_str());
                warn!(error = %e, class = e.class().as_str(), "action rejected");
                Err(e)
            }
        }
    }

    async fn execute_unit<F>(
        &self,
        signers: BTreeSet<Authority>,
        leading: Vec<TransferRequest>,
        op: F,
    ) -> LedgerResult<(Outcome, LedgerState)>
    where
        F: for<'a> FnOnce(Ledger<'a>) -> LedgerResult<Outcome> + Send,
    {
        let committed = self.store.load().await?;
        let mut working = committed.clone();
        let ctx = ActionContext::new(signers, self.clock.now());

        let outcome = op(Ledger::new(
            &mut working,
            &self.config,
            self.chain.as_ref(),
            &ctx,
        ))?;

        let mut batch = leading;
        batch.extend(outcome.transfers());

        self.store.commit(&working).await?;
        if !batch.is_empty() {
            if let Err(e) = self.treasury.execute_batch(&batch).await {
                if let Err(restore) = self.store.commit(&committed).await {
                    error!(error = %restore, "failed to restore state after treasury failure");
                    return Err(restore.into());
                }
                return Err(e.into());
            }
        }
        Ok((outcome, working))
    }
}

#[async_trait]
impl LedgerApi for LedgerService {
    async fn submit(&self, signers: BTreeSet<Authority>, action: Action) -> LedgerResult<Receipt> {
        let name = action.name();
        self.run(Uuid::new_v4(), name, signers, Vec::new(), move |ledger| {
            ledger.execute(action)
        })
        .await
    }

    async fn on_transfer(&self, notice: TransferNotice) -> LedgerResult<Receipt> {
        self.stats.write().await.notices_handled += 1;
        self.run(
            Uuid::new_v4(),
            "transfer_notice",
            BTreeSet::new(),
            Vec::new(),
            move |ledger| ledger.on_transfer(&notice),
        )
        .await
    }

    async fn transfer(
        &self,
        signers: BTreeSet<Authority>,
        request: TransferRequest,
    ) -> LedgerResult<Receipt> {
        self.stats.write().await.notices_handled += 1;
        let leading = vec![request.clone()];
        self.run(
            Uuid::new_v4(),
            "transfer",
            signers,
            leading,
            move |ledger| ledger.relay_transfer(request),
        )
        .await
    }

    async fn snapshot(&self) -> LedgerResult<LedgerState> {
        Ok(self.store.load().await?)
    }

    async fn license(&self, id: LicenseId) -> LedgerResult<Option<License>> {
        Ok(self.store.load().await?.licenses.get(id).cloned())
    }

    async fn partner(&self, account: &AccountName) -> LedgerResult<Option<Partner>> {
        Ok(self
            .store
            .load()
            .await?
            .partners
            .find_by_primary(account)
            .cloned())
    }

    async fn application(&self, owner: &AccountName) -> LedgerResult<Option<Application>> {
        Ok(self
            .store
            .load()
            .await?
            .applications
            .find_by_owner(owner)
            .cloned())
    }

    async fn locked(&self) -> LedgerResult<Option<Asset>> {
        Ok(self.store.load().await?.config.map(|c| c.locked))
    }
}
