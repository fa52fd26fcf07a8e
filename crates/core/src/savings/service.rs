//! Savings interest batch operations.
//!
//! Computation reads configuration and balances through the ports, then
//! hands everything to the pure engine. Posting applies each entry in its
//! own unit of work, in global lock order.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use coopbank_shared::config::{BatchConfig, InterestConfig};
use coopbank_shared::types::{DecimalOps, SavingsInterestBatchId, Scope, UserId};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use super::engine::{BatchComputation, PairInput, SavingsInterestBatchEngine};
use super::error::SavingsError;
use super::lifecycle::{BatchAction, BatchLifecycle};
use super::posting::{PairFailure, PostingReport, PostingStore, posting_lines};
use super::store::{BatchStore, BatchTotals, EligibilitySource, MemberTypeHistorySource};
use super::types::{
    BatchStatus, CreateBatchParams, EligiblePair, PostParams, SavingsInterestBatch,
    SavingsInterestEntry,
};
use crate::actor::ActorContext;
use crate::balance::{DailyBalanceReconstructor, LedgerDeltaSource};
use crate::events::{DomainEvent, EntityKind, EventAction, EventSink, Mutation};
use crate::guard::ConcurrencyGuard;
use crate::history::{HistoryError, HistoryService};
use crate::ledger::{JournalPosting, LedgerKey, MemberLedger, PostingSource, validate_lines};

/// The storage ports a savings service runs against.
#[derive(Clone)]
pub struct SavingsPorts {
    /// Batch persistence.
    pub batches: Arc<dyn BatchStore>,
    /// Eligible pair listing.
    pub eligibility: Arc<dyn EligibilitySource>,
    /// Ledger movements for balance reconstruction.
    pub deltas: Arc<dyn LedgerDeltaSource>,
    /// Member type history for year and date rate tiers.
    pub member_types: Arc<dyn MemberTypeHistorySource>,
    /// Per-pair posting transactions.
    pub postings: Arc<dyn PostingStore>,
}

/// Outcome of a post run.
#[derive(Debug, Clone)]
pub struct PostOutcome {
    /// The batch as stored after the run.
    pub batch: SavingsInterestBatch,
    /// Per-pair results.
    pub report: PostingReport,
}

/// Per-pair inputs for one computation.
#[derive(Default)]
struct Gathered {
    inputs: Vec<PairInput>,
    /// Pairs whose account had no configuration when the period closed.
    unconfigured: Vec<LedgerKey>,
}

/// Computes, prints and posts savings interest batches.
#[derive(Clone)]
pub struct SavingsInterestService {
    ports: SavingsPorts,
    history: HistoryService,
    events: Arc<dyn EventSink>,
    interest: InterestConfig,
    batch: BatchConfig,
}

impl SavingsInterestService {
    /// Creates the service with default interest and batch settings.
    #[must_use]
    pub fn new(ports: SavingsPorts, history: HistoryService, events: Arc<dyn EventSink>) -> Self {
        Self {
            ports,
            history,
            events,
            interest: InterestConfig::default(),
            batch: BatchConfig::default(),
        }
    }

    /// Replaces the interest and batch settings.
    #[must_use]
    pub fn with_config(mut self, interest: InterestConfig, batch: BatchConfig) -> Self {
        self.interest = interest;
        self.batch = batch;
        self
    }

    /// Loads a batch in the actor's scope.
    ///
    /// # Errors
    ///
    /// * `SavingsError::NotFound` if no such batch exists
    /// * `SavingsError::ScopeMismatch` if it belongs to another scope
    pub async fn get(
        &self,
        actor: &ActorContext,
        id: SavingsInterestBatchId,
    ) -> Result<SavingsInterestBatch, SavingsError> {
        let batch = self.load(id).await?;
        Self::ensure_scope(actor, &batch)?;
        Ok(batch)
    }

    /// Computes entries and totals without persisting anything.
    ///
    /// # Errors
    ///
    /// * `SavingsError::InvalidParams` if `params` fail validation
    /// * Any error raised while gathering inputs
    #[instrument(skip_all, fields(document_no = %params.document_no, user_id = %actor.user_id))]
    pub async fn preview(
        &self,
        actor: &ActorContext,
        params: &CreateBatchParams,
    ) -> Result<BatchComputation, SavingsError> {
        Self::validate(params)?;
        let gathered = self.gather(actor.scope, params, &BTreeSet::new()).await?;
        let computation = SavingsInterestBatchEngine::compute(
            SavingsInterestBatchId::new(),
            params,
            &gathered.inputs,
            &self.interest,
        )?;
        Ok(computation.with_skipped(gathered.unconfigured))
    }

    /// Computes and stores a Draft batch.
    ///
    /// # Errors
    ///
    /// * `SavingsError::InvalidParams` if `params` fail validation
    /// * `SavingsError::Balance` or `SavingsError::History` if inputs could
    ///   not be gathered; nothing is stored
    #[instrument(skip_all, fields(document_no = %params.document_no, user_id = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &ActorContext,
        params: CreateBatchParams,
    ) -> Result<Mutation<SavingsInterestBatch>, SavingsError> {
        Self::validate(&params)?;
        let id = SavingsInterestBatchId::new();
        let gathered = self.gather(actor.scope, &params, &BTreeSet::new()).await?;
        let computation =
            SavingsInterestBatchEngine::compute(id, &params, &gathered.inputs, &self.interest)?
                .with_skipped(gathered.unconfigured);

        let now = Utc::now();
        let batch = SavingsInterestBatch {
            id,
            scope: actor.scope,
            params,
            status: BatchStatus::Draft,
            total_interest: computation.total_interest,
            total_tax: computation.total_tax,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
            printed: None,
            posted: None,
            entries: computation.entries,
        };
        self.ports.batches.insert(&batch).await?;

        info!(
            batch_id = %id,
            entries = batch.entries.len(),
            skipped = computation.skipped.len(),
            total_interest = %batch.total_interest,
            "savings interest batch created"
        );
        Ok(self.publish(batch, EventAction::Create, actor, now))
    }

    /// Recomputes a Draft batch.
    ///
    /// With `include_existing_computed_interest` the entries already in the
    /// batch are kept and only pairs without one are computed. Otherwise
    /// every pair is recomputed.
    ///
    /// # Errors
    ///
    /// * `SavingsError::InvalidState` unless the batch is Draft
    /// * `SavingsError::ConcurrentTransition` if it was printed meanwhile
    #[instrument(skip_all, fields(batch_id = %id, user_id = %actor.user_id))]
    pub async fn recompute(
        &self,
        actor: &ActorContext,
        id: SavingsInterestBatchId,
    ) -> Result<Mutation<SavingsInterestBatch>, SavingsError> {
        let batch = self.get(actor, id).await?;
        BatchLifecycle::ensure_draft(batch.status)?;

        let kept: Vec<SavingsInterestEntry> = if batch.params.include_existing_computed_interest {
            batch.entries.clone()
        } else {
            Vec::new()
        };
        let exclude: BTreeSet<LedgerKey> = kept.iter().map(|entry| entry.key).collect();
        let gathered = self.gather(batch.scope, &batch.params, &exclude).await?;
        let computation = SavingsInterestBatchEngine::compute(
            id,
            &batch.params,
            &gathered.inputs,
            &self.interest,
        )?;

        let mut entries = kept;
        entries.extend(computation.entries);
        ConcurrencyGuard::lock_order(&mut entries, |entry| entry.key);
        let totals = Self::totals(&entries)?;

        let now = Utc::now();
        if !self
            .ports
            .batches
            .replace_entries(id, &entries, totals, now)
            .await?
        {
            warn!("batch left draft during recompute");
            return Err(SavingsError::ConcurrentTransition(id));
        }

        info!(entries = entries.len(), total_interest = %totals.total_interest, "batch recomputed");
        let batch = SavingsInterestBatch {
            total_interest: totals.total_interest,
            total_tax: totals.total_tax,
            updated_at: now,
            entries,
            ..batch
        };
        Ok(self.publish(batch, EventAction::Update, actor, now))
    }

    /// Freezes a Draft batch.
    ///
    /// # Errors
    ///
    /// * `SavingsError::InvalidState` unless the batch is Draft
    /// * `SavingsError::ConcurrentTransition` if its status changed meanwhile
    #[instrument(skip_all, fields(batch_id = %id, user_id = %actor.user_id))]
    pub async fn print(
        &self,
        actor: &ActorContext,
        id: SavingsInterestBatchId,
    ) -> Result<Mutation<SavingsInterestBatch>, SavingsError> {
        let batch = self.get(actor, id).await?;
        let now = Utc::now();
        let action = BatchLifecycle::print(batch.status, actor.user_id, now)?;
        self.transition(id, &action).await?;

        info!("batch printed");
        let batch = Self::applied(batch, action);
        Ok(self.publish(batch, EventAction::Print, actor, now))
    }

    /// Posts a Printed batch to member ledgers and the general ledger.
    ///
    /// Each unposted entry runs in its own unit of work, in `(account,
    /// member)` order. The batch becomes Posted only when every entry is
    /// posted; otherwise it stays Printed, the report lists the failed
    /// pairs, and a later call posts only what is left.
    ///
    /// # Errors
    ///
    /// * `SavingsError::InvalidState` unless the batch is Printed; a Posted
    ///   batch is rejected before any ledger is touched
    /// * `SavingsError::ConcurrentTransition` if the final status write lost
    ///   a race
    #[instrument(skip_all, fields(batch_id = %id, user_id = %actor.user_id))]
    pub async fn post(
        &self,
        actor: &ActorContext,
        id: SavingsInterestBatchId,
        params: PostParams,
    ) -> Result<Mutation<PostOutcome>, SavingsError> {
        let batch = self.get(actor, id).await?;
        let now = Utc::now();
        let action = BatchLifecycle::post(
            batch.status,
            actor.user_id,
            &params,
            batch.params.new_computation_date,
            now,
        )?;
        let entry_date = params
            .entry_date
            .unwrap_or(batch.params.new_computation_date);

        let mut pending = batch.entries.clone();
        ConcurrencyGuard::lock_order(&mut pending, |entry| entry.key);

        let mut report = PostingReport::default();
        for entry in &pending {
            if entry.posted_at.is_some() {
                report.skipped += 1;
                continue;
            }
            match self
                .post_entry(&batch, entry, &params, entry_date, actor.user_id)
                .await
            {
                Ok(true) => report.posted += 1,
                Ok(false) => {
                    debug!(pair = %entry.key, "entry already posted");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(pair = %entry.key, error = %err, "entry posting failed");
                    report.failures.push(PairFailure {
                        key: entry.key,
                        error_code: err.error_code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let mut events = Vec::new();
        if report.is_complete() {
            self.transition(id, &action).await?;
            events.push(DomainEvent::new(
                EventAction::Post,
                EntityKind::SavingsInterestBatch,
                id.into_inner(),
                batch.scope,
                actor.user_id,
                now,
            ));
            info!(posted = report.posted, skipped = report.skipped, "batch posted");
        } else {
            warn!(
                posted = report.posted,
                failed = report.failures.len(),
                "batch partially posted"
            );
        }

        let batch = self.load(id).await?;
        for event in &events {
            self.events.publish(event);
        }
        Ok(Mutation {
            value: PostOutcome { batch, report },
            events,
        })
    }

    /// Posts one entry in its own unit of work.
    ///
    /// Returns `false` if the entry was claimed by another run.
    async fn post_entry(
        &self,
        batch: &SavingsInterestBatch,
        entry: &SavingsInterestEntry,
        params: &PostParams,
        entry_date: NaiveDate,
        posted_by: UserId,
    ) -> Result<bool, SavingsError> {
        let lines = posting_lines(entry, params.post_account_id);
        validate_lines(&lines)?;

        let mut unit = self.ports.postings.begin().await?;
        let expected = entry
            .ledger_id
            .map(|ledger_id| MemberLedger::identity_of(entry.key.scope, ledger_id));
        let current: Option<MemberLedger> =
            ConcurrencyGuard::lock_matching(&mut *unit, &entry.key, expected.as_ref()).await?;

        let now = Utc::now();
        if !unit.claim_entry(entry.id, now).await? {
            return Ok(false);
        }

        let mut ledger = current.unwrap_or_else(|| MemberLedger::open(entry.key, now));
        ledger.apply_interest(entry.interest_amount, entry.interest_tax, now)?;
        unit.save_ledger(&ledger).await?;
        unit.append_posting(&JournalPosting {
            scope: batch.scope,
            entry_date,
            source: PostingSource::SavingsInterest,
            reference_id: batch.id.into_inner(),
            check_voucher_number: params.check_voucher_number.clone(),
            posted_by,
            lines,
        })
        .await?;
        unit.commit().await?;
        Ok(true)
    }

    /// Builds one input per eligible pair not in `exclude`.
    ///
    /// Configuration is resolved as of the start of `new_computation_date`,
    /// the instant the period closes. A pair whose account has no history by
    /// then was opened after the period and is set aside as unconfigured.
    /// Fetches run concurrently up to the configured limit; any other failure
    /// aborts the whole gather.
    async fn gather(
        &self,
        scope: Scope,
        params: &CreateBatchParams,
        exclude: &BTreeSet<LedgerKey>,
    ) -> Result<Gathered, SavingsError> {
        let pairs: Vec<EligiblePair> = self
            .ports
            .eligibility
            .eligible_pairs(scope, &params.filter)
            .await?
            .into_iter()
            .filter(|pair| pair.key.scope == scope && params.filter.admits(pair))
            .filter(|pair| !exclude.contains(&pair.key))
            .collect();
        debug!(pairs = pairs.len(), "eligible pairs");

        let from = params.last_computation_date;
        let to = params.new_computation_date;
        let as_of = Self::period_close(to);
        let history = &self.history;
        let source: &dyn LedgerDeltaSource = self.ports.deltas.as_ref();
        let member_types: &dyn MemberTypeHistorySource = self.ports.member_types.as_ref();

        let fetched: Vec<Result<PairInput, LedgerKey>> = stream::iter(pairs)
            .map(move |pair| async move {
                let config = match history
                    .configuration_as_of(pair.key.account_id, as_of)
                    .await
                {
                    Ok(config) => config,
                    Err(HistoryError::NotFound { .. }) => return Ok(Err(pair.key)),
                    Err(err) => return Err(SavingsError::History(err)),
                };
                let member_since = match pair.member_type_id {
                    Some(member_type_id) if config.savings.needs_member_since() => {
                        member_types
                            .member_type_since(
                                pair.key.scope,
                                pair.key.member_profile_id,
                                member_type_id,
                            )
                            .await?
                    }
                    _ => None,
                };
                let series =
                    DailyBalanceReconstructor::reconstruct(source, &pair.key, from, to).await?;
                Ok::<_, SavingsError>(Ok(PairInput {
                    pair,
                    config,
                    member_since,
                    series,
                }))
            })
            .buffer_unordered(self.batch.fetch_concurrency.max(1))
            .try_collect()
            .await?;

        let mut gathered = Gathered::default();
        for outcome in fetched {
            match outcome {
                Ok(input) => gathered.inputs.push(input),
                Err(key) => gathered.unconfigured.push(key),
            }
        }
        if !gathered.unconfigured.is_empty() {
            debug!(
                unconfigured = gathered.unconfigured.len(),
                "pairs without configuration at period close"
            );
        }
        Ok(gathered)
    }

    async fn load(&self, id: SavingsInterestBatchId) -> Result<SavingsInterestBatch, SavingsError> {
        self.ports
            .batches
            .find(id)
            .await?
            .ok_or(SavingsError::NotFound(id))
    }

    async fn transition(
        &self,
        id: SavingsInterestBatchId,
        action: &BatchAction,
    ) -> Result<(), SavingsError> {
        if self
            .ports
            .batches
            .transition(id, action.from_status(), action)
            .await?
        {
            Ok(())
        } else {
            Err(SavingsError::ConcurrentTransition(id))
        }
    }

    fn applied(batch: SavingsInterestBatch, action: BatchAction) -> SavingsInterestBatch {
        match action {
            BatchAction::Print { new_status, stamp } => SavingsInterestBatch {
                status: new_status,
                printed: Some(stamp),
                ..batch
            },
            BatchAction::Post { new_status, stamp } => SavingsInterestBatch {
                status: new_status,
                posted: Some(stamp),
                ..batch
            },
        }
    }

    fn validate(params: &CreateBatchParams) -> Result<(), SavingsError> {
        params
            .validate()
            .map_err(|e| SavingsError::InvalidParams(e.to_string()))
    }

    fn ensure_scope(actor: &ActorContext, batch: &SavingsInterestBatch) -> Result<(), SavingsError> {
        if batch.scope == actor.scope {
            Ok(())
        } else {
            Err(SavingsError::ScopeMismatch {
                batch: batch.scope,
                actor: actor.scope,
            })
        }
    }

    fn totals(entries: &[SavingsInterestEntry]) -> Result<BatchTotals, SavingsError> {
        Ok(BatchTotals {
            total_interest: DecimalOps::sum(entries.iter().map(|e| e.interest_amount))?,
            total_tax: DecimalOps::sum(entries.iter().map(|e| e.interest_tax))?,
        })
    }

    fn period_close(date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::MIN).and_utc()
    }

    fn publish(
        &self,
        batch: SavingsInterestBatch,
        action: EventAction,
        actor: &ActorContext,
        at: DateTime<Utc>,
    ) -> Mutation<SavingsInterestBatch> {
        let event = DomainEvent::new(
            action,
            EntityKind::SavingsInterestBatch,
            batch.id.into_inner(),
            batch.scope,
            actor.user_id,
            at,
        );
        self.events.publish(&event);
        Mutation::with_event(batch, event)
    }
}
