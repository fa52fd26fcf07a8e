//! Savings interest dry run.
//!
//! Computes a savings interest batch for one branch without storing it and
//! prints the result as JSON.
//!
//! Usage:
//!   interest-preview <organization_id> <branch_id> <last_date> <new_date> [computation_type] [tax_rate]
//!
//! Dates are `YYYY-MM-DD`. The computation type defaults to
//! `average_daily_balance` and the withholding tax rate to `0`.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use coopbank_core::ActorContext;
use coopbank_core::events::TracingEventSink;
use coopbank_core::history::HistoryService;
use coopbank_core::savings::{
    BatchFilter, CreateBatchParams, SavingsComputationType, SavingsInterestService,
};
use coopbank_db::{HistoryRepository, connect_with, savings_ports};
use coopbank_shared::AppConfig;
use coopbank_shared::telemetry;
use coopbank_shared::types::{BranchId, OrganizationId, Scope, UserId};
use rust_decimal::Decimal;
use tracing::info;

struct Args {
    scope: Scope,
    last: NaiveDate,
    new: NaiveDate,
    computation_type: SavingsComputationType,
    tax_rate: Decimal,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut next = |name: &str| args.next().with_context(|| format!("missing <{name}>"));

    let organization_id = OrganizationId::from_str(&next("organization_id")?)
        .context("invalid organization id")?;
    let branch_id = BranchId::from_str(&next("branch_id")?).context("invalid branch id")?;
    let last = NaiveDate::from_str(&next("last_date")?).context("invalid last date")?;
    let new = NaiveDate::from_str(&next("new_date")?).context("invalid new date")?;

    let computation_type = match next("computation_type") {
        Ok(label) => match SavingsComputationType::parse(&label) {
            Some(kind) => kind,
            None => bail!("unknown computation type {label}"),
        },
        Err(_) => SavingsComputationType::AverageDailyBalance,
    };
    let tax_rate = match next("tax_rate") {
        Ok(rate) => Decimal::from_str(&rate).context("invalid tax rate")?,
        Err(_) => Decimal::ZERO,
    };

    Ok(Args {
        scope: Scope::new(organization_id, branch_id),
        last,
        new,
        computation_type,
        tax_rate,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.logging);

    let args = parse_args(std::env::args().skip(1))?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let service = SavingsInterestService::new(
        savings_ports(&db),
        HistoryService::new(Arc::new(HistoryRepository::new(db.clone()))),
        Arc::new(TracingEventSink),
    )
    .with_config(config.interest, config.batch);

    let params = CreateBatchParams {
        document_no: "PREVIEW".to_string(),
        last_computation_date: args.last,
        new_computation_date: args.new,
        computation_type: args.computation_type,
        filter: BatchFilter::default(),
        include_existing_computed_interest: false,
        interest_tax_rate: args.tax_rate,
    };
    let actor = ActorContext::new(UserId::new(), args.scope);

    let computation = service.preview(&actor, &params).await?;
    info!(
        entries = computation.entries.len(),
        skipped = computation.skipped.len(),
        total_interest = %computation.total_interest,
        "Preview computed"
    );

    println!("{}", serde_json::to_string_pretty(&computation)?);
    Ok(())
}
