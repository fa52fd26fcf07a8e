//! `SeaORM` entity definitions.
//!
//! Enumerations are stored as their text labels and configuration
//! snapshots as JSONB, so the core types stay the single source of truth.

pub mod account_configurations;
pub mod account_histories;
pub mod general_ledger_entries;
pub mod generated_savings_interest_entries;
pub mod generated_savings_interests;
pub mod member_accounting_ledgers;
pub mod member_profiles;
pub mod member_type_histories;

pub mod prelude {
    //! Entity re-exports.

    pub use super::account_configurations::Entity as AccountConfigurations;
    pub use super::account_histories::Entity as AccountHistories;
    pub use super::general_ledger_entries::Entity as GeneralLedgerEntries;
    pub use super::generated_savings_interest_entries::Entity as GeneratedSavingsInterestEntries;
    pub use super::generated_savings_interests::Entity as GeneratedSavingsInterests;
    pub use super::member_accounting_ledgers::Entity as MemberAccountingLedgers;
    pub use super::member_profiles::Entity as MemberProfiles;
    pub use super::member_type_histories::Entity as MemberTypeHistories;
}
