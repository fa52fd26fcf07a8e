//! Integration tests for member type history reads.

#![allow(clippy::uninlined_format_args)]

mod common;

use chrono::{Duration, TimeZone, Utc};
use coopbank_core::savings::MemberTypeHistorySource;
use coopbank_db::MemberRepository;
use coopbank_db::entities::member_type_histories;
use coopbank_shared::types::{BranchId, MemberProfileId, MemberTypeId, OrganizationId, Scope};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use uuid::Uuid;

#[tokio::test]
async fn test_member_type_since_reads_latest_change() {
    let db = match common::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {}", e);
            return;
        }
    };
    let scope = Scope::new(OrganizationId::new(), BranchId::new());
    let org = scope.organization_id.into_inner();
    let branch = scope.branch_id.into_inner();
    let member = match common::create_member(&db, org, branch).await {
        Ok(member) => member,
        Err(e) => {
            eprintln!("Skipping test - setup failed: {}", e);
            return;
        }
    };
    let member_type = MemberTypeId::new();
    let first = Utc.with_ymd_and_hms(2017, 3, 9, 8, 0, 0).unwrap();
    let again = first + Duration::days(400);

    for created_at in [first, again] {
        member_type_histories::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(org),
            branch_id: Set(branch),
            member_profile_id: Set(member),
            member_type_id: Set(member_type.into_inner()),
            created_at: Set(created_at.into()),
        }
        .insert(&db)
        .await
        .expect("insert member type history");
    }

    let repo = MemberRepository::new(db.clone());
    let member_id = MemberProfileId::from_uuid(member);
    let since = repo
        .member_type_since(scope, member_id, member_type)
        .await
        .expect("query");
    assert_eq!(since, Some(again.date_naive()));

    let other_type = repo
        .member_type_since(scope, member_id, MemberTypeId::new())
        .await
        .expect("query");
    assert!(other_type.is_none());
}
