//! End-to-end behaviour of the segment services over in-memory storage.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};

use segments::domain::{
    ChangeFailure, ChangeOperation, ErrorCode, MembershipChange, MembershipChangeConfig,
    RolloutPercentage, SegmentGrant, SegmentSlug, UserId,
};
use segments::services::{SegmentServices, StorageHandles};
use segments::test_support::clock::MutableClock;

struct Harness {
    services: SegmentServices,
    clock: Arc<MutableClock>,
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::at_fixed_instant());
    let services = SegmentServices::new(
        StorageHandles::in_memory(),
        MembershipChangeConfig::default(),
        Duration::from_secs(5),
        clock.clone(),
    );
    Harness { services, clock }
}

fn slug(raw: &str) -> SegmentSlug {
    SegmentSlug::new(raw).expect("valid slug")
}

fn percentage(value: f64) -> RolloutPercentage {
    RolloutPercentage::new(value).expect("valid percentage")
}

async fn register_users(services: &SegmentServices, ids: impl IntoIterator<Item = u64>) {
    for id in ids {
        services
            .users
            .create_user(UserId::new(id))
            .await
            .expect("user registers");
    }
}

async fn create_segment(services: &SegmentServices, raw: &str) -> SegmentSlug {
    let slug = slug(raw);
    services
        .segments
        .create_with_rollout(&slug, percentage(0.0))
        .await
        .expect("segment creates");
    slug
}

#[rstest]
#[tokio::test]
async fn rollout_enrols_the_requested_share_of_users(harness: Harness) {
    let services = &harness.services;
    register_users(services, 1..=10).await;
    let slug = slug("AVITO_VOICE_MESSAGES");

    let enrolled = services
        .segments
        .create_with_rollout(&slug, percentage(30.0))
        .await
        .expect("rollout succeeds");

    let distinct: HashSet<UserId> = enrolled.iter().copied().collect();
    assert_eq!(enrolled.len(), 3);
    assert_eq!(distinct.len(), 3);
    for user_id in enrolled {
        assert!((1..=10).contains(&user_id.get()));
        let memberships = services
            .users
            .user_segments(user_id)
            .await
            .expect("segments list");
        assert_eq!(memberships, vec![slug.clone()]);
    }
}

#[rstest]
#[tokio::test]
async fn full_rollout_enrols_everyone(harness: Harness) {
    let services = &harness.services;
    register_users(services, 1..=4).await;

    let enrolled = services
        .segments
        .create_with_rollout(&slug("AVITO_DISCOUNT_50"), percentage(100.0))
        .await
        .expect("rollout succeeds");

    let enrolled: HashSet<u64> = enrolled.into_iter().map(UserId::get).collect();
    assert_eq!(enrolled, (1..=4).collect());
}

#[rstest]
#[tokio::test]
async fn creating_an_existing_segment_conflicts(harness: Harness) {
    let services = &harness.services;
    let slug = create_segment(services, "AVITO_PERFORMANCE_VAS").await;

    let error = services
        .segments
        .create_with_rollout(&slug, percentage(0.0))
        .await
        .expect_err("duplicate segment");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn duplicate_adds_in_one_batch_apply_once(harness: Harness) {
    let services = &harness.services;
    register_users(services, [7]).await;
    let slug = create_segment(services, "AVITO_VOICE_MESSAGES").await;

    let results = services
        .changes
        .change(vec![
            MembershipChange::add(UserId::new(7), slug.clone(), None),
            MembershipChange::add(UserId::new(7), slug.clone(), None),
        ])
        .await;

    assert_eq!(results.len(), 2);
    let successes = results.iter().filter(|result| result.is_success()).count();
    let duplicates = results
        .iter()
        .filter(|result| result.outcome == Err(ChangeFailure::AlreadyMember))
        .count();
    assert_eq!((successes, duplicates), (1, 1));
}

#[rstest]
#[tokio::test]
async fn batch_reports_each_item_independently(harness: Harness) {
    let services = &harness.services;
    register_users(services, [1]).await;
    let known = create_segment(services, "AVITO_DISCOUNT_30").await;
    let unknown = slug("AVITO_MISSING");

    let results = services
        .changes
        .change_user_segments(
            UserId::new(1),
            vec![
                SegmentGrant {
                    slug: known.clone(),
                    ttl: None,
                },
                SegmentGrant {
                    slug: unknown.clone(),
                    ttl: None,
                },
            ],
            vec![unknown],
        )
        .await
        .expect("request is well formed");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].outcome, Ok(()));
    assert_eq!(results[1].outcome, Err(ChangeFailure::SegmentNotFound));
    assert_eq!(results[2].operation, ChangeOperation::Delete);
    assert_eq!(results[2].outcome, Err(ChangeFailure::SegmentNotFound));
    let indices: Vec<usize> = results.iter().map(|result| result.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[rstest]
#[tokio::test]
async fn expired_memberships_are_swept_once(harness: Harness) {
    let Harness { services, clock } = harness;
    register_users(&services, [42]).await;
    let slug = create_segment(&services, "AVITO_VOICE_MESSAGES").await;

    let results = services
        .changes
        .change_user_segments(
            UserId::new(42),
            vec![SegmentGrant {
                slug: slug.clone(),
                ttl: Some("1d".parse().expect("valid ttl")),
            }],
            Vec::new(),
        )
        .await
        .expect("request is well formed");
    assert!(results.iter().all(|result| result.is_success()));

    assert_eq!(services.sweeper.sweep_once().await.expect("sweep"), 0);

    clock.advance_days(2);
    assert_eq!(services.sweeper.sweep_once().await.expect("sweep"), 1);
    assert_eq!(services.sweeper.sweep_once().await.expect("sweep"), 0);

    let remaining = services
        .users
        .user_segments(UserId::new(42))
        .await
        .expect("segments list");
    assert!(remaining.is_empty());

    let report = services
        .reports
        .monthly_report(UserId::new(42), 2023, 8)
        .await
        .expect("report renders");
    assert_eq!(
        report,
        "42,AVITO_VOICE_MESSAGES,add,2023-08-28T12:00:00Z\n\
         42,AVITO_VOICE_MESSAGES,delete,2023-08-30T12:00:00Z\n"
    );
}

#[rstest]
#[tokio::test]
async fn deleting_a_segment_audits_each_member(harness: Harness) {
    let Harness { services, clock } = harness;
    register_users(&services, [1, 2]).await;
    let slug = slug("AVITO_DISCOUNT_50");
    services
        .segments
        .create_with_rollout(&slug, percentage(100.0))
        .await
        .expect("rollout succeeds");

    clock.advance(Duration::from_secs(60));
    services
        .segments
        .delete_segment(&slug)
        .await
        .expect("segment deletes");

    for id in [1, 2] {
        let report = services
            .reports
            .monthly_report(UserId::new(id), 2023, 8)
            .await
            .expect("report renders");
        assert_eq!(
            report,
            format!(
                "{id},AVITO_DISCOUNT_50,add,2023-08-28T12:00:00Z\n\
                 {id},AVITO_DISCOUNT_50,delete,2023-08-28T12:01:00Z\n"
            )
        );
    }

    let error = services
        .segments
        .delete_segment(&slug)
        .await
        .expect_err("segment already gone");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_audits_and_drops_memberships(harness: Harness) {
    let services = &harness.services;
    register_users(services, [5]).await;
    let first = create_segment(services, "AVITO_VOICE_MESSAGES").await;
    let second = create_segment(services, "AVITO_PERFORMANCE_VAS").await;
    services
        .changes
        .change(vec![
            MembershipChange::add(UserId::new(5), first, None),
            MembershipChange::add(UserId::new(5), second, None),
        ])
        .await;

    services
        .users
        .delete_user(UserId::new(5))
        .await
        .expect("user deletes");

    let report = services
        .reports
        .monthly_report(UserId::new(5), 2023, 8)
        .await
        .expect("report renders");
    let deletes = report.lines().filter(|line| line.contains(",delete,")).count();
    assert_eq!(deletes, 2);

    let error = services
        .users
        .user_segments(UserId::new(5))
        .await
        .expect_err("user is gone");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn report_for_another_month_is_empty(harness: Harness) {
    let services = &harness.services;
    register_users(services, [9]).await;
    let slug = create_segment(services, "AVITO_DISCOUNT_30").await;
    services
        .changes
        .change(vec![MembershipChange::add(UserId::new(9), slug, None)])
        .await;

    let report = services
        .reports
        .monthly_report(UserId::new(9), 2023, 9)
        .await
        .expect("report renders");
    assert!(report.is_empty());
}
