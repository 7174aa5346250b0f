use socialforge_common::{
    JobState, Platform, PlatformIdentifiers, PlatformState, SocialHandles,
};
use socialforge_store::{JobStore, NewJob, StoreError};
use uuid::Uuid;

fn handles(title: &str) -> SocialHandles {
    let slug = title.to_lowercase().replace(' ', "-");
    SocialHandles {
        input_title: title.to_string(),
        roman_form: title.to_lowercase(),
        slug: slug.clone(),
        ig_handle: format!("stage.{}", slug.replace('-', "")),
        fb_page_name: format!("STAGE {title}"),
        fb_username: format!("Stage{}", title.replace(' ', "")),
        yt_channel_name: format!("STAGE {title}"),
        yt_handle: format!("Stage{}", title.replace(' ', "")),
    }
}

fn new_job(title: &str) -> NewJob {
    NewJob {
        external_key: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        platforms: Platform::ALL.to_vec(),
        handles: handles(title),
        callback_url: None,
    }
}

/// Walk one platform to `to` through its legal forward chain.
async fn drive(store: &JobStore, id: Uuid, platform: Platform, to: PlatformState) {
    use PlatformState::*;
    let chain: &[PlatformState] = match to {
        Pending => &[],
        InProgress => &[InProgress],
        Done => &[InProgress, Done],
        Failed => &[InProgress, Failed],
        WarmingUp => &[InProgress, WarmingUp],
        Ready => &[InProgress, WarmingUp, Ready],
    };
    for step in chain {
        let error = (*step == Failed).then_some("boom");
        store
            .update_platform(id, platform, *step, None, error)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn create_and_fetch_round_trip() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Banswara")).await.unwrap();

    assert_eq!(job.status, JobState::Pending);
    assert_eq!(job.facebook.status, PlatformState::Pending);
    assert_eq!(job.youtube.status, PlatformState::Pending);
    assert_eq!(job.instagram.status, PlatformState::Pending);
    assert!(job.completed_at.is_none());

    let fetched = store.get(job.id).await.unwrap();
    assert_eq!(fetched.external_key, "banswara");
    assert_eq!(fetched.handles.ig_handle, "stage.banswara");

    let by_key = store.find_by_external_key("banswara").await.unwrap();
    assert_eq!(by_key.unwrap().id, job.id);
    assert!(store.find_by_external_key("kota").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_external_key_is_conflict() {
    let store = JobStore::in_memory().await.unwrap();
    store.create(new_job("Banswara")).await.unwrap();

    let err = store.create(new_job("Banswara")).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(key) if key == "banswara"));
}

#[tokio::test]
async fn platform_moves_forward_and_stores_identifiers() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Kota")).await.unwrap();

    store
        .update_platform(job.id, Platform::Facebook, PlatformState::InProgress, None, None)
        .await
        .unwrap();

    let ids = PlatformIdentifiers::Facebook {
        page_id: Some("1234".into()),
        page_url: Some("https://facebook.com/StageKota".into()),
        page_name: Some("STAGE Kota".into()),
    };
    store
        .update_platform(job.id, Platform::Facebook, PlatformState::Done, Some(&ids), None)
        .await
        .unwrap();

    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.facebook.status, PlatformState::Done);
    assert_eq!(job.facebook.identifiers, Some(ids));
    assert!(job.facebook.error.is_none());
    // The other platforms are untouched
    assert_eq!(job.youtube.status, PlatformState::Pending);
}

#[tokio::test]
async fn backward_transition_is_rejected() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Bundi")).await.unwrap();

    store
        .update_platform(job.id, Platform::Youtube, PlatformState::InProgress, None, None)
        .await
        .unwrap();
    store
        .update_platform(
            job.id,
            Platform::Youtube,
            PlatformState::Failed,
            None,
            Some("session expired: cookie rejected"),
        )
        .await
        .unwrap();

    // failed → done would un-fail the platform without a retry
    let err = store
        .update_platform(job.id, Platform::Youtube, PlatformState::Done, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::IllegalTransition {
            from: PlatformState::Failed,
            to: PlatformState::Done,
            ..
        }
    ));

    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.youtube.status, PlatformState::Failed);
    assert_eq!(
        job.youtube.error.as_deref(),
        Some("session expired: cookie rejected")
    );
}

#[tokio::test]
async fn instagram_warmup_chain() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Baran")).await.unwrap();

    store
        .update_platform(job.id, Platform::Instagram, PlatformState::InProgress, None, None)
        .await
        .unwrap();
    store
        .update_platform(job.id, Platform::Instagram, PlatformState::WarmingUp, None, None)
        .await
        .unwrap();
    store
        .update_platform(job.id, Platform::Instagram, PlatformState::Ready, None, None)
        .await
        .unwrap();

    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.instagram.status, PlatformState::Ready);
}

#[tokio::test]
async fn overall_derivation_covers_every_substatus_combination() {
    use PlatformState::*;
    let store = JobStore::in_memory().await.unwrap();

    // One success representative per platform so done, ready and warming_up
    // all appear somewhere in the grid.
    let fb_states = [Pending, InProgress, Done, Failed];
    let yt_states = [Pending, InProgress, Ready, Failed];
    let ig_states = [Pending, InProgress, WarmingUp, Failed];

    for (i, &fb) in fb_states.iter().enumerate() {
        for (j, &yt) in yt_states.iter().enumerate() {
            for (k, &ig) in ig_states.iter().enumerate() {
                let job = store
                    .create(new_job(&format!("Grid {i}{j}{k}")))
                    .await
                    .unwrap();
                drive(&store, job.id, Platform::Facebook, fb).await;
                drive(&store, job.id, Platform::Youtube, yt).await;
                drive(&store, job.id, Platform::Instagram, ig).await;

                let expected = expected_overall([fb, yt, ig]);
                let derived = store.recompute_overall(job.id).await.unwrap();
                assert_eq!(derived, expected, "fb={fb:?} yt={yt:?} ig={ig:?}");
                assert_eq!(store.get(job.id).await.unwrap().status, expected);
            }
        }
    }

    let err = store.recompute_overall(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

/// The derivation rule, restated independently of the store's SQL.
fn expected_overall(slots: [PlatformState; 3]) -> JobState {
    let settled = slots.iter().filter(|s| s.is_settled()).count();
    if settled < slots.len() {
        let started = settled > 0 || slots.contains(&PlatformState::InProgress);
        return if started {
            JobState::InProgress
        } else {
            JobState::Pending
        };
    }
    match slots.iter().filter(|s| s.succeeded()).count() {
        3 => JobState::Done,
        0 => JobState::Failed,
        _ => JobState::Partial,
    }
}

#[tokio::test]
async fn unselected_platforms_do_not_affect_the_overall_status() {
    let store = JobStore::in_memory().await.unwrap();
    let mut new = new_job("Pali");
    new.platforms = vec![Platform::Facebook, Platform::Youtube];
    let job = store.create(new).await.unwrap();

    drive(&store, job.id, Platform::Facebook, PlatformState::Done).await;
    drive(&store, job.id, Platform::Youtube, PlatformState::Done).await;

    assert_eq!(
        store.recompute_overall(job.id).await.unwrap(),
        JobState::Done
    );
    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.instagram.status, PlatformState::Pending);
}

#[tokio::test]
async fn completed_at_is_stamped_once() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Jhalawar")).await.unwrap();

    drive(&store, job.id, Platform::Facebook, PlatformState::InProgress).await;
    assert_eq!(
        store.recompute_overall(job.id).await.unwrap(),
        JobState::InProgress
    );
    assert!(store.get(job.id).await.unwrap().completed_at.is_none());

    store
        .update_platform(job.id, Platform::Facebook, PlatformState::Done, None, None)
        .await
        .unwrap();
    drive(&store, job.id, Platform::Youtube, PlatformState::Done).await;
    drive(&store, job.id, Platform::Instagram, PlatformState::WarmingUp).await;
    assert_eq!(store.recompute_overall(job.id).await.unwrap(), JobState::Done);
    let first = store.get(job.id).await.unwrap().completed_at.unwrap();

    // Instagram finishing its warmup later must not move the stamp
    store
        .update_platform(job.id, Platform::Instagram, PlatformState::Ready, None, None)
        .await
        .unwrap();
    assert_eq!(store.recompute_overall(job.id).await.unwrap(), JobState::Done);
    let second = store.get(job.id).await.unwrap().completed_at.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn callback_claim_succeeds_exactly_once() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Udaipur")).await.unwrap();

    assert!(store.mark_callback_sent(job.id).await.unwrap());
    assert!(!store.mark_callback_sent(job.id).await.unwrap());
    assert!(!store.mark_callback_sent(job.id).await.unwrap());
}

#[tokio::test]
async fn retry_resets_only_failed_platforms() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Bhilwara")).await.unwrap();

    for (platform, outcome) in [
        (Platform::Facebook, PlatformState::Done),
        (Platform::Youtube, PlatformState::Failed),
        (Platform::Instagram, PlatformState::Failed),
    ] {
        store
            .update_platform(job.id, platform, PlatformState::InProgress, None, None)
            .await
            .unwrap();
        store
            .update_platform(job.id, platform, outcome, None, Some("boom"))
            .await
            .unwrap();
    }
    assert_eq!(
        store.recompute_overall(job.id).await.unwrap(),
        JobState::Partial
    );
    assert!(store.mark_callback_sent(job.id).await.unwrap());

    let reset = store.reset_failed_platforms(job.id).await.unwrap();
    assert_eq!(reset, vec![Platform::Youtube, Platform::Instagram]);

    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.status, JobState::InProgress);
    assert_eq!(job.facebook.status, PlatformState::Done);
    assert_eq!(job.youtube.status, PlatformState::Pending);
    assert_eq!(job.instagram.status, PlatformState::Pending);
    assert!(job.youtube.error.is_none());
    assert!(job.completed_at.is_none());
    // The next terminal state gets a fresh callback
    assert!(store.mark_callback_sent(job.id).await.unwrap());
}

#[tokio::test]
async fn retry_with_nothing_failed_is_a_no_op() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Salumbar")).await.unwrap();

    store
        .update_platform(job.id, Platform::Facebook, PlatformState::InProgress, None, None)
        .await
        .unwrap();
    store
        .update_platform(job.id, Platform::Facebook, PlatformState::Done, None, None)
        .await
        .unwrap();

    let reset = store.reset_failed_platforms(job.id).await.unwrap();
    assert!(reset.is_empty());
    let job = store.get(job.id).await.unwrap();
    assert_eq!(job.facebook.status, PlatformState::Done);
}

#[tokio::test]
async fn list_filters_by_status() {
    let store = JobStore::in_memory().await.unwrap();
    let a = store.create(new_job("Kota")).await.unwrap();
    let b = store.create(new_job("Bundi")).await.unwrap();
    for platform in Platform::ALL {
        drive(&store, a.id, platform, PlatformState::Done).await;
    }
    store.recompute_overall(a.id).await.unwrap();
    drive(&store, b.id, Platform::Facebook, PlatformState::InProgress).await;
    store.recompute_overall(b.id).await.unwrap();

    let done = store.list(Some(JobState::Done), 50).await.unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, a.id);

    let all = store.list(None, 50).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn events_are_appended_in_order() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Dungarpur")).await.unwrap();

    store.record_event(job.id, "job_created", None).await;
    store
        .record_event(job.id, "platform_done", Some("facebook"))
        .await;

    let events = store.events(job.id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, "job_created");
    assert_eq!(events[1].detail.as_deref(), Some("facebook"));
}

#[tokio::test]
async fn summary_hides_password() {
    let store = JobStore::in_memory().await.unwrap();
    let job = store.create(new_job("Rajsamand")).await.unwrap();

    store
        .update_platform(job.id, Platform::Instagram, PlatformState::InProgress, None, None)
        .await
        .unwrap();
    let ids = PlatformIdentifiers::Instagram {
        username: Some("stage.rajsamand".into()),
        password: Some("hunter2secret".into()),
        phone: Some("+919876543210".into()),
        device_id: Some("gl-1".into()),
        url: Some("https://instagram.com/stage.rajsamand".into()),
        warmup_triggered: true,
    };
    store
        .update_platform(job.id, Platform::Instagram, PlatformState::WarmingUp, Some(&ids), None)
        .await
        .unwrap();

    let summary = store.get(job.id).await.unwrap().summary();
    assert_eq!(summary.instagram.username.as_deref(), Some("stage.rajsamand"));
    let body = serde_json::to_string(&summary).unwrap();
    assert!(!body.contains("hunter2secret"));
}
