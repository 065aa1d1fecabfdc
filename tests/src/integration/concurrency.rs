//! # Concurrency Tests
//!
//! Many calls in flight on one requester, answered by one responder.
//! Every caller must get the answer to its own request.

#[cfg(test)]
mod tests {
    use care_bridge::{
        CallType,
        handler_fn, AnnouncementOwner, HandlerError, Requester, Resolution, Responder, UserExists,
    };
    use futures::future::join_all;
    use shared_bus::InMemoryBus;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    /// Reply depends on the request, so a crossed reply is detectable.
    fn expected(username: &str) -> bool {
        username.len() % 2 == 0
    }

    fn spawn_echo_responder(bus: &Arc<InMemoryBus>) {
        let handler = handler_fn::<UserExists, _, _>(|username: String| async move {
            Ok::<_, HandlerError>(expected(&username))
        });
        Responder::<UserExists>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ten_thousand_concurrent_calls_without_collisions() {
        const CALLS: usize = 10_000;
        // Room for every request and every reply without lagging
        let bus = Arc::new(InMemoryBus::with_capacity(2 * CALLS));
        spawn_echo_responder(&bus);
        let config = UserExists::default_config().with_timeout(Duration::from_secs(30));
        let requester = Arc::new(Requester::<UserExists>::new(bus.clone(), config).unwrap());

        let tasks: Vec<_> = (0..CALLS)
            .map(|i| {
                let requester = requester.clone();
                tokio::spawn(async move {
                    let username = "u".repeat(i % 7 + 1) + &i.to_string();
                    let pending = requester.call(username.clone()).await.unwrap();
                    let id = pending.correlation_id();
                    (id, username, pending.await)
                })
            })
            .collect();

        let mut ids = HashSet::with_capacity(CALLS);
        for result in join_all(tasks).await {
            let (id, username, resolution) = result.unwrap();
            assert!(ids.insert(id), "correlation id reused: {id}");
            assert_eq!(resolution, Resolution::Reply(expected(&username)));
        }

        assert_eq!(ids.len(), CALLS);
        assert_eq!(requester.pending_count(), 0);
        let stats = requester.stats();
        assert_eq!(stats.registered.load(Ordering::Relaxed), CALLS as u64);
        assert_eq!(stats.resolved_by_reply.load(Ordering::Relaxed), CALLS as u64);
        assert_eq!(stats.duplicates_rejected.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_requesters_sharing_a_reply_channel_ignore_each_others_replies() {
        let bus = Arc::new(InMemoryBus::new());
        let handler = handler_fn::<AnnouncementOwner, _, _>(|id: i64| async move {
            Ok::<_, HandlerError>(Some(format!("owner-{id}")))
        });
        Responder::<AnnouncementOwner>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();

        // Two service instances on the same reply channel
        let first = Requester::<AnnouncementOwner>::with_defaults(bus.clone()).unwrap();
        let second = Requester::<AnnouncementOwner>::with_defaults(bus.clone()).unwrap();

        let (a, b) = tokio::join!(first.request(1), second.request(2));

        assert_eq!(a.unwrap(), Some("owner-1".to_string()));
        assert_eq!(b.unwrap(), Some("owner-2".to_string()));
        assert_eq!(first.pending_count() + second.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_abandoned_calls_do_not_leak() {
        let bus = Arc::new(InMemoryBus::new());
        // No responder: every call would wait the full 5s
        let requester = Arc::new(Requester::<UserExists>::with_defaults(bus).unwrap());

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let requester = requester.clone();
                tokio::spawn(async move {
                    tokio::time::timeout(
                        Duration::from_millis(20),
                        requester.request(format!("user-{i}")),
                    )
                    .await
                })
            })
            .collect();

        for result in join_all(tasks).await {
            assert!(result.unwrap().is_err(), "caller timeout should fire first");
        }
        assert_eq!(requester.pending_count(), 0);
        assert_eq!(requester.stats().abandoned.load(Ordering::Relaxed), 100);
    }
}
