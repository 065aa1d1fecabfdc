//! # Call Outcome Scenarios
//!
//! Each call ends in exactly one of: a matched reply, the fallback at its
//! deadline, or a publish error. These tests drive every path through a real
//! bus with a paused clock, so deadlines are exact.
//!
//! ## Flows Tested:
//!
//! 1. **Fast path**: responder answers well before the deadline
//! 2. **No responder**: fallback per call type (accept, null, reject)
//! 3. **Malformed reply**: ignored, call resolved by its own deadline
//! 4. **Race at the deadline**: a reply 1ms early still wins
//! 5. **Late reply**: dropped without disturbing other pending calls
//! 6. **Handler failure**: no reply, requester sees a timeout
//! 7. **Publish failure**: surfaced immediately, nothing left pending

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use care_bridge::{
        handler_fn, AcceptanceQuery, AnnouncementOwner, ApplicationVerification, BridgeError,
        CallType, HandlerError, Requester, Resolution, Responder, UserExists,
    };
    use care_telemetry::metrics;
    use rand::Rng;
    use shared_bus::{InMemoryBus, Subscription, Transport};
    use shared_types::{ReplyEnvelope, RequestEnvelope};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, sleep_until, Instant};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn bus() -> Arc<InMemoryBus> {
        Arc::new(InMemoryBus::new())
    }

    fn requester<C: CallType>(bus: &Arc<InMemoryBus>, timeout_ms: u64) -> Requester<C> {
        let config = C::default_config().with_timeout(Duration::from_millis(timeout_ms));
        Requester::new(bus.clone(), config).unwrap()
    }

    /// Responder answering every user-exists request with `answer` after `delay`.
    fn spawn_user_responder(bus: &Arc<InMemoryBus>, delay: Duration, answer: bool) {
        let handler = handler_fn::<UserExists, _, _>(move |_username: String| async move {
            sleep(delay).await;
            Ok::<_, HandlerError>(answer)
        });
        Responder::<UserExists>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();
    }

    /// Capture raw requests so a test can answer them by hand.
    fn capture_requests<C: CallType>(bus: &Arc<InMemoryBus>) -> Subscription {
        bus.subscribe(&C::default_config().request_channel).unwrap()
    }

    async fn next_request<C: CallType>(requests: &mut Subscription) -> RequestEnvelope<C::Request> {
        let message = requests.recv().await.expect("request");
        RequestEnvelope::decode(&message).unwrap()
    }

    async fn reply<R: serde::Serialize>(bus: &InMemoryBus, channel: &str, envelope: ReplyEnvelope<R>) {
        bus.publish(channel, envelope.encode().unwrap())
            .await
            .unwrap();
    }

    // =============================================================================
    // REPLY PATHS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_user_exists_fast_path() {
        let bus = bus();
        spawn_user_responder(&bus, Duration::from_millis(50), true);
        let requester = requester::<UserExists>(&bus, 5000);
        let start = Instant::now();

        let resolution = requester.call_and_wait("alice".into()).await.unwrap();

        assert_eq!(resolution, Resolution::Reply(true));
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(requester.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_genuine_negative_is_not_a_fallback() {
        let bus = bus();
        spawn_user_responder(&bus, Duration::from_millis(5), false);
        let requester = requester::<UserExists>(&bus, 5000);

        let resolution = requester.call_and_wait("nobody".into()).await.unwrap();

        assert_eq!(resolution, Resolution::Reply(false));
        assert!(!resolution.is_fallback());
    }

    // =============================================================================
    // NO RESPONDER: FALLBACK PER CALL TYPE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_user_exists_without_responder_fails_open() {
        let bus = bus();
        let requester = requester::<UserExists>(&bus, 200);
        let start = Instant::now();

        let resolution = requester.call_and_wait("alice".into()).await.unwrap();

        assert_eq!(resolution, Resolution::Fallback(true));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(metrics::TIMEOUTS_TOTAL.with_label_values(&[UserExists::NAME]).get() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_without_responder_fails_closed() {
        let bus = bus();
        let requester = requester::<ApplicationVerification>(&bus, 200);

        let accepted = requester
            .request(AcceptanceQuery::new("bob", 1))
            .await
            .unwrap();

        assert!(!accepted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_lookup_without_responder_is_null() {
        let bus = bus();
        let requester = requester::<AnnouncementOwner>(&bus, 200);

        let resolution = requester.call_and_wait(42).await.unwrap();

        assert_eq!(resolution, Resolution::Fallback(None));
    }

    // =============================================================================
    // MALFORMED, RACING AND LATE REPLIES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_malformed_reply_leaves_call_to_its_deadline() {
        let bus = bus();
        let requester = requester::<UserExists>(&bus, 200);
        let reply_channel = requester.config().reply_channel.clone();

        let pending = requester.call("alice".into()).await.unwrap();
        let id = pending.correlation_id();
        let deadline = pending.deadline();

        // Garbage, then the right id with a payload of the wrong type
        bus.publish(&reply_channel, Bytes::from_static(b"\x00\x01garbage"))
            .await
            .unwrap();
        reply(&bus, &reply_channel, ReplyEnvelope::new(id, "yes")).await;

        sleep_until(deadline - Duration::from_millis(1)).await;
        assert!(requester.is_pending(&id));

        assert_eq!(pending.await, Resolution::Fallback(true));
        assert!(Instant::now() >= deadline);
        assert!(!requester.is_pending(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_one_millisecond_before_deadline_wins() {
        let bus = bus();
        let handler = handler_fn::<ApplicationVerification, _, _>(|_query: AcceptanceQuery| async {
            sleep(Duration::from_millis(199)).await;
            Ok::<_, HandlerError>(true)
        });
        Responder::<ApplicationVerification>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();
        let requester = requester::<ApplicationVerification>(&bus, 200);

        let resolution = requester
            .call_and_wait(AcceptanceQuery::new("bob", 1))
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::Reply(true));
        assert_eq!(requester.stats().resolved_by_timeout.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_does_not_disturb_other_calls() {
        let bus = bus();
        let mut requests = capture_requests::<UserExists>(&bus);
        let requester = requester::<UserExists>(&bus, 200);
        let reply_channel = requester.config().reply_channel.clone();

        // t=0: first call; t=150: second call
        let first = requester.call("first".into()).await.unwrap();
        let first_request = next_request::<UserExists>(&mut requests).await;
        sleep(Duration::from_millis(150)).await;
        let second = requester.call("second".into()).await.unwrap();
        let second_request = next_request::<UserExists>(&mut requests).await;

        // t=200: first times out
        assert_eq!(first.await, Resolution::Fallback(true));

        // t=250: late reply for the first call
        sleep(Duration::from_millis(50)).await;
        reply(&bus, &reply_channel, first_request.reply(false)).await;
        sleep(Duration::from_millis(1)).await;
        assert!(requester.is_pending(&second.correlation_id()));
        assert_eq!(requester.pending_count(), 1);

        // t=300: second answered before its deadline at 350
        sleep(Duration::from_millis(49)).await;
        reply(&bus, &reply_channel, second_request.reply(false)).await;

        assert_eq!(second.await, Resolution::Reply(false));
        assert_eq!(requester.pending_count(), 0);
        assert!(
            metrics::UNMATCHED_REPLIES_TOTAL
                .with_label_values(&[UserExists::NAME])
                .get()
                >= 1
        );
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_handler_failure_is_seen_as_timeout() {
        let bus = bus();
        let handler = handler_fn::<AnnouncementOwner, _, _>(|_id: i64| async {
            Err::<Option<String>, _>(HandlerError::Unavailable("announcement store offline".into()))
        });
        Responder::<AnnouncementOwner>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();
        let requester = requester::<AnnouncementOwner>(&bus, 300);
        let start = Instant::now();

        let resolution = requester.call_and_wait(1).await.unwrap();

        assert_eq!(resolution, Resolution::Fallback(None));
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_is_immediate() {
        let bus = bus();
        let requester = requester::<UserExists>(&bus, 5000);
        bus.close();
        let start = Instant::now();

        let result = requester.request("alice".into()).await;

        assert!(matches!(result, Err(BridgeError::PublishFailed { .. })));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(requester.pending_count(), 0);
        assert_eq!(requester.stats().resolved_by_timeout.load(Ordering::Relaxed), 0);
    }

    // =============================================================================
    // EXACTLY ONE OUTCOME
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_every_call_resolves_exactly_once() {
        const CALLS: usize = 200;
        let bus = bus();
        let mut requests = capture_requests::<UserExists>(&bus);
        let requester = Arc::new(requester::<UserExists>(&bus, 100));
        let reply_channel = requester.config().reply_channel.clone();

        let mut pending = Vec::with_capacity(CALLS);
        for i in 0..CALLS {
            pending.push(requester.call(format!("user-{i}")).await.unwrap());
        }

        // Answer each request after a random delay on either side of the deadline
        let mut rng = rand::thread_rng();
        for _ in 0..CALLS {
            let request = next_request::<UserExists>(&mut requests).await;
            let delay = Duration::from_millis(rng.gen_range(0..200));
            let bus = bus.clone();
            let reply_channel = reply_channel.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                let message = request.reply(false).encode().unwrap();
                let _ = bus.publish(&reply_channel, message).await;
            });
        }

        let mut replies = 0;
        let mut fallbacks = 0;
        for call in pending {
            match call.await {
                Resolution::Reply(value) => {
                    assert!(!value);
                    replies += 1;
                }
                Resolution::Fallback(value) => {
                    assert!(value);
                    fallbacks += 1;
                }
            }
        }

        let stats = requester.stats();
        assert_eq!(replies + fallbacks, CALLS);
        assert_eq!(stats.resolved_by_reply.load(Ordering::Relaxed), replies as u64);
        assert_eq!(stats.resolved_by_timeout.load(Ordering::Relaxed), fallbacks as u64);
        assert_eq!(requester.pending_count(), 0);
    }
}
