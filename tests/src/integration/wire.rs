//! # Wire Format Tests
//!
//! Envelopes as other services see them on the bus: camelCase JSON carrying
//! the correlation id string unchanged from request to reply.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use care_bridge::{
        handler_fn, AcceptanceQuery, AnnouncementOwner, ApplicationVerification, CallType,
        HandlerError, Requester, Resolution, Responder, UserExists,
    };
    use rand::Rng;
    use serde_json::{json, Value};
    use shared_bus::{InMemoryBus, Transport};
    use shared_types::{CorrelationId, ReplyEnvelope, RequestEnvelope};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_request_round_trip() {
        let envelope = RequestEnvelope::new(
            CorrelationId::new(),
            "application.verify.response",
            AcceptanceQuery::new("bob", 7),
        );
        let decoded =
            RequestEnvelope::<AcceptanceQuery>::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_reply_round_trip() {
        let envelope = ReplyEnvelope::new(CorrelationId::new(), Some("alice".to_string()));
        let decoded =
            ReplyEnvelope::<Option<String>>::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    /// Usernames other services may send: escapes, control characters,
    /// non-ASCII, empty.
    fn awkward_username(rng: &mut impl Rng) -> String {
        const PIECES: &[&str] = &[
            "", "bob", "\"", "\\", "\r\n", "\u{0}", "\u{1b}[0m", "ü", "Zoë", "护理", "🧑‍🍼",
            "\u{2029}", "'; --",
        ];
        let len = rng.gen_range(0..6);
        (0..len)
            .map(|_| PIECES[rng.gen_range(0..PIECES.len())])
            .collect()
    }

    fn announcement_id(rng: &mut impl Rng) -> i64 {
        match rng.gen_range(0..4) {
            0 => i64::MIN,
            1 => i64::MAX,
            _ => rng.gen(),
        }
    }

    #[test]
    fn test_random_envelopes_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..300 {
            let request = RequestEnvelope::new(
                CorrelationId::new(),
                "application.verify.response",
                AcceptanceQuery::new(awkward_username(&mut rng), announcement_id(&mut rng)),
            );
            let decoded =
                RequestEnvelope::<AcceptanceQuery>::decode(&request.encode().unwrap()).unwrap();
            assert_eq!(decoded, request);

            let owner = Some(awkward_username(&mut rng)).filter(|_| rng.gen_bool(0.7));
            let reply = request.reply(owner);
            let decoded =
                ReplyEnvelope::<Option<String>>::decode(&reply.encode().unwrap()).unwrap();
            assert_eq!(decoded, reply);
        }
    }

    #[tokio::test]
    async fn test_random_owners_survive_the_bus() {
        let mut rng = rand::thread_rng();
        let mut owners: HashMap<i64, String> = HashMap::new();
        owners.insert(i64::MIN, awkward_username(&mut rng));
        owners.insert(i64::MAX, awkward_username(&mut rng));
        for _ in 0..50 {
            owners.insert(rng.gen(), awkward_username(&mut rng));
        }
        let owners = Arc::new(owners);

        let bus = Arc::new(InMemoryBus::new());
        let table = owners.clone();
        let handler = handler_fn::<AnnouncementOwner, _, _>(move |id: i64| {
            let owner = table.get(&id).cloned();
            async move { Ok::<_, HandlerError>(owner) }
        });
        Responder::<AnnouncementOwner>::with_defaults(bus.clone(), handler)
            .unwrap()
            .spawn()
            .unwrap();
        let requester = Requester::<AnnouncementOwner>::with_defaults(bus).unwrap();

        for (id, owner) in owners.iter() {
            let resolution = requester.call_and_wait(*id).await.unwrap();
            assert_eq!(resolution, Resolution::Reply(Some(owner.clone())));
        }
    }

    #[tokio::test]
    async fn test_published_request_shape() {
        let bus = Arc::new(InMemoryBus::new());
        let mut requests = bus
            .subscribe(&ApplicationVerification::default_config().request_channel)
            .unwrap();
        let requester = Requester::<ApplicationVerification>::with_defaults(bus.clone()).unwrap();

        let pending = requester
            .call(AcceptanceQuery::new("bob", 7))
            .await
            .unwrap();
        let message = timeout(Duration::from_secs(1), requests.recv())
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_slice(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "correlationId": pending.correlation_id().to_string(),
                "replyChannel": "application.verify.response",
                "payload": { "username": "bob", "announcementId": 7 }
            })
        );
    }

    #[tokio::test]
    async fn test_hand_written_reply_resolves_call() {
        let bus = Arc::new(InMemoryBus::new());
        let requester = Requester::<UserExists>::with_defaults(bus.clone()).unwrap();
        let pending = requester.call("alice".into()).await.unwrap();

        // As another service would write it, with an extra field it ignores
        let reply = format!(
            r#"{{"correlationId":"{}","payload":false,"source":"user-service"}}"#,
            pending.correlation_id()
        );
        bus.publish("chat-user-exists-reply", Bytes::from(reply))
            .await
            .unwrap();

        let resolution = timeout(Duration::from_secs(1), pending).await.unwrap();
        assert_eq!(resolution, Resolution::Reply(false));
    }

    #[tokio::test]
    async fn test_reply_with_unknown_id_format_is_dropped() {
        let bus = Arc::new(InMemoryBus::new());
        let config = UserExists::default_config().with_timeout(Duration::from_millis(100));
        let requester = Requester::<UserExists>::new(bus.clone(), config).unwrap();
        let pending = requester.call("alice".into()).await.unwrap();

        bus.publish(
            "chat-user-exists-reply",
            Bytes::from_static(br#"{"correlationId":"not-a-uuid","payload":false}"#),
        )
        .await
        .unwrap();

        assert_eq!(pending.await, Resolution::Fallback(true));
    }
}
