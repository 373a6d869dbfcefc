use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::error::GatewayError;
use super::gateway::CompletionGateway;
use super::message::*;
use super::model::ModelId;
use super::prompt::*;
use super::registry::*;
use super::security;
use super::session::*;
use super::usage::*;

/// Replies from a script; records what each call was sent.
struct ScriptedGateway {
    model: ModelId,
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<(Vec<Message>, f32)>>,
}

impl ScriptedGateway {
    fn new(replies: Vec<Result<String, GatewayError>>) -> Arc<Self> {
        Arc::new(Self {
            model: ModelId("gpt-4o-mini".into()),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn echoing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    fn calls(&self) -> Vec<(Vec<Message>, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), temperature));
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => Ok(format!("reply #{}", messages.len())),
        }
    }

    fn model(&self) -> &ModelId {
        &self.model
    }
}

fn backend_config() -> SessionConfig {
    SessionConfig::new(
        "Backend Engineer",
        "Rust, SQL",
        DifficultyLevel::Medium,
        Technique::ZeroShot,
    )
}

fn roles(messages: &[Message]) -> Vec<MessageRole> {
    messages.iter().map(|m| m.role).collect()
}

#[test]
fn test_fresh_session_has_only_system_prompt() {
    let session = Session::new(backend_config(), ScriptedGateway::echoing());
    assert_eq!(session.state(), SessionState::Fresh);
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript()[0].role, MessageRole::System);
    assert_eq!(session.system_prompt(), build_system_prompt(&backend_config()));
    assert_eq!(session.config(), &backend_config());
    assert_eq!(session.turns(), 0);
}

#[tokio::test]
async fn test_transcript_grows_two_per_turn() {
    let gateway = ScriptedGateway::echoing();
    let mut session = Session::new(backend_config(), gateway.clone());

    for n in 1..=4 {
        let reply = session.turn(&format!("answer {n}"), 0.7).await.unwrap();
        assert_eq!(reply, format!("reply #{}", 2 * n));
        assert_eq!(session.transcript().len(), 1 + 2 * n);
    }

    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.turns(), 4);
    assert_eq!(
        roles(session.transcript()),
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
        ]
    );
}

#[tokio::test]
async fn test_gateway_sees_full_history_and_temperature() {
    let gateway = ScriptedGateway::new(vec![Ok("Q1".into()), Ok("Q2".into())]);
    let mut session = Session::new(backend_config(), gateway.clone());

    session.turn("ready", 0.2).await.unwrap();
    session.turn("my answer", 1.5).await.unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);

    let (first, temp) = &calls[0];
    assert_eq!(*temp, 0.2);
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].content, "ready");

    let (second, temp) = &calls[1];
    assert_eq!(*temp, 1.5);
    let contents: Vec<&str> = second.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents[1..], ["ready", "Q1", "my answer"]);
}

#[tokio::test]
async fn test_failed_turn_keeps_user_message_only() {
    let gateway = ScriptedGateway::new(vec![
        Ok("first question".into()),
        Err(GatewayError::Api {
            status: 401,
            message: "invalid api key".into(),
        }),
    ]);
    let mut session = Session::new(backend_config(), gateway);

    session.turn("hello", 0.7).await.unwrap();
    let err = session.turn("second answer", 0.7).await.unwrap_err();

    assert!(matches!(err, GatewayError::Api { status: 401, .. }));
    assert!(err.to_string().contains("invalid api key"));
    assert_eq!(session.transcript().len(), 4);
    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "second answer");
    assert_eq!(session.turns(), 1);
}

#[tokio::test]
async fn test_wrapped_input_enters_transcript() {
    let gateway = ScriptedGateway::echoing();
    let mut session = Session::new(backend_config(), gateway);

    let raw = "I would add an index";
    assert!(security::validate(raw).is_valid);
    let wrapped = security::wrap(raw);
    session.turn(&wrapped, 0.7).await.unwrap();

    let sent = &session.transcript()[1].content;
    assert_eq!(sent, &wrapped);
    assert!(sent.starts_with("<USER_INPUT id=\""));
    assert!(sent.contains(raw));
}

#[test]
fn test_get_or_create_reuses_and_ignores_new_config() {
    let factory = SessionFactory::new(ScriptedGateway::echoing());
    let mut store: HashMap<String, Option<Session>> = HashMap::new();

    let first_id = factory
        .get_or_create(&mut store, DEFAULT_STORAGE_KEY, backend_config())
        .id()
        .to_string();

    let other = SessionConfig::from_names("Designer", "Figma", "Hard", "Few-shot");
    let again = factory.get_or_create(&mut store, DEFAULT_STORAGE_KEY, other);
    assert_eq!(again.id(), first_id);
    assert_eq!(again.config(), &backend_config());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_reset_then_create_uses_new_config() {
    let factory = SessionFactory::new(ScriptedGateway::echoing());
    let mut store: HashMap<String, Option<Session>> = HashMap::new();

    let old_id = factory
        .get_or_create(&mut store, DEFAULT_STORAGE_KEY, backend_config())
        .id()
        .to_string();

    factory.reset(&mut store, DEFAULT_STORAGE_KEY);
    assert!(SessionStore::get(&store, DEFAULT_STORAGE_KEY).is_none());

    let other = SessionConfig::from_names("Designer", "Figma", "Hard", "Few-shot");
    let fresh = factory.get_or_create(&mut store, DEFAULT_STORAGE_KEY, other.clone());
    assert_ne!(fresh.id(), old_id);
    assert_eq!(fresh.config(), &other);
    assert_eq!(fresh.state(), SessionState::Fresh);
}

#[test]
fn test_empty_slot_counts_as_absent() {
    let factory = SessionFactory::new(ScriptedGateway::echoing());
    let mut store: BTreeMap<String, Option<Session>> = BTreeMap::new();
    store.insert("interviewer".into(), None);

    assert!(store.contains("interviewer"));
    let session = factory.get_or_create(&mut store, "interviewer", backend_config());
    assert_eq!(session.config(), &backend_config());
    assert!(SessionStore::get(&store, "interviewer").is_some());
}

#[test]
fn test_reset_missing_key_is_noop() {
    let factory = SessionFactory::new(ScriptedGateway::echoing());
    let mut store: HashMap<String, Option<Session>> = HashMap::new();
    factory.reset(&mut store, "nobody");
    assert!(store.is_empty());
}

#[test]
fn test_keys_are_independent() {
    let factory = SessionFactory::new(ScriptedGateway::echoing());
    let mut store: HashMap<String, Option<Session>> = HashMap::new();

    let a = factory.get_or_create(&mut store, "a", backend_config()).id().to_string();
    let b = factory.get_or_create(&mut store, "b", backend_config()).id().to_string();
    assert_ne!(a, b);

    factory.reset(&mut store, "a");
    assert_eq!(SessionStore::get(&store, "b").map(|s| s.id().to_string()), Some(b));
}

#[tokio::test]
async fn test_answer_turn_keeps_history_across_calls() {
    let gateway = ScriptedGateway::echoing();
    let factory = SessionFactory::new(gateway.clone());
    let mut store: HashMap<String, Option<Session>> = HashMap::new();

    factory
        .answer_turn(&mut store, DEFAULT_STORAGE_KEY, backend_config(), "one", 0.7)
        .await
        .unwrap();
    factory
        .answer_turn(&mut store, DEFAULT_STORAGE_KEY, backend_config(), "two", 0.7)
        .await
        .unwrap();

    let session = SessionStore::get(&store, DEFAULT_STORAGE_KEY).unwrap();
    assert_eq!(session.transcript().len(), 5);
    assert_eq!(gateway.calls().len(), 2);
}

#[tokio::test]
async fn test_usage_totals_follow_turns() {
    let gateway = ScriptedGateway::new(vec![Ok("hello world".into())]);
    let mut session = Session::new(backend_config(), gateway.clone());
    let mut totals = UsageTotals::new();

    let input = "hello world";
    let reply = session.turn(input, 0.7).await.unwrap();
    totals.record_turn(&TurnUsage::measure(input, &reply, &gateway.model().0));

    assert_eq!(totals.turn_count, 1);
    assert_eq!(totals.total_input_tokens, 2);
    assert_eq!(totals.total_output_tokens, 2);
    assert!((totals.total_cost - calculate_cost(2, 2, "gpt-4o-mini")).abs() < 1e-12);
}

#[test]
fn test_message_role_serialization() {
    let msg = Message::user("hi".into());
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));

    let role: MessageRole = serde_json::from_str("\"assistant\"").unwrap();
    assert_eq!(role, MessageRole::Assistant);
}

#[test]
fn test_price_table() {
    use super::model::*;

    let models = builtin_models();
    assert_eq!(models.len(), 4);
    assert!(models.contains_key(&ModelId(DEFAULT_PRICED_MODEL.into())));

    let gpt4o = get_model(&ModelId("gpt-4o".into())).unwrap();
    // (1000/1M * 2.50) + (500/1M * 10.00) = 0.0025 + 0.005
    assert!((gpt4o.calculate_cost(1000, 500) - 0.0075).abs() < 1e-12);

    assert!(get_model(&ModelId("gpt-4.1-mini".into())).is_none());
    assert_eq!(model_or_default("gpt-4.1-mini").id.0, "gpt-4o-mini");
    assert_eq!(get_default_model().pricing.cost_per_1m_input, 0.150);
}
