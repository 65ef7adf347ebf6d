use super::*;
use crate::message::Role;
use crate::tools::{CallToolResult, ToolProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned assistant turns and records every transcript it was sent.
struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<Message>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGateway {
    fn new(replies: Vec<Result<Message>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        assert!(!tools.is_empty(), "tool schemas are sent on every call");
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("gateway called more times than scripted"))
    }
}

/// Answers every call with `"<name> result"` unless told to fail.
struct FakeProvider {
    calls: Mutex<Vec<(String, Value)>>,
    fail_on: Option<&'static str>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    fn failing_on(name: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(name),
        }
    }

    fn called(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl ToolProvider for FakeProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(weather_tools())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        if self.fail_on == Some(name) {
            return Err(ChatError::ProviderTransport("server closed the connection".into()));
        }
        Ok(CallToolResult::text(format!("{} result", name)))
    }
}

fn weather_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "get_alerts".into(),
            description: Some("Get weather alerts for a US state.".into()),
            input_schema: json!({"type": "object", "properties": {"state": {"type": "string"}}}),
        },
        ToolDescriptor {
            name: "get_forecast".into(),
            description: Some("Get weather forecast for a location.".into()),
            input_schema: json!({"type": "object"}),
        },
    ]
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}

fn tool_turn(text: Option<&str>, calls: Vec<ToolCall>) -> Result<Message> {
    Ok(Message::assistant_with_tools(text.map(String::from), calls))
}

fn tool_messages(messages: &[Message]) -> Vec<&Message> {
    messages.iter().filter(|m| m.role == Role::Tool).collect()
}

#[tokio::test]
async fn test_plain_answer_needs_one_gateway_call() {
    let gateway = ScriptedGateway::new(vec![Ok(Message::assistant("It is sunny."))]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let answer = agent.process_query("how is the weather?").await.unwrap();

    assert_eq!(answer, "It is sunny.");
    assert_eq!(gateway.calls(), 1);
    assert!(provider.called().is_empty());
    assert_eq!(gateway.request(0), vec![Message::user("how is the weather?")]);
}

#[tokio::test]
async fn test_forecast_scenario() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(
            None,
            vec![call("call_1", "get_forecast", json!({"latitude": 37.35, "longitude": -121.95}))],
        ),
        Ok(Message::assistant("Here's the forecast: mild and clear.")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let answer = agent.process_query("what's the weather in 95110").await.unwrap();

    assert_eq!(
        answer,
        "[Calling tool get_forecast with args {\"latitude\":37.35,\"longitude\":-121.95}]\n\
         Here's the forecast: mild and clear."
    );
    assert_eq!(gateway.calls(), 2);

    let second = gateway.request(1);
    assert_eq!(second.len(), 3);
    assert_eq!(second[1].tool_calls[0].id, "call_1");
    assert_eq!(second[2], Message::tool_result("call_1", "get_forecast result"));
}

#[tokio::test]
async fn test_tool_calls_run_in_order_with_matching_ids() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(
            None,
            vec![
                call("b", "get_forecast", json!({"latitude": 1.0, "longitude": 2.0})),
                call("a", "get_alerts", json!({"state": "CA"})),
                call("c", "get_forecast", json!({"latitude": 3.0, "longitude": 4.0})),
            ],
        ),
        Ok(Message::assistant("done")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    agent.process_query("compare").await.unwrap();

    assert_eq!(provider.called(), vec!["get_forecast", "get_alerts", "get_forecast"]);

    let second = gateway.request(1);
    let assistant = &second[1];
    let results = tool_messages(&second);
    let result_ids: Vec<_> = results
        .iter()
        .map(|m| m.tool_call_id.clone().unwrap())
        .collect();
    let request_ids: Vec<_> = assistant.tool_calls.iter().map(|c| c.id.clone()).collect();
    assert_eq!(result_ids, request_ids);
}

#[tokio::test]
async fn test_text_alongside_tool_calls_is_emitted_first() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(
            Some("Let me check the alerts."),
            vec![call("x", "get_alerts", json!({"state": "TX"}))],
        ),
        Ok(Message::assistant("No alerts in Texas.")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let answer = agent.process_query("alerts in TX?").await.unwrap();
    let lines: Vec<_> = answer.lines().collect();

    assert_eq!(
        lines,
        vec![
            "Let me check the alerts.",
            "[Calling tool get_alerts with args {\"state\":\"TX\"}]",
            "No alerts in Texas.",
        ]
    );
    assert_eq!(provider.called(), vec!["get_alerts"]);
}

#[tokio::test]
async fn test_multiple_tool_rounds() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(None, vec![call("1", "get_alerts", json!({"state": "CA"}))]),
        tool_turn(None, vec![call("2", "get_forecast", json!({"latitude": 0, "longitude": 0}))]),
        Ok(Message::assistant("summary")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let answer = agent.process_query("q").await.unwrap();

    assert_eq!(gateway.calls(), 3);
    assert_eq!(answer.lines().count(), 3);
    assert_eq!(gateway.request(2).len(), 5);
}

#[tokio::test]
async fn test_gateway_failure_surfaces_without_partial_results() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(None, vec![call("1", "get_alerts", json!({"state": "CA"}))]),
        Err(GatewayError::Status {
            status: 500,
            body: "boom".into(),
        }
        .into()),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let mut conversation = Conversation::new(None, "q");
    let err = agent.run(&mut conversation).await.unwrap_err();

    assert!(matches!(err, ChatError::Gateway(GatewayError::Status { status: 500, .. })));
    assert_eq!(tool_messages(conversation.messages()).len(), 1);
    assert_eq!(conversation.messages().len(), 3);
    assert_eq!(
        conversation.output(),
        ["[Calling tool get_alerts with args {\"state\":\"CA\"}]"]
    );
}

#[tokio::test]
async fn test_unknown_tool_aborts_before_any_tool_runs() {
    let gateway = ScriptedGateway::new(vec![tool_turn(
        None,
        vec![
            call("1", "get_alerts", json!({"state": "CA"})),
            call("2", "get_tides", json!({})),
        ],
    )]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let mut conversation = Conversation::new(None, "tides?");
    let err = agent.run(&mut conversation).await.unwrap_err();

    assert!(matches!(err, ChatError::UnknownTool(ref name) if name == "get_tides"));
    assert!(tool_messages(conversation.messages()).is_empty());
    assert!(provider.called().is_empty());
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn test_provider_failure_stops_remaining_calls() {
    let gateway = ScriptedGateway::new(vec![tool_turn(
        None,
        vec![
            call("1", "get_alerts", json!({"state": "CA"})),
            call("2", "get_forecast", json!({"latitude": 0, "longitude": 0})),
            call("3", "get_alerts", json!({"state": "NV"})),
        ],
    )]);
    let provider = FakeProvider::failing_on("get_forecast");
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let mut conversation = Conversation::new(None, "q");
    let err = agent.run(&mut conversation).await.unwrap_err();

    assert!(matches!(err, ChatError::ProviderTransport(_)));
    assert_eq!(provider.called(), vec!["get_alerts", "get_forecast"]);
    let results = tool_messages(conversation.messages());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool_call_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_duplicate_call_ids_are_rejected() {
    let gateway = ScriptedGateway::new(vec![tool_turn(
        None,
        vec![
            call("same", "get_alerts", json!({"state": "CA"})),
            call("same", "get_alerts", json!({"state": "NV"})),
        ],
    )]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let err = agent.process_query("q").await.unwrap_err();
    assert!(matches!(err, ChatError::Gateway(GatewayError::Decode(_))));
    assert!(provider.called().is_empty());
}

#[tokio::test]
async fn test_turn_limit() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(None, vec![call("1", "get_alerts", json!({"state": "CA"}))]),
        tool_turn(None, vec![call("2", "get_alerts", json!({"state": "CA"}))]),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()))
        .with_max_turns(Some(2));

    let err = agent.process_query("loop forever").await.unwrap_err();

    assert!(matches!(err, ChatError::TurnLimitExceeded(2)));
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_system_prompt_leads_the_transcript() {
    let gateway = ScriptedGateway::new(vec![Ok(Message::assistant("ok"))]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()))
        .with_system_prompt(Some("Answer briefly.".into()));

    agent.process_query("hi").await.unwrap();

    let sent = gateway.request(0);
    assert_eq!(sent[0], Message::system("Answer briefly."));
    assert_eq!(sent[1], Message::user("hi"));
}

#[tokio::test]
async fn test_empty_text_is_not_emitted() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(Some(""), vec![call("1", "get_alerts", json!({"state": "CA"}))]),
        Ok(Message::assistant("final")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let answer = agent.process_query("q").await.unwrap();
    assert_eq!(
        answer,
        "[Calling tool get_alerts with args {\"state\":\"CA\"}]\nfinal"
    );
}

#[tokio::test]
async fn test_whitespace_text_is_kept() {
    let gateway = ScriptedGateway::new(vec![
        tool_turn(Some("  "), vec![call("1", "get_alerts", json!({"state": "CA"}))]),
        Ok(Message::assistant("final")),
    ]);
    let provider = FakeProvider::new();
    let agent = ConversationLoop::new(&gateway, ToolInvoker::new(&provider, weather_tools()));

    let mut conversation = Conversation::new(None, "q");
    agent.run(&mut conversation).await.unwrap();
    assert_eq!(conversation.output()[0], "  ");
    assert_eq!(conversation.output().len(), 3);
}
