//! Conversion between internal types and `OpenAI` wire format

use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk,
    OpenAiStreamOptions, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::types::{
    Choice, ChoiceMessage, CompletionRequest, CompletionResponse, FinishReason, FunctionCall, Message, StreamDelta,
    StreamEvent, ToolCall, ToolChoice, ToolDefinition, Usage,
};

// -- Outbound: internal request -> OpenAI wire request --

impl From<&CompletionRequest> for OpenAiRequest {
    fn from(req: &CompletionRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: req.params.temperature,
            max_tokens: req.params.max_tokens,
            stream: req.stream.then_some(true),
            tools: req
                .tools
                .as_ref()
                .map(|tools| tools.iter().map(Into::into).collect()),
            tool_choice: req.tool_choice.map(|choice| tool_choice_str(choice).to_owned()),
            stream_options: req
                .stream
                .then_some(OpenAiStreamOptions { include_usage: true }),
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let (content, tool_calls, tool_call_id) = match msg {
            Message::System { content } | Message::User { content } => (Some(content.clone()), None, None),
            Message::Assistant { content, tool_calls } => {
                let calls = (!tool_calls.is_empty()).then(|| tool_calls.iter().map(Into::into).collect());
                (content.clone(), calls, None)
            }
            Message::Tool { tool_call_id, content } => (Some(content.clone()), None, Some(tool_call_id.clone())),
        };

        Self {
            role: msg.role().as_str().to_owned(),
            content,
            tool_calls,
            tool_call_id,
        }
    }
}

impl From<&ToolCall> for OpenAiToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            tool_type: "function".to_owned(),
            function: OpenAiFunctionCall {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            },
        }
    }
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: tool.tool_type.clone(),
            function: OpenAiFunction {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                parameters: tool.function.parameters.clone(),
            },
        }
    }
}

const fn tool_choice_str(choice: ToolChoice) -> &'static str {
    match choice {
        ToolChoice::Auto => "auto",
    }
}

// -- Inbound: OpenAI wire response -> internal types --

impl From<OpenAiResponse> for CompletionResponse {
    fn from(resp: OpenAiResponse) -> Self {
        Self {
            id: resp.id,
            model: resp.model,
            choices: resp
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: ChoiceMessage {
                        content: c.message.content,
                        tool_calls: c
                            .message
                            .tool_calls
                            .unwrap_or_default()
                            .into_iter()
                            .map(Into::into)
                            .collect(),
                    },
                    finish_reason: c.finish_reason.as_deref().and_then(parse_finish_reason),
                })
                .collect(),
            usage: resp.usage.map(Into::into),
        }
    }
}

impl From<OpenAiToolCall> for ToolCall {
    fn from(call: OpenAiToolCall) -> Self {
        Self {
            id: call.id,
            function: FunctionCall {
                name: call.function.name,
                arguments: call.function.arguments,
            },
        }
    }
}

impl From<OpenAiUsage> for Usage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

// -- Stream conversion --

/// Convert an `OpenAI` stream chunk into internal stream events
pub fn openai_chunk_to_events(chunk: OpenAiStreamChunk) -> Vec<StreamEvent> {
    let deltas = chunk.choices.into_iter().map(|choice| {
        StreamEvent::Delta(StreamDelta {
            index: choice.index,
            content: choice.delta.content,
            finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
        })
    });

    deltas
        .chain(chunk.usage.map(|usage| StreamEvent::Usage(usage.into())))
        .collect()
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::CompletionParams;

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_owned(),
            messages,
            params: CompletionParams::default(),
            tools: None,
            tool_choice: None,
            stream: false,
        }
    }

    #[test]
    fn request_without_tools_omits_tool_fields() {
        let wire = OpenAiRequest::from(&request(vec![Message::user("hello")]));
        let body = serde_json::to_value(&wire).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("stream").is_none());
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hello"}]));
    }

    #[test]
    fn tools_and_auto_choice_are_sent() {
        let mut req = request(vec![Message::user("find rivers")]);
        req.tools = Some(vec![ToolDefinition::function(
            "search_catalogue",
            Some("Search the catalogue".to_owned()),
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        )]);
        req.tool_choice = Some(ToolChoice::Auto);

        let body = serde_json::to_value(OpenAiRequest::from(&req)).unwrap();

        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "search_catalogue");
        assert_eq!(body["tools"][0]["function"]["parameters"]["properties"]["query"]["type"], "string");
    }

    #[test]
    fn tool_call_exchange_serializes_in_provider_shape() {
        let assistant = Message::Assistant {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_owned(),
                function: FunctionCall {
                    name: "search_catalogue".to_owned(),
                    arguments: r#"{"query":"water quality"}"#.to_owned(),
                },
            }],
        };
        let result = Message::tool("call_1", "Found 3 results...");

        let body = serde_json::to_value(OpenAiRequest::from(&request(vec![assistant, result]))).unwrap();

        assert_eq!(
            body["messages"],
            json!([
                {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search_catalogue", "arguments": "{\"query\":\"water quality\"}"}
                    }]
                },
                {"role": "tool", "content": "Found 3 results...", "tool_call_id": "call_1"}
            ])
        );
    }

    #[test]
    fn streaming_request_asks_for_usage() {
        let mut req = request(vec![Message::user("hi")]);
        req.stream = true;

        let wire = OpenAiRequest::from(&req);

        assert_eq!(wire.stream, Some(true));
        assert!(wire.stream_options.is_some_and(|o| o.include_usage));
    }

    #[test]
    fn response_keeps_tool_call_order() {
        let wire: OpenAiResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "list_tags", "arguments": "{}"}},
                        {"id": "b", "type": "function", "function": {"name": "get_record", "arguments": "{\"uuid\":\"x\"}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = CompletionResponse::from(wire);
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::ToolCalls));

        let message = response.into_message();
        let ids: Vec<_> = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(message.content.is_none());
    }

    #[test]
    fn chunk_with_usage_yields_delta_then_usage() {
        let chunk: OpenAiStreamChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 0,
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }))
        .unwrap();

        let events = openai_chunk_to_events(chunk);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Delta(StreamDelta::text("Hel")));
        assert!(matches!(events[1], StreamEvent::Usage(Usage { total_tokens: 4, .. })));
    }
}
