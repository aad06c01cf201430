// llm-client-rs/src/tests.rs
// Tests for request shaping, provider error handling and the prompt template

#[cfg(test)]
mod tests {
    use crate::llm_client::{classify_status, extract_text, AnthropicClient, LLMError, MessagesResponse, ModelClient};
    use crate::prompt::{build_system_prompt, build_system_prompt_with};
    use config_rs::ModelSettings;
    use reqwest::StatusCode;
    use serde_json::json;

    fn settings(api_key: Option<&str>) -> ModelSettings {
        ModelSettings {
            api_key: api_key.map(str::to_string),
            ..ModelSettings::default()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let client = AnthropicClient::new(&settings(Some("test-key")));
        let request = client.build_request("system text", "Why no heat?");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "claude-3-haiku-20240307",
                "system": "system text",
                "messages": [{"role": "user", "content": "Why no heat?"}],
                "max_tokens": 4000
            })
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let client = AnthropicClient::new(&settings(None));
        assert!(!client.is_configured());

        let err = client.complete("system", "query?").await.unwrap_err();
        assert_eq!(err, LLMError::InvalidRequest("API key is not set".to_string()));
    }

    #[test]
    fn test_classify_status_uses_provider_message() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens: must be positive"}}"#;
        let err = classify_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err, LLMError::InvalidRequest("max_tokens: must be positive".to_string()));
        assert_eq!(err.message(), "max_tokens: must be positive");
    }

    #[test]
    fn test_classify_status_categories() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "{}"),
            LLMError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            LLMError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::from_u16(529).unwrap(), "overloaded"),
            LLMError::ServerError(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::IM_A_TEAPOT, ""),
            LLMError::UnknownError(_)
        ));
    }

    #[test]
    fn test_classify_status_fallback_message() {
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "   ").message(),
            "API call failed"
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream down").message(),
            "upstream down"
        );
    }

    #[test]
    fn test_extract_text_first_text_block() {
        let data: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "tool_use", "id": "x", "name": "noop", "input": {}},
                {"type": "text", "text": "{\"scenario\": \"x\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }))
        .unwrap();
        assert_eq!(extract_text(data).unwrap(), "{\"scenario\": \"x\"}");
    }

    #[test]
    fn test_extract_text_empty_content() {
        let data: MessagesResponse = serde_json::from_value(json!({"content": []})).unwrap();
        assert!(matches!(extract_text(data), Err(LLMError::ParseError(_))));
    }

    #[test]
    fn test_prompt_embeds_quoted_query() {
        let prompt = build_system_prompt("Why is the furnace short-cycling?");
        assert!(prompt.contains("[PROBLEM]\n\"Why is the furnace short-cycling?\""));
        assert!(!prompt.contains("{QUERY}"));
        assert!(prompt.contains("\"recommended_scenarios\""));
        assert!(prompt.contains("5. Format as valid JSON"));
    }

    #[test]
    fn test_prompt_without_recommendations() {
        let prompt = build_system_prompt_with("No cooling?", false);
        assert!(!prompt.contains("recommended_scenarios"));
        assert!(!prompt.contains("follow-up scenarios"));
        assert!(prompt.contains("4. Format as valid JSON"));
        assert!(prompt.trim_end().ends_with('}'));
    }
}
