// troubleshoot-gateway-rs/src/pipeline.rs
//
// Query in, validated scenario out:
// normalize -> system prompt -> model call -> decode + validate

use std::sync::Arc;

use llm_client::{build_system_prompt_with, LLMError, ModelClient};
use scenario_validation::{
    normalize_query, verify_step_chain, ParseError, Scenario, ScenarioResponseParser,
    SchemaOptions,
};
use serde_json::Value;
use thiserror::Error;

/// Every way a scenario request can fail. None of them are retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The caller's query is missing, not a string, or blank
    #[error("Invalid query provided: {0}")]
    Input(&'static str),

    /// The model provider rejected or failed the call
    #[error("Model call failed: {0}")]
    Upstream(#[from] LLMError),

    /// The model answered with text that is not a valid scenario
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Pull the `query` string out of a request body
pub fn query_from_body(body: &Value) -> Result<&str, PipelineError> {
    match body.get("query") {
        None | Some(Value::Null) => Err(PipelineError::Input("query is missing")),
        Some(Value::String(query)) => Ok(query),
        Some(_) => Err(PipelineError::Input("query must be a string")),
    }
}

pub struct ScenarioPipeline {
    model: Arc<dyn ModelClient>,
    parser: ScenarioResponseParser,
}

impl ScenarioPipeline {
    pub fn new(model: Arc<dyn ModelClient>, options: SchemaOptions) -> Self {
        Self {
            model,
            parser: ScenarioResponseParser::new(options),
        }
    }

    /// Whether generated scenarios carry follow-up recommendations
    pub fn include_recommendations(&self) -> bool {
        self.parser.validator().options().require_recommendations
    }

    pub fn model_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Run one query through the model and validate the answer
    pub async fn generate(&self, raw_query: &str) -> Result<Scenario, PipelineError> {
        if raw_query.trim().is_empty() {
            return Err(PipelineError::Input("query is blank"));
        }

        let query = normalize_query(raw_query);
        let system_prompt = build_system_prompt_with(&query, self.include_recommendations());
        tracing::info!("Generating scenario for query {:?}", query);

        let raw_text = self.model.complete(&system_prompt, &query).await.map_err(|e| {
            tracing::warn!("Model call failed for query {:?}: {}", query, e);
            e
        })?;

        let scenario = self.parser.parse(&raw_text)?;

        // Broken step chains are served as-is; the learner UI walks by index
        if let Err(e) = verify_step_chain(&scenario) {
            tracing::warn!("Scenario for {:?} has an inconsistent step chain: {}", query, e);
        }

        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct EchoModel {
        reply: Result<String, LLMError>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl EchoModel {
        fn new(reply: Result<String, LLMError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LLMError> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_message.to_string()));
            self.reply.clone()
        }
    }

    fn scenario_text() -> String {
        json!({
            "scenario": "Heat pump blows cold air in heat mode",
            "root_cause_analysis": "Reversing valve solenoid coil open",
            "steps": [{
                "id": 1,
                "prompt": "Outdoor unit runs, indoor air is cold. First check?",
                "correct_next": null,
                "correct_action": "Measure 24V at the reversing valve coil",
                "incorrect_options": [{
                    "choice": "Add refrigerant",
                    "feedback": "Charge is not verified and overcharging damages the compressor",
                    "severity": "high"
                }]
            }],
            "recommended_scenarios": [
                {"title": "Heat pump stuck in defrost"},
                {"title": "Auxiliary heat never engages"}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_query_from_body() {
        assert_eq!(query_from_body(&json!({"query": "No heat"})).unwrap(), "No heat");
        assert!(matches!(query_from_body(&json!({})), Err(PipelineError::Input(_))));
        assert!(matches!(query_from_body(&json!({"query": null})), Err(PipelineError::Input(_))));
        assert!(matches!(query_from_body(&json!({"query": 42})), Err(PipelineError::Input(_))));
    }

    #[tokio::test]
    async fn test_generate_sends_normalized_query() {
        let model = Arc::new(EchoModel::new(Ok(scenario_text())));
        let pipeline = ScenarioPipeline::new(model.clone(), SchemaOptions::default());

        let scenario = pipeline.generate("  heat pump <blows> cold  ").await.unwrap();
        assert_eq!(scenario.steps.len(), 1);

        let seen = model.seen.lock().unwrap();
        let (system_prompt, user_message) = &seen[0];
        assert_eq!(user_message, "heat pump blows cold?");
        assert!(system_prompt.contains("\"heat pump blows cold?\""));
    }

    #[tokio::test]
    async fn test_blank_query_skips_model() {
        let model = Arc::new(EchoModel::new(Ok(scenario_text())));
        let pipeline = ScenarioPipeline::new(model.clone(), SchemaOptions::default());

        let err = pipeline.generate("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let upstream = ScenarioPipeline::new(
            Arc::new(EchoModel::new(Err(LLMError::RateLimitExceeded("slow down".into())))),
            SchemaOptions::default(),
        );
        assert!(matches!(
            upstream.generate("No heat").await,
            Err(PipelineError::Upstream(LLMError::RateLimitExceeded(_)))
        ));

        let decode = ScenarioPipeline::new(
            Arc::new(EchoModel::new(Ok("Here is your scenario: {".into()))),
            SchemaOptions::default(),
        );
        assert!(matches!(decode.generate("No heat").await, Err(PipelineError::Parse(ParseError::Decode(_)))));

        let schema = ScenarioPipeline::new(
            Arc::new(EchoModel::new(Ok(r#"{"scenario": "x", "root_cause_analysis": "y"}"#.into()))),
            SchemaOptions::default(),
        );
        match schema.generate("No heat").await {
            Err(PipelineError::Parse(ParseError::Schema(e))) => assert_eq!(e.path(), "steps"),
            other => panic!("expected schema error, got {:?}", other.map(|s| s.scenario)),
        }
    }

    #[test]
    fn test_prompt_variant_follows_options() {
        let model: Arc<dyn ModelClient> = Arc::new(EchoModel::new(Ok(String::new())));
        assert!(ScenarioPipeline::new(model.clone(), SchemaOptions::default()).include_recommendations());
        assert!(!ScenarioPipeline::new(model, SchemaOptions::without_recommendations())
            .include_recommendations());
    }
}
