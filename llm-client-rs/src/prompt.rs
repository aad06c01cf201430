// llm-client-rs/src/prompt.rs
//
// System prompt for scenario generation. The query slot is filled with an
// already-normalized query wrapped in double quotes.

const QUERY_SLOT: &str = "{QUERY}";

const PROMPT_HEADER: &str = "[SYSTEM]
You're an HVAC instructor creating troubleshooting simulations. The situation you are teaching is in the PROBLEM section. Follow NATE guidelines and manufacturer specs.

[PROBLEM]
{QUERY}

[REQUIREMENTS]
1. Generate the troubleshooting steps for the problem. Be as concise as possible, but don't leave out crucial information.
2. For each step, create 2 incorrect choices and 1 correct choice:
   - Correct action = Standard diagnostic procedure
   - 2 incorrect choices = Common new technician errors
   - Feedback = Technical explanation + safety implications of the incorrect choices
3. Include voltage checks and wiring analysis.
";

const RECOMMENDATIONS_REQUIREMENT: &str = "4. Generate 2 related follow-up scenarios that would help the technician build their knowledge:
   - First scenario: A more complex problem with the same component
   - Second scenario: A problem with a different component in the same type of system
   - Each title should clearly describe the problem without mentioning specific components
";

const STEPS_SCHEMA: &str = r#"     "scenario": string,
     "root_cause_analysis": string,
     "steps": [
       {
         "id": number,
         "prompt": string,
         "correct_next": number | null,
         "correct_action": string,
         "incorrect_options": [
           {
             "choice": string,
             "feedback": string,
             "severity": "low"|"medium"|"high"
           },
           {
             "choice": string,
             "feedback": string,
             "severity": "low"|"medium"|"high"
           }
         ]
       }
     ]"#;

const RECOMMENDATIONS_SCHEMA: &str = r#",
     "recommended_scenarios": [
       {
         "title": string
       },
       {
         "title": string
       }
     ]"#;

/// Build the scenario-generation system prompt, including follow-up recommendations
pub fn build_system_prompt(normalized_query: &str) -> String {
    build_system_prompt_with(normalized_query, true)
}

/// Build the system prompt for either schema variant
pub fn build_system_prompt_with(normalized_query: &str, include_recommendations: bool) -> String {
    let mut prompt = PROMPT_HEADER.replace(QUERY_SLOT, &format!("\"{}\"", normalized_query));

    let format_item = if include_recommendations {
        prompt.push_str(RECOMMENDATIONS_REQUIREMENT);
        5
    } else {
        4
    };

    prompt.push_str(&format!(
        "{}. Format as valid JSON with properly escaped quotes and no line breaks within strings. \
         Respond with the JSON object only. The last step has \"correct_next\": null. \
         The JSON should match this schema:\n   {{\n",
        format_item
    ));
    prompt.push_str(STEPS_SCHEMA);
    if include_recommendations {
        prompt.push_str(RECOMMENDATIONS_SCHEMA);
    }
    prompt.push_str("\n   }");

    prompt
}
