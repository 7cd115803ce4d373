use super::{ChatMessage, ChatRequest};

const SYSTEM_PROMPT: &str = "Always respond with a valid JSON object.";

const ANALYSIS_TEMPLATE: &str = "\
Analyze this code and return JSON with:
1. code_quality_rating (integer 0-10) covering every aspect of the code, \
plus rating_reason explaining the rating.
2. tech_stack (list of frameworks/libraries), each with a name and a brief description.
3. total_functions (count) and function_names (list of names).
4. total_loops (count of loops or recursions).
5. total_classes (count) and class_names (list of names).

Code:
";

/// Build the per-file analysis request.
pub fn analysis_request(model: &str, code: &str) -> ChatRequest {
    let content = format!("{ANALYSIS_TEMPLATE}{code}\n\nReturn ONLY valid JSON:");
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(content)],
        format: Some("json".to_string()),
    }
}

/// Build the escalation request that asks a (smaller) model to extract or fix
/// the JSON buried in a malformed response.
pub fn repair_request(model: &str, broken: &str) -> ChatRequest {
    let content = format!(
        "Extract the valid JSON from this string. If it is not valid JSON, fix it \
and reply with only the JSON. Here is the string: {broken}"
    );
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user(content)],
        format: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn analysis_request_embeds_code_and_hint() {
        let request = analysis_request("deepseek-r1", "def f():\n    pass");
        assert_eq!(request.model, "deepseek-r1");
        assert_eq!(request.format.as_deref(), Some("json"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[1].content.contains("def f():"));
        assert!(request.messages[1].content.contains("code_quality_rating"));
    }

    #[test]
    fn repair_request_carries_broken_text() {
        let request = repair_request("llama3.2", "{\"a\": 1,");
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.contains("{\"a\": 1,"));
        assert!(request.format.is_none());
    }
}
