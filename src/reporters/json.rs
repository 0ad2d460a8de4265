//! JSON reporter
//!
//! Outputs the RunResult as pretty-printed JSON, plus the summary line and
//! the exit status the run maps to.

use crate::models::RunResult;
use anyhow::Result;
use serde_json::{json, Value};

/// Render result as JSON
pub fn render(result: &RunResult) -> Result<String> {
    let mut value = serde_json::to_value(result)?;
    if let Value::Object(map) = &mut value {
        map.insert("summary".into(), json!(result.summary_line()));
        map.insert("exit_code".into(), json!(result.exit_code()));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_json_render_valid() {
        let result = test_result();
        let json_str = render(&result).expect("render JSON");
        let parsed: Value = serde_json::from_str(&json_str).expect("parse JSON");

        assert_eq!(parsed["messages"].as_array().expect("messages array").len(), 3);
        assert_eq!(parsed["messages"][0]["severity"], "error");
        assert_eq!(parsed["counts"]["warnings"], 2);
        assert_eq!(parsed["exit_code"], 64);
        assert_eq!(
            parsed["summary"],
            "1 packages and 0 specfiles checked; 1 errors, 2 warnings."
        );
        assert!(parsed.get("explanations").is_none());
    }

    #[test]
    fn test_json_empty_run() {
        let json_str = render(&RunResult::default()).expect("render JSON");
        let parsed: Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["messages"].as_array().expect("messages array").len(), 0);
        assert_eq!(parsed["exit_code"], 0);
    }
}
