use std::sync::LazyLock;

use regex::Regex;

/// JSON payload of a model reply: reasoning blocks dropped, fenced code
/// unwrapped, surrounding prose trimmed off the outermost object
pub fn extract_json_block(s: &str) -> String {
    let s = REGEX_REASONING_BLOCK.replace_all(s, "");

    if let Some(captures) = REGEX_FENCED_BLOCK.captures(&s) {
        return captures[1].trim().to_string();
    }

    match (s.find('{'), s.rfind('}')) {
        (Some(start), Some(end)) if start < end => s[start..=end].to_string(),
        _ => s.trim().to_string(),
    }
}

static REGEX_FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[^\n]*\n([\s\S]*?)\n\s*```").expect("FENCED_BLOCK regex is invalid")
});
static REGEX_REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(think|thinking|reasoning)>[\s\S]*?</(think|thinking|reasoning)>")
        .expect("REASONING_BLOCK regex is invalid")
});

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block(r#"{"foo": "bar"}"#), r#"{"foo": "bar"}"#);
        assert_eq!(extract_json_block("  plain  "), "plain");

        assert_eq!(
            extract_json_block(
                r#"
```json
{"recommendation": "BUY"}
```
"#
            ),
            r#"{"recommendation": "BUY"}"#
        );

        let json = extract_json_block(
            r#"
<think>
Weighing {"draft": true} against the peers...
</think>

Here is my verdict:
{
    "foo": "bar"
}
Hope this helps.
"#,
        );
        let map: HashMap<String, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(map.get("foo").map(String::as_str), Some("bar"));
    }

    #[test]
    fn test_extract_json_block_keeps_markup_in_values() {
        let reply = r#"<thinking>Draft {"risks": []}</thinking>
{"risks": ["<b>High</b> leverage"]}"#;

        let json = extract_json_block(reply);
        assert_eq!(json, r#"{"risks": ["<b>High</b> leverage"]}"#);
    }
}
