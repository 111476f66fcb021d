//! Prompt strings.

use crossterm::style::Stylize;

/// Prompt shown while a statement is being buffered.
pub const CONTINUATION_PROMPT: &str = "    -> ";

const APP_NAME: &str = "clusterdba";
const ARROWS: &str = " »»» ";

/// Builds the idle prompt for the current session.
///
/// `clusterdba »»» `, `clusterdba[prod] »»» ` or `clusterdba[prod(test)] »»» `.
pub fn prompt(cluster: &str, schema: &str, colored: bool) -> String {
    if !colored {
        return match (cluster.is_empty(), schema.is_empty()) {
            (true, _) => format!("{APP_NAME}{ARROWS}"),
            (false, true) => format!("{APP_NAME}[{cluster}]{ARROWS}"),
            (false, false) => format!("{APP_NAME}[{cluster}({schema})]{ARROWS}"),
        };
    }

    let mut out = APP_NAME.green().to_string();
    if !cluster.is_empty() {
        out.push_str(&"[".green().to_string());
        out.push_str(&cluster.magenta().to_string());
        if !schema.is_empty() {
            out.push_str(&"(".magenta().to_string());
            out.push_str(&schema.red().to_string());
            out.push_str(&")".magenta().to_string());
        }
        out.push_str(&"]".green().to_string());
    }
    out.push_str(&ARROWS.green().to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompts() {
        assert_eq!(prompt("", "", false), "clusterdba »»» ");
        assert_eq!(prompt("", "test", false), "clusterdba »»» ");
        assert_eq!(prompt("prod", "", false), "clusterdba[prod] »»» ");
        assert_eq!(prompt("prod", "test", false), "clusterdba[prod(test)] »»» ");
    }

    #[test]
    fn test_colored_prompt_keeps_text() {
        let colored = prompt("prod", "test", true);
        assert!(colored.contains("prod"));
        assert!(colored.contains("test"));
        assert!(colored.contains("»»»"));
    }
}
