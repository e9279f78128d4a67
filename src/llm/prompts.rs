//! Prompt templates for grounded answering and summarization

use std::collections::HashMap;

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill in the template with variables; unknown placeholders are left as-is.
    ///
    /// Substituted values are written verbatim and never scanned for placeholders.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let mut output = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find("{{") {
            output.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            let Some(close) = after_open.find("}}") else {
                // unterminated, keep the tail literally
                output.push_str(&rest[open..]);
                return output;
            };

            let name = &after_open[..close];
            match values.get(name) {
                Some(value) => output.push_str(value),
                None => {
                    output.push_str("{{");
                    output.push_str(name);
                    output.push_str("}}");
                }
            }
            rest = &after_open[close + 2..];
        }

        output.push_str(rest);
        output
    }
}

/// Standard QA prompt templates
pub struct QaPrompts;

impl QaPrompts {
    /// User content for a grounded answer
    #[must_use]
    pub fn grounded_question() -> PromptTemplate {
        PromptTemplate::new(
            "Answer the following question based on the context provided:\n\nQuestion:\n{{question}}\n\nContext:\n{{context}}",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let values = HashMap::from([("name", "Alice")]);
        assert_eq!(template.render(&values), "Hello Alice!");
    }

    #[test]
    fn test_grounded_question_layout() {
        let values = HashMap::from([("question", "How to learn GenAI?"), ("context", "Take a course.")]);
        let rendered = QaPrompts::grounded_question().render(&values);
        assert!(rendered.contains("Question:\nHow to learn GenAI?"));
        assert!(rendered.ends_with("Context:\nTake a course."));
    }

    #[test]
    fn test_missing_value_keeps_placeholder() {
        let template = PromptTemplate::new("{{question}} / {{context}}");
        let values = HashMap::from([("question", "q")]);
        assert_eq!(template.render(&values), "q / {{context}}");
    }

    #[test]
    fn test_placeholder_inside_value_is_not_expanded() {
        let values = HashMap::from([
            ("question", "What does {{context}} mean in a prompt?"),
            ("context", "Retrieved post body."),
        ]);
        let rendered = QaPrompts::grounded_question().render(&values);
        assert!(rendered.contains("Question:\nWhat does {{context}} mean in a prompt?"));
        assert_eq!(rendered.matches("Retrieved post body.").count(), 1);
    }

    #[test]
    fn test_repeated_and_unterminated_placeholders() {
        let template = PromptTemplate::new("{{a}}-{{a}} {{b");
        let values = HashMap::from([("a", "x"), ("b", "y")]);
        assert_eq!(template.render(&values), "x-x {{b");
    }
}
