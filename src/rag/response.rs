//! RAG answers.

use serde::Serialize;

/// Outcome of answering a query.
///
/// Retrieval and generation are reported separately: `response` is `None` when
/// the documents were found but the completion endpoint could not produce text.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    /// Generated text, if generation succeeded.
    pub response: Option<String>,
    /// Titles of the retrieved documents, most similar first.
    pub titles: Vec<String>,
}

impl RagAnswer {
    /// Whether a generated response is available.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = match &self.response {
            Some(text) => text.clone(),
            None => "No response available.".to_string(),
        };

        if !self.titles.is_empty() {
            output.push_str("\n\n--- Retrieved Titles ---\n");
            for title in &self.titles {
                output.push_str(&format!("\n{}", title));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_response() {
        let answer = RagAnswer {
            response: Some("Cats are mammals.".to_string()),
            titles: vec!["a.txt".to_string(), "b.txt".to_string()],
        };
        assert!(answer.has_response());
        assert_eq!(
            answer.format_for_display(),
            "Cats are mammals.\n\n--- Retrieved Titles ---\n\na.txt\nb.txt"
        );
    }

    #[test]
    fn test_format_without_response_still_lists_titles() {
        let answer = RagAnswer {
            response: None,
            titles: vec!["a.txt".to_string()],
        };
        let text = answer.format_for_display();
        assert!(text.starts_with("No response available."));
        assert!(text.contains("a.txt"));
    }

    #[test]
    fn test_serializes_missing_response_as_null() {
        let answer = RagAnswer {
            response: None,
            titles: vec![],
        };
        let value = serde_json::to_value(&answer).unwrap();
        assert!(value["response"].is_null());
    }
}
