//! Prompt construction for career insights

use serde::Serialize;

use super::client::ChatMessage;
use crate::types::AnalyticsSummary;

/// Number of ranked categories included in the prompt
pub const PROMPT_CATEGORIES: usize = 3;

/// The summary fields an insight is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightRequest {
    /// Top categories joined with `", "`
    pub top_categories: String,
    pub total_achievements: u64,
    pub consistency: u32,
}

impl InsightRequest {
    /// Build a request, or `None` when the summary has no categories.
    pub fn from_summary(summary: &AnalyticsSummary) -> Option<Self> {
        if !summary.has_categories() {
            return None;
        }
        Some(Self {
            top_categories: summary.top_categories(PROMPT_CATEGORIES).join(", "),
            total_achievements: summary.total_achievements,
            consistency: summary.consistency,
        })
    }

    pub fn render_prompt(&self) -> String {
        format!(
            "Based on the user's career data:\n\
             - Top skill categories: {}\n\
             - Total achievements logged: {}\n\
             - Consistency score: {}%\n\
             \n\
             Provide 3-4 brief, actionable career insights and recommendations. Focus on:\n\
             1. Career paths that align with their strengths\n\
             2. Skills they should develop further\n\
             3. Specific action items to improve their career trajectory\n\
             \n\
             Format each insight as a bullet point starting with \"- \" and make each one \
             clear, specific and concise. Keep each bullet point to 1-2 sentences maximum.",
            self.top_categories, self.total_achievements, self.consistency
        )
    }

    /// The single-message conversation sent to the chat endpoint.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::user(self.render_prompt())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryCount;

    fn summary(categories: &[(&str, u64)]) -> AnalyticsSummary {
        AnalyticsSummary {
            total_achievements: categories.iter().map(|(_, n)| n).sum(),
            consistency: 40,
            achievements_by_category: categories
                .iter()
                .map(|(c, n)| CategoryCount {
                    category: c.to_string(),
                    count: *n,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_request_without_categories() {
        assert!(InsightRequest::from_summary(&AnalyticsSummary::default()).is_none());
    }

    #[test]
    fn test_prompt_embeds_top_three() {
        let request = InsightRequest::from_summary(&summary(&[
            ("Leadership", 5),
            ("Technical", 3),
            ("Mentoring", 2),
            ("Writing", 1),
        ]))
        .unwrap();

        assert_eq!(request.top_categories, "Leadership, Technical, Mentoring");
        let prompt = request.render_prompt();
        assert!(prompt.contains("Top skill categories: Leadership, Technical, Mentoring\n"));
        assert!(prompt.contains("Total achievements logged: 11\n"));
        assert!(prompt.contains("Consistency score: 40%\n"));
        assert!(prompt.contains("starting with \"- \""));
        assert!(!prompt.contains("Writing"));

        let messages = request.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }
}
