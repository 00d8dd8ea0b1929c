use serde::Serialize;

use crate::entity_type::EntityType;
use crate::normalize::{normalize_bool, AnswerType, ANSWER_TYPES};
use crate::registry::ReferenceRegistry;
use crate::row::Row;

use super::{Payload, RowTransformer, TransformResult};

const CHOICE_SEPARATOR: &str = "//";

#[derive(Debug, Serialize)]
struct FeedbackQuestionBody {
    #[serde(flatten)]
    columns: Row,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_type: Option<AnswerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_team: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_adj: Option<bool>,
    choices: Vec<String>,
}

pub struct FeedbackQuestionTransformer;

impl RowTransformer for FeedbackQuestionTransformer {
    fn transform(&self, _registry: &ReferenceRegistry, mut row: Row) -> TransformResult {
        let answer_type = row.take("answer_type");
        let required = row.take("required");
        let from_team = row.take("from_team");
        let from_adj = row.take("from_adj");
        let choices = row
            .take_text("choices")
            .map(|c| c.split(CHOICE_SEPARATOR).map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();

        let body = FeedbackQuestionBody {
            answer_type: ANSWER_TYPES.get_cell(answer_type.as_ref()),
            required: normalize_bool(required.as_ref()),
            from_team: normalize_bool(from_team.as_ref()),
            from_adj: normalize_bool(from_adj.as_ref()),
            choices,
            columns: row,
        };
        Payload::create(EntityType::FeedbackQuestions, &body)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feedback_question() {
        let registry = ReferenceRegistry::new();
        let row = Row::new()
            .with("reference", "agree")
            .with("text", "Did you agree with the decision?")
            .with("seq", 1)
            .with("answer_type", "Single Select")
            .with("required", "yes")
            .with("from_team", 1)
            .with("from_adj", "n")
            .with("choices", "Yes//No//Partially");

        let payload = FeedbackQuestionTransformer.transform(&registry, row).unwrap();

        assert_eq!(payload.body, json!({
            "reference": "agree",
            "text": "Did you agree with the decision?",
            "seq": 1,
            "answer_type": "ss",
            "required": true,
            "from_team": true,
            "from_adj": false,
            "choices": ["Yes", "No", "Partially"],
        }));
    }

    #[test]
    fn test_feedback_question_without_choices() {
        let registry = ReferenceRegistry::new();
        let row = Row::new().with("reference", "score").with("answer_type", "integer scale");

        let payload = FeedbackQuestionTransformer.transform(&registry, row).unwrap();

        assert_eq!(payload.body, json!({"reference": "score", "answer_type": "is", "choices": []}));
    }
}
