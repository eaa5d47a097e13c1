use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Respondent,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Respondent => "respondent",
        }
    }

    pub fn parse(raw: &str) -> Option<AccountRole> {
        match raw {
            "admin" => Some(AccountRole::Admin),
            "respondent" => Some(AccountRole::Respondent),
            _ => None,
        }
    }
}

/// One question definition inside a survey's ordered question list.
///
/// Stored as a JSONB array on the survey row, discriminated by `type`, so the
/// shape and order submitted by the author survive edits byte-for-byte.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Question {
    Text { id: String, text: String },
    Rating { id: String, text: String },
    Choice { id: String, text: String, choices: Vec<String> },
}

impl Question {
    pub fn id(&self) -> &str {
        match self {
            Question::Text { id, .. } => id,
            Question::Rating { id, .. } => id,
            Question::Choice { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Text { text, .. } => text,
            Question::Rating { text, .. } => text,
            Question::Choice { text, .. } => text,
        }
    }
}

/// A single submitted answer value. Ratings arrive as integers, free-text and
/// selected option labels as strings, multi-select as a list of labels.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
    Rating(i64),
    Text(String),
    Selected(Vec<String>),
}

impl AnswerValue {
    /// Empty/falsy check used by the submission completeness rule.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Rating(n) => *n == 0,
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Selected(items) => items.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_list_round_trips_in_order() {
        let questions = vec![
            Question::Choice {
                id: "0".into(),
                text: "Favorite color?".into(),
                choices: vec!["Red".into(), "Blue".into()],
            },
            Question::Rating {
                id: "1".into(),
                text: "Rate us".into(),
            },
            Question::Text {
                id: "2".into(),
                text: "Any comments?".into(),
            },
        ];

        let json = serde_json::to_string(&questions).unwrap();
        let back: Vec<Question> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, questions);
    }

    #[test]
    fn question_tag_matches_stored_format() {
        let q = Question::Choice {
            id: "5".into(),
            text: "Pick one".into(),
            choices: vec!["A".into()],
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "choice");
        assert_eq!(value["id"], "5");
        assert_eq!(value["choices"][0], "A");
    }

    #[test]
    fn answer_values_deserialize_untagged() {
        let rating: AnswerValue = serde_json::from_str("4").unwrap();
        assert_eq!(rating, AnswerValue::Rating(4));

        let text: AnswerValue = serde_json::from_str("\"Blue\"").unwrap();
        assert_eq!(text, AnswerValue::Text("Blue".into()));

        let multi: AnswerValue = serde_json::from_str("[\"A\",\"B\"]").unwrap();
        assert_eq!(multi, AnswerValue::Selected(vec!["A".into(), "B".into()]));
    }

    #[test]
    fn emptiness_rules() {
        assert!(AnswerValue::Rating(0).is_empty());
        assert!(!AnswerValue::Rating(3).is_empty());
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(AnswerValue::Selected(vec![]).is_empty());
    }
}
