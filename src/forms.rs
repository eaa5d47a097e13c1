//! Schema-checked input parsing for every user-submitted form. Handlers only
//! ever see validated values; anything malformed stops here with a
//! user-facing message.

use crate::domain::models::{AccountRole, AnswerValue, Question};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const MIN_PASSWORD_LEN: usize = 6;

fn require_text(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "Please provide a valid email address.".to_string(),
        ));
    }
    Ok(email)
}

// ========== Registration / login ==========

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: AccountRole,
}

impl RegisterForm {
    pub fn validate(self) -> Result<Registration, AppError> {
        let username = require_text(&self.username, "Please choose a username.")?;
        let email = normalize_email(&self.email)?;
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        let role = AccountRole::parse(&self.role)
            .ok_or_else(|| AppError::Validation("Unknown account role.".to_string()))?;
        Ok(Registration {
            username,
            email,
            password: self.password,
            role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(self) -> Result<(String, String), AppError> {
        let email = normalize_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AppError::Validation("Please enter your password.".to_string()));
        }
        Ok((email, self.password))
    }
}

// ========== Survey authoring ==========

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub id: Option<String>,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub choices: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SurveyForm {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionInput>,
    pub end_date: DateTime<Utc>,
}

pub struct SurveyDraft {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub end_date: DateTime<Utc>,
}

fn build_question(
    index: usize,
    id: Option<&str>,
    text: &str,
    kind: &str,
    choices: Vec<String>,
) -> Result<Question, AppError> {
    // Stable ids survive edits; new questions fall back to their position.
    let id = match id {
        Some(given) if !given.trim().is_empty() => given.trim().to_string(),
        _ => index.to_string(),
    };
    let text = require_text(text, "Every question needs a text.")?;
    match kind {
        "text" => Ok(Question::Text { id, text }),
        "rating" => Ok(Question::Rating { id, text }),
        "choice" => {
            if choices.is_empty() {
                return Err(AppError::Validation(
                    "Choice questions need at least one option.".to_string(),
                ));
            }
            Ok(Question::Choice { id, text, choices })
        }
        other => Err(AppError::Validation(format!(
            "Unknown question type '{other}'."
        ))),
    }
}

fn validate_survey_fields(
    title: &str,
    description: Option<&str>,
    questions: Vec<Question>,
    end_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<SurveyDraft, AppError> {
    let title = require_text(title, "Please give the survey a title.")?;
    if questions.is_empty() {
        return Err(AppError::Validation(
            "Please add at least one question.".to_string(),
        ));
    }
    if end_date <= now {
        return Err(AppError::Validation(
            "The end date must be in the future.".to_string(),
        ));
    }
    Ok(SurveyDraft {
        title,
        description: description.unwrap_or_default().trim().to_string(),
        questions,
        end_date,
    })
}

impl SurveyForm {
    pub fn validate(self, now: DateTime<Utc>) -> Result<SurveyDraft, AppError> {
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let choices = q
                    .choices
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                build_question(i, q.id.as_deref(), &q.text, &q.kind, choices)
            })
            .collect::<Result<Vec<_>, _>>()?;
        validate_survey_fields(
            &self.title,
            self.description.as_deref(),
            questions,
            self.end_date,
            now,
        )
    }
}

/// Edit submissions arrive as parallel arrays, one slot per question row on
/// the authoring form. Choice labels come comma-separated in a single field.
#[derive(Debug, Deserialize)]
pub struct EditSurveyForm {
    pub title: String,
    pub description: Option<String>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub question_ids: Vec<String>,
    pub question_texts: Vec<String>,
    pub question_types: Vec<String>,
    #[serde(default)]
    pub question_choices: Vec<String>,
}

impl EditSurveyForm {
    pub fn validate(self, now: DateTime<Utc>) -> Result<SurveyDraft, AppError> {
        let questions = self
            .question_texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let kind = self.question_types.get(i).map(String::as_str).unwrap_or("");
                let choices = self
                    .question_choices
                    .get(i)
                    .map(String::as_str)
                    .unwrap_or("")
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                let id = self.question_ids.get(i).map(String::as_str);
                build_question(i, id, text, kind, choices)
            })
            .collect::<Result<Vec<_>, _>>()?;
        validate_survey_fields(
            &self.title,
            self.description.as_deref(),
            questions,
            self.end_date,
            now,
        )
    }
}

// ========== Participation ==========

#[derive(Debug, Deserialize)]
pub struct TakeSurveyForm {
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerValue>,
}

/// Extract one value per survey question from the submitted map.
///
/// Choice answers keep the selected label, ratings default to 0 when absent,
/// free text is trimmed. Any empty extracted value rejects the submission.
pub fn extract_answers(
    questions: &[Question],
    submitted: &BTreeMap<String, AnswerValue>,
) -> Result<BTreeMap<String, AnswerValue>, AppError> {
    let mut answers = BTreeMap::new();
    for question in questions {
        let value = match (question, submitted.get(question.id())) {
            (Question::Rating { .. }, None) => AnswerValue::Rating(0),
            (Question::Text { .. }, Some(AnswerValue::Text(s))) => {
                AnswerValue::Text(s.trim().to_string())
            }
            (_, Some(value)) => value.clone(),
            (_, None) => {
                return Err(AppError::IncompleteSubmission);
            }
        };
        if value.is_empty() {
            return Err(AppError::IncompleteSubmission);
        }
        answers.insert(question.id().to_string(), value);
    }
    Ok(answers)
}

// ========== Profile / search ==========

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub email: String,
    pub current_password: String,
    pub new_password: Option<String>,
}

pub struct ProfileUpdate {
    pub email: String,
    pub current_password: String,
    pub new_password: Option<String>,
}

impl ProfileForm {
    pub fn validate(self) -> Result<ProfileUpdate, AppError> {
        let email = normalize_email(&self.email)?;
        if self.current_password.is_empty() {
            return Err(AppError::Validation(
                "Please enter your current password.".to_string(),
            ));
        }
        let new_password = match self.new_password {
            Some(p) if !p.is_empty() => {
                if p.len() < MIN_PASSWORD_LEN {
                    return Err(AppError::Validation(format!(
                        "Password must be at least {MIN_PASSWORD_LEN} characters."
                    )));
                }
                Some(p)
            }
            _ => None,
        };
        Ok(ProfileUpdate {
            email,
            current_password: self.current_password,
            new_password,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tomorrow() -> DateTime<Utc> {
        Utc::now() + Duration::days(1)
    }

    fn question_input(text: &str, kind: &str, choices: Option<Vec<&str>>) -> QuestionInput {
        QuestionInput {
            id: None,
            text: text.to_string(),
            kind: kind.to_string(),
            choices: choices.map(|c| c.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn create_rejects_empty_question_list() {
        let form = SurveyForm {
            title: "Poll".into(),
            description: None,
            questions: vec![],
            end_date: tomorrow(),
        };
        assert!(matches!(
            form.validate(Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn create_rejects_past_end_date() {
        let form = SurveyForm {
            title: "Poll".into(),
            description: None,
            questions: vec![question_input("Q?", "text", None)],
            end_date: Utc::now() - Duration::hours(1),
        };
        assert!(matches!(
            form.validate(Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn create_builds_ordered_questions_with_positional_ids() {
        let form = SurveyForm {
            title: "Poll".into(),
            description: Some("  about colors  ".into()),
            questions: vec![
                question_input("Favorite color?", "choice", Some(vec!["Red", " Blue "])),
                question_input("Rate us", "rating", None),
            ],
            end_date: tomorrow(),
        };
        let draft = form.validate(Utc::now()).unwrap();
        assert_eq!(draft.description, "about colors");
        assert_eq!(
            draft.questions[0],
            Question::Choice {
                id: "0".into(),
                text: "Favorite color?".into(),
                choices: vec!["Red".into(), "Blue".into()],
            }
        );
        assert_eq!(
            draft.questions[1],
            Question::Rating {
                id: "1".into(),
                text: "Rate us".into(),
            }
        );
    }

    #[test]
    fn edit_rebuilds_from_parallel_arrays_reusing_stable_ids() {
        let form = EditSurveyForm {
            title: "Poll".into(),
            description: None,
            end_date: tomorrow(),
            question_ids: vec!["7".into(), "".into()],
            question_texts: vec!["Pick one".into(), "Comment".into()],
            question_types: vec!["choice".into(), "text".into()],
            question_choices: vec!["A, B, ,C".into()],
        };
        let draft = form.validate(Utc::now()).unwrap();
        assert_eq!(
            draft.questions[0],
            Question::Choice {
                id: "7".into(),
                text: "Pick one".into(),
                choices: vec!["A".into(), "B".into(), "C".into()],
            }
        );
        // Blank submitted id falls back to the positional index.
        assert_eq!(
            draft.questions[1],
            Question::Text {
                id: "1".into(),
                text: "Comment".into(),
            }
        );
    }

    #[test]
    fn choice_question_requires_options() {
        let form = EditSurveyForm {
            title: "Poll".into(),
            description: None,
            end_date: tomorrow(),
            question_ids: vec![],
            question_texts: vec!["Pick one".into()],
            question_types: vec!["choice".into()],
            question_choices: vec!["  ,  ".into()],
        };
        assert!(matches!(
            form.validate(Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn extract_requires_every_question_answered() {
        let questions = vec![
            Question::Text {
                id: "0".into(),
                text: "Comment".into(),
            },
            Question::Rating {
                id: "1".into(),
                text: "Rate".into(),
            },
        ];
        let submitted: BTreeMap<String, AnswerValue> =
            [("0".to_string(), AnswerValue::Text("fine".into()))].into();
        // Rating absent defaults to 0, which counts as unanswered.
        assert!(matches!(
            extract_answers(&questions, &submitted),
            Err(AppError::IncompleteSubmission)
        ));
    }

    #[test]
    fn extract_trims_text_and_keeps_labels() {
        let questions = vec![
            Question::Text {
                id: "0".into(),
                text: "Comment".into(),
            },
            Question::Choice {
                id: "1".into(),
                text: "Pick".into(),
                choices: vec!["Red".into(), "Blue".into()],
            },
            Question::Rating {
                id: "2".into(),
                text: "Rate".into(),
            },
        ];
        let submitted: BTreeMap<String, AnswerValue> = [
            ("0".to_string(), AnswerValue::Text("  great  ".into())),
            ("1".to_string(), AnswerValue::Text("Blue".into())),
            ("2".to_string(), AnswerValue::Rating(4)),
        ]
        .into();
        let answers = extract_answers(&questions, &submitted).unwrap();
        assert_eq!(answers["0"], AnswerValue::Text("great".into()));
        assert_eq!(answers["1"], AnswerValue::Text("Blue".into()));
        assert_eq!(answers["2"], AnswerValue::Rating(4));
    }

    #[test]
    fn extract_rejects_blank_text() {
        let questions = vec![Question::Text {
            id: "0".into(),
            text: "Comment".into(),
        }];
        let submitted: BTreeMap<String, AnswerValue> =
            [("0".to_string(), AnswerValue::Text("   ".into()))].into();
        assert!(matches!(
            extract_answers(&questions, &submitted),
            Err(AppError::IncompleteSubmission)
        ));
    }

    #[test]
    fn registration_normalizes_email_and_checks_role() {
        let form = RegisterForm {
            username: "  alice ".into(),
            email: " Alice@Example.COM ".into(),
            password: "longenough".into(),
            role: "respondent".into(),
        };
        let reg = form.validate().unwrap();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.email, "alice@example.com");
        assert_eq!(reg.role, AccountRole::Respondent);

        let bad_role = RegisterForm {
            username: "bob".into(),
            email: "bob@example.com".into(),
            password: "longenough".into(),
            role: "superuser".into(),
        };
        assert!(matches!(
            bad_role.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn profile_rejects_short_new_password() {
        let form = ProfileForm {
            email: "a@b.c".into(),
            current_password: "oldpass".into(),
            new_password: Some("abc".into()),
        };
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }
}
