use crate::domain::models::{AnswerValue, Question};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-question tally of how many responses gave each distinct answer value.
#[derive(Debug, Serialize, PartialEq)]
pub struct QuestionTally {
    pub question_id: String,
    pub question_text: String,
    pub counts: BTreeMap<String, u64>,
}

/// Aggregate raw counts over a survey's responses.
///
/// Output follows the survey's question order; answers keyed to question ids
/// that no longer exist on the survey are ignored. List-valued answers
/// contribute one count per selected label. Commutative over response order.
pub fn aggregate(
    questions: &[Question],
    answer_sets: &[BTreeMap<String, AnswerValue>],
) -> Vec<QuestionTally> {
    questions
        .iter()
        .map(|question| {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for answers in answer_sets {
                let Some(value) = answers.get(question.id()) else {
                    continue;
                };
                match value {
                    AnswerValue::Selected(options) => {
                        for option in options {
                            *counts.entry(option.clone()).or_insert(0) += 1;
                        }
                    }
                    AnswerValue::Text(s) => {
                        *counts.entry(s.clone()).or_insert(0) += 1;
                    }
                    AnswerValue::Rating(n) => {
                        *counts.entry(n.to_string()).or_insert(0) += 1;
                    }
                }
            }
            QuestionTally {
                question_id: question.id().to_string(),
                question_text: question.text().to_string(),
                counts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, AnswerValue)]) -> BTreeMap<String, AnswerValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn color_poll_scenario() {
        let questions = vec![Question::Choice {
            id: "0".into(),
            text: "Favorite color?".into(),
            choices: vec!["Red".into(), "Blue".into()],
        }];
        let sets = vec![
            answers(&[("0", AnswerValue::Text("Red".into()))]),
            answers(&[("0", AnswerValue::Text("Blue".into()))]),
        ];

        let tallies = aggregate(&questions, &sets);
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].question_id, "0");
        assert_eq!(tallies[0].counts.get("Red"), Some(&1));
        assert_eq!(tallies[0].counts.get("Blue"), Some(&1));
    }

    #[test]
    fn commutative_over_response_order() {
        let questions = vec![
            Question::Choice {
                id: "0".into(),
                text: "Pick".into(),
                choices: vec!["A".into(), "B".into()],
            },
            Question::Rating {
                id: "1".into(),
                text: "Rate".into(),
            },
        ];
        let mut sets = vec![
            answers(&[
                ("0", AnswerValue::Text("A".into())),
                ("1", AnswerValue::Rating(5)),
            ]),
            answers(&[
                ("0", AnswerValue::Text("B".into())),
                ("1", AnswerValue::Rating(3)),
            ]),
            answers(&[
                ("0", AnswerValue::Text("A".into())),
                ("1", AnswerValue::Rating(5)),
            ]),
        ];

        let forward = aggregate(&questions, &sets);
        sets.reverse();
        let backward = aggregate(&questions, &sets);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].counts.get("A"), Some(&2));
        assert_eq!(forward[1].counts.get("5"), Some(&2));
    }

    #[test]
    fn multi_select_counts_each_label() {
        let questions = vec![Question::Choice {
            id: "q".into(),
            text: "Pick any".into(),
            choices: vec!["A".into(), "B".into(), "C".into()],
        }];
        let sets = vec![
            answers(&[(
                "q",
                AnswerValue::Selected(vec!["A".into(), "C".into()]),
            )]),
            answers(&[("q", AnswerValue::Selected(vec!["A".into()]))]),
        ];

        let tallies = aggregate(&questions, &sets);
        assert_eq!(tallies[0].counts.get("A"), Some(&2));
        assert_eq!(tallies[0].counts.get("C"), Some(&1));
        assert_eq!(tallies[0].counts.get("B"), None);
    }

    #[test]
    fn stale_question_ids_are_dropped() {
        let questions = vec![Question::Text {
            id: "kept".into(),
            text: "Comment".into(),
        }];
        let sets = vec![answers(&[
            ("kept", AnswerValue::Text("fine".into())),
            ("removed", AnswerValue::Text("orphan".into())),
        ])];

        let tallies = aggregate(&questions, &sets);
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].counts.get("fine"), Some(&1));
    }

    #[test]
    fn output_follows_survey_question_order() {
        let questions = vec![
            Question::Text {
                id: "b".into(),
                text: "Second in answers".into(),
            },
            Question::Text {
                id: "a".into(),
                text: "First in answers".into(),
            },
        ];
        let sets = vec![answers(&[
            ("a", AnswerValue::Text("x".into())),
            ("b", AnswerValue::Text("y".into())),
        ])];

        let tallies = aggregate(&questions, &sets);
        assert_eq!(tallies[0].question_id, "b");
        assert_eq!(tallies[1].question_id, "a");
    }
}
