//! Built-in "Discover your Bear Type" quiz.

use std::collections::BTreeMap;

use super::definition::{AnswerOption, CategoryDef, QuestionDef, QuizDefinition};

pub const CHRONIC_PLANNER: &str = "Chronic Planner Bear";
pub const APPROVAL_SEEKER: &str = "Approval Seeker Bear";
pub const PSEUDO_PRODUCTIVE: &str = "Pseudo-Productive Bear";

const PLAN_FOOTER: &str = "✨ Finished your chores?\n\
Action plan in my description. (\"information about the bot\" is above)";

fn plan(steps: [&str; 3]) -> String {
    format!(
        "✅ Your weekly plan:\n1. Day 1: {}\n2. Day 3: {}\n3. Day 5: {}\n{PLAN_FOOTER}",
        steps[0], steps[1], steps[2]
    )
}

/// One question where A/B/C score planner/approval/pseudo by `weight`.
fn question(prompt: &str, labels: [&str; 3], weight: i64) -> QuestionDef {
    let options = [("A", CHRONIC_PLANNER), ("B", APPROVAL_SEEKER), ("C", PSEUDO_PRODUCTIVE)]
        .into_iter()
        .zip(labels)
        .map(|((code, category), label)| AnswerOption {
            code: code.to_string(),
            label: label.to_string(),
            deltas: BTreeMap::from([(category.to_string(), weight)]),
        })
        .collect();
    QuestionDef {
        prompt: prompt.to_string(),
        options,
    }
}

/// The default quiz shipped with the bot.
pub fn bear_type_quiz() -> QuizDefinition {
    QuizDefinition {
        intro: Some("🐻 **Discover your Bear Type!**".to_string()),
        categories: vec![
            CategoryDef {
                name: CHRONIC_PLANNER.to_string(),
                plan: plan([
                    "Take action WITHOUT preparation.",
                    "20 minutes of pure action with a timer.",
                    "Write down a risk worth taking.",
                ]),
            },
            CategoryDef {
                name: APPROVAL_SEEKER.to_string(),
                plan: plan([
                    "Make a decision independently.",
                    "Write down 3 personal achievements.",
                    "Run a solo experiment.",
                ]),
            },
            CategoryDef {
                name: PSEUDO_PRODUCTIVE.to_string(),
                plan: plan([
                    "Drop 3 secondary tasks.",
                    "Spend 1 hour on your main goal.",
                    "Assess your actual contribution.",
                ]),
            },
        ],
        questions: vec![
            question(
                "How do you usually start working toward a new goal?",
                [
                    "I create a detailed plan",
                    "I talk it over with others",
                    "I just start doing something",
                ],
                2,
            ),
            question(
                "What is the hardest part of achieving goals for you?",
                [
                    "Starting without guaranteed success",
                    "Making decisions without approval",
                    "Staying focused on the main task",
                ],
                1,
            ),
            question(
                "How do you react to mistakes?",
                [
                    "I analyze and replan",
                    "I ask for advice",
                    "I switch to something else",
                ],
                1,
            ),
        ],
    }
}
