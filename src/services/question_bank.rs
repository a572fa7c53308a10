// src/services/question_bank.rs

//! The fixed question set and per-session shuffled snapshots.

use std::collections::HashMap;

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::{
    error::AppError,
    models::question::{Question, QuestionRef},
};

type Entry = (u32, &'static str, [&'static str; 4], u8);

const BUILTIN_QUESTIONS: [Entry; 20] = [
    (
        1,
        "What is the correct way to create a React component?",
        [
            "function MyComponent() { return <div>Hello</div>; }",
            "const MyComponent = () => { return <div>Hello</div>; }",
            "class MyComponent extends React.Component { render() { return <div>Hello</div>; } }",
            "All of the above",
        ],
        3,
    ),
    (
        2,
        "Which hook is used to manage state in functional components?",
        ["useEffect", "useState", "useContext", "useReducer"],
        1,
    ),
    (
        3,
        "What is the purpose of useEffect hook?",
        [
            "To manage component state",
            "To handle side effects in functional components",
            "To create context",
            "To optimize performance",
        ],
        1,
    ),
    (
        4,
        "Which method is used to update state in a class component?",
        [
            "this.state = newState",
            "this.setState(newState)",
            "this.updateState(newState)",
            "this.changeState(newState)",
        ],
        1,
    ),
    (
        5,
        "What is JSX?",
        [
            "A JavaScript library",
            "A syntax extension for JavaScript",
            "A CSS framework",
            "A database query language",
        ],
        1,
    ),
    (
        6,
        "Which of the following is NOT a valid way to pass data to a component?",
        ["Props", "State", "Context", "Variables"],
        3,
    ),
    (
        7,
        "What is the virtual DOM?",
        [
            "A copy of the real DOM kept in memory",
            "A new version of HTML",
            "A CSS framework",
            "A JavaScript library",
        ],
        0,
    ),
    (
        8,
        "Which lifecycle method is called after a component is mounted?",
        [
            "componentWillMount",
            "componentDidMount",
            "componentWillUpdate",
            "componentDidUpdate",
        ],
        1,
    ),
    (
        9,
        "What is the correct way to handle events in React?",
        [
            "onclick=\"handleClick()\"",
            "onClick={handleClick}",
            "onClick=\"handleClick()\"",
            "onCLick={handleClick()}",
        ],
        1,
    ),
    (
        10,
        "Which of the following is used to optimize React app performance?",
        ["React.memo", "useMemo", "useCallback", "All of the above"],
        3,
    ),
    (
        11,
        "What is the purpose of keys in React lists?",
        [
            "To style list items",
            "To help React identify which items have changed",
            "To sort the list",
            "To filter the list",
        ],
        1,
    ),
    (
        12,
        "Which HTTP method is typically used to create new resources?",
        ["GET", "POST", "PUT", "DELETE"],
        1,
    ),
    (
        13,
        "What does REST stand for?",
        [
            "Representational State Transfer",
            "Remote State Transfer",
            "Relational State Transfer",
            "Reactive State Transfer",
        ],
        0,
    ),
    (
        14,
        "Which status code indicates a successful HTTP request?",
        ["404", "500", "200", "301"],
        2,
    ),
    (
        15,
        "What is the purpose of middleware in Express.js?",
        [
            "To handle database connections",
            "To execute code during the request-response cycle",
            "To render HTML templates",
            "To manage user sessions",
        ],
        1,
    ),
    (
        16,
        "Which of the following is a NoSQL database?",
        ["MySQL", "PostgreSQL", "MongoDB", "SQLite"],
        2,
    ),
    (
        17,
        "What is the purpose of JWT (JSON Web Token)?",
        [
            "To store user passwords",
            "To authenticate and authorize users",
            "To encrypt database connections",
            "To compress JSON data",
        ],
        1,
    ),
    (
        18,
        "Which CSS property is used to create flexbox layouts?",
        ["display: flex", "layout: flex", "flex: true", "flexbox: enabled"],
        0,
    ),
    (
        19,
        "What is the difference between '==' and '===' in JavaScript?",
        [
            "No difference",
            "'==' checks type and value, '===' checks only value",
            "'===' checks type and value, '==' checks only value",
            "'===' is faster than '=='",
        ],
        2,
    ),
    (
        20,
        "Which of the following is NOT a JavaScript data type?",
        ["string", "boolean", "integer", "undefined"],
        2,
    ),
];

/// Immutable, ordered collection of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<u32, usize>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.id, idx))
            .collect();
        Self { questions, by_id }
    }

    /// The static 20-question set served by the application.
    pub fn builtin() -> Self {
        let questions = BUILTIN_QUESTIONS
            .iter()
            .map(|(id, text, options, correct)| Question {
                id: *id,
                text: (*text).to_string(),
                options: options.map(str::to_string),
                correct_option: *correct,
            })
            .collect();
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        self.by_id.get(&id).map(|&idx| &self.questions[idx])
    }

    /// Returns every question in a uniformly random order.
    ///
    /// The same `seed` always yields the same order; `None` draws from OS entropy.
    pub fn fetch_shuffled(&self, seed: Option<u64>) -> Result<Vec<Question>, AppError> {
        if self.is_empty() {
            return Err(AppError::NoQuestionsAvailable);
        }

        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut snapshot = self.questions.clone();
        snapshot.shuffle(&mut rng);
        Ok(snapshot)
    }

    /// Maps a client-submitted snapshot back onto the canonical questions.
    pub fn resolve(&self, refs: &[QuestionRef]) -> Result<Vec<Question>, AppError> {
        refs.iter()
            .map(|r| {
                self.get(r.id).cloned().ok_or_else(|| {
                    AppError::MalformedSubmission(format!("unknown question id {}", r.id))
                })
            })
            .collect()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}
