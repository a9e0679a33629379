use std::sync::Arc;

use lessons_core::model::{DailyQuiz, DayNumber, Difficulty, Lesson, QuestionKind, QuizQuestion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use storage::quiz_bank::{self, BankedQuestion};
use storage::repository::{LessonRepository, QuizRepository};
use tracing::debug;

use crate::Clock;
use crate::error::TrackerError;

/// Questions per generated daily quiz.
pub const QUESTIONS_PER_QUIZ: u32 = 15;

const QUESTIONS_PER_DIFFICULTY: usize = 5;

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// One template slot: question text plus mcq distractors, if any.
struct Template {
    question: String,
    correct: Option<String>,
    distractors: [&'static str; 3],
}

impl Template {
    fn open(question: String) -> Self {
        Self {
            question,
            correct: None,
            distractors: ["", "", ""],
        }
    }

    fn choice(question: String, correct: String, distractors: [&'static str; 3]) -> Self {
        Self {
            question,
            correct: Some(correct),
            distractors,
        }
    }
}

fn templates(lesson: &Lesson, difficulty: Difficulty) -> [Template; QUESTIONS_PER_DIFFICULTY] {
    let topic = lesson.title();
    let first_task = lesson
        .tasks()
        .first()
        .cloned()
        .unwrap_or_else(|| format!("Study {topic}"));

    match difficulty {
        Difficulty::Easy => [
            Template::choice(
                format!("What is {topic}?"),
                lesson.description().to_owned(),
                [
                    "A government-issued digital currency",
                    "A brand of hardware wallet",
                    "A centralized exchange listing rule",
                ],
            ),
            Template::open(format!("{topic} is only used by experts.")),
            Template::open(format!("Which concept is most related to {topic}?")),
            Template::open(format!(
                "A friend wants to try {topic} but thinks it needs significant capital. How would you respond?"
            )),
            Template::choice(
                format!("Which of these is a task from today's lesson on {topic}?"),
                first_task,
                [
                    "Memorize the Bitcoin whitepaper",
                    "Open a savings account at a bank",
                    "Buy a hardware wallet",
                ],
            ),
        ],
        Difficulty::Medium => [
            Template::choice(
                format!("Which risk is most relevant when using {topic}?"),
                "Smart contract bugs and protocol failures".to_owned(),
                [
                    "Bank branch closures",
                    "Paper certificate loss",
                    "Stock exchange trading halts",
                ],
            ),
            Template::open(format!(
                "{topic} works without any interaction with other DeFi protocols."
            )),
            Template::open(format!(
                "How does {topic} improve upon earlier DeFi technologies?"
            )),
            Template::open(format!(
                "A protocol built on {topic} sees liquidity leave after rewards drop. What incentives would you change?"
            )),
            Template::choice(
                format!("How is {topic} typically governed?"),
                "Token holders vote on protocol proposals".to_owned(),
                [
                    "A single central bank sets the rules",
                    "Rules can never change after launch",
                    "Each user picks private rules",
                ],
            ),
        ],
        Difficulty::Hard => [
            Template::choice(
                format!("What limits how {topic} scales economically?"),
                "Gas costs and capital efficiency".to_owned(),
                [
                    "The number of website visitors",
                    "Government licensing quotas",
                    "The size of the project logo",
                ],
            ),
            Template::open(format!("{topic} behaves identically on every blockchain.")),
            Template::open(format!(
                "What technical challenges does {topic} face at scale?"
            )),
            Template::open(format!(
                "An attacker exploits a price oracle in a {topic} protocol. Walk through the attack and a mitigation."
            )),
            Template::choice(
                format!("Which strategy best balances risk and return with {topic}?"),
                "Diversify positions and size them to the protocol risk".to_owned(),
                [
                    "Put everything into the highest advertised yield",
                    "Use maximum leverage at all times",
                    "Ignore audits and follow social media",
                ],
            ),
        ],
    }
}

fn reference_answer(lesson: &Lesson, difficulty: Difficulty) -> String {
    match difficulty {
        Difficulty::Easy => lesson.description().to_owned(),
        Difficulty::Medium => "Review the lesson carefully".to_owned(),
        Difficulty::Hard => "Explain your reasoning based on the concepts".to_owned(),
    }
}

fn explanation(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy | Difficulty::Medium => {
            "Review the reading materials for more information."
        }
        Difficulty::Hard => "This question requires deep understanding of the topic.",
    }
}

fn difficulty_slug(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard",
    }
}

fn question_id(day: u8, difficulty: Difficulty, n: usize) -> String {
    format!("d{day}-{}-{n}", difficulty_slug(difficulty))
}

fn shuffled(mut options: Vec<String>, rng: &mut StdRng) -> Vec<String> {
    options.shuffle(rng);
    options
}

fn true_false() -> Vec<String> {
    vec!["True".to_owned(), "False".to_owned()]
}

/// Build the 15 questions for a lesson.
///
/// A day with a hand-written `bank` uses it as is; any other day gets
/// template questions over the lesson title. Output depends only on the
/// inputs: mcq options are shuffled with an rng seeded by the day number.
#[must_use]
pub fn generate_questions(lesson: &Lesson, bank: Option<&[BankedQuestion]>) -> Vec<QuizQuestion> {
    match bank {
        Some(bank) => banked_questions(lesson, bank),
        None => template_questions(lesson),
    }
}

fn banked_questions(lesson: &Lesson, bank: &[BankedQuestion]) -> Vec<QuizQuestion> {
    let day = lesson.day().value();
    let mut rng = StdRng::seed_from_u64(u64::from(day));

    bank.iter()
        .enumerate()
        .map(|(index, entry)| {
            let n = index % quiz_bank::BANK_TIER_SIZE + 1;
            let (options, correct_answer) = match entry.kind {
                QuestionKind::Mcq => (
                    entry.options.clone().map(|o| shuffled(o, &mut rng)),
                    entry.answer.clone().unwrap_or_default(),
                ),
                QuestionKind::TrueFalse => {
                    (Some(true_false()), entry.answer.clone().unwrap_or_default())
                }
                QuestionKind::Short | QuestionKind::Scenario => {
                    (None, reference_answer(lesson, entry.difficulty))
                }
            };

            QuizQuestion {
                id: question_id(day, entry.difficulty, n),
                kind: entry.kind,
                difficulty: entry.difficulty,
                question: entry.question.clone(),
                options,
                correct_answer,
                explanation: entry.explanation.clone(),
            }
        })
        .collect()
}

fn template_questions(lesson: &Lesson) -> Vec<QuizQuestion> {
    let day = lesson.day().value();
    let mut rng = StdRng::seed_from_u64(u64::from(day));
    let mut questions = Vec::with_capacity(QUESTIONS_PER_QUIZ as usize);

    for difficulty in Difficulty::ALL {
        for (index, template) in templates(lesson, difficulty).into_iter().enumerate() {
            let kind = QuestionKind::ROTATION[index % QuestionKind::ROTATION.len()];
            let (options, correct_answer) = match kind {
                QuestionKind::Mcq => {
                    let correct = template
                        .correct
                        .unwrap_or_else(|| reference_answer(lesson, difficulty));
                    let mut options: Vec<String> = template
                        .distractors
                        .iter()
                        .map(|d| (*d).to_owned())
                        .collect();
                    options.push(correct.clone());
                    (Some(shuffled(options, &mut rng)), correct)
                }
                QuestionKind::TrueFalse => (Some(true_false()), "False".to_owned()),
                QuestionKind::Short | QuestionKind::Scenario => {
                    (None, reference_answer(lesson, difficulty))
                }
            };

            questions.push(QuizQuestion {
                id: question_id(day, difficulty, index + 1),
                kind,
                difficulty,
                question: template.question,
                options,
                correct_answer,
                explanation: explanation(difficulty).to_owned(),
            });
        }
    }

    questions
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Daily quizzes: generated on first request, then served from the cache.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            quizzes,
        }
    }

    /// Return the cached quiz for `day`, generating and caching it first if needed.
    ///
    /// Days with a hand-written question bank use it; others get templates.
    ///
    /// Concurrent first requests all receive the quiz that was stored first.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` if the day has no lesson.
    /// - `TrackerError::Storage` if repository access or the embedded bank fails.
    pub async fn daily_quiz(&self, day: DayNumber) -> Result<DailyQuiz, TrackerError> {
        if let Some(quiz) = self.quizzes.get_quiz(day).await? {
            return Ok(quiz);
        }

        let lesson = self
            .lessons
            .get_lesson(day)
            .await?
            .ok_or_else(|| TrackerError::not_found(format!("lesson for day {day}")))?;
        let bank = quiz_bank::for_day(day)?;
        let quiz = DailyQuiz::new(
            day,
            lesson.week(),
            generate_questions(&lesson, bank.as_deref()),
            self.clock.now(),
        )?;

        debug!(day = day.value(), banked = bank.is_some(), "generated daily quiz");
        Ok(self.quizzes.save_quiz_if_absent(&quiz).await?)
    }
}

// ─── TESTS ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lessons_core::time::fixed_clock;
    use storage::curriculum;
    use storage::repository::InMemoryRepository;

    fn lesson(day: usize) -> Lesson {
        curriculum::lessons().unwrap().swap_remove(day - 1)
    }

    fn bank(day: i64) -> Option<Vec<BankedQuestion>> {
        quiz_bank::for_day(DayNumber::new(day).unwrap()).unwrap()
    }

    #[test]
    fn generates_five_questions_per_difficulty() {
        let questions = generate_questions(&lesson(10), None);
        assert_eq!(questions.len(), QUESTIONS_PER_QUIZ as usize);

        for difficulty in Difficulty::ALL {
            let tier: Vec<_> = questions
                .iter()
                .filter(|q| q.difficulty == difficulty)
                .collect();
            assert_eq!(tier.len(), 5);
            let kinds: Vec<_> = tier.iter().map(|q| q.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    QuestionKind::Mcq,
                    QuestionKind::TrueFalse,
                    QuestionKind::Short,
                    QuestionKind::Scenario,
                    QuestionKind::Mcq,
                ]
            );
        }
    }

    #[test]
    fn answers_and_explanations_follow_kind_and_tier() {
        let lesson = lesson(12);
        for q in generate_questions(&lesson, None) {
            match q.kind {
                QuestionKind::Mcq => {
                    let options = q.options.as_ref().expect("mcq options");
                    assert_eq!(options.len(), 4);
                    assert!(options.contains(&q.correct_answer));
                }
                QuestionKind::TrueFalse => {
                    assert_eq!(q.options, Some(vec!["True".into(), "False".into()]));
                }
                QuestionKind::Short | QuestionKind::Scenario => {
                    assert!(q.options.is_none());
                    let expected = match q.difficulty {
                        Difficulty::Easy => lesson.description(),
                        Difficulty::Medium => "Review the lesson carefully",
                        Difficulty::Hard => "Explain your reasoning based on the concepts",
                    };
                    assert_eq!(q.correct_answer, expected);
                }
            }
            assert!(!q.explanation.is_empty());
        }
    }

    #[test]
    fn generation_is_deterministic_with_stable_ids() {
        let lesson = lesson(5);
        let bank = bank(5);
        let first = generate_questions(&lesson, bank.as_deref());
        assert_eq!(first, generate_questions(&lesson, bank.as_deref()));
        assert_eq!(first[0].id, "d5-easy-1");
        assert_eq!(first[14].id, "d5-hard-5");

        let templated = generate_questions(&self::lesson(20), None);
        assert_eq!(templated, generate_questions(&self::lesson(20), None));
        assert_eq!(templated[5].id, "d20-medium-1");
    }

    #[test]
    fn banked_day_uses_hand_written_questions() {
        let lesson = lesson(1);
        let questions = generate_questions(&lesson, bank(1).as_deref());
        assert_eq!(questions.len(), QUESTIONS_PER_QUIZ as usize);

        let first = &questions[0];
        assert_eq!(first.question, "What does DeFi stand for?");
        assert_eq!(first.kind, QuestionKind::Mcq);
        assert_eq!(first.correct_answer, "Decentralized Finance");
        assert_eq!(
            first.explanation,
            "DeFi stands for Decentralized Finance, a financial system built on blockchain technology without intermediaries."
        );
        let mut options = first.options.clone().expect("mcq options");
        options.sort();
        assert_eq!(
            options,
            vec![
                "Decentralized Finance",
                "Default Finance",
                "Defined Finance",
                "Digital Finance"
            ]
        );

        let statement = &questions[1];
        assert_eq!(statement.kind, QuestionKind::TrueFalse);
        assert_eq!(statement.correct_answer, "False");
        assert_eq!(statement.options, Some(vec!["True".into(), "False".into()]));

        for q in &questions {
            assert!(!q.question.contains(lesson.title()), "{}", q.question);
            if let Some(options) = &q.options {
                assert!(options.contains(&q.correct_answer));
            }
        }
    }

    #[tokio::test]
    async fn daily_quiz_prefers_bank_over_templates() {
        let repo = Arc::new(InMemoryRepository::new());
        for lesson in curriculum::lessons().unwrap() {
            repo.upsert_lesson(&lesson).await.unwrap();
        }
        let service = QuizService::new(fixed_clock(), repo.clone(), repo);

        let banked = service.daily_quiz(DayNumber::new(7).unwrap()).await.unwrap();
        assert_eq!(banked.questions()[0].question, "What is a smart contract?");

        let templated = service.daily_quiz(DayNumber::new(8).unwrap()).await.unwrap();
        let title = lesson(8).title().to_owned();
        assert_eq!(templated.questions()[0].question, format!("What is {title}?"));
    }

    #[tokio::test]
    async fn daily_quiz_is_cached_after_first_request() {
        let repo = Arc::new(InMemoryRepository::new());
        for lesson in curriculum::lessons().unwrap() {
            repo.upsert_lesson(&lesson).await.unwrap();
        }
        let service = QuizService::new(fixed_clock(), repo.clone(), repo.clone());

        let day = DayNumber::new(3).unwrap();
        let first = service.daily_quiz(day).await.unwrap();
        assert_eq!(first.total_questions(), 15);
        assert_eq!(first.week().value(), 1);

        let again = service.daily_quiz(day).await.unwrap();
        assert_eq!(again, first);
        assert!(repo.get_quiz(day).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unseeded_day_is_not_found() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = QuizService::new(fixed_clock(), repo.clone(), repo);
        let err = service.daily_quiz(DayNumber::FIRST).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }
}
