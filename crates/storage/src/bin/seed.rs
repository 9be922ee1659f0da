use std::fmt;

use baeum_core::model::{
    Class, ClassId, ClassLevel, Lesson, LessonId, Question, QuestionId, VocabEntry, VocabEntryId,
    VocabSet, VocabSetId, DEFAULT_PASSING_SCORE,
};
use chrono::{DateTime, Utc};
use storage::repository::{
    NewClassRecord, NewLessonRecord, NewQuestionRecord, NewVocabEntryRecord, NewVocabSetRecord,
    Storage,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    class_name: String,
    class_desc: Option<String>,
    lessons: u32,
    vocab: u32,
    questions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLessons { raw: String },
    InvalidVocab { raw: String },
    InvalidQuestions { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidVocab { raw } => write!(f, "invalid --vocab value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("BAEUM_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut class_name =
            std::env::var("BAEUM_CLASS_NAME").unwrap_or_else(|_| "Hangul Basics".into());
        let mut class_desc = std::env::var("BAEUM_CLASS_DESC").ok();
        let mut lessons = std::env::var("BAEUM_LESSONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut vocab = std::env::var("BAEUM_VOCAB")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut questions = std::env::var("BAEUM_QUESTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--class-name" => {
                    let value = require_value(&mut args, "--class-name")?;
                    class_name = value;
                }
                "--class-desc" => {
                    let value = require_value(&mut args, "--class-desc")?;
                    class_desc = Some(value);
                }
                "--lessons" => {
                    let value = require_value(&mut args, "--lessons")?;
                    lessons = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--vocab" => {
                    let value = require_value(&mut args, "--vocab")?;
                    vocab = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidVocab { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            class_name,
            class_desc,
            lessons,
            vocab,
            questions,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --class-name <name>       Class name (default: Hangul Basics)");
    eprintln!("  --class-desc <text>       Optional class description");
    eprintln!("  --lessons <n>             Number of ordered lessons to insert (default: 5)");
    eprintln!("  --vocab <n>               Number of vocabulary entries to insert (default: 5)");
    eprintln!("  --questions <n>           Number of bank questions to insert (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  BAEUM_DB_URL, BAEUM_CLASS_NAME, BAEUM_CLASS_DESC, BAEUM_LESSONS, BAEUM_VOCAB, BAEUM_QUESTIONS"
    );
}

const LESSON_TITLES: [&str; 5] = [
    "Hangul consonants",
    "Hangul vowels",
    "Batchim and syllable blocks",
    "Basic greetings",
    "Numbers and counters",
];

const VOCAB_SAMPLES: [(&str, &str, &str); 5] = [
    ("안녕하세요", "annyeonghaseyo", "hello"),
    ("감사합니다", "gamsahamnida", "thank you"),
    ("네", "ne", "yes"),
    ("아니요", "aniyo", "no"),
    ("주세요", "juseyo", "please give me"),
];

const QUESTION_SAMPLES: [(&str, [&str; 4], usize); 4] = [
    (
        "What does 안녕하세요 mean?",
        ["goodbye", "hello", "thank you", "sorry"],
        1,
    ),
    (
        "Which particle marks the topic of a sentence?",
        ["을/를", "이/가", "은/는", "에서"],
        2,
    ),
    (
        "How do you say 'thank you' formally?",
        ["감사합니다", "고마워", "안녕", "주세요"],
        0,
    ),
    (
        "What does 아니요 mean?",
        ["yes", "no", "maybe", "please"],
        1,
    ),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    // Validate through the domain constructors before touching storage; the
    // placeholder IDs are replaced by the ones storage assigns.
    let class = Class::new(
        ClassId::new(1),
        args.class_name.clone(),
        args.class_desc.clone(),
        ClassLevel::Beginner,
        DEFAULT_PASSING_SCORE,
        now,
    )?;
    let class_id = storage
        .classes
        .insert_class(NewClassRecord::from_class(&class))
        .await?;

    for i in 0..args.lessons {
        let idx = (i as usize) % LESSON_TITLES.len();
        let lesson = Lesson::new(
            LessonId::new(1),
            class_id,
            LESSON_TITLES[idx],
            i,
            i % 2 == 1,
            None,
            format!("Material for unit {}.", i + 1),
            now,
        )?;
        storage
            .classes
            .insert_lesson(NewLessonRecord::from_lesson(&lesson))
            .await?;
    }

    let set = VocabSet::new(VocabSetId::new(1), Some(class_id), "Survival Korean", now)?;
    let set_id = storage
        .vocab
        .insert_set(NewVocabSetRecord::from_set(&set))
        .await?;

    for i in 0..args.vocab {
        let idx = (i as usize) % VOCAB_SAMPLES.len();
        let (hangul, romanization, meaning) = VOCAB_SAMPLES[idx];
        let entry = VocabEntry::new(
            VocabEntryId::new(1),
            set_id,
            hangul,
            romanization,
            meaning,
            None,
            now,
        )?;
        storage
            .vocab
            .insert_entry(NewVocabEntryRecord::from_entry(&entry))
            .await?;
    }

    for i in 0..args.questions {
        let idx = (i as usize) % QUESTION_SAMPLES.len();
        let (prompt, choices, correct) = QUESTION_SAMPLES[idx];
        let question = Question::new(
            QuestionId::new(1),
            prompt,
            choices.iter().map(|c| (*c).to_owned()).collect(),
            correct,
            None,
        )?;
        storage
            .tryouts
            .insert_question(NewQuestionRecord::from_question(&question))
            .await?;
    }

    println!(
        "Seeded class {} with {} lessons, {} vocab entries and {} questions into {}",
        class_id.value(),
        args.lessons,
        args.vocab,
        args.questions,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
