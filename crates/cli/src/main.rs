use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sor_book::{read_book_json, Book};
use sor_core::decision::{decision_chapters, DecisionFlow, FlowState, Response};
use sor_core::quiz::{score, Question};
use sor_core::{first_page_index, flatten_pages, search};
use sor_core::{DecisionSubmission, SubmissionReason};
use sor_types::NonEmptyText;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sor")]
#[command(about = "Standing-orders reference engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the flattened pages of a book
    Toc {
        /// Path to the book JSON export
        book: PathBuf,
    },
    /// Search the book content
    Search {
        /// Path to the book JSON export
        book: PathBuf,
        /// Query text
        query: String,
    },
    /// List decision-capable chapters and their sub-chapters
    Chapters {
        /// Path to the book JSON export
        book: PathBuf,
    },
    /// Run a decision flow non-interactively and print matching diagnoses
    Diagnose {
        /// Path to the book JSON export
        book: PathBuf,
        /// Chapter index, as listed by `chapters`
        #[arg(long)]
        chapter: usize,
        /// Sub-chapter choice index, as listed by `chapters`
        #[arg(long)]
        sub_chapter: usize,
        /// Sub-sub-chapter choice index, when the sub-chapter has none of
        /// its own decision content
        #[arg(long)]
        sub_sub_chapter: Option<usize>,
        /// A finding to mark positive; repeatable
        #[arg(long = "finding")]
        findings: Vec<String>,
        /// Print the submission payload for this reason
        /// (tutoring, self-study or patient-care)
        #[arg(long)]
        reason: Option<String>,
        /// Patient ID (patient-care submissions only)
        #[arg(long)]
        patient_id: Option<String>,
        /// Patient age (patient-care submissions only)
        #[arg(long)]
        patient_age: Option<String>,
    },
    /// Score quiz answers against a question file
    Score {
        /// Path to a JSON array of questions
        quiz: PathBuf,
        /// An answer as `question=option`, both 0-based; repeatable
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("sor=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Toc { book } => {
            let book = load_book(&book)?;
            let pages = flatten_pages(&book.content);
            if pages.is_empty() {
                println!("No pages found.");
            }
            for (index, page) in pages.iter().enumerate() {
                let mut location = page.chapter_title.clone();
                if let Some(sub) = &page.sub_chapter_title {
                    location.push_str(&format!(" › {sub}"));
                }
                if let Some(sub_sub) = &page.sub_sub_chapter_title {
                    location.push_str(&format!(" › {sub_sub}"));
                }
                println!("{:>4}  {} ({} items)", index + 1, location, page.content.len());
            }
        }
        Commands::Search { book, query } => {
            let book = load_book(&book)?;
            let pages = flatten_pages(&book.content);
            let results = search(&query, &pages);
            if results.is_empty() {
                println!("No results found.");
            }
            for result in results {
                println!(
                    "Page {}: {}",
                    result.page_index + 1,
                    result.page.chapter_title
                );
                for item in &result.matches {
                    println!("  [{}] {}", item.kind.label(), item.excerpt);
                }
            }
        }
        Commands::Chapters { book } => {
            let book = load_book(&book)?;
            for (chapter_index, chapter) in decision_chapters(&book).iter().enumerate() {
                println!("{chapter_index}: {}", chapter.chapter);
                let flow = DecisionFlow::new((*chapter).clone());
                for (choice, sub) in flow.sub_chapter_choices().iter().enumerate() {
                    println!("    {choice}: {}", sub.sub_chapter_title);
                }
            }
        }
        Commands::Diagnose {
            book,
            chapter,
            sub_chapter,
            sub_sub_chapter,
            findings,
            reason,
            patient_id,
            patient_age,
        } => {
            let book = load_book(&book)?;
            let chapters = decision_chapters(&book);
            let chapter = chapters
                .get(chapter)
                .ok_or_else(|| format!("no decision chapter at index {chapter}"))?;

            let mut flow = DecisionFlow::new((*chapter).clone());
            let state = flow.select_sub_chapter(sub_chapter)?;
            if state == FlowState::SubSubChapters {
                let choice = sub_sub_chapter
                    .ok_or("this sub-chapter needs --sub-sub-chapter to reach a decision")?;
                flow.select_sub_sub_chapter(choice)?;
            }
            flow.advance()?; // history -> examination actions
            flow.advance()?; // examination actions -> examination

            for finding in &findings {
                let index = flow
                    .responses()
                    .iter()
                    .position(|r| r.finding.eq_ignore_ascii_case(finding));
                match index {
                    Some(index) => flow.set_response(index, Response::Yes)?,
                    None => eprintln!("ignoring unknown finding: {finding}"),
                }
            }
            flow.advance()?; // examination -> diagnosis

            let cases = flow.matching_cases();
            if cases.is_empty() {
                println!("No matching diagnoses.");
            }
            for case in &cases {
                println!("Diagnosis: {}", case.clinical_judgement);
                for (step, action) in case.actions.iter().enumerate() {
                    println!("  {}. {action}", step + 1);
                }
            }

            if let Some(reason) = reason {
                let reason = parse_reason(&reason, patient_id, patient_age)?;
                let submission =
                    DecisionSubmission::from_selections(&flow.selections(), &reason);
                println!("{}", serde_json::to_string_pretty(&submission.to_request_body())?);
            }

            // The first page of the selected topic, for the viewer to open.
            let pages = flatten_pages(&book.content);
            let selections = flow.selections();
            if let Some(index) = first_page_index(
                &pages,
                &selections.chapter_title,
                Some(&selections.sub_chapter_title),
                selections.sub_sub_chapter_title.as_deref(),
            ) {
                tracing::info!("reference content starts at page {}", index + 1);
            }
        }
        Commands::Score { quiz, answers } => {
            let contents = std::fs::read_to_string(&quiz)?;
            let questions: Vec<Question> = serde_json::from_str(&contents)?;
            let answers = parse_answers(&answers)?;
            println!("Score: {:.1}%", score(&questions, &answers));
        }
    }

    Ok(())
}

fn load_book(path: &Path) -> Result<Book, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(read_book_json(&contents)?)
}

fn parse_reason(
    reason: &str,
    patient_id: Option<String>,
    patient_age: Option<String>,
) -> Result<SubmissionReason, Box<dyn std::error::Error>> {
    match reason {
        "tutoring" => Ok(SubmissionReason::Tutoring),
        "self-study" => Ok(SubmissionReason::SelfStudy),
        "patient-care" => {
            let patient_id = patient_id.ok_or("patient-care submissions need --patient-id")?;
            let patient_age = patient_age.ok_or("patient-care submissions need --patient-age")?;
            Ok(SubmissionReason::PatientCare {
                patient_id: NonEmptyText::new(patient_id)?,
                patient_age: NonEmptyText::new(patient_age)?,
            })
        }
        other => Err(format!(
            "unknown reason `{other}` (expected tutoring, self-study or patient-care)"
        )
        .into()),
    }
}

fn parse_answers(answers: &[String]) -> Result<BTreeMap<usize, usize>, Box<dyn std::error::Error>> {
    let mut parsed = BTreeMap::new();
    for answer in answers {
        let (question, option) = answer
            .split_once('=')
            .ok_or_else(|| format!("invalid answer `{answer}` (expected question=option)"))?;
        parsed.insert(question.trim().parse()?, option.trim().parse()?);
    }
    Ok(parsed)
}
