//! exam-client: take the exam from a terminal.

use std::{
    error::Error,
    io::{self, Write},
    process,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use exam_server::{
    client::{ApiClient, HttpGrader},
    models::{exam::ExamResult, question::PublicQuestion},
    session::{self, SessionHandle, SessionPhase, SessionView},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exam-client", version, about = "Take the online exam from a terminal")]
struct Cli {
    /// Base URL of the exam server
    #[arg(long, env = "EXAM_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account, then start the exam
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Sign in, then start the exam
    Login { email: String, password: String },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut client = ApiClient::new(&cli.server);

    let auth = match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => client.register(&name, &email, &password).await?,
        Commands::Login { email, password } => client.login(&email, &password).await?,
    };
    let identity = client.verify().await?;
    println!("Signed in as {} <{}>", auth.user.name, identity.email);

    let exam = client.fetch_questions().await?;
    println!(
        "{} questions, {} minutes. Type 'h' for help.\n",
        exam.total_questions, exam.time_limit
    );

    let time_limit_secs = exam.time_limit_secs();
    let questions = exam.questions;
    let grader = Arc::new(HttpGrader::new(client.clone()));
    let mut handle = session::spawn(questions.clone(), time_limit_secs, grader)?;
    let mut outcome = handle.take_outcome().ok_or("session has no outcome channel")?;

    render(&questions, &handle.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            finished = &mut outcome => {
                let result = finished.map_err(|_| "session ended unexpectedly")??;
                print_result(&result);
                return Ok(());
            }
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_input(&handle, &questions, line.trim()).await? {
                        handle.abandon();
                        println!("Exam abandoned; nothing was submitted.");
                        return Ok(());
                    }
                }
                None => {
                    handle.abandon();
                    return Ok(());
                }
            },
        }
    }
}

/// Applies one line of input. Returns false when the user quits.
async fn handle_input(
    handle: &SessionHandle,
    questions: &[PublicQuestion],
    input: &str,
) -> Result<bool, Box<dyn Error>> {
    let view = handle.view();
    if view.phase != SessionPhase::InProgress {
        println!("Submitting, please wait...");
        return Ok(true);
    }

    let mut parts = input.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("q"), _) => return Ok(false),
        (Some("h"), _) | (Some("?"), _) => print_help(),
        (Some("n"), _) => {
            if !handle.next().await? {
                println!("Already at the last question.");
            }
        }
        (Some("p"), _) => {
            if !handle.previous().await? {
                println!("Already at the first question.");
            }
        }
        (Some("g"), Some(k)) => {
            let moved = match k.parse::<usize>() {
                Ok(target) if target >= 1 => handle.navigate(target - 1).await?,
                _ => false,
            };
            if !moved {
                println!("No question {}.", k);
            }
        }
        (Some("s"), _) => {
            if handle.submit().await {
                println!("Submitting...");
            }
            return Ok(true);
        }
        (Some(choice), None) => match choice.parse::<u8>() {
            Ok(n) if n >= 1 => {
                if let Err(e) = handle.select_answer(n - 1).await {
                    println!("{}", e);
                }
            }
            _ => println!("Unknown command '{}'. Type 'h' for help.", choice),
        },
        _ => {}
    }

    render(questions, &handle.view());
    Ok(true)
}

fn render(questions: &[PublicQuestion], view: &SessionView) {
    let Some(question) = questions.get(view.current_index) else {
        return;
    };
    let chosen = view.answers.get(&view.current_index).copied();

    println!("{}", status_line(view));
    println!("{}", answer_strip(view));
    println!("{}", question.text);
    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i as u8) { '*' } else { ' ' };
        println!(" {} {}) {}", marker, i + 1, option);
    }
    print!("> ");
    let _ = io::stdout().flush();
}

fn print_help() {
    println!("  1-4    choose an option");
    println!("  n / p  next / previous question");
    println!("  g <k>  jump to question k");
    println!("  s      submit");
    println!("  q      quit without submitting");
}

fn print_result(result: &ExamResult) {
    println!("\n==== Result ====");
    println!(
        "Score: {}/{} ({}%)",
        result.score, result.total_questions, result.percentage
    );
    for (i, question) in result.questions.iter().enumerate() {
        let status = if result.correct_answers.contains(&i) {
            "correct"
        } else if result.user_answers.contains_key(&i) {
            "wrong"
        } else {
            "unanswered"
        };
        let correct = question
            .options
            .get(usize::from(question.correct_option))
            .map(String::as_str)
            .unwrap_or("?");
        println!("{:>2}. [{}] {} -> {}", i + 1, status, question.text, correct);
    }
}

/// Below this many seconds the countdown is flagged.
const LOW_TIME_SECS: u32 = 300;

fn status_line(view: &SessionView) -> String {
    let warning = if view.time_remaining < LOW_TIME_SECS {
        "  (!) under 5 minutes"
    } else {
        ""
    };
    format!(
        "Question {}/{}   answered {}/{}   time left {}{}",
        view.current_index + 1,
        view.total_questions,
        view.answers.len(),
        view.total_questions,
        format_time(view.time_remaining),
        warning
    )
}

/// One cell per question: `#` answered, `-` open, brackets on the current one.
fn answer_strip(view: &SessionView) -> String {
    (0..view.total_questions)
        .map(|i| {
            let mark = if view.answers.contains_key(&i) { '#' } else { '-' };
            if i == view.current_index {
                format!("[{}]", mark)
            } else {
                mark.to_string()
            }
        })
        .collect()
}

/// `MM:SS`
fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
