use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;

use crate::cli::commands::session_err;
use crate::cli::output::get_formatter;
use crate::error::SessionError;
use crate::models::{AnswerReport, Config, OutputFormat};
use crate::services::{Session, SessionController, estimate_tokens};
use crate::sources::load_document;

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to ask")]
    pub question: String,

    #[arg(long, short = 'd', help = "Document to ground the answer in")]
    pub document: Option<PathBuf>,

    #[arg(long, short = 'k', help = "Number of passages to retrieve")]
    pub top_k: Option<u32>,

    #[arg(long, help = "Include the retrieved passages in the output")]
    pub show_context: bool,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let mut config = Config::load()?;
    if let Some(k) = args.top_k {
        config.retrieval.top_k = k;
    }

    let formatter = get_formatter(format);
    let start = Instant::now();

    let controller = SessionController::from_config(&config).map_err(session_err)?;
    let mut session = Session::new();

    if let Some(ref path) = args.document {
        let document = load_document(path)
            .map_err(|e| session_err(SessionError::from(e)))
            .with_context(|| format!("failed to load {}", path.display()))?;

        if verbose {
            eprintln!(
                "Loaded {} (~{} tokens)",
                document.name,
                estimate_tokens(&document.text)
            );
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Indexing document...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        let result = controller.load_document(&mut session, document).await;
        spinner.finish_and_clear();

        let report = result.map_err(session_err)?;
        if verbose {
            eprintln!(
                "Indexed {} passages in {}ms",
                report.document.passage_count, report.duration_ms
            );
        }
    }

    let answer_stream = controller
        .ask(&mut session, question)
        .await
        .map_err(session_err)?;
    let context = answer_stream.context;
    let mut fragments = answer_stream.fragments;

    // Stream straight to the terminal unless the output wants the full
    // report in one piece.
    let streaming = format == OutputFormat::Text && !args.show_context;

    let mut answer = String::new();
    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => {
                if streaming {
                    print!("{}", text);
                    std::io::stdout().flush().ok();
                }
                answer.push_str(&text);
            }
            Err(e) => {
                if streaming && !answer.is_empty() {
                    println!();
                }
                controller.finish_turn(&mut session, None);
                anyhow::bail!("{} ({})", e, e.advice());
            }
        }
    }
    controller.finish_turn(&mut session, Some(&answer));

    if streaming {
        println!();
        return Ok(());
    }

    let report = AnswerReport {
        question: question.to_string(),
        answer,
        context: if args.show_context { context } else { Vec::new() },
        model: controller.chat_provider().model().to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    print!("{}", formatter.format_answer(&report));
    Ok(())
}
