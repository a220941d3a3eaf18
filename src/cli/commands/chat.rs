use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use console::style;
use indicatif::ProgressBar;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::commands::session_err;
use crate::error::SessionError;
use crate::models::{Config, OutputFormat};
use crate::services::{Session, SessionController, estimate_tokens};
use crate::sources::load_document;

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(long, short = 'd', help = "Document to load before the first question")]
    pub document: Option<PathBuf>,
}

pub async fn handle_chat(args: ChatArgs, _format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let controller = SessionController::from_config(&config).map_err(session_err)?;
    let mut session = Session::new();

    println!(
        "{}",
        style("docchat: ask a question, :help for commands, :quit to exit").dim()
    );

    if let Some(ref path) = args.document {
        load_into(&controller, &mut session, path, verbose)
            .await
            .map_err(session_err)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", style("you ›").cyan().bold());
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" | ":exit" => break,
            ":help" => print_help(),
            ":clear" => {
                session.clear_history();
                println!("History cleared.");
            }
            ":doc" => match session.document() {
                Some(info) => {
                    let pages = info
                        .page_count
                        .map(|p| format!(", {} pages", p))
                        .unwrap_or_default();
                    println!("{}: {} passages{}", info.name, info.passage_count, pages);
                }
                None => println!("No document loaded. Use :load <path>."),
            },
            _ if line.starts_with(":load") => {
                let path = line.trim_start_matches(":load").trim();
                if path.is_empty() {
                    println!("Usage: :load <path>");
                    continue;
                }
                if let Err(e) = load_into(&controller, &mut session, Path::new(path), verbose).await
                {
                    eprintln!("{}", style(format!("{} ({})", e, e.advice())).red());
                }
            }
            _ if line.starts_with(':') => {
                println!("Unknown command: {} (:help lists commands)", line);
            }
            question => answer_question(&controller, &mut session, question).await,
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :load <path>  load a document (pdf, txt, md)");
    println!("  :doc          show the loaded document");
    println!("  :clear        clear the chat history");
    println!("  :quit         exit");
}

async fn load_into(
    controller: &SessionController,
    session: &mut Session,
    path: &Path,
    verbose: bool,
) -> Result<(), SessionError> {
    let document = load_document(path)?;

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
    let result = controller.load_document(session, document).await;
    spinner.finish_and_clear();

    let report = result?;
    if report.reused {
        println!("Document already indexed: {}", report.document.name);
    } else {
        let pages = report
            .document
            .page_count
            .map(|p| format!(", {} pages", p))
            .unwrap_or_default();
        println!(
            "Indexed {} ({} passages{}, {}ms)",
            report.document.name, report.document.passage_count, pages, report.duration_ms
        );
    }

    Ok(())
}

async fn answer_question(controller: &SessionController, session: &mut Session, question: &str) {
    let answer_stream = match controller.ask(session, question).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{}", style(format!("{} ({})", e, e.advice())).red());
            return;
        }
    };

    print!("{} ", style("assistant ›").green().bold());
    std::io::stdout().flush().ok();

    let mut fragments = answer_stream.fragments;
    let mut answer = String::new();

    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => {
                print!("{}", text);
                std::io::stdout().flush().ok();
                answer.push_str(&text);
            }
            Err(e) => {
                println!();
                eprintln!("{}", style(format!("{} ({})", e, e.advice())).red());
                // Keep whatever arrived before the failure.
                let partial = (!answer.is_empty()).then_some(answer.as_str());
                controller.finish_turn(session, partial);
                return;
            }
        }
    }

    println!();
    controller.finish_turn(session, Some(&answer));
}
