use anyhow::Result;
use clap::Parser;
use pdf_reader::config::Cli;
use pdf_reader::{Intent, PageController, ReaderBackend, ReaderClient, SelectedFile, TerminalView};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: /open <path>, /upload [path], /quit. Any other line is sent as a question.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Open(&'a str),
    Upload(Option<&'a str>),
    Quit,
    Ask(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };

        match head {
            "/quit" | "/exit" => Command::Quit,
            "/open" if !rest.is_empty() => Command::Open(rest),
            "/upload" if rest.is_empty() => Command::Upload(None),
            "/upload" => Command::Upload(Some(rest)),
            _ => Command::Ask(line),
        }
    }
}

type Page = PageController<ReaderClient, TerminalView<std::io::Stdout>>;

async fn select<B: ReaderBackend, V: pdf_reader::View>(
    page: &mut PageController<B, V>,
    path: &Path,
) -> bool {
    match SelectedFile::open(path).await {
        Ok(file) => {
            log::info!("Selected {} ({} bytes)", file.name, file.bytes.len());
            page.dispatch(Intent::SelectFile(Some(file))).await;
            true
        }
        Err(err) => {
            let reason = format!("{}: {}", path.display(), err);
            page.dispatch(Intent::SelectionFailed(reason)).await;
            false
        }
    }
}

async fn run(page: &mut Page) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Open(path) => {
                select(page, Path::new(path)).await;
            }
            Command::Upload(path) => {
                if let Some(path) = path {
                    if !select(page, Path::new(path)).await {
                        continue;
                    }
                }
                let file = page.state().selected_file.clone();
                page.dispatch(Intent::UploadRequested(file)).await;
            }
            Command::Ask(text) => {
                page.dispatch(Intent::QuestionSubmitted(text.to_string()))
                    .await;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let client = ReaderClient::new(cli.server.clone());
    log::info!("Using reader server at {}", client.base_url());

    let mut page = PageController::new(client, TerminalView::stdout());
    if let Some(path) = &cli.file {
        select(&mut page, path).await;
    }

    println!("{}", HELP);
    run(&mut page).await
}
