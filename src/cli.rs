//! `smartread` command-line surface.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::backend::{HttpBackend, HttpClient};
use crate::config::Settings;
use crate::content::{ContentTransformer, Region};
use crate::models::{ExtractionPayload, Resource};
use crate::navigation::{Navigation, Navigator, PageBar, Rejection};
use crate::ocr::{paper, OcrClient};
use crate::repository::DocumentCache;
use crate::services::{validate_url, ExtractionClient, Intent, Screen, Viewer};
use crate::EXAMPLE_PAPERS;

#[derive(Parser, Debug)]
#[command(name = "smartread", version)]
#[command(about = "Read technical papers page by page")]
pub struct Cli {
    /// Session cache file
    #[arg(long, global = true, env = "SMARTREAD_CACHE")]
    pub cache: Option<PathBuf>,

    /// Extraction backend base URL
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Extract a paper and show its first page
    Extract { url: String },
    /// Go to a page of the open paper
    Page { number: u32 },
    /// Go to the next page
    Next,
    /// Go to the previous page
    Prev,
    /// Show the current page
    Show {
        /// Print the page as returned by the backend
        #[arg(long)]
        raw: bool,
    },
    /// List articles and videos for a highlight
    Resources { index: String },
    /// Close the open paper and clear the cache
    Reset,
    /// Run OCR directly and print the markdown
    Ocr {
        url: String,
        /// Only this page (1-based)
        #[arg(long)]
        page: Option<u32>,
    },
    /// Have the backend download a PDF
    Download { pdf_url: String },
    /// List example papers
    Examples,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref cache) = self.cache {
            settings.cache_path = cache.clone();
        }
        if let Some(ref backend) = self.backend {
            settings.backend_url = backend.clone();
        }
    }
}

pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        Command::Examples => {
            for (name, url) in EXAMPLE_PAPERS {
                println!("{:<28} {}", name, url);
            }
            Ok(())
        }
        Command::Ocr { url, page } => run_ocr(&settings, &url, page).await,
        Command::Extract { url } => Session::open(&settings).await?.extract(&url).await,
        Command::Page { number } => {
            let session = Session::open(&settings).await?;
            let result = session.pending("Loading", session.navigator.request_page(number));
            session.print_navigation(number, result.await?);
            Ok(())
        }
        Command::Next => {
            let session = Session::open(&settings).await?;
            let result = session.pending("Loading", session.navigator.next());
            session.print_navigation(0, result.await?);
            Ok(())
        }
        Command::Prev => {
            let session = Session::open(&settings).await?;
            let result = session.pending("Loading", session.navigator.previous());
            session.print_navigation(0, result.await?);
            Ok(())
        }
        Command::Show { raw } => Session::open(&settings).await?.show(raw).await,
        Command::Resources { index } => Session::open(&settings).await?.resources(&index).await,
        Command::Reset => {
            Session::open(&settings).await?.navigator.reset().await;
            println!("Session cleared");
            Ok(())
        }
        Command::Download { pdf_url } => {
            let session = Session::open(&settings).await?;
            let client = session.navigator.client();
            let copy = session
                .pending("Downloading", client.download_pdf(&pdf_url))
                .await?;
            println!("{}", copy);
            Ok(())
        }
    }
}

struct Session {
    navigator: Navigator,
    transformer: ContentTransformer,
    spinner_delay: Duration,
}

impl Session {
    async fn open(settings: &Settings) -> Result<Self> {
        let http = HttpClient::new(settings.user_agent.as_deref(), settings.request_timeout())?;
        let backend = HttpBackend::new(http, &settings.backend_url);
        let cache = DocumentCache::sqlite(&settings.cache_path).with_context(|| {
            format!("opening session cache {}", settings.cache_path.display())
        })?;
        let client = ExtractionClient::restore(Arc::new(backend), cache).await?;
        let timing = settings.navigation_timing();

        Ok(Self {
            navigator: Navigator::new(Arc::new(client), timing).await,
            transformer: ContentTransformer::default(),
            spinner_delay: timing.spinner_delay,
        })
    }

    async fn extract(&self, url: &str) -> Result<()> {
        let payload = self.pending("Extracting", self.navigator.open(url)).await?;
        self.print_page(&payload);
        Ok(())
    }

    async fn show(&self, raw: bool) -> Result<()> {
        let client = self.navigator.client();
        let payload = client.current().await;
        let screen = Screen::select(
            payload.is_some(),
            client.is_loading().await,
            client.last_error().await,
        );
        match (screen, payload) {
            (Screen::Reader { .. }, Some(payload)) if raw => {
                println!("{}", strip_control(&payload.page_content))
            }
            (Screen::Reader { .. }, Some(payload)) => self.print_page(&payload),
            _ => println!("No paper open. Run `smartread extract <url>` or `smartread examples`."),
        }
        Ok(())
    }

    async fn resources(&self, index: &str) -> Result<()> {
        let payload = self
            .navigator
            .client()
            .current()
            .await
            .ok_or(crate::Error::NoActiveDocument)?;

        let mut viewer = Viewer::new();
        viewer.dispatch(Intent::HighlightClicked(index.to_string()));
        let resources = viewer.panel(&payload).unwrap_or_default();
        if resources.is_empty() {
            println!("No resources for highlight {}", index);
        }
        print_resources("Articles", &resources.articles);
        print_resources("Videos", &resources.videos);
        Ok(())
    }

    /// Await `fut`, noting on stderr if it outlives the spinner delay.
    async fn pending<F: Future>(&self, label: &str, fut: F) -> F::Output {
        tokio::pin!(fut);
        tokio::select! {
            out = &mut fut => return out,
            _ = tokio::time::sleep(self.spinner_delay) => {}
        }
        eprintln!("{}…", label);
        fut.await
    }

    fn print_navigation(&self, requested: u32, navigation: Navigation) {
        match navigation {
            Navigation::Loaded(payload) => self.print_page(&payload),
            Navigation::Rejected(Rejection::SamePage) => match self.navigator.current_page() {
                Some(page) => println!("Already on page {}", page),
                None => println!("Already on that page"),
            },
            Navigation::Rejected(Rejection::OutOfRange) => println!(
                "Page {} is out of range (1-{})",
                requested,
                self.navigator.total_pages().unwrap_or(1)
            ),
            Navigation::Rejected(Rejection::Busy) => println!("A page change is in progress"),
            Navigation::Discarded => println!("Session changed; page dropped"),
        }
    }

    fn print_page(&self, payload: &ExtractionPayload) {
        let rendered = Viewer::new().render(&self.transformer, payload);
        println!(
            "{}\n",
            PageBar {
                current: rendered.page,
                total: rendered.total_pages,
            }
        );
        println!("{}", strip_control(&rendered.html));

        let mut printed_header = false;
        for region in &rendered.regions {
            if let Region::Highlight { index, text } = region {
                if !printed_header {
                    println!("\nHighlights (smartread resources <index>):");
                    printed_header = true;
                }
                let count = payload.resources_for(index);
                println!(
                    "  [{}] {} ({} articles, {} videos)",
                    index,
                    strip_control(text),
                    count.articles.len(),
                    count.videos.len()
                );
            }
        }
    }
}

/// Drop terminal control characters from remote text before it reaches the
/// terminal; newlines and tabs stay.
fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

fn print_resources(heading: &str, resources: &[Resource]) {
    if resources.is_empty() {
        return;
    }
    println!("{}:", heading);
    for r in resources {
        match r.duration.as_deref() {
            Some(duration) => println!(
                "  - {} [{}]\n    {}",
                strip_control(&r.title),
                strip_control(duration),
                strip_control(&r.link)
            ),
            None => println!("  - {}\n    {}", strip_control(&r.title), strip_control(&r.link)),
        }
        if let Some(snippet) = r.snippet.as_deref() {
            println!("    {}", strip_control(snippet));
        }
    }
}

async fn run_ocr(settings: &Settings, url: &str, page: Option<u32>) -> Result<()> {
    let url = validate_url(url)?;
    let http = HttpClient::new(settings.user_agent.as_deref(), settings.request_timeout())?;
    let client = OcrClient::new(settings.ocr.clone(), http)?;
    let document = client.process(&url).await?;

    let pages: Vec<_> = match page {
        Some(n) => vec![document
            .page(n)
            .with_context(|| format!("page {} not in OCR result ({} pages)", n, document.pages.len()))?],
        None => document.pages.iter().collect(),
    };

    for p in &pages {
        let meta = paper::page_metadata(p);
        println!(
            "--- Page {} of {} ({} min read) ---",
            p.index + 1,
            document.pages.len(),
            meta.reading_time_minutes
        );
        println!("{}\n", strip_control(&paper::process_markdown(&p.markdown, &p.images)));
    }

    if page.is_none() {
        let toc = paper::table_of_contents(&document.pages);
        if !toc.is_empty() {
            println!("Contents:");
            for entry in toc {
                println!(
                    "{}{}",
                    "  ".repeat(entry.level.saturating_sub(1) as usize),
                    strip_control(&entry.title)
                );
            }
        }
        for item in paper::figures_and_tables(&document.pages) {
            println!(
                "{:?} (page {}): {}",
                item.kind,
                item.page_index + 1,
                strip_control(&item.caption)
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["smartread", "page", "3"]).unwrap();
        assert_eq!(cli.command, Command::Page { number: 3 });

        let cli = Cli::try_parse_from(["smartread", "show", "--raw", "--backend", "http://b"]).unwrap();
        assert_eq!(cli.command, Command::Show { raw: true });
        assert_eq!(cli.backend.as_deref(), Some("http://b"));

        let cli = Cli::try_parse_from(["smartread", "ocr", "https://arxiv.org/pdf/1706.03762", "--page", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Ocr {
                url: "https://arxiv.org/pdf/1706.03762".to_string(),
                page: Some(2)
            }
        );

        assert!(Cli::try_parse_from(["smartread", "page", "two"]).is_err());
    }

    #[test]
    fn test_strip_control() {
        assert_eq!(
            strip_control("<p>a</p>\n\t<p>\u{1b}]0;owned\u{7}b\u{1b}[2J</p>\r"),
            "<p>a</p>\n\t<p>]0;ownedb[2J</p>"
        );
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "smartread",
            "-v",
            "--cache",
            "/tmp/s.db",
            "--backend",
            "http://127.0.0.1:8000",
            "reset",
        ])
        .unwrap();
        assert!(cli.verbose);

        let mut settings = Settings::default();
        cli.apply_to_settings(&mut settings);
        assert_eq!(settings.cache_path, PathBuf::from("/tmp/s.db"));
        assert_eq!(settings.backend_url, "http://127.0.0.1:8000");
    }
}
