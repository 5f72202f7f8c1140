use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use emotion_radar::presentation::{self, DisplayOptions, RadarChart, EMPTY_INPUT_WARNING};
use emotion_radar::{
    App, BuiltinModel, EmotionClassifier, ModelLoader, ModelSource, RuntimeConfig, Submission,
    DEFAULT_INPUT,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text to analyze; without it the program prompts for input line by line
    text: Option<String>,

    /// Analyze the default example text once instead of prompting
    #[arg(long, conflicts_with = "text")]
    once: bool,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Print the model's internal label dictionary (id2label)
    #[arg(long)]
    show_labels: bool,

    /// Show emotions with Japanese names and emoji
    #[arg(long)]
    decorate: bool,

    /// Write the radar chart as a Plotly JSON figure
    #[arg(long, value_name = "PATH")]
    chart_json: Option<PathBuf>,

    /// Write the radar chart as a standalone HTML page
    #[arg(long, value_name = "PATH")]
    chart_html: Option<PathBuf>,

    /// Load model.onnx, config.json and tokenizer.json (or vocab.txt) from this directory
    /// instead of the hub
    #[arg(long, value_name = "DIR", env = "EMOTION_RADAR_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long)]
    threads: Option<usize>,
}

impl Args {
    fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            decorate: self.decorate,
        }
    }
}

fn model_loader(args: &Args) -> anyhow::Result<ModelLoader> {
    let source = match &args.model_dir {
        Some(dir) => ModelSource::Directory(dir.clone()),
        None => ModelSource::builtin(BuiltinModel::YtLiveJaBertEmotion)
            .context("Failed to open model cache")?,
    };

    let mut runtime_config = RuntimeConfig::from_env();
    if let Some(threads) = args.threads {
        runtime_config = runtime_config.with_intra_threads(threads);
    }

    Ok(ModelLoader::new(source)
        .with_runtime_config(runtime_config)
        .with_fresh_download(args.fresh))
}

/// Renders one submission; returns false when it failed.
fn process_input(app: &App<EmotionClassifier>, text: &str, args: &Args) -> bool {
    let options = args.display_options();

    match app.submit(text) {
        Ok(Submission::EmptyInput) => {
            presentation::print_warning(EMPTY_INPUT_WARNING);
            true
        }
        Ok(Submission::Analyzed(analysis)) => {
            presentation::print_analysis(&analysis, options);

            let chart = RadarChart::from_analysis(&analysis, options);
            if let Some(path) = &args.chart_json {
                match chart.write_json(path) {
                    Ok(()) => info!("Radar chart written to {:?}", path),
                    Err(e) => presentation::print_error(&format!("Failed to write {:?}: {}", path, e)),
                }
            }
            if let Some(path) = &args.chart_html {
                match chart.write_html(path) {
                    Ok(()) => info!("Radar chart written to {:?}", path),
                    Err(e) => presentation::print_error(&format!("Failed to write {:?}: {}", path, e)),
                }
            }
            true
        }
        Err(e) => {
            presentation::print_error(&format!("Error analyzing text: {}", e));
            false
        }
    }
}

async fn prompt_loop(app: &App<EmotionClassifier>, args: &Args) -> anyhow::Result<()> {
    println!("\nEnter the text to analyze, one submission per line (Ctrl-D to quit).");
    println!("Example: {}", DEFAULT_INPUT);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        process_input(app, &line, args);
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    presentation::print_header();

    let loader = model_loader(&args)?;
    let classifier = match loader.load().await {
        Ok(classifier) => classifier,
        Err(e) => {
            presentation::print_error(&format!("An error occurred while loading the model: {}", e));
            return Ok(ExitCode::FAILURE);
        }
    };
    let app = App::new(classifier);

    if args.show_labels {
        presentation::print_label_dictionary(app.labels(), args.display_options());
    }

    let succeeded = match (&args.text, args.once) {
        (Some(text), _) => process_input(&app, text, &args),
        (None, true) => process_input(&app, DEFAULT_INPUT, &args),
        (None, false) => {
            prompt_loop(&app, &args).await?;
            true
        }
    };

    if let ModelSource::Cached { info, .. } = loader.source() {
        presentation::print_footer(&info.homepage);
    }

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
