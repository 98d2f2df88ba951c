//! codesight CLI entry point

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codesight::cli::Command;
use codesight::server::{self, Dashboard, ServerConfig};
use codesight::{
    analyze, dispatch, dump_ast, encode_toon, format_text, parse_as, render, AppState, Cli,
    CodeSightError, Event, ExplanationService, InferenceClient, Lang, OutputFormat,
    TreeSitterMetrics,
};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.log_filter());

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Check the file exists and is Python, then read it
fn read_source(path: &Path) -> codesight::Result<(String, String)> {
    if !path.exists() {
        return Err(CodeSightError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let lang = Lang::from_path(path)?;
    let source = fs::read_to_string(path)?;
    tracing::debug!(
        "read {} bytes from {} ({})",
        source.len(),
        path.display(),
        lang.name()
    );

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((file_name, source))
}

fn run(cli: Cli) -> codesight::Result<String> {
    let metrics = TreeSitterMetrics::new();

    match cli.command {
        Command::Analyze {
            file,
            format,
            print_ast,
            explain_all,
            improvements,
            inference,
        } => {
            let (file_name, source) = read_source(&file)?;

            if print_ast {
                let tree = parse_as(&source, Lang::from_path(&file)?)?;
                eprintln!("\n=== AST ===");
                eprint!("{}", dump_ast(&tree));
                eprintln!("=== END AST ===\n");
            }

            let analysis = analyze(&file_name, &source, &metrics)?;
            let ids: Vec<_> = analysis.records.iter().map(|r| r.id).collect();
            let mut state = AppState::with_analysis(analysis);

            if explain_all || improvements {
                let client = InferenceClient::new(inference.config())?;
                if explain_all {
                    for id in ids {
                        dispatch(&mut state, Event::RequestExplanation { id }, &client, &metrics);
                    }
                }
                if improvements {
                    dispatch(&mut state, Event::RequestImprovements, &client, &metrics);
                }
            }

            let view = render(&state);
            let output = match format {
                OutputFormat::Text => format_text(&view),
                OutputFormat::Json => serde_json::to_string_pretty(&view)?,
                OutputFormat::Toon => encode_toon(&view),
            };
            Ok(output)
        }

        Command::Explain {
            file,
            function,
            inference,
        } => {
            let (file_name, source) = read_source(&file)?;
            let analysis = analyze(&file_name, &source, &metrics)?;
            let record = analysis.records_named(&function).next().ok_or_else(|| {
                CodeSightError::DefinitionNotFound {
                    name: function.clone(),
                    file: file_name.clone(),
                }
            })?;

            let client = InferenceClient::new(inference.config())?;
            let mut output = client.explain(&record.source)?;
            output.push('\n');
            for (key, value) in record.metadata.fields() {
                output.push_str(&format!("\n{}: {}", key, value));
            }
            Ok(output)
        }

        Command::Ask {
            file,
            function,
            question,
            inference,
        } => {
            let (file_name, source) = read_source(&file)?;
            let analysis = analyze(&file_name, &source, &metrics)?;
            let record = analysis.records_named(&function).next().ok_or_else(|| {
                CodeSightError::DefinitionNotFound {
                    name: function.clone(),
                    file: file_name.clone(),
                }
            })?;

            let client = InferenceClient::new(inference.config())?;
            client.answer(&record.source, question.trim())
        }

        Command::Improve { file, inference } => {
            let (_, source) = read_source(&file)?;
            let client = InferenceClient::new(inference.config())?;
            client.suggest_improvements(&source)
        }

        Command::Serve {
            host,
            port,
            inference,
        } => {
            let config = ServerConfig { host, port };

            // The blocking HTTP client must be created and dropped outside the runtime.
            let explainer: Arc<dyn ExplanationService> =
                Arc::new(InferenceClient::new(inference.config())?);
            let dashboard = Dashboard::new(explainer.clone(), Arc::new(metrics));

            let runtime = tokio::runtime::Runtime::new()?;
            runtime
                .block_on(server::serve(config, dashboard))
                .map_err(|e| CodeSightError::Io(std::io::Error::other(e.to_string())))?;
            drop(runtime);
            drop(explainer);

            Ok("dashboard stopped".to_string())
        }
    }
}
