use std::io::{self, Write};

use log::info;
use xforms_core::ExecutionContext;
use xforms_input::cli::{self, Command, RunArgs};
use xforms_input::{build_engine, AppError, CONFIG};

fn main() {
    // Cargar .env si existe (XFORMS_VALIDATE, RUST_LOG)
    let _ = dotenvy::dotenv();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = cli::parse_args(args).and_then(|cmd| match cmd {
                                          Command::Help => {
                                              println!("{}", cli::usage());
                                              Ok(())
                                          }
                                          Command::Run(run) => execute(&run),
                                      });
    if let Err(e) = result {
        eprintln!("[xforms-input] {e}");
        if matches!(e, AppError::Usage(_)) {
            eprintln!("{}", cli::usage());
        }
        std::process::exit(e.exit_code());
    }
}

fn execute(run: &RunArgs) -> Result<(), AppError> {
    let inputs = run.load_inputs()?;
    let config = if run.no_validate { CONFIG.with_validate(false) } else { *CONFIG };
    let engine = build_engine(&config);
    let ctx = run.execution_id.map(ExecutionContext::with_id).unwrap_or_default();

    let reconstruction = engine.reconstruct(&ctx, &inputs)?;
    if run.trace {
        let trace = serde_json::to_string_pretty(&reconstruction.stages).map_err(|e| AppError::Io(io::Error::other(e)))?;
        eprintln!("{trace}");
    }
    let model = engine.model(&inputs.model)?;
    let output = engine.emit(&ctx, &model, reconstruction.instance)?;
    if let Some(v) = output.validation() {
        info!("validación: valid={} issues={}", v.valid, v.issues.len());
    }
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    output.read(&mut lock)?;
    writeln!(lock)?;
    Ok(())
}
