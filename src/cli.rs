//! Parseo mínimo de argumentos del binario `xforms-input`.
//!
//! `xforms-input [run] --model <FILE> --request <FILE> [--filter <FILE> --matcher-result <FILE>]
//!               [--no-validate] [--execution-id <UUID>] [--trace]`
use std::fs;
use std::path::PathBuf;

use uuid::Uuid;
use xforms_core::ProcessorInputs;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub model: PathBuf,
    pub request: PathBuf,
    pub filter: Option<PathBuf>,
    pub matcher_result: Option<PathBuf>,
    pub no_validate: bool,
    pub execution_id: Option<Uuid>,
    /// Emite los registros de etapa (JSON) por stderr.
    pub trace: bool,
}

pub fn usage() -> &'static str {
    "Uso: xforms-input [run] --model <FILE> --request <FILE> [--filter <FILE> --matcher-result <FILE>] [--no-validate] \
     [--execution-id <UUID>] [--trace]"
}

/// Parsea los argumentos (sin el nombre del programa).
pub fn parse_args<I, S>(args: I) -> Result<Command, AppError>
    where I: IntoIterator<Item = S>,
          S: Into<String>
{
    let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
    if args.first().map(String::as_str) == Some("run") {
        args.remove(0);
    }
    let mut model: Option<PathBuf> = None;
    let mut request: Option<PathBuf> = None;
    let mut run = RunArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--model" => model = Some(value_of(&args, &mut i)?.into()),
            "--request" => request = Some(value_of(&args, &mut i)?.into()),
            "--filter" => run.filter = Some(value_of(&args, &mut i)?.into()),
            "--matcher-result" => run.matcher_result = Some(value_of(&args, &mut i)?.into()),
            "--execution-id" => {
                let raw = value_of(&args, &mut i)?;
                let id = Uuid::parse_str(raw).map_err(|e| AppError::Usage(format!("--execution-id inválido '{raw}': {e}")))?;
                run.execution_id = Some(id);
            }
            "--no-validate" => run.no_validate = true,
            "--trace" => run.trace = true,
            other => return Err(AppError::Usage(format!("argumento desconocido '{other}'"))),
        }
        i += 1;
    }
    match (model, request) {
        (Some(model), Some(request)) => {
            run.model = model;
            run.request = request;
            Ok(Command::Run(run))
        }
        (None, _) => Err(AppError::Usage("falta --model".into())),
        (_, None) => Err(AppError::Usage("falta --request".into())),
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, AppError> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| AppError::Usage(format!("{flag} requiere un valor")))
}

impl RunArgs {
    /// Lee los ficheros de entrada.
    pub fn load_inputs(&self) -> Result<ProcessorInputs, AppError> {
        let mut inputs = ProcessorInputs::new(fs::read_to_string(&self.model)?, fs::read_to_string(&self.request)?);
        if let Some(path) = &self.filter {
            inputs.filter = Some(fs::read_to_string(path)?);
        }
        if let Some(path) = &self.matcher_result {
            inputs.matcher_result = Some(fs::read_to_string(path)?);
        }
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let cmd = parse_args(["--model", "m.xml", "--request", "r.xml", "--filter", "f.xml", "--matcher-result", "mr.xml",
                              "--no-validate", "--execution-id", id, "--trace"]).unwrap();
        let Command::Run(run) = cmd else { panic!("esperaba Run") };
        assert_eq!(run.model, PathBuf::from("m.xml"));
        assert_eq!(run.request, PathBuf::from("r.xml"));
        assert_eq!(run.filter, Some(PathBuf::from("f.xml")));
        assert_eq!(run.matcher_result, Some(PathBuf::from("mr.xml")));
        assert!(run.no_validate && run.trace);
        assert_eq!(run.execution_id, Some(Uuid::parse_str(id).unwrap()));
    }

    #[test]
    fn run_subcommand_is_optional() {
        let with = parse_args(["run", "--model", "m.xml", "--request", "r.xml"]).unwrap();
        let without = parse_args(["--model", "m.xml", "--request", "r.xml"]).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse_args(["--model", "m.xml", "--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn missing_inputs_are_usage_errors() {
        assert!(matches!(parse_args(["--request", "r.xml"]), Err(AppError::Usage(m)) if m.contains("--model")));
        assert!(matches!(parse_args(["--model", "m.xml"]), Err(AppError::Usage(m)) if m.contains("--request")));
        assert!(matches!(parse_args(["--model"]), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(["--bogus"]), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(["--model", "m", "--request", "r", "--execution-id", "nope"]),
                         Err(AppError::Usage(_))));
    }
}
