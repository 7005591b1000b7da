use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use phonk::{parse_program, EvaluationContext, PhonkError, Value};
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};

/// Interpreter for the phonk language
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Source file to run. Starts an interactive session when omitted
    file: Option<PathBuf>,

    /// Do not load the standard library
    #[arg(long)]
    no_prelude: bool,

    /// Print every result as a JSON object
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Report {
    Success {
        ok: bool,
        output: serde_json::Value,
    },
    Failure {
        ok: bool,
        #[serde(rename = "type")]
        kind: &'static str,
        message: String,
    },
}

fn json_output(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Boolean(value) => (*value).into(),
        Value::Integer(value) => (*value).into(),
        Value::Float(number) => serde_json::Number::from_f64(*number)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| value.to_string().into()),
        other => other.to_string().into(),
    }
}

impl From<&Result<Value, PhonkError>> for Report {
    fn from(result: &Result<Value, PhonkError>) -> Self {
        match result {
            Ok(value) => Self::Success { ok: true, output: json_output(value) },
            Err(err) => Self::Failure { ok: false, kind: err.kind().name(), message: err.message() },
        }
    }
}

fn render(result: &Result<Value, PhonkError>, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(&Report::from(result))?);
    }

    Ok(match result {
        Ok(value) => value.to_string(),
        Err(err) => err.to_string(),
    })
}

fn run_file(context: &mut EvaluationContext, path: &Path, json: bool) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let program = parse_program(&source)?;

    for sexp in &program {
        // Errors end the run; in JSON mode they are reported first
        let result = context.evaluate_sexp(sexp);
        if json || result.is_ok() {
            println!("{}", render(&result, json)?);
        }
        result?;
    }

    Ok(())
}

fn is_quit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "q" | "quit" | "exit")
}

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>) -> io::Result<Option<String>> {
    stdout.write_all("> ".as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

async fn repl(context: &mut EvaluationContext, json: bool) -> anyhow::Result<()> {
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = query(&mut stdout, &mut lines).await? {
        let line = line.trim();
        if line.is_empty() { continue; }
        if is_quit(line) { break; }

        let result = context.evaluate_str(line);
        println!("{}", render(&result, json)?);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut context = if cli.no_prelude {
        EvaluationContext::bare()
    } else {
        EvaluationContext::new()?
    };

    match &cli.file {
        Some(path) => run_file(&mut context, path, cli.json),
        None => repl(&mut context, cli.json).await,
    }
}
