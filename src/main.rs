mod cli;

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use juliabab::{
    config::Config,
    evaluate_in,
    execution::prepare,
    process::julia::JuliaLauncher,
    request::RequestSpec,
    EvalOptions, EvaluationRequest, Params, SessionKey, SessionManager, VarValue,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = cli::Cli::parse();

    // Load config; CLI switches override it
    let mut cfg = Config::load();
    if args.debug {
        cfg.set("JULIABAB_DEBUG", "true");
    }
    if args.report_side_files {
        cfg.set("REPORT_SIDE_FILES", "true");
    }
    let opts = EvalOptions::from_config(&cfg);

    let requests = match &args.request {
        Some(path) => read_request_file(path, &cfg.default_session())?,
        None => vec![request_from_args(&args, &cfg)?],
    };

    if args.print_wrapped {
        for request in &requests {
            let prepared = prepare(request)?;
            println!("{}", prepared.wrapped);
            println!("# trampoline");
            println!("{}", prepared.trampoline);
            if opts.report_side_files {
                let (source, output) = prepared.files.into_paths();
                eprintln!("source: {}\noutput: {}", source.display(), output.display());
            }
        }
        return Ok(());
    }

    let manager = SessionManager::new(JuliaLauncher::from_config(&cfg));
    for request in &requests {
        let result = evaluate_in(&manager, request, &opts).await?;
        if result.output.ends_with('\n') {
            print!("{}", result.output);
        } else {
            println!("{}", result.output);
        }
        if let Some((source, output)) = &result.side_files {
            eprintln!("source: {}\noutput: {}", source.display(), output.display());
        }
    }
    Ok(())
}

fn read_request_file(path: &Path, default_session: &str) -> Result<Vec<EvaluationRequest>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading request file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing request file: {}", path.display()))?;
    let specs: Vec<RequestSpec> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(specs.into_iter().map(|s| s.into_request(default_session)).collect())
}

fn request_from_args(args: &cli::Cli, cfg: &Config) -> Result<EvaluationRequest> {
    let body = match (&args.body, &args.file) {
        (Some(body), _) => body.clone(),
        (None, Some(file)) => {
            fs::read_to_string(file).with_context(|| format!("reading block file: {}", file.display()))?
        }
        (None, None) => {
            if io::stdin().is_terminal() {
                bail!("Provide a block body as an argument, with --file, or via stdin");
            }
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let (width, height) = cfg.graphics_size();
    let mut params = Params {
        prologue: args.prologue.clone(),
        epilogue: args.epilogue.clone(),
        width: args.width.unwrap_or(width),
        height: args.height.unwrap_or(height),
        ..Params::default()
    };
    for raw in &args.vars {
        let Some((name, value)) = raw.split_once('=') else {
            bail!("--var expects NAME=VALUE, got {:?}", raw);
        };
        params.vars.push((name.trim().to_string(), VarValue::parse(value)));
    }
    if let Some(file) = &args.graphics {
        params.result_params.insert("graphics".into());
        params.graphics_file = Some(file.clone());
    }

    let session = SessionKey::resolve(args.session.as_deref(), &cfg.default_session());
    Ok(EvaluationRequest::new(body, args.results.into(), session).with_params(params))
}
