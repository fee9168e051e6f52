use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use html_rewrite::{HtmlRewritePass, RewriteConfig, RewriteError, RewriteStats};
use template_ast::IncrementingIdGenerator;
use template_ast::shape::block_shape;
use template_ast::source::template_source;
use template_syntax::SyntaxError;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Rewrite html in template files and report what the pass sees.
#[derive(Parser, Debug)]
#[command(name = "htmlpass", version, about, long_about = None)]
struct Args {
    /// Template files to rewrite; `-` reads standard input.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Print the node-kind outline of every template.
    #[arg(long, default_value_t = false)]
    shape: bool,
    /// Print the source projection of every template.
    #[arg(long, default_value_t = false)]
    source: bool,
    /// Only set the exit status; print no diagnostics.
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
    /// Lex every raw-text node on its own instead of joining neighbours.
    #[arg(long, default_value_t = false)]
    no_coalesce: bool,
    /// Maximum control-flow nesting inside html.
    #[arg(long, default_value_t = RewriteConfig::default().max_control_flow_depth)]
    max_depth: usize,
}

enum CliError {
    Io { path: String, err: io::Error },
    Syntax { path: String, line: usize, column: usize, err: SyntaxError },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, err } => write!(f, "{path}: {err}"),
            CliError::Syntax {
                path,
                line,
                column,
                err,
            } => write!(f, "{path}:{line}:{column}: syntax error: {err}"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let pass = HtmlRewritePass::new(RewriteConfig {
        coalesce_text: !args.no_coalesce,
        max_control_flow_depth: args.max_depth,
    });

    let mut failed = false;
    let mut total = RewriteStats::default();
    for path in &args.files {
        match run_file(&pass, &args, path) {
            Ok((stats, errors)) => {
                total.merge(stats);
                failed |= errors > 0;
            }
            Err(err) => {
                eprintln!("{err}");
                failed = true;
            }
        }
    }
    log::info!(target: "htmlpass", "{} file(s): {:?}", args.files.len(), total);
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_file(
    pass: &HtmlRewritePass,
    args: &Args,
    path: &Path,
) -> Result<(RewriteStats, usize), CliError> {
    let display = path.display().to_string();
    let src = read_input(path).map_err(|err| CliError::Io {
        path: display.clone(),
        err,
    })?;
    let mut ids = IncrementingIdGenerator::new();
    let mut file = template_syntax::parse_file(&src, &mut ids).map_err(|err| {
        let (line, column) = line_column(&src, err.offset);
        CliError::Syntax {
            path: display.clone(),
            line,
            column,
            err,
        }
    })?;

    let mut errors: Vec<RewriteError> = Vec::new();
    let stats = pass.rewrite_file(&mut file, &mut ids, &mut errors);
    for template in &file.templates {
        if args.shape || args.source {
            println!("== {display} {}", template.name);
        }
        if args.shape {
            print!("{}", block_shape(&template.block));
        }
        if args.source {
            println!("{}", template_source(template));
        }
    }
    if !args.quiet {
        for error in &errors {
            let (line, column) = line_column(&src, error.location.start);
            eprintln!("{display}:{line}:{column}: {}", error.kind);
        }
    }
    log::debug!(target: "htmlpass", "{display}: {stats:?}");
    Ok((stats, errors.len()))
}

fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        return Ok(src);
    }
    fs::read_to_string(path)
}

/// One-based line and column (in chars) of a byte offset.
fn line_column(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = src.get(..offset).unwrap_or(src);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_counts_from_one() {
        let src = "ab\ncd\u{e9}f";
        assert_eq!(line_column(src, 0), (1, 1));
        assert_eq!(line_column(src, 2), (1, 3));
        assert_eq!(line_column(src, 3), (2, 1));
        assert_eq!(line_column(src, 7), (2, 4));
        assert_eq!(line_column(src, 100), (2, 5));
    }

    #[test]
    fn args_parse_flags_and_stdin() {
        let args = Args::try_parse_from(["htmlpass", "--shape", "-q", "-"]).unwrap();
        assert!(args.shape);
        assert!(args.quiet);
        assert!(!args.source);
        assert_eq!(args.files, vec![PathBuf::from("-")]);
        assert_eq!(args.max_depth, 256);
    }
}
