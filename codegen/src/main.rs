use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::LevelFilter;

use bytecode::writer::render;
use codegen::{CodegenConfig, assemble, write_program};
use syntax::CheckedProgram;
use vm::VM;

const OUTPUT_FILE: &str = "Main.j";

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Lower a checked program to JVM assembly", long_about = None)]
struct Cli {
    /// Checked program to lower, as JSON
    input: PathBuf,

    /// Directory receiving the assembly file
    #[arg(short, long, default_value = "codeGenOutput")]
    output_dir: PathBuf,

    /// Print the assembly to stdout instead of writing a file
    #[arg(long)]
    dump: bool,

    /// Execute the lowered program on the reference evaluator
    #[arg(long)]
    run: bool,

    #[arg(long, default_value_t = 128, help = "Declared operand stack limit")]
    limit_stack: u16,

    #[arg(long, default_value_t = 128, help = "Declared local slot limit")]
    limit_locals: u16,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let checked: CheckedProgram = serde_json::from_str(&source)
        .with_context(|| format!("parsing {}", cli.input.display()))?;

    let config = CodegenConfig {
        stack_limit: cli.limit_stack,
        locals_limit: cli.limit_locals,
        ..CodegenConfig::default()
    };

    let class = if cli.dump {
        let class = assemble(&checked, config).context("lowering program")?;
        print!("{}", render(&class).context("rendering assembly")?);
        class
    } else {
        let path = prepare_output(&cli.output_dir)?;
        let file = fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        let class = write_program(&checked, config, BufWriter::new(file))
            .context("lowering program")?;
        log::info!("wrote {}", path.display());
        class
    };

    if cli.run {
        let mut vm = VM::new(&class).with_echo(true);
        vm.run_main().context("running program")?;
        log::info!("program finished after {} steps", vm.steps());
    }
    Ok(())
}

/// Create `dir` if needed, clear stale files from it and return the path
/// of the assembly file.
fn prepare_output(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            remove_stale(&path)
                .with_context(|| format!("removing {}", path.display()))?;
        }
    }
    Ok(dir.join(OUTPUT_FILE))
}

fn remove_stale(path: &Path) -> io::Result<()> {
    log::debug!("removing stale {}", path.display());
    fs::remove_file(path)
}
