use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lrforge::{parser::Config, state::GrammarClass, syntax};
use std::{fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The class of automaton to build.
    #[arg(long, value_enum, default_value_t = Class::Lalr1)]
    class: Class,

    /// The name of the terminal marking the end of input.
    #[arg(long, default_value = lrforge::parser::DEFAULT_END_OF_INPUT)]
    eoi: String,

    /// The path of grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Class {
    Lr0,
    Lr1,
    Lalr1,
}

impl From<Class> for GrammarClass {
    fn from(class: Class) -> Self {
        match class {
            Class::Lr0 => GrammarClass::LR0,
            Class::Lr1 => GrammarClass::LR1,
            Class::Lalr1 => GrammarClass::LALR1,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input) //
        .context("failed to read the grammar file")?;

    let s = Instant::now();
    let grammar = syntax::parse(&source)?;
    tracing::info!("parse: {:?} elapsed", s.elapsed());

    let mut errors = grammar.check();

    let s = Instant::now();
    let table = Config::new()
        .use_class(args.class.into())
        .eoi(args.eoi.as_str())
        .generate(&grammar)?;
    tracing::info!("generate: {:?} elapsed", s.elapsed());

    println!("{}", table.display());

    errors.extend(table.check());
    if !errors.is_empty() {
        eprint!("{}", errors);
        anyhow::bail!("found {} error(s) in the grammar", errors.len());
    }

    Ok(())
}
