use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use log::{error, info};
use tinygen_engine::{Engine, EngineConfig, GenerateOptions};

/// Model-shape arguments shared by every subcommand.
fn model_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("vocab-size")
                .long("vocab-size")
                .value_name("INT")
                .help("Vocabulary size")
                .default_value("4096")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("dim")
                .short('d')
                .long("dim")
                .value_name("INT")
                .help("Embedding dimension")
                .default_value("64")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("heads")
                .long("heads")
                .value_name("INT")
                .help("Number of attention heads (must divide the embedding dimension)")
                .default_value("4")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("layers")
                .short('l')
                .long("layers")
                .value_name("INT")
                .help("Number of transformer layers")
                .default_value("2")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("hidden")
                .long("hidden")
                .value_name("INT")
                .help("Feed-forward hidden dimension")
                .default_value("256")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("context")
                .short('c')
                .long("context")
                .value_name("INT")
                .help("Maximum sequence length (sliding window size)")
                .default_value("256")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("INT")
                .help("Seed for weight initialization and sampling")
                .default_value("42")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("init-std")
                .long("init-std")
                .value_name("FLOAT")
                .help("Weight init standard deviation (default: Glorot per tensor)")
                .value_parser(clap::value_parser!(f32)),
        )
}

/// Define the generate subcommand.
fn generate_subcommand() -> Command {
    model_args(
        Command::new("generate")
            .about("Generate a text continuation for a prompt")
            .arg(
                Arg::new("PROMPT")
                    .help("Input prompt")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("temperature")
                    .short('t')
                    .long("temperature")
                    .value_name("FLOAT")
                    .help("Sampling temperature, must be > 0 [default: 0.9]")
                    .default_value("0.9")
                    .value_parser(clap::value_parser!(f32)),
            )
            .arg(
                Arg::new("top-k")
                    .short('k')
                    .long("top-k")
                    .value_name("INT")
                    .help("Restrict sampling to the k most probable tokens [default: 50]")
                    .default_value("50")
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                Arg::new("max-new-tokens")
                    .short('n')
                    .long("max-new-tokens")
                    .value_name("INT")
                    .help("Maximum number of tokens to generate [default: 200]")
                    .default_value("200")
                    .value_parser(clap::value_parser!(usize)),
            ),
    )
}

/// Define the tokenize subcommand.
fn tokenize_subcommand() -> Command {
    model_args(
        Command::new("tokenize")
            .about("Encode text to token ids and decode them back")
            .arg(
                Arg::new("TEXT")
                    .help("Text to tokenize")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("length")
                    .long("length")
                    .value_name("INT")
                    .help("Encoded sequence length (default: context size)")
                    .value_parser(clap::value_parser!(usize)),
            ),
    )
}

fn build_engine(matches: &ArgMatches) -> Result<Engine> {
    let config = EngineConfig::builder()
        .vocab_size(*matches.get_one::<usize>("vocab-size").unwrap())
        .embedding_dim(*matches.get_one::<usize>("dim").unwrap())
        .num_heads(*matches.get_one::<usize>("heads").unwrap())
        .num_layers(*matches.get_one::<usize>("layers").unwrap())
        .hidden_dim(*matches.get_one::<usize>("hidden").unwrap())
        .max_seq_len(*matches.get_one::<usize>("context").unwrap())
        .init_std(matches.get_one::<f32>("init-std").copied())
        .seed(*matches.get_one::<u64>("seed").unwrap())
        .build()?;

    Engine::new(config)
}

fn run_generate_command(matches: &ArgMatches) -> Result<()> {
    let engine = build_engine(matches)?;

    let options = GenerateOptions {
        max_new_tokens: *matches.get_one::<usize>("max-new-tokens").unwrap(),
        temperature: *matches.get_one::<f32>("temperature").unwrap(),
        top_k: *matches.get_one::<usize>("top-k").unwrap(),
    };

    let prompt = matches.get_one::<String>("PROMPT").unwrap();
    let output = engine.generate(prompt, &options)?;
    println!("{output}");

    Ok(())
}

fn run_tokenize_command(matches: &ArgMatches) -> Result<()> {
    let engine = build_engine(matches)?;

    let text = matches.get_one::<String>("TEXT").unwrap();
    let length = matches
        .get_one::<usize>("length")
        .copied()
        .unwrap_or(engine.config().max_seq_len);

    let ids = engine.encode(text, length);
    info!(
        "{} ids ({} non-pad) over a vocabulary of {}",
        ids.len(),
        count_non_pad(&engine, &ids),
        engine.tokenizer().vocab_size()
    );
    println!("{ids:?}");
    println!("{}", engine.decode(&ids));

    Ok(())
}

fn count_non_pad(engine: &Engine, ids: &[usize]) -> usize {
    let pad = engine.tokenizer().pad_id();
    ids.iter().filter(|&&id| id != pad).count()
}

fn execute_commands() -> Result<()> {
    // Initialize logger with clean format (no timestamp/module prefix)
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "{}", record.args())
        })
        .init();

    let matches = Command::new("tinygen")
        .about("tinygen CLI: run a from-scratch, randomly-initialized transformer engine")
        .subcommand(generate_subcommand())
        .subcommand(tokenize_subcommand())
        .get_matches();

    match matches.subcommand() {
        Some(("generate", matches)) => run_generate_command(matches),
        Some(("tokenize", matches)) => run_tokenize_command(matches),
        _ => anyhow::bail!("No subcommand specified. Use -h to print help information."),
    }
}

fn main() {
    if let Err(e) = execute_commands() {
        error!("Error: {e}");
        std::process::exit(1);
    }
}
