use clap::Parser;
use log::LevelFilter;

use jpeg_gray::cli::{handle_config_action, run_convert, Args, Command};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the -v level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let code = match args.command {
        Some(Command::Config { ref action }) => {
            handle_config_action(action.clone(), args.config.as_deref())
        }
        None => run_convert(&args),
    };
    std::process::exit(code);
}
