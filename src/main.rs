// main.rs
mod cli;
mod commands;

use clap::Parser;
use cli::{Args, Commands};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    affinity::logging::init(args.verbose);

    let data_dir = args.data_dir;
    let result = match args.command {
        Commands::Level { value } => {
            commands::handle_level(value);
            Ok(())
        }
        Commands::Update { user_id, label, stance, platform, nickname, reason } => {
            commands::handle_update(data_dir, platform, user_id, nickname, label, stance, reason).await
        }
        Commands::Summary { user_id, platform, nickname } => {
            commands::handle_summary(data_dir, platform, user_id, nickname).await
        }
        Commands::Simulate { messages, speakers, mention_every, threshold } => {
            commands::handle_simulate(data_dir, messages, speakers, mention_every, threshold).await
        }
        Commands::Params { set } => commands::handle_params(data_dir, set),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
