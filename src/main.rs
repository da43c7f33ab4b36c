use clap::Parser;
use llm_router::cli::{
    categories, handle_completions, handle_config_init, status, Cli, Commands, ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => llm_router::cli::serve::run_serve(args).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Categories(args) => {
            categories::handle_categories(&args).map(|output| println!("{}", output))
        }
        Commands::Status(args) => status::handle_status(&args)
            .await
            .map(|output| println!("{}", output)),
        Commands::Reset(args) => status::handle_reset(&args)
            .await
            .map(|output| println!("{}", output)),
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
