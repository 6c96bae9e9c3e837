use anyhow::Result;
use clap::{Parser, Subcommand};
use secp256k1::Secp256k1;

#[derive(Parser)]
#[command(name = "bm", version, about = "BitMarket node CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the marketplace REST API service.
    MarketApi,
    /// Generate a secp256k1 keypair; the public key is the market address.
    Keygen,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::MarketApi => {
            let config = bm_market_api::load_config()?;
            bm_market_api::run(config).await
        }
        Commands::Keygen => {
            let secp = Secp256k1::new();
            let (secret_key, public_key) =
                secp.generate_keypair(&mut secp256k1::rand::thread_rng());
            println!("address: {}", hex::encode(public_key.serialize()));
            println!("secret:  {}", hex::encode(secret_key.secret_bytes()));
            Ok(())
        }
    }
}
