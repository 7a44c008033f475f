use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use login_gateway::crypto::rsa::parse_public_key;
use login_gateway::crypto::{open_envelope, seal_payload, RsaKeyPair};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Key and payload tooling for the login gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a PKCS#8 keypair for the gateway
    Keygen {
        #[arg(short, long, default_value_t = 2048)]
        bits: usize,
        /// Private key output; the public key goes next to it with a .pub suffix
        #[arg(short, long, default_value = "gateway.pem")]
        out: PathBuf,
    },
    /// Fetch the public key from a running gateway
    PublicKey {
        #[arg(short, long, default_value = "http://localhost:8080/gateway/public-key")]
        url: String,
    },
    /// Encrypt a JSON login form into data/aesKey/publicKey fields
    Seal {
        /// Server public key (PEM or base64 DER)
        #[arg(short, long)]
        server_key: String,
        /// Client private key whose public half should receive error replies
        #[arg(short, long)]
        client_key: Option<PathBuf>,
        /// JSON login form, e.g. '{"username":"sa","password":"123456","captcha":"ab12"}'
        json: String,
    },
    /// Decrypt an encrypted error reply
    Open {
        /// Client private key (PKCS#8 PEM)
        #[arg(short, long)]
        client_key: PathBuf,
        /// Reply body, {"data":{"data":..,"aesKey":..}}
        envelope: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { bits, out } => {
            let keys = RsaKeyPair::generate(bits)?;
            fs::write(&out, keys.private_key_pem()?)?;
            let public_path = out.with_extension("pub");
            fs::write(&public_path, keys.public_key_pem()?)?;
            println!("private key: {}", out.display());
            println!("public key:  {}", public_path.display());
            println!("base64:      {}", keys.public_key_base64()?);
        }
        Commands::PublicKey { url } => {
            let res = reqwest::get(&url).await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: gateway returned status {}", status);
                return Ok(());
            }
            let json: serde_json::Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Seal {
            server_key,
            client_key,
            json,
        } => {
            let server_public = parse_public_key(&server_key)?;
            let client_public = match client_key {
                Some(path) => Some(RsaKeyPair::load(&path)?.public_key_base64()?),
                None => None,
            };
            let payload = seal_payload(&json, &server_public, client_public)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Open {
            client_key,
            envelope,
        } => {
            let keys = RsaKeyPair::load(&client_key)?;
            println!("{}", open_envelope(&keys, &envelope)?);
        }
    }

    Ok(())
}
