use clap::Parser;
use machinebox::{Facebox, Input, StatusPoller};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address of the Facebox instance
    #[arg(short, long, default_value = "http://localhost:8080")]
    addr: String,

    /// Path to the image to check
    #[arg(short, long)]
    image: PathBuf,

    /// Seconds to wait for the box to become ready
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "info" }),
    )
    .init();

    let facebox = Arc::new(Facebox::new(&args.addr)?);

    println!("Waiting for Facebox at {}...", args.addr);
    StatusPoller::default()
        .wait_for_ready_timeout(facebox.clone(), Duration::from_secs(args.timeout))
        .await?;

    let info = facebox.info().await?;
    println!("{} v{} ({}) is {}", info.name, info.version, info.build, info.status);

    let faces = facebox.check(Input::from_path(&args.image).await?).await?;
    println!("Found {} face(s) in {:?}", faces.len(), args.image);
    for face in faces {
        let who = if face.matched { face.name.as_str() } else { "unknown" };
        println!(
            "  {who} at ({}, {}) {}x{} confidence {:.2}",
            face.rect.left, face.rect.top, face.rect.width, face.rect.height, face.confidence
        );
    }

    Ok(())
}
