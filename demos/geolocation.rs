use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vapix_rs::{Connection, Geolocation, VapixCam};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        println!("Usage: {} <Host> <Username> <Password> [<Lat> <Lng> <Heading>]", args[0]);
        return Ok(());
    }

    let mut cam = VapixCam::new(&args[1], &args[2], &args[3]);
    cam.connect(Duration::from_secs(5)).await?;

    if args.len() >= 7 {
        let lat: f64 = args[4].parse()?;
        let lon: f64 = args[5].parse()?;
        let heading: f64 = args[6].parse()?;
        println!("Setting position to {}, {} heading {}...", lat, lon, heading);
        cam.set_position(lat, lon, heading, "").await?;
    }

    println!("\n--- Geolocation ---");
    match cam.get_position().await {
        Ok(position) => println!("{:#?}", position),
        Err(e) => eprintln!("Error getting position: {}", e),
    }

    cam.close().await?;
    Ok(())
}
