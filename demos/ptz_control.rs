use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vapix_rs::{Connection, MoveDirection, Ptz, VapixCam};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        println!("Usage: {} <Host> <Username> <Password>", args[0]);
        println!("Example: cargo run --example ptz_control -- 192.168.1.10 root pass123");
        return Ok(());
    }

    let mut cam = VapixCam::new(&args[1], &args[2], &args[3]);
    cam.connect(Duration::from_secs(5)).await?;

    let position = cam.get_current_position().await?;
    println!(
        "Current position: pan={} tilt={} zoom={}",
        position.pan, position.tilt, position.zoom
    );

    // 1. Continuous movement
    println!("Panning right...");
    cam.continuous_pantilt(30, 0).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    cam.stop_move().await?;

    // 2. Relative nudge and zoom
    println!("Nudging up and zooming in...");
    cam.relative_move(0.0, 5.0, 500, 50).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // 3. Presets
    println!("Saving preset 'demo'...");
    cam.save_preset_name("demo").await?;
    cam.move_direction(MoveDirection::Left, 50).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("Returning to preset 'demo'...");
    cam.goto_preset_name("demo", 80).await?;

    for preset in cam.list_presets().await? {
        println!("Preset {}: {}", preset.number, preset.name);
    }
    cam.remove_preset_name("demo").await?;

    // 4. Back to where we started
    cam.absolute_move(position.pan, position.tilt, position.zoom.round() as i32, 80)
        .await?;

    cam.close().await?;
    println!("Done.");

    Ok(())
}
