//! Command-line interface for the lanwatch hub.
//!
//! This binary talks to a running hub daemon over its HTTP API.

use std::env;

use anyhow::Result;

use lanwatch_hub::api_client;
use lanwatch_hub::monitor::LinkStatus;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: lanwatch-cli <command>");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  status                 Show fleet status");
        eprintln!("  mute <key> <minutes>   Mute a device's alerts");
        eprintln!();
        eprintln!("Environment:");
        eprintln!("  LANWATCH_API_URL    API base URL (default: http://127.0.0.1:8080)");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "status" => cmd_status().await?,
        "mute" if args.len() == 4 => {
            cmd_mute(&args[2], args[3].parse()?).await?;
        }
        command => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run without arguments to see usage.");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Build an API client, honoring LANWATCH_API_URL if set.
fn make_client() -> api_client::Client {
    match env::var("LANWATCH_API_URL") {
        Ok(url) => api_client::Client::with_base_url(url),
        Err(_) => api_client::Client::new(),
    }
}

/// Print a one-line summary per device.
async fn cmd_status() -> Result<()> {
    let client = make_client();
    let devices = client.get_devices().await?;

    if devices.is_empty() {
        println!("No devices configured.");
        return Ok(());
    }

    for device in &devices {
        let marker = match device.status {
            LinkStatus::Connected => "✅",
            LinkStatus::Disconnected => "❌",
            LinkStatus::Unknown => "❓",
        };
        println!("{marker} {} ({})", device.name, device.key);

        if let Some(ip) = device.ip {
            println!("   ip:      {ip}");
        }
        if let Some(signal) = &device.signal {
            println!("   signal:  {signal}");
        }
        println!(
            "   24h:     {} disconnects / {} connects",
            device.counters_24h.disconnects, device.counters_24h.connects
        );
        if let Some(muted_until) = device.muted_until {
            println!("   muted:   until {muted_until}");
        }
    }

    Ok(())
}

async fn cmd_mute(key: &str, minutes: u64) -> Result<()> {
    let client = make_client();
    let response = client.mute(key, minutes).await?;
    println!("Muted {} until {}", response.key, response.muted_until);
    Ok(())
}
