//! # Playback Coordinator Example
//!
//! Drives the coordinator against the simulated desktop engine: plays a
//! queue, skips around, lets a short track finish so the queue advances on
//! its own, then closes the player.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use std::sync::Arc;
use std::time::Duration;

use bridge_desktop::{SimulatedAudioEngine, SimulationConfig};
use core_library::{Track, User};
use core_playback::{PlaybackCoordinator, PlaybackSnapshot};

fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: "Neo User".to_string(),
        url: format!("file:///music/{id}.mp3"),
        cover_url: format!("https://picsum.photos/400/400?random={id}"),
        uploaded_by: User::current(),
        duration: 0.0,
        created_at: 0,
        likes: 0,
        liked_by_user: false,
    }
}

fn print_snapshot(label: &str, snapshot: &PlaybackSnapshot) {
    let title = snapshot
        .current_track
        .as_ref()
        .map(|t| t.title.as_str())
        .unwrap_or("-");
    println!(
        "   {label:<10} {title:<14} {:?} {:>5.1}s / {:>5.1}s visible={}",
        snapshot.state, snapshot.position_secs, snapshot.duration_secs, snapshot.visible
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let engine = Arc::new(SimulatedAudioEngine::new(SimulationConfig {
        tick: Duration::from_millis(100),
        ..SimulationConfig::default()
    }));

    let queue = vec![
        track("1", "Opening"),
        track("2", "Short Interlude"),
        track("3", "Closer"),
    ];
    engine.set_track_duration(&queue[1].url, Duration::from_millis(600));

    let coordinator = PlaybackCoordinator::builder(engine.clone()).build()?;

    println!("\n🎵 Starting queue...");
    coordinator.play_song(queue[0].clone(), Some(queue.clone())).await?;
    tokio::time::sleep(Duration::from_millis(350)).await;
    print_snapshot("playing", &coordinator.snapshot());

    println!("\n⏯  Toggling by re-selecting the current track...");
    coordinator.play_song(queue[0].clone(), None).await?;
    print_snapshot("toggled", &coordinator.snapshot());
    coordinator.toggle_play().await;

    println!("\n⏭  Skipping to the short track and waiting for it to finish...");
    coordinator.next_song().await?;
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    print_snapshot("advanced", &coordinator.snapshot());

    println!("\n⏮  Previous (restarts when past the scrub-back threshold)...");
    let outcome = coordinator.previous_song().await?;
    println!("   outcome: {outcome:?}");
    print_snapshot("previous", &coordinator.snapshot());

    println!("\n⏹  Closing the player...");
    coordinator.close().await;
    print_snapshot("closed", &coordinator.snapshot());

    println!("\n   Engine loads: {}", engine.load_count());
    Ok(())
}
