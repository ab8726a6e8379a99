use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use replay::PlaybackState;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use terminal::app::{App, AppCommand, AppState};
use terminal::config::Args;
use tokio::runtime::Handle;

fn round_file(dir: &PathBuf) -> PathBuf {
    let mut text = String::from(
        r#"{"type":"metadata","data":{"roundNumber":7,"startTick":0,"endTick":80,"mapName":"de_inferno","ctScore":3,"tScore":3}}"#,
    );
    text.push('\n');
    for tick in (0..=80).step_by(8) {
        text.push_str(&format!(
            r#"{{"type":"frame","data":{{"tick":{},"time":{},"players":[{{"steamId":"1","name":"alpha","team":2,"x":{},"y":0,"yaw":90,"isAlive":true,"health":100}}]}}}}"#,
            tick,
            tick as f64 / 64.0,
            tick * 10
        ));
        text.push('\n');
    }
    text.push_str(r#"{"type":"event","data":{"type":"kill","tick":40,"victimSteamId":"2","weapon":"awp"}}"#);
    text.push('\n');
    text.push_str(r#"{"type":"end"}"#);
    text.push('\n');

    let path = dir.join("inferno-round-7.ndjson");
    fs::write(&path, text).unwrap();
    path
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("radar-app-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

async fn wait_for_frames(app: &mut App) {
    for _ in 0..200 {
        app.update(Instant::now());
        if !app.session().timeline().frames().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_open_and_play_local_replay() -> Result<()> {
    let dir = scratch_dir("open");
    let path = round_file(&dir);
    let args = Args::parse_from(["radar-terminal", "--replay-dir", dir.to_str().unwrap()]);
    let mut app = App::new(&args, args.playback_config()?, Handle::current())?;

    // Selector lists the file and Enter opens it
    let command = app.handle_input(key(KeyCode::Enter));
    assert!(matches!(&command, Some(AppCommand::OpenReplay(p)) if *p == path));
    app.handle_command(command.unwrap())?;
    assert!(matches!(app.state, AppState::ReplayViewer(_)));

    wait_for_frames(&mut app).await;
    let timeline = app.session().timeline();
    assert_eq!(timeline.state(), PlaybackState::Ready);
    assert_eq!(timeline.frames().len(), 11);
    assert_eq!(timeline.metadata().map(|m| m.round_number), Some(7));

    assert!(app.handle_input(key(KeyCode::Char(' '))).is_none());
    assert_eq!(app.session().timeline().state(), PlaybackState::Playing);

    app.handle_input(key(KeyCode::Char('n')));
    assert_eq!(app.session().timeline().current_tick(), 40);

    app.handle_input(key(KeyCode::Char('l')));
    assert_eq!(app.session().timeline().state(), PlaybackState::Paused);
    assert_eq!(app.session().timeline().current_tick(), 48);

    app.handle_input(key(KeyCode::Char(']')));
    assert_eq!(app.session().config().speed.multiplier(), 1.5);

    let mut terminal = Terminal::new(TestBackend::new(120, 40))?;
    terminal.draw(|f| app.render(f))?;
    let screen: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect();
    assert!(screen.contains("de_inferno"));
    assert!(screen.contains("Radar"));
    assert!(screen.contains("alpha"));

    let command = app.handle_input(key(KeyCode::Char('q')));
    assert!(matches!(command, Some(AppCommand::BackToSelector)));
    app.handle_command(AppCommand::BackToSelector)?;
    assert_eq!(app.session().timeline().state(), PlaybackState::Idle);
    assert!(matches!(app.state, AppState::ReplaySelector(_)));

    fs::remove_dir_all(dir).ok();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broken_file_shows_error() -> Result<()> {
    let dir = scratch_dir("broken");
    let path = dir.join("broken.json");
    fs::write(&path, "{ not json")?;
    let args = Args::parse_from(["radar-terminal", "--replay-dir", dir.to_str().unwrap()]);
    let mut app = App::new(&args, args.playback_config()?, Handle::current())?;

    app.handle_command(AppCommand::OpenReplay(path))?;
    for _ in 0..200 {
        app.update(Instant::now());
        if app.session().timeline().error().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let timeline = app.session().timeline();
    assert_eq!(timeline.state(), PlaybackState::Idle);
    assert!(timeline.error().unwrap_or_default().contains("broken.json"));

    fs::remove_dir_all(dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_stream_round_without_api_is_ignored() -> Result<()> {
    let dir = scratch_dir("noapi");
    let args = Args::parse_from(["radar-terminal", "--replay-dir", dir.to_str().unwrap()]);
    let mut app = App::new(&args, args.playback_config()?, Handle::current())?;

    app.handle_command(AppCommand::StreamRound(replay::RoundRequest::new("demo", 3)))?;
    assert!(matches!(app.state, AppState::ReplaySelector(_)));
    assert_eq!(app.session().timeline().state(), PlaybackState::Idle);

    fs::remove_dir_all(dir).ok();
    Ok(())
}
