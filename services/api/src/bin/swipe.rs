//! services/api/src/bin/swipe.rs
//!
//! A terminal swipe client. Runs a client-side `Session` against a remote
//! `api` through the REST adapter; each line on stdin is one gesture or action.

use api_lib::{
    adapters::{RestBackend, StaticAuthProvider},
    config::ClientConfig,
    error::ApiError,
};
use scrollnet_core::{
    classifier::Gesture,
    domain::{Answers, EmojiKey},
    feed::FeedStep,
    session::{GestureOutcome, Session, SessionDeps},
    telemetry::TracingTelemetry,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  right | left | up       swipe (like, dislike, next)
  tap                     toggle playback
  <dx> <dy>               raw gesture displacement in pixels
  emoji <key>             react (fire heart laugh wow sad angry clap mind_blown)
  view <ms>               record watch time for the current video
  feedback k=v [k=v ...]  answer the open feedback form
  skip                    dismiss the open feedback form
  refresh                 reload the feed
  new-id                  replace the anonymous id for this session
  quit";

/// One parsed line of input.
#[derive(Debug, PartialEq)]
enum Command {
    Gesture(Gesture),
    Emoji(String),
    View(u64),
    Feedback(Answers),
    Skip,
    Refresh,
    NewId,
    Help,
    Quit,
}

fn parse_command(line: &str, threshold: f64) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let swipe = threshold * 2.0;

    let command = match head {
        "right" => Command::Gesture(Gesture::new(swipe, 0.0)),
        "left" => Command::Gesture(Gesture::new(-swipe, 0.0)),
        "up" => Command::Gesture(Gesture::new(0.0, -swipe)),
        "tap" => Command::Gesture(Gesture::new(0.0, 0.0)),
        "emoji" => Command::Emoji(
            words
                .next()
                .ok_or_else(|| "emoji needs a key".to_string())?
                .to_string(),
        ),
        "view" => {
            let ms = words.next().ok_or_else(|| "view needs a duration".to_string())?;
            Command::View(ms.parse().map_err(|_| format!("'{ms}' is not a duration"))?)
        }
        "feedback" => {
            let mut answers = Answers::new();
            for pair in words.by_ref() {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("'{pair}' is not key=value"))?;
                answers.insert(key.to_string(), value.to_string());
            }
            Command::Feedback(answers)
        }
        "skip" => Command::Skip,
        "refresh" => Command::Refresh,
        "new-id" => Command::NewId,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        dx => {
            let dy = words.next().ok_or_else(|| format!("unknown command '{dx}'"))?;
            let dx: f64 = dx.parse().map_err(|_| format!("unknown command '{dx}'"))?;
            let dy: f64 = dy.parse().map_err(|_| format!("'{dy}' is not a number"))?;
            Command::Gesture(Gesture::new(dx, dy))
        }
    };

    if words.next().is_some() {
        return Err(format!("too many arguments for '{head}'"));
    }
    Ok(command)
}

fn show_step(step: &FeedStep) {
    match step {
        FeedStep::Video(item) => {
            let marker = if item.degraded { " (offline)" } else { "" };
            println!("> {} [{}]{}", item.video.title, item.video.id, marker);
        }
        FeedStep::EndOfFeed => println!("> end of feed"),
    }
}

fn show_outcome(outcome: &GestureOutcome) {
    match outcome {
        GestureOutcome::Playback { playing } => {
            println!("{}", if *playing { "playing" } else { "paused" })
        }
        GestureOutcome::Advanced { intent, next, prompt } => {
            println!("{:?}", intent);
            show_step(next);
            if let Some(prompt) = prompt {
                println!(
                    "? feedback requested for {}: answer with 'feedback k=v' or 'skip'",
                    prompt.video_id
                );
            }
        }
        GestureOutcome::Reacted { video_id, key } => println!("{} on {}", key.as_str(), video_id),
        GestureOutcome::Blocked => println!("close the feedback form first"),
        GestureOutcome::Ignored => {}
        GestureOutcome::EndOfFeed => println!("> end of feed"),
    }
}

async fn run_command(session: &Session, command: Command) {
    match command {
        Command::Gesture(gesture) => show_outcome(&session.handle_gesture(gesture).await),
        Command::Emoji(key) => match key.parse::<EmojiKey>() {
            Ok(key) => show_outcome(&session.press_emoji(key).await),
            Err(e) => println!("{}", e),
        },
        Command::View(ms) => {
            if let Err(e) = session.record_view(ms).await {
                println!("{}", e);
            }
        }
        Command::Feedback(answers) => match session.submit_feedback(answers).await {
            Ok(ack) if ack.is_degraded() => println!("thanks (not saved, backend unreachable)"),
            Ok(_) => println!("thanks"),
            Err(e) => println!("{}", e),
        },
        Command::Skip => {
            if !session.skip_feedback().await {
                println!("no feedback form is open");
            }
        }
        Command::Refresh => show_step(&session.refresh().await),
        Command::Help => println!("{HELP}"),
        Command::NewId | Command::Quit => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = ClientConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let backend = RestBackend::new(config.backend_url.clone())
        .map_err(|e| ApiError::Internal(format!("HTTP client: {}", e)))?
        .with_bearer_token(config.token.clone());
    let auth = match &config.user_id {
        Some(id) => {
            StaticAuthProvider::signed_in(id.clone(), config.token.clone().unwrap_or_default())
        }
        None => StaticAuthProvider::anonymous(),
    };

    let mut session = Session::new(
        SessionDeps {
            backend: Arc::new(backend),
            auth: Arc::new(auth),
            telemetry: Arc::new(TracingTelemetry),
        },
        config.session,
    );
    info!(
        backend = %config.backend_url,
        identity = %session.identity().await,
        "Swipe client started."
    );

    println!("{HELP}");
    show_step(&session.start().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line, config.session.swipe_threshold) {
            Ok(Command::Quit) => break,
            Ok(Command::NewId) => {
                let id = session.regenerate_anonymous_id();
                println!("anonymous id is now {}", id);
                info!(identity = %session.identity().await, "Anonymous id replaced.");
            }
            Ok(command) => run_command(&session, command).await,
            Err(e) => println!("{}", e),
        }
    }

    // Give queued interaction writes a chance to land before exiting.
    session.flush().await;
    info!(consumed = session.videos_consumed().await, "Swipe client finished.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_swipes_clear_the_threshold() {
        assert_eq!(
            parse_command("right", 50.0).unwrap(),
            Command::Gesture(Gesture::new(100.0, 0.0))
        );
        assert_eq!(
            parse_command("up", 50.0).unwrap(),
            Command::Gesture(Gesture::new(0.0, -100.0))
        );
    }

    #[test]
    fn raw_displacement_is_parsed() {
        assert_eq!(
            parse_command("-12.5 80", 50.0).unwrap(),
            Command::Gesture(Gesture::new(-12.5, 80.0))
        );
    }

    #[test]
    fn feedback_answers_are_collected() {
        let Command::Feedback(answers) =
            parse_command("feedback mood=good pace=slow", 50.0).unwrap()
        else {
            panic!("expected feedback");
        };
        assert_eq!(answers.get("mood").map(String::as_str), Some("good"));
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn session_commands_take_no_arguments() {
        assert_eq!(parse_command("new-id", 50.0).unwrap(), Command::NewId);
        assert_eq!(parse_command("skip", 50.0).unwrap(), Command::Skip);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_command("feedback nonsense", 50.0).is_err());
        assert!(parse_command("view soon", 50.0).is_err());
        assert!(parse_command("dance", 50.0).is_err());
        assert!(parse_command("tap now", 50.0).is_err());
        assert!(parse_command("new-id please", 50.0).is_err());
    }
}
