//! Interactive transport commands
//!
//! One command per input line, e.g. `next`, `seek -15`, `repeat queue`.

use cadence_core::TrackId;
use cadence_playback::{Outcome, PlaybackError, RepeatMode, TransportHandle, TransportSnapshot};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    /// Relative seek in seconds
    Seek(i64),
    /// Absolute seek in seconds
    Goto(u64),
    Rewind,
    FastForward,
    Repeat(Option<RepeatMode>),
    Shuffle(Option<bool>),
    Jump(usize),
    Add(Vec<TrackId>),
    Clear,
    Queue,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match name.as_str() {
            "play" | "p" => Command::Play,
            "pause" => Command::Pause,
            "toggle" | "t" => Command::Toggle,
            "next" | "n" => Command::Next,
            "prev" | "previous" => Command::Previous,
            "seek" => Command::Seek(single(&args, "seek", "a signed number of seconds")?),
            "goto" => Command::Goto(single(&args, "goto", "a position in seconds")?),
            "rw" | "rewind" => Command::Rewind,
            "ff" | "forward" => Command::FastForward,
            "repeat" | "r" => Command::Repeat(optional(&args, "repeat", "off, track or queue")?),
            "shuffle" | "s" => Command::Shuffle(match args.first() {
                None => None,
                Some(&"on") => Some(true),
                Some(&"off") => Some(false),
                Some(_) => {
                    return Err(ParseError::BadArgument {
                        command: "shuffle",
                        expected: "on or off",
                    })
                }
            }),
            "jump" | "j" => {
                let expected = "a queue position (1-based)";
                match single(&args, "jump", expected)? {
                    0 => {
                        return Err(ParseError::BadArgument {
                            command: "jump",
                            expected,
                        })
                    }
                    position => Command::Jump(position),
                }
            }
            "add" => {
                if args.is_empty() {
                    return Err(ParseError::BadArgument {
                        command: "add",
                        expected: "one or more track ids",
                    });
                }
                Command::Add(args.iter().map(|id| TrackId::new(*id)).collect())
            }
            "clear" => Command::Clear,
            "queue" | "q" => Command::Queue,
            "status" | "st" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn single<T: FromStr>(
    args: &[&str],
    command: &'static str,
    expected: &'static str,
) -> Result<T, ParseError> {
    match args {
        [value] => value
            .parse()
            .map_err(|_| ParseError::BadArgument { command, expected }),
        _ => Err(ParseError::BadArgument { command, expected }),
    }
}

fn optional<T: FromStr>(
    args: &[&str],
    command: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ParseError> {
    match args {
        [] => Ok(None),
        _ => single(args, command, expected).map(Some),
    }
}

pub const HELP: &str = "\
play | pause | toggle        start, pause or flip playback
next | prev                  skip forward or back
seek <+/-secs> | goto <secs> relative or absolute seek
rw | ff                      jump back or forward by the seek step
repeat [off|track|queue]     set repeat mode (no argument: toggle repeat-one)
shuffle [on|off]             set shuffle (no argument: toggle)
jump <n>                     play queue entry n
add <id>...                  append tracks to the queue
clear                        empty the queue
queue | status               show the queue or the session
quit                         stop and exit";

/// What the caller should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this and keep reading
    Message(String),
    /// Exit the loop
    Quit,
}

/// Run one command against the transport
pub async fn execute(
    handle: &TransportHandle,
    command: Command,
) -> cadence_playback::Result<Reply> {
    let outcome = match command {
        Command::Play => handle.play().await?,
        Command::Pause => handle.pause().await?,
        Command::Toggle => handle.toggle_playback().await?,
        Command::Next => handle.skip_next().await?,
        Command::Previous => handle.skip_previous().await?,
        Command::Seek(seconds) => handle.seek(seconds.saturating_mul(1_000)).await?,
        Command::Goto(seconds) => handle.seek_absolute(seconds.saturating_mul(1_000)).await?,
        Command::Rewind => handle.rewind().await?,
        Command::FastForward => handle.fast_forward().await?,
        Command::Repeat(Some(mode)) => handle.set_repeat_mode(mode).await?,
        Command::Repeat(None) => handle.toggle_repeat_one().await?,
        Command::Shuffle(Some(enabled)) => handle.set_shuffle(enabled).await?,
        Command::Shuffle(None) => handle.toggle_shuffle().await?,
        Command::Jump(position) => {
            let index = position.checked_sub(1).ok_or_else(|| {
                PlaybackError::InvalidArgument("queue positions start at 1".to_string())
            })?;
            handle.jump_to(index).await?
        }
        Command::Add(ids) => handle.append(ids).await?,
        Command::Clear => handle.clear().await?,
        Command::Queue => return Ok(Reply::Message(render_queue(&handle.snapshot()))),
        Command::Status => return Ok(Reply::Message(render_status(&handle.snapshot()))),
        Command::Help => return Ok(Reply::Message(HELP.to_string())),
        Command::Quit => return Ok(Reply::Quit),
    };

    Ok(Reply::Message(describe(outcome)))
}

fn describe(outcome: Outcome) -> String {
    match outcome {
        Outcome::Issued(sequence) => format!("ok ({sequence})"),
        Outcome::Updated => "ok".to_string(),
        Outcome::Ignored => "nothing to do".to_string(),
        Outcome::EndOfQueue => "end of queue".to_string(),
        Outcome::StartOfQueue => "already at the first track".to_string(),
    }
}

/// Format milliseconds as m:ss
pub fn format_time(ms: u64) -> String {
    let seconds = ms / 1_000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn render_status(snapshot: &TransportSnapshot) -> String {
    let session = &snapshot.session;
    let mut out = format!("{:?}", session.state);

    if let Some(track_id) = &session.active_track_id {
        let _ = write!(out, " {track_id}");
    }
    let duration = session
        .duration_ms
        .map_or_else(|| "?".to_string(), format_time);
    let _ = write!(out, " [{} / {}]", format_time(session.position_ms), duration);
    let _ = write!(
        out,
        " repeat={} shuffle={}",
        snapshot.queue.repeat_mode,
        if snapshot.queue.shuffled { "on" } else { "off" }
    );
    if let Some(error) = &session.last_error {
        let _ = write!(out, " error: {error}");
    }
    out
}

pub fn render_queue(snapshot: &TransportSnapshot) -> String {
    if snapshot.queue.is_empty() {
        return "queue is empty".to_string();
    }

    let mut out = String::new();
    for (index, entry) in snapshot.queue.entries.iter().enumerate() {
        let marker = if snapshot.queue.cursor == Some(index) { ">" } else { " " };
        let _ = writeln!(out, "{marker} {:>3}. {}", index + 1, entry.track_id);
    }
    out.trim_end().to_string()
}
