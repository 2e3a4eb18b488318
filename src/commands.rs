use std::{
    fmt::Display,
    io::{self, Stderr, Stdout, Write},
    sync::Arc,
};

use anyhow::{bail, Result};
use chrono::Utc;
use log::warn;
use serde::Serialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    sync::broadcast::error::RecvError,
};

use crate::{
    cli::Command,
    db::RunStore,
    error::{SubmitError, ValidationError},
    feed::load_feed,
    journal::MoodCapture,
    models::{Mood, Profile},
    pod::{load_pod_progress, PodProgress},
    settings::PodSettings,
    stats::{format_total_duration, load_profile_overview},
    tracker::{RunController, RunEvent, RunSummary, TrackerConfig},
    AppState,
};

/// Terminal output. In `--json` mode stdout carries only JSON lines, so
/// prompts and human-readable messages go to stderr instead.
pub(crate) struct Console<O, E> {
    json: bool,
    out: O,
    err: E,
}

impl Console<Stdout, Stderr> {
    pub(crate) fn stdio(json: bool) -> Self {
        Self::new(json, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub(crate) fn new(json: bool, out: O, err: E) -> Self {
        Self { json, out, err }
    }

    fn human(&mut self) -> &mut dyn Write {
        if self.json {
            &mut self.err as &mut dyn Write
        } else {
            &mut self.out as &mut dyn Write
        }
    }

    /// One JSON document per line on stdout.
    fn emit<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.human(), "{text}")?;
        Ok(())
    }

    fn ask(&mut self, question: &str) -> Result<()> {
        let human = self.human();
        write!(human, "{question}")?;
        human.flush()?;
        Ok(())
    }

    /// Redraws the live line in place. Text mode only.
    fn live(&mut self, text: impl Display) -> Result<()> {
        write!(self.out, "\r{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

pub async fn dispatch(state: &AppState, command: Command, json: bool) -> Result<()> {
    let mut console = Console::stdio(json);
    match command {
        Command::Run {
            location,
            calories_per_km,
        } => {
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            track_run(
                state,
                location,
                calories_per_km,
                &mut console,
                &mut input,
            )
            .await
        }
        Command::Stats => show_stats(state, &mut console).await,
        Command::Feed { limit } => show_feed(state, limit, &mut console).await,
        Command::Profile {
            first_name,
            last_name,
            username,
            avatar_url,
        } => {
            let changes = ProfileChanges {
                first_name,
                last_name,
                username,
                avatar_url,
            };
            update_profile(state, changes, &mut console).await
        }
        Command::Pod {
            name,
            members,
            goal_km,
        } => {
            if let (Some(name), Some(weekly_goal_km)) = (name, goal_km) {
                set_pod(state, name, members, weekly_goal_km)?;
            }
            show_pod(state, &mut console).await
        }
    }
}

async fn track_run<R, O, E>(
    state: &AppState,
    location: Option<String>,
    calories_per_km: Option<f64>,
    console: &mut Console<O, E>,
    input: &mut Lines<R>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let mut tracker_settings = state.settings.tracker();
    if let Some(rate) = calories_per_km {
        tracker_settings.calories_per_km = rate;
    }
    let location = location.unwrap_or_else(|| tracker_settings.default_location.clone());

    let controller = RunController::new(TrackerConfig::from_settings(&tracker_settings));
    let mut events = controller.subscribe();

    console.say(format!(
        "Running at {location}. [p] pause/resume  [s] stop  [q] discard"
    ))?;
    controller.start().await;

    let summary = loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => render_event(&event, console)?,
                Err(RecvError::Lagged(skipped)) => warn!("Display fell behind by {skipped} updates"),
                Err(RecvError::Closed) => break controller.stop().await,
            },
            line = input.next_line() => match line?.as_deref().map(str::trim) {
                Some("p") => {
                    controller.toggle_pause().await;
                }
                Some("s") | None => break controller.stop().await,
                Some("q") => {
                    controller.discard().await;
                    console.say("\nRun discarded.")?;
                    return Ok(());
                }
                Some(_) => console.say("\n[p] pause/resume  [s] stop  [q] discard")?,
            },
        }
    };

    if console.json {
        console.emit(&summary)?;
    } else {
        print_summary(&summary, &location, console)?;
    }

    let store: Arc<dyn RunStore> = Arc::new(state.db.clone());
    let mut capture = MoodCapture::new(summary, location, state.user.clone(), store);
    capture_mood(&mut capture, input, console).await
}

fn render_event<O: Write, E: Write>(event: &RunEvent, console: &mut Console<O, E>) -> Result<()> {
    if console.json {
        return console.emit(event);
    }

    match event {
        RunEvent::Tick(snapshot) => console.live(format!(
            "{:>8}  {} km  pace {}/km  {} kcal  {} steps   ",
            snapshot.duration,
            snapshot.distance,
            snapshot.metrics.pace,
            snapshot.metrics.calories,
            snapshot.metrics.steps
        )),
        RunEvent::StateChanged(snapshot) => {
            console.say(format!("\n[{:?}]", snapshot.session.status))
        }
        RunEvent::Completed(_) => Ok(()),
    }
}

fn print_summary<O: Write, E: Write>(
    summary: &RunSummary,
    location: &str,
    console: &mut Console<O, E>,
) -> Result<()> {
    console.say("\nRun complete!")?;
    console.say(format!("  Time      {}", summary.duration_display()))?;
    console.say(format!("  Distance  {} km", summary.distance_display()))?;
    console.say(format!("  Pace      {}/km", summary.metrics.pace))?;
    console.say(format!("  Calories  {}", summary.metrics.calories))?;
    console.say(format!("  Steps     {}", summary.metrics.steps))?;
    console.say(format!("  Location  {location}"))
}

/// Empty answer means "no mood chosen"; a number picks from the listed moods.
fn parse_mood_answer(answer: &str) -> Result<Option<Mood>, ValidationError> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| Mood::ALL.get(i).copied())
            .map(Some)
            .ok_or_else(|| ValidationError::UnknownMood(answer.to_string()));
    }
    answer.parse::<Mood>().map(Some)
}

async fn prompt<R, O, E>(
    input: &mut Lines<R>,
    console: &mut Console<O, E>,
    question: &str,
) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    console.ask(question)?;
    match input.next_line().await? {
        Some(line) => Ok(line),
        None => bail!("input closed before the run was saved"),
    }
}

async fn capture_mood<R, O, E>(
    capture: &mut MoodCapture,
    input: &mut Lines<R>,
    console: &mut Console<O, E>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let choices = Mood::ALL
        .iter()
        .enumerate()
        .map(|(i, mood)| format!("{}) {}", i + 1, mood.label()))
        .collect::<Vec<_>>()
        .join("  ");

    loop {
        let question = format!("How are you feeling? {choices}\n> ");
        let answer = prompt(input, console, &question).await?;
        let mood = match parse_mood_answer(&answer) {
            Ok(mood) => mood,
            Err(err) => {
                console.say(err)?;
                continue;
            }
        };

        let note = if mood.is_some() {
            Some(prompt(input, console, "Share your experience (optional)\n> ").await?)
        } else {
            None
        };

        match capture.submit(mood, note).await {
            Ok(record) => {
                if console.json {
                    console.emit(&record)?;
                } else {
                    console.say("Run saved! Great job on completing your run.")?;
                }
                return Ok(());
            }
            Err(SubmitError::Validation(err)) => {
                console.say(format!("{err}. How are you feeling after this run?"))?;
            }
            Err(err @ SubmitError::Remote(_)) => return Err(err.into()),
        }
    }
}

async fn show_stats<O: Write, E: Write>(state: &AppState, console: &mut Console<O, E>) -> Result<()> {
    let overview = load_profile_overview(&state.db, &state.user, Utc::now().date_naive()).await?;
    if console.json {
        return console.emit(&overview);
    }

    let stats = &overview.stats;
    console.say(&overview.display_name)?;
    if let Some(username) = overview
        .profile
        .as_ref()
        .and_then(|profile| profile.username.as_deref())
    {
        console.say(format!("@{username}"))?;
    }
    console.say(format!(
        "{} runs  {} km  {}",
        stats.total_runs,
        stats.total_distance_km,
        format_total_duration(stats.total_duration_seconds)
    ))?;
    console.say(format!("{} day streak", stats.streak_days))?;
    if let Some(mood) = stats.last_mood {
        console.say(format!("Last mood: {}", mood.label()))?;
    }
    Ok(())
}

async fn show_feed<O: Write, E: Write>(
    state: &AppState,
    limit: usize,
    console: &mut Console<O, E>,
) -> Result<()> {
    let items = load_feed(&state.db, limit, Utc::now()).await?;
    if console.json {
        return console.emit(&items);
    }
    if items.is_empty() {
        return console.say("No runs yet. Start one with `pacepod run`.");
    }

    for item in items {
        console.say(format!(
            "[{}] {}  {}  ({})",
            item.initials, item.display_name, item.mood, item.posted
        ))?;
        console.say(format!(
            "     {} km in {} at {}",
            item.distance_km, item.duration, item.location
        ))?;
        if let Some(note) = item.note {
            console.say(format!("     {note}"))?;
        }
    }
    Ok(())
}

/// Fields given on the command line; `None` leaves the stored value alone and
/// a blank value clears it.
#[derive(Debug, Default)]
struct ProfileChanges {
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    avatar_url: Option<String>,
}

fn apply_change(field: &mut Option<String>, change: Option<String>) {
    if let Some(value) = change {
        let value = value.trim();
        *field = (!value.is_empty()).then(|| value.to_string());
    }
}

async fn update_profile<O: Write, E: Write>(
    state: &AppState,
    changes: ProfileChanges,
    console: &mut Console<O, E>,
) -> Result<()> {
    let user_id = state.user.user_id();
    let mut profile = state
        .db
        .get_profile(user_id)
        .await?
        .unwrap_or_else(|| Profile {
            id: user_id.to_string(),
            first_name: None,
            last_name: None,
            username: None,
            avatar_url: None,
            updated_at: Utc::now(),
        });

    apply_change(&mut profile.first_name, changes.first_name);
    apply_change(&mut profile.last_name, changes.last_name);
    apply_change(&mut profile.username, changes.username);
    apply_change(&mut profile.avatar_url, changes.avatar_url);
    profile.updated_at = Utc::now();

    state.db.upsert_profile(&profile).await?;

    if console.json {
        console.emit(&profile)
    } else {
        console.say(format!("Others will see you as {}", profile.display_name()))
    }
}

fn set_pod(
    state: &AppState,
    name: String,
    mut members: Vec<String>,
    weekly_goal_km: f64,
) -> Result<()> {
    if weekly_goal_km <= 0.0 {
        bail!("weekly goal must be greater than 0 km");
    }

    let me = state.user.user_id().to_string();
    members.retain(|member| !member.trim().is_empty());
    if !members.contains(&me) {
        members.insert(0, me);
    }

    state.settings.update_pod(Some(PodSettings {
        name,
        members,
        weekly_goal_km,
    }))
}

async fn show_pod<O: Write, E: Write>(state: &AppState, console: &mut Console<O, E>) -> Result<()> {
    let Some(pod) = state.settings.pod() else {
        if console.json {
            console.emit(&None::<PodProgress>)?;
        }
        return console.say(format!(
            "No pod configured. Set one up with `pacepod pod --name <name> --goal-km <km>` or edit {}",
            state.settings.path().display()
        ));
    };

    let progress = load_pod_progress(&state.db, &pod, Utc::now()).await?;
    if console.json {
        return console.emit(&progress);
    }

    console.say(format!(
        "Your pod: {} ({} members)",
        progress.name, progress.members
    ))?;
    console.say(format!(
        "{}/{} km this week ({}%)",
        progress.current_km, progress.weekly_goal_km, progress.percent
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::UserContext, db::Database, settings::SettingsStore};

    struct Fixture {
        _dir: tempfile::TempDir,
        state: AppState,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            db: Database::new(dir.path().join("pacepod.sqlite3")).unwrap(),
            settings: SettingsStore::new(dir.path().join("settings.json")).unwrap(),
            user: UserContext::new("u1"),
        };
        Fixture { _dir: dir, state }
    }

    fn script(text: &'static str) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(text.as_bytes()).lines()
    }

    fn json_lines(out: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|err| panic!("stdout line {line:?} is not JSON: {err}"))
            })
            .collect()
    }

    #[test]
    fn mood_answers_accept_numbers_and_names() {
        assert_eq!(parse_mood_answer("1"), Ok(Some(Mood::Energized)));
        assert_eq!(parse_mood_answer(" 5 "), Ok(Some(Mood::Grateful)));
        assert_eq!(parse_mood_answer("happy"), Ok(Some(Mood::Happy)));
        assert_eq!(parse_mood_answer(""), Ok(None));
    }

    #[test]
    fn out_of_range_answers_are_rejected() {
        assert_eq!(
            parse_mood_answer("0"),
            Err(ValidationError::UnknownMood("0".into()))
        );
        assert_eq!(
            parse_mood_answer("6"),
            Err(ValidationError::UnknownMood("6".into()))
        );
        assert!(parse_mood_answer("meh").is_err());
    }

    #[tokio::test]
    async fn json_run_keeps_stdout_machine_readable() {
        let fx = fixture();
        let mut console = Console::new(true, Vec::new(), Vec::new());
        // Stop at once, then answer an invalid mood, an empty one, and a valid one.
        let mut input = script("s\n9\n\n1\n  nice  \n");

        track_run(&fx.state, None, None, &mut console, &mut input)
            .await
            .unwrap();

        let lines = json_lines(&console.out);
        let record = lines.last().unwrap();
        assert_eq!(record["userId"], "u1");
        assert_eq!(record["mood"], "energized");
        assert_eq!(record["note"], "nice");
        assert!(lines.iter().any(|line| line.get("sessionId").is_some()));

        let prompts = String::from_utf8(console.err).unwrap();
        assert!(prompts.contains("How are you feeling?"));
        assert!(prompts.contains("unknown mood '9'"));
        assert!(prompts.contains("select a mood before saving your run"));

        assert_eq!(fx.state.db.list_runs_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_run_prompts_on_stdout() {
        let fx = fixture();
        let mut console = Console::new(false, Vec::new(), Vec::new());
        let mut input = script("s\ngrateful\n\n");

        track_run(&fx.state, Some("Riverside Trail".into()), None, &mut console, &mut input)
            .await
            .unwrap();

        let out = String::from_utf8(console.out).unwrap();
        assert!(out.contains("Location  Riverside Trail"));
        assert!(out.contains("Run saved!"));
        assert!(console.err.is_empty());

        let runs = fx.state.db.list_runs_for_user("u1").await.unwrap();
        assert_eq!(runs[0].mood, Mood::Grateful);
        assert_eq!(runs[0].note, None);
    }

    #[tokio::test]
    async fn discarded_run_saves_nothing() {
        let fx = fixture();
        let mut console = Console::new(true, Vec::new(), Vec::new());
        let mut input = script("q\n");

        track_run(&fx.state, None, None, &mut console, &mut input)
            .await
            .unwrap();

        json_lines(&console.out);
        assert!(fx.state.db.list_runs_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_pod_is_null_in_json_mode() {
        let fx = fixture();
        let mut console = Console::new(true, Vec::new(), Vec::new());

        show_pod(&fx.state, &mut console).await.unwrap();

        assert_eq!(json_lines(&console.out), vec![serde_json::Value::Null]);
        assert!(String::from_utf8(console.err)
            .unwrap()
            .contains("No pod configured"));
    }

    #[tokio::test]
    async fn configured_pod_includes_current_runner() {
        let fx = fixture();
        set_pod(&fx.state, "Morning Warriors".into(), vec!["sam".into()], 20.0).unwrap();

        let pod = fx.state.settings.pod().unwrap();
        assert_eq!(pod.members, ["u1", "sam"]);
        assert!(set_pod(&fx.state, "Nope".into(), Vec::new(), 0.0).is_err());

        let mut console = Console::new(true, Vec::new(), Vec::new());
        show_pod(&fx.state, &mut console).await.unwrap();
        let lines = json_lines(&console.out);
        assert_eq!(lines[0]["name"], "Morning Warriors");
        assert_eq!(lines[0]["members"], 2);
    }

    #[tokio::test]
    async fn profile_update_names_runs_in_feed() {
        let fx = fixture();
        let mut console = Console::new(false, Vec::new(), Vec::new());
        update_profile(
            &fx.state,
            ProfileChanges {
                first_name: Some("Alex".into()),
                last_name: Some("Chen".into()),
                ..ProfileChanges::default()
            },
            &mut console,
        )
        .await
        .unwrap();

        // A later update keeps untouched fields and clears blank ones.
        update_profile(
            &fx.state,
            ProfileChanges {
                last_name: Some(" ".into()),
                username: Some("achen".into()),
                ..ProfileChanges::default()
            },
            &mut console,
        )
        .await
        .unwrap();

        let profile = fx.state.db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Alex"));
        assert_eq!(profile.last_name, None);
        assert_eq!(profile.username.as_deref(), Some("achen"));

        let mut input = script("s\n2\n\n");
        track_run(&fx.state, None, None, &mut console, &mut input)
            .await
            .unwrap();

        let feed = load_feed(&fx.state.db, 10, Utc::now()).await.unwrap();
        assert_eq!(feed[0].display_name, "Alex");
    }
}
