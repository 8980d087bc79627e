//! `openmaze` command line: run random-policy episodes and inspect the maze.
//!
//! Examples:
//!   openmaze run --episodes 20 --seed 7
//!   openmaze run --render human --delay-ms 80
//!   openmaze run --config cycle.json --uniform
//!   openmaze layout
//!   openmaze mask 8 1
//!   openmaze config > maze.json

use std::io;
use std::process;
use std::thread;
use std::time::Duration;

use openmaze::prng::Prng;
use openmaze::render::{RenderMode, Rendered, TextRenderer};
use openmaze::runner::{rollout, ActionSampling, RolloutOptions, DEFAULT_MAX_EPISODE_STEPS};
use openmaze::stats::EpisodeStats;
use openmaze::{Direction, EnvConfig, MazeError, Position};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderChoice {
    None,
    Text,
    Human,
}

#[derive(Debug)]
struct RunArgs {
    config: Option<String>,
    episodes: u32,
    seed: u64,
    max_steps: u64,
    render: RenderChoice,
    delay_ms: u64,
    sampling: ActionSampling,
    json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: None,
            episodes: 10,
            seed: 1,
            max_steps: DEFAULT_MAX_EPISODE_STEPS,
            render: RenderChoice::None,
            delay_ms: 50,
            sampling: ActionSampling::Masked,
            json: false,
        }
    }
}

fn print_help() {
    eprintln!("openmaze: grid-world maze environment");
    eprintln!("Usage: openmaze <command> [options]\n");
    eprintln!("Commands:");
    eprintln!("  run      Run random-policy episodes and report statistics");
    eprintln!("           --config FILE  --episodes N  --seed S  --max-steps N");
    eprintln!("           --render none|text|human  --delay-ms MS  --uniform  --json");
    eprintln!("  layout   Print the maze with the agent at its start cell [--config FILE]");
    eprintln!("  mask R C Print legal moves from cell (R, C) [--config FILE]");
    eprintln!("  config   Print the default configuration as JSON");
    eprintln!("  help     Show this message");
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}\n");
    print_help();
    process::exit(2);
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.map(|v| v.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => usage_error(&format!("{flag} expects a number")),
    }
}

fn take_config(args: &mut Vec<String>) -> Option<String> {
    let i = args.iter().position(|a| a == "--config")?;
    if i + 1 >= args.len() {
        usage_error("--config expects a file path");
    }
    let path = args.remove(i + 1);
    args.remove(i);
    Some(path)
}

fn load_config(path: Option<&str>) -> Result<EnvConfig, MazeError> {
    match path {
        Some(p) => {
            info!(path = p, "loading config");
            EnvConfig::load(p)
        }
        None => Ok(EnvConfig::default()),
    }
}

fn parse_run_args(mut args: Vec<String>) -> RunArgs {
    let mut out = RunArgs {
        config: take_config(&mut args),
        ..RunArgs::default()
    };
    let mut i = 0;
    while i < args.len() {
        let next = args.get(i + 1);
        match args[i].as_str() {
            "--episodes" => {
                out.episodes = parse_num("--episodes", next);
                i += 1;
            }
            "--seed" => {
                out.seed = parse_num("--seed", next);
                i += 1;
            }
            "--max-steps" => {
                out.max_steps = parse_num("--max-steps", next);
                i += 1;
            }
            "--delay-ms" => {
                out.delay_ms = parse_num("--delay-ms", next);
                i += 1;
            }
            "--render" => {
                out.render = match next.map(String::as_str) {
                    Some("none") => RenderChoice::None,
                    Some("text") => RenderChoice::Text,
                    Some("human") => RenderChoice::Human,
                    _ => usage_error("--render expects none, text or human"),
                };
                i += 1;
            }
            "--uniform" => out.sampling = ActionSampling::Uniform,
            "--json" => out.json = true,
            other => usage_error(&format!("unknown option: {other}")),
        }
        i += 1;
    }
    out
}

fn cmd_run(args: RunArgs) -> Result<(), MazeError> {
    let cfg = load_config(args.config.as_deref())?;
    let mut env = cfg.build()?;
    if args.render == RenderChoice::Human {
        env.set_renderer(Some(Box::new(
            TextRenderer::new(io::stdout()).clear_between_frames(true),
        )));
    }

    let mut rng = Prng::new(args.seed);
    let opts = RolloutOptions {
        max_steps: args.max_steps,
        sampling: args.sampling,
    };
    let delay = Duration::from_millis(args.delay_ms);
    let mut stats = EpisodeStats::new();

    for episode in 0..args.episodes {
        let outcome = rollout(&mut env, &mut rng, &opts, |env, _| {
            match args.render {
                RenderChoice::None => {}
                RenderChoice::Text => {
                    if let Rendered::Text(frame) = env.render(RenderMode::Text)? {
                        println!("{frame}\n");
                    }
                }
                RenderChoice::Human => {
                    env.render(RenderMode::Human)?;
                    thread::sleep(delay);
                }
            }
            Ok(())
        })?;
        info!(
            episode,
            end = ?outcome.end,
            steps = outcome.steps,
            reward = outcome.total_reward,
            "episode complete"
        );
        stats.record(&outcome);
    }

    if args.json {
        let text = serde_json::to_string_pretty(&stats)?;
        println!("{text}");
    } else {
        println!(
            "episodes={} goal={} cycle_limit={} truncated={} success={:.1}% last100={:.1}% mean_return={:.3} mean_steps={:.1}",
            stats.episodes,
            stats.reached_goal,
            stats.cycle_limited,
            stats.truncated,
            stats.success_rate() * 100.0,
            stats.last_100_rate() * 100.0,
            stats.mean_return(),
            stats.mean_steps(),
        );
    }
    Ok(())
}

fn cmd_layout(mut args: Vec<String>) -> Result<(), MazeError> {
    let config = take_config(&mut args);
    if let Some(extra) = args.first() {
        usage_error(&format!("unexpected argument: {extra}"));
    }
    let mut env = load_config(config.as_deref())?.build()?;
    if let Rendered::Text(frame) = env.render(RenderMode::Text)? {
        println!("{frame}");
    }
    let (low, high) = env.reward_range();
    println!(
        "start={} initial_distance={} policy={} reward_range=({low}, {high})",
        env.start_position(),
        env.initial_distance(),
        env.policy().name(),
    );
    Ok(())
}

fn cmd_mask(mut args: Vec<String>) -> Result<(), MazeError> {
    let config = take_config(&mut args);
    if args.len() != 2 {
        usage_error("mask expects ROW and COL");
    }
    let row: usize = parse_num("ROW", args.first());
    let col: usize = parse_num("COL", args.get(1));
    let env = load_config(config.as_deref())?.build()?;
    let mask = env.legal_moves(Position::new(row, col));
    let names: Vec<&str> = mask.legal_directions().map(Direction::as_str).collect();
    println!("{:?} [{}]", mask.to_vec(), names.join(" "));
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_help();
        process::exit(2);
    }
    let cmd = args.remove(0);

    let result = match cmd.as_str() {
        "run" => cmd_run(parse_run_args(args)),
        "layout" => cmd_layout(args),
        "mask" => cmd_mask(args),
        "config" => EnvConfig::default().to_json_pretty().map(|s| println!("{s}")),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => usage_error(&format!("Unknown command: {other}")),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}
