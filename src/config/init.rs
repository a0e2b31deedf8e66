use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, save_config, Config, LimitsConfig};
use crate::config::{
    DEFAULT_DEADLINE, DEFAULT_MAX_DISPLAY, DEFAULT_MAX_SCHEDULES, DEFAULT_MAX_SIZE,
    DEFAULT_MIN_SIZE,
};
use crate::schedule::SizeBounds;
use crate::scoring::factors::{parse_minutes, TimeWindow};
use crate::scoring::{
    CombineMode, CriterionWeights, GapConfig, ScoringConfig, StartConfig, DEFAULT_END_RAMP,
    DEFAULT_GAP_PER_TRANSITION, DEFAULT_GAP_TOLERANCE, DEFAULT_START_RAMP_DOWN,
    DEFAULT_START_RAMP_UP,
};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    Ok(or_default(input, default))
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    Ok(parse_yes_no(&input, default_yes))
}

/// Keep prompting until `check` accepts the answer.
fn prompt_valid<T>(
    message: &str,
    default: &str,
    check: impl Fn(&str) -> Result<T, String>,
) -> Result<String> {
    loop {
        let input = prompt_with_default(message, default)?;
        match check(&input) {
            Ok(_) => return Ok(input),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

fn or_default(input: String, default: &str) -> String {
    if input.is_empty() {
        default.to_string()
    } else {
        input
    }
}

fn parse_yes_no(input: &str, default_yes: bool) -> bool {
    let input = input.to_lowercase();
    if input.is_empty() {
        default_yes
    } else {
        input == "y" || input == "yes"
    }
}

fn check_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if (SizeBounds::HARD_MIN..=SizeBounds::HARD_MAX).contains(&n) => Ok(n),
        Ok(_) => Err(format!(
            "must be between {} and {}",
            SizeBounds::HARD_MIN,
            SizeBounds::HARD_MAX
        )),
        Err(_) => Err("must be a whole number".to_string()),
    }
}

fn check_count(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map_err(|_| "must be a whole number (0 turns the cap off)".to_string())
}

fn check_window(s: &str) -> Result<TimeWindow, String> {
    TimeWindow::parse(s).map_err(|e| e.to_string())
}

fn check_minutes(s: &str) -> Result<u32, String> {
    match parse_minutes(s) {
        Ok(minutes) if minutes > 24 * 60 => Err("must be at most 24h".to_string()),
        Ok(minutes) => Ok(minutes),
        Err(e) => Err(e.to_string()),
    }
}

fn check_duration(s: &str) -> Result<std::time::Duration, String> {
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

fn check_combine(s: &str) -> Result<CombineMode, String> {
    match s.to_lowercase().as_str() {
        "mean" => Ok(CombineMode::Mean),
        "weighted" => Ok(CombineMode::Weighted),
        _ => Err("expected 'mean' or 'weighted'".to_string()),
    }
}

fn check_weight(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err("must be a non-negative number".to_string()),
    }
}

/// Parse an answer that already passed its `check_*` helper.
fn accepted<T>(input: &str, check: impl Fn(&str) -> Result<T, String>) -> Result<T> {
    check(input).map_err(|e| anyhow::anyhow!(e))
}

fn prompt_scoring() -> Result<ScoringConfig> {
    println!();
    typewriter("Each schedule gets four sub-scores between 0 and 1.");
    typewriter("They rate GPA, start time, end time and gaps.");
    typewriter("The ranking score is their mean, or a weighted mean if you prefer.");
    let combine = prompt_valid("Combine mode (mean/weighted)", "mean", check_combine)?;
    let combine = accepted(&combine, check_combine)?;

    let weights = if combine == CombineMode::Weighted {
        let defaults = CriterionWeights::default();
        let ask = |name: &str, default: f64| -> Result<f64> {
            let input = prompt_valid(
                &format!("  Weight for {}", name),
                &default.to_string(),
                check_weight,
            )?;
            accepted(&input, check_weight)
        };
        Some(CriterionWeights {
            gpa: ask("GPA", defaults.gpa)?,
            start: ask("start time", defaults.start)?,
            end: ask("end time", defaults.end)?,
            gap: ask("gaps", defaults.gap)?,
        })
    } else {
        None
    };

    println!();
    typewriter("The start score rises across a morning window and stays at 1.");
    typewriter("It then falls back to 0 across a midday window.");
    typewriter("Times use HH:MM-HH:MM (e.g., '08:00-10:00').");
    let ramp_up = prompt_valid("Start ramp up", DEFAULT_START_RAMP_UP, check_window)?;
    let ramp_down = loop {
        let input = prompt_valid("Start ramp down", DEFAULT_START_RAMP_DOWN, check_window)?;
        let up = accepted(&ramp_up, check_window)?;
        let down = accepted(&input, check_window)?;
        if up.to <= down.from {
            break input;
        }
        println!("  Invalid: ramp down must start after ramp up ends. Try again.");
    };

    println!();
    typewriter("The end score is 1 when your last class ends before this window and 0 after it.");
    let end = prompt_valid("End ramp", DEFAULT_END_RAMP, check_window)?;

    println!();
    typewriter("Some idle time between classes is free.");
    typewriter("Beyond that the gap score falls to 0 over the tolerance.");
    typewriter("Durations look like '10m', '1h 30m'.");
    let per_transition = prompt_valid(
        "Free idle time per class change",
        DEFAULT_GAP_PER_TRANSITION,
        check_minutes,
    )?;
    let tolerance = loop {
        let input = prompt_valid("Gap tolerance", DEFAULT_GAP_TOLERANCE, check_minutes)?;
        if accepted(&input, check_minutes)? > 0 {
            break input;
        }
        println!("  Invalid: tolerance must be at least one minute. Try again.");
    };

    Ok(ScoringConfig {
        combine: Some(combine),
        weights,
        start: Some(StartConfig {
            ramp_up: Some(ramp_up),
            ramp_down: Some(ramp_down),
        }),
        end: Some(end),
        gap: Some(GapConfig {
            per_transition: Some(per_transition),
            tolerance: Some(tolerance),
        }),
    })
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Schedule Optimizer Configuration Wizard");
    println!("=======================================");
    println!();

    // 1. Course data
    typewriter("Course tables are JSON files named after their term, e.g. 202540.json.");
    let data_dir = prompt_with_default(
        "Directory holding term tables",
        &super::default_data_dir().display().to_string(),
    )?;
    let term = prompt("Default term (leave empty to always pass --term): ")?;

    // 2. Schedule sizes
    println!();
    typewriter("How many courses should a schedule hold?");
    let min_size = prompt_valid(
        "Minimum courses per schedule",
        &DEFAULT_MIN_SIZE.to_string(),
        check_size,
    )?;
    let min_size = accepted(&min_size, check_size)?;
    let max_size = loop {
        let input = prompt_valid(
            "Maximum courses per schedule",
            &DEFAULT_MAX_SIZE.to_string(),
            check_size,
        )?;
        let max = accepted(&input, check_size)?;
        if max >= min_size {
            break max;
        }
        println!("  Invalid: must be at least the minimum ({}). Try again.", min_size);
    };

    // 3. Limits
    println!();
    typewriter("Large course lists produce a lot of combinations; these caps keep a run short.");
    let max_schedules = prompt_valid(
        "Stop after this many schedules",
        &DEFAULT_MAX_SCHEDULES.to_string(),
        check_count,
    )?;
    let max_display = prompt_valid(
        "Return at most this many ranked schedules",
        &DEFAULT_MAX_DISPLAY.to_string(),
        check_count,
    )?;
    let deadline = prompt_valid("Search time limit", DEFAULT_DEADLINE, check_duration)?;

    // 4. Scoring
    println!();
    let configure_scoring = prompt_yes_no("Configure scoring? (n accepts defaults)", false)?;
    let scoring = if configure_scoring {
        prompt_scoring()?
    } else {
        ScoringConfig::default()
    };

    // 5. Config path
    let default_config_path = match default_path {
        Some(path) => path,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 6. Write config
    let config = Config {
        data_dir: Some(PathBuf::from(data_dir)),
        term: (!term.is_empty()).then_some(term),
        min_size,
        max_size,
        limits: Some(LimitsConfig {
            max_schedules: Some(accepted(&max_schedules, check_count)?),
            max_display: Some(accepted(&max_display, check_count)?),
            deadline: Some(deadline),
        }),
        scoring: Some(scoring),
        ..Config::default()
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `schedule-optimizer generate \"CSCI 301\" \"MATH 204\"` to get started.");

    Ok(())
}
