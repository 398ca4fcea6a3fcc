/// Play: terminal player for exported story sheets.
///
/// Usage: play --story <story.csv> --metadata <metadata.csv> [--config <player.ron>] [--save <dir>]
///
/// Commands at the prompt:
///   <n>       pick choice n (Enter alone continues on auto-advance nodes)
///   s         save progress
///   d         delete the saved game
///   r         restart from the start node
///   q         quit

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use storysheet::core::filter::ChoicePrompt;
use storysheet::core::persistence::{save_key, SaveStore};
use storysheet::core::player::{ChoiceOutcome, StoryPlayer};
use storysheet::core::stage::{MusicCommand, StageUpdate};
use storysheet::error::SaveError;
use storysheet::schema::save::SaveData;

/// Keeps one JSON file per story in a directory.
struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    fn path_for(&self, sheet_id: &str) -> PathBuf {
        let name: String = save_key(sheet_id)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SaveStore for FileSaveStore {
    fn save(&mut self, data: &SaveData) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir).map_err(|e| SaveError::Store(e.to_string()))?;
        fs::write(self.path_for(&data.sheet_id), data.to_json()?)
            .map_err(|e| SaveError::Store(e.to_string()))
    }

    fn load(&self, sheet_id: &str) -> Result<Option<SaveData>, SaveError> {
        let path = self.path_for(sheet_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|e| SaveError::Store(e.to_string()))?;
        SaveData::from_json(&raw).map(Some)
    }

    fn has_save(&self, sheet_id: &str) -> bool {
        self.path_for(sheet_id).exists()
    }

    fn delete(&mut self, sheet_id: &str) -> Result<(), SaveError> {
        let path = self.path_for(sheet_id);
        if path.exists() {
            fs::remove_file(path).map_err(|e| SaveError::Store(e.to_string()))?;
        }
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut story_path = None;
    let mut metadata_path = None;
    let mut config_path = None;
    let mut save_dir = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                story_path = Some(args[i].clone());
            }
            "--metadata" if i + 1 < args.len() => {
                i += 1;
                metadata_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--save" if i + 1 < args.len() => {
                i += 1;
                save_dir = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(story_path), Some(metadata_path)) = (story_path, metadata_path) else {
        eprintln!("Both --story and --metadata are required.");
        print_usage();
        std::process::exit(1);
    };

    let story = read_or_exit(Path::new(&story_path));
    let metadata = read_or_exit(Path::new(&metadata_path));

    let mut builder = StoryPlayer::builder().with_sheets(&story, &metadata);
    if let Some(ref path) = config_path {
        builder = builder.config_file(Path::new(path));
    }
    if let Some(dir) = save_dir {
        builder = builder.with_save_store(FileSaveStore { dir: dir.into() });
    }
    let mut player = match builder.build() {
        Ok(player) => player,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let meta = player.metadata().clone();
    println!("=== {} ===", meta.title);
    if let Some(author) = meta.author {
        println!("by {}", author);
    }
    if let Some(description) = meta.description {
        println!("{}", description);
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let clock = Instant::now();

    let mut update = None;
    if player.has_save() && ask(&stdin, &mut stdout, "Continue saved game? [y/N] ") {
        match player.continue_saved() {
            Ok(resumed) => update = resumed,
            Err(e) => println!("Could not load save: {}", e),
        }
    }
    let mut update = update.unwrap_or_else(|| player.start());

    loop {
        report(&update);
        let prompt = render(&mut player);

        print!("> ");
        stdout.flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim().to_lowercase();

        let index = match line.as_str() {
            "q" | "quit" => {
                println!("Goodbye.");
                break;
            }
            "s" | "save" => {
                match player.save() {
                    Ok(()) => println!("Saved."),
                    Err(e) => println!("ERROR: {}", e),
                }
                update = StageUpdate::default();
                continue;
            }
            "d" | "delete" => {
                match player.delete_save() {
                    Ok(()) => println!("Save deleted."),
                    Err(e) => println!("ERROR: {}", e),
                }
                update = StageUpdate::default();
                continue;
            }
            "r" | "restart" => {
                update = player.restart();
                continue;
            }
            "" if matches!(prompt, ChoicePrompt::Continue(_)) => 0,
            _ if prompt.is_ending() => {
                println!("The story is over. 'r' to restart, 'd' to delete the save, 'q' to quit.");
                update = StageUpdate::default();
                continue;
            }
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => n - 1,
                _ => {
                    println!("Pick a number, or s / d / r / q.");
                    update = StageUpdate::default();
                    continue;
                }
            },
        };

        update = match player.select(index, clock.elapsed()) {
            ChoiceOutcome::Navigated(update) => update,
            ChoiceOutcome::FadeStarted => run_fade(&mut player, &clock),
            ChoiceOutcome::DanglingTarget => {
                println!("(That path leads nowhere yet.)");
                StageUpdate::default()
            }
            ChoiceOutcome::NoSuchChoice => {
                println!("No such choice.");
                StageUpdate::default()
            }
            ChoiceOutcome::Ignored => StageUpdate::default(),
        };
    }
}

/// Sleep through the fade, ticking at each deadline.
fn run_fade(player: &mut StoryPlayer, clock: &Instant) -> StageUpdate {
    let mut entered = StageUpdate::default();
    println!("  . . .");
    while let Some(deadline) = player.next_deadline() {
        let now = clock.elapsed();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        if let Some(update) = player.tick(clock.elapsed()) {
            entered = update;
        }
    }
    entered
}

fn render(player: &mut StoryPlayer) -> ChoicePrompt {
    let prompt = player.prompt();
    let continue_label = player.config().continue_label.clone();
    let Some(node) = player.current_node() else {
        return prompt;
    };

    println!();
    match node.speaker {
        Some(ref speaker) => println!("{}: {}", speaker, node.display_text()),
        None => println!("{}", node.display_text()),
    }
    println!();

    match &prompt {
        ChoicePrompt::Ending => println!("-- THE END --"),
        ChoicePrompt::Continue(_) => println!("  [Enter] {}", continue_label),
        ChoicePrompt::Choose(choices) => {
            for (n, choice) in choices.iter().enumerate() {
                println!("  {}. {}", n + 1, choice.text);
            }
        }
    }
    prompt
}

fn report(update: &StageUpdate) {
    if update.scene_changed {
        println!("~ scene change ~");
    }
    match &update.music {
        Some(MusicCommand::Play(src)) => println!("[music: {}]", src),
        Some(MusicCommand::Stop) => println!("[music stops]"),
        None => {}
    }
    if let Some(ref sfx) = update.sound_effect {
        println!("[sound: {}]", sfx);
    }
}

fn ask(stdin: &io::Stdin, stdout: &mut io::Stdout, question: &str) -> bool {
    print!("{}", question);
    stdout.flush().ok();
    let mut line = String::new();
    if stdin.lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn read_or_exit(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: play --story <story.csv> --metadata <metadata.csv> [--config <player.ron>] [--save <dir>]");
    eprintln!();
    eprintln!("Plays an exported story sheet in the terminal.");
    eprintln!("Set RUST_LOG=debug to see engine diagnostics.");
}
