use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use kopi_order::db;
use kopi_order::voice::{
    AudioCapture, AudioPlayback, LISTEN_TIMEOUT, LogSynthesizer, MicrophoneRecognizer,
    PHRASE_LIMIT, SpeakerSynthesizer, SpeechRecognizer, SpeechSynthesizer, calculate_energy,
};
use kopi_order::{
    Action, CommandInterpreter, Config, Frame, MenuCatalog, OrderHistoryStore, OrderState,
    PersistedOrder, Session, SqliteOrderStore, Temperature,
};

/// How often the session is redrawn while a worker or notification is live
const TICK: Duration = Duration::from_millis(100);

/// Kopi - voice-driven drink ordering terminal
#[derive(Parser)]
#[command(name = "kopi", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice input and spoken confirmations
    #[arg(long, env = "KOPI_DISABLE_VOICE")]
    disable_voice: bool,

    /// Order history database (overrides config)
    #[arg(long)]
    db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Print the menu
    Menu,
    /// Show recently completed orders
    History {
        /// Number of orders to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show how a spoken phrase would be understood
    Interpret {
        /// Transcript text
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
        /// Record one phrase and transcribe it afterwards
        #[arg(long)]
        transcribe: bool,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Order placed successfully. You ordered: 1 Hot Kopi")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,kopi_order=info",
        1 => "info,kopi_order=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_with_options(cli.disable_voice)?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Menu => {
                print_menu(&config.load_catalog()?);
                Ok(())
            }
            Command::History { limit } => show_history(&config, limit),
            Command::Interpret { text } => interpret(&config, &text),
            Command::TestMic {
                duration,
                transcribe,
            } => test_mic(&config, duration, transcribe).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, text).await,
        };
    }

    run_session(config).await
}

/// Interactive ordering session on the terminal
async fn run_session(config: Config) -> anyhow::Result<()> {
    let pool = db::init(&config.db_path)?;
    let store: Arc<dyn OrderHistoryStore> = Arc::new(SqliteOrderStore::new(pool));

    let mut session = Session::new(
        Arc::new(config.load_catalog()?),
        store,
        build_synthesizer(&config),
        build_recognizer(&config),
    );

    tracing::info!(
        db = %config.db_path.display(),
        items = session.catalog().items().len(),
        voice = session.voice_enabled(),
        "kopi ready"
    );

    print_menu(session.catalog());
    print_help(session.voice_enabled());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK);
    let mut screen = Screen::default();

    loop {
        while session.needs_pass() {
            screen.draw(session.pass(Instant::now()));
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line, screen.frame.as_ref(), session.catalog()) {
                    Input::Action(action) => session.dispatch(action),
                    Input::Menu => print_menu(session.catalog()),
                    Input::History => print_history(&session.recent_orders(config.history_limit)),
                    Input::Help => print_help(session.voice_enabled()),
                    Input::Quit => break,
                    Input::Empty => {}
                    Input::Invalid(reason) => println!("{reason} (? for help)"),
                }
            }
            _ = tick.tick() => {
                if screen.busy() {
                    screen.draw(session.pass(Instant::now()));
                }
            }
        }
    }

    tracing::info!("session ended");
    Ok(())
}

/// Last drawn frame; identical frames are not reprinted
#[derive(Default)]
struct Screen {
    frame: Option<Frame>,
    text: String,
}

impl Screen {
    fn draw(&mut self, frame: Frame) {
        let text = frame.to_string();
        if text != self.text {
            println!("\n{text}");
            self.text = text;
        }
        self.frame = Some(frame);
    }

    fn busy(&self) -> bool {
        self.frame.as_ref().is_some_and(|f| f.busy)
    }
}

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Action(Action),
    Menu,
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Map a typed line to an input
///
/// `d N` and `r N` refer to line numbers of the last drawn frame.
fn parse_input(line: &str, frame: Option<&Frame>, catalog: &MenuCatalog) -> Input {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Input::Empty;
    };

    if let Ok(number) = first.parse::<usize>() {
        let Some(item) = number.checked_sub(1).and_then(|i| catalog.items().get(i)) else {
            return Input::Invalid(format!("no menu item {number}"));
        };
        let mut temperature = None;
        let mut add_ons = Vec::new();
        for word in words {
            match parse_temperature(word) {
                Some(t) => temperature = Some(t),
                None => add_ons.push(word.to_string()),
            }
        }
        return Input::Action(Action::AddItem {
            item_id: item.id.clone(),
            temperature,
            add_ons,
        });
    }

    let keyword = first.to_lowercase();
    match keyword.as_str() {
        "hot" => Input::Action(Action::SetTemperature(Some(Temperature::Hot))),
        "cold" | "iced" => Input::Action(Action::SetTemperature(Some(Temperature::Cold))),
        "any" => Input::Action(Action::SetTemperature(None)),
        "v" | "voice" => Input::Action(Action::StartCapture),
        "c" | "clear" => Input::Action(Action::ClearOrder),
        "p" | "place" => Input::Action(Action::CompleteOrder),
        "d" | "r" => {
            let key = words
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .and_then(|n| frame.and_then(|f| f.line_key(n)))
                .cloned();
            match (keyword.as_str(), key) {
                ("d", Some(key)) => Input::Action(Action::Decrement(key)),
                (_, Some(key)) => Input::Action(Action::Remove(key)),
                (_, None) => Input::Invalid(format!("usage: {keyword} <line number>")),
            }
        }
        "m" | "menu" => Input::Menu,
        "h" | "history" => Input::History,
        "?" | "help" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown input: {other}")),
    }
}

fn parse_temperature(word: &str) -> Option<Temperature> {
    match word.to_lowercase().as_str() {
        "hot" => Some(Temperature::Hot),
        "cold" | "iced" => Some(Temperature::Cold),
        _ => None,
    }
}

fn build_recognizer(config: &Config) -> Option<Arc<dyn SpeechRecognizer>> {
    if !config.voice.input_enabled {
        return None;
    }
    match config.speech_to_text() {
        Ok(stt) => Some(Arc::new(MicrophoneRecognizer::new(stt))),
        Err(e) => {
            tracing::warn!(error = %e, "voice input unavailable");
            None
        }
    }
}

fn build_synthesizer(config: &Config) -> Arc<dyn SpeechSynthesizer> {
    if config.voice.output_enabled {
        match config.text_to_speech() {
            Ok(tts) => return Arc::new(SpeakerSynthesizer::new(tts)),
            Err(e) => tracing::warn!(error = %e, "speech output unavailable"),
        }
    }
    Arc::new(LogSynthesizer)
}

fn print_menu(catalog: &MenuCatalog) {
    println!("Menu");
    for (i, item) in catalog.items().iter().enumerate() {
        let price = item.price.map(|p| p.to_string()).unwrap_or_default();
        let temperature = if item.supports_temperature {
            " (hot/cold)"
        } else {
            ""
        };
        println!("  {:>2}. {:<14} {:>6}{temperature}", i + 1, item.name, price);
    }
    if !catalog.add_ons().is_empty() {
        println!("Add-ons");
        for add_on in catalog.add_ons() {
            let price = add_on.price.map(|p| format!("+{p}")).unwrap_or_default();
            println!("      {:<14} {:>6}  [{}]", add_on.name, price, add_on.id);
        }
    }
}

fn print_help(voice: bool) {
    println!();
    println!("  <n> [hot|cold] [add-on...]  add menu item n");
    println!("  hot | cold | any            set temperature for drinks that come both ways");
    if voice {
        println!("  v                           speak an order");
    }
    println!("  d <line>  /  r <line>       take one off / remove an order line");
    println!("  p  place order   c  clear   h  history   m  menu   q  quit");
}

fn print_history(orders: &[PersistedOrder]) {
    if orders.is_empty() {
        println!("No orders yet");
        return;
    }
    println!("Recent orders");
    for order in orders {
        let summary = OrderState::from_persisted(order.items.clone()).summary();
        let total = order.total.map(|t| t.to_string()).unwrap_or_default();
        println!(
            "  #{:<4} {}  {:>7}  {summary}",
            order.id,
            order
                .completed_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S"),
            total,
        );
    }
}

fn show_history(config: &Config, limit: Option<usize>) -> anyhow::Result<()> {
    let pool = db::init(&config.db_path)?;
    let store = SqliteOrderStore::new(pool);
    let orders = store.list_recent(limit.unwrap_or(config.history_limit))?;
    print_history(&orders);
    Ok(())
}

fn interpret(config: &Config, text: &str) -> anyhow::Result<()> {
    let interpreter = CommandInterpreter::new(&config.load_catalog()?);
    println!("{:?}", interpreter.interpret(text));
    Ok(())
}

/// Run blocking audio or HTTP work on its own OS thread
///
/// The blocking reqwest client must be created and dropped outside the
/// async runtime.
async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.await
        .map_err(|_| anyhow::anyhow!("worker thread stopped"))?
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64, transcribe: bool) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);

        capture.clear_buffer();
    }

    capture.stop();
    drop(capture);

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    if transcribe {
        let stt = config.speech_to_text()?;
        println!("\nSay an order now...");
        let text = run_blocking(move || {
            let recognizer = MicrophoneRecognizer::new(stt);
            let audio = recognizer.listen(LISTEN_TIMEOUT, PHRASE_LIMIT)?;
            Ok(recognizer.recognize(&audio)?)
        })
        .await?;
        println!("Heard: \"{text}\"");
    }

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    // Generate 2 seconds of 440Hz sine wave at 24kHz sample rate
    let sample_rate = 24000_u16;
    let frequency = 440.0_f32;
    let num_samples = usize::from(sample_rate) * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / f32::from(sample_rate);
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    run_blocking(move || {
        AudioPlayback::new()?.play_samples(samples)?;
        Ok(())
    })
    .await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: String) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = config.text_to_speech()?;
    println!("Synthesizing speech ({:?})...", tts.provider());

    run_blocking(move || {
        SpeakerSynthesizer::new(tts).speak(&text)?;
        Ok(())
    })
    .await?;

    println!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use kopi_order::menu::Money;
    use kopi_order::voice::SpeechTurn;
    use kopi_order::{FrameLine, SlotKey};

    use super::*;

    fn frame_with_latte() -> Frame {
        Frame {
            lines: vec![FrameLine {
                key: SlotKey {
                    item_id: "latte".to_string(),
                    temperature: Some(Temperature::Hot),
                    add_ons: BTreeSet::new(),
                },
                label: "Hot Latte".to_string(),
                quantity: 2,
                add_ons: Vec::new(),
                subtotal: Money::from_cents(700),
            }],
            total: Money::from_cents(700),
            pending_temperature: None,
            notification: None,
            capture: SpeechTurn::Idle,
            voice_enabled: false,
            last_transcript: None,
            speaking: false,
            redraw_requested: false,
            busy: false,
        }
    }

    #[test]
    fn test_parse_add_with_options() {
        let catalog = MenuCatalog::embedded().unwrap();
        let Input::Action(Action::AddItem {
            item_id,
            temperature,
            add_ons,
        }) = parse_input("3 cold oat-milk", None, &catalog)
        else {
            panic!("expected an add");
        };
        assert_eq!(item_id, catalog.items()[2].id);
        assert_eq!(temperature, Some(Temperature::Cold));
        assert_eq!(add_ons, vec!["oat-milk".to_string()]);

        assert!(matches!(parse_input("99", None, &catalog), Input::Invalid(_)));
    }

    #[test]
    fn test_parse_line_commands() {
        let catalog = MenuCatalog::embedded().unwrap();
        let frame = frame_with_latte();

        let Input::Action(Action::Decrement(key)) = parse_input("d 1", Some(&frame), &catalog)
        else {
            panic!("expected a decrement");
        };
        assert_eq!(key.item_id, "latte");

        assert!(matches!(
            parse_input("r 1", Some(&frame), &catalog),
            Input::Action(Action::Remove(_))
        ));
        assert!(matches!(parse_input("r 2", Some(&frame), &catalog), Input::Invalid(_)));
        assert!(matches!(parse_input("d", None, &catalog), Input::Invalid(_)));
    }

    #[test]
    fn test_parse_simple_keys() {
        let catalog = MenuCatalog::embedded().unwrap();
        assert_eq!(
            parse_input("hot", None, &catalog),
            Input::Action(Action::SetTemperature(Some(Temperature::Hot)))
        );
        assert_eq!(
            parse_input("any", None, &catalog),
            Input::Action(Action::SetTemperature(None))
        );
        assert_eq!(parse_input("p", None, &catalog), Input::Action(Action::CompleteOrder));
        assert_eq!(parse_input("  ", None, &catalog), Input::Empty);
        assert_eq!(parse_input("q", None, &catalog), Input::Quit);
    }
}
