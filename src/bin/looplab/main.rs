//! looplab - terminal loop studio
//!
//! A raw-mode keyboard front end over the studio engine. The home row is a
//! piano, number keys pick layers, and a handful of keys drive recording,
//! looping, tempo, and volume.

use std::io::Write;
use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;

use looplab::pitch::Note;
use looplab::store::{CompositionLibrary, MemoryStore};
use looplab::voice::Instrument;
use looplab::{EngineConfig, StudioEngine};

/// Piano mapping in the classic tracker layout: white keys on the home
/// row, sharps on the row above, continuing into the next octave.
const KEY_NOTES: &[(char, &str)] = &[
    ('a', "C4"),
    ('w', "C#4"),
    ('s', "D4"),
    ('e', "D#4"),
    ('d', "E4"),
    ('f', "F4"),
    ('t', "F#4"),
    ('g', "G4"),
    ('y', "G#4"),
    ('h', "A4"),
    ('u', "A#4"),
    ('j', "B4"),
    ('k', "C5"),
    ('o', "C#5"),
    ('l', "D5"),
    ('p', "D#5"),
    (';', "E5"),
];

const HELP: &str = "\
looplab
  a..; piano keys        1-4  select layer
  r    record take       enter  loop active layer
  0    start all loops   9    stop all loops
  [ ]  layer tempo -/+   , .  reference tempo -/+
  - =  volume -/+        i    cycle instrument
  x    clear layer       c    save take
  q    quit
";

fn note_for_key(c: char) -> Option<Note> {
    KEY_NOTES
        .iter()
        .find(|(key, _)| *key == c)
        .and_then(|(_, name)| name.parse().ok())
}

struct App {
    engine: StudioEngine,
    library: CompositionLibrary<MemoryStore>,
    saved_takes: usize,
    instrument_slot: usize,
    layer_tempo: f32,
    reference_bpm: f32,
}

impl App {
    fn new() -> Self {
        let engine = StudioEngine::new(EngineConfig::default());
        let reference_bpm = engine.state().reference_bpm;
        Self {
            engine,
            library: CompositionLibrary::new(MemoryStore::new()),
            saved_takes: 0,
            instrument_slot: 0,
            layer_tempo: reference_bpm,
            reference_bpm,
        }
    }

    fn status(&self) -> String {
        let state = self.engine.state();
        let rec = if self.engine.is_recording() {
            "REC"
        } else {
            "   "
        };
        let playing = self.engine.layers().playing_indices();
        format!(
            "[{rec}] layer {} | {} | ref {:.0} bpm | looping {:?}",
            state.active_layer + 1,
            state.instrument.name(),
            state.reference_bpm,
            playing,
        )
    }

    fn handle_key(&mut self, key: KeyEvent) -> EyreResult<bool> {
        if key.kind == KeyEventKind::Release {
            return Ok(true);
        }
        let engine = &mut self.engine;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(false),

            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                engine.set_active_layer(index)?;
                if let Ok(Some(layer)) = engine.layers().get(index) {
                    self.layer_tempo = layer.tempo_bpm;
                }
            }

            KeyCode::Char('r') => {
                if engine.is_recording() {
                    engine.stop_recording()?;
                } else {
                    engine.start_recording()?;
                }
            }

            KeyCode::Enter => {
                let active = engine.state().active_layer;
                let looping = engine
                    .layers()
                    .get(active)?
                    .map(|layer| layer.is_playing)
                    .unwrap_or(false);
                if looping {
                    engine.stop_layer_loop(active)?;
                } else if let Err(err) = engine.start_layer_loop(active) {
                    // An empty layer is a user mistake, not a crash.
                    eprintln!("\r{err}");
                }
            }

            KeyCode::Char('0') => engine.start_all_loops(),
            KeyCode::Char('9') => engine.stop_all_loops(),

            KeyCode::Char('[') => self.nudge_layer_tempo(-5.0)?,
            KeyCode::Char(']') => self.nudge_layer_tempo(5.0)?,

            KeyCode::Char(',') => self.nudge_reference(-5.0),
            KeyCode::Char('.') => self.nudge_reference(5.0),

            KeyCode::Char('-') => {
                let volume = engine.state().master_volume - 0.05;
                engine.set_master_volume(volume);
            }
            KeyCode::Char('=') => {
                let volume = engine.state().master_volume + 0.05;
                engine.set_master_volume(volume);
            }

            KeyCode::Char('i') => {
                self.instrument_slot = (self.instrument_slot + 1) % Instrument::ALL.len();
                self.engine.set_instrument(Instrument::ALL[self.instrument_slot]);
            }

            KeyCode::Char('x') => {
                let active = engine.state().active_layer;
                engine.clear_layer(active)?;
            }

            KeyCode::Char('c') => {
                self.saved_takes += 1;
                let name = format!("take {}", self.saved_takes);
                let composition = self.engine.snapshot_composition(&name)?;
                self.library.save(composition)?;
                eprintln!("\rsaved '{name}'");
            }

            KeyCode::Char(c) => {
                if let Some(note) = note_for_key(c) {
                    self.engine.trigger_note(note);
                }
            }

            _ => {}
        }
        Ok(true)
    }

    fn nudge_layer_tempo(&mut self, delta: f32) -> EyreResult<()> {
        let active = self.engine.state().active_layer;
        self.layer_tempo += delta;
        self.engine.set_layer_tempo(active, self.layer_tempo)?;
        if let Ok(Some(layer)) = self.engine.layers().get(active) {
            self.layer_tempo = layer.tempo_bpm; // pick up clamping
        }
        Ok(())
    }

    fn nudge_reference(&mut self, delta: f32) {
        self.reference_bpm += delta;
        self.engine.set_reference_bpm(self.reference_bpm);
        self.reference_bpm = self.engine.state().reference_bpm;
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::init();

    println!("{HELP}");

    let mut app = App::new();
    terminal::enable_raw_mode()?;

    let result = run(&mut app);

    terminal::disable_raw_mode()?;
    println!();
    result
}

fn run(app: &mut App) -> EyreResult<()> {
    let mut last_status = String::new();
    loop {
        // Short poll keeps the scheduler tick close to its millisecond
        // timeline even while idle.
        if event::poll(Duration::from_millis(5))? {
            if let Event::Key(key) = event::read()? {
                if !app.handle_key(key)? {
                    return Ok(());
                }
            }
        }
        app.engine.tick();

        let status = app.status();
        if status != last_status {
            print!("\r\x1b[2K{status}");
            std::io::stdout().flush()?;
            last_status = status;
        }
    }
}
