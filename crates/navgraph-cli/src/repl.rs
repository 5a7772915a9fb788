//! REPL – the interactive surveying shell.
//!
//! Supported slash-commands:
//!   /help              – show this list
//!   /status            – what the current hallway has recorded so far
//!   /level <n>         – level of the hallway being recorded
//!   /capture <file>    – record every tap in a JSON-lines capture file
//!   /link              – connect the most recent entry to an existing one
//!   /undo              – drop the most recent tap or closed obstacle
//!   /reset             – discard the hallway being recorded
//!   /cut               – close the obstacle outlined by the pending cuts
//!   /hallway <name>    – finish the hallway and add it to the graph
//!   /finish [name]     – walk every unresolved entrypoint, then save
//!   /save [name]       – write the graph to the store
//!   /load <name>       – replace the graph with a stored one
//!   /list              – stored graph names
//!   /print             – one block per hallway with its connections
//!   /plan <level>      – hallway outlines on a level in viewport pixels
//!   /schema            – JSON Schema of the stored document
//!   /quit | /exit      – leave

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use navgraph_geometry::PlanLayout;
use navgraph_geometry::projection::edge_lengths;
use navgraph_model::{Graph, RecordingSession, document};
use navgraph_resolver::{Authoring, LinkDialog, Operator, Resolver, Workflow, drive};
use navgraph_types::MeasurementKind;
use tracing::{info, warn};

use crate::capture;
use crate::config::Config;
use crate::operator::ConsoleOperator;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the shell mutates between commands.
pub struct Shell {
    cfg: Config,
    graph: Graph,
    session: RecordingSession,
    /// Name the graph was last saved or loaded under.
    name: Option<String>,
}

impl Shell {
    pub fn new(cfg: Config) -> Self {
        let session = RecordingSession::new(cfg.default_level);
        Self {
            cfg,
            graph: Graph::new(),
            session,
            name: None,
        }
    }

    /// Run one command line. Errors are reported, never fatal.
    pub fn execute(&mut self, line: &str, operator: &mut dyn Operator) -> Flow {
        let (cmd, arg) = match line.trim().split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line.trim(), ""),
        };

        match cmd {
            "" => {}
            "/help" => cmd_help(),
            "/status" => self.cmd_status(),
            "/level" => self.cmd_level(arg),
            "/capture" => self.cmd_capture(arg),
            "/link" => self.cmd_link(operator),
            "/undo" => self.cmd_undo(),
            "/reset" => {
                self.session.reset();
                println!("{}", "Hallway discarded.".yellow());
            }
            "/cut" => self.cmd_cut(),
            "/hallway" => self.cmd_hallway(arg),
            "/finish" => self.cmd_finish(arg, operator),
            "/save" => self.cmd_save(arg),
            "/load" => self.cmd_load(arg),
            "/list" => self.cmd_list(),
            "/print" => print!("{}", self.graph.summary()),
            "/plan" => self.cmd_plan(arg),
            "/schema" => match document::schema_json() {
                Ok(schema) => println!("{schema}"),
                Err(e) => println!("{}: {}", "Schema error".red(), e),
            },
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                return Flow::Quit;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
        Flow::Continue
    }

    // ─────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────

    fn cmd_status(&self) {
        println!("{}", "Current hallway".bold().underline());
        println!("  level     : {}", self.session.level().to_string().yellow());
        for (label, kind) in [
            ("walls", MeasurementKind::Wall),
            ("rooms", MeasurementKind::Room),
            ("markers", MeasurementKind::Marker),
            ("entries", MeasurementKind::Entry),
            ("cuts", MeasurementKind::Cut),
        ] {
            println!("  {label:<9} : {}", self.session.measurements(kind).len());
        }
        println!("  obstacles : {}", self.session.obstacles().len());
        let closable = if self.session.can_close() {
            "yes".green()
        } else {
            "no (needs 3 walls)".red()
        };
        println!("  closable  : {closable}");
        println!("  graph     : {} hallway(s)", self.graph.len());
    }

    fn cmd_level(&mut self, arg: &str) {
        match arg.parse::<i32>() {
            Ok(level) => {
                self.session.set_level(level);
                println!("{} {}", "✓ Recording on level".green(), level.to_string().bold());
            }
            Err(_) => println!("{} /level <integer>", "Usage:".yellow()),
        }
    }

    fn cmd_capture(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("{} /capture <file>", "Usage:".yellow());
            return;
        }
        match capture::read(Path::new(arg)) {
            Ok(taps) => {
                let n = taps.len();
                for m in taps {
                    self.session.record(m);
                }
                info!(file = arg, taps = n, "capture ingested");
                println!("{} {} tap(s) recorded", "✓".green(), n);
            }
            Err(e) => println!("{}: {}", "Capture error".red(), e),
        }
    }

    fn cmd_link(&mut self, operator: &mut dyn Operator) {
        let Some(entry) = self.session.last_entry_mut() else {
            println!("{}", "No entry recorded in this hallway yet.".yellow());
            return;
        };
        let mut dialog = match LinkDialog::new(entry, "this hallway") {
            Ok(d) => d,
            Err(e) => {
                println!("{}: {}", "Cannot link".red(), e);
                return;
            }
        };
        let mut ctx = Authoring {
            graph: &self.graph,
            entry,
        };
        run_to_completion(&mut dialog, &mut ctx, operator);
        println!("  {} provisional link(s) on this entry", ctx.entry.links().len());
    }

    fn cmd_undo(&mut self) {
        if self.session.undo_last() {
            println!("{}", "✓ Undone.".green());
        } else {
            println!("{}", "Nothing to undo.".yellow());
        }
    }

    fn cmd_cut(&mut self) {
        match self.session.close_obstacle() {
            Ok(polygon) => println!("{} obstacle closed with {} corners", "✓".green(), polygon.len()),
            Err(e) => println!("{}: {}", "Obstacle rejected".red(), e),
        }
    }

    fn cmd_hallway(&mut self, name: &str) {
        if name.is_empty() {
            println!("{} /hallway <name>", "Usage:".yellow());
            return;
        }
        match self.session.finish_hallway(name, &mut self.graph) {
            Ok(id) => {
                println!("{} hallway {} registered as #{}", "✓".green(), name.bold(), id);
                if self.cfg.autosave
                    && let Some(graph_name) = self.name.clone()
                {
                    self.save_as(&graph_name);
                }
            }
            Err(e) => println!("{}: {}", "Hallway not finished".red(), e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Graph
    // ─────────────────────────────────────────────────────────────────────

    fn cmd_finish(&mut self, arg: &str, operator: &mut dyn Operator) {
        let Some(name) = self.target_name(arg) else {
            println!("{} /finish <name>", "Usage:".yellow());
            return;
        };
        let mut resolver = Resolver::new(&self.graph);
        println!("  {} entrypoint(s) to review", resolver.pending());
        run_to_completion(&mut resolver, &mut self.graph, operator);
        println!("{} {} link(s) written", "✓".green(), resolver.links_written());
        self.save_as(&name);
    }

    fn cmd_save(&mut self, arg: &str) {
        match self.target_name(arg) {
            Some(name) => self.save_as(&name),
            None => println!("{} /save <name>", "Usage:".yellow()),
        }
    }

    fn save_as(&mut self, name: &str) {
        match store::save(&self.cfg.graph_dir, name, &mut self.graph) {
            Ok(path) => {
                self.name = Some(name.to_string());
                println!("{} {}", "✓ Saved to".green(), path.display().to_string().bold());
            }
            Err(e) => println!("{}: {}", "Save failed".red(), e),
        }
    }

    fn cmd_load(&mut self, name: &str) {
        if name.is_empty() {
            println!("{} /load <name>", "Usage:".yellow());
            return;
        }
        if !self.session.is_empty() {
            warn!("loading a graph while a hallway is being recorded");
        }
        match store::load(&self.cfg.graph_dir, name) {
            Ok(graph) => {
                self.graph = graph;
                self.name = Some(name.to_string());
                println!("{} {} hallway(s) loaded", "✓".green(), self.graph.len());
            }
            Err(e) => println!("{}: {} (graph unchanged)", "Load failed".red(), e),
        }
    }

    fn cmd_list(&self) {
        match store::list(&self.cfg.graph_dir) {
            Ok(names) if names.is_empty() => println!("  {}", "no stored graphs".dimmed()),
            Ok(names) => {
                for n in names {
                    let marker = if self.name.as_deref() == Some(n.as_str()) { "▶" } else { " " };
                    println!("  {} {}", marker.green(), n.bold());
                }
            }
            Err(e) => println!("{}: {}", "List failed".red(), e),
        }
    }

    fn cmd_plan(&self, arg: &str) {
        let Ok(level) = arg.parse::<i32>() else {
            println!("{} /plan <level>", "Usage:".yellow());
            return;
        };
        let points = self.graph.level_points(level);
        let Some(layout) = PlanLayout::for_points(&points, self.cfg.viewport()) else {
            println!("  {}", format!("nothing on level {level}").dimmed());
            return;
        };
        println!(
            "{} (scale {:.1} px/m, viewport {}x{})",
            format!("Level {level}").bold().underline(),
            layout.scale,
            self.cfg.viewport_width,
            self.cfg.viewport_height
        );
        for h in self.graph.hallways_on_level(level) {
            println!("  {} #{}", h.name.bold(), h.id);
            for edge in edge_lengths(h.corners()) {
                let [x, y] = layout.to_screen(edge.from);
                println!("    ({x:>7.1}, {y:>7.1})  {:>6.2} m", edge.length);
            }
            for e in &h.entrypoints {
                let [x, y] = layout.to_screen(e.position);
                println!("    {} {} at ({x:.1}, {y:.1})", e.kind.to_string().cyan(), e.name);
            }
        }
    }

    fn target_name(&self, arg: &str) -> Option<String> {
        if arg.is_empty() {
            self.name.clone()
        } else {
            Some(arg.to_string())
        }
    }
}

/// Drive `machine` until it finishes, reporting and re-asking on rejected
/// answers.
fn run_to_completion<C, W: Workflow<C>>(machine: &mut W, ctx: &mut C, operator: &mut dyn Operator) {
    while let Err(e) = drive(machine, ctx, operator) {
        println!("  {} {}", "✗".red(), e);
    }
}

fn cmd_help() {
    println!();
    println!("{}", "navgraph Commands".bold().underline());
    for (cmd, what) in [
        ("/status", "what the current hallway has recorded"),
        ("/level <n>", "set the level being recorded"),
        ("/capture <file>", "record taps from a capture file"),
        ("/link", "connect the latest entry to an existing one"),
        ("/undo", "drop the latest tap or obstacle"),
        ("/reset", "discard the current hallway"),
        ("/cut", "close the pending obstacle outline"),
        ("/hallway <name>", "finish the current hallway"),
        ("/finish [name]", "resolve open entrypoints, then save"),
        ("/save [name]", "save the graph"),
        ("/load <name>", "load a stored graph"),
        ("/list", "stored graphs"),
        ("/print", "graph overview"),
        ("/plan <level>", "outline a level in viewport pixels"),
        ("/schema", "JSON Schema of stored graphs"),
        ("/quit  /exit", "leave"),
    ] {
        println!("  {:<16} – {}", cmd.bold().cyan(), what);
    }
    println!();
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(cfg: Config, shutdown: Arc<AtomicBool>) {
    let mut shell = Shell::new(cfg);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "navgraph>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let mut operator = ConsoleOperator::new(stdin.lock(), io::stdout());
        if shell.execute(&line, &mut operator) == Flow::Quit {
            shutdown.store(true, Ordering::SeqCst);
            break;
        }
    }
}
