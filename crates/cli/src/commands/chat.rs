//! `thinkfirst chat` — Interactive or single-message tutoring.
//!
//! The terminal plays the client's role: it keeps the history, the
//! conversation context and the time-travel state between turns.

use std::io::Write;
use thinkfirst_config::AppConfig;
use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::message::ChatTurn;
use thinkfirst_tutor::{Rule, TimeTravelContext, Tutor, TurnRequest, TurnResponse};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Client-side session state.
#[derive(Debug, Default)]
struct Session {
    history: Vec<ChatTurn>,
    context: Option<ConversationContext>,
    time_travel: Option<TimeTravelContext>,
}

impl Session {
    fn request(&self, message: &str) -> TurnRequest {
        let mut request = TurnRequest::new(message).with_history(self.history.clone());
        if let Some(ctx) = &self.context {
            request = request.with_context(ctx.clone());
        }
        if let Some(tt) = &self.time_travel {
            request = request.with_time_travel(tt.clone());
        }
        request
    }

    /// Fold a reply back into the session.
    fn absorb(&mut self, message: &str, response: &TurnResponse, now_ms: i64) {
        self.history.push(ChatTurn::user(message));
        self.history.push(ChatTurn::assistant(&response.reply.text));
        self.context = Some(response.context.clone());

        if let Some(tt) = response.time_travel.clone() {
            let mut tt = if response.rule == Rule::NewLearningQuestion {
                TimeTravelContext::started_at(now_ms)
            } else {
                tt
            };
            tt.attempt_count = response.context.attempt_count;
            tt.thinking_time = tt.elapsed_secs(now_ms);
            self.time_travel = Some(tt);
        }
    }
}

pub async fn run(message: Option<String>, time_travel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GROQ_API_KEY=gsk_...        (recommended)");
        eprintln!("    export THINKFIRST_API_KEY=...      (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let tutor = thinkfirst_gateway::build_tutor(&config)?;

    let mut session = Session::default();
    if time_travel {
        session.time_travel = Some(TimeTravelContext::started_at(now_ms()));
    }

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = tutor.respond(session.request(&msg)).await?;
        eprint!("\r              \r");
        println!("{}", response.reply.text);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       ThinkFirst Tutor — Interactive Mode    ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", tutor.provider_name());
    println!("  Model:     {}", tutor.model());
    let sources = tutor.realtime().names();
    if sources.is_empty() {
        println!("  Realtime:  none");
    } else {
        println!("  Realtime:  {}", sources.join(", "));
    }
    println!("  Hints:     {}", if time_travel { "time travel" } else { "by attempts" });
    println!();
    println!("  Ask a question and try it yourself first.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        turn(&tutor, &mut session, line).await;
        prompt()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

async fn turn(tutor: &Tutor, session: &mut Session, line: &str) {
    eprint!("  ...");
    match tutor.respond(session.request(line)).await {
        Ok(response) => {
            eprint!("\r     \r");
            println!();
            println!("  [{}]", status_line(&response));
            for text in response.reply.text.lines() {
                println!("  Tutor > {text}");
            }
            println!();
            session.absorb(line, &response, now_ms());
        }
        Err(e) => {
            eprint!("\r     \r");
            eprintln!("  [Error] {e}");
            println!();
        }
    }
}

fn status_line(response: &TurnResponse) -> String {
    let reply = &response.reply;
    let mut status = format!("{} via {}", reply.mode, response.rule);
    if response.context.is_learning_mode {
        status.push_str(&format!(
            ", topic \"{}\", attempt {}",
            response.context.topic().unwrap_or_default(),
            response.context.attempt_count
        ));
    }
    if reply.is_hint {
        status.push_str(", hint");
    }
    if reply.is_solution {
        status.push_str(", solution");
    }
    if let Some(tt) = response.time_travel.as_ref().filter(|tt| tt.is_active) {
        status.push_str(&format!(", hints unlocked {:?}", tt.unlocked_hints));
    }
    status
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
