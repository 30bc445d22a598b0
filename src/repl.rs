// src/repl.rs
// Interactive REPL front end for the agent

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;

use crate::agent::{Agent, AgentReply};
use crate::error::VegaError;

const BANNER: &str = "\
Vega - conversational code assistant

Features:
  - Explain code snippets with structured analysis
  - Get code improvement suggestions
  - Ask general programming questions
  - Conversation memory per session

Commands:
  /clear   - Clear conversation memory
  /memory  - View conversation history
  /stats   - Show session statistics
  /code    - Enter multi-line code mode (type 'END' on a new line to finish)
  /help    - Show this help
  /quit    - Exit

Type your question or paste code below:";

/// Session id used by the REPL front end
const REPL_SESSION: &str = "default";

/// Per-message truncation when displaying history
const MEMORY_DISPLAY_CHARS: usize = 200;

pub struct Repl {
    editor: DefaultEditor,
    agent: Arc<Agent>,
    history_path: std::path::PathBuf,
}

impl Repl {
    pub fn new(agent: Arc<Agent>) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs::home_dir()
            .unwrap_or_default()
            .join(".vega")
            .join("history");

        Ok(Self {
            editor,
            agent,
            history_path,
        })
    }

    fn load_history(&mut self) {
        if self.history_path.exists() {
            let _ = self.editor.load_history(&self.history_path);
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);
    }

    /// Run the REPL loop. Errors from individual turns are rendered as
    /// messages; only I/O failures end the loop.
    pub async fn run(&mut self) -> Result<()> {
        self.load_history();
        println!("{BANNER}");

        loop {
            match self.editor.readline(">>> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(&line)?;

                    if trimmed.starts_with('/') {
                        if !self.handle_command(trimmed).await? {
                            break;
                        }
                        continue;
                    }

                    self.process_input(trimmed).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err:?}");
                    break;
                }
            }
        }

        println!("Goodbye!");
        self.save_history();
        Ok(())
    }

    /// Handle a slash command. Returns false when the REPL should exit.
    async fn handle_command(&mut self, command: &str) -> Result<bool> {
        match command {
            "/quit" | "/exit" => return Ok(false),
            "/help" => println!("{BANNER}"),
            "/clear" => {
                self.agent.clear_memory(REPL_SESSION).await;
                println!("Conversation memory cleared.");
            }
            "/memory" => {
                let rendered = self
                    .agent
                    .get_formatted_memory(REPL_SESSION, MEMORY_DISPLAY_CHARS)
                    .await;
                println!("{rendered}");
            }
            "/stats" => {
                let stats = self.agent.get_stats().await;
                println!("Active sessions: {}", stats.active_sessions);
                println!("Total messages:  {}", stats.total_messages);
                println!("Session ids:     {}", stats.session_ids.join(", "));
            }
            "/code" => {
                let code = self.read_code_block()?;
                if code.trim().is_empty() {
                    println!("No code entered.");
                } else {
                    self.process_input(&code).await;
                }
            }
            other => println!("Unknown command: {other} (try /help)"),
        }
        Ok(true)
    }

    /// Multi-line code entry, terminated by END on its own line
    fn read_code_block(&mut self) -> Result<String> {
        println!("Enter code (type 'END' on a new line to finish):");
        let mut lines = Vec::new();
        loop {
            match self.editor.readline("... ") {
                Ok(line) => {
                    if line.trim() == "END" {
                        break;
                    }
                    lines.push(line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(lines.join("\n"))
    }

    async fn process_input(&self, input: &str) {
        match self.agent.run(input, REPL_SESSION).await {
            Ok(reply) => print_reply(&reply),
            Err(VegaError::InvalidInput(msg)) => println!("Invalid input: {msg}"),
            Err(e) => println!("The assistant failed to process that request: {e}"),
        }
    }
}

/// Pretty-print a reply, structured or plain
fn print_reply(reply: &AgentReply) {
    match reply {
        AgentReply::Text(text) => {
            println!("\nAnswer:\n{text}");
        }
        AgentReply::Explanation(e) => {
            println!("\nCode Explanation:");
            println!("  Language: {}", e.language);
            println!("\n  {}", e.detailed_explanation);
            println!("\n  Key concepts: {}", e.key_concepts.join(", "));
        }
        AgentReply::Improvement(i) => {
            println!("\nCode Improvement Suggestions:");
            if !i.original_issues.is_empty() {
                println!("\n  Issues found:");
                for (n, issue) in i.original_issues.iter().enumerate() {
                    println!("    {}. {}", n + 1, issue);
                }
            }
            if !i.suggestions.is_empty() {
                println!("\n  Suggestions:");
                for (n, suggestion) in i.suggestions.iter().enumerate() {
                    println!("    {}. {}", n + 1, suggestion);
                }
            }
            println!("\n  Improved code:");
            for line in i.improved_code.lines() {
                println!("    {line}");
            }
            println!("\n  Explanation: {}", i.explanation);
        }
    }
}
