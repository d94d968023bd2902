//! Terminal client.
//!
//! Drives a [`GameState`] from relay responses and stdin, pushes each turn's
//! narrative through the reveal driver, and only shows the choices once the
//! player has clicked (pressed Enter) through the last segment.

pub mod client;
pub mod render;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::game::countdown::Countdown;
use crate::game::{resolve_input, GameEvent, GameState, Input};
use crate::relay::theme::Theme;
use crate::story::driver::{self, DriverConfig, RevealHandle};
use crate::story::segmenter::Segmenter;

pub use client::RelayClient;
pub use render::{ReadGate, TerminalRenderer};

/// Play one game against the relay at `config.game.relay_url`.
pub async fn run(config: &Config, theme: Theme) -> Result<()> {
    let relay = RelayClient::new(
        &config.game.relay_url,
        Duration::from_secs(config.model.timeout_seconds + 10),
    );
    if let Err(e) = relay.health().await {
        warn!("{:#}", e);
        println!("无法连接到 relay（{}），请先运行 `escaperoom serve`。", relay.base_url());
        return Ok(());
    }

    let driver_config = DriverConfig::from(&config.reveal);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (reveal, task) = driver::spawn(driver_config, TerminalRenderer::new(io::stdout(), done_tx));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut gate = ReadGate::default();

    let mut state = GameState::new(theme);
    println!("【{}】{}", state.theme.display_name(), state.theme.description());
    println!("正在生成场景...");
    state = state.apply(GameEvent::ScenarioRequested);
    state = match relay.start(&state.theme, &config.game.difficulty).await {
        Ok(scenario) => state.apply(GameEvent::ScenarioStarted(scenario)),
        Err(e) => {
            warn!("scenario request failed: {:#}", e);
            state.apply(GameEvent::ScenarioFailed)
        }
    };
    if !state.started {
        println!("{}", state.narrative());
        reveal.shutdown();
        let _ = task.await;
        return Ok(());
    }
    info!("game started: {}", state.title);
    println!("\n== {} ==", state.title);

    let countdown = Countdown::start(Duration::from_secs(config.game.time_limit_minutes * 60));
    let expiry = countdown.expiry();
    tokio::pin!(expiry);
    let mut reading = begin_turn(&state, &reveal, &mut gate, &driver_config.segmenter, &countdown);

    loop {
        tokio::select! {
            _ = &mut expiry, if !state.game_over => {
                state = state.apply(GameEvent::TimeExpired);
                reading = begin_turn(&state, &reveal, &mut gate, &driver_config.segmenter, &countdown);
                if !reading {
                    break;
                }
            }
            Some(generation) = done_rx.recv() => {
                if !gate.is_current(generation) {
                    continue;
                }
                reading = false;
                show_choices(&state, &countdown);
                if state.game_over {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if reading {
                    // Enter skips typing or moves to the next segment.
                    reveal.click();
                    continue;
                }
                match resolve_input(&line, &state) {
                    Input::Empty => prompt(),
                    Input::Quit => break,
                    Input::Invalid(msg) => {
                        println!("{}", msg);
                        prompt();
                    }
                    Input::Action(action) => {
                        println!("> {}\n...", action);
                        state = state.apply(GameEvent::ActionSubmitted(action.clone()));
                        let context = state.action_context(config.game.history_window);
                        let result = tokio::select! {
                            result = relay.act(&action, context) => Some(result),
                            _ = &mut expiry => None,
                        };
                        state = match result {
                            Some(Ok(outcome)) => state.apply(GameEvent::TurnResolved { action, outcome }),
                            Some(Err(e)) => {
                                warn!("action failed: {:#}", e);
                                state.apply(GameEvent::ActionFailed)
                            }
                            None => state.apply(GameEvent::TimeExpired),
                        };
                        reading = begin_turn(&state, &reveal, &mut gate, &driver_config.segmenter, &countdown);
                        if !reading && state.game_over {
                            break;
                        }
                    }
                }
            }
        }
    }

    reveal.shutdown();
    let _ = task.await;
    Ok(())
}

/// Start revealing the current narrative. Returns whether a reveal is running;
/// a narrative with nothing to show counts as already read.
fn begin_turn(
    state: &GameState,
    reveal: &RevealHandle,
    gate: &mut ReadGate,
    segmenter: &Segmenter,
    countdown: &Countdown,
) -> bool {
    let text = state.narrative();
    if segmenter.split(text).is_empty() {
        show_choices(state, countdown);
        return false;
    }
    gate.next();
    reveal.show(text);
    true
}

fn show_choices(state: &GameState, countdown: &Countdown) {
    if state.game_over {
        println!("\n{}", if state.is_win { "【逃脱成功】" } else { "【游戏结束】" });
        if let Some(score) = &state.final_score {
            if let Some(points) = score.score {
                print!("得分 {} ", points);
            }
            if let Some(rank) = score.rank {
                print!("评级 {} ", rank.as_str());
            }
            println!();
            if let Some(comment) = &score.comment {
                println!("{}", comment);
            }
        }
        return;
    }

    for npc in &state.npcs {
        let title = if npc.title.is_empty() { String::new() } else { format!("（{}）", npc.title) };
        println!("◆ {}{} [{}] {}", npc.name, title, npc.attitude, npc.description);
        if let Some(line) = &npc.dialogue {
            println!("  「{}」", line);
        }
    }
    let rank = state
        .player_rank
        .as_deref()
        .map(|r| format!(" | {}级禁闭者", r))
        .unwrap_or_default();
    println!("\n[剩余 {}] 状态：{}{}", countdown.clock(), state.status, rank);
    if !state.inventory.is_empty() {
        let items: Vec<String> = state
            .inventory
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}.{}", i + 1, item))
            .collect();
        println!("背包：{}", items.join("  "));
    }
    for hint in &state.hints {
        println!("提示：{}", hint);
    }
    for (i, option) in state.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
    println!("输入选项编号，u <编号> 使用物品，或直接输入行动（q 退出）");
    prompt();
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
