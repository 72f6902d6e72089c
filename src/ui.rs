use crate::client::{
    AppSnapshot,
    Screen,
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use hyperploy::{
    DeploymentResult,
    FlowState,
    constants::{
        DEPLOYER_ADDRESS,
        ESTIMATED_COST,
        ESTIMATED_GAS,
        ESTIMATED_REMAINDER,
        MAX_COST,
        NATIVE_SYMBOL,
    },
    units::format_native,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;

pub type InputEvents = EventStream;

pub fn input_event_stream() -> InputEvents {
    EventStream::new()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Redraw,
    StartDeploying,
    Deploy,
    Refresh,
    Back,
    ViewSuccess,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Page {
    #[default]
    Landing,
    Deploy,
    Success,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    QuitModal,
}

#[derive(Default)]
pub struct UiState {
    mode: Mode,
    page: Page,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw_splash(state: &mut UiState) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Hyperploy");
            let p = Paragraph::new("Loading...").alignment(Alignment::Center);
            f.render_widget(Clear, f.area());
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        })?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    state.page = match snap.screen {
        Screen::Landing => Page::Landing,
        Screen::Deploy => Page::Deploy,
        Screen::Success(_) => Page::Success,
    };
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Translates a terminal event into an app action for the current page.
pub fn map_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let Event::Key(k) = event else {
        return match event {
            Event::Resize(..) => Some(UserEvent::Redraw),
            _ => None,
        };
    };
    if k.kind != KeyEventKind::Press {
        return None;
    }
    if state.mode == Mode::QuitModal {
        return match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        };
    }
    map_key(state, k)
}

fn map_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    if matches!(k.code, KeyCode::Char('q') | KeyCode::Esc) {
        state.mode = Mode::QuitModal;
        return Some(UserEvent::Redraw);
    }
    match (state.page, k.code) {
        (Page::Landing, KeyCode::Enter | KeyCode::Char('d')) => Some(UserEvent::StartDeploying),
        (Page::Deploy, KeyCode::Enter | KeyCode::Char('d')) => Some(UserEvent::Deploy),
        (Page::Deploy, KeyCode::Char('r')) => Some(UserEvent::Refresh),
        (Page::Deploy, KeyCode::Char('s')) => Some(UserEvent::ViewSuccess),
        (Page::Deploy, KeyCode::Backspace | KeyCode::Char('b')) => Some(UserEvent::Back),
        (Page::Success, KeyCode::Enter | KeyCode::Char('n')) => Some(UserEvent::Back),
        _ => None,
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status
            Constraint::Min(10),   // page
            Constraint::Length(5), // errors + help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    match &snap.screen {
        Screen::Landing => draw_landing(f, chunks[1]),
        Screen::Deploy => draw_deploy(f, chunks[1], snap),
        Screen::Success(result) => draw_success(f, chunks[1], result),
    }
    draw_bottom(f, chunks[2], snap);
    draw_modals(f, state);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let title = match snap.screen {
        Screen::Landing => "Hyperploy",
        Screen::Deploy => "Hyperploy | Deploy",
        Screen::Success(_) => "Hyperploy | Success",
    };
    let p = Paragraph::new(format!("Status: {}", snap.status))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_landing(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Deploy smart contracts on HyperEVM",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("One action deploys a ready-made contract through the Hyperploy factory."),
        Line::from(format!(
            "Flat fee of {MAX_COST} {NATIVE_SYMBOL}, paid from your connected wallet."
        )),
        Line::from(""),
        Line::from("[Enter] Start deploying"),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Welcome"));
    f.render_widget(p, area);
}

fn draw_deploy(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(4)])
        .split(cols[0]);

    draw_wallet(f, left[0], snap);
    draw_result(f, left[1], snap);
    draw_info(f, cols[1], snap);
}

fn draw_wallet(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let address = snap
        .wallet
        .as_ref()
        .and_then(|w| w.address)
        .map(|a| a.to_string())
        .unwrap_or_else(|| String::from("Not connected"));
    let chain = snap
        .wallet
        .as_ref()
        .and_then(|w| w.chain_id)
        .map(|c| c.to_string())
        .unwrap_or_else(|| String::from("-"));
    let balance = snap
        .wallet
        .as_ref()
        .map(|w| w.balance_display())
        .unwrap_or_else(|| String::from("0.0000"));
    let network = if snap.network.is_correct {
        Span::styled("HyperEVM", Style::default().fg(Color::Green))
    } else {
        Span::styled("Wrong network", Style::default().fg(Color::Red))
    };
    let lines = vec![
        Line::from(format!("Address: {address}")),
        Line::from(vec![
            Span::raw(format!("Chain: {chain} (")),
            network,
            Span::raw(")"),
        ]),
        Line::from(format!("Balance: {balance} {NATIVE_SYMBOL}")),
        Line::from(format!("Submit via: {}", snap.strategy)),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(p, area);
}

fn draw_result(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = snap
        .warnings
        .iter()
        .map(|w| Line::from(Span::styled(w.clone(), Style::default().fg(Color::Yellow))))
        .collect();

    let action = match snap.state {
        FlowState::Submitting => Span::styled("Deploying...", Style::default().fg(Color::Cyan)),
        _ if snap.can_submit => Span::styled(
            format!("[Enter] Deploy Contract ({MAX_COST} {NATIVE_SYMBOL})"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled(
            "Deploy Contract (unavailable)",
            Style::default().fg(Color::DarkGray),
        ),
    };
    lines.push(Line::from(action));

    if let Some(result) = &snap.result {
        lines.push(Line::from(""));
        if let Some(message) = &result.error_message {
            lines.push(Line::from(Span::styled(
                format!("Error: {message}"),
                Style::default().fg(Color::Red),
            )));
        }
        if let Some(hash) = result.short_hash() {
            lines.push(Line::from(format!("Transaction: {hash}")));
            if let Some(address) = &result.deployed_address {
                lines.push(Line::from(format!("Contract: {address}")));
            }
            lines.extend(confirmation_lines(result));
            if let Some(url) = result.explorer_url() {
                lines.push(Line::from(format!("Explorer: {url}")));
            }
            lines.push(Line::from("[s] View confirmation"));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Deploy"));
    f.render_widget(p, area);
}

fn confirmation_lines(result: &DeploymentResult) -> Vec<Line<'static>> {
    match result.confirmation {
        None => vec![Line::from(Span::styled(
            "Waiting for confirmation...",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(c) => {
            let block = c
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| String::from("?"));
            let status = if c.succeeded {
                Span::styled("success", Style::default().fg(Color::Green))
            } else {
                Span::styled("reverted", Style::default().fg(Color::Red))
            };
            vec![Line::from(vec![
                Span::raw(format!("Mined in block {block}, status ")),
                status,
            ])]
        }
    }
}

fn draw_info(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let rows = vec![
        Row::new(vec![String::from("Contract"), DEPLOYER_ADDRESS.to_string()]),
        Row::new(vec![
            String::from("Fee"),
            format!("{} {NATIVE_SYMBOL}", format_native(snap.fee)),
        ]),
        Row::new(vec![String::from("Estimated gas"), String::from(ESTIMATED_GAS)]),
        Row::new(vec![
            String::from("Max cost"),
            format!("{MAX_COST} {NATIVE_SYMBOL}"),
        ]),
        Row::new(vec![
            String::from("Estimated cost"),
            format!("~{ESTIMATED_COST} {NATIVE_SYMBOL}"),
        ]),
        Row::new(vec![
            String::from("Estimated remainder"),
            format!("~{ESTIMATED_REMAINDER} {NATIVE_SYMBOL}"),
        ]),
        Row::new(vec![
            String::from("Network"),
            format!("HyperEVM ({})", snap.network.required_chain_id),
        ]),
    ];
    let table = Table::new(rows, [Constraint::Length(20), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title("Deployment Info"));
    f.render_widget(table, area);
}

fn draw_success(f: &mut Frame, area: Rect, result: &DeploymentResult) {
    let hash = result
        .transaction_hash
        .map(|h| h.to_string())
        .unwrap_or_default();
    let mut lines = vec![
        Line::from(Span::styled(
            "Contract deployment submitted",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "Contract address: {}",
            result.deployed_address.as_deref().unwrap_or_default()
        )),
        Line::from(format!("Transaction: {hash}")),
        Line::from(format!("Cost: {MAX_COST} {NATIVE_SYMBOL}")),
    ];
    if let Some(url) = result.explorer_url() {
        lines.push(Line::from(format!("Explorer: {url}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("[Enter] Deploy another   [q] Quit"));
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Success"));
    f.render_widget(p, area);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let errors: Vec<Line> = snap
        .errors
        .iter()
        .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))))
        .collect();
    let p = Paragraph::new(errors)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Errors"));
    f.render_widget(p, cols[0]);

    let help = match snap.screen {
        Screen::Landing => "Enter start  q quit",
        Screen::Deploy => "Enter deploy  r refresh  b back  q quit",
        Screen::Success(_) => "Enter deploy another  q quit",
    };
    let p = Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(p, cols[1]);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    if state.mode == Mode::QuitModal {
        let area = centered_rect(40, 20, f.area());
        let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
        let p = Paragraph::new("Quit Hyperploy? (Y/N)");
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(p, block.inner(area));
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
