//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Sparkline, Wrap},
};

use crate::app::{App, EqFocus, PlaybackState};
use crate::audio::BAND_CENTERS_HZ;
use crate::config::Settings;
use crate::equalizer::{ControlValue, EqualizerController, Knob};
use crate::library::format_mmss;

/// Number of dots drawn around a knob.
pub const KNOB_DOTS: usize = 15;

/// Largest magnitude the envelope can hold; the waveform's vertical scale.
const WAVEFORM_MAX: u64 = 32768;

const FOCUS_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    [
        "[j/k] select".to_string(),
        "[enter] play".to_string(),
        "[space/p] play/pause".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{scrub_seconds}s"),
        "[tab] eq focus".to_string(),
        "[+/-] adjust".to_string(),
        "[P] preset".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// `●` for each active dot, `○` for the rest; `ceil(percent * 15)` are active.
pub fn knob_dots(percent: ControlValue) -> String {
    let active = ((percent.get() * KNOB_DOTS as f32).ceil() as usize).min(KNOB_DOTS);
    let mut dots = "●".repeat(active);
    dots.push_str(&"○".repeat(KNOB_DOTS - active));
    dots
}

/// Horizontal slider of `width` cells filled in proportion to `position/max`.
pub fn slider_bar(position: u32, max: u32, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((position as u64 * width as u64 + max as u64 / 2) / max as u64) as usize
    };
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Millibels as signed decibels, one decimal.
pub fn format_db(millibels: i32) -> String {
    format!("{:+.1} dB", millibels as f32 / 100.0)
}

fn band_label(band: usize) -> String {
    match BAND_CENTERS_HZ.get(band) {
        Some(&hz) if hz >= 1000.0 => format!("{:>5}", format!("{}k", hz / 1000.0)),
        Some(&hz) => format!("{:>5}", hz as u32),
        None => format!("{:>5}", format!("B{}", band + 1)),
    }
}

fn now_playing_line(app: &App) -> Line<'static> {
    let state = match app.playback {
        PlaybackState::Playing => "▶",
        PlaybackState::Paused => "⏸",
        PlaybackState::Stopped => "■",
    };
    let Some(track) = app.now_playing_track() else {
        return Line::from(format!("{state} nothing loaded"));
    };
    let time = format!(
        "{} / {}",
        format_mmss(app.position.as_millis() as u64),
        format_mmss(app.duration.as_millis() as u64)
    );
    Line::from(vec![
        Span::raw(format!("{state} ")),
        Span::styled(track.title.clone(), Style::new().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" - {}  ", track.artist)),
        Span::styled(time, Style::new().fg(Color::Cyan)),
    ])
}

fn draw_track_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let marker = if app.now_playing == Some(i) { "♪ " } else { "  " };
            ListItem::new(format!("{marker}{}", t.display()))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" tracks "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if app.has_tracks() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_waveform(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" waveform ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(envelope) = app.envelope.as_ref() else {
        let msg = match (app.now_playing, app.waveform_loading) {
            (Some(_), true) => "extracting waveform…",
            (Some(_), false) => "no waveform available",
            (None, _) => "",
        };
        frame.render_widget(
            Paragraph::new(msg)
                .alignment(Alignment::Center)
                .style(Style::new().fg(Color::DarkGray)),
            inner,
        );
        return;
    };

    let columns = envelope.resample(inner.width as usize);
    let played = ((app.progress_ratio() * columns.len() as f64).round() as usize).min(columns.len());
    let (done, rest) = columns.split_at(played);

    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(played as u16), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(
        Sparkline::default()
            .data(done.to_vec())
            .max(WAVEFORM_MAX)
            .style(Style::new().fg(Color::Cyan)),
        parts[0],
    );
    frame.render_widget(
        Sparkline::default()
            .data(rest.to_vec())
            .max(WAVEFORM_MAX)
            .style(Style::new().fg(Color::DarkGray)),
        parts[1],
    );
}

fn draw_equalizer(frame: &mut Frame, app: &App, eq: &EqualizerController, area: Rect) {
    let title = format!(" equalizer · {} ", eq.preset_name());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1));

    if !eq.is_enabled() {
        let msg = Paragraph::new("equalizer unavailable for this session")
            .style(Style::new().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let bar_width = (area.width as usize).saturating_sub(24).clamp(4, 40);
    for band in 0..eq.band_count() {
        let focused = app.eq_focus == EqFocus::Band(band);
        let position = eq.slider_position(band).unwrap_or(0);
        let level = eq.band_level(band).unwrap_or(0);
        let text = format!(
            "{} {} {}",
            band_label(band),
            slider_bar(position, eq.slider_max(), bar_width),
            format_db(level)
        );
        lines.push(if focused {
            Line::styled(text, FOCUS_STYLE)
        } else {
            Line::raw(text)
        });
    }

    for (knob, name, focus) in [
        (Knob::Treble, "treble", EqFocus::Treble),
        (Knob::Bass, "  bass", EqFocus::Bass),
    ] {
        let text = format!(
            "{name} {} {:+.0}°",
            knob_dots(eq.knob(knob)),
            eq.knob_angle(knob)
        );
        lines.push(if app.eq_focus == focus {
            Line::styled(text, FOCUS_STYLE)
        } else {
            Line::raw(text)
        });
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App, eq: &EqualizerController, settings: &Settings) {
    let eq_height = eq.band_count().max(1) as u16 + 4;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(eq_height),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" wavedial ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let now_playing = Paragraph::new(now_playing_line(app)).block(
        Block::bordered()
            .padding(Padding::horizontal(1))
            .title(" now playing "),
    );
    frame.render_widget(now_playing, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    draw_track_list(frame, app, middle[0]);
    draw_waveform(frame, app, middle[1]);

    draw_equalizer(frame, app, eq, chunks[3]);

    let mut footer_lines = vec![Line::raw(controls_text(settings.playback.scrub_seconds))];
    if let Some(status) = &app.status {
        footer_lines.push(Line::styled(status.clone(), Style::new().fg(Color::Red)));
    }
    let footer = Paragraph::new(footer_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
