use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
};

use crate::app::{AdminFocus, App, LoginField, Screen, VocabForm};
use crate::flashcard::Face;
use crate::models::LEVEL_COUNT;
use crate::quiz::QuizRound;

pub fn draw(frame: &mut Frame, app: &App) {
    if app.session.loading {
        draw_splash(frame);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    match app.screen {
        Screen::SignIn => draw_sign_in(frame, app, chunks[0]),
        Screen::Home => draw_home(frame, app, chunks[0]),
        Screen::Flashcards => draw_flashcards(frame, app, chunks[0]),
        Screen::Quiz => draw_quiz(frame, app, chunks[0]),
        Screen::Admin => draw_admin(frame, app, chunks[0]),
    }
    draw_status_bar(frame, app, chunks[1]);

    if app.screen == Screen::Admin && app.admin.confirm_delete.is_some() {
        draw_confirm(frame, app);
    }
    if let Some(alert) = &app.alert {
        draw_alert(frame, alert);
    }
}

fn draw_splash(frame: &mut Frame) {
    let area = centered_rect(40, 20, frame.area());
    let splash = Paragraph::new("Connecting...")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" HSK Trainer "));
    frame.render_widget(splash, area);
}

fn draw_sign_in(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(50, 50, area);
    let title = if app.login.registering {
        " Sign Up "
    } else {
        " Sign In "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let masked = "*".repeat(app.login.password.chars().count());
    let mut lines = vec![
        Line::from(""),
        field_line("Email", &app.login.email, app.login.field == LoginField::Email),
        Line::from(""),
        field_line(
            "Password",
            &masked,
            app.login.field == LoginField::Password,
        ),
        Line::from(""),
    ];
    if let Some(error) = &app.login.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }
    let toggle_hint = if app.login.registering {
        "Ctrl+R back to sign-in"
    } else {
        "Ctrl+R create an account"
    };
    lines.push(Line::from(Span::styled(
        toggle_hint,
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line(label: &str, value: &str, active: bool) -> Line<'static> {
    if active {
        Line::from(Span::styled(
            format!("{}: {}█", label, value),
            Style::default().fg(Color::Cyan),
        ))
    } else {
        Line::from(format!("{}: {}", label, value))
    }
}

fn draw_home(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let email = app
        .session
        .current_user
        .as_ref()
        .map(|u| u.email.as_str())
        .unwrap_or("-");
    let mut greeting = vec![Line::from(format!("Welcome, {}", email))];
    if let Some(error) = &app.home_error {
        greeting.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    let header = Paragraph::new(greeting)
        .block(Block::default().borders(Borders::ALL).title(" HSK Trainer "));
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = (1..=LEVEL_COUNT as u8)
        .map(|level| {
            let count = app.groups.count(level);
            let selected = level == app.selected_level;
            let style = if selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if count == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let marker = if selected { ">" } else { " " };
            ListItem::new(format!("{} HSK {}  -  {} words", marker, level, count)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Levels "));
    frame.render_widget(list, chunks[1]);
}

fn draw_flashcards(frame: &mut Frame, app: &App, area: Rect) {
    let Some(deck) = &app.flashcards else {
        return;
    };

    if deck.is_empty() {
        let empty = Paragraph::new("No words to study. Press Esc to go back.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Flashcards "));
        frame.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(7)])
        .split(area);

    let (position, total) = deck.progress();
    let header = Paragraph::new(format!(
        "HSK {} Flashcards  -  {} / {}",
        deck.level(),
        position,
        total
    ));
    frame.render_widget(header, chunks[0]);

    let card = centered_rect(60, 60, chunks[1]);
    let (title, lines) = match (deck.current(), deck.face()) {
        (Some(entry), Face::Front) => (
            " Hanzi ",
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    entry.hanzi.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "space to flip",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        ),
        (Some(entry), Face::Back) => (
            " Meaning ",
            vec![
                Line::from(""),
                Line::from(entry.pinyin.clone()),
                Line::from(Span::styled(
                    entry.meaning.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ],
        ),
        (None, _) => (" Flashcards ", Vec::new()),
    };
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, card);
}

fn draw_quiz(frame: &mut Frame, app: &App, area: Rect) {
    let Some(quiz) = &app.quiz else {
        return;
    };

    if quiz.is_empty() {
        let empty = Paragraph::new("No words to quiz. Press Esc to go back.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Quiz "));
        frame.render_widget(empty, area);
        return;
    }

    if quiz.is_finished() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Quiz complete!",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Score: {} / {}", quiz.score(), quiz.len())),
            Line::from(""),
            Line::from(Span::styled(
                "r restart | Esc home",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let done = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" HSK {} Quiz ", quiz.level())),
        );
        frame.render_widget(done, centered_rect(50, 50, area));
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(6),
        ])
        .split(area);

    let (current, total) = quiz.progress();
    let header = Paragraph::new(format!(
        "HSK {} Quiz  -  Question {} / {}  -  Score {}",
        quiz.level(),
        current,
        total,
        quiz.score()
    ));
    frame.render_widget(header, chunks[0]);

    let (hanzi, pinyin) = quiz
        .current()
        .map(|e| (e.hanzi.clone(), e.pinyin.clone()))
        .unwrap_or_default();
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            hanzi,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(pinyin),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" What does this mean? "),
    );
    frame.render_widget(card, chunks[1]);

    let items: Vec<ListItem> = quiz
        .options()
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            ListItem::new(format!("{}. {}", idx + 1, option)).style(option_style(quiz, idx))
        })
        .collect();
    let options = List::new(items).block(Block::default().borders(Borders::ALL).title(" Answers "));
    frame.render_widget(options, chunks[2]);
}

/// Once a selection exists the correct option is highlighted, a wrong
/// pick is marked, and the rest recede.
fn option_style(quiz: &QuizRound, idx: usize) -> Style {
    let Some(selected) = quiz.selected() else {
        return Style::default();
    };
    if quiz.option_is_correct(idx) {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if idx == selected {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_admin(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let header = match &app.admin.status {
        Some(status) => {
            Paragraph::new(Span::styled(status.clone(), Style::default().fg(Color::Red)))
        }
        None if app.admin.loading => Paragraph::new("Admin  -  loading words..."),
        None => Paragraph::new(format!("Admin  -  {} words", app.admin.entries.len())),
    };
    frame.render_widget(header, chunks[0]);

    let header_row = Row::new(vec!["Hanzi", "Pinyin", "Meaning", "HSK"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .admin
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let style = if idx == app.admin.selected && app.admin.focus == AdminFocus::List {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Row::new(vec![
                entry.hanzi.clone(),
                entry.pinyin.clone(),
                entry.meaning.clone(),
                entry.hsk.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(45),
            Constraint::Percentage(10),
        ],
    )
    .header(header_row)
    .block(Block::default().borders(Borders::ALL).title(" Vocabulary "));
    frame.render_widget(table, chunks[1]);

    match app.admin.focus {
        AdminFocus::Form => draw_vocab_form(frame, app),
        AdminFocus::ImportPath => draw_import_prompt(frame, app),
        AdminFocus::List => {}
    }
}

fn draw_vocab_form(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);

    let title = if app.admin.editing_id.is_some() {
        " Edit Word "
    } else {
        " Add Word "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            (0..=VocabForm::FIELD_COUNT)
                .map(|_| Constraint::Length(2))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for idx in 0..VocabForm::FIELD_COUNT {
        let label = VocabForm::field_label(idx);
        let value = app.admin.form.field_value(idx);
        let active = idx == app.admin.form.field;
        // Hanzi and meaning are required.
        let marker = if matches!(idx, 0 | 2) { "*" } else { " " };

        let style = if active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let display = if active {
            format!("{}{}: {}█", marker, label, value)
        } else {
            format!("{}{}: {}", marker, label, value)
        };
        frame.render_widget(Paragraph::new(display).style(style), chunks[idx]);
    }

    let hint = Paragraph::new("Enter next/submit | Tab next | Esc cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, chunks[VocabForm::FIELD_COUNT]);
}

fn draw_import_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Import CSV ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = if app.admin.uploading {
        vec![Line::from(""), Line::from("Uploading...")]
    } else {
        vec![
            Line::from(""),
            Line::from(format!("File path: {}█", app.admin.import_path)),
            Line::from(""),
            Line::from(Span::styled(
                "Columns: hanzi, pinyin, meaning, hsk",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Enter import | Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ]
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_confirm(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);

    let word = app
        .admin
        .confirm_delete
        .and_then(|id| app.admin.entries.iter().find(|e| e.id == id))
        .map(|e| e.hanzi.clone())
        .unwrap_or_else(|| "this word".to_string());

    let text = vec![
        Line::from(""),
        Line::from(format!("Delete {}?", word)),
        Line::from(""),
        Line::from(Span::styled(
            "(y)es / (n)o",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(
        Paragraph::new(text).block(block).alignment(Alignment::Center),
        area,
    );
}

fn draw_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(" Notice ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hints = match app.screen {
        Screen::SignIn => "Tab field | Enter submit | Ctrl+R sign-in/sign-up | Ctrl+C quit",
        Screen::Home => {
            if app.session.is_admin {
                "1-6 level | f flashcards | t quiz | a admin | l logout | q quit"
            } else {
                "1-6 level | f flashcards | t quiz | l logout | q quit"
            }
        }
        Screen::Flashcards => "space flip | n/p card | Esc home",
        Screen::Quiz => "1-4 answer | r restart | Esc home",
        Screen::Admin => "j/k move | a add | e edit | d delete | i import | l logout | Esc home",
    };
    let status = Paragraph::new(hints).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
