use crate::app::App;
use globe_view::canvas::{rgb_channels, Canvas};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_globe(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.theme_name()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(GlobeWidget { canvas: &app.canvas }, inner);
}

/// Blits the pixel canvas as half-block cells: '▀' whose foreground is the
/// upper pixel row and background the lower one, two rows per cell.
struct GlobeWidget<'a> {
    canvas: &'a Canvas,
}

fn cell_color(pixel: u32) -> Color {
    let (r, g, b) = rgb_channels(pixel);
    Color::Rgb(r, g, b)
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            let top_y = row as usize * 2;
            if top_y >= self.canvas.height() {
                break;
            }
            let top = self.canvas.row(top_y);
            let bottom = if top_y + 1 < self.canvas.height() {
                Some(self.canvas.row(top_y + 1))
            } else {
                None
            };
            for col in 0..area.width {
                let x = col as usize;
                if x >= self.canvas.width() {
                    break;
                }
                let upper = top[x];
                let lower = bottom.map_or(0, |r| r[x]);
                // Leave untouched pixels on the terminal's own background.
                if upper == 0 && lower == 0 {
                    continue;
                }
                buf[(area.x + col, area.y + row)]
                    .set_char('▀')
                    .set_fg(cell_color(upper))
                    .set_bg(cell_color(lower));
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let renderer = &app.renderer;

    let toggle = |on: bool, text: &'static str| {
        Span::styled(
            text,
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Radius: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.radius_label(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("L{}", app.frame.level), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        // Toggle indicators
        toggle(renderer.show_coastlines, "[1]coast "),
        toggle(renderer.show_lakes, "[2]lakes "),
        toggle(renderer.show_rivers, "[3]rivers "),
        toggle(renderer.show_borders, "[4]borders "),
        toggle(renderer.show_graticule, "[5]grid "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!(" | {} tiles", app.frame.resident_tiles),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if app.frame.pending_tiles > 0 {
        spans.push(Span::styled(
            format!(" ({} pending)", app.frame.pending_tiles),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        " | drag/hjkl:pan +/-:zoom t:theme g:home q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(Line::from(spans));
    frame.render_widget(paragraph, area);
}
