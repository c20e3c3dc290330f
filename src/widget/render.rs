//! HTML widget and embed script generation.

use super::Theme;
use crate::models::StatsSnapshot;

/// Iframe height used by the embed script, in pixels.
const EMBED_HEIGHT: u32 = 260;

/// Presentation options for one widget render.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub title: String,
    pub theme: Theme,
    /// Seconds between automatic page reloads, if any.
    pub refresh_seconds: Option<u64>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            title: "Bounty Board Stats".to_string(),
            theme: Theme::default(),
            refresh_seconds: None,
        }
    }
}

/// Generate a self-contained HTML page showing `snapshot`.
pub fn generate_widget_html(snapshot: &StatsSnapshot, options: &WidgetOptions) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"utf-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if let Some(secs) = options.refresh_seconds {
        output.push_str(&format!("<meta http-equiv=\"refresh\" content=\"{}\">\n", secs));
    }
    output.push_str(&format!("<title>{}</title>\n", escape_html(&options.title)));
    output.push_str(&generate_style(options.theme));
    output.push_str("</head>\n<body>\n");

    output.push_str(&format!(
        "<div class=\"widget\" data-theme=\"{}\">\n",
        options.theme
    ));
    output.push_str(&format!("<h2>{}</h2>\n", escape_html(&options.title)));
    output.push_str(&generate_stats_grid(snapshot));
    output.push_str(&generate_footer(snapshot));
    output.push_str("</div>\n</body>\n</html>\n");

    output
}

/// Generate the stylesheet for `theme`.
fn generate_style(theme: Theme) -> String {
    let p = theme.palette();
    format!(
        "<style>\n\
         body {{ margin: 0; background: {bg}; color: {text}; \
         font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}\n\
         .widget {{ padding: 16px; }}\n\
         h2 {{ margin: 0 0 12px; font-size: 16px; }}\n\
         .grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(120px, 1fr)); gap: 8px; }}\n\
         .stat {{ background: {surface}; border: 1px solid {border}; border-radius: 6px; padding: 10px; }}\n\
         .value {{ font-size: 20px; font-weight: 600; color: {accent}; }}\n\
         .label {{ font-size: 12px; color: {muted}; margin-top: 2px; }}\n\
         .footer {{ margin-top: 10px; font-size: 11px; color: {muted}; }}\n\
         </style>\n",
        bg = p.background,
        text = p.text,
        surface = p.surface,
        border = p.border,
        accent = p.accent,
        muted = p.muted,
    )
}

/// Generate the grid of stat tiles.
fn generate_stats_grid(snapshot: &StatsSnapshot) -> String {
    let tiles = [
        (snapshot.completed_today.to_string(), "Completed today"),
        (snapshot.completed_week.to_string(), "Completed this week"),
        (snapshot.completed_month.to_string(), "Completed this month"),
        (
            format!("${}", format_amount(snapshot.total_usdc_paid)),
            "USDC paid",
        ),
        (
            format!("{:.1}h", snapshot.avg_completion_hours),
            "Avg. completion time",
        ),
        (format!("{}%", snapshot.success_rate), "Success rate"),
        (
            format!("{} / {}", snapshot.active_bounties, snapshot.total_bounties),
            "Active / total bounties",
        ),
    ];

    let mut section = String::new();
    section.push_str("<div class=\"grid\">\n");
    for (value, label) in tiles {
        section.push_str(&format!(
            "<div class=\"stat\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>\n",
            escape_html(&value),
            label
        ));
    }
    section.push_str("</div>\n");

    section
}

fn generate_footer(snapshot: &StatsSnapshot) -> String {
    format!(
        "<div class=\"footer\">Updated <time datetime=\"{}\">{}</time></div>\n",
        snapshot.last_updated.to_rfc3339(),
        snapshot.last_updated.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Generate the script-tag loader that injects the widget iframe.
///
/// `base_url` is the public URL of this service, without a trailing slash.
pub fn generate_embed_script(base_url: &str, theme: Theme, title: &str) -> String {
    let src = format!("{}/widget?theme={}", base_url.trim_end_matches('/'), theme);

    // JSON string literals are valid JavaScript string literals.
    let src = serde_json::Value::from(src).to_string();
    let title = serde_json::Value::from(title).to_string();

    format!(
        r#"(function () {{
  var script = document.currentScript;
  var iframe = document.createElement("iframe");
  iframe.src = {src};
  iframe.title = {title};
  iframe.width = "100%";
  iframe.height = "{height}";
  iframe.style.border = "0";
  iframe.setAttribute("loading", "lazy");
  if (script && script.parentNode) {{
    script.parentNode.insertBefore(iframe, script.nextSibling);
  }} else {{
    document.body.appendChild(iframe);
  }}
}})();
"#,
        src = src,
        title = title,
        height = EMBED_HEIGHT
    )
}

/// Format an amount with thousands separators and two decimals.
fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_snapshot() -> StatsSnapshot {
        StatsSnapshot {
            completed_today: 3,
            completed_week: 12,
            completed_month: 40,
            total_usdc_paid: 15234.5,
            avg_completion_hours: 6.25,
            success_rate: 87,
            total_bounties: 120,
            active_bounties: 18,
            last_updated: Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_widget_html() {
        let html = generate_widget_html(&create_test_snapshot(), &WidgetOptions::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Bounty Board Stats</h2>"));
        assert!(html.contains("$15,234.50"));
        assert!(html.contains("87%"));
        assert!(html.contains("18 / 120"));
        assert!(html.contains("2024-06-15 12:30 UTC"));
        assert!(html.contains("data-theme=\"light\""));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_widget_theme_and_refresh() {
        let options = WidgetOptions {
            theme: Theme::Dark,
            refresh_seconds: Some(300),
            ..WidgetOptions::default()
        };
        let html = generate_widget_html(&create_test_snapshot(), &options);

        assert!(html.contains(Theme::Dark.palette().background));
        assert!(html.contains("data-theme=\"dark\""));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"300\">"));
    }

    #[test]
    fn test_widget_escapes_title() {
        let options = WidgetOptions {
            title: "<script>alert(1)</script>".to_string(),
            ..WidgetOptions::default()
        };
        let html = generate_widget_html(&create_test_snapshot(), &options);

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_generate_embed_script() {
        let js = generate_embed_script("https://stats.example.com/", Theme::Dark, "Our \"Bounties\"");

        assert!(js.contains(r#"iframe.src = "https://stats.example.com/widget?theme=dark";"#));
        assert!(js.contains(r#"iframe.title = "Our \"Bounties\"";"#));
        assert!(js.contains("document.currentScript"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-2500.0), "-2,500.00");
    }
}
