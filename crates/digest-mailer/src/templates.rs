use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};
use newsletter_core::CandidateItem;

/// Only http(s) links are rendered as anchors.
fn safe_link(url: Option<&str>) -> Option<&str> {
    url.map(str::trim)
        .filter(|u| u.starts_with("https://") || u.starts_with("http://"))
}

pub struct DigestTemplate {
    brand: String,
    unsubscribe_address: Option<String>,
}

impl DigestTemplate {
    pub fn new(brand: impl Into<String>, unsubscribe_address: Option<String>) -> Self {
        Self {
            brand: brand.into(),
            unsubscribe_address,
        }
    }

    pub fn subject(&self, date: NaiveDate) -> String {
        format!("{} {} Newsletter", date.format("%m/%d"), self.brand)
    }

    fn render_item(item: &CandidateItem) -> String {
        let title = encode_text(&item.title);
        let title_html = match safe_link(item.real_url.as_deref()) {
            Some(url) => format!(
                r#"<a href="{}" style="color:#2d3748;text-decoration:none;">{title}</a>"#,
                encode_double_quoted_attribute(url)
            ),
            None => title.into_owned(),
        };
        format!(
            r#"<tr><td style="padding:0 30px 20px;">
  <div style="border:1px solid #e2e8f0;border-radius:12px;padding:25px;">
    <span style="display:inline-block;background:#3182ce;color:#fff;padding:4px 12px;border-radius:20px;font-size:12px;font-weight:600;letter-spacing:0.5px;">{ticker}</span>
    <div style="font-size:18px;font-weight:600;color:#2d3748;margin:12px 0 15px;line-height:1.4;">{title_html}</div>
    <div style="color:#4a5568;font-size:14px;line-height:1.6;background:#f7fafc;padding:15px;border-radius:8px;border-left:4px solid #4299e1;">{summary}</div>
  </div>
</td></tr>"#,
            ticker = encode_text(&item.ticker),
            summary = encode_text(item.summary.as_deref().unwrap_or_default()),
        )
    }

    /// Render the digest body for one subscriber.
    pub fn render(&self, user_name: &str, items: &[CandidateItem], date: NaiveDate) -> String {
        let cards: String = items.iter().map(Self::render_item).collect();

        let unsubscribe = self
            .unsubscribe_address
            .as_deref()
            .map(|addr| {
                format!(
                    r#"<p style="margin:15px 0 0;font-size:12px;">To unsubscribe, <a href="mailto:{}?subject=Unsubscribe" style="color:#4299e1;text-decoration:none;">click here</a>.</p>"#,
                    encode_double_quoted_attribute(addr)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"><title>{brand} Newsletter</title></head>
<body style="margin:0;padding:0;background:#f8fafc;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;line-height:1.6;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f8fafc;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;box-shadow:0 10px 25px rgba(0,0,0,0.1);">
      <tr><td style="background:#667eea;padding:40px 30px;text-align:center;color:#fff;">
        <h1 style="margin:0 0 8px;font-size:28px;font-weight:700;">{brand} Newsletter</h1>
        <div style="font-size:16px;opacity:0.9;">{date}</div>
      </td></tr>
      <tr><td style="padding:30px;border-bottom:1px solid #e2e8f0;">
        <h2 style="margin:0;font-size:20px;color:#2d3748;font-weight:500;">Hello, {name}!</h2>
        <p style="margin:10px 0 0;color:#718096;">Here is today's summary of the news you follow.</p>
      </td></tr>
      <tr><td style="height:20px;"></td></tr>
      {cards}
      <tr><td style="background:#2d3748;padding:30px;text-align:center;color:#a0aec0;">
        <p style="margin:0;font-size:14px;"><strong>{brand} Newsletter</strong></p>
        {unsubscribe}
      </td></tr>
    </table>
  </td></tr>
</table>
</body>
</html>"#,
            brand = encode_text(&self.brand),
            date = date.format("%Y-%m-%d"),
            name = encode_text(user_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    #[test]
    fn test_subject() {
        let template = DigestTemplate::new("FinanceFlow", None);
        assert_eq!(template.subject(date()), "06/03 FinanceFlow Newsletter");
    }

    #[test]
    fn test_render_lists_items_in_order() {
        let template = DigestTemplate::new("FinanceFlow", Some("news@example.com".into()));
        let items = vec![
            CandidateItem::new("AAPL", "Apple first")
                .with_summary("apple summary")
                .with_url("https://news.example.com/a"),
            CandidateItem::new("TSLA", "Tesla second").with_summary("tesla summary"),
        ];
        let html = template.render("Kim", &items, date());

        assert!(html.contains("Hello, Kim!"));
        assert!(html.contains("2025-06-03"));
        assert!(html.contains(r#"<a href="https://news.example.com/a""#));
        assert!(html.contains("mailto:news@example.com?subject=Unsubscribe"));
        let first = html.find("Apple first").unwrap();
        let second = html.find("Tesla second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_missing_url_renders_plain_title() {
        let template = DigestTemplate::new("FinanceFlow", None);
        let items = vec![CandidateItem::new("TSLA", "No link").with_summary("s")];
        let html = template.render("Lee", &items, date());
        assert!(html.contains("No link"));
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn test_untrusted_text_is_escaped() {
        let template = DigestTemplate::new("FinanceFlow", None);
        let items = vec![CandidateItem::new("AT&T", "<script>alert(1)</script>")
            .with_summary("\"quoted\" & <b>bold</b>")
            .with_url("javascript:alert(1)")];
        let html = template.render("<Kim>", &items, date());

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("AT&amp;T"));
        assert!(html.contains("\"quoted\" &amp; &lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("Hello, &lt;Kim&gt;!"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_link_is_attribute_escaped() {
        let template = DigestTemplate::new("FinanceFlow", None);
        let items = vec![CandidateItem::new("AAPL", "Quoted link")
            .with_summary("s")
            .with_url(r#"https://news.example.com/?q="x"&p=1"#)];
        let html = template.render("Kim", &items, date());
        assert!(html.contains(r#"href="https://news.example.com/?q=&quot;x&quot;&amp;p=1""#));
    }
}
