//! Month-grouped HTML listing renderer.
//!
//! Produces a single self-contained `index.html`: a header with the entry
//! count, a "Jump to" anchor row, and one section per calendar month with
//! the newest month first.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use readstack_shared::{Article, SiteBundle};

const PAGE_TITLE: &str = "Reading list";
const DATE_FORMAT: &str = "%Y-%m-%d";

struct MonthGroup<'a> {
    year: i32,
    month: u32,
    entries: Vec<&'a Article>,
}

impl MonthGroup<'_> {
    fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    fn anchor(&self) -> String {
        format!("{}-{}", month_name(self.month).to_lowercase(), self.year)
    }

    fn short_label(&self) -> String {
        format!("{} {}", &month_name(self.month)[..3], self.year)
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Group articles by calendar month, newest month first, entries within a
/// month newest first.
fn group_by_month(articles: &[Article]) -> Vec<MonthGroup<'_>> {
    let mut by_month: BTreeMap<(i32, u32), Vec<&Article>> = BTreeMap::new();
    for article in articles {
        by_month
            .entry((article.date.year(), article.date.month()))
            .or_default()
            .push(article);
    }

    let mut groups: Vec<MonthGroup<'_>> = by_month
        .into_iter()
        .map(|((year, month), mut entries)| {
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            MonthGroup {
                year,
                month,
                entries,
            }
        })
        .collect();
    groups.reverse();
    groups
}

/// Render the full listing page into a publishable bundle.
pub fn render_site(articles: &[Article]) -> SiteBundle {
    let groups = group_by_month(articles);

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    page.push_str(&format!("<title>{}</title>\n", encode_text(PAGE_TITLE)));
    page.push_str(
        "<style>body { font-family: sans-serif; font-size: 1.1rem; padding: 1em; } \
         .secondary { color: #555; }</style>\n",
    );
    page.push_str("</head>\n<body>\n");
    page.push_str(&format!("<h1>{}</h1>\n", encode_text(PAGE_TITLE)));
    page.push_str(&format!(
        "<p>There are currently {} entries in the list.<br>Last modified {}.</p>\n",
        articles.len(),
        Utc::now().format(DATE_FORMAT)
    ));

    if !groups.is_empty() {
        let links: Vec<String> = groups
            .iter()
            .map(|group| {
                format!(
                    "<a href=\"#{}\">{}</a>",
                    group.anchor(),
                    encode_text(&group.short_label())
                )
            })
            .collect();
        page.push_str(&format!(
            "<span>Jump to :: {}</span>\n<hr>\n",
            links.join(" :: ")
        ));
    }

    for group in &groups {
        page.push_str(&format!(
            "<h3 id=\"{}\">{}</h3>\n<ul>\n",
            group.anchor(),
            encode_text(&group.title())
        ));
        for article in &group.entries {
            page.push_str(&render_entry(article));
        }
        page.push_str("</ul>\n");
    }

    page.push_str("</body>\n</html>\n");

    let mut bundle = SiteBundle::new();
    bundle.add_file("index.html", page.into_bytes());
    bundle
}

fn render_entry(article: &Article) -> String {
    let mut line = format!(
        "<li><a href=\"{}\">{}</a> - {}",
        encode_double_quoted_attribute(&article.url),
        encode_text(&article.title),
        article.date.format(DATE_FORMAT)
    );
    if let Some(discussion) = &article.discussion_url {
        line.push_str(&format!(
            " - <a href=\"{}\" rel=\"noopener\" title=\"View on Hacker News\">HN</a>",
            encode_double_quoted_attribute(discussion)
        ));
    }
    if !article.description.is_empty() {
        line.push_str(&format!(
            " - <span class=\"secondary\">{}</span>",
            encode_text(&article.description)
        ));
    }
    line.push_str("</li>\n");
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use readstack_shared::ArticleId;

    fn article(title: &str, date: &str) -> Article {
        Article {
            id: ArticleId::new(),
            url: "https://example.com/post".into(),
            title: title.into(),
            description: String::new(),
            image_url: String::new(),
            date: DateTime::parse_from_rfc3339(date)
                .expect("test date")
                .with_timezone(&Utc),
            discussion_url: None,
            is_favourite: false,
        }
    }

    fn rendered(articles: &[Article]) -> String {
        let bundle = render_site(articles);
        assert_eq!(bundle.files.len(), 1);
        assert_eq!(bundle.files[0].path, "index.html");
        String::from_utf8(bundle.files[0].content.clone()).expect("utf-8 page")
    }

    #[test]
    fn newest_month_comes_first() {
        let page = rendered(&[
            article("Old", "2026-07-10T10:00:00Z"),
            article("New", "2026-08-10T10:00:00Z"),
        ]);

        let august = page.find("August 2026").expect("august section");
        let july = page.find("July 2026").expect("july section");
        assert!(august < july);
        assert!(page.contains("id=\"august-2026\""));
        assert!(page.contains("Jump to :: Aug 2026 :: Jul 2026"));
    }

    #[test]
    fn entries_within_a_month_are_newest_first() {
        let page = rendered(&[
            article("Earlier", "2026-08-05T10:00:00Z"),
            article("Later", "2026-08-20T10:00:00Z"),
        ]);
        assert!(page.find("Later").expect("later") < page.find("Earlier").expect("earlier"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut sneaky = article("<script>alert(1)</script>", "2026-08-10T10:00:00Z");
        sneaky.description = "a < b".into();
        let page = rendered(&[sneaky]);

        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("a &lt; b"));
    }

    #[test]
    fn discussion_link_is_rendered_when_present() {
        let mut with_link = article("Linked", "2026-08-10T10:00:00Z");
        with_link.discussion_url = Some("https://news.ycombinator.com/item?id=42".into());
        let page = rendered(&[with_link, article("Plain", "2026-08-11T10:00:00Z")]);

        assert!(page.contains("https://news.ycombinator.com/item?id=42"));
        assert_eq!(page.matches(">HN</a>").count(), 1);
    }

    #[test]
    fn empty_list_renders_without_sections() {
        let page = rendered(&[]);
        assert!(page.contains("0 entries"));
        assert!(!page.contains("Jump to"));
    }
}
