use noteviewapp::api::NoteViewApi;
use noteviewapp::document::{DocumentContext, FileInfo};
use noteviewapp::error::Result;
use noteviewapp::filters::apply_filter_chain;
use noteviewapp::host::{MarkdownRenderer, NoLinks};
use noteviewapp::markdown::PulldownRenderer;
use noteviewapp::rules::{matches, Condition, Filter, FilterGroup, GroupOperator, Operator};
use noteviewapp::settings::Settings;
use noteviewapp::template::render_template;
use noteviewapp::value::FilterValue;
use noteviewapp::vault::FsVault;
use noteviewapp::views::{move_view, ViewConfig};
use serde_json::json;
use std::cell::RefCell;
use std::fs;
use tempfile::TempDir;

/// Records what it was asked to render and echoes it back in a paragraph.
#[derive(Default)]
struct EchoRenderer {
    seen: RefCell<Vec<String>>,
}

impl MarkdownRenderer for EchoRenderer {
    async fn render_markdown(&self, markdown: &str, _source_path: &str) -> Result<String> {
        self.seen.borrow_mut().push(markdown.to_string());
        Ok(format!("<p>md:{}</p>", markdown))
    }
}

fn movie() -> DocumentContext {
    DocumentContext::new(
        FileInfo::from_path("Movies/Heat.md").with_times(1_710_491_400_000, 1_710_540_600_000),
    )
    .with_frontmatter("cover", "[[heat.jpg]]")
    .with_frontmatter("genres", json!(["xa", "yb"]))
    .with_body_tag("#movies/action")
}

fn leaf(field: &str, op: Operator, value: &str) -> FilterGroup {
    FilterGroup::and().with_filter(Filter::new(field, op, value))
}

#[test]
fn test_empty_groups_are_vacuously_true() {
    let doc = movie();
    for op in [GroupOperator::And, GroupOperator::Or, GroupOperator::Nor] {
        let deep = FilterGroup::new(op).with_group(FilterGroup::new(op).with_group(FilterGroup::new(op)));
        assert!(matches(&FilterGroup::new(op), &doc, &NoLinks));
        assert!(matches(&deep, &doc, &NoLinks), "{:?} nested", op);
    }
}

#[test]
fn test_nor_negates_or_for_non_empty_groups() {
    let doc = movie();
    let sets = [
        vec![Filter::new("genres", Operator::Contains, "xa")],
        vec![Filter::new("genres", Operator::Contains, "zz")],
        vec![
            Filter::new("genres", Operator::Contains, "zz"),
            Filter::new("file.basename", Operator::Is, "Heat"),
        ],
    ];
    for filters in sets {
        let conditions: Vec<Condition> = filters.into_iter().map(Condition::Filter).collect();
        let or = FilterGroup {
            operator: GroupOperator::Or,
            conditions: conditions.clone(),
        };
        let nor = FilterGroup {
            operator: GroupOperator::Nor,
            conditions,
        };
        assert_eq!(matches(&nor, &doc, &NoLinks), !matches(&or, &doc, &NoLinks));
    }
}

#[test]
fn test_contains_all_and_any_of() {
    let both = movie();
    let one = DocumentContext::new(FileInfo::from_path("x.md")).with_frontmatter("genres", json!(["xa"]));

    let all = leaf("genres", Operator::ContainsAllOf, "a,b");
    let any = leaf("genres", Operator::ContainsAnyOf, "a,b");
    assert!(matches(&all, &both, &NoLinks));
    assert!(!matches(&all, &one, &NoLinks));
    assert!(matches(&any, &one, &NoLinks));
}

#[test]
fn test_ctime_on_ignores_time_of_day() {
    let morning = movie();
    let evening = DocumentContext::new(
        FileInfo::from_path("b.md").with_times(1_710_540_600_000, 0),
    );
    let rule = leaf("file.ctime", Operator::On, "2024-03-15");
    assert!(matches(&rule, &morning, &NoLinks));
    assert!(matches(&rule, &evening, &NoLinks));
    assert!(!matches(&leaf("file.ctime", Operator::On, "2024-03-16"), &morning, &NoLinks));
}

#[test]
fn test_has_tag_is_hierarchical() {
    let doc = movie();
    assert!(matches(&leaf("file", Operator::HasTag, "movies"), &doc, &NoLinks));
    assert!(matches(&leaf("file", Operator::HasTag, "movies/action"), &doc, &NoLinks));
    assert!(!matches(&leaf("file", Operator::HasTag, "movie"), &doc, &NoLinks));

    let parent = DocumentContext::new(FileInfo::from_path("c.md")).with_body_tag("movies");
    assert!(matches(&leaf("file", Operator::HasTag, "movies/action"), &parent, &NoLinks));
}

#[test]
fn test_filter_chain_examples() {
    assert_eq!(
        apply_filter_chain(FilterValue::Number(5.0), "calc:+3 | calc:**2"),
        FilterValue::Number(64.0)
    );
    assert_eq!(
        apply_filter_chain("Hello World".into(), "kebab"),
        FilterValue::text("hello-world")
    );
    assert_eq!(apply_filter_chain("  Hi  ".into(), "trim | upper"), FilterValue::text("HI"));
    assert_eq!(apply_filter_chain("x".into(), "bogus_filter"), FilterValue::text("x"));
}

#[tokio::test]
async fn test_attribute_placeholder_is_raw_body_placeholder_is_rendered() {
    let renderer = EchoRenderer::default();
    let html = render_template(
        r#"<img src="{{cover}}"><figcaption>{{cover}}</figcaption>"#,
        &movie(),
        &renderer,
    )
    .await;
    assert_eq!(
        html,
        r#"<img src="[[heat.jpg]]"><figcaption><span>md:[[heat.jpg]]</span></figcaption>"#
    );
    assert_eq!(renderer.seen.borrow().len(), 1);
}

#[test]
fn test_settings_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = Settings::default();
    for name in ["Movies", "Books", "People", "Fallback"] {
        settings.add_view(
            ViewConfig::new(name)
                .with_rules(
                    FilterGroup::or()
                        .with_filter(Filter::new("file", Operator::InFolder, name))
                        .with_group(leaf("rating", Operator::Ge, "4")),
                )
                .with_template(format!("<h1 title=\"{name}\">{{{{file.basename}}}}</h1>\n{{{{content}}}}")),
        );
    }
    move_view(&mut settings.views, 3, 0).unwrap();
    settings.save(&path).unwrap();

    let first = fs::read_to_string(&path).unwrap();
    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded.views, settings.views);

    loaded.save(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[tokio::test]
async fn test_end_to_end_on_disk() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Movies")).unwrap();
    fs::create_dir_all(dir.path().join("People")).unwrap();
    fs::write(dir.path().join("People/Michael Mann.md"), "Director.").unwrap();
    fs::write(
        dir.path().join("Movies/Heat.md"),
        "---\ntitle: heat\ndirector: \"[[Michael Mann]]\"\ncast: [Pacino, De Niro]\nreleased: 1995-12-15\n---\n\nCops and robbers.\n",
    )
    .unwrap();

    let mut settings = Settings::default();
    settings.add_view(
        ViewConfig::new("Mann films")
            .with_rules(leaf("file", Operator::LinksTo, "Michael Mann"))
            .with_template(
                "<h1>{{ title | title }}</h1><p>{{ released | date:\"MMMM D, YYYY\" }} · {{cast[1]}}</p>{{content}}",
            ),
    );
    settings.add_view(ViewConfig::new("Fallback"));

    let api = NoteViewApi::new(FsVault::open(dir.path()).unwrap(), settings, PulldownRenderer);
    assert_eq!(api.match_document("Movies/Heat.md").unwrap().unwrap().name, "Mann films");
    assert_eq!(
        api.match_document("People/Michael Mann.md").unwrap().unwrap().name,
        "Fallback"
    );

    let view = api.render_document("Movies/Heat.md").await.unwrap().unwrap();
    assert!(view.html.starts_with(
        "<h1><span>Heat</span></h1><p><span>December 15, 1995</span> · <span>De Niro</span></p>"
    ));
    assert!(view.html.contains("<div class=\"markdown-preview-sizer\"><p>Cops and robbers.</p>"));
    assert!(view.scripts.is_empty());
}
