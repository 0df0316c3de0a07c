use super::*;
use crate::{LinkMetadata, SortDirection, SortKey};
use time::macros::datetime;

fn service() -> LinkService {
    LinkService::new(Database::in_memory().expect("failed to create in-memory database"))
}

fn add(service: &LinkService, url: &str, title: &str, category: &str) -> Link {
    service
        .add_link(NewLink::new(
            url,
            LinkMetadata::new(title, format!("Summary of {title}"), category),
        ))
        .expect("failed to add link")
        .expect("link should not be a duplicate")
}

fn titles(links: &[Link]) -> Vec<&str> {
    links.iter().map(Link::title).collect()
}

// --- add_link ---

#[test]
fn add_link_assigns_id_pending_status_and_timestamp() {
    let service = service();
    let before = OffsetDateTime::now_utc() - time::Duration::seconds(1);

    let link = add(&service, "https://www.rust-lang.org", "Rust", "Programming");

    assert!(link.id().get() > 0);
    assert_eq!(link.status(), LinkStatus::Pending);
    assert_eq!(link.category(), "Programming");
    assert!(link.created_at() >= before);
}

#[test]
fn add_link_trims_url() {
    let service = service();
    let link = add(&service, "  https://example.com/page  ", "Page", "News");
    assert_eq!(link.url(), "https://example.com/page");
}

#[test]
fn add_link_rejects_empty_and_invalid_urls() {
    let service = service();

    let empty = service.add_link(NewLink::new("   ", LinkMetadata::new("t", "s", "c")));
    let err = empty.unwrap_err();
    assert_eq!(err.downcast_ref::<LinkError>(), Some(&LinkError::EmptyUrl));

    let invalid = service.add_link(NewLink::new("not a url", LinkMetadata::new("t", "s", "c")));
    let err = invalid.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LinkError>(),
        Some(LinkError::InvalidUrl(_))
    ));

    assert!(service.all_links().unwrap().is_empty());
}

#[test]
fn add_link_skips_duplicate_urls() {
    let service = service();
    add(&service, "https://example.com", "First", "News");

    let duplicate = service
        .add_link(NewLink::new(
            "https://example.com",
            LinkMetadata::new("Second", "s", "News"),
        ))
        .unwrap();

    assert!(duplicate.is_none());
    let links = service.all_links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title(), "First");
}

#[test]
fn add_link_registers_new_category() {
    let service = service();
    add(&service, "https://cooking.example", "Soup", "Cooking");

    let categories = service.list_categories().unwrap();
    assert!(categories.contains(&"Cooking".to_string()));
}

#[test]
fn add_link_reuses_existing_category_spelling() {
    let service = service();
    let link = add(&service, "https://example.com", "Gadget", "technology");

    assert_eq!(link.category(), "Technology");
    let categories = service.list_categories().unwrap();
    assert_eq!(
        categories
            .iter()
            .filter(|c| c.eq_ignore_ascii_case("technology"))
            .count(),
        1
    );
}

#[test]
fn add_link_with_blank_category_is_uncategorized() {
    let service = service();
    let link = add(&service, "https://example.com", "Thing", "   ");
    assert_eq!(link.category(), UNCATEGORIZED);
}

#[test]
fn add_link_persists_due_date_and_sources() {
    let service = service();
    let due = datetime!(2030-01-15 0:00 UTC);
    let metadata = LinkMetadata::new("Docs", "Reference", "Programming").with_sources(vec![
        Source::new("https://doc.rust-lang.org", "Rust docs"),
        Source::new("https://docs.rs", "docs.rs"),
    ]);

    let link = service
        .add_link(NewLink::new("https://doc.rust-lang.org/std", metadata).due_date(Some(due)))
        .unwrap()
        .unwrap();

    let stored = service.get_link(link.id()).unwrap().unwrap();
    assert_eq!(stored.due_date(), Some(due));
    assert_eq!(stored.sources().len(), 2);
    assert_eq!(stored.sources()[0].title, "Rust docs");
    assert_eq!(stored.sources()[1].uri, "https://docs.rs");
}

#[test]
fn get_link_returns_none_for_unknown_id() {
    let service = service();
    assert_eq!(service.get_link(LinkId::new(999)).unwrap(), None);
}

#[test]
fn find_by_url_and_contains_url() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    assert_eq!(
        service.find_by_url(" https://example.com ").unwrap().map(|l| l.id()),
        Some(link.id())
    );
    assert!(service.contains_url("https://example.com").unwrap());
    assert!(!service.contains_url("https://other.example").unwrap());
}

// --- toggle / update / delete ---

#[test]
fn toggle_status_flips_back_and_forth() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    let toggled = service.toggle_status(link.id()).unwrap().unwrap();
    assert_eq!(toggled.status(), LinkStatus::Done);

    let toggled = service.toggle_status(link.id()).unwrap().unwrap();
    assert_eq!(toggled.status(), LinkStatus::Pending);
}

#[test]
fn toggle_status_of_unknown_link_returns_none() {
    let service = service();
    assert!(service.toggle_status(LinkId::new(42)).unwrap().is_none());
}

#[test]
fn update_link_changes_only_given_fields() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    let updated = service
        .update_link(
            link.id(),
            LinkUpdate {
                title: Some("  Better title  ".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.title(), "Better title");
    assert_eq!(updated.summary(), link.summary());
    assert_eq!(updated.category(), "News");
    assert_eq!(updated.url(), link.url());
    assert_eq!(updated.created_at(), link.created_at());
}

#[test]
fn update_link_rejects_blank_title() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    let result = service.update_link(
        link.id(),
        LinkUpdate {
            title: Some("   ".into()),
            summary: Some("new summary".into()),
            ..Default::default()
        },
    );

    assert_eq!(
        result.unwrap_err().downcast_ref::<LinkError>(),
        Some(&LinkError::EmptyTitle)
    );
    // Nothing from the failed update is applied.
    let stored = service.get_link(link.id()).unwrap().unwrap();
    assert_eq!(stored.summary(), link.summary());
}

#[test]
fn update_link_with_new_category_adds_it_to_list() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    let updated = service
        .update_link(
            link.id(),
            LinkUpdate {
                category: Some("Research".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.category(), "Research");
    assert!(
        service
            .list_categories()
            .unwrap()
            .contains(&"Research".to_string())
    );
}

#[test]
fn update_link_blank_category_becomes_uncategorized() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    let updated = service
        .update_link(
            link.id(),
            LinkUpdate {
                category: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.category(), UNCATEGORIZED);
}

#[test]
fn update_link_sets_and_clears_due_date() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");
    let due = datetime!(2031-07-04 0:00 UTC);

    let updated = service
        .update_link(
            link.id(),
            LinkUpdate {
                due_date: Some(Some(due)),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.due_date(), Some(due));

    let cleared = service
        .update_link(
            link.id(),
            LinkUpdate {
                due_date: Some(None),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(cleared.due_date(), None);
}

#[test]
fn update_unknown_link_returns_none() {
    let service = service();
    let result = service
        .update_link(
            LinkId::new(5),
            LinkUpdate {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn delete_link_is_idempotent() {
    let service = service();
    let link = add(&service, "https://example.com", "Example", "News");

    assert!(service.delete_link(link.id()).unwrap());
    assert!(!service.delete_link(link.id()).unwrap());
    assert_eq!(service.get_link(link.id()).unwrap(), None);
}

#[test]
fn clear_completed_removes_only_done_links() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");
    let c = add(&service, "https://c.example", "C", "News");
    service.toggle_status(a.id()).unwrap();
    service.toggle_status(c.id()).unwrap();

    assert_eq!(service.clear_completed().unwrap(), 2);

    let remaining = service.all_links().unwrap();
    assert_eq!(titles(&remaining), vec!["B"]);
}

// --- listing ---

#[test]
fn list_links_default_is_newest_first() {
    let service = service();
    add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");
    add(&service, "https://c.example", "C", "News");

    let links = service.list_links(&ListLinksOptions::default()).unwrap();
    assert_eq!(titles(&links), vec!["C", "B", "A"]);
}

#[test]
fn list_links_filters_by_status_then_category() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");
    let c = add(&service, "https://c.example", "C", "Programming");
    service.toggle_status(a.id()).unwrap();
    service.toggle_status(c.id()).unwrap();

    let done_news = service
        .list_links(&ListLinksOptions {
            status: StatusFilter::Only(LinkStatus::Done),
            category: CategoryFilter::Named("News".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(titles(&done_news), vec!["A"]);

    let pending = service
        .list_links(&ListLinksOptions {
            status: StatusFilter::Only(LinkStatus::Pending),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(titles(&pending), vec!["B"]);
}

#[test]
fn list_links_sorts_by_title_ascending() {
    let service = service();
    add(&service, "https://a.example", "zebra", "News");
    add(&service, "https://b.example", "Apple", "News");
    add(&service, "https://c.example", "mango", "News");

    let links = service
        .list_links(&ListLinksOptions {
            sort: SortConfig::new(SortKey::Title, SortDirection::Asc),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(titles(&links), vec!["Apple", "mango", "zebra"]);
}

#[test]
fn list_links_sorts_by_status() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");
    service.toggle_status(a.id()).unwrap();

    let asc = service
        .list_links(&ListLinksOptions {
            sort: SortConfig::new(SortKey::Status, SortDirection::Asc),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(titles(&asc), vec!["B", "A"]);

    let desc = service
        .list_links(&ListLinksOptions {
            sort: SortConfig::new(SortKey::Status, SortDirection::Desc),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(titles(&desc), vec!["A", "B"]);
}

// --- bulk actions ---

#[test]
fn bulk_set_status_and_category() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    let b = add(&service, "https://b.example", "B", "News");
    let c = add(&service, "https://c.example", "C", "News");
    let ids = [a.id(), b.id()];

    let affected = service
        .bulk_apply(&ids, &BulkAction::SetStatus(LinkStatus::Done))
        .unwrap();
    assert_eq!(affected, 2);

    let affected = service
        .bulk_apply(&ids, &BulkAction::SetCategory("Lifestyle".into()))
        .unwrap();
    assert_eq!(affected, 2);

    let a = service.get_link(a.id()).unwrap().unwrap();
    assert_eq!(a.status(), LinkStatus::Done);
    assert_eq!(a.category(), "Lifestyle");

    let c = service.get_link(c.id()).unwrap().unwrap();
    assert_eq!(c.status(), LinkStatus::Pending);
    assert_eq!(c.category(), "News");
}

#[test]
fn bulk_delete_ignores_unknown_ids() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");

    let affected = service
        .bulk_apply(&[a.id(), LinkId::new(999)], &BulkAction::Delete)
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(titles(&service.all_links().unwrap()), vec!["B"]);
}

#[test]
fn bulk_apply_with_no_ids_is_noop() {
    let service = service();
    add(&service, "https://a.example", "A", "News");
    assert_eq!(service.bulk_apply(&[], &BulkAction::Delete).unwrap(), 0);
    assert_eq!(service.all_links().unwrap().len(), 1);
}

// --- categories ---

#[test]
fn categories_start_with_defaults_sorted() {
    let service = service();
    assert_eq!(
        service.list_categories().unwrap(),
        vec![
            "Lifestyle",
            "News",
            "Productivity",
            "Programming",
            "Technology",
            "Uncategorized"
        ]
    );
}

#[test]
fn add_category_trims_and_ignores_case_duplicates() {
    let service = service();

    assert!(service.add_category("  Recipes ").unwrap());
    assert!(!service.add_category("recipes").unwrap());
    assert!(!service.add_category("   ").unwrap());

    let categories = service.list_categories().unwrap();
    assert!(categories.contains(&"Recipes".to_string()));
    assert!(!categories.contains(&"recipes".to_string()));
}

#[test]
fn rename_category_relabels_links_ignoring_case() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "Programming");

    let relabeled = service.rename_category("news", "Headlines").unwrap();
    assert_eq!(relabeled, 1);

    let a = service.get_link(a.id()).unwrap().unwrap();
    assert_eq!(a.category(), "Headlines");

    let categories = service.list_categories().unwrap();
    assert!(categories.contains(&"Headlines".to_string()));
    assert!(!categories.contains(&"News".to_string()));
}

#[test]
fn rename_category_rejects_blank_or_taken_names() {
    let service = service();

    let blank = service.rename_category("News", "  ").unwrap_err();
    assert_eq!(
        blank.downcast_ref::<LinkError>(),
        Some(&LinkError::EmptyCategory)
    );

    let taken = service.rename_category("News", "technology").unwrap_err();
    assert_eq!(
        taken.downcast_ref::<LinkError>(),
        Some(&LinkError::CategoryExists("Technology".into()))
    );

    let unknown = service.rename_category("Gardening", "Plants").unwrap_err();
    assert!(matches!(
        unknown.downcast_ref::<LinkError>(),
        Some(LinkError::UnknownCategory(_))
    ));
}

#[test]
fn rename_category_to_same_name_is_noop() {
    let service = service();
    add(&service, "https://a.example", "A", "News");

    assert_eq!(service.rename_category("News", "NEWS").unwrap(), 0);
    assert!(
        service
            .list_categories()
            .unwrap()
            .contains(&"News".to_string())
    );
}

#[test]
fn delete_category_moves_links_to_uncategorized() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");

    assert_eq!(service.delete_category("NEWS").unwrap(), 1);

    let a = service.get_link(a.id()).unwrap().unwrap();
    assert_eq!(a.category(), UNCATEGORIZED);
    assert!(
        !service
            .list_categories()
            .unwrap()
            .contains(&"News".to_string())
    );
}

#[test]
fn delete_category_refuses_uncategorized() {
    let service = service();
    let err = service.delete_category("uncategorized").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LinkError>(),
        Some(&LinkError::ProtectedCategory)
    );
}

#[test]
fn every_link_category_stays_in_category_list() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "Alpha");
    let b = add(&service, "https://b.example", "B", "Beta");
    service
        .bulk_apply(&[a.id()], &BulkAction::SetCategory("Gamma".into()))
        .unwrap();
    service.rename_category("Beta", "Delta").unwrap();
    service.delete_category("Gamma").unwrap();
    service
        .update_link(
            b.id(),
            LinkUpdate {
                category: Some("Epsilon".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let categories = service.list_categories().unwrap();
    for link in service.all_links().unwrap() {
        assert!(
            categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(link.category())),
            "category {} missing from list",
            link.category()
        );
    }
}

// --- stats / settings / export ---

#[test]
fn stats_counts_statuses_and_categories() {
    let service = service();
    let a = add(&service, "https://a.example", "A", "News");
    add(&service, "https://b.example", "B", "News");
    add(&service, "https://c.example", "C", "Programming");
    service.toggle_status(a.id()).unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(
        stats.categories,
        vec![("News".to_string(), 2), ("Programming".to_string(), 1)]
    );
}

#[test]
fn stats_of_empty_store_are_zero() {
    let stats = service().stats().unwrap();
    assert_eq!(stats, LinkStats::default());
}

#[test]
fn sort_config_defaults_and_persists() {
    let service = service();
    assert_eq!(service.sort_config().unwrap(), SortConfig::default());

    let config = SortConfig::new(SortKey::Title, SortDirection::Asc);
    service.set_sort_config(config).unwrap();
    assert_eq!(service.sort_config().unwrap(), config);
}

#[test]
fn unreadable_sort_config_falls_back_to_default() {
    let service = service();
    service
        .database()
        .set_setting(SORT_CONFIG_KEY, "{not json")
        .unwrap();

    assert_eq!(service.sort_config().unwrap(), SortConfig::default());
}

#[test]
fn export_then_import_into_fresh_store() {
    let source = service();
    let a = add(&source, "https://a.example", "A", "Cooking");
    add(&source, "https://b.example", "B", "News");
    source.toggle_status(a.id()).unwrap();
    let json = source.export_json().unwrap();

    let target = service();
    add(&target, "https://b.example", "Already here", "News");
    let imported = target.import_json(&json).unwrap();

    assert_eq!(imported, 1);
    let a = target.find_by_url("https://a.example").unwrap().unwrap();
    assert_eq!(a.status(), LinkStatus::Done);
    assert_eq!(a.category(), "Cooking");
    assert!(
        target
            .list_categories()
            .unwrap()
            .contains(&"Cooking".to_string())
    );
    let b = target.find_by_url("https://b.example").unwrap().unwrap();
    assert_eq!(b.title(), "Already here");
}

#[test]
fn import_rejects_malformed_json() {
    let service = service();
    assert!(service.import_json("[{\"url\": 1}]").is_err());
    assert!(service.all_links().unwrap().is_empty());
}

#[test]
fn import_skips_rows_add_link_would_reject() {
    let rows = vec![
        crate::LinkBuilder::new()
            .id(LinkId::new(1))
            .url("not a url")
            .title("Bad URL")
            .build(),
        crate::LinkBuilder::new()
            .id(LinkId::new(2))
            .url("   ")
            .title("Empty URL")
            .build(),
        crate::LinkBuilder::new()
            .id(LinkId::new(3))
            .url("https://untitled.example")
            .title("   ")
            .build(),
        crate::LinkBuilder::new()
            .id(LinkId::new(4))
            .url("  https://good.example  ")
            .title(" Good ")
            .category("News")
            .build(),
    ];
    let json = serde_json::to_string(&rows).unwrap();

    let service = service();
    assert_eq!(service.import_json(&json).unwrap(), 1);

    let links = service.all_links().unwrap();
    assert_eq!(titles(&links), vec!["Good"]);
    assert_eq!(links[0].url(), "https://good.example");
}
